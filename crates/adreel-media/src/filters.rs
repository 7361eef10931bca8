//! FFmpeg filter graph for the commercial composition.
//!
//! Layout on a 1920x1080 canvas:
//! - background image scaled to fill the frame
//! - QR code scaled to 250x250 and pinned near the top-right corner
//! - headline drawtext (white, 80px, upper-cased) bottom-center
//! - business name drawtext (yellow, 40px) below the headline
//!
//! User-supplied text flows into `drawtext` as data, never as filter
//! syntax: `escape_drawtext` neutralizes every character the filter
//! parser treats specially.

/// Escape text for use inside a single-quoted drawtext `text=` value.
pub fn escape_drawtext(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\'', "\\\\\\'")
        .replace(':', "\\:")
        .replace('%', "\\%")
        .replace(',', "\\,")
        .replace('[', "\\[")
        .replace(']', "\\]")
        .replace(';', "\\;")
}

/// Text inputs for the composition, taken verbatim from the record.
#[derive(Debug, Clone)]
pub struct ComposeSpec {
    pub headline: String,
    pub business_name: String,
}

impl ComposeSpec {
    /// Build the full `-filter_complex` graph.
    ///
    /// Input indices are fixed: 0 = voiceover audio, 1 = background
    /// image, 2 = QR code. The graph is a pure function of the two
    /// text fields, so identical records always produce identical
    /// ffmpeg invocations.
    pub fn filter_graph(&self) -> String {
        let headline = escape_drawtext(&self.headline.to_uppercase());
        let business_name = escape_drawtext(&self.business_name);

        format!(
            "[1:v]scale=1920:1080[bg];\
             [2:v]scale=250:250[qr];\
             [bg][qr]overlay=W-300:50[v1];\
             [v1]drawtext=text='{headline}':fontcolor=white:fontsize=80:\
             x=(w-text_w)/2:y=h-200:shadowcolor=black:shadowx=2:shadowy=2[v2];\
             [v2]drawtext=text='{business_name}':fontcolor=yellow:fontsize=40:\
             x=(w-text_w)/2:y=h-100:shadowcolor=black:shadowx=2:shadowy=2"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_is_deterministic() {
        let spec = ComposeSpec {
            headline: "Free Pizza".to_string(),
            business_name: "Tony's Pizza".to_string(),
        };
        assert_eq!(spec.filter_graph(), spec.filter_graph());
    }

    #[test]
    fn headline_is_upper_cased() {
        let spec = ComposeSpec {
            headline: "Free Pizza".to_string(),
            business_name: "Tony".to_string(),
        };
        assert!(spec.filter_graph().contains("text='FREE PIZZA'"));
    }

    #[test]
    fn graph_wires_overlay_before_text() {
        let spec = ComposeSpec {
            headline: "h".to_string(),
            business_name: "b".to_string(),
        };
        let graph = spec.filter_graph();

        let overlay = graph.find("overlay=W-300:50").unwrap();
        let first_text = graph.find("drawtext").unwrap();
        assert!(overlay < first_text);
        assert!(graph.contains("[1:v]scale=1920:1080[bg]"));
        assert!(graph.contains("[2:v]scale=250:250[qr]"));
    }

    #[test]
    fn hostile_text_cannot_break_out_of_drawtext() {
        let spec = ComposeSpec {
            headline: "a':x=0,drawbox".to_string(),
            business_name: "50% off; [v9]".to_string(),
        };
        let graph = spec.filter_graph();

        // The single quote, separators, and link labels all arrive escaped
        assert!(graph.contains("A\\\\\\'\\:X=0\\,DRAWBOX"));
        assert!(graph.contains("50\\% off\\; \\[v9\\]"));
    }

    #[test]
    fn escape_handles_each_special_character() {
        assert_eq!(escape_drawtext("a:b"), "a\\:b");
        assert_eq!(escape_drawtext("a,b"), "a\\,b");
        assert_eq!(escape_drawtext("100%"), "100\\%");
        assert_eq!(escape_drawtext("a'b"), "a\\\\\\'b");
        assert_eq!(escape_drawtext("a\\b"), "a\\\\b");
    }
}
