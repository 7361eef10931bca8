//! Preview records and their positional sheet row layout.
//!
//! One record tracks the full lifecycle of a generated commercial,
//! from preview through lead capture to the published video. Records
//! live in an external spreadsheet, so the column order here is
//! load-bearing: `COLUMNS` must match the sheet header row exactly.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised when converting rows to records and back.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Unknown status: {0}")]
    UnknownStatus(String),

    #[error("Unknown QR type: {0}")]
    UnknownQrType(String),

    #[error("Row is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Unique identifier for a preview record.
///
/// Generated once at preview time and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreviewId(pub String);

impl PreviewId {
    /// Generate a new random preview ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PreviewId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PreviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PreviewId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PreviewId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Payload type encoded into the QR code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QrType {
    /// Link to a website
    #[default]
    Url,
    /// Tap-to-call phone number
    Tel,
    /// Pre-filled text message
    Sms,
}

impl QrType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QrType::Url => "url",
            QrType::Tel => "tel",
            QrType::Sms => "sms",
        }
    }
}

impl fmt::Display for QrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for QrType {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "url" => Ok(QrType::Url),
            "tel" => Ok(QrType::Tel),
            "sms" => Ok(QrType::Sms),
            other => Err(RecordError::UnknownQrType(other.to_string())),
        }
    }
}

/// Preview lifecycle status.
///
/// The machine is linear with a single terminal failure state
/// reachable from the active state:
///
/// ```text
/// Previewed -> LeadCaptured -> Uploaded
///                  \---------> Error
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PreviewStatus {
    /// Preview bundle generated and shown to the user
    #[default]
    Previewed,
    /// Contact details recorded, render job scheduled
    LeadCaptured,
    /// Final video rendered and published
    Uploaded,
    /// Render or publish failed
    Error,
}

impl PreviewStatus {
    /// Sheet cell representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PreviewStatus::Previewed => "PREVIEWED",
            PreviewStatus::LeadCaptured => "LEAD_CAPTURED",
            PreviewStatus::Uploaded => "UPLOADED",
            PreviewStatus::Error => "ERROR",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, PreviewStatus::Uploaded | PreviewStatus::Error)
    }

    /// Check whether a transition to `next` is legal.
    pub fn can_transition_to(&self, next: PreviewStatus) -> bool {
        matches!(
            (self, next),
            (PreviewStatus::Previewed, PreviewStatus::LeadCaptured)
                | (PreviewStatus::LeadCaptured, PreviewStatus::Uploaded)
                | (PreviewStatus::LeadCaptured, PreviewStatus::Error)
        )
    }
}

impl fmt::Display for PreviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PreviewStatus {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PREVIEWED" => Ok(PreviewStatus::Previewed),
            "LEAD_CAPTURED" => Ok(PreviewStatus::LeadCaptured),
            "UPLOADED" => Ok(PreviewStatus::Uploaded),
            "ERROR" => Ok(PreviewStatus::Error),
            other => Err(RecordError::UnknownStatus(other.to_string())),
        }
    }
}

/// Sheet column names, in positional order (columns A through U).
///
/// The sheet header row must match this exactly; `update_fields`
/// resolves named fields to cell positions through this table.
pub const COLUMNS: [&str; 21] = [
    "previewId",
    "createdAt",
    "businessName",
    "businessType",
    "offer",
    "extraInfo",
    "qrType",
    "qrValue",
    "script",
    "visualHeadline",
    "voiceUrl",
    "bgUrl",
    "qrUrl",
    "mp4_url",
    "youtube_video_id",
    "youtube_url",
    "status",
    "error",
    "lead_name",
    "lead_email",
    "lead_phone",
];

/// A1-notation range covering all record columns.
pub const ROW_RANGE: &str = "A:U";

/// Resolve a column name to its positional index.
pub fn column_index(name: &str) -> Option<usize> {
    COLUMNS.iter().position(|c| *c == name)
}

/// One durable row tracking a preview's lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewRecord {
    pub preview_id: PreviewId,
    pub created_at: DateTime<Utc>,
    pub business_name: String,
    pub business_type: String,
    pub offer: String,
    pub extra_info: String,
    pub qr_type: QrType,
    pub qr_value: String,
    pub script: String,
    pub headline: String,
    pub voice_url: String,
    pub bg_url: String,
    pub qr_url: String,
    pub mp4_url: Option<String>,
    pub youtube_video_id: Option<String>,
    pub youtube_url: Option<String>,
    pub status: PreviewStatus,
    pub error: Option<String>,
    pub lead_name: Option<String>,
    pub lead_email: Option<String>,
    pub lead_phone: Option<String>,
}

impl PreviewRecord {
    /// Serialize into a positional sheet row.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.preview_id.to_string(),
            self.created_at.to_rfc3339(),
            self.business_name.clone(),
            self.business_type.clone(),
            self.offer.clone(),
            self.extra_info.clone(),
            self.qr_type.to_string(),
            self.qr_value.clone(),
            self.script.clone(),
            self.headline.clone(),
            self.voice_url.clone(),
            self.bg_url.clone(),
            self.qr_url.clone(),
            self.mp4_url.clone().unwrap_or_default(),
            self.youtube_video_id.clone().unwrap_or_default(),
            self.youtube_url.clone().unwrap_or_default(),
            self.status.to_string(),
            self.error.clone().unwrap_or_default(),
            self.lead_name.clone().unwrap_or_default(),
            self.lead_email.clone().unwrap_or_default(),
            self.lead_phone.clone().unwrap_or_default(),
        ]
    }

    /// Parse a positional sheet row.
    ///
    /// Rows read back from the sheet API may be truncated after the
    /// last non-empty cell; trailing columns default to empty.
    pub fn from_row(row: &[String]) -> Result<Self, RecordError> {
        fn cell(row: &[String], idx: usize) -> String {
            row.get(idx).cloned().unwrap_or_default()
        }
        fn opt(row: &[String], idx: usize) -> Option<String> {
            row.get(idx).filter(|s| !s.is_empty()).cloned()
        }

        let preview_id = cell(row, 0);
        if preview_id.is_empty() {
            return Err(RecordError::MissingColumn("previewId"));
        }

        let created_raw = cell(row, 1);
        let created_at = DateTime::parse_from_rfc3339(&created_raw)
            .map_err(|_| RecordError::InvalidTimestamp(created_raw.clone()))?
            .with_timezone(&Utc);

        Ok(Self {
            preview_id: PreviewId::from(preview_id),
            created_at,
            business_name: cell(row, 2),
            business_type: cell(row, 3),
            offer: cell(row, 4),
            extra_info: cell(row, 5),
            qr_type: cell(row, 6).parse().unwrap_or_default(),
            qr_value: cell(row, 7),
            script: cell(row, 8),
            headline: cell(row, 9),
            voice_url: cell(row, 10),
            bg_url: cell(row, 11),
            qr_url: cell(row, 12),
            mp4_url: opt(row, 13),
            youtube_video_id: opt(row, 14),
            youtube_url: opt(row, 15),
            status: cell(row, 16).parse()?,
            error: opt(row, 17),
            lead_name: opt(row, 18),
            lead_email: opt(row, 19),
            lead_phone: opt(row, 20),
        })
    }
}

/// A named-field partial update applied to one record.
///
/// Constructors bundle the fields that must change together, so a
/// caller cannot, for example, set `youtube_url` without also moving
/// the status to `Uploaded`.
#[derive(Debug, Clone, Default)]
pub struct RecordUpdate {
    fields: Vec<(&'static str, String)>,
}

impl RecordUpdate {
    /// Lead capture: contact details plus the LEAD_CAPTURED status.
    pub fn lead_captured(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            fields: vec![
                ("lead_name", name.into()),
                ("lead_email", email.into()),
                ("lead_phone", phone.into()),
                ("status", PreviewStatus::LeadCaptured.to_string()),
            ],
        }
    }

    /// Terminal success: the three artifact fields and UPLOADED status
    /// land in one update.
    pub fn uploaded(
        mp4_url: impl Into<String>,
        youtube_video_id: impl Into<String>,
        youtube_url: impl Into<String>,
    ) -> Self {
        Self {
            fields: vec![
                ("status", PreviewStatus::Uploaded.to_string()),
                ("mp4_url", mp4_url.into()),
                ("youtube_video_id", youtube_video_id.into()),
                ("youtube_url", youtube_url.into()),
            ],
        }
    }

    /// Terminal failure: status and the captured error message.
    pub fn errored(message: impl Into<String>) -> Self {
        Self {
            fields: vec![
                ("status", PreviewStatus::Error.to_string()),
                ("error", message.into()),
            ],
        }
    }

    /// The named fields in application order.
    pub fn fields(&self) -> &[(&'static str, String)] {
        &self.fields
    }

    /// Resolve fields to `(column_index, value)` pairs.
    pub fn to_indexed(&self) -> Result<Vec<(usize, String)>, RecordError> {
        self.fields
            .iter()
            .map(|(name, value)| {
                column_index(name)
                    .map(|idx| (idx, value.clone()))
                    .ok_or_else(|| RecordError::UnknownColumn(name.to_string()))
            })
            .collect()
    }
}
