use base64::Engine;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Dataset options sent to Galaxy when an upload is finalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadMetadata {
    /// Name the dataset gets in the history.
    pub name: String,
    /// Galaxy datatype extension (`auto` lets Galaxy sniff it).
    pub file_type: String,
    /// Genome build key (`?` when unknown).
    pub dbkey: String,
    pub space_to_tab: bool,
    pub auto_decompress: bool,
    pub to_posix_lines: bool,
}

impl UploadMetadata {
    /// Metadata with Galaxy's defaults for a dataset called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_type: "auto".into(),
            dbkey: "?".into(),
            space_to_tab: false,
            auto_decompress: true,
            to_posix_lines: true,
        }
    }

    /// Encodes the TUS `Upload-Metadata` header value (`filename <base64>`).
    pub fn tus_header(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(self.name.as_bytes());
        format!("filename {encoded}")
    }
}

/// A history as returned by `GET /api/histories`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<NaiveDateTime>,
}
