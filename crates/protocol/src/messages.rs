use serde::{Deserialize, Serialize};

use crate::types::UploadMetadata;

// ---------------------------------------------------------------------------
// Fetch API payload
// ---------------------------------------------------------------------------

/// Body of `POST /api/tools/fetch` attaching a finished TUS session to a history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub history_id: String,
    pub targets: Vec<FetchTarget>,
    #[serde(rename = "files_0|file_data")]
    pub file_data: FileData,
    pub auto_decompress: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchTarget {
    pub destination: TargetDestination,
    pub elements: Vec<FetchElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetDestination {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchElement {
    pub src: String,
    pub ext: String,
    pub dbkey: String,
    pub to_posix_lines: bool,
    pub space_to_tab: bool,
    pub name: String,
}

/// Reference to the uploaded bytes by TUS session id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileData {
    pub session_id: String,
    pub name: String,
}

impl FetchRequest {
    /// Builds the single-dataset fetch payload for an upload session.
    pub fn new(history_id: &str, session_id: &str, meta: &UploadMetadata) -> Self {
        Self {
            history_id: history_id.to_string(),
            targets: vec![FetchTarget {
                destination: TargetDestination {
                    kind: "hdas".into(),
                },
                elements: vec![FetchElement {
                    src: "files".into(),
                    ext: meta.file_type.clone(),
                    dbkey: meta.dbkey.clone(),
                    to_posix_lines: meta.to_posix_lines,
                    space_to_tab: meta.space_to_tab,
                    name: meta.name.clone(),
                }],
            }],
            file_data: FileData {
                session_id: session_id.to_string(),
                name: meta.name.clone(),
            },
            auto_decompress: meta.auto_decompress,
        }
    }
}
