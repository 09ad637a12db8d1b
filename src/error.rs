use std::path::PathBuf;

use thiserror::Error;

/// Why a single legacy document could not be turned into a record.
///
/// None of these are recovered from inside the parser: a document that fails
/// here either needs fixing by hand or an entry in the skip list.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{doc}: unrecognized document structure: {detail}")]
    StructuralMismatch { doc: String, detail: String },

    #[error("{doc}: unknown sound clip label {label:?}")]
    UnknownClipLabel { doc: String, label: String },

    #[error("{doc}: malformed markup at byte {position}: {message}")]
    Markup {
        doc: String,
        position: u64,
        message: String,
    },

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExtractError {
    pub fn structural(doc: &str, detail: impl Into<String>) -> Self {
        ExtractError::StructuralMismatch {
            doc: doc.to_string(),
            detail: detail.into(),
        }
    }
}

pub type ExtractResult<T> = Result<T, ExtractError>;
