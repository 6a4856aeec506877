use thiserror::Error;

use crate::tools::locate::ToolKind;

/// Central error type for the transposer-core crate.
#[derive(Debug, Error)]
pub enum TransposeError {
    // Generic fallback (wraps anyhow)
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),

    // Domain-specific variants
    #[error("{tool} not found.\n\n{guidance}")]
    ToolUnavailable { tool: ToolKind, guidance: String },

    #[error("Download failed: {0}")]
    Fetch(String),

    #[error("Conversion failed: {0}")]
    Conversion(String),

    #[error("SoundTouch processing failed: {0}")]
    Stretch(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Coarse classification of [`TransposeError`], for drivers that map errors
/// to exit codes or UI states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ToolUnavailable,
    Fetch,
    Conversion,
    Stretch,
    InvalidInput,
    Other,
}

impl TransposeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransposeError::ToolUnavailable { .. } => ErrorKind::ToolUnavailable,
            TransposeError::Fetch(_) => ErrorKind::Fetch,
            TransposeError::Conversion(_) => ErrorKind::Conversion,
            TransposeError::Stretch(_) => ErrorKind::Stretch,
            TransposeError::InvalidInput(_) => ErrorKind::InvalidInput,
            TransposeError::Anyhow(_) => ErrorKind::Other,
        }
    }

    pub(crate) fn unavailable(tool: ToolKind) -> Self {
        TransposeError::ToolUnavailable {
            tool,
            guidance: crate::tools::locate::install_guidance(tool),
        }
    }
}

// --- Implement From conversions for common errors ---
impl From<std::io::Error> for TransposeError {
    fn from(e: std::io::Error) -> Self {
        TransposeError::Anyhow(e.into())
    }
}

impl From<serde_json::Error> for TransposeError {
    fn from(e: serde_json::Error) -> Self {
        TransposeError::Anyhow(e.into())
    }
}

impl From<hound::Error> for TransposeError {
    fn from(e: hound::Error) -> Self {
        TransposeError::Conversion(format!("unreadable WAV output: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, TransposeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(
            TransposeError::Fetch("boom".into()).kind(),
            ErrorKind::Fetch
        );
        assert_eq!(
            TransposeError::unavailable(ToolKind::Stretcher).kind(),
            ErrorKind::ToolUnavailable
        );
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert_eq!(TransposeError::from(io).kind(), ErrorKind::Other);
    }

    #[test]
    fn unavailable_message_names_tool_and_guidance() {
        let msg = TransposeError::unavailable(ToolKind::Stretcher).to_string();
        assert!(msg.contains("soundstretch"), "{msg}");
        assert!(msg.contains("PATH"), "{msg}");
    }
}
