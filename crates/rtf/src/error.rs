use thiserror::Error;

pub type Result<T> = std::result::Result<T, RtfError>;

#[derive(Debug, Error)]
pub enum RtfError {
    #[error("malformed RTF: {0}")]
    MalformedInput(ParseWarning),

    #[error("invalid run {run} in paragraph {paragraph}: {reason}")]
    InvalidRun {
        paragraph: usize,
        run: usize,
        reason: &'static str,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Something the parser recovered from. Parsing never fails; these are
/// collected alongside the best-effort result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseWarning {
    #[error("input does not start with an RTF header")]
    MissingHeader,

    #[error("{count} group(s) still open at end of input")]
    UnclosedGroups { count: usize },

    #[error("unmatched closing brace at byte {position}")]
    UnmatchedGroupEnd { position: usize },

    #[error("truncated control sequence at byte {position}")]
    Truncated { position: usize },

    #[error("invalid hex escape at byte {position}")]
    InvalidHex { position: usize },

    #[error("content after the end of the document at byte {position}")]
    TrailingContent { position: usize },

    #[error("font {index} is not declared in the font table")]
    UnresolvedFont { index: u32 },

    #[error("color {index} is not declared in the color table")]
    UnresolvedColor { index: u32 },
}

impl ParseWarning {
    /// Whether the warning means the stream itself is damaged, as opposed to
    /// a dangling reference inside an otherwise well-formed document.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::MissingHeader
                | Self::UnclosedGroups { .. }
                | Self::UnmatchedGroupEnd { .. }
                | Self::Truncated { .. }
        )
    }
}
