use scriv_rtf::RtfError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditError {
    #[error("paragraph {paragraph} out of range (document has {count})")]
    InvalidParagraph { paragraph: usize, count: usize },

    #[error("offset {offset} is not a character boundary in paragraph {paragraph} (length {len})")]
    InvalidPoint {
        paragraph: usize,
        offset: usize,
        len: usize,
    },

    #[error("invalid run attributes: {reason}")]
    InvalidAttrs { reason: &'static str },

    #[error("paragraph inserted at {paragraph} contains a line break")]
    LineBreakInParagraph { paragraph: usize },

    /// A history snapshot no longer parses. The session keeps its state.
    #[error("history snapshot is corrupt")]
    CorruptSnapshot(#[source] RtfError),

    #[error("failed to serialize document")]
    Serialize(#[from] RtfError),
}
