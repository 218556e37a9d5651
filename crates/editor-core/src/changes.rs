use std::ops::Range;

use scriv_rtf::Paragraph;
use similar::{Algorithm, DiffTag, capture_diff_slices};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HunkKind {
    Inserted,
    Removed,
    /// Paragraphs replaced one for one; text or formatting changed in place.
    Modified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphHunk {
    pub kind: HunkKind,
    pub old: Range<usize>,
    pub new: Range<usize>,
}

/// Paragraph-level difference between two versions of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSummary {
    pub inserted: usize,
    pub removed: usize,
    pub modified: usize,
    pub hunks: Vec<ParagraphHunk>,
}

impl ChangeSummary {
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }
}

/// Compares paragraphs by text and formatting.
pub fn diff_paragraphs(old: &[Paragraph], new: &[Paragraph]) -> ChangeSummary {
    let mut summary = ChangeSummary::default();

    for op in capture_diff_slices(Algorithm::Myers, old, new) {
        let old_range = op.old_range();
        let new_range = op.new_range();
        match op.tag() {
            DiffTag::Equal => {}
            DiffTag::Delete => {
                summary.removed += old_range.len();
                summary.hunks.push(ParagraphHunk {
                    kind: HunkKind::Removed,
                    old: old_range,
                    new: new_range,
                });
            }
            DiffTag::Insert => {
                summary.inserted += new_range.len();
                summary.hunks.push(ParagraphHunk {
                    kind: HunkKind::Inserted,
                    old: old_range,
                    new: new_range,
                });
            }
            DiffTag::Replace => {
                // Pair paragraphs up front to back; the remainder on the
                // longer side counts as inserted or removed.
                let paired = old_range.len().min(new_range.len());
                summary.modified += paired;
                summary.hunks.push(ParagraphHunk {
                    kind: HunkKind::Modified,
                    old: old_range.start..old_range.start + paired,
                    new: new_range.start..new_range.start + paired,
                });
                if old_range.len() > paired {
                    summary.removed += old_range.len() - paired;
                    summary.hunks.push(ParagraphHunk {
                        kind: HunkKind::Removed,
                        old: old_range.start + paired..old_range.end,
                        new: new_range.end..new_range.end,
                    });
                }
                if new_range.len() > paired {
                    summary.inserted += new_range.len() - paired;
                    summary.hunks.push(ParagraphHunk {
                        kind: HunkKind::Inserted,
                        old: old_range.end..old_range.end,
                        new: new_range.start + paired..new_range.end,
                    });
                }
            }
        }
    }
    summary
}
