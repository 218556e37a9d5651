use scriv_rtf::{
    Document, DocumentMetadata, ParseWarning, StyleTagAnnotation, embed_style_tags, parse,
    parse_strict, write_paragraphs, write_rtf,
};
use tracing::{debug, trace, warn};

use crate::changes::{ChangeSummary, diff_paragraphs};
use crate::config::SessionConfig;
use crate::error::EditError;
use crate::history::EditHistory;
use crate::ops::{TextPoint, TextRange, Transaction, apply_op_to};
use crate::spelling::{SpellChecker, SpellingIssue};

/// One open document: the styled model, its undo history and the style tags
/// decoded when it was loaded.
///
/// Every successful mutation goes through [`EditingSession::apply`],
/// [`EditingSession::edit`] or an explicit [`EditingSession::record_change`],
/// each of which snapshots the document into the history.
#[derive(Debug)]
pub struct EditingSession {
    document: Document,
    history: EditHistory,
    style_tags: Vec<StyleTagAnnotation>,
    style_tags_stale: bool,
    warnings: Vec<ParseWarning>,
    saved_document: Document,
    config: SessionConfig,
}

impl EditingSession {
    pub fn open(rtf: &str) -> Result<Self, EditError> {
        Self::with_config(rtf, SessionConfig::default())
    }

    pub fn with_config(rtf: &str, config: SessionConfig) -> Result<Self, EditError> {
        let config = config.with_defaults();
        let parsed = parse(rtf);
        let snapshot = write_rtf(&parsed.document)?;
        debug!(
            paragraphs = parsed.document.paragraphs.len(),
            style_tags = parsed.style_tags.len(),
            warnings = parsed.warnings.len(),
            "opened document"
        );
        Ok(Self {
            saved_document: parsed.document.clone(),
            document: parsed.document,
            history: EditHistory::new(snapshot, config.max_undo),
            style_tags: parsed.style_tags,
            style_tags_stale: false,
            warnings: parsed.warnings,
            config,
        })
    }

    /// Replaces the document wholesale. Nothing carries over from the
    /// previous document, history included.
    pub fn switch_document(&mut self, rtf: &str) -> Result<(), EditError> {
        let parsed = parse(rtf);
        let snapshot = write_rtf(&parsed.document)?;
        self.history.reset(snapshot);
        self.saved_document = parsed.document.clone();
        self.document = parsed.document;
        self.style_tags = parsed.style_tags;
        self.style_tags_stale = false;
        self.warnings = parsed.warnings;
        debug!(
            paragraphs = self.document.paragraphs.len(),
            "switched document"
        );
        Ok(())
    }

    /// Applies every op of `tx` or none of them. Returns whether the
    /// document changed.
    pub fn apply(&mut self, tx: Transaction) -> Result<bool, EditError> {
        let mut scratch = self.document.clone();
        for op in tx.ops {
            apply_op_to(&mut scratch, op)?;
        }
        let changed = self.commit(scratch)?;
        if changed {
            trace!(source = ?tx.meta.source, undo = self.history.undo_len(), "applied transaction");
        }
        Ok(changed)
    }

    /// Runs a host-side mutation on a copy of the document and commits it.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut Document) -> R) -> Result<R, EditError> {
        let mut scratch = self.document.clone();
        let out = f(&mut scratch);
        self.commit(scratch)?;
        Ok(out)
    }

    /// Direct access for hosts that mutate in place. Call
    /// [`record_change`](Self::record_change) afterwards.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Snapshots the live document after a user edit. Returns whether a new
    /// history entry was pushed.
    pub fn record_change(&mut self) -> Result<bool, EditError> {
        if self.history.is_replaying() {
            return Ok(false);
        }
        self.document.normalize();
        let snapshot = write_rtf(&self.document)?;
        let recorded = self.history.record(snapshot);
        if recorded {
            self.mark_style_tags_stale();
        }
        Ok(recorded)
    }

    fn commit(&mut self, mut document: Document) -> Result<bool, EditError> {
        document.normalize();
        // Serializing first leaves the session untouched when the new
        // document is invalid.
        let snapshot = write_rtf(&document)?;
        let previous = std::mem::replace(&mut self.document, document);
        let recorded = self.history.record(snapshot);
        if recorded {
            self.mark_style_tags_stale();
            trace!(
                changes = ?diff_paragraphs(&previous.paragraphs, &self.document.paragraphs),
                "recorded edit"
            );
        }
        Ok(recorded)
    }

    fn mark_style_tags_stale(&mut self) {
        if self.style_tags_stale || self.style_tags.is_empty() {
            return;
        }
        self.style_tags_stale = true;
        if self.config.warn_on_stale_style_tags {
            warn!(
                count = self.style_tags.len(),
                "edit invalidated style tag positions; tags will not be written back"
            );
        }
    }

    /// Restores the previous snapshot. Returns `Ok(false)` when there is
    /// nothing to undo; a snapshot that no longer parses leaves the session
    /// unchanged and returns [`EditError::CorruptSnapshot`].
    pub fn undo(&mut self) -> Result<bool, EditError> {
        let Some(snapshot) = self.history.peek_undo() else {
            return Ok(false);
        };
        let document = restore(snapshot)?;
        let current = write_rtf(&self.document)?;

        let mut replay = self.history.begin_replay();
        replay.commit_undo(current);
        self.document = document;
        drop(replay);
        debug!(undo = self.history.undo_len(), redo = self.history.redo_len(), "undo");
        Ok(true)
    }

    pub fn redo(&mut self) -> Result<bool, EditError> {
        let Some(snapshot) = self.history.peek_redo() else {
            return Ok(false);
        };
        let document = restore(snapshot)?;
        let current = write_rtf(&self.document)?;

        let mut replay = self.history.begin_replay();
        replay.commit_redo(current);
        self.document = document;
        drop(replay);
        debug!(undo = self.history.undo_len(), redo = self.history.redo_len(), "redo");
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_depth(&self) -> usize {
        self.history.undo_len()
    }

    pub fn redo_depth(&self) -> usize {
        self.history.redo_len()
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    /// RTF for persistence. Style tags are written back while the text they
    /// were anchored to is unedited.
    pub fn to_rtf(&self) -> Result<String, EditError> {
        if self.config.reembed_style_tags && !self.style_tags_stale && !self.style_tags.is_empty()
        {
            let paragraphs = embed_style_tags(&self.document.paragraphs, &self.style_tags);
            return Ok(write_paragraphs(&paragraphs, &self.document.metadata)?);
        }
        Ok(write_rtf(&self.document)?)
    }

    pub fn plain_text(&self) -> String {
        self.document.plain_text()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.document.metadata
    }

    pub fn style_tags(&self) -> &[StyleTagAnnotation] {
        &self.style_tags
    }

    /// True once an edit has moved text the style tags were anchored to.
    pub fn style_tags_stale(&self) -> bool {
        self.style_tags_stale
    }

    pub fn parse_warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_dirty(&self) -> bool {
        self.document != self.saved_document
    }

    /// Call after the host has persisted [`to_rtf`](Self::to_rtf).
    pub fn mark_saved(&mut self) {
        self.saved_document = self.document.clone();
    }

    pub fn changes_since_save(&self) -> ChangeSummary {
        diff_paragraphs(&self.saved_document.paragraphs, &self.document.paragraphs)
    }

    pub fn check_spelling(&self, checker: &dyn SpellChecker) -> Vec<SpellingIssue> {
        let mut issues = Vec::new();
        for (paragraph_ix, paragraph) in self.document.paragraphs.iter().enumerate() {
            let text = paragraph.text();
            for misspelling in checker.check_text(&text) {
                let Some(word) = text.get(misspelling.range.clone()) else {
                    continue;
                };
                issues.push(SpellingIssue {
                    range: TextRange::new(
                        TextPoint::new(paragraph_ix, misspelling.range.start),
                        TextPoint::new(paragraph_ix, misspelling.range.end),
                    ),
                    word: word.to_string(),
                    suggestions: misspelling.suggestions,
                });
            }
        }
        issues
    }
}

fn restore(snapshot: &str) -> Result<Document, EditError> {
    parse_strict(snapshot)
        .map(|parsed| parsed.document)
        .map_err(|err| {
            warn!(%err, "history snapshot failed to parse; keeping current document");
            EditError::CorruptSnapshot(err)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::AttrPatch;

    #[test]
    fn corrupt_snapshot_leaves_state_untouched() {
        let mut session = EditingSession::open(r"{\rtf1 start\par}").unwrap();
        session.history.record(r"{\rtf1 not closed");
        session.history.record(write_rtf(&session.document).unwrap());
        let before = session.document.clone();
        let depth = session.undo_depth();

        let err = session.undo().unwrap_err();
        assert!(matches!(err, EditError::CorruptSnapshot(_)));
        assert_eq!(session.document, before);
        assert_eq!(session.undo_depth(), depth);
        assert!(!session.history.is_replaying());
    }

    #[test]
    fn failed_transaction_does_not_change_anything() {
        let mut session = EditingSession::open(r"{\rtf1 abc\par}").unwrap();
        let tx = Transaction::new(vec![
            crate::ops::Op::FormatText {
                range: TextRange::within(0, 0, 3),
                patch: AttrPatch::bold(true),
            },
            crate::ops::Op::RemoveParagraph { index: 9 },
        ]);
        assert!(session.apply(tx).is_err());
        assert!(!session.document.paragraphs[0].runs[0].attrs.bold);
        assert!(!session.can_undo());
    }

    #[test]
    #[tracing_test::traced_test]
    fn first_edit_warns_once_about_stale_style_tags() {
        let mut session = EditingSession::open(r"{\rtf1 Chapter <$Scr_Cs::2>One\par}").unwrap();
        assert!(!session.style_tags_stale());
        assert!(session.to_rtf().unwrap().contains("<$Scr_Cs::2>"));

        session
            .apply(Transaction::insert_text(TextPoint::new(0, 0), "The "))
            .unwrap();
        assert!(session.style_tags_stale());
        assert!(!session.to_rtf().unwrap().contains("<$Scr_Cs::2>"));
        assert!(logs_contain("edit invalidated style tag positions"));
    }

    #[test]
    fn record_change_after_in_place_edit() {
        let mut session = EditingSession::open(r"{\rtf1 one\par}").unwrap();
        session.document_mut().paragraphs[0].push_text("!", &Default::default());
        assert!(session.record_change().unwrap());
        assert!(!session.record_change().unwrap());
        assert!(session.undo().unwrap());
        assert_eq!(session.plain_text(), "one");
    }
}
