//! Spell-check seam. The dictionary is the host's; the session only maps
//! results back onto document positions.

use std::collections::HashSet;
use std::ops::Range;

use crate::ops::TextRange;

/// A misspelled word, as a byte range into the text that was checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Misspelling {
    pub range: Range<usize>,
    pub suggestions: Vec<String>,
}

pub trait SpellChecker {
    fn check_text(&self, text: &str) -> Vec<Misspelling>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpellingIssue {
    pub range: TextRange,
    pub word: String,
    pub suggestions: Vec<String>,
}

/// Accepts exactly the words it was built with, ignoring case.
#[derive(Debug, Clone, Default)]
pub struct WordListChecker {
    words: HashSet<String>,
}

impl WordListChecker {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|word| word.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }
}

impl SpellChecker for WordListChecker {
    fn check_text(&self, text: &str) -> Vec<Misspelling> {
        words(text)
            .filter(|range| !self.contains(&text[range.clone()]))
            .map(|range| Misspelling {
                range,
                suggestions: Vec::new(),
            })
            .collect()
    }
}

/// Byte ranges of alphabetic words; apostrophes inside a word are kept.
fn words(text: &str) -> impl Iterator<Item = Range<usize>> + '_ {
    let mut start: Option<usize> = None;
    let mut chars = text.char_indices().peekable();
    std::iter::from_fn(move || {
        while let Some((ix, ch)) = chars.next() {
            let inner_apostrophe = matches!(ch, '\'' | '\u{2019}')
                && start.is_some()
                && chars.peek().is_some_and(|(_, next)| next.is_alphabetic());
            if ch.is_alphabetic() || inner_apostrophe {
                start.get_or_insert(ix);
            } else if let Some(begin) = start.take() {
                return Some(begin..ix);
            }
        }
        start.take().map(|begin| begin..text.len())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_unknown_words_only() {
        let checker = WordListChecker::new(["the", "cat", "didn't"]);
        let text = "The catt didn\u{2019}t sit, didn't it";
        let found: Vec<&str> = checker
            .check_text(text)
            .into_iter()
            .map(|m| &text[m.range])
            .collect();
        assert_eq!(found, vec!["catt", "didn\u{2019}t", "sit", "it"]);
    }

    #[test]
    fn trailing_apostrophe_ends_the_word() {
        let ranges: Vec<_> = words("dogs' bowl").collect();
        assert_eq!(ranges, vec![0..4, 6..10]);
    }
}
