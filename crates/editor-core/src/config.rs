use serde::{Deserialize, Serialize};

use crate::history::DEFAULT_HISTORY_CAPACITY;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Undo snapshots kept before the oldest is evicted; 0 selects the default.
    pub max_undo: usize,
    /// Write decoded style tags back into the RTF while the text they were
    /// anchored to is unedited.
    pub reembed_style_tags: bool,
    /// Log a warning the first time an edit invalidates style-tag anchors.
    pub warn_on_stale_style_tags: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_undo: DEFAULT_HISTORY_CAPACITY,
            reembed_style_tags: true,
            warn_on_stale_style_tags: true,
        }
    }
}

impl SessionConfig {
    pub(crate) fn with_defaults(mut self) -> Self {
        if self.max_undo == 0 {
            self.max_undo = DEFAULT_HISTORY_CAPACITY;
        }
        self
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(s).map(Self::with_defaults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_means_default() {
        let config = SessionConfig {
            max_undo: 0,
            ..Default::default()
        }
        .with_defaults();
        assert_eq!(config.max_undo, 100);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config = SessionConfig::from_json_str(r#"{ "reembed_style_tags": false }"#).unwrap();
        assert_eq!(config.max_undo, 100);
        assert!(!config.reembed_style_tags);
        assert!(config.warn_on_stale_style_tags);

        let config = SessionConfig::from_json_str(r#"{ "max_undo": 0 }"#).unwrap();
        assert_eq!(config.max_undo, 100);
    }
}
