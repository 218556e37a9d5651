use serde::{Deserialize, Serialize};

use crate::model::DocumentMetadata;
use crate::parser::ParsedDocument;
use crate::style_tags::StyleTagAnnotation;

const DEFAULT_SCHEMA: &str = "scriv-rtf";
const DEFAULT_VERSION: u32 = 1;

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

fn default_version() -> u32 {
    DEFAULT_VERSION
}

/// Header tables and style-tag annotations as JSON, for hosts that keep
/// them next to the RTF file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentValue {
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub metadata: DocumentMetadata,
    #[serde(default)]
    pub style_tags: Vec<StyleTagAnnotation>,
}

impl DocumentValue {
    pub fn new(metadata: DocumentMetadata, style_tags: Vec<StyleTagAnnotation>) -> Self {
        Self {
            schema: default_schema(),
            version: default_version(),
            metadata,
            style_tags,
        }
    }

    pub fn from_parsed(parsed: &ParsedDocument) -> Self {
        Self::new(parsed.document.metadata.clone(), parsed.style_tags.clone())
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
