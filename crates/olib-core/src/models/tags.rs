//! Tags page and blob types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of a model's tags page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagDetail {
    pub name_full_tag: String,
    pub tag_part: String,
    pub source_url: String,
    pub digest: String,
    pub size_str: String,
    pub size_bytes: u64,
    #[serde(default)]
    pub context_window_str: Option<String>,
    #[serde(default)]
    pub input_type: Option<String>,
    pub modified_str: String,
    #[serde(default)]
    pub modified_iso: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagsPage {
    pub name_full_model: String,
    pub namespace: String,
    pub model_base_name: String,
    pub tags_page_url: String,
    pub tags: Vec<TagDetail>,
}

/// Fields recovered from a GGUF metadata snippet such as
/// `arch llama · parameters 8.03B · quantization Q4_0`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GgufMetadata {
    #[serde(default)]
    pub arch: Option<String>,
    #[serde(default)]
    pub parameters: Option<String>,
    #[serde(default)]
    pub quantization: Option<String>,
}

impl GgufMetadata {
    pub fn is_empty(&self) -> bool {
        self.arch.is_none() && self.parameters.is_none() && self.quantization.is_none()
    }
}

/// One file of a tag, with its content when it is text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobDetails {
    pub name_full_tag: String,
    pub canonical_name: String,
    pub source_url: String,
    pub digest: String,
    pub size_str: String,
    #[serde(default)]
    pub text_content: Option<String>,
    #[serde(default)]
    pub parsed_json_content: Option<serde_json::Value>,
    #[serde(default)]
    pub gguf_metadata_snippet: Option<String>,
    #[serde(default)]
    pub parsed_gguf_metadata: Option<GgufMetadata>,
    /// Age of the file list the blob was found in.
    #[serde(default)]
    pub listing_updated_str: Option<String>,
    #[serde(default)]
    pub listing_updated_iso: Option<DateTime<Utc>>,
}
