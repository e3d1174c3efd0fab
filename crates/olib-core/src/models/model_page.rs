//! Model and tag detail page types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One file (layer) listed in a tag's file explorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSummary {
    pub name: String,
    pub blob_url: String,
    #[serde(default)]
    pub digest: Option<String>,
    pub size_str: String,
    pub snippet: String,
    /// Relative age shown above the file list, shared by every file.
    #[serde(default)]
    pub updated_str: Option<String>,
    #[serde(default)]
    pub updated_iso: Option<DateTime<Utc>>,
}

/// One entry of the tag dropdown on a model page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagSummary {
    pub tag_part: String,
    pub name_full_tag: String,
    #[serde(default)]
    pub size_str: Option<String>,
    pub is_active: bool,
}

/// A model's detail page, optionally focused on one tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPage {
    pub name_full_model: String,
    pub namespace: String,
    pub model_base_name: String,
    #[serde(default)]
    pub active_tag_part: Option<String>,
    #[serde(default)]
    pub active_tag_full_name: Option<String>,
    pub source_url: String,
    pub summary: String,
    pub pull_count_str: String,
    pub pull_count: u64,
    pub last_updated_str: String,
    #[serde(default)]
    pub last_updated_iso: Option<DateTime<Utc>>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    /// Rendered readme markup.
    #[serde(default)]
    pub readme_content: Option<String>,
    #[serde(default)]
    pub tag_command: Option<String>,
    #[serde(default)]
    pub tag_files_summary: Vec<FileSummary>,
    #[serde(default)]
    pub all_tags_dropdown_summary: Vec<TagSummary>,
    pub all_tags_page_url: String,
    #[serde(default)]
    pub total_tags_count: Option<u32>,
}

impl ModelPage {
    /// Mark `tag` as the page's active tag.
    pub fn set_active_tag(&mut self, tag: &str) {
        self.active_tag_part = Some(tag.to_string());
        self.active_tag_full_name = Some(format!("{}:{}", self.name_full_model, tag));
        for entry in &mut self.all_tags_dropdown_summary {
            entry.is_active = entry.tag_part == tag;
        }
    }
}
