//! Listing and search result types.

use crate::upstream::SortOrder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One model card on a listing or search page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelListItem {
    pub source_url: String,
    pub namespace: String,
    pub model_base_name: String,
    pub name_full_model: String,
    pub description: String,
    pub pull_count_str: String,
    pub pull_count: u64,
    pub tags_count: u32,
    pub last_updated_str: String,
    #[serde(default)]
    pub last_updated_iso: Option<DateTime<Utc>>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
}

impl ModelListItem {
    /// True when the item carries every capability in `wanted`.
    pub fn has_capabilities(&self, wanted: &[String]) -> bool {
        wanted.iter().all(|cap| self.capabilities.contains(cap))
    }
}

/// Filters that were applied to a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterInfo {
    pub capabilities: Vec<String>,
}

impl FilterInfo {
    /// `None` when no capability filter was requested.
    pub fn from_capabilities(capabilities: &[String]) -> Option<Self> {
        if capabilities.is_empty() {
            None
        } else {
            Some(Self {
                capabilities: capabilities.to_vec(),
            })
        }
    }
}

/// Models of one namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingResponse {
    pub queried_namespace: String,
    pub sort_order: SortOrder,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<FilterInfo>,
    pub results: Vec<ModelListItem>,
}

/// Search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub sort_order: SortOrder,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<FilterInfo>,
    pub results: Vec<ModelListItem>,
}

/// Keep only items that carry every capability in `wanted`.
pub fn filter_by_capabilities(items: Vec<ModelListItem>, wanted: &[String]) -> Vec<ModelListItem> {
    if wanted.is_empty() {
        return items;
    }
    items
        .into_iter()
        .filter(|item| item.has_capabilities(wanted))
        .collect()
}
