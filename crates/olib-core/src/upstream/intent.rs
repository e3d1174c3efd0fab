//! What to fetch from upstream, independent of how it is keyed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace that hosts the official models.
pub const LIBRARY_NAMESPACE: &str = "library";

/// Listing and search sort order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Popular,
    Newest,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Popular => "popular",
            SortOrder::Newest => "newest",
        }
    }

    /// Parse an already-normalized value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "popular" => Some(SortOrder::Popular),
            "newest" => Some(SortOrder::Newest),
            _ => None,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A model addressed by namespace and base name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelRef {
    pub namespace: String,
    pub name: String,
}

impl ModelRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn library(name: impl Into<String>) -> Self {
        Self::new(LIBRARY_NAMESPACE, name)
    }

    pub fn is_library(&self) -> bool {
        self.namespace == LIBRARY_NAMESPACE
    }

    /// `name` for library models, `namespace/name` otherwise.
    pub fn full_name(&self) -> String {
        full_model_name(&self.namespace, &self.name)
    }

    /// `full_name:tag`.
    pub fn full_tag_name(&self, tag: &str) -> String {
        format!("{}:{}", self.full_name(), tag)
    }

    /// The same model under the library namespace.
    pub fn in_library(&self) -> Self {
        Self::library(self.name.clone())
    }

    /// Upstream path, e.g. `/library/llama3` or `/library/llama3:8b`.
    pub fn path(&self, tag: Option<&str>) -> String {
        match tag {
            Some(tag) => format!("/{}/{}:{}", self.namespace, self.name, tag),
            None => format!("/{}/{}", self.namespace, self.name),
        }
    }
}

pub fn full_model_name(namespace: &str, name: &str) -> String {
    if namespace == LIBRARY_NAMESPACE {
        name.to_string()
    } else {
        format!("{}/{}", namespace, name)
    }
}

/// Identifies one file in a tag's manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum BlobId {
    /// A well-known layer name such as `model` or `params`.
    Name(String),
    /// A lowercase hex digest or digest prefix, without any `sha256` prefix.
    Digest(String),
}

impl BlobId {
    pub const KNOWN_NAMES: &'static [&'static str] = &[
        "model",
        "params",
        "template",
        "license",
        "system",
        "modelfile",
        "adapter",
        "projector",
        "messages",
    ];

    /// Layers whose content is text worth fetching.
    pub const TEXT_NAMES: &'static [&'static str] =
        &["params", "template", "license", "system", "modelfile"];

    pub fn as_str(&self) -> &str {
        match self {
            BlobId::Name(name) => name,
            BlobId::Digest(hex) => hex,
        }
    }

    /// Whether a manifest entry with this name and digest is the one addressed.
    pub fn matches(&self, name: &str, digest: Option<&str>) -> bool {
        match self {
            BlobId::Name(wanted) => wanted.eq_ignore_ascii_case(name),
            BlobId::Digest(prefix) => digest
                .map(|d| d.to_ascii_lowercase().starts_with(prefix.as_str()))
                .unwrap_or(false),
        }
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One upstream fetch, fully validated and normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchIntent {
    Listing {
        namespace: String,
        sort: SortOrder,
        capabilities: Vec<String>,
    },
    Search {
        query: String,
        sort: SortOrder,
        capabilities: Vec<String>,
    },
    ModelDetail {
        model: ModelRef,
        tag: Option<String>,
    },
    Tags {
        model: ModelRef,
    },
    Blob {
        model: ModelRef,
        tag: String,
        blob: BlobId,
    },
}

impl FetchIntent {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchIntent::Listing { .. } => "listing",
            FetchIntent::Search { .. } => "search",
            FetchIntent::ModelDetail { .. } => "model",
            FetchIntent::Tags { .. } => "tags",
            FetchIntent::Blob { .. } => "blob",
        }
    }
}
