//! Blob pages and GGUF metadata snippets.

use super::html;
use crate::models::GgufMetadata;
use crate::network::RawPage;
use regex::Regex;
use std::sync::LazyLock;

static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[·,\s]+").unwrap());

static PARAMETER_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)?[kmbt]$").unwrap());

static QUANTIZATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[fq]\d+(?:_[0-9a-z]+)*|bf16|iq\d+_[0-9a-z_]+)$").unwrap());

const KEYS: &[&str] = &["arch", "parameters", "quantization"];

/// Text content of a blob page: the first `<pre>` of an HTML page, or the
/// body itself for plain-text responses.
pub(super) fn parse_blob_text(page: &RawPage) -> Option<String> {
    if !page.is_html() {
        return Some(page.body.clone()).filter(|b| !b.is_empty());
    }
    html::find(&page.body, "pre", |_| true).map(|pre| pre.raw_text())
}

/// Recover arch, parameter count and quantization from a snippet such as
/// `arch llama · parameters 8.03B · quantization Q4_0`.
///
/// Both `key value` and `key:value` forms are accepted; bare values are
/// classified by shape.
pub fn parse_gguf_snippet(snippet: &str) -> Option<GgufMetadata> {
    let lowered = snippet.trim().to_lowercase();
    let tokens: Vec<&str> = SEPARATORS
        .split(&lowered)
        .filter(|t| !t.is_empty())
        .collect();

    let mut meta = GgufMetadata::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i];
        if let Some((key, value)) = token.split_once(':') {
            if !value.is_empty() {
                assign(&mut meta, key, value);
                i += 1;
                continue;
            }
        }
        let key = token.trim_end_matches(':');
        if KEYS.contains(&key) {
            if let Some(value) = tokens.get(i + 1) {
                assign(&mut meta, key, value);
                i += 2;
                continue;
            }
        } else {
            classify(&mut meta, token);
        }
        i += 1;
    }

    if meta.is_empty() {
        None
    } else {
        Some(meta)
    }
}

fn assign(meta: &mut GgufMetadata, key: &str, value: &str) {
    match key {
        "arch" => meta.arch = Some(value.to_string()),
        "parameters" => meta.parameters = Some(value.to_uppercase()),
        "quantization" => meta.quantization = Some(value.to_uppercase()),
        _ => {}
    }
}

fn classify(meta: &mut GgufMetadata, token: &str) {
    if meta.parameters.is_none() && PARAMETER_COUNT.is_match(token) {
        meta.parameters = Some(token.to_uppercase());
    } else if meta.quantization.is_none() && QUANTIZATION.is_match(token) {
        meta.quantization = Some(token.to_uppercase());
    } else if meta.arch.is_none()
        && token.chars().all(|c| c.is_ascii_alphabetic() || c == '_')
    {
        meta.arch = Some(token.to_string());
    }
}
