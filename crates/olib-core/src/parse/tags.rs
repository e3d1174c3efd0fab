//! A model's tags page.

use super::html::{self, Element};
use super::values::{parse_relative_date, parse_size_bytes};
use super::{absolute_url, require_html};
use crate::models::{TagDetail, TagsPage};
use crate::network::RawPage;
use crate::upstream::ModelRef;
use crate::{OlibError, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

static HEX_DIGEST: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[0-9a-f]{7,64}\b").unwrap());

static SIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\d+(?:\.\d+)?\s*(?:[kmgt]i?b|b)$").unwrap());

pub(super) fn parse_tags_page(
    page: &RawPage,
    model: &ModelRef,
    base_url: &str,
    now: DateTime<Utc>,
) -> Result<TagsPage> {
    require_html(page)?;

    let rows = html::find_all(&page.body, "li", |li| {
        li.has_class("group") && li.has_class("p-3")
    });
    if rows.is_empty() {
        return Err(OlibError::parse(&page.url, "tags page has no tag rows"));
    }

    let full_name = model.full_name();
    let tags = rows
        .iter()
        .filter_map(|row| parse_row(row, model, &full_name, base_url, now))
        .collect();

    Ok(TagsPage {
        name_full_model: full_name,
        namespace: model.namespace.clone(),
        model_base_name: model.name.clone(),
        tags_page_url: page.url.clone(),
        tags,
    })
}

fn parse_row(
    row: &Element<'_>,
    model: &ModelRef,
    full_name: &str,
    base_url: &str,
    now: DateTime<Utc>,
) -> Option<TagDetail> {
    let anchor = row.find("a", |a| a.has_class("hover:underline") && a.has_attr("href"))?;
    let label = anchor.text();

    // Rows for other models (e.g. `llama3.1` on the `llama3` page) are skipped.
    let tag_part = match label.split_once(':') {
        Some((name, tag)) if name.eq_ignore_ascii_case(full_name) => tag.to_string(),
        Some(_) => return None,
        None if label.eq_ignore_ascii_case(full_name) => "latest".to_string(),
        None => return None,
    };

    let summary = row
        .find("a", |a| a.has_class("md:hidden"))
        .map(|a| a.text())
        .unwrap_or_else(|| row.text());
    let parts: Vec<&str> = summary.split('•').map(str::trim).collect();

    let digest = row
        .find("div", |d| d.has_class("font-mono"))
        .map(|d| d.text())
        .into_iter()
        .chain(parts.first().map(|p| p.to_string()))
        .find_map(|text| HEX_DIGEST.find(&text).map(|m| m.as_str().to_string()))
        .unwrap_or_else(|| "unknown".to_string());

    let mut size_str = "N/A".to_string();
    let mut context_window_str = None;
    let mut input_type = None;
    let mut modified_str = "N/A".to_string();
    for part in parts.iter().skip(1) {
        let lower = part.to_lowercase();
        if SIZE.is_match(part) {
            size_str = part.to_string();
        } else if lower.contains("context") {
            context_window_str = non_placeholder(
                lower
                    .replace("context window", "")
                    .replace("context", "")
                    .trim()
                    .to_uppercase(),
            );
        } else if lower.contains("input") {
            let kind = lower
                .find("input")
                .and_then(|at| part.get(..at))
                .unwrap_or(*part);
            input_type = non_placeholder(kind.trim().to_string());
        } else if ["ago", "yesterday", "now"].iter().any(|kw| lower.contains(kw)) {
            modified_str = part.to_string();
        }
    }

    Some(TagDetail {
        name_full_tag: model.full_tag_name(&tag_part),
        source_url: absolute_url(base_url, &anchor.attr("href")?),
        digest,
        size_bytes: parse_size_bytes(&size_str),
        size_str,
        context_window_str,
        input_type,
        modified_iso: parse_relative_date(&modified_str, now),
        modified_str,
        is_default: row
            .find_all("span", |_| true)
            .iter()
            .any(|s| s.text().eq_ignore_ascii_case("default")),
        tag_part,
    })
}

fn non_placeholder(value: String) -> Option<String> {
    if value.is_empty() || value == "-" {
        None
    } else {
        Some(value)
    }
}
