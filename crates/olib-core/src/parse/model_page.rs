//! Model and tag detail pages.

use super::html::{self, Element};
use super::listing::{marker_text, marker_texts, updated_title};
use super::values::{parse_pull_count, parse_relative_date, resolve_date};
use super::{absolute_url, path_segments, require_html};
use crate::models::{FileSummary, ModelPage, TagSummary};
use crate::network::RawPage;
use crate::upstream::{full_model_name, LIBRARY_NAMESPACE};
use crate::{OlibError, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

static BLOB_DIGEST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/blobs/([0-9a-fA-F]{12,})").unwrap());

static TAGS_COUNT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s+[Tt]ags").unwrap());

static AGO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+ \w+ ago").unwrap());

/// Markers of which at least one must be present on a real model page.
const PAGE_MARKERS: &[&str] = &[
    "x-test-model-name",
    "x-test-pull-count",
    "summary-content",
    "file-explorer",
];

pub(super) fn parse_model_page(
    page: &RawPage,
    base_url: &str,
    now: DateTime<Utc>,
) -> Result<ModelPage> {
    require_html(page)?;
    if !PAGE_MARKERS.iter().any(|m| page.body.contains(m)) {
        return Err(OlibError::parse(
            &page.url,
            "none of the model page markers were found",
        ));
    }
    let doc = html::document(&page.body);

    let (mut namespace, mut name, url_tag) = match path_segments(&page.url).as_slice() {
        [namespace, model, ..] => {
            let (name, tag) = split_tag(model);
            (namespace.to_lowercase(), name, tag)
        }
        [model] => {
            let (name, tag) = split_tag(model);
            (LIBRARY_NAMESPACE.to_string(), name, tag)
        }
        [] => (LIBRARY_NAMESPACE.to_string(), String::new(), None),
    };

    if let Some(title) = doc
        .find("a", |a| a.has_attr("x-test-model-name"))
        .and_then(|a| a.attr("title"))
    {
        let title = title.trim().to_lowercase();
        match title.split_once('/') {
            Some((ns, model)) => {
                namespace = ns.to_string();
                name = model.to_string();
            }
            None if !title.is_empty() => name = title,
            None => {}
        }
    }
    if name.is_empty() {
        return Err(OlibError::parse(&page.url, "model name not found"));
    }
    let full_name = full_model_name(&namespace, &name);

    let summary = by_id(&doc, "summary-content")
        .map(|el| el.text())
        .unwrap_or_default();

    let readme_content = by_id(&doc, "readme")
        .and_then(|readme| by_id(&readme, "display"))
        .map(|display| display.inner_html().trim().to_string())
        .filter(|markup| !markup.is_empty());

    let pull_count_str = marker_text(&doc, "x-test-pull-count").unwrap_or_else(|| "0".to_string());
    let last_updated_str = marker_text(&doc, "x-test-updated").unwrap_or_default();
    let last_updated_iso = resolve_date(updated_title(&doc).as_deref(), &last_updated_str, now);

    let capabilities = doc
        .find_all("span", |s| s.has_class("bg-indigo-50"))
        .iter()
        .map(|s| s.text().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();

    let tag_command = doc
        .find("input", |i| i.attr("name").as_deref() == Some("command"))
        .and_then(|i| i.attr("value"))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let mut dropdown = tag_dropdown(&doc, &namespace, &full_name);
    let active_tag_part = url_tag
        .or_else(|| {
            let command = tag_command.as_deref()?;
            let target = command.split_whitespace().last()?;
            match target.rsplit_once(':') {
                Some((_, tag)) => Some(tag.to_lowercase()),
                None if target == full_name => Some("latest".to_string()),
                None => None,
            }
        })
        .or_else(|| dropdown.iter().find(|t| t.is_active).map(|t| t.tag_part.clone()))
        .or_else(|| dropdown.first().map(|t| t.tag_part.clone()));
    for entry in &mut dropdown {
        entry.is_active = active_tag_part.as_deref() == Some(entry.tag_part.as_str());
    }
    let active_tag_full_name = active_tag_part
        .as_ref()
        .map(|tag| format!("{}:{}", full_name, tag));

    let tags_link = doc.find("a", |a| a.has_attr("x-test-tags-link"));
    let all_tags_page_url = tags_link
        .and_then(|a| a.attr("href"))
        .map(|href| absolute_url(base_url, &href))
        .unwrap_or_else(|| format!("{}/{}/{}/tags", base_url.trim_end_matches('/'), namespace, name));
    let total_tags_count = tags_link
        .and_then(|a| TAGS_COUNT.captures(&a.text()).map(|c| c[1].to_string()))
        .and_then(|n| n.parse().ok());

    Ok(ModelPage {
        name_full_model: full_name,
        namespace,
        model_base_name: name,
        active_tag_part,
        active_tag_full_name,
        source_url: page.url.clone(),
        summary,
        pull_count: parse_pull_count(&pull_count_str),
        pull_count_str,
        last_updated_str,
        last_updated_iso,
        capabilities,
        sizes: marker_texts(&doc, "x-test-size"),
        readme_content,
        tag_command,
        tag_files_summary: file_summaries(&doc, base_url, now),
        all_tags_dropdown_summary: dropdown,
        all_tags_page_url,
        total_tags_count,
    })
}

fn by_id<'a>(scope: &Element<'a>, id: &str) -> Option<Element<'a>> {
    scope.find("*", |el| el.attr("id").as_deref() == Some(id))
}

/// Files listed in the page's file explorer.
fn file_summaries(doc: &Element<'_>, base_url: &str, now: DateTime<Utc>) -> Vec<FileSummary> {
    let Some(explorer) = by_id(doc, "file-explorer") else {
        return Vec::new();
    };
    let updated_str = listing_updated(&explorer);
    let updated_iso = updated_str
        .as_deref()
        .and_then(|text| parse_relative_date(text, now));

    explorer
        .find_all("a", |a| {
            a.has_class("group") && a.has_class("grid-cols-12") && a.has_attr("href")
        })
        .iter()
        .filter_map(|row| {
            let href = row.attr("href")?;
            let column = |class: &str| {
                row.find("div", |d| d.has_class(class))
                    .map(|d| d.text())
                    .filter(|t| !t.is_empty())
            };
            Some(FileSummary {
                name: column("sm:col-span-2")
                    .map(|n| n.to_lowercase())
                    .unwrap_or_else(|| "unknown".to_string()),
                digest: BLOB_DIGEST
                    .captures(&href)
                    .map(|c| c[1].to_lowercase()),
                blob_url: absolute_url(base_url, &href),
                size_str: column("sm:col-start-12").unwrap_or_else(|| "0B".to_string()),
                snippet: column("sm:col-span-8").unwrap_or_default(),
                updated_str: updated_str.clone(),
                updated_iso,
            })
        })
        .collect()
}

/// Age from the banner above the file list, without the "Updated" prefix.
fn listing_updated(explorer: &Element<'_>) -> Option<String> {
    let text = explorer
        .find("div", |d| d.has_class("bg-neutral-50"))?
        .find("p", |_| true)?
        .text();
    if text.contains("Updated") {
        Some(text.replace("Updated", "").trim().to_string()).filter(|t| !t.is_empty())
    } else if AGO.is_match(&text) {
        Some(text)
    } else {
        None
    }
}

/// Entries of the tag dropdown. `is_active` reflects the page highlight
/// until the caller settles the active tag.
fn tag_dropdown(doc: &Element<'_>, namespace: &str, full_name: &str) -> Vec<TagSummary> {
    let Some(nav) = by_id(doc, "tags-nav") else {
        return Vec::new();
    };
    let own_prefix = format!("/{}/", namespace);

    nav.find_all("a", |a| {
        a.attr("href").is_some_and(|href| {
            href.starts_with("/library/") || href.starts_with(&own_prefix)
        })
    })
    .iter()
    .filter(|a| !a.text().contains("View all"))
    .filter_map(|a| {
        let tag_part = a
            .find("span", |s| s.has_class("truncate"))?
            .find("span", |s| s.has_class("group-hover:underline"))?
            .text()
            .to_lowercase();
        if tag_part.is_empty() {
            return None;
        }
        let size_str = a
            .find("span", |s| s.has_class("text-xs") && s.has_class("text-neutral-400"))
            .map(|s| s.text())
            .filter(|t| !t.is_empty());
        Some(TagSummary {
            name_full_tag: format!("{}:{}", full_name, tag_part),
            tag_part,
            size_str,
            is_active: a.has_class("bg-neutral-100"),
        })
    })
    .collect()
}

fn split_tag(segment: &str) -> (String, Option<String>) {
    let segment = segment.to_lowercase();
    match segment.split_once(':') {
        Some((name, tag)) if !tag.is_empty() => (name.to_string(), Some(tag.to_string())),
        Some((name, _)) => (name.to_string(), None),
        None => (segment, None),
    }
}
