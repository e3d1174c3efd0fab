//! Listing, namespace and search pages.

use super::html::{self, Element};
use super::values::{parse_pull_count, resolve_date};
use super::{absolute_url, path_segments, require_html};
use crate::models::ModelListItem;
use crate::network::RawPage;
use crate::upstream::{full_model_name, LIBRARY_NAMESPACE};
use crate::{OlibError, Result};
use chrono::{DateTime, Utc};

pub(super) fn parse_listing(
    page: &RawPage,
    base_url: &str,
    now: DateTime<Utc>,
) -> Result<Vec<ModelListItem>> {
    require_html(page)?;

    let cards = html::find_all(&page.body, "li", |li| li.has_attr("x-test-model"));
    if cards.is_empty() && !has_listing_markers(&page.body) {
        return Err(OlibError::parse(
            &page.url,
            "neither a model list nor a search form was found",
        ));
    }

    Ok(cards
        .iter()
        .filter_map(|li| parse_item(li, base_url, now))
        .collect())
}

/// An empty result page still renders the list container or the search box.
fn has_listing_markers(body: &str) -> bool {
    html::find(body, "ul", |ul| ul.attr("role").as_deref() == Some("list")).is_some()
        || html::find(body, "input", |input| input.attr("name").as_deref() == Some("q")).is_some()
}

fn parse_item(li: &Element<'_>, base_url: &str, now: DateTime<Utc>) -> Option<ModelListItem> {
    let href = li.find("a", |a| a.has_attr("href"))?.attr("href")?;
    let source_url = absolute_url(base_url, &href);

    let segments = path_segments(&source_url);
    let (mut namespace, mut name) = match segments.as_slice() {
        [namespace, name, ..] => (namespace.to_lowercase(), name.to_lowercase()),
        [name] => (LIBRARY_NAMESPACE.to_string(), name.to_lowercase()),
        [] => (LIBRARY_NAMESPACE.to_string(), String::new()),
    };

    // The card title is authoritative when present.
    if let Some(title) = li.find("span", |s| s.has_attr("x-test-search-response-title")) {
        let title = title.text().to_lowercase();
        match title.split_once('/') {
            Some((ns, model)) => {
                namespace = ns.to_string();
                name = model.to_string();
            }
            None if namespace == LIBRARY_NAMESPACE && !title.is_empty() => name = title,
            None => {}
        }
    }
    if name.is_empty() {
        return None;
    }

    let description = li
        .find("p", |p| p.has_class("max-w-lg"))
        .map(|p| p.text())
        .unwrap_or_default();

    let pull_count_str = marker_text(li, "x-test-pull-count").unwrap_or_else(|| "0".to_string());
    let tags_count = marker_text(li, "x-test-tag-count")
        .and_then(|t| t.parse().ok())
        .unwrap_or(0);

    let last_updated_str = marker_text(li, "x-test-updated").unwrap_or_default();
    let last_updated_iso = resolve_date(
        updated_title(li).as_deref(),
        &last_updated_str,
        now,
    );

    Some(ModelListItem {
        source_url,
        name_full_model: full_model_name(&namespace, &name),
        namespace,
        model_base_name: name,
        description,
        pull_count: parse_pull_count(&pull_count_str),
        pull_count_str,
        tags_count,
        last_updated_str,
        last_updated_iso,
        capabilities: marker_texts(li, "x-test-capability"),
        sizes: marker_texts(li, "x-test-size"),
    })
}

/// Text of the first span carrying `marker`.
pub(super) fn marker_text(scope: &Element<'_>, marker: &str) -> Option<String> {
    scope
        .find("span", |s| s.has_attr(marker))
        .map(|s| s.text())
}

/// Lowercased texts of every span carrying `marker`.
pub(super) fn marker_texts(scope: &Element<'_>, marker: &str) -> Vec<String> {
    scope
        .find_all("span", |s| s.has_attr(marker))
        .iter()
        .map(|s| s.text().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Absolute timestamp from the `title` of the span wrapping `x-test-updated`.
pub(super) fn updated_title(scope: &Element<'_>) -> Option<String> {
    scope
        .find_all("span", |s| s.has_attr("title"))
        .into_iter()
        .rev()
        .find(|s| s.inner_html().contains("x-test-updated"))
        .and_then(|s| s.attr("title"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::fixtures::LISTING;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_parses_listing_cards() {
        let page = RawPage::new("https://ollama.com/library", LISTING);
        let items = parse_listing(&page, "https://ollama.com", now()).unwrap();
        assert_eq!(items.len(), 2);

        let llama = &items[0];
        assert_eq!(llama.source_url, "https://ollama.com/library/llama3.1");
        assert_eq!(llama.namespace, "library");
        assert_eq!(llama.name_full_model, "llama3.1");
        assert!(llama.description.starts_with("Llama 3.1 is"));
        assert_eq!(llama.pull_count, 98_500_000);
        assert_eq!(llama.tags_count, 93);
        assert_eq!(llama.capabilities, vec!["tools"]);
        assert_eq!(llama.sizes, vec!["8b", "70b"]);
        assert_eq!(llama.last_updated_str, "6 months ago");
        assert_eq!(
            llama.last_updated_iso,
            Some(Utc.with_ymd_and_hms(2024, 12, 3, 16, 5, 0).unwrap())
        );

        let user = &items[1];
        assert_eq!(user.namespace, "jmorganca");
        assert_eq!(user.model_base_name, "codellama");
        assert_eq!(user.name_full_model, "jmorganca/codellama");
        assert_eq!(user.pull_count, 1_234);
        assert_eq!(user.capabilities, vec!["vision", "tools"]);
        assert_eq!(user.last_updated_iso, Some(now() - chrono::Duration::days(3)));
    }

    #[test]
    fn test_page_without_cards_is_empty() {
        let page = RawPage::new(
            "https://ollama.com/search?q=zzz",
            r#"<html><body><form action="/search"><input name="q" value="zzz"></form>
            <p>No models found</p></body></html>"#,
        );
        assert!(parse_listing(&page, "https://ollama.com", now()).unwrap().is_empty());

        let page = RawPage::new(
            "https://ollama.com/library?c=embedding",
            r#"<html><body><ul role="list"></ul></body></html>"#,
        );
        assert!(parse_listing(&page, "https://ollama.com", now()).unwrap().is_empty());
    }

    #[test]
    fn test_unrecognized_layout_is_a_parse_error() {
        let page = RawPage::new(
            "https://ollama.com/library",
            r#"<html><body><div class="new-design">cards moved</div></body></html>"#,
        );
        let err = parse_listing(&page, "https://ollama.com", now()).unwrap_err();
        assert_eq!(err.kind(), "upstream_parse_error");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_non_html_is_a_parse_error() {
        let page = RawPage {
            content_type: Some("application/json".into()),
            ..RawPage::new("https://ollama.com/library", "{}")
        };
        let err = parse_listing(&page, "https://ollama.com", now()).unwrap_err();
        assert_eq!(err.kind(), "upstream_parse_error");
    }
}
