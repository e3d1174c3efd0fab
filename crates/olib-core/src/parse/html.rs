//! Minimal element scanner for server-rendered pages.
//!
//! Upstream pages are plain server-rendered HTML with stable `x-test-*`
//! marker attributes, so a tag scanner that understands nesting of
//! same-named elements is enough. It does not build a DOM; every query
//! rescans the slice it is given.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static OPEN_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<([a-zA-Z][a-zA-Z0-9-]*)((?:[^>"']|"[^"]*"|'[^']*')*)>"#).unwrap()
});

static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<(/?)([a-zA-Z][a-zA-Z0-9-]*)(?:[^>"']|"[^"]*"|'[^']*')*>"#).unwrap()
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s=/>"']+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#).unwrap()
});

static MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<!--.*?-->|</?[a-zA-Z](?:[^>"']|"[^"]*"|'[^']*')*>"#).unwrap());

static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").unwrap());

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// One element found in a page.
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    name: &'a str,
    attrs: &'a str,
    inner: &'a str,
}

impl<'a> Element<'a> {
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Decoded value of attribute `name`. Valueless attributes yield `""`.
    pub fn attr(&self, name: &str) -> Option<String> {
        ATTRIBUTE.captures_iter(self.attrs).find_map(|caps| {
            let key = caps.get(1)?.as_str();
            if !key.eq_ignore_ascii_case(name) {
                return None;
            }
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map_or("", |m| m.as_str());
            Some(decode_entities(value))
        })
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn inner_html(&self) -> &'a str {
        self.inner
    }

    /// Visible text with whitespace collapsed.
    pub fn text(&self) -> String {
        text_of(self.inner)
    }

    /// Text with markup removed but whitespace preserved.
    pub fn raw_text(&self) -> String {
        decode_entities(&MARKUP.replace_all(self.inner, ""))
    }

    /// Descendants named `tag` (`"*"` for any) that satisfy `pred`.
    pub fn find_all(&self, tag: &str, pred: impl Fn(&Element<'a>) -> bool) -> Vec<Element<'a>> {
        find_all(self.inner, tag, pred)
    }

    pub fn find(&self, tag: &str, pred: impl Fn(&Element<'a>) -> bool) -> Option<Element<'a>> {
        find(self.inner, tag, pred)
    }
}

/// Wrap a whole page so it can be queried like an element.
pub fn document(html: &str) -> Element<'_> {
    Element {
        name: "#document",
        attrs: "",
        inner: html,
    }
}

/// All elements named `tag` (`"*"` for any) in `html` that satisfy `pred`,
/// in document order. Nested matches are included.
pub fn find_all<'a>(
    html: &'a str,
    tag: &str,
    pred: impl Fn(&Element<'a>) -> bool,
) -> Vec<Element<'a>> {
    let mut found = Vec::new();
    for caps in OPEN_TAG.captures_iter(html) {
        if let Some(element) = element_at(html, &caps, tag) {
            if pred(&element) {
                found.push(element);
            }
        }
    }
    found
}

/// First element named `tag` that satisfies `pred`.
pub fn find<'a>(
    html: &'a str,
    tag: &str,
    pred: impl Fn(&Element<'a>) -> bool,
) -> Option<Element<'a>> {
    OPEN_TAG
        .captures_iter(html)
        .filter_map(|caps| element_at(html, &caps, tag))
        .find(|element| pred(element))
}

/// Visible text of an HTML fragment with whitespace collapsed.
pub fn text_of(html: &str) -> String {
    let stripped = MARKUP.replace_all(html, " ");
    decode_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decode named and numeric character references.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                "bull" => Some('•'),
                "middot" => Some('·'),
                _ if entity.starts_with("#x") || entity.starts_with("#X") => {
                    u32::from_str_radix(&entity[2..], 16).ok().and_then(char::from_u32)
                }
                _ if entity.starts_with('#') => {
                    entity[1..].parse::<u32>().ok().and_then(char::from_u32)
                }
                _ => None,
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

fn element_at<'a>(html: &'a str, caps: &Captures<'a>, tag: &str) -> Option<Element<'a>> {
    let whole = caps.get(0)?;
    let name = caps.get(1)?.as_str();
    if tag != "*" && !name.eq_ignore_ascii_case(tag) {
        return None;
    }
    let attrs = caps.get(2).map_or("", |m| m.as_str());
    let self_closing = attrs.trim_end().ends_with('/')
        || VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name));
    let inner = if self_closing {
        ""
    } else {
        inner_until_close(html, whole.end(), name)
    };
    Some(Element { name, attrs, inner })
}

/// Content from `start` up to the tag closing an element named `name`.
/// An unclosed element runs to the end of the document.
fn inner_until_close<'a>(html: &'a str, start: usize, name: &str) -> &'a str {
    let rest = &html[start..];
    let mut depth = 1usize;
    for caps in ANY_TAG.captures_iter(rest) {
        let (Some(whole), Some(tag_name)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        if !tag_name.as_str().eq_ignore_ascii_case(name) {
            continue;
        }
        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        if closing {
            depth -= 1;
            if depth == 0 {
                return &rest[..whole.start()];
            }
        } else if !whole.as_str().ends_with("/>") {
            depth += 1;
        }
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAGMENT: &str = r#"
        <ul role="list">
          <li x-test-model class="flex items-baseline">
            <a href="/library/llama3"><div><span x-test-search-response-title>llama3</span></div></a>
            <p class="max-w-lg break-words">Meta&#39;s   model &amp; friends</p>
            <div class="outer"><div class="inner">nested</div>after</div>
            <input class="command" name="command" value="ollama run llama3:8b">
          </li>
          <li x-test-model><span x-test-capability>tools</span></li>
        </ul>"#;

    #[test]
    fn test_find_all_by_marker() {
        let items = find_all(FRAGMENT, "li", |el| el.has_attr("x-test-model"));
        assert_eq!(items.len(), 2);
        assert!(items[0].inner_html().contains("llama3"));
        assert_eq!(items[1].text(), "tools");
    }

    #[test]
    fn test_nested_same_name_elements_close_correctly() {
        let outer = find(FRAGMENT, "div", |el| el.has_class("outer")).unwrap();
        assert_eq!(outer.text(), "nested after");
    }

    #[test]
    fn test_attributes_and_classes() {
        let input = find(FRAGMENT, "input", |el| el.attr("name").as_deref() == Some("command"))
            .unwrap();
        assert_eq!(input.attr("value").unwrap(), "ollama run llama3:8b");
        assert!(input.has_class("command"));
        assert_eq!(input.inner_html(), "");

        let title = find(FRAGMENT, "span", |el| el.has_attr("x-test-search-response-title"));
        assert_eq!(title.unwrap().attr("x-test-search-response-title").unwrap(), "");
    }

    #[test]
    fn test_text_decodes_and_collapses() {
        let p = find(FRAGMENT, "p", |el| el.has_class("max-w-lg")).unwrap();
        assert_eq!(p.text(), "Meta's model & friends");
    }

    #[test]
    fn test_raw_text_keeps_layout() {
        let pre = find("<pre>{{ .System }}\n  &lt;|eot|&gt;</pre>", "pre", |_| true).unwrap();
        assert_eq!(pre.raw_text(), "{{ .System }}\n  <|eot|>");
    }

    #[test]
    fn test_unknown_entities_are_kept() {
        assert_eq!(decode_entities("a &bogus; b &#x41;"), "a &bogus; b A");
    }
}
