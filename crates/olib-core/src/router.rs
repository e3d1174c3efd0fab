//! Request routing: validation, normalization and cache key derivation.
//!
//! [`Route::parse`] is pure and fails fast. A request it rejects never
//! reaches the cache or upstream.
//!
//! | Request | Cache key |
//! |---|---|
//! | `/{ns}?o=&c=` | `list:{ns}:o={o}:c={caps}` |
//! | `/search?q=&o=&c=` | `search:q={q}:o={o}:c={caps}` |
//! | `/{ns}/{model}[:{tag}]` | `model:{full}[:{tag}]` |
//! | `/{ns}/{model}/tags` | `tags:{full}` |
//! | `/{ns}/{model}:{tag}/blobs/{id}` | `blob:{full}:{tag}:{id}` |
//!
//! `{full}` is the model name with the `library` namespace elided.

use crate::cache::CacheKey;
use crate::network::{retry_async, RetryConfig};
use crate::upstream::{BlobId, FetchIntent, Fetcher, ModelRef, SortOrder};
use crate::{OlibError, Result};
use serde_json::Value;
use tracing::{debug, warn};

/// A validated request: where it is cached and what to fetch on a miss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub key: CacheKey,
    pub intent: FetchIntent,
}

/// Query parameters that influence a route. Everything else is ignored.
#[derive(Debug, Default)]
struct Params {
    sort: Option<String>,
    capabilities: Option<String>,
    query: Option<String>,
}

impl Params {
    fn parse(query: Option<&str>) -> Self {
        let mut params = Params::default();
        for (name, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            let slot = match name.as_ref() {
                "o" => &mut params.sort,
                "c" => &mut params.capabilities,
                "q" => &mut params.query,
                _ => continue,
            };
            // First occurrence wins.
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }
}

impl Route {
    /// Parse a request path (`/library/llama3:8b`) and raw query string.
    pub fn parse(path: &str, query: Option<&str>) -> Result<Route> {
        let trimmed = path.trim().trim_start_matches('/');
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err(OlibError::not_found("no route for '/'"));
        }

        let segments = trimmed
            .split('/')
            .map(|raw| {
                urlencoding::decode(raw)
                    .map(|s| s.trim().to_lowercase())
                    .map_err(|_| OlibError::bad_request("path is not valid UTF-8"))
            })
            .collect::<Result<Vec<_>>>()?;
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
        let params = Params::parse(query);

        match segments.as_slice() {
            ["search"] => Self::search(&params),
            [namespace] => Self::listing(namespace, &params),
            [namespace, model] => {
                let namespace = identifier("namespace", namespace)?;
                let (name, tag) = model_and_tag(model)?;
                let model = ModelRef::new(namespace, name);
                let key = match &tag {
                    Some(tag) => format!("model:{}", model.full_tag_name(tag)),
                    None => format!("model:{}", model.full_name()),
                };
                Ok(Route {
                    key: key.into(),
                    intent: FetchIntent::ModelDetail { model, tag },
                })
            }
            [namespace, model, "tags"] => {
                let namespace = identifier("namespace", namespace)?;
                let (name, tag) = model_and_tag(model)?;
                if tag.is_some() {
                    return Err(OlibError::bad_request(
                        "the tags route takes a model name without a tag",
                    ));
                }
                let model = ModelRef::new(namespace, name);
                Ok(Route {
                    key: format!("tags:{}", model.full_name()).into(),
                    intent: FetchIntent::Tags { model },
                })
            }
            [namespace, model, "blobs", id] => {
                let namespace = identifier("namespace", namespace)?;
                let (name, tag) = model_and_tag(model)?;
                let tag = tag.ok_or_else(|| {
                    OlibError::bad_request("blob routes need a tag, e.g. /library/llama3:8b/blobs/model")
                })?;
                let blob = blob_id(id)?;
                let model = ModelRef::new(namespace, name);
                Ok(Route {
                    key: format!("blob:{}:{}", model.full_tag_name(&tag), blob).into(),
                    intent: FetchIntent::Blob { model, tag, blob },
                })
            }
            _ => Err(OlibError::not_found(format!("no route for '{}'", path))),
        }
    }

    fn listing(namespace: &str, params: &Params) -> Result<Route> {
        let namespace = identifier("namespace", namespace)?;
        let sort = sort_order(params.sort.as_deref())?;
        let capabilities = capabilities(params.capabilities.as_deref())?;
        Ok(Route {
            key: format!("list:{}:o={}:c={}", namespace, sort, capabilities.join(",")).into(),
            intent: FetchIntent::Listing {
                namespace,
                sort,
                capabilities,
            },
        })
    }

    fn search(params: &Params) -> Result<Route> {
        let query = params
            .query
            .as_deref()
            .map(|q| q.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase())
            .filter(|q| !q.is_empty())
            .ok_or_else(|| OlibError::bad_request("search needs a non-empty 'q' parameter"))?;
        let sort = sort_order(params.sort.as_deref())?;
        let capabilities = capabilities(params.capabilities.as_deref())?;
        Ok(Route {
            key: format!(
                "search:q={}:o={}:c={}",
                urlencoding::encode(&query),
                sort,
                capabilities.join(",")
            )
            .into(),
            intent: FetchIntent::Search {
                query,
                sort,
                capabilities,
            },
        })
    }
}

/// Fetch `intent`, retrying only when the failure is transient.
pub async fn fetch_with_retry(
    fetcher: &dyn Fetcher,
    intent: &FetchIntent,
    policy: &RetryConfig,
) -> Result<Value> {
    let (result, stats) =
        retry_async(policy, || fetcher.fetch(intent), OlibError::is_retryable).await;
    match &result {
        Ok(_) if stats.attempts > 1 => {
            debug!(kind = intent.kind(), attempts = stats.attempts, "fetch recovered after retry")
        }
        Err(err) if err.is_retryable() => {
            warn!(kind = intent.kind(), attempts = stats.attempts, "upstream still unavailable: {}", err)
        }
        _ => {}
    }
    result
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-')
}

fn identifier(kind: &str, value: &str) -> Result<String> {
    if value.is_empty() {
        return Err(OlibError::bad_request(format!("{} must not be empty", kind)));
    }
    if !value.chars().all(is_identifier_char) {
        return Err(OlibError::bad_request(format!(
            "{} '{}' may only contain a-z, 0-9, '.', '_' and '-'",
            kind, value
        )));
    }
    Ok(value.to_string())
}

fn model_and_tag(segment: &str) -> Result<(String, Option<String>)> {
    match segment.split_once(':') {
        Some((name, tag)) => Ok((identifier("model", name)?, Some(identifier("tag", tag)?))),
        None => Ok((identifier("model", segment)?, None)),
    }
}

fn sort_order(value: Option<&str>) -> Result<SortOrder> {
    let value = value.map(|v| v.trim().to_lowercase()).unwrap_or_default();
    if value.is_empty() {
        return Ok(SortOrder::default());
    }
    SortOrder::parse(&value).ok_or_else(|| {
        OlibError::bad_request(format!(
            "invalid sort order '{}', expected 'popular' or 'newest'",
            value
        ))
    })
}

/// Split, trim, lowercase, dedupe and sort a comma-separated capability list.
fn capabilities(value: Option<&str>) -> Result<Vec<String>> {
    let mut caps = value
        .unwrap_or_default()
        .split(',')
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .map(|c| identifier("capability", &c))
        .collect::<Result<Vec<_>>>()?;
    caps.sort();
    caps.dedup();
    Ok(caps)
}

fn blob_id(value: &str) -> Result<BlobId> {
    if BlobId::KNOWN_NAMES.contains(&value) {
        return Ok(BlobId::Name(value.to_string()));
    }
    let hex = value
        .strip_prefix("sha256:")
        .or_else(|| value.strip_prefix("sha256-"))
        .unwrap_or(value);
    if (7..=64).contains(&hex.len()) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Ok(BlobId::Digest(hex.to_string()));
    }
    Err(OlibError::bad_request(format!(
        "blob '{}' is neither a known layer name nor a hex digest of 7 to 64 characters",
        value
    )))
}
