//! Network utilities for upstream HTTP access.
//!
//! This module provides:
//! - An HTTP client with bounded timeouts and status classification
//! - Retry logic with exponential backoff and jitter

mod client;
mod retry;

pub use client::{extract_domain, HttpClient, RawPage};
pub use retry::{retry_async, RetryConfig, RetryStats};
