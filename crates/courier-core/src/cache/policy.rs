//! Cacheability rules and freshness arithmetic
//!
//! The admission rules are intentionally narrow: only `GET` requests are
//! looked up, and only successful responses carrying an explicit `max-age`
//! without `no-store` are stored. `Expires`, `no-cache` and
//! `must-revalidate` play no part.

use chrono::{DateTime, NaiveDateTime, Utc};
use courier_proxy::{Request, Response};
use http::{HeaderMap, Method, header};
use std::time::Duration;

/// Directives read from `Cache-Control`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheControl {
    /// `no-store` is present
    pub no_store: bool,
    /// `max-age` in seconds, if present and well formed
    pub max_age: Option<u64>,
}

impl CacheControl {
    /// Parse a single `Cache-Control` header value
    pub fn parse(value: &str) -> Self {
        let mut cc = Self::default();
        cc.merge(value);
        cc
    }

    /// Read every `Cache-Control` line of a header map
    ///
    /// Returns `None` when the header is absent or none of its values are
    /// readable text.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let mut cc = Self::default();
        let mut found = false;

        for value in headers.get_all(header::CACHE_CONTROL) {
            if let Ok(value) = value.to_str() {
                cc.merge(value);
                found = true;
            }
        }

        found.then_some(cc)
    }

    fn merge(&mut self, value: &str) {
        for directive in split_directives(value) {
            let directive = directive.trim();
            if directive.is_empty() {
                continue;
            }

            let (name, argument) = match directive.split_once('=') {
                Some((name, argument)) => (name.trim(), Some(argument.trim().trim_matches('"'))),
                None => (directive, None),
            };

            if name.eq_ignore_ascii_case("no-store") {
                self.no_store = true;
            } else if name.eq_ignore_ascii_case("max-age") && self.max_age.is_none() {
                self.max_age = argument.and_then(|a| a.parse().ok());
            }
        }
    }
}

/// Split a header value on commas that are not inside a quoted string
fn split_directives(value: &str) -> Vec<&str> {
    let mut directives = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut escaped = false;

    for (i, c) in value.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ',' if !quoted => {
                directives.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    directives.push(&value[start..]);

    directives
}

/// Whether a request may be answered from, or recorded into, the cache
pub fn is_cacheable_request(request: &Request) -> bool {
    request.method == Method::GET
}

/// Freshness lifetime of a response, or `None` if it must not be stored
pub fn freshness_lifetime(response: &Response) -> Option<Duration> {
    if !response.status.is_success() {
        return None;
    }

    let cc = CacheControl::from_headers(&response.headers)?;
    if cc.no_store {
        return None;
    }

    cc.max_age.map(Duration::from_secs)
}

/// Absolute expiry: the response `Date` (or `now`) plus the lifetime
pub fn expiry(headers: &HeaderMap, lifetime: Duration, now: DateTime<Utc>) -> DateTime<Utc> {
    let base = headers
        .get(header::DATE)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_http_date)
        .unwrap_or(now);

    chrono::Duration::from_std(lifetime)
        .ok()
        .and_then(|d| base.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Parse an HTTP date in IMF-fixdate, RFC 850 or asctime form
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.with_timezone(&Utc));
    }

    // Sunday, 06-Nov-94 08:49:37 GMT
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%A, %d-%b-%y %H:%M:%S GMT") {
        return Some(naive.and_utc());
    }

    // Sun Nov  6 08:49:37 1994
    NaiveDateTime::parse_from_str(value, "%a %b %e %H:%M:%S %Y")
        .ok()
        .map(|naive| naive.and_utc())
}
