//! One HTTP attempt, without retries.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderValue, COOKIE};
use url::Url;

use crate::{user_agent::get_user_agent, ExchangeError, Method, Request, TransportError};

/// A raw HTTP response, before status checks and entity decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
    pub cookies: BTreeMap<String, String>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            cookies: BTreeMap::new(),
        }
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// 2xx and 3xx count as success; anything else is an HTTP error.
    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }
}

/// Performs a single request/response exchange.
#[async_trait]
pub trait Exchange: Send + Sync {
    async fn send(
        &self,
        url: &Url,
        request: &Request,
        timeout: Duration,
    ) -> Result<RawResponse, ExchangeError>;
}

/// [`Exchange`] backed by a cookie-aware `reqwest::Client`.
///
/// The client keeps a cookie jar across requests so that cookies set during
/// redirect chains (sign-in) survive, and reports the jar contents for the
/// final response URL back to the caller.
pub struct ReqwestExchange {
    http: reqwest::Client,
    jar: Arc<Jar>,
}

impl ReqwestExchange {
    pub fn new() -> Result<Self, TransportError> {
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .user_agent(get_user_agent())
            .cookie_provider(Arc::clone(&jar))
            .build()?;
        Ok(Self { http, jar })
    }

    fn jar_cookies(&self, url: &Url) -> BTreeMap<String, String> {
        self.jar
            .cookies(url)
            .as_ref()
            .and_then(|value| value.to_str().ok())
            .map(parse_cookie_header)
            .unwrap_or_default()
    }
}

#[async_trait]
impl Exchange for ReqwestExchange {
    async fn send(
        &self,
        url: &Url,
        request: &Request,
        timeout: Duration,
    ) -> Result<RawResponse, ExchangeError> {
        let mut builder = match request.method {
            Method::Get => self.http.get(url.clone()),
            Method::Post => self.http.post(url.clone()),
        }
        .timeout(timeout);

        if request.xhr {
            builder = builder.header("X-Requested-With", "XMLHttpRequest");
        }
        if let Some(cookies) = request.cookie_header() {
            let value = HeaderValue::from_str(&cookies)
                .map_err(|e| ExchangeError::Fatal(format!("invalid cookie header: {}", e)))?;
            builder = builder.header(COOKIE, value);
        }
        if let Some(form) = &request.form {
            builder = builder.form(form);
        }

        let resp = builder.send().await.map_err(classify)?;
        let status = resp.status().as_u16();
        let final_url = resp.url().clone();
        let body = resp.text().await.map_err(classify)?;

        Ok(RawResponse {
            status,
            body,
            cookies: self.jar_cookies(&final_url),
        })
    }
}

fn classify(err: reqwest::Error) -> ExchangeError {
    if err.is_timeout() {
        ExchangeError::Timeout
    } else if err.is_builder() {
        ExchangeError::Fatal(err.to_string())
    } else {
        ExchangeError::Connection(err.to_string())
    }
}

/// Splits a `name=value; name2=value2` header into a map.
fn parse_cookie_header(header: &str) -> BTreeMap<String, String> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cookie_header_splits_pairs() {
        let cookies = parse_cookie_header("username=a%40b.com; b=123; session=x=y");
        assert_eq!(cookies.get("username").map(String::as_str), Some("a%40b.com"));
        assert_eq!(cookies.get("b").map(String::as_str), Some("123"));
        // only the first '=' separates name from value
        assert_eq!(cookies.get("session").map(String::as_str), Some("x=y"));
    }

    #[test]
    fn parse_cookie_header_skips_garbage() {
        let cookies = parse_cookie_header("; =nope; lonely; uuid=1");
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies.get("uuid").map(String::as_str), Some("1"));
    }

    #[test]
    fn success_covers_redirects_but_not_errors() {
        assert!(RawResponse::new(200, "").is_success());
        assert!(RawResponse::new(302, "").is_success());
        assert!(!RawResponse::new(404, "").is_success());
        assert!(!RawResponse::new(503, "").is_success());
    }
}
