//! Request and response values passed through the transport.

use std::collections::BTreeMap;
use std::fmt;

/// HTTP method. The service only needs page fetches and form posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// A logical request against the service, relative to the transport's base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    /// Form-encoded body. Only meaningful for [`Method::Post`].
    pub form: Option<Vec<(String, String)>>,
    /// Marks a machine-initiated call (`X-Requested-With: XMLHttpRequest`).
    pub xhr: bool,
    /// Keeps the form payload out of the attempt log.
    pub sensitive: bool,
    /// Cookies sent as a single `Cookie` header.
    pub cookies: Vec<(String, String)>,
}

impl Request {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            form: None,
            xhr: false,
            sensitive: false,
            cookies: Vec::new(),
        }
    }

    pub fn post<K, V>(path: impl Into<String>, form: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            method: Method::Post,
            form: Some(
                form.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            ..Self::get(path)
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn xhr(mut self) -> Self {
        self.xhr = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Replaces the cookies attached to this request.
    pub fn with_cookies(mut self, cookies: Vec<(String, String)>) -> Self {
        self.cookies = cookies;
        self
    }

    /// Value of the `Cookie` header, or `None` when no cookies are attached.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Form payload rendered for the attempt log, e.g. `{p1: a, p2: b}`.
    pub(crate) fn form_summary(&self) -> Option<String> {
        let form = self.form.as_ref()?;
        if self.sensitive || form.is_empty() {
            return None;
        }
        let pairs = form
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join(", ");
        Some(format!("{{{}}}", pairs))
    }
}

/// A successful response with its body already entity-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
    /// Cookies the client holds for the response URL after this exchange.
    pub cookies: BTreeMap<String, String>,
}
