//! Authentication state and the request path every endpoint goes through.

use std::collections::BTreeMap;
use std::fmt;

use relfinder_api::{Clock, Exchange, Request, Transport};

use crate::config::Credentials;
use crate::Error;

pub const SIGN_IN_PATH: &str = "/cas/signin/";

/// Body the service sends instead of content once the session cookies are no longer accepted.
pub const SESSION_EXPIRED_SENTINEL: &str = "191919";

/// Cookie names a successful sign-in must leave behind.
pub const REQUIRED_COOKIES: [&str; 4] = ["username", "b", "uuid", "session"];

/// Cookies identifying an authenticated session.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCookies {
    pub username: String,
    /// Browser-instance token.
    pub browser: String,
    /// Identity token.
    pub uuid: String,
    pub session: String,
}

impl SessionCookies {
    /// Picks the required cookies out of a jar snapshot, listing any that are missing.
    pub fn from_jar(jar: &BTreeMap<String, String>) -> Result<Self, Error> {
        let missing: Vec<&'static str> = REQUIRED_COOKIES
            .iter()
            .copied()
            .filter(|name| !jar.contains_key(*name))
            .collect();
        if !missing.is_empty() {
            return Err(Error::Authentication { missing });
        }
        let take = |name: &str| jar.get(name).cloned().unwrap_or_default();
        Ok(Self {
            username: take("username"),
            browser: take("b"),
            uuid: take("uuid"),
            session: take("session"),
        })
    }

    pub fn pairs(&self) -> Vec<(String, String)> {
        vec![
            ("username".to_string(), self.username.clone()),
            ("b".to_string(), self.browser.clone()),
            ("uuid".to_string(), self.uuid.clone()),
            ("session".to_string(), self.session.clone()),
        ]
    }
}

impl fmt::Debug for SessionCookies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCookies")
            .field("username", &self.username)
            .field("browser", &"<redacted>")
            .field("uuid", &"<redacted>")
            .field("session", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
enum SessionState {
    Unauthenticated,
    Authenticated(SessionCookies),
}

/// A signed-in session over a [`Transport`].
///
/// Requests take `&mut self`, so one session never has two calls in flight
/// and the cookies cannot change under a running request.
pub struct Session<E, C> {
    transport: Transport<E, C>,
    credentials: Credentials,
    state: SessionState,
    logins: u32,
}

impl<E: Exchange, C: Clock> Session<E, C> {
    /// Creates an unauthenticated session. The first [`Session::call`] logs in.
    pub fn new(transport: Transport<E, C>, credentials: Credentials) -> Self {
        Self {
            transport,
            credentials,
            state: SessionState::Unauthenticated,
            logins: 0,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated(_))
    }

    /// Number of successful logins so far, re-authentications included.
    pub fn login_count(&self) -> u32 {
        self.logins
    }

    /// Signs in and replaces the stored cookies.
    pub async fn login(&mut self) -> Result<SessionCookies, Error> {
        let request = Request::post(
            SIGN_IN_PATH,
            [
                ("username", self.credentials.username.as_str()),
                ("password", self.credentials.password.as_str()),
                ("__source_node__", "start"),
                ("__form__", "login"),
            ],
        )
        .sensitive();

        let response = self.transport.execute(&request).await?;
        let cookies = SessionCookies::from_jar(&response.cookies).map_err(|e| {
            tracing::error!("Login did not establish a session: {}", e);
            e
        })?;

        self.logins += 1;
        tracing::info!(user = %cookies.username, logins = self.logins, "Logged in");
        self.state = SessionState::Authenticated(cookies.clone());
        Ok(cookies)
    }

    /// Sends `request` with the session cookies and returns the decoded body.
    ///
    /// A body equal to the expiry sentinel triggers one fresh login and one
    /// replay of the request. If the replay is rejected as well the call
    /// fails with [`Error::SessionRejected`].
    pub async fn call(&mut self, request: Request) -> Result<String, Error> {
        let cookies = match &self.state {
            SessionState::Authenticated(cookies) => cookies.clone(),
            SessionState::Unauthenticated => self.login().await?,
        };

        let body = self.send_with(&request, &cookies).await?;
        if !is_session_expired(&body) {
            return Ok(body);
        }

        tracing::warn!(path = %request.path, "Session expired, logging in again");
        let cookies = self.login().await?;
        let body = self.send_with(&request, &cookies).await?;
        if is_session_expired(&body) {
            tracing::error!(path = %request.path, "Session rejected right after login");
            return Err(Error::SessionRejected {
                path: request.path.clone(),
            });
        }
        Ok(body)
    }

    async fn send_with(&self, request: &Request, cookies: &SessionCookies) -> Result<String, Error> {
        let request = request.clone().with_cookies(cookies.pairs());
        Ok(self.transport.execute(&request).await?.body)
    }
}

/// Exact match only; a page that merely contains the digits is real content.
fn is_session_expired(body: &str) -> bool {
    body == SESSION_EXPIRED_SENTINEL
}

#[cfg(test)]
mod tests {
    use super::*;
    use relfinder_api::testing::{ManualClock, ScriptedExchange};
    use relfinder_api::{Method, RawResponse, TransportOptions};

    fn login_reply(session: &str) -> RawResponse {
        RawResponse::new(200, "<html>welcome</html>")
            .with_cookie("username", "ann%40example.com")
            .with_cookie("b", "browser")
            .with_cookie("uuid", "uuid-1")
            .with_cookie("session", session)
            .with_cookie("unrelated", "x")
    }

    fn session(exchange: &ScriptedExchange) -> Session<ScriptedExchange, ManualClock> {
        let transport = Transport::new(
            exchange.clone(),
            ManualClock::new(),
            TransportOptions::new("https://example.test"),
        );
        Session::new(transport, Credentials::new("ann@example.com", "pw"))
    }

    fn cookie<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
        pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[tokio::test]
    async fn login_posts_credentials_and_stores_cookies() {
        let exchange = ScriptedExchange::new();
        exchange.reply(login_reply("s-1"));
        let mut session = session(&exchange);
        assert!(!session.is_authenticated());

        let cookies = session.login().await.unwrap();

        assert_eq!(cookies.session, "s-1");
        assert_eq!(cookies.browser, "browser");
        assert!(session.is_authenticated());
        assert_eq!(session.login_count(), 1);

        let sent = exchange.sent();
        assert_eq!(sent[0].method, Method::Post);
        assert_eq!(sent[0].url, "https://example.test/cas/signin/");
        let form = sent[0].form.clone().unwrap();
        assert!(form.contains(&("username".to_string(), "ann@example.com".to_string())));
        assert!(form.contains(&("__form__".to_string(), "login".to_string())));
    }

    #[tokio::test]
    async fn missing_cookies_are_an_authentication_error() {
        let exchange = ScriptedExchange::new();
        exchange.reply(
            RawResponse::new(200, "")
                .with_cookie("username", "ann")
                .with_cookie("b", "browser"),
        );
        let mut session = session(&exchange);

        let err = session.login().await.unwrap_err();
        match err {
            Error::Authentication { missing } => assert_eq!(missing, vec!["uuid", "session"]),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn call_logs_in_lazily_and_attaches_cookies() {
        let exchange = ScriptedExchange::new();
        exchange
            .reply(login_reply("s-1"))
            .reply(RawResponse::new(200, "page"));
        let mut session = session(&exchange);

        let body = session.call(Request::get("/you/")).await.unwrap();

        assert_eq!(body, "page");
        let sent = exchange.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(cookie(&sent[1].cookies, "session"), Some("s-1"));
        assert_eq!(cookie(&sent[1].cookies, "b"), Some("browser"));
    }

    #[tokio::test]
    async fn sentinel_triggers_exactly_one_relogin_and_replay() {
        let exchange = ScriptedExchange::new();
        exchange
            .reply(login_reply("s-old"))
            .reply(RawResponse::new(200, "first"))
            .reply(RawResponse::new(200, SESSION_EXPIRED_SENTINEL))
            .reply(login_reply("s-new"))
            .reply(RawResponse::new(200, "fresh data"));
        let mut session = session(&exchange);

        assert_eq!(session.call(Request::get("/you/")).await.unwrap(), "first");
        let body = session
            .call(Request::get("/you/relfinder/fetch/").query("profile_id", "p").xhr())
            .await
            .unwrap();

        assert_eq!(body, "fresh data");
        assert_eq!(session.login_count(), 2);

        let sent = exchange.sent();
        assert_eq!(sent.len(), 5);
        assert_eq!(sent[2].url, sent[4].url);
        assert!(sent[4].xhr);
        assert_eq!(cookie(&sent[2].cookies, "session"), Some("s-old"));
        assert_eq!(cookie(&sent[4].cookies, "session"), Some("s-new"));
    }

    #[tokio::test]
    async fn repeated_sentinel_is_never_returned_as_data() {
        let exchange = ScriptedExchange::new();
        exchange
            .reply(login_reply("s-1"))
            .reply(RawResponse::new(200, SESSION_EXPIRED_SENTINEL))
            .reply(login_reply("s-2"))
            .reply(RawResponse::new(200, SESSION_EXPIRED_SENTINEL));
        let mut session = session(&exchange);

        let err = session.call(Request::get("/you/")).await.unwrap_err();
        assert!(matches!(err, Error::SessionRejected { path } if path == "/you/"));
        assert_eq!(session.login_count(), 2);
        assert_eq!(exchange.remaining(), 0);
    }

    #[tokio::test]
    async fn sentinel_inside_a_page_is_content() {
        let exchange = ScriptedExchange::new();
        exchange
            .reply(login_reply("s-1"))
            .reply(RawResponse::new(200, "order 191919 shipped"))
            .reply(RawResponse::new(200, "191919 "));
        let mut session = session(&exchange);

        assert_eq!(
            session.call(Request::get("/a/")).await.unwrap(),
            "order 191919 shipped"
        );
        assert_eq!(session.call(Request::get("/b/")).await.unwrap(), "191919 ");
        assert_eq!(session.login_count(), 1);
    }

    #[test]
    fn debug_redacts_tokens() {
        let cookies = SessionCookies {
            username: "ann".into(),
            browser: "b-secret".into(),
            uuid: "u-secret".into(),
            session: "s-secret".into(),
        };
        let shown = format!("{:?}", cookies);
        assert!(!shown.contains("secret"));
    }
}
