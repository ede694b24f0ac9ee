//! Test doubles for the transport layer.
//!
//! Enabled with the `test-util` feature so that downstream crates can drive
//! a [`crate::Transport`] from a script instead of the network.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use url::Url;

use crate::{Clock, Exchange, ExchangeError, Method, RawResponse, Request};

/// What a [`ScriptedExchange`] saw for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRequest {
    pub method: Method,
    pub url: String,
    pub xhr: bool,
    pub cookies: Vec<(String, String)>,
    pub form: Option<Vec<(String, String)>>,
}

#[derive(Default)]
struct Script {
    replies: VecDeque<Result<RawResponse, ExchangeError>>,
    sent: Vec<SentRequest>,
}

/// [`Exchange`] that answers from a queue of canned replies.
///
/// Clones share the same queue and request log. An empty queue answers with
/// [`ExchangeError::Fatal`] so a test that under-scripts fails loudly instead
/// of retrying forever.
#[derive(Clone, Default)]
pub struct ScriptedExchange {
    inner: Arc<Mutex<Script>>,
}

impl ScriptedExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, reply: Result<RawResponse, ExchangeError>) -> &Self {
        self.lock().replies.push_back(reply);
        self
    }

    pub fn reply(&self, response: RawResponse) -> &Self {
        self.push(Ok(response))
    }

    pub fn fail(&self, error: ExchangeError) -> &Self {
        self.push(Err(error))
    }

    pub fn sent(&self) -> Vec<SentRequest> {
        self.lock().sent.clone()
    }

    pub fn remaining(&self) -> usize {
        self.lock().replies.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Exchange for ScriptedExchange {
    async fn send(
        &self,
        url: &Url,
        request: &Request,
        _timeout: Duration,
    ) -> Result<RawResponse, ExchangeError> {
        let mut script = self.lock();
        script.sent.push(SentRequest {
            method: request.method,
            url: url.to_string(),
            xhr: request.xhr,
            cookies: request.cookies.clone(),
            form: request.form.clone(),
        });
        script
            .replies
            .pop_front()
            .unwrap_or_else(|| Err(ExchangeError::Fatal("script exhausted".into())))
    }
}

/// [`Clock`] with a frozen time that records sleeps instead of waiting.
#[derive(Clone)]
pub struct ManualClock {
    now: DateTime<Local>,
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::at(
            Local
                .with_ymd_and_hms(2016, 6, 26, 12, 0, 0)
                .single()
                .unwrap_or_else(Local::now),
        )
    }

    pub fn at(now: DateTime<Local>) -> Self {
        Self {
            now,
            sleeps: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        self.now
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(duration);
    }
}

/// In-memory `Write` target for inspecting [`crate::LogSink`] output.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn contents(&self) -> String {
        let bytes = self.bytes.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Log lines with the `[timestamp]: ` prefix removed.
    pub fn lines(&self) -> Vec<String> {
        self.contents()
            .lines()
            .map(|line| match line.split_once("]: ") {
                Some((_, message)) => message.to_string(),
                None => line.to_string(),
            })
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
