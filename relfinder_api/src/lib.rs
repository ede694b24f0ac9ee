//! HTTP plumbing for the relative-finder exporter.
//!
//! A [`Transport`] turns a [`Request`] into a decoded response body, retrying
//! transient failures according to a [`RetryPolicy`]. The single-attempt
//! HTTP work sits behind the [`Exchange`] trait and time behind [`Clock`], so
//! both can be swapped out in tests.

mod clock;
mod errors;
mod exchange;
mod log_sink;
mod request;
mod retry;
mod transport;
pub mod user_agent;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use self::clock::{Clock, SystemClock};
pub use self::errors::{ExchangeError, TransportError};
pub use self::exchange::{Exchange, RawResponse, ReqwestExchange};
pub use self::log_sink::LogSink;
pub use self::request::{Method, Request, Response};
pub use self::retry::{Failure, RetryPolicy};
pub use self::transport::{Transport, TransportOptions, MIN_TIMEOUT};
