//! Resilient client for an OpenRouter-compatible chat completion API.
//!
//! [`ChatCompletionClient`] issues one logical completion per call. Each attempt is bounded by a
//! timeout. 429/5xx responses and transport failures are retried with jittered exponential
//! backoff ([`retry`]) up to `max_retries` times, and every failure is normalized into a
//! [`ChatError`].
//!
//! The HTTP layer sits behind the [`ChatTransport`] trait so tests can script responses without
//! a network.

mod client;
mod error;
pub mod retry;
mod transport;
mod types;

pub use client::{ChatCompletionClient, DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_MIN_RETRY_DELAY, DEFAULT_TIMEOUT};
pub use error::{ChatError, ChatErrorKind};
pub use transport::{ChatTransport, ReqwestTransport, TransportError, TransportRequest, TransportResponse};
pub use types::{ChatChoice, ChatCompletion, ChatCompletionRequest, ChatMessage, ChatResponseMessage, ChatRole, ChatUsage};
