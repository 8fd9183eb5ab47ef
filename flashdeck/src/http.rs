//! Outbound HTTP client construction.
//!
//! reqwest is built with `rustls-no-provider`, so a process-wide crypto provider has to exist
//! before the first client is created. `main` installs it at startup; [`build_client`] installs it
//! on demand for library and test callers that never ran `main`.

use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Install the aws-lc-rs rustls provider if no provider is installed yet
pub fn ensure_crypto_provider() {
    if rustls::crypto::CryptoProvider::get_default().is_none() {
        // Losing the race to another thread is fine: some provider is installed either way.
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
    }
}

/// Build a reqwest client with the service's connection defaults.
///
/// `timeout` bounds the whole request when set. The chat client leaves it unset and applies its
/// own per-attempt timeout.
pub fn build_client(timeout: Option<Duration>) -> reqwest::Result<reqwest::Client> {
    ensure_crypto_provider();

    let mut builder = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(concat!("flashdeck/", env!("CARGO_PKG_VERSION")));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}
