use once_cell::sync::Lazy;
use std::time::Duration;

/// Upper bound for a single provider call; without it a stalled list or
/// upload would block the whole run.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub static CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .expect("failed to build reqwest client")
});
