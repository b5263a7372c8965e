use std::time::Duration;

use reqwest::blocking::Client;

use crate::game::LAUNCHER_VERSION;

/// Upper bound for every remote call made during startup.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub fn build_http_client() -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(format!("gamegate/{LAUNCHER_VERSION}"))
        .connect_timeout(REQUEST_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()
}

/// Flattens an error and its source chain into one line for user messages.
pub(crate) fn error_with_causes(err: &(dyn std::error::Error + 'static)) -> String {
    anyhow::Chain::new(err)
        .map(|cause| cause.to_string())
        .collect::<Vec<_>>()
        .join(": ")
}
