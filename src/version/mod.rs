use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use reqwest::blocking::Client;
use thiserror::Error;

use crate::http::error_with_causes;

pub type VersionResult<T> = std::result::Result<T, VersionError>;

#[derive(Debug, Error)]
pub enum VersionError {
    #[error("version endpoint unreachable: {message}")]
    Unreachable { message: String },
    #[error("version endpoint returned HTTP {status}")]
    HttpStatus { status: u16 },
    #[error("invalid version string: {value:?}")]
    InvalidVersion { value: String },
}

/// Dotted numeric version. Pre-release and build suffixes are ignored so
/// `1.2.0-beta+abc` compares equal to `1.2.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherVersion {
    parts: Vec<u64>,
}

impl LauncherVersion {
    pub fn parts(&self) -> &[u64] {
        &self.parts
    }
}

impl FromStr for LauncherVersion {
    type Err = VersionError;

    fn from_str(value: &str) -> VersionResult<Self> {
        let trimmed = value.trim().trim_start_matches(['v', 'V']);
        let core = trimmed
            .split(['-', '+'])
            .next()
            .unwrap_or_default();
        let invalid = || VersionError::InvalidVersion {
            value: value.to_string(),
        };

        let mut parts = Vec::new();
        for part in core.split('.') {
            parts.push(part.parse::<u64>().map_err(|_| invalid())?);
        }
        if parts.is_empty() {
            return Err(invalid());
        }
        Ok(Self { parts })
    }
}

impl Ord for LauncherVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        for index in 0..len {
            let left = self.parts.get(index).copied().unwrap_or(0);
            let right = other.parts.get(index).copied().unwrap_or(0);
            match left.cmp(&right) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for LauncherVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for LauncherVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .parts
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(".");
        f.write_str(&joined)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionStatus {
    UpToDate,
    UpdateAvailable(LauncherVersion),
    Unreachable,
}

pub trait VersionEndpoint {
    /// Raw version text published for the game.
    fn latest_version(&self, web_url: &str, game_id: u32) -> VersionResult<String>;
}

impl<E: VersionEndpoint + ?Sized> VersionEndpoint for Box<E> {
    fn latest_version(&self, web_url: &str, game_id: u32) -> VersionResult<String> {
        (**self).latest_version(web_url, game_id)
    }
}

pub struct HttpVersionEndpoint {
    client: Client,
}

impl HttpVersionEndpoint {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

pub(crate) fn version_url(web_url: &str, game_id: u32) -> String {
    format!("{web_url}version?id={game_id}")
}

impl VersionEndpoint for HttpVersionEndpoint {
    fn latest_version(&self, web_url: &str, game_id: u32) -> VersionResult<String> {
        let url = version_url(web_url, game_id);
        tracing::debug!(%url, "requesting launcher version");
        let unreachable = |err: reqwest::Error| VersionError::Unreachable {
            message: error_with_causes(&err),
        };
        let response = self.client.get(&url).send().map_err(unreachable)?;
        let status = response.status();
        if !status.is_success() {
            return Err(VersionError::HttpStatus {
                status: status.as_u16(),
            });
        }
        response.text().map_err(unreachable)
    }
}

pub struct VersionChecker<E> {
    endpoint: E,
}

impl<E: VersionEndpoint> VersionChecker<E> {
    pub fn new(endpoint: E) -> Self {
        Self { endpoint }
    }

    /// Compares `current` against the published version.
    ///
    /// Any transport or HTTP failure is `Unreachable`. A reply that is not a
    /// version number is logged and treated as up to date.
    pub fn check(&self, current: &str, web_url: &str, game_id: u32) -> VersionStatus {
        let remote = match self.endpoint.latest_version(web_url, game_id) {
            Ok(remote) => remote,
            Err(err) => {
                tracing::warn!(%err, "version check failed; entering degraded mode");
                return VersionStatus::Unreachable;
            }
        };

        let (remote, current) = match (
            remote.parse::<LauncherVersion>(),
            current.parse::<LauncherVersion>(),
        ) {
            (Ok(remote), Ok(current)) => (remote, current),
            (Err(err), _) | (_, Err(err)) => {
                tracing::warn!(%err, "could not compare launcher versions");
                return VersionStatus::UpToDate;
            }
        };

        if remote > current {
            tracing::info!(%remote, %current, "launcher update available");
            VersionStatus::UpdateAvailable(remote)
        } else {
            VersionStatus::UpToDate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::build_http_client;
    use crate::http::testing::{closed_port_url, OneShotServer};
    use std::cell::RefCell;

    struct FakeEndpoint {
        reply: RefCell<Option<VersionResult<String>>>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeEndpoint {
        fn replying(reply: VersionResult<String>) -> Self {
            Self {
                reply: RefCell::new(Some(reply)),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl VersionEndpoint for FakeEndpoint {
        fn latest_version(&self, web_url: &str, game_id: u32) -> VersionResult<String> {
            self.calls.borrow_mut().push(version_url(web_url, game_id));
            self.reply
                .borrow_mut()
                .take()
                .expect("endpoint called more than once")
        }
    }

    fn parse(value: &str) -> LauncherVersion {
        value.parse().expect("version should parse")
    }

    #[test]
    fn newer_remote_version_reports_update() {
        let checker = VersionChecker::new(FakeEndpoint::replying(Ok("1.2.0".to_string())));
        let status = checker.check("1.1.9", "https://example.test/", 1);
        assert_eq!(status, VersionStatus::UpdateAvailable(parse("1.2.0")));
        assert_eq!(
            checker.endpoint.calls.borrow().as_slice(),
            ["https://example.test/version?id=1"]
        );
    }

    #[test]
    fn identical_versions_are_up_to_date() {
        let checker = VersionChecker::new(FakeEndpoint::replying(Ok("1.1.9\n".to_string())));
        assert_eq!(
            checker.check("1.1.9", "https://example.test/", 1),
            VersionStatus::UpToDate
        );
    }

    #[test]
    fn older_remote_version_is_up_to_date() {
        let checker = VersionChecker::new(FakeEndpoint::replying(Ok("0.9.0".to_string())));
        assert_eq!(
            checker.check("1.0.0", "https://example.test/", 1),
            VersionStatus::UpToDate
        );
    }

    #[test]
    fn transport_failure_is_unreachable() {
        let checker = VersionChecker::new(FakeEndpoint::replying(Err(
            VersionError::Unreachable {
                message: "connection refused".to_string(),
            },
        )));
        assert_eq!(
            checker.check("1.0.0", "https://example.test/", 1),
            VersionStatus::Unreachable
        );
    }

    #[test]
    fn garbage_remote_version_does_not_report_update() {
        let checker = VersionChecker::new(FakeEndpoint::replying(Ok("<html>".to_string())));
        assert_eq!(
            checker.check("1.0.0", "https://example.test/", 1),
            VersionStatus::UpToDate
        );
    }

    #[test]
    fn comparison_ignores_prerelease_and_build_metadata() {
        assert_eq!(
            parse("1.2.0-beta.1+build5").cmp(&parse("1.2.0")),
            Ordering::Equal
        );
        assert_eq!(parse("1.2").cmp(&parse("1.2.0.0")), Ordering::Equal);
        assert!(parse("1.10.0") > parse("1.9.3"));
        assert!(parse("v2.0") > parse("1.99.99"));
    }

    #[test]
    fn parse_rejects_non_numeric_versions() {
        assert!("".parse::<LauncherVersion>().is_err());
        assert!("1.x.0".parse::<LauncherVersion>().is_err());
        assert!("1..0".parse::<LauncherVersion>().is_err());
    }

    #[test]
    fn http_endpoint_reads_plain_text_body() {
        let server = OneShotServer::respond("200 OK", &["Content-Type: text/plain"], "1.3.0");
        let endpoint = HttpVersionEndpoint::new(build_http_client().unwrap());

        let version = endpoint.latest_version(&server.base_url, 7).unwrap();
        assert_eq!(version, "1.3.0");

        let request = server.requests.recv().unwrap();
        assert!(request.starts_with("GET /version?id=7 HTTP/1.1"));
    }

    #[test]
    fn http_endpoint_maps_error_status() {
        let server = OneShotServer::respond("404 Not Found", &[], "missing");
        let endpoint = HttpVersionEndpoint::new(build_http_client().unwrap());

        let err = endpoint.latest_version(&server.base_url, 1).unwrap_err();
        assert!(matches!(err, VersionError::HttpStatus { status: 404 }));
    }

    #[test]
    fn http_endpoint_reports_closed_port_as_unreachable() {
        let endpoint = HttpVersionEndpoint::new(build_http_client().unwrap());
        let err = endpoint.latest_version(&closed_port_url(), 1).unwrap_err();
        assert!(matches!(err, VersionError::Unreachable { .. }));
    }
}
