use reqwest::blocking::{Client, Response};
use reqwest::header::SERVER;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use super::{AccountApi, AuthError, AuthResult, LoginReply, TicketReply};
use crate::http::error_with_causes;

pub const GAME_TOKEN_HEADER: &str = "X-Game-Token";

/// Account API over HTTP. Every call is a single attempt bounded by the
/// client timeout.
pub struct HttpAccountApi {
    client: Client,
    api_url: String,
}

impl HttpAccountApi {
    pub fn new(client: Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }

    fn login_url(&self, game_id: u32) -> String {
        format!("{}v1/game/login?game={game_id}", self.api_url)
    }

    fn ticket_url(&self, ticket_hex: &str, game_id: u32) -> String {
        format!(
            "{}steam/AuthSession?ticket={ticket_hex}&id={game_id}",
            self.api_url
        )
    }
}

impl AccountApi for HttpAccountApi {
    fn login(&self, token: &str, game_id: u32) -> AuthResult<LoginReply> {
        let url = self.login_url(game_id);
        tracing::debug!(%url, "validating game token");
        let response = self
            .client
            .get(&url)
            .header(GAME_TOKEN_HEADER, token)
            .send()
            .map_err(unreachable)?;
        read_json(response)
    }

    fn exchange_ticket(&self, ticket_hex: &str, game_id: u32) -> AuthResult<TicketReply> {
        tracing::debug!(game_id, "exchanging platform ticket");
        let response = self
            .client
            .get(self.ticket_url(ticket_hex, game_id))
            .send()
            .map_err(unreachable)?;
        read_json(response)
    }
}

fn unreachable(err: reqwest::Error) -> AuthError {
    AuthError::Unreachable {
        message: error_with_causes(&err),
    }
}

fn read_json<T: DeserializeOwned>(response: Response) -> AuthResult<T> {
    let status = response.status();
    if status != StatusCode::OK {
        let server = response
            .headers()
            .get(SERVER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        tracing::warn!(status = status.as_u16(), "account server returned an error status");
        return Err(AuthError::HttpStatus {
            status: status.as_u16(),
            reason: status.canonical_reason().map(str::to_string),
            server,
        });
    }

    let body = response.text().map_err(unreachable)?;
    serde_json::from_str(&body).map_err(|source| AuthError::Malformed { source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthFailureKind;
    use crate::http::build_http_client;
    use crate::http::testing::{closed_port_url, OneShotServer};

    fn api_for(base_url: &str) -> HttpAccountApi {
        HttpAccountApi::new(build_http_client().unwrap(), base_url)
    }

    #[test]
    fn login_sends_token_header_and_parses_reply() {
        let server = OneShotServer::respond(
            "200 OK",
            &["Content-Type: application/json"],
            r#"{"message":"ok","status":0,"username":"player"}"#,
        );

        let reply = api_for(&server.base_url).login("secret-token", 1).unwrap();
        assert_eq!(reply.status, 0);
        assert_eq!(reply.username.as_deref(), Some("player"));

        let request = server.requests.recv().unwrap();
        assert!(request.starts_with("GET /v1/game/login?game=1 HTTP/1.1"));
        assert!(request
            .to_ascii_lowercase()
            .contains("x-game-token: secret-token"));
    }

    #[test]
    fn login_maps_error_status_with_server_details() {
        let server = OneShotServer::respond("401 Unauthorized", &["Server: hnid"], "denied");

        let err = api_for(&server.base_url).login("token", 1).unwrap_err();
        match err {
            AuthError::HttpStatus {
                status,
                reason,
                server,
            } => {
                assert_eq!(status, 401);
                assert_eq!(reason.as_deref(), Some("Unauthorized"));
                assert_eq!(server.as_deref(), Some("hnid"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn login_reports_unparsable_body_as_malformed() {
        let server = OneShotServer::respond("200 OK", &[], "<html>maintenance</html>");

        let err = api_for(&server.base_url).login("token", 1).unwrap_err();
        assert_eq!(err.kind(), AuthFailureKind::Malformed);
    }

    #[test]
    fn login_reports_closed_port_as_transport_failure() {
        let err = api_for(&closed_port_url()).login("token", 1).unwrap_err();
        assert!(matches!(err, AuthError::Unreachable { .. }));
        assert_eq!(err.kind(), AuthFailureKind::Transport);
    }

    #[test]
    fn ticket_exchange_hits_auth_session_endpoint() {
        let server = OneShotServer::respond(
            "200 OK",
            &[],
            r#"{"gametoken":"issued","valid":true}"#,
        );

        let reply = api_for(&server.base_url)
            .exchange_ticket("0ABC", 1)
            .unwrap();
        assert_eq!(
            reply,
            TicketReply {
                gametoken: Some("issued".to_string()),
                valid: true,
            }
        );

        let request = server.requests.recv().unwrap();
        assert!(request.starts_with("GET /steam/AuthSession?ticket=0ABC&id=1 HTTP/1.1"));
    }
}
