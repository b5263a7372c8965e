use serde::Deserialize;
use thiserror::Error;

mod http;
mod ticket;

pub use http::{HttpAccountApi, GAME_TOKEN_HEADER};
pub use ticket::{EnvTicketSource, NoTicketSource, TicketSource, TICKET_ENV_VAR};

/// Application status the account API uses for an accepted token.
pub const LOGIN_STATUS_OK: i64 = 0;

pub type AuthResult<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no game token to validate")]
    MissingToken,
    #[error("account service is unavailable for this session")]
    ServiceUnavailable,
    #[error("account server unreachable: {message}")]
    Unreachable { message: String },
    #[error("account server responded with HTTP {status}")]
    HttpStatus {
        status: u16,
        reason: Option<String>,
        server: Option<String>,
    },
    #[error("malformed account server response")]
    Malformed {
        #[source]
        source: serde_json::Error,
    },
    #[error("game token rejected with status {status}")]
    Rejected { status: i64, message: Option<String> },
    #[error("platform ticket unavailable: {message}")]
    Ticket { message: String },
}

/// Coarse failure class; each one gets different user messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailureKind {
    /// No request was made.
    Skipped,
    Transport,
    Rejected,
    Malformed,
}

impl AuthError {
    pub fn kind(&self) -> AuthFailureKind {
        match self {
            Self::MissingToken | Self::ServiceUnavailable => AuthFailureKind::Skipped,
            Self::Unreachable { .. } | Self::HttpStatus { .. } | Self::Ticket { .. } => {
                AuthFailureKind::Transport
            }
            Self::Rejected { .. } => AuthFailureKind::Rejected,
            Self::Malformed { .. } => AuthFailureKind::Malformed,
        }
    }

    /// Application-level status reported by the server, if any.
    pub fn status_code(&self) -> Option<i64> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            Self::HttpStatus { status, .. } => Some(i64::from(*status)),
            _ => None,
        }
    }

    /// Text to show the user, or `None` when the failure should stay silent.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::MissingToken | Self::ServiceUnavailable => None,
            Self::Unreachable { message } | Self::Ticket { message } => {
                Some(format!("Exception! {message}"))
            }
            Self::HttpStatus {
                status,
                reason,
                server,
            } => {
                let mut text = format!("Web Exception! {self}\n");
                text.push_str(&format!("\nStatus Code : {status}"));
                text.push_str(&format!(
                    "\nStatus Description : {}",
                    reason.as_deref().unwrap_or_default()
                ));
                text.push_str(&format!(
                    "\nServer : {}",
                    server.as_deref().unwrap_or_default()
                ));
                Some(text)
            }
            Self::Malformed { source } => Some(format!(
                "The account server sent a response the launcher could not read.\n\n{source}"
            )),
            Self::Rejected { message, .. } => {
                let mut text =
                    "Your game token was not accepted. Log in again or play offline.".to_string();
                if let Some(message) = message.as_deref().filter(|m| !m.is_empty()) {
                    text.push_str(&format!("\n\nServer message: {message}"));
                }
                Some(text)
            }
        }
    }
}

/// Body of `GET v1/game/login`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoginReply {
    #[serde(default)]
    pub message: Option<String>,
    pub status: i64,
    #[serde(default)]
    pub username: Option<String>,
}

/// Body of the platform ticket exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TicketReply {
    #[serde(default)]
    pub gametoken: Option<String>,
    #[serde(default)]
    pub valid: bool,
}

pub trait AccountApi {
    fn login(&self, token: &str, game_id: u32) -> AuthResult<LoginReply>;
    fn exchange_ticket(&self, ticket_hex: &str, game_id: u32) -> AuthResult<TicketReply>;
}

impl<T: AccountApi + ?Sized> AccountApi for Box<T> {
    fn login(&self, token: &str, game_id: u32) -> AuthResult<LoginReply> {
        (**self).login(token, game_id)
    }

    fn exchange_ticket(&self, ticket_hex: &str, game_id: u32) -> AuthResult<TicketReply> {
        (**self).exchange_ticket(ticket_hex, game_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub token: String,
    pub username: String,
    pub status: i64,
}

pub struct AuthClient<A> {
    api: A,
    game_id: u32,
}

impl<A: AccountApi> AuthClient<A> {
    pub fn new(api: A, game_id: u32) -> Self {
        Self { api, game_id }
    }

    /// Exchanges a platform ticket for a game token. One attempt, no retry.
    ///
    /// `Ok(None)` means the platform answered but had no identity for us.
    pub fn exchange_platform_ticket(&self, ticket: &[u8]) -> AuthResult<Option<String>> {
        let ticket_hex = hex::encode_upper(ticket);
        let reply = self.api.exchange_ticket(&ticket_hex, self.game_id)?;
        if !reply.valid {
            tracing::info!("platform ticket reported invalid");
            return Ok(None);
        }
        Ok(reply.gametoken.filter(|token| !token.is_empty()))
    }

    /// Asks the account API whether `token` is a live session token.
    pub fn validate(&self, token: &str, technical_issues: bool) -> AuthResult<AuthenticatedUser> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        if technical_issues {
            return Err(AuthError::ServiceUnavailable);
        }

        let reply = self.api.login(token, self.game_id)?;
        if reply.status != LOGIN_STATUS_OK {
            tracing::info!(status = reply.status, "game token rejected");
            return Err(AuthError::Rejected {
                status: reply.status,
                message: reply.message,
            });
        }

        Ok(AuthenticatedUser {
            token: token.to_string(),
            username: reply.username.unwrap_or_default(),
            status: reply.status,
        })
    }
}
