use super::{AuthError, AuthResult};

pub const TICKET_ENV_VAR: &str = "GAMEGATE_PLATFORM_TICKET";

/// Source of short-lived platform identity tickets.
pub trait TicketSource {
    /// `Ok(None)` when the platform has no logged-on user.
    fn session_ticket(&self) -> AuthResult<Option<Vec<u8>>>;
}

impl<T: TicketSource + ?Sized> TicketSource for Box<T> {
    fn session_ticket(&self) -> AuthResult<Option<Vec<u8>>> {
        (**self).session_ticket()
    }
}

#[derive(Debug, Default)]
pub struct NoTicketSource;

impl TicketSource for NoTicketSource {
    fn session_ticket(&self) -> AuthResult<Option<Vec<u8>>> {
        Ok(None)
    }
}

/// Reads a hex-encoded ticket handed over by the platform client through an
/// environment variable.
#[derive(Debug, Clone)]
pub struct EnvTicketSource {
    var: String,
}

impl EnvTicketSource {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvTicketSource {
    fn default() -> Self {
        Self::new(TICKET_ENV_VAR)
    }
}

impl TicketSource for EnvTicketSource {
    fn session_ticket(&self) -> AuthResult<Option<Vec<u8>>> {
        let Some(raw) = std::env::var_os(&self.var) else {
            return Ok(None);
        };
        let raw = raw.to_string_lossy();
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        decode_ticket(raw).map(Some)
    }
}

fn decode_ticket(raw: &str) -> AuthResult<Vec<u8>> {
    let compact: String = raw.chars().filter(|c| *c != '-').collect();
    hex::decode(&compact).map_err(|err| AuthError::Ticket {
        message: format!("ticket is not valid hex: {err}"),
    })
}
