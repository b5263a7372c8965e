use crate::auth::GAME_TOKEN_HEADER;
use crate::game::LAUNCHER_VERSION;
use crate::session::{lock, SharedSession};

pub const LAUNCHER_VERSION_HEADER: &str = "X-Launcher-Version";
const USER_AGENT_PRODUCT: &str = "CardboardLauncher";
const BLANK_PAGE: &str = "about:blank";

/// What the hosted page may ask of the launcher. Nothing else of the
/// controller is reachable from page script.
pub trait PageBridge {
    /// Validates and stores `token`; `quiet` suppresses the success message.
    fn set_game_token(&self, token: &str, quiet: bool) -> bool;
    fn is_token_set(&self) -> bool;
    fn check_token(&self, candidate: &str) -> bool;
    fn display_message(&self, message: &str);
}

/// Bridge handle shared with the embedded page. Every call goes through
/// the session lock.
#[derive(Clone)]
pub struct Bridge {
    session: SharedSession,
}

impl Bridge {
    pub fn new(session: SharedSession) -> Self {
        Self { session }
    }

    /// Headers to attach to every outbound request the page makes.
    pub fn request_headers(&self) -> Vec<(&'static str, String)> {
        let controller = lock(&self.session);
        let mut headers = vec![(LAUNCHER_VERSION_HEADER, LAUNCHER_VERSION.to_string())];
        if controller.is_token_set() {
            headers.push((GAME_TOKEN_HEADER, controller.game_token().to_string()));
        }
        headers
    }
}

impl PageBridge for Bridge {
    fn set_game_token(&self, token: &str, quiet: bool) -> bool {
        lock(&self.session).set_game_token(token, quiet)
    }

    fn is_token_set(&self) -> bool {
        lock(&self.session).is_token_set()
    }

    fn check_token(&self, candidate: &str) -> bool {
        lock(&self.session).check_token(candidate)
    }

    fn display_message(&self, message: &str) {
        lock(&self.session).show_page_message(message);
    }
}

/// Suffix appended to the embedded browser's user agent.
pub fn user_agent_suffix() -> String {
    format!(" {USER_AGENT_PRODUCT}/{LAUNCHER_VERSION}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Trusted,
    /// The shell should show its untrusted-site banner.
    Untrusted,
}

pub fn classify_navigation(url: &str, trusted_origin: &str) -> Navigation {
    if url == BLANK_PAGE || url.starts_with(trusted_origin) {
        Navigation::Trusted
    } else {
        tracing::debug!(%url, "navigation left the trusted origin");
        Navigation::Untrusted
    }
}
