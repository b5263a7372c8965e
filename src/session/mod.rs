use std::ffi::OsString;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::auth::{AuthError, AuthResult, AuthenticatedUser};
use crate::config::LauncherConfig;

mod controller;
mod shell;

pub use controller::{
    LauncherContext, PlayDecision, PlayGate, PlayOutcome, PlayView, PreparedPlay, Services,
    SessionController, StartupOptions, StartupReport,
};
pub use shell::{ask_play, run_play_loop, LoopExit};

/// The controller behind the one lock every mutation goes through.
pub type SharedSession = Arc<Mutex<SessionController>>;

pub fn share(controller: SessionController) -> SharedSession {
    Arc::new(Mutex::new(controller))
}

pub fn lock(session: &SharedSession) -> MutexGuard<'_, SessionController> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Transient per-run state. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub authenticated: bool,
    pub offline_requested: bool,
    /// The account service was unreachable at startup.
    pub technical_issues: bool,
    pub use_64bit: bool,
    pub quick_connect: bool,
    pub save_config: bool,
    pub display_name: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            authenticated: false,
            offline_requested: false,
            technical_issues: false,
            use_64bit: host_is_64bit(),
            quick_connect: false,
            save_config: false,
            display_name: None,
        }
    }
}

/// Whether the operating system can run the 64-bit game binary.
///
/// A 32-bit launcher on 64-bit Windows runs under WOW64, which reports the
/// real architecture in `PROCESSOR_ARCHITEW6432`. Elsewhere the launcher's
/// own pointer width stands in for the host.
pub fn host_is_64bit() -> bool {
    detect_64bit(cfg!(target_pointer_width = "64"), wow64_host_arch())
}

#[cfg(windows)]
fn wow64_host_arch() -> Option<OsString> {
    std::env::var_os("PROCESSOR_ARCHITEW6432")
}

#[cfg(not(windows))]
fn wow64_host_arch() -> Option<OsString> {
    None
}

fn detect_64bit(built_64bit: bool, wow64_host_arch: Option<OsString>) -> bool {
    if built_64bit {
        return true;
    }
    wow64_host_arch
        .and_then(|arch| arch.into_string().ok())
        .is_some_and(|arch| {
            matches!(
                arch.to_ascii_uppercase().as_str(),
                "AMD64" | "ARM64" | "IA64"
            )
        })
}

impl SessionState {
    pub fn can_launch(&self) -> bool {
        self.authenticated || self.offline_requested
    }

    /// Degrades the session to offline-only after the service proved unreachable.
    pub fn mark_unreachable(&mut self) {
        self.technical_issues = true;
        self.offline_requested = true;
    }

    /// Folds a validation result into the session and the config token.
    ///
    /// After this call `config.game_token` is either the validated token or
    /// empty.
    pub fn apply_validation(
        &mut self,
        config: &mut LauncherConfig,
        outcome: &AuthResult<AuthenticatedUser>,
    ) {
        match outcome {
            Ok(user) => {
                self.authenticated = true;
                self.offline_requested = false;
                self.display_name = Some(user.username.clone());
                config.game_token = user.token.clone();
            }
            Err(err) => {
                self.authenticated = false;
                self.display_name = None;
                config.game_token.clear();
                if !matches!(err, AuthError::MissingToken | AuthError::ServiceUnavailable) {
                    self.offline_requested = true;
                }
            }
        }
    }

    pub fn auth_label(&self) -> String {
        match (&self.display_name, self.authenticated) {
            (Some(name), true) => format!("User: {name}"),
            _ => "Not Logged In".to_string(),
        }
    }
}
