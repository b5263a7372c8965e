use crate::auth::{
    AccountApi, AuthClient, AuthError, AuthFailureKind, AuthResult, AuthenticatedUser,
    TicketSource,
};
use crate::config::{ConfigStore, LauncherConfig};
use crate::error::AppResult;
use crate::game::GameProfile;
use crate::http::error_with_causes;
use crate::launch::{needs_offline_confirmation, offline_warning, LaunchPlanner, ProcessSpawner};
use crate::state::{AppEvent, AppState, StateMachine};
use crate::storage::{failure_message, GameDirectories, MigrationKind, MigrationManager};
use crate::ui::{MessageLevel, Notice, UserPrompt};
use crate::version::{VersionChecker, VersionEndpoint, VersionStatus};

use super::SessionState;

/// Length of a token issued by the account service.
const GAME_TOKEN_LEN: usize = 64;

const ORIGIN_ACCOUNT_ERROR: &str = "Account Server - Error";
const ORIGIN_UPDATE: &str = "Launcher Update";
const ORIGIN_MIGRATION: &str = "Migration Wizard";
const ORIGIN_OFFLINE: &str = "Offline Mode Warning";
const ORIGIN_WEBPAGE: &str = "Webpage";
const ORIGIN_ERROR: &str = "Error";

const TOKEN_ERROR: &str = "Error setting game token.";

/// External collaborators the controller talks through.
pub struct Services {
    pub accounts: Box<dyn AccountApi + Send>,
    pub versions: Box<dyn VersionEndpoint + Send>,
    pub spawner: Box<dyn ProcessSpawner + Send>,
    pub prompt: Box<dyn UserPrompt + Send>,
    pub tickets: Box<dyn TicketSource + Send>,
}

/// Fixed inputs for one launcher run.
pub struct LauncherContext {
    pub profile: GameProfile,
    pub store: ConfigStore,
    pub directories: GameDirectories,
    pub planner: LaunchPlanner,
    pub current_version: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StartupOptions {
    /// Exchange a platform ticket for a token before validating the stored one.
    pub platform_identity: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupReport {
    pub version: VersionStatus,
    pub migrated: Vec<MigrationKind>,
}

/// What the play prompt should ask, read from the session under the lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayView {
    pub title: String,
    pub play_question: String,
    /// Saying yes to `play_question` means playing offline.
    pub offline_fallback: bool,
    pub quick_connect_question: Option<String>,
}

/// The user's answers to the play prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayDecision {
    pub go_offline: bool,
    pub quick_connect: bool,
    pub save_config: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayGate {
    /// Neither authenticated nor offline.
    NotEligible,
    /// Launch only if the user says yes to this warning.
    ConfirmOffline(Notice),
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedPlay {
    pub gate: PlayGate,
    /// Set when the opted-in config save failed; the launch still goes ahead.
    pub save_failure: Option<Notice>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    /// The game is running; the launcher should exit.
    HandedOff,
    Failed(Notice),
}

/// Owns the config and session state for the lifetime of the launcher.
pub struct SessionController {
    profile: GameProfile,
    store: ConfigStore,
    directories: GameDirectories,
    planner: LaunchPlanner,
    current_version: String,
    auth: AuthClient<Box<dyn AccountApi + Send>>,
    versions: VersionChecker<Box<dyn VersionEndpoint + Send>>,
    spawner: Box<dyn ProcessSpawner + Send>,
    prompt: Box<dyn UserPrompt + Send>,
    tickets: Box<dyn TicketSource + Send>,
    migrations: MigrationManager,
    machine: StateMachine,
    config: LauncherConfig,
    session: SessionState,
}

impl SessionController {
    pub fn new(context: LauncherContext, services: Services) -> Self {
        let game_id = context.profile.id;
        Self {
            profile: context.profile,
            store: context.store,
            directories: context.directories,
            planner: context.planner,
            current_version: context.current_version,
            auth: AuthClient::new(services.accounts, game_id),
            versions: VersionChecker::new(services.versions),
            spawner: services.spawner,
            prompt: services.prompt,
            tickets: services.tickets,
            migrations: MigrationManager::new(),
            machine: StateMachine::new(),
            config: LauncherConfig::default(),
            session: SessionState::default(),
        }
    }

    pub fn state(&self) -> AppState {
        self.machine.state()
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn profile(&self) -> &GameProfile {
        &self.profile
    }

    /// Runs the startup sequence. Each step sees the policy changes made by
    /// the previous one.
    ///
    /// Only an unreadable config aborts; every other failure becomes a
    /// session change plus a message.
    pub fn startup(&mut self, options: StartupOptions) -> AppResult<StartupReport> {
        tracing::info!(version = %self.current_version, game = self.profile.name, "launcher startup");

        self.config = match self.store.load(&self.profile) {
            Ok(config) => config,
            Err(err) => {
                tracing::error!(?err, "launcher config unusable; aborting startup");
                self.show(
                    Some(ORIGIN_ERROR),
                    &format!(
                        "Failed to load the launcher config.\n\n{}",
                        error_with_causes(&err)
                    ),
                    MessageLevel::Error,
                );
                return Err(err.into());
            }
        };
        self.machine.transition(AppEvent::LoadConfig)?;

        let version = self.check_version();
        self.machine.transition(AppEvent::CheckVersion)?;

        self.machine.transition(AppEvent::BeginAuth)?;
        if options.platform_identity {
            self.exchange_platform_ticket();
        }
        let token = self.config.game_token.clone();
        let outcome = self.validate_token(&token);
        if let Err(err) = &outcome {
            if matches!(
                err.kind(),
                AuthFailureKind::Transport | AuthFailureKind::Malformed
            ) {
                self.report_auth_error(err);
            }
        }
        self.machine.transition(AppEvent::FinishAuth)?;

        self.ensure_home_dir();
        let migrated = self.offer_migrations();

        tracing::info!(
            authenticated = self.session.authenticated,
            offline = self.session.offline_requested,
            technical_issues = self.session.technical_issues,
            "startup complete"
        );
        Ok(StartupReport { version, migrated })
    }

    fn check_version(&mut self) -> VersionStatus {
        let status =
            self.versions
                .check(&self.current_version, &self.config.web_url, self.profile.id);
        match &status {
            VersionStatus::UpdateAvailable(remote) => {
                let text = format!(
                    "Looks like your launcher is out of date!\n\nNew version available: {remote}\nYour version: {}",
                    self.current_version
                );
                self.prompt
                    .notify(&self.profile.message_title(Some(ORIGIN_UPDATE)), &text);
            }
            VersionStatus::Unreachable => self.session.mark_unreachable(),
            VersionStatus::UpToDate => {}
        }
        status
    }

    fn exchange_platform_ticket(&mut self) {
        if self.session.technical_issues {
            tracing::info!("skipping platform ticket exchange; service unavailable");
            return;
        }

        let ticket = match self.tickets.session_ticket() {
            Ok(Some(ticket)) => ticket,
            Ok(None) => {
                tracing::info!("no platform ticket available");
                return;
            }
            Err(err) => {
                self.report_ticket_failure(&err);
                return;
            }
        };

        match self.auth.exchange_platform_ticket(&ticket) {
            Ok(Some(token)) => {
                tracing::info!("platform identity issued a game token");
                self.config.game_token = token;
            }
            Ok(None) => {}
            Err(err) => self.report_ticket_failure(&err),
        }
    }

    fn report_ticket_failure(&self, err: &AuthError) {
        tracing::warn!(%err, "platform login failed");
        self.show(
            Some(ORIGIN_ERROR),
            &format!("Steam login failed!\n\nException: {err}"),
            MessageLevel::Error,
        );
    }

    fn validate_token(&mut self, token: &str) -> AuthResult<AuthenticatedUser> {
        let outcome = self.auth.validate(token, self.session.technical_issues);
        self.session.apply_validation(&mut self.config, &outcome);
        match &outcome {
            Ok(user) => tracing::info!(username = %user.username, "game token accepted"),
            Err(err) => tracing::info!(kind = ?err.kind(), %err, "game token not validated"),
        }
        outcome
    }

    fn report_auth_error(&self, err: &AuthError) {
        if let Some(text) = err.user_message() {
            self.show(Some(ORIGIN_ACCOUNT_ERROR), &text, MessageLevel::Error);
        }
    }

    fn ensure_home_dir(&mut self) {
        if self.config.home_dir.is_empty() {
            let home = self.directories.default_home_dir();
            tracing::debug!(home = %home.display(), "using default home directory");
            self.config.home_dir = home.to_string_lossy().into_owned();
        }
    }

    fn offer_migrations(&mut self) -> Vec<MigrationKind> {
        let mut migrated = Vec::new();
        for candidate in self.directories.migration_candidates() {
            if !self.migrations.detect(&candidate) {
                continue;
            }
            self.migrations.mark_offered(&candidate);

            let title = self.profile.message_title(Some(ORIGIN_MIGRATION));
            if !self
                .prompt
                .confirm(&title, candidate.kind.prompt(), MessageLevel::Question)
            {
                tracing::info!(kind = ?candidate.kind, "migration declined");
                continue;
            }

            match self
                .migrations
                .migrate(&candidate, &mut self.config, &self.store)
            {
                Ok(()) => {
                    self.prompt.show_message(
                        &title,
                        candidate.kind.success_message(),
                        MessageLevel::Info,
                    );
                    migrated.push(candidate.kind);
                }
                Err(err) => {
                    self.prompt
                        .show_message(&title, &failure_message(&err), MessageLevel::Error);
                }
            }
        }
        migrated
    }

    /// Token submitted by the hosted page.
    ///
    /// Returns whether the session is now authenticated.
    pub fn set_game_token(&mut self, token: &str, quiet: bool) -> bool {
        if let Err(err) = self.machine.transition(AppEvent::BeginAuth) {
            tracing::warn!(%err, "token submitted outside of the ready state");
            return false;
        }
        let outcome = self.validate_token(token);
        if let Err(err) = self.machine.transition(AppEvent::FinishAuth) {
            tracing::warn!(%err, "could not finish token submission");
        }

        match &outcome {
            Ok(user) if user.token.len() == GAME_TOKEN_LEN => {
                if !quiet {
                    self.show(None, "Successfully set game token!", MessageLevel::Info);
                }
            }
            Ok(_) => {
                self.show(None, TOKEN_ERROR, MessageLevel::Error);
            }
            Err(err) => {
                let text = match err.user_message() {
                    Some(detail) => format!("{TOKEN_ERROR}\n\n{detail}"),
                    None => TOKEN_ERROR.to_string(),
                };
                self.show(None, &text, MessageLevel::Error);
            }
        }
        self.session.authenticated
    }

    pub fn is_token_set(&self) -> bool {
        self.config.has_token()
    }

    pub fn check_token(&self, candidate: &str) -> bool {
        self.config.has_token() && self.config.game_token == candidate
    }

    pub fn game_token(&self) -> &str {
        &self.config.game_token
    }

    /// Message box on behalf of the hosted page.
    pub fn show_page_message(&self, text: &str) {
        self.show(Some(ORIGIN_WEBPAGE), text, MessageLevel::Plain);
    }

    /// Questions for the native play prompt.
    pub fn play_view(&self) -> PlayView {
        let label = self.session.auth_label();
        let name = self.profile.name;
        let offline_fallback = !self.session.can_launch();
        let play_question = if offline_fallback {
            format!("{label}\n\nYou are not logged in. Play {name} offline?")
        } else {
            format!("{label}\n\nPlay {name}?")
        };
        let server = &self.config.q_connect_serv;
        let quick_connect_question = (!offline_fallback
            && !self.session.offline_requested
            && !server.is_empty())
        .then(|| format!("Quick connect to {server}?"));

        PlayView {
            title: self.profile.window_title(),
            play_question,
            offline_fallback,
            quick_connect_question,
        }
    }

    /// Applies the prompt answers, saves if opted in, and decides whether
    /// the offline warning stands between the user and the launch.
    pub fn prepare_play(&mut self, decision: PlayDecision) -> PreparedPlay {
        // The page may have logged the user in while the prompt was open.
        if decision.go_offline && !self.session.can_launch() {
            self.session.offline_requested = true;
        }
        self.session.quick_connect = decision.quick_connect && !self.session.offline_requested;
        self.session.save_config = decision.save_config;

        if !self.session.can_launch() {
            tracing::info!("play requested without a session or offline mode");
            return PreparedPlay {
                gate: PlayGate::NotEligible,
                save_failure: None,
            };
        }

        let save_failure = if self.session.save_config {
            self.store.save(&self.config).err().map(|err| {
                tracing::warn!(?err, "failed to save launcher config before play");
                self.notice(
                    Some(ORIGIN_ERROR),
                    format!(
                        "Failed to save the launcher config.\n\n{}",
                        error_with_causes(&err)
                    ),
                    MessageLevel::Error,
                )
            })
        } else {
            None
        };

        let gate = if needs_offline_confirmation(&self.session) {
            PlayGate::ConfirmOffline(self.notice(
                Some(ORIGIN_OFFLINE),
                offline_warning(self.config.has_token()),
                MessageLevel::Warning,
            ))
        } else {
            PlayGate::Ready
        };
        PreparedPlay { gate, save_failure }
    }

    /// Builds the command line and spawns the game.
    pub fn launch(&mut self) -> AppResult<PlayOutcome> {
        self.machine.transition(AppEvent::Launch)?;
        let command = self.planner.build_command(&self.session, &self.config);
        match self.planner.launch(&self.spawner, &command) {
            Ok(()) => {
                self.machine.transition(AppEvent::HandOff)?;
                Ok(PlayOutcome::HandedOff)
            }
            Err(err) => {
                self.machine.transition(AppEvent::LaunchFailed)?;
                Ok(PlayOutcome::Failed(self.notice(
                    Some(ORIGIN_ERROR),
                    err.user_message(),
                    MessageLevel::Error,
                )))
            }
        }
    }

    fn notice(&self, origin: Option<&str>, text: String, level: MessageLevel) -> Notice {
        Notice::new(self.profile.message_title(origin), text, level)
    }

    fn show(&self, origin: Option<&str>, text: &str, level: MessageLevel) {
        self.prompt
            .show_message(&self.profile.message_title(origin), text, level);
    }
}
