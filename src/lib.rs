pub mod auth;
pub mod bridge;
pub mod config;
pub mod error;
pub mod game;
pub mod http;
pub mod launch;
pub mod logging;
pub mod notification;
pub mod session;
pub mod state;
pub mod storage;
pub mod ui;
pub mod version;
pub use error::{AppError, AppResult};
pub use session::StartupOptions;

use auth::{EnvTicketSource, HttpAccountApi};
use config::{load_launcher_settings, ConfigStore, LauncherSettings};
use game::{GameProfile, CARMINE_IMPACT, LAUNCHER_VERSION};
use launch::{LaunchPlanner, SystemProcessSpawner};
use session::{LauncherContext, Services, SessionController};
use storage::GameDirectories;
use ui::DialogPrompt;
use version::HttpVersionEndpoint;

/// Entrypoint used by the CLI binding.
pub fn run(options: StartupOptions) -> AppResult<()> {
    logging::init();
    tracing::info!(version = LAUNCHER_VERSION, "starting gamegate");

    let settings = load_launcher_settings();
    let profile = CARMINE_IMPACT;
    let trusted_origin = settings
        .trusted_url
        .clone()
        .unwrap_or_else(|| profile.trusted_url.to_string());
    let mut controller = build_controller(&settings, profile)?;
    controller.startup(options)?;

    // No page host is embedded in this binary; `bridge::Bridge` is the
    // surface one would take over `shared`.
    tracing::debug!(
        user_agent_suffix = %bridge::user_agent_suffix(),
        %trusted_origin,
        "page host settings"
    );

    let shared = session::share(controller);
    let exit = session::run_play_loop(&shared, &DialogPrompt)?;
    tracing::info!(?exit, state = ?session::lock(&shared).state(), "launcher finished");
    Ok(())
}

/// Wires the production services for `profile`, honouring `settings`
/// overrides.
pub fn build_controller(
    settings: &LauncherSettings,
    profile: GameProfile,
) -> AppResult<SessionController> {
    let install_dir = match &settings.install_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().map_err(AppError::InstallDir)?,
    };
    let directories = match &settings.documents_dir {
        Some(dir) => GameDirectories::with_documents_dir(dir.clone(), &profile),
        None => GameDirectories::with_default_paths(&profile)?,
    };
    let api_url = settings
        .api_url
        .clone()
        .unwrap_or_else(|| profile.api_url.to_string());
    tracing::debug!(
        install_dir = %install_dir.display(),
        documents_dir = %directories.documents_dir().display(),
        %api_url,
        "resolved launcher paths"
    );

    let client = http::build_http_client()?;
    let context = LauncherContext {
        store: ConfigStore::in_dir(&install_dir),
        planner: LaunchPlanner::new(install_dir, profile.binary_name),
        directories,
        current_version: LAUNCHER_VERSION.to_string(),
        profile,
    };
    let services = Services {
        accounts: Box::new(HttpAccountApi::new(client.clone(), api_url)),
        versions: Box::new(HttpVersionEndpoint::new(client)),
        spawner: Box::new(SystemProcessSpawner),
        prompt: Box::new(DialogPrompt),
        tickets: Box::new(EnvTicketSource::default()),
    };
    Ok(SessionController::new(context, services))
}
