use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use gamegate::auth::{AccountApi, AuthError, AuthResult, LoginReply, NoTicketSource, TicketReply};
use gamegate::bridge::{Bridge, PageBridge};
use gamegate::config::{ConfigStore, CONFIG_FILE_NAME};
use gamegate::game::CARMINE_IMPACT;
use gamegate::launch::{LaunchCommand, LaunchError, LaunchPlanner, LaunchResult, ProcessSpawner};
use gamegate::session::{
    self, LauncherContext, LoopExit, Services, SessionController, SharedSession, StartupOptions,
};
use gamegate::state::AppState;
use gamegate::storage::GameDirectories;
use gamegate::ui::{MessageLevel, UserPrompt};
use gamegate::version::{VersionEndpoint, VersionError, VersionResult, VersionStatus};

#[derive(Clone, Default)]
struct Accounts {
    logins: Arc<Mutex<VecDeque<AuthResult<LoginReply>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl AccountApi for Accounts {
    fn login(&self, token: &str, game_id: u32) -> AuthResult<LoginReply> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("login {token} {game_id}"));
        self.logins
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(AuthError::Unreachable {
                    message: "unscripted".to_string(),
                })
            })
    }

    fn exchange_ticket(&self, _ticket_hex: &str, _game_id: u32) -> AuthResult<TicketReply> {
        panic!("no platform ticket in these tests");
    }
}

struct Version(Option<&'static str>);

impl VersionEndpoint for Version {
    fn latest_version(&self, _web_url: &str, _game_id: u32) -> VersionResult<String> {
        self.0
            .map(str::to_string)
            .ok_or_else(|| VersionError::Unreachable {
                message: "offline".to_string(),
            })
    }
}

#[derive(Clone, Default)]
struct Spawner {
    spawned: Arc<Mutex<Vec<LaunchCommand>>>,
    failures: Arc<Mutex<usize>>,
}

impl ProcessSpawner for Spawner {
    fn spawn(&self, command: &LaunchCommand) -> LaunchResult<()> {
        let mut failures = self.failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(LaunchError::Spawn {
                executable: command.executable.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing binary"),
            });
        }
        self.spawned.lock().unwrap().push(command.clone());
        Ok(())
    }
}

#[derive(Clone, Default)]
struct Prompt {
    answers: Arc<Mutex<VecDeque<bool>>>,
    log: Arc<Mutex<Vec<String>>>,
}

impl Prompt {
    fn answering(answers: &[bool]) -> Self {
        let prompt = Self::default();
        prompt.answers.lock().unwrap().extend(answers);
        prompt
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

impl UserPrompt for Prompt {
    fn show_message(&self, _title: &str, text: &str, _level: MessageLevel) {
        self.log.lock().unwrap().push(format!("message: {text}"));
    }

    fn confirm(&self, _title: &str, text: &str, _level: MessageLevel) -> bool {
        self.log.lock().unwrap().push(format!("confirm: {text}"));
        self.answers.lock().unwrap().pop_front().unwrap_or(false)
    }

    fn notify(&self, _title: &str, text: &str) {
        self.log.lock().unwrap().push(format!("notify: {text}"));
    }
}

/// Shell prompt that records whether the session lock was free each time
/// the user was asked something.
struct LockWatch {
    session: SharedSession,
    inner: Prompt,
    lock_free: Arc<Mutex<Vec<bool>>>,
}

impl LockWatch {
    fn new(session: &SharedSession, inner: Prompt) -> Self {
        Self {
            session: session.clone(),
            inner,
            lock_free: Arc::default(),
        }
    }

    fn record(&self) {
        let free = self.session.try_lock().is_ok();
        self.lock_free.lock().unwrap().push(free);
    }
}

impl UserPrompt for LockWatch {
    fn show_message(&self, title: &str, text: &str, level: MessageLevel) {
        self.record();
        self.inner.show_message(title, text, level);
    }

    fn confirm(&self, title: &str, text: &str, level: MessageLevel) -> bool {
        self.record();
        self.inner.confirm(title, text, level)
    }

    fn notify(&self, title: &str, text: &str) {
        self.record();
        self.inner.notify(title, text);
    }
}

struct Launcher {
    dir: tempfile::TempDir,
    accounts: Accounts,
    spawner: Spawner,
    prompt: Prompt,
}

impl Launcher {
    fn new(prompt: Prompt) -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            accounts: Accounts::default(),
            spawner: Spawner::default(),
            prompt,
        }
    }

    fn install_dir(&self) -> PathBuf {
        self.dir.path().join("install")
    }

    fn documents_dir(&self) -> PathBuf {
        self.dir.path().join("Documents")
    }

    fn controller(&self, remote_version: Option<&'static str>) -> SessionController {
        fs::create_dir_all(self.install_dir()).unwrap();
        let context = LauncherContext {
            profile: CARMINE_IMPACT,
            store: ConfigStore::in_dir(&self.install_dir()),
            directories: GameDirectories::with_documents_dir(
                self.documents_dir(),
                &CARMINE_IMPACT,
            ),
            planner: LaunchPlanner::new(self.install_dir(), CARMINE_IMPACT.binary_name),
            current_version: "1.0.0".to_string(),
        };
        let services = Services {
            accounts: Box::new(self.accounts.clone()),
            versions: Box::new(Version(remote_version)),
            spawner: Box::new(self.spawner.clone()),
            prompt: Box::new(self.prompt.clone()),
            tickets: Box::new(NoTicketSource),
        };
        SessionController::new(context, services)
    }

    fn saved_config(&self) -> serde_json::Value {
        read_json(&self.install_dir().join(CONFIG_FILE_NAME))
    }
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn fresh_install_reaches_ready_without_prompts() {
    let launcher = Launcher::new(Prompt::default());
    let mut controller = launcher.controller(Some("1.0.0"));

    let report = controller.startup(StartupOptions::default()).unwrap();

    assert_eq!(report.version, VersionStatus::UpToDate);
    assert!(report.migrated.is_empty());
    assert_eq!(controller.state(), AppState::Ready);
    assert!(!controller.session().authenticated);
    assert!(!controller.session().offline_requested);
    assert!(launcher.prompt.log().is_empty());
    assert!(launcher.accounts.calls.lock().unwrap().is_empty());

    let saved = launcher.saved_config();
    assert_eq!(saved["webUrl"], "https://harpnetstudios.com/hnid/launcher/");
    assert_eq!(saved["qConnectServ"], "hnss.ga");
    assert_eq!(saved["gameToken"], "");
}

#[test]
fn fresh_install_without_network_preselects_offline_and_launches() {
    let launcher = Launcher::new(Prompt::default());
    let mut controller = launcher.controller(None);

    controller.startup(StartupOptions::default()).unwrap();
    assert!(controller.session().offline_requested);
    assert!(controller.session().technical_issues);
    let shared = session::share(controller);
    let shell = Prompt::answering(&[true, false]);

    let exit = session::run_play_loop(&shared, &shell).unwrap();

    assert_eq!(exit, LoopExit::HandedOff);
    assert_eq!(session::lock(&shared).state(), AppState::Terminated);
    assert_eq!(
        shell.log(),
        vec![
            "confirm: Not Logged In\n\nPlay Carmine Impact?".to_string(),
            "confirm: Save launcher settings for next time?".to_string(),
        ]
    );
    let spawned = launcher.spawner.spawned.lock().unwrap().clone();
    assert_eq!(spawned.len(), 1);
    let home = launcher
        .documents_dir()
        .join("My Games")
        .join("Carmine Impact Alpha");
    assert_eq!(
        spawned[0].argv(),
        vec![
            "-cOFFLINE".to_string(),
            format!("-q{}", home.display()),
            "-glog.txt".to_string(),
        ]
    );
    assert!(spawned[0].executable.ends_with("cardboard_msvc.exe"));
}

#[test]
fn token_submitted_through_bridge_is_used_for_online_launch() {
    let launcher = Launcher::new(Prompt::default());
    let controller = launcher.controller(Some("1.0.0"));
    let shared = session::share(controller);
    session::lock(&shared)
        .startup(StartupOptions::default())
        .unwrap();

    let token = "f".repeat(64);
    launcher
        .accounts
        .logins
        .lock()
        .unwrap()
        .push_back(Ok(LoginReply {
            message: None,
            status: 0,
            username: Some("pilot".to_string()),
        }));
    let bridge = Bridge::new(shared.clone());
    assert!(bridge.set_game_token(&token, false));
    assert!(bridge.check_token(&token));

    let shell = Prompt::answering(&[true, true, false]);
    let exit = session::run_play_loop(&shared, &shell).unwrap();

    assert_eq!(exit, LoopExit::HandedOff);
    let spawned = launcher.spawner.spawned.lock().unwrap().clone();
    assert_eq!(spawned[0].argv()[0], format!("-c{token}"));
    assert_eq!(spawned[0].argv()[3], "-xconnect hnss.ga");
    assert_eq!(
        launcher.prompt.log(),
        vec!["message: Successfully set game token!".to_string()]
    );
}

#[test]
fn legacy_data_is_migrated_once_when_accepted() {
    let launcher = Launcher::new(Prompt::answering(&[true]));
    let legacy = launcher
        .documents_dir()
        .join("My Games")
        .join("Project Crimson Alpha");
    fs::create_dir_all(&legacy).unwrap();
    fs::write(legacy.join("config.cfg"), "name player").unwrap();
    let mut controller = launcher.controller(Some("1.0.0"));

    let report = controller.startup(StartupOptions::default()).unwrap();

    let current = launcher
        .documents_dir()
        .join("My Games")
        .join("Carmine Impact Alpha");
    assert_eq!(report.migrated.len(), 1);
    assert!(!legacy.exists());
    assert_eq!(
        fs::read_to_string(current.join("config.cfg")).unwrap(),
        "name player"
    );
    assert_eq!(
        launcher.saved_config()["homeDir"],
        current.to_string_lossy().into_owned()
    );
    assert_eq!(
        launcher.prompt.log(),
        vec![
            "confirm: We've detected you're upgrading from an older version. Would you like to migrate your user data folder?".to_string(),
            "message: Successfully migrated user folder!".to_string(),
        ]
    );
}

#[test]
fn play_loop_releases_the_session_while_asking() {
    let launcher = Launcher::new(Prompt::default());
    *launcher.spawner.failures.lock().unwrap() = 1;
    let mut controller = launcher.controller(Some("1.0.0"));
    controller.startup(StartupOptions::default()).unwrap();
    let shared = session::share(controller);
    // offline? yes, save? no, warning? yes, then after the failure: quit.
    let shell = LockWatch::new(&shared, Prompt::answering(&[true, false, true]));

    let exit = session::run_play_loop(&shared, &shell).unwrap();

    assert_eq!(exit, LoopExit::Closed);
    let log = shell.inner.log();
    assert_eq!(log.len(), 5);
    assert!(log[0].ends_with("You are not logged in. Play Carmine Impact offline?"));
    assert!(log[2].contains("OFFLINE mode"));
    assert!(log[3].starts_with("message: Error while starting game process: "));
    assert_eq!(*shell.lock_free.lock().unwrap(), vec![true; 5]);
    assert_eq!(session::lock(&shared).state(), AppState::Ready);
    assert!(launcher.spawner.spawned.lock().unwrap().is_empty());
}

#[test]
fn bridge_is_served_while_the_play_prompt_is_open() {
    let launcher = Launcher::new(Prompt::default());
    let mut controller = launcher.controller(Some("1.0.0"));
    controller.startup(StartupOptions::default()).unwrap();
    let shared = session::share(controller);
    launcher
        .accounts
        .logins
        .lock()
        .unwrap()
        .push_back(Ok(LoginReply {
            message: None,
            status: 0,
            username: Some("pilot".to_string()),
        }));

    struct PageDuringPrompt {
        bridge: Bridge,
        inner: Prompt,
    }

    impl UserPrompt for PageDuringPrompt {
        fn show_message(&self, title: &str, text: &str, level: MessageLevel) {
            self.inner.show_message(title, text, level);
        }

        fn confirm(&self, title: &str, text: &str, level: MessageLevel) -> bool {
            if !self.bridge.is_token_set() {
                let bridge = self.bridge.clone();
                let token = "p".repeat(64);
                let accepted = std::thread::spawn(move || bridge.set_game_token(&token, true))
                    .join()
                    .unwrap();
                assert!(accepted);
            }
            self.inner.confirm(title, text, level)
        }

        fn notify(&self, title: &str, text: &str) {
            self.inner.notify(title, text);
        }
    }

    let shell = PageDuringPrompt {
        bridge: Bridge::new(shared.clone()),
        inner: Prompt::answering(&[true, false]),
    };

    let exit = session::run_play_loop(&shared, &shell).unwrap();

    assert_eq!(exit, LoopExit::HandedOff);
    let spawned = launcher.spawner.spawned.lock().unwrap().clone();
    assert_eq!(spawned[0].argv()[0], format!("-c{}", "p".repeat(64)));
}
