use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

use crate::config::LauncherConfig;
use crate::session::SessionState;

/// Token passed to the game when it runs without an account session.
pub const OFFLINE_TOKEN: &str = "OFFLINE";
const LOG_FILE_ARG: &str = "-glog.txt";
const BIN_DIR: &str = "bin";
const BIN64_DIR: &str = "bin64";

pub type LaunchResult<T> = std::result::Result<T, LaunchError>;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("{source}")]
    Spawn {
        executable: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LaunchError {
    pub fn user_message(&self) -> String {
        format!("Error while starting game process: {self}")
    }
}

/// Fully resolved game invocation. Rebuilt on every launch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub executable: PathBuf,
    pub working_dir: PathBuf,
    pub arguments: Vec<LaunchArg>,
}

/// One game argument. `quoted` values are wrapped in double quotes on the
/// raw command line, e.g. `-q"C:\My Games"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchArg {
    pub flag: &'static str,
    pub value: String,
    pub quoted: bool,
}

impl LaunchArg {
    fn plain(flag: &'static str, value: impl Into<String>) -> Self {
        Self {
            flag,
            value: value.into(),
            quoted: false,
        }
    }

    fn quoted(flag: &'static str, value: impl Into<String>) -> Self {
        Self {
            flag,
            value: value.into(),
            quoted: true,
        }
    }

    /// Argument as the game sees it after command-line splitting.
    pub fn as_argv(&self) -> String {
        format!("{}{}", self.flag, self.value)
    }

    fn render(&self) -> String {
        if self.quoted {
            format!("{}\"{}\"", self.flag, self.value)
        } else {
            self.as_argv()
        }
    }
}

impl LaunchCommand {
    pub fn argv(&self) -> Vec<String> {
        self.arguments.iter().map(LaunchArg::as_argv).collect()
    }

    /// Raw command line in the exact form the game binary expects.
    pub fn command_line(&self) -> String {
        self.arguments
            .iter()
            .map(LaunchArg::render)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn has_quick_connect(&self) -> bool {
        self.arguments.iter().any(|arg| arg.flag == "-x")
    }
}

/// Log-safe view of a command: the launch token is masked.
pub struct Redacted<'a>(pub &'a LaunchCommand);

impl fmt::Display for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.executable.display())?;
        for arg in &self.0.arguments {
            if arg.flag == "-c" && arg.value != OFFLINE_TOKEN {
                write!(f, " -c<redacted>")?;
            } else {
                write!(f, " {}", arg.render())?;
            }
        }
        Ok(())
    }
}

pub trait ProcessSpawner {
    /// Starts the process without waiting for it.
    fn spawn(&self, command: &LaunchCommand) -> LaunchResult<()>;
}

impl<T: ProcessSpawner + ?Sized> ProcessSpawner for Box<T> {
    fn spawn(&self, command: &LaunchCommand) -> LaunchResult<()> {
        (**self).spawn(command)
    }
}

#[derive(Debug, Default)]
pub struct SystemProcessSpawner;

impl ProcessSpawner for SystemProcessSpawner {
    fn spawn(&self, command: &LaunchCommand) -> LaunchResult<()> {
        let mut process = Command::new(&command.executable);
        process
            .current_dir(&command.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        apply_arguments(&mut process, command);

        process.spawn().map_err(|source| LaunchError::Spawn {
            executable: command.executable.clone(),
            source,
        })?;
        Ok(())
    }
}

#[cfg(windows)]
fn apply_arguments(process: &mut Command, command: &LaunchCommand) {
    use std::os::windows::process::CommandExt;
    process.raw_arg(command.command_line());
}

#[cfg(not(windows))]
fn apply_arguments(process: &mut Command, command: &LaunchCommand) {
    process.args(command.argv());
}

#[derive(Debug, Clone)]
pub struct LaunchPlanner {
    install_dir: PathBuf,
    binary_name: String,
}

impl LaunchPlanner {
    pub fn new(install_dir: PathBuf, binary_name: impl Into<String>) -> Self {
        Self {
            install_dir,
            binary_name: binary_name.into(),
        }
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    pub fn executable_path(&self, use_64bit: bool) -> PathBuf {
        let bin_dir = if use_64bit { BIN64_DIR } else { BIN_DIR };
        self.install_dir.join(bin_dir).join(&self.binary_name)
    }

    /// Argument order and flag letters are fixed by the game binary:
    /// `-c<token> -q"<homeDir>" -glog.txt [-x"connect <server>"]`.
    pub fn build_command(&self, session: &SessionState, config: &LauncherConfig) -> LaunchCommand {
        let token = if session.offline_requested {
            OFFLINE_TOKEN
        } else {
            config.game_token.as_str()
        };

        let mut arguments = vec![
            LaunchArg::plain("-c", token),
            LaunchArg::quoted("-q", config.home_dir.as_str()),
            LaunchArg::plain(LOG_FILE_ARG, ""),
        ];
        if session.quick_connect && !session.offline_requested {
            arguments.push(LaunchArg::quoted(
                "-x",
                format!("connect {}", config.q_connect_serv),
            ));
        }

        LaunchCommand {
            executable: self.executable_path(session.use_64bit),
            working_dir: self.install_dir.clone(),
            arguments,
        }
    }

    pub fn launch<S: ProcessSpawner + ?Sized>(
        &self,
        spawner: &S,
        command: &LaunchCommand,
    ) -> LaunchResult<()> {
        tracing::info!(command = %Redacted(command), "starting game process");
        spawner.spawn(command).inspect_err(|err| {
            tracing::error!(%err, executable = %command.executable.display(), "failed to start game");
        })
    }
}

/// Whether the user must confirm an offline launch. Skipped when the
/// service is known to be down.
pub fn needs_offline_confirmation(session: &SessionState) -> bool {
    session.offline_requested && !session.technical_issues
}

pub fn offline_warning(token_set: bool) -> String {
    let hint = if token_set {
        "please disable offline mode."
    } else {
        "please log into your HNID account."
    };
    format!(
        "Hey, you are about to start the game in OFFLINE mode!\n\nTo experience all that the game has to offer, including multiplayer, {hint}\n\nAre you sure you want to launch in offline mode?"
    )
}
