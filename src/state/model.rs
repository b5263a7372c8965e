/// Launcher lifecycle. Degraded mode is a session flag, not a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AppState {
    #[default]
    Init,
    ConfigLoaded,
    VersionChecked,
    Authenticating,
    Ready,
    Launching,
    Terminated,
}
