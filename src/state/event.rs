use super::model::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppEvent {
    LoadConfig,
    CheckVersion,
    BeginAuth,
    FinishAuth,
    Launch,
    LaunchFailed,
    HandOff,
}

/// One applied transition, kept in the machine's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: AppState,
    pub event: AppEvent,
    pub to: AppState,
}

impl StateTransition {
    pub fn new(from: AppState, event: AppEvent, to: AppState) -> Self {
        Self { from, event, to }
    }
}
