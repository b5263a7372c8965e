use super::error::{StateError, StateResult};
use super::{event::StateTransition, AppEvent, AppState};

#[derive(Debug)]
pub struct StateMachine {
    state: AppState,
    transition_history: Vec<StateTransition>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: AppState::default(),
            transition_history: Vec::new(),
        }
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    fn next_state(&self, event: AppEvent) -> Option<AppState> {
        use AppEvent::*;
        match (self.state, event) {
            (AppState::Init, LoadConfig) => Some(AppState::ConfigLoaded),
            (AppState::ConfigLoaded, CheckVersion) => Some(AppState::VersionChecked),
            (AppState::VersionChecked, BeginAuth) => Some(AppState::Authenticating),
            (AppState::Ready, BeginAuth) => Some(AppState::Authenticating),
            (AppState::Authenticating, FinishAuth) => Some(AppState::Ready),
            (AppState::Ready, Launch) => Some(AppState::Launching),
            (AppState::Launching, LaunchFailed) => Some(AppState::Ready),
            (AppState::Launching, HandOff) => Some(AppState::Terminated),
            _ => None,
        }
    }

    pub fn transition(&mut self, event: AppEvent) -> StateResult<AppState> {
        tracing::debug!(from = ?self.state, event = ?event, "request state transition");
        let next = self.next_state(event).ok_or_else(|| {
            let from = self.state;
            tracing::warn!(from = ?from, event = ?event, "invalid state transition requested");
            StateError::InvalidStateTransition { from, event }
        })?;

        let record = StateTransition::new(self.state, event, next);
        self.state = next;
        self.transition_history.push(record);

        Ok(self.state)
    }
}

#[cfg(test)]
impl StateMachine {
    fn history(&self) -> &[StateTransition] {
        &self.transition_history
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
