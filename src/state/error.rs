use thiserror::Error;

use super::event::AppEvent;
use super::model::AppState;

pub type StateResult<T> = std::result::Result<T, StateError>;

#[derive(Debug, Error)]
pub enum StateError {
    /// The launcher lifecycle has no edge for `event` from `from`.
    #[error("cannot handle {event:?} while in {from:?}")]
    InvalidStateTransition { from: AppState, event: AppEvent },
}
