//! Launcher lifecycle: `Init` through startup to `Ready`, then `Launching`
//! until the game is handed off.

mod error;
mod event;
mod machine;
mod model;

pub use error::{StateError, StateResult};
pub use event::AppEvent;
pub use machine::StateMachine;
pub use model::AppState;
