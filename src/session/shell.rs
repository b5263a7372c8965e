//! Native play prompt. Dialogs are shown with the session lock released so
//! the page bridge stays responsive while the user reads them.

use crate::error::AppResult;
use crate::ui::{MessageLevel, UserPrompt};

use super::controller::{PlayDecision, PlayGate, PlayOutcome, PlayView};
use super::{lock, SharedSession};

const SAVE_QUESTION: &str = "Save launcher settings for next time?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The game is running.
    HandedOff,
    /// The user declined to play.
    Closed,
}

/// Asks the play questions in `view`. `None` means the user quit.
pub fn ask_play(prompt: &dyn UserPrompt, view: &PlayView) -> Option<PlayDecision> {
    if !prompt.confirm(&view.title, &view.play_question, MessageLevel::Question) {
        return None;
    }
    let quick_connect = view
        .quick_connect_question
        .as_deref()
        .is_some_and(|question| prompt.confirm(&view.title, question, MessageLevel::Question));
    let save_config = prompt.confirm(&view.title, SAVE_QUESTION, MessageLevel::Question);

    Some(PlayDecision {
        go_offline: view.offline_fallback,
        quick_connect,
        save_config,
    })
}

/// Prompts until the game is handed off or the user quits. A cancelled
/// offline warning or a failed launch goes back to the prompt.
pub fn run_play_loop(session: &SharedSession, prompt: &dyn UserPrompt) -> AppResult<LoopExit> {
    loop {
        let view = lock(session).play_view();
        let Some(decision) = ask_play(prompt, &view) else {
            tracing::info!("launcher closed by user");
            return Ok(LoopExit::Closed);
        };

        let prepared = lock(session).prepare_play(decision);
        if let Some(notice) = &prepared.save_failure {
            notice.show(prompt);
        }
        match &prepared.gate {
            PlayGate::NotEligible => continue,
            PlayGate::ConfirmOffline(warning) => {
                if !warning.ask(prompt) {
                    tracing::info!("offline launch cancelled");
                    continue;
                }
            }
            PlayGate::Ready => {}
        }

        let outcome = lock(session).launch()?;
        match outcome {
            PlayOutcome::HandedOff => {
                tracing::info!("game started; closing launcher");
                return Ok(LoopExit::HandedOff);
            }
            PlayOutcome::Failed(notice) => notice.show(prompt),
        }
    }
}
