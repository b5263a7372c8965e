use crate::notification;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Plain,
    Info,
    Question,
    Warning,
    Error,
}

/// What the launcher needs from the native shell to talk to the user.
pub trait UserPrompt {
    /// Blocking message box.
    fn show_message(&self, title: &str, text: &str, level: MessageLevel);
    /// Blocking yes/no question; `true` means yes.
    fn confirm(&self, title: &str, text: &str, level: MessageLevel) -> bool;
    /// Non-blocking notice that does not need acknowledgement.
    fn notify(&self, title: &str, text: &str);
}

impl<T: UserPrompt + ?Sized> UserPrompt for Box<T> {
    fn show_message(&self, title: &str, text: &str, level: MessageLevel) {
        (**self).show_message(title, text, level)
    }

    fn confirm(&self, title: &str, text: &str, level: MessageLevel) -> bool {
        (**self).confirm(title, text, level)
    }

    fn notify(&self, title: &str, text: &str) {
        (**self).notify(title, text)
    }
}

/// A message box prepared under the session lock and shown after it is
/// released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub text: String,
    pub level: MessageLevel,
}

impl Notice {
    pub fn new(title: impl Into<String>, text: impl Into<String>, level: MessageLevel) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            level,
        }
    }

    pub fn show(&self, prompt: &dyn UserPrompt) {
        prompt.show_message(&self.title, &self.text, self.level);
    }

    /// Asks the notice as a yes/no question.
    pub fn ask(&self, prompt: &dyn UserPrompt) -> bool {
        prompt.confirm(&self.title, &self.text, self.level)
    }
}

/// Native message dialogs plus desktop notifications.
#[derive(Debug, Default)]
pub struct DialogPrompt;

impl DialogPrompt {
    fn dialog(title: &str, text: &str, level: MessageLevel) -> rfd::MessageDialog {
        rfd::MessageDialog::new()
            .set_title(title)
            .set_description(text)
            .set_level(dialog_level(level))
    }
}

fn dialog_level(level: MessageLevel) -> rfd::MessageLevel {
    match level {
        MessageLevel::Warning => rfd::MessageLevel::Warning,
        MessageLevel::Error => rfd::MessageLevel::Error,
        MessageLevel::Plain | MessageLevel::Info | MessageLevel::Question => {
            rfd::MessageLevel::Info
        }
    }
}

impl UserPrompt for DialogPrompt {
    fn show_message(&self, title: &str, text: &str, level: MessageLevel) {
        let _ = Self::dialog(title, text, level)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }

    fn confirm(&self, title: &str, text: &str, level: MessageLevel) -> bool {
        let answer = Self::dialog(title, text, level)
            .set_buttons(rfd::MessageButtons::YesNo)
            .show();
        matches!(answer, rfd::MessageDialogResult::Yes)
    }

    fn notify(&self, title: &str, text: &str) {
        notification::send(title, text);
    }
}
