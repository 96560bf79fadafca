//! Interactive prompts used by file operations and the link toolbar button.

#[cfg(test)]
use std::{cell::RefCell, collections::VecDeque};

pub trait Prompter {
    /// Asks for a line of text; `None` when the user cancels.
    fn prompt(&self, message: &str, default: Option<&str>) -> Option<String>;

    fn confirm(&self, message: &str) -> bool;
}

/// Native `window.prompt` / `window.confirm` dialogs.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserPrompter;

impl Prompter for BrowserPrompter {
    fn prompt(&self, message: &str, default: Option<&str>) -> Option<String> {
        #[cfg(target_arch = "wasm32")]
        {
            let window = web_sys::window()?;
            let answer = match default {
                Some(default) => window.prompt_with_message_and_default(message, default),
                None => window.prompt_with_message(message),
            };
            answer.ok().flatten()
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = (message, default);
            None
        }
    }

    fn confirm(&self, message: &str) -> bool {
        #[cfg(target_arch = "wasm32")]
        {
            web_sys::window()
                .and_then(|window| window.confirm_with_message(message).ok())
                .unwrap_or(false)
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = message;
            false
        }
    }
}

/// Replays queued answers and records every message shown.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<Option<String>>>,
    confirms: RefCell<VecDeque<bool>>,
    shown: RefCell<Vec<String>>,
}

#[cfg(test)]
impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(self, text: &str) -> Self {
        self.answers.borrow_mut().push_back(Some(text.to_string()));
        self
    }

    pub fn cancel(self) -> Self {
        self.answers.borrow_mut().push_back(None);
        self
    }

    pub fn confirm_with(self, accepted: bool) -> Self {
        self.confirms.borrow_mut().push_back(accepted);
        self
    }

    /// Messages shown so far; prompts carry their default after ` | `.
    pub fn shown(&self) -> Vec<String> {
        self.shown.borrow().clone()
    }
}

#[cfg(test)]
impl Prompter for ScriptedPrompter {
    fn prompt(&self, message: &str, default: Option<&str>) -> Option<String> {
        let line = match default {
            Some(default) => format!("{message} | {default}"),
            None => message.to_string(),
        };
        self.shown.borrow_mut().push(line);
        self.answers.borrow_mut().pop_front().flatten()
    }

    fn confirm(&self, message: &str) -> bool {
        self.shown.borrow_mut().push(message.to_string());
        self.confirms.borrow_mut().pop_front().unwrap_or(false)
    }
}
