//! The single `localStorage` slot holding the last edited buffer.

use thiserror::Error;

pub const WELCOME_DOCUMENT: &str = "# Welcome to the Markdown Editor\n\nStart typing in markdown format and see the live preview on the right.\n\n## Features\n\n- Live preview\n- Server-side file storage\n- Clean interface\n- VSCode-like dark theme\n- Markdown toolbar\n\n```js\nconsole.log(\"Hello, World!\");\n```";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("localStorage unavailable")]
    Unavailable,
    #[error("localStorage set_item failed: {0}")]
    Write(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftStore {
    key: String,
}

impl DraftStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn load(&self) -> Option<String> {
        #[cfg(target_arch = "wasm32")]
        {
            let storage = web_sys::window()?.local_storage().ok().flatten()?;
            storage.get_item(&self.key).ok().flatten()
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            None
        }
    }

    /// Overwrites the stored draft.
    ///
    /// # Errors
    ///
    /// Returns an error when localStorage is unavailable or the write fails.
    pub fn save(&self, text: &str) -> Result<(), DraftError> {
        #[cfg(target_arch = "wasm32")]
        {
            let storage = web_sys::window()
                .and_then(|w| w.local_storage().ok().flatten())
                .ok_or(DraftError::Unavailable)?;
            storage
                .set_item(&self.key, text)
                .map_err(|e| DraftError::Write(format!("{e:?}")))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = text;
            Ok(())
        }
    }

    /// Startup buffer: the stored draft, or the welcome document when there is none.
    pub fn initial_buffer(&self) -> String {
        self.load().unwrap_or_else(|| WELCOME_DOCUMENT.to_string())
    }
}
