//! Save state slot paths

use std::path::{Path, PathBuf};

/// Base name used when no content is loaded.
pub const DEFAULT_CONTENT_NAME: &str = "default";

/// Highest selectable slot; slot 0 has no suffix.
pub const MAX_SLOT: u8 = 9;

/// Resolves `<dir>/<content>.state[N]` for the selected slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveSlots {
    dir: PathBuf,
    content_name: String,
    slot: u8,
}

impl SaveSlots {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            content_name: String::new(),
            slot: 0,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Name of the loaded content, empty when none.
    pub fn set_content_name(&mut self, name: impl Into<String>) {
        self.content_name = name.into();
    }

    pub fn slot(&self) -> u8 {
        self.slot
    }

    /// Select a slot, clamped to `0..=MAX_SLOT`.
    pub fn select(&mut self, slot: u8) {
        self.slot = slot.min(MAX_SLOT);
    }

    pub fn path(&self) -> PathBuf {
        let base = if self.content_name.is_empty() {
            DEFAULT_CONTENT_NAME
        } else {
            &self.content_name
        };
        let mut name = format!("{base}.state");
        if self.slot > 0 {
            name.push(char::from(b'0' + self.slot));
        }
        self.dir.join(name)
    }

    /// Whether a state file exists for the selected slot.
    pub fn exists(&self) -> bool {
        self.path().is_file()
    }
}
