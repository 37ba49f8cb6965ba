//! Slate storage: the working draft surviving between invocations.
//!
//! Each command is one interaction cycle, and the process exits in
//! between — so a draft with unsaved edits is written to `draft.json`
//! under the state directory. The file is removed whenever the draft is
//! clean or a save lands; a missing file is a valid clean state.

use std::{fs, io, path::PathBuf};

use crate::model::SailPlan;

/// Errors that can occur reading or writing the slate.
#[derive(Debug, thiserror::Error)]
pub enum SlateError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, SlateError>;

/// The on-disk slate holding an in-progress draft.
pub struct Slate {
    path: PathBuf,
}

impl Slate {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: state_dir.into().join("draft.json"),
        }
    }

    /// Loads the saved draft. A missing file is `None`.
    pub fn load(&self) -> Result<Option<SailPlan>> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    /// Saves the draft, replacing any previous one.
    pub fn save(&self, plan: &SailPlan) -> Result<()> {
        let json = serde_json::to_string_pretty(plan)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// Removes the saved draft.
    ///
    /// Idempotent: does nothing if the file doesn't exist.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    use crate::model::{Headsail, MainSail};

    fn test_slate() -> (TempDir, Slate) {
        let dir = TempDir::new().unwrap();
        let slate = Slate::new(dir.path());
        (dir, slate)
    }

    #[test]
    fn load_without_file_is_clean() {
        let (_dir, slate) = test_slate();
        assert!(slate.load().unwrap().is_none());
    }

    #[test]
    fn save_and_load_round_trip() {
        let (_dir, slate) = test_slate();
        let plan = SailPlan {
            main: MainSail::R1,
            headsail: Headsail::Jib,
            ..SailPlan::default()
        };

        slate.save(&plan).unwrap();
        assert_eq!(slate.load().unwrap(), Some(plan));
    }

    #[test]
    fn save_replaces_previous_draft() {
        let (_dir, slate) = test_slate();
        slate.save(&SailPlan::default()).unwrap();

        let plan = SailPlan {
            main: MainSail::Full,
            ..SailPlan::default()
        };
        slate.save(&plan).unwrap();
        assert_eq!(slate.load().unwrap(), Some(plan));
    }

    #[test]
    fn clear_removes_the_draft() {
        let (_dir, slate) = test_slate();
        slate.save(&SailPlan::default()).unwrap();
        slate.clear().unwrap();
        assert!(slate.load().unwrap().is_none());
    }

    #[test]
    fn clear_is_idempotent() {
        let (_dir, slate) = test_slate();
        slate.clear().unwrap();
        slate.clear().unwrap();
    }

    #[test]
    fn corrupt_slate_is_an_error() {
        let (dir, slate) = test_slate();
        fs::write(dir.path().join("draft.json"), "not json").unwrap();
        assert!(matches!(slate.load(), Err(SlateError::Json(_))));
    }
}
