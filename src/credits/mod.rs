use chrono::NaiveDate;
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::errors::WaveError;

/// Daily prompt allowance. This is a usage nudge kept on the user's own
/// machine, not an access control: anyone can edit the state file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptCredits {
    pub remaining: u32,
    pub last_restore: Option<NaiveDate>,
    pub unlimited: bool,
}

impl PromptCredits {
    pub fn new(max: u32) -> Self {
        Self { remaining: max, last_restore: None, unlimited: false }
    }

    /// Refills to `max` once per calendar day. Unlimited users are never
    /// reset.
    pub fn restore_if_new_day(&mut self, today: NaiveDate, max: u32) -> bool {
        if self.unlimited || self.last_restore == Some(today) {
            return false;
        }
        self.remaining = max;
        self.last_restore = Some(today);
        true
    }

    pub fn can_generate(&self) -> bool {
        self.unlimited || self.remaining > 0
    }

    pub fn try_consume(&mut self) -> Result<(), WaveError> {
        if self.unlimited {
            return Ok(());
        }
        if self.remaining == 0 {
            return Err(WaveError::CreditsExhausted);
        }
        self.remaining -= 1;
        Ok(())
    }

    pub fn unlock(&mut self, code: &str, expected: &str) -> bool {
        if !expected.is_empty() && code.trim() == expected {
            self.unlimited = true;
        }
        self.unlimited
    }

    pub fn label(&self) -> String {
        if self.unlimited {
            "unlimited".to_string()
        } else {
            format!("{} left today", self.remaining)
        }
    }
}

/// JSON file holding `PromptCredits` between runs.
pub struct CreditStore {
    path: PathBuf,
    max: u32,
}

impl CreditStore {
    pub fn new(path: impl Into<PathBuf>, max: u32) -> Self {
        Self { path: path.into(), max }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or unreadable file starts a fresh allowance.
    pub fn load(&self) -> PromptCredits {
        let raw = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(_) => {
                debug!(path = %self.path.display(), "no credit state yet");
                return PromptCredits::new(self.max);
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "credit state unreadable, starting fresh");
            PromptCredits::new(self.max)
        })
    }

    pub fn load_for(&self, today: NaiveDate) -> PromptCredits {
        let mut credits = self.load();
        if credits.restore_if_new_day(today, self.max) {
            debug!(%today, max = self.max, "credits restored for a new day");
        }
        credits
    }

    pub fn save(&self, credits: &PromptCredits) -> Result<(), WaveError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;
        let json = serde_json::to_string_pretty(credits)
            .map_err(|e| WaveError::Config(format!("cannot encode credits: {e}")))?;
        let tmp = NamedTempFile::new_in(&dir)?;
        fs::write(tmp.path(), json)?;
        tmp.persist(&self.path).map_err(|e| WaveError::Io(e.error))?;
        Ok(())
    }
}
