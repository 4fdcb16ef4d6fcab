//! Usage: Access gate over the saved server list (`NotSetup` / `Locked` / `Unlocked`).
//!
//! `is_setup` lives in `settings.json`; `is_granted` is process-local and always starts `false`.
//! No transition grants access: the credential prompt was never wired up, so a gate that has
//! been set up stays locked until `destroy` turns protection off.

use crate::settings::AppSettings;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, specta::Type)]
#[serde(rename_all = "snake_case")]
pub enum AccessPhase {
    NotSetup,
    Locked,
    Unlocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessGate {
    is_setup: bool,
    is_granted: bool,
}

#[derive(Debug, Clone, Serialize, specta::Type)]
pub struct AccessStatus {
    pub phase: AccessPhase,
    pub is_setup: bool,
    pub is_granted: bool,
    pub access_enabled: bool,
}

impl AccessGate {
    pub fn from_settings(settings: &AppSettings) -> Self {
        Self {
            is_setup: settings.is_setup,
            is_granted: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn from_parts(is_setup: bool, is_granted: bool) -> Self {
        Self {
            is_setup,
            is_granted,
        }
    }

    pub fn is_setup(&self) -> bool {
        self.is_setup
    }

    pub fn is_granted(&self) -> bool {
        self.is_granted
    }

    pub fn access_enabled(&self) -> bool {
        self.is_granted || !self.is_setup
    }

    pub fn phase(&self) -> AccessPhase {
        match (self.is_setup, self.is_granted) {
            (false, _) => AccessPhase::NotSetup,
            (true, false) => AccessPhase::Locked,
            (true, true) => AccessPhase::Unlocked,
        }
    }

    pub fn status(&self) -> AccessStatus {
        AccessStatus {
            phase: self.phase(),
            is_setup: self.is_setup,
            is_granted: self.is_granted,
            access_enabled: self.access_enabled(),
        }
    }

    /// Revokes the current grant. `is_setup` is unchanged.
    pub fn lock(&mut self) {
        self.is_granted = false;
    }

    /// Turns protection off and returns the settings to persist.
    ///
    /// The stored credential goes with it so a later setup cannot silently reuse a stale passkey.
    pub fn destroy(&mut self, settings: &AppSettings) -> AppSettings {
        self.is_setup = false;
        AppSettings {
            is_setup: false,
            passkey: None,
            is_protected: false,
            ..settings.clone()
        }
    }
}
