//! Anonymous session identity
//!
//! Progress rows and ledger entries are tagged with a session string. The
//! lifetime of that string is an explicit policy rather than an accident of
//! when a screen happened to be constructed.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::core::error::Result;
use crate::settings::SettingsStore;

/// How long a session identifier lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPolicy {
    /// One identifier for the life of the running process
    PerProcess,
    /// One identifier stored in the settings file and reused across runs
    Persistent,
}

/// The session identifier used for progress and wrong-answer rows
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionIdentity {
    id: String,
    policy: SessionPolicy,
}

impl SessionIdentity {
    /// Fresh identifier, not stored anywhere
    pub fn ephemeral() -> Self {
        Self {
            id: Self::generate(),
            policy: SessionPolicy::PerProcess,
        }
    }

    /// Resolve the identifier for `policy`, writing a new persistent id to
    /// `settings` the first time one is needed.
    pub fn resolve(policy: SessionPolicy, settings: &mut SettingsStore) -> Result<Self> {
        match policy {
            SessionPolicy::PerProcess => Ok(Self::ephemeral()),
            SessionPolicy::Persistent => {
                let id = match settings.session_id() {
                    Some(existing) => existing.to_string(),
                    None => {
                        let id = Self::generate();
                        settings.set_session_id(&id)?;
                        tracing::info!("created persistent session {}", id);
                        id
                    }
                };
                Ok(Self { id, policy })
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }

    pub fn policy(&self) -> SessionPolicy {
        self.policy
    }

    fn generate() -> String {
        format!("session_{}", Uuid::new_v4().simple())
    }
}

impl fmt::Display for SessionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_process_ids_differ() {
        let a = SessionIdentity::ephemeral();
        let b = SessionIdentity::ephemeral();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("session_"));
    }

    #[test]
    fn test_persistent_id_is_reused() {
        let mut settings = SettingsStore::in_memory();
        let first = SessionIdentity::resolve(SessionPolicy::Persistent, &mut settings).unwrap();
        let second = SessionIdentity::resolve(SessionPolicy::Persistent, &mut settings).unwrap();
        assert_eq!(first, second);
        assert_eq!(settings.session_id(), Some(first.as_str()));
    }

    #[test]
    fn test_per_process_does_not_touch_settings() {
        let mut settings = SettingsStore::in_memory();
        SessionIdentity::resolve(SessionPolicy::PerProcess, &mut settings).unwrap();
        assert!(settings.session_id().is_none());
    }
}
