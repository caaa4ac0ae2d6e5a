//! Access to the host application's persisted preferences.

use crate::defaults::{LOCK_SERVICE_CODES_KEY, TWIST_AND_GO_ENABLED_KEY};

/// Key-value preferences persisted by the host application.
///
/// Plain values live in the regular preference file; lock service codes are
/// kept in the platform's secure preferences.
#[uniffi::export(with_foreign)]
pub trait PreferenceStore: Send + Sync {
    /// Reads a boolean from plain preferences, `None` if not stored.
    fn bool_value(&self, key: String) -> Option<bool>;

    /// Reads a string from secure preferences, `None` if not stored.
    fn secure_string_value(&self, key: String) -> Option<String>;
}

/// The persisted values the proximity policy is built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedConfig {
    /// Whether the twist-and-go opening trigger is enabled. Defaults to `false`.
    pub twist_and_go_enabled: bool,
    /// Delimited lock service codes, as stored.
    pub lock_service_codes: Option<String>,
}

impl PersistedConfig {
    /// Reads the persisted values under their stable keys.
    #[must_use]
    pub fn load(store: &dyn PreferenceStore) -> Self {
        Self {
            twist_and_go_enabled: store
                .bool_value(TWIST_AND_GO_ENABLED_KEY.to_string())
                .unwrap_or(false),
            lock_service_codes: store.secure_string_value(LOCK_SERVICE_CODES_KEY.to_string()),
        }
    }
}
