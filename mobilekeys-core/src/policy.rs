//! Proximity scanning policy: opening triggers and lock service filtering.

use std::collections::BTreeSet;
use std::sync::Arc;

use strum::{Display, EnumString};

use crate::defaults::LOCK_SERVICE_CODES_DELIMITER;
use crate::error::ConfigError;
use crate::preferences::{PersistedConfig, PreferenceStore};

/// How a proximity based opening is initiated.
///
/// Within a policy the order of triggers is their priority: when several
/// could fire for the same proximity event, the first one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, uniffi::Enum)]
#[strum(serialize_all = "snake_case")]
pub enum OpeningTrigger {
    /// Rotate the phone near the reader.
    TwistAndGo,
    /// Tap the phone against the reader.
    Tap,
    /// Open as soon as the phone is within range.
    Seamless,
}

/// Immutable scanning policy handed to the engine at initialization.
///
/// Changing any part of it requires bootstrapping the engine again.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Object)]
pub struct ProximityPolicy {
    opening_triggers: Vec<OpeningTrigger>,
    lock_service_codes: BTreeSet<u32>,
    allow_background_scanning: bool,
    dual_mode_radio: bool,
}

#[uniffi::export]
impl ProximityPolicy {
    /// Builds a policy from already resolved configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidLockCode`] if a stored lock code is not a
    /// non-negative integer.
    #[uniffi::constructor]
    pub fn new(
        twist_and_go_enabled: bool,
        lock_service_codes: Option<String>,
        default_lock_service_code: u32,
    ) -> Result<Self, ConfigError> {
        ProximityPolicyBuilder::new(default_lock_service_code)
            .twist_and_go_enabled(twist_and_go_enabled)
            .lock_service_codes(lock_service_codes)
            .build()
    }

    /// Builds a policy from the host's persisted preferences.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidLockCode`] if a stored lock code is not a
    /// non-negative integer.
    #[uniffi::constructor]
    #[allow(clippy::needless_pass_by_value)]
    pub fn from_preferences(
        preferences: Arc<dyn PreferenceStore>,
        default_lock_service_code: u32,
    ) -> Result<Self, ConfigError> {
        Self::from_persisted(
            &PersistedConfig::load(preferences.as_ref()),
            default_lock_service_code,
        )
    }

    /// Opening triggers in priority order.
    #[must_use]
    pub fn opening_triggers(&self) -> Vec<OpeningTrigger> {
        self.opening_triggers.clone()
    }

    /// Lock service codes the device broadcasts for, ascending.
    #[must_use]
    pub fn lock_service_codes(&self) -> Vec<u32> {
        self.lock_service_codes.iter().copied().collect()
    }

    /// Whether the engine may keep scanning while the app is in the background.
    #[must_use]
    pub const fn allow_background_scanning(&self) -> bool {
        self.allow_background_scanning
    }

    /// Whether the engine should use dual-mode Bluetooth when the radio supports it.
    #[must_use]
    pub const fn dual_mode_radio(&self) -> bool {
        self.dual_mode_radio
    }
}

impl ProximityPolicy {
    /// Builds a policy from values already read out of the preference store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidLockCode`] if a stored lock code is not a
    /// non-negative integer.
    pub fn from_persisted(
        persisted: &PersistedConfig,
        default_lock_service_code: u32,
    ) -> Result<Self, ConfigError> {
        ProximityPolicyBuilder::new(default_lock_service_code)
            .twist_and_go_enabled(persisted.twist_and_go_enabled)
            .lock_service_codes(persisted.lock_service_codes.clone())
            .build()
    }

    /// Lock service codes as a set.
    #[must_use]
    pub const fn lock_service_code_set(&self) -> &BTreeSet<u32> {
        &self.lock_service_codes
    }
}

/// Builder for [`ProximityPolicy`].
#[derive(Debug, Clone)]
pub struct ProximityPolicyBuilder {
    default_lock_service_code: u32,
    twist_and_go_enabled: bool,
    lock_service_codes: Option<String>,
    delimiter: String,
    allow_background_scanning: bool,
    dual_mode_radio: bool,
}

impl ProximityPolicyBuilder {
    /// Starts a builder falling back to `default_lock_service_code` when no
    /// codes are stored.
    #[must_use]
    pub fn new(default_lock_service_code: u32) -> Self {
        Self {
            default_lock_service_code,
            twist_and_go_enabled: false,
            lock_service_codes: None,
            delimiter: LOCK_SERVICE_CODES_DELIMITER.to_string(),
            allow_background_scanning: true,
            dual_mode_radio: true,
        }
    }

    /// Enables the twist-and-go trigger ahead of tap and seamless.
    #[must_use]
    pub fn twist_and_go_enabled(mut self, enabled: bool) -> Self {
        self.twist_and_go_enabled = enabled;
        self
    }

    /// Sets the delimited lock service codes as persisted.
    #[must_use]
    pub fn lock_service_codes(mut self, codes: Option<String>) -> Self {
        self.lock_service_codes = codes;
        self
    }

    /// Overrides the separator between persisted lock service codes.
    #[must_use]
    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Allows or forbids background scanning. Enabled by default.
    #[must_use]
    pub fn allow_background_scanning(mut self, allow: bool) -> Self {
        self.allow_background_scanning = allow;
        self
    }

    /// Requests dual-mode Bluetooth when supported. Enabled by default.
    #[must_use]
    pub fn dual_mode_radio(mut self, dual: bool) -> Self {
        self.dual_mode_radio = dual;
        self
    }

    /// Builds the policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidLockCode`] for the first stored token that
    /// is not a non-negative integer, including empty tokens.
    pub fn build(self) -> Result<ProximityPolicy, ConfigError> {
        let lock_service_codes = match self.lock_service_codes.as_deref() {
            Some(stored) if !stored.trim().is_empty() => {
                parse_lock_service_codes(stored, &self.delimiter)?
            }
            _ => BTreeSet::from([self.default_lock_service_code]),
        };

        let opening_triggers = if self.twist_and_go_enabled {
            vec![
                OpeningTrigger::TwistAndGo,
                OpeningTrigger::Tap,
                OpeningTrigger::Seamless,
            ]
        } else {
            vec![OpeningTrigger::Tap, OpeningTrigger::Seamless]
        };

        Ok(ProximityPolicy {
            opening_triggers,
            lock_service_codes,
            allow_background_scanning: self.allow_background_scanning,
            dual_mode_radio: self.dual_mode_radio,
        })
    }
}

fn parse_lock_service_codes(stored: &str, delimiter: &str) -> Result<BTreeSet<u32>, ConfigError> {
    stored
        .split(delimiter)
        .map(str::trim)
        .enumerate()
        .map(|(position, token)| {
            token
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidLockCode {
                    position: u32::try_from(position).unwrap_or(u32::MAX),
                    token: token.to_string(),
                })
        })
        .collect()
}
