//! One-time initialization of the credential engine.
//!
//! Whether the engine is initialized is always asked of the engine itself;
//! the SDK keeps no flag of its own, so calling [`bootstrap`] again after the
//! host already initialized the engine is a no-op.

use std::sync::Arc;

use log::{debug, error, warn};

use crate::defaults::AppIdentity;
use crate::engine::{CredentialEngine, EngineConfiguration, NfcConfiguration};
use crate::error::BootstrapError;
use crate::policy::ProximityPolicy;
use crate::preferences::{PersistedConfig, PreferenceStore};

/// Shared reference to an initialized credential engine.
///
/// Consumed by [`crate::CredentialSession`] and [`crate::CredentialCatalog`].
#[derive(uniffi::Object)]
pub struct EngineHandle {
    engine: Arc<dyn CredentialEngine>,
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle").finish_non_exhaustive()
    }
}

#[uniffi::export]
impl EngineHandle {
    /// Returns whether both handles drive the same engine instance.
    #[must_use]
    pub fn same_engine(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.engine, &other.engine)
    }

    /// Asks the engine whether the endpoint has been provisioned.
    ///
    /// Fails closed: any engine error is logged and reported as `false`, so
    /// operations gated on provisioning are never permitted by accident.
    #[must_use]
    pub fn is_endpoint_setup_complete(&self) -> bool {
        match self.engine.is_endpoint_setup_complete() {
            Ok(complete) => complete,
            Err(e) => {
                warn!(
                    "endpoint setup status unavailable (code {}): {}",
                    e.code(),
                    e.cause_message()
                );
                false
            }
        }
    }

    /// The scanning policy currently in effect, as reported by the engine.
    ///
    /// `None` if the engine does not expose it, e.g. when the host
    /// initialized it with a configuration of its own.
    #[must_use]
    pub fn scan_configuration(&self) -> Option<Arc<ProximityPolicy>> {
        self.engine.scan_configuration()
    }
}

impl EngineHandle {
    /// The engine behind this handle.
    #[must_use]
    pub fn engine(&self) -> &dyn CredentialEngine {
        self.engine.as_ref()
    }
}

/// Initializes `engine` with the application identity and scanning policy.
///
/// If the engine already reports itself initialized, a handle on it is
/// returned without initializing again.
///
/// # Errors
///
/// Returns [`BootstrapError::InitializationFailed`] if the engine still
/// reports itself uninitialized afterwards. No retry is attempted.
#[uniffi::export]
#[allow(clippy::needless_pass_by_value)]
pub fn bootstrap(
    engine: Arc<dyn CredentialEngine>,
    identity: AppIdentity,
    policy: Arc<ProximityPolicy>,
) -> Result<Arc<EngineHandle>, BootstrapError> {
    if engine.is_initialized() {
        debug!("engine already initialized, skipping bootstrap");
        return Ok(Arc::new(EngineHandle { engine }));
    }

    let configuration = EngineConfiguration {
        application_description: identity.description(),
        application_id: identity.application_id.clone(),
        nfc: NfcConfiguration::default(),
    };
    debug!(
        "initializing engine for {} with triggers {:?} and lock service codes {:?}",
        configuration.application_description,
        policy.opening_triggers(),
        policy.lock_service_codes()
    );
    engine.initialize(configuration, policy);

    if !engine.is_initialized() {
        error!(
            "engine reports uninitialized after initialize for {}",
            identity.application_id
        );
        return Err(BootstrapError::InitializationFailed {
            application_id: identity.application_id,
        });
    }

    Ok(Arc::new(EngineHandle { engine }))
}

/// Builds the proximity policy from persisted preferences and bootstraps the engine.
///
/// Preferences are only read when the engine still needs initializing.
///
/// # Errors
///
/// Returns [`BootstrapError::InvalidConfiguration`] if the persisted lock
/// service codes are malformed, or [`BootstrapError::InitializationFailed`]
/// as [`bootstrap`] does.
#[uniffi::export]
#[allow(clippy::needless_pass_by_value)]
pub fn bootstrap_with_preferences(
    engine: Arc<dyn CredentialEngine>,
    identity: AppIdentity,
    preferences: Arc<dyn PreferenceStore>,
    default_lock_service_code: u32,
) -> Result<Arc<EngineHandle>, BootstrapError> {
    if engine.is_initialized() {
        debug!("engine already initialized, skipping bootstrap");
        return Ok(Arc::new(EngineHandle { engine }));
    }

    let persisted = PersistedConfig::load(preferences.as_ref());
    let policy = ProximityPolicy::from_persisted(&persisted, default_lock_service_code)
        .inspect_err(|e| error!("refusing to bootstrap with stored configuration: {e}"))?;

    bootstrap(engine, identity, Arc::new(policy))
}
