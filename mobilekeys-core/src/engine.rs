//! Interface of the external proximity/credential engine.
//!
//! The engine owns the radio stacks, the credential records and their
//! cryptography. The SDK only drives it through [`CredentialEngine`] and learns
//! about asynchronous outcomes through [`EngineCallback`]. Platform code
//! (Kotlin/Swift) implements both traits over the vendor SDK.

use std::sync::Arc;

use crate::error::EngineError;
use crate::policy::ProximityPolicy;

/// Parameters handed to the engine on initialization.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct EngineConfiguration {
    /// Application id registered with the credential issuer.
    pub application_id: String,
    /// Human readable description, `"{application_id}-{version_name}"`.
    pub application_description: String,
    /// NFC (host card emulation) parameters.
    pub nfc: NfcConfiguration,
}

/// NFC sub-configuration. The SDK always requests the engine defaults.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct NfcConfiguration {
    /// Whether the engine should register its card emulation service.
    pub enabled: bool,
}

impl Default for NfcConfiguration {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// A calendar date as reported by the engine (no time zone).
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Record)]
pub struct CalendarDate {
    /// Full year, e.g. 2027.
    pub year: i32,
    /// Month of year, 1-12.
    pub month: u32,
    /// Day of month, 1-31.
    pub day: u32,
}

/// A credential record as enumerated by the engine.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct EngineCredential {
    /// Display label.
    pub label: String,
    /// Card number printed on the credential.
    pub card_number: String,
    /// Issuing organisation.
    pub issuer: String,
    /// Credential type as named by the engine.
    pub credential_type: String,
    /// Last day the credential is valid, if it expires.
    pub end_date: Option<CalendarDate>,
}

/// Failure reported through [`EngineCallback::transaction_failed`].
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct EngineFailure {
    /// Engine specific error code.
    pub code: String,
    /// Human readable cause.
    pub cause_message: String,
}

/// Completion callback for a single asynchronous engine transaction.
///
/// The engine may invoke it from any thread. Implementations inside the SDK
/// never call back into the engine from these methods.
#[uniffi::export(with_foreign)]
pub trait EngineCallback: Send + Sync {
    /// The transaction completed successfully.
    fn transaction_completed(&self);

    /// The transaction failed.
    fn transaction_failed(&self, failure: EngineFailure);
}

/// The proximity/credential engine the SDK drives.
///
/// The engine synchronizes internally and is safe to call from several threads.
#[uniffi::export(with_foreign)]
pub trait CredentialEngine: Send + Sync {
    /// Initializes the engine with the application identity and scanning policy.
    fn initialize(&self, configuration: EngineConfiguration, policy: Arc<ProximityPolicy>);

    /// Returns whether the engine has been initialized in this process.
    fn is_initialized(&self) -> bool;

    /// The scanning policy the engine is currently running with, if initialized.
    fn scan_configuration(&self) -> Option<Arc<ProximityPolicy>>;

    /// Returns whether the device endpoint has been provisioned.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot determine its endpoint status.
    fn is_endpoint_setup_complete(&self) -> Result<bool, EngineError>;

    /// Enumerates the credentials currently issued to the endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot read its credential records.
    fn list_credentials(&self) -> Result<Vec<EngineCredential>, EngineError>;

    /// Starts the engine's application startup transaction.
    fn request_startup(&self, callback: Arc<dyn EngineCallback>);

    /// Starts endpoint provisioning against `invitation_code`.
    fn request_endpoint_setup(&self, callback: Arc<dyn EngineCallback>, invitation_code: String);
}
