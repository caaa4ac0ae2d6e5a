/// Preference key of the twist-and-go opening trigger toggle (plain preferences).
pub const TWIST_AND_GO_ENABLED_KEY: &str = "mobile_access.twist_and_go_enabled";

/// Preference key of the persisted lock service codes (secure preferences).
pub const LOCK_SERVICE_CODES_KEY: &str = "mobile_access.lock_service_codes";

/// Separator between the persisted lock service codes.
pub const LOCK_SERVICE_CODES_DELIMITER: &str = ",";

/// Build-time identity of the host application.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct AppIdentity {
    /// Application id registered with the credential issuer.
    pub application_id: String,
    /// Version name of the host application build.
    pub version_name: String,
}

impl AppIdentity {
    /// Creates an identity from an application id and version name.
    #[must_use]
    pub fn new(application_id: impl Into<String>, version_name: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            version_name: version_name.into(),
        }
    }

    /// Description reported to the engine, `"{application_id}-{version_name}"`.
    #[must_use]
    pub fn description(&self) -> String {
        format!("{}-{}", self.application_id, self.version_name)
    }
}
