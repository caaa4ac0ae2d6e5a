//! Read-only view over the credentials issued to the endpoint.
//!
//! Every query goes to the engine; nothing is cached and the engine keeps
//! ownership of the records. Fields are copied verbatim.

use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, warn};
use serde::Serialize;

use crate::bootstrap::EngineHandle;
use crate::engine::{CalendarDate, EngineCredential, EngineFailure};

/// A mobile key as presented to the host application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, uniffi::Record)]
pub struct Credential {
    /// Display label.
    pub label: String,
    /// Card number printed on the credential.
    pub card_number: String,
    /// Issuing organisation.
    pub issuer: String,
    /// Credential type as named by the engine.
    #[serde(rename = "type")]
    pub credential_type: String,
    /// Expiration date formatted `YYYY-MM-DD`, absent if the credential does not expire.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
}

impl From<EngineCredential> for Credential {
    fn from(credential: EngineCredential) -> Self {
        Self {
            expiration_date: credential.end_date.and_then(format_date),
            label: credential.label,
            card_number: credential.card_number,
            issuer: credential.issuer,
            credential_type: credential.credential_type,
        }
    }
}

fn format_date(date: CalendarDate) -> Option<String> {
    let formatted = NaiveDate::from_ymd_opt(date.year, date.month, date.day)
        .map(|d| d.format("%Y-%m-%d").to_string());
    if formatted.is_none() {
        warn!("dropping impossible credential end date {date:?}");
    }
    formatted
}

/// Outcome of a catalog query.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum CatalogSnapshot {
    /// The endpoint is not provisioned, or its status could not be determined.
    NotReady,
    /// The endpoint is provisioned but the engine failed to enumerate credentials.
    Unavailable {
        /// The failure reported by the engine.
        failure: EngineFailure,
    },
    /// The credentials currently issued, possibly none.
    Listed {
        /// Issued credentials in engine order.
        credentials: Vec<Credential>,
    },
}

impl CatalogSnapshot {
    /// Collapses the snapshot: `None` when not ready or unavailable.
    #[must_use]
    pub fn into_credentials(self) -> Option<Vec<Credential>> {
        match self {
            Self::Listed { credentials } => Some(credentials),
            Self::NotReady | Self::Unavailable { .. } => None,
        }
    }
}

/// Enumerates the credentials issued to a provisioned endpoint.
#[derive(Debug, uniffi::Object)]
pub struct CredentialCatalog {
    handle: Arc<EngineHandle>,
}

#[uniffi::export]
impl CredentialCatalog {
    /// Creates a catalog over an initialized engine.
    #[uniffi::constructor]
    #[must_use]
    pub fn new(handle: Arc<EngineHandle>) -> Self {
        Self { handle }
    }

    /// Queries the engine and reports whether the endpoint is not ready, the
    /// listing failed, or which credentials are issued.
    #[must_use]
    pub fn snapshot(&self) -> CatalogSnapshot {
        if !self.handle.is_endpoint_setup_complete() {
            debug!("credential listing requested before endpoint setup");
            return CatalogSnapshot::NotReady;
        }

        match self.handle.engine().list_credentials() {
            Ok(credentials) => CatalogSnapshot::Listed {
                credentials: credentials.into_iter().map(Credential::from).collect(),
            },
            Err(e) => {
                warn!(
                    "failed to list mobile keys (code {}): {}",
                    e.code(),
                    e.cause_message()
                );
                CatalogSnapshot::Unavailable {
                    failure: EngineFailure::from(&e),
                }
            }
        }
    }

    /// Lists the issued credentials.
    ///
    /// Returns `None` when the endpoint is not provisioned or the engine query
    /// failed, and `Some` (possibly empty) otherwise. Use [`Self::snapshot`] to
    /// tell the two absent cases apart.
    #[must_use]
    pub fn list_credentials(&self) -> Option<Vec<Credential>> {
        self.snapshot().into_credentials()
    }

    /// Lists the issued credentials as a JSON array of objects with the keys
    /// `label`, `card_number`, `issuer`, `type` and, when set, `expiration_date`.
    #[must_use]
    pub fn list_credentials_json(&self) -> Option<String> {
        let credentials = self.list_credentials()?;
        serde_json::to_string(&credentials)
            .inspect_err(|e| warn!("failed to serialize mobile keys: {e}"))
            .ok()
    }
}
