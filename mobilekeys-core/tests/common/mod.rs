#![allow(dead_code)]

//! Common test utilities shared across integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use mobilekeys_core::{
    AppIdentity, CalendarDate, CredentialEngine, EngineCallback, EngineConfiguration,
    EngineCredential, EngineError, EngineFailure, PreferenceStore, ProximityPolicy,
    SessionObserver,
};

pub const APP_ID: &str = "CAMPUS-APP";
pub const DEFAULT_LOCK_SERVICE_CODE: u32 = 2;

pub fn identity() -> AppIdentity {
    AppIdentity::new(APP_ID, "4.2.1")
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();
}

/// Engine that delivers every transaction outcome from its own worker thread,
/// the way the vendor SDKs do.
pub struct ThreadedEngine {
    initialized: AtomicBool,
    endpoint_setup: Arc<AtomicBool>,
    endpoint_status_error: Mutex<Option<EngineError>>,
    credentials: Mutex<Result<Vec<EngineCredential>, EngineError>>,
    startup_failures: Mutex<Vec<EngineFailure>>,
    setup_failures: Mutex<Vec<EngineFailure>>,
    initialize_calls: AtomicUsize,
    policies: Mutex<Vec<Arc<ProximityPolicy>>>,
    invitation_codes: Mutex<Vec<String>>,
}

impl ThreadedEngine {
    pub fn new() -> Self {
        Self {
            initialized: AtomicBool::new(false),
            endpoint_setup: Arc::new(AtomicBool::new(false)),
            endpoint_status_error: Mutex::new(None),
            credentials: Mutex::new(Ok(Vec::new())),
            startup_failures: Mutex::new(Vec::new()),
            setup_failures: Mutex::new(Vec::new()),
            initialize_calls: AtomicUsize::new(0),
            policies: Mutex::new(Vec::new()),
            invitation_codes: Mutex::new(Vec::new()),
        }
    }

    /// Makes the next startup fail with `code`.
    pub fn fail_next_startup(&self, code: &str) {
        self.startup_failures.lock().unwrap().push(failure(code));
    }

    /// Makes the next endpoint setup fail with `code`.
    pub fn fail_next_setup(&self, code: &str) {
        self.setup_failures.lock().unwrap().push(failure(code));
    }

    pub fn set_credentials(&self, credentials: Result<Vec<EngineCredential>, EngineError>) {
        *self.credentials.lock().unwrap() = credentials;
    }

    pub fn set_endpoint_status_error(&self, error: Option<EngineError>) {
        *self.endpoint_status_error.lock().unwrap() = error;
    }

    pub fn initialize_calls(&self) -> usize {
        self.initialize_calls.load(Ordering::SeqCst)
    }

    pub fn last_policy(&self) -> Option<Arc<ProximityPolicy>> {
        self.policies.lock().unwrap().last().cloned()
    }

    pub fn invitation_codes(&self) -> Vec<String> {
        self.invitation_codes.lock().unwrap().clone()
    }
}

fn failure(code: &str) -> EngineFailure {
    EngineFailure {
        code: code.to_string(),
        cause_message: format!("{code} (simulated)"),
    }
}

impl CredentialEngine for ThreadedEngine {
    fn initialize(&self, _configuration: EngineConfiguration, policy: Arc<ProximityPolicy>) {
        self.initialize_calls.fetch_add(1, Ordering::SeqCst);
        self.policies.lock().unwrap().push(policy);
        self.initialized.store(true, Ordering::SeqCst);
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn scan_configuration(&self) -> Option<Arc<ProximityPolicy>> {
        self.last_policy()
    }

    fn is_endpoint_setup_complete(&self) -> Result<bool, EngineError> {
        if let Some(error) = self.endpoint_status_error.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(self.endpoint_setup.load(Ordering::SeqCst))
    }

    fn list_credentials(&self) -> Result<Vec<EngineCredential>, EngineError> {
        self.credentials.lock().unwrap().clone()
    }

    fn request_startup(&self, callback: Arc<dyn EngineCallback>) {
        let outcome = self.startup_failures.lock().unwrap().pop();
        thread::spawn(move || match outcome {
            Some(failure) => callback.transaction_failed(failure),
            None => callback.transaction_completed(),
        });
    }

    fn request_endpoint_setup(&self, callback: Arc<dyn EngineCallback>, invitation_code: String) {
        self.invitation_codes.lock().unwrap().push(invitation_code);
        let outcome = self.setup_failures.lock().unwrap().pop();
        let endpoint_setup = Arc::clone(&self.endpoint_setup);
        thread::spawn(move || match outcome {
            Some(failure) => callback.transaction_failed(failure),
            None => {
                endpoint_setup.store(true, Ordering::SeqCst);
                callback.transaction_completed();
            }
        });
    }
}

#[derive(Default)]
pub struct MapPreferences {
    bools: HashMap<String, bool>,
    secure_strings: HashMap<String, String>,
}

impl MapPreferences {
    pub fn with_bool(mut self, key: &str, value: bool) -> Self {
        self.bools.insert(key.to_string(), value);
        self
    }

    pub fn with_secure_string(mut self, key: &str, value: &str) -> Self {
        self.secure_strings.insert(key.to_string(), value.to_string());
        self
    }
}

impl PreferenceStore for MapPreferences {
    fn bool_value(&self, key: String) -> Option<bool> {
        self.bools.get(&key).copied()
    }

    fn secure_string_value(&self, key: String) -> Option<String> {
        self.secure_strings.get(&key).cloned()
    }
}

/// Observer recording callback names in arrival order.
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<String>>,
}

impl EventLog {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }
}

impl SessionObserver for EventLog {
    fn on_startup_complete(&self) {
        self.push("startup_complete");
    }

    fn on_startup_failed(&self, failure: EngineFailure) {
        self.push(format!("startup_failed:{}", failure.code));
    }

    fn on_endpoint_setup_complete(&self) {
        self.push("endpoint_setup_complete");
    }

    fn on_endpoint_setup_failed(&self, failure: EngineFailure) {
        self.push(format!("endpoint_setup_failed:{}", failure.code));
    }

    fn endpoint_not_personalized(&self) {
        self.push("endpoint_not_personalized");
    }
}

pub fn credential(label: &str, end_date: Option<CalendarDate>) -> EngineCredential {
    EngineCredential {
        label: label.to_string(),
        card_number: format!("{label}-0001"),
        issuer: "Facilities".to_string(),
        credential_type: "Campus".to_string(),
        end_date,
    }
}
