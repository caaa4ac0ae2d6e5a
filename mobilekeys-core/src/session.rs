//! The credential session: startup, endpoint provisioning and readiness.
//!
//! ```text
//! Uninitialized --startup()--> StartingUp --completed--> Ready
//! Ready/Provisioned --provision(code)--> ProvisioningEndpoint --completed--> Provisioned
//! ```
//!
//! A provisioning request made before startup completes still reaches the
//! engine but leaves the local state alone.
//!
//! Every asynchronous engine request gets its own [`EngineCallback`] carrying
//! a one-shot channel. The callback is the only writer of the transition it
//! completes, and it writes through a compare-and-swap on an atomic cell, so
//! outcomes may arrive on any thread. Callbacks never call back into the
//! engine. Gating decisions always use the live engine status; the local
//! [`SessionState`] is informational.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, warn};
use strum::Display;
use tokio::sync::oneshot;

use crate::bootstrap::EngineHandle;
use crate::catalog::{CatalogSnapshot, Credential, CredentialCatalog};
use crate::engine::{EngineCallback, EngineFailure};
use crate::error::EngineError;

/// Lifecycle state of a [`CredentialSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, uniffi::Enum)]
#[strum(serialize_all = "snake_case")]
pub enum SessionState {
    /// Startup has not been requested.
    Uninitialized,
    /// Startup requested, waiting for the engine.
    StartingUp,
    /// Engine started.
    Ready,
    /// Endpoint provisioning requested, waiting for the engine.
    ProvisioningEndpoint,
    /// Endpoint provisioned.
    Provisioned,
}

impl SessionState {
    /// Whether the engine has completed startup.
    #[must_use]
    pub const fn is_operational(self) -> bool {
        matches!(self, Self::Ready | Self::Provisioned)
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::StartingUp,
            2 => Self::Ready,
            3 => Self::ProvisioningEndpoint,
            4 => Self::Provisioned,
            _ => Self::Uninitialized,
        }
    }

    const fn as_u8(self) -> u8 {
        match self {
            Self::Uninitialized => 0,
            Self::StartingUp => 1,
            Self::Ready => 2,
            Self::ProvisioningEndpoint => 3,
            Self::Provisioned => 4,
        }
    }
}

#[derive(Debug)]
struct StateCell(AtomicU8);

impl StateCell {
    const fn new(state: SessionState) -> Self {
        Self(AtomicU8::new(state.as_u8()))
    }

    fn load(&self) -> SessionState {
        SessionState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Moves `from -> to`; returns `false` if the cell held another state.
    fn transition(&self, from: SessionState, to: SessionState) -> bool {
        self.0
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Enters `ProvisioningEndpoint` from an operational state and returns
    /// the state it replaced, or `None` if startup has not completed.
    fn begin_provisioning(&self) -> Option<SessionState> {
        [SessionState::Ready, SessionState::Provisioned]
            .into_iter()
            .find(|&from| self.transition(from, SessionState::ProvisioningEndpoint))
    }

    /// Records a completed endpoint setup unless startup is still outstanding.
    fn finish_provisioning(&self) -> bool {
        [SessionState::ProvisioningEndpoint, SessionState::Ready]
            .into_iter()
            .any(|from| self.transition(from, SessionState::Provisioned))
    }
}

/// Receives the outcome of session requests.
///
/// Methods may be invoked on any thread, including threads owned by the
/// engine. Implementations must not block on the session from within them.
#[uniffi::export(with_foreign)]
pub trait SessionObserver: Send + Sync {
    /// Engine startup completed.
    fn on_startup_complete(&self);

    /// Engine startup failed; `startup()` may be retried.
    fn on_startup_failed(&self, failure: EngineFailure);

    /// Endpoint provisioning completed.
    fn on_endpoint_setup_complete(&self);

    /// Endpoint provisioning failed; `provision()` may be retried.
    fn on_endpoint_setup_failed(&self, failure: EngineFailure);

    /// Startup completed but the endpoint still needs provisioning.
    fn endpoint_not_personalized(&self);
}

/// Result of [`CredentialSession::run_provision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum ProvisionOutcome {
    /// The engine already reported the endpoint as set up; nothing was requested.
    AlreadyProvisioned,
    /// The endpoint was provisioned by this request.
    Provisioned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transaction {
    Startup,
    /// `previous` is `None` when the request left the state untouched.
    EndpointSetup { previous: Option<SessionState> },
}

type Completion = oneshot::Sender<Result<(), EngineError>>;

struct TransactionCallback {
    transaction: Transaction,
    state: Arc<StateCell>,
    observer: Option<Arc<dyn SessionObserver>>,
    completion: Mutex<Option<Completion>>,
}

impl TransactionCallback {
    fn new(
        transaction: Transaction,
        state: Arc<StateCell>,
        observer: Option<Arc<dyn SessionObserver>>,
    ) -> (Arc<Self>, oneshot::Receiver<Result<(), EngineError>>) {
        let (sender, receiver) = oneshot::channel();
        let callback = Arc::new(Self {
            transaction,
            state,
            observer,
            completion: Mutex::new(Some(sender)),
        });
        (callback, receiver)
    }

    /// Claims the right to report; only the first outcome of a request counts.
    fn claim(&self) -> Option<Completion> {
        self.completion
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Rolls back a failed setup and tells the observer.
    fn report_failure(&self, failure: EngineFailure) {
        if let Transaction::EndpointSetup {
            previous: Some(previous),
        } = self.transaction
        {
            self.state
                .transition(SessionState::ProvisioningEndpoint, previous);
        }

        if let Some(observer) = &self.observer {
            match self.transaction {
                Transaction::Startup => observer.on_startup_failed(failure),
                Transaction::EndpointSetup { .. } => observer.on_endpoint_setup_failed(failure),
            }
        }
    }
}

impl EngineCallback for TransactionCallback {
    fn transaction_completed(&self) {
        let Some(completion) = self.claim() else {
            warn!("{:?}: ignoring duplicate completion", self.transaction);
            return;
        };

        match self.transaction {
            Transaction::Startup => {
                if self
                    .state
                    .transition(SessionState::StartingUp, SessionState::Ready)
                {
                    debug!("startup completed, session ready");
                }
                if let Some(observer) = &self.observer {
                    observer.on_startup_complete();
                }
            }
            Transaction::EndpointSetup { .. } => {
                if self.state.finish_provisioning() {
                    debug!("endpoint setup completed, session provisioned");
                } else {
                    debug!("endpoint setup completed in state {}", self.state.load());
                }
                if let Some(observer) = &self.observer {
                    observer.on_endpoint_setup_complete();
                }
            }
        }

        // The receiver is gone for fire-and-forget requests.
        let _ = completion.send(Ok(()));
    }

    fn transaction_failed(&self, failure: EngineFailure) {
        let Some(completion) = self.claim() else {
            warn!("{:?}: ignoring duplicate failure", self.transaction);
            return;
        };

        warn!(
            "{:?} failed (code {}): {}",
            self.transaction, failure.code, failure.cause_message
        );
        self.report_failure(failure.clone());

        let _ = completion.send(Err(EngineError::from(failure)));
    }
}

impl Drop for TransactionCallback {
    fn drop(&mut self) {
        if self.claim().is_some() {
            warn!("{:?}: engine released the callback without an outcome", self.transaction);
            self.report_failure(EngineFailure::from(&EngineError::RequestAbandoned));
        }
    }
}

async fn outcome(receiver: oneshot::Receiver<Result<(), EngineError>>) -> Result<(), EngineError> {
    receiver
        .await
        .unwrap_or_else(|_| Err(EngineError::RequestAbandoned))
}

/// Drives engine startup and endpoint provisioning and gates credential access.
#[derive(uniffi::Object)]
pub struct CredentialSession {
    handle: Arc<EngineHandle>,
    catalog: CredentialCatalog,
    state: Arc<StateCell>,
    observer: Option<Arc<dyn SessionObserver>>,
}

impl std::fmt::Debug for CredentialSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSession")
            .field("state", &self.state.load())
            .finish_non_exhaustive()
    }
}

#[uniffi::export(async_runtime = "tokio")]
impl CredentialSession {
    /// Creates a session over an initialized engine.
    #[uniffi::constructor]
    #[must_use]
    pub fn new(handle: Arc<EngineHandle>, observer: Option<Arc<dyn SessionObserver>>) -> Self {
        Self {
            catalog: CredentialCatalog::new(Arc::clone(&handle)),
            handle,
            state: Arc::new(StateCell::new(SessionState::Uninitialized)),
            observer,
        }
    }

    /// The local lifecycle state.
    ///
    /// Outcomes arrive asynchronously, so a read right after [`Self::startup`]
    /// may still observe the previous state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.load()
    }

    /// Requests engine startup. The outcome is reported to the observer.
    ///
    /// May be called again, e.g. after a failure; every call reaches the engine.
    /// Unlike [`Self::run_startup`], the endpoint status is not checked once
    /// startup completes: the state stays [`SessionState::Ready`] on an already
    /// provisioned device and no `endpoint_not_personalized` is reported. Use
    /// [`Self::is_ready`] for the live answer.
    pub fn startup(&self) {
        drop(self.request_startup());
    }

    /// Requests endpoint provisioning with `invitation_code`.
    ///
    /// Does nothing if the engine reports the endpoint as already set up.
    /// Returns whether a request was sent to the engine. The state only moves
    /// to [`SessionState::ProvisioningEndpoint`] once startup has completed.
    pub fn provision(&self, invitation_code: String) -> bool {
        self.request_provision(invitation_code).is_some()
    }

    /// Live engine query, `false` on any engine error.
    #[must_use]
    pub fn is_endpoint_setup_complete(&self) -> bool {
        self.handle.is_endpoint_setup_complete()
    }

    /// Whether the endpoint is usable for credential operations, asked of the engine.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.is_endpoint_setup_complete()
    }

    /// Lists the issued credentials; `None` if not provisioned or the query failed.
    #[must_use]
    pub fn list_credentials(&self) -> Option<Vec<Credential>> {
        self.catalog.list_credentials()
    }

    /// Lists the issued credentials, distinguishing "not ready" from a failed query.
    #[must_use]
    pub fn credential_snapshot(&self) -> CatalogSnapshot {
        self.catalog.snapshot()
    }

    /// Requests engine startup and waits for its outcome.
    ///
    /// On success the endpoint status is checked: a provisioned endpoint moves
    /// the session to [`SessionState::Provisioned`], otherwise the observer is
    /// told the endpoint is not personalized.
    ///
    /// # Errors
    ///
    /// Returns the engine failure, or [`EngineError::RequestAbandoned`] if the
    /// engine released the request without an outcome.
    pub async fn run_startup(&self) -> Result<(), EngineError> {
        outcome(self.request_startup()).await?;

        if self.handle.is_endpoint_setup_complete() {
            self.state
                .transition(SessionState::Ready, SessionState::Provisioned);
        } else if let Some(observer) = &self.observer {
            observer.endpoint_not_personalized();
        }
        Ok(())
    }

    /// Requests endpoint provisioning and waits for its outcome.
    ///
    /// # Errors
    ///
    /// Returns the engine failure, or [`EngineError::RequestAbandoned`] if the
    /// engine released the request without an outcome.
    pub async fn run_provision(
        &self,
        invitation_code: String,
    ) -> Result<ProvisionOutcome, EngineError> {
        let Some(receiver) = self.request_provision(invitation_code) else {
            return Ok(ProvisionOutcome::AlreadyProvisioned);
        };
        outcome(receiver).await?;
        Ok(ProvisionOutcome::Provisioned)
    }
}

impl CredentialSession {
    fn request_startup(&self) -> oneshot::Receiver<Result<(), EngineError>> {
        if self
            .state
            .transition(SessionState::Uninitialized, SessionState::StartingUp)
        {
            debug!("requesting engine startup");
        } else {
            debug!("re-requesting engine startup in state {}", self.state.load());
        }

        let (callback, receiver) = TransactionCallback::new(
            Transaction::Startup,
            Arc::clone(&self.state),
            self.observer.clone(),
        );
        self.handle.engine().request_startup(callback);
        receiver
    }

    fn request_provision(
        &self,
        invitation_code: String,
    ) -> Option<oneshot::Receiver<Result<(), EngineError>>> {
        if self.handle.is_endpoint_setup_complete() {
            debug!("endpoint already set up, ignoring provisioning request");
            return None;
        }

        let previous = self.state.begin_provisioning();
        match previous {
            Some(previous) => debug!("requesting endpoint setup from state {previous}"),
            None => debug!(
                "requesting endpoint setup before startup completed, keeping state {}",
                self.state.load()
            ),
        }

        let (callback, receiver) = TransactionCallback::new(
            Transaction::EndpointSetup { previous },
            Arc::clone(&self.state),
            self.observer.clone(),
        );
        self.handle
            .engine()
            .request_endpoint_setup(callback, invitation_code);
        Some(receiver)
    }
}
