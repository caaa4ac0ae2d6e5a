//! Mobile Keys SDK core.
//!
//! Manages a device-resident mobile access credential on top of an external
//! proximity/credential engine implemented by the host platform:
//!
//! 1. Build a [`ProximityPolicy`] from persisted preferences.
//! 2. [`bootstrap()`] the engine once per process to get an [`EngineHandle`].
//! 3. Drive startup and endpoint provisioning through a [`CredentialSession`].
//! 4. Enumerate issued credentials through the session or a [`CredentialCatalog`].
//!
//! Engine failures never escape as panics: they surface as `false`, `None`
//! or a no-op, and through the [`SessionObserver`] and the async
//! `run_*` variants for callers that need the cause.

#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

mod bootstrap;
pub use bootstrap::*;

mod catalog;
pub use catalog::*;

mod defaults;
pub use defaults::*;

mod engine;
pub use engine::*;

mod error;
pub use error::*;

pub mod logger;

mod policy;
pub use policy::*;

mod preferences;
pub use preferences::*;

mod session;
pub use session::*;

uniffi::setup_scaffolding!("mobilekeys_core");
