//! Mobile Keys SDK.
//!
//! Distribution crate for the iOS and Android bindings. All functionality
//! lives in [`mobilekeys_core`]; this crate re-exports it together with its
//! `UniFFI` scaffolding under the `mobilekeys` namespace.

pub use mobilekeys_core::*;

uniffi::setup_scaffolding!("mobilekeys");
mobilekeys_core::uniffi_reexport_scaffolding!();
