//! Generates the Kotlin and Swift bindings for the Mobile Keys SDK.

fn main() {
    uniffi::uniffi_bindgen_main();
}
