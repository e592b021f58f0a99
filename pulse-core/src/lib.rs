pub mod config;
pub mod health;
pub mod runtime;
pub mod session;

#[cfg(feature = "uniffi")]
uniffi::setup_scaffolding!();
#[cfg(feature = "uniffi")]
pub mod uniffi_interface;
