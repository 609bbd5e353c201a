//! Storefront application library.
//!
//! The core is [`bootstrap::Bootstrap`], which brings the application's
//! subsystems up in a fixed, phased order exactly once per process and
//! reports on how that went.

pub mod admin;
pub mod bootstrap;
pub mod components;
pub mod config;
pub mod observability;

pub use bootstrap::{Bootstrap, BootstrapError, ComponentName, HealthReport};
pub use components::{standard_components, AppContext};
pub use config::AppConfig;
