//! Application bootstrap subsystem.
//!
//! # Data Flow
//! ```text
//! init():
//!     Phase 1 (foundational):     Config → Cache?
//!     Phase 2 (single dependency): Database → Logger
//!     Phase 3 (composite):         Security? → Session
//!
//! per component (sequencer.rs):
//!     time initializer
//!     → success: append to component log
//!     → failure: record error, report on fault channel, abort run
//!
//! on abort:
//!     initialized = false (records kept until the next attempt or reset)
//! ```
//!
//! # Design Decisions
//! - Fixed phase table; optional components (`?`) skipped when absent
//! - No retries: the caller decides whether to run `init` again
//! - Raw fault channel for failures that may precede the logger
//! - `initialized` flips before phases run, so recursive or concurrent
//!   callers see `AlreadyInitialized`

pub mod component;
pub mod error;
pub mod fault;
pub mod mode;
pub mod sequencer;
pub mod state;

pub use component::{from_fn, Component, ComponentName, ComponentTable, PhasePlan};
pub use error::{BootstrapError, BootstrapResult, ComponentError};
pub use fault::{FaultChannel, MemoryFaultChannel, StderrFaultChannel};
pub use mode::ExecutionMode;
pub use sequencer::{Bootstrap, BootstrapBuilder};
pub use state::{ComponentLog, ComponentRecord, ErrorLog, ErrorRecord, HealthReport};
