//! The phased, one-shot bootstrap sequencer.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, MutexGuard};
use std::time::{Instant, SystemTime};

use crate::bootstrap::component::{Component, ComponentName, ComponentTable, PhasePlan};
use crate::bootstrap::error::{BootstrapError, BootstrapResult, ComponentError};
use crate::bootstrap::fault::{FaultChannel, StderrFaultChannel};
use crate::bootstrap::mode::ExecutionMode;
use crate::bootstrap::state::{ComponentLog, ComponentRecord, ErrorLog, ErrorRecord, HealthReport, ProcessState};
use crate::observability::metrics;

/// Runs component initializers in fixed phases, at most once per process.
///
/// Construct one per process and share it behind an `Arc`. The state lock
/// is only held for short reads and writes, never while an initializer
/// runs, so initializers may query the sequencer (and a recursive `init`
/// sees `AlreadyInitialized` instead of deadlocking).
pub struct Bootstrap {
    components: ComponentTable,
    plan: PhasePlan,
    mode: ExecutionMode,
    faults: Box<dyn FaultChannel>,
    state: Mutex<ProcessState>,
}

impl Bootstrap {
    /// Sequencer over `components` using stderr as the fault channel and
    /// the mode from the environment.
    pub fn new(components: ComponentTable) -> Self {
        Self::builder(components).build()
    }

    pub fn builder(components: ComponentTable) -> BootstrapBuilder {
        BootstrapBuilder {
            components,
            plan: PhasePlan::standard(),
            mode: None,
            faults: None,
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Run every phase in order.
    ///
    /// On failure the run is rolled back to "not initialized"; records from
    /// the failed attempt stay readable until the next attempt or
    /// [`Bootstrap::reset`].
    pub fn init(&self) -> BootstrapResult<()> {
        {
            let mut state = self.lock();
            if state.initialized {
                return Err(BootstrapError::AlreadyInitialized);
            }
            // A new attempt starts from a clean log; records of a failed
            // attempt are never resumed from.
            state.component_log = ComponentLog::default();
            state.component_errors.clear();
            state.initialized = true;
            state.in_progress = true;
        }

        let started = Instant::now();
        match self.run_phases() {
            Ok(()) => {
                let components = {
                    let mut state = self.lock();
                    state.in_progress = false;
                    state.component_log.names()
                };
                metrics::record_bootstrap_outcome(true, started.elapsed());
                tracing::info!(
                    components = ?components,
                    duration_ms = started.elapsed().as_millis() as u64,
                    mode = %self.mode,
                    "Application bootstrap complete"
                );
                Ok(())
            }
            Err(err) => {
                let (logger_ready, errors) = {
                    let mut state = self.lock();
                    state.initialized = false;
                    state.in_progress = false;
                    (
                        state.component_log.contains(ComponentName::Logger),
                        state.component_errors.clone(),
                    )
                };
                metrics::record_bootstrap_outcome(false, started.elapsed());
                self.faults.report(&format!("bootstrap aborted: {err}"));
                if logger_ready {
                    tracing::error!(
                        component = ?err.component(),
                        errors = ?errors,
                        error = %err,
                        "Application bootstrap failed"
                    );
                }
                Err(err)
            }
        }
    }

    fn run_phases(&self) -> BootstrapResult<()> {
        for (index, phase) in self.plan.phases().enumerate() {
            for &name in phase {
                match self.components.get(name) {
                    Some(component) if name.is_optional() => {
                        match panic::catch_unwind(AssertUnwindSafe(|| component.is_available())) {
                            Ok(true) => self.init_component(name, || component.initialize())?,
                            Ok(false) => {}
                            Err(payload) => {
                                let message = panic_message("availability check", payload.as_ref());
                                self.init_component(name, || Err(ComponentError::new(message)))?;
                            }
                        }
                    }
                    Some(component) => {
                        self.init_component(name, || component.initialize())?;
                    }
                    None if name.is_optional() => {}
                    None => {
                        self.init_component(name, || Err(ComponentError::unavailable(name)))?;
                    }
                }
            }
            if self.is_logger_ready() {
                tracing::debug!(phase = index + 1, "Bootstrap phase complete");
            }
        }
        Ok(())
    }

    /// Initialize a single component, timing it and recording the outcome.
    pub fn init_component<F>(&self, name: ComponentName, initializer: F) -> BootstrapResult<()>
    where
        F: FnOnce() -> Result<(), ComponentError>,
    {
        if self.lock().component_log.contains(name) {
            self.record_error(name, &ComponentError::new("component initialized twice in one run"));
            return Err(BootstrapError::DuplicateComponentInit(name));
        }

        let started = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(initializer))
            .unwrap_or_else(|payload| Err(ComponentError::new(panic_message("initializer", payload.as_ref()))));
        let duration = started.elapsed();

        match outcome {
            Ok(()) => {
                let appended = self
                    .lock()
                    .component_log
                    .append(name, ComponentRecord::success(duration, SystemTime::now()));
                if !appended {
                    // The initializer itself brought the same component up.
                    self.record_error(name, &ComponentError::new("component initialized twice in one run"));
                    return Err(BootstrapError::DuplicateComponentInit(name));
                }
                metrics::record_component_init(name, duration);
                Ok(())
            }
            Err(source) => {
                self.record_error(name, &source);
                metrics::record_component_failure(name);
                Err(BootstrapError::ComponentInitializationFailed { component: name, source })
            }
        }
    }

    fn record_error(&self, name: ComponentName, error: &ComponentError) {
        let record = ErrorRecord {
            message: error.to_string(),
            source_location: error.file().to_string(),
            line_number: error.line(),
            timestamp: SystemTime::now(),
        };
        self.lock().component_errors.entry(name).or_insert(record);
        self.faults.report(&format!(
            "component `{name}` failed at {}:{}: {error}",
            error.file(),
            error.line()
        ));
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().initialized
    }

    pub fn initialized_components(&self) -> Vec<ComponentName> {
        self.lock().component_log.names()
    }

    pub fn init_log(&self) -> ComponentLog {
        self.lock().component_log.clone()
    }

    pub fn init_errors(&self) -> ErrorLog {
        self.lock().component_errors.clone()
    }

    pub fn health_check(&self) -> HealthReport {
        self.lock().health()
    }

    /// Clear all state back to the uninitialized baseline.
    ///
    /// Only permitted outside production and never while `init()` is
    /// running; otherwise the state is left untouched.
    pub fn reset(&self) -> BootstrapResult<()> {
        if !self.mode.permits_reset() {
            return Err(BootstrapError::OperationNotPermitted {
                operation: "reset",
                mode: self.mode,
            });
        }
        let mut state = self.lock();
        if state.in_progress {
            return Err(BootstrapError::InitializationInProgress { operation: "reset" });
        }
        *state = ProcessState::default();
        Ok(())
    }

    fn is_logger_ready(&self) -> bool {
        self.lock().component_log.contains(ComponentName::Logger)
    }

    fn lock(&self) -> MutexGuard<'_, ProcessState> {
        // State is only ever replaced wholesale or appended to, so a
        // poisoned guard still holds a consistent value.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Builder for [`Bootstrap`].
pub struct BootstrapBuilder {
    components: ComponentTable,
    plan: PhasePlan,
    mode: Option<ExecutionMode>,
    faults: Option<Box<dyn FaultChannel>>,
}

impl BootstrapBuilder {
    pub fn mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn fault_channel(mut self, faults: impl FaultChannel + 'static) -> Self {
        self.faults = Some(Box::new(faults));
        self
    }

    #[cfg(test)]
    pub(crate) fn plan(mut self, plan: PhasePlan) -> Self {
        self.plan = plan;
        self
    }

    pub fn build(self) -> Bootstrap {
        Bootstrap {
            components: self.components,
            plan: self.plan,
            mode: self.mode.unwrap_or_else(ExecutionMode::from_env),
            faults: self.faults.unwrap_or_else(|| Box::new(StderrFaultChannel)),
            state: Mutex::new(ProcessState::default()),
        }
    }
}

fn panic_message(what: &str, payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("{what} panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("{what} panicked: {s}")
    } else {
        format!("{what} panicked")
    }
}
