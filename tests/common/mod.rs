//! Shared fakes for bootstrap integration tests.

use std::sync::{Arc, Mutex};

use storefront::bootstrap::{
    Bootstrap, Component, ComponentError, ComponentName, ComponentTable, ExecutionMode,
    MemoryFaultChannel,
};

/// Order in which initializers actually ran.
pub type CallLog = Arc<Mutex<Vec<ComponentName>>>;

/// A component whose behaviour is fixed up front.
pub struct Scripted {
    name: ComponentName,
    calls: CallLog,
    available: bool,
    failure: Option<&'static str>,
}

impl Component for Scripted {
    fn is_available(&self) -> bool {
        self.available
    }

    fn initialize(&self) -> Result<(), ComponentError> {
        self.calls.lock().unwrap().push(self.name);
        match self.failure {
            Some(message) => Err(ComponentError::new(message)),
            None => Ok(()),
        }
    }
}

/// Builds a table of scripted components sharing one call log.
pub struct Script {
    calls: CallLog,
    table: ComponentTable,
}

impl Script {
    /// All six components present and succeeding.
    pub fn all_ok() -> Self {
        let mut script = Self {
            calls: CallLog::default(),
            table: ComponentTable::new(),
        };
        for name in ComponentName::ALL {
            script = script.ok(name);
        }
        script
    }

    pub fn ok(self, name: ComponentName) -> Self {
        self.set(name, true, None)
    }

    pub fn failing(self, name: ComponentName, message: &'static str) -> Self {
        self.set(name, true, Some(message))
    }

    pub fn unavailable(self, name: ComponentName) -> Self {
        self.set(name, false, None)
    }

    fn set(mut self, name: ComponentName, available: bool, failure: Option<&'static str>) -> Self {
        self.table.register(
            name,
            Scripted {
                name,
                calls: self.calls.clone(),
                available,
                failure,
            },
        );
        self
    }

    /// Build a test-mode sequencer; faults go to the returned channel.
    pub fn build(self) -> (Bootstrap, CallLog, Arc<MemoryFaultChannel>) {
        self.build_with_mode(ExecutionMode::Test)
    }

    #[allow(dead_code)]
    pub fn build_with_mode(self, mode: ExecutionMode) -> (Bootstrap, CallLog, Arc<MemoryFaultChannel>) {
        let faults = Arc::new(MemoryFaultChannel::new());
        let bootstrap = Bootstrap::builder(self.table)
            .mode(mode)
            .fault_channel(faults.clone())
            .build();
        (bootstrap, self.calls, faults)
    }
}

#[allow(dead_code)]
pub fn calls(log: &CallLog) -> Vec<ComponentName> {
    log.lock().unwrap().clone()
}
