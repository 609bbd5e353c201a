//! End-to-end behaviour of the bootstrap sequencer with scripted components.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier, Mutex, Weak};
use std::thread;
use std::time::Duration;

use once_cell::sync::OnceCell;
use storefront::bootstrap::state::unix_seconds;
use storefront::bootstrap::{
    from_fn, Bootstrap, BootstrapError, Component, ComponentError, ComponentName, ComponentTable,
    ExecutionMode, HealthReport, MemoryFaultChannel,
};

mod common;
use common::{calls, Script};

use ComponentName::*;

#[test]
fn test_second_init_is_rejected() {
    let (bootstrap, _, _) = Script::all_ok().build();

    bootstrap.init().unwrap();
    assert!(bootstrap.is_initialized());

    let err = bootstrap.init().unwrap_err();
    assert!(matches!(err, BootstrapError::AlreadyInitialized));
    assert!(bootstrap.is_initialized());
    assert_eq!(bootstrap.initialized_components().len(), 6);
}

#[test]
fn test_database_failure_rolls_back() {
    let (bootstrap, call_log, faults) = Script::all_ok()
        .failing(Database, "connection refused")
        .build();

    let err = bootstrap.init().unwrap_err();
    match &err {
        BootstrapError::ComponentInitializationFailed { component, source } => {
            assert_eq!(*component, Database);
            assert_eq!(source.message(), "connection refused");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert!(!bootstrap.is_initialized());
    assert_eq!(bootstrap.init_errors().keys().copied().collect::<Vec<_>>(), vec![Database]);
    assert_eq!(bootstrap.init_log().names(), vec![Config, Cache]);
    assert_eq!(calls(&call_log), vec![Config, Cache, Database]);
    assert!(faults.lines().iter().any(|l| l.contains("database") && l.contains("connection refused")));
}

#[test]
fn test_database_failure_without_cache() {
    let (bootstrap, _, _) = Script::all_ok()
        .unavailable(Cache)
        .failing(Database, "connection refused")
        .build();

    assert!(bootstrap.init().is_err());
    assert_eq!(bootstrap.initialized_components(), vec![Config]);
    for absent in [Logger, Security, Session] {
        assert!(bootstrap.init_log().get(absent).is_none());
    }
}

#[test]
fn test_components_run_in_fixed_order() {
    let (bootstrap, call_log, _) = Script::all_ok().build();
    bootstrap.init().unwrap();

    assert_eq!(bootstrap.initialized_components(), ComponentName::ALL.to_vec());
    assert_eq!(calls(&call_log), ComponentName::ALL.to_vec());
    assert!(bootstrap.init_errors().is_empty());
}

#[test]
fn test_absent_optional_components_are_skipped() {
    let mut table = ComponentTable::new();
    for name in [Session, Logger, Config, Database] {
        table.register(name, from_fn(|| Ok(())));
    }
    let bootstrap = Bootstrap::builder(table)
        .mode(ExecutionMode::Test)
        .fault_channel(MemoryFaultChannel::new())
        .build();

    bootstrap.init().unwrap();
    assert_eq!(bootstrap.initialized_components(), vec![Config, Database, Logger, Session]);
}

#[test]
fn test_unavailable_optional_component_is_not_called() {
    let (bootstrap, call_log, _) = Script::all_ok().unavailable(Security).build();
    bootstrap.init().unwrap();

    assert!(!calls(&call_log).contains(&Security));
    assert_eq!(bootstrap.initialized_components(), vec![Config, Cache, Database, Logger, Session]);
}

#[test]
fn test_health_before_init() {
    let (bootstrap, _, _) = Script::all_ok().build();
    let report = bootstrap.health_check();
    assert_eq!(report, HealthReport::NotInitialized);
    assert_eq!(
        serde_json::to_value(&report).unwrap(),
        serde_json::json!({ "status": "not_initialized" })
    );
}

#[test]
fn test_health_after_init_sums_durations() {
    let table = ComponentName::ALL.into_iter().fold(ComponentTable::new(), |table, name| {
        table.with(
            name,
            from_fn(|| {
                thread::sleep(Duration::from_millis(2));
                Ok(())
            }),
        )
    });
    let bootstrap = Bootstrap::builder(table)
        .mode(ExecutionMode::Test)
        .fault_channel(MemoryFaultChannel::new())
        .build();
    bootstrap.init().unwrap();

    let log = bootstrap.init_log();
    let expected_total: f64 = log.iter().map(|(_, r)| r.duration_seconds()).sum();
    let (first_name, first) = log.first().unwrap();
    assert_eq!(first_name, Config);

    match bootstrap.health_check() {
        HealthReport::Healthy {
            per_component,
            total_duration_seconds,
            initialized_at,
        } => {
            assert_eq!(per_component.len(), 6);
            assert_eq!(total_duration_seconds, expected_total);
            assert!(total_duration_seconds >= 0.012);
            assert_eq!(initialized_at, unix_seconds(first.timestamp));
        }
        other => panic!("expected healthy report, got {other:?}"),
    }
}

#[test]
fn test_reset_refused_in_production() {
    let (bootstrap, _, _) = Script::all_ok().build_with_mode(ExecutionMode::Production);
    bootstrap.init().unwrap();
    let before = bootstrap.init_log();

    let err = bootstrap.reset().unwrap_err();
    assert!(matches!(
        err,
        BootstrapError::OperationNotPermitted { operation: "reset", mode: ExecutionMode::Production }
    ));
    assert!(bootstrap.is_initialized());
    assert_eq!(bootstrap.init_log(), before);
}

#[test]
fn test_reset_clears_state_in_test_mode() {
    let (bootstrap, _, _) = Script::all_ok().failing(Logger, "sink offline").build();
    assert!(bootstrap.init().is_err());
    assert!(!bootstrap.init_errors().is_empty());

    bootstrap.reset().unwrap();
    assert!(!bootstrap.is_initialized());
    assert!(bootstrap.init_log().is_empty());
    assert!(bootstrap.init_errors().is_empty());
    assert_eq!(bootstrap.health_check(), HealthReport::NotInitialized);

    // Resetting an uninitialized sequencer is a no-op.
    bootstrap.reset().unwrap();
}

#[test]
fn test_cli_mode_permits_reset_after_success() {
    let (bootstrap, _, _) = Script::all_ok().build_with_mode(ExecutionMode::Cli);
    bootstrap.init().unwrap();
    bootstrap.reset().unwrap();
    bootstrap.init().unwrap();
    assert!(bootstrap.is_initialized());
}

#[test]
fn test_retry_after_failure_starts_clean() {
    let database_up = Arc::new(AtomicBool::new(false));
    let flag = database_up.clone();
    let table = ComponentName::ALL
        .into_iter()
        .fold(ComponentTable::new(), |table, name| table.with(name, from_fn(|| Ok(()))))
        .with(
            Database,
            from_fn(move || {
                if flag.load(Ordering::SeqCst) {
                    Ok(())
                } else {
                    Err(ComponentError::new("database still starting"))
                }
            }),
        );
    let bootstrap = Bootstrap::builder(table)
        .mode(ExecutionMode::Production)
        .fault_channel(MemoryFaultChannel::new())
        .build();

    assert!(bootstrap.init().is_err());
    assert_eq!(bootstrap.initialized_components(), vec![Config, Cache]);

    database_up.store(true, Ordering::SeqCst);
    bootstrap.init().unwrap();
    assert_eq!(bootstrap.initialized_components(), ComponentName::ALL.to_vec());
    assert!(bootstrap.init_errors().is_empty());
}

/// Calls back into the sequencer from inside an initializer.
struct Reentrant {
    handle: Arc<OnceCell<Weak<Bootstrap>>>,
    observed: Arc<Mutex<Option<String>>>,
}

impl Component for Reentrant {
    fn initialize(&self) -> Result<(), ComponentError> {
        let bootstrap = self
            .handle
            .get()
            .and_then(Weak::upgrade)
            .ok_or_else(|| ComponentError::new("sequencer handle missing"))?;
        let nested = bootstrap.init();
        *self.observed.lock().unwrap() = Some(format!("{nested:?}"));
        Ok(())
    }
}

#[test]
fn test_recursive_init_is_rejected() {
    let handle = Arc::new(OnceCell::new());
    let observed = Arc::new(Mutex::new(None));
    let table = ComponentName::ALL
        .into_iter()
        .fold(ComponentTable::new(), |table, name| table.with(name, from_fn(|| Ok(()))))
        .with(
            Session,
            Reentrant {
                handle: handle.clone(),
                observed: observed.clone(),
            },
        );
    let bootstrap = Arc::new(
        Bootstrap::builder(table)
            .mode(ExecutionMode::Test)
            .fault_channel(MemoryFaultChannel::new())
            .build(),
    );
    handle.set(Arc::downgrade(&bootstrap)).unwrap();

    bootstrap.init().unwrap();
    assert_eq!(observed.lock().unwrap().as_deref(), Some("Err(AlreadyInitialized)"));
    assert_eq!(bootstrap.initialized_components().len(), 6);
}

/// Tries to wipe the sequencer's state from inside an initializer.
struct ResetDuringRun {
    handle: Arc<OnceCell<Weak<Bootstrap>>>,
    observed: Arc<Mutex<Option<String>>>,
}

impl Component for ResetDuringRun {
    fn initialize(&self) -> Result<(), ComponentError> {
        let bootstrap = self
            .handle
            .get()
            .and_then(Weak::upgrade)
            .ok_or_else(|| ComponentError::new("sequencer handle missing"))?;
        let outcome = bootstrap.reset();
        *self.observed.lock().unwrap() = Some(format!("{outcome:?}"));
        Ok(())
    }
}

#[test]
fn test_reset_refused_while_init_runs() {
    let handle = Arc::new(OnceCell::new());
    let observed = Arc::new(Mutex::new(None));
    let table = ComponentName::ALL
        .into_iter()
        .fold(ComponentTable::new(), |table, name| table.with(name, from_fn(|| Ok(()))))
        .with(
            Logger,
            ResetDuringRun {
                handle: handle.clone(),
                observed: observed.clone(),
            },
        );
    let bootstrap = Arc::new(
        Bootstrap::builder(table)
            .mode(ExecutionMode::Test)
            .fault_channel(MemoryFaultChannel::new())
            .build(),
    );
    handle.set(Arc::downgrade(&bootstrap)).unwrap();

    bootstrap.init().unwrap();
    assert_eq!(
        observed.lock().unwrap().as_deref(),
        Some(r#"Err(InitializationInProgress { operation: "reset" })"#)
    );
    assert!(bootstrap.is_initialized());
    assert_eq!(bootstrap.initialized_components(), ComponentName::ALL.to_vec());
    assert!(bootstrap.health_check().is_healthy());

    // Once the run is over, test mode may reset again.
    bootstrap.reset().unwrap();
    assert!(!bootstrap.is_initialized());
}

#[test]
fn test_concurrent_init_runs_once() {
    let table = ComponentName::ALL.into_iter().fold(ComponentTable::new(), |table, name| {
        table.with(
            name,
            from_fn(|| {
                thread::sleep(Duration::from_millis(5));
                Ok(())
            }),
        )
    });
    let bootstrap = Arc::new(
        Bootstrap::builder(table)
            .mode(ExecutionMode::Test)
            .fault_channel(MemoryFaultChannel::new())
            .build(),
    );

    let workers = 8;
    let barrier = Arc::new(Barrier::new(workers));
    let handles: Vec<_> = (0..workers)
        .map(|_| {
            let bootstrap = bootstrap.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                bootstrap.init()
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, BootstrapError::AlreadyInitialized)));
    assert_eq!(bootstrap.initialized_components(), ComponentName::ALL.to_vec());
}
