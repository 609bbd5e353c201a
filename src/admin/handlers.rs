use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::admin::AdminState;
use crate::bootstrap::{ComponentLog, ComponentName, ErrorLog, ExecutionMode, HealthReport};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub initialized: bool,
    pub mode: ExecutionMode,
    pub components: Vec<ComponentName>,
}

pub async fn get_health(State(state): State<AdminState>) -> (StatusCode, Json<HealthReport>) {
    let report = state.bootstrap.health_check();
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        initialized: state.bootstrap.is_initialized(),
        mode: state.bootstrap.mode(),
        components: state.bootstrap.initialized_components(),
    })
}

pub async fn get_components(State(state): State<AdminState>) -> Json<Vec<ComponentName>> {
    Json(state.bootstrap.initialized_components())
}

pub async fn get_log(State(state): State<AdminState>) -> Json<ComponentLog> {
    Json(state.bootstrap.init_log())
}

pub async fn get_errors(State(state): State<AdminState>) -> Json<ErrorLog> {
    Json(state.bootstrap.init_errors())
}
