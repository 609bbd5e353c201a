//! Diagnostics HTTP server.

use std::future::Future;

use tokio::net::TcpListener;

use crate::admin::{setup_admin_router, AdminState};

/// Serve the diagnostics router until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AdminState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Admin diagnostics listening");

    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Admin diagnostics stopped");
    Ok(())
}
