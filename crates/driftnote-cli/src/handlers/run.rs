//! `driftnote run` - start both services and stream events until Ctrl-C.

use anyhow::Result;
use driftnote_core::{AppEvent, LogLevel, ServiceKind, ServiceStatus};
use driftnote_runtime::ServiceManager;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

pub async fn execute(manager: &ServiceManager) -> Result<()> {
    let mut events = manager.subscribe();

    let backend = manager.start(ServiceKind::Backend).await;
    report_start(ServiceKind::Backend, &backend.status, backend.port);

    let bridge = manager.start(ServiceKind::Bridge).await;
    report_start(ServiceKind::Bridge, &bridge.status, None);

    if backend.status != ServiceStatus::Running && bridge.status != ServiceStatus::Running {
        anyhow::bail!("neither service came up; check the logs above");
    }

    println!("Streaming service output; press Ctrl-C to stop.");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "event stream lagged, some lines were dropped");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    println!("\nShutting down...");
    manager.shutdown().await;
    Ok(())
}

fn report_start(kind: ServiceKind, status: &ServiceStatus, port: Option<u16>) {
    match (status, port) {
        (ServiceStatus::Running, Some(port)) => println!("{kind}: running on port {port}"),
        (ServiceStatus::Running, None) => println!("{kind}: running"),
        (status, _) => println!("{kind}: {status:?}"),
    }
}

fn print_event(event: &AppEvent) {
    match event {
        AppEvent::ServiceLog { service, entry } => {
            let level = match entry.level {
                LogLevel::Info => "info",
                LogLevel::Warn => "warn",
                LogLevel::Error => "error",
            };
            println!("[{service}] {level}: {}", entry.message);
        }
        AppEvent::ServiceState { service, state } => {
            println!("[{service}] state: {:?}", state.status);
        }
        AppEvent::RuntimeStatus { .. } => {}
    }
}
