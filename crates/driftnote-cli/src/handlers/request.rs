//! `driftnote request` - one-shot authenticated request against a
//! freshly booted backend.

use anyhow::{Context, Result, bail};
use driftnote_core::{ServiceKind, ServiceStatus};
use driftnote_runtime::ServiceManager;
use serde_json::Value;

pub async fn execute(
    manager: &ServiceManager,
    method: &str,
    path: &str,
    body: Option<&str>,
) -> Result<()> {
    let body: Option<Value> = body
        .map(serde_json::from_str)
        .transpose()
        .context("request body is not valid JSON")?;

    let state = manager.start(ServiceKind::Backend).await;
    if state.status != ServiceStatus::Running {
        let detail = state.last_error.unwrap_or_else(|| format!("{:?}", state.status));
        bail!("backend failed to start: {detail}");
    }

    let result = manager.request_json(method, path, body).await;

    // Tear the ephemeral backend down before reporting, success or not.
    manager.stop(ServiceKind::Backend).await;

    let response = result?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
