//! Port allocation for the backend service.

use anyhow::{Context, Result};
use std::net::TcpListener;
use tracing::debug;

/// Allocate an OS-assigned ephemeral port on the loopback interface.
///
/// Binds `127.0.0.1:0`, reads back the assigned port, and releases the
/// listener. The small window between release and the child binding the
/// port is tolerated: the readiness gate catches a child that lost the
/// race and could not bind.
pub fn allocate_ephemeral_port() -> Result<u16> {
    let listener =
        TcpListener::bind(("127.0.0.1", 0)).context("failed to bind an ephemeral port")?;
    let port = listener
        .local_addr()
        .context("failed to read allocated port")?
        .port();
    debug!(%port, "allocated ephemeral port");
    Ok(port)
}
