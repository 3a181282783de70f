//! Supervision runtime for driftnote's auxiliary services.
//!
//! Everything the desktop shell needs to run its local services lives
//! here: locating the required executables on the user's machine
//! ([`discovery`]), spawning and supervising the backend and bridge
//! processes ([`process`]), proxying authenticated requests to the
//! backend ([`client`]), and the [`manager`] composition root tying it
//! all together.

pub mod client;
pub mod discovery;
pub mod manager;
pub mod process;

pub use client::{BackendClient, ClientError};
pub use discovery::RuntimeDiscovery;
pub use manager::ServiceManager;
pub use process::{
    EventBroadcaster, LaunchOverride, Readiness, ServiceConfig, ServiceSupervisor,
};
