//! Process supervision: spawning, monitoring and tearing down the
//! auxiliary services.

mod broadcaster;
mod config;
mod health;
mod launch;
mod ports;
mod shutdown;
mod stream;
mod supervisor;

pub use broadcaster::EventBroadcaster;
pub use config::{LaunchOverride, Readiness, ServiceConfig};
pub use health::{HEALTH_PATH, HealthChecker, TOKEN_HEADER, is_process_alive};
pub use ports::allocate_ephemeral_port;
pub use shutdown::shutdown_child;
pub use stream::{LineBuffer, spawn_stream_reader};
pub use supervisor::ServiceSupervisor;
