//! Local Development Server with Live Reload

pub mod broadcast;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod registry;
pub mod watch;

pub use config::schema::ServeConfig;
pub use lifecycle::controller::LifecycleController;
pub use lifecycle::Shutdown;
pub use registry::ClientRegistry;
