//! Server wiring: application state and startup.

pub mod init;
pub mod state;

pub use init::create_app;
pub use state::AppState;
