mod engine;
mod helpers;
mod shutdown;
mod signals;

pub use engine::{run_review, EngineDeps};
pub use shutdown::{execute_with_shutdown_timeout, SHUTDOWN_TIMEOUT_SECONDS};
pub use signals::install_signal_handlers;
