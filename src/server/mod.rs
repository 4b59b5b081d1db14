//! Front ends driving the text protocol.
//!
//! - [`tcp`]: capped TCP listener, one task per connection.
//! - [`console`]: the same loop over stdin/stdout.
//!
//! Both stop on a shared `watch` channel carrying `true` once shutdown has
//! been requested.

pub mod buffer_pool;
pub mod console;
pub mod tcp;

pub use buffer_pool::{BufferPool, PooledBuffer};
pub use console::run_console;
pub use tcp::{ServerSettings, TcpFrontEnd};

use tokio::sync::watch;

/// Resolves once shutdown has been requested or the sender is gone.
pub async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
