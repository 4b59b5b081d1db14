//! Interactive console front end.
//!
//! Runs the same request loop as a TCP session over any buffered reader and
//! writer; the binary wires it to stdin and stdout.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use tracing::debug;

use crate::ds::SlotIndex;
use crate::manager::CacheManager;
use crate::protocol::respond;
use crate::server::wait_for_shutdown;

pub const BANNER: &str = "LRU Engine CLI\n";

/// Reads lines from `reader` until end of input, `EXIT`/`QUIT`, or
/// `shutdown`, writing each reply followed by `\n`.
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> std::io::Result<()> {
/// use lrue::manager::CacheManager;
/// use lrue::server::console::run_console;
/// use tokio::sync::watch;
///
/// let manager: CacheManager = CacheManager::new();
/// let (_tx, rx) = watch::channel(false);
/// let mut out = Vec::new();
/// run_console(&manager, &b"CREATE demo 1\nLIST\n"[..], &mut out, rx).await?;
///
/// assert_eq!(String::from_utf8_lossy(&out), "LRU Engine CLI\nOK\ndemo\n");
/// # Ok(())
/// # }
/// ```
pub async fn run_console<R, W, I>(
    manager: &CacheManager<I>,
    mut reader: R,
    mut writer: W,
    mut shutdown: watch::Receiver<bool>,
) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    I: SlotIndex,
{
    writer.write_all(BANNER.as_bytes()).await?;
    writer.flush().await?;

    let mut line = Vec::new();
    loop {
        line.clear();
        let read = tokio::select! {
            _ = wait_for_shutdown(&mut shutdown) => break,
            read = reader.read_until(b'\n', &mut line) => read?,
        };
        if read == 0 {
            break;
        }

        let response = respond(manager, &line);
        debug!(?response, "console request");
        let Some(reply) = response.render_with("\n") else {
            break;
        };
        writer.write_all(reply.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}
