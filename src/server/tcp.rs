//! TCP front end.
//!
//! ## Accept Loop
//!
//! ```text
//!   loop:
//!     ┌──────────────────────┐   at cap: wait here, accept nothing
//!     │ acquire conn permit  │◄──────────────────────────────┐
//!     └──────────┬───────────┘                               │
//!                ▼                                           │
//!     ┌──────────────────────┐   spawn    ┌──────────────────┴──┐
//!     │ listener.accept()    │──────────► │ session task        │
//!     └──────────────────────┘            │  take pooled buffer │
//!                                         │  greeting           │
//!                                         │  line ─► respond    │
//!                                         │  drop permit, buf   │
//!                                         └─────────────────────┘
//! ```
//!
//! A shutdown signal stops the accept loop and makes every session return
//! once its current command has been answered.
//!
//! ## Framing
//!
//! Requests end at `\n`; a trailing `\r` is ignored by the parser. A line
//! that fills the receive buffer without a `\n` is answered with
//! `ERR line too long`, and everything up to and including its `\n` is
//! discarded before framing resumes. Bytes left over when the peer closes
//! are processed as a final request.

use std::io;
use std::net::SocketAddr;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::ds::SlotIndex;
use crate::error::{CommandError, ConfigError, ServeError};
use crate::manager::CacheManager;
use crate::protocol::{Response, rejected, respond};
use crate::report;
use crate::server::buffer_pool::BufferPool;
use crate::server::wait_for_shutdown;

pub const GREETING: &str = "Connected to lru cachemanager\r\n";
pub const LINE_TERMINATOR: &str = "\r\n";

/// Listener limits taken from [`EngineConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerSettings {
    pub max_connections: usize,
    pub buffer_size: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl ServerSettings {
    /// Rejects limits under which no client could be served.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::new("max connections must be at least 1"));
        }
        if self.buffer_size == 0 {
            return Err(ConfigError::new("buffer size must be at least 1 byte"));
        }
        Ok(())
    }
}

impl From<&EngineConfig> for ServerSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            max_connections: config.max_connections,
            buffer_size: config.buffer_size,
        }
    }
}

/// Bound TCP listener, ready to serve.
#[derive(Debug)]
pub struct TcpFrontEnd {
    listener: TcpListener,
    settings: ServerSettings,
}

impl TcpFrontEnd {
    /// Validates `settings` and binds the listener. Failure is fatal for
    /// this front end.
    pub async fn bind(addr: &str, settings: ServerSettings) -> Result<Self, ServeError> {
        settings.validate()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServeError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        Ok(Self { listener, settings })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServeError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until `shutdown` flips to `true`, then waits for
    /// open sessions to finish their current command.
    pub async fn serve<I: SlotIndex>(
        self,
        manager: Arc<CacheManager<I>>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), ServeError> {
        let addr = self.local_addr()?;
        let permits = Arc::new(Semaphore::new(self.settings.max_connections));
        let pool = BufferPool::new(self.settings.buffer_size, self.settings.max_connections);
        info!(
            %addr,
            max_connections = self.settings.max_connections,
            buffer_size = pool.buffer_size(),
            "tcp listener started"
        );
        let active = Arc::new(AtomicUsize::new(0));
        let mut sessions = JoinSet::new();

        loop {
            let permit = tokio::select! {
                _ = wait_for_shutdown(&mut shutdown) => break,
                permit = Arc::clone(&permits).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let (stream, peer) = tokio::select! {
                _ = wait_for_shutdown(&mut shutdown) => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        report::non_fatal("failed to accept connection", &err);
                        continue;
                    },
                },
            };

            let open = active.fetch_add(1, Ordering::Relaxed) + 1;
            info!(%peer, active = open, "client connected");

            let manager = Arc::clone(&manager);
            let pool = Arc::clone(&pool);
            let active = Arc::clone(&active);
            let mut shutdown = shutdown.clone();
            sessions.spawn(async move {
                let mut buf = pool.take();
                if let Err(err) = handle_connection(stream, &manager, &mut buf, &mut shutdown).await {
                    report::non_fatal("connection ended with an error", &err);
                }
                drop(buf);
                drop(permit);
                let open = active.fetch_sub(1, Ordering::Relaxed) - 1;
                info!(%peer, active = open, "client disconnected");
            });

            // Reap finished sessions so the set does not grow unbounded.
            while sessions.try_join_next().is_some() {}
        }

        info!(%addr, open = sessions.len(), "tcp listener stopping");
        while sessions.join_next().await.is_some() {}
        Ok(())
    }
}

/// Runs one protocol session over `stream` using `buf` for framing.
///
/// Returns when the peer closes, sends `EXIT`/`QUIT`, or `shutdown` fires.
pub async fn handle_connection<S, I>(
    mut stream: S,
    manager: &CacheManager<I>,
    buf: &mut [u8],
    shutdown: &mut watch::Receiver<bool>,
) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
    I: SlotIndex,
{
    stream.write_all(GREETING.as_bytes()).await?;

    let mut filled = 0;
    let mut discarding = false;
    loop {
        if filled == buf.len() {
            // A full buffer without a newline cannot hold the request.
            let response = rejected(CommandError::LineTooLong);
            if answer(&mut stream, response).await?.is_break() {
                return Ok(());
            }
            discarding = true;
            filled = 0;
        }

        let read = tokio::select! {
            _ = wait_for_shutdown(shutdown) => return Ok(()),
            read = stream.read(&mut buf[filled..]) => read?,
        };
        if read == 0 {
            if filled > 0 && !discarding {
                // The session ends whether or not the last line asked to exit.
                let _ = answer(&mut stream, respond(manager, &buf[..filled])).await?;
            }
            return Ok(());
        }
        filled += read;

        let mut start = 0;
        if discarding {
            match buf[..filled].iter().position(|&b| b == b'\n') {
                Some(offset) => {
                    start = offset + 1;
                    discarding = false;
                },
                None => {
                    filled = 0;
                    continue;
                },
            }
        }
        while let Some(offset) = buf[start..filled].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            if answer(&mut stream, respond(manager, &buf[start..end]))
                .await?
                .is_break()
            {
                return Ok(());
            }
            start = end + 1;
        }
        buf.copy_within(start..filled, 0);
        filled -= start;
    }
}

async fn answer<S>(stream: &mut S, response: Response) -> io::Result<ControlFlow<()>>
where
    S: AsyncWrite + Unpin,
{
    debug!(?response, "tcp request");
    match response.render_with(LINE_TERMINATOR) {
        Some(reply) => {
            stream.write_all(reply.as_bytes()).await?;
            Ok(ControlFlow::Continue(()))
        },
        None => Ok(ControlFlow::Break(())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::hash_bytes;
    use tokio::io::duplex;

    async fn session(input: &[u8], buffer_size: usize) -> String {
        let manager: CacheManager = CacheManager::new();
        session_with(&manager, input, buffer_size).await
    }

    async fn session_with(manager: &CacheManager, input: &[u8], buffer_size: usize) -> String {
        let (client, server) = duplex(4096);
        let (_tx, mut rx) = watch::channel(false);

        let (mut client_read, mut client_write) = tokio::io::split(client);
        client_write.write_all(input).await.unwrap();
        client_write.shutdown().await.unwrap();

        let mut buf = vec![0u8; buffer_size];
        handle_connection(server, manager, &mut buf, &mut rx)
            .await
            .unwrap();

        let mut out = String::new();
        client_read.read_to_string(&mut out).await.unwrap();
        out
    }

    #[tokio::test]
    async fn greeting_then_replies() {
        let out = session(b"CREATE demo 2\r\nGET demo a\r\nQUIT\r\n", 64).await;
        assert_eq!(
            out,
            "Connected to lru cachemanager\r\nOK\r\nERR key not found\r\n"
        );
    }

    #[tokio::test]
    async fn several_lines_in_one_read() {
        let out = session(b"CREATE demo 2\nSET demo a 1\nGET demo a\n", 256).await;
        assert_eq!(out, "Connected to lru cachemanager\r\nOK\r\nOK\r\n1\r\n");
    }

    #[tokio::test]
    async fn trailing_bytes_processed_at_eof() {
        let out = session(b"LIST", 64).await;
        assert_eq!(out, "Connected to lru cachemanager\r\nNo caches\r\n");
    }

    #[tokio::test]
    async fn overlong_line_is_rejected_whole() {
        let manager: CacheManager = CacheManager::new();
        manager.create_cache("demo", hash_bytes(b"demo"), 4);
        manager.create_cache("other", hash_bytes(b"other"), 4);

        let out = session_with(
            &manager,
            b"SET demo k aaaaaaaaaaaaaaaaaaaaa DESTROY other\nGET demo k\n",
            32,
        )
        .await;

        assert_eq!(
            out,
            "Connected to lru cachemanager\r\nERR line too long\r\nERR key not found\r\n"
        );
        assert_eq!(out.matches("ERR line too long").count(), 1);
        assert!(manager.contains(hash_bytes(b"other")));
        assert!(manager.get_cache(hash_bytes(b"demo")).unwrap().is_empty());
    }

    #[tokio::test]
    async fn overlong_tail_at_eof_is_dropped() {
        let out = session(b"LIST LIST LIST LIST", 17).await;
        assert_eq!(out, "Connected to lru cachemanager\r\nERR line too long\r\n");
    }

    #[tokio::test]
    async fn line_filling_buffer_exactly_with_newline_is_served() {
        // 16 bytes plus the newline fills a 17-byte buffer.
        let out = session(b"CREATE demo 1234\nLIST\n", 17).await;
        assert_eq!(out, "Connected to lru cachemanager\r\nOK\r\ndemo\r\n");
    }

    #[test]
    fn settings_reject_zero_limits() {
        let no_buffer = ServerSettings {
            buffer_size: 0,
            ..ServerSettings::default()
        };
        assert!(no_buffer.validate().is_err());

        let no_connections = ServerSettings {
            max_connections: 0,
            ..ServerSettings::default()
        };
        assert_eq!(
            no_connections.validate().unwrap_err().message(),
            "max connections must be at least 1"
        );
        assert!(ServerSettings::default().validate().is_ok());
    }

    #[tokio::test]
    async fn bind_rejects_zero_buffer() {
        let settings = ServerSettings {
            buffer_size: 0,
            ..ServerSettings::default()
        };
        let err = TcpFrontEnd::bind("127.0.0.1:0", settings).await.unwrap_err();
        assert!(matches!(err, ServeError::Settings(_)));
    }

    #[tokio::test]
    async fn shutdown_ends_idle_session() {
        let manager: CacheManager = CacheManager::new();
        let (_client, server) = duplex(1024);
        let (tx, mut rx) = watch::channel(false);
        let mut buf = vec![0u8; 64];

        let task = async { handle_connection(server, &manager, &mut buf, &mut rx).await };
        let trigger = async {
            tokio::task::yield_now().await;
            tx.send(true).unwrap();
        };
        let (result, ()) = tokio::join!(task, trigger);
        result.unwrap();
    }
}
