//! Worker-pool TCP server.
//!
//! A fixed number of worker threads each run an independent blocking accept
//! loop against one shared listener — competing consumers, with the OS
//! distributing incoming connections across whichever worker calls `accept`
//! next. Per-connection failures are logged and contained; a worker never
//! exits because one connection went bad.

use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use tracing::{info, warn};

use farcall_common::protocol::error::{FarcallError, Result};
use farcall_common::transport::frame::DEFAULT_MAX_FRAME_LEN;

use crate::dispatch;
use crate::registry::Registry;

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_BACKLOG: i32 = 64;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Server configuration.
///
/// `bind_addr` accepts anything resolvable, e.g. `"127.0.0.1:0"` for an
/// OS-assigned port (the bound address is available on the returned handle).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the listener to
    pub bind_addr: String,
    /// Number of accept workers
    pub workers: usize,
    /// Listen backlog handed to the OS
    pub backlog: i32,
    /// Per-connection read/write deadline
    pub timeout: Duration,
    /// Cap on accepted frame lengths
    pub max_frame_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            workers: DEFAULT_WORKERS,
            backlog: DEFAULT_BACKLOG,
            timeout: DEFAULT_TIMEOUT,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

/// A configured server, ready to serve its registry.
pub struct Server {
    registry: Arc<Registry>,
    config: ServerConfig,
}

impl Server {
    /// Takes the registry by value: registration is over once serving starts,
    /// which is what lets workers read it without synchronization.
    pub fn new(registry: Registry, config: ServerConfig) -> Self {
        Server {
            registry: Arc::new(registry),
            config,
        }
    }

    /// Binds the listener and starts the worker pool.
    ///
    /// Returns once all workers are running; the returned [`ServerHandle`]
    /// carries the bound address and the shutdown hook.
    pub fn serve(self) -> Result<ServerHandle> {
        let listener = bind_listener(&self.config)?;
        let addr = listener
            .local_addr()
            .map_err(|e| FarcallError::Connection(format!("failed to get local addr: {}", e)))?;
        info!(%addr, workers = self.config.workers, "listening");

        let shutdown = Arc::new(AtomicBool::new(false));
        let mut workers = Vec::with_capacity(self.config.workers);
        for worker_id in 0..self.config.workers {
            let listener = listener.try_clone().map_err(|e| {
                FarcallError::Connection(format!("failed to clone listener: {}", e))
            })?;
            let registry = Arc::clone(&self.registry);
            let shutdown = Arc::clone(&shutdown);
            let config = self.config.clone();
            let worker = thread::Builder::new()
                .name(format!("farcall-worker-{}", worker_id))
                .spawn(move || accept_loop(worker_id, &listener, &registry, &shutdown, &config))
                .map_err(|e| {
                    FarcallError::Connection(format!("failed to spawn worker: {}", e))
                })?;
            workers.push(worker);
        }

        Ok(ServerHandle {
            addr,
            shutdown,
            workers,
        })
    }
}

/// Builds the shared listener with `SO_REUSEADDR` and the configured backlog.
///
/// std's `TcpListener::bind` exposes neither knob, hence socket2.
fn bind_listener(config: &ServerConfig) -> Result<TcpListener> {
    let addr: SocketAddr = config
        .bind_addr
        .to_socket_addrs()
        .map_err(|e| {
            FarcallError::Connection(format!("invalid address '{}': {}", config.bind_addr, e))
        })?
        .next()
        .ok_or_else(|| {
            FarcallError::Connection(format!("{} resolved to no addresses", config.bind_addr))
        })?;

    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
        .map_err(|e| FarcallError::Connection(format!("failed to create socket: {}", e)))?;
    socket
        .set_reuse_address(true)
        .map_err(|e| FarcallError::Connection(format!("failed to set SO_REUSEADDR: {}", e)))?;
    socket
        .bind(&addr.into())
        .map_err(|e| {
            FarcallError::Connection(format!("failed to bind to {}: {}", config.bind_addr, e))
        })?;
    socket
        .listen(config.backlog)
        .map_err(|e| FarcallError::Connection(format!("failed to listen: {}", e)))?;

    Ok(socket.into())
}

/// One worker: accept, serve one exchange, close, repeat until shutdown.
fn accept_loop(
    worker_id: usize,
    listener: &TcpListener,
    registry: &Registry,
    shutdown: &AtomicBool,
    config: &ServerConfig,
) {
    while !shutdown.load(Ordering::SeqCst) {
        let (mut stream, peer) = match listener.accept() {
            Ok(conn) => conn,
            Err(e) => {
                if shutdown.load(Ordering::SeqCst) {
                    break;
                }
                warn!(worker = worker_id, "accept failed: {}", e);
                continue;
            }
        };
        // A shutdown poke is accepted like any other connection; it is
        // dropped unanswered once the flag is observed.
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        info!(worker = worker_id, %peer, "connection accepted");
        if let Err(e) = serve_connection(&mut stream, registry, config) {
            match e {
                FarcallError::Timeout(_) => {
                    warn!(worker = worker_id, %peer, "connection timed out: {}", e);
                }
                _ => warn!(worker = worker_id, %peer, "connection failed: {}", e),
            }
        }
        let _ = stream.shutdown(Shutdown::Both);
    }
    info!(worker = worker_id, "worker stopped");
}

fn serve_connection(
    stream: &mut TcpStream,
    registry: &Registry,
    config: &ServerConfig,
) -> Result<()> {
    stream
        .set_read_timeout(Some(config.timeout))
        .map_err(|e| FarcallError::Connection(format!("failed to set read timeout: {}", e)))?;
    stream
        .set_write_timeout(Some(config.timeout))
        .map_err(|e| FarcallError::Connection(format!("failed to set write timeout: {}", e)))?;

    dispatch::handle_connection(stream, registry, config.max_frame_len)
}

/// Handle to a running server.
///
/// Dropping the handle does not stop the workers; call [`shutdown`] for an
/// orderly stop or [`wait`] to serve until the process exits.
///
/// [`shutdown`]: ServerHandle::shutdown
/// [`wait`]: ServerHandle::wait
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
}

impl ServerHandle {
    /// The address the listener actually bound.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Blocks until all workers exit. Without a concurrent [`shutdown`]
    /// trigger that is forever.
    ///
    /// [`shutdown`]: ServerHandle::shutdown
    pub fn wait(self) {
        for worker in self.workers {
            let _ = worker.join();
        }
    }

    /// Stops the pool: raises the shutdown flag, unblocks every worker
    /// parked in `accept` with a short-lived local connection, and joins
    /// them. Pending accepts never observe a request.
    pub fn shutdown(self) {
        self.shutdown.store(true, Ordering::SeqCst);

        let wake_addr = wake_addr(self.addr);
        for _ in 0..self.workers.len() {
            if let Ok(stream) = TcpStream::connect_timeout(&wake_addr, Duration::from_secs(1)) {
                let _ = stream.shutdown(Shutdown::Both);
            }
        }

        for worker in self.workers {
            let _ = worker.join();
        }
        info!(addr = %self.addr, "server stopped");
    }
}

/// Address a poke connection can actually reach: the wildcard address is not
/// connectable, so it maps to loopback of the same family.
fn wake_addr(addr: SocketAddr) -> SocketAddr {
    if addr.ip().is_unspecified() {
        let loopback = match addr {
            SocketAddr::V4(_) => std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
            SocketAddr::V6(_) => std::net::IpAddr::V6(std::net::Ipv6Addr::LOCALHOST),
        };
        SocketAddr::new(loopback, addr.port())
    } else {
        addr
    }
}
