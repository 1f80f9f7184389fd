use std::io::ErrorKind;
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::protocol::error::{FarcallError, Result};
use crate::transport::frame::{read_frame, write_frame, DEFAULT_MAX_FRAME_LEN};

/// Default per-connection deadline for connect, read and write operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking TCP transport for one-shot RPC exchanges.
///
/// Every exchange is a full connect/send/receive/close cycle on a fresh
/// connection; there is no pooling or reuse. Streams come back with read and
/// write deadlines already applied.
///
/// # Example
///
/// ```no_run
/// use farcall_common::transport::TcpTransport;
///
/// let transport = TcpTransport::new();
/// let reply = transport.round_trip("127.0.0.1:4444", b"INTROSPECT")?;
/// # Ok::<(), farcall_common::FarcallError>(())
/// ```
#[derive(Debug, Clone)]
pub struct TcpTransport {
    timeout: Duration,
    max_frame_len: usize,
}

impl TcpTransport {
    pub fn new() -> Self {
        TcpTransport {
            timeout: DEFAULT_TIMEOUT,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }

    /// Sets the connect/read/write deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the cap on accepted frame lengths.
    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    /// Connects to a remote endpoint.
    ///
    /// The address may resolve to several socket addresses; each is tried in
    /// turn until one succeeds. The returned stream has read and write
    /// timeouts applied.
    ///
    /// # Errors
    ///
    /// An outright refusal surfaces immediately as
    /// [`FarcallError::ConnectionRefused`] — the call is never allowed to
    /// proceed to a send/receive on a dead socket.
    pub fn connect(&self, addr: &str) -> Result<TcpStream> {
        let socket_addrs = addr
            .to_socket_addrs()
            .map_err(|e| FarcallError::Connection(format!("invalid address '{}': {}", addr, e)))?;

        let mut last_err = None;
        for socket_addr in socket_addrs {
            match TcpStream::connect_timeout(&socket_addr, self.timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(self.timeout)).map_err(|e| {
                        FarcallError::Connection(format!("failed to set read timeout: {}", e))
                    })?;
                    stream.set_write_timeout(Some(self.timeout)).map_err(|e| {
                        FarcallError::Connection(format!("failed to set write timeout: {}", e))
                    })?;
                    return Ok(stream);
                }
                Err(e) => {
                    last_err = Some(e);
                }
            }
        }

        Err(match last_err {
            Some(e) if e.kind() == ErrorKind::ConnectionRefused => {
                FarcallError::ConnectionRefused(addr.to_string())
            }
            Some(e) => FarcallError::Connection(format!("failed to connect to {}: {}", addr, e)),
            None => FarcallError::Connection(format!("{} resolved to no addresses", addr)),
        })
    }

    /// Sends one length-prefixed frame.
    pub fn send(&self, stream: &mut TcpStream, payload: &[u8]) -> Result<()> {
        write_frame(stream, payload)
    }

    /// Receives one length-prefixed frame.
    pub fn receive(&self, stream: &mut TcpStream) -> Result<Vec<u8>> {
        read_frame(stream, self.max_frame_len)
    }

    /// Runs one full exchange: connect, send `payload`, receive the reply,
    /// shut the connection down.
    pub fn round_trip(&self, addr: &str, payload: &[u8]) -> Result<Vec<u8>> {
        let mut stream = self.connect(addr)?;
        self.send(&mut stream, payload)?;
        let reply = self.receive(&mut stream)?;
        let _ = stream.shutdown(Shutdown::Both);
        Ok(reply)
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new()
    }
}
