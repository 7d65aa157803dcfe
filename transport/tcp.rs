// TCP transport implementation: owns one connection, its timeout and its line buffer
use crate::connector;
use crate::netstack::NetStackGuard;
use crate::platform;
use crate::resolver;
use crate::timeout_io;
use crate::traits::Transport;
use nix::errno::Errno;
use nutsock_core::{ConnectionState, IoOp, LineBuffer, Result, Timeout, TransportError};
use std::io;
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};

/// Default transport over a blocking TCP socket.
///
/// The descriptor is released on `disconnect`, on any I/O failure and on
/// drop, and the line buffer is cleared every time that happens.
#[derive(Debug)]
pub struct SocketTransport {
    handle: Option<OwnedFd>,
    timeout: Timeout,
    buffer: LineBuffer,
    state: ConnectionState,
    // Taken on first connect, held until the transport is dropped
    net_stack: Option<NetStackGuard>,
}

impl SocketTransport {
    pub fn new() -> Self {
        SocketTransport {
            handle: None,
            timeout: Timeout::Infinite,
            buffer: LineBuffer::new(),
            state: ConnectionState::Disconnected,
            net_stack: None,
        }
    }

    pub fn with_timeout(timeout: Timeout) -> Self {
        let mut transport = Self::new();
        transport.timeout = timeout;
        transport
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    fn establish(&mut self, host: &str, port: u16) -> Result<OwnedFd> {
        if self.net_stack.is_none() {
            self.net_stack = Some(NetStackGuard::acquire()?);
        }
        let candidates = resolver::resolve(host, port)?;
        connector::connect(&candidates, self.timeout)
    }

    // Gate on readiness, run one syscall, and drop the connection on any
    // failure other than a timeout.
    fn transfer<F>(&mut self, op: IoOp, mut syscall: F) -> Result<usize>
    where
        F: FnMut(BorrowedFd<'_>) -> nix::Result<usize>,
    {
        let fd = match self.handle.as_ref() {
            Some(handle) => handle.as_fd(),
            None => return Err(TransportError::NotConnected),
        };

        let outcome = timeout_io::await_ready(fd, op, self.timeout).and_then(|()| loop {
            match syscall(fd) {
                Ok(n) => break Ok(n),
                Err(Errno::EINTR) => continue,
                Err(e) => break Err(TransportError::io(op, io::Error::from(e))),
            }
        });

        match outcome {
            Err(e) if !e.is_timeout() => {
                tracing::warn!(%op, error = %e, "dropping connection");
                self.disconnect();
                Err(e)
            }
            other => other,
        }
    }
}

impl Default for SocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for SocketTransport {
    fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        self.disconnect();
        if host.is_empty() {
            return Err(TransportError::UnknownHost {
                host: String::new(),
            });
        }

        self.state = ConnectionState::Connecting;
        match self.establish(host, port) {
            Ok(fd) => {
                self.handle = Some(fd);
                self.state = ConnectionState::Connected;
                tracing::debug!(host, port, timeout = %self.timeout, "transport connected");
                Ok(())
            }
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                tracing::warn!(host, port, error = %e, "connect failed");
                Err(e)
            }
        }
    }

    fn disconnect(&mut self) {
        if let Some(fd) = self.handle.take() {
            tracing::debug!("transport disconnected");
            platform::close(fd);
        }
        self.buffer.clear();
        self.state = ConnectionState::Disconnected;
    }

    fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    fn set_timeout(&mut self, timeout: Timeout) {
        self.timeout = timeout;
    }

    fn timeout(&self) -> Timeout {
        self.timeout
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.transfer(IoOp::Read, |fd| platform::recv(fd, buf))
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.transfer(IoOp::Write, |fd| platform::send(fd, buf))
    }

    fn read_line(&mut self) -> Result<String> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }

        // The buffer is moved out so the refill closure can borrow `self`
        let mut pending = std::mem::take(&mut self.buffer);
        let result = pending.read_line_with(|chunk| self.read(chunk));
        if self.is_connected() {
            self.buffer = pending;
        }

        if let Err(TransportError::UnexpectedClose) = result {
            tracing::warn!("peer closed connection mid-line");
            self.disconnect();
        }
        result
    }
}

impl Drop for SocketTransport {
    fn drop(&mut self) {
        self.disconnect();
    }
}
