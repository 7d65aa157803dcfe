// Transport abstraction - lets the protocol client run over pluggable stream backends
use nutsock_core::{IoOp, Result, Timeout, TransportError, LINE_TERMINATOR};
use std::io;

/// Line-oriented, timeout-bounded byte stream to a remote service.
///
/// One instance owns at most one connection. Methods take `&mut self`; callers
/// that share an instance between threads must serialise access themselves.
pub trait Transport: Send {
    /// Resolve `host` and connect, replacing any existing connection.
    fn connect(&mut self, host: &str, port: u16) -> Result<()>;

    /// Drop the connection and any buffered input. Safe to call repeatedly.
    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    /// Applies to each subsequent connect wait, read and write.
    fn set_timeout(&mut self, timeout: Timeout);

    fn timeout(&self) -> Timeout;

    /// One raw read; `Ok(0)` means the peer closed the stream.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// One raw write; may accept fewer bytes than offered.
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// Next '\n'-terminated message, terminator stripped.
    fn read_line(&mut self) -> Result<String>;

    /// Send `line` followed by a single '\n', retrying partial writes.
    ///
    /// A zero-byte write disconnects. So does a timeout once part of the
    /// line is on the wire, since the stream no longer ends on a line boundary.
    fn write_line(&mut self, line: &str) -> Result<()> {
        let mut data = Vec::with_capacity(line.len() + 1);
        data.extend_from_slice(line.as_bytes());
        data.push(LINE_TERMINATOR);

        let mut sent = 0;
        while sent < data.len() {
            let n = match self.write(&data[sent..]) {
                Ok(n) => n,
                Err(e) => {
                    if sent > 0 && e.is_timeout() {
                        self.disconnect();
                    }
                    return Err(e);
                }
            };
            if n == 0 {
                self.disconnect();
                return Err(TransportError::io(
                    IoOp::Write,
                    io::Error::new(io::ErrorKind::WriteZero, "writing line failed"),
                ));
            }
            sent += n;
        }
        Ok(())
    }
}
