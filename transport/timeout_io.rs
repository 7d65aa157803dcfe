// Timeout gating: wait for readiness before a blocking read or write
use crate::platform;
use nutsock_core::{IoOp, Result, Timeout, TransportError};
use std::io;
use std::os::fd::BorrowedFd;

/// Wait until `fd` is ready for `op`, bounded by `timeout`.
///
/// With `Timeout::Infinite` this returns immediately and the I/O call itself
/// blocks. On expiry nothing is transferred and `Timeout` is returned.
pub fn await_ready(fd: BorrowedFd<'_>, op: IoOp, timeout: Timeout) -> Result<()> {
    let Some(limit) = timeout.duration() else {
        return Ok(());
    };

    let ready = match op {
        IoOp::Read => platform::wait_readable(fd, Some(limit)),
        IoOp::Write | IoOp::Connect => platform::wait_writable(fd, Some(limit)),
    };

    match ready {
        Ok(true) => Ok(()),
        Ok(false) => Err(TransportError::Timeout { op }),
        Err(e) => Err(TransportError::io(op, io::Error::from(e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::{TcpListener, TcpStream};
    use std::os::fd::AsFd;
    use std::time::{Duration, Instant};

    fn pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (server, _) = listener.accept().unwrap();
        (client, server)
    }

    #[test]
    fn infinite_skips_the_wait() {
        let (client, _server) = pair();
        // Nothing to read, but no wait happens
        assert!(await_ready(client.as_fd(), IoOp::Read, Timeout::Infinite).is_ok());
    }

    #[test]
    fn read_times_out_without_data() {
        let (client, _server) = pair();
        let start = Instant::now();
        let err = await_ready(client.as_fd(), IoOp::Read, Timeout::from_millis(50)).unwrap_err();
        assert!(matches!(err, TransportError::Timeout { op: IoOp::Read }));
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn ready_when_data_is_waiting() {
        let (client, mut server) = pair();
        server.write_all(b"OK\n").unwrap();
        assert!(await_ready(client.as_fd(), IoOp::Read, Timeout::from_secs(5)).is_ok());
        assert!(await_ready(client.as_fd(), IoOp::Write, Timeout::from_secs(5)).is_ok());
    }
}
