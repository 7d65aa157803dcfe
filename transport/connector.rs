// Connection establishment: walk the candidates with bounded non-blocking connects
use crate::platform;
use crate::resolver::CandidateAddress;
use nix::errno::Errno;
use nutsock_core::{Result, Timeout, TransportError};
use std::io;
use std::os::fd::{AsFd, OwnedFd};
use std::thread;
use std::time::Duration;

// Pause before reissuing a connect the kernel refused with EAGAIN
const RETRY_BACKOFF: Duration = Duration::from_millis(10);

// Why a single candidate was abandoned
#[derive(Debug)]
enum AttemptFailure {
    Refused(Errno),
    TimedOut,
}

/// Connect to the first candidate that accepts, trying them in order.
///
/// `timeout` bounds each candidate's wait separately, so the worst case is
/// roughly `timeout * candidates.len()`. Callers that need one overall budget
/// have to enforce it themselves.
pub fn connect(candidates: &[CandidateAddress], timeout: Timeout) -> Result<OwnedFd> {
    for candidate in candidates {
        let fd = match platform::create(&candidate.addr) {
            Ok(fd) => fd,
            Err(Errno::EAFNOSUPPORT | Errno::EINVAL) => {
                tracing::debug!(addr = %candidate.addr, "address family not supported, skipping");
                continue;
            }
            Err(e) => {
                return Err(TransportError::system_with(
                    "cannot create socket",
                    io::Error::from(e),
                ))
            }
        };

        match attempt(&fd, candidate, timeout) {
            Ok(()) => {
                tracing::debug!(addr = %candidate.addr, "connected");
                return Ok(fd);
            }
            Err(AttemptFailure::Refused(e)) => {
                tracing::debug!(addr = %candidate.addr, error = %e, "connect attempt failed");
                platform::close(fd);
            }
            Err(AttemptFailure::TimedOut) => {
                tracing::debug!(addr = %candidate.addr, %timeout, "connect attempt timed out");
                platform::close(fd);
            }
        }
    }

    Err(TransportError::ConnectionFailed {
        attempts: candidates.len(),
    })
}

fn attempt(
    fd: &OwnedFd,
    candidate: &CandidateAddress,
    timeout: Timeout,
) -> std::result::Result<(), AttemptFailure> {
    let nonblocking = timeout.is_finite();
    if nonblocking {
        platform::set_nonblocking(fd.as_fd(), true).map_err(AttemptFailure::Refused)?;
    }

    loop {
        match platform::connect(fd.as_fd(), &candidate.addr) {
            Ok(()) | Err(Errno::EISCONN) => break,
            Err(Errno::EINPROGRESS | Errno::EALREADY) => {
                match platform::wait_writable(fd.as_fd(), timeout.duration()) {
                    Ok(true) => match platform::pending_error(fd.as_fd()) {
                        Ok(None) => break,
                        Ok(Some(e)) | Err(e) => return Err(AttemptFailure::Refused(e)),
                    },
                    Ok(false) => return Err(AttemptFailure::TimedOut),
                    Err(e) => return Err(AttemptFailure::Refused(e)),
                }
            }
            Err(Errno::EINTR) => continue,
            Err(Errno::EAGAIN) => thread::sleep(RETRY_BACKOFF),
            Err(e) => return Err(AttemptFailure::Refused(e)),
        }
    }

    if nonblocking {
        platform::set_nonblocking(fd.as_fd(), false).map_err(AttemptFailure::Refused)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{SocketAddr, TcpListener};
    use std::os::fd::AsRawFd;
    use std::time::{Duration, Instant};

    fn closed_port() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    }

    #[test]
    fn no_candidates_fails() {
        assert!(matches!(
            connect(&[], Timeout::Infinite),
            Err(TransportError::ConnectionFailed { attempts: 0 })
        ));
    }

    #[test]
    fn connects_with_finite_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let candidates = [CandidateAddress::from(listener.local_addr().unwrap())];
        let fd = connect(&candidates, Timeout::from_secs(5)).unwrap();
        assert!(listener.accept().is_ok());
        drop(fd);
    }

    #[test]
    fn connects_blocking() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let candidates = [CandidateAddress::from(listener.local_addr().unwrap())];
        assert!(connect(&candidates, Timeout::Infinite).is_ok());
    }

    #[test]
    fn skips_refused_candidates() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let candidates = [
            CandidateAddress::from(closed_port()),
            CandidateAddress::from(listener.local_addr().unwrap()),
        ];
        assert!(connect(&candidates, Timeout::from_secs(5)).is_ok());
    }

    #[test]
    fn all_refused() {
        let candidates = [
            CandidateAddress::from(closed_port()),
            CandidateAddress::from(closed_port()),
        ];
        match connect(&candidates, Timeout::from_secs(5)) {
            Err(TransportError::ConnectionFailed { attempts }) => assert_eq!(attempts, 2),
            other => panic!("expected ConnectionFailed, got {:?}", other),
        }
    }

    #[test]
    fn unanswered_connect_is_bounded() {
        // Shrink the backlog so the kernel stops answering SYNs once the
        // accept queue is full; nothing is ever accepted here.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        // SAFETY: re-listening on a live socket only changes its backlog
        assert_eq!(unsafe { libc::listen(listener.as_raw_fd(), 0) }, 0);
        let candidates = [CandidateAddress::from(listener.local_addr().unwrap())];

        let mut held = Vec::new();
        for _ in 0..16 {
            let start = Instant::now();
            let result = connect(&candidates, Timeout::from_millis(200));
            assert!(start.elapsed() < Duration::from_secs(3));
            match result {
                Ok(fd) => held.push(fd),
                Err(TransportError::ConnectionFailed { attempts }) => {
                    assert_eq!(attempts, 1);
                    return;
                }
                Err(other) => panic!("expected ConnectionFailed, got {:?}", other),
            }
        }
    }
}
