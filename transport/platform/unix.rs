// Unix socket primitives on top of nix: create, blocking toggle, readiness waits, close
use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::sys::socket::{
    self, sockopt, AddressFamily, MsgFlags, SockFlag, SockProtocol, SockType, SockaddrIn,
    SockaddrIn6,
};
use std::io;
use std::net::SocketAddr;
use std::os::fd::{AsRawFd, BorrowedFd, IntoRawFd, OwnedFd};
use std::time::{Duration, Instant};

// A dead peer must surface as EPIPE, not kill the process
#[cfg(any(target_os = "linux", target_os = "android"))]
const SEND_FLAGS: MsgFlags = MsgFlags::MSG_NOSIGNAL;
#[cfg(not(any(target_os = "linux", target_os = "android")))]
const SEND_FLAGS: MsgFlags = MsgFlags::empty();

/// Process-wide network stack setup. Nothing to do on unix.
pub fn startup() -> io::Result<()> {
    Ok(())
}

pub fn cleanup() {}

/// Create a TCP stream socket matching the address family of `addr`.
pub fn create(addr: &SocketAddr) -> nix::Result<OwnedFd> {
    let family = match addr {
        SocketAddr::V4(_) => AddressFamily::Inet,
        SocketAddr::V6(_) => AddressFamily::Inet6,
    };
    socket::socket(family, SockType::Stream, SockFlag::empty(), SockProtocol::Tcp)
}

pub fn set_nonblocking(fd: BorrowedFd<'_>, nonblocking: bool) -> nix::Result<()> {
    let raw = fd.as_raw_fd();
    let mut flags = OFlag::from_bits_truncate(fcntl(raw, FcntlArg::F_GETFL)?);
    flags.set(OFlag::O_NONBLOCK, nonblocking);
    fcntl(raw, FcntlArg::F_SETFL(flags)).map(drop)
}

pub fn connect(fd: BorrowedFd<'_>, addr: &SocketAddr) -> nix::Result<()> {
    match addr {
        SocketAddr::V4(v4) => socket::connect(fd.as_raw_fd(), &SockaddrIn::from(*v4)),
        SocketAddr::V6(v6) => socket::connect(fd.as_raw_fd(), &SockaddrIn6::from(*v6)),
    }
}

/// Outcome of an asynchronous connect (SO_ERROR); `None` means it succeeded.
pub fn pending_error(fd: BorrowedFd<'_>) -> nix::Result<Option<Errno>> {
    let code = socket::getsockopt(&fd, sockopt::SocketError)?;
    Ok((code != 0).then(|| Errno::from_raw(code)))
}

/// Block until `fd` is readable, or `timeout` elapses (`Ok(false)`).
pub fn wait_readable(fd: BorrowedFd<'_>, timeout: Option<Duration>) -> nix::Result<bool> {
    wait(fd, PollFlags::POLLIN, timeout)
}

/// Block until `fd` is writable, or `timeout` elapses (`Ok(false)`).
pub fn wait_writable(fd: BorrowedFd<'_>, timeout: Option<Duration>) -> nix::Result<bool> {
    wait(fd, PollFlags::POLLOUT, timeout)
}

pub fn recv(fd: BorrowedFd<'_>, buf: &mut [u8]) -> nix::Result<usize> {
    socket::recv(fd.as_raw_fd(), buf, MsgFlags::empty())
}

pub fn send(fd: BorrowedFd<'_>, buf: &[u8]) -> nix::Result<usize> {
    socket::send(fd.as_raw_fd(), buf, SEND_FLAGS)
}

pub fn close(fd: OwnedFd) {
    let raw = fd.into_raw_fd();
    if let Err(e) = nix::unistd::close(raw) {
        tracing::debug!(fd = raw, error = %e, "close failed");
    }
}

// Interrupted polls resume with whatever time is left
fn wait(fd: BorrowedFd<'_>, events: PollFlags, timeout: Option<Duration>) -> nix::Result<bool> {
    let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
    loop {
        let mut fds = [PollFd::new(fd, events)];
        let limit = match deadline {
            Some(deadline) => remaining(deadline),
            None if timeout.is_some() => PollTimeout::MAX,
            None => PollTimeout::NONE,
        };
        match poll(&mut fds, limit) {
            Ok(0) => return Ok(false),
            Ok(_) => return Ok(true),
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(e),
        }
    }
}

fn remaining(deadline: Instant) -> PollTimeout {
    let left = deadline.saturating_duration_since(Instant::now());
    // Round up so a sub-millisecond remainder still waits
    let millis = left.as_nanos().div_ceil(1_000_000).min(i32::MAX as u128) as i32;
    PollTimeout::try_from(millis).unwrap_or(PollTimeout::MAX)
}
