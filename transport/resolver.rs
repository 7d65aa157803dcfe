// Address resolution: host/port -> ordered candidate addresses via getaddrinfo
use nutsock_core::{Result, TransportError};
use std::ffi::{CStr, CString};
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};
use std::ptr;
use std::thread;
use std::time::Duration;

// Pause between attempts while the resolver reports a temporary failure
const RETRY_BACKOFF: Duration = Duration::from_millis(50);

/// One concrete address to try, in resolver order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateAddress {
    pub addr: SocketAddr,
}

impl CandidateAddress {
    pub fn is_ipv6(&self) -> bool {
        self.addr.is_ipv6()
    }
}

impl From<SocketAddr> for CandidateAddress {
    fn from(addr: SocketAddr) -> Self {
        CandidateAddress { addr }
    }
}

// Owns a getaddrinfo result list
struct AddrInfoList(*mut libc::addrinfo);

impl AddrInfoList {
    fn iter(&self) -> impl Iterator<Item = &libc::addrinfo> {
        let mut cursor = self.0;
        std::iter::from_fn(move || {
            // SAFETY: nodes stay valid until the list is freed in Drop
            let node = unsafe { cursor.as_ref()? };
            cursor = node.ai_next;
            Some(node)
        })
    }
}

impl Drop for AddrInfoList {
    fn drop(&mut self) {
        if !self.0.is_null() {
            // SAFETY: pointer came from a successful getaddrinfo call
            unsafe { libc::freeaddrinfo(self.0) };
        }
    }
}

/// Resolve `host` into stream candidates for every address family it has.
pub fn resolve(host: &str, port: u16) -> Result<Vec<CandidateAddress>> {
    let unknown = || TransportError::UnknownHost {
        host: host.to_string(),
    };
    if host.is_empty() {
        return Err(unknown());
    }
    let c_host = CString::new(host).map_err(|_| unknown())?;
    let c_port = CString::new(port.to_string()).map_err(|_| unknown())?;

    // SAFETY: all-zero is the documented "no preference" addrinfo
    let mut hints: libc::addrinfo = unsafe { std::mem::zeroed() };
    hints.ai_family = libc::AF_UNSPEC;
    hints.ai_socktype = libc::SOCK_STREAM;
    hints.ai_protocol = libc::IPPROTO_TCP;

    let list = loop {
        let mut res: *mut libc::addrinfo = ptr::null_mut();
        // SAFETY: inputs are valid C strings and hints outlives the call
        let rc = unsafe { libc::getaddrinfo(c_host.as_ptr(), c_port.as_ptr(), &hints, &mut res) };
        match rc {
            0 => break AddrInfoList(res),
            libc::EAI_AGAIN => {
                tracing::debug!(host, "temporary resolver failure, retrying");
                thread::sleep(RETRY_BACKOFF);
            }
            libc::EAI_NONAME => return Err(unknown()),
            libc::EAI_SYSTEM => {
                return Err(TransportError::system_with(
                    "name resolution failed",
                    io::Error::last_os_error(),
                ))
            }
            libc::EAI_MEMORY => return Err(TransportError::system("out of memory")),
            other => return Err(TransportError::system(gai_message(other))),
        }
    };

    let candidates: Vec<CandidateAddress> = list
        .iter()
        .filter_map(|ai| {
            let addr = socket_addr(ai);
            if addr.is_none() {
                tracing::trace!(family = ai.ai_family, "skipping unsupported address family");
            }
            addr
        })
        .map(CandidateAddress::from)
        .collect();

    tracing::debug!(host, port, count = candidates.len(), "resolved");
    Ok(candidates)
}

fn socket_addr(ai: &libc::addrinfo) -> Option<SocketAddr> {
    if ai.ai_addr.is_null() {
        return None;
    }
    match ai.ai_family {
        libc::AF_INET => {
            // SAFETY: ai_family says ai_addr points at a sockaddr_in
            let sin = unsafe { &*(ai.ai_addr as *const libc::sockaddr_in) };
            let ip = Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr));
            Some(SocketAddr::V4(SocketAddrV4::new(ip, u16::from_be(sin.sin_port))))
        }
        libc::AF_INET6 => {
            // SAFETY: ai_family says ai_addr points at a sockaddr_in6
            let sin6 = unsafe { &*(ai.ai_addr as *const libc::sockaddr_in6) };
            Some(SocketAddr::V6(SocketAddrV6::new(
                Ipv6Addr::from(sin6.sin6_addr.s6_addr),
                u16::from_be(sin6.sin6_port),
                sin6.sin6_flowinfo,
                sin6.sin6_scope_id,
            )))
        }
        _ => None,
    }
}

fn gai_message(code: i32) -> String {
    // SAFETY: gai_strerror returns a static NUL-terminated string
    let msg = unsafe { CStr::from_ptr(libc::gai_strerror(code)) };
    format!("name resolution failed: {}", msg.to_string_lossy())
}
