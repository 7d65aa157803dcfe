// Process-wide network stack lifetime, reference counted across transports
use crate::platform;
use nutsock_core::{Result, TransportError};
use std::sync::{Mutex, MutexGuard, PoisonError};

// Number of live guards; platform startup/cleanup run on the 0 <-> 1 edges
static USERS: Mutex<usize> = Mutex::new(0);

fn users() -> MutexGuard<'static, usize> {
    USERS.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Keeps the platform network stack initialised while alive.
#[derive(Debug)]
pub struct NetStackGuard {
    _private: (),
}

impl NetStackGuard {
    pub fn acquire() -> Result<Self> {
        let mut count = users();
        if *count == 0 {
            platform::startup()
                .map_err(|e| TransportError::system_with("network stack startup failed", e))?;
            tracing::debug!("network stack initialised");
        }
        *count += 1;
        Ok(NetStackGuard { _private: () })
    }
}

impl Drop for NetStackGuard {
    fn drop(&mut self) {
        let mut count = users();
        *count = count.saturating_sub(1);
        if *count == 0 {
            platform::cleanup();
            tracing::debug!("network stack released");
        }
    }
}

/// Guards currently alive in this process.
pub fn active_users() -> usize {
    *users()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Other tests in this binary may hold guards concurrently, so only
    // relative changes are checked.
    #[test]
    fn guards_are_counted() {
        let a = NetStackGuard::acquire().unwrap();
        let b = NetStackGuard::acquire().unwrap();
        assert!(active_users() >= 2);
        drop(a);
        assert!(active_users() >= 1);
        drop(b);
    }
}
