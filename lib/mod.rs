// lib: nutsock facade for protocol clients
// Re-exports the core types and the transport layer, and adds environment driven configuration

// Re-export core types, errors and line framing
pub use nutsock_core::*;

// Re-export transport abstractions
pub use nutsock_transport::*;

pub mod config;

pub use config::TransportConfig;

use once_cell::sync::Lazy;

// Process-wide configuration - read from the environment once, on first use
static DEFAULT_CONFIG: Lazy<TransportConfig> = Lazy::new(TransportConfig::from_env);

/// Configuration taken from `NUTSOCK_*` environment variables at first access.
pub fn default_config() -> &'static TransportConfig {
    &DEFAULT_CONFIG
}

/// Create a transport with `default_factory`, apply the configured timeout and connect.
pub fn open(config: &TransportConfig) -> Result<Box<dyn Transport>> {
    open_with(default_factory, config)
}

/// Same as [`open`] with a caller-chosen transport implementation.
pub fn open_with(factory: TransportFactory, config: &TransportConfig) -> Result<Box<dyn Transport>> {
    let mut transport = factory();
    transport.set_timeout(config.timeout);
    transport.connect(&config.host, config.port)?;
    tracing::info!(host = %config.host, port = config.port, "connected");
    Ok(transport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn open_connects_and_applies_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let peer = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut writer = stream.try_clone().unwrap();
            let mut line = String::new();
            BufReader::new(stream).read_line(&mut line).unwrap();
            writer.write_all(line.to_uppercase().as_bytes()).unwrap();
        });

        let config = TransportConfig::default()
            .with_host("127.0.0.1")
            .with_port(port)
            .with_timeout(Timeout::from_secs(5));
        let mut transport = open(&config).unwrap();
        assert_eq!(transport.timeout(), Timeout::from_secs(5));
        transport.write_line("list ups").unwrap();
        assert_eq!(transport.read_line().unwrap(), "LIST UPS");
        peer.join().unwrap();
    }

    #[test]
    fn open_reports_unknown_host() {
        let config = TransportConfig::default().with_host("");
        assert!(matches!(open(&config), Err(TransportError::UnknownHost { .. })));
    }

    #[test]
    fn default_config_is_stable() {
        assert!(std::ptr::eq(default_config(), default_config()));
    }
}
