// Factory for the default transport
use crate::tcp::SocketTransport;
use crate::traits::Transport;

/// Constructor signature for anything that can hand out a transport.
pub type TransportFactory = fn() -> Box<dyn Transport>;

/// A fresh, disconnected TCP transport with an infinite timeout.
pub fn default_factory() -> Box<dyn Transport> {
    Box::new(SocketTransport::new())
}
