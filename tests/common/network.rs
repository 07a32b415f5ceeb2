//! Network testing utilities
//!
//! Port management helpers for integration tests.

use std::net::TcpListener;
use std::sync::atomic::{AtomicU16, Ordering};

/// Global port counter to avoid port conflicts in parallel tests
static PORT_COUNTER: AtomicU16 = AtomicU16::new(3100);

/// Network testing helpers
pub struct NetworkTestHelper;

impl NetworkTestHelper {
    /// Check that no live server is reachable on the port
    pub fn is_port_available(port: u16) -> bool {
        use port_scanner::scan_port_addr;
        !scan_port_addr(std::net::SocketAddr::from(([127, 0, 0, 1], port)))
    }

    /// Check that the port can actually be bound. A connect probe misses
    /// TIME_WAIT remnants of earlier test runs; a bind probe does not.
    pub fn is_port_bindable(port: u16) -> bool {
        TcpListener::bind(("0.0.0.0", port)).is_ok()
    }

    /// Next port from the counter that is free and bindable
    pub fn next_free_port() -> u16 {
        loop {
            let port = PORT_COUNTER.fetch_add(1, Ordering::SeqCst);
            if Self::is_port_available(port) && Self::is_port_bindable(port) {
                return port;
            }
        }
    }
}
