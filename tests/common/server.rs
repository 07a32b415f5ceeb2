//! Test server management utilities
//!
//! Starts in-process lango servers for integration tests, each backed by a
//! fresh temporary document root.

use std::sync::Arc;

use actix_web::dev::ServerHandle;
use tempfile::TempDir;

use lango::config::Configuration;
use lango::logger::Logger;
use lango::server::{self, ListenResult, RunningServer, RuntimeFlags, ServerOptions};

use super::filesystem::FileSystemHelper;

/// An in-process server under test plus the document root backing it.
pub struct TestServer {
    pub temp_dir: TempDir,
    pub addresses: ListenResult,
    pub port: u16,
    pub handle: ServerHandle,
}

impl TestServer {
    /// Start a server on `port` with the given flags and a default logger.
    pub fn start(
        port: u16,
        host: Option<&str>,
        flags: RuntimeFlags,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        Self::start_with_logger(port, host, flags, Arc::new(Logger::new()))
    }

    /// Start a server with a caller-supplied logger (e.g. one writing to a
    /// capturing sink).
    pub fn start_with_logger(
        port: u16,
        host: Option<&str>,
        flags: RuntimeFlags,
        logger: Arc<Logger>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        FileSystemHelper::create_html_file(
            temp_dir.path(),
            "index.html",
            "Lango Test",
            "<h1>Lango Test</h1>",
        )?;

        let mut config = Configuration::default();
        config.public = Some(temp_dir.path().to_string_lossy().to_string());

        let options = ServerOptions {
            port,
            host: host.map(String::from),
        };

        let RunningServer {
            addresses,
            port,
            server,
        } = server::start(&options, &config, &flags, logger)?;

        let handle = server.handle();
        actix_web::rt::spawn(server);

        Ok(TestServer {
            temp_dir,
            addresses,
            port,
            handle,
        })
    }

    /// Get the server's base URL
    pub fn url(&self) -> &str {
        &self.addresses.local
    }

    /// A URL that forces an IPv4 loopback connection, so the logged peer
    /// address is predictable.
    pub fn ipv4_url(&self) -> String {
        format!("http://127.0.0.1:{}/", self.port)
    }

    /// Stop the server gracefully
    pub async fn stop(&self) {
        self.handle.stop(true).await;
    }
}
