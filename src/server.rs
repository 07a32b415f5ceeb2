// src/server.rs
// Server bootstrap: allocate a port, resolve addresses, install the
// middleware chain and start serving

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{
    dev::{Server, ServerHandle},
    middleware::{Compress, Condition, DefaultHeaders},
    App, HttpServer,
};
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Configuration;
use crate::logger::Logger;
use crate::middleware::{RequestLogging, TokenAuth};
use crate::network::{self, BindError};

pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
pub const SERVER_SIGNATURE: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Where the caller asked the server to live.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub port: u16,
    /// Interface to bind; the wildcard address when absent.
    pub host: Option<String>,
}

/// Request-time switches, fixed for the lifetime of one server instance.
#[derive(Debug, Clone)]
pub struct RuntimeFlags {
    pub request_logging: bool,
    pub token: Option<String>,
    pub cors: bool,
    pub compression: bool,
    pub port_switching: bool,
}

impl Default for RuntimeFlags {
    fn default() -> Self {
        Self {
            request_logging: true,
            token: None,
            cors: false,
            compression: true,
            port_switching: true,
        }
    }
}

/// Connection metadata handed back by [`start`].
#[derive(Debug, Clone)]
pub struct ListenResult {
    /// Loopback URL on the bound port.
    pub local: String,
    /// LAN-reachable URL on the same port.
    pub network: String,
    /// The originally requested port, present only when it was occupied and
    /// another port was bound instead.
    pub previous: Option<u16>,
}

/// A started server. The listener is bound and queueing connections; the
/// caller owns the `server` future and keeps the server alive by awaiting
/// it (or spawning it) until shutdown is requested through [`handle`].
///
/// [`handle`]: RunningServer::handle
pub struct RunningServer {
    pub addresses: ListenResult,
    pub port: u16,
    pub server: Server,
}

impl RunningServer {
    pub fn handle(&self) -> ServerHandle {
        self.server.handle()
    }
}

#[derive(Debug)]
pub enum ServerError {
    Bind(BindError),
    Listen(io::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Bind(err) => write!(f, "{}", err),
            ServerError::Listen(err) => write!(f, "Failed to start listener: {}", err),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::Bind(err) => Some(err),
            ServerError::Listen(err) => Some(err),
        }
    }
}

impl From<BindError> for ServerError {
    fn from(err: BindError) -> Self {
        ServerError::Bind(err)
    }
}

/// Bind the requested address (falling back to an ephemeral port when
/// allowed), resolve the advertised URLs and start serving the configured
/// directory through the middleware chain. Only an unrecoverable bind
/// failure aborts; everything after the bind surfaces per request.
pub fn start(
    options: &ServerOptions,
    config: &Configuration,
    flags: &RuntimeFlags,
    logger: Arc<Logger>,
) -> Result<RunningServer, ServerError> {
    let host = options.host.clone().unwrap_or_else(|| "0.0.0.0".to_string());
    let allocation = network::allocate(&host, options.port, flags.port_switching)?;

    let resolved = network::resolve(options.host.as_deref(), allocation.port);
    let addresses = ListenResult {
        local: resolved.local,
        network: resolved.network,
        previous: allocation.previous,
    };

    let serve_dir = config
        .public
        .clone()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    log::debug!(
        "Serving {} at {} (port {})",
        serve_dir.display(),
        addresses.local,
        allocation.port
    );

    let directory_listing = config.directory_listing;
    let etag = config.etag;
    let flags = flags.clone();

    let server = HttpServer::new(move || {
        let headers = DefaultHeaders::new()
            .add(("Server", PKG_NAME))
            .add(("X-Server", SERVER_SIGNATURE))
            .add(("X-Version", PKG_VERSION));

        // Registration order is inverted at run time: the token check runs
        // first, then logging, then the delegate. A rejected request leaves
        // no records and never touches a file.
        App::new()
            .wrap(Condition::new(flags.compression, Compress::default()))
            .wrap(Condition::new(flags.cors, Cors::permissive()))
            .wrap(headers)
            .wrap(RequestLogging::new(Arc::clone(&logger), flags.request_logging))
            .wrap(TokenAuth::new(flags.token.clone()))
            .service(static_delegate(serve_dir.clone(), directory_listing, etag))
    })
    .listen(allocation.listener)
    .map_err(ServerError::Listen)?
    .run();

    Ok(RunningServer {
        addresses,
        port: allocation.port,
        server,
    })
}

/// The off-the-shelf file delegate, configured from `serve.json`.
fn static_delegate(dir: PathBuf, directory_listing: bool, etag: bool) -> Files {
    let mut files = Files::new("/", dir).index_file("index.html");

    if directory_listing {
        files = files.show_files_listing();
    }

    if etag {
        files.use_etag(true).use_last_modified(false)
    } else {
        files.use_etag(false).use_last_modified(true)
    }
}
