use clap::{value_parser, Arg, Command};
use std::env;
use std::path::{Path, PathBuf};
use std::process::exit;
use std::sync::Arc;

use lango::clipboard::ClipboardManager;
use lango::config::ConfigLoader;
use lango::logger::Logger;
use lango::server::{self, RuntimeFlags, ServerOptions};
use lango::shutdown;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let key = "RUST_LOG";
    env::set_var(key, "lango=info");

    let matches = Command::new("Lango")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Vincent Bruijn <vebruijn@gmail.com>")
        .about("An HTTP server for local web development - serve static files with automatic port selection and optional token protection")
        .long_about("Lango ('gate' in Swahili) is a small HTTP server for local web development.\n\nIt serves a directory over HTTP, switches to a free port when the requested one is taken, reports both a localhost and a LAN-reachable address, and can require a shared token on every request.\n\nFor detailed documentation, visit: https://github.com/y-a-v-a/lango")
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .required(true)
                .value_parser(value_parser!(u16))
                .help("Port number to serve on (e.g., 3000, 8080)"),
        )
        .arg(
            Arg::new("directory")
                .short('d')
                .long("dir")
                .default_value(".")
                .help("Directory to serve static files from (defaults to current directory)"),
        )
        .arg(
            Arg::new("host")
                .short('H')
                .long("host")
                .value_name("ADDRESS")
                .help("Interface to bind (IPv4/IPv6 literal or hostname; defaults to all interfaces)"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Path to configuration file (serve.json, now.json, or package.json)"),
        )
        .arg(
            Arg::new("no-request-logging")
                .short('L')
                .long("no-request-logging")
                .action(clap::ArgAction::SetTrue)
                .help("Disable HTTP request logging to keep console output clean"),
        )
        .arg(
            Arg::new("no-timestamps")
                .short('T')
                .long("no-timestamps")
                .action(clap::ArgAction::SetTrue)
                .help("Disable timestamps in log messages"),
        )
        .arg(
            Arg::new("token")
                .long("token")
                .value_name("TOKEN")
                .help("Require this shared token on every request (Authorization header or `authentication` query parameter)"),
        )
        .arg(
            Arg::new("cors")
                .short('C')
                .long("cors")
                .action(clap::ArgAction::SetTrue)
                .help("Enable CORS headers for cross-origin requests (sets Access-Control-Allow-Origin: *)"),
        )
        .arg(
            Arg::new("no-compression")
                .short('u')
                .long("no-compression")
                .action(clap::ArgAction::SetTrue)
                .help("Disable gzip compression (compression is enabled by default)"),
        )
        .arg(
            Arg::new("no-port-switching")
                .long("no-port-switching")
                .action(clap::ArgAction::SetTrue)
                .help("Fail if specified port is unavailable (don't auto-switch ports)"),
        )
        .arg(
            Arg::new("no-clipboard")
                .short('n')
                .long("no-clipboard")
                .action(clap::ArgAction::SetTrue)
                .help("Don't automatically copy server URL to clipboard"),
        )
        .arg(
            Arg::new("no-etag")
                .long("no-etag")
                .action(clap::ArgAction::SetTrue)
                .help("Use Last-Modified header instead of ETag for HTTP caching"),
        )
        .get_matches();

    // Construct the logger that everything downstream writes through
    let enable_timestamps = !matches.get_flag("no-timestamps");
    let logger = Arc::new(Logger::new().with_timestamps(enable_timestamps));

    logger.startup_info(server::PKG_NAME, server::PKG_VERSION, server::PKG_AUTHORS);

    let requested_port = *matches.get_one::<u16>("port").unwrap();

    let dir_arg = matches.get_one::<String>("directory").unwrap();
    let dir = Path::new(&dir_arg);

    match env::set_current_dir(dir) {
        Ok(()) => (),
        Err(_) => {
            logger.error(&format!("Unknown path: {}", dir_arg));
            exit(1)
        }
    }

    let current_dir = env::current_dir()?;

    // Load configuration
    let custom_config = matches.get_one::<String>("config").map(|s| s.as_str());
    let config_loader = ConfigLoader::new(current_dir.clone(), current_dir.clone());
    let mut configuration = match config_loader.load_configuration(custom_config) {
        Ok(config) => config,
        Err(e) => {
            logger.error(&format!("Configuration error: {}", e));
            exit(1);
        }
    };

    // CLI flags override configuration
    if matches.get_flag("no-etag") {
        configuration.etag = false;
    }

    let options = ServerOptions {
        port: requested_port,
        host: matches.get_one::<String>("host").cloned(),
    };

    let flags = RuntimeFlags {
        request_logging: !matches.get_flag("no-request-logging"),
        token: matches.get_one::<String>("token").cloned(),
        cors: matches.get_flag("cors"),
        compression: !matches.get_flag("no-compression"),
        port_switching: !matches.get_flag("no-port-switching"),
    };

    // Warn when the document root has no default page
    let serve_dir = configuration
        .public
        .clone()
        .map(PathBuf::from)
        .unwrap_or_else(|| current_dir.clone());
    if !serve_dir.join("index.html").exists() {
        logger.warn(&format!(
            "index.html not found in {}. The server will run but may not serve a default page.",
            serve_dir.display()
        ));
    }

    // Initialize logging for internal diagnostics
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let running = match server::start(&options, &configuration, &flags, Arc::clone(&logger)) {
        Ok(running) => running,
        Err(e) => {
            logger.error(&e.to_string());
            exit(1);
        }
    };

    logger.server_info(
        server::SERVER_SIGNATURE,
        &running.addresses.local,
        &running.addresses.network,
    );

    if let Some(previous) = running.addresses.previous {
        logger.warn(&format!(
            "Port {} was already in use, switched to port {}",
            previous, running.port
        ));
    }

    if flags.token.is_some() {
        logger.info("Token authentication: enabled");
    }

    if flags.compression {
        logger.info("Compression: enabled");
    } else {
        logger.info("Compression: disabled (--no-compression flag)");
    }

    // Copy URL to clipboard if enabled
    let clipboard_manager = ClipboardManager::new(!matches.get_flag("no-clipboard"));
    if let Err(e) = clipboard_manager.copy_server_url(&running.addresses.local) {
        logger.warn(&format!("Could not copy to clipboard: {}", e));
    }

    // Set up graceful shutdown handling
    if let Err(e) = shutdown::install(running.handle(), Arc::clone(&logger)) {
        logger.error(&format!("Failed to setup signal handling: {}", e));
    }

    running.server.await
}
