// src/shutdown.rs
// Graceful shutdown handling for the server

use actix_web::dev::ServerHandle;
use futures_util::StreamExt;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook_tokio::Signals;
use std::sync::Arc;
use std::time::Duration;

use crate::logger::Logger;

/// Install SIGINT/SIGTERM handling. The first signal stops the server
/// gracefully through its handle; a second signal, or a stop that drags
/// past five seconds, force-exits the process.
pub fn install(handle: ServerHandle, logger: Arc<Logger>) -> Result<(), std::io::Error> {
    let signals = Signals::new([SIGINT, SIGTERM])?;

    tokio::spawn(async move {
        let mut signals = signals;
        let mut stopping = false;

        while let Some(signal) = signals.next().await {
            match signal {
                SIGINT | SIGTERM => {
                    if stopping {
                        logger.force_shutdown_message();
                        std::process::exit(0);
                    }

                    stopping = true;
                    logger.shutdown_message();

                    let server = handle.clone();
                    tokio::spawn(async move {
                        server.stop(true).await;
                        std::process::exit(0);
                    });

                    let force_logger = Arc::clone(&logger);
                    tokio::spawn(async move {
                        tokio::time::sleep(Duration::from_secs(5)).await;
                        force_logger.force_shutdown_message();
                        std::process::exit(0);
                    });
                }
                _ => {}
            }
        }
    });

    Ok(())
}
