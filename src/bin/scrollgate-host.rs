//! Native messaging host for Scrollgate
//!
//! The UI process launches this binary and talks to it over stdin/stdout
//! using length-prefixed JSON frames. Logs go to stderr.

use log::{error, info};
use scrollgate_lib::native_host::{FrameWriter, HostConfig, NativeHost};
use scrollgate_lib::{get_db_path, open_database};
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_logging();

    let db = match get_db_path().and_then(|path| open_database(&path)) {
        Ok(db) => db,
        Err(e) => {
            error!("Initialization error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let host = match NativeHost::new(db, FrameWriter::new(io::stdout()), HostConfig::default()) {
        Ok(host) => host,
        Err(e) => {
            error!("Failed to start host: {e}");
            return ExitCode::FAILURE;
        }
    };

    match host.monitor().resume_if_enabled() {
        Ok(true) => info!("Resumed monitoring from last session"),
        Ok(false) => {}
        Err(e) => error!("Failed to resume monitoring: {e}"),
    }

    // Runs until the UI closes the pipe.
    let result = host.run(&mut io::stdin().lock());
    host.shutdown();

    match result {
        Err(e) if e.kind() != io::ErrorKind::UnexpectedEof => {
            error!("Native host error: {e}");
            ExitCode::FAILURE
        }
        Ok(()) | Err(_) => ExitCode::SUCCESS,
    }
}
