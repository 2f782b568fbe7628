use std::process::ExitCode;

use arena_http_server::Server;
use arena_http_server::config::Args;
use arena_http_server::logging;
use arena_http_server::routes::demo;
use clap::Parser;
use tracing::error;

fn main() -> ExitCode {
    let config = match Args::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(&config) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    let result = Server::builder().config(config).build().and_then(|server| server.run(demo()));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(cause = %e, "server stopped");
            ExitCode::FAILURE
        }
    }
}
