mod app;
mod capture;
mod cli;
mod config;
mod error;
mod ui;

#[cfg(test)]
mod tests;

use tracing_subscriber::EnvFilter;

fn main() {
    init_logging();

    if let Err(code) = cli::handle_cli_if_requested() {
        std::process::exit(code);
    }

    app::run();
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cute_recorder=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
