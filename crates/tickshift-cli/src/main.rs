use clap::Parser;
use tickshift_cli::{Cli, OutputFormat};
use tracing::Level;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(Level::from(cli.log_level).as_str().to_ascii_lowercase())
    });
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    match cli.format {
        OutputFormat::Json => subscriber.json().init(),
        OutputFormat::Text => subscriber.init(),
    }

    tickshift_cli::run(cli)
}
