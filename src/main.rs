use anyhow::Result;
use std::fs::{self, OpenOptions};
use std::sync::Mutex;
use tracing_subscriber::{
    fmt::writer::BoxMakeWriter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use tokentrack::ui::App;
use tokentrack_core::config::{Config, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Config::parse_args();

    // Setup logging
    setup_logging(cli.debug);

    // Load settings
    let mut settings = Settings::load(cli.config.as_ref())?;
    settings.merge_cli(&cli);
    settings.validate()?;

    // Run the application
    let mut app = App::new(settings);
    app.run().await
}

/// Log to `<cache-dir>/tokentrack/tokentrack.log`; the terminal belongs to the UI
fn setup_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("tokentrack=debug,tokentrack_core=debug")
    } else {
        EnvFilter::new("tokentrack=info,tokentrack_core=info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(log_writer()),
        )
        .init();
}

fn log_writer() -> BoxMakeWriter {
    let file = dirs::cache_dir()
        .map(|dir| dir.join("tokentrack"))
        .and_then(|dir| {
            fs::create_dir_all(&dir).ok()?;
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join("tokentrack.log"))
                .ok()
        });

    match file {
        Some(file) => BoxMakeWriter::new(Mutex::new(file)),
        None => BoxMakeWriter::new(std::io::sink),
    }
}
