use clap::{Parser, Subcommand};
use image_enhancer::commands::gallery_commands;
use image_enhancer::config::AppConfig;
use image_enhancer::error::AppResult;
use image_enhancer::events::AppEvent;
use image_enhancer::AppState;
use std::path::PathBuf;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;

/// Send images through an enhancement backend and keep the results.
#[derive(Parser, Debug)]
#[command(name = "image-enhancer")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the proxy endpoint (`POST /api/enhance`)
    Serve {
        #[arg(short, long, help = "Port to listen on (default from config: 3000)")]
        port: Option<u16>,

        #[arg(short, long, help = "Address to bind (default from config: 0.0.0.0)")]
        bind: Option<String>,
    },

    /// Enhance local images through a running proxy
    Enhance {
        #[arg(required = true, help = "Image files (jpeg, png, jpg, gif)")]
        files: Vec<PathBuf>,

        #[arg(long, help = "Proxy base URL (default from config: http://localhost:3000)")]
        proxy: Option<String>,

        #[arg(short, long, help = "Directory for enhanced_image_<n>.png files")]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> AppResult<()> {
    image_enhancer::init_logging();
    let args = Args::parse();
    let mut config = AppConfig::load_or_default();

    match args.command {
        Command::Serve { port, bind } => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(bind) = bind {
                config.bind_address = bind;
            }
            image_enhancer::proxy::server::start_server(config).await
        }
        Command::Enhance { files, proxy, out } => {
            if let Some(proxy) = proxy {
                config.proxy_url = proxy;
            }
            if out.is_some() {
                config.download_dir = out;
            }
            config.validate()?;
            enhance_files(config, &files).await
        }
    }
}

async fn enhance_files(config: AppConfig, files: &[PathBuf]) -> AppResult<()> {
    let state = AppState::with_proxy(config)?;

    let events = state.events.subscribe();
    let printer = tokio::spawn(print_progress(events));

    let added = gallery_commands::add_paths(&state, files).await?;
    if added < files.len() {
        log::warn!("Skipped {} file(s) that are not images", files.len() - added);
    }

    let report = gallery_commands::enhance_all(&state).await?;

    let mut saved = 0;
    for index in 0..added {
        if let Some(path) = gallery_commands::download_enhanced(&state, index).await? {
            println!("Saved {}", path.display());
            saved += 1;
        }
    }
    println!(
        "Enhanced {} of {} image(s), saved {}",
        report.succeeded, report.total, saved
    );

    // Dropping the state closes the event bus, which ends the printer.
    drop(state);
    if let Err(e) = printer.await {
        log::warn!("Progress printer failed: {}", e);
    }
    Ok(())
}

/// Prints progress until the bus closes. Returns the number of lines printed.
async fn print_progress(mut events: Receiver<AppEvent>) -> usize {
    let mut printed = 0;
    loop {
        match events.recv().await {
            Ok(AppEvent::Progress(p)) => {
                println!("{}% Complete ({}/{})", p.percent.round(), p.completed, p.total);
                printed += 1;
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                log::debug!("Progress printer skipped {} events", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
    printed
}

#[cfg(test)]
mod tests {
    use super::*;
    use image_enhancer::events::{EventBus, ProgressPayload};

    fn progress(completed: usize, total: usize) -> AppEvent {
        AppEvent::Progress(ProgressPayload {
            completed,
            total,
            percent: completed as f64 / total as f64 * 100.0,
        })
    }

    #[tokio::test]
    async fn printer_survives_lag_and_prints_the_final_line() {
        let bus = EventBus::new(2);
        let events = bus.subscribe();

        // Overflow the channel before the printer reads anything.
        for completed in 1..=5 {
            bus.emit(progress(completed, 5));
        }
        drop(bus);

        let printed = print_progress(events).await;
        // The two newest events survive the lag, including 5/5.
        assert_eq!(printed, 2);
    }

    #[tokio::test]
    async fn printer_stops_when_bus_closes() {
        let bus = EventBus::default();
        let events = bus.subscribe();
        let printer = tokio::spawn(print_progress(events));

        bus.emit(progress(1, 1));
        drop(bus);

        assert_eq!(printer.await.unwrap(), 1);
    }
}
