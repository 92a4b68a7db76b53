use actix::prelude::*;
use actix_web::{web, App, HttpServer};
use colored::*;
use std::path::PathBuf;

mod actors;
mod browser;
mod catalog;
mod client;
mod config;
mod engine;
mod errors;
mod logger;
mod persistence;
mod resolver;
mod routing;
mod session;
mod slug;
mod state;
mod templates;
mod tracking;
mod view;
mod walk;
mod wizard;

use actors::document::{DocumentActor, GetDocument};
use actors::file_watcher::FileWatcherActor;
use actors::tracking_store::TrackingStoreActor;
use client::ApiClient;
use routing::ServerSettings;

use clap::Parser;

#[derive(Parser)]
#[command(name = "wayfinder")]
#[command(about = "A step-by-step product finder with shareable, resumable progress.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Serves the wizard configuration, content cards and usage tracking
    Serve,
    /// Walks through the wizard in the terminal
    Walk {
        /// A query string to restore from, e.g. "size=small&color=blue"
        #[clap(long)]
        query: Option<String>,
        /// Ignore stored cookies
        #[clap(long, action)]
        fresh: bool,
    },
    /// Prints usage statistics
    Stats {
        /// Clear the statistics afterwards
        #[clap(long, action)]
        reset: bool,
    },
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve) | None => run_server().await,
        Some(Commands::Walk { query, fresh }) => {
            logger::init_logger(config::CONFIG.log_level.as_deref().unwrap_or("warn"));
            exit_on_error(walk::run(&config::CONFIG, query, fresh).await)
        }
        Some(Commands::Stats { reset }) => {
            logger::init_logger(config::CONFIG.log_level.as_deref().unwrap_or("warn"));
            exit_on_error(print_stats(reset).await)
        }
    }
}

fn exit_on_error(result: anyhow::Result<()>) -> std::io::Result<()> {
    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
    Ok(())
}

async fn print_stats(reset: bool) -> anyhow::Result<()> {
    let client = ApiClient::new(&config::CONFIG.server_url)?;
    let stats = client.fetch_stats().await?;
    print!("{}", view::render_stats(&stats));
    if reset {
        let cleared = client.reset_stats().await?;
        println!("{}", format!("Cleared {} session(s).", cleared).green());
    }
    Ok(())
}

async fn run_server() -> std::io::Result<()> {
    let cfg = &config::CONFIG;
    logger::init_logger(cfg.log_level.as_deref().unwrap_or("info"));

    let wizard_path = PathBuf::from(&cfg.wizard_path);
    let catalog_path = PathBuf::from(&cfg.catalog_path);

    // --- Actor Initialization ---

    let documents = match DocumentActor::load(wizard_path.clone(), catalog_path.clone()) {
        Ok(actor) => actor,
        Err(e) => {
            println!("Error: the wizard could not be loaded from {}.", wizard_path.display());
            println!("{}", e);
            std::process::exit(1);
        }
    };
    let documents_addr = documents.start();
    let store_addr = TrackingStoreActor::new().start();

    let mut _watcher: Option<Addr<FileWatcherActor>> = None;
    if cfg.watch {
        log::debug!("Watching {} and {} for changes.", wizard_path.display(), catalog_path.display());
        _watcher = Some(FileWatcherActor::new(documents_addr.clone(), wizard_path, catalog_path).start());
    }

    let settings = ServerSettings {
        tracking_enabled: cfg.tracking_enabled,
    };
    if !settings.tracking_enabled {
        log::info!("Usage tracking is disabled; tracking posts are acknowledged but not stored.");
    }

    let workers = num_cpus::get().max(1);
    log::debug!("Starting {} worker(s).", workers);

    let app_documents = documents_addr.clone();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Compress::default())
            .app_data(web::Data::new(app_documents.clone()))
            .app_data(web::Data::new(store_addr.clone()))
            .app_data(web::Data::new(settings.clone()))
            .configure(routing::configure)
    })
    .workers(workers)
    .keep_alive(std::time::Duration::from_secs(30))
    .bind((cfg.host.as_str(), cfg.port))
    .map_err(|e| {
        if e.kind() == std::io::ErrorKind::AddrInUse {
            println!("Error: The port {} is already in use.", cfg.port);
            println!("Another application is likely running on this port.");
            println!("Please stop the other application or choose a different port in `config.yaml`.");
            std::process::exit(1);
        }
        e
    })?;

    let (steps, recommendations) = match documents_addr.send(GetDocument).await {
        Ok(document) => (document.steps.len(), document.recommendations.len()),
        Err(_) => (0, 0),
    };
    logger::print_banner(&cfg.host, cfg.port, steps, recommendations);

    server.run().await
}
