use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cockpit_gateway::assistant::{AssistantPipeline, GeminiClient, GpsResolver};
use cockpit_gateway::db::{self, HistoryRepo};
use cockpit_gateway::geo::Coordinates;
use cockpit_gateway::nav::{DirectionsApi, GoogleDirectionsClient, GooglePlacesClient, SearchService};
use cockpit_gateway::{Config, Daemon, DashboardEvent};

/// Cockpit - voice and navigation core for in-car dashboards
#[derive(Parser)]
#[command(name = "cockpit", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable voice features (for hosts without speech input)
    #[arg(long, env = "COCKPIT_DISABLE_VOICE")]
    disable_voice: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Search destinations for a query and print the ranked results
    Search {
        /// Free-text query
        query: String,

        /// Current position as "lat,lng" for distance ranking
        #[arg(short, long)]
        location: Option<String>,
    },
    /// Send one command through the assistant's destination extraction
    Ask {
        /// Command text, as the voice subsystem would capture it
        command: String,
    },
    /// Request a driving route and print its summary
    Route {
        /// Origin as "lat,lng"
        origin: String,

        /// Destination as "lat,lng"
        destination: String,
    },
    /// Print the recent-search history
    History,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,cockpit_gateway=info",
        1 => "info,cockpit_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load_with_options(cli.disable_voice)?;

    if let Some(command) = cli.command {
        return match command {
            Command::Search { query, location } => cmd_search(&config, &query, location.as_deref()).await,
            Command::Ask { command } => cmd_ask(&config, &command).await,
            Command::Route {
                origin,
                destination,
            } => cmd_route(&config, &origin, &destination).await,
            Command::History => cmd_history(&config),
        };
    }

    tracing::info!(
        vehicle = %config.vehicle.name,
        voice = config.voice.enabled,
        "starting cockpit gateway"
    );

    let daemon = Daemon::new(config)?;

    if daemon.wake_word().is_empty() {
        tracing::info!("cockpit gateway ready");
    } else {
        tracing::info!("cockpit gateway ready - say \"{}\"", daemon.wake_word());
    }

    // Log dashboard events so the daemon run is observable on a terminal
    let mut events = daemon.handle().subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            log_event(&event);
        }
    });

    daemon.run().await?;

    Ok(())
}

/// Print a dashboard event in a terminal-friendly form
fn log_event(event: &DashboardEvent) {
    match event {
        DashboardEvent::VoiceListening => println!("[voice] listening..."),
        DashboardEvent::VoiceProcessing { command } => println!("[voice] processing: {command}"),
        DashboardEvent::VoiceFeedback { text } => println!("[voice] {text}"),
        DashboardEvent::VoiceIdle => println!("[voice] idle"),
        DashboardEvent::SearchResults { query, results } => {
            println!("[search] {} result(s) for \"{query}\"", results.len());
            for (i, result) in results.iter().enumerate() {
                println!(
                    "  {}. {} - {} ({}, {}, {}% battery)",
                    i + 1,
                    result.name,
                    result.address,
                    result.distance,
                    result.duration,
                    result.battery_usage
                );
            }
        }
        DashboardEvent::RouteReady {
            destination,
            route,
            arrival,
        } => {
            println!(
                "[route] {} - {} / {} (arrival {arrival}, {} points)",
                destination.name,
                route.distance_text,
                route.duration_text,
                route.path.len()
            );
        }
        DashboardEvent::RouteCleared => println!("[route] cleared"),
    }
}

/// Search destinations and print the ranked results
async fn cmd_search(config: &Config, query: &str, location: Option<&str>) -> anyhow::Result<()> {
    let maps_key = config
        .api_keys
        .maps
        .clone()
        .ok_or_else(|| anyhow::anyhow!("maps API key required (COCKPIT_MAPS_API_KEY)"))?;

    let origin = location.map(parse_lat_lng).transpose()?;
    let pool = db::init(config.data_dir.join("cockpit.db"))?;
    let service = SearchService::new(
        GooglePlacesClient::new(maps_key)?,
        HistoryRepo::new(pool),
        config.vehicle.clone(),
        config.search.radius_m,
    );

    let results = service.search(query, origin).await;
    if results.is_empty() {
        println!("No results for \"{query}\"");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        println!(
            "{}. {} - {} ({}, {})",
            i + 1,
            result.name,
            result.address,
            result.distance,
            result.duration
        );
    }

    Ok(())
}

/// Run one destination extraction through the assistant
async fn cmd_ask(config: &Config, command: &str) -> anyhow::Result<()> {
    struct NoGps;

    #[async_trait::async_trait]
    impl GpsResolver for NoGps {
        async fn current_position(&self) -> Option<Coordinates> {
            None
        }
    }

    let gemini_key = config
        .api_keys
        .gemini
        .clone()
        .ok_or_else(|| anyhow::anyhow!("Gemini API key required (COCKPIT_GEMINI_API_KEY)"))?;

    let client = GeminiClient::new(gemini_key, config.assistant.model.clone())?;
    let pipeline = AssistantPipeline::new(
        client,
        Arc::new(NoGps),
        config.assistant.max_attempts,
        config.vehicle.name.clone(),
    );

    match pipeline.extract_destination(command).await? {
        Some(destination) => println!("Destination: {destination}"),
        None => println!("No destination recognized"),
    }

    Ok(())
}

/// Request a driving route and print its summary
async fn cmd_route(config: &Config, origin: &str, destination: &str) -> anyhow::Result<()> {
    let maps_key = config
        .api_keys
        .maps
        .clone()
        .ok_or_else(|| anyhow::anyhow!("maps API key required (COCKPIT_MAPS_API_KEY)"))?;

    let client = GoogleDirectionsClient::new(maps_key)?;
    let origin = parse_lat_lng(origin)?;
    let destination = parse_lat_lng(destination)?;

    match client.route(origin, destination).await? {
        Some(route) => {
            println!(
                "Route: {} / {} ({} points)",
                route.distance_text,
                route.duration_text,
                route.path.len()
            );
        }
        None => println!("No route found"),
    }

    Ok(())
}

/// Print the recent-search history
fn cmd_history(config: &Config) -> anyhow::Result<()> {
    let pool = db::init(config.data_dir.join("cockpit.db"))?;
    let history = HistoryRepo::new(pool).load()?;

    if history.is_empty() {
        println!("No recent searches");
    } else {
        for (i, query) in history.iter().enumerate() {
            println!("{}. {query}", i + 1);
        }
    }

    Ok(())
}

/// Parse "lat,lng" into coordinates
fn parse_lat_lng(value: &str) -> anyhow::Result<Coordinates> {
    let (lat, lng) = value
        .split_once(',')
        .ok_or_else(|| anyhow::anyhow!("expected \"lat,lng\", got {value:?}"))?;

    Ok(Coordinates::new(lat.trim().parse()?, lng.trim().parse()?))
}
