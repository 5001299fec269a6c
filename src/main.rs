mod config;
mod dashboard;
mod feed;
mod map;
mod stream;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::dashboard::{FilterCriteria, RefreshCoordinator, SatelliteCommand};
use crate::feed::MemoryFeed;
use crate::map::{
    BaseMap, BaseMapRenderer, MapProjection, MarkerRenderer, Scene, TrajectoryAnimator,
};
use crate::stream::{LiveStream, StreamPayload};

#[derive(Parser)]
#[command(name = "satmap")]
#[command(about = "Satellite map rendering and live tracking")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a config file and the datasets it points at
    Validate { config: String },
    /// Run one refresh cycle and write the map as SVG
    Render {
        config: String,
        #[arg(short, long, default_value = "map.svg")]
        output: PathBuf,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        norad_id: Option<u32>,
        #[arg(long = "type")]
        sat_type: Option<String>,
        #[arg(long)]
        mission: Option<String>,
        #[arg(long)]
        min_altitude: Option<f64>,
        #[arg(long)]
        max_altitude: Option<f64>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Raw filter payload as emitted by the search form; overrides the
        /// individual filter flags
        #[arg(long)]
        filters: Option<String>,
    },
    /// Validate a satellite command payload (dispatch happens server-side)
    Command { payload: String },
    /// Refresh once, then write numbered SVG frames while the trajectory
    /// animations play
    Run {
        config: String,
        #[arg(short, long, default_value = "frames")]
        output: PathBuf,
        #[arg(long, default_value_t = 30)]
        frames: u32,
        #[arg(long, default_value_t = 2.0)]
        fps: f64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config } => validate(&config),
        Commands::Render {
            config,
            output,
            name,
            norad_id,
            sat_type,
            mission,
            min_altitude,
            max_altitude,
            page,
            filters,
        } => {
            let criteria = match filters {
                Some(payload) => match parse_filter_payload(&payload) {
                    Ok(criteria) => criteria,
                    Err(e) => {
                        eprintln!("Invalid filter payload: {}", e);
                        return ExitCode::FAILURE;
                    }
                },
                None => FilterCriteria {
                    name,
                    norad_id,
                    sat_type,
                    mission,
                    min_altitude,
                    max_altitude,
                },
            };
            render(&config, &output, criteria, page).await
        }
        Commands::Command { payload } => check_command(&payload),
        Commands::Run {
            config,
            output,
            frames,
            fps,
        } => run(&config, &output, frames, fps).await,
    }
}

struct MapView {
    scene: Arc<Mutex<Scene>>,
    markers: MarkerRenderer,
    coordinator: RefreshCoordinator<MemoryFeed>,
}

fn parse_filter_payload(payload: &str) -> Result<FilterCriteria, String> {
    let value: serde_json::Value = serde_json::from_str(payload).map_err(|e| e.to_string())?;
    FilterCriteria::from_value(&value).map_err(|e| e.to_string())
}

fn check_command(payload: &str) -> ExitCode {
    let value: serde_json::Value = match serde_json::from_str(payload) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Invalid JSON: {}", e);
            return ExitCode::FAILURE;
        }
    };
    match SatelliteCommand::from_value(&value) {
        Ok(command) => {
            println!(
                "Command '{}' for NORAD {} is valid",
                command.command_name, command.satellite_id
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Invalid command: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn build_view(config: &Config) -> Result<MapView, String> {
    let projection = Arc::new(Mutex::new(
        MapProjection::new(
            config.viewport.width,
            config.viewport.height,
            config.viewport.scale,
        )
        .with_zoom_extent(config.viewport.min_zoom, config.viewport.max_zoom),
    ));
    let scene = Arc::new(Mutex::new(Scene::new(
        config.viewport.width,
        config.viewport.height,
    )));

    // The boundary dataset loads once; a failure leaves the map blank
    // rather than failing the whole view.
    if let Some(path) = &config.map.basemap {
        match BaseMap::from_file(path) {
            Ok(basemap) => {
                BaseMapRenderer::new(scene.clone(), projection.clone()).render(&basemap);
                log::info!("basemap loaded: {} rings", basemap.rings().len());
            }
            Err(e) => log::warn!("basemap load failed, map stays blank: {}", e),
        }
    }

    let feed = MemoryFeed::from_file(&config.feed.catalog).map_err(|e| e.to_string())?;
    let markers = MarkerRenderer::new(scene.clone(), projection.clone());
    let animator =
        TrajectoryAnimator::new(scene.clone(), projection, config.map.animation_duration);
    let coordinator = RefreshCoordinator::new(
        feed,
        markers.clone(),
        animator,
        config.feed.page_size,
        config.map.lookahead_hours,
        config.map.step_minutes,
    );

    Ok(MapView {
        scene,
        markers,
        coordinator,
    })
}

fn validate(path: &str) -> ExitCode {
    let config = match Config::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match MemoryFeed::from_file(&config.feed.catalog) {
        Ok(feed) => println!("Catalog is valid ({} satellites)", feed.len()),
        Err(e) => {
            eprintln!("Catalog error: {}", e);
            return ExitCode::FAILURE;
        }
    }

    if let Some(basemap) = &config.map.basemap {
        match BaseMap::from_file(basemap) {
            Ok(map) => println!("Basemap is valid ({} rings)", map.rings().len()),
            Err(e) => {
                eprintln!("Basemap error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    println!(
        "Viewport {}x{}, page size {}, animation {}",
        config.viewport.width,
        config.viewport.height,
        config.feed.page_size,
        humantime::format_duration(config.map.animation_duration)
    );
    ExitCode::SUCCESS
}

async fn render(path: &str, output: &Path, criteria: FilterCriteria, page: u32) -> ExitCode {
    let view = match load_view(path) {
        Ok(v) => v,
        Err(code) => return code,
    };

    let mut cycle = match view.coordinator.apply_filters(criteria) {
        Some(handle) => handle,
        None => view.coordinator.view_ready(),
    };
    for _ in 1..page {
        cycle = view.coordinator.next_page();
    }
    if cycle.await.is_err() {
        eprintln!("Refresh cycle panicked");
        return ExitCode::FAILURE;
    }

    {
        let state = view.coordinator.state();
        let state = state.lock().unwrap();
        if let Some(error) = &state.error {
            eprintln!("{}", error);
            return ExitCode::FAILURE;
        }
        println!("Rendered {} satellites", state.snapshot.len());
    }

    match write_svg(&view.scene, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error writing {}: {}", output.display(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(path: &str, output: &Path, frames: u32, fps: f64) -> ExitCode {
    let view = match load_view(path) {
        Ok(v) => v,
        Err(code) => return code,
    };
    if let Err(e) = std::fs::create_dir_all(output) {
        eprintln!("Error creating output directory: {}", e);
        return ExitCode::FAILURE;
    }

    if view.coordinator.view_ready().await.is_err() {
        eprintln!("Refresh cycle panicked");
        return ExitCode::FAILURE;
    }

    // Simulated push channel standing in for the position websocket: drifts
    // every satellite slightly eastward once a second.
    let (tx, rx) = tokio::sync::mpsc::channel(16);
    let live = LiveStream::spawn(rx, view.coordinator.state(), view.markers.clone());
    let pusher = tokio::spawn(drift_positions(view.coordinator.state(), tx));

    let frame_gap = Duration::from_secs_f64(1.0 / fps.max(0.1));
    for frame in 0..frames {
        let file = output.join(format!("frame-{:04}.svg", frame));
        if let Err(e) = write_svg(&view.scene, &file) {
            eprintln!("Error writing {}: {}", file.display(), e);
            return ExitCode::FAILURE;
        }
        tokio::time::sleep(frame_gap).await;
    }

    pusher.abort();
    live.stop().await;
    view.coordinator.shutdown();
    println!("Wrote {} frames to {}", frames, output.display());
    ExitCode::SUCCESS
}

async fn drift_positions(
    state: Arc<Mutex<dashboard::ViewState>>,
    tx: tokio::sync::mpsc::Sender<StreamPayload>,
) {
    loop {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let updates: Vec<serde_json::Value> = {
            let state = state.lock().unwrap();
            state
                .snapshot
                .iter()
                .filter_map(|sat| {
                    sat.norad_id.map(|norad_id| {
                        serde_json::json!({
                            "norad_id": norad_id,
                            "latitude": sat.latitude,
                            "longitude": (sat.longitude + 0.5 + 180.0).rem_euclid(360.0) - 180.0,
                            "altitude_km": sat.altitude_km,
                        })
                    })
                })
                .collect()
        };
        let payload = match serde_json::to_string(&updates) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("failed to encode drift payload: {}", e);
                continue;
            }
        };
        if tx.send(StreamPayload::Message(payload)).await.is_err() {
            return;
        }
    }
}

fn load_view(path: &str) -> Result<MapView, ExitCode> {
    let config = Config::from_file(path).map_err(|e| {
        eprintln!("Config error: {}", e);
        ExitCode::FAILURE
    })?;
    build_view(&config).map_err(|e| {
        eprintln!("Error building view: {}", e);
        ExitCode::FAILURE
    })
}

fn write_svg(scene: &Arc<Mutex<Scene>>, path: &Path) -> std::io::Result<()> {
    let svg = scene.lock().unwrap().to_svg();
    std::fs::write(path, svg)
}
