use clap::Parser;
use gui::core::gui::TrackViewer;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use trackviz::core::animation::{AnimationDriver, ManualScheduler};
use trackviz::core::camera::CameraState;
use trackviz::core::renderer::{RenderStats, Renderer};
use trackviz::core::transform::Viewport;
use trackviz::post::png_export::export_png;
use trackviz::post::recording::{LayerCount, RecordedCall, RecordingSurface};
use trackviz::pre::catalog::{Catalog, CircuitSource};
use trackviz::pre::read_viewer_config::{load_viewer_config, ViewerConfig};
use trackviz::pre::viewer_opts::{Command, SceneArgs, ViewerOpts};

/// Frame interval used when stepping the animation offline.
const OFFLINE_FRAME_MS: f64 = 1000.0 / 60.0;

#[derive(Debug, Serialize)]
struct InspectReport<'a> {
    circuit: &'a str,
    rotation: f64,
    zoom: f64,
    stats: RenderStats,
    layers: Vec<LayerCount>,
    calls: &'a [RecordedCall],
}

fn init_tracing(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "info" }));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_catalog(config: &ViewerConfig, catalog_dir: Option<&Path>) -> anyhow::Result<Catalog> {
    let mut catalog = Catalog::builtin()?;
    if let Some(dirpath) = catalog_dir.or(config.catalog_dir.as_deref()) {
        catalog.extend_from_dir(dirpath)?;
    }
    debug!("Catalog holds {} circuits", catalog.len());
    Ok(catalog)
}

fn scene_camera(config: &ViewerConfig, scene: &SceneArgs) -> CameraState {
    let mut camera = CameraState::new(config.camera);
    scene.apply(&mut camera);
    camera
}

fn export(
    config: &ViewerConfig,
    catalog: &Catalog,
    circuit: Option<&str>,
    all: bool,
    out_dir: &Path,
    scene: &SceneArgs,
) -> anyhow::Result<()> {
    let renderer = Renderer::new(&config.render, config.theme.clone());
    let camera = scene_camera(config, scene);

    if !all {
        let id = circuit.unwrap_or(&config.default_circuit);
        let circuit = catalog.fetch(id)?;
        let filepath = out_dir.join(format!("{}.png", circuit.id));
        export_png(&filepath, &renderer, &circuit, &camera, scene.size())?;
        println!("{}", filepath.display());
        return Ok(());
    }

    let t_start = Instant::now();
    let results: Vec<(PathBuf, anyhow::Result<RenderStats>)> = catalog
        .circuits()
        .par_iter()
        .map(|circuit| {
            let filepath = out_dir.join(format!("{}.png", circuit.id));
            let res = export_png(&filepath, &renderer, circuit, &camera, scene.size());
            (filepath, res)
        })
        .collect();

    let mut no_failed = 0;
    for (filepath, res) in results.iter() {
        match res {
            Ok(_) => println!("{}", filepath.display()),
            Err(e) => {
                warn!("{:#}", e);
                no_failed += 1;
            }
        }
    }
    info!(
        "Exported {} of {} circuits in {}ms",
        results.len() - no_failed,
        results.len(),
        t_start.elapsed().as_millis()
    );

    if no_failed > 0 {
        anyhow::bail!("{} of {} exports failed!", no_failed, results.len());
    }
    Ok(())
}

fn inspect(
    config: &ViewerConfig,
    catalog: &Catalog,
    id: &str,
    frames: u32,
    json: bool,
    scene: &SceneArgs,
) -> anyhow::Result<()> {
    let circuit = catalog.fetch(id)?;
    let renderer = Renderer::new(&config.render, config.theme.clone());
    let mut camera = scene_camera(config, scene);
    let viewport = Viewport::new(scene.width as f64, scene.height as f64);
    let mut surface = RecordingSurface::new(viewport);

    // step the animation without a display, each frame renders into the recording surface
    let mut driver = AnimationDriver::new();
    let mut scheduler = ManualScheduler::new();
    let mut stats = None;
    if frames > 0 {
        driver.start(&mut scheduler);
        for i in 0..frames {
            let handle = match scheduler.fire_next() {
                Some(handle) => handle,
                None => break,
            };
            let now_ms = i as f64 * OFFLINE_FRAME_MS;
            stats = driver.on_frame(handle, now_ms, &mut camera, &mut scheduler, |cam| {
                renderer.render(&mut surface, &circuit, cam, &viewport)
            });
        }
        driver.stop(&mut scheduler);
    } else {
        stats = renderer.render(&mut surface, &circuit, &camera, &viewport);
    }

    let stats = stats.ok_or_else(|| {
        anyhow::anyhow!("Viewport {}x{} is not drawable!", scene.width, scene.height)
    })?;

    if json {
        let report = InspectReport {
            circuit: &circuit.id,
            rotation: camera.rotation(),
            zoom: camera.zoom(),
            stats,
            layers: surface.layer_summary(),
            calls: surface.calls(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} at {:.1}° / {:.2}x ({} view)",
        circuit.name,
        camera.rotation(),
        camera.zoom(),
        camera.view_mode
    );
    for count in surface.layer_summary() {
        println!("  {:<12} {:>5}", count.layer, count.calls);
    }
    println!(
        "  {:<12} {:>5} ({} corners, {} fps)",
        "total", stats.elements_drawn, stats.corners_drawn, stats.fps
    );
    Ok(())
}

fn list(catalog: &Catalog) {
    for c in catalog.circuits() {
        println!(
            "{:<12} {:<28} {:<18} {:>9} {:>3} corners  {}",
            c.id,
            c.name,
            c.kind.to_string(),
            c.length,
            c.corners.len(),
            c.difficulty
        );
    }
}

fn main() -> anyhow::Result<()> {
    // PRE-PROCESSING ------------------------------------------------------------------------------
    // get viewer options from the command line arguments
    let opts: ViewerOpts = ViewerOpts::parse();
    init_tracing(opts.debug);

    // get viewer configuration and circuit catalog
    if let Some(config_path) = &opts.config_path {
        info!("Reading viewer config from {}", config_path.display());
    }
    let config = load_viewer_config(opts.config_path.as_deref())?;
    let catalog = load_catalog(&config, opts.catalog_dir.as_deref())?;

    // EXECUTION -----------------------------------------------------------------------------------
    match &opts.command {
        Command::List => list(&catalog),
        Command::Export {
            circuit,
            all,
            out_dir,
            scene,
        } => export(&config, &catalog, circuit.as_deref(), *all, out_dir, scene)?,
        Command::Inspect {
            circuit,
            frames,
            json,
            scene,
        } => inspect(&config, &catalog, circuit, *frames, *json, scene)?,
        Command::View { circuit, play } => {
            let id = circuit.clone().unwrap_or_else(|| config.default_circuit.clone());
            if catalog.get(&id).is_none() {
                anyhow::bail!("Circuit {} is not in the catalog!", id);
            }
            info!("Starting viewer with circuit {}", id);

            // the viewer must run on the main thread
            let gui = TrackViewer::new(&config, Arc::new(catalog), &id, *play);
            let native_options = eframe::NativeOptions {
                initial_window_size: Some(eframe::egui::Vec2::new(1280.0, 720.0)),
                ..eframe::NativeOptions::default()
            };
            eframe::run_native(Box::new(gui), native_options);
        }
    }

    Ok(())
}
