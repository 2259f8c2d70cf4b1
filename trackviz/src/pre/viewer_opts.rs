use crate::core::camera::{CameraState, Layer, ViewMode};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[clap(
    version = "0.1.0",
    name = "trackviz",
    about = "A layered overhead renderer for Formula 1 circuits"
)]
pub struct ViewerOpts {
    // FLAGS ---------------------------------------------------------------------------------------
    /// Activate debug logging
    #[clap(short, long)]
    pub debug: bool,

    // OPTIONS -------------------------------------------------------------------------------------
    /// Set path to the viewer config file (OPTIONAL: if not set, defaults are used)
    #[clap(short, long)]
    pub config_path: Option<PathBuf>,

    /// Set directory with additional circuit JSON files (overrides the config file)
    #[clap(long)]
    pub catalog_dir: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Open the interactive viewer
    View {
        /// Circuit to open (defaults to the config's default circuit)
        circuit: Option<String>,

        /// Start with the rotation animation running
        #[clap(short, long)]
        play: bool,
    },

    /// Render circuits into PNG files
    Export {
        /// Circuit to export, ignored with --all
        circuit: Option<String>,

        /// Export every circuit of the catalog in parallel
        #[clap(short, long)]
        all: bool,

        /// Output directory
        #[clap(short, long, default_value = "output")]
        out_dir: PathBuf,

        #[clap(flatten)]
        scene: SceneArgs,
    },

    /// Print the per-layer draw calls of a circuit render
    Inspect {
        circuit: String,

        /// Number of animation frames to run before the final render
        #[clap(short, long, default_value = "0")]
        frames: u32,

        /// Print the full draw call list as JSON
        #[clap(short, long)]
        json: bool,

        #[clap(flatten)]
        scene: SceneArgs,
    },

    /// List the circuits of the catalog
    List,
}

/// SceneArgs describe the camera of a non-interactive render.
#[derive(Debug, Args, Clone)]
pub struct SceneArgs {
    /// Image width in pixels
    #[clap(long, default_value = "1280")]
    pub width: u32,

    /// Image height in pixels
    #[clap(long, default_value = "720")]
    pub height: u32,

    /// Camera rotation in degrees
    #[clap(short, long, default_value = "0.0", allow_hyphen_values = true)]
    pub rotation: f64,

    /// Zoom factor, clamped to the configured bounds
    #[clap(short, long)]
    pub zoom: Option<f64>,

    /// Hide a layer, can be given multiple times (track, barriers, elevation, drs, sectors,
    /// corners, facilities, lighting)
    #[clap(long)]
    pub hide: Vec<Layer>,

    /// View mode (overview, detailed, technical)
    #[clap(short, long, default_value = "overview")]
    pub view_mode: ViewMode,
}

impl SceneArgs {
    /// apply sets the camera up as requested on the command line.
    pub fn apply(&self, camera: &mut CameraState) {
        camera.set_rotation(self.rotation);
        if let Some(zoom) = self.zoom {
            camera.set_zoom_level(zoom);
        }
        for layer in self.hide.iter() {
            camera.layers.set(*layer, false);
        }
        camera.view_mode = self.view_mode;
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
