use crate::core::camera::{CameraConfig, ViewPreset};
use crate::core::renderer::RenderConfig;
use crate::core::style::Theme;
use crate::pre::image_resolver::ImageConfig;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// ViewerConfig is used to store all other configuration structs. Every field is optional in the
/// JSON file, missing fields take their defaults.
///
/// * `default_circuit` - Circuit shown when the viewer opens
/// * `catalog_dir` - Directory with additional circuit files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub default_circuit: String,
    pub catalog_dir: Option<PathBuf>,
    pub camera: CameraConfig,
    pub render: RenderConfig,
    pub theme: Theme,
    pub presets: Vec<ViewPreset>,
    pub images: ImageConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        ViewerConfig {
            default_circuit: "monaco".to_owned(),
            catalog_dir: None,
            camera: CameraConfig::default(),
            render: RenderConfig::default(),
            theme: Theme::default(),
            presets: ViewPreset::defaults(),
            images: ImageConfig::default(),
        }
    }
}

impl ViewerConfig {
    /// check rejects configurations the camera cannot work with.
    pub fn check(&self) -> anyhow::Result<()> {
        let cam = &self.camera;
        if !(cam.min_zoom > 0.0 && cam.min_zoom <= cam.max_zoom) {
            anyhow::bail!(
                "Zoom bounds [{}, {}] are invalid, expected 0 < min_zoom <= max_zoom!",
                cam.min_zoom,
                cam.max_zoom
            );
        }
        if !(cam.min_zoom..=cam.max_zoom).contains(&cam.default_zoom) {
            anyhow::bail!(
                "Default zoom {} lies outside of [{}, {}]!",
                cam.default_zoom,
                cam.min_zoom,
                cam.max_zoom
            );
        }
        if !(self.render.reference_size > 0.0 && self.render.world_scale > 0.0) {
            anyhow::bail!("Reference size and world scale must be positive!");
        }
        Ok(())
    }
}

/// read_viewer_config reads the JSON file and decodes the JSON string into the viewer
/// configuration struct.
pub fn read_viewer_config(filepath: &Path) -> anyhow::Result<ViewerConfig> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!(
            "Failed to open viewer config file {}!",
            filepath.display()
        ))?;
    let config: ViewerConfig = serde_json::from_reader(&fh).context(format!(
        "Failed to parse viewer config file {}!",
        filepath.display()
    ))?;
    config.check().context(format!(
        "Viewer config file {} is inconsistent!",
        filepath.display()
    ))?;
    Ok(config)
}

/// load_viewer_config returns the defaults when no file is given.
pub fn load_viewer_config(filepath: Option<&Path>) -> anyhow::Result<ViewerConfig> {
    match filepath {
        Some(filepath) => read_viewer_config(filepath),
        None => Ok(ViewerConfig::default()),
    }
}
