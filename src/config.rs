use crate::camera::{CaptureMode, LensFacing};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DemocamConfig {
    pub camera: CameraConfig,
    pub storage: StorageConfig,
    pub surface: SurfaceConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CameraConfig {
    /// Which lens the image capture use case binds to
    #[serde(default = "default_lens_facing")]
    pub lens_facing: LensFacing,

    /// Capture mode for the image capture use case
    #[serde(default = "default_capture_mode")]
    pub capture_mode: CaptureMode,

    /// Seconds before an unanswered capture is reported as failed
    #[serde(default = "default_capture_timeout")]
    pub capture_timeout_seconds: u64,

    /// Device node checked for camera access (e.g. /dev/video0)
    pub device: Option<String>,

    /// Sensor resolution reported by the simulated platform (width, height)
    #[serde(default = "default_simulated_resolution")]
    pub simulated_resolution: (u32, u32),
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    /// Storage root that holds the capture folder
    #[serde(default = "default_storage_root")]
    pub root: String,

    /// Capture folder name under the root
    #[serde(default = "default_storage_folder")]
    pub folder: String,

    /// Suffix appended to the timestamp of each capture
    #[serde(default = "default_file_suffix")]
    pub file_suffix: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SurfaceConfig {
    /// Measured size of the headless preview surface (width, height)
    #[serde(default = "default_surface_resolution")]
    pub resolution: (u32, u32),

    /// Initial display rotation code (0, 1, 2, 3)
    #[serde(default = "default_surface_rotation")]
    pub rotation: i32,
}

impl DemocamConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("democam.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("camera.lens_facing", "back")?
            .set_default("camera.capture_mode", "min_latency")?
            .set_default("camera.capture_timeout_seconds", default_capture_timeout())?
            .set_default(
                "camera.simulated_resolution",
                vec![
                    default_simulated_resolution().0,
                    default_simulated_resolution().1,
                ],
            )?
            .set_default("storage.root", default_storage_root())?
            .set_default("storage.folder", default_storage_folder())?
            .set_default("storage.file_suffix", default_file_suffix())?
            .set_default(
                "surface.resolution",
                vec![
                    default_surface_resolution().0,
                    default_surface_resolution().1,
                ],
            )?
            .set_default("surface.rotation", default_surface_rotation())?
            .add_source(File::with_name(&path_str).required(false))
            .add_source(
                Environment::with_prefix("DEMOCAM")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let config: DemocamConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Render this configuration as a TOML document
    pub fn to_toml(&self) -> crate::error::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.capture_timeout_seconds == 0 {
            return Err(ConfigError::Message(
                "Camera capture_timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.camera.simulated_resolution.0 == 0 || self.camera.simulated_resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Camera simulated_resolution must be greater than 0".to_string(),
            ));
        }

        if self.storage.root.trim().is_empty() {
            return Err(ConfigError::Message(
                "Storage root must not be empty".to_string(),
            ));
        }

        if self.storage.folder.is_empty()
            || self.storage.folder.contains('/')
            || self.storage.folder.contains('\\')
        {
            return Err(ConfigError::Message(format!(
                "Storage folder must be a single path component, got '{}'",
                self.storage.folder
            )));
        }

        if self.storage.file_suffix.is_empty() || self.storage.file_suffix.contains('/') {
            return Err(ConfigError::Message(
                "Storage file_suffix must be a non-empty file name suffix".to_string(),
            ));
        }

        if self.surface.resolution.0 == 0 || self.surface.resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Surface resolution must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for DemocamConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                lens_facing: default_lens_facing(),
                capture_mode: default_capture_mode(),
                capture_timeout_seconds: default_capture_timeout(),
                device: None,
                simulated_resolution: default_simulated_resolution(),
            },
            storage: StorageConfig {
                root: default_storage_root(),
                folder: default_storage_folder(),
                file_suffix: default_file_suffix(),
            },
            surface: SurfaceConfig {
                resolution: default_surface_resolution(),
                rotation: default_surface_rotation(),
            },
        }
    }
}

// Default value functions
fn default_lens_facing() -> LensFacing {
    LensFacing::Back
}
fn default_capture_mode() -> CaptureMode {
    CaptureMode::MinLatency
}
fn default_capture_timeout() -> u64 {
    30
}
fn default_simulated_resolution() -> (u32, u32) {
    (1280, 720)
}

fn default_storage_root() -> String {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .to_string_lossy()
        .to_string()
}
fn default_storage_folder() -> String {
    "Demo".to_string()
}
fn default_file_suffix() -> String {
    "Image.jpg".to_string()
}

fn default_surface_resolution() -> (u32, u32) {
    (1280, 720)
}
fn default_surface_rotation() -> i32 {
    0
}
