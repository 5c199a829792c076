use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DemocamError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Permission error: {0}")]
    Permission(#[from] PermissionError),

    #[error("System error: {message}")]
    System { message: String },
}

/// Errors raised while configuring or driving camera use cases
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to bind use cases: {details}")]
    Bind { details: String },

    #[error("Preview surface has not been measured yet ({width}x{height})")]
    UnmeasuredSurface { width: u32, height: u32 },

    #[error("No image capture use case is bound")]
    NotBound,

    #[error("Unknown use case {id}")]
    UnknownUseCase { id: String },

    #[error("A capture is already in flight for {}", path.display())]
    CaptureInFlight { path: PathBuf },

    #[error("Flash reconfiguration failed: {details}")]
    Flash { details: String },
}

/// Errors raised while preparing capture destinations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create file {}: {source}", path.display())]
    FileCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum PermissionError {
    #[error("Permissions not granted: {}", missing.join(", "))]
    Denied { missing: Vec<String> },
}

impl DemocamError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DemocamError>;
