use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use headcount_core::capture::domain::capture_request::{default_camera_device, CaptureRequest};
use headcount_core::detection::infrastructure::onnx_yolo_detector::DEFAULT_CONFIDENCE;
use headcount_core::shared::constants::{
    COUNT_LOG_FILE, DEFAULT_DETECTION_INTERVAL, DEFAULT_WEBCAM_HEIGHT, DEFAULT_WEBCAM_WIDTH,
    PERSON_CLASS_ID,
};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write settings {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("{0}")]
    Invalid(String),
}

/// Persisted run configuration. Command-line flags override these values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub camera: String,
    pub width: u32,
    pub height: u32,
    pub framerate: Option<u32>,
    pub interval_secs: f64,
    pub output: PathBuf,
    pub confidence: f32,
    pub person_class: usize,
    pub preview: bool,
    pub model: Option<PathBuf>,
    pub model_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            camera: default_camera_device().to_string(),
            width: DEFAULT_WEBCAM_WIDTH,
            height: DEFAULT_WEBCAM_HEIGHT,
            framerate: None,
            interval_secs: DEFAULT_DETECTION_INTERVAL.as_secs_f64(),
            output: PathBuf::from(COUNT_LOG_FILE),
            confidence: DEFAULT_CONFIDENCE,
            person_class: PERSON_CLASS_ID,
            preview: true,
            model: None,
            model_url: None,
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("Headcount").join("settings.json"))
    }

    /// Loads settings from `explicit`, or from the platform config file.
    ///
    /// An explicit file must parse. The implicit one falls back to defaults
    /// with a warning, so a stale config never blocks a run.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        let Some(path) = Self::config_path() else {
            return Ok(Self::default());
        };
        Self::load_from(&path).or_else(|e| {
            log::warn!("{e}; using defaults");
            Ok(Self::default())
        })
    }

    /// Reads a settings file; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(SettingsError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes the settings to `explicit` or the platform config file.
    pub fn save(&self, explicit: Option<&Path>) -> Result<PathBuf, SettingsError> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => Self::config_path().ok_or(SettingsError::NoConfigDir)?,
        };
        let write_err = |source| SettingsError::Write {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| SettingsError::Parse {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(write_err)?;
        Ok(path)
    }

    pub fn capture_request(&self) -> CaptureRequest {
        let request = CaptureRequest::new(self.camera.clone(), self.width, self.height);
        match self.framerate {
            Some(fps) => request.with_framerate(fps),
            None => request,
        }
    }

    pub fn interval(&self) -> Result<Duration, SettingsError> {
        Duration::try_from_secs_f64(self.interval_secs).map_err(|_| {
            SettingsError::Invalid(format!(
                "Interval must be a non-negative number of seconds, got {}",
                self.interval_secs
            ))
        })
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.width == 0 || self.height == 0 {
            return Err(SettingsError::Invalid(format!(
                "Webcam resolution must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        self.interval()?;
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(SettingsError::Invalid(format!(
                "Confidence must be between 0.0 and 1.0, got {}",
                self.confidence
            )));
        }
        if self.camera.is_empty() {
            return Err(SettingsError::Invalid(
                "Camera device must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
