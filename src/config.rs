//! Persisted user settings (lives in the OS config directory).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::TimelineScale;
use crate::store::Scope;

pub const ENV_API_URL: &str = "GANTT_API_URL";
pub const ENV_PROJECT_ID: &str = "GANTT_PROJECT_ID";
pub const ENV_SCHEDULE_ID: &str = "GANTT_SCHEDULE_ID";

/// Where schedule data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Built-in sample project, nothing is written to disk.
    Demo,
    /// A folder of JSON documents.
    Files,
    /// The schedule REST API.
    Rest,
}

impl Backend {
    pub fn label(self) -> &'static str {
        match self {
            Backend::Demo => "Demo data",
            Backend::Files => "Data folder",
            Backend::Rest => "REST API",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub backend: Backend,
    pub api_base_url: String,
    pub data_dir: Option<PathBuf>,
    pub project_id: i64,
    pub schedule_id: Option<i64>,
    pub scale: TimelineScale,
    pub zoom: f32,
    pub show_baseline: bool,
    pub show_dependencies: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            backend: Backend::Demo,
            api_base_url: "http://localhost:3000/api".into(),
            data_dir: None,
            project_id: 1,
            schedule_id: Some(2),
            scale: TimelineScale::Weeks,
            zoom: 1.0,
            show_baseline: true,
            show_dependencies: true,
        }
    }
}

impl AppSettings {
    /// Settings from the config dir with environment overrides applied.
    pub fn load() -> Self {
        let settings = settings_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default();
        settings.with_overrides(|key| std::env::var(key).ok())
    }

    /// Read a settings file. Missing or unreadable files give the defaults.
    pub fn load_from(path: &Path) -> Self {
        let Ok(json) = std::fs::read_to_string(path) else {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Self::default();
        };
        serde_json::from_str(&json).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "ignoring unreadable settings");
            Self::default()
        })
    }

    pub fn save(&self) -> Result<(), String> {
        let path = settings_path().ok_or("No config directory available")?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialise settings: {}", e))?;
        std::fs::write(path, json).map_err(|e| format!("Failed to write settings: {}", e))
    }

    /// Apply `GANTT_*` overrides looked up through `var`. Setting the API
    /// URL also switches the backend to REST.
    pub fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = var(ENV_API_URL).filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
            self.backend = Backend::Rest;
        }
        if let Some(id) = var(ENV_PROJECT_ID).and_then(|v| v.trim().parse().ok()) {
            self.project_id = id;
        }
        if let Some(raw) = var(ENV_SCHEDULE_ID) {
            match raw.trim() {
                "" | "none" => self.schedule_id = None,
                id => {
                    if let Ok(id) = id.parse() {
                        self.schedule_id = Some(id);
                    }
                }
            }
        }
        self
    }

    pub fn scope(&self) -> Scope {
        Scope::new(self.project_id, self.schedule_id)
    }
}

fn settings_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "ScheduleGantt")
        .map(|dirs| dirs.config_dir().join("settings.json"))
}
