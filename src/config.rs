use crate::calendar::{Calendar, WorkCalendar};
use crate::column::Column;
use crate::magnet::Magnet;
use crate::model::{ColumnError, FrameMode};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub column: ColumnSettings,
    pub magnet: Magnet,
    pub calendar: WorkCalendar,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            column: ColumnSettings::default(),
            magnet: Magnet::NONE,
            calendar: WorkCalendar::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ColumnSettings {
    pub left: f64,
    pub width: f64,
    pub working_mode: FrameMode,
    pub non_working_mode: FrameMode,
}

impl Default for ColumnSettings {
    fn default() -> Self {
        ColumnSettings {
            left: 0.0,
            width: 100.0,
            working_mode: FrameMode::Hidden,
            non_working_mode: FrameMode::Visible,
        }
    }
}

impl Config {
    pub fn build_column(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Column, ColumnError> {
        let calendar: Arc<dyn Calendar> = Arc::new(self.calendar.clone());
        Column::new(
            start,
            end,
            self.column.left,
            self.column.width,
            Some(calendar),
            self.column.working_mode,
            self.column.non_working_mode,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigScope {
    Explicit,
    Project,
    Global,
    Builtin,
}

impl ConfigScope {
    pub fn label(&self) -> &'static str {
        match self {
            ConfigScope::Explicit => "explicit",
            ConfigScope::Project => "project",
            ConfigScope::Global => "global",
            ConfigScope::Builtin => "built-in",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLocation {
    pub path: Option<PathBuf>,
    pub scope: ConfigScope,
}

impl ConfigLocation {
    pub fn describe(&self) -> String {
        match &self.path {
            Some(path) => format!("{} ({})", path.display(), self.scope.label()),
            None => self.scope.label().to_string(),
        }
    }
}

pub fn locate_config(explicit: Option<&Path>, start: &Path) -> ConfigLocation {
    if let Some(path) = explicit {
        return ConfigLocation {
            path: Some(path.to_path_buf()),
            scope: ConfigScope::Explicit,
        };
    }
    if let Some(project_path) = find_project_config(start) {
        return ConfigLocation {
            path: Some(project_path),
            scope: ConfigScope::Project,
        };
    }
    match global_config_path() {
        Some(global_path) if global_path.exists() => ConfigLocation {
            path: Some(global_path),
            scope: ConfigScope::Global,
        },
        _ => ConfigLocation {
            path: None,
            scope: ConfigScope::Builtin,
        },
    }
}

pub fn load_config(location: &ConfigLocation) -> Result<Config> {
    let Some(path) = &location.path else {
        return Ok(Config::default());
    };
    let data = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    parse_config(&data).with_context(|| format!("parsing config {:?}", path))
}

pub fn parse_config(data: &str) -> Result<Config> {
    if data.trim().is_empty() {
        return Ok(Config::default());
    }
    let config: Config = serde_yaml::from_str(data)?;
    Ok(config)
}

fn find_project_config(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(".ganttcol/config.yml");
        if candidate.exists() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}

fn global_config_path() -> Option<PathBuf> {
    let dirs = ProjectDirs::from("", "", "ganttcol")?;
    Some(dirs.config_dir().join("config.yml"))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
