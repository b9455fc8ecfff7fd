/*
 * Copyright 2022 Collabora, Ltd.
 *
 * SPDX-License-Identifier: MIT
 */
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error opening settings {}: {}", .0.to_string_lossy(), .1)]
    Io(PathBuf, std::io::Error),
    #[error("JSON parse error in settings: {0}")]
    Json(#[from] serde_json::Error),
}

/// Options handed through to the packager untouched, apart from the flags
/// the installer forces.
pub type BuilderOptions = Map<String, Value>;

/// The project's `.desktop/settings.json`
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub name: Option<String>,
    pub version: Option<String>,
    pub builder_options: Option<BuilderOptions>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Settings {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Settings, SettingsError> {
        let file =
            File::open(path.as_ref()).map_err(|e| SettingsError::Io(path.as_ref().into(), e))?;
        Ok(serde_json::from_reader(file)?)
    }
}
