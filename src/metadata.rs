/*
 * Copyright 2022 Collabora, Ltd.
 *
 * SPDX-License-Identifier: MIT
 */
//! Reads the project's `package.json`.
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use log::trace;
use serde::Deserialize;
use thiserror::Error;

/// Dependency names that pin the desktop runtime, in lookup order.
const RUNTIME_PACKAGES: [&str; 3] = ["electron", "electron-prebuilt", "electron-prebuilt-compile"];

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("IO error opening {}: {}", .0.to_string_lossy(), .1)]
    Io(PathBuf, std::io::Error),
    #[error("JSON parse error in package metadata: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no desktop runtime version declared in package metadata")]
    NoRuntimeVersion,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildMetadata {
    pub electron_version: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageJson {
    pub name: Option<String>,
    pub version: Option<String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, String>,
    pub build: Option<BuildMetadata>,
}

pub fn read_package_json<P: AsRef<Path>>(path: P) -> Result<PackageJson, MetadataError> {
    let file =
        File::open(path.as_ref()).map_err(|e| MetadataError::Io(path.as_ref().into(), e))?;
    Ok(serde_json::from_reader(file)?)
}

/// The desktop runtime version the project asks for.
pub fn runtime_version(package: &PackageJson) -> Result<String, MetadataError> {
    if let Some(version) = package
        .build
        .as_ref()
        .and_then(|b| b.electron_version.as_ref())
    {
        return Ok(version.clone());
    }

    for deps in [&package.dependencies, &package.dev_dependencies].iter() {
        for name in RUNTIME_PACKAGES.iter() {
            if let Some(range) = deps.get(*name) {
                trace!("runtime version taken from {} = {}", name, range);
                return Ok(range.trim_start_matches(|c: char| "^~=v".contains(c)).to_string());
            }
        }
    }

    Err(MetadataError::NoRuntimeVersion)
}
