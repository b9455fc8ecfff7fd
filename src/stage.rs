/*
 * Copyright 2022 Collabora, Ltd.
 *
 * SPDX-License-Identifier: MIT
 */
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use log::{trace, warn};
use thiserror::Error;

use crate::command::{command_from_line, command_line_from_env, run_command, CommandError};
use crate::env::Env;
use crate::paths::BuildPaths;

/// Selects the archive tool, split shell-style.
pub const ASAR_VAR: &str = "DESKTOP_INSTALLER_ASAR";
pub const DEFAULT_ASAR: &str = "asar";

#[derive(Debug, Error)]
pub enum StageError {
    #[error("IO error while staging {}: {}", .0.to_string_lossy(), .1)]
    Io(PathBuf, std::io::Error),
    #[error("unable to pack archive: {0}")]
    Command(#[from] CommandError),
}

type StageResult<T> = Result<T, StageError>;

/// Prepares the application directory the packager consumes.
pub trait Stager {
    /// Recreate an empty application root.
    fn create_app_root(&self) -> StageResult<()>;
    /// Copy the tool's skeleton application into the application root.
    fn copy_skeleton_app(&self) -> StageResult<()>;
    /// Pack the application root into its archive, then clear the build
    /// directory of everything but the archive, dependencies, package
    /// metadata and `keep`.
    fn pack_archives(&self, keep: &[PathBuf]) -> StageResult<()>;
}

/// A file waiting to be copied, relative to its destination root
#[derive(Clone, Debug)]
struct StagedFile {
    location: PathBuf,
    name: PathBuf,
}

fn process_dir<P, Q>(path: P, entry_name: Q, files: &mut Vec<StagedFile>) -> StageResult<()>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    trace!(
        "processing dir {:?} under entry {:?}",
        path.as_ref(),
        entry_name.as_ref()
    );
    for entry in path
        .as_ref()
        .read_dir()
        .map_err(|e| StageError::Io(path.as_ref().to_path_buf(), e))?
    {
        match entry {
            Ok(entry) => {
                if let Some(relpath) = pathdiff::diff_paths(entry.path(), &path) {
                    let kind = entry
                        .metadata()
                        .map_err(|e| StageError::Io(entry.path(), e))?
                        .file_type();
                    let name = entry_name.as_ref().join(relpath);
                    if kind.is_file() {
                        files.push(StagedFile {
                            location: entry.path(),
                            name,
                        });
                    } else if kind.is_dir() {
                        process_dir(entry.path(), name, files)?;
                    } else {
                        warn!("skipped entry: only files and directories are supported");
                    }
                } else {
                    warn!("skipped entry: not a valid path");
                }
            }
            Err(e) => {
                warn!("skipped entry: {}", e);
            }
        }
    }
    Ok(())
}

fn remove_path(path: &Path) -> StageResult<()> {
    let meta = fs::symlink_metadata(path).map_err(|e| StageError::Io(path.to_path_buf(), e))?;
    let removed = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    removed.map_err(|e| StageError::Io(path.to_path_buf(), e))
}

/// Stages from the tool's skeleton directory and packs with the archive CLI.
#[derive(Clone, Debug)]
pub struct ScaffoldStager {
    command: String,
    skeleton: PathBuf,
    build: BuildPaths,
    log_file: PathBuf,
}

impl ScaffoldStager {
    /// Use the archive tool named by `DESKTOP_INSTALLER_ASAR`, or the default.
    pub fn new(env: &Env) -> Self {
        Self::with_command(env, command_line_from_env(ASAR_VAR, DEFAULT_ASAR))
    }

    pub fn with_command<C: Into<String>>(env: &Env, command: C) -> Self {
        Self {
            command: command.into(),
            skeleton: env.paths.tool.skeleton.clone(),
            build: env.paths.build.clone(),
            log_file: env.paths.installer_dir.join("stage.log"),
        }
    }

    fn log(&self) -> StageResult<File> {
        if let Some(parent) = self.log_file.parent() {
            fs::create_dir_all(parent).map_err(|e| StageError::Io(parent.to_path_buf(), e))?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)
            .map_err(|e| StageError::Io(self.log_file.clone(), e))
    }

    fn prune(&self, keep: &[PathBuf]) -> StageResult<()> {
        let root = &self.build.root;
        let kept = [
            &self.build.node_modules,
            &self.build.package_json,
            &self.build.app_asar,
        ];
        for entry in root
            .read_dir()
            .map_err(|e| StageError::Io(root.to_path_buf(), e))?
        {
            let path = entry.map_err(|e| StageError::Io(root.to_path_buf(), e))?.path();
            if kept.iter().any(|k| **k == path) || keep.contains(&path) {
                continue;
            }
            trace!("removing {:?}", path);
            remove_path(&path)?;
        }
        Ok(())
    }
}

impl Stager for ScaffoldStager {
    fn create_app_root(&self) -> StageResult<()> {
        let app_root = &self.build.app_root;
        if app_root.exists() {
            remove_path(app_root)?;
        }
        fs::create_dir_all(app_root).map_err(|e| StageError::Io(app_root.clone(), e))
    }

    fn copy_skeleton_app(&self) -> StageResult<()> {
        let mut files = Vec::new();
        process_dir(&self.skeleton, "", &mut files)?;

        for file in files {
            let dest = self.build.app_root.join(&file.name);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|e| StageError::Io(parent.to_path_buf(), e))?;
            }
            fs::copy(&file.location, &dest).map_err(|e| StageError::Io(file.location, e))?;
        }
        Ok(())
    }

    fn pack_archives(&self, keep: &[PathBuf]) -> StageResult<()> {
        let mut cmd = command_from_line(&self.command)?;
        cmd.arg("pack").arg(&self.build.app_root).arg(&self.build.app_asar);
        run_command(&mut cmd, self.log()?)?;

        self.prune(keep)
    }
}
