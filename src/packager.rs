/*
 * Copyright 2022 Collabora, Ltd.
 *
 * SPDX-License-Identifier: MIT
 */
//! The boundary to the external application packager.
//!
//! The packager owns dependency installation and installer generation. We
//! hand it a configuration and a set of targets, and it calls back into
//! [`BuildHooks`] around each target it builds.
use std::error::Error as StdError;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use log::{debug, trace};
use serde_json::Value;
use thiserror::Error;

use crate::command::{command_from_line, command_line_from_env, run_command, CommandError};
use crate::env::Env;
use crate::metadata::{self, MetadataError};
use crate::settings::BuilderOptions;
use crate::target::{Platform, Target, TargetArch};

/// Selects the packager program, split shell-style.
pub const PACKAGER_VAR: &str = "DESKTOP_INSTALLER_PACKAGER";
pub const DEFAULT_PACKAGER: &str = "electron-builder";
const HEADERS_URL: &str = "https://electronjs.org/headers";

pub type HookError = Box<dyn StdError + Send + Sync>;

#[derive(Debug, Error)]
pub enum PackagerError {
    #[error("IO error while packaging at {}: {}", .0.to_string_lossy(), .1)]
    Io(PathBuf, std::io::Error),
    #[error("unable to write packager configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unable to read project metadata: {0}")]
    Metadata(#[from] MetadataError),
    #[error("packager command failed: {0}")]
    Command(#[from] CommandError),
    #[error("lifecycle hook failed: {0}")]
    Hook(#[source] HookError),
}

pub type PackagerResult<T> = Result<T, PackagerError>;

/// Whether the packager should install the app's dependencies itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DependencyAction {
    Install,
    Skip,
}

#[derive(Clone, Debug)]
pub struct BeforeBuildContext<'a> {
    pub platform: Platform,
    pub arch: TargetArch,
    pub app_dir: &'a Path,
    pub output_dir: &'a Path,
}

#[derive(Clone, Debug)]
pub struct AfterPackContext<'a> {
    pub platform: Platform,
    pub arch: TargetArch,
    pub output_dir: &'a Path,
}

/// Lifecycle points the packager calls for every target it builds. Each
/// call completes before the packager moves on.
pub trait BuildHooks {
    fn before_build(&mut self, ctx: &BeforeBuildContext<'_>) -> Result<DependencyAction, HookError>;
    fn after_pack(&mut self, ctx: &AfterPackContext<'_>) -> Result<(), HookError>;
}

/// Everything one packager run needs.
#[derive(Clone, Debug)]
pub struct BuildRequest {
    pub targets: Vec<Target>,
    pub app_dir: PathBuf,
    pub output_dir: PathBuf,
    pub config: BuilderOptions,
}

pub trait Packager {
    /// The desktop runtime version the project declares.
    fn runtime_version(&self, package_json: &Path) -> PackagerResult<String> {
        let package = metadata::read_package_json(package_json)?;
        Ok(metadata::runtime_version(&package)?)
    }

    /// Install, or rebuild native modules of, the app's dependencies for `arch`.
    ///
    /// With `force_install` the dependencies are installed from scratch even
    /// when present; otherwise what is present is rebuilt. Building native
    /// modules from source is governed by `buildDependenciesFromSource` in
    /// `options`, never by this flag.
    fn install_or_rebuild(
        &self,
        options: &BuilderOptions,
        app_dir: &Path,
        runtime_version: &str,
        arch: TargetArch,
        force_install: bool,
    ) -> PackagerResult<()>;

    fn build(&self, request: &BuildRequest, hooks: &mut dyn BuildHooks) -> PackagerResult<()>;
}

/// Drives the packager through its command line interface, one invocation
/// per platform and architecture.
#[derive(Clone, Debug)]
pub struct CommandPackager {
    command: String,
    node_env: &'static str,
    log_file: PathBuf,
}

impl CommandPackager {
    /// Use the packager named by `DESKTOP_INSTALLER_PACKAGER`, or the default.
    pub fn new(env: &Env) -> Self {
        Self::with_command(env, command_line_from_env(PACKAGER_VAR, DEFAULT_PACKAGER))
    }

    pub fn with_command<C: Into<String>>(env: &Env, command: C) -> Self {
        Self {
            command: command.into(),
            node_env: env.node_env(),
            log_file: env.paths.installer_dir.join("packager.log"),
        }
    }

    fn log(&self) -> PackagerResult<File> {
        if let Some(parent) = self.log_file.parent() {
            fs::create_dir_all(parent).map_err(|e| PackagerError::Io(parent.to_path_buf(), e))?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)
            .map_err(|e| PackagerError::Io(self.log_file.clone(), e))
    }

    fn write_config(
        &self,
        request: &BuildRequest,
        platform: Platform,
        arch: TargetArch,
        action: DependencyAction,
    ) -> PackagerResult<PathBuf> {
        let mut config = request.config.clone();
        if action == DependencyAction::Skip {
            config.insert("npmRebuild".to_string(), Value::Bool(false));
        }
        let mut directories = serde_json::Map::new();
        directories.insert(
            "app".to_string(),
            Value::String(request.app_dir.to_string_lossy().to_string()),
        );
        directories.insert(
            "output".to_string(),
            Value::String(request.output_dir.to_string_lossy().to_string()),
        );
        config.insert("directories".to_string(), Value::Object(directories));

        let path = request
            .output_dir
            .join(format!("builder-{}-{}.yaml", platform, arch));
        let file = File::create(&path).map_err(|e| PackagerError::Io(path.clone(), e))?;
        serde_yaml::to_writer(file, &config)?;
        Ok(path)
    }
}

impl Packager for CommandPackager {
    fn install_or_rebuild(
        &self,
        options: &BuilderOptions,
        app_dir: &Path,
        runtime_version: &str,
        arch: TargetArch,
        force_install: bool,
    ) -> PackagerResult<()> {
        let from_source = options
            .get("buildDependenciesFromSource")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if force_install {
            let node_modules = app_dir.join("node_modules");
            if node_modules.exists() {
                debug!("removing {:?} for a fresh install", node_modules);
                fs::remove_dir_all(&node_modules)
                    .map_err(|e| PackagerError::Io(node_modules.clone(), e))?;
            }
        }
        debug!(
            "installing dependencies in {:?} for runtime {} on {}",
            app_dir, runtime_version, arch
        );

        let mut cmd = command_from_line(&self.command)?;
        cmd.arg("install-app-deps")
            .arg(format!("--arch={}", arch))
            .current_dir(app_dir)
            .env("NODE_ENV", self.node_env)
            .env("npm_config_runtime", "electron")
            .env("npm_config_target", runtime_version)
            .env("npm_config_arch", arch.as_str())
            .env("npm_config_target_arch", arch.as_str())
            .env("npm_config_disturl", HEADERS_URL)
            .env("npm_config_build_from_source", from_source.to_string());

        run_command(&mut cmd, self.log()?)?;
        Ok(())
    }

    fn build(&self, request: &BuildRequest, hooks: &mut dyn BuildHooks) -> PackagerResult<()> {
        fs::create_dir_all(&request.output_dir)
            .map_err(|e| PackagerError::Io(request.output_dir.clone(), e))?;

        for target in request.targets.iter() {
            for &arch in target.archs.iter() {
                let action = hooks
                    .before_build(&BeforeBuildContext {
                        platform: target.platform,
                        arch,
                        app_dir: &request.app_dir,
                        output_dir: &request.output_dir,
                    })
                    .map_err(PackagerError::Hook)?;

                let config = self.write_config(request, target.platform, arch, action)?;
                trace!("packager configuration written to {:?}", config);

                let mut cmd = command_from_line(&self.command)?;
                cmd.arg("--config")
                    .arg(&config)
                    .arg("--projectDir")
                    .arg(&request.app_dir)
                    .arg(target.platform.cli_flag())
                    .arg(format!("--{}", arch))
                    .env("NODE_ENV", self.node_env);
                run_command(&mut cmd, self.log()?)?;

                hooks
                    .after_pack(&AfterPackContext {
                        platform: target.platform,
                        arch,
                        output_dir: &request.output_dir,
                    })
                    .map_err(PackagerError::Hook)?;
            }
        }
        Ok(())
    }
}
