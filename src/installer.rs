/*
 * Copyright 2022 Collabora, Ltd.
 *
 * SPDX-License-Identifier: MIT
 */
//! Produces installers by running the packager over the native-app build.
//!
//! The app's dependencies already live inside the packed archives, so the
//! `node_modules` directory is parked outside the build directory while the
//! packager works and put back once it has packed each target. The first
//! target reuses the existing build; every later target gets its dependencies
//! rebuilt for its own architecture and its archives repacked.
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, error, warn};
use serde_json::Value;
use thiserror::Error;

use crate::env::Env;
use crate::packager::{
    AfterPackContext, BeforeBuildContext, BuildHooks, BuildRequest, DependencyAction, HookError,
    Packager, PackagerError,
};
use crate::settings::{BuilderOptions, Settings};
use crate::stage::{StageError, Stager};
use crate::target::{create_targets, resolve_arch, resolve_platforms, TargetArch};

#[derive(Debug, Error)]
pub enum InstallerError {
    #[error("no builderOptions in settings.json, aborting")]
    MissingBuilderOptions,
    #[error("unable to move {} to {}: {}", .0.to_string_lossy(), .1.to_string_lossy(), .2)]
    Relocate(PathBuf, PathBuf, std::io::Error),
    #[error(transparent)]
    Packager(#[from] PackagerError),
    #[error("unable to stage application: {0}")]
    Stage(#[from] StageError),
}

type InstallerResult<T> = Result<T, InstallerError>;

/// Which packager pass the next lifecycle call belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pass {
    /// Nothing has been packed yet; the existing build is used as is.
    First,
    /// At least one target was packed; the build must be refreshed.
    Subsequent,
}

/// Move a directory, replacing whatever sits at the destination.
fn relocate(from: &Path, to: &Path) -> InstallerResult<()> {
    if !from.exists() {
        warn!("nothing to move at {}", from.to_string_lossy());
        return Ok(());
    }
    if let Ok(meta) = fs::symlink_metadata(to) {
        warn!("removing stale {}", to.to_string_lossy());
        let removed = if meta.is_dir() {
            fs::remove_dir_all(to)
        } else {
            fs::remove_file(to)
        };
        removed.map_err(|e| InstallerError::Relocate(from.into(), to.into(), e))?;
    }
    fs::rename(from, to).map_err(|e| InstallerError::Relocate(from.into(), to.into(), e))
}

fn install_or_rebuild<P: Packager>(
    env: &Env,
    settings: &Settings,
    packager: &P,
    arch: TargetArch,
) -> InstallerResult<()> {
    debug!("calling install_or_rebuild for arch {}", arch);
    let version = packager.runtime_version(&env.paths.project.package_json)?;
    let options = settings.builder_options.clone().unwrap_or_default();
    packager.install_or_rebuild(&options, &env.paths.build.root, &version, arch, false)?;
    Ok(())
}

struct PassHooks<'a, P, S> {
    env: &'a Env,
    settings: &'a Settings,
    packager: &'a P,
    stager: &'a S,
    pass: &'a mut Pass,
}

impl<'a, P: Packager, S: Stager> PassHooks<'a, P, S> {
    fn park_node_modules(&self) -> InstallerResult<()> {
        debug!("moving node_modules out, because we have them already in the archives");
        relocate(
            &self.env.paths.build.node_modules,
            &self.env.paths.build.tmp_node_modules,
        )
    }

    fn refresh_build(&self, arch: TargetArch) -> InstallerResult<()> {
        let build = &self.env.paths.build;
        install_or_rebuild(self.env, self.settings, self.packager, arch)?;
        self.stager.create_app_root()?;
        self.stager.copy_skeleton_app()?;
        self.stager
            .pack_archives(&[build.meteor_asar.clone(), build.desktop_asar.clone()])?;
        Ok(())
    }
}

impl<'a, P: Packager, S: Stager> BuildHooks for PassHooks<'a, P, S> {
    fn before_build(&mut self, ctx: &BeforeBuildContext<'_>) -> Result<DependencyAction, HookError> {
        if *self.pass == Pass::Subsequent {
            debug!("rebuilding for {} {} on consecutive pass", ctx.platform, ctx.arch);
            self.refresh_build(ctx.arch)?;
        }
        self.park_node_modules()?;
        Ok(DependencyAction::Skip)
    }

    fn after_pack(&mut self, _ctx: &AfterPackContext<'_>) -> Result<(), HookError> {
        *self.pass = Pass::Subsequent;
        debug!("moving node_modules back");
        relocate(
            &self.env.paths.build.tmp_node_modules,
            &self.env.paths.build.node_modules,
        )?;
        Ok(())
    }
}

/// Wraps the packager to turn the native-app build into installers
pub struct InstallerBuilder<'a, P, S> {
    env: &'a Env,
    settings: &'a Settings,
    packager: P,
    stager: S,
    pass: Pass,
}

impl<'a, P: Packager, S: Stager> InstallerBuilder<'a, P, S> {
    pub fn new(env: &'a Env, settings: &'a Settings, packager: P, stager: S) -> Self {
        Self::with_pass(env, settings, packager, stager, Pass::First)
    }

    /// Start from a known pass, e.g. to resume after an earlier build.
    pub fn with_pass(
        env: &'a Env,
        settings: &'a Settings,
        packager: P,
        stager: S,
        pass: Pass,
    ) -> Self {
        Self {
            env,
            settings,
            packager,
            stager,
            pass,
        }
    }

    pub fn pass(&self) -> Pass {
        self.pass
    }

    /// Reinstall the app's dependencies for `arch`.
    pub fn install_or_rebuild(&self, arch: TargetArch) -> InstallerResult<()> {
        install_or_rebuild(self.env, self.settings, &self.packager, arch)
    }

    /// The packager configuration: the project's builder options with
    /// archive packing left to us and dependency rebuilding forced on.
    fn builder_options(&self) -> InstallerResult<BuilderOptions> {
        let mut options = match self.settings.builder_options {
            Some(ref options) => options.clone(),
            None => {
                error!("no builderOptions in settings.json, aborting");
                return Err(InstallerError::MissingBuilderOptions);
            }
        };
        options.insert("asar".to_string(), Value::Bool(false));
        options.insert("npmRebuild".to_string(), Value::Bool(true));
        Ok(options)
    }

    /// Build installers for the requested platforms.
    ///
    /// Only missing builder options are reported as an error; a failing
    /// packager run is logged and otherwise ignored.
    pub fn build(&mut self) -> InstallerResult<()> {
        let config = self.builder_options()?;

        let arch = resolve_arch(&self.env.options);
        let platforms = resolve_platforms(&self.env.options, &self.env.os);
        let request = BuildRequest {
            targets: create_targets(&platforms, arch),
            app_dir: self.env.paths.build.root.clone(),
            output_dir: self.env.paths.installer_dir.clone(),
            config,
        };
        debug!("building installers for {:?} ({})", platforms, arch);

        let mut hooks = PassHooks {
            env: self.env,
            settings: self.settings,
            packager: &self.packager,
            stager: &self.stager,
            pass: &mut self.pass,
        };
        if let Err(e) = self.packager.build(&request, &mut hooks) {
            error!("error while building installer: {}", e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{BuildOptions, HostOs};
    use crate::target::Platform;
    use tempdir::TempDir;

    struct NoPackager;

    impl Packager for NoPackager {
        fn install_or_rebuild(
            &self,
            _options: &BuilderOptions,
            _app_dir: &Path,
            _runtime_version: &str,
            _arch: TargetArch,
            _force_install: bool,
        ) -> Result<(), PackagerError> {
            Ok(())
        }

        fn build(&self, _request: &BuildRequest, _hooks: &mut dyn BuildHooks) -> Result<(), PackagerError> {
            Ok(())
        }
    }

    struct NoStager;

    impl Stager for NoStager {
        fn create_app_root(&self) -> Result<(), StageError> {
            Ok(())
        }

        fn copy_skeleton_app(&self) -> Result<(), StageError> {
            Ok(())
        }

        fn pack_archives(&self, _keep: &[PathBuf]) -> Result<(), StageError> {
            Ok(())
        }
    }

    #[test]
    fn failed_move_back_still_ends_the_first_pass() {
        let dir = TempDir::new("installer").unwrap();
        let env = Env::with_host(
            dir.path().join("tool"),
            dir.path().join("project"),
            BuildOptions::default(),
            HostOs::from_name("linux"),
        );
        // the build root is missing, so node_modules cannot be moved back
        fs::create_dir_all(&env.paths.build.tmp_node_modules).unwrap();
        let settings = Settings::default();
        let mut pass = Pass::First;
        let mut hooks = PassHooks {
            env: &env,
            settings: &settings,
            packager: &NoPackager,
            stager: &NoStager,
            pass: &mut pass,
        };

        let result = hooks.after_pack(&AfterPackContext {
            platform: Platform::Linux,
            arch: TargetArch::X64,
            output_dir: dir.path(),
        });

        assert!(result.is_err());
        assert_eq!(pass, Pass::Subsequent);
    }

    #[test]
    fn relocate_moves_directory() {
        let dir = TempDir::new("relocate").unwrap();
        let from = dir.path().join("node_modules");
        let to = dir.path().join(".tmp_node_modules");
        fs::create_dir_all(from.join("left-pad")).unwrap();

        relocate(&from, &to).unwrap();
        assert!(!from.exists());
        assert!(to.join("left-pad").is_dir());
    }

    #[test]
    fn relocate_replaces_stale_destination() {
        let dir = TempDir::new("relocate").unwrap();
        let from = dir.path().join("a");
        let to = dir.path().join("b");
        fs::create_dir_all(from.join("fresh")).unwrap();
        fs::create_dir_all(to.join("stale")).unwrap();

        relocate(&from, &to).unwrap();
        assert!(to.join("fresh").is_dir());
        assert!(!to.join("stale").exists());
    }

    #[test]
    fn relocate_missing_source_is_not_an_error() {
        let dir = TempDir::new("relocate").unwrap();
        relocate(&dir.path().join("absent"), &dir.path().join("b")).unwrap();
        assert!(!dir.path().join("b").exists());
    }
}
