/*
 * Copyright 2022 Collabora, Ltd.
 *
 * SPDX-License-Identifier: MIT
 */
use std::env;
use std::path::{Path, PathBuf};

use log::trace;
use structopt::StructOpt;

use crate::paths::Paths;

/// Overrides where the tool's skeleton and scaffold files are looked up.
pub const TOOL_HOME_VAR: &str = "DESKTOP_INSTALLER_HOME";

/// Options controlling a single build, as given on the command line
#[derive(Clone, Debug, StructOpt)]
pub struct BuildOptions {
    #[structopt(long, help = "Build for 32-bit x86.")]
    pub ia32: bool,
    #[structopt(
        long = "all-archs",
        help = "Build for every supported architecture; overrides --ia32."
    )]
    pub all_archs: bool,
    #[structopt(long, help = "Produce a Windows installer.")]
    pub win: bool,
    #[structopt(long, help = "Produce a Linux installer.")]
    pub linux: bool,
    #[structopt(long, help = "Produce a macOS installer.")]
    pub mac: bool,
    #[structopt(long, short = "b", help = "Build in production mode.")]
    pub production: bool,
    #[structopt(
        long,
        short,
        parse(from_os_str),
        default_value = ".",
        help = "Directory receiving the packaged app and installers."
    )]
    pub output: PathBuf,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            ia32: false,
            all_archs: false,
            win: false,
            linux: false,
            mac: false,
            production: false,
            output: PathBuf::from("."),
        }
    }
}

/// Facts about the operating system we are running on
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostOs {
    pub is_windows: bool,
    pub is_linux: bool,
    pub is_osx: bool,
    pub name: String,
    pub home: Option<PathBuf>,
    pub tmp: PathBuf,
}

impl HostOs {
    pub fn current() -> Self {
        let mut os = Self::from_name(env::consts::OS);
        os.home = dirs::home_dir();
        os.tmp = env::temp_dir();
        os
    }

    /// Describe a host by its `std::env::consts::OS` style name.
    pub fn from_name(platform: &str) -> Self {
        let is_osx = platform == "macos" || platform == "darwin";
        let is_windows = platform == "windows" || platform == "win32";
        Self {
            is_windows,
            is_linux: platform == "linux",
            is_osx,
            name: if is_osx {
                "osx".to_string()
            } else if is_windows {
                "win32".to_string()
            } else {
                platform.to_string()
            },
            home: None,
            tmp: PathBuf::new(),
        }
    }
}

/// Everything a build step needs to know about where and how it runs.
#[derive(Clone, Debug)]
pub struct Env {
    pub options: BuildOptions,
    pub os: HostOs,
    pub paths: Paths,
}

impl Env {
    pub fn new<P: AsRef<Path>>(project_root: P, options: BuildOptions) -> Self {
        Self::with_host(tool_root(), project_root, options, HostOs::current())
    }

    pub fn with_host<T, P>(tool_root: T, project_root: P, options: BuildOptions, os: HostOs) -> Self
    where
        T: AsRef<Path>,
        P: AsRef<Path>,
    {
        let paths = Paths::new(tool_root, project_root, &options.output);
        Self { options, os, paths }
    }

    pub fn is_production_build(&self) -> bool {
        self.options.production
    }

    /// The `NODE_ENV` value handed to child processes.
    pub fn node_env(&self) -> &'static str {
        if self.is_production_build() {
            "production"
        } else {
            "development"
        }
    }
}

/// Locate the tool's installation directory.
///
/// `DESKTOP_INSTALLER_HOME` wins; otherwise the prefix above the directory
/// holding the executable, falling back to the working directory.
pub fn tool_root() -> PathBuf {
    if let Some(home) = env::var_os(TOOL_HOME_VAR) {
        trace!("tool root taken from {}", TOOL_HOME_VAR);
        return PathBuf::from(home);
    }

    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().and_then(Path::parent).map(Path::to_path_buf))
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}
