/*
 * Copyright 2022 Collabora, Ltd.
 *
 * SPDX-License-Identifier: MIT
 */
use std::fmt;

use crate::env::{BuildOptions, HostOs};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Platform {
    Windows,
    Linux,
    Mac,
}

impl Platform {
    /// The packager's command line switch for this platform
    pub fn cli_flag(self) -> &'static str {
        match self {
            Platform::Windows => "--win",
            Platform::Linux => "--linux",
            Platform::Mac => "--mac",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Platform::Windows => "win32",
            Platform::Linux => "linux",
            Platform::Mac => "darwin",
        })
    }
}

/// The requested architecture selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arch {
    Ia32,
    X64,
    All,
}

/// A single concrete architecture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TargetArch {
    Ia32,
    X64,
}

impl TargetArch {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetArch::Ia32 => "ia32",
            TargetArch::X64 => "x64",
        }
    }
}

impl fmt::Display for TargetArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Arch {
    pub fn expand(self) -> Vec<TargetArch> {
        match self {
            Arch::Ia32 => vec![TargetArch::Ia32],
            Arch::X64 => vec![TargetArch::X64],
            Arch::All => vec![TargetArch::Ia32, TargetArch::X64],
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Arch::Ia32 => "ia32",
            Arch::X64 => "x64",
            Arch::All => "all",
        })
    }
}

/// One platform and the architectures to build it for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    pub platform: Platform,
    pub archs: Vec<TargetArch>,
}

pub fn resolve_arch(options: &BuildOptions) -> Arch {
    if options.all_archs {
        Arch::All
    } else if options.ia32 {
        Arch::Ia32
    } else {
        Arch::X64
    }
}

/// Platforms named on the command line, or the host's own platform when
/// none were.
pub fn resolve_platforms(options: &BuildOptions, os: &HostOs) -> Vec<Platform> {
    let mut platforms = Vec::new();
    if options.win {
        platforms.push(Platform::Windows);
    }
    if options.linux {
        platforms.push(Platform::Linux);
    }
    if options.mac {
        platforms.push(Platform::Mac);
    }

    if platforms.is_empty() {
        platforms.push(if os.is_windows {
            Platform::Windows
        } else if os.is_linux {
            Platform::Linux
        } else {
            Platform::Mac
        });
    }
    platforms
}

pub fn create_targets(platforms: &[Platform], arch: Arch) -> Vec<Target> {
    platforms
        .iter()
        .map(|&platform| Target {
            platform,
            archs: arch.expand(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> BuildOptions {
        BuildOptions::default()
    }

    #[test]
    fn arch_selection() {
        assert_eq!(resolve_arch(&opts()), Arch::X64);
        assert_eq!(
            resolve_arch(&BuildOptions {
                ia32: true,
                ..opts()
            }),
            Arch::Ia32
        );
        assert_eq!(
            resolve_arch(&BuildOptions {
                all_archs: true,
                ..opts()
            }),
            Arch::All
        );
        assert_eq!(
            resolve_arch(&BuildOptions {
                ia32: true,
                all_archs: true,
                ..opts()
            }),
            Arch::All
        );
    }

    #[test]
    fn host_platform_when_nothing_requested() {
        assert_eq!(
            resolve_platforms(&opts(), &HostOs::from_name("linux")),
            vec![Platform::Linux]
        );
        assert_eq!(
            resolve_platforms(&opts(), &HostOs::from_name("windows")),
            vec![Platform::Windows]
        );
        assert_eq!(
            resolve_platforms(&opts(), &HostOs::from_name("freebsd")),
            vec![Platform::Mac]
        );
    }

    #[test]
    fn explicit_platforms_ignore_host() {
        let options = BuildOptions {
            win: true,
            linux: true,
            ..opts()
        };
        assert_eq!(
            resolve_platforms(&options, &HostOs::from_name("macos")),
            vec![Platform::Windows, Platform::Linux]
        );
    }

    #[test]
    fn all_expands_per_platform() {
        let targets = create_targets(&[Platform::Linux, Platform::Mac], Arch::All);
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[1].platform, Platform::Mac);
        assert_eq!(targets[1].archs, vec![TargetArch::Ia32, TargetArch::X64]);
    }
}
