/*
 * Copyright 2022 Collabora, Ltd.
 *
 * SPDX-License-Identifier: MIT
 */
pub mod command;
pub mod env;
pub mod installer;
pub mod metadata;
pub mod packager;
pub mod paths;
pub mod settings;
pub mod stage;
pub mod target;

pub use env::{BuildOptions, Env, HostOs};
pub use installer::{InstallerBuilder, InstallerError, Pass};
pub use paths::Paths;
pub use settings::Settings;
