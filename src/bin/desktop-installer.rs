/*
 * Copyright 2022 Collabora, Ltd.
 *
 * SPDX-License-Identifier: MIT
 */
use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use desktop_installer::packager::CommandPackager;
use desktop_installer::stage::ScaffoldStager;
use desktop_installer::{BuildOptions, Env, InstallerBuilder, Settings};
use log::info;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "desktop-installer",
    long_about = "Build desktop installers from a prepared native-app build."
)]
struct Opt {
    #[structopt(
        name = "PROJECT",
        parse(from_os_str),
        default_value = ".",
        help = "The project directory."
    )]
    project: PathBuf,
    #[structopt(flatten)]
    options: BuildOptions,
}

fn main() -> Result<()> {
    env_logger::init();

    let opt = Opt::from_args();
    let project = fs::canonicalize(&opt.project)
        .with_context(|| format!("cannot find project {}", opt.project.to_string_lossy()))?;
    let mut options = opt.options;
    if options.output.is_relative() {
        options.output = env::current_dir()?.join(&options.output);
    }

    let env = Env::new(&project, options);
    let settings = Settings::load(&env.paths.desktop.settings)?;

    let mut builder = InstallerBuilder::new(
        &env,
        &settings,
        CommandPackager::new(&env),
        ScaffoldStager::new(&env),
    );
    builder.build()?;

    info!(
        "installers written to {}",
        env.paths.installer_dir.to_string_lossy()
    );
    Ok(())
}
