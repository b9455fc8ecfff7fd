/*
 * Copyright 2022 Collabora, Ltd.
 *
 * SPDX-License-Identifier: MIT
 */
//! The filesystem layout shared by every build step.
//!
//! All locations are derived by joining fixed segments onto one of three
//! roots: the tool's own installation, the source project and the output
//! directory. Nothing here touches the disk.
use std::path::{Path, PathBuf};

/// Name of the hidden project directory holding desktop overrides.
pub const DESKTOP_DIR: &str = ".desktop";
/// Name of the native-app build directory inside `.meteor`.
pub const BUILD_DIR: &str = "desktop-build";
/// Output subdirectory receiving the packaged application.
pub const PACKAGE_DIR: &str = ".desktop-package";
/// Output subdirectory receiving the installers.
pub const INSTALLER_DIR: &str = ".desktop-installer";

/// Locations inside the tool's own installation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolPaths {
    pub root: PathBuf,
    pub skeleton: PathBuf,
    pub scaffold: PathBuf,
}

impl ToolPaths {
    fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            skeleton: root.join("skeleton"),
            scaffold: root.join("scaffold"),
        }
    }
}

/// Locations inside the source project.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub platforms: PathBuf,
    pub packages: PathBuf,
    pub versions: PathBuf,
    pub release: PathBuf,
    pub git_ignore: PathBuf,
    pub package_json: PathBuf,
    pub cordova_build: PathBuf,
    pub cordova_build_index: PathBuf,
    pub cordova_build_program_json: PathBuf,
    pub web_cordova: PathBuf,
    pub web_cordova_program_json: PathBuf,
}

impl ProjectPaths {
    fn new(root: &Path) -> Self {
        let meteor = root.join(".meteor");
        let cordova_build = meteor
            .join("local")
            .join("cordova-build")
            .join("www")
            .join("application");
        let web_cordova = meteor
            .join("local")
            .join("build")
            .join("programs")
            .join("web.cordova");

        Self {
            root: root.to_path_buf(),
            platforms: meteor.join("platforms"),
            packages: meteor.join("packages"),
            versions: meteor.join("versions"),
            release: meteor.join("release"),
            git_ignore: meteor.join(".gitignore"),
            package_json: root.join("package.json"),
            cordova_build_index: cordova_build.join("index.html"),
            cordova_build_program_json: cordova_build.join("program.json"),
            cordova_build,
            web_cordova_program_json: web_cordova.join("program.json"),
            web_cordova,
        }
    }
}

/// Locations inside the project's `.desktop` override directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DesktopPaths {
    pub root: PathBuf,
    pub modules: PathBuf,
    pub import: PathBuf,
    pub assets: PathBuf,
    pub settings: PathBuf,
    pub desktop: PathBuf,
    pub splash_screen: PathBuf,
    pub loading_gif: PathBuf,
    pub meteor_ico: PathBuf,
}

impl DesktopPaths {
    fn new(project_root: &Path) -> Self {
        let root = project_root.join(DESKTOP_DIR);
        let assets = root.join("assets");

        Self {
            modules: root.join("modules"),
            import: root.join("import"),
            settings: root.join("settings.json"),
            desktop: root.join("desktop.js"),
            splash_screen: assets.join("splashScreen.png"),
            loading_gif: assets.join("loading.gif"),
            meteor_ico: assets.join("meteor.ico"),
            assets,
            root,
        }
    }
}

/// Locations inside the generated native-app build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildPaths {
    pub root: PathBuf,
    /// Parking spot for `node_modules` while the packager runs
    pub tmp_node_modules: PathBuf,
    pub app_root: PathBuf,
    pub app: PathBuf,
    pub cordova: PathBuf,
    pub index: PathBuf,
    pub preload: PathBuf,
    pub modules: PathBuf,
    pub desktop_asar: PathBuf,
    pub extracted: PathBuf,
    pub app_asar: PathBuf,
    pub import: PathBuf,
    pub assets: PathBuf,
    pub package_json: PathBuf,
    pub settings: PathBuf,
    pub desktop: PathBuf,
    pub desktop_tmp: PathBuf,
    pub node_modules: PathBuf,
    pub meteor_asar: PathBuf,
    pub meteor_app: PathBuf,
    pub meteor_app_index: PathBuf,
    pub meteor_app_program_json: PathBuf,
    pub skeleton: PathBuf,
}

impl BuildPaths {
    fn new(project_root: &Path) -> Self {
        let meteor = project_root.join(".meteor");
        let root = meteor.join(BUILD_DIR);
        let app_root = root.join("app");
        let meteor_app = root.join("meteor");

        Self {
            tmp_node_modules: meteor.join(".desktop_node_modules"),
            app: app_root.join("app.js"),
            cordova: app_root.join("cordova.js"),
            index: app_root.join("index.js"),
            preload: app_root.join("preload.js"),
            modules: app_root.join("modules"),
            app_root,
            desktop_asar: root.join("desktop.asar"),
            extracted: root.join("extracted"),
            app_asar: root.join("app.asar"),
            import: root.join("import"),
            assets: root.join("assets"),
            package_json: root.join("package.json"),
            settings: root.join("settings.json"),
            desktop: root.join("desktop.js"),
            desktop_tmp: root.join("__desktop"),
            node_modules: root.join("node_modules"),
            meteor_asar: root.join("meteor.asar"),
            meteor_app_index: meteor_app.join("index.html"),
            meteor_app_program_json: meteor_app.join("program.json"),
            meteor_app,
            skeleton: root.join("skeleton"),
            root,
        }
    }
}

/// Locations inside the temporary desktop staging area.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagingPaths {
    pub root: PathBuf,
    pub modules: PathBuf,
    pub settings: PathBuf,
}

impl StagingPaths {
    fn new(build: &BuildPaths) -> Self {
        let root = build.desktop_tmp.clone();
        Self {
            modules: root.join("modules"),
            settings: root.join("settings.json"),
            root,
        }
    }
}

/// The complete path table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Paths {
    pub tool: ToolPaths,
    pub project: ProjectPaths,
    pub desktop: DesktopPaths,
    pub build: BuildPaths,
    pub staging: StagingPaths,
    pub package_dir: PathBuf,
    pub installer_dir: PathBuf,
}

impl Paths {
    pub fn new<T, P, O>(tool_root: T, project_root: P, output_root: O) -> Self
    where
        T: AsRef<Path>,
        P: AsRef<Path>,
        O: AsRef<Path>,
    {
        let project_root = project_root.as_ref();
        let build = BuildPaths::new(project_root);

        Paths {
            tool: ToolPaths::new(tool_root.as_ref()),
            project: ProjectPaths::new(project_root),
            desktop: DesktopPaths::new(project_root),
            staging: StagingPaths::new(&build),
            build,
            package_dir: output_root.as_ref().join(PACKAGE_DIR),
            installer_dir: output_root.as_ref().join(INSTALLER_DIR),
        }
    }
}
