//! CLI execution and command dispatch logic.
//!
//! This module keeps `main` minimal by providing a single entry point that
//! handles command execution. Every command loads the build description,
//! generates the Makefile in memory and only then touches the build
//! directory, so a failed generation leaves existing files unchanged.

mod error;
mod output;
mod path_helpers;

pub use error::RunnerError;

use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use tracing::{debug, info};

use crate::cli::{Cli, Commands, GenerateArgs};
use crate::config;
use crate::environment::Environment;
use crate::generate::{self, Generated, regenerate::MAKEFILE};
use crate::graph::BuildGraph;
use crate::toolchain::Platform;

use path_helpers::{absolute, resolve_description, resolve_srcdir, utf8};

/// Execute the parsed [`Cli`] command.
///
/// # Errors
///
/// Returns an error if the description cannot be loaded, the Makefile cannot
/// be generated or a file cannot be written.
pub fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Generate(args) => {
            let env = environment_from_args(args)?;
            let generated = generate_makefile(&env)?;
            write_build_directory(&env, &generated, true)
        }
        Commands::Regenerate { builddir } => handle_regenerate(builddir),
        Commands::Print(args) => {
            let env = environment_from_args(args)?;
            let generated = generate_makefile(&env)?;
            output::write_stdout(&generated.makefile)
        }
    }
}

/// Reload the environment saved in `dir` and rewrite its Makefile.
fn handle_regenerate(dir: &Utf8Path) -> Result<()> {
    let builddir = absolute(dir)?;
    if !Environment::file_path(&builddir).is_file() {
        return Err(RunnerError::NotABuildDirectory { builddir }.into());
    }
    let mut env = Environment::load(&builddir)?;
    env.builddir = builddir;
    info!(builddir = %env.builddir, "Regenerating Makefile");
    let generated = generate_makefile(&env)?;
    write_build_directory(&env, &generated, false)
}

/// Resolve the environment of a fresh `generate` or `print` run.
///
/// # Errors
///
/// Returns an error when a path cannot be resolved or the tool
/// configuration is invalid.
fn environment_from_args(args: &GenerateArgs) -> Result<Environment> {
    let description = resolve_description(&args.description)?;
    let srcdir = resolve_srcdir(args.srcdir.as_deref(), &description)?;
    let builddir = absolute(&args.builddir)?;
    let generator = utf8(std::env::current_exe().context("locate the mkgen executable")?)?;
    let toolchain = args.toolchain.unwrap_or_default();
    let tools = config::resolve(toolchain).context("resolve tool configuration")?;
    Ok(Environment {
        srcdir,
        builddir,
        description,
        generator,
        platform: args.platform.unwrap_or_else(Platform::host),
        toolchain,
        install_dirs: args.install.install_dirs(),
        tools,
    })
}

/// Load the description named by `env` and generate its Makefile.
///
/// # Errors
///
/// Returns an error when the description cannot be loaded or translated.
fn generate_makefile(env: &Environment) -> Result<Generated> {
    let graph = BuildGraph::from_path(&env.description)
        .with_context(|| format!("load build description {}", env.description))?;
    if tracing::enabled!(tracing::Level::DEBUG) {
        let graph_json =
            serde_json::to_string_pretty(&graph).context("serialise build graph")?;
        debug!("Build graph:\n{graph_json}");
    }
    generate::generate(env, &graph)
        .with_context(|| format!("generate Makefile for {}", env.description))
}

/// Write auxiliary files, the environment and finally the Makefile.
fn write_build_directory(env: &Environment, generated: &Generated, save_env: bool) -> Result<()> {
    fs::create_dir_all(&env.builddir)
        .with_context(|| format!("create build directory {}", env.builddir))?;
    for file in &generated.auxiliary {
        output::write_file(&env.builddir.join(&file.name), &file.contents)?;
    }
    if save_env {
        env.save()?;
    }
    output::write_file(&env.builddir.join(MAKEFILE), &generated.makefile)
}
