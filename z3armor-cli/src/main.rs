mod app;
mod output;

use std::{
    io::{self, BufRead},
    process::ExitCode,
};

use anyhow::{bail, Context};
use clap::Parser;
use z3armor::{Renderer, Template, Z3Armor};

use crate::app::Cli;

const ISSUES_URL: &str = concat!(env!("CARGO_PKG_REPOSITORY"), "/issues");

fn main() -> ExitCode {
    ctrlc::set_handler(|| {
        eprintln!("\nCancelled.");
        std::process::exit(130);
    })
    .expect("failed to set Ctrl+C handler");

    let cli = Cli::parse();

    // z3armor debug output with --verbose, warnings otherwise; RUST_LOG overrides
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .filter_module("z3armor", level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("Unexpected error: {err:?}");
            log::error!("Please, report this error to {ISSUES_URL}.");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let secret = match &cli.secret {
        Some(secret) => secret.clone(),
        None => read_secret(io::stdin().lock())?,
    };

    let mut armor = Z3Armor::with_config(secret.into_bytes(), cli.random_source(), cli.config());
    armor.fit().context("failed to fit constraints")?;
    log::info!("{armor}");

    let renderer = Renderer::new();
    let program = match (&cli.template, &cli.template_path) {
        (Some(name), _) => renderer.render(Template::from_name(name)?, &armor)?,
        (None, Some(path)) => renderer
            .render_path(path, &armor)
            .with_context(|| format!("failed to render template: {}", path.display()))?,
        (None, None) => bail!("either --template or --template-path is required"),
    };

    output::write_program(&program, cli.output.as_deref())
}

/// Reads one line from `reader` with its line terminator stripped.
fn read_secret(mut reader: impl BufRead) -> anyhow::Result<String> {
    let mut line = String::new();
    if reader
        .read_line(&mut line)
        .context("failed to read secret from stdin")?
        == 0
    {
        bail!("no secret given on stdin");
    }
    let trimmed = line.strip_suffix('\n').unwrap_or(&line);
    let trimmed = trimmed.strip_suffix('\r').unwrap_or(trimmed);
    Ok(trimmed.to_string())
}
