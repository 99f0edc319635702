//! vial - formula-driven installer for Python command line tools
//!
//! Reads immutable formula records from a tap directory and consumes them:
//! fetch, verify, provision an isolated venv, install, link, smoke-test.

mod cli;
mod error;
mod events;

use crate::cli::{Cli, Commands, GlobalArgs};
use crate::error::CliError;
use crate::events::EventHandler;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process;
use tokio::select;
use tracing::{error, info};
use vial_config::{Config, Layout};
use vial_errors::Error;
use vial_formula::{Formula, Tap};
use vial_hash::Checksum;
use vial_install::Installer;
use vial_net::{NetClient, NetConfig};
use vial_types::VersionSpec;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("{e}");
        eprintln!("Error: {e}");
        process::exit(e.exit_code());
    }
}

fn init_tracing(debug: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if debug { "vial=debug" } else { "vial=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    info!("starting vial v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load_or_default(cli.global.config.as_deref()).await?;
    let tap_dir = tap_dir(&cli.global, &config);
    let debug = cli.global.debug;

    match cli.command {
        Commands::Install {
            package,
            version,
            pin,
        } => {
            let tap = Tap::load(&tap_dir).await?;
            let formula = resolve(&tap, &package, version.as_deref(), pin.as_deref())?;
            install(&config, formula, debug).await
        }
        Commands::Uninstall { package } => {
            let tap = Tap::load(&tap_dir).await?;
            let formula = tap.resolve(&package)?;
            let installer = installer(&config)?;
            installer.uninstall(formula).await?;
            println!("Uninstalled {}", formula.package_id());
            Ok(())
        }
        Commands::List => {
            let tap = Tap::load(&tap_dir).await?;
            for formula in tap.records() {
                println!(
                    "{} {} (revision {}) {}",
                    formula.name, formula.version, formula.revision, formula.license
                );
            }
            Ok(())
        }
        Commands::Info { package } => {
            let tap = Tap::load(&tap_dir).await?;
            let formula = tap.resolve(&package)?;
            print_info(formula);
            Ok(())
        }
        Commands::Check => check(&tap_dir).await,
    }
}

fn tap_dir(global: &GlobalArgs, config: &Config) -> PathBuf {
    global
        .tap
        .clone()
        .or_else(|| config.paths.tap.clone())
        .unwrap_or_else(|| PathBuf::from("formulae"))
}

fn resolve<'a>(
    tap: &'a Tap,
    package: &str,
    version: Option<&str>,
    pin: Option<&str>,
) -> Result<&'a Formula, CliError> {
    // An explicit digest pin selects exactly one historical record and
    // takes precedence over version resolution
    if let Some(pin) = pin {
        let pin = Checksum::parse("--pin", pin)?;
        return Ok(tap.resolve_pinned(package, &pin)?);
    }
    if let Some(spec) = version {
        let spec: VersionSpec = spec
            .parse()
            .map_err(|e| CliError::from(Error::from(e)))?;
        return Ok(tap.resolve_spec(package, &spec)?);
    }
    Ok(tap.resolve(package)?)
}

fn installer(config: &Config) -> Result<Installer, Error> {
    let net = NetClient::new(NetConfig::from(&config.network))?;
    Ok(Installer::new(Layout::new(config.root()), net))
}

async fn install(config: &Config, formula: &Formula, debug: bool) -> Result<(), CliError> {
    let (tx, mut rx) = vial_events::channel();
    let installer = installer(config)?.with_events(tx);
    let mut handler = EventHandler::new(
        console::Term::stdout().features().colors_supported(),
        debug,
    );

    let mut install_future = Box::pin(installer.install(formula));
    let result = loop {
        select! {
            result = &mut install_future => {
                while let Ok(event) = rx.try_recv() {
                    handler.handle_event(event);
                }
                break result;
            }
            Some(event) = rx.recv() => {
                handler.handle_event(event);
            }
        }
    };

    let report = result?;
    println!(
        "Installed {} (python {}) -> {}",
        report.package_id,
        report.runtime_version,
        report.executable_path.display()
    );
    Ok(())
}

async fn check(tap_dir: &Path) -> Result<(), CliError> {
    let (tap, findings) = Tap::audit(tap_dir).await?;
    println!(
        "{} valid record(s), {} problem(s)",
        tap.records().len(),
        findings.len()
    );
    for finding in &findings {
        eprintln!("  {}: {}", finding.path.display(), finding.error);
    }
    if findings.is_empty() {
        Ok(())
    } else {
        Err(Error::internal(format!("{} invalid record(s) in tap", findings.len())).into())
    }
}

fn print_info(formula: &Formula) {
    println!("{} {}", formula.name, formula.version);
    if !formula.description.is_empty() {
        println!("  {}", formula.description);
    }
    if !formula.homepage.is_empty() {
        println!("  homepage: {}", formula.homepage);
    }
    if !formula.license.is_empty() {
        println!("  license: {}", formula.license);
    }
    println!("  runtime: {}", formula.runtime);
    println!("  source: {}", formula.source.url);
    println!("  sha256: {}", formula.source.sha256);
    for resource in &formula.resources {
        println!("  resource: {} {}", resource.name, resource.url);
    }
    println!(
        "  test: {} {}",
        formula.test.executable, formula.test.flag
    );
}
