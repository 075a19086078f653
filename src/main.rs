use std::path::PathBuf;

use advisory_parser::{AuditEnvironment, AuditOptions, AuditSource};
use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{debug, info};

use config::{find_project_root, initialize_config, load_user_config, GLOBAL_CONFIG};
use entity::{Advisory, Project};
use report::{ConsoleReport, ReportSink};
use usecase::{remediate, InstallMode, Installer, NpmRegistryResolver, YarnInstaller};

mod config;
mod entity;
mod report;
mod usecase;

/// How advisories are fixed. Only the alias strategy is implemented;
/// an unsupported value fails at argument parsing.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Strategy {
    /// Redirect vulnerable descriptors through the resolution alias layer
    #[default]
    Alias,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Environment {
    #[default]
    All,
    Production,
    Development,
}

impl From<Environment> for AuditEnvironment {
    fn from(environment: Environment) -> Self {
        match environment {
            Environment::All => AuditEnvironment::All,
            Environment::Production => AuditEnvironment::Production,
            Environment::Development => AuditEnvironment::Development,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Severity {
    Info,
    Low,
    Moderate,
    High,
    Critical,
}

impl From<Severity> for advisory_parser::Severity {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Info => advisory_parser::Severity::Info,
            Severity::Low => advisory_parser::Severity::Low,
            Severity::Moderate => advisory_parser::Severity::Moderate,
            Severity::High => advisory_parser::Severity::High,
            Severity::Critical => advisory_parser::Severity::Critical,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Mode {
    #[default]
    UpdateLockfile,
    SkipBuild,
}

impl From<Mode> for InstallMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::UpdateLockfile => InstallMode::UpdateLockfile,
            Mode::SkipBuild => InstallMode::SkipBuild,
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    ///fix strategy to attempt for advisories
    #[arg(long, value_enum, default_value_t)]
    strategy: Strategy,
    ///audit all workspaces
    #[arg(short = 'A', long)]
    all: bool,
    ///audit transitive dependencies too
    #[arg(short = 'R', long)]
    recursive: bool,
    ///dependency environment to audit
    #[arg(long, value_enum, default_value_t)]
    environment: Environment,
    ///minimum advisory severity to act on
    #[arg(long, value_enum)]
    severity: Option<Severity>,
    ///package glob patterns to exclude from the audit
    #[arg(long)]
    exclude: Vec<String>,
    ///advisory id globs to ignore
    #[arg(long)]
    ignore: Vec<String>,
    ///install mode used for the post-fix install
    #[arg(long, value_enum, default_value_t)]
    mode: Mode,
    ///directory to start project discovery from (defaults to cwd)
    #[arg(long)]
    cwd: Option<PathBuf>,
    ///yarn executable to invoke
    #[arg(long, default_value = "yarn")]
    yarn_path: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    //logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    match run(args).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!("{:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run(args: Args) -> anyhow::Result<i32> {
    let start = match &args.cwd {
        Some(cwd) => cwd.clone(),
        None => std::env::current_dir().context("failed to read current directory")?,
    };
    let project_root = find_project_root(&start)?;
    debug!(
        "project root: {}, strategy: {:?}",
        project_root.display(),
        args.strategy
    );

    initialize_config(load_user_config(&project_root)?);
    let (skip_virtual, registry_url) = {
        let config = GLOBAL_CONFIG.read().unwrap();
        (config.skip_virtual, config.registry_url.clone())
    };

    let state_path = project_root.join(".yarn").join("install-state.json");
    let mut project = Project::load(&state_path)?;
    info!(
        "loaded {} descriptors from {}",
        project.descriptor_count(),
        state_path.display()
    );

    let mut report = ConsoleReport::new();

    report.phase_start("audit");
    let source = AuditSource::new(&args.yarn_path, &project_root);
    let options = AuditOptions {
        all_workspaces: args.all,
        recursive: args.recursive,
        environment: args.environment.into(),
        severity: args.severity.map(Into::into),
        excludes: args.exclude.clone(),
        ignores: args.ignore.clone(),
    };
    let raw_advisories = source.advisories(&options).await?;
    report.phase_end("audit");

    // Malformed advisories abort here, before any remediation
    let advisories = raw_advisories
        .into_iter()
        .map(|raw| {
            let name = raw.module_name.clone();
            Advisory::try_from(raw).with_context(|| format!("invalid advisory for {}", name))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    info!("{} advisories reported", advisories.len());

    let resolver = NpmRegistryResolver::new(registry_url);
    let outcome = remediate(
        &advisories,
        &mut project,
        &resolver,
        &mut report,
        skip_virtual,
    )
    .await;
    info!(
        "remediation done: {} upgraded, {} unresolved",
        outcome.upgraded, outcome.unresolved
    );

    project.save(&state_path)?;

    // The install step always runs so committed fixes are written
    // back, even when some pairs stayed unresolved
    let installer = YarnInstaller::new(&args.yarn_path, &project_root);
    installer.install(args.mode.into()).await?;

    Ok(if report.has_errors() { 1 } else { 0 })
}
