//! URNA - campaign recruitment hierarchy tool
//!
//! Entry point for the `urna` binary. Loads a hierarchy snapshot into the
//! in-memory store and runs one engine operation as a given person.

mod cli;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use serde::Serialize;
use tracing::{debug, info};

use urna_core::config::{self, AppConfig};
use urna_core::hierarchy::{Forest, SubtreeMetrics};
use urna_core::logging::{self, LogGuards};
use urna_core::{
    version, Error, Identity, IdentityProvider, MemoryPersonStore, NetworkService, NewVoter,
    PersonId, PersonStore, Result, SessionRegistry,
};

use crate::cli::{Cli, Commands, ConfigSubcommand};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprint!("{}", e.format_for_terminal());
        process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    // Commands that need neither the snapshot nor full logging
    match &cli.command {
        Commands::Version => {
            version::print_version();
            return Ok(());
        }
        Commands::Config { subcommand } => {
            logging::init_simple(tracing::Level::WARN)?;
            return handle_config_command(subcommand.clone(), cli.config.as_deref());
        }
        _ => {}
    }

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(ref snapshot) = cli.snapshot {
        config.store.snapshot = shellexpand::tilde(snapshot).into_owned();
    }

    // Held until exit so the file writer flushes
    let log_guards: LogGuards = logging::init_logging(&config.logging, cli.verbose, cli.quiet)?;

    let build = version::build_info();
    debug!(version = %build.full_version(), "Starting urna");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(num_cpus::get().clamp(1, 4))
        .thread_name("urna")
        .build()
        .map_err(|e| Error::Internal(format!("Failed to create async runtime: {}", e)))?;

    let status = runtime.block_on(run_command(cli.command, config))?;
    if status != 0 {
        drop(log_guards);
        process::exit(status);
    }
    Ok(())
}

/// Everything the hierarchy commands share
struct Context {
    store: Arc<MemoryPersonStore>,
    service: NetworkService,
    sessions: SessionRegistry,
    snapshot: PathBuf,
}

impl Context {
    fn open(config: &AppConfig) -> Result<Self> {
        let snapshot = config.snapshot_path();
        let store = Arc::new(MemoryPersonStore::load_snapshot(&snapshot)?);
        let service = NetworkService::new(store.clone(), config.hierarchy.frontier_batch_size);

        Ok(Self {
            store,
            service,
            sessions: SessionRegistry::with_idle_minutes(config.session.idle_timeout_minutes),
            snapshot,
        })
    }

    /// Resolve `--as` into an authenticated identity, the way a login would
    async fn sign_in(&self, acting: &str) -> Result<Identity> {
        let id = PersonId::parse(acting)?;
        let person = self.store.get(&id).await?.ok_or(Error::NotAuthenticated)?;

        let now = Utc::now();
        let token = self.sessions.open(Identity::from_person(&person), now);
        self.sessions.current_identity(&token, now).require()
    }

    fn save(&self) -> Result<()> {
        self.store.save_snapshot(&self.snapshot)
    }
}

#[derive(Serialize)]
struct RootMetrics {
    id: PersonId,
    display_name: String,
    metrics: SubtreeMetrics,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn target_or_self(target: Option<String>, identity: &Identity) -> Result<PersonId> {
    match target {
        Some(raw) => PersonId::parse(&raw),
        None => Ok(identity.id.clone()),
    }
}

/// Run one hierarchy command; returns the process exit status
async fn run_command(command: Commands, config: AppConfig) -> Result<i32> {
    let ctx = Context::open(&config)?;

    match command {
        Commands::CanView { acting, target } => {
            let requester = PersonId::parse(&acting)?;
            let target = PersonId::parse(&target)?;
            let allowed = ctx.service.oracle().can_view(&requester, &target).await?;
            println!("{}", if allowed { "allowed" } else { "denied" });
        }

        Commands::Profile { acting, target } => {
            let identity = ctx.sign_in(&acting).await?;
            let target = PersonId::parse(&target)?;
            print_json(&ctx.service.view_profile(&identity, &target).await?)?;
        }

        Commands::Reports { acting, target } => {
            let identity = ctx.sign_in(&acting).await?;
            let target = target_or_self(target, &identity)?;
            print_json(&ctx.service.referrals(&identity, &target).await?)?;
        }

        Commands::Metrics { all: true, .. } => {
            let forest = Forest::build(ctx.store.all().await?);
            let report: Vec<RootMetrics> = forest
                .roots()
                .into_iter()
                .map(|root| RootMetrics {
                    id: root.id.clone(),
                    display_name: root.display_name(),
                    metrics: forest.metrics(&root.id),
                })
                .collect();
            print_json(&report)?;
        }

        Commands::Metrics { acting, target, .. } => {
            let acting = acting.ok_or_else(|| {
                Error::validation("as", "required unless --all is given")
            })?;
            let identity = ctx.sign_in(&acting).await?;
            let target = target_or_self(target, &identity)?;
            print_json(&ctx.service.network_metrics(&identity, &target).await?)?;
        }

        Commands::Roster { acting } => {
            let identity = ctx.sign_in(&acting).await?;
            print_json(&ctx.service.roster(&identity).await?)?;
        }

        Commands::Enroll {
            acting,
            id,
            first_names,
            last_names,
            phone,
            neighborhood,
            voting_place,
            quality_score,
        } => {
            let identity = ctx.sign_in(&acting).await?;
            let form = NewVoter {
                id,
                first_names,
                last_names,
                phone,
                neighborhood,
                voting_place,
                quality_score,
                ..Default::default()
            };
            let enrolled = ctx.service.create_voter(&identity, form, Utc::now()).await?;
            ctx.save()?;
            info!(voter = %enrolled.person.id, snapshot = %ctx.snapshot.display(), "Snapshot updated");
            print_json(&enrolled)?;
        }

        Commands::Reassign {
            acting,
            person,
            new_parent,
        } => {
            let identity = ctx.sign_in(&acting).await?;
            let person = PersonId::parse(&person)?;
            let new_parent = PersonId::parse(&new_parent)?;
            ctx.service.reassign(&identity, &person, &new_parent).await?;
            ctx.save()?;
            println!("{} now reports to {}", person, new_parent);
        }

        Commands::Check => {
            let forest = Forest::build(ctx.store.all().await?);
            let issues = forest.audit();
            if issues.is_empty() {
                println!("No structural problems in {} records.", forest.len());
                return Ok(0);
            }
            for issue in &issues {
                println!("{}", issue);
            }
            println!("{} problem(s) found.", issues.len());
            return Ok(1);
        }

        Commands::Version | Commands::Config { .. } => {
            return Err(Error::Internal("command handled before startup".to_string()));
        }
    }

    Ok(0)
}

fn handle_config_command(subcommand: ConfigSubcommand, config_path: Option<&str>) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show => {
            let cfg = AppConfig::load(config_path)?;
            println!("{}", toml::to_string_pretty(&cfg)?);
        }
        ConfigSubcommand::Init { path, force } => {
            let written = config::init_config(path.as_deref(), force)?;
            println!("Configuration file created: {}", written.display());
        }
        ConfigSubcommand::Validate => {
            AppConfig::load(config_path)?;
            println!("Configuration is valid.");
        }
    }

    Ok(())
}
