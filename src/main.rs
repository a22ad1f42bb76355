use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tiergate::admission::{AdmissionService, TracingObserver};
use tiergate::config::TiergateConfig;
use tiergate::ratelimit::{Caller, LimiterRegistry, RateAlgorithm, Tier};

/// Tiered admission control harness.
#[derive(Debug, Parser)]
#[command(name = "tiergate", version, about)]
struct Cli {
    /// Service configuration file (YAML)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Tier rules file, overriding the one named in the configuration
    #[arg(long, global = true)]
    rules: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send rounds of requests for one caller of each tier
    Demo {
        /// Number of rounds
        #[arg(long, default_value_t = 15)]
        requests: usize,
    },
    /// Send requests for a single caller
    Check {
        /// Caller id
        #[arg(long)]
        caller: String,
        /// Caller tier (free, premium, enterprise)
        #[arg(long)]
        tier: Tier,
        /// Requests per thread
        #[arg(long, default_value_t = 1)]
        count: usize,
        /// Threads issuing requests concurrently
        #[arg(long, default_value_t = 1)]
        threads: usize,
    },
    /// Load and validate the tier rules, then print them
    Validate {
        /// Print the table as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config =
        TiergateConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(rules) = &cli.rules {
        config.rate_limiting.rules_path = Some(rules.clone());
    }

    init_tracing(&config);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let rules = config.tier_rules().context("Failed to load tier rules")?;
    let registry = LimiterRegistry::from_rules(&rules).context("Invalid tier rules")?;
    if config.rate_limiting.require_all_tiers {
        registry.ensure_complete()?;
    }
    info!(tiers = ?registry.tiers(), "Limiter registry initialized");

    match cli.command {
        Command::Validate { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&rules)?);
            } else {
                for tier in registry.tiers() {
                    let limiter = registry.limiter_for(tier)?;
                    let quota = limiter.quota();
                    println!(
                        "{:<10} {:<14} {} per {:?}",
                        tier,
                        limiter.kind(),
                        quota.max_events(),
                        quota.window()
                    );
                }
            }
        }
        Command::Demo { requests } => {
            let service = AdmissionService::new(Arc::new(registry))
                .with_observer(Arc::new(TracingObserver));
            let callers = [
                Caller::new("user1", Tier::Free)?,
                Caller::new("user2", Tier::Premium)?,
                Caller::new("user3", Tier::Enterprise)?,
            ];

            for round in 1..=requests {
                for caller in &callers {
                    let admitted = service.admit_caller(caller)?;
                    println!("Request {} for {}: {}", round, caller.id, admitted);
                }
            }
        }
        Command::Check {
            caller,
            tier,
            count,
            threads,
        } => {
            let service = AdmissionService::new(Arc::new(registry))
                .with_observer(Arc::new(TracingObserver));
            let caller = Caller::new(&caller, tier)?;

            let outcomes = std::thread::scope(|s| {
                let handles: Vec<_> = (0..threads.max(1))
                    .map(|_| {
                        let service = service.clone();
                        let caller = &caller;
                        s.spawn(move || {
                            (0..count)
                                .map(|_| service.admit_caller(caller))
                                .collect::<tiergate::error::Result<Vec<bool>>>()
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|h| h.join().map_err(|_| anyhow::anyhow!("worker thread panicked")))
                    .collect::<anyhow::Result<Vec<_>>>()
            })?;

            let mut allowed = 0;
            let mut denied = 0;
            for outcome in outcomes {
                for admitted in outcome? {
                    if admitted {
                        allowed += 1;
                    } else {
                        denied += 1;
                    }
                }
            }
            println!("{} ({}): {} allowed, {} denied", caller.id, tier, allowed, denied);
        }
    }

    Ok(())
}

fn init_tracing(config: &TiergateConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_writer(std::io::stderr);

    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
