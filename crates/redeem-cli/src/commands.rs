use std::collections::BTreeMap;
use std::sync::Arc;

use colored::Colorize;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::info;

use redeem_engine::{
    audit, AuditReport, Coordinator, InMemoryRedemptionStore, PublicConfig, RandomSource,
    RedeemError, RedemptionResult, RequesterId, SeededSource, ThreadRandom,
};
use redeem_store::LedgerSummary;

use crate::cli::*;
use crate::scenario::Scenario;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Play(args) => cmd_play(args, cli.format).await,
        Command::Simulate(args) => cmd_simulate(args, cli.format).await,
        Command::Config(args) => cmd_config(args, cli.format).await,
    }
}

fn build_engine(
    scenario: &Scenario,
    store: Arc<InMemoryRedemptionStore>,
    seed: Option<u64>,
) -> Coordinator<InMemoryRedemptionStore> {
    let rng: Arc<dyn RandomSource> = match seed {
        Some(seed) => Arc::new(SeededSource::new(seed)),
        None => Arc::new(ThreadRandom),
    };
    Coordinator::new(store, scenario.engine.clone()).with_random(rng)
}

#[derive(Debug, Serialize)]
struct PlayEntry {
    code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<RedemptionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorEntry>,
}

#[derive(Debug, Serialize)]
struct ErrorEntry {
    kind: &'static str,
    message: String,
}

impl From<&RedeemError> for ErrorEntry {
    fn from(err: &RedeemError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

async fn cmd_play(args: PlayArgs, format: OutputFormat) -> anyhow::Result<()> {
    let scenario = Scenario::load(&args.scenario)?;
    let store = scenario.provision()?;
    let engine = build_engine(&scenario, store, args.seed);
    let requester = args.requester.map(RequesterId::new);

    let mut entries = Vec::with_capacity(args.codes.len());
    for code in args.codes {
        let outcome = engine.redeem(&code, requester.clone()).await;
        if format == OutputFormat::Text {
            print_play_line(&code, &outcome);
        }
        let (result, error) = match outcome {
            Ok(result) => (Some(result), None),
            Err(err) => (None, Some(ErrorEntry::from(&err))),
        };
        entries.push(PlayEntry {
            code,
            result,
            error,
        });
    }

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    }
    Ok(())
}

fn print_play_line(code: &str, outcome: &Result<RedemptionResult, RedeemError>) {
    match outcome {
        Ok(result) => {
            let reels = result
                .display_symbols
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            if result.won {
                println!(
                    "{}  {}  {} {}  ({} left)",
                    code.bold(),
                    reels,
                    "WIN".green().bold(),
                    result.reward_label.as_deref().unwrap_or_default().yellow(),
                    result.remaining_after
                );
            } else {
                println!(
                    "{}  {}  {}  ({} left)",
                    code.bold(),
                    reels,
                    "no prize".dimmed(),
                    result.remaining_after
                );
            }
        }
        Err(err) => println!("{}  {} {}", code.bold(), "✗".red(), err.kind().red()),
    }
}

/// Outcome of redeeming a whole scenario concurrently.
#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub attempts: usize,
    pub wins: u64,
    pub losses: u64,
    pub errors: BTreeMap<&'static str, u64>,
    pub initial_remaining: Option<u64>,
    pub final_remaining: Option<u64>,
    pub ledger: LedgerSummary,
    pub audit: AuditReport,
}

pub async fn simulate(
    scenario: &Scenario,
    concurrency: usize,
    seed: Option<u64>,
) -> anyhow::Result<SimulationReport> {
    let store = scenario.provision()?;
    let engine = Arc::new(build_engine(scenario, Arc::clone(&store), seed));
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    info!(
        codes = scenario.codes.len(),
        concurrency = concurrency.max(1),
        "starting simulation"
    );

    let mut tasks = JoinSet::new();
    for code in scenario.codes.iter().cloned() {
        let engine = Arc::clone(&engine);
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await?;
            Ok::<_, anyhow::Error>(engine.redeem(&code, None).await)
        });
    }

    let mut report = SimulationReport {
        attempts: scenario.codes.len(),
        wins: 0,
        losses: 0,
        errors: BTreeMap::new(),
        initial_remaining: scenario.initial_remaining(),
        final_remaining: None,
        ledger: LedgerSummary::default(),
        audit: AuditReport::default(),
    };
    while let Some(joined) = tasks.join_next().await {
        match joined?? {
            Ok(result) if result.won => report.wins += 1,
            Ok(_) => report.losses += 1,
            Err(err) => *report.errors.entry(err.kind()).or_default() += 1,
        }
    }

    let public = engine.public_reader().get_public_config().await?;
    report.final_remaining = public.remaining;
    report.ledger = LedgerSummary::build(&*store).await?;
    report.audit = audit(&*store).await?;
    if let Some(initial) = report.initial_remaining {
        report.audit.check_pool_accounting(initial);
    }
    Ok(report)
}

async fn cmd_simulate(args: SimulateArgs, format: OutputFormat) -> anyhow::Result<()> {
    let scenario = Scenario::load(&args.scenario)?;
    let report = simulate(&scenario, args.concurrency, args.seed).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            println!(
                "Redeemed {} code(s) with up to {} in flight",
                report.attempts.to_string().bold(),
                args.concurrency.max(1)
            );
            println!("  Wins:   {}", report.wins.to_string().green());
            println!("  Losses: {}", report.losses);
            for (kind, count) in &report.errors {
                println!("  {}: {}", kind.red(), count);
            }
            for (symbol, count) in &report.ledger.wins_by_symbol {
                println!("    {symbol} x{count}");
            }
            if let (Some(initial), Some(remaining)) =
                (report.initial_remaining, report.final_remaining)
            {
                println!("  Pool:   {initial} -> {}", remaining.to_string().yellow());
            }
            if report.audit.is_consistent() {
                println!("{} Audit clean.", "✓".green().bold());
            } else {
                println!("{} Audit found problems:", "✗".red().bold());
                for problem in &report.audit.problems {
                    println!("  - {problem}");
                }
            }
        }
    }

    if !report.audit.is_consistent() {
        anyhow::bail!("audit failed");
    }
    Ok(())
}

async fn cmd_config(args: ConfigArgs, format: OutputFormat) -> anyhow::Result<()> {
    let scenario = Scenario::load(&args.scenario)?;
    let store = scenario.provision()?;
    let engine = build_engine(&scenario, store, None);
    let public: PublicConfig = engine.public_reader().get_public_config().await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&public)?),
        OutputFormat::Text => {
            if public.is_empty() {
                println!("No prize pool configured.");
            } else {
                println!(
                    "Prize: {}",
                    public.reward_label.as_deref().unwrap_or_default().yellow()
                );
                println!("Remaining: {}", public.remaining.unwrap_or(0).to_string().bold());
            }
        }
    }
    Ok(())
}
