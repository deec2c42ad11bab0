//! # Golden Path
//!
//! Drives both services end to end:
//!
//! 1. Pool scenario: a critical record pinned in a fixed pool, a low record
//!    bank-switched into overflow when a medium record needs its room
//! 2. Arena scenario: a two-slot arena evicting its oldest non-root node
//! 3. Workload: seeded document ingest plus a short UCB search loop against
//!    the sample (or given) config, then a TOML snapshot
//!
//! Run with: `cargo run --bin golden_path [-- path/to/docpool.toml]`
//!
//! Set `RUST_LOG=debug` to watch admissions and evictions.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use docpool::core::arena::NodeHandle;
use docpool::core::config::{AllocatorConfig, ArenaConfig, PoolConfig};
use docpool::core::priority::{Category, Urgency};
use docpool::{DocumentService, Monitor, PlanningService, ServiceConfig, ServiceError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Config used when no path is given.
const SAMPLE_CONFIG: &str = include_str!("../../../../config/docpool.toml");

/// Documents submitted by the workload phase.
const WORKLOAD_DOCUMENTS: usize = 5_000;

/// Simulations run by the workload phase.
const WORKLOAD_SIMULATIONS: usize = 2_000;

/// Seed for every random choice in the workload.
const SEED: u64 = 0x5EED_D0C5;

/// Ways the run can fail.
#[derive(Error, Debug)]
enum GoldenPathError {
    /// A service call failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// A scenario observed something other than the expected outcome.
    #[error("check failed: {0}")]
    Check(String),

    /// The monitor dropped the feed before delivering a snapshot.
    #[error("monitor feed closed")]
    FeedClosed,
}

type GoldenPathResult<T> = Result<T, GoldenPathError>;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_thread_names(true)
        .init();
}

/// Fails the run with a readable message when a step diverges.
fn expect(condition: bool, what: &str) -> GoldenPathResult<()> {
    if condition {
        println!("│ ✓ {what}");
        Ok(())
    } else {
        println!("│ ✗ {what}");
        Err(GoldenPathError::Check(what.to_string()))
    }
}

fn pool_scenario() -> GoldenPathResult<()> {
    println!("┌─ POOL SCENARIO ──────────────────────────────────────────────────┐");
    let config = AllocatorConfig::new(
        vec![
            PoolConfig::new("A", 100, false).prefer_urgencies(&[Urgency::Critical]),
            PoolConfig::new("B", 100, true).prefer_urgencies(&[
                Urgency::Low,
                Urgency::Medium,
                Urgency::High,
            ]),
            PoolConfig::new("overflow", 1_000, false),
        ],
        "overflow",
    );
    let documents = DocumentService::new(config)?;

    let r1 = documents.submit("r1", Category::Contract, Urgency::Critical, 1.0, 80)?;
    expect(documents.pool_name(r1.pool).as_deref() == Some("A"), "r1 admitted into A")?;

    let r2 = documents.submit("r2", Category::Brief, Urgency::Low, 0.5, 90)?;
    expect(documents.pool_name(r2.pool).as_deref() == Some("B"), "r2 admitted into B")?;

    let r3 = documents.submit("r3", Category::Brief, Urgency::Medium, 0.5, 50)?;
    expect(r3.relocated == vec!["r2".to_string()], "r3 relocated r2")?;

    let r2_home = documents.lookup("r2").and_then(|r| documents.pool_name(r.owning_pool));
    expect(r2_home.as_deref() == Some("overflow"), "r2 now owned by overflow")?;
    expect(documents.lookup("r1").is_some(), "critical r1 untouched")?;
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();
    Ok(())
}

fn arena_scenario() -> GoldenPathResult<()> {
    println!("┌─ ARENA SCENARIO ─────────────────────────────────────────────────┐");
    let planning = PlanningService::new(ArenaConfig::new(2))?;

    let s0 = planning.allocate_node("s0", None, 1.0, 0)?;
    expect(s0 == NodeHandle::ROOT, "s0 is the root")?;
    let s1 = planning.allocate_node("s1", Some(s0), 0.5, 1)?;
    expect(s1 == NodeHandle::new(1), "s1 takes slot 1")?;
    expect(planning.summarize().free == 0, "arena full")?;

    let s2 = planning.allocate_node("s2", Some(s0), 0.5, 1)?;
    expect(s2 == s1, "s2 reuses the evicted slot")?;
    expect(planning.handle_of("s2") == Some(s2), "slot now maps to s2")?;
    expect(planning.handle_of("s1").is_none(), "s1 mapping removed")?;
    expect(planning.get_transposition("s1").is_none(), "no transposition for s1")?;
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();
    Ok(())
}

fn workload(config: ServiceConfig) -> GoldenPathResult<()> {
    println!("┌─ WORKLOAD ───────────────────────────────────────────────────────┐");
    let documents = Arc::new(DocumentService::new(config.allocator)?);
    let planning = Arc::new(PlanningService::new(config.arena)?);
    let monitor = Monitor::new(Arc::clone(&documents), Arc::clone(&planning));
    let mut rng = StdRng::seed_from_u64(SEED);

    let start = Instant::now();
    let mut rejected = 0usize;
    for i in 0..WORKLOAD_DOCUMENTS {
        let category = Category::ALL[rng.gen_range(0..Category::ALL.len())];
        let urgency = Urgency::ALL[rng.gen_range(0..Urgency::ALL.len())];
        let size = rng.gen_range(1_024..65_536);
        if documents
            .submit(&format!("doc-{i}"), category, urgency, rng.gen_range(0.0..1.0), size)
            .is_err()
        {
            rejected += 1;
        }
        if i % 7 == 0 {
            let probe = rng.gen_range(0..=i);
            let _ = documents.lookup(&format!("doc-{probe}"));
        }
    }
    let ingest = start.elapsed();
    println!("│ Documents:          {WORKLOAD_DOCUMENTS} submitted, {rejected} rejected");
    println!("│ Ingest time:        {:.3} ms", ingest.as_secs_f64() * 1_000.0);

    let start = Instant::now();
    let root = planning.allocate_node("state", None, 1.0, 0)?;
    for sim in 0..WORKLOAD_SIMULATIONS {
        let mut path = vec![root];
        let mut node = root;
        let mut key = String::from("state");
        for depth in 1..=8u16 {
            if let Some(child) = planning.choose_child(node, None)? {
                if planning.node(child).is_some_and(|n| n.visits > 0) || rng.gen_bool(0.5) {
                    node = child;
                    path.push(node);
                    key = planning.external_id(node).unwrap_or_default();
                    continue;
                }
            }
            key = format!("{key}/{}", rng.gen_range(0..4));
            node = planning.allocate_node(&key, Some(node), rng.gen_range(0.05..1.0), depth)?;
            path.push(node);
            break;
        }
        let value = rng.gen_range(-1.0..1.0);
        if let Err(e) = planning.backpropagate(&path, value) {
            // A node on the path may have been evicted by the expansion.
            debug!("Simulation {} dropped a stale path: {}", sim, e);
        }
        if let Some(stats) = planning.node(node) {
            planning.cache_transposition(&key, stats.visits, stats.mean_value());
        }
    }
    let search = start.elapsed();
    println!("│ Simulations:        {WORKLOAD_SIMULATIONS}");
    println!("│ Search time:        {:.3} ms", search.as_secs_f64() * 1_000.0);

    documents.collect_garbage();
    let feed = monitor.subscribe(1);
    monitor.publish();
    let snapshot = feed.recv().map_err(|_| GoldenPathError::FeedClosed)?;
    println!("│ Lookup hit rate:    {:.1}%", snapshot.allocator.counters.hit_rate() * 100.0);
    println!("│ Relocations:        {}", snapshot.allocator.counters.relocations);
    println!("│ Arena allocated:    {}/{}", snapshot.arena.allocated, snapshot.arena.capacity);
    println!("│ Arena evictions:    {}", snapshot.arena.evictions);
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();
    println!("{}", snapshot.to_toml()?);
    Ok(())
}

fn run() -> GoldenPathResult<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => ServiceConfig::from_file(path)?,
        None => ServiceConfig::from_toml_str(SAMPLE_CONFIG)?,
    };

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║           DOCPOOL GOLDEN PATH                                    ║");
    println!("║           Submit → Route → Bank Switch → Plan → Snapshot         ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    pool_scenario()?;
    arena_scenario()?;
    workload(config)
}

fn main() -> ExitCode {
    init_logging();
    match run() {
        Ok(()) => {
            info!("Golden path complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Golden path failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
