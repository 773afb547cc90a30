//! Stockroom Headless Round Harness
//!
//! Plays full rounds against the simulation core the way the game scene
//! does: a one-second clock, a picker walking the floor, and commands issued
//! through the public API. Invariants are checked after every tick.
//! Runs entirely in-process with no rendering or input.
//!
//! Usage:
//!   cargo run -p stockroom-simtest
//!   cargo run -p stockroom-simtest -- --seed 7 --rounds 10 --verbose
//!   cargo run -p stockroom-simtest -- --config data/sample_round.json --json

mod clock;
mod picker;
mod report;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use stockroom_logic::carrier::InventoryCarrier;
use stockroom_logic::constants::CARRY_CAPACITY;
use stockroom_logic::controller::{CommandError, RoundSummary, Workload};
use stockroom_logic::layout::WarehouseLayout;
use stockroom_logic::round::{Mode, RoundConfig, RoundState};
use stockroom_logic::slots::StockSnapshot;
use stockroom_logic::{RoundController, SlotStore};

use clock::RoundClock;
use picker::{ScriptedPicker, TickAction};
use report::{RunReport, TestResult};

// ── Bundled data (same files the game ships with) ───────────────────────
const LAYOUT_JSON: &str = include_str!("../../../data/warehouse_layout.json");
const SAMPLE_ROUND_JSON: &str = include_str!("../../../data/sample_round.json");

#[derive(Debug, Parser)]
#[command(name = "stockroom-simtest", about = "Headless round harness for Stockroom")]
struct Args {
    /// Seed for starting stock and task generation.
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Rounds to play back to back on the same floor.
    #[arg(long, default_value_t = 5)]
    rounds: u32,
    /// Round config JSON to use for every round (generated if omitted).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Warehouse layout JSON (default two-zone floor if omitted).
    #[arg(long)]
    layout: Option<PathBuf>,
    /// Debug logging and every check listed, not just failures.
    #[arg(long)]
    verbose: bool,
    /// Print the run report as JSON instead of the text summary.
    #[arg(long)]
    json: bool,
}

type Controller = RoundController<StdRng>;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let layout = match &args.layout {
        Some(path) => load_layout(path)?,
        None => WarehouseLayout::default(),
    };
    let config = args.config.as_deref().map(load_config).transpose()?;

    if !args.json {
        println!("=== Stockroom Round Harness ===\n");
    }

    let mut report = RunReport {
        seed: args.seed,
        ..Default::default()
    };

    // 1. Bundled data
    report.results.extend(validate_bundled_data());

    // 2. Floor layout
    report.results.extend(validate_layout(&layout));
    let mut store = SlotStore::from_layout(&layout).map_err(|errors| {
        anyhow::anyhow!(
            "invalid layout: {}",
            errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        )
    })?;
    store.seed_starting_stock(&mut StdRng::seed_from_u64(args.seed));
    log::info!(
        "Floor ready: {} slots, {} units in stock",
        store.len(),
        store.total_quantity()
    );
    let mut ctl = RoundController::new(store, StdRng::seed_from_u64(args.seed.wrapping_add(1)));

    // 3. Rounds
    for round in 1..=args.rounds {
        let (summary, result) = play_round(&mut ctl, config.clone(), round);
        report.rounds.extend(summary);
        report.results.push(result);
    }

    // 4. Restart fidelity
    report.results.extend(validate_restart(&mut ctl, config.clone()));

    // 5. Rejected commands are no-ops
    report.results.extend(validate_rejections(&mut ctl));

    // ── Summary ──
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report, args.verbose);
    }

    if report.failed() > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn load_layout(path: &Path) -> anyhow::Result<WarehouseLayout> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading layout {}", path.display()))?;
    WarehouseLayout::from_json(&json).with_context(|| format!("parsing layout {}", path.display()))
}

fn load_config(path: &Path) -> anyhow::Result<RoundConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading round config {}", path.display()))?;
    let config = RoundConfig::from_json(&json)
        .with_context(|| format!("parsing round config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("validating round config {}", path.display()))?;
    Ok(config)
}

fn print_summary(report: &RunReport, verbose: bool) {
    println!("--- Rounds ---");
    for summary in &report.rounds {
        println!(
            "  {}: {:?} score={} bonus={} total={}",
            summary.round_id, summary.outcome, summary.score, summary.time_bonus, summary.total
        );
    }
    println!();
    for r in &report.results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }
    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        report.passed(),
        report.results.len(),
        report.failed()
    );
}

// ── State observation ───────────────────────────────────────────────────

/// Everything a rejected command must leave untouched.
#[derive(Debug, PartialEq)]
struct Observed {
    stock: StockSnapshot,
    workload: Workload,
    carrier: InventoryCarrier,
    round: Option<RoundState>,
}

fn observe(ctl: &Controller) -> Observed {
    Observed {
        stock: ctl.store().stock_snapshot(),
        workload: ctl.workload().clone(),
        carrier: ctl.inventory().clone(),
        round: ctl.round_state().cloned(),
    }
}

// ── 1. Bundled data ─────────────────────────────────────────────────────

fn validate_bundled_data() -> Vec<TestResult> {
    let mut results = Vec::new();

    match WarehouseLayout::from_json(LAYOUT_JSON) {
        Ok(layout) => {
            results.push(TestResult::new(
                "bundled_layout_matches_default",
                layout == WarehouseLayout::default(),
                format!("{} racks, {} slots", layout.racks.len(), layout.slot_count()),
            ));
        }
        Err(e) => results.push(TestResult::new(
            "bundled_layout_parse",
            false,
            format!("JSON parse error: {}", e),
        )),
    }

    match RoundConfig::from_json(SAMPLE_ROUND_JSON) {
        Ok(config) => {
            let valid = config.validate();
            results.push(TestResult::new(
                "bundled_round_valid",
                valid.is_ok(),
                match valid {
                    Ok(()) => format!("{} phases, {}s", config.phases.len(), config.time_limit),
                    Err(e) => e.to_string(),
                },
            ));
        }
        Err(e) => results.push(TestResult::new(
            "bundled_round_parse",
            false,
            format!("JSON parse error: {}", e),
        )),
    }

    results
}

// ── 2. Layout ───────────────────────────────────────────────────────────

fn validate_layout(layout: &WarehouseLayout) -> Vec<TestResult> {
    let errors = layout.validate();
    let mut results = vec![TestResult::new(
        "layout_valid",
        errors.is_empty(),
        if errors.is_empty() {
            format!("{} slots", layout.slot_count())
        } else {
            errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ")
        },
    )];
    if !errors.is_empty() {
        return results;
    }

    let clear = [picker::START_TILE, picker::DOCK_TILE, picker::PACK_STATION_TILE];
    let blocked: Vec<_> = layout
        .racks
        .iter()
        .flat_map(|r| r.positions().collect::<Vec<_>>())
        .filter(|(_, x, y)| clear.contains(&(*x, *y)))
        .map(|(id, _, _)| id)
        .collect();
    results.push(TestResult::new(
        "layout_stations_clear",
        blocked.is_empty(),
        if blocked.is_empty() {
            "start, dock and pack station are open floor".to_string()
        } else {
            format!("slots on station tiles: {}", blocked.join(", "))
        },
    ));
    results
}

// ── 3. Rounds ───────────────────────────────────────────────────────────

/// Play one round until it finishes or the clock runs out, checking
/// invariants after every tick.
fn play_round(
    ctl: &mut Controller,
    config: Option<RoundConfig>,
    number: u32,
) -> (Option<RoundSummary>, TestResult) {
    let name = format!("round_{}_invariants", number);
    let config = match ctl.start_round(config) {
        Ok(state) => state.config.clone(),
        Err(e) => return (None, TestResult::new(name, false, e.to_string())),
    };

    let mut clock = RoundClock::new(config.time_limit);
    let mut picker = ScriptedPicker::default();
    let mut violations = Vec::new();
    let mut commands = 0;
    let mut last_phase = 0;

    while !clock.expired() && !ctl.round_state().is_some_and(|r| r.is_finished) {
        let mode = ctl.mode();
        let before_total = ctl.store().total_quantity();

        if let TickAction::Command { name: command, result } = picker.tick(ctl) {
            commands += 1;
            if let Err(e) = result {
                violations.push(format!("t={} {} rejected: {}", clock.elapsed(), command, e));
            }
        }
        clock.tick();

        violations.extend(check_invariants(ctl, mode, before_total, &mut last_phase));
    }

    if let Some(state) = ctl.round_state() {
        log::info!(
            "Round {} stopped at t={}s with {} phases remaining",
            config.id,
            clock.elapsed(),
            state.phases_remaining()
        );
    }
    let summary = ctl.round_summary(clock.remaining() as f64);
    let detail = match (&summary, violations.first()) {
        (_, Some(first)) => format!("{} violations, first: {}", violations.len(), first),
        (Some(s), None) => format!(
            "{} phases, {} commands, {:?} with {}s left, total {}",
            config.phases.len(),
            commands,
            s.outcome,
            clock.remaining(),
            s.total
        ),
        (None, None) => "no round state after play".to_string(),
    };
    let passed = violations.is_empty() && summary.is_some();
    (summary, TestResult::new(name, passed, detail))
}

fn check_invariants(
    ctl: &Controller,
    mode: Mode,
    before_total: u64,
    last_phase: &mut usize,
) -> Vec<String> {
    let mut violations = Vec::new();
    let Some(state) = ctl.round_state() else {
        violations.push("round state disappeared".to_string());
        return violations;
    };

    if ctl.inventory().len() > CARRY_CAPACITY {
        violations.push(format!("carrier holds {}", ctl.inventory().len()));
    }
    if state.current_phase_index < *last_phase {
        violations.push(format!(
            "phase index went back from {} to {}",
            last_phase, state.current_phase_index
        ));
    }
    *last_phase = state.current_phase_index;
    if state.is_finished != (state.current_phase_index == state.config.phases.len()) {
        violations.push(format!(
            "finished={} at phase {}/{}",
            state.is_finished,
            state.current_phase_index,
            state.config.phases.len()
        ));
    }

    let after_total = ctl.store().total_quantity();
    let stock_ok = match mode {
        Mode::Picking => after_total == before_total || after_total + 1 == before_total,
        Mode::Inbound => after_total == before_total || after_total == before_total + 1,
    };
    if !stock_ok {
        violations.push(format!(
            "stock moved {} -> {} during {:?}",
            before_total, after_total, mode
        ));
    }
    violations
}

// ── 4. Restart ──────────────────────────────────────────────────────────

fn validate_restart(ctl: &mut Controller, config: Option<RoundConfig>) -> Vec<TestResult> {
    let mut results = Vec::new();
    let config = match ctl.start_round(config) {
        Ok(state) => state.config.clone(),
        Err(e) => {
            results.push(TestResult::new("restart_start", false, e.to_string()));
            return results;
        }
    };
    let start_stock = ctl.store().stock_snapshot();

    // Play half the clock so the floor has moved.
    let mut picker = ScriptedPicker::default();
    let mut clock = RoundClock::new(config.time_limit / 2);
    while clock.tick() {
        picker.tick(ctl);
    }
    let moved = ctl.store().stock_snapshot() != start_stock;

    match ctl.restart_round() {
        Ok(state) => {
            results.push(TestResult::new(
                "restart_resets_round",
                state.score == 0
                    && state.current_phase_index == 0
                    && !state.is_finished
                    && state.config == config,
                format!(
                    "score={} phase={} config={}",
                    state.score, state.current_phase_index, state.config.id
                ),
            ));
        }
        Err(e) => {
            results.push(TestResult::new("restart_resets_round", false, e.to_string()));
            return results;
        }
    }

    results.push(TestResult::new(
        "restart_restores_stock",
        ctl.store().stock_snapshot() == start_stock,
        format!(
            "floor {} before restart, {} units after",
            if moved { "changed" } else { "unchanged" },
            ctl.store().total_quantity()
        ),
    ));
    results.push(TestResult::new(
        "restart_clears_carrier",
        ctl.inventory().is_empty(),
        format!("{} items carried", ctl.inventory().len()),
    ));
    results
}

// ── 5. Rejections ───────────────────────────────────────────────────────

fn validate_rejections(ctl: &mut Controller) -> Vec<TestResult> {
    type Probe = (&'static str, fn(&mut Controller) -> Result<(), CommandError>);
    let off_mode: [Probe; 2] = match ctl.mode() {
        Mode::Picking => [
            ("receive_in_picking", |c: &mut Controller| c.receive_item_from_dock().map(|_| ())),
            ("put_away_in_picking", |c: &mut Controller| c.put_away_item("A-01-1")),
        ],
        Mode::Inbound => [
            ("pick_in_inbound", |c: &mut Controller| c.pick_item("A-01-1")),
            ("ship_in_inbound", |c: &mut Controller| c.complete_order()),
        ],
    };
    let unknown: [Probe; 2] = [
        ("pick_unknown_slot", |c: &mut Controller| c.pick_item("Z-99-9")),
        ("put_away_unknown_slot", |c: &mut Controller| c.put_away_item("Z-99-9")),
    ];

    off_mode
        .into_iter()
        .chain(unknown)
        .map(|(name, probe)| {
            let before = observe(ctl);
            let result = probe(ctl);
            let unchanged = observe(ctl) == before;
            TestResult::new(
                format!("reject_{}", name),
                result.is_err() && unchanged,
                match result {
                    Ok(()) => "command was accepted".to_string(),
                    Err(e) if unchanged => format!("{:?}: {}", e.kind(), e),
                    Err(e) => format!("state changed despite rejection: {}", e),
                },
            )
        })
        .collect()
}
