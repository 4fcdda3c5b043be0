mod runner;
mod store;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use lexpm_core::{BlockPhase, BlockSummary, KindSummary, Session, TaskType};
use lexpm_experiment::{
    generate_main_sequence, generate_training_sequence, EngineConfig, ResultStore, SequenceConfig,
    TrialEngine,
};
use lexpm_timing::{Clock, MonotonicClock};

use runner::SimulatedParticipant;
use store::JsonFileStore;

/// Runs one lexical-decision / prospective-memory block headlessly,
/// with a simulated participant standing in for keyboard input, and
/// persists the session as JSON.
#[derive(Debug, Parser)]
#[command(name = "lexpm", version, about)]
struct Args {
    #[arg(long, value_enum, default_value_t = TaskArg::Pm)]
    task: TaskArg,
    #[arg(long, value_enum, default_value_t = PhaseArg::Before)]
    phase: PhaseArg,
    #[arg(long, default_value = "anonymous")]
    participant: String,
    /// Seed for sequence generation and the simulated participant.
    #[arg(long)]
    seed: Option<u64>,
    /// Run the short training block with feedback instead of a main block.
    #[arg(long)]
    training: bool,
    /// Directory session JSON files are written to.
    #[arg(long, default_value = "sessions")]
    out_dir: PathBuf,
    /// Chance the simulated participant presses the expected key.
    #[arg(long, default_value_t = 0.9)]
    accuracy: f64,
    /// Chance the simulated participant lets a trial time out.
    #[arg(long, default_value_t = 0.05)]
    lapse_rate: f64,
    #[arg(long)]
    pm_trials: Option<usize>,
    #[arg(long)]
    stimulus_window_ms: Option<u64>,
    #[arg(long)]
    isi_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TaskArg {
    Ld,
    Pm,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PhaseArg {
    Before,
    After,
}

impl From<TaskArg> for TaskType {
    fn from(arg: TaskArg) -> Self {
        match arg {
            TaskArg::Ld => TaskType::Ld,
            TaskArg::Pm => TaskType::Pm,
        }
    }
}

impl From<PhaseArg> for BlockPhase {
    fn from(arg: PhaseArg) -> Self {
        match arg {
            PhaseArg::Before => BlockPhase::Before,
            PhaseArg::After => BlockPhase::After,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let task: TaskType = args.task.into();
    let phase: BlockPhase = args.phase.into();

    let seed = args.seed.unwrap_or_else(|| rand::rng().random());
    info!(seed, ?task, ?phase, training = args.training, "starting block");

    let mut sequence_config = SequenceConfig::default();
    if let Some(n) = args.pm_trials {
        sequence_config.pm_trials_per_block = n;
    }
    let mut engine_config = EngineConfig::default();
    if let Some(ms) = args.stimulus_window_ms {
        engine_config.stimulus_window_ms = ms;
    }
    if let Some(ms) = args.isi_ms {
        engine_config.isi_ms = ms;
    }

    let mut sequence_rng = StdRng::seed_from_u64(seed);
    let sequence = if args.training {
        generate_training_sequence(task, &sequence_config, &mut sequence_rng)?
    } else {
        generate_main_sequence(task, phase, &sequence_config, &mut sequence_rng)?
    };

    let clock = MonotonicClock::new();
    let session = Session {
        id: format!("{:012x}-{:04x}", clock.epoch_ms(), sequence_rng.random::<u16>()),
        participant_id: args.participant.clone(),
        task_type: task,
        phase,
        started_at_epoch_ms: clock.epoch_ms(),
        completed_at_epoch_ms: None,
    };

    // Persistence is best-effort at the run boundaries only; a failing
    // store never blocks or invalidates the run itself.
    let mut file_store = JsonFileStore::new(args.out_dir.clone());
    if let Err(err) = file_store.open_session(&session) {
        warn!(%err, "could not open session record");
    }

    let engine_rng = StdRng::seed_from_u64(seed.wrapping_add(0x9e37_79b9_7f4a_7c15));
    let mut engine = TrialEngine::new(
        sequence,
        engine_config,
        session.id.clone(),
        args.training,
        clock.clone(),
        engine_rng,
    )?;
    engine.set_on_result(|result| {
        debug!(
            trial = result.trial_index,
            kind = ?result.stimulus_kind,
            correct = result.correct,
            rt_ms = result.reaction_time_ms,
            "trial resolved"
        );
    });

    let mut participant = SimulatedParticipant::new(
        task,
        args.accuracy,
        args.lapse_rate,
        StdRng::seed_from_u64(seed.wrapping_add(1)),
    );
    let results = runner::run_block(&mut engine, &clock, &mut participant);

    let completed_at = clock.epoch_ms();
    if let Err(err) = file_store.submit_trials(&session.id, &results) {
        warn!(%err, "could not persist trial batch");
    }
    if let Err(err) = file_store.close_session(&session.id, completed_at) {
        warn!(%err, "could not close session record");
    }

    print_summary(&session, &BlockSummary::from_results(&results));
    Ok(())
}

fn print_summary(session: &Session, summary: &BlockSummary) {
    println!("\n=== BLOCK SUMMARY ===");
    println!("Session: {}", session.id);
    println!(
        "Trials: {} total, {} responded, accuracy {:.1}%",
        summary.overall.total,
        summary.overall.responded,
        summary.overall.accuracy() * 100.0
    );
    let rows: [(&str, &KindSummary); 3] = [
        ("word", &summary.word),
        ("nonword", &summary.nonword),
        ("pm cue", &summary.pm_cue),
    ];
    for (label, kind) in rows {
        if kind.total == 0 {
            continue;
        }
        let mean_rt = kind
            .mean_reaction_time_ms
            .map(|rt| format!("{rt:.0} ms"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {label:8} n={:3}  accuracy {:5.1}%  mean RT {mean_rt}",
            kind.total,
            kind.accuracy() * 100.0
        );
    }
}
