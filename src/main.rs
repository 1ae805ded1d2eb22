//! Skyclimb headless runner
//!
//! Drives the place runner with scripted input, no window or audio. Useful for
//! soak runs, replaying seeds and filling the run log.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use skyclimb::Settings;
use skyclimb::persistence::RunRecord;
use skyclimb::platform::{Key, LogAnnouncer, NullSurface, TickInput};
use skyclimb::sim::{Frame, PlaceRunner, Transition};

/// Skyclimb headless runner
#[derive(Parser)]
#[command(version, about = "Runs the Skyclimb simulation without a window")]
struct Cli {
    /// World seed (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Frames to simulate
    #[arg(long, default_value_t = 3600)]
    ticks: u64,

    /// Settings file (JSON); defaults are used if it does not exist
    #[arg(long, value_name = "PATH", default_value = "skyclimb.json")]
    settings: PathBuf,

    /// Append finished runs to this log, overriding the settings file
    #[arg(long, value_name = "PATH")]
    run_log: Option<PathBuf>,

    /// Let a simple bot play instead of standing still
    #[arg(long)]
    autoplay: bool,

    /// Start a new run whenever one ends
    #[arg(long)]
    restart: bool,
}

/// Bot input: climb, weave, swing and pick things up
fn autoplay_input(frame: u64) -> TickInput {
    let mut keys = vec![Key::Up];
    match frame % 120 {
        0..30 => keys.push(Key::Left),
        60..90 => keys.push(Key::Right),
        _ => {}
    }
    let mut input = TickInput::holding(&keys);
    if frame % 20 == 0 {
        input = input.with_press(Key::LeftHand);
    }
    if frame % 45 == 10 {
        input = input.with_press(Key::Interact);
    }
    if frame % 45 == 30 {
        input = input.with_press(Key::RightHand);
    }
    input
}

fn print_record(record: &RunRecord) {
    println!(
        "seed {} | {} | area {} | distance {:.0} | {} ticks ({:.1}s)",
        record.seed,
        record.end_reason.as_str(),
        record.area_index_reached,
        record.distance_reached,
        record.elapsed_ticks,
        record.elapsed_secs
    );
    for (kind, count) in &record.area_counts {
        println!("    {:<14} {count}", kind.name());
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut settings = match Settings::load(&cli.settings) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(path) = cli.run_log {
        settings.run_log_path = Some(path);
    }

    let seed = cli.seed.unwrap_or_else(rand::random);
    log::info!("Skyclimb (headless) starting with seed {seed}");

    let mut runner = PlaceRunner::new(settings, seed);
    let mut surface = NullSurface;
    let mut announcer = LogAnnouncer;
    // The first frame confirms on the home place, starting the run
    let mut start_pending = true;

    for frame in 0..cli.ticks {
        let input = if start_pending {
            TickInput::default().with_press(Key::Confirm)
        } else if cli.autoplay {
            autoplay_input(frame)
        } else {
            TickInput::default()
        };
        let mut ctx = Frame {
            input: &input,
            surface: &mut surface,
            announcer: &mut announcer,
        };
        match runner.tick(&mut ctx) {
            Transition::StartGame { .. } => start_pending = false,
            Transition::Home if cli.restart => start_pending = true,
            Transition::Home | Transition::Quit => break,
            Transition::Stay => {}
        }
    }

    // Close out a run still in progress
    if runner.place_name() == "game" {
        let cancel = TickInput::default().with_press(Key::Cancel);
        let mut ctx = Frame {
            input: &cancel,
            surface: &mut surface,
            announcer: &mut announcer,
        };
        runner.tick(&mut ctx);
    }

    for record in runner.records() {
        print_record(record);
    }
    ExitCode::SUCCESS
}
