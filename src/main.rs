// src/main.rs
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};

use glovetrace::args::{CommandTask, GloveArgs, PlotCommand, SimulateCommand};
use glovetrace::config::Settings;
use glovetrace::drivers::source::{assign_hands, glove_candidates, DeviceInfo};
use glovetrace::drivers::{
    compare, compare_batch, load, render_gesture_plots, GestureTable, LivePngWriter,
    LoadedGesture, SimulatedGlove,
};
use glovetrace::engine::CaptureEngine;
use glovetrace::store::{plot_folder, GestureStore, SessionStore};
use glovetrace::types::Hand;
use glovetrace::waveform::RedrawTarget;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run(GloveArgs::parse()) {
        log::error!("{err:#}");
        std::process::exit(1);
    }
}

fn run(args: GloveArgs) -> Result<()> {
    let mut settings = Settings::load_or_default(args.config.as_deref())?;
    if let Some(root) = args.data_root {
        settings.data_root = root;
    }
    let store = GestureStore::open(&settings.data_root);

    match args.command {
        CommandTask::Users => {
            let users = store.users()?;
            if users.is_empty() {
                info!("no users found under {}", store.root().display());
            }
            for (i, user) in users.iter().enumerate() {
                let summary = store.user_summary(user)?;
                println!(
                    "{:>3}. {} ({} sessions, {} gestures)",
                    i + 1,
                    summary.user,
                    summary.sessions,
                    summary.gestures
                );
            }
        }
        CommandTask::Sessions { user } => {
            for (i, session) in store.sessions(&user)?.iter().enumerate() {
                let count = store.gestures(&user, session)?.len();
                println!("{:>3}. {session} ({count} gestures)", i + 1);
            }
        }
        CommandTask::Gestures { user, session } => {
            for (i, gesture) in store.gestures(&user, &session)?.iter().enumerate() {
                println!("{:>3}. {gesture}", i + 1);
            }
        }
        CommandTask::Plot(cmd) => plot(&store, &settings, cmd)?,
        CommandTask::Compare(cmd) => {
            let gestures = load_all(&cmd.files)?;
            let path = compare(
                &gestures,
                cmd.hand,
                cmd.start,
                cmd.end,
                &cmd.out,
                &settings.plot_style(),
            )?;
            println!("{}", path.display());
        }
        CommandTask::CompareBatch(cmd) => {
            let gestures = load_all(&cmd.files)?;
            let written = compare_batch(&gestures, cmd.hand, &cmd.out, &settings.plot_style());
            for path in &written {
                println!("{}", path.display());
            }
        }
        CommandTask::ExportCsv(cmd) => {
            let gesture = load(&cmd.file)?;
            let out = cmd.out.unwrap_or_else(|| cmd.file.with_extension("csv"));
            GestureTable::from_gesture(&gesture).export_csv(&out)?;
            println!("{}", out.display());
        }
        CommandTask::Simulate(cmd) => simulate(settings, cmd)?,
    }
    Ok(())
}

fn load_all(files: &[PathBuf]) -> Result<Vec<LoadedGesture>> {
    if files.len() != 2 && files.len() != 4 {
        bail!("comparison needs 2 or 4 recordings, got {}", files.len());
    }
    files
        .iter()
        .map(|f| load(f).with_context(|| format!("could not load {}", f.display())))
        .collect()
}

fn plot(store: &GestureStore, settings: &Settings, cmd: PlotCommand) -> Result<()> {
    let mut files = cmd.files;
    if let Some(pair) = cmd.session {
        let (user, session) = (&pair[0], &pair[1]);
        for gesture in store.gestures(user, session)? {
            files.push(store.gesture_path(user, session, &gesture));
        }
    }
    if files.is_empty() {
        bail!("nothing to plot: pass recording files or --session USER SESSION");
    }
    for file in &files {
        if let Err(err) = plot_one(file, settings) {
            warn!("plotting {} failed: {err:#}", file.display());
        }
    }
    Ok(())
}

fn plot_one(file: &Path, settings: &Settings) -> Result<()> {
    let gesture = load(file)?;
    let folder = plot_folder(file)?;
    render_gesture_plots(&gesture, &folder, &settings.plot_style())?;
    Ok(())
}

/// Gap between the end of one simulated gesture and the next press.
const SIM_PAUSE: Duration = Duration::from_millis(1500);

fn simulate(settings: Settings, cmd: SimulateCommand) -> Result<()> {
    let session = SessionStore::create(&settings.data_root, &cmd.user, &cmd.session)?;

    let discovered: Vec<DeviceInfo> = ["A", "B"]
        .iter()
        .enumerate()
        .map(|(i, tag)| DeviceInfo {
            address: format!("SIM:{:02}", i + 1),
            name: format!("Glovatrix Sim {tag}"),
        })
        .collect();
    let candidates = glove_candidates(&discovered);
    let assignment = assign_hands(
        &candidates,
        cmd.left.saturating_sub(1),
        cmd.right.saturating_sub(1),
    )?;
    info!(
        "left = {} ({}), right = {} ({})",
        assignment.left.name, assignment.left.address, assignment.right.name, assignment.right.address
    );

    let (presses, script_end) = button_script(&cmd, &settings);
    let interval = settings.data_interval();
    let mut left = SimulatedGlove::new(Hand::Left, interval).with_device(assignment.left.clone());
    let mut right =
        SimulatedGlove::new(Hand::Right, interval).with_device(assignment.right.clone());
    // the scripted button lives on whichever glove toggles recording
    match settings.trigger_hand {
        Hand::Left => left = left.with_button_script(presses),
        Hand::Right => right = right.with_button_script(presses),
    }

    let live_dir = cmd.live_dir.clone().or_else(|| settings.live_dir.clone());
    let redraw: Option<Arc<dyn RedrawTarget>> = match live_dir {
        Some(dir) => Some(Arc::new(LivePngWriter::new(dir, settings.plot_style())?) as Arc<dyn RedrawTarget>),
        None => None,
    };

    let mut engine = CaptureEngine::start(settings, session, Box::new(left), Box::new(right), redraw)?;
    engine.set_label(cmd.label.clone());
    let budget = script_end + Duration::from_secs(10);
    let result = engine.run(cmd.gestures, budget);
    engine.shutdown()?;
    let saved = result?;
    for path in &saved {
        println!("{}", path.display());
    }
    if saved.len() < cmd.gestures {
        warn!("{} of {} gestures saved", saved.len(), cmd.gestures);
    }
    Ok(())
}

/// Start/stop press offsets for every gesture, and when the last one ends.
fn button_script(cmd: &SimulateCommand, settings: &Settings) -> (Vec<Duration>, Duration) {
    // a stop press inside the debounce window would be swallowed
    let record = Duration::from_millis(cmd.duration_ms)
        .max(settings.debounce() + Duration::from_millis(100));
    let mut presses = Vec::with_capacity(cmd.gestures * 2);
    let mut at = Duration::from_millis(500);
    for _ in 0..cmd.gestures {
        presses.push(at);
        at += record;
        presses.push(at);
        at += SIM_PAUSE.max(settings.debounce());
    }
    (presses, at)
}
