// src/engine.rs
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, sync_channel, Receiver, RecvTimeoutError, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use log::{error, info, warn};

use crate::config::Settings;
use crate::drivers::pipeline::{HandConsumer, LiveFeed};
use crate::drivers::source::{connect_with_retry, GloveLink};
use crate::drivers::{load, render_gesture_plots};
use crate::store::{plot_folder, SessionStore};
use crate::types::{CaptureMessage, GloveCommand, Hand, HandEvent, RawFrame};
use crate::waveform::{LiveDisplay, RedrawTarget};

/// How long to wait for a consumer to hand back its buffer.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// What a completed stop produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Started,
    Saved {
        path: PathBuf,
        left_frames: usize,
        right_frames: usize,
    },
    /// Both hands came back empty; nothing was written.
    NoData,
    Debounced,
}

/// Owns both glove links, their consumer threads and the session store.
pub struct CaptureEngine {
    settings: Settings,
    store: SessionStore,
    links: Vec<Box<dyn GloveLink>>,
    senders: Vec<SyncSender<HandEvent>>,
    consumers: Vec<JoinHandle<()>>,
    messages: Receiver<CaptureMessage>,
    stop: Arc<AtomicBool>,
    display: LiveDisplay,
    recording: bool,
    last_press: Option<Instant>,
    label: Option<String>,
}

impl CaptureEngine {
    /// Connects both gloves (with retry), subscribes them and starts one consumer per hand.
    pub fn start(
        settings: Settings,
        store: SessionStore,
        left: Box<dyn GloveLink>,
        right: Box<dyn GloveLink>,
        redraw: Option<Arc<dyn RedrawTarget>>,
    ) -> Result<Self> {
        let (notify, messages) = channel();
        let stop = Arc::new(AtomicBool::new(false));
        let display = LiveDisplay::new(settings.window);
        let live = LiveFeed {
            display: display.clone(),
            target: redraw,
        };

        let mut links = vec![left, right];
        let mut senders = Vec::with_capacity(2);
        let mut consumers = Vec::with_capacity(2);
        for (hand, link) in Hand::ALL.into_iter().zip(links.iter_mut()) {
            connect_with_retry(
                link.as_mut(),
                settings.connect_attempts,
                settings.connect_backoff(),
            )
            .with_context(|| format!("could not connect the {hand} glove"))?;
            let (tx, rx) = sync_channel(settings.channel_capacity.max(1));
            let consumer = HandConsumer::new(
                hand,
                settings.button_trigger,
                settings.trigger_hand,
                notify.clone(),
            )
            .with_live(live.clone());
            consumers.push(
                consumer
                    .spawn(rx, Arc::clone(&stop))
                    .with_context(|| format!("could not start the {hand} consumer"))?,
            );
            link.subscribe(tx.clone())
                .with_context(|| format!("could not subscribe to the {hand} glove"))?;
            senders.push(tx);
        }
        info!(
            "ready: press the {} glove button to start/stop a gesture",
            settings.trigger_hand
        );

        Ok(Self {
            settings,
            store,
            links,
            senders,
            consumers,
            messages,
            stop,
            display,
            recording: false,
            last_press: None,
            label: None,
        })
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn display(&self) -> &LiveDisplay {
        &self.display
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Label applied to the next saved gesture(s); `None` falls back to a timestamp name.
    pub fn set_label(&mut self, label: Option<String>) {
        self.label = label;
    }

    /// Toggles recording unless the previous press was within the debounce window.
    pub fn on_button(&mut self, now: Instant) -> Result<CaptureOutcome> {
        if let Some(last) = self.last_press {
            if now.saturating_duration_since(last) < self.settings.debounce() {
                info!("button press ignored (debounce)");
                return Ok(CaptureOutcome::Debounced);
            }
        }
        self.last_press = Some(now);
        if self.recording {
            self.finish_recording()
        } else {
            self.begin_recording()?;
            Ok(CaptureOutcome::Started)
        }
    }

    fn broadcast(&self, event: impl Fn() -> HandEvent) -> Result<()> {
        for (hand, sender) in Hand::ALL.into_iter().zip(&self.senders) {
            sender
                .send(event())
                .map_err(|_| anyhow!("{hand} consumer is gone"))?;
        }
        Ok(())
    }

    fn command_all(&mut self, command: GloveCommand) -> Result<()> {
        for (hand, link) in Hand::ALL.into_iter().zip(self.links.iter_mut()) {
            link.write_command(command)
                .with_context(|| format!("could not send {command:?} to the {hand} glove"))?;
        }
        Ok(())
    }

    fn begin_recording(&mut self) -> Result<()> {
        self.broadcast(|| HandEvent::ClearRecording)?;
        self.broadcast(|| HandEvent::StartRecording)?;
        self.display.start();
        self.command_all(GloveCommand::StartBroadcast)?;
        self.recording = true;
        info!("recording started");
        Ok(())
    }

    fn drain(&self, hand: Hand) -> Result<Vec<RawFrame>> {
        let (reply, frames) = channel();
        self.senders[hand.index()]
            .send(HandEvent::Drain(reply))
            .map_err(|_| anyhow!("{hand} consumer is gone"))?;
        frames
            .recv_timeout(DRAIN_TIMEOUT)
            .with_context(|| format!("{hand} consumer did not return its frames"))
    }

    fn finish_recording(&mut self) -> Result<CaptureOutcome> {
        self.command_all(GloveCommand::StopBroadcast)?;
        self.recording = false;
        thread::sleep(self.settings.settle_delay());
        self.broadcast(|| HandEvent::StopRecording)?;
        self.display.stop();

        let left = self.drain(Hand::Left)?;
        let right = self.drain(Hand::Right)?;
        info!(
            "recording stopped: left {} frames, right {} frames",
            left.len(),
            right.len()
        );
        if left.is_empty() && right.is_empty() {
            warn!("no data captured; nothing saved");
            return Ok(CaptureOutcome::NoData);
        }

        let left_device = self.links[0].device().address.clone();
        let right_device = self.links[1].device().address.clone();
        let path = self
            .store
            .persist(&left, &right, &left_device, &right_device, self.label.as_deref())
            .context("failed to save gesture")?;

        if self.settings.auto_plot {
            if let Err(err) = auto_plot(&path, &self.settings) {
                warn!("auto-plot of {} failed: {err:#}", path.display());
            }
        }
        self.broadcast(|| HandEvent::ClearRecording)?;
        Ok(CaptureOutcome::Saved {
            path,
            left_frames: left.len(),
            right_frames: right.len(),
        })
    }

    /// Processes button presses until `gestures` recordings are saved or
    /// `deadline` passes. A persist failure ends the run with an error.
    pub fn run(&mut self, gestures: usize, deadline: Duration) -> Result<Vec<PathBuf>> {
        let started = Instant::now();
        let mut saved = Vec::new();
        let mut closed = 0;
        while saved.len() < gestures {
            let Some(remaining) = deadline.checked_sub(started.elapsed()) else {
                warn!("capture deadline reached with {} gesture(s) saved", saved.len());
                break;
            };
            match self.messages.recv_timeout(remaining.min(Duration::from_millis(250))) {
                Ok(CaptureMessage::ButtonPressed(_)) => match self.on_button(Instant::now()) {
                    Ok(CaptureOutcome::Saved { path, .. }) => saved.push(path),
                    Ok(_) => {}
                    Err(err) => {
                        error!("capture failed: {err:#}");
                        return Err(err);
                    }
                },
                Ok(CaptureMessage::ChannelClosed(hand)) => {
                    warn!("{hand} glove stream closed");
                    closed += 1;
                    if closed == Hand::ALL.len() {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        Ok(saved)
    }

    pub fn shutdown(mut self) -> Result<()> {
        if self.recording {
            let _ = self.command_all(GloveCommand::StopBroadcast);
        }
        for (hand, link) in Hand::ALL.into_iter().zip(self.links.iter_mut()) {
            if let Err(err) = link.disconnect() {
                warn!("disconnecting the {hand} glove failed: {err}");
            }
        }
        self.stop.store(true, Ordering::SeqCst);
        self.senders.clear();
        for consumer in self.consumers.drain(..) {
            if consumer.join().is_err() {
                warn!("a hand consumer panicked");
            }
        }
        info!(
            "session closed: {} gesture(s) saved",
            self.store.info().gesture_count
        );
        Ok(())
    }
}

/// Renders the per-finger figures of a saved gesture next to it.
pub fn auto_plot(path: &std::path::Path, settings: &Settings) -> Result<Vec<PathBuf>> {
    let gesture = load(path).with_context(|| format!("could not reload {}", path.display()))?;
    let folder = plot_folder(path)?;
    Ok(render_gesture_plots(&gesture, &folder, &settings.plot_style())?)
}
