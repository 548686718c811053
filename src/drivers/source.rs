use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use log::{debug, info, warn};
use rand::Rng;
use crate::drivers::codec::{ACC_COUNTS_PER_G, GYRO_COUNTS_PER_DPS};
use crate::drivers::GloveError;
use crate::types::{GloveCommand, Hand, HandEvent, SensorUnit, FRAME_LEN};
/// Advertised names containing this (any case) are glove candidates.
pub const GLOVE_NAME_PATTERN: &str = "glovatrix";
/// Byte a glove sends on its control characteristic when its button is pressed.
pub const DEFAULT_BUTTON_TRIGGER: u8 = 64;
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceInfo {
    pub address: String,
    pub name: String,
}
pub fn is_glove_candidate(name: &str) -> bool {
    name.to_lowercase().contains(GLOVE_NAME_PATTERN)
}
pub fn glove_candidates(devices: &[DeviceInfo]) -> Vec<DeviceInfo> {
    devices
        .iter()
        .filter(|d| is_glove_candidate(&d.name))
        .cloned()
        .collect()
}
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandAssignment {
    pub left: DeviceInfo,
    pub right: DeviceInfo,
}
impl HandAssignment {
    pub fn device(&self, hand: Hand) -> &DeviceInfo {
        match hand {
            Hand::Left => &self.left,
            Hand::Right => &self.right,
        }
    }
}
/// Binds two distinct candidates, chosen by the operator, to the hands.
///
/// Discovery order never decides which glove is which.
pub fn assign_hands(
    candidates: &[DeviceInfo],
    left: usize,
    right: usize,
) -> Result<HandAssignment, GloveError> {
    if left == right {
        return Err(GloveError::HandAssignment(
            "left and right must be different devices".into(),
        ));
    }
    let pick = |idx: usize, hand: Hand| {
        candidates.get(idx).cloned().ok_or_else(|| {
            GloveError::HandAssignment(format!(
                "{hand} device #{} not in list of {}",
                idx + 1,
                candidates.len()
            ))
        })
    };
    Ok(HandAssignment {
        left: pick(left, Hand::Left)?,
        right: pick(right, Hand::Right)?,
    })
}
/// A single `trigger` byte, or `trigger` anywhere in the payload.
pub fn is_button_press(payload: &[u8], trigger: u8) -> bool {
    payload.contains(&trigger)
}
/// Data payloads that look like a lone button byte are not sensor data.
pub fn is_control_shaped(payload: &[u8], trigger: u8) -> bool {
    payload.len() == 1 && payload[0] == trigger
}
/// Connection to one glove. Notifications are delivered into the hand's
/// event channel once subscribed.
pub trait GloveLink: Send {
    fn device(&self) -> &DeviceInfo;
    fn connect(&mut self) -> Result<(), GloveError>;
    fn subscribe(&mut self, events: SyncSender<HandEvent>) -> Result<(), GloveError>;
    fn write_command(&mut self, command: GloveCommand) -> Result<(), GloveError>;
    fn disconnect(&mut self) -> Result<(), GloveError>;
}
pub fn connect_with_retry(
    link: &mut dyn GloveLink,
    attempts: u32,
    backoff: Duration,
) -> Result<(), GloveError> {
    let attempts = attempts.max(1);
    let mut last_err = None;
    for attempt in 1..=attempts {
        match link.connect() {
            Ok(()) => {
                info!("connected to {} ({})", link.device().name, link.device().address);
                return Ok(());
            }
            Err(err) => {
                warn!(
                    "connect to {} failed (attempt {attempt}/{attempts}): {err}",
                    link.device().name
                );
                // A half-open link is torn down before retrying.
                let _ = link.disconnect();
                last_err = Some(err);
                if attempt < attempts {
                    thread::sleep(backoff);
                }
            }
        }
    }
    Err(last_err.unwrap_or_else(|| GloveError::Transport("no connection attempt made".into())))
}
/// In-process glove that streams synthetic motion while broadcasting.
pub struct SimulatedGlove {
    device: DeviceInfo,
    hand: Hand,
    interval: Duration,
    /// Offsets from `subscribe` at which a button press is emitted.
    button_script: Vec<Duration>,
    failures_before_connect: u32,
    connected: bool,
    broadcasting: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}
impl SimulatedGlove {
    pub fn new(hand: Hand, interval: Duration) -> Self {
        Self {
            device: DeviceInfo {
                address: format!("SIM:{}", hand.label().to_uppercase()),
                name: format!("Glovatrix Sim {hand}"),
            },
            hand,
            interval,
            button_script: Vec::new(),
            failures_before_connect: 0,
            connected: false,
            broadcasting: Arc::new(AtomicBool::new(false)),
            stop: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }
    /// Uses a discovered device's identity instead of the generated one.
    pub fn with_device(mut self, device: DeviceInfo) -> Self {
        self.device = device;
        self
    }
    pub fn with_button_script(mut self, presses: Vec<Duration>) -> Self {
        self.button_script = presses;
        self
    }
    /// The first `n` connection attempts fail.
    pub fn with_flaky_connect(mut self, n: u32) -> Self {
        self.failures_before_connect = n;
        self
    }
    pub fn is_broadcasting(&self) -> bool {
        self.broadcasting.load(Ordering::SeqCst)
    }
}
impl GloveLink for SimulatedGlove {
    fn device(&self) -> &DeviceInfo {
        &self.device
    }
    fn connect(&mut self) -> Result<(), GloveError> {
        if self.failures_before_connect > 0 {
            self.failures_before_connect -= 1;
            return Err(GloveError::Transport(format!(
                "{} did not answer",
                self.device.name
            )));
        }
        self.connected = true;
        Ok(())
    }
    fn subscribe(&mut self, events: SyncSender<HandEvent>) -> Result<(), GloveError> {
        if !self.connected {
            return Err(GloveError::Transport("subscribe before connect".into()));
        }
        self.stop.store(false, Ordering::SeqCst);
        let hand = self.hand;
        let interval = self.interval;
        let mut script = self.button_script.clone();
        script.sort();
        let broadcasting = Arc::clone(&self.broadcasting);
        let stop = Arc::clone(&self.stop);
        let worker = thread::Builder::new()
            .name(format!("sim-{}", hand.label().to_lowercase()))
            .spawn(move || {
                let started = Instant::now();
                let mut rng = rand::thread_rng();
                let mut next_press = 0;
                let mut tick: u64 = 0;
                while !stop.load(Ordering::SeqCst) {
                    if next_press < script.len() && started.elapsed() >= script[next_press] {
                        next_press += 1;
                        if events.send(HandEvent::Control(vec![DEFAULT_BUTTON_TRIGGER])).is_err() {
                            break;
                        }
                    }
                    if broadcasting.load(Ordering::SeqCst) {
                        let payload = synthetic_payload(tick, &mut rng);
                        match events.try_send(HandEvent::Data(payload)) {
                            Ok(()) => {}
                            Err(TrySendError::Full(_)) => debug!("[{hand}] channel full, frame dropped"),
                            Err(TrySendError::Disconnected(_)) => break,
                        }
                        tick += 1;
                    }
                    thread::sleep(interval);
                }
                debug!("[{hand}] simulated glove stopped");
            })?;
        self.worker = Some(worker);
        Ok(())
    }
    fn write_command(&mut self, command: GloveCommand) -> Result<(), GloveError> {
        if !self.connected {
            return Err(GloveError::Transport(format!(
                "{} is not connected",
                self.device.name
            )));
        }
        debug!("[{}] command {:02x?}", self.hand, command.bytes());
        self.broadcasting
            .store(command == GloveCommand::StartBroadcast, Ordering::SeqCst);
        Ok(())
    }
    fn disconnect(&mut self) -> Result<(), GloveError> {
        self.stop.store(true, Ordering::SeqCst);
        self.broadcasting.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("[{}] simulated glove worker panicked", self.hand);
            }
        }
        self.connected = false;
        Ok(())
    }
}
impl Drop for SimulatedGlove {
    fn drop(&mut self) {
        let _ = self.disconnect();
    }
}
/// One frame of slow per-unit oscillation plus noise, packed as LE u16.
fn synthetic_payload(tick: u64, rng: &mut impl Rng) -> Vec<u8> {
    let t = tick as f64 * 0.05;
    let mut values = Vec::with_capacity(FRAME_LEN);
    for unit in SensorUnit::ALL {
        let phase = unit.index() as f64 * 0.7;
        for axis in 0..3 {
            let g = 0.8 * (t + phase + axis as f64).sin() + rng.gen_range(-0.02..0.02);
            values.push(to_counts(g * ACC_COUNTS_PER_G));
        }
        for axis in 0..3 {
            let dps = 90.0 * (1.3 * t + phase + axis as f64).cos() + rng.gen_range(-2.0..2.0);
            values.push(to_counts(dps * GYRO_COUNTS_PER_DPS));
        }
    }
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}
fn to_counts(value: f64) -> u16 {
    value.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16 as u16
}
