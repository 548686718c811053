use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use log::{info, warn};
use super::{config::WindowConfig, view::WindowView, window::RollingWindow};
use crate::drivers::codec::{decode, split_frame};
use crate::drivers::GloveError;
use crate::types::{Hand, SensorClass, SensorUnit, FRAME_LEN};
/// Rolling windows of one hand: `[accelerometer, gyroscope]` per sensor unit.
pub struct HandWindows {
    hand: Hand,
    units: Vec<[RollingWindow; 2]>,
    first_frame_logged: bool,
}
impl HandWindows {
    fn new(hand: Hand, config: &WindowConfig) -> Self {
        let units = SensorUnit::ALL
            .iter()
            .map(|_| {
                [
                    RollingWindow::new(SensorClass::Accelerometer, config),
                    RollingWindow::new(SensorClass::Gyroscope, config),
                ]
            })
            .collect();
        Self {
            hand,
            units,
            first_frame_logged: false,
        }
    }
    pub fn window(&self, unit: SensorUnit, class: SensorClass) -> &RollingWindow {
        &self.units[unit.index()][class_slot(class)]
    }
    fn each_window(&mut self, mut f: impl FnMut(&mut RollingWindow)) {
        for pair in &mut self.units {
            for window in pair.iter_mut() {
                f(window);
            }
        }
    }
    fn log_first_frame(&mut self, values: &[u16]) {
        if self.first_frame_logged {
            return;
        }
        self.first_frame_logged = true;
        info!(
            "live plot: first frame ({}) raw head {:?}; Index AccX {} -> {:.6} g, AccY {} -> {:.6} g",
            self.hand,
            &values[..6],
            values[0],
            decode(values[0], SensorClass::Accelerometer),
            values[1],
            decode(values[1], SensorClass::Accelerometer),
        );
    }
}
fn class_slot(class: SensorClass) -> usize {
    match class {
        SensorClass::Accelerometer => 0,
        SensorClass::Gyroscope => 1,
    }
}
/// Something that draws a live snapshot. Must tolerate calls from both hands.
pub trait RedrawTarget: Send + Sync {
    fn redraw(&self, snapshot: &LiveSnapshot) -> Result<(), GloveError>;
}
/// The four panels of one finger: left acc, left gyro, right acc, right gyro.
#[derive(Clone, Debug)]
pub struct FingerSnapshot {
    pub unit: SensorUnit,
    pub panels: Vec<(Hand, WindowView)>,
}
#[derive(Clone, Debug)]
pub struct LiveSnapshot {
    pub fingers: Vec<FingerSnapshot>,
}
/// Owned state of a live display session: every rolling window plus the
/// running flag and the shared redraw counter.
///
/// Cloning yields another handle to the same session. Each hand's windows
/// sit behind their own lock, so the two hand consumers never contend with
/// each other; only snapshots touch both.
#[derive(Clone)]
pub struct LiveDisplay {
    config: WindowConfig,
    hands: [Arc<Mutex<HandWindows>>; 2],
    running: Arc<AtomicBool>,
    accepted: Arc<AtomicUsize>,
}
impl LiveDisplay {
    pub fn new(config: WindowConfig) -> Self {
        let hands = Hand::ALL.map(|hand| Arc::new(Mutex::new(HandWindows::new(hand, &config))));
        Self {
            config,
            hands,
            running: Arc::new(AtomicBool::new(false)),
            accepted: Arc::new(AtomicUsize::new(0)),
        }
    }
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
    pub fn accepted_frames(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
    pub fn hand(&self, hand: Hand) -> MutexGuard<'_, HandWindows> {
        // A panicking consumer must not take the display down with it.
        self.hands[hand.index()]
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
    pub fn start(&self) {
        for hand in Hand::ALL {
            let mut windows = self.hand(hand);
            windows.first_frame_logged = false;
            windows.each_window(|w| w.start());
        }
        self.accepted.store(0, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
        info!(
            "live display started (x-axis: {} frames, redraw every {} frames)",
            self.config.display_capacity, self.config.redraw_every
        );
    }
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        for hand in Hand::ALL {
            self.hand(hand).each_window(|w| w.stop());
        }
        info!("live display stopped");
    }
    pub fn clear(&self) {
        for hand in Hand::ALL {
            let mut windows = self.hand(hand);
            windows.first_frame_logged = false;
            windows.each_window(|w| w.clear());
        }
        self.accepted.store(0, Ordering::SeqCst);
    }
    /// Feeds one raw frame into the hand's windows.
    ///
    /// Returns `true` when this frame makes a redraw due.
    pub fn add_frame(&self, hand: Hand, values: &[u16]) -> bool {
        if !self.is_running() || values.is_empty() || values.iter().all(|v| *v == 0) {
            return false;
        }
        if values.len() != FRAME_LEN {
            warn!("[{hand}] live frame skipped: {} values", values.len());
            return false;
        }
        let readings = match split_frame(values) {
            Ok(readings) => readings,
            Err(err) => {
                warn!("[{hand}] live frame skipped: {err}");
                return false;
            }
        };
        let mut accepted = false;
        {
            let mut windows = self.hand(hand);
            windows.log_first_frame(values);
            for unit in readings.iter() {
                let pair = &mut windows.units[unit.unit.index()];
                accepted |= pair[0].add_sample(unit.acc);
                accepted |= pair[1].add_sample(unit.gyro);
            }
        }
        if !accepted {
            return false;
        }
        let count = self.accepted.fetch_add(1, Ordering::SeqCst) + 1;
        count % self.config.redraw_every.max(1) == 0
    }
    pub fn snapshot(&self) -> LiveSnapshot {
        let left = self.hand(Hand::Left);
        let right = self.hand(Hand::Right);
        let fingers = SensorUnit::ALL
            .iter()
            .map(|&unit| {
                let mut panels = Vec::with_capacity(4);
                for windows in [&left, &right] {
                    for class in SensorClass::ALL {
                        panels.push((windows.hand, windows.window(unit, class).view()));
                    }
                }
                FingerSnapshot { unit, panels }
            })
            .collect();
        LiveSnapshot { fingers }
    }
}
