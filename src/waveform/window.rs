use super::{
    buffer::SampleBuffer,
    config::{AxisScale, WindowConfig},
    view::WindowView,
};
use crate::drivers::codec::{valid_triple, Reading};
use crate::types::SensorClass;
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowState {
    Idle,
    Accumulating,
    /// Stopped by the caller; data is kept for display.
    Frozen,
}
/// Live buffer for one (hand, sensor class) stream of one sensor unit.
///
/// `total_seen` counts every accepted sample since the last `start`/`clear`
/// and keeps growing after the buffer starts evicting, so the x-axis keeps
/// scrolling instead of snapping back.
pub struct RollingWindow {
    class: SensorClass,
    buffer: SampleBuffer,
    total_seen: usize,
    display_capacity: usize,
    scale: AxisScale,
    state: WindowState,
}
impl RollingWindow {
    pub fn new(class: SensorClass, config: &WindowConfig) -> Self {
        Self {
            class,
            buffer: SampleBuffer::new(config.storage_capacity),
            total_seen: 0,
            display_capacity: config.display_capacity.max(1),
            scale: AxisScale::for_class(class),
            state: WindowState::Idle,
        }
    }
    pub fn class(&self) -> SensorClass {
        self.class
    }
    pub fn state(&self) -> WindowState {
        self.state
    }
    pub fn start(&mut self) {
        self.buffer.clear();
        self.total_seen = 0;
        self.state = WindowState::Accumulating;
    }
    /// Accepts the triple only if all three components decoded.
    pub fn add_sample(&mut self, sample: [Reading; 3]) -> bool {
        let Some(values) = valid_triple(&sample) else {
            return false;
        };
        self.total_seen += 1;
        self.buffer.push(values);
        true
    }
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.total_seen = 0;
        self.state = WindowState::Idle;
    }
    pub fn stop(&mut self) {
        self.state = WindowState::Frozen;
    }
    pub fn len(&self) -> usize {
        self.buffer.len()
    }
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
    pub fn total_seen(&self) -> usize {
        self.total_seen
    }
    pub fn visible_start(&self) -> usize {
        self.total_seen.saturating_sub(self.display_capacity)
    }
    pub fn visible_end(&self) -> usize {
        self.total_seen
    }
    pub fn visible_slice(&self) -> Vec<[f64; 3]> {
        self.buffer
            .tail(self.total_seen.min(self.display_capacity))
    }
    pub fn y_range(&self, visible: &[[f64; 3]]) -> (f64, f64) {
        if visible.is_empty() {
            return self.scale.idle_range;
        }
        let mut min = f64::MAX;
        let mut max = f64::MIN;
        for value in visible.iter().flatten() {
            min = min.min(*value);
            max = max.max(*value);
        }
        self.scale.bounds(min, max)
    }
    pub fn view(&self) -> WindowView {
        let samples = self.visible_slice();
        let visible_start = self.visible_start();
        WindowView {
            class: self.class,
            visible_start,
            visible_end: self.visible_end(),
            x_range: (
                visible_start as f64,
                (visible_start + self.display_capacity) as f64,
            ),
            y_range: self.y_range(&samples),
            samples,
        }
    }
}
