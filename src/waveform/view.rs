use crate::types::SensorClass;
/// What a renderer needs to draw one rolling window.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowView {
    pub class: SensorClass,
    /// Frame index of the first visible sample.
    pub visible_start: usize,
    /// One past the frame index of the newest sample.
    pub visible_end: usize,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub samples: Vec<[f64; 3]>,
}
impl WindowView {
    /// `(frame index, value)` pairs for one axis.
    pub fn points(&self, axis: usize) -> Vec<(f64, f64)> {
        self.samples
            .iter()
            .enumerate()
            .map(|(i, s)| ((self.visible_start + i) as f64, s[axis]))
            .collect()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
