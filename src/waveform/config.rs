use serde::{Deserialize, Serialize};
use crate::types::SensorClass;
/// Capacities of a live rolling window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Samples retained per stream.
    pub storage_capacity: usize,
    /// Samples shown on the x-axis.
    pub display_capacity: usize,
    /// Redraw once per this many accepted frames.
    pub redraw_every: usize,
}
impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            storage_capacity: 500,
            display_capacity: 200,
            redraw_every: 10,
        }
    }
}
/// Y-axis auto-scaling policy for one sensor class.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisScale {
    /// Smallest margin added above and below the visible data.
    pub min_margin: f64,
    pub margin_ratio: f64,
    /// Hard bound on either side; outliers never push the axis past it.
    pub limit: f64,
    /// Range shown before any data arrives.
    pub idle_range: (f64, f64),
}
impl AxisScale {
    pub fn for_class(class: SensorClass) -> Self {
        match class {
            SensorClass::Accelerometer => Self {
                min_margin: 0.5,
                margin_ratio: 0.15,
                limit: 16.0,
                idle_range: (-4.0, 4.0),
            },
            SensorClass::Gyroscope => Self {
                min_margin: 20.0,
                margin_ratio: 0.15,
                limit: 2000.0,
                idle_range: (-200.0, 200.0),
            },
        }
    }
    pub fn bounds(&self, min: f64, max: f64) -> (f64, f64) {
        let margin = self.min_margin.max((max - min) * self.margin_ratio);
        ((min - margin).max(-self.limit), (max + margin).min(self.limit))
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn flat_signal_gets_the_floor_margin() {
        let acc = AxisScale::for_class(SensorClass::Accelerometer);
        assert_eq!(acc.bounds(1.0, 1.0), (0.5, 1.5));
        let gyro = AxisScale::for_class(SensorClass::Gyroscope);
        assert_eq!(gyro.bounds(0.0, 0.0), (-20.0, 20.0));
    }
    #[test]
    fn wide_signal_uses_proportional_margin_and_clamps() {
        let acc = AxisScale::for_class(SensorClass::Accelerometer);
        let (lo, hi) = acc.bounds(-2.0, 8.0);
        assert!((lo - -3.5).abs() < 1e-9);
        assert!((hi - 9.5).abs() < 1e-9);
        let gyro = AxisScale::for_class(SensorClass::Gyroscope);
        assert_eq!(gyro.bounds(-1900.0, 1900.0), (-2000.0, 2000.0));
    }
}
