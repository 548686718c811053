//! Live display windowing: bounded rolling buffers per (hand, sensor class)
//! stream, visible-range bookkeeping and axis auto-scaling.
pub mod buffer;
pub mod config;
pub mod display;
pub mod view;
pub mod window;
pub use config::{AxisScale, WindowConfig};
pub use display::{FingerSnapshot, LiveDisplay, LiveSnapshot, RedrawTarget};
pub use view::WindowView;
pub use window::{RollingWindow, WindowState};
