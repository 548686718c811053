// src/drivers/mod.rs
pub mod buffer;
pub mod codec;
pub mod compare;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod plot;
pub mod source;
pub mod table;
pub use buffer::{RecordingBuffer, RecordingState};
pub use codec::{decode, split_frame, unpack_le_u16, FrameReadings, Reading};
pub use compare::{compare, compare_batch, ComparisonLayout, BATCH_RANGES};
pub use error::GloveError;
pub use loader::{load, GestureMetadata, HandSeries, LoadedGesture};
pub use pipeline::{HandConsumer, LiveFeed};
pub use plot::{render_figure_png, render_gesture_plots, LivePngWriter, PlotStyle};
pub use source::{connect_with_retry, GloveLink, SimulatedGlove};
pub use table::{ColumnKey, GestureTable};
