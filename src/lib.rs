//! Capture, storage and plotting of dual-glove IMU gesture recordings.
pub mod args;
pub mod config;
pub mod drivers;
pub mod engine;
pub mod store;
pub mod types;
pub mod waveform;
