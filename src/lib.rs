//! Force-directed layout and percentile-driven visual encoding for a
//! network of prediction markets.
//!
//! [`physics::Simulation`] owns node positions and advances them one tick
//! at a time. [`stats`] derives per-dataset thresholds, [`encode`] maps raw
//! attributes through them, and [`frame::encode_frame`] bundles the result
//! with the current [`viewport::Viewport`] transform for a renderer.

pub mod config;
pub mod encode;
pub mod error;
pub mod frame;
pub mod model;
pub mod physics;
pub mod stats;
pub mod util;
pub mod viewport;
