//! Shared utilities for the scene manager.

pub mod frame_timing;
