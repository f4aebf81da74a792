//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the mixer:
//! - Time management (frame timing, pausable playback positions)
//! - Logging utilities

pub mod time;
pub mod logging;
