//! Storage infrastructure: wall configuration persistence.
//!
//! The `config` sub-module reads and writes the TOML file that describes an
//! output wall (where each output sits, its size and scale) together with
//! the demo's frame-loop settings.  A missing file yields the default
//! two-output wall.

pub mod config;
