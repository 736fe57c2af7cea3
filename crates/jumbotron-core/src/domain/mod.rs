//! Domain entities for Jumbotron.
//!
//! This module contains pure business logic with no infrastructure dependencies.
//!
//! # What lives in the domain? (for beginners)
//!
//! The domain layer holds the rules that make the system what it is: in this
//! case, how a set of physical displays is folded into one virtual drawing
//! area, and which part of that area each display shows.
//!
//! - Nothing here touches a display, a pixel buffer or the clock.
//! - Everything can be compiled and tested on any platform without setup.
//!
//! Code in outer layers (the virtual surface, the frame loop, the demo
//! binary) depends on the domain, but the domain never depends on them.

/// Points, rectangles and rectangle queries.
///
/// See [`geometry::Rectangle`] for the main type.
pub mod geometry;

/// Snapshot of one physical output's placement in the shared coordinate space.
pub mod output_region;
