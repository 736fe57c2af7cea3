//! jumbotron library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does jumbotron do? (for beginners)
//!
//! A *wall* is a set of separate displays ("outputs") arranged next to each
//! other.  Jumbotron lets a program draw on the whole wall as if it were one
//! big canvas:
//!
//! 1. The host hands over its outputs.  Each one reports where it sits on
//!    screen and, optionally, a scale tag.
//! 2. [`VirtualSurface`] sizes one off-screen buffer to cover all of them.
//! 3. The program asks for the `"2d"` context and draws.  Every call goes
//!    through an [`OperationProxy`], which applies it to the buffer and marks
//!    the wall as needing an update.
//! 4. On the next tick the surface copies the matching slice of the buffer to
//!    every output, stretching it for scaled outputs.  However many calls were
//!    made during a tick, the outputs are updated exactly once.

/// Application layer: scheduler, proxy, virtual surface and frame loop.
pub mod application;

/// Infrastructure layer: in-memory outputs and configuration storage.
pub mod infrastructure;

pub use application::output::{OutputError, PhysicalOutput, SharedOutput};
pub use application::proxy::OperationProxy;
pub use application::scheduler::UpdateScheduler;
pub use application::surface::{DrawingSurface, SurfaceError, VirtualSurface};
