//! Application layer use cases.
//!
//! # What lives here?
//!
//! - **`scheduler`** – Coalesces "the buffer changed" notifications so the
//!   outputs are redistributed at most once per tick.
//!
//! - **`proxy`** – Wraps the buffer's drawing context.  Every mutating call is
//!   applied to the buffer first and then reported to the scheduler.
//!
//! - **`output`** – The contract a host's physical output must fulfil
//!   (`PhysicalOutput`).  Implementations live in `infrastructure` or in the
//!   host application.
//!
//! - **`surface`** – `VirtualSurface`, which owns the buffer, the proxy and
//!   the redistribution pass.
//!
//! - **`frame_loop`** – A tokio interval that supplies the ticks.

pub mod frame_loop;
pub mod output;
pub mod proxy;
pub mod scheduler;
pub mod surface;
