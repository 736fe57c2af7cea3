//! Infrastructure layer.
//!
//! - **`output`** – `PixmapOutput`, an in-memory physical output.  The demo
//!   binary, the integration tests and the benchmarks all redistribute onto
//!   it; a host with real displays supplies its own `PhysicalOutput`.
//! - **`storage`** – TOML wall configuration.

pub mod output;
pub mod storage;
