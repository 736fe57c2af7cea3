//! The physical output contract.
//!
//! A *physical output* is one display on the wall.  The host owns it; the
//! virtual surface only needs to ask where it sits, read its optional scale
//! tag, and push pixels into it.  Keeping that behind a trait lets the host
//! plug in a window, a framebuffer or an in-memory pixmap, and lets tests use
//! a `mockall` mock.

use std::cell::RefCell;
use std::rc::Rc;

use jumbotron_core::{Pixmap, Rectangle};
use thiserror::Error;

/// Errors an output may raise while being updated.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to clear output: {0}")]
    Clear(String),

    #[error("failed to copy pixels to output: {0}")]
    Blit(String),

    #[error("output backing store could not be allocated")]
    Allocation,
}

/// One display the virtual surface redistributes onto.
#[cfg_attr(test, mockall::automock)]
pub trait PhysicalOutput {
    /// On-screen rectangle of the output, in the shared coordinate space.
    fn layout(&self) -> Rectangle;

    /// Raw scale attribute, or `None` when the output carries none.
    fn scale_tag(&self) -> Option<String>;

    /// Width and height of the output's own pixel store.
    fn dimensions(&self) -> (u32, u32);

    /// Resets the whole output to transparent.
    fn clear(&mut self) -> Result<(), OutputError>;

    /// Draws `source_rect` of `source`, stretched to cover the whole output.
    ///
    /// `source_rect` is in buffer pixels and may extend past the buffer's
    /// edges; the part outside the buffer shows as transparent.
    fn blit(&mut self, source: &Pixmap, source_rect: Rectangle) -> Result<(), OutputError>;
}

/// How hosts hand outputs to the surface.  The surface keeps only a weak
/// reference, so the host stays the owner.
pub type SharedOutput = Rc<RefCell<dyn PhysicalOutput>>;
