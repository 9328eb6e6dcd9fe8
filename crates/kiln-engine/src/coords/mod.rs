//! Geometry types shared by the renderer and the tile code.
//!
//! Canonical space:
//! - pixels of the renderer's virtual resolution
//! - origin top-left
//! - +X right, +Y down
//!
//! The batch vertex shader converts to NDC using the target resolution.

mod rect;
mod viewport;

pub use rect::Rect;
pub use viewport::Viewport;
