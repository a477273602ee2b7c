//! Render Target Resource
//!
//! A renderable surface the pipeline draws into: the base scene color/depth
//! pair, and the intermediate targets the post-process chain owns. Unlike
//! [`Texture`](super::Texture) there is no CPU pixel storage; the descriptor
//! is all the backend needs to allocate the attachment.

use super::texture::{Filtering, PixelFormat, WrapMode};

/// GPU render attachment descriptor.
#[derive(Debug, Clone)]
pub struct RenderTarget {
    width: u32,
    height: u32,
    format: PixelFormat,
    pub filtering: Filtering,
    pub wrap: WrapMode,
    /// Whether a depth attachment is paired with the color surface.
    pub depth: bool,
    dirty: bool,
}

impl RenderTarget {
    #[must_use]
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            filtering: Filtering::Bilinear,
            wrap: WrapMode::Clamp,
            depth: false,
            dirty: true,
        }
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Resizes the attachment. A no-op when dimensions are unchanged;
    /// otherwise the backend storage is flagged for reallocation.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.width != width || self.height != height {
            self.width = width;
            self.height = height;
            self.dirty = true;
        }
    }

    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Called by the backend after (re)allocating the attachment.
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}
