mod glyphs;
mod pixels_backend;

pub use pixels_backend::PixelsSurface;

use thiserror::Error;

use crate::app::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Cheap handle to an image owned by the surface's cache. Handles stay valid
/// for the surface's lifetime and may be copied freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHandle(pub u32);

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    CreateWindow(#[source] winit::error::OsError),
    #[error("failed to create framebuffer: {0}")]
    CreateFramebuffer(#[source] pixels::Error),
    #[error("failed to open image {path}: {source}")]
    OpenImage {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    DecodeImage {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// The presentation capabilities the core requires from its backend. One
/// concrete implementation is selected at build time; the core never depends
/// on a particular rendering technology.
pub trait Surface {
    /// Pixel dimensions of the drawable area.
    fn viewport(&self) -> Viewport;

    /// Next pending input event, non-blocking.
    fn poll_event(&mut self) -> Option<Event>;

    /// Loads an image, caching by path; repeated calls return the same
    /// handle. Failure is fatal to whatever object requested the image.
    fn load_image(&mut self, path: &str) -> Result<ImageHandle, SurfaceError>;

    /// Draws an image at a pixel position with a shade factor in `[0, 1]`,
    /// applied as a deterministic integer multiply.
    fn draw_image(&mut self, image: &ImageHandle, x: i32, y: i32, shade: f32);

    /// Draws a single small digit glyph; debug-overlay primitive.
    fn draw_digit(&mut self, digit: u8, x: i32, y: i32);

    fn clear(&mut self);

    fn present(&mut self);

    /// Monotonic millisecond tick count.
    fn ticks(&self) -> u64;

    fn delay(&self, ms: u64);
}
