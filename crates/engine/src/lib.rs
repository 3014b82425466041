pub mod app;
pub mod fixed;
pub mod surface;

pub use app::{
    run_stack, Event, FrameMetricsSnapshot, Key, KeyStack, LoopConfig, MouseButton, Screen,
    ScreenCommand, ScreenStack,
};
pub use fixed::{Fixed, Vec2};
pub use surface::{ImageHandle, PixelsSurface, Surface, SurfaceError, Viewport};
