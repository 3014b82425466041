mod input;
mod loop_runner;
mod metrics;
mod screen;

pub use input::{Key, KeyStack, MouseButton, KEY_COUNT};
pub use loop_runner::{run_stack, LoopConfig};
pub use metrics::FrameMetricsSnapshot;
pub use screen::{Event, Screen, ScreenCommand, ScreenStack};
