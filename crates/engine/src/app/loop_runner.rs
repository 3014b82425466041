use tracing::info;

use crate::surface::Surface;

use super::metrics::FrameAccumulator;
use super::screen::{Event, ScreenStack};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Minimum duration of one loop iteration, in milliseconds. The loop
    /// sleeps out the remainder of each frame through the surface delay
    /// primitive.
    pub frame_cap_ms: u64,
    pub metrics_log_interval_ms: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            frame_cap_ms: 20,
            metrics_log_interval_ms: 5_000,
        }
    }
}

/// Runs the screen stack against a surface until the stack empties, a screen
/// quits, or the window closes.
///
/// One iteration: fully drain the input queue (each real event goes through
/// the resolver and then the top screen), emit the at-most-one synthetic
/// key-down for the cycle, then one update, one draw, and the frame-cap
/// delay. Single-threaded; nothing suspends except that delay.
pub fn run_stack(stack: &mut ScreenStack, ui: &mut dyn Surface, config: &LoopConfig) {
    let frame_cap_ms = config.frame_cap_ms.max(1);
    let mut metrics = FrameAccumulator::new(config.metrics_log_interval_ms, ui.ticks());

    stack.enter_active(ui);

    while !stack.is_finished() {
        let frame_start = ui.ticks();

        while let Some(event) = ui.poll_event() {
            if event == Event::Closed {
                info!(reason = "window_close", "shutdown_requested");
                stack.quit();
                break;
            }
            stack.dispatch_real(&event, ui);
            if stack.is_finished() {
                break;
            }
        }
        if stack.is_finished() {
            break;
        }

        stack.dispatch_synthetic(ui);
        if stack.is_finished() {
            break;
        }

        stack.update_active(ui);
        stack.draw_active(ui);

        let now = ui.ticks();
        let elapsed_ms = now.saturating_sub(frame_start);
        metrics.record_frame(elapsed_ms);
        if let Some(snapshot) = metrics.maybe_snapshot(now) {
            info!(
                fps = snapshot.fps,
                frame_time_ms = snapshot.frame_time_ms,
                "loop_metrics"
            );
        }

        let sleep_ms = frame_sleep_ms(elapsed_ms, frame_cap_ms);
        if sleep_ms > 0 {
            ui.delay(sleep_ms);
        }
    }
}

fn frame_sleep_ms(elapsed_ms: u64, frame_cap_ms: u64) -> u64 {
    frame_cap_ms.saturating_sub(elapsed_ms)
}
