use std::collections::{HashMap, VecDeque};
use std::thread;
use std::time::{Duration, Instant};

use image::ImageReader;
use pixels::{Pixels, SurfaceTexture};
use tracing::{debug, warn};
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event as WinitEvent, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::EventLoopExtPumpEvents;
use winit::window::{Window, WindowBuilder};

use crate::app::{Event, Key, MouseButton};

use super::glyphs::{digit_glyph, Glyph, GLYPH_WIDTH};
use super::{ImageHandle, Surface, SurfaceError, Viewport};

const CLEAR_COLOR: [u8; 4] = [12, 14, 20, 255];
const DIGIT_COLOR: [u8; 4] = [244, 248, 252, 255];
const DIGIT_SCALE: i32 = 2;

/// Shade is quantized to `n/256` before blitting so the brightness of every
/// pixel is a pure integer function of the inputs.
const SHADE_ONE: u32 = 256;

struct LoadedImage {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

/// The one concrete presentation backend: a winit window pumped into an
/// internal event queue, with a pixels RGBA framebuffer drawn on the CPU.
///
/// OS key auto-repeat and unrecognized keys/buttons are dropped at
/// translation; sustained input is synthesized upstream by the key resolver.
pub struct PixelsSurface {
    event_loop: EventLoop<()>,
    window: &'static Window,
    pixels: Pixels<'static>,
    viewport: Viewport,
    queue: VecDeque<Event>,
    images: Vec<LoadedImage>,
    handles_by_path: HashMap<String, ImageHandle>,
    cursor: (i32, i32),
    started: Instant,
}

impl PixelsSurface {
    pub fn new(title: &str, width: u32, height: u32) -> Result<Self, SurfaceError> {
        let event_loop = EventLoop::new().map_err(SurfaceError::CreateEventLoop)?;
        event_loop.set_control_flow(ControlFlow::Poll);
        let window: &'static Window = Box::leak(Box::new(
            WindowBuilder::new()
                .with_title(title)
                .with_inner_size(LogicalSize::new(width as f64, height as f64))
                .with_resizable(false)
                .build(&event_loop)
                .map_err(SurfaceError::CreateWindow)?,
        ));
        let surface_texture = SurfaceTexture::new(width, height, window);
        let pixels =
            Pixels::new(width, height, surface_texture).map_err(SurfaceError::CreateFramebuffer)?;

        Ok(Self {
            event_loop,
            window,
            pixels,
            viewport: Viewport { width, height },
            queue: VecDeque::new(),
            images: Vec::new(),
            handles_by_path: HashMap::new(),
            cursor: (0, 0),
            started: Instant::now(),
        })
    }

    /// Pumps pending platform events into the queue without blocking.
    fn pump(&mut self) {
        let window_id = self.window.id();
        let queue = &mut self.queue;
        let cursor = &mut self.cursor;
        let _status = self
            .event_loop
            .pump_events(Some(Duration::ZERO), |event, _target| {
                if let WinitEvent::WindowEvent { window_id: id, event } = event {
                    if id != window_id {
                        return;
                    }
                    if let Some(translated) = translate_window_event(&event, cursor) {
                        queue.push_back(translated);
                    }
                }
            });
    }
}

impl Surface for PixelsSurface {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn poll_event(&mut self) -> Option<Event> {
        if self.queue.is_empty() {
            self.pump();
        }
        self.queue.pop_front()
    }

    fn load_image(&mut self, path: &str) -> Result<ImageHandle, SurfaceError> {
        if let Some(handle) = self.handles_by_path.get(path) {
            return Ok(*handle);
        }

        let decoded = ImageReader::open(path)
            .map_err(|source| SurfaceError::OpenImage {
                path: path.to_string(),
                source,
            })?
            .decode()
            .map_err(|source| SurfaceError::DecodeImage {
                path: path.to_string(),
                source,
            })?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();

        let handle = ImageHandle(self.images.len() as u32);
        self.images.push(LoadedImage {
            width,
            height,
            rgba: rgba.into_raw(),
        });
        self.handles_by_path.insert(path.to_string(), handle);
        debug!(path, width, height, "image_loaded");
        Ok(handle)
    }

    fn draw_image(&mut self, image: &ImageHandle, x: i32, y: i32, shade: f32) {
        let Some(loaded) = self.images.get(image.0 as usize) else {
            return;
        };
        let factor = shade_factor(shade);
        let frame = self.pixels.frame_mut();
        blit_shaded(
            frame,
            self.viewport.width,
            self.viewport.height,
            loaded,
            x,
            y,
            factor,
        );
    }

    fn draw_digit(&mut self, digit: u8, x: i32, y: i32) {
        let Some(glyph) = digit_glyph(digit) else {
            return;
        };
        let frame = self.pixels.frame_mut();
        draw_glyph_clipped(frame, self.viewport.width, self.viewport.height, x, y, glyph);
    }

    fn clear(&mut self) {
        for chunk in self.pixels.frame_mut().chunks_exact_mut(4) {
            chunk.copy_from_slice(&CLEAR_COLOR);
        }
    }

    fn present(&mut self) {
        if let Err(error) = self.pixels.render() {
            warn!(error = %error, "render_failed");
            self.queue.push_back(Event::Closed);
        }
    }

    fn ticks(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn delay(&self, ms: u64) {
        thread::sleep(Duration::from_millis(ms));
    }
}

fn translate_window_event(event: &WindowEvent, cursor: &mut (i32, i32)) -> Option<Event> {
    match event {
        WindowEvent::CloseRequested => Some(Event::Closed),
        WindowEvent::CursorMoved { position, .. } => {
            *cursor = (position.x as i32, position.y as i32);
            Some(Event::MouseMoved {
                x: cursor.0,
                y: cursor.1,
            })
        }
        WindowEvent::MouseInput { state, button, .. } => {
            let button = translate_button(*button)?;
            let (x, y) = *cursor;
            Some(match state {
                ElementState::Pressed => Event::MouseDown { button, x, y },
                ElementState::Released => Event::MouseUp { button, x, y },
            })
        }
        WindowEvent::KeyboardInput { event, .. } => translate_key_event(event),
        _ => None,
    }
}

fn translate_key_event(key_event: &KeyEvent) -> Option<Event> {
    // Platform auto-repeat is dropped; sustained input is the resolver's job.
    if key_event.repeat {
        return None;
    }
    let key = translate_key(key_event.physical_key)?;
    Some(match key_event.state {
        ElementState::Pressed => Event::KeyDown(key),
        ElementState::Released => Event::KeyUp(key),
    })
}

fn translate_key(key: PhysicalKey) -> Option<Key> {
    match key {
        PhysicalKey::Code(KeyCode::ArrowUp) => Some(Key::Up),
        PhysicalKey::Code(KeyCode::ArrowDown) => Some(Key::Down),
        PhysicalKey::Code(KeyCode::ArrowLeft) => Some(Key::Left),
        PhysicalKey::Code(KeyCode::ArrowRight) => Some(Key::Right),
        PhysicalKey::Code(KeyCode::KeyF) => Some(Key::Action),
        PhysicalKey::Code(KeyCode::ShiftLeft) => Some(Key::LeftShift),
        PhysicalKey::Code(KeyCode::ShiftRight) => Some(Key::RightShift),
        _ => None,
    }
}

fn translate_button(button: winit::event::MouseButton) -> Option<MouseButton> {
    match button {
        winit::event::MouseButton::Left => Some(MouseButton::Left),
        winit::event::MouseButton::Right => Some(MouseButton::Right),
        winit::event::MouseButton::Middle => Some(MouseButton::Middle),
        _ => None,
    }
}

fn shade_factor(shade: f32) -> u32 {
    if !shade.is_finite() {
        return SHADE_ONE;
    }
    (shade.clamp(0.0, 1.0) * SHADE_ONE as f32).round() as u32
}

fn blit_shaded(
    frame: &mut [u8],
    fb_width: u32,
    fb_height: u32,
    image: &LoadedImage,
    x: i32,
    y: i32,
    factor: u32,
) {
    for row in 0..image.height as i32 {
        let py = y + row;
        if py < 0 || py >= fb_height as i32 {
            continue;
        }
        for col in 0..image.width as i32 {
            let px = x + col;
            if px < 0 || px >= fb_width as i32 {
                continue;
            }
            let src = ((row as u32 * image.width + col as u32) * 4) as usize;
            if image.rgba[src + 3] < 128 {
                continue;
            }
            let dst = ((py as u32 * fb_width + px as u32) * 4) as usize;
            frame[dst] = ((image.rgba[src] as u32 * factor) >> 8) as u8;
            frame[dst + 1] = ((image.rgba[src + 1] as u32 * factor) >> 8) as u8;
            frame[dst + 2] = ((image.rgba[src + 2] as u32 * factor) >> 8) as u8;
            frame[dst + 3] = 255;
        }
    }
}

fn draw_glyph_clipped(frame: &mut [u8], fb_width: u32, fb_height: u32, x: i32, y: i32, glyph: Glyph) {
    for (row_index, row_bits) in glyph.rows.iter().enumerate() {
        for col in 0..GLYPH_WIDTH {
            if row_bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                continue;
            }
            for sy in 0..DIGIT_SCALE {
                for sx in 0..DIGIT_SCALE {
                    let px = x + col * DIGIT_SCALE + sx;
                    let py = y + row_index as i32 * DIGIT_SCALE + sy;
                    if px < 0 || py < 0 || px >= fb_width as i32 || py >= fb_height as i32 {
                        continue;
                    }
                    let dst = ((py as u32 * fb_width + px as u32) * 4) as usize;
                    frame[dst..dst + 4].copy_from_slice(&DIGIT_COLOR);
                }
            }
        }
    }
}
