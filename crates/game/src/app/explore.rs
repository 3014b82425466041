use std::collections::HashMap;

use engine::{
    Event, Fixed, ImageHandle, Key, Screen, ScreenCommand, Surface, SurfaceError, Vec2,
};
use tracing::info;

use crate::config::ViewerConfig;
use crate::world::{World, TILE_H, TILE_W};

/// Terrain images, cached by terrain character and shared by handle for the
/// grid's lifetime. Populated on first access to each terrain; a load
/// failure is fatal to the construction of whatever asked for the cache.
#[derive(Debug, Default)]
struct TerrainImages {
    by_char: HashMap<char, ImageHandle>,
}

impl TerrainImages {
    fn resolve(&mut self, world: &World, ui: &mut dyn Surface) -> Result<(), SurfaceError> {
        for cell in world.cells() {
            let ch = cell.loc.terrain;
            if self.by_char.contains_key(&ch) {
                continue;
            }
            // The loader rejected unknown terrain, so the registry has it.
            let Some(terrain) = world.terrain().get(ch) else {
                continue;
            };
            let handle = ui.load_image(terrain.resource)?;
            self.by_char.insert(ch, handle);
        }
        Ok(())
    }

    fn get(&self, ch: char) -> Option<ImageHandle> {
        self.by_char.get(&ch).copied()
    }
}

/// The interactive exploration screen: pans the camera over the world with
/// mouse drags and held arrow keys.
pub struct ExploreScreen {
    world: World,
    images: TerrainImages,
    velocity: Vec2,
    multiplier: i32,
    scroll_speed: Fixed,
    fast_multiplier: i32,
    drag_anchor: Option<(i32, i32)>,
    show_heights: bool,
}

impl ExploreScreen {
    pub fn new(
        world: World,
        config: &ViewerConfig,
        ui: &mut dyn Surface,
    ) -> Result<Self, SurfaceError> {
        let mut images = TerrainImages::default();
        images.resolve(&world, ui)?;

        Ok(Self {
            world,
            images,
            velocity: Vec2::ZERO,
            multiplier: 1,
            scroll_speed: Fixed::from_whole(config.scroll_speed),
            fast_multiplier: config.fast_multiplier.max(1),
            drag_anchor: None,
            show_heights: config.show_heights,
        })
    }

    fn key_down(&mut self, key: Key) {
        // Axis signs are inverted relative to the arrow: moving the camera
        // right means the world content scrolls left.
        match key {
            Key::Down => self.velocity.y = self.scroll_speed,
            Key::Up => self.velocity.y = -self.scroll_speed,
            Key::Left => self.velocity.x = self.scroll_speed,
            Key::Right => self.velocity.x = -self.scroll_speed,
            Key::LeftShift | Key::RightShift => self.multiplier = self.fast_multiplier,
            Key::Action => {}
        }
    }

    fn key_up(&mut self, key: Key) {
        match key {
            Key::Down | Key::Up => self.velocity.y = Fixed::ZERO,
            Key::Left | Key::Right => self.velocity.x = Fixed::ZERO,
            Key::LeftShift | Key::RightShift => self.multiplier = 1,
            Key::Action => {}
        }
    }
}

impl Screen for ExploreScreen {
    fn enter(&mut self, ui: &mut dyn Surface) {
        self.world.center(ui.viewport());
        self.velocity = Vec2::ZERO;
        self.multiplier = 1;
        self.drag_anchor = None;
        let (x0, y0) = self.world.start();
        info!(start_x = x0, start_y = y0, "camera_centered");
    }

    fn handle(&mut self, event: &Event) -> ScreenCommand {
        match *event {
            Event::MouseDown { x, y, .. } => {
                self.velocity = Vec2::ZERO;
                self.drag_anchor = Some((x, y));
            }
            Event::MouseUp { .. } => {
                self.drag_anchor = None;
            }
            Event::MouseMoved { x, y } => {
                if let Some((anchor_x, anchor_y)) = self.drag_anchor {
                    self.world
                        .scroll(Vec2::from_whole(x - anchor_x, y - anchor_y));
                    self.drag_anchor = Some((x, y));
                }
            }
            Event::KeyDown(key) => self.key_down(key),
            Event::KeyUp(key) => self.key_up(key),
            Event::Closed => {}
        }
        ScreenCommand::None
    }

    fn update(&mut self) -> ScreenCommand {
        let scroll = self.velocity * self.multiplier;
        if scroll != Vec2::ZERO {
            self.world.scroll(scroll);
        }
        ScreenCommand::None
    }

    fn draw(&mut self, ui: &mut dyn Surface) {
        ui.clear();
        draw_world(ui, &self.world, &self.images, self.show_heights);
        ui.present();
    }
}

/// Tile indices whose pixel span `[t*tile + offset, t*tile + offset + tile)`
/// touches the viewport, extended by a one-tile margin on each side so edge
/// tiles stay covered mid-scroll. Indices may be negative; lookups wrap.
fn visible_tiles(offset_px: i32, viewport_px: u32, tile_px: i32) -> std::ops::RangeInclusive<i32> {
    let first = (-offset_px - tile_px).div_euclid(tile_px) + 1;
    let last = (viewport_px as i32 - offset_px - 1).div_euclid(tile_px);
    first - 1..=last + 1
}

fn draw_world(ui: &mut dyn Surface, world: &World, images: &TerrainImages, show_heights: bool) {
    let viewport = ui.viewport();
    let offset = world.offset();
    let (offset_x, offset_y) = (offset.x.whole(), offset.y.whole());

    for ty in visible_tiles(offset_y, viewport.height, TILE_H) {
        for tx in visible_tiles(offset_x, viewport.width, TILE_W) {
            let loc = world.at_coord(tx, ty);
            let Some(image) = images.get(loc.terrain) else {
                continue;
            };
            let x = tx * TILE_W + offset_x;
            let y = ty * TILE_H + offset_y;
            ui.draw_image(&image, x, y, loc.shade());
            if show_heights {
                ui.draw_digit(loc.height as u8, x + 3, y + 3);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use engine::{MouseButton, SurfaceError, Viewport};

    use super::*;
    use crate::world::TerrainSet;

    struct RecordingSurface {
        viewport: Viewport,
        loaded: Vec<String>,
        draws: Vec<(u32, i32, i32, f32)>,
        digits: Vec<(u8, i32, i32)>,
        clears: usize,
        presents: usize,
    }

    impl RecordingSurface {
        fn new(width: u32, height: u32) -> Self {
            Self {
                viewport: Viewport { width, height },
                loaded: Vec::new(),
                draws: Vec::new(),
                digits: Vec::new(),
                clears: 0,
                presents: 0,
            }
        }
    }

    impl Surface for RecordingSurface {
        fn viewport(&self) -> Viewport {
            self.viewport
        }

        fn poll_event(&mut self) -> Option<Event> {
            None
        }

        fn load_image(&mut self, path: &str) -> Result<ImageHandle, SurfaceError> {
            if let Some(index) = self.loaded.iter().position(|loaded| loaded == path) {
                return Ok(ImageHandle(index as u32));
            }
            self.loaded.push(path.to_string());
            Ok(ImageHandle(self.loaded.len() as u32 - 1))
        }

        fn draw_image(&mut self, image: &ImageHandle, x: i32, y: i32, shade: f32) {
            self.draws.push((image.0, x, y, shade));
        }

        fn draw_digit(&mut self, digit: u8, x: i32, y: i32) {
            self.digits.push((digit, x, y));
        }

        fn clear(&mut self) {
            self.clears += 1;
        }

        fn present(&mut self) {
            self.presents += 1;
        }

        fn ticks(&self) -> u64 {
            0
        }

        fn delay(&self, _ms: u64) {}
    }

    fn uniform_world(width: i32, height: i32) -> World {
        let mut text = format!("{width} {height}\n");
        for _ in 0..width * height {
            text.push_str("g 2 1 ");
        }
        text.push_str("\n0 0");
        World::read(&text, TerrainSet::standard()).expect("world")
    }

    fn screen(world: World, ui: &mut RecordingSurface) -> ExploreScreen {
        ExploreScreen::new(world, &ViewerConfig::default(), ui).expect("screen")
    }

    fn offset_whole(screen: &ExploreScreen) -> (i32, i32) {
        let offset = screen.world.offset();
        (offset.x.whole(), offset.y.whole())
    }

    #[test]
    fn construction_loads_each_terrain_image_once() {
        let mut ui = RecordingSurface::new(64, 64);
        let text = "2 2\nw 0 0 g 3 1 g 3 0 w 0 0\n0 0";
        let world = World::read(text, TerrainSet::standard()).expect("world");
        let _screen = screen(world, &mut ui);

        assert_eq!(
            ui.loaded,
            vec!["assets/water.png".to_string(), "assets/grass.png".to_string()]
        );
    }

    #[test]
    fn arrow_keys_set_inverted_velocity_axes() {
        let mut ui = RecordingSurface::new(64, 64);
        let mut screen = screen(uniform_world(4, 4), &mut ui);

        screen.handle(&Event::KeyDown(Key::Right));
        screen.update();
        assert_eq!(offset_whole(&screen), (64 - 8, 0));

        screen.handle(&Event::KeyUp(Key::Right));
        screen.handle(&Event::KeyDown(Key::Down));
        screen.update();
        assert_eq!(offset_whole(&screen), (64 - 8, 8));
    }

    #[test]
    fn key_up_zeroes_only_its_axis() {
        let mut ui = RecordingSurface::new(64, 64);
        let mut screen = screen(uniform_world(4, 4), &mut ui);

        screen.handle(&Event::KeyDown(Key::Left));
        screen.handle(&Event::KeyDown(Key::Up));
        screen.update();
        assert_eq!(offset_whole(&screen), (8, 64 - 8));

        screen.handle(&Event::KeyUp(Key::Up));
        screen.update();
        assert_eq!(offset_whole(&screen), (16, 64 - 8));
    }

    #[test]
    fn shift_multiplier_applies_on_the_next_update() {
        let mut ui = RecordingSurface::new(64, 64);
        let mut screen = screen(uniform_world(4, 4), &mut ui);

        screen.handle(&Event::KeyDown(Key::Left));
        screen.update();
        assert_eq!(offset_whole(&screen), (8, 0));

        screen.handle(&Event::KeyDown(Key::LeftShift));
        screen.update();
        assert_eq!(offset_whole(&screen), (8 + 40, 0));

        screen.handle(&Event::KeyUp(Key::LeftShift));
        screen.update();
        assert_eq!(offset_whole(&screen), (56, 0));
    }

    #[test]
    fn mouse_down_zeroes_velocity_and_anchors_drag() {
        let mut ui = RecordingSurface::new(64, 64);
        let mut screen = screen(uniform_world(4, 4), &mut ui);

        screen.handle(&Event::KeyDown(Key::Down));
        screen.handle(&Event::MouseDown {
            button: MouseButton::Left,
            x: 10,
            y: 10,
        });
        screen.update();
        assert_eq!(offset_whole(&screen), (0, 0));
    }

    #[test]
    fn drag_scrolls_by_point_delta_and_reanchors() {
        let mut ui = RecordingSurface::new(64, 64);
        let mut screen = screen(uniform_world(4, 4), &mut ui);

        screen.handle(&Event::MouseDown {
            button: MouseButton::Left,
            x: 10,
            y: 10,
        });
        screen.handle(&Event::MouseMoved { x: 13, y: 14 });
        assert_eq!(offset_whole(&screen), (3, 4));

        screen.handle(&Event::MouseMoved { x: 14, y: 14 });
        assert_eq!(offset_whole(&screen), (4, 4));

        screen.handle(&Event::MouseUp {
            button: MouseButton::Left,
            x: 14,
            y: 14,
        });
        screen.handle(&Event::MouseMoved { x: 50, y: 50 });
        assert_eq!(offset_whole(&screen), (4, 4));
    }

    #[test]
    fn move_without_drag_is_ignored() {
        let mut ui = RecordingSurface::new(64, 64);
        let mut screen = screen(uniform_world(4, 4), &mut ui);

        screen.handle(&Event::MouseMoved { x: 30, y: 30 });
        assert_eq!(offset_whole(&screen), (0, 0));
    }

    #[test]
    fn visible_tiles_cover_viewport_plus_margin() {
        for offset in [0, 5, 15, 16, 20, 63] {
            let range = visible_tiles(offset, 64, 16);
            let first_px = range.start() * 16 + offset;
            let last_px = range.end() * 16 + offset;
            assert!(first_px <= 0, "offset {offset}: first tile at {first_px}");
            assert!(
                last_px + 16 >= 64,
                "offset {offset}: last tile ends at {}",
                last_px + 16
            );
            // One-tile margin on each side, never more than two.
            assert!(first_px > -2 * 16);
            assert!(last_px < 64 + 2 * 16);
        }
    }

    #[test]
    fn draw_walks_the_wrapped_grid_at_offset_positions() {
        let mut ui = RecordingSurface::new(32, 32);
        let mut screen = screen(uniform_world(2, 2), &mut ui);
        screen.world.scroll(Vec2::from_whole(5, 0));

        screen.draw(&mut ui);

        assert_eq!(ui.clears, 1);
        assert_eq!(ui.presents, 1);
        assert!(!ui.draws.is_empty());
        for (_, x, _, shade) in &ui.draws {
            // Every drawn column differs from a tile boundary by the offset.
            assert_eq!((x - 5).rem_euclid(16), 0);
            let expected = screen.world.at(0, 0).shade();
            assert_eq!(*shade, expected);
        }
    }

    #[test]
    fn height_overlay_draws_one_digit_per_tile_when_enabled() {
        let mut ui = RecordingSurface::new(32, 32);
        let world = uniform_world(2, 2);
        let config = ViewerConfig {
            show_heights: true,
            ..ViewerConfig::default()
        };
        let mut screen = ExploreScreen::new(world, &config, &mut ui).expect("screen");

        screen.draw(&mut ui);
        assert_eq!(ui.digits.len(), ui.draws.len());
        assert!(ui.digits.iter().all(|(digit, _, _)| *digit == 2));

        ui.digits.clear();
        ui.draws.clear();
        screen.show_heights = false;
        screen.draw(&mut ui);
        assert!(ui.digits.is_empty());
        assert!(!ui.draws.is_empty());
    }

    #[test]
    fn enter_centers_on_the_start_cell_and_resets_input() {
        let mut ui = RecordingSurface::new(64, 48);
        let mut screen = screen(uniform_world(4, 4), &mut ui);
        screen.handle(&Event::KeyDown(Key::Down));
        screen.handle(&Event::MouseDown {
            button: MouseButton::Left,
            x: 1,
            y: 1,
        });

        screen.enter(&mut ui);

        // Start (0,0): offset = (vw/2 - 8, vh/2 - 8) wrapped into the world.
        assert_eq!(offset_whole(&screen), (24, 16));
        screen.update();
        assert_eq!(offset_whole(&screen), (24, 16));
        screen.handle(&Event::MouseMoved { x: 9, y: 9 });
        assert_eq!(offset_whole(&screen), (24, 16));
    }
}
