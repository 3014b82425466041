use tracing::info;

use crate::surface::Surface;

use super::input::{Key, KeyStack, MouseButton};

/// An input event as the core sees it: already translated from the platform,
/// with unrecognized keys and buttons dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    MouseDown { button: MouseButton, x: i32, y: i32 },
    MouseUp { button: MouseButton, x: i32, y: i32 },
    MouseMoved { x: i32, y: i32 },
    KeyDown(Key),
    KeyUp(Key),
    Closed,
}

/// Stack mutation requested by a screen. Commands are applied by the stack
/// after the dispatch that produced them returns; screens never mutate the
/// stack directly.
pub enum ScreenCommand {
    None,
    Push(Box<dyn Screen>),
    Pop,
    Quit,
}

pub trait Screen {
    /// Called once when the screen becomes active (pushed onto the stack).
    fn enter(&mut self, _ui: &mut dyn Surface) {}

    /// Handles one input event. Unrecognized events must be ignored with no
    /// state change.
    fn handle(&mut self, event: &Event) -> ScreenCommand;

    /// One simulation step per frame, after the event queue is drained.
    fn update(&mut self) -> ScreenCommand;

    /// Draws one frame, including clear and present.
    fn draw(&mut self, ui: &mut dyn Surface);
}

/// Owns the active screens and the key resolver. The top screen receives all
/// events and the per-frame update/draw; push makes a new screen active, pop
/// returns control to the one below. The resolver is reset on every
/// transition so key state has exactly one screen-activation lifetime.
pub struct ScreenStack {
    screens: Vec<Box<dyn Screen>>,
    keys: KeyStack,
    quit: bool,
}

impl ScreenStack {
    pub fn new(root: Box<dyn Screen>) -> Self {
        Self {
            screens: vec![root],
            keys: KeyStack::new(),
            quit: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.quit || self.screens.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.screens.len()
    }

    pub fn active_key(&self) -> Option<Key> {
        self.keys.active_key()
    }

    pub fn keys_down(&self) -> usize {
        self.keys.keys_down()
    }

    pub(crate) fn quit(&mut self) {
        self.quit = true;
    }

    pub(crate) fn enter_active(&mut self, ui: &mut dyn Surface) {
        if let Some(top) = self.screens.last_mut() {
            top.enter(ui);
        }
    }

    /// Routes a real event: key transitions feed the resolver (which also
    /// re-arms the synthetic repeat), then the top screen handles the event.
    pub(crate) fn dispatch_real(&mut self, event: &Event, ui: &mut dyn Surface) {
        match *event {
            Event::KeyDown(key) => {
                self.keys.handle_stroke(key, true);
            }
            Event::KeyUp(key) => {
                self.keys.handle_stroke(key, false);
            }
            _ => {}
        }
        self.keys.note_real_event();

        let Some(top) = self.screens.last_mut() else {
            return;
        };
        let command = top.handle(event);
        self.apply(command, ui);
    }

    /// Emits the at-most-one synthetic key-down for this drained cycle.
    /// Synthetic events bypass the resolver: they are fabricated from its
    /// state, not fed back into it.
    pub(crate) fn dispatch_synthetic(&mut self, ui: &mut dyn Surface) {
        let Some(key) = self.keys.synthetic_repeat() else {
            return;
        };
        let Some(top) = self.screens.last_mut() else {
            return;
        };
        let command = top.handle(&Event::KeyDown(key));
        self.apply(command, ui);
    }

    pub(crate) fn update_active(&mut self, ui: &mut dyn Surface) {
        let Some(top) = self.screens.last_mut() else {
            return;
        };
        let command = top.update();
        self.apply(command, ui);
    }

    pub(crate) fn draw_active(&mut self, ui: &mut dyn Surface) {
        if let Some(top) = self.screens.last_mut() {
            top.draw(ui);
        }
    }

    fn apply(&mut self, command: ScreenCommand, ui: &mut dyn Surface) {
        match command {
            ScreenCommand::None => {}
            ScreenCommand::Push(mut screen) => {
                self.keys.reset();
                screen.enter(ui);
                self.screens.push(screen);
                info!(depth = self.screens.len(), "screen_pushed");
            }
            ScreenCommand::Pop => {
                self.keys.reset();
                self.screens.pop();
                info!(depth = self.screens.len(), "screen_popped");
            }
            ScreenCommand::Quit => {
                self.quit = true;
            }
        }
    }
}
