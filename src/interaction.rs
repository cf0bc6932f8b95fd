use eframe::egui::{Pos2, Rect, Vec2};

use crate::config::GraphConfig;
use crate::render::{DrawableFrame, Transform, hit_test};

pub const ZOOM_STEP: f32 = 1.5;
const WHEEL_SENSITIVITY: f32 = 0.0018;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Down { pos: Pos2, button: PointerButton },
    Move { pos: Pos2 },
    Up { pos: Pos2, button: PointerButton },
    /// Scroll delta in points; positive zooms in.
    Wheel { pos: Pos2, delta: f32 },
    Cancel,
    Leave,
    FocusLost,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    StartDrag { id: String, world: Vec2 },
    UpdateDrag { world: Vec2 },
    EndDrag,
    Activate(String),
}

#[derive(Clone, Debug, PartialEq)]
enum Gesture {
    Idle,
    NodeDrag {
        id: String,
        origin: Pos2,
        moved: bool,
    },
    Pan {
        last: Pos2,
    },
}

#[derive(Clone, Debug)]
pub struct Interaction {
    gesture: Gesture,
    selection: Option<String>,
    hover: Option<String>,
    transform: Transform,
    min_zoom: f32,
    max_zoom: f32,
    click_slop: f32,
}

impl Interaction {
    pub fn new(config: &GraphConfig) -> Self {
        let config = config.sanitized();
        Self {
            gesture: Gesture::Idle,
            selection: None,
            hover: None,
            transform: Transform::default(),
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            click_slop: config.click_slop,
        }
    }

    pub fn set_limits(&mut self, config: &GraphConfig) {
        let config = config.sanitized();
        self.min_zoom = config.min_zoom;
        self.max_zoom = config.max_zoom;
        self.click_slop = config.click_slop;
        self.transform.zoom = self.clamp_zoom(self.transform.zoom);
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn hover(&self) -> Option<&str> {
        self.hover.as_deref()
    }

    pub fn dragged_id(&self) -> Option<&str> {
        match &self.gesture {
            Gesture::NodeDrag { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.gesture, Gesture::Pan { .. })
    }

    /// `frame` must be the last frame drawn with the current transform; it is used for hit testing.
    pub fn handle(
        &mut self,
        event: PointerEvent,
        frame: &DrawableFrame,
        viewport: Rect,
    ) -> Vec<Command> {
        let mut commands = Vec::new();
        match event {
            PointerEvent::Down { pos, button } => {
                self.finish_gesture(&mut commands);
                let target = match button {
                    PointerButton::Primary => hit_test(frame, pos),
                    PointerButton::Secondary | PointerButton::Middle => None,
                };
                self.gesture = match target {
                    Some(id) => {
                        commands.push(Command::StartDrag {
                            id: id.to_owned(),
                            world: self.transform.screen_to_world(viewport, pos),
                        });
                        Gesture::NodeDrag {
                            id: id.to_owned(),
                            origin: pos,
                            moved: false,
                        }
                    }
                    None => Gesture::Pan { last: pos },
                };
            }
            PointerEvent::Move { pos } => match &mut self.gesture {
                Gesture::NodeDrag { origin, moved, .. } => {
                    if origin.distance(pos) > self.click_slop {
                        *moved = true;
                    }
                    commands.push(Command::UpdateDrag {
                        world: self.transform.screen_to_world(viewport, pos),
                    });
                }
                Gesture::Pan { last } => {
                    self.transform.pan += pos - *last;
                    *last = pos;
                }
                Gesture::Idle => {
                    self.hover = hit_test(frame, pos).map(str::to_owned);
                }
            },
            PointerEvent::Up { pos, .. } => {
                let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
                if let Gesture::NodeDrag { id, moved, .. } = gesture {
                    commands.push(Command::EndDrag);
                    if !moved && hit_test(frame, pos) == Some(id.as_str()) {
                        self.toggle_selection(id, &mut commands);
                    }
                }
                self.hover = hit_test(frame, pos).map(str::to_owned);
            }
            PointerEvent::Wheel { pos, delta } => {
                let factor = (1.0 + delta * WHEEL_SENSITIVITY).clamp(0.85, 1.15);
                self.zoom_about(viewport, pos, factor);
            }
            PointerEvent::Cancel | PointerEvent::FocusLost => {
                self.finish_gesture(&mut commands);
            }
            PointerEvent::Leave => {
                self.finish_gesture(&mut commands);
                self.hover = None;
            }
        }
        commands
    }

    pub fn zoom_in(&mut self, viewport: Rect) {
        self.zoom_about(viewport, viewport.center(), ZOOM_STEP);
    }

    pub fn zoom_out(&mut self, viewport: Rect) {
        self.zoom_about(viewport, viewport.center(), 1.0 / ZOOM_STEP);
    }

    pub fn reset_view(&mut self) {
        self.transform = Transform::default();
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Called before the simulation is reseeded. Ends any captured gesture and
    /// forgets selection or hover on nodes that are no longer visible.
    pub fn on_reseed(&mut self, is_visible: impl Fn(&str) -> bool) -> Vec<Command> {
        let mut commands = Vec::new();
        self.finish_gesture(&mut commands);
        if self.selection.as_deref().is_some_and(|id| !is_visible(id)) {
            self.selection = None;
        }
        if self.hover.as_deref().is_some_and(|id| !is_visible(id)) {
            self.hover = None;
        }
        commands
    }

    pub fn reset(&mut self) -> Vec<Command> {
        let mut commands = Vec::new();
        self.finish_gesture(&mut commands);
        self.selection = None;
        self.hover = None;
        commands
    }

    fn finish_gesture(&mut self, commands: &mut Vec<Command>) {
        if let Gesture::NodeDrag { id, .. } = std::mem::replace(&mut self.gesture, Gesture::Idle) {
            tracing::debug!(id = %id, "drag gesture ended without pointer release");
            commands.push(Command::EndDrag);
        }
    }

    fn toggle_selection(&mut self, id: String, commands: &mut Vec<Command>) {
        if self.selection.as_deref() == Some(id.as_str()) {
            self.selection = None;
        } else {
            commands.push(Command::Activate(id.clone()));
            self.selection = Some(id);
        }
    }

    fn clamp_zoom(&self, zoom: f32) -> f32 {
        if zoom.is_finite() {
            zoom.clamp(self.min_zoom, self.max_zoom)
        } else {
            1.0_f32.clamp(self.min_zoom, self.max_zoom)
        }
    }

    fn zoom_about(&mut self, viewport: Rect, anchor: Pos2, factor: f32) {
        let world_before = self.transform.screen_to_world(viewport, anchor);
        self.transform.zoom = self.clamp_zoom(self.transform.zoom * factor);
        self.transform.pan = anchor - viewport.center() - world_before * self.transform.zoom;
    }
}
