use eframe::egui::{
    self, Align2, Color32, FontId, Key, Painter, Pos2, Rect, Sense, Shape, Stroke, Ui, Vec2, vec2,
};

use page_graph::interaction::{PointerButton, PointerEvent};
use page_graph::render::{DrawableFrame, FrameStatus, LineStyle, Transform};

use super::PageGraphApp;

#[derive(Default)]
pub(super) struct CanvasInput {
    pointer_inside: bool,
    window_focused: bool,
}

impl CanvasInput {
    fn collect(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) -> Vec<PointerEvent> {
        let mut events = Vec::new();
        let hovered = response.hovered() || response.dragged();

        ui.input(|input| {
            let pointer = input.pointer.interact_pos().or(input.pointer.hover_pos());

            if self.window_focused && !input.focused {
                events.push(PointerEvent::FocusLost);
            }
            self.window_focused = input.focused;

            if input.key_pressed(Key::Escape) {
                events.push(PointerEvent::Cancel);
            }

            let Some(pos) = pointer else {
                if self.pointer_inside {
                    events.push(PointerEvent::Leave);
                    self.pointer_inside = false;
                }
                return;
            };

            for (button, egui_button) in [
                (PointerButton::Primary, egui::PointerButton::Primary),
                (PointerButton::Secondary, egui::PointerButton::Secondary),
                (PointerButton::Middle, egui::PointerButton::Middle),
            ] {
                if hovered && rect.contains(pos) && input.pointer.button_pressed(egui_button) {
                    events.push(PointerEvent::Down { pos, button });
                }
            }

            if input.pointer.delta() != Vec2::ZERO {
                events.push(PointerEvent::Move { pos });
            }

            for (button, egui_button) in [
                (PointerButton::Primary, egui::PointerButton::Primary),
                (PointerButton::Secondary, egui::PointerButton::Secondary),
                (PointerButton::Middle, egui::PointerButton::Middle),
            ] {
                if input.pointer.button_released(egui_button) {
                    events.push(PointerEvent::Up { pos, button });
                }
            }

            let scroll = input.raw_scroll_delta.y;
            if hovered && scroll.abs() > f32::EPSILON {
                events.push(PointerEvent::Wheel { pos, delta: scroll });
            }

            let inside = rect.contains(pos);
            if self.pointer_inside && !inside && !response.dragged() {
                events.push(PointerEvent::Leave);
            }
            self.pointer_inside = inside;
        });

        events
    }
}

impl PageGraphApp {
    pub(super) fn draw_canvas(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        self.viewport = rect;

        for event in self.canvas_input.collect(ui, rect, &response) {
            self.view.handle_pointer(event, rect);
        }

        let report = self.view.tick();
        if self.view.is_animating() || report.moved || response.dragged() {
            ui.ctx().request_repaint();
        }

        let frame = self.view.frame(rect);
        let painter = ui.painter_at(rect);
        draw_background(&painter, rect, self.view.transform());

        match &frame.status {
            FrameStatus::Ready => draw_frame(&painter, &frame),
            FrameStatus::Loading => draw_notice(&painter, rect, "Loading workspace graph..."),
            FrameStatus::Error(message) => draw_notice(&painter, rect, message),
            FrameStatus::Empty(reason) => draw_notice(&painter, rect, reason.message()),
        }

        if self.view.interaction().hover().is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }

        painter.text(
            rect.left_bottom() + vec2(10.0, -10.0),
            Align2::LEFT_BOTTOM,
            format!(
                "{} pages  |  {} links  |  zoom {}%",
                frame.stats.nodes, frame.stats.edges, frame.stats.zoom_percent
            ),
            FontId::proportional(12.0),
            Color32::from_gray(200),
        );
    }
}

fn draw_background(painter: &Painter, rect: Rect, transform: Transform) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (56.0 * transform.zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + transform.pan;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

fn draw_notice(painter: &Painter, rect: Rect, message: &str) {
    painter.text(
        rect.center(),
        Align2::CENTER_CENTER,
        message,
        FontId::proportional(16.0),
        Color32::from_gray(210),
    );
}

fn draw_frame(painter: &Painter, frame: &DrawableFrame) {
    for edge in &frame.edges {
        let stroke = Stroke::new(edge.width, edge.color);
        match edge.line {
            LineStyle::Solid => {
                painter.line_segment([edge.from, edge.to], stroke);
            }
            LineStyle::Dashed => {
                painter.extend(Shape::dashed_line(&[edge.from, edge.to], stroke, 6.0, 4.0));
            }
            LineStyle::Dotted => {
                painter.extend(Shape::dotted_line(
                    &[edge.from, edge.to],
                    edge.color,
                    5.0,
                    edge.width * 0.8,
                ));
            }
        }
    }

    for node in &frame.nodes {
        painter.circle_filled(node.center, node.radius, node.fill);
        painter.circle_stroke(node.center, node.radius, node.stroke);
        for dot in &node.tag_dots {
            painter.circle_filled(dot.center, dot.radius, dot.color);
        }
    }

    for label in &frame.labels {
        painter.text(
            label.anchor,
            Align2::LEFT_CENTER,
            &label.text,
            FontId::proportional(label.size),
            label.color,
        );
    }
}
