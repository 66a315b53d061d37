use egui::{Color32, Context, Pos2, Stroke};
use glam::Vec3;

use crate::controller::input::{InputSource, TouchSource, BUTTON_RADIUS, JOYSTICK_RADIUS};
use crate::controller::{DeviceClass, FrameOutput, InputController};

/// Per-frame values shown by the HUD
pub struct HudInfo<'a> {
    pub fps: f32,
    pub eye: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub frame: &'a FrameOutput,
    pub input: &'a InputController,
}

/// Build the complete UI and return egui output
pub fn build_ui(egui_ctx: &Context, raw_input: egui::RawInput, hud: &HudInfo) -> egui::FullOutput {
    egui_ctx.run(raw_input, |ctx| {
        draw_crosshair(ctx);
        draw_debug_window(ctx, hud);
        draw_controls_help(ctx, hud.input.source.device_class());
        if let InputSource::Touch(touch) = &hud.input.source {
            draw_touch_controls(ctx, touch);
        }
    })
}

fn draw_crosshair(ctx: &Context) {
    let painter = ctx.layer_painter(egui::LayerId::new(egui::Order::Foreground, egui::Id::new("crosshair")));
    let center = ctx.available_rect().center();
    let size = 10.0;
    let stroke = Stroke::new(1.0, Color32::WHITE);
    painter.line_segment([Pos2::new(center.x - size, center.y), Pos2::new(center.x + size, center.y)], stroke);
    painter.line_segment([Pos2::new(center.x, center.y - size), Pos2::new(center.x, center.y + size)], stroke);
}

fn draw_debug_window(ctx: &Context, hud: &HudInfo) {
    let sample = &hud.frame.sample;
    let intent = &hud.frame.intent;

    egui::Window::new("Debug")
        .default_pos([8.0, 8.0])
        .default_open(hud.input.source.device_class() == DeviceClass::Keyboard)
        .show(ctx, |ui| {
            let small = |text: String| egui::RichText::new(text).small();
            ui.label(small(format!("FPS: {:.0}", hud.fps)));
            ui.label(small(format!("Pos: x: {:.1} y: {:.1} z: {:.1}", hud.eye.x, hud.eye.y, hud.eye.z)));
            ui.label(small(format!("Yaw: {:.1} Pitch: {:.1}", hud.yaw.to_degrees(), hud.pitch.to_degrees())));
            ui.separator();
            ui.label(small(format!(
                "Time: {} ({:.0}%) {:?}",
                sample.phase.label(),
                sample.progress * 100.0,
                sample.celestial
            )));
            ui.label(small(format!("Light: {:.2}", sample.light_intensity)));
            ui.label(small(format!(
                "Move: {:.2}, {:.2}{}{}",
                intent.move_x,
                intent.move_z,
                if intent.sprinting { " sprint" } else { "" },
                if intent.jumping { " jump" } else { "" },
            )));
        });
}

fn draw_controls_help(ctx: &Context, device: DeviceClass) {
    let lines: &[&str] = match device {
        DeviceClass::Keyboard => &[
            "Click - Capture mouse",
            "WASD / Arrows - Move",
            "Shift - Sprint",
            "Space - Jump",
            "Esc - Release mouse",
        ],
        DeviceClass::Touch => &[
            "Left side - Move",
            "Right side - Look",
            "Run (hold) / Jump (tap)",
        ],
    };

    egui::Area::new(egui::Id::new("controls_help"))
        .anchor(egui::Align2::LEFT_BOTTOM, [8.0, -8.0])
        .interactable(false)
        .show(ctx, |ui| {
            egui::Frame::NONE
                .fill(Color32::from_black_alpha(120))
                .inner_margin(6.0)
                .show(ui, |ui| {
                    for line in lines {
                        ui.label(egui::RichText::new(*line).small().color(Color32::WHITE));
                    }
                });
        });
}

fn draw_touch_controls(ctx: &Context, touch: &TouchSource) {
    let painter = ctx.layer_painter(egui::LayerId::new(egui::Order::Foreground, egui::Id::new("touch_controls")));
    let pos = |v: glam::Vec2| Pos2::new(v.x, v.y);
    let outline = Stroke::new(2.0, Color32::from_white_alpha(160));

    if let Some(stick) = touch.joystick {
        painter.circle(pos(stick.origin), JOYSTICK_RADIUS, Color32::from_white_alpha(40), outline);
        painter.circle_filled(pos(stick.knob), JOYSTICK_RADIUS * 0.4, Color32::from_white_alpha(140));
    }

    let sprint_fill = if touch.sprint_touch.is_some() {
        Color32::from_white_alpha(140)
    } else {
        Color32::from_white_alpha(60)
    };
    let buttons = [
        (touch.layout.sprint_button(), "RUN", sprint_fill),
        (touch.layout.jump_button(), "JUMP", Color32::from_white_alpha(60)),
    ];
    for (center, label, fill) in buttons {
        painter.circle(pos(center), BUTTON_RADIUS, fill, outline);
        painter.text(
            pos(center),
            egui::Align2::CENTER_CENTER,
            label,
            egui::FontId::proportional(14.0),
            Color32::WHITE,
        );
    }
}
