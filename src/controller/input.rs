/// Platform-agnostic input handling system
use std::collections::HashSet;

use glam::Vec2;

/// Platform-independent input events
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    // Keyboard events, keyed by `KeyboardEvent.code` ("KeyW", "ShiftLeft", ...)
    KeyDown(String),
    KeyUp(String),

    // Mouse movement while the pointer is locked
    MouseMove { dx: f32, dy: f32 },

    // Touch events in CSS pixels
    TouchStart { id: u64, x: f32, y: f32 },
    TouchMove { id: u64, x: f32, y: f32 },
    TouchEnd { id: u64 },

    // Window events
    FocusLost,
    VisibilityChanged { visible: bool },
    PointerLockChanged { locked: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Forward,
    Backward,
    Left,
    Right,
    Sprint,
    Jump,
}

impl Action {
    fn index(self) -> usize {
        self as usize
    }
}

/// Movement intent handed to the locomotion step once per tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputState {
    pub move_x: f32,
    pub move_z: f32,
    pub sprinting: bool,
    pub jumping: bool,
}

/// Key mapping configuration
#[derive(Clone, Debug)]
pub struct KeyBindings {
    pub forward: Vec<String>,
    pub backward: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub sprint: Vec<String>,
    pub jump: Vec<String>,
    pub escape: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let keys = |k: &[&str]| k.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            forward: keys(&["KeyW", "ArrowUp"]),
            backward: keys(&["KeyS", "ArrowDown"]),
            left: keys(&["KeyA", "ArrowLeft"]),
            right: keys(&["KeyD", "ArrowRight"]),
            sprint: keys(&["ShiftLeft", "ShiftRight"]),
            jump: keys(&["Space"]),
            escape: "Escape".to_string(),
        }
    }
}

impl KeyBindings {
    pub fn action_for(&self, code: &str) -> Option<Action> {
        let table = [
            (&self.forward, Action::Forward),
            (&self.backward, Action::Backward),
            (&self.left, Action::Left),
            (&self.right, Action::Right),
            (&self.sprint, Action::Sprint),
            (&self.jump, Action::Jump),
        ];
        table
            .into_iter()
            .find(|(keys, _)| keys.iter().any(|k| k == code))
            .map(|(_, action)| action)
    }

    pub fn is_escape(&self, code: &str) -> bool {
        code == self.escape
    }

    /// Codes whose browser default (scrolling, focus moves) must be suppressed
    pub fn is_navigation(&self, code: &str) -> bool {
        self.action_for(code).is_some()
    }
}

/// One movement axis. While both directions are held the most recent
/// press wins; releasing it falls back to the other held direction.
#[derive(Debug, Clone, Copy, Default)]
struct Axis {
    negative_held: bool,
    positive_held: bool,
    value: f32,
}

impl Axis {
    fn press(&mut self, positive: bool) {
        if positive {
            self.positive_held = true;
            self.value = 1.0;
        } else {
            self.negative_held = true;
            self.value = -1.0;
        }
    }

    fn release(&mut self, positive: bool) {
        if positive {
            self.positive_held = false;
        } else {
            self.negative_held = false;
        }
        self.value = match (self.negative_held, self.positive_held) {
            (false, false) => 0.0,
            (true, false) => -1.0,
            (false, true) => 1.0,
            (true, true) => self.value,
        };
    }
}

/// What a source tells the controller beyond its continuous intent
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Signals {
    pub jump: bool,
    pub look: Vec2,
}

#[derive(Debug, Clone, Default)]
pub struct KeyboardSource {
    pub pressed_keys: HashSet<String>,
    held: [u8; 6],
    x: Axis,
    z: Axis,
    sprinting: bool,
}

impl KeyboardSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn on_action(&mut self, action: Action, down: bool, signals: &mut Signals) {
        match (action, down) {
            (Action::Forward, true) => self.z.press(false),
            (Action::Forward, false) => self.z.release(false),
            (Action::Backward, true) => self.z.press(true),
            (Action::Backward, false) => self.z.release(true),
            (Action::Left, true) => self.x.press(false),
            (Action::Left, false) => self.x.release(false),
            (Action::Right, true) => self.x.press(true),
            (Action::Right, false) => self.x.release(true),
            (Action::Sprint, down) => self.sprinting = down,
            (Action::Jump, true) => signals.jump = true,
            (Action::Jump, false) => {}
        }
    }

    pub fn key_down(&mut self, bindings: &KeyBindings, code: &str, signals: &mut Signals) {
        // ignore auto-repeat: only the first down edge of a key counts
        if !self.pressed_keys.insert(code.to_string()) {
            return;
        }
        if let Some(action) = bindings.action_for(code) {
            let held = &mut self.held[action.index()];
            *held += 1;
            if *held == 1 {
                self.on_action(action, true, signals);
            }
        }
    }

    pub fn key_up(&mut self, bindings: &KeyBindings, code: &str, signals: &mut Signals) {
        if !self.pressed_keys.remove(code) {
            return;
        }
        if let Some(action) = bindings.action_for(code) {
            let held = &mut self.held[action.index()];
            *held = held.saturating_sub(1);
            if *held == 0 {
                self.on_action(action, false, signals);
            }
        }
    }

    pub fn clear_keys(&mut self) {
        *self = Self::default();
    }

    pub fn current_intent(&self) -> InputState {
        InputState {
            move_x: self.x.value.clamp(-1.0, 1.0),
            move_z: self.z.value.clamp(-1.0, 1.0),
            sprinting: self.sprinting,
            jumping: false,
        }
    }
}

pub const JOYSTICK_RADIUS: f32 = 50.0;
pub const BUTTON_RADIUS: f32 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchRegion {
    Joystick,
    Sprint,
    Jump,
    Look,
}

/// Screen layout of the virtual controls, in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchLayout {
    pub width: f32,
    pub height: f32,
}

impl TouchLayout {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn jump_button(&self) -> Vec2 {
        Vec2::new(self.width - 70.0, self.height - 150.0)
    }

    pub fn sprint_button(&self) -> Vec2 {
        Vec2::new(self.width - 160.0, self.height - 80.0)
    }

    pub fn region(&self, pos: Vec2) -> TouchRegion {
        if pos.distance(self.jump_button()) <= BUTTON_RADIUS {
            TouchRegion::Jump
        } else if pos.distance(self.sprint_button()) <= BUTTON_RADIUS {
            TouchRegion::Sprint
        } else if pos.x < self.width / 2.0 {
            TouchRegion::Joystick
        } else {
            TouchRegion::Look
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Joystick {
    pub id: u64,
    pub origin: Vec2,
    /// Knob position, at most `JOYSTICK_RADIUS` from the origin
    pub knob: Vec2,
    /// Unit direction of the drag, zero before the finger moves
    pub direction: Vec2,
}

impl Joystick {
    fn drag_to(&mut self, pos: Vec2) {
        let delta = pos - self.origin;
        let distance = delta.length();
        if distance <= f32::EPSILON {
            self.knob = self.origin;
            self.direction = Vec2::ZERO;
            return;
        }
        let angle = delta.y.atan2(delta.x);
        self.direction = Vec2::new(angle.cos(), angle.sin());
        self.knob = self.origin + self.direction * distance.min(JOYSTICK_RADIUS);
    }
}

#[derive(Debug, Clone)]
pub struct TouchSource {
    pub layout: TouchLayout,
    pub joystick: Option<Joystick>,
    pub sprint_touch: Option<u64>,
    look_touch: Option<(u64, Vec2)>,
}

impl TouchSource {
    pub fn new(layout: TouchLayout) -> Self {
        Self {
            layout,
            joystick: None,
            sprint_touch: None,
            look_touch: None,
        }
    }

    pub fn touch_start(&mut self, id: u64, pos: Vec2, signals: &mut Signals) {
        match self.layout.region(pos) {
            TouchRegion::Jump => signals.jump = true,
            TouchRegion::Sprint => self.sprint_touch = Some(id),
            TouchRegion::Joystick if self.joystick.is_none() => {
                self.joystick = Some(Joystick { id, origin: pos, knob: pos, direction: Vec2::ZERO });
            }
            TouchRegion::Look if self.look_touch.is_none() => self.look_touch = Some((id, pos)),
            _ => {}
        }
    }

    pub fn touch_move(&mut self, id: u64, pos: Vec2, signals: &mut Signals) {
        if let Some(stick) = self.joystick.as_mut().filter(|s| s.id == id) {
            stick.drag_to(pos);
        } else if let Some((look_id, last)) = self.look_touch.as_mut() {
            if *look_id == id {
                signals.look += pos - *last;
                *last = pos;
            }
        }
    }

    pub fn touch_end(&mut self, id: u64) {
        if self.joystick.is_some_and(|s| s.id == id) {
            self.joystick = None;
        }
        if self.sprint_touch == Some(id) {
            self.sprint_touch = None;
        }
        if self.look_touch.is_some_and(|(look_id, _)| look_id == id) {
            self.look_touch = None;
        }
    }

    /// Release every active touch, for when the page stops delivering
    /// touch events (blur, tab hidden) without a `touchcancel`
    pub fn clear(&mut self) {
        self.joystick = None;
        self.sprint_touch = None;
        self.look_touch = None;
    }

    pub fn current_intent(&self) -> InputState {
        let direction = self.joystick.map_or(Vec2::ZERO, |s| s.direction);
        InputState {
            move_x: direction.x.clamp(-1.0, 1.0),
            move_z: direction.y.clamp(-1.0, 1.0),
            sprinting: self.sprint_touch.is_some(),
            jumping: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Keyboard,
    Touch,
}

impl DeviceClass {
    /// Classify from the browser user agent and `navigator.maxTouchPoints`
    pub fn detect(user_agent: &str, max_touch_points: i32) -> Self {
        const MOBILE: [&str; 9] = [
            "Android", "webOS", "iPhone", "iPad", "iPod", "BlackBerry", "IEMobile", "Opera Mini", "Mobile",
        ];
        let mobile = MOBILE.iter().any(|m| user_agent.contains(m));
        // iPadOS reports a desktop Safari user agent
        let ipad_desktop_ua = user_agent.contains("Macintosh") && max_touch_points > 1;
        if mobile || ipad_desktop_ua {
            DeviceClass::Touch
        } else {
            DeviceClass::Keyboard
        }
    }
}

/// Either keyboard or touch drives movement, never both
#[derive(Debug, Clone)]
pub enum InputSource {
    Keyboard(KeyboardSource),
    Touch(TouchSource),
}

impl InputSource {
    pub fn for_device(class: DeviceClass, layout: TouchLayout) -> Self {
        match class {
            DeviceClass::Keyboard => InputSource::Keyboard(KeyboardSource::new()),
            DeviceClass::Touch => InputSource::Touch(TouchSource::new(layout)),
        }
    }

    pub fn device_class(&self) -> DeviceClass {
        match self {
            InputSource::Keyboard(_) => DeviceClass::Keyboard,
            InputSource::Touch(_) => DeviceClass::Touch,
        }
    }

    pub fn current_intent(&self) -> InputState {
        match self {
            InputSource::Keyboard(k) => k.current_intent(),
            InputSource::Touch(t) => t.current_intent(),
        }
    }
}

/// Owns the session's input state. Event handlers write into it; the frame
/// tick reads [`InputController::current_intent`] once.
#[derive(Debug, Clone)]
pub struct InputController {
    pub bindings: KeyBindings,
    pub source: InputSource,
    pub pointer_locked: bool,
    jump_duration: f64,
    jump_until: Option<f64>,
    look_delta: Vec2,
}

impl InputController {
    pub fn new(class: DeviceClass, layout: TouchLayout, jump_duration_ms: u32) -> Self {
        Self {
            bindings: KeyBindings::default(),
            source: InputSource::for_device(class, layout),
            pointer_locked: false,
            jump_duration: jump_duration_ms as f64 / 1000.0,
            jump_until: None,
            look_delta: Vec2::ZERO,
        }
    }

    /// Swap the input source when the device class changes (viewport resize).
    /// Returns true when the source was replaced.
    pub fn set_device_class(&mut self, class: DeviceClass, layout: TouchLayout) -> bool {
        if let InputSource::Touch(t) = &mut self.source {
            t.layout = layout;
        }
        if self.source.device_class() == class {
            return false;
        }
        tracing::debug!(?class, "switching input source");
        self.source = InputSource::for_device(class, layout);
        true
    }

    /// Process an input event at simulation time `now` (seconds)
    pub fn handle_event(&mut self, event: &InputEvent, now: f64) {
        let mut signals = Signals::default();
        match (&mut self.source, event) {
            (InputSource::Keyboard(k), InputEvent::KeyDown(code)) => k.key_down(&self.bindings, code, &mut signals),
            (InputSource::Keyboard(k), InputEvent::KeyUp(code)) => k.key_up(&self.bindings, code, &mut signals),
            (InputSource::Keyboard(k), InputEvent::FocusLost | InputEvent::VisibilityChanged { .. }) => k.clear_keys(),
            (InputSource::Touch(t), InputEvent::FocusLost | InputEvent::VisibilityChanged { .. }) => t.clear(),
            (InputSource::Touch(t), InputEvent::TouchStart { id, x, y }) => t.touch_start(*id, Vec2::new(*x, *y), &mut signals),
            (InputSource::Touch(t), InputEvent::TouchMove { id, x, y }) => t.touch_move(*id, Vec2::new(*x, *y), &mut signals),
            (InputSource::Touch(t), InputEvent::TouchEnd { id }) => t.touch_end(*id),
            (_, InputEvent::MouseMove { dx, dy }) => {
                if self.pointer_locked {
                    signals.look = Vec2::new(*dx, *dy);
                }
            }
            (_, InputEvent::PointerLockChanged { locked }) => self.pointer_locked = *locked,
            _ => {}
        }

        self.look_delta += signals.look;
        if signals.jump {
            self.trigger_jump(now);
        }
    }

    pub fn is_jumping(&self, now: f64) -> bool {
        self.jump_until.is_some_and(|until| now < until)
    }

    /// Start a jump unless one is already running; a repeated trigger
    /// neither restarts nor extends the window.
    pub fn trigger_jump(&mut self, now: f64) {
        if self.is_jumping(now) {
            return;
        }
        self.jump_until = Some(now + self.jump_duration);
    }

    /// Drop an expired jump window
    pub fn expire(&mut self, now: f64) {
        if self.jump_until.is_some_and(|until| now >= until) {
            self.jump_until = None;
        }
    }

    pub fn consume_look(&mut self) -> Vec2 {
        std::mem::take(&mut self.look_delta)
    }

    pub fn current_intent(&self, now: f64) -> InputState {
        InputState {
            jumping: self.is_jumping(now),
            ..self.source.current_intent()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyboard() -> InputController {
        InputController::new(DeviceClass::Keyboard, TouchLayout::new(800.0, 600.0), 300)
    }

    fn touch() -> InputController {
        InputController::new(DeviceClass::Touch, TouchLayout::new(800.0, 600.0), 300)
    }

    fn down(c: &mut InputController, code: &str) {
        c.handle_event(&InputEvent::KeyDown(code.into()), 0.0);
    }

    fn up(c: &mut InputController, code: &str) {
        c.handle_event(&InputEvent::KeyUp(code.into()), 0.0);
    }

    #[test]
    fn forward_press_release_returns_to_zero() {
        let mut c = keyboard();
        down(&mut c, "KeyW");
        assert_eq!(c.current_intent(0.0).move_z, -1.0);
        up(&mut c, "KeyW");
        assert_eq!(c.current_intent(0.0).move_z, 0.0);
    }

    #[test]
    fn last_pressed_direction_wins() {
        let mut c = keyboard();
        down(&mut c, "KeyW");
        down(&mut c, "KeyS");
        assert_eq!(c.current_intent(0.0).move_z, 1.0);

        up(&mut c, "KeyS");
        assert_eq!(c.current_intent(0.0).move_z, -1.0, "falls back to the still-held key");

        down(&mut c, "KeyD");
        down(&mut c, "KeyA");
        assert_eq!(c.current_intent(0.0).move_x, -1.0);
        up(&mut c, "KeyD");
        assert_eq!(c.current_intent(0.0).move_x, -1.0);
        up(&mut c, "KeyA");
        up(&mut c, "KeyW");
        let intent = c.current_intent(0.0);
        assert_eq!((intent.move_x, intent.move_z), (0.0, 0.0));
    }

    #[test]
    fn alternate_bindings_share_one_action() {
        let mut c = keyboard();
        down(&mut c, "KeyW");
        down(&mut c, "ArrowUp");
        up(&mut c, "KeyW");
        assert_eq!(c.current_intent(0.0).move_z, -1.0);
        up(&mut c, "ArrowUp");
        assert_eq!(c.current_intent(0.0).move_z, 0.0);
    }

    #[test]
    fn key_repeat_does_not_reassert() {
        let mut c = keyboard();
        down(&mut c, "KeyW");
        down(&mut c, "KeyS");
        down(&mut c, "KeyW"); // auto-repeat of a held key
        assert_eq!(c.current_intent(0.0).move_z, 1.0);
    }

    #[test]
    fn sprint_follows_shift() {
        let mut c = keyboard();
        down(&mut c, "ShiftLeft");
        assert!(c.current_intent(0.0).sprinting);
        up(&mut c, "ShiftLeft");
        assert!(!c.current_intent(0.0).sprinting);
    }

    #[test]
    fn jump_clears_after_window_and_does_not_stack() {
        let mut c = keyboard();
        c.handle_event(&InputEvent::KeyDown("Space".into()), 1.0);
        assert!(c.current_intent(1.0).jumping);
        c.handle_event(&InputEvent::KeyUp("Space".into()), 1.1);
        c.handle_event(&InputEvent::KeyDown("Space".into()), 1.2);
        assert!(c.current_intent(1.29).jumping);
        assert!(!c.current_intent(1.31).jumping, "second trigger must not extend the window");
        c.expire(1.31);
        c.trigger_jump(1.4);
        assert!(c.current_intent(1.5).jumping);
    }

    #[test]
    fn focus_loss_clears_held_keys() {
        let mut c = keyboard();
        down(&mut c, "KeyW");
        down(&mut c, "ShiftLeft");
        c.handle_event(&InputEvent::FocusLost, 0.0);
        assert_eq!(c.current_intent(0.0), InputState::default());
    }

    #[test]
    fn focus_loss_releases_active_touches() {
        let mut c = touch();
        let sprint = TouchLayout::new(800.0, 600.0).sprint_button();
        c.handle_event(&InputEvent::TouchStart { id: 1, x: 100.0, y: 400.0 }, 0.0);
        c.handle_event(&InputEvent::TouchMove { id: 1, x: 150.0, y: 400.0 }, 0.0);
        c.handle_event(&InputEvent::TouchStart { id: 2, x: sprint.x, y: sprint.y }, 0.0);
        assert!(c.current_intent(0.0).sprinting);

        c.handle_event(&InputEvent::FocusLost, 0.0);
        assert_eq!(c.current_intent(0.0), InputState::default());

        // a later touch moving the stale joystick id does nothing
        c.handle_event(&InputEvent::TouchMove { id: 1, x: 100.0, y: 300.0 }, 0.0);
        assert_eq!(c.current_intent(0.0), InputState::default());

        c.handle_event(&InputEvent::TouchStart { id: 3, x: 100.0, y: 400.0 }, 0.0);
        c.handle_event(&InputEvent::TouchMove { id: 3, x: 100.0, y: 300.0 }, 0.0);
        c.handle_event(&InputEvent::VisibilityChanged { visible: false }, 0.0);
        assert_eq!(c.current_intent(0.0), InputState::default());
    }

    #[test]
    fn joystick_maps_drag_to_unit_vector() {
        let mut c = touch();
        c.handle_event(&InputEvent::TouchStart { id: 1, x: 100.0, y: 400.0 }, 0.0);
        c.handle_event(&InputEvent::TouchMove { id: 1, x: 100.0, y: 300.0 }, 0.0);
        let intent = c.current_intent(0.0);
        assert!(intent.move_x.abs() < 1e-6);
        assert!((intent.move_z + 1.0).abs() < 1e-6);

        let InputSource::Touch(t) = &c.source else { panic!("touch source expected") };
        let stick = t.joystick.unwrap();
        assert!((stick.knob.distance(stick.origin) - JOYSTICK_RADIUS).abs() < 1e-4);

        c.handle_event(&InputEvent::TouchEnd { id: 1 }, 0.0);
        assert_eq!(c.current_intent(0.0), InputState::default());
    }

    #[test]
    fn touch_buttons_sprint_and_jump() {
        let mut c = touch();
        let layout = TouchLayout::new(800.0, 600.0);
        let sprint = layout.sprint_button();
        let jump = layout.jump_button();
        c.handle_event(&InputEvent::TouchStart { id: 2, x: sprint.x, y: sprint.y }, 0.0);
        c.handle_event(&InputEvent::TouchStart { id: 3, x: jump.x, y: jump.y }, 0.0);
        let intent = c.current_intent(0.1);
        assert!(intent.sprinting && intent.jumping);
        c.handle_event(&InputEvent::TouchEnd { id: 2 }, 0.2);
        assert!(!c.current_intent(0.2).sprinting);
    }

    #[test]
    fn touch_drag_on_right_half_looks() {
        let mut c = touch();
        c.handle_event(&InputEvent::TouchStart { id: 4, x: 500.0, y: 200.0 }, 0.0);
        c.handle_event(&InputEvent::TouchMove { id: 4, x: 510.0, y: 195.0 }, 0.0);
        assert_eq!(c.consume_look(), Vec2::new(10.0, -5.0));
        assert_eq!(c.consume_look(), Vec2::ZERO);
        assert_eq!(c.current_intent(0.0).move_x, 0.0);
    }

    #[test]
    fn sources_are_exclusive() {
        let mut c = touch();
        down(&mut c, "KeyW");
        assert_eq!(c.current_intent(0.0).move_z, 0.0);

        assert!(c.set_device_class(DeviceClass::Keyboard, TouchLayout::new(800.0, 600.0)));
        assert!(!c.set_device_class(DeviceClass::Keyboard, TouchLayout::new(800.0, 600.0)));
        c.handle_event(&InputEvent::TouchStart { id: 1, x: 10.0, y: 10.0 }, 0.0);
        assert_eq!(c.current_intent(0.0), InputState::default());
    }

    #[test]
    fn mouse_look_requires_pointer_lock() {
        let mut c = keyboard();
        c.handle_event(&InputEvent::MouseMove { dx: 3.0, dy: 4.0 }, 0.0);
        assert_eq!(c.consume_look(), Vec2::ZERO);
        c.handle_event(&InputEvent::PointerLockChanged { locked: true }, 0.0);
        c.handle_event(&InputEvent::MouseMove { dx: 3.0, dy: 4.0 }, 0.0);
        assert_eq!(c.consume_look(), Vec2::new(3.0, 4.0));
    }

    #[test]
    fn device_detection() {
        let iphone = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 Mobile/15E148";
        let desktop = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 Chrome/120.0 Safari/537.36";
        let ipad = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 Safari/605.1.15";
        assert_eq!(DeviceClass::detect(iphone, 5), DeviceClass::Touch);
        assert_eq!(DeviceClass::detect(desktop, 0), DeviceClass::Keyboard);
        assert_eq!(DeviceClass::detect(ipad, 5), DeviceClass::Touch);
        assert_eq!(DeviceClass::detect(ipad, 0), DeviceClass::Keyboard);
    }
}
