use bevy::{
    input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel},
    prelude::*,
    window::PrimaryWindow,
};

use super::{CameraState, HeldDirections, NavInput};

/// Raw input gathered this frame. Only [`route_input`] reads device events,
/// so there is exactly one consumer and no ordering between listeners.
#[derive(Resource, Debug, Default)]
pub struct FrameInput(pub NavInput);

const FORWARD: [KeyCode; 2] = [KeyCode::KeyW, KeyCode::ArrowUp];
const BACK: [KeyCode; 2] = [KeyCode::KeyS, KeyCode::ArrowDown];
const LEFT: [KeyCode; 2] = [KeyCode::KeyA, KeyCode::ArrowLeft];
const RIGHT: [KeyCode; 2] = [KeyCode::KeyD, KeyCode::ArrowRight];
const UP: [KeyCode; 2] = [KeyCode::KeyE, KeyCode::PageUp];
const DOWN: [KeyCode; 2] = [KeyCode::KeyQ, KeyCode::PageDown];

pub fn held_directions(keys: &ButtonInput<KeyCode>) -> HeldDirections {
    HeldDirections {
        forward: keys.any_pressed(FORWARD),
        back: keys.any_pressed(BACK),
        left: keys.any_pressed(LEFT),
        right: keys.any_pressed(RIGHT),
        up: keys.any_pressed(UP),
        down: keys.any_pressed(DOWN),
    }
}

/// Window position to normalized device coordinates (+y up).
pub fn cursor_to_ndc(cursor: Vec2, size: Vec2) -> Option<Vec2> {
    if size.x <= 0.0 || size.y <= 0.0 {
        return None;
    }
    Some(Vec2::new(
        cursor.x / size.x * 2.0 - 1.0,
        1.0 - cursor.y / size.y * 2.0,
    ))
}

pub fn route_input(
    mut wheel: EventReader<MouseWheel>,
    mut motion: EventReader<MouseMotion>,
    buttons: Res<ButtonInput<MouseButton>>,
    keys: Res<ButtonInput<KeyCode>>,
    q_windows: Query<&Window, With<PrimaryWindow>>,
    camera: Res<CameraState>,
    mut frame: ResMut<FrameInput>,
) {
    let mut input = NavInput::default();

    if let Ok(window) = q_windows.single() {
        let size = Vec2::new(window.width(), window.height());
        input.aspect = if size.y > 0.0 { size.x / size.y } else { 1.0 };
        input.cursor_ndc = window
            .cursor_position()
            .and_then(|cursor| cursor_to_ndc(cursor, size));
    }

    for ev in wheel.read() {
        let pixels = matches!(ev.unit, MouseScrollUnit::Pixel);
        input.wheel.push(camera.navigator.normalize_wheel(ev.y, pixels));
    }

    let drag: Vec2 = motion.read().map(|ev| ev.delta).sum();
    if buttons.pressed(MouseButton::Right) {
        input.orbit_drag = drag;
    }

    input.held = held_directions(&keys);
    frame.0 = input;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_map_to_ndc_extremes() {
        let size = Vec2::new(800.0, 600.0);
        assert_eq!(cursor_to_ndc(Vec2::ZERO, size), Some(Vec2::new(-1.0, 1.0)));
        assert_eq!(cursor_to_ndc(size, size), Some(Vec2::new(1.0, -1.0)));
        assert_eq!(cursor_to_ndc(size / 2.0, size), Some(Vec2::ZERO));
        assert_eq!(cursor_to_ndc(Vec2::ONE, Vec2::ZERO), None);
    }

    #[test]
    fn arrow_and_letter_keys_share_directions() {
        let mut keys = ButtonInput::<KeyCode>::default();
        keys.press(KeyCode::ArrowUp);
        keys.press(KeyCode::KeyD);
        keys.press(KeyCode::PageDown);
        let held = held_directions(&keys);
        assert!(held.forward && held.right && held.down);
        assert!(!held.back && !held.left && !held.up);
    }
}
