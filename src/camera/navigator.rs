use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::fly_to::{FlyTo, FlyToCallback};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub min_distance: f32,
    pub max_distance: f32,
    /// Fraction of the distance to the pointer target covered per wheel notch.
    pub zoom_speed: f32,
    /// Largest wheel delta, in notches, a single event may contribute.
    pub max_wheel_delta: f32,
    /// Pixel-precise wheels report this many pixels per notch.
    pub pixels_per_notch: f32,
    /// Share of each zoom movement applied to the look-at target.
    pub target_damping: f32,
    /// The look-at target stays within this far of the ground plane.
    pub look_at_band: f32,
    /// Used when the pointer ray never reaches the ground.
    pub fallback_ray_distance: f32,
    pub pan_speed: f32,
    pub vertical_speed: f32,
    /// Keyboard panning never takes the camera below this height.
    pub min_height: f32,
    /// Radians per pixel of drag.
    pub orbit_sensitivity: f32,
    pub min_pitch: f32,
    pub max_pitch: f32,
    /// Vertical field of view, radians.
    pub fov_y: f32,
    pub home: CameraPose,
    /// Horizontal offset (southwards) of a fly-to camera, as a share of its altitude.
    pub fly_to_tilt: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            min_distance: 5.0,
            max_distance: 100.0,
            zoom_speed: 0.1,
            max_wheel_delta: 3.0,
            pixels_per_notch: 100.0,
            target_damping: 0.4,
            look_at_band: 2.0,
            fallback_ray_distance: 20.0,
            pan_speed: 15.0,
            vertical_speed: 10.0,
            min_height: 1.0,
            orbit_sensitivity: 0.005,
            min_pitch: 0.15,
            max_pitch: 1.5,
            fov_y: std::f32::consts::FRAC_PI_4,
            home: CameraPose {
                position: Vec3::new(0.0, 75.0, 40.0),
                look_at: Vec3::ZERO,
            },
            fly_to_tilt: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Vec3,
    pub look_at: Vec3,
}

impl CameraPose {
    /// Distance from the scene origin, the zoom proxy everything else keys off.
    pub fn distance(&self) -> f32 {
        self.position.length()
    }

    pub fn forward(&self) -> Vec3 {
        (self.look_at - self.position)
            .try_normalize()
            .unwrap_or(Vec3::NEG_Z)
    }

    /// Look direction flattened onto the ground plane.
    pub fn ground_forward(&self) -> Vec3 {
        let f = self.forward();
        Vec3::new(f.x, 0.0, f.z).try_normalize().unwrap_or(Vec3::NEG_Z)
    }

    pub fn ground_right(&self) -> Vec3 {
        self.ground_forward().cross(Vec3::Y)
    }

    /// Ray through a point given in normalized device coordinates.
    pub fn view_ray(&self, ndc: Vec2, fov_y: f32, aspect: f32) -> (Vec3, Vec3) {
        let forward = self.forward();
        let right = forward.cross(Vec3::Y).try_normalize().unwrap_or(Vec3::X);
        let up = right.cross(forward);
        let half = (fov_y / 2.0).tan();
        let dir = (forward + right * ndc.x * half * aspect + up * ndc.y * half)
            .try_normalize()
            .unwrap_or(forward);
        (self.position, dir)
    }
}

/// Where a ray meets the ground plane (y = 0), if it does so in front of
/// the origin.
pub fn ground_intersection(origin: Vec3, dir: Vec3) -> Option<Vec3> {
    if dir.y.abs() < 1e-6 {
        return None;
    }
    let t = -origin.y / dir.y;
    (t > 0.0).then(|| origin + dir * t)
}

/// Keys currently held, already mapped to directions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeldDirections {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl HeldDirections {
    pub fn any(&self) -> bool {
        self.forward || self.back || self.left || self.right || self.up || self.down
    }
}

/// Everything the router gathered for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavInput {
    /// Wheel deltas in notches, positive zooms in.
    pub wheel: Vec<f32>,
    pub cursor_ndc: Option<Vec2>,
    pub aspect: f32,
    pub held: HeldDirections,
    /// Drag in pixels while the orbit button is held.
    pub orbit_drag: Vec2,
}

impl NavInput {
    pub fn is_user_driven(&self) -> bool {
        !self.wheel.is_empty() || self.held.any() || self.orbit_drag != Vec2::ZERO
    }
}

/// Owns the live camera pose. Every operation either applies fully or is
/// dropped, so the distance bounds hold after each one.
#[derive(Debug)]
pub struct CameraNavigator {
    config: CameraConfig,
    pose: CameraPose,
    fly_to: Option<FlyTo>,
}

impl CameraNavigator {
    pub fn new(config: CameraConfig) -> Self {
        let mut navigator = Self {
            pose: config.home,
            config,
            fly_to: None,
        };
        navigator.pose.position = navigator.clamp_distance(navigator.pose.position);
        navigator
    }

    pub fn pose(&self) -> &CameraPose {
        &self.pose
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn is_flying(&self) -> bool {
        self.fly_to.is_some()
    }

    fn in_bounds(&self, position: Vec3) -> bool {
        let d = position.length();
        d >= self.config.min_distance && d <= self.config.max_distance
    }

    /// Pulls a position radially back inside the distance bounds.
    pub fn clamp_distance(&self, position: Vec3) -> Vec3 {
        let d = position.length();
        if d < self.config.min_distance {
            match position.try_normalize() {
                Some(dir) => dir * self.config.min_distance,
                None => Vec3::Y * self.config.min_distance,
            }
        } else if d > self.config.max_distance {
            position * (self.config.max_distance / d)
        } else {
            position
        }
    }

    fn clamp_look_at(&self, mut look_at: Vec3) -> Vec3 {
        look_at.y = look_at.y.clamp(-self.config.look_at_band, self.config.look_at_band);
        look_at
    }

    /// Applies one frame of routed input, then advances any fly-to.
    /// Returns the finished pose when a fly-to completed this frame.
    pub fn apply_input(&mut self, input: &NavInput, dt: f32) -> Option<CameraPose> {
        if input.is_user_driven() && self.fly_to.take().is_some() {
            debug!("User input interrupted fly-to");
        }
        let ndc = input.cursor_ndc.unwrap_or(Vec2::ZERO);
        let aspect = if input.aspect > 0.0 { input.aspect } else { 1.0 };
        for delta in &input.wheel {
            self.zoom_toward(ndc, *delta, aspect);
        }
        if input.orbit_drag != Vec2::ZERO {
            let s = self.config.orbit_sensitivity;
            self.orbit(-input.orbit_drag.x * s, input.orbit_drag.y * s);
        }
        self.pan(input.held, dt);
        self.tick(dt)
    }

    /// Scales a raw wheel delta into bounded notches.
    pub fn normalize_wheel(&self, delta: f32, pixels: bool) -> f32 {
        let notches = if pixels {
            delta / self.config.pixels_per_notch
        } else {
            delta
        };
        notches.clamp(-self.config.max_wheel_delta, self.config.max_wheel_delta)
    }

    /// Moves the camera toward (or away from) the ground point under the
    /// pointer. Returns false when the step was dropped.
    pub fn zoom_toward(&mut self, ndc: Vec2, delta: f32, aspect: f32) -> bool {
        let (origin, dir) = self.pose.view_ray(ndc, self.config.fov_y, aspect);
        let target = ground_intersection(origin, dir)
            .unwrap_or_else(|| origin + dir * self.config.fallback_ray_distance);

        let to_target = target - self.pose.position;
        let d = to_target.length();
        if d < 1e-4 {
            return false;
        }
        let delta = delta.clamp(-self.config.max_wheel_delta, self.config.max_wheel_delta);
        // Never step onto or past the target itself.
        let magnitude = (d * self.config.zoom_speed * delta).min(d * 0.9);
        let movement = to_target / d * magnitude;

        let candidate = self.pose.position + movement;
        if !self.in_bounds(candidate) {
            return false;
        }
        self.pose.position = candidate;
        let dragged = self.pose.look_at + movement * self.config.target_damping;
        self.pose.look_at = self.clamp_look_at(dragged);
        true
    }

    /// Keyboard panning relative to the current view. Vertical movement
    /// leaves the look-at target where it is so it changes the view angle.
    pub fn pan(&mut self, held: HeldDirections, dt: f32) -> bool {
        if !held.any() || dt <= 0.0 {
            return false;
        }
        let forward = self.pose.ground_forward();
        let right = self.pose.ground_right();

        let mut horizontal = Vec3::ZERO;
        if held.forward {
            horizontal += forward;
        }
        if held.back {
            horizontal -= forward;
        }
        if held.right {
            horizontal += right;
        }
        if held.left {
            horizontal -= right;
        }
        let mut vertical = 0.0;
        if held.up {
            vertical += 1.0;
        }
        if held.down {
            vertical -= 1.0;
        }

        let step = horizontal * self.config.pan_speed * dt;
        let delta = step + Vec3::Y * vertical * self.config.vertical_speed * dt;
        let candidate = self.pose.position + delta;
        if delta == Vec3::ZERO
            || candidate.y < self.config.min_height
            || !self.in_bounds(candidate)
        {
            return false;
        }
        self.pose.position = candidate;
        self.pose.look_at += Vec3::new(step.x, 0.0, step.z);
        true
    }

    /// Rotates the camera around its look-at target.
    pub fn orbit(&mut self, yaw: f32, pitch: f32) -> bool {
        let offset = self.pose.position - self.pose.look_at;
        let r = offset.length();
        if r < 1e-4 {
            return false;
        }
        let theta = offset.x.atan2(offset.z) + yaw;
        let phi = ((offset.y / r).clamp(-1.0, 1.0).asin() + pitch)
            .clamp(self.config.min_pitch, self.config.max_pitch);
        let rotated = Vec3::new(phi.cos() * theta.sin(), phi.sin(), phi.cos() * theta.cos()) * r;

        let candidate = self.pose.look_at + rotated;
        if !self.in_bounds(candidate) {
            return false;
        }
        self.pose.position = candidate;
        true
    }

    /// Starts an animated flight, replacing any flight in progress. A missing
    /// look-at keeps the current viewing direction.
    pub fn fly_to(
        &mut self,
        position: Vec3,
        look_at: Option<Vec3>,
        duration_secs: f32,
        on_complete: Option<FlyToCallback>,
    ) {
        let position = self.clamp_distance(position);
        let look_at = look_at.unwrap_or(self.pose.look_at + (position - self.pose.position));
        let target = CameraPose {
            position,
            look_at: self.clamp_look_at(look_at),
        };
        if self.fly_to.is_some() {
            debug!("Replacing active fly-to");
        }
        self.fly_to = Some(FlyTo::new(self.pose, target, duration_secs, on_complete));
    }

    pub fn cancel_fly_to(&mut self) {
        self.fly_to = None;
    }

    /// Advances an active flight. Returns the final pose on completion.
    pub fn tick(&mut self, dt: f32) -> Option<CameraPose> {
        let fly = self.fly_to.as_mut()?;
        let (pose, done) = fly.advance(dt);
        self.pose = CameraPose {
            position: self.clamp_distance(pose.position),
            look_at: pose.look_at,
        };
        if done {
            if let Some(fly) = self.fly_to.take() {
                fly.finish(&self.pose);
            }
            return Some(self.pose);
        }
        None
    }

    /// Eases the camera toward `offset` from a moving subject while looking at it.
    pub fn follow(&mut self, subject: Vec3, offset: Vec3, alpha: f32) {
        let desired = subject + offset;
        let position = self.pose.position.lerp(desired, alpha.clamp(0.0, 1.0));
        self.pose.position = self.clamp_distance(position);
        self.pose.look_at = self.clamp_look_at(subject);
    }
}
