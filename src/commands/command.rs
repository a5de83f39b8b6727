use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    camera::{CameraConfig, CameraPose},
    lod::ground_coverage_km,
    projection::GeoProjection,
    types::Coord,
};

pub const DEFAULT_DURATION_MS: f64 = 2000.0;
pub const DEFAULT_ALTITUDE_KM: f64 = 30.0;
pub const DEFAULT_TRIP_SPEED: f32 = 3.0;
/// Ground radius shown around a station after `goto_station`.
pub const STATION_VIEW_RADIUS_KM: f32 = 400.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Left,
    Right,
    Up,
    Down,
    Forward,
    #[serde(alias = "back")]
    Backward,
}

/// High-level navigation requests, in the interpreter's action format
/// (`{"type": "goto_location", "lat": .., "lon": ..}`). Altitudes are in
/// kilometres, durations in milliseconds.
#[derive(Event, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavCommand {
    GotoLocation {
        lat: f64,
        lon: f64,
        altitude: Option<f64>,
        duration: Option<f64>,
    },
    #[serde(alias = "show_location_details")]
    GotoNamedLocation {
        #[serde(alias = "location")]
        name: String,
        altitude: Option<f64>,
        duration: Option<f64>,
    },
    GotoStation {
        name: String,
    },
    #[serde(alias = "pan")]
    Center {
        lat: f64,
        lon: f64,
    },
    StartTrip {
        source: String,
        destination: String,
        speed: Option<f32>,
    },
    StopTrip,
    MoveCamera {
        direction: MoveDirection,
        distance: f32,
        duration: Option<f64>,
    },
    CameraOffset {
        x: f32,
        y: f32,
        z: f32,
        duration: Option<f64>,
    },
    Reset,
    ZoomOut,
}

/// Where a command wants the camera to fly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyTarget {
    pub position: Vec3,
    pub look_at: Option<Vec3>,
    pub duration_secs: f32,
}

fn secs(duration_ms: Option<f64>) -> f32 {
    (duration_ms.unwrap_or(DEFAULT_DURATION_MS).max(0.0) / 1000.0) as f32
}

/// Pose looking down at `coord` from `altitude_km`, pulled back south by the
/// configured tilt so the ground is seen at an angle.
pub fn overhead(
    coord: Coord,
    altitude_km: f64,
    projection: &GeoProjection,
    camera: &CameraConfig,
) -> (Vec3, Vec3) {
    let ground = projection.coord_to_scene(coord);
    let height = projection.to_scene(coord.lat, coord.long, altitude_km).y;
    let position = ground + Vec3::new(0.0, height, height * camera.fly_to_tilt);
    (position, ground)
}

/// Altitude at which roughly `radius_km` of ground either side is in view.
pub fn altitude_for_radius(
    radius_km: f32,
    projection: &GeoProjection,
    camera: &CameraConfig,
) -> f64 {
    let km_per_unit = projection.km_per_unit() as f32;
    let per_unit = ground_coverage_km(1.0, camera.fov_y, km_per_unit);
    let distance = if per_unit > f32::EPSILON {
        2.0 * radius_km / per_unit
    } else {
        DEFAULT_ALTITUDE_KM as f32
    };
    (distance / projection.elevation_scale.max(f32::EPSILON)) as f64
}

/// Camera target for commands that need nothing beyond the current pose.
/// Named lookups and trips return `None`; they are resolved elsewhere.
pub fn camera_target(
    command: &NavCommand,
    pose: &CameraPose,
    projection: &GeoProjection,
    camera: &CameraConfig,
) -> Option<FlyTarget> {
    match command {
        NavCommand::GotoLocation {
            lat,
            lon,
            altitude,
            duration,
        } => {
            let (position, look_at) = overhead(
                Coord::new(*lat, *lon),
                altitude.unwrap_or(DEFAULT_ALTITUDE_KM),
                projection,
                camera,
            );
            Some(FlyTarget {
                position,
                look_at: Some(look_at),
                duration_secs: secs(*duration),
            })
        }
        NavCommand::Center { lat, lon } => {
            // Keep the current height, slide over the new point.
            let ground = projection.coord_to_scene(Coord::new(*lat, *lon));
            let shift = Vec3::new(ground.x - pose.look_at.x, 0.0, ground.z - pose.look_at.z);
            Some(FlyTarget {
                position: pose.position + shift,
                look_at: Some(ground),
                duration_secs: secs(None),
            })
        }
        NavCommand::MoveCamera {
            direction,
            distance,
            duration,
        } => {
            let delta = match direction {
                MoveDirection::Left => -pose.ground_right() * *distance,
                MoveDirection::Right => pose.ground_right() * *distance,
                MoveDirection::Forward => pose.ground_forward() * *distance,
                MoveDirection::Backward => -pose.ground_forward() * *distance,
                MoveDirection::Up => Vec3::Y * *distance,
                MoveDirection::Down => Vec3::NEG_Y * *distance,
            };
            Some(FlyTarget {
                position: pose.position + delta,
                look_at: Some(pose.look_at + Vec3::new(delta.x, 0.0, delta.z)),
                duration_secs: secs(*duration),
            })
        }
        NavCommand::CameraOffset { x, y, z, duration } => {
            let offset = Vec3::new(*x, *y, *z);
            Some(FlyTarget {
                position: pose.position + offset,
                look_at: Some(pose.look_at + Vec3::new(offset.x, 0.0, offset.z)),
                duration_secs: secs(*duration),
            })
        }
        NavCommand::Reset | NavCommand::ZoomOut => Some(FlyTarget {
            position: camera.home.position,
            look_at: Some(camera.home.look_at),
            duration_secs: secs(None),
        }),
        NavCommand::GotoNamedLocation { .. }
        | NavCommand::GotoStation { .. }
        | NavCommand::StartTrip { .. }
        | NavCommand::StopTrip => None,
    }
}

/// Decodes an array of interpreter actions, skipping the ones this viewer
/// does not understand.
pub fn decode_actions(actions: &[serde_json::Value]) -> Vec<NavCommand> {
    actions
        .iter()
        .filter_map(|action| match serde_json::from_value::<NavCommand>(action.clone()) {
            Ok(command) => Some(command),
            Err(e) => {
                let kind = action.get("type").and_then(|t| t.as_str()).unwrap_or("?");
                warn!("Skipping action {kind:?}: {e}");
                None
            }
        })
        .collect()
}
