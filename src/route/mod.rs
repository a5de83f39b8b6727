//! # Routes
//!
//! Trips between named stations: a greedy path through the station
//! catalog, a densified trajectory over it, and a marker that moves along
//! the trajectory each frame with the camera optionally in tow.

mod animator;
mod catalog;
mod path;
mod trajectory;

use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, Task};
use bevy_tasks::futures_lite::future;
use serde::{Deserialize, Serialize};

pub use animator::*;
pub use catalog::*;
pub use path::*;
pub use trajectory::*;

use crate::{
    FrameSet,
    camera::CameraState,
    error::ProviderError,
    settings::ViewerConfig,
    streaming::{build_agent, get_text, records_from_geojson},
    types::FeatureCategory,
};

pub struct RoutePlugin;

impl Plugin for RoutePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(RouteState::default())
            .add_event::<TripFinished>()
            .add_systems(Startup, request_station_catalog)
            .add_systems(Update, receive_station_catalog)
            .add_systems(Update, advance_trip.in_set(FrameSet::Route));
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Largest hop, in degrees, the path search will take between stations.
    pub locality_threshold: f64,
    /// Added to the score of a hop that leads away from the destination.
    pub progress_penalty: f64,
    /// Longest gap between trajectory points, scene units.
    pub densify_step: f32,
    /// Marker speed at multiplier 1, scene units per second.
    pub base_speed: f32,
    pub follow_camera: bool,
    /// Camera position relative to the marker while following.
    pub follow_offset: Vec3,
    /// Higher values catch up with the marker faster.
    pub follow_sharpness: f32,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            locality_threshold: 6.0,
            progress_penalty: 2.0,
            densify_step: 0.5,
            base_speed: 4.0,
            follow_camera: true,
            follow_offset: Vec3::new(0.0, 12.0, 10.0),
            follow_sharpness: 3.0,
        }
    }
}

#[derive(Resource, Debug, Default)]
pub struct RouteState {
    pub catalog: StationCatalog,
    pub animator: RouteAnimator,
    /// Where the marker was drawn last frame.
    pub marker: Option<Marker>,
}

#[derive(Event, Debug, Clone, PartialEq)]
pub struct TripFinished {
    pub stops: Vec<String>,
}

#[derive(Component)]
struct CatalogTask(Task<Result<StationCatalog, ProviderError>>);

fn request_station_catalog(mut commands: Commands, config: Res<ViewerConfig>) {
    let provider = config.provider.clone();
    let task = AsyncComputeTaskPool::get().spawn(async move {
        let agent = build_agent(provider.timeout_secs);
        let url = format!("{}/api/stations", provider.base_url.trim_end_matches('/'));
        let body = get_text(&agent, &url)?;
        let records = records_from_geojson(&body, FeatureCategory::PointOfInterest)?;
        Ok(StationCatalog::from_records(&records))
    });
    commands.spawn(CatalogTask(task));
}

fn receive_station_catalog(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut CatalogTask)>,
    mut route: ResMut<RouteState>,
) {
    for (entity, mut task) in tasks.iter_mut() {
        let Some(result) = future::block_on(future::poll_once(&mut task.0)) else {
            continue;
        };
        commands.entity(entity).despawn();
        match result {
            Ok(catalog) if !catalog.is_empty() => {
                info!("Station catalog refreshed: {} stations", catalog.len());
                route.catalog = catalog;
            }
            Ok(_) => warn!("Backend station list was empty, keeping built-in stations"),
            Err(e) => warn!("Could not load stations, keeping built-in list: {e}"),
        }
    }
}

fn advance_trip(
    time: Res<Time>,
    config: Res<ViewerConfig>,
    mut route: ResMut<RouteState>,
    mut camera: ResMut<CameraState>,
    mut finished: EventWriter<TripFinished>,
) {
    if !route.animator.is_active() {
        if route.marker.is_some() {
            route.marker = None;
        }
        return;
    }
    let dt = time.delta_secs();
    let Some(step) = route.animator.advance(dt, config.route.base_speed) else {
        return;
    };
    route.marker = Some(step.marker);

    if config.route.follow_camera {
        let alpha = 1.0 - (-config.route.follow_sharpness * dt).exp();
        camera
            .navigator
            .follow(step.marker.position, config.route.follow_offset, alpha);
    }

    if step.finished {
        info!("Trip finished: {}", step.completed_stops.join(" -> "));
        finished.write(TripFinished {
            stops: step.completed_stops,
        });
    }
}
