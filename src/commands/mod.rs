//! # Commands
//!
//! A small fixed vocabulary of navigation commands. They arrive as
//! [`NavCommand`] events, from the terminal console or any other system,
//! and are mapped onto camera fly-tos and trip control.

mod command;
mod console;
mod interpreter;
mod lookup;

use bevy::prelude::*;
use bevy::tasks::AsyncComputeTaskPool;
use crossbeam_channel::{Receiver, Sender, unbounded};
use ureq::Agent;

pub use command::*;
pub use console::*;
pub use interpreter::*;
pub use lookup::*;

use crate::{
    FrameSet,
    camera::{CameraState, FlyToCallback},
    error::ProviderError,
    route::RouteState,
    settings::ViewerConfig,
    streaming::{TaskComponent, build_agent},
    types::Coord,
};

pub struct CommandPlugin;

impl Plugin for CommandPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<NavCommand>()
            .init_resource::<LocationLookups>()
            .add_systems(Startup, setup_console)
            .add_systems(
                Update,
                (
                    forward_console_commands.run_if(resource_exists::<ConsoleReceiver>),
                    apply_location_results,
                    route_commands,
                )
                    .chain()
                    .in_set(FrameSet::Input),
            );
    }
}

fn setup_console(mut commands: Commands, config: Res<ViewerConfig>) {
    let agent = build_agent(config.provider.timeout_secs);
    let interpreter = CommandInterpreter::new(agent, &config.provider.base_url);
    commands.insert_resource(spawn_console(interpreter));
    info!("Type a command, or action JSON, and press enter");
}

/// A named location still waiting on the lookup endpoint.
#[derive(Debug, Clone)]
pub struct PendingLocation {
    pub name: String,
    pub altitude: Option<f64>,
    pub duration: Option<f64>,
}

type LookupResult = (PendingLocation, Result<LocationMatch, ProviderError>);

#[derive(Resource)]
pub struct LocationLookups {
    agent: Agent,
    base_url: String,
    tx: Sender<LookupResult>,
    rx: Receiver<LookupResult>,
}

impl FromWorld for LocationLookups {
    fn from_world(world: &mut World) -> Self {
        let provider = world
            .get_resource::<ViewerConfig>()
            .map(|c| c.provider.clone())
            .unwrap_or_default();
        let (tx, rx) = unbounded();
        Self {
            agent: build_agent(provider.timeout_secs),
            base_url: provider.base_url,
            tx,
            rx,
        }
    }
}

impl LocationLookups {
    pub fn request(&self, commands: &mut Commands, pending: PendingLocation) {
        let agent = self.agent.clone();
        let base_url = self.base_url.clone();
        let tx = self.tx.clone();
        let task = AsyncComputeTaskPool::get().spawn(async move {
            let result = lookup_location(&agent, &base_url, &pending.name);
            let _ = tx.send((pending, result));
        });
        commands.spawn(TaskComponent(task));
    }
}

fn arrival_log(name: String) -> Option<FlyToCallback> {
    Some(Box::new(move |pose| {
        info!("Arrived over {name} at distance {:.1}", pose.distance());
    }))
}

fn fly_over(
    camera: &mut CameraState,
    config: &ViewerConfig,
    coord: Coord,
    pending: PendingLocation,
) {
    let altitude = pending.altitude.unwrap_or(DEFAULT_ALTITUDE_KM);
    let (position, look_at) = overhead(coord, altitude, &config.projection, &config.camera);
    let secs = (pending.duration.unwrap_or(DEFAULT_DURATION_MS).max(0.0) / 1000.0) as f32;
    camera
        .navigator
        .fly_to(position, Some(look_at), secs, arrival_log(pending.name));
}

fn apply_location_results(
    lookups: Res<LocationLookups>,
    config: Res<ViewerConfig>,
    mut camera: ResMut<CameraState>,
) {
    for (pending, result) in lookups.rx.try_iter() {
        match result {
            Ok(found) => {
                info!("Resolved {:?} to {}", pending.name, found.display_name);
                fly_over(&mut camera, &config, found.coord, pending);
            }
            Err(e) => warn!("Could not resolve {:?}: {e}", pending.name),
        }
    }
}

fn route_commands(
    mut events: EventReader<NavCommand>,
    mut commands: Commands,
    config: Res<ViewerConfig>,
    lookups: Res<LocationLookups>,
    mut camera: ResMut<CameraState>,
    mut route: ResMut<RouteState>,
) {
    for command in events.read() {
        debug!("Routing {command:?}");
        let pose = *camera.navigator.pose();
        if let Some(target) = camera_target(command, &pose, &config.projection, &config.camera) {
            camera
                .navigator
                .fly_to(target.position, target.look_at, target.duration_secs, None);
            continue;
        }

        let RouteState {
            catalog, animator, ..
        } = &mut *route;
        match command {
            NavCommand::GotoStation { name } => match catalog.find(name) {
                Ok(index) => {
                    let Some(station) = catalog.get(index) else {
                        continue;
                    };
                    let altitude = altitude_for_radius(
                        STATION_VIEW_RADIUS_KM,
                        &config.projection,
                        &config.camera,
                    );
                    let pending = PendingLocation {
                        name: station.display_name(),
                        altitude: Some(altitude),
                        duration: None,
                    };
                    fly_over(&mut camera, &config, station.position, pending);
                }
                Err(e) => warn!("{e}"),
            },
            NavCommand::GotoNamedLocation {
                name,
                altitude,
                duration,
            } => {
                let pending = PendingLocation {
                    name: name.clone(),
                    altitude: *altitude,
                    duration: *duration,
                };
                match catalog.find(name).ok().and_then(|i| catalog.get(i)) {
                    Some(station) => fly_over(&mut camera, &config, station.position, pending),
                    None => lookups.request(&mut commands, pending),
                }
            }
            NavCommand::StartTrip {
                source,
                destination,
                speed,
            } => {
                let speed = speed.unwrap_or(DEFAULT_TRIP_SPEED);
                let started = animator.start(
                    catalog,
                    source,
                    destination,
                    speed,
                    &config.projection,
                    &config.route,
                );
                match started {
                    Ok(trip) => {
                        info!("Trip started: {} at {speed}x", trip.stops.join(" -> "));
                        camera.navigator.cancel_fly_to();
                    }
                    Err(e) => warn!("Cannot start trip: {e}"),
                }
            }
            NavCommand::StopTrip => {
                if animator.stop().is_some() {
                    info!("Trip stopped");
                }
            }
            _ => {}
        }
    }
}
