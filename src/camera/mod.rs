//! # Camera
//!
//! The perspective camera and everything that moves it. Device input is
//! read in one place ([`input::route_input`]) and handed to the
//! [`CameraNavigator`], which owns the pose and enforces the distance bounds.
//! The rendered camera transform is only written from that pose.

mod fly_to;
mod input;
mod navigator;

use bevy::prelude::*;

pub use fly_to::*;
pub use input::*;
pub use navigator::*;

use crate::{FrameSet, settings::ViewerConfig};

pub struct CameraSystemPlugin;

impl Plugin for CameraSystemPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraState>()
            .init_resource::<FrameInput>()
            .add_event::<FlyToFinished>()
            .add_systems(Startup, setup_camera)
            .add_systems(Update, route_input.in_set(FrameSet::Input))
            .add_systems(Update, navigate_camera.in_set(FrameSet::Navigate))
            .add_systems(PostUpdate, sync_camera_transform);
    }
}

#[derive(Resource, Debug)]
pub struct CameraState {
    pub navigator: CameraNavigator,
}

impl FromWorld for CameraState {
    fn from_world(world: &mut World) -> Self {
        let config = world
            .get_resource::<ViewerConfig>()
            .map(|config| config.camera.clone())
            .unwrap_or_default();
        Self {
            navigator: CameraNavigator::new(config),
        }
    }
}

#[derive(Event, Debug, Clone, Copy)]
pub struct FlyToFinished {
    pub pose: CameraPose,
}

#[derive(Component)]
pub struct ViewerCamera;

fn setup_camera(mut commands: Commands, camera: Res<CameraState>) {
    let pose = camera.navigator.pose();
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: camera.navigator.config().fov_y,
            ..default()
        }),
        Transform::from_translation(pose.position).looking_at(pose.look_at, Vec3::Y),
        ViewerCamera,
    ));
    info!("Camera spawned at distance {:.1}", pose.distance());
}

fn navigate_camera(
    time: Res<Time>,
    frame: Res<FrameInput>,
    mut camera: ResMut<CameraState>,
    mut finished: EventWriter<FlyToFinished>,
) {
    let idle = !frame.0.is_user_driven() && !camera.navigator.is_flying();
    if idle {
        return;
    }
    if let Some(pose) = camera.navigator.apply_input(&frame.0, time.delta_secs()) {
        finished.write(FlyToFinished { pose });
    }
}

fn sync_camera_transform(
    camera: Res<CameraState>,
    mut q_camera: Query<&mut Transform, With<ViewerCamera>>,
) {
    if !camera.is_changed() {
        return;
    }
    let pose = camera.navigator.pose();
    for mut transform in &mut q_camera {
        *transform = Transform::from_translation(pose.position).looking_at(pose.look_at, Vec3::Y);
    }
}
