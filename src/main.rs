use bevy::{
    prelude::*,
    winit::{UpdateMode, WinitSettings},
};

use camera::CameraSystemPlugin;
use commands::CommandPlugin;
use debug::DebugPlugin;
use lod::DetailLevelPlugin;
use render::RenderPlugin;
use route::RoutePlugin;
use settings::SettingsPlugin;
use streaming::StreamingPlugin;

pub mod camera;
pub mod commands;
pub mod debug;
pub mod error;
pub mod lod;
pub mod projection;
pub mod render;
pub mod route;
pub mod settings;
pub mod streaming;
pub mod types;

/// Per-frame order inside `Update`: the pose is final before the level is
/// classified, and the level is final before the streamer looks at it.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameSet {
    Input,
    Navigate,
    Classify,
    Stream,
    Route,
}

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Geo Viewer".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }))
        .configure_sets(
            Update,
            (
                FrameSet::Input,
                FrameSet::Navigate,
                FrameSet::Classify,
                FrameSet::Stream,
                FrameSet::Route,
            )
                .chain(),
        )
        .insert_resource(WinitSettings {
            unfocused_mode: UpdateMode::Reactive {
                wait: std::time::Duration::from_secs(1),
                react_to_device_events: true,
                react_to_user_events: true,
                react_to_window_events: true,
            },
            ..Default::default()
        })
        // Settings first: the other plugins read the config while building.
        .add_plugins(SettingsPlugin)
        .add_plugins(DebugPlugin)
        .add_plugins((CameraSystemPlugin, DetailLevelPlugin, StreamingPlugin, RoutePlugin))
        .add_plugins(CommandPlugin)
        .add_plugins(RenderPlugin)
        .run();
}
