//! # Detail Levels
//!
//! Turns the continuous camera distance into a discrete detail tier. The
//! tier decides how much content the streamer asks for and which kinds of
//! content are drawn at all.

mod classifier;

use bevy::prelude::*;

pub use classifier::*;

use crate::{FrameSet, camera::CameraState, settings::ViewerConfig};

pub struct DetailLevelPlugin;

impl Plugin for DetailLevelPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(DetailState::default())
            .add_event::<DetailLevelChanged>()
            .add_systems(Update, classify_camera_distance.in_set(FrameSet::Classify));
    }
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailLevelChanged {
    pub from: usize,
    pub to: usize,
}

#[derive(Resource, Debug, Clone)]
pub struct DetailState {
    pub classifier: ZoomLevelClassifier,
    pub current: Classification,
}

impl Default for DetailState {
    fn default() -> Self {
        let classifier = ZoomLevelClassifier::default();
        let current = classifier.classification(f32::MAX, 1.0, 1.0);
        Self {
            classifier,
            current,
        }
    }
}

impl DetailState {
    pub fn current_level(&self) -> &DetailLevel {
        self.classifier.level(self.current.level)
    }
}

fn classify_camera_distance(
    camera: Res<CameraState>,
    config: Res<ViewerConfig>,
    mut detail: ResMut<DetailState>,
    mut changed: EventWriter<DetailLevelChanged>,
) {
    let distance = camera.navigator.pose().distance();
    let km_per_unit = config.projection.km_per_unit() as f32;
    let next = detail
        .classifier
        .classification(distance, config.camera.fov_y, km_per_unit);

    if next.level != detail.current.level {
        let level = detail.classifier.level(next.level);
        info!(
            "Detail level {} -> {} ({}) at distance {:.1}",
            detail.current.level, next.level, level.label, distance
        );
        changed.write(DetailLevelChanged {
            from: detail.current.level,
            to: next.level,
        });
    }
    // Avoid flagging the resource as changed on frames where nothing moved.
    if next != detail.current {
        detail.current = next;
    }
}
