//! # Streaming
//!
//! Keeps one small cache per feature category, keyed by the current detail
//! level. Requests run on the async compute pool; their results are applied
//! at the start of the following frame so the published sets never change
//! while a frame is reading them.

mod client;
mod loader;
mod streamer;
mod worker;

use std::sync::Arc;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

pub use client::*;
pub use loader::*;
pub use streamer::*;
pub use worker::*;

use crate::{FrameSet, lod::DetailState, settings::ViewerConfig};

pub struct StreamingPlugin;

impl Plugin for StreamingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<StreamState>()
            .init_resource::<FetchWorker>()
            .add_systems(PreUpdate, apply_fetch_results)
            .add_systems(Update, request_detail.in_set(FrameSet::Stream))
            .add_systems(Update, cleanup_tasks);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Fraction of a level the camera must move past the last fetched
    /// bucket before a category refetches.
    pub hysteresis_margin: f32,
    pub fetch_timeout_secs: f64,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            hysteresis_margin: 0.3,
            fetch_timeout_secs: 10.0,
        }
    }
}

#[derive(Resource, Debug)]
pub struct StreamState {
    pub streamer: TileDataStreamer,
    /// Most recent successful fetch per category, newest last.
    pub summaries: Vec<FetchSummary>,
}

impl FromWorld for StreamState {
    fn from_world(world: &mut World) -> Self {
        let config = world
            .get_resource::<ViewerConfig>()
            .map(|c| c.streaming.clone())
            .unwrap_or_default();
        Self {
            streamer: TileDataStreamer::new(config.hysteresis_margin, config.fetch_timeout_secs),
            summaries: Vec::new(),
        }
    }
}

impl FromWorld for FetchWorker {
    fn from_world(world: &mut World) -> Self {
        let config = world
            .get_resource::<ViewerConfig>()
            .map(|c| c.provider.clone())
            .unwrap_or_default();
        info!("Streaming features from {}", config.base_url);
        FetchWorker::new(Arc::new(HttpFeatureProvider::new(&config)))
    }
}

fn apply_fetch_results(
    worker: Res<FetchWorker>,
    detail: Res<DetailState>,
    mut state: ResMut<StreamState>,
) {
    let outcomes = worker.drain();
    if outcomes.is_empty() {
        return;
    }
    let level = detail.current_level();
    for outcome in outcomes {
        if let Applied::Published(summary) =
            state.streamer.apply(outcome, detail.current.level, level.max_feature_count)
        {
            info!(
                "{}: level {} ({}), {} available, {} displayed",
                summary.category, summary.level, level.label, summary.available, summary.displayed
            );
            state.summaries.retain(|s| s.category != summary.category);
            state.summaries.push(summary);
        }
    }
}

fn request_detail(
    mut commands: Commands,
    time: Res<Time>,
    detail: Res<DetailState>,
    worker: Res<FetchWorker>,
    mut state: ResMut<StreamState>,
) {
    let now = time.elapsed_secs_f64();
    let level = detail.current_level();

    state.streamer.expire(now);
    let tickets = state.streamer.plan(&detail.current, level, now);
    for ticket in tickets {
        debug!("Requesting {} for level {}", ticket.category, level.label);
        worker.dispatch(&mut commands, ticket, level.clone());
    }
}
