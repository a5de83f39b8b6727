use bevy::{
    color::palettes::css::GOLD,
    diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin},
    prelude::*,
};

use crate::{
    lod::{DetailLevelChanged, DetailState},
    streaming::StreamState,
};

pub struct DebugPlugin;

impl Plugin for DebugPlugin {
    fn build(&self, app: &mut App) {
        if cfg!(debug_assertions) {
            app.add_plugins(FrameTimeDiagnosticsPlugin::default())
                .add_systems(Startup, (debug_draw_fps, debug_draw_detail))
                .add_systems(Update, (text_update_fps, text_update_detail, log_level_changes));
        }
    }
}

#[derive(Component)]
pub struct FpsText;

#[derive(Component)]
pub struct DetailText;

pub fn debug_draw_fps(mut commands: Commands) {
    commands
        .spawn((
            Text::new("FPS: "),
            TextFont {
                font_size: 21.0,
                ..default()
            },
            Node {
                position_type: PositionType::Absolute,
                top: Val::Px(5.0),
                right: Val::Px(5.0),
                ..default()
            },
        ))
        .with_child((
            TextSpan::default(),
            (
                TextFont {
                    font_size: 18.0,
                    ..default()
                },
                TextColor(GOLD.into()),
            ),
            FpsText,
        ));
}

pub fn text_update_fps(
    diagnostics: Res<DiagnosticsStore>,
    mut query: Query<&mut TextSpan, With<FpsText>>,
) {
    for mut span in &mut query {
        if let Some(value) = diagnostics
            .get(&FrameTimeDiagnosticsPlugin::FPS)
            .and_then(|fps| fps.smoothed())
        {
            **span = format!("{value:.2}");
        }
    }
}

pub fn debug_draw_detail(mut commands: Commands) {
    commands
        .spawn((
            Text::new("Detail: "),
            TextFont {
                font_size: 21.0,
                ..default()
            },
            Node {
                position_type: PositionType::Absolute,
                bottom: Val::Px(5.0),
                right: Val::Px(5.0),
                ..default()
            },
        ))
        .with_child((
            TextSpan::default(),
            TextFont {
                font_size: 18.0,
                ..default()
            },
            TextColor(GOLD.into()),
            DetailText,
        ));
}

/// Level label in its own colour, camera distance, ground coverage and the
/// streaming status.
pub fn text_update_detail(
    detail: Res<DetailState>,
    stream: Res<StreamState>,
    mut query: Query<(&mut TextSpan, &mut TextColor), With<DetailText>>,
) {
    if !detail.is_changed() && !stream.is_changed() {
        return;
    }
    let level = detail.current_level();
    let color = Srgba::hex(level.color).map(Color::from).unwrap_or(GOLD.into());
    for (mut span, mut text_color) in &mut query {
        **span = format!(
            "{} | distance {:.1} | ~{:.0} km across | {}",
            level.label,
            detail.current.distance,
            detail.current.coverage_km,
            stream_status(&stream)
        );
        text_color.0 = color;
    }
}

/// Outstanding requests, the newest applied fetch and any failing
/// categories.
pub fn stream_status(stream: &StreamState) -> String {
    let mut status = format!("{} in flight", stream.streamer.in_flight_count());
    if let Some(last) = stream.summaries.last() {
        status.push_str(&format!(
            " | {} {}/{} at {}",
            last.category,
            last.displayed,
            last.available,
            last.at.format("%H:%M:%S")
        ));
    }
    let failed: Vec<String> = stream
        .streamer
        .failures()
        .map(|(category, e)| format!("{category} ({e})"))
        .collect();
    if !failed.is_empty() {
        status.push_str(&format!(" | failing: {}", failed.join(", ")));
    }
    status
}

fn log_level_changes(mut changes: EventReader<DetailLevelChanged>) {
    for change in changes.read() {
        debug!("Detail level changed {} -> {}", change.from, change.to);
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::{
        lod::ZoomLevelClassifier,
        streaming::{FetchSummary, TileDataStreamer},
        types::FeatureCategory,
    };

    #[test]
    fn status_shows_newest_fetch_and_failures() {
        let classifier = ZoomLevelClassifier::default();
        let mut streamer = TileDataStreamer::new(0.3, 10.0);
        let far = classifier.classification(95.0, 1.0, 1.0);
        streamer.plan(&far, classifier.level(far.level), 0.0);
        streamer.expire(30.0);

        let stream = StreamState {
            streamer,
            summaries: vec![FetchSummary {
                category: FeatureCategory::City,
                level: 1,
                available: 300,
                displayed: 200,
                at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 7).unwrap(),
            }],
        };
        let status = stream_status(&stream);
        assert!(status.starts_with("0 in flight | cities 200/300 at 09:05:07"));
        assert!(status.contains("failing: stations"));
    }

    #[test]
    fn quiet_stream_only_counts_requests() {
        let stream = StreamState {
            streamer: TileDataStreamer::new(0.3, 10.0),
            summaries: Vec::new(),
        };
        assert_eq!(stream_status(&stream), "0 in flight");
    }
}
