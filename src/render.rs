use std::f32::consts::FRAC_PI_2;

use bevy::{color::palettes::css, prelude::*};

use crate::{
    lod::DetailState,
    route::RouteState,
    settings::ViewerConfig,
    streaming::StreamState,
    types::{Coord, FeatureCategory, RenderAttributes},
};

/// Draws what the other plugins publish. Read-only: nothing here writes
/// navigation, streaming or trip state.
pub struct RenderPlugin;

impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(Color::from(Srgba {
            red: 0.9,
            green: 0.9,
            blue: 0.8,
            alpha: 1.0,
        })))
        .add_systems(Update, (draw_map_frame, draw_features, draw_route));
    }
}

fn category_color(category: FeatureCategory) -> Color {
    match category {
        FeatureCategory::PointOfInterest => css::CRIMSON.into(),
        FeatureCategory::StateBoundary => css::DARK_SLATE_GRAY.into(),
        FeatureCategory::DistrictBoundary => css::SLATE_GRAY.into(),
        FeatureCategory::City => css::ROYAL_BLUE.into(),
        FeatureCategory::DynamicAsset => css::DARK_ORANGE.into(),
    }
}

fn flat(position: Vec3, radius: f32) -> (Isometry3d, f32) {
    (Isometry3d::new(position, Quat::from_rotation_x(FRAC_PI_2)), radius)
}

fn draw_map_frame(mut gizmos: Gizmos, config: Res<ViewerConfig>) {
    let projection = &config.projection;
    let b = projection.bounds;
    let corners = [
        Coord::new(b.min_lat, b.min_lon),
        Coord::new(b.min_lat, b.max_lon),
        Coord::new(b.max_lat, b.max_lon),
        Coord::new(b.max_lat, b.min_lon),
        Coord::new(b.min_lat, b.min_lon),
    ];
    gizmos.linestrip(
        corners.iter().map(|c| projection.coord_to_scene(*c)),
        css::GRAY,
    );
}

fn draw_features(
    mut gizmos: Gizmos,
    config: Res<ViewerConfig>,
    detail: Res<DetailState>,
    stream: Res<StreamState>,
    route: Res<RouteState>,
) {
    let projection = &config.projection;
    let level = detail.current_level();
    // Point markers shrink as the camera closes in.
    let radius = (detail.current.distance * 0.006).clamp(0.05, 0.6);

    for (category, records) in stream.streamer.all_published() {
        let color = category_color(*category);
        for record in records {
            let position = projection.coord_to_scene(record.position);
            match &record.attributes {
                RenderAttributes::Point { .. } => {
                    let (iso, r) = flat(position, radius);
                    gizmos.circle(iso, r, color);
                }
                RenderAttributes::Outline { rings } => {
                    for ring in rings {
                        gizmos.linestrip(ring.iter().map(|c| projection.coord_to_scene(*c)), color);
                    }
                }
                RenderAttributes::Asset { heading_deg, .. } => {
                    let heading = heading_deg.to_radians() as f32;
                    let dir = Vec3::new(heading.sin(), 0.0, -heading.cos());
                    gizmos.arrow(position, position + dir * radius * 4.0, color);
                }
            }
        }
    }

    if level.toggles.show_tracks {
        let stations: Vec<Vec3> = route
            .catalog
            .waypoints()
            .iter()
            .map(|w| projection.coord_to_scene(w.position))
            .collect();
        gizmos.linestrip(stations, css::SADDLE_BROWN.with_alpha(0.4));
    }
}

fn draw_route(mut gizmos: Gizmos, route: Res<RouteState>) {
    if let Some(trip) = route.animator.trip() {
        gizmos.linestrip(trip.trajectory.points().iter().copied(), css::GOLD);
    }
    if let Some(marker) = route.marker {
        let lifted = marker.position + Vec3::Y * 0.2;
        let (iso, r) = flat(lifted, 0.5);
        gizmos.circle(iso, r, css::LIME);
        let dir = Vec3::new(marker.heading.sin(), 0.0, -marker.heading.cos());
        gizmos.arrow(lifted, lifted + dir * 1.5, css::LIME);
    }
}
