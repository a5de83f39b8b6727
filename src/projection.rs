use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::types::{Coord, GeoBounds};

/// Linear mapping between geographic coordinates and scene space.
///
/// Longitude runs along +x, latitude along -z (north is "into" the screen)
/// and elevation along +y. Both horizontal axes span `[-scene_span / 2,
/// scene_span / 2]` across the bounding box. Nothing is clamped, so content
/// outside the box projects outside the visible area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct GeoProjection {
    pub bounds: GeoBounds,
    pub scene_span: f32,
    /// Scene units per kilometre of altitude.
    pub elevation_scale: f32,
}

impl Default for GeoProjection {
    fn default() -> Self {
        Self {
            bounds: GeoBounds::default(),
            scene_span: 100.0,
            elevation_scale: 1.0,
        }
    }
}

impl GeoProjection {
    pub fn to_scene(&self, lat: f64, lon: f64, elevation_km: f64) -> Vec3 {
        let b = &self.bounds;
        let span = self.scene_span as f64;
        let x = ((lon - b.min_lon) / b.lon_span() - 0.5) * span;
        let z = -((lat - b.min_lat) / b.lat_span() - 0.5) * span;
        let y = elevation_km * self.elevation_scale as f64;
        Vec3::new(x as f32, y as f32, z as f32)
    }

    pub fn coord_to_scene(&self, coord: Coord) -> Vec3 {
        self.to_scene(coord.lat, coord.long, 0.0)
    }

    pub fn to_geo(&self, x: f32, z: f32) -> Coord {
        let b = &self.bounds;
        let span = self.scene_span as f64;
        let long = (x as f64 / span + 0.5) * b.lon_span() + b.min_lon;
        let lat = (-(z as f64) / span + 0.5) * b.lat_span() + b.min_lat;
        Coord::new(lat, long)
    }

    /// Kilometres of ground per horizontal scene unit (east-west).
    pub fn km_per_unit(&self) -> f64 {
        self.bounds.width_km() / self.scene_span as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_corners_land_on_scene_edges() {
        let p = GeoProjection::default();
        let b = p.bounds;
        let sw = p.to_scene(b.min_lat, b.min_lon, 0.0);
        let ne = p.to_scene(b.max_lat, b.max_lon, 0.0);
        assert!((sw.x + 50.0).abs() < 1e-4 && (sw.z - 50.0).abs() < 1e-4);
        assert!((ne.x - 50.0).abs() < 1e-4 && (ne.z + 50.0).abs() < 1e-4);
    }

    #[test]
    fn center_maps_to_origin_and_back() {
        let p = GeoProjection::default();
        let c = p.bounds.center();
        let scene = p.to_scene(c.lat, c.long, 0.0);
        assert!(scene.length() < 1e-4);

        let delhi = Coord::new(28.6139, 77.2090);
        let v = p.coord_to_scene(delhi);
        let back = p.to_geo(v.x, v.z);
        assert!((back.lat - delhi.lat).abs() < 1e-4);
        assert!((back.long - delhi.long).abs() < 1e-4);
    }

    #[test]
    fn off_map_content_is_not_clamped() {
        let p = GeoProjection::default();
        let london = p.to_scene(51.5, -0.1, 0.0);
        assert!(london.x < -50.0);
        assert!(london.z < -50.0);
    }

    #[test]
    fn elevation_scales_onto_y() {
        let p = GeoProjection {
            elevation_scale: 0.5,
            ..Default::default()
        };
        assert_eq!(p.to_scene(20.0, 80.0, 10.0).y, 5.0);
    }
}
