use serde::{Deserialize, Serialize};

use crate::error::ClassifierError;

/// Which kinds of content a detail level wants drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisplayToggles {
    pub show_labels: bool,
    pub show_tracks: bool,
    pub show_boundaries: bool,
    pub show_assets: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailLevel {
    pub index: usize,
    pub label: &'static str,
    /// Hex colour used by the diagnostics overlay.
    pub color: &'static str,
    /// Lower bound of the distance bucket, inclusive. The upper bound is the
    /// next level's `min_distance`.
    pub min_distance: f32,
    pub tile_size_km: f32,
    pub max_feature_count: usize,
    /// Zoom value understood by the geojson endpoints.
    pub provider_zoom: f32,
    /// Station tier understood by the stations endpoint (0 = headquarters only).
    pub station_tier: u8,
    pub toggles: DisplayToggles,
}

impl DetailLevel {
    pub fn new(label: &'static str, min_distance: f32, max_feature_count: usize) -> Self {
        Self {
            index: 0,
            label,
            color: "#ffffff",
            min_distance,
            tile_size_km: 0.0,
            max_feature_count,
            provider_zoom: 0.0,
            station_tier: 0,
            toggles: DisplayToggles::default(),
        }
    }
}

const fn toggles(labels: bool, tracks: bool, boundaries: bool, assets: bool) -> DisplayToggles {
    DisplayToggles {
        show_labels: labels,
        show_tracks: tracks,
        show_boundaries: boundaries,
        show_assets: assets,
    }
}

/// Closest first. Thresholds are camera distances from the scene origin.
pub fn standard_levels() -> Vec<DetailLevel> {
    vec![
        DetailLevel {
            index: 0,
            label: "Street",
            color: "#e74c3c",
            min_distance: 0.0,
            tile_size_km: 10.0,
            max_feature_count: 400,
            provider_zoom: 20.0,
            station_tier: 3,
            toggles: toggles(true, true, true, true),
        },
        DetailLevel {
            index: 1,
            label: "City",
            color: "#e67e22",
            min_distance: 15.0,
            tile_size_km: 25.0,
            max_feature_count: 200,
            provider_zoom: 12.0,
            station_tier: 3,
            toggles: toggles(true, true, true, true),
        },
        DetailLevel {
            index: 2,
            label: "Regional",
            color: "#f1c40f",
            min_distance: 30.0,
            tile_size_km: 75.0,
            max_feature_count: 100,
            provider_zoom: 8.0,
            station_tier: 2,
            toggles: toggles(true, true, true, false),
        },
        DetailLevel {
            index: 3,
            label: "State",
            color: "#2ecc71",
            min_distance: 55.0,
            tile_size_km: 150.0,
            max_feature_count: 40,
            provider_zoom: 5.0,
            station_tier: 1,
            toggles: toggles(false, true, true, false),
        },
        DetailLevel {
            index: 4,
            label: "Country",
            color: "#3498db",
            min_distance: 80.0,
            tile_size_km: 400.0,
            max_feature_count: 10,
            provider_zoom: 2.0,
            station_tier: 0,
            toggles: toggles(false, false, false, false),
        },
    ]
}

/// Result of classifying one camera distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub level: usize,
    /// `level` plus the fractional position inside the bucket.
    pub continuous: f32,
    pub distance: f32,
    /// Approximate width of ground in view, kilometres. Diagnostics only.
    pub coverage_km: f32,
}

/// Pure lookup from camera distance to a detail level.
#[derive(Debug, Clone)]
pub struct ZoomLevelClassifier {
    levels: Vec<DetailLevel>,
}

impl Default for ZoomLevelClassifier {
    fn default() -> Self {
        Self {
            levels: standard_levels(),
        }
    }
}

impl ZoomLevelClassifier {
    pub fn new(mut levels: Vec<DetailLevel>) -> Result<Self, ClassifierError> {
        if levels.is_empty() {
            return Err(ClassifierError::Empty);
        }
        for i in 1..levels.len() {
            if levels[i].min_distance <= levels[i - 1].min_distance {
                return Err(ClassifierError::Unordered(i));
            }
        }
        for (i, level) in levels.iter_mut().enumerate() {
            level.index = i;
        }
        Ok(Self { levels })
    }

    pub fn levels(&self) -> &[DetailLevel] {
        &self.levels
    }

    pub fn level(&self, index: usize) -> &DetailLevel {
        &self.levels[index.min(self.levels.len() - 1)]
    }

    pub fn index_for(&self, distance: f32) -> usize {
        self.levels
            .partition_point(|l| l.min_distance <= distance)
            .saturating_sub(1)
    }

    pub fn classify(&self, distance: f32) -> &DetailLevel {
        &self.levels[self.index_for(distance)]
    }

    /// Index plus the position inside the bucket, in `[index, index + 1)`.
    /// The open-ended last bucket measures the overshoot relative to its
    /// lower bound.
    pub fn continuous_level(&self, distance: f32) -> f32 {
        let index = self.index_for(distance);
        let lo = self.levels[index].min_distance;
        let fraction = match self.levels.get(index + 1) {
            Some(next) => (distance - lo) / (next.min_distance - lo),
            None if lo > 0.0 => (distance - lo) / lo,
            None => 0.0,
        };
        index as f32 + fraction.clamp(0.0, 0.999)
    }

    pub fn classification(&self, distance: f32, fov_y: f32, km_per_unit: f32) -> Classification {
        Classification {
            level: self.index_for(distance),
            continuous: self.continuous_level(distance),
            distance,
            coverage_km: ground_coverage_km(distance, fov_y, km_per_unit),
        }
    }
}

/// Rough width of the ground footprint seen from `distance` with a vertical
/// field of view of `fov_y` radians.
pub fn ground_coverage_km(distance: f32, fov_y: f32, km_per_unit: f32) -> f32 {
    2.0 * distance * (fov_y / 2.0).tan() * km_per_unit
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_levels() -> ZoomLevelClassifier {
        ZoomLevelClassifier::new(vec![
            DetailLevel::new("near", 0.0, 50),
            DetailLevel::new("mid", 20.0, 20),
            DetailLevel::new("far", 80.0, 5),
        ])
        .unwrap()
    }

    #[test]
    fn table_driven_classification() {
        let classifier = three_levels();
        let cases = [
            (0.0, 0),
            (5.0, 0),
            (19.9, 0),
            (20.0, 1),
            (20.1, 1),
            (79.99, 1),
            (80.0, 2),
            (1000.0, 2),
        ];
        for (distance, expected) in cases {
            assert_eq!(classifier.classify(distance).index, expected, "distance {distance}");
        }
    }

    #[test]
    fn same_bucket_same_level() {
        let classifier = three_levels();
        for d in [21.0, 35.5, 50.0, 79.0] {
            assert_eq!(classifier.classify(d), classifier.classify(20.5));
        }
    }

    #[test]
    fn classification_is_monotonic() {
        let classifier = ZoomLevelClassifier::default();
        let mut previous = 0;
        for step in 0..400 {
            let level = classifier.index_for(step as f32 * 0.5);
            assert!(level >= previous);
            previous = level;
        }
        assert_eq!(previous, classifier.levels().len() - 1);
    }

    #[test]
    fn continuous_level_tracks_position_in_bucket() {
        let classifier = three_levels();
        assert_eq!(classifier.continuous_level(10.0), 0.5);
        assert_eq!(classifier.continuous_level(50.0), 1.5);
        assert_eq!(classifier.continuous_level(120.0), 2.5);
        assert!(classifier.continuous_level(10_000.0) < 3.0);
    }

    #[test]
    fn rejects_bad_tables() {
        assert_eq!(ZoomLevelClassifier::new(vec![]).unwrap_err(), ClassifierError::Empty);
        let err = ZoomLevelClassifier::new(vec![
            DetailLevel::new("a", 0.0, 1),
            DetailLevel::new("b", 10.0, 1),
            DetailLevel::new("c", 10.0, 1),
        ])
        .unwrap_err();
        assert_eq!(err, ClassifierError::Unordered(2));
    }

    #[test]
    fn new_reindexes_levels() {
        let classifier = three_levels();
        let indices: Vec<usize> = classifier.levels().iter().map(|l| l.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn coverage_grows_with_distance() {
        let near = ground_coverage_km(10.0, 1.0, 33.0);
        let far = ground_coverage_km(20.0, 1.0, 33.0);
        assert!((far - 2.0 * near).abs() < 1e-3);
    }
}
