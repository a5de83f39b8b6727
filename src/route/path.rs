use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::types::Coord;

use super::RouteConfig;

/// A location in the search index, planar in (lat, lon) degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
struct IndexedLocation {
    index: usize,
    point: [f64; 2],
}

impl RTreeObject for IndexedLocation {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for IndexedLocation {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Greedy hop-by-hop path from `source` to `destination`. Each hop goes to
/// the unvisited location within the locality threshold with the lowest
/// score, where moving away from the destination costs a penalty. The
/// result starts at `source`, ends at `destination`, and never holds more
/// entries than there are locations.
pub fn find_path(
    locations: &[Coord],
    source: usize,
    destination: usize,
    config: &RouteConfig,
) -> Vec<usize> {
    if source >= locations.len() || destination >= locations.len() {
        return Vec::new();
    }
    if source == destination {
        return vec![source];
    }

    let tree = RTree::bulk_load(
        locations
            .iter()
            .enumerate()
            .map(|(index, c)| IndexedLocation {
                index,
                point: [c.lat, c.long],
            })
            .collect(),
    );

    let threshold = config.locality_threshold;
    let target = locations[destination];
    let mut visited = vec![false; locations.len()];
    visited[source] = true;
    let mut path = vec![source];
    let mut current = source;

    // Leave room for the destination itself.
    while path.len() + 1 < locations.len() {
        let here = locations[current];
        let remaining = here.degree_distance(&target);
        if remaining < threshold {
            break;
        }

        let best = tree
            .locate_within_distance([here.lat, here.long], threshold * threshold)
            .filter(|c| !visited[c.index] && c.index != destination)
            .filter_map(|c| {
                let candidate = locations[c.index];
                let d = here.degree_distance(&candidate);
                if d >= threshold {
                    return None;
                }
                let penalty = if candidate.degree_distance(&target) > remaining {
                    config.progress_penalty
                } else {
                    0.0
                };
                Some((d + penalty, c.index))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let Some((_, next)) = best else {
            break;
        };
        visited[next] = true;
        path.push(next);
        current = next;
    }

    path.push(destination);
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(threshold: f64) -> RouteConfig {
        RouteConfig {
            locality_threshold: threshold,
            ..Default::default()
        }
    }

    #[test]
    fn hops_through_neighbours_before_final_jump() {
        let locations = [
            Coord::new(0.0, 0.0),
            Coord::new(1.0, 0.0),
            Coord::new(2.0, 0.0),
            Coord::new(5.0, 5.0),
        ];
        assert_eq!(find_path(&locations, 0, 3, &config(1.5)), vec![0, 1, 2, 3]);
    }

    #[test]
    fn isolated_source_jumps_straight_to_destination() {
        let locations = [Coord::new(0.0, 0.0), Coord::new(10.0, 0.0), Coord::new(20.0, 0.0)];
        assert_eq!(find_path(&locations, 0, 2, &config(1.0)), vec![0, 2]);
    }

    #[test]
    fn prefers_progress_over_backtracking() {
        // B is slightly closer to A but points away from D.
        let locations = [
            Coord::new(0.0, 0.0),
            Coord::new(-0.9, 0.0),
            Coord::new(1.0, 0.0),
            Coord::new(3.0, 0.0),
        ];
        let path = find_path(&locations, 0, 3, &config(1.5));
        assert_eq!(path, vec![0, 2, 3]);
    }

    #[test]
    fn ties_go_to_the_lower_index() {
        let locations = [
            Coord::new(0.0, 0.0),
            Coord::new(1.0, 1.0),
            Coord::new(1.0, -1.0),
            Coord::new(5.0, 0.0),
            Coord::new(9.0, 0.0),
        ];
        let path = find_path(&locations, 0, 4, &config(1.5));
        assert_eq!(path[1], 1);
    }

    #[test]
    fn always_terminates_at_destination_within_bounds() {
        let locations: Vec<Coord> = (0..40)
            .map(|i| Coord::new((i * 7 % 13) as f64 * 0.6, (i * 5 % 11) as f64 * 0.6))
            .collect();
        for (src, dst) in [(0, 39), (5, 17), (39, 0), (12, 13)] {
            let path = find_path(&locations, src, dst, &config(2.0));
            assert_eq!(path.first(), Some(&src));
            assert_eq!(path.last(), Some(&dst));
            assert!(path.len() <= locations.len());
        }
    }

    #[test]
    fn same_endpoints_and_bad_indices() {
        let locations = [Coord::new(0.0, 0.0), Coord::new(1.0, 0.0)];
        assert_eq!(find_path(&locations, 1, 1, &config(1.5)), vec![1]);
        assert!(find_path(&locations, 0, 5, &config(1.5)).is_empty());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn path_terminates_at_destination(
                points in prop::collection::vec((0.0..20.0_f64, 0.0..20.0_f64), 2..40),
                src in any::<prop::sample::Index>(),
                dst in any::<prop::sample::Index>(),
                threshold in 0.5..8.0_f64
            ) {
                let locations: Vec<Coord> =
                    points.iter().map(|(lat, lon)| Coord::new(*lat, *lon)).collect();
                let (src, dst) = (src.index(locations.len()), dst.index(locations.len()));
                let path = find_path(&locations, src, dst, &config(threshold));
                prop_assert_eq!(path.first(), Some(&src));
                prop_assert_eq!(path.last(), Some(&dst));
                prop_assert!(path.len() <= locations.len());
            }
        }
    }
}
