use bevy::prelude::*;

use crate::{error::RouteError, projection::GeoProjection};

use super::{RouteConfig, StationCatalog, Trajectory, find_path};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub position: Vec3,
    /// Radians clockwise from north.
    pub heading: f32,
}

#[derive(Debug, Clone)]
pub struct Trip {
    /// Catalog indices, source first and destination last.
    pub path: Vec<usize>,
    pub stops: Vec<String>,
    pub trajectory: Trajectory,
    pub speed_multiplier: f32,
    progress: f32,
}

impl Trip {
    pub fn progress(&self) -> f32 {
        self.progress
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TripStep {
    pub marker: Marker,
    pub progress: f32,
    pub finished: bool,
    /// Stops of the trip that just ended; empty while it is still running.
    pub completed_stops: Vec<String>,
}

/// Owns at most one active trip and moves its progress forward.
#[derive(Debug, Default)]
pub struct RouteAnimator {
    trip: Option<Trip>,
}

impl RouteAnimator {
    pub fn trip(&self) -> Option<&Trip> {
        self.trip.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.trip.is_some()
    }

    /// Plans a trip between two named stations and starts it from zero,
    /// replacing any trip already running.
    pub fn start(
        &mut self,
        catalog: &StationCatalog,
        source: &str,
        destination: &str,
        speed_multiplier: f32,
        projection: &GeoProjection,
        config: &RouteConfig,
    ) -> Result<&Trip, RouteError> {
        let from = catalog.find(source)?;
        let to = catalog.find(destination)?;
        if from == to {
            let name = catalog
                .get(from)
                .map(|w| w.display_name())
                .unwrap_or_else(|| source.to_string());
            return Err(RouteError::SameEndpoints(name));
        }

        let path = find_path(&catalog.positions(), from, to, config);
        let stops: Vec<String> = path
            .iter()
            .filter_map(|i| catalog.get(*i).map(|w| w.display_name()))
            .collect();
        let scene: Vec<Vec3> = path
            .iter()
            .filter_map(|i| catalog.get(*i))
            .map(|w| projection.coord_to_scene(w.position))
            .collect();

        Ok(&*self.trip.insert(Trip {
            path,
            stops,
            trajectory: Trajectory::densify(&scene, config.densify_step),
            speed_multiplier: speed_multiplier.max(0.0),
            progress: 0.0,
        }))
    }

    pub fn stop(&mut self) -> Option<Trip> {
        self.trip.take()
    }

    /// Moves the active trip forward by `base_speed * multiplier * dt` scene
    /// units. The trip ends on the step that reaches the destination.
    pub fn advance(&mut self, dt: f32, base_speed: f32) -> Option<TripStep> {
        let trip = self.trip.as_mut()?;
        let length = trip.trajectory.length();
        let increment = if length > f32::EPSILON {
            (base_speed * trip.speed_multiplier * dt / length).max(0.0)
        } else {
            1.0
        };
        trip.progress = (trip.progress + increment).min(1.0);

        let (position, heading) = trip.trajectory.sample(trip.progress)?;
        let mut step = TripStep {
            marker: Marker { position, heading },
            progress: trip.progress,
            finished: trip.progress >= 1.0,
            completed_stops: Vec::new(),
        };
        if step.finished {
            if let Some(trip) = self.trip.take() {
                step.completed_stops = trip.stops;
            }
        }
        Some(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::Waypoint;

    fn catalog() -> StationCatalog {
        StationCatalog::new(vec![
            Waypoint::new("AAA", "Alpha", 20.0, 75.0),
            Waypoint::new("BBB", "Bravo", 21.0, 75.0),
            Waypoint::new("CCC", "Charlie", 22.0, 75.0),
            Waypoint::new("DDD", "Delta", 25.0, 80.0),
        ])
    }

    fn config() -> RouteConfig {
        RouteConfig {
            locality_threshold: 1.5,
            ..Default::default()
        }
    }

    #[test]
    fn start_plans_path_through_catalog() {
        let mut animator = RouteAnimator::default();
        let trip = animator
            .start(&catalog(), "alpha", "DDD", 1.0, &GeoProjection::default(), &config())
            .unwrap();
        assert_eq!(trip.path, vec![0, 1, 2, 3]);
        assert_eq!(trip.stops[3], "Delta (DDD)");
        assert_eq!(trip.progress(), 0.0);
    }

    #[test]
    fn unknown_or_identical_endpoints_are_refused() {
        let mut animator = RouteAnimator::default();
        let projection = GeoProjection::default();
        assert_eq!(
            animator.start(&catalog(), "alpha", "nowhere", 1.0, &projection, &config()).err(),
            Some(RouteError::UnknownWaypoint("nowhere".to_string()))
        );
        assert!(matches!(
            animator.start(&catalog(), "alpha", "AAA", 1.0, &projection, &config()),
            Err(RouteError::SameEndpoints(_))
        ));
        assert!(!animator.is_active());
    }

    #[test]
    fn progress_is_monotonic_and_finishes_once() {
        let mut animator = RouteAnimator::default();
        animator
            .start(&catalog(), "AAA", "DDD", 2.0, &GeoProjection::default(), &config())
            .unwrap();

        let mut last = 0.0;
        let mut finished = 0;
        for _ in 0..10_000 {
            let Some(step) = animator.advance(0.05, 3.0) else {
                break;
            };
            assert!(step.progress >= last);
            last = step.progress;
            if step.finished {
                finished += 1;
                assert_eq!(step.progress, 1.0);
                assert_eq!(step.completed_stops.len(), 4);
            }
        }
        assert_eq!(finished, 1);
        assert!(!animator.is_active());
        assert!(animator.advance(0.05, 3.0).is_none());
    }

    #[test]
    fn restart_resets_progress() {
        let mut animator = RouteAnimator::default();
        let projection = GeoProjection::default();
        animator.start(&catalog(), "AAA", "DDD", 1.0, &projection, &config()).unwrap();
        animator.advance(1.0, 5.0);
        assert!(animator.trip().unwrap().progress() > 0.0);
        animator.start(&catalog(), "BBB", "DDD", 1.0, &projection, &config()).unwrap();
        assert_eq!(animator.trip().unwrap().progress(), 0.0);
        assert!(animator.stop().is_some());
        assert!(!animator.is_active());
    }
}
