use bevy::prelude::*;

/// Dense polyline with cumulative arc length, sampled by progress.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    points: Vec<Vec3>,
    cumulative: Vec<f32>,
}

impl Trajectory {
    /// Inserts evenly spaced points so no segment is longer than `step`.
    pub fn densify(waypoints: &[Vec3], step: f32) -> Self {
        let step = if step > f32::EPSILON { step } else { 1.0 };
        let mut points = Vec::new();
        for pair in waypoints.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let pieces = ((a.distance(b) / step).ceil() as usize).max(1);
            for i in 0..pieces {
                points.push(a.lerp(b, i as f32 / pieces as f32));
            }
        }
        if let Some(last) = waypoints.last() {
            points.push(*last);
        }

        let mut cumulative = Vec::with_capacity(points.len());
        let mut total = 0.0;
        for (i, p) in points.iter().enumerate() {
            if i > 0 {
                total += points[i - 1].distance(*p);
            }
            cumulative.push(total);
        }
        Self { points, cumulative }
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn length(&self) -> f32 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Position at `progress` of the way along, plus the heading of the
    /// segment it sits on (radians clockwise from north, -z).
    pub fn sample(&self, progress: f32) -> Option<(Vec3, f32)> {
        let first = *self.points.first()?;
        if self.points.len() == 1 {
            return Some((first, 0.0));
        }
        let target = progress.clamp(0.0, 1.0) * self.length();
        let segment = self
            .cumulative
            .partition_point(|d| *d <= target)
            .clamp(1, self.points.len() - 1);

        let (a, b) = (self.points[segment - 1], self.points[segment]);
        let span = self.cumulative[segment] - self.cumulative[segment - 1];
        let t = if span > f32::EPSILON {
            (target - self.cumulative[segment - 1]) / span
        } else {
            1.0
        };
        let direction = b - a;
        Some((a.lerp(b, t), direction.x.atan2(-direction.z)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        a.distance(b) < 1e-4
    }

    #[test]
    fn densified_segments_respect_step() {
        let corners = [
            Vec3::ZERO,
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, -4.0),
        ];
        let trajectory = Trajectory::densify(&corners, 1.0);
        assert_eq!(trajectory.points().len(), 15);
        assert!((trajectory.length() - 14.0).abs() < 1e-4);
        for pair in trajectory.points().windows(2) {
            assert!(pair[0].distance(pair[1]) <= 1.0 + 1e-4);
        }
    }

    #[test]
    fn samples_by_arc_length() {
        let corners = [
            Vec3::ZERO,
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, -10.0),
        ];
        let trajectory = Trajectory::densify(&corners, 3.0);
        let (start, _) = trajectory.sample(0.0).unwrap();
        let (mid, heading) = trajectory.sample(0.5).unwrap();
        let (end, north) = trajectory.sample(1.0).unwrap();
        assert!(approx(start, Vec3::ZERO));
        assert!(approx(mid, Vec3::new(10.0, 0.0, 0.0)));
        assert!(approx(end, Vec3::new(10.0, 0.0, -10.0)));
        // Heading north on the second leg, east on the first.
        assert!(heading.abs() < 1e-4);
        assert!(north.abs() < 1e-4);
        let (_, east) = trajectory.sample(0.25).unwrap();
        assert!((east - std::f32::consts::FRAC_PI_2).abs() < 1e-4);
    }

    #[test]
    fn degenerate_inputs() {
        assert!(Trajectory::densify(&[], 1.0).sample(0.5).is_none());
        let single = Trajectory::densify(&[Vec3::ONE], 1.0);
        assert_eq!(single.sample(0.7), Some((Vec3::ONE, 0.0)));
        assert_eq!(single.length(), 0.0);
    }
}
