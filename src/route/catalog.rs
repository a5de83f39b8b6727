use crate::{
    error::RouteError,
    types::{Coord, FeatureRecord},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub code: String,
    pub name: String,
    pub position: Coord,
}

impl Waypoint {
    pub fn new(code: &str, name: &str, lat: f64, lon: f64) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            position: Coord::new(lat, lon),
        }
    }

    pub fn display_name(&self) -> String {
        if self.code.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.code)
        }
    }
}

/// The fixed set of named locations trips run between.
#[derive(Debug, Clone)]
pub struct StationCatalog {
    waypoints: Vec<Waypoint>,
}

impl Default for StationCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl StationCatalog {
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self { waypoints }
    }

    /// Major stations, used until the backend list arrives.
    pub fn builtin() -> Self {
        Self::new(vec![
            Waypoint::new("NDLS", "New Delhi", 28.6429, 77.2191),
            Waypoint::new("AGC", "Agra Cantt", 27.1587, 77.9913),
            Waypoint::new("JP", "Jaipur Junction", 26.9196, 75.7878),
            Waypoint::new("ASR", "Amritsar Junction", 31.6328, 74.8680),
            Waypoint::new("JAT", "Jammu Tawi", 32.7061, 74.8789),
            Waypoint::new("LKO", "Lucknow Charbagh", 26.8314, 80.9239),
            Waypoint::new("CNB", "Kanpur Central", 26.4539, 80.3511),
            Waypoint::new("BSB", "Varanasi Junction", 25.3269, 82.9872),
            Waypoint::new("PNBE", "Patna Junction", 25.6030, 85.1374),
            Waypoint::new("HWH", "Howrah Junction", 22.5839, 88.3425),
            Waypoint::new("GHY", "Guwahati", 26.1817, 91.7506),
            Waypoint::new("BBS", "Bhubaneswar", 20.2667, 85.8431),
            Waypoint::new("VSKP", "Visakhapatnam", 17.7226, 83.2896),
            Waypoint::new("BPL", "Bhopal Junction", 23.2669, 77.4126),
            Waypoint::new("NGP", "Nagpur Junction", 21.1520, 79.0882),
            Waypoint::new("ADI", "Ahmedabad Junction", 23.0265, 72.6005),
            Waypoint::new("BCT", "Mumbai Central", 18.9690, 72.8205),
            Waypoint::new("CSMT", "Mumbai CSMT", 18.9398, 72.8355),
            Waypoint::new("PUNE", "Pune Junction", 18.5289, 73.8744),
            Waypoint::new("SC", "Secunderabad Junction", 17.4337, 78.5016),
            Waypoint::new("SBC", "KSR Bengaluru", 12.9784, 77.5697),
            Waypoint::new("MAS", "Chennai Central", 13.0827, 80.2757),
            Waypoint::new("ERS", "Ernakulam Junction", 9.9690, 76.2906),
            Waypoint::new("TVC", "Thiruvananthapuram Central", 8.4875, 76.9525),
        ])
    }

    /// Builds a catalog from decoded station features; unnamed records are dropped.
    pub fn from_records(records: &[FeatureRecord]) -> Self {
        let waypoints = records
            .iter()
            .filter_map(|r| {
                let name = r.properties.get("name").and_then(|v| v.as_str())?;
                let code = r
                    .properties
                    .get("code")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                Some(Waypoint {
                    code: code.to_string(),
                    name: name.to_string(),
                    position: r.position,
                })
            })
            .collect();
        Self::new(waypoints)
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn positions(&self) -> Vec<Coord> {
        self.waypoints.iter().map(|w| w.position).collect()
    }

    /// Case-insensitive lookup by code, full name, display name, or a
    /// substring that matches exactly one station.
    pub fn find(&self, query: &str) -> Result<usize, RouteError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Err(RouteError::UnknownWaypoint(query.to_string()));
        }

        let exact = self.waypoints.iter().position(|w| {
            w.code.to_lowercase() == needle
                || w.name.to_lowercase() == needle
                || w.display_name().to_lowercase() == needle
        });
        if let Some(index) = exact {
            return Ok(index);
        }

        let mut partial = self
            .waypoints
            .iter()
            .enumerate()
            .filter(|(_, w)| w.display_name().to_lowercase().contains(&needle));
        match (partial.next(), partial.next()) {
            (Some((index, _)), None) => Ok(index),
            _ => Err(RouteError::UnknownWaypoint(query.to_string())),
        }
    }
}
