use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6378.137;

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize, Copy)]
#[serde(rename_all = "camelCase")]
pub struct Coord {
    pub lat: f64,
    #[serde(rename = "lon")]
    pub long: f64,
}

impl Coord {
    pub const fn new(lat: f64, long: f64) -> Self {
        Self { lat, long }
    }

    /// Planar distance in degrees. Good enough for ranking neighbours on a
    /// country-sized map, which is all the route heuristic needs.
    pub fn degree_distance(&self, other: &Coord) -> f64 {
        let d_lat = other.lat - self.lat;
        let d_lon = other.long - self.long;
        (d_lat * d_lat + d_lon * d_lon).sqrt()
    }

    // https://stackoverflow.com/questions/639695/how-to-convert-latitude-or-longitude-to-meters
    pub fn distance_km(&self, other: &Coord) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let d_lat = lat2 - lat1;
        let d_lon = (other.long - self.long).to_radians();

        let a = (d_lat / 2.0).sin() * (d_lat / 2.0).sin()
            + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin() * (d_lon / 2.0).sin();
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }
}

/// Geographic rectangle the scene is laid out over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl GeoBounds {
    pub fn center(&self) -> Coord {
        Coord::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn contains(&self, coord: Coord) -> bool {
        (self.min_lat..=self.max_lat).contains(&coord.lat)
            && (self.min_lon..=self.max_lon).contains(&coord.long)
    }

    /// East-west extent in kilometres, measured along the centre latitude.
    pub fn width_km(&self) -> f64 {
        let lat = self.center().lat;
        Coord::new(lat, self.min_lon).distance_km(&Coord::new(lat, self.max_lon))
    }
}

impl Default for GeoBounds {
    // Mainland India plus a margin.
    fn default() -> Self {
        Self {
            min_lat: 6.0,
            max_lat: 37.0,
            min_lon: 68.0,
            max_lon: 98.0,
        }
    }
}
