use std::str::FromStr;

use geo::Centroid;
use geojson::{GeoJson, feature::Id};
use serde::Deserialize;

use crate::{
    error::ProviderError,
    types::{Coord, FeatureCategory, FeatureRecord, RenderAttributes},
};

/// Ranking used by the railway backend for station categories.
pub fn station_category_importance(category: &str) -> Option<f64> {
    match category.trim().to_ascii_uppercase().as_str() {
        "A1" => Some(5.0),
        "A" => Some(4.0),
        "B" => Some(3.0),
        "C" => Some(2.0),
        "D" => Some(1.0),
        _ => None,
    }
}

fn importance_of(properties: &serde_json::Value) -> f64 {
    if let Some(v) = properties.get("importance").and_then(|v| v.as_f64()) {
        return v;
    }
    if let Some(v) = properties
        .get("category")
        .and_then(|v| v.as_str())
        .and_then(station_category_importance)
    {
        return v;
    }
    properties
        .get("population")
        .and_then(|v| v.as_f64())
        .filter(|p| *p >= 1.0)
        .map(|p| p.log10())
        .unwrap_or(0.0)
}

fn to_coord(position: &[f64]) -> Option<Coord> {
    match position {
        [lon, lat, ..] => Some(Coord::new(*lat, *lon)),
        _ => None,
    }
}

fn to_ring(ring: &[Vec<f64>]) -> Vec<Coord> {
    ring.iter().filter_map(|p| to_coord(p)).collect()
}

fn to_line_string(ring: &[Vec<f64>]) -> geo::LineString<f64> {
    geo::LineString(
        ring.iter()
            .filter(|p| p.len() >= 2)
            .map(|p| geo::Coord { x: p[0], y: p[1] })
            .collect(),
    )
}

fn to_polygon(rings: &[Vec<Vec<f64>>]) -> Option<geo::Polygon<f64>> {
    let (exterior, interiors) = rings.split_first()?;
    Some(geo::Polygon::new(
        to_line_string(exterior),
        interiors.iter().map(|r| to_line_string(r)).collect(),
    ))
}

fn point_to_coord(point: geo::Point<f64>) -> Coord {
    Coord::new(point.y(), point.x())
}

/// Representative position and outline rings of a geometry.
fn locate(value: &geojson::Value) -> Option<(Coord, Vec<Vec<Coord>>)> {
    match value {
        geojson::Value::Point(p) => Some((to_coord(p)?, vec![])),
        geojson::Value::LineString(line) => {
            let centroid = to_line_string(line).centroid()?;
            Some((point_to_coord(centroid), vec![to_ring(line)]))
        }
        geojson::Value::Polygon(rings) => {
            let centroid = to_polygon(rings)?.centroid()?;
            Some((point_to_coord(centroid), rings.iter().map(|r| to_ring(r)).collect()))
        }
        geojson::Value::MultiPolygon(polys) => {
            let multi = geo::MultiPolygon(polys.iter().filter_map(|p| to_polygon(p)).collect());
            let centroid = multi.centroid()?;
            let rings = polys.iter().flatten().map(|r| to_ring(r)).collect();
            Some((point_to_coord(centroid), rings))
        }
        _ => None,
    }
}

fn feature_id(id: Option<&Id>, properties: &serde_json::Value, index: usize) -> String {
    match id {
        Some(Id::String(s)) => s.clone(),
        Some(Id::Number(n)) => n.to_string(),
        None => ["code", "id", "name"]
            .iter()
            .find_map(|key| properties.get(*key).and_then(|v| v.as_str()).map(str::to_string))
            .unwrap_or_else(|| format!("feature-{index}")),
    }
}

/// Decodes a GeoJSON document into records of one category. Features with
/// no usable geometry are skipped.
pub fn records_from_geojson(
    data: &str,
    category: FeatureCategory,
) -> Result<Vec<FeatureRecord>, ProviderError> {
    let geojson = GeoJson::from_str(data)?;
    let features = match geojson {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => vec![],
    };

    let mut records = Vec::with_capacity(features.len());
    for (index, feature) in features.into_iter().enumerate() {
        let Some(geometry) = feature.geometry.as_ref() else {
            continue;
        };
        let Some((position, rings)) = locate(&geometry.value) else {
            continue;
        };
        let properties = serde_json::Value::Object(feature.properties.clone().unwrap_or_default());
        let id = feature_id(feature.id.as_ref(), &properties, index);
        let name = properties.get("name").and_then(|v| v.as_str()).map(str::to_string);

        let attributes = match category {
            FeatureCategory::StateBoundary | FeatureCategory::DistrictBoundary
                if !rings.is_empty() =>
            {
                RenderAttributes::Outline { rings }
            }
            FeatureCategory::DynamicAsset => RenderAttributes::Asset {
                kind: properties
                    .get("type")
                    .and_then(|v| v.as_str())
                    .unwrap_or("asset")
                    .to_string(),
                heading_deg: properties.get("heading").and_then(|v| v.as_f64()).unwrap_or(0.0),
            },
            _ => RenderAttributes::Point { label: name },
        };

        records.push(FeatureRecord {
            id,
            category,
            position,
            importance: importance_of(&properties),
            attributes,
            properties,
        });
    }
    Ok(records)
}

#[derive(Debug, Deserialize)]
struct StationLevelResponse {
    stations: Vec<StationEntry>,
}

#[derive(Debug, Deserialize)]
struct StationEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    code: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    importance: Option<f64>,
    #[serde(default)]
    zone: Option<String>,
}

/// Decodes the `{ "stations": [...] }` shape of the per-level station endpoint.
pub fn records_from_station_level(data: &str) -> Result<Vec<FeatureRecord>, ProviderError> {
    let response: StationLevelResponse = serde_json::from_str(data)?;
    Ok(response
        .stations
        .into_iter()
        .map(|s| {
            let importance = s
                .importance
                .or_else(|| s.category.as_deref().and_then(station_category_importance))
                .unwrap_or(0.0);
            let label = if s.code.is_empty() {
                s.name.clone()
            } else {
                format!("{} ({})", s.name, s.code)
            };
            FeatureRecord {
                id: if s.code.is_empty() { s.name.clone() } else { s.code.clone() },
                category: FeatureCategory::PointOfInterest,
                position: Coord::new(s.lat, s.lon),
                importance,
                attributes: RenderAttributes::Point { label: Some(label) },
                properties: serde_json::json!({
                    "name": s.name,
                    "code": s.code,
                    "category": s.category,
                    "zone": s.zone,
                }),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stations_take_importance_from_category() {
        let raw = r#"{ "stations": [
            { "name": "New Delhi", "code": "NDLS", "lat": 28.64, "lon": 77.22, "category": "A1" },
            { "name": "Agra Cantt", "code": "AGC", "lat": 27.16, "lon": 77.99,
              "category": "A", "importance": 4.5 },
            { "name": "Nowhere", "code": "", "lat": 20.0, "lon": 80.0 }
        ], "level": 3, "total": 3 }"#;
        let records = records_from_station_level(raw).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id, "NDLS");
        assert_eq!(records[0].importance, 5.0);
        assert_eq!(records[0].label(), Some("New Delhi (NDLS)"));
        assert_eq!(records[1].importance, 4.5);
        assert_eq!(records[2].id, "Nowhere");
        assert_eq!(records[2].importance, 0.0);
        assert_eq!(records[0].position, Coord::new(28.64, 77.22));
    }

    #[test]
    fn polygons_become_outlines_at_their_centroid() {
        let raw = r#"{ "type": "FeatureCollection", "features": [
            { "type": "Feature", "properties": { "name": "Square", "population": 1000 },
              "geometry": { "type": "Polygon",
                            "coordinates": [[[70,10],[72,10],[72,12],[70,12],[70,10]]] } },
            { "type": "Feature", "properties": { "name": "Empty" }, "geometry": null }
        ] }"#;
        let records = records_from_geojson(raw, FeatureCategory::StateBoundary).unwrap();
        assert_eq!(records.len(), 1);
        let square = &records[0];
        assert_eq!(square.id, "Square");
        assert!((square.position.lat - 11.0).abs() < 1e-9);
        assert!((square.position.long - 71.0).abs() < 1e-9);
        assert!((square.importance - 3.0).abs() < 1e-9);
        match &square.attributes {
            RenderAttributes::Outline { rings } => assert_eq!(rings[0].len(), 5),
            other => panic!("expected outline, got {other:?}"),
        }
    }

    #[test]
    fn assets_carry_kind_and_heading() {
        let raw = r#"{ "type": "FeatureCollection", "features": [
            { "type": "Feature", "id": 7, "properties": { "type": "drone", "heading": 45 },
              "geometry": { "type": "Point", "coordinates": [77.5, 12.9] } }
        ] }"#;
        let records = records_from_geojson(raw, FeatureCategory::DynamicAsset).unwrap();
        assert_eq!(records[0].id, "7");
        assert_eq!(
            records[0].attributes,
            RenderAttributes::Asset {
                kind: "drone".to_string(),
                heading_deg: 45.0
            }
        );
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(records_from_geojson("not json", FeatureCategory::City).is_err());
        assert!(matches!(
            records_from_station_level("{}"),
            Err(ProviderError::Decode(_))
        ));
    }
}
