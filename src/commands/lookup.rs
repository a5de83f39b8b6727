use serde::Deserialize;
use ureq::Agent;

use crate::{error::ProviderError, streaming::get_text, types::Coord};

#[derive(Debug, Clone, PartialEq)]
pub struct LocationMatch {
    pub display_name: String,
    pub coord: Coord,
}

#[derive(Debug, Deserialize)]
struct LocationResponse {
    location: Option<String>,
    coordinates: Option<Coord>,
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

/// Decodes the location endpoint. The backend answers misses with a
/// placeholder row typed `"Error"` rather than a 404.
pub fn parse_location(name: &str, body: &str) -> Result<LocationMatch, ProviderError> {
    let response: LocationResponse = serde_json::from_str(body)?;
    let miss = response
        .data
        .first()
        .and_then(|row| row.get("type"))
        .and_then(|t| t.as_str())
        == Some("Error");
    match response.coordinates {
        Some(coord) if !miss => Ok(LocationMatch {
            display_name: response.location.unwrap_or_else(|| name.to_string()),
            coord,
        }),
        _ => Err(ProviderError::NotFound(name.to_string())),
    }
}

fn location_url(base_url: &str, name: &str) -> String {
    format!(
        "{}/api/location/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(name.trim())
    )
}

/// Blocking lookup of a free-form place name.
pub fn lookup_location(
    agent: &Agent,
    base_url: &str,
    name: &str,
) -> Result<LocationMatch, ProviderError> {
    let body = get_text(agent, &location_url(base_url, name))?;
    parse_location(name, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn found_location_uses_first_match() {
        let body = r#"{
            "location": "New Delhi",
            "coordinates": { "lat": 28.64, "lon": 77.22 },
            "data": [{ "type": "Station", "name": "New Delhi" }],
            "total_items": 1
        }"#;
        assert_eq!(
            parse_location("delhi", body).unwrap(),
            LocationMatch {
                display_name: "New Delhi".to_string(),
                coord: Coord::new(28.64, 77.22)
            }
        );
    }

    #[test]
    fn placeholder_row_means_not_found() {
        let body = r#"{
            "location": "Atlantis",
            "coordinates": { "lat": 20.59, "lon": 78.96 },
            "data": [{ "message": "No data found for 'atlantis'", "type": "Error" }]
        }"#;
        assert!(matches!(
            parse_location("atlantis", body),
            Err(ProviderError::NotFound(name)) if name == "atlantis"
        ));
    }

    #[test]
    fn names_are_percent_encoded() {
        assert_eq!(
            location_url("http://localhost:8091/", " Navi Mumbai/2 "),
            "http://localhost:8091/api/location/Navi%20Mumbai%2F2"
        );
        assert_eq!(
            location_url("http://api", "Bengaluru Cantt."),
            "http://api/api/location/Bengaluru%20Cantt."
        );
    }
}
