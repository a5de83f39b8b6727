use std::time::Duration;

use bevy::log::debug;
use ureq::Agent;

use crate::{
    error::ProviderError,
    lod::DetailLevel,
    settings::ProviderConfig,
    types::{FeatureCategory, FeatureRecord},
};

use super::{records_from_geojson, records_from_station_level};

/// Source of feature records for one category at one detail level. May
/// return more records than the level displays.
pub trait FeatureProvider: Send + Sync {
    fn fetch(
        &self,
        category: FeatureCategory,
        level: &DetailLevel,
    ) -> Result<Vec<FeatureRecord>, ProviderError>;
}

pub fn build_agent(timeout_secs: u64) -> Agent {
    let config = Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(timeout_secs)))
        .build();
    config.into()
}

/// Blocking GET returning the body as text.
pub fn get_text(agent: &Agent, url: &str) -> Result<String, ProviderError> {
    let mut response = agent.get(url).call().map_err(ProviderError::from_ureq)?;
    response.body_mut().read_to_string().map_err(ProviderError::from_ureq)
}

#[derive(Clone)]
pub struct HttpFeatureProvider {
    agent: Agent,
    base_url: String,
}

impl HttpFeatureProvider {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            agent: build_agent(config.timeout_secs),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url_for(&self, category: FeatureCategory, level: &DetailLevel) -> String {
        match category {
            FeatureCategory::PointOfInterest => {
                format!("{}/api/stations/level/{}", self.base_url, level.station_tier)
            }
            _ => format!(
                "{}/api/geojson/{}/zoom/{}",
                self.base_url,
                category.label(),
                level.provider_zoom
            ),
        }
    }
}

impl FeatureProvider for HttpFeatureProvider {
    fn fetch(
        &self,
        category: FeatureCategory,
        level: &DetailLevel,
    ) -> Result<Vec<FeatureRecord>, ProviderError> {
        let url = self.url_for(category, level);
        debug!("GET {url}");
        let body = get_text(&self.agent, &url)?;
        match category {
            FeatureCategory::PointOfInterest => records_from_station_level(&body),
            _ => records_from_geojson(&body, category),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lod::standard_levels;

    #[test]
    fn urls_follow_backend_routes() {
        let provider = HttpFeatureProvider::new(&ProviderConfig {
            base_url: "http://localhost:8091/".to_string(),
            timeout_secs: 5,
        });
        let levels = standard_levels();
        assert_eq!(
            provider.url_for(FeatureCategory::PointOfInterest, &levels[2]),
            "http://localhost:8091/api/stations/level/2"
        );
        assert_eq!(
            provider.url_for(FeatureCategory::DistrictBoundary, &levels[1]),
            "http://localhost:8091/api/geojson/districts/zoom/12"
        );
    }
}
