use std::collections::BTreeMap;

use bevy::prelude::*;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::ProviderError,
    lod::{Classification, DetailLevel},
    types::{FeatureCategory, FeatureRecord},
};

/// Identifies one outstanding request. A response is only applied when it
/// carries the ticket its category is still waiting on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchTicket {
    pub id: Uuid,
    pub category: FeatureCategory,
    pub level: usize,
    /// Seconds since startup.
    pub issued_at: f64,
}

impl FetchTicket {
    pub fn new(category: FeatureCategory, level: usize, issued_at: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            category,
            level,
            issued_at,
        }
    }
}

#[derive(Debug, Default)]
pub struct FetchState {
    /// Level the last request was issued for.
    pub last_fetched_level: Option<usize>,
    pub in_flight: Option<FetchTicket>,
    pub last_error: Option<ProviderError>,
}

impl FetchState {
    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }
}

pub struct FetchOutcome {
    pub ticket: FetchTicket,
    pub result: Result<Vec<FeatureRecord>, ProviderError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchSummary {
    pub category: FeatureCategory,
    pub level: usize,
    pub available: usize,
    pub displayed: usize,
    pub at: DateTime<Utc>,
}

#[derive(Debug, PartialEq)]
pub enum Applied {
    Published(FetchSummary),
    /// Ticket or level no longer current.
    Discarded,
    Failed,
}

/// Per-category fetch bookkeeping plus the published, render-ready sets.
/// Holds no handles to the network or the ECS; the caller runs the requests
/// and feeds the outcomes back through [`TileDataStreamer::apply`].
#[derive(Debug)]
pub struct TileDataStreamer {
    states: BTreeMap<FeatureCategory, FetchState>,
    published: BTreeMap<FeatureCategory, Vec<FeatureRecord>>,
    hysteresis_margin: f32,
    timeout_secs: f64,
}

impl TileDataStreamer {
    pub fn new(hysteresis_margin: f32, timeout_secs: f64) -> Self {
        Self {
            states: FeatureCategory::ALL
                .iter()
                .map(|c| (*c, FetchState::default()))
                .collect(),
            published: BTreeMap::new(),
            hysteresis_margin: hysteresis_margin.max(0.0),
            timeout_secs,
        }
    }

    pub fn state(&self, category: FeatureCategory) -> Option<&FetchState> {
        self.states.get(&category)
    }

    pub fn published(&self, category: FeatureCategory) -> &[FeatureRecord] {
        self.published
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn all_published(&self) -> impl Iterator<Item = (&FeatureCategory, &Vec<FeatureRecord>)> {
        self.published.iter()
    }

    pub fn in_flight_count(&self) -> usize {
        self.states.values().filter(|s| s.is_fetching()).count()
    }

    /// Categories whose most recent request failed or timed out.
    pub fn failures(&self) -> impl Iterator<Item = (FeatureCategory, &ProviderError)> {
        self.states
            .iter()
            .filter_map(|(category, state)| state.last_error.as_ref().map(|e| (*category, e)))
    }

    /// A refetch needs the discrete level to have moved and the continuous
    /// level to sit clearly outside the last fetched bucket.
    fn wants_fetch(&self, state: &FetchState, current: &Classification) -> bool {
        if state.is_fetching() {
            return false;
        }
        match state.last_fetched_level {
            None => true,
            Some(last) => {
                let low = last as f32 - self.hysteresis_margin;
                let high = (last + 1) as f32 + self.hysteresis_margin;
                current.level != last && (current.continuous < low || current.continuous >= high)
            }
        }
    }

    /// Decides which categories to request for the current classification
    /// and marks them in flight. Published sets are cut down to the current
    /// level's maximum, and categories the level no longer shows are
    /// cleared. A request still outstanding for a hidden category stays in
    /// flight until it resolves or expires.
    pub fn plan(
        &mut self,
        current: &Classification,
        level: &DetailLevel,
        now: f64,
    ) -> Vec<FetchTicket> {
        let mut tickets = Vec::new();
        for category in FeatureCategory::ALL {
            if !category.is_eligible(&level.toggles) {
                let had_content = self.published.remove(&category).is_some();
                if let Some(state) = self.states.get_mut(&category) {
                    if had_content || state.last_fetched_level.is_some() {
                        debug!("{category} hidden at level {}, clearing", level.label);
                    }
                    state.last_fetched_level = None;
                    state.last_error = None;
                }
                continue;
            }

            if let Some(records) = self.published.get_mut(&category) {
                if records.len() > level.max_feature_count {
                    let kept = trim_by_importance(std::mem::take(records), level.max_feature_count);
                    debug!("{category}: trimmed to {} for level {}", kept.len(), level.label);
                    *records = kept;
                }
            }

            let Some(state) = self.states.get(&category) else {
                continue;
            };
            if !self.wants_fetch(state, current) {
                continue;
            }

            let ticket = FetchTicket::new(category, current.level, now);
            if let Some(state) = self.states.get_mut(&category) {
                state.in_flight = Some(ticket);
                state.last_fetched_level = Some(current.level);
            }
            tickets.push(ticket);
        }
        tickets
    }

    /// Applies a finished request. Only the ticket a category is waiting on,
    /// for the level still current, replaces that category's published set.
    pub fn apply(
        &mut self,
        outcome: FetchOutcome,
        current_level: usize,
        max_feature_count: usize,
    ) -> Applied {
        let FetchOutcome { ticket, result } = outcome;
        let Some(state) = self.states.get_mut(&ticket.category) else {
            return Applied::Discarded;
        };

        if state.in_flight.map(|t| t.id) != Some(ticket.id) {
            debug!("Dropping {} response {}: no longer awaited", ticket.category, ticket.id);
            return Applied::Discarded;
        }
        state.in_flight = None;

        if ticket.level != current_level {
            debug!(
                "Dropping {} response for level {} (now {})",
                ticket.category, ticket.level, current_level
            );
            // Fetch again for the level we are actually at.
            state.last_fetched_level = None;
            return Applied::Discarded;
        }

        match result {
            Ok(records) => {
                let available = records.len();
                let records = trim_by_importance(records, max_feature_count);
                let summary = FetchSummary {
                    category: ticket.category,
                    level: ticket.level,
                    available,
                    displayed: records.len(),
                    at: Utc::now(),
                };
                state.last_fetched_level = Some(ticket.level);
                state.last_error = None;
                self.published.insert(ticket.category, records);
                Applied::Published(summary)
            }
            Err(e) => {
                warn!("Fetching {} at level {} failed: {e}", ticket.category, ticket.level);
                state.last_error = Some(e);
                Applied::Failed
            }
        }
    }

    /// Returns categories whose request outlived the timeout to idle so the
    /// next check can retry them.
    pub fn expire(&mut self, now: f64) -> Vec<FeatureCategory> {
        let mut expired = Vec::new();
        for (category, state) in self.states.iter_mut() {
            let Some(ticket) = state.in_flight else {
                continue;
            };
            let age = now - ticket.issued_at;
            if age > self.timeout_secs {
                warn!("{category} request {} timed out after {age:.1}s", ticket.id);
                state.in_flight = None;
                state.last_fetched_level = None;
                state.last_error = Some(ProviderError::Timeout(age));
                expired.push(*category);
            }
        }
        expired
    }
}

/// Keeps the `max` most important records. Equal importances keep their
/// original order.
pub fn trim_by_importance(mut records: Vec<FeatureRecord>, max: usize) -> Vec<FeatureRecord> {
    if records.len() > max {
        records.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        records.truncate(max);
    }
    records
}
