//! Consensus Engine
//!
//! Accumulates noisy per-field OCR readings across many frames and converges
//! on one value per field. Readings pass an admission filter before they are
//! retained; every query recomputes its answer from the retained history, so
//! the engine keeps no per-field status between calls.
//!
//! The engine is a plain owned value. Mutation goes through `&mut self`, so a
//! query can never observe a half-applied ingestion. Callers that share it
//! across threads wrap it in a single lock (see [`crate::shared`]).

pub mod filter;
pub mod scrollbar;
pub mod types;
pub mod vote;

pub use filter::{AdmissionFilter, END_UNITS, START_UNITS};
pub use scrollbar::{decode_pairs, ScrollbarPair};
pub use types::{
    BestField, BestValue, FieldHistory, FieldStats, KindBreakdown, ObservedValue, ScrollbarUnits,
};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, trace};
use uuid::Uuid;

use crate::capture::{FieldBox, FieldKind, FieldPayload, FrameResult, Token};

/// Observations of the same normalized value closer than this are merged
pub const DEDUP_WINDOW_MS: u64 = 1000;

/// Construction-time engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Cap on retained observations and frames per field
    pub max_history_per_field: u32,
    /// Occurrences the flattened-history majority needs before it is trusted
    pub min_occurrences_for_majority: u32,
    /// Reject readings without a decimal separator
    pub comma_required: bool,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            max_history_per_field: 50,
            min_occurrences_for_majority: 3,
            comma_required: true,
        }
    }
}

/// Per-field consensus table for one scanning session
#[derive(Debug, Clone)]
pub struct ConsensusEngine {
    config: ConsensusConfig,
    filter: AdmissionFilter,
    fields: HashMap<String, FieldHistory>,
}

impl Default for ConsensusEngine {
    fn default() -> Self {
        Self::new(ConsensusConfig::default())
    }
}

impl ConsensusEngine {
    /// Create an empty engine
    pub fn new(config: ConsensusConfig) -> Self {
        Self {
            filter: AdmissionFilter::new(config.comma_required),
            config,
            fields: HashMap::new(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    fn capacity(&self) -> usize {
        self.config.max_history_per_field.max(1) as usize
    }

    /// Number of fields with retained history
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Whether anything for this field has ever been admitted
    pub fn is_known(&self, field_id: &str) -> bool {
        self.fields.contains_key(field_id)
    }

    /// Known field identifiers, sorted
    pub fn field_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    // ------------------------------------------------------------------
    // Ingestion
    // ------------------------------------------------------------------

    /// Add one `{field_id: raw}` reading map stamped with the current time
    pub fn add_scan_result<I, K, V>(&mut self, values: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.add_scan_result_at(values, now_millis());
    }

    /// Add one `{field_id: raw}` reading map taken at `timestamp`
    pub fn add_scan_result_at<I, K, V>(&mut self, values: I, timestamp: u64)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (field_id, raw) in values {
            self.observe(field_id.as_ref(), raw.as_ref(), timestamp, None, true);
        }
    }

    /// Add every box of a full frame result
    ///
    /// Boxes whose reading passes the admission filter are recorded as
    /// observations, and the frame itself is retained for the field so that
    /// scrollbar decoding can later work from the structured tokens.
    pub fn add_full_scan_result(&mut self, frame: FrameResult) {
        let frame = Arc::new(frame);
        let capacity = self.capacity();

        for field_box in &frame.boxes {
            let Some(raw) = representative(field_box) else {
                trace!("Field {}: nothing to read from {} box", field_box.id, field_box.kind());
                continue;
            };

            let captions_allowed = field_box.kind() == FieldKind::Scrollbar;
            if !self.observe(&field_box.id, &raw, frame.timestamp, field_box.confidence, captions_allowed) {
                continue;
            }

            let Some(history) = self.fields.get_mut(&field_box.id) else {
                continue;
            };

            // A frame carrying the same field twice is retained once
            if history.frames.last().is_some_and(|f| Arc::ptr_eq(f, &frame)) {
                continue;
            }
            history.frames.push(Arc::clone(&frame));
            let evicted = enforce_cap(&mut history.frames, capacity, |f| f.timestamp);
            if evicted > 0 {
                debug!("Field {}: evicted {} retained frame(s)", field_box.id, evicted);
            }
        }
    }

    /// Run one raw reading through admission and dedup. Returns whether it
    /// was admitted (a deduplicated reading still counts as admitted).
    fn observe(
        &mut self,
        field_id: &str,
        raw: &str,
        timestamp: u64,
        confidence: Option<f32>,
        captions_allowed: bool,
    ) -> bool {
        if !self.filter.admits(raw, captions_allowed) {
            trace!("Field {}: rejected reading {:?}", field_id, raw);
            return false;
        }

        let capacity = self.capacity();
        let history = self.fields.entry(field_id.to_string()).or_default();
        history.last_seen = history.last_seen.max(timestamp);

        let normalized = filter::normalize(raw);
        let duplicate = history.observations.iter().any(|o| {
            o.timestamp.abs_diff(timestamp) <= DEDUP_WINDOW_MS && filter::normalize(&o.value) == normalized
        });
        if duplicate {
            debug!("Field {}: duplicate reading {:?} within {}ms", field_id, raw, DEDUP_WINDOW_MS);
            return true;
        }

        history.observations.push(ObservedValue {
            id: Uuid::new_v4().to_string(),
            value: raw.to_string(),
            timestamp,
            confidence,
        });

        let evicted = enforce_cap(&mut history.observations, capacity, |o| o.timestamp);
        if evicted > 0 {
            debug!("Field {}: evicted {} observation(s)", field_id, evicted);
        }

        true
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Majority-voted value of a field read as `kind`
    pub fn get_best_value(&self, field_id: &str, kind: FieldKind) -> BestValue {
        let Some(history) = self.fields.get(field_id) else {
            return BestValue::empty();
        };

        match kind {
            FieldKind::Scrollbar => scrollbar_best(history, field_id),
            FieldKind::Value | FieldKind::Checkbox => scalar_best(history, field_id, kind),
        }
    }

    /// Just the value of [`Self::get_best_value`]
    pub fn get_best(&self, field_id: &str, kind: FieldKind) -> Option<String> {
        self.get_best_value(field_id, kind).value
    }

    /// Stable majority of the flattened history, else the latest reading
    pub fn get_filtered_value(&self, field_id: &str) -> Option<String> {
        let history = self.fields.get(field_id)?;

        let min_occurrences = u64::from(self.config.min_occurrences_for_majority);
        if let Some(result) = vote::tally(history.observations.iter().map(|o| o.value.as_str())) {
            if result.winner_count >= min_occurrences {
                return Some(result.winner);
            }
        }

        most_recent_first(&history.observations, |o| o.timestamp)
            .into_iter()
            .next()
            .map(|o| o.value)
    }

    /// Retained observations, most recent first
    pub fn get_field_history(&self, field_id: &str) -> Vec<ObservedValue> {
        self.fields
            .get(field_id)
            .map(|h| most_recent_first(&h.observations, |o| o.timestamp))
            .unwrap_or_default()
    }

    /// Retained frame results, most recent first
    pub fn get_field_scan_results(&self, field_id: &str) -> Vec<Arc<FrameResult>> {
        self.fields
            .get(field_id)
            .map(|h| most_recent_first(&h.frames, |f| f.timestamp))
            .unwrap_or_default()
    }

    /// Aggregate statistics for a field
    pub fn get_field_stats(&self, field_id: &str) -> FieldStats {
        let Some(history) = self.fields.get(field_id) else {
            return FieldStats::default();
        };

        let tally = vote::tally(history.observations.iter().map(|o| o.value.as_str()));

        let mut kind_breakdown = KindBreakdown::default();
        for frame in &history.frames {
            for field_box in frame.boxes.iter().filter(|b| b.id == field_id) {
                kind_breakdown.record(field_box.kind());
            }
        }

        FieldStats {
            total_observations: history.observations.len(),
            unique_values: tally.as_ref().map_or(0, |t| t.distinct),
            most_frequent: tally.map(|t| filter::normalize(&t.winner)),
            with_decimal_separator: history
                .observations
                .iter()
                .filter(|o| filter::has_decimal_separator(&o.value))
                .count(),
            last_seen: Some(history.last_seen),
            kind_breakdown,
        }
    }

    /// Majority start/end unit captions seen around a scrollbar field
    pub fn get_scrollbar_units(&self, field_id: &str) -> ScrollbarUnits {
        let Some(history) = self.fields.get(field_id) else {
            return ScrollbarUnits::default();
        };

        let mut starts = Vec::new();
        let mut ends = Vec::new();
        for tokens in scrollbar_tokens(history, field_id) {
            let trimmed = scrollbar::trim_units(tokens);
            starts.extend(trimmed.start_unit);
            ends.extend(trimmed.end_unit);
        }

        let pick = |units: Vec<&'static str>| {
            let winner = vote::tally(units.iter().copied())?.winner;
            units.into_iter().find(|u| *u == winner)
        };

        ScrollbarUnits {
            start: pick(starts),
            end: pick(ends),
        }
    }

    /// Best value of every field under its dominant kind, sorted by id
    pub fn get_best_fields(&self) -> Vec<BestField> {
        self.field_ids()
            .into_iter()
            .filter_map(|field_id| {
                let kind = self.get_field_stats(field_id).kind_breakdown.dominant()?;
                let best = self.get_best_value(field_id, kind);
                (!best.is_empty()).then(|| BestField {
                    field_id: field_id.to_string(),
                    kind,
                    best,
                })
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Reset
    // ------------------------------------------------------------------

    /// Forget everything about one field
    pub fn clear_field_history(&mut self, field_id: &str) {
        if self.fields.remove(field_id).is_some() {
            debug!("Cleared history for field {}", field_id);
        }
    }

    /// Forget every field
    pub fn clear_all_history(&mut self) {
        info!("Clearing history for {} field(s)", self.fields.len());
        self.fields.clear();
    }
}

/// Flattened string reading of a box, if it has one
pub fn representative(field_box: &FieldBox) -> Option<String> {
    let raw = match &field_box.payload {
        FieldPayload::Value { number: Some(n), .. } => n.to_string(),
        FieldPayload::Value { number: None, text } => text.as_deref()?.trim().to_string(),
        FieldPayload::Checkbox { checked } => checked.to_string(),
        FieldPayload::Scrollbar { tokens, .. } => scrollbar::representative(tokens),
    };
    (!raw.trim().is_empty()).then_some(raw)
}

fn scalar_best(history: &FieldHistory, field_id: &str, kind: FieldKind) -> BestValue {
    let candidates = history
        .frames
        .iter()
        .flat_map(|frame| frame.boxes_for(field_id, kind))
        .filter_map(representative)
        .filter(|raw| kind != FieldKind::Value || filter::is_numeric_token(raw));

    match vote::tally(candidates) {
        Some(result) => BestValue {
            majority_ratio: result.ratio(),
            total_scans: result.total,
            value: Some(result.winner),
        },
        None => BestValue::empty(),
    }
}

fn scrollbar_tokens<'a>(
    history: &'a FieldHistory,
    field_id: &'a str,
) -> impl Iterator<Item = &'a [Token]> + 'a {
    history
        .frames
        .iter()
        .flat_map(move |frame| frame.boxes_for(field_id, FieldKind::Scrollbar))
        .filter_map(|field_box| match &field_box.payload {
            FieldPayload::Scrollbar { tokens, .. } => Some(tokens.as_slice()),
            _ => None,
        })
}

fn scrollbar_best(history: &FieldHistory, field_id: &str) -> BestValue {
    let mut by_index: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    for tokens in scrollbar_tokens(history, field_id) {
        for pair in scrollbar::decode_pairs(tokens) {
            by_index.entry(pair.index).or_default().push(pair.joined());
        }
    }

    let winners: Vec<vote::Tally> = by_index.into_values().filter_map(vote::tally).collect();
    if winners.is_empty() {
        return BestValue::empty();
    }

    let ratio_sum: f64 = winners.iter().map(vote::Tally::ratio).sum();
    BestValue {
        majority_ratio: ratio_sum / winners.len() as f64,
        total_scans: winners.iter().map(|t| t.total).sum(),
        value: Some(
            winners
                .iter()
                .map(|t| t.winner.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        ),
    }
}

/// Evict oldest-by-timestamp entries until `items` fits `cap`
fn enforce_cap<T>(items: &mut Vec<T>, cap: usize, timestamp: impl Fn(&T) -> u64) -> usize {
    let mut evicted = 0;
    while items.len() > cap {
        let Some(oldest) = items
            .iter()
            .enumerate()
            .min_by_key(|(_, item)| timestamp(item))
            .map(|(idx, _)| idx)
        else {
            break;
        };
        items.remove(oldest);
        evicted += 1;
    }
    evicted
}

/// Clone of `items` ordered newest first; equal timestamps keep the later
/// insertion in front
fn most_recent_first<T: Clone>(items: &[T], timestamp: impl Fn(&T) -> u64) -> Vec<T> {
    let mut ordered: Vec<T> = items.iter().rev().cloned().collect();
    ordered.sort_by(|a, b| timestamp(b).cmp(&timestamp(a)));
    ordered
}

/// Wall clock in milliseconds since the Unix epoch
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
