//! History and query result types

use serde::Serialize;
use std::sync::Arc;

use crate::capture::{FieldKind, FrameResult};

/// One retained textual observation for a field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservedValue {
    /// Unique observation token
    pub id: String,
    /// Original text as extracted, never blank
    pub value: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

/// Per-field retained history
#[derive(Debug, Clone, Default)]
pub struct FieldHistory {
    /// Admitted observations, insertion order
    pub observations: Vec<ObservedValue>,
    /// Frames that carried an admitted box for this field, insertion order
    pub frames: Vec<Arc<FrameResult>>,
    /// Latest timestamp of any admitted observation
    pub last_seen: u64,
}

/// Best guess for a field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestValue {
    pub value: Option<String>,
    /// Winning count over samples considered (0.0 - 1.0)
    pub majority_ratio: f64,
    /// Samples considered
    pub total_scans: u64,
}

impl BestValue {
    /// Result for a field with no usable candidates
    pub fn empty() -> Self {
        Self {
            value: None,
            majority_ratio: 0.0,
            total_scans: 0,
        }
    }

    /// Whether no value was decided
    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }
}

impl Default for BestValue {
    fn default() -> Self {
        Self::empty()
    }
}

/// Retained frame counts per declared kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindBreakdown {
    pub value: u64,
    pub checkbox: u64,
    pub scrollbar: u64,
}

impl KindBreakdown {
    /// Count one box of the given kind
    pub fn record(&mut self, kind: FieldKind) {
        match kind {
            FieldKind::Value => self.value += 1,
            FieldKind::Checkbox => self.checkbox += 1,
            FieldKind::Scrollbar => self.scrollbar += 1,
        }
    }

    /// Count for one kind
    pub fn get(&self, kind: FieldKind) -> u64 {
        match kind {
            FieldKind::Value => self.value,
            FieldKind::Checkbox => self.checkbox,
            FieldKind::Scrollbar => self.scrollbar,
        }
    }

    /// Count across all kinds
    pub fn total(&self) -> u64 {
        self.value + self.checkbox + self.scrollbar
    }

    /// Most frequent kind; ties prefer scrollbar, then checkbox, then value
    pub fn dominant(&self) -> Option<FieldKind> {
        if self.total() == 0 {
            return None;
        }
        let kind = if self.scrollbar >= self.value && self.scrollbar >= self.checkbox {
            FieldKind::Scrollbar
        } else if self.checkbox >= self.value {
            FieldKind::Checkbox
        } else {
            FieldKind::Value
        };
        Some(kind)
    }
}

/// Aggregate statistics for one field
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldStats {
    /// Retained admitted observations
    pub total_observations: usize,
    /// Distinct normalized values among them
    pub unique_values: usize,
    /// Most frequent normalized value
    pub most_frequent: Option<String>,
    /// Observations containing `,` or `.`
    pub with_decimal_separator: usize,
    pub last_seen: Option<u64>,
    /// Kinds of this field's boxes across retained frames
    pub kind_breakdown: KindBreakdown,
}

/// Unit captions detected around a scrollbar's token list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScrollbarUnits {
    pub start: Option<&'static str>,
    pub end: Option<&'static str>,
}

/// Best value of one field under its dominant kind
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestField {
    pub field_id: String,
    pub kind: FieldKind,
    pub best: BestValue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominant_kind_ties() {
        let mut breakdown = KindBreakdown::default();
        assert_eq!(breakdown.dominant(), None);

        breakdown.record(FieldKind::Value);
        assert_eq!(breakdown.dominant(), Some(FieldKind::Value));

        breakdown.record(FieldKind::Checkbox);
        assert_eq!(breakdown.dominant(), Some(FieldKind::Checkbox));

        breakdown.record(FieldKind::Scrollbar);
        assert_eq!(breakdown.dominant(), Some(FieldKind::Scrollbar));

        breakdown.record(FieldKind::Value);
        assert_eq!(breakdown.dominant(), Some(FieldKind::Value));
        assert_eq!(breakdown.total(), 4);
        assert_eq!(breakdown.get(FieldKind::Value), 2);
    }

    #[test]
    fn test_empty_best_value() {
        let best = BestValue::default();
        assert!(best.is_empty());
        assert_eq!(best.total_scans, 0);
        assert_eq!(best.majority_ratio, 0.0);
    }
}
