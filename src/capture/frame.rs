//! Frame data structures for recognized display content

use serde::{Deserialize, Serialize};

/// Declared type of a labeled field on the display template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Free numeric/text readout
    Value,
    /// Boolean toggle
    Checkbox,
    /// Positional indicator with an ordered list of key/value tokens
    Scrollbar,
}

impl FieldKind {
    /// Lowercase name used in recordings and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Value => "value",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Scrollbar => "scrollbar",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded scrollbar token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Token {
    Number(f64),
    Text(String),
}

impl Token {
    /// Render the token for decoding: numbers with two decimals, text trimmed
    pub fn render(&self) -> String {
        match self {
            Token::Number(n) => format!("{:.2}", n),
            Token::Text(s) => s.trim().to_string(),
        }
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Token::Text(s.to_string())
    }
}

impl From<f64> for Token {
    fn from(n: f64) -> Self {
        Token::Number(n)
    }
}

/// Kind-specific content of a field box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldPayload {
    Value {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        number: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
    Checkbox {
        checked: bool,
    },
    Scrollbar {
        #[serde(default)]
        tokens: Vec<Token>,
        /// Normalized thumb position in [0, 1]
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<f64>,
    },
}

/// One OCR observation of one labeled field within one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldBox {
    /// Field identifier on the display template
    pub id: String,
    /// Recognizer score (0.0 - 1.0), informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(flatten)]
    pub payload: FieldPayload,
}

impl FieldBox {
    /// Numeric or free-text readout
    pub fn value(id: impl Into<String>, number: Option<f64>, text: Option<&str>) -> Self {
        Self {
            id: id.into(),
            confidence: None,
            payload: FieldPayload::Value {
                number,
                text: text.map(str::to_string),
            },
        }
    }

    /// Free-text readout with no parsed number
    pub fn text(id: impl Into<String>, text: &str) -> Self {
        Self::value(id, None, Some(text))
    }

    /// Checkbox state
    pub fn checkbox(id: impl Into<String>, checked: bool) -> Self {
        Self {
            id: id.into(),
            confidence: None,
            payload: FieldPayload::Checkbox { checked },
        }
    }

    /// Scrollbar token list
    pub fn scrollbar<T: Into<Token>>(id: impl Into<String>, tokens: impl IntoIterator<Item = T>) -> Self {
        Self {
            id: id.into(),
            confidence: None,
            payload: FieldPayload::Scrollbar {
                tokens: tokens.into_iter().map(Into::into).collect(),
                position: None,
            },
        }
    }

    /// Attach a recognizer confidence score
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Declared kind of this box
    pub fn kind(&self) -> FieldKind {
        match self.payload {
            FieldPayload::Value { .. } => FieldKind::Value,
            FieldPayload::Checkbox { .. } => FieldKind::Checkbox,
            FieldPayload::Scrollbar { .. } => FieldKind::Scrollbar,
        }
    }
}

/// All field boxes the recognizer extracted from one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    /// Capture time in milliseconds since the Unix epoch
    pub timestamp: u64,
    #[serde(default)]
    pub boxes: Vec<FieldBox>,
}

impl FrameResult {
    /// Create a new frame result
    pub fn new(timestamp: u64, boxes: Vec<FieldBox>) -> Self {
        Self { timestamp, boxes }
    }

    /// Boxes for the given field id and kind
    pub fn boxes_for<'a>(&'a self, field_id: &'a str, kind: FieldKind) -> impl Iterator<Item = &'a FieldBox> + 'a {
        self.boxes
            .iter()
            .filter(move |b| b.id == field_id && b.kind() == kind)
    }
}
