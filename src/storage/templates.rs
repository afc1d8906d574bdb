//! Scan template storage and loading
//!
//! A template lists the labeled fields of one instrument screen and the kind
//! each field is read as.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::capture::FieldKind;
use crate::consensus::{BestValue, ConsensusEngine};

/// A screen template definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanTemplate {
    /// Template identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Fields on this screen, in display order
    pub fields: Vec<TemplateField>,
}

/// One labeled field on a screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateField {
    /// Field identifier, as reported by the recognizer
    pub id: String,
    /// Human-readable caption
    #[serde(default)]
    pub label: String,
    /// Kind the field is read as
    pub kind: FieldKind,
    /// Region bounds (x, y, width, height) as fractions of the screen
    #[serde(default)]
    pub bounds: (f32, f32, f32, f32),
}

/// Best value of one template field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateReading {
    pub field_id: String,
    pub label: String,
    pub kind: FieldKind,
    pub best: BestValue,
}

impl ScanTemplate {
    /// Look up a field by id
    pub fn field(&self, field_id: &str) -> Option<&TemplateField> {
        self.fields.iter().find(|f| f.id == field_id)
    }

    /// Best value of every template field, in template order
    pub fn report(&self, engine: &ConsensusEngine) -> Vec<TemplateReading> {
        self.fields
            .iter()
            .map(|field| TemplateReading {
                field_id: field.id.clone(),
                label: field.label.clone(),
                kind: field.kind,
                best: engine.get_best_value(&field.id, field.kind),
            })
            .collect()
    }
}

/// Load a scan template from file
pub fn load_template(path: &Path) -> Result<ScanTemplate> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read template {:?}", path))?;
    let template: ScanTemplate = serde_json::from_str(&content)?;
    Ok(template)
}

/// Save a scan template to file
pub fn save_template(template: &ScanTemplate, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(template)?;
    std::fs::write(path, content)?;
    Ok(())
}
