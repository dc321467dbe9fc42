//! Data export and import.
//!
//! Two document shapes:
//!
//! - [`ExportEnvelope`]: farms, tasks, issues, crop plan events and the
//!   planting, fertilizer and pest management plans
//! - [`CropPlanExport`]: crop calendar events only, merged on import

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sustainability::Farm;
use tracing::info;

use crate::action::Action;
use crate::records::{CropPlanEvent, Issue, PlanItem, PlanKind, Task};
use crate::state::{AppState, Result, StateError};

/// Version written into every export.
pub const EXPORT_VERSION: &str = "1.0";

fn export_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Full data export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub export_date: String,
    #[serde(default)]
    pub farms: Vec<Farm>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub crop_plan_events: Vec<CropPlanEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planting_plans: Option<Vec<PlanItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fertilizer_plans: Option<Vec<PlanItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pest_management_plans: Option<Vec<PlanItem>>,
}

impl ExportEnvelope {
    /// Snapshot the exported collections of `state`.
    pub fn from_state(state: &AppState, now: DateTime<Utc>) -> Self {
        Self {
            version: EXPORT_VERSION.to_string(),
            export_date: export_timestamp(now),
            farms: state.farms.clone(),
            tasks: state.tasks.clone(),
            issues: state.issues.clone(),
            crop_plan_events: state.crop_plan_events.clone(),
            planting_plans: Some(state.plans(PlanKind::Planting).to_vec()),
            fertilizer_plans: Some(state.plans(PlanKind::Fertilizer).to_vec()),
            pest_management_plans: Some(state.plans(PlanKind::PestManagement).to_vec()),
        }
    }

    /// Suggested download name, e.g. `farm-data-2024-06-01.json`.
    pub fn file_name(now: DateTime<Utc>) -> String {
        format!("farm-data-{}.json", now.format("%Y-%m-%d"))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate an import document.
    pub fn parse(json: &str) -> Result<Self> {
        let envelope: Self =
            serde_json::from_str(json).map_err(|e| StateError::InvalidFormat(e.to_string()))?;

        if envelope.version.is_empty() || envelope.export_date.is_empty() {
            return Err(StateError::InvalidFormat(
                "missing version or exportDate".to_string(),
            ));
        }

        info!(
            version = %envelope.version,
            farms = envelope.farms.len(),
            tasks = envelope.tasks.len(),
            "Parsed data import"
        );
        Ok(envelope)
    }

    /// Action replacing the imported collections.
    pub fn into_action(self) -> Action {
        Action::ReplaceAll(Box::new(self))
    }
}

/// Crop calendar export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropPlanExport {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub export_date: String,
    pub events: Vec<CropPlanEvent>,
}

impl CropPlanExport {
    pub fn from_state(state: &AppState, now: DateTime<Utc>) -> Self {
        Self {
            version: EXPORT_VERSION.to_string(),
            export_date: export_timestamp(now),
            events: state.crop_plan_events.clone(),
        }
    }

    /// Suggested download name, e.g. `crop-plan-2024-06-01.json`.
    pub fn file_name(now: DateTime<Utc>) -> String {
        format!("crop-plan-{}.json", now.format("%Y-%m-%d"))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a crop plan document. The `events` array is required.
    pub fn parse(json: &str) -> Result<Self> {
        let export: Self =
            serde_json::from_str(json).map_err(|e| StateError::InvalidFormat(e.to_string()))?;
        info!(events = export.events.len(), "Parsed crop plan import");
        Ok(export)
    }

    /// Action merging the events, skipping IDs already present.
    pub fn into_action(self) -> Action {
        Action::MergeCropEvents(self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_export_shape() {
        let mut state = AppState::default();
        state.farms.push(Farm::new(1, "North", "corn"));

        let envelope = ExportEnvelope::from_state(&state, now());
        let value: serde_json::Value = serde_json::from_str(&envelope.to_json().unwrap()).unwrap();

        assert_eq!(value["version"], "1.0");
        assert_eq!(value["exportDate"], "2024-06-01T12:30:00.000Z");
        assert_eq!(value["farms"][0]["name"], "North");
        assert!(value["cropPlanEvents"].is_array());
        assert!(value["plantingPlans"].is_array());
        assert_eq!(ExportEnvelope::file_name(now()), "farm-data-2024-06-01.json");
    }

    #[test]
    fn test_parse_requires_version_and_date() {
        let missing = r#"{"farms": [], "tasks": [], "issues": [], "cropPlanEvents": []}"#;
        assert!(matches!(
            ExportEnvelope::parse(missing),
            Err(StateError::InvalidFormat(_))
        ));

        let malformed = r#"{"version": "1.0", "#;
        assert!(matches!(
            ExportEnvelope::parse(malformed),
            Err(StateError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_parse_without_optional_plans() {
        let json = r#"{
            "version": "1.0",
            "exportDate": "2024-06-01T12:30:00.000Z",
            "farms": [{"id": 3, "name": "Orchard", "crop": "apples"}],
            "tasks": [],
            "issues": [],
            "cropPlanEvents": []
        }"#;
        let envelope = ExportEnvelope::parse(json).unwrap();
        assert_eq!(envelope.farms[0].id, 3);
        assert!(envelope.planting_plans.is_none());
    }

    #[test]
    fn test_crop_plan_export_requires_events() {
        let json = r#"{"version": "1.0", "exportDate": "2024-06-01"}"#;
        assert!(matches!(
            CropPlanExport::parse(json),
            Err(StateError::InvalidFormat(_))
        ));

        let empty = CropPlanExport::from_state(&AppState::default(), now());
        assert!(empty.to_json().unwrap().contains("\"events\": []"));
        assert_eq!(CropPlanExport::file_name(now()), "crop-plan-2024-06-01.json");
    }
}
