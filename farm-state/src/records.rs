//! Planning and bookkeeping records owned by the application state.
//!
//! Scoring inputs (farms and tracker records) live in the
//! `sustainability` crate; this module adds the records the dashboard keeps
//! alongside them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sustainability::dates::calendar_day;
use sustainability::{
    CarbonEmissionSource, CarbonSequestrationActivity, EnergyRecord, Farm, FuelRecord, SoilRecord,
};

/// Records addressed by a numeric ID.
pub trait Identified {
    fn id(&self) -> u64;
    fn set_id(&mut self, id: u64);
}

macro_rules! identified {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Identified for $ty {
                fn id(&self) -> u64 {
                    self.id
                }

                fn set_id(&mut self, id: u64) {
                    self.id = id;
                }
            }
        )*
    };
}

identified!(
    Farm,
    Task,
    Issue,
    CropPlanEvent,
    PlanItem,
    SoilRecord,
    CarbonEmissionSource,
    CarbonSequestrationActivity,
    EnergyRecord,
    FuelRecord,
);

/// A to-do item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(with = "calendar_day")]
    pub due_date: NaiveDate,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub completed: bool,
}

/// A reported field issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: u64,
    #[serde(rename = "type")]
    pub issue_type: String,
    pub description: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub status: String,
    pub date_reported: DateTime<Utc>,
}

/// Kind of calendar event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropEventKind {
    Planting,
    Fertilizing,
    Harvesting,
    Other,
}

/// A planned activity on the crop calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropPlanEvent {
    pub id: u64,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub farm_id: u64,
    #[serde(rename = "type")]
    pub kind: CropEventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CropPlanEvent {
    /// Whether the event starts on the given calendar day (UTC).
    pub fn starts_on(&self, day: NaiveDate) -> bool {
        self.start.date_naive() == day
    }
}

/// Livestock categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LivestockKind {
    Cattle,
    Sheep,
    Poultry,
    Pigs,
    Goats,
    Other,
}

/// A group of animals on a farm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Livestock {
    /// String ID; generated when empty
    #[serde(default)]
    pub id: String,
    pub farm_id: u64,
    #[serde(rename = "type")]
    pub kind: LivestockKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,
    pub count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(with = "calendar_day")]
    pub added_date: NaiveDate,
}

/// Status of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlanStatus {
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

/// The plan lists kept by the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanKind {
    Planting,
    Fertilizer,
    PestManagement,
    Irrigation,
    Rotation,
    Rainwater,
    WeatherTask,
}

impl PlanKind {
    pub const ALL: [PlanKind; 7] = [
        PlanKind::Planting,
        PlanKind::Fertilizer,
        PlanKind::PestManagement,
        PlanKind::Irrigation,
        PlanKind::Rotation,
        PlanKind::Rainwater,
        PlanKind::WeatherTask,
    ];
}

/// A plan entry. Plan kinds carry extra fields of their own, kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanItem {
    pub id: u64,
    /// Farm ID as entered in the plan form
    pub farm_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "calendar_day")]
    pub start_date: NaiveDate,
    #[serde(with = "calendar_day")]
    pub end_date: NaiveDate,
    pub status: PlanStatus,
    #[serde(default)]
    pub notes: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Tracker record categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerKind {
    Soil,
    Emission,
    Sequestration,
    Energy,
    Fuel,
}

/// A tracker record of any category.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerRecord {
    Soil(SoilRecord),
    Emission(CarbonEmissionSource),
    Sequestration(CarbonSequestrationActivity),
    Energy(EnergyRecord),
    Fuel(FuelRecord),
}

impl TrackerRecord {
    pub fn kind(&self) -> TrackerKind {
        match self {
            TrackerRecord::Soil(_) => TrackerKind::Soil,
            TrackerRecord::Emission(_) => TrackerKind::Emission,
            TrackerRecord::Sequestration(_) => TrackerKind::Sequestration,
            TrackerRecord::Energy(_) => TrackerKind::Energy,
            TrackerRecord::Fuel(_) => TrackerKind::Fuel,
        }
    }
}
