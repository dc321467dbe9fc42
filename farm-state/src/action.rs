//! State transitions.
//!
//! Every change to [`AppState`](crate::AppState) is expressed as an
//! [`Action`] and applied by the reducer in `state.rs`.

use chrono::NaiveDate;
use sustainability::{FertilizerRecord, Farm, HarvestRecord, RotationRecord, WaterUsage};

use crate::records::{
    CropPlanEvent, Issue, Livestock, PlanItem, PlanKind, Task, TrackerKind, TrackerRecord,
};
use crate::transfer::ExportEnvelope;

/// A requested change to the application state.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // Farms
    /// Add a farm; its ID is assigned as one past the current maximum
    AddFarm(Farm),
    /// Replace the farm with the same ID
    UpdateFarm(Farm),
    DeleteFarm { farm_id: u64 },

    // Farm histories. Entries are keyed by date.
    AddWaterUsage { farm_id: u64, usage: WaterUsage },
    UpdateWaterUsage { farm_id: u64, original_date: NaiveDate, usage: WaterUsage },
    DeleteWaterUsage { farm_id: u64, date: NaiveDate },
    AddFertilizer { farm_id: u64, record: FertilizerRecord },
    UpdateFertilizer { farm_id: u64, original_date: NaiveDate, record: FertilizerRecord },
    DeleteFertilizer { farm_id: u64, date: NaiveDate },
    AddHarvest { farm_id: u64, record: HarvestRecord },
    UpdateHarvest { farm_id: u64, original_date: NaiveDate, record: HarvestRecord },
    DeleteHarvest { farm_id: u64, date: NaiveDate },
    /// Rotations are keyed by start date
    AddRotation { farm_id: u64, record: RotationRecord },
    DeleteRotation { farm_id: u64, start_date: NaiveDate },

    // Tasks and issues
    AddTask(Task),
    ToggleTask { id: u64 },
    DeleteTask { id: u64 },
    AddIssue(Issue),
    /// Resolving an issue removes it
    ResolveIssue { id: u64 },

    // Crop calendar
    AddCropEvent(CropPlanEvent),
    DeleteCropEvent { id: u64 },
    /// Merge events, skipping IDs already present
    MergeCropEvents(Vec<CropPlanEvent>),

    // Livestock
    AddLivestock(Livestock),
    UpdateLivestock(Livestock),
    DeleteLivestock { id: String },

    // Plans
    AddPlan { kind: PlanKind, plan: PlanItem },
    UpdatePlan { kind: PlanKind, plan: PlanItem },
    DeletePlan { kind: PlanKind, id: u64 },

    // Tracker records
    AddTrackerRecord(TrackerRecord),
    UpdateTrackerRecord(TrackerRecord),
    DeleteTrackerRecord { kind: TrackerKind, id: u64 },

    /// Replace the exported collections with an import
    ReplaceAll(Box<ExportEnvelope>),
}

impl Action {
    /// Short name for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Action::AddFarm(_) => "add_farm",
            Action::UpdateFarm(_) => "update_farm",
            Action::DeleteFarm { .. } => "delete_farm",
            Action::AddWaterUsage { .. } => "add_water_usage",
            Action::UpdateWaterUsage { .. } => "update_water_usage",
            Action::DeleteWaterUsage { .. } => "delete_water_usage",
            Action::AddFertilizer { .. } => "add_fertilizer",
            Action::UpdateFertilizer { .. } => "update_fertilizer",
            Action::DeleteFertilizer { .. } => "delete_fertilizer",
            Action::AddHarvest { .. } => "add_harvest",
            Action::UpdateHarvest { .. } => "update_harvest",
            Action::DeleteHarvest { .. } => "delete_harvest",
            Action::AddRotation { .. } => "add_rotation",
            Action::DeleteRotation { .. } => "delete_rotation",
            Action::AddTask(_) => "add_task",
            Action::ToggleTask { .. } => "toggle_task",
            Action::DeleteTask { .. } => "delete_task",
            Action::AddIssue(_) => "add_issue",
            Action::ResolveIssue { .. } => "resolve_issue",
            Action::AddCropEvent(_) => "add_crop_event",
            Action::DeleteCropEvent { .. } => "delete_crop_event",
            Action::MergeCropEvents(_) => "merge_crop_events",
            Action::AddLivestock(_) => "add_livestock",
            Action::UpdateLivestock(_) => "update_livestock",
            Action::DeleteLivestock { .. } => "delete_livestock",
            Action::AddPlan { .. } => "add_plan",
            Action::UpdatePlan { .. } => "update_plan",
            Action::DeletePlan { .. } => "delete_plan",
            Action::AddTrackerRecord(_) => "add_tracker_record",
            Action::UpdateTrackerRecord(_) => "update_tracker_record",
            Action::DeleteTrackerRecord { .. } => "delete_tracker_record",
            Action::ReplaceAll(_) => "replace_all",
        }
    }
}
