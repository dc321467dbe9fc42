//! The application state aggregate and its reducer.
//!
//! [`AppState`] owns every collection the dashboard keeps. It is never
//! mutated in place: [`AppState::apply`] returns the next state together
//! with the collections the action replaced, which is what persistence
//! needs to know.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::Value;
use sustainability::{
    calculate, CarbonEmissionSource, CarbonSequestrationActivity, CropFilter, EnergyRecord, Farm,
    FertilizerRecord, FuelRecord, HarvestRecord, RotationRecord, ScoringConfig, ScoringInputs,
    SoilRecord, SustainabilityMetrics, WaterUsage, WeatherDay,
};
use tracing::debug;
use uuid::Uuid;

use crate::action::Action;
use crate::records::{
    CropPlanEvent, Identified, Issue, Livestock, PlanItem, PlanKind, Task, TrackerKind,
    TrackerRecord,
};
use crate::storage::StorageError;

/// Errors from state transitions and persistence.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("{collection} entry not found: {id}")]
    NotFound { collection: &'static str, id: String },

    #[error("Invalid import data: {0}")]
    InvalidFormat(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StateError>;

/// A persisted collection. Each maps to one storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collection {
    Farms,
    Tasks,
    Issues,
    CropPlanEvents,
    Livestock,
    Plans(PlanKind),
    Tracker(TrackerKind),
}

impl Collection {
    pub const ALL: [Collection; 17] = [
        Collection::Farms,
        Collection::Tasks,
        Collection::Issues,
        Collection::CropPlanEvents,
        Collection::Livestock,
        Collection::Plans(PlanKind::Planting),
        Collection::Plans(PlanKind::Fertilizer),
        Collection::Plans(PlanKind::PestManagement),
        Collection::Plans(PlanKind::Irrigation),
        Collection::Plans(PlanKind::Rotation),
        Collection::Plans(PlanKind::Rainwater),
        Collection::Plans(PlanKind::WeatherTask),
        Collection::Tracker(TrackerKind::Soil),
        Collection::Tracker(TrackerKind::Emission),
        Collection::Tracker(TrackerKind::Sequestration),
        Collection::Tracker(TrackerKind::Energy),
        Collection::Tracker(TrackerKind::Fuel),
    ];

    /// Storage key.
    pub fn key(&self) -> &'static str {
        match self {
            Collection::Farms => "farms",
            Collection::Tasks => "tasks",
            Collection::Issues => "issues",
            Collection::CropPlanEvents => "cropPlanEvents",
            Collection::Livestock => "livestock",
            Collection::Plans(PlanKind::Planting) => "plantingPlans",
            Collection::Plans(PlanKind::Fertilizer) => "fertilizerPlans",
            Collection::Plans(PlanKind::PestManagement) => "pestManagementPlans",
            Collection::Plans(PlanKind::Irrigation) => "irrigationPlans",
            Collection::Plans(PlanKind::Rotation) => "rotationPlans",
            Collection::Plans(PlanKind::Rainwater) => "rainwaterPlans",
            Collection::Plans(PlanKind::WeatherTask) => "weatherTaskPlans",
            Collection::Tracker(TrackerKind::Soil) => "soilRecords",
            Collection::Tracker(TrackerKind::Emission) => "emissionSources",
            Collection::Tracker(TrackerKind::Sequestration) => "sequestrationActivities",
            Collection::Tracker(TrackerKind::Energy) => "energyRecords",
            Collection::Tracker(TrackerKind::Fuel) => "fuelRecords",
        }
    }
}

/// Everything the dashboard knows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub farms: Vec<Farm>,
    pub tasks: Vec<Task>,
    pub issues: Vec<Issue>,
    pub crop_plan_events: Vec<CropPlanEvent>,
    pub livestock: Vec<Livestock>,
    pub plans: BTreeMap<PlanKind, Vec<PlanItem>>,
    pub soil_records: Vec<SoilRecord>,
    pub emission_sources: Vec<CarbonEmissionSource>,
    pub sequestration_activities: Vec<CarbonSequestrationActivity>,
    pub energy_records: Vec<EnergyRecord>,
    pub fuel_records: Vec<FuelRecord>,
}

impl AppState {
    /// Plans of one kind.
    pub fn plans(&self, kind: PlanKind) -> &[PlanItem] {
        self.plans.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn farm(&self, farm_id: u64) -> Option<&Farm> {
        self.farms.iter().find(|f| f.id == farm_id)
    }

    /// Distinct crops across all farms, for the crop filter.
    pub fn crop_options(&self) -> Vec<String> {
        CropFilter::options(&self.farms)
    }

    /// Score the farms matching `filter` together with every tracker collection.
    pub fn metrics(
        &self,
        weather: &[WeatherDay],
        filter: &CropFilter,
        config: &ScoringConfig,
    ) -> Option<SustainabilityMetrics> {
        let farms = filter.apply(&self.farms);
        let inputs = ScoringInputs::new(&farms, weather)
            .with_soil_records(&self.soil_records)
            .with_carbon(&self.emission_sources, &self.sequestration_activities)
            .with_energy_records(&self.energy_records)
            .with_fuel_records(&self.fuel_records);
        calculate(&inputs, config)
    }

    /// Serialize one collection as a JSON array.
    pub fn collection_value(&self, collection: Collection) -> serde_json::Result<Value> {
        match collection {
            Collection::Farms => serde_json::to_value(&self.farms),
            Collection::Tasks => serde_json::to_value(&self.tasks),
            Collection::Issues => serde_json::to_value(&self.issues),
            Collection::CropPlanEvents => serde_json::to_value(&self.crop_plan_events),
            Collection::Livestock => serde_json::to_value(&self.livestock),
            Collection::Plans(kind) => serde_json::to_value(self.plans(kind)),
            Collection::Tracker(TrackerKind::Soil) => serde_json::to_value(&self.soil_records),
            Collection::Tracker(TrackerKind::Emission) => {
                serde_json::to_value(&self.emission_sources)
            }
            Collection::Tracker(TrackerKind::Sequestration) => {
                serde_json::to_value(&self.sequestration_activities)
            }
            Collection::Tracker(TrackerKind::Energy) => serde_json::to_value(&self.energy_records),
            Collection::Tracker(TrackerKind::Fuel) => serde_json::to_value(&self.fuel_records),
        }
    }

    /// Replace one collection from its JSON array form.
    pub fn set_collection(&mut self, collection: Collection, value: Value) -> serde_json::Result<()> {
        match collection {
            Collection::Farms => self.farms = serde_json::from_value(value)?,
            Collection::Tasks => self.tasks = serde_json::from_value(value)?,
            Collection::Issues => self.issues = serde_json::from_value(value)?,
            Collection::CropPlanEvents => self.crop_plan_events = serde_json::from_value(value)?,
            Collection::Livestock => self.livestock = serde_json::from_value(value)?,
            Collection::Plans(kind) => {
                self.plans.insert(kind, serde_json::from_value(value)?);
            }
            Collection::Tracker(TrackerKind::Soil) => {
                self.soil_records = serde_json::from_value(value)?
            }
            Collection::Tracker(TrackerKind::Emission) => {
                self.emission_sources = serde_json::from_value(value)?
            }
            Collection::Tracker(TrackerKind::Sequestration) => {
                self.sequestration_activities = serde_json::from_value(value)?
            }
            Collection::Tracker(TrackerKind::Energy) => {
                self.energy_records = serde_json::from_value(value)?
            }
            Collection::Tracker(TrackerKind::Fuel) => {
                self.fuel_records = serde_json::from_value(value)?
            }
        }
        Ok(())
    }

    /// Apply an action, returning the next state and the collections it replaced.
    ///
    /// `self` is left untouched; on error no partial change is visible.
    pub fn apply(&self, action: Action) -> Result<(AppState, Vec<Collection>)> {
        let label = action.label();
        let mut next = self.clone();

        let changed = match action {
            Action::AddFarm(mut farm) => {
                farm.id = next_id(&next.farms);
                next.farms.push(farm);
                vec![Collection::Farms]
            }
            Action::UpdateFarm(farm) => {
                replace_by_id(&mut next.farms, farm, "farms")?;
                vec![Collection::Farms]
            }
            Action::DeleteFarm { farm_id } => {
                remove_by_id(&mut next.farms, farm_id, "farms")?;
                vec![Collection::Farms]
            }

            Action::AddWaterUsage { farm_id, usage } => {
                farm_mut(&mut next.farms, farm_id)?.water_history.push(usage);
                vec![Collection::Farms]
            }
            Action::UpdateWaterUsage { farm_id, original_date, usage } => {
                let farm = farm_mut(&mut next.farms, farm_id)?;
                replace_dated(&mut farm.water_history, original_date, usage, "waterHistory")?;
                vec![Collection::Farms]
            }
            Action::DeleteWaterUsage { farm_id, date } => {
                let farm = farm_mut(&mut next.farms, farm_id)?;
                remove_dated(&mut farm.water_history, date, "waterHistory")?;
                vec![Collection::Farms]
            }
            Action::AddFertilizer { farm_id, record } => {
                farm_mut(&mut next.farms, farm_id)?.fertilizer_history.push(record);
                vec![Collection::Farms]
            }
            Action::UpdateFertilizer { farm_id, original_date, record } => {
                let farm = farm_mut(&mut next.farms, farm_id)?;
                replace_dated(&mut farm.fertilizer_history, original_date, record, "fertilizerHistory")?;
                vec![Collection::Farms]
            }
            Action::DeleteFertilizer { farm_id, date } => {
                let farm = farm_mut(&mut next.farms, farm_id)?;
                remove_dated(&mut farm.fertilizer_history, date, "fertilizerHistory")?;
                vec![Collection::Farms]
            }
            Action::AddHarvest { farm_id, record } => {
                farm_mut(&mut next.farms, farm_id)?.harvest_history.push(record);
                vec![Collection::Farms]
            }
            Action::UpdateHarvest { farm_id, original_date, record } => {
                let farm = farm_mut(&mut next.farms, farm_id)?;
                replace_dated(&mut farm.harvest_history, original_date, record, "harvestHistory")?;
                vec![Collection::Farms]
            }
            Action::DeleteHarvest { farm_id, date } => {
                let farm = farm_mut(&mut next.farms, farm_id)?;
                remove_dated(&mut farm.harvest_history, date, "harvestHistory")?;
                vec![Collection::Farms]
            }
            Action::AddRotation { farm_id, record } => {
                farm_mut(&mut next.farms, farm_id)?.rotation_history.push(record);
                vec![Collection::Farms]
            }
            Action::DeleteRotation { farm_id, start_date } => {
                let farm = farm_mut(&mut next.farms, farm_id)?;
                remove_dated(&mut farm.rotation_history, start_date, "rotationHistory")?;
                vec![Collection::Farms]
            }

            Action::AddTask(task) => {
                push_new(&mut next.tasks, task);
                vec![Collection::Tasks]
            }
            Action::ToggleTask { id } => {
                let task = next
                    .tasks
                    .iter_mut()
                    .find(|t| t.id == id)
                    .ok_or_else(|| not_found("tasks", id))?;
                task.completed = !task.completed;
                vec![Collection::Tasks]
            }
            Action::DeleteTask { id } => {
                remove_by_id(&mut next.tasks, id, "tasks")?;
                vec![Collection::Tasks]
            }
            Action::AddIssue(issue) => {
                push_new(&mut next.issues, issue);
                vec![Collection::Issues]
            }
            Action::ResolveIssue { id } => {
                remove_by_id(&mut next.issues, id, "issues")?;
                vec![Collection::Issues]
            }

            Action::AddCropEvent(event) => {
                push_new(&mut next.crop_plan_events, event);
                vec![Collection::CropPlanEvents]
            }
            Action::DeleteCropEvent { id } => {
                remove_by_id(&mut next.crop_plan_events, id, "cropPlanEvents")?;
                vec![Collection::CropPlanEvents]
            }
            Action::MergeCropEvents(events) => {
                let before = next.crop_plan_events.len();
                for event in events {
                    if !next.crop_plan_events.iter().any(|e| e.id == event.id) {
                        next.crop_plan_events.push(event);
                    }
                }
                let added = next.crop_plan_events.len() - before;
                debug!(added, "Merged crop plan events");
                if added == 0 {
                    vec![]
                } else {
                    vec![Collection::CropPlanEvents]
                }
            }

            Action::AddLivestock(mut animal) => {
                if animal.id.is_empty() || next.livestock.iter().any(|l| l.id == animal.id) {
                    animal.id = Uuid::new_v4().to_string();
                }
                next.livestock.push(animal);
                vec![Collection::Livestock]
            }
            Action::UpdateLivestock(animal) => {
                let slot = next
                    .livestock
                    .iter_mut()
                    .find(|l| l.id == animal.id)
                    .ok_or_else(|| not_found("livestock", &animal.id))?;
                *slot = animal;
                vec![Collection::Livestock]
            }
            Action::DeleteLivestock { id } => {
                let before = next.livestock.len();
                next.livestock.retain(|l| l.id != id);
                if next.livestock.len() == before {
                    return Err(not_found("livestock", &id));
                }
                vec![Collection::Livestock]
            }

            Action::AddPlan { kind, plan } => {
                push_new(next.plans.entry(kind).or_default(), plan);
                vec![Collection::Plans(kind)]
            }
            Action::UpdatePlan { kind, plan } => {
                replace_by_id(next.plans.entry(kind).or_default(), plan, Collection::Plans(kind).key())?;
                vec![Collection::Plans(kind)]
            }
            Action::DeletePlan { kind, id } => {
                remove_by_id(next.plans.entry(kind).or_default(), id, Collection::Plans(kind).key())?;
                vec![Collection::Plans(kind)]
            }

            Action::AddTrackerRecord(record) => {
                let kind = record.kind();
                match record {
                    TrackerRecord::Soil(r) => push_new(&mut next.soil_records, r),
                    TrackerRecord::Emission(r) => push_new(&mut next.emission_sources, r),
                    TrackerRecord::Sequestration(r) => {
                        push_new(&mut next.sequestration_activities, r)
                    }
                    TrackerRecord::Energy(r) => push_new(&mut next.energy_records, r),
                    TrackerRecord::Fuel(r) => push_new(&mut next.fuel_records, r),
                }
                vec![Collection::Tracker(kind)]
            }
            Action::UpdateTrackerRecord(record) => {
                let kind = record.kind();
                let key = Collection::Tracker(kind).key();
                match record {
                    TrackerRecord::Soil(r) => replace_by_id(&mut next.soil_records, r, key)?,
                    TrackerRecord::Emission(r) => {
                        replace_by_id(&mut next.emission_sources, r, key)?
                    }
                    TrackerRecord::Sequestration(r) => {
                        replace_by_id(&mut next.sequestration_activities, r, key)?
                    }
                    TrackerRecord::Energy(r) => replace_by_id(&mut next.energy_records, r, key)?,
                    TrackerRecord::Fuel(r) => replace_by_id(&mut next.fuel_records, r, key)?,
                }
                vec![Collection::Tracker(kind)]
            }
            Action::DeleteTrackerRecord { kind, id } => {
                let key = Collection::Tracker(kind).key();
                match kind {
                    TrackerKind::Soil => remove_by_id(&mut next.soil_records, id, key)?,
                    TrackerKind::Emission => remove_by_id(&mut next.emission_sources, id, key)?,
                    TrackerKind::Sequestration => {
                        remove_by_id(&mut next.sequestration_activities, id, key)?
                    }
                    TrackerKind::Energy => remove_by_id(&mut next.energy_records, id, key)?,
                    TrackerKind::Fuel => remove_by_id(&mut next.fuel_records, id, key)?,
                }
                vec![Collection::Tracker(kind)]
            }

            Action::ReplaceAll(envelope) => {
                let envelope = *envelope;
                next.farms = envelope.farms;
                next.tasks = envelope.tasks;
                next.issues = envelope.issues;
                next.crop_plan_events = envelope.crop_plan_events;

                let mut changed = vec![
                    Collection::Farms,
                    Collection::Tasks,
                    Collection::Issues,
                    Collection::CropPlanEvents,
                ];
                let optional_plans = [
                    (PlanKind::Planting, envelope.planting_plans),
                    (PlanKind::Fertilizer, envelope.fertilizer_plans),
                    (PlanKind::PestManagement, envelope.pest_management_plans),
                ];
                for (kind, plans) in optional_plans {
                    if let Some(plans) = plans {
                        next.plans.insert(kind, plans);
                        changed.push(Collection::Plans(kind));
                    }
                }
                changed
            }
        };

        debug!(action = label, changed = changed.len(), "Applied action");
        Ok((next, changed))
    }
}

fn not_found(collection: &'static str, id: impl ToString) -> StateError {
    StateError::NotFound {
        collection,
        id: id.to_string(),
    }
}

/// One past the highest ID in use, or the lowest free ID once the top is taken.
fn next_id<T: Identified>(items: &[T]) -> u64 {
    let max = items.iter().map(Identified::id).max().unwrap_or(0);
    match max.checked_add(1) {
        Some(id) => id,
        None => (1..=u64::MAX)
            .find(|id| !items.iter().any(|i| i.id() == *id))
            .unwrap_or(0),
    }
}

/// Append, assigning a fresh ID when the given one is unset or taken.
fn push_new<T: Identified>(items: &mut Vec<T>, mut item: T) {
    let id = item.id();
    if id == 0 || items.iter().any(|i| i.id() == id) {
        item.set_id(next_id(items));
    }
    items.push(item);
}

fn replace_by_id<T: Identified>(items: &mut [T], item: T, collection: &'static str) -> Result<()> {
    let id = item.id();
    let slot = items
        .iter_mut()
        .find(|i| i.id() == id)
        .ok_or_else(|| not_found(collection, id))?;
    *slot = item;
    Ok(())
}

fn remove_by_id<T: Identified>(items: &mut Vec<T>, id: u64, collection: &'static str) -> Result<()> {
    let before = items.len();
    items.retain(|i| i.id() != id);
    if items.len() == before {
        return Err(not_found(collection, id));
    }
    Ok(())
}

fn farm_mut(farms: &mut [Farm], farm_id: u64) -> Result<&mut Farm> {
    farms
        .iter_mut()
        .find(|f| f.id == farm_id)
        .ok_or_else(|| not_found("farms", farm_id))
}

/// History entries keyed by a calendar day.
trait Dated {
    fn day(&self) -> NaiveDate;
}

impl Dated for WaterUsage {
    fn day(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for FertilizerRecord {
    fn day(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for HarvestRecord {
    fn day(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for RotationRecord {
    fn day(&self) -> NaiveDate {
        self.start_date
    }
}

/// Replace every entry recorded on `original`.
fn replace_dated<T: Dated + Clone>(
    entries: &mut [T],
    original: NaiveDate,
    entry: T,
    collection: &'static str,
) -> Result<()> {
    let mut matched = false;
    for slot in entries.iter_mut().filter(|e| e.day() == original) {
        *slot = entry.clone();
        matched = true;
    }
    if !matched {
        return Err(not_found(collection, original));
    }
    Ok(())
}

/// Remove every entry recorded on `date`.
fn remove_dated<T: Dated>(entries: &mut Vec<T>, date: NaiveDate, collection: &'static str) -> Result<()> {
    let before = entries.len();
    entries.retain(|e| e.day() != date);
    if entries.len() == before {
        return Err(not_found(collection, date));
    }
    Ok(())
}
