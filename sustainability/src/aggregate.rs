//! Cross-farm aggregation into a single sustainability result.

use serde::{Deserialize, Serialize};
use tracing::debug;

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::config::{CoreMetric, ScoringConfig};
use crate::metrics::FarmMetrics;
use crate::trackers;
use crate::types::{
    CarbonEmissionSource, CarbonSequestrationActivity, EnergyRecord, Farm, FuelRecord, SoilRecord,
    WeatherDay,
};

/// Everything the scorer reads. All slices are borrowed; nothing is mutated.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInputs<'a> {
    pub farms: &'a [Farm],
    pub weather: &'a [WeatherDay],
    pub soil_records: &'a [SoilRecord],
    pub emission_sources: &'a [CarbonEmissionSource],
    pub sequestration_activities: &'a [CarbonSequestrationActivity],
    pub energy_records: &'a [EnergyRecord],
    pub fuel_records: &'a [FuelRecord],
}

impl<'a> ScoringInputs<'a> {
    /// Inputs with farms and weather only; tracker sets start empty.
    pub fn new(farms: &'a [Farm], weather: &'a [WeatherDay]) -> Self {
        Self {
            farms,
            weather,
            soil_records: &[],
            emission_sources: &[],
            sequestration_activities: &[],
            energy_records: &[],
            fuel_records: &[],
        }
    }

    /// Builder: set soil tests.
    pub fn with_soil_records(mut self, soil_records: &'a [SoilRecord]) -> Self {
        self.soil_records = soil_records;
        self
    }

    /// Builder: set carbon emission sources and sequestration activities.
    pub fn with_carbon(
        mut self,
        emission_sources: &'a [CarbonEmissionSource],
        sequestration_activities: &'a [CarbonSequestrationActivity],
    ) -> Self {
        self.emission_sources = emission_sources;
        self.sequestration_activities = sequestration_activities;
        self
    }

    /// Builder: set energy records.
    pub fn with_energy_records(mut self, energy_records: &'a [EnergyRecord]) -> Self {
        self.energy_records = energy_records;
        self
    }

    /// Builder: set fuel records.
    pub fn with_fuel_records(mut self, fuel_records: &'a [FuelRecord]) -> Self {
        self.fuel_records = fuel_records;
        self
    }
}

/// Rounded sustainability scores, 0-100.
///
/// Tracker fields are informational and never contribute to
/// `overall_score`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct SustainabilityMetrics {
    pub overall_score: u8,
    pub water_efficiency: u8,
    pub organic_score: u8,
    pub harvest_efficiency: u8,
    pub soil_quality_score: u8,
    pub rotation_score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbon_footprint: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_efficiency: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_efficiency: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renewable_percentage: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_health: Option<u8>,
}

impl SustainabilityMetrics {
    /// Rounded value of a core metric.
    pub fn core(&self, metric: CoreMetric) -> u8 {
        match metric {
            CoreMetric::WaterEfficiency => self.water_efficiency,
            CoreMetric::OrganicScore => self.organic_score,
            CoreMetric::HarvestEfficiency => self.harvest_efficiency,
            CoreMetric::SoilQuality => self.soil_quality_score,
            CoreMetric::Rotation => self.rotation_score,
        }
    }
}

fn round_score(value: f64) -> u8 {
    // NaN casts to 0.
    value.round().clamp(0.0, 100.0) as u8
}

/// Average each core metric over the farms that produced a signal for it.
///
/// Returns the averages and the number of contributing farms per metric.
fn average_core_metrics(per_farm: &[FarmMetrics]) -> (FarmMetrics, [usize; 5]) {
    let mut averages = FarmMetrics::default();
    let mut counts = [0usize; 5];

    for (index, metric) in CoreMetric::ALL.into_iter().enumerate() {
        let contributing: Vec<f64> = per_farm
            .iter()
            .map(|m| m.get(metric))
            .filter(|value| *value > 0.0)
            .collect();

        counts[index] = contributing.len();
        if !contributing.is_empty() {
            averages.set(
                metric,
                contributing.iter().sum::<f64>() / contributing.len() as f64,
            );
        }
    }

    (averages, counts)
}

/// Compute sustainability metrics for a set of farms.
///
/// Returns `None` when there are no farms or no weather: without a weather
/// baseline no meaningful score exists.
pub fn calculate(inputs: &ScoringInputs<'_>, config: &ScoringConfig) -> Option<SustainabilityMetrics> {
    if inputs.farms.is_empty() {
        debug!("No farms to score");
        return None;
    }
    if inputs.weather.is_empty() {
        debug!(farms = inputs.farms.len(), "No weather data, score unavailable");
        return None;
    }

    let per_farm: Vec<FarmMetrics> = inputs
        .farms
        .iter()
        .map(|farm| FarmMetrics::compute(farm, inputs.weather))
        .collect();

    let (averages, counts) = average_core_metrics(&per_farm);

    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    for (index, metric) in CoreMetric::ALL.into_iter().enumerate() {
        if counts[index] > 0 {
            let weight = config.weights.weight(metric);
            weighted_sum += averages.get(metric) * weight;
            total_weight += weight;
        }
    }
    let overall = if total_weight > 0.0 {
        weighted_sum / total_weight
    } else {
        0.0
    };

    let trackers_config = &config.trackers;
    let carbon = trackers::carbon_footprint_score(
        inputs.emission_sources,
        inputs.sequestration_activities,
        trackers_config.carbon_baseline_tons,
    );
    let energy = trackers::energy_efficiency_score(
        inputs.energy_records,
        inputs.fuel_records,
        trackers_config.energy_floor,
    );
    let fuel = trackers::fuel_efficiency_score(inputs.fuel_records, trackers_config.fuel_baseline_gph);
    let renewable = trackers::renewable_percentage(inputs.energy_records, inputs.fuel_records);
    let soil = trackers::soil_health(inputs.soil_records, trackers_config.soil_window_months);

    debug!(
        farms = per_farm.len(),
        overall,
        total_weight,
        "Computed sustainability metrics"
    );

    Some(SustainabilityMetrics {
        overall_score: round_score(overall),
        water_efficiency: round_score(averages.water_efficiency),
        organic_score: round_score(averages.organic_score),
        harvest_efficiency: round_score(averages.harvest_efficiency),
        soil_quality_score: round_score(averages.soil_quality_score),
        rotation_score: round_score(averages.rotation_score),
        carbon_footprint: carbon.map(round_score),
        energy_efficiency: energy.map(round_score),
        fuel_efficiency: fuel.map(round_score),
        renewable_percentage: renewable.map(round_score),
        soil_health: soil.map(|health| health.score),
    })
}

/// Scorer bound to a configuration.
#[derive(Debug, Clone, Default)]
pub struct SustainabilityScorer {
    config: ScoringConfig,
}

impl SustainabilityScorer {
    /// Create a scorer with the given configuration.
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score the inputs. See [`calculate`].
    pub fn score(&self, inputs: &ScoringInputs<'_>) -> Option<SustainabilityMetrics> {
        calculate(inputs, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FertilizerRecord, HarvestRecord, RotationRecord, WaterUsage};
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn clear_june() -> Vec<WeatherDay> {
        (1..=10)
            .map(|d| WeatherDay::new(day(2024, 6, d), 20.0, "Clear"))
            .collect()
    }

    #[test]
    fn test_empty_farms_or_weather() {
        let config = ScoringConfig::default();
        let farms = vec![Farm::new(1, "North", "corn")];
        let weather = clear_june();

        assert!(calculate(&ScoringInputs::new(&[], &weather), &config).is_none());
        assert!(calculate(&ScoringInputs::new(&farms, &[]), &config).is_none());
    }

    #[test]
    fn test_bare_farm_only_organic_and_soil() {
        let farms = vec![Farm::new(1, "North", "corn")];
        let weather = clear_june();
        let metrics = calculate(&ScoringInputs::new(&farms, &weather), &ScoringConfig::default())
            .unwrap();

        assert_eq!(metrics.water_efficiency, 0);
        assert_eq!(metrics.harvest_efficiency, 0);
        assert_eq!(metrics.rotation_score, 0);
        assert_eq!(metrics.organic_score, 70);
        assert_eq!(metrics.soil_quality_score, 70);
        // Weights renormalized over organic and soil only.
        assert_eq!(metrics.overall_score, 70);
        assert!(metrics.carbon_footprint.is_none());
        assert!(metrics.fuel_efficiency.is_none());
        assert!(metrics.soil_health.is_none());
    }

    #[test]
    fn test_missing_history_excluded_from_average() {
        let mut with_harvest = Farm::new(1, "North", "corn");
        with_harvest.harvest_history = vec![
            HarvestRecord::new(100.0, day(2024, 6, 1)),
            HarvestRecord::new(100.0, day(2024, 6, 2)),
        ];
        let without_harvest = Farm::new(2, "South", "soy");
        let farms = vec![with_harvest, without_harvest];
        let weather = clear_june();

        let metrics = calculate(&ScoringInputs::new(&farms, &weather), &ScoringConfig::default())
            .unwrap();
        // The second farm does not drag the average to 50.
        assert_eq!(metrics.harvest_efficiency, 100);
    }

    #[test]
    fn test_weighted_overall() {
        let mut farm = Farm::new(1, "North", "corn");
        farm.water_history = vec![WaterUsage::new(500.0, day(2024, 6, 1))];
        farm.fertilizer_history = vec![
            FertilizerRecord::new("organic compost", 100.0, day(2024, 5, 1)),
            FertilizerRecord::new("urea", 50.0, day(2024, 5, 2)),
        ];
        farm.harvest_history = vec![HarvestRecord::new(100.0, day(2024, 6, 3))];
        farm.rotation_history = vec![
            RotationRecord::new("corn", day(2023, 1, 1), day(2023, 6, 1)),
            RotationRecord::new("soy", day(2023, 7, 1), day(2023, 12, 1)),
        ];
        let farms = vec![farm];
        let weather = vec![
            WeatherDay::new(day(2024, 6, 1), 95.0, "Clear"),
            WeatherDay::new(day(2024, 6, 3), 80.0, "Clear"),
        ];

        let metrics = calculate(&ScoringInputs::new(&farms, &weather), &ScoringConfig::default())
            .unwrap();

        // water 90, organic 70 + 13.33 - 0.5 + 4 = 86.83, harvest 100,
        // soil 70 + 10 = 80, rotation 40 + 10 = 50
        let expected: f64 = 90.0 * 0.25 + 86.8333 * 0.20 + 100.0 * 0.20 + 80.0 * 0.20 + 50.0 * 0.15;
        assert_eq!(metrics.water_efficiency, 90);
        assert_eq!(metrics.organic_score, 87);
        assert_eq!(metrics.soil_quality_score, 80);
        assert_eq!(metrics.rotation_score, 50);
        assert_eq!(metrics.overall_score, expected.round() as u8);
    }

    #[test]
    fn test_tracker_metrics_reported_but_not_weighted() {
        let farms = vec![Farm::new(1, "North", "corn")];
        let weather = clear_june();
        let fuel = vec![FuelRecord {
            id: 1,
            farm_id: 1,
            date: day(2024, 6, 1),
            equipment_name: "Tractor".to_string(),
            fuel_type: "diesel".to_string(),
            gallons: 40.0,
            hours_operated: 4.0,
            cost: 120.0,
            notes: None,
        }];

        let inputs = ScoringInputs::new(&farms, &weather).with_fuel_records(&fuel);
        let metrics = calculate(&inputs, &ScoringConfig::default()).unwrap();

        assert_eq!(metrics.fuel_efficiency, Some(0));
        assert_eq!(metrics.renewable_percentage, Some(0));
        assert_eq!(metrics.energy_efficiency, Some(40));
        assert_eq!(metrics.overall_score, 70);
    }

    #[test]
    fn test_idempotent() {
        let mut farm = Farm::new(1, "North", "corn");
        farm.water_history = vec![WaterUsage::new(200.0, day(2024, 6, 4))];
        let farms = vec![farm];
        let weather = clear_june();
        let scorer = SustainabilityScorer::default();
        let inputs = ScoringInputs::new(&farms, &weather);

        assert_eq!(scorer.score(&inputs), scorer.score(&inputs));
    }

    #[test]
    fn test_metrics_json_omits_absent_trackers() {
        let farms = vec![Farm::new(1, "North", "corn")];
        let weather = clear_june();
        let metrics = calculate(&ScoringInputs::new(&farms, &weather), &ScoringConfig::default())
            .unwrap();
        let json = serde_json::to_value(&metrics).unwrap();
        assert_eq!(json["overallScore"], 70);
        assert!(json.get("carbonFootprint").is_none());
    }
}
