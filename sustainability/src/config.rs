//! Configuration for the scoring engine.

use serde::{Deserialize, Serialize};

use crate::types::{Result, ScoringError};

/// The five farm-level metrics that feed the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoreMetric {
    WaterEfficiency,
    OrganicScore,
    HarvestEfficiency,
    SoilQuality,
    Rotation,
}

impl CoreMetric {
    /// All core metrics in reporting order.
    pub const ALL: [CoreMetric; 5] = [
        CoreMetric::WaterEfficiency,
        CoreMetric::OrganicScore,
        CoreMetric::HarvestEfficiency,
        CoreMetric::SoilQuality,
        CoreMetric::Rotation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CoreMetric::WaterEfficiency => "water_efficiency",
            CoreMetric::OrganicScore => "organic_score",
            CoreMetric::HarvestEfficiency => "harvest_efficiency",
            CoreMetric::SoilQuality => "soil_quality",
            CoreMetric::Rotation => "rotation",
        }
    }
}

/// Scoring configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Weight of each core metric in the overall score
    #[serde(default)]
    pub weights: MetricWeights,
    /// Recommendation and banding thresholds
    #[serde(default)]
    pub thresholds: Thresholds,
    /// Normalization constants for tracker metrics
    #[serde(default)]
    pub trackers: TrackerConfig,
}

impl ScoringConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check that weights and baselines are usable.
    pub fn validate(&self) -> Result<()> {
        let weights = CoreMetric::ALL.map(|m| self.weights.weight(m));
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ScoringError::InvalidConfig(
                "metric weights must be finite and non-negative".to_string(),
            ));
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err(ScoringError::InvalidConfig(
                "at least one metric weight must be positive".to_string(),
            ));
        }
        if self.trackers.carbon_baseline_tons <= 0.0 {
            return Err(ScoringError::InvalidConfig(
                "carbon baseline must be positive".to_string(),
            ));
        }
        if self.trackers.fuel_baseline_gph <= 0.0 {
            return Err(ScoringError::InvalidConfig(
                "fuel baseline must be positive".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.trackers.energy_floor) {
            return Err(ScoringError::InvalidConfig(
                "energy floor must be within 0-100".to_string(),
            ));
        }
        Ok(())
    }
}

/// Weights for the core metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricWeights {
    pub water_efficiency: f64,
    pub organic_score: f64,
    pub harvest_efficiency: f64,
    pub soil_quality: f64,
    pub rotation: f64,
}

impl MetricWeights {
    pub fn weight(&self, metric: CoreMetric) -> f64 {
        match metric {
            CoreMetric::WaterEfficiency => self.water_efficiency,
            CoreMetric::OrganicScore => self.organic_score,
            CoreMetric::HarvestEfficiency => self.harvest_efficiency,
            CoreMetric::SoilQuality => self.soil_quality,
            CoreMetric::Rotation => self.rotation,
        }
    }
}

impl Default for MetricWeights {
    fn default() -> Self {
        Self {
            water_efficiency: 0.25,
            organic_score: 0.20,
            harvest_efficiency: 0.20,
            soil_quality: 0.20,
            rotation: 0.15,
        }
    }
}

/// Thresholds used when presenting a score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thresholds {
    /// Core metrics below this get a recommendation
    pub core_recommendation: u8,
    /// Tracker metrics below this get a recommendation
    pub tracker_recommendation: u8,
    /// Renewable share (%) below this suggests adding renewables
    pub renewable_share: u8,
    /// Overall score at or above this is "good"
    pub good_band: u8,
    /// Overall score at or above this is "fair"
    pub fair_band: u8,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            core_recommendation: 80,
            tracker_recommendation: 70,
            renewable_share: 20,
            good_band: 80,
            fair_band: 60,
        }
    }
}

/// Normalization constants for tracker metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Net emissions (tons) at which the carbon score reaches 50
    pub carbon_baseline_tons: f64,
    /// Energy efficiency score with no renewable share
    pub energy_floor: f64,
    /// Gallons per hour at which the fuel score reaches 50
    pub fuel_baseline_gph: f64,
    /// Months of soil tests considered, counted back from the newest test
    pub soil_window_months: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            carbon_baseline_tons: 10.0,
            energy_floor: 40.0,
            fuel_baseline_gph: 4.0,
            soil_window_months: 3,
        }
    }
}
