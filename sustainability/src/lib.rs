//! Sustainability scoring for farm records
//!
//! Turns a farm's own activity history, the local weather forecast and a set
//! of auxiliary tracker records into a single sustainability score with a
//! per-metric breakdown:
//!
//! - **Per-farm metrics**: water efficiency, organic practices, harvest
//!   efficiency, soil quality, crop rotation
//! - **Tracker metrics**: carbon footprint, energy efficiency, fuel
//!   efficiency, renewable share, soil health
//! - **Aggregation**: cross-farm averages skipping farms without data,
//!   weights renormalized over the metrics that have data
//!
//! Everything here is pure and synchronous. Callers fetch the records,
//! call [`calculate`] (or [`SustainabilityScorer::score`]) and render the
//! result; `None` means "score unavailable".
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use sustainability::{calculate, Farm, ScoringConfig, ScoringInputs, WaterUsage, WeatherDay};
//!
//! let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
//! let mut farm = Farm::new(1, "North Field", "corn");
//! farm.water_history.push(WaterUsage::new(500.0, day));
//! let farms = vec![farm];
//! let weather = vec![WeatherDay::new(day, 95.0, "Clear")];
//!
//! let metrics = calculate(&ScoringInputs::new(&farms, &weather), &ScoringConfig::default()).unwrap();
//! assert_eq!(metrics.water_efficiency, 90);
//! ```

pub mod aggregate;
pub mod config;
pub mod dates;
pub mod metrics;
pub mod recommend;
pub mod trackers;
pub mod types;

// Re-export main types
pub use aggregate::{calculate, ScoringInputs, SustainabilityMetrics, SustainabilityScorer};
pub use config::{CoreMetric, MetricWeights, ScoringConfig, Thresholds, TrackerConfig};
pub use metrics::FarmMetrics;
pub use recommend::{recommendations, CropFilter, Recommendation, RecommendationKind, ScoreBand};
pub use trackers::{EnergyBreakdown, SoilHealth, SourceUsage};
pub use types::*;
