//! Presentation helpers: score bands, recommendations and the crop filter.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::aggregate::SustainabilityMetrics;
use crate::config::{CoreMetric, Thresholds};
use crate::types::Farm;

/// Qualitative band for a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Good,
    Fair,
    Poor,
}

impl ScoreBand {
    pub fn from_score(score: u8, thresholds: &Thresholds) -> Self {
        if score >= thresholds.good_band {
            ScoreBand::Good
        } else if score >= thresholds.fair_band {
            ScoreBand::Fair
        } else {
            ScoreBand::Poor
        }
    }
}

/// The area a recommendation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    WaterEfficiency,
    OrganicPractices,
    HarvestEfficiency,
    SoilQuality,
    CropRotation,
    CarbonFootprint,
    EnergyEfficiency,
    FuelEfficiency,
    RenewableEnergy,
}

impl RecommendationKind {
    pub fn message(&self) -> &'static str {
        match self {
            RecommendationKind::WaterEfficiency => {
                "Consider implementing drip irrigation to improve water efficiency"
            }
            RecommendationKind::OrganicPractices => "Explore organic fertilizer alternatives",
            RecommendationKind::HarvestEfficiency => {
                "Review crop density and soil health management"
            }
            RecommendationKind::SoilQuality => "Implement soil improvement measures",
            RecommendationKind::CropRotation => "Consider implementing more diverse crop rotations",
            RecommendationKind::CarbonFootprint => {
                "Reduce carbon emissions through improved practices and carbon sequestration"
            }
            RecommendationKind::EnergyEfficiency => {
                "Improve energy efficiency with better equipment and renewable sources"
            }
            RecommendationKind::FuelEfficiency => {
                "Optimize equipment usage to reduce fuel consumption"
            }
            RecommendationKind::RenewableEnergy => {
                "Consider adding renewable energy sources like solar panels"
            }
        }
    }
}

impl From<CoreMetric> for RecommendationKind {
    fn from(metric: CoreMetric) -> Self {
        match metric {
            CoreMetric::WaterEfficiency => RecommendationKind::WaterEfficiency,
            CoreMetric::OrganicScore => RecommendationKind::OrganicPractices,
            CoreMetric::HarvestEfficiency => RecommendationKind::HarvestEfficiency,
            CoreMetric::SoilQuality => RecommendationKind::SoilQuality,
            CoreMetric::Rotation => RecommendationKind::CropRotation,
        }
    }
}

/// A suggested improvement tied to the score that triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub score: u8,
    pub message: String,
}

impl Recommendation {
    fn new(kind: RecommendationKind, score: u8) -> Self {
        Self {
            kind,
            score,
            message: kind.message().to_string(),
        }
    }
}

/// Recommendations for every metric below its threshold, in display order.
pub fn recommendations(metrics: &SustainabilityMetrics, thresholds: &Thresholds) -> Vec<Recommendation> {
    let mut out: Vec<Recommendation> = CoreMetric::ALL
        .into_iter()
        .filter(|m| metrics.core(*m) < thresholds.core_recommendation)
        .map(|m| Recommendation::new(m.into(), metrics.core(m)))
        .collect();

    let trackers = [
        (RecommendationKind::CarbonFootprint, metrics.carbon_footprint),
        (RecommendationKind::EnergyEfficiency, metrics.energy_efficiency),
        (RecommendationKind::FuelEfficiency, metrics.fuel_efficiency),
    ];
    for (kind, score) in trackers {
        if let Some(score) = score.filter(|s| *s < thresholds.tracker_recommendation) {
            out.push(Recommendation::new(kind, score));
        }
    }

    if let Some(share) = metrics
        .renewable_percentage
        .filter(|s| *s < thresholds.renewable_share)
    {
        out.push(Recommendation::new(RecommendationKind::RenewableEnergy, share));
    }

    out
}

/// Which farms are included in the score.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropFilter {
    #[default]
    All,
    Crop(String),
}

impl CropFilter {
    /// Farms matching the filter.
    pub fn apply(&self, farms: &[Farm]) -> Vec<Farm> {
        match self {
            CropFilter::All => farms.to_vec(),
            CropFilter::Crop(crop) => farms.iter().filter(|f| &f.crop == crop).cloned().collect(),
        }
    }

    /// Distinct crops available to filter on, sorted.
    pub fn options(farms: &[Farm]) -> Vec<String> {
        farms
            .iter()
            .map(|f| f.crop.clone())
            .filter(|crop| !crop.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl FromStr for CropFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(CropFilter::All)
        } else {
            Ok(CropFilter::Crop(s.to_string()))
        }
    }
}
