//! Farm-independent tracker metrics.
//!
//! These are computed once over the full tracker record sets. Each returns
//! `None` when there is nothing to measure so callers can leave the field
//! out instead of reporting a misleading zero.

use std::collections::BTreeMap;

use chrono::Months;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::types::{
    CarbonEmissionSource, CarbonSequestrationActivity, EnergyRecord, EnergySource, FuelRecord,
    SoilRecord,
};

/// Score net carbon emissions.
///
/// Full offset scores 100; a net emission equal to `baseline_tons` scores 50.
pub fn carbon_footprint_score(
    emissions: &[CarbonEmissionSource],
    sequestrations: &[CarbonSequestrationActivity],
    baseline_tons: f64,
) -> Option<f64> {
    if emissions.is_empty() && sequestrations.is_empty() {
        return None;
    }

    let emitted: f64 = emissions.iter().map(|e| e.co2_equivalent).sum();
    let sequestered: f64 = sequestrations.iter().map(|s| s.co2_sequestered).sum();
    let net = (emitted - sequestered).max(0.0);

    debug!(emitted, sequestered, net, "Carbon balance");

    Some(100.0 * baseline_tons / (baseline_tons + net))
}

/// Usage totals for one energy source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceUsage {
    /// Amount in the source's native unit
    pub amount: f64,
    /// kWh-equivalent of `amount`
    pub kwh: f64,
    /// Cost recorded against the source
    pub cost: f64,
}

/// Energy use grouped by source and converted to kWh-equivalent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyBreakdown {
    pub by_source: BTreeMap<EnergySource, SourceUsage>,
    pub total_kwh: f64,
    pub renewable_kwh: f64,
    pub total_cost: f64,
}

impl EnergyBreakdown {
    /// Group energy and fuel records. Fuel is counted in gallons.
    pub fn from_records(energy: &[EnergyRecord], fuel: &[FuelRecord]) -> Self {
        let mut by_source: BTreeMap<EnergySource, SourceUsage> = BTreeMap::new();

        for record in energy {
            let usage = by_source
                .entry(EnergySource::from_label(&record.energy_type))
                .or_default();
            usage.amount += record.amount;
            usage.cost += record.cost;
        }
        for record in fuel {
            let usage = by_source
                .entry(EnergySource::from_label(&record.fuel_type))
                .or_default();
            usage.amount += record.gallons;
        }

        let mut breakdown = Self::default();
        for (source, usage) in by_source.iter_mut() {
            usage.kwh = usage.amount * source.kwh_factor();
            breakdown.total_kwh += usage.kwh;
            breakdown.total_cost += usage.cost;
            if source.is_renewable() {
                breakdown.renewable_kwh += usage.kwh;
            }
        }
        breakdown.by_source = by_source;
        breakdown
    }

    /// Renewable share of total energy (0-100); 0 when nothing was used.
    pub fn renewable_percentage(&self) -> f64 {
        if self.total_kwh > 0.0 {
            self.renewable_kwh / self.total_kwh * 100.0
        } else {
            0.0
        }
    }
}

/// Renewable share of energy and fuel use.
pub fn renewable_percentage(energy: &[EnergyRecord], fuel: &[FuelRecord]) -> Option<f64> {
    if energy.is_empty() && fuel.is_empty() {
        return None;
    }
    Some(EnergyBreakdown::from_records(energy, fuel).renewable_percentage())
}

/// Score energy use by renewable share, starting from `floor`.
pub fn energy_efficiency_score(
    energy: &[EnergyRecord],
    fuel: &[FuelRecord],
    floor: f64,
) -> Option<f64> {
    renewable_percentage(energy, fuel).map(|share| floor + (100.0 - floor) * share / 100.0)
}

/// Score equipment fuel use from mean gallons per operating hour.
///
/// Records without operating hours are ignored. `baseline_gph` scores 50,
/// twice the baseline scores 0.
pub fn fuel_efficiency_score(fuel: &[FuelRecord], baseline_gph: f64) -> Option<f64> {
    let rates: Vec<f64> = fuel.iter().filter_map(FuelRecord::gallons_per_hour).collect();
    if rates.is_empty() {
        return None;
    }

    let mean_gph = rates.iter().sum::<f64>() / rates.len() as f64;
    debug!(mean_gph, records = rates.len(), "Fuel consumption rate");

    Some((100.0 - 50.0 * mean_gph / baseline_gph).clamp(0.0, 100.0))
}

/// Soil health derived from recent soil tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct SoilHealth {
    /// Score (0-100)
    pub score: u8,
    /// Problems found in the averaged readings
    pub issues: Vec<String>,
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Assess soil tests taken within `window_months` of the newest test.
pub fn soil_health(records: &[SoilRecord], window_months: u32) -> Option<SoilHealth> {
    let newest = records.iter().map(|r| r.date).max()?;
    let cutoff = newest
        .checked_sub_months(Months::new(window_months))
        .unwrap_or(newest);
    let recent: Vec<&SoilRecord> = records.iter().filter(|r| r.date >= cutoff).collect();

    let mut total = 0.0;
    let mut issues = Vec::new();

    let ph = mean(recent.iter().map(|r| r.ph));
    if ph < 5.5 {
        issues.push("Soil pH is too acidic".to_string());
        total += 10.0;
    } else if ph > 8.0 {
        issues.push("Soil pH is too alkaline".to_string());
        total += 10.0;
    } else if (6.0..=7.5).contains(&ph) {
        total += 25.0;
    } else {
        total += 15.0;
    }

    let organic_matter = mean(recent.iter().map(|r| r.organic_matter));
    if organic_matter < 2.0 {
        issues.push("Low organic matter content".to_string());
        total += 5.0;
    } else if organic_matter >= 5.0 {
        total += 25.0;
    } else {
        total += organic_matter * 5.0;
    }

    let nutrients = [
        ("nitrogen", mean(recent.iter().map(|r| r.nitrogen))),
        ("phosphorus", mean(recent.iter().map(|r| r.phosphorus))),
        ("potassium", mean(recent.iter().map(|r| r.potassium))),
    ];
    for (name, level) in nutrients {
        if level < 10.0 {
            issues.push(format!("Low {name} levels"));
            total += 5.0;
        } else {
            total += 15.0;
        }
    }

    let moisture = mean(recent.iter().map(|r| r.moisture));
    if moisture < 15.0 {
        issues.push("Low soil moisture".to_string());
    } else if moisture > 40.0 {
        issues.push("Excessive soil moisture".to_string());
    } else {
        total += 5.0;
    }

    Some(SoilHealth {
        score: total.round().min(100.0) as u8,
        issues,
    })
}
