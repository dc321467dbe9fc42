//! Per-farm sustainability metrics.
//!
//! Each function scores one farm on a 0-100 scale. A score of exactly 0
//! means the farm had nothing to measure; the aggregator leaves such farms
//! out of that metric's average instead of counting them as failures.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::CoreMetric;
use crate::types::{Farm, WaterUsage, WeatherDay};

const IDEAL_SOIL_PH: f64 = 6.5;

fn weather_on(weather: &[WeatherDay], day: NaiveDate) -> Option<&WeatherDay> {
    weather.iter().find(|w| w.date == day)
}

fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

/// Score watering against the weather around the latest watering.
///
/// Only the most recent entry is considered. Watering on or right after a
/// rainy day, or in temperature extremes, lowers the score.
pub fn water_efficiency(water_history: &[WaterUsage], weather: &[WeatherDay]) -> f64 {
    let Some(latest) = water_history.last() else {
        return 0.0;
    };

    let same_day = weather_on(weather, latest.date);
    let previous_day = latest
        .date
        .pred_opt()
        .and_then(|day| weather_on(weather, day));

    let mut score = 100.0;

    if same_day.is_some_and(WeatherDay::is_rainy) {
        score *= 0.5;
    }
    if previous_day.is_some_and(WeatherDay::is_rainy) {
        score *= 0.7;
    }

    // A zero reading is treated as missing
    if let Some(day) = same_day.filter(|d| d.temp != 0.0) {
        if day.temp > 30.0 {
            score *= 0.9;
        } else if day.temp < 10.0 {
            score *= 0.95;
        }
    }

    score
}

/// Score fertilizer composition and rotation practice.
pub fn organic_score(farm: &Farm) -> f64 {
    let mut score = 70.0;

    let total: f64 = farm.fertilizer_history.iter().map(|f| f.amount).sum();
    let organic: Vec<_> = farm
        .fertilizer_history
        .iter()
        .filter(|f| f.is_organic())
        .collect();
    let organic_amount: f64 = organic.iter().map(|f| f.amount).sum();

    if total > 0.0 {
        score += (organic_amount / total) * 20.0;

        let chemical_amount = total - organic_amount;
        if chemical_amount > 0.0 {
            score -= ((chemical_amount / 1000.0) * 10.0).min(30.0);
        }
    }

    score += (farm.rotation_history.len() as f64 * 2.0).min(10.0);

    if organic.len() >= 3 {
        score += 10.0;
    }

    clamp_score(score)
}

/// Score yield consistency, penalizing harvests on rainy days.
pub fn harvest_efficiency(farm: &Farm, weather: &[WeatherDay]) -> f64 {
    if farm.harvest_history.is_empty() {
        return 0.0;
    }

    let mut score = 100.0;

    let yields: Vec<f64> = farm.harvest_history.iter().map(|h| h.amount).collect();
    let count = yields.len() as f64;
    let mean = yields.iter().sum::<f64>() / count;
    if mean > 0.0 {
        let variance = yields.iter().map(|y| (y - mean).powi(2)).sum::<f64>() / count;
        score -= (variance.sqrt() / mean) * 20.0;
    }

    let rainy_harvests = farm
        .harvest_history
        .iter()
        .filter(|h| weather_on(weather, h.date).is_some_and(WeatherDay::is_rainy))
        .count();
    score -= rainy_harvests as f64 * 5.0;

    clamp_score(score)
}

/// Score soil condition from organic matter, pH and rotation count.
pub fn soil_quality_score(farm: &Farm) -> f64 {
    let mut score = 70.0;

    if let Some(organic_matter) = farm.organic_matter {
        score += organic_matter * 5.0;
    }
    if let Some(ph) = farm.soil_ph.filter(|ph| *ph != 0.0) {
        score -= (ph - IDEAL_SOIL_PH).abs() * 5.0;
    }
    score += (farm.rotation_history.len() as f64 * 5.0).min(15.0);

    clamp_score(score)
}

/// Score rotation frequency and crop diversity.
pub fn rotation_score(farm: &Farm) -> f64 {
    if farm.rotation_history.is_empty() {
        return 0.0;
    }

    let frequency = (farm.rotation_history.len() as f64 * 20.0).min(100.0);
    let unique_crops = farm
        .rotation_history
        .iter()
        .map(|r| r.crop.as_str())
        .collect::<HashSet<_>>()
        .len();
    let diversity = (unique_crops as f64 * 5.0).min(20.0);

    (frequency + diversity).min(100.0)
}

/// The five core metrics for a single farm, unrounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FarmMetrics {
    pub water_efficiency: f64,
    pub organic_score: f64,
    pub harvest_efficiency: f64,
    pub soil_quality_score: f64,
    pub rotation_score: f64,
}

impl FarmMetrics {
    /// Compute every core metric for one farm.
    pub fn compute(farm: &Farm, weather: &[WeatherDay]) -> Self {
        Self {
            water_efficiency: water_efficiency(&farm.water_history, weather),
            organic_score: organic_score(farm),
            harvest_efficiency: harvest_efficiency(farm, weather),
            soil_quality_score: soil_quality_score(farm),
            rotation_score: rotation_score(farm),
        }
    }

    pub fn get(&self, metric: CoreMetric) -> f64 {
        match metric {
            CoreMetric::WaterEfficiency => self.water_efficiency,
            CoreMetric::OrganicScore => self.organic_score,
            CoreMetric::HarvestEfficiency => self.harvest_efficiency,
            CoreMetric::SoilQuality => self.soil_quality_score,
            CoreMetric::Rotation => self.rotation_score,
        }
    }

    pub fn set(&mut self, metric: CoreMetric, value: f64) {
        let slot = match metric {
            CoreMetric::WaterEfficiency => &mut self.water_efficiency,
            CoreMetric::OrganicScore => &mut self.organic_score,
            CoreMetric::HarvestEfficiency => &mut self.harvest_efficiency,
            CoreMetric::SoilQuality => &mut self.soil_quality_score,
            CoreMetric::Rotation => &mut self.rotation_score,
        };
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FertilizerRecord, HarvestRecord, RotationRecord};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rotation(crop: &str, month: u32) -> RotationRecord {
        RotationRecord::new(crop, day(2023, month, 1), day(2023, month, 28))
    }

    #[test]
    fn test_water_empty_history() {
        let weather = vec![WeatherDay::new(day(2024, 6, 1), 70.0, "Clear")];
        assert_eq!(water_efficiency(&[], &weather), 0.0);
    }

    #[test]
    fn test_water_hot_clear_day() {
        let usage = vec![WaterUsage::new(500.0, day(2024, 6, 1))];
        let weather = vec![
            WeatherDay::new(day(2024, 5, 31), 88.0, "Clear"),
            WeatherDay::new(day(2024, 6, 1), 95.0, "Clear"),
        ];
        assert!((water_efficiency(&usage, &weather) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_water_rain_same_and_previous_day() {
        let usage = vec![WaterUsage::new(500.0, day(2024, 6, 2))];
        let weather = vec![
            WeatherDay::new(day(2024, 6, 1), 20.0, "Rain"),
            WeatherDay::new(day(2024, 6, 2), 20.0, "light rain"),
        ];
        // 100 * 0.5 * 0.7, mild temperature
        assert!((water_efficiency(&usage, &weather) - 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_water_uses_latest_entry_only() {
        let usage = vec![
            WaterUsage::new(500.0, day(2024, 6, 1)),
            WaterUsage::new(300.0, day(2024, 6, 5)),
        ];
        let weather = vec![WeatherDay::new(day(2024, 6, 1), 20.0, "Rain")];
        // No weather for the latest watering: no adjustment at all.
        assert_eq!(water_efficiency(&usage, &weather), 100.0);
    }

    #[test]
    fn test_water_cold_day() {
        let usage = vec![WaterUsage::new(100.0, day(2024, 1, 10))];
        let weather = vec![WeatherDay::new(day(2024, 1, 10), 5.0, "Snow")];
        assert!((water_efficiency(&usage, &weather) - 95.0).abs() < 1e-9);
    }

    #[test]
    fn test_water_zero_temperature_ignored() {
        let usage = vec![WaterUsage::new(100.0, day(2024, 1, 10))];
        let weather = vec![WeatherDay::new(day(2024, 1, 10), 0.0, "Clear")];
        assert_eq!(water_efficiency(&usage, &weather), 100.0);
    }

    #[test]
    fn test_organic_mixed_fertilizers() {
        let mut farm = Farm::new(1, "North", "corn");
        farm.fertilizer_history = vec![
            FertilizerRecord::new("organic compost", 100.0, day(2024, 5, 1)),
            FertilizerRecord::new("urea", 50.0, day(2024, 5, 2)),
        ];
        let score = organic_score(&farm);
        assert!((score - 82.8333).abs() < 0.001);
        assert_eq!(score.round(), 83.0);
    }

    #[test]
    fn test_organic_bonus_for_three_organic_records() {
        let mut farm = Farm::new(1, "North", "corn");
        farm.fertilizer_history = (1..=3)
            .map(|d| FertilizerRecord::new("manure", 10.0, day(2024, 5, d)))
            .collect();
        // 70 + 20 (fully organic) + 10 bonus
        assert_eq!(organic_score(&farm), 100.0);
    }

    #[test]
    fn test_organic_clamped_at_top() {
        let mut farm = Farm::new(1, "North", "corn");
        farm.fertilizer_history = (1..=3)
            .map(|d| FertilizerRecord::new("manure", 10.0, day(2024, 5, d)))
            .collect();
        farm.rotation_history = (1..=5).map(|m| rotation("corn", m)).collect();
        // 70 + 20 + 10 rotation + 10 bonus = 110 before clamping
        assert_eq!(organic_score(&farm), 100.0);
    }

    #[test]
    fn test_organic_chemical_penalty_capped() {
        let mut farm = Farm::new(1, "North", "corn");
        farm.fertilizer_history = vec![FertilizerRecord::new("urea", 1_000_000.0, day(2024, 5, 1))];
        assert_eq!(organic_score(&farm), 40.0);
    }

    #[test]
    fn test_organic_no_fertilizer_with_rotations() {
        let mut farm = Farm::new(1, "North", "corn");
        farm.rotation_history = (1..=7).map(|m| rotation("corn", m)).collect();
        assert_eq!(organic_score(&farm), 80.0);
    }

    #[test]
    fn test_harvest_empty_history() {
        let farm = Farm::new(1, "North", "corn");
        assert_eq!(harvest_efficiency(&farm, &[]), 0.0);
    }

    #[test]
    fn test_harvest_variation_and_rain() {
        let mut farm = Farm::new(1, "North", "corn");
        farm.harvest_history = vec![
            HarvestRecord::new(100.0, day(2024, 9, 1)),
            HarvestRecord::new(300.0, day(2024, 9, 2)),
            HarvestRecord::new(200.0, day(2024, 9, 3)),
        ];
        let weather = vec![
            WeatherDay::new(day(2024, 9, 1), 60.0, "Rain"),
            WeatherDay::new(day(2024, 9, 3), 60.0, "Rain showers"),
        ];
        // mean 200, population stddev sqrt(20000/3)
        let variation = (20000.0_f64 / 3.0).sqrt() / 200.0;
        let expected = 100.0 - variation * 20.0 - 10.0;
        assert!((harvest_efficiency(&farm, &weather) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_harvest_zero_yields_skip_variation() {
        let mut farm = Farm::new(1, "North", "corn");
        farm.harvest_history = vec![HarvestRecord::new(0.0, day(2024, 9, 1))];
        assert_eq!(harvest_efficiency(&farm, &[]), 100.0);
    }

    #[test]
    fn test_soil_quality_clamped() {
        let farm = Farm::new(1, "North", "corn").with_soil(Some(1000.0), Some(6.5));
        assert_eq!(soil_quality_score(&farm), 100.0);

        let farm = Farm::new(2, "South", "corn").with_soil(None, Some(14.0));
        // 70 - 37.5
        assert!((soil_quality_score(&farm) - 32.5).abs() < 1e-9);

        let farm = Farm::new(3, "East", "corn").with_soil(Some(-100.0), Some(14.0));
        assert_eq!(soil_quality_score(&farm), 0.0);
    }

    #[test]
    fn test_soil_quality_zero_ph_ignored() {
        let farm = Farm::new(1, "North", "corn").with_soil(None, Some(0.0));
        assert_eq!(soil_quality_score(&farm), 70.0);
    }

    #[test]
    fn test_soil_quality_rotation_bonus_capped() {
        let mut farm = Farm::new(1, "North", "corn");
        farm.rotation_history = (1..=5).map(|m| rotation("corn", m)).collect();
        assert_eq!(soil_quality_score(&farm), 85.0);
    }

    #[test]
    fn test_rotation_score_example() {
        let mut farm = Farm::new(1, "North", "corn");
        farm.rotation_history = vec![
            rotation("corn", 1),
            rotation("soy", 4),
            rotation("corn", 8),
        ];
        assert_eq!(rotation_score(&farm), 70.0);
    }

    #[test]
    fn test_rotation_score_monotone_in_length() {
        let mut farm = Farm::new(1, "North", "corn");
        let mut previous = rotation_score(&farm);
        for month in 1..=12 {
            let crop = if month % 2 == 0 { "corn" } else { "soy" };
            farm.rotation_history.push(rotation(crop, month));
            let current = rotation_score(&farm);
            assert!(current >= previous);
            previous = current;
        }
        assert_eq!(previous, 100.0);
    }

    #[test]
    fn test_farm_metrics_accessors() {
        let mut metrics = FarmMetrics::default();
        metrics.set(CoreMetric::Rotation, 42.0);
        assert_eq!(metrics.get(CoreMetric::Rotation), 42.0);
        assert_eq!(metrics.rotation_score, 42.0);
    }
}
