//! Core record types for farm data.
//!
//! Field names serialize in camelCase so documents written by the
//! dashboard load without translation.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::dates::calendar_day;

/// Read a quantity, taking `null` as zero.
///
/// Form fields left blank are stored as NaN, which JSON writes as `null`.
fn null_as_zero<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

/// One physical farm and its activity histories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Farm {
    /// Farm ID
    pub id: u64,
    /// Display name
    pub name: String,
    /// Size as entered (free text, e.g. "40 acres")
    #[serde(default)]
    pub size: String,
    /// Primary crop
    #[serde(default)]
    pub crop: String,
    /// Water usage log
    #[serde(default)]
    pub water_history: Vec<WaterUsage>,
    /// Fertilizer application log
    #[serde(default)]
    pub fertilizer_history: Vec<FertilizerRecord>,
    /// Harvest log
    #[serde(default)]
    pub harvest_history: Vec<HarvestRecord>,
    /// Crop rotation log
    #[serde(default)]
    pub rotation_history: Vec<RotationRecord>,
    /// Soil organic matter (%)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organic_matter: Option<f64>,
    /// Soil pH
    #[serde(rename = "soilPH", default, skip_serializing_if = "Option::is_none")]
    pub soil_ph: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slope_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biodiversity_score: Option<f64>,
}

impl Farm {
    /// Create a farm with empty histories.
    pub fn new(id: u64, name: impl Into<String>, crop: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            size: String::new(),
            crop: crop.into(),
            water_history: vec![],
            fertilizer_history: vec![],
            harvest_history: vec![],
            rotation_history: vec![],
            organic_matter: None,
            soil_ph: None,
            soil_type: None,
            slope_ratio: None,
            biodiversity_score: None,
        }
    }

    /// Builder: set size.
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = size.into();
        self
    }

    /// Builder: set soil measurements.
    pub fn with_soil(mut self, organic_matter: Option<f64>, soil_ph: Option<f64>) -> Self {
        self.organic_matter = organic_matter;
        self.soil_ph = soil_ph;
        self
    }
}

/// A single watering event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterUsage {
    /// Gallons applied
    #[serde(deserialize_with = "null_as_zero")]
    pub amount: f64,
    #[serde(with = "calendar_day")]
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efficiency: Option<f64>,
}

impl WaterUsage {
    pub fn new(amount: f64, date: NaiveDate) -> Self {
        Self {
            amount,
            date,
            efficiency: None,
        }
    }
}

/// A fertilizer application. `fertilizer_type` is free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FertilizerRecord {
    #[serde(rename = "type", default)]
    pub fertilizer_type: String,
    /// Pounds applied
    #[serde(deserialize_with = "null_as_zero")]
    pub amount: f64,
    #[serde(with = "calendar_day")]
    pub date: NaiveDate,
}

impl FertilizerRecord {
    pub fn new(fertilizer_type: impl Into<String>, amount: f64, date: NaiveDate) -> Self {
        Self {
            fertilizer_type: fertilizer_type.into(),
            amount,
            date,
        }
    }

    /// Whether the type names an organic input (organic, manure, compost).
    pub fn is_organic(&self) -> bool {
        let kind = self.fertilizer_type.to_lowercase();
        ["organic", "manure", "compost"]
            .iter()
            .any(|marker| kind.contains(marker))
    }
}

/// A harvest event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestRecord {
    /// Bushels harvested
    #[serde(deserialize_with = "null_as_zero")]
    pub amount: f64,
    #[serde(with = "calendar_day")]
    pub date: NaiveDate,
}

impl HarvestRecord {
    pub fn new(amount: f64, date: NaiveDate) -> Self {
        Self { amount, date }
    }
}

/// One planting in the rotation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationRecord {
    pub crop: String,
    #[serde(with = "calendar_day")]
    pub start_date: NaiveDate,
    #[serde(with = "calendar_day")]
    pub end_date: NaiveDate,
}

impl RotationRecord {
    pub fn new(crop: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            crop: crop.into(),
            start_date,
            end_date,
        }
    }
}

/// One day of forecast weather.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherDay {
    #[serde(with = "calendar_day")]
    pub date: NaiveDate,
    /// Maximum temperature, in the unit the provider delivered
    pub temp: f64,
    /// Description such as "Clear" or "Rain"
    pub weather: String,
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<f64>,
}

impl WeatherDay {
    pub fn new(date: NaiveDate, temp: f64, weather: impl Into<String>) -> Self {
        Self {
            date,
            temp,
            weather: weather.into(),
            icon: String::new(),
            precipitation: None,
        }
    }

    /// Whether the description mentions rain.
    pub fn is_rainy(&self) -> bool {
        self.weather.to_lowercase().contains("rain")
    }
}

/// A soil test result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoilRecord {
    pub id: u64,
    pub farm_id: u64,
    #[serde(with = "calendar_day")]
    pub date: NaiveDate,
    #[serde(default)]
    pub location: String,
    pub ph: f64,
    /// Organic matter (%)
    pub organic_matter: f64,
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    /// Moisture (%)
    pub moisture: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A source of carbon emissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarbonEmissionSource {
    pub id: u64,
    pub farm_id: u64,
    #[serde(with = "calendar_day")]
    pub date: NaiveDate,
    pub source_type: String,
    #[serde(default)]
    pub description: String,
    /// Tons of CO2 equivalent
    #[serde(deserialize_with = "null_as_zero")]
    pub co2_equivalent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// An activity that sequesters carbon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarbonSequestrationActivity {
    pub id: u64,
    pub farm_id: u64,
    #[serde(with = "calendar_day")]
    pub date: NaiveDate,
    pub activity_type: String,
    #[serde(default)]
    pub description: String,
    /// Tons of CO2 sequestered
    #[serde(deserialize_with = "null_as_zero")]
    pub co2_sequestered: f64,
    #[serde(default)]
    pub area: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Metered energy consumption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyRecord {
    pub id: u64,
    pub farm_id: u64,
    #[serde(with = "calendar_day")]
    pub date: NaiveDate,
    pub energy_type: String,
    #[serde(deserialize_with = "null_as_zero")]
    pub amount: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub renewable: bool,
    #[serde(default)]
    pub cost: f64,
    /// Irrigation, lighting, heating, etc.
    #[serde(default)]
    pub purpose: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Equipment fuel consumption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelRecord {
    pub id: u64,
    pub farm_id: u64,
    #[serde(with = "calendar_day")]
    pub date: NaiveDate,
    pub equipment_name: String,
    pub fuel_type: String,
    #[serde(deserialize_with = "null_as_zero")]
    pub gallons: f64,
    #[serde(deserialize_with = "null_as_zero")]
    pub hours_operated: f64,
    #[serde(default)]
    pub cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl FuelRecord {
    /// Gallons per operating hour, if any hours were logged.
    pub fn gallons_per_hour(&self) -> Option<f64> {
        (self.hours_operated > 0.0).then(|| self.gallons / self.hours_operated)
    }
}

/// Energy carrier classification used for kWh conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergySource {
    Electricity,
    Solar,
    Wind,
    Hydro,
    Biomass,
    Propane,
    NaturalGas,
    Diesel,
    Gasoline,
    Biodiesel,
    Other,
}

impl EnergySource {
    /// Classify a free-text energy or fuel type.
    pub fn from_label(label: &str) -> Self {
        let normalized: String = label
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c })
            .collect();

        match normalized.as_str() {
            "electricity" | "electric" => EnergySource::Electricity,
            "solar" => EnergySource::Solar,
            "wind" => EnergySource::Wind,
            "hydro" => EnergySource::Hydro,
            "biomass" => EnergySource::Biomass,
            "propane" => EnergySource::Propane,
            "natural_gas" => EnergySource::NaturalGas,
            "diesel" => EnergySource::Diesel,
            "gasoline" => EnergySource::Gasoline,
            "biodiesel" => EnergySource::Biodiesel,
            _ => EnergySource::Other,
        }
    }

    /// kWh-equivalent per native unit (kWh, gallon or therm).
    pub fn kwh_factor(&self) -> f64 {
        match self {
            EnergySource::Propane => 27.1,
            EnergySource::NaturalGas => 29.3,
            EnergySource::Diesel => 40.7,
            EnergySource::Gasoline => 33.7,
            EnergySource::Biodiesel => 37.8,
            _ => 1.0,
        }
    }

    /// Whether the source counts toward the renewable share.
    pub fn is_renewable(&self) -> bool {
        matches!(
            self,
            EnergySource::Solar
                | EnergySource::Wind
                | EnergySource::Hydro
                | EnergySource::Biomass
                | EnergySource::Biodiesel
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnergySource::Electricity => "electricity",
            EnergySource::Solar => "solar",
            EnergySource::Wind => "wind",
            EnergySource::Hydro => "hydro",
            EnergySource::Biomass => "biomass",
            EnergySource::Propane => "propane",
            EnergySource::NaturalGas => "natural_gas",
            EnergySource::Diesel => "diesel",
            EnergySource::Gasoline => "gasoline",
            EnergySource::Biodiesel => "biodiesel",
            EnergySource::Other => "other",
        }
    }
}

/// Error types for the scoring crate.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    /// Configuration failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration could not be parsed
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ScoringError>;
