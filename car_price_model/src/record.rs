//! The single-row input handed to a predictor.

use serde::Deserialize;
use std::fmt;

pub const YEAR: &str = "year";
pub const MILEAGE: &str = "mileage";
pub const ENGINE_SIZE: &str = "engine_size";
pub const FUEL_TYPE: &str = "fuel_type";
pub const TRANSMISSION: &str = "transmission";
pub const BRAND: &str = "brand";

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum FuelType {
    Petrol,
    Diesel,
    Electric,
    Hybrid,
}

impl FuelType {
    pub const ALL: [FuelType; 4] = [
        FuelType::Petrol,
        FuelType::Diesel,
        FuelType::Electric,
        FuelType::Hybrid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FuelType::Petrol => "Petrol",
            FuelType::Diesel => "Diesel",
            FuelType::Electric => "Electric",
            FuelType::Hybrid => "Hybrid",
        }
    }
}

impl TryFrom<String> for FuelType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "petrol" => Ok(Self::Petrol),
            "diesel" => Ok(Self::Diesel),
            "electric" => Ok(Self::Electric),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(format!(
                "{} is not a supported fuel type. Use one of Petrol, Diesel, Electric or Hybrid.",
                other
            )),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Transmission {
    Manual,
    Automatic,
}

impl Transmission {
    pub const ALL: [Transmission; 2] = [Transmission::Manual, Transmission::Automatic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Transmission::Manual => "Manual",
            Transmission::Automatic => "Automatic",
        }
    }
}

impl TryFrom<String> for Transmission {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "automatic" => Ok(Self::Automatic),
            other => Err(format!(
                "{} is not a supported transmission. Use either Manual or Automatic.",
                other
            )),
        }
    }
}

/// One car to price.
#[derive(Debug, Clone, PartialEq)]
pub struct InputRecord {
    pub year: i64,
    pub mileage: i64,
    pub engine_size: f64,
    pub fuel_type: FuelType,
    pub transmission: Transmission,
    pub brand: String,
}

impl Default for InputRecord {
    fn default() -> Self {
        Self {
            year: 2020,
            mileage: 10_000,
            engine_size: 3.0,
            fuel_type: FuelType::Petrol,
            transmission: Transmission::Manual,
            brand: "Ferrari".to_string(),
        }
    }
}

impl InputRecord {
    pub fn to_features(&self) -> FeatureRow {
        FeatureRow::new()
            .with(YEAR, FeatureValue::Int(self.year))
            .with(MILEAGE, FeatureValue::Int(self.mileage))
            .with(ENGINE_SIZE, FeatureValue::Float(self.engine_size))
            .with(FUEL_TYPE, FeatureValue::Text(self.fuel_type.as_str().to_string()))
            .with(
                TRANSMISSION,
                FeatureValue::Text(self.transmission.as_str().to_string()),
            )
            .with(BRAND, FeatureValue::Text(self.brand.clone()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl FeatureValue {
    pub fn kind(&self) -> &'static str {
        match self {
            FeatureValue::Int(_) => "integer",
            FeatureValue::Float(_) => "float",
            FeatureValue::Text(_) => "text",
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Int(v) => write!(f, "{}", v),
            FeatureValue::Float(v) => write!(f, "{}", v),
            FeatureValue::Text(v) => write!(f, "{:?}", v),
        }
    }
}

/// Named feature values in insertion order. Setting a name twice keeps the
/// last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRow {
    fields: Vec<(String, FeatureValue)>,
}

impl FeatureRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: FeatureValue) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: FeatureValue) {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<FeatureValue> {
        let index = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(index).1)
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
