//! Server-side reading of the car details form.
//!
//! Every field arrives as optional text. Missing numeric or choice fields fall
//! back to the defaults of [`InputRecord`]; a missing brand does too, while an
//! explicitly empty brand is kept as the empty string.

use car_price_model::{FuelType, InputRecord, Transmission};
use serde::Deserialize;
use std::ops::RangeInclusive;
use thiserror::Error;

pub const YEAR_RANGE: RangeInclusive<i64> = 1980..=2026;
pub const MIN_MILEAGE: i64 = 0;
pub const ENGINE_SIZE_RANGE: RangeInclusive<f64> = 0.5..=8.0;
pub const ENGINE_SIZE_STEP: f64 = 0.1;

#[derive(Error, Debug, PartialEq)]
pub enum FormError {
    #[error("{field} must be a number, got `{value}`")]
    InvalidNumber { field: &'static str, value: String },
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: String,
        min: String,
        max: String,
    },
    #[error("{field} must be at least {min}, got {value}")]
    BelowMinimum {
        field: &'static str,
        value: String,
        min: String,
    },
    #[error("{field} must be a multiple of {step}, got {value}")]
    InvalidStep {
        field: &'static str,
        value: String,
        step: f64,
    },
    #[error("{0}")]
    InvalidChoice(String),
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct PredictionForm {
    pub year: Option<String>,
    pub mileage: Option<String>,
    pub engine_size: Option<String>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub brand: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn parse_number<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, FormError> {
    value.parse().map_err(|_| FormError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

fn read_year(form: &PredictionForm, default: i64) -> Result<i64, FormError> {
    let Some(raw) = present(&form.year) else {
        return Ok(default);
    };
    let year: i64 = parse_number("year", raw)?;
    if !YEAR_RANGE.contains(&year) {
        return Err(FormError::OutOfRange {
            field: "year",
            value: year.to_string(),
            min: YEAR_RANGE.start().to_string(),
            max: YEAR_RANGE.end().to_string(),
        });
    }
    Ok(year)
}

fn read_mileage(form: &PredictionForm, default: i64) -> Result<i64, FormError> {
    let Some(raw) = present(&form.mileage) else {
        return Ok(default);
    };
    let mileage: i64 = parse_number("mileage", raw)?;
    if mileage < MIN_MILEAGE {
        return Err(FormError::BelowMinimum {
            field: "mileage",
            value: mileage.to_string(),
            min: MIN_MILEAGE.to_string(),
        });
    }
    Ok(mileage)
}

fn read_engine_size(form: &PredictionForm, default: f64) -> Result<f64, FormError> {
    let Some(raw) = present(&form.engine_size) else {
        return Ok(default);
    };
    let engine_size: f64 = parse_number("engine_size", raw)?;
    if !engine_size.is_finite() {
        return Err(FormError::InvalidNumber {
            field: "engine_size",
            value: raw.to_string(),
        });
    }
    if !ENGINE_SIZE_RANGE.contains(&engine_size) {
        return Err(FormError::OutOfRange {
            field: "engine_size",
            value: raw.to_string(),
            min: ENGINE_SIZE_RANGE.start().to_string(),
            max: ENGINE_SIZE_RANGE.end().to_string(),
        });
    }
    let steps = engine_size / ENGINE_SIZE_STEP;
    if (steps - steps.round()).abs() > 1e-6 {
        return Err(FormError::InvalidStep {
            field: "engine_size",
            value: raw.to_string(),
            step: ENGINE_SIZE_STEP,
        });
    }
    Ok(engine_size)
}

impl TryFrom<PredictionForm> for InputRecord {
    type Error = FormError;

    fn try_from(form: PredictionForm) -> Result<Self, Self::Error> {
        let defaults = InputRecord::default();

        let fuel_type = match present(&form.fuel_type) {
            Some(raw) => FuelType::try_from(raw.to_string()).map_err(FormError::InvalidChoice)?,
            None => defaults.fuel_type,
        };
        let transmission = match present(&form.transmission) {
            Some(raw) => {
                Transmission::try_from(raw.to_string()).map_err(FormError::InvalidChoice)?
            }
            None => defaults.transmission,
        };

        Ok(InputRecord {
            year: read_year(&form, defaults.year)?,
            mileage: read_mileage(&form, defaults.mileage)?,
            engine_size: read_engine_size(&form, defaults.engine_size)?,
            fuel_type,
            transmission,
            brand: form.brand.unwrap_or(defaults.brand),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> PredictionForm {
        let mut form = PredictionForm::default();
        for (name, value) in pairs {
            let value = Some(value.to_string());
            match *name {
                "year" => form.year = value,
                "mileage" => form.mileage = value,
                "engine_size" => form.engine_size = value,
                "fuel_type" => form.fuel_type = value,
                "transmission" => form.transmission = value,
                "brand" => form.brand = value,
                other => panic!("unknown field {}", other),
            }
        }
        form
    }

    #[test]
    fn test_empty_form_uses_defaults() {
        let record = InputRecord::try_from(PredictionForm::default()).unwrap();
        assert_eq!(record, InputRecord::default());
    }

    #[test]
    fn test_boundary_values_are_accepted() {
        let record = InputRecord::try_from(form(&[
            ("year", "1980"),
            ("mileage", "0"),
            ("engine_size", "0.5"),
            ("fuel_type", "Electric"),
            ("transmission", "Automatic"),
            ("brand", ""),
        ]))
        .unwrap();

        assert_eq!(record.year, 1980);
        assert_eq!(record.mileage, 0);
        assert_eq!(record.engine_size, 0.5);
        assert_eq!(record.fuel_type, FuelType::Electric);
        assert_eq!(record.transmission, Transmission::Automatic);
        assert_eq!(record.brand, "");

        let upper = InputRecord::try_from(form(&[("year", "2026"), ("engine_size", "8.0")]));
        assert!(upper.is_ok());
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        assert_eq!(
            InputRecord::try_from(form(&[("year", "1979")])),
            Err(FormError::OutOfRange {
                field: "year",
                value: "1979".to_string(),
                min: "1980".to_string(),
                max: "2026".to_string(),
            })
        );
        assert!(matches!(
            InputRecord::try_from(form(&[("mileage", "-1")])),
            Err(FormError::BelowMinimum { field: "mileage", .. })
        ));
        assert!(matches!(
            InputRecord::try_from(form(&[("engine_size", "8.1")])),
            Err(FormError::OutOfRange { field: "engine_size", .. })
        ));
    }

    #[test]
    fn test_engine_size_step() {
        assert!(InputRecord::try_from(form(&[("engine_size", "2.7")])).is_ok());
        assert!(matches!(
            InputRecord::try_from(form(&[("engine_size", "2.75")])),
            Err(FormError::InvalidStep { .. })
        ));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(
            InputRecord::try_from(form(&[("year", "twenty")])),
            Err(FormError::InvalidNumber { field: "year", .. })
        ));
        assert!(matches!(
            InputRecord::try_from(form(&[("engine_size", "NaN")])),
            Err(FormError::InvalidNumber { field: "engine_size", .. })
        ));
        assert!(matches!(
            InputRecord::try_from(form(&[("fuel_type", "Steam")])),
            Err(FormError::InvalidChoice(_))
        ));
        assert!(matches!(
            InputRecord::try_from(form(&[("transmission", "CVT")])),
            Err(FormError::InvalidChoice(_))
        ));
    }
}
