use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ValidationError;

/// Search criteria for a snapshot fetch. Equality is structural: two criteria
/// sets compare equal iff every field matches, which is what suppresses
/// redundant refresh triggers when the same filters are applied twice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub norad_id: Option<u32>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub sat_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mission: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_altitude: Option<f64>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        *self == FilterCriteria::default()
    }

    /// Validates a loosely-typed payload (as emitted by the search form)
    /// field by field. Unknown fields and wrongly-typed values are rejected
    /// here rather than passed through to the fetch layer.
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let map = value.as_object().ok_or(ValidationError::NotAnObject)?;
        let mut criteria = FilterCriteria::default();

        for (key, val) in map {
            if val.is_null() {
                continue;
            }
            match key.as_str() {
                "name" => criteria.name = Some(require_string("name", val)?),
                "norad_id" => criteria.norad_id = Some(require_u32("norad_id", val)?),
                "type" => criteria.sat_type = Some(require_string("type", val)?),
                "mission" => criteria.mission = Some(require_string("mission", val)?),
                "min_altitude" => {
                    criteria.min_altitude = Some(require_number("min_altitude", val)?)
                }
                "max_altitude" => {
                    criteria.max_altitude = Some(require_number("max_altitude", val)?)
                }
                other => return Err(ValidationError::UnknownField(other.to_string())),
            }
        }

        if let (Some(min), Some(max)) = (criteria.min_altitude, criteria.max_altitude) {
            if min > max {
                return Err(ValidationError::field(
                    "min_altitude",
                    format!("lower bound {} exceeds upper bound {}", min, max),
                ));
            }
        }

        Ok(criteria)
    }
}

fn require_string(field: &'static str, value: &Value) -> Result<String, ValidationError> {
    value
        .as_str()
        .map(String::from)
        .ok_or_else(|| ValidationError::field(field, "expected a string"))
}

fn require_u32(field: &'static str, value: &Value) -> Result<u32, ValidationError> {
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| ValidationError::field(field, "expected an unsigned integer"))
}

fn require_number(field: &'static str, value: &Value) -> Result<f64, ValidationError> {
    match value.as_f64() {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(ValidationError::field(field, "expected a finite number")),
    }
}
