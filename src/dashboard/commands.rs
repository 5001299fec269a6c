use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ValidationError;

/// A command addressed to a single satellite, as submitted by the command
/// console. The payload stays opaque JSON; only its shape is checked here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatelliteCommand {
    pub satellite_id: u32,
    pub command_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl SatelliteCommand {
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let map = value.as_object().ok_or(ValidationError::NotAnObject)?;

        for key in map.keys() {
            if !matches!(key.as_str(), "satellite_id" | "command_name" | "payload") {
                return Err(ValidationError::UnknownField(key.clone()));
            }
        }

        let satellite_id = map
            .get("satellite_id")
            .ok_or(ValidationError::MissingField("satellite_id"))?
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| ValidationError::field("satellite_id", "expected an unsigned integer"))?;

        let command_name = map
            .get("command_name")
            .ok_or(ValidationError::MissingField("command_name"))?
            .as_str()
            .ok_or_else(|| ValidationError::field("command_name", "expected a string"))?
            .trim()
            .to_string();
        if command_name.is_empty() {
            return Err(ValidationError::field("command_name", "must not be empty"));
        }

        let payload = match map.get("payload") {
            None | Some(Value::Null) => None,
            Some(p @ Value::Object(_)) => Some(p.clone()),
            Some(_) => {
                return Err(ValidationError::field("payload", "expected an object"));
            }
        };

        Ok(SatelliteCommand {
            satellite_id,
            command_name,
            payload,
        })
    }
}
