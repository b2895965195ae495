use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Unit in which temperatures are presented to consumers. The device itself
/// always works in tenths of a degree Fahrenheit; the codec hands out Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DisplayUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl DisplayUnit {
    /// Convert a Celsius value into this unit.
    pub fn from_celsius(&self, celsius: Decimal) -> Decimal {
        match self {
            DisplayUnit::Celsius => celsius,
            DisplayUnit::Fahrenheit => celsius * dec!(9) / dec!(5) + dec!(32),
        }
    }

    /// Convert a value expressed in this unit back to Celsius.
    pub fn to_celsius(&self, value: Decimal) -> Decimal {
        match self {
            DisplayUnit::Celsius => value,
            DisplayUnit::Fahrenheit => (value - dec!(32)) * dec!(5) / dec!(9),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CELSIUS" | "C" => Some(DisplayUnit::Celsius),
            "FAHRENHEIT" | "F" => Some(DisplayUnit::Fahrenheit),
            _ => None,
        }
    }
}

impl fmt::Display for DisplayUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayUnit::Celsius => write!(f, "\u{00b0}C"),
            DisplayUnit::Fahrenheit => write!(f, "\u{00b0}F"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceState {
    #[default]
    Off,
    Heating,
    Cooling,
}

impl DeviceState {
    pub fn from_flags(is_on: bool, cooling_enabled: bool) -> Self {
        match (is_on, cooling_enabled) {
            (false, _) => DeviceState::Off,
            (true, true) => DeviceState::Cooling,
            (true, false) => DeviceState::Heating,
        }
    }
}

/// Decoded view of one thermostat. Temperatures are in the proxy's display unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: Option<String>,
    pub code: String,
    pub name: String,
    pub model: String,
    pub version: Option<String>,
    pub is_on: bool,
    pub is_eco_enabled: bool,
    pub current_hvac_mode: DeviceState,
    pub current_temperature: Decimal,
    pub target_temperature: Decimal,
    pub min_limit_temperature: Decimal,
    pub max_limit_temperature: Decimal,
    pub current_humidity: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoolingMode {
    pub model: String,
    pub is_cooling_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AwayMode {
    pub model: String,
    pub is_away_enabled: bool,
}

/// True when all three values are present and `min <= value <= max`.
pub fn is_value_in_bounds(
    value: Option<Decimal>,
    min: Option<Decimal>,
    max: Option<Decimal>,
) -> bool {
    match (value, min, max) {
        (Some(v), Some(lo), Some(hi)) => lo <= v && v <= hi,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_state_from_flags() {
        assert_eq!(DeviceState::from_flags(false, true), DeviceState::Off);
        assert_eq!(DeviceState::from_flags(false, false), DeviceState::Off);
        assert_eq!(DeviceState::from_flags(true, true), DeviceState::Cooling);
        assert_eq!(DeviceState::from_flags(true, false), DeviceState::Heating);
    }

    #[test]
    fn display_unit_parse() {
        assert_eq!(DisplayUnit::parse("CELSIUS"), Some(DisplayUnit::Celsius));
        assert_eq!(DisplayUnit::parse("fahrenheit"), Some(DisplayUnit::Fahrenheit));
        assert_eq!(DisplayUnit::parse("kelvin"), None);
    }

    #[test]
    fn display_unit_serde_matches_config_spelling() {
        let unit: DisplayUnit = serde_json::from_str("\"FAHRENHEIT\"").unwrap();
        assert_eq!(unit, DisplayUnit::Fahrenheit);
        assert_eq!(serde_json::to_string(&DisplayUnit::Celsius).unwrap(), "\"CELSIUS\"");
    }

    #[test]
    fn bounds() {
        assert!(is_value_in_bounds(Some(dec!(21)), Some(dec!(5)), Some(dec!(30))));
        assert!(is_value_in_bounds(Some(dec!(5)), Some(dec!(5)), Some(dec!(30))));
        assert!(!is_value_in_bounds(Some(dec!(31)), Some(dec!(5)), Some(dec!(30))));
        assert!(!is_value_in_bounds(None, Some(dec!(5)), Some(dec!(30))));
        assert!(!is_value_in_bounds(Some(dec!(21)), None, Some(dec!(30))));
    }
}
