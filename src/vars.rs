//! Decoding of the device's flat variable set.
//!
//! The controller exposes every piece of state as a string variable. Temperatures
//! are tenths of a degree Fahrenheit (`320` is 32.0°F, i.e. 0°C); offsets such as
//! the eco setback use the same tenths-of-°F scale. Getters here return Celsius.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::debug;

use crate::protocol::*;
use crate::{Error, Result};

const FREEZING_RAW: Decimal = dec!(320);

const DEFAULT_ROOM_TEMPERATURE: Decimal = dec!(320);
const DEFAULT_SETPOINT: Decimal = dec!(698);
const DEFAULT_MINIMUM_SETPOINT: Decimal = dec!(410);
const DEFAULT_MAXIMUM_SETPOINT: Decimal = dec!(860);
const DEFAULT_HUMIDITY: Decimal = dec!(0);

pub const DEFAULT_NAME: &str = "Uponor Thermostat";
pub const DEFAULT_MODEL: &str = "Uponor Smatrix";

/// One changed variable between two snapshots. `None` means absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VarChange {
    pub name: String,
    pub old: Option<String>,
    pub new: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
    data: BTreeMap<String, String>,
}

impl Variables {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from the `vars` array of a read response. Later duplicates win.
    pub fn from_response(vars: impl IntoIterator<Item = JnapVar>) -> Self {
        let data = vars
            .into_iter()
            .map(|v| (v.wasp_var_name, v.wasp_var_value))
            .collect();
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    fn set(&mut self, key: String, value: String) {
        self.data.insert(key, value);
    }

    fn flag(&self, key: &str) -> bool {
        self.get(key) == Some("1")
    }

    /// Numeric lookup that keeps "absent" (`Ok(None)`) apart from "present but
    /// not a number" (`Err`).
    pub fn decimal(&self, key: &str) -> Result<Option<Decimal>> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => Decimal::from_str(raw.trim())
                .map(Some)
                .map_err(|_| Error::InvalidValue {
                    key: key.to_string(),
                    value: raw.to_string(),
                }),
        }
    }

    fn decimal_or(&self, key: &str, default: Decimal) -> Decimal {
        match self.decimal(key) {
            Ok(Some(v)) => v,
            Ok(None) => default,
            Err(e) => {
                debug!(error = %e, %default, "using default");
                default
            }
        }
    }

    pub fn device_codes(&self) -> Vec<String> {
        let mut codes = Vec::new();
        for controller in CONTROLLERS {
            if !self.flag(&controller_presence_key(controller)) {
                continue;
            }
            for thermostat in THERMOSTATS {
                if self.flag(&thermostat_presence_key(controller, thermostat)) {
                    codes.push(device_code(controller, thermostat));
                }
            }
        }
        codes
    }

    // -- identity --

    pub fn id(&self, code: &str) -> Option<&str> {
        self.get(&id_key(code))
    }

    pub fn name(&self, code: &str) -> &str {
        self.get(&name_key(code)).unwrap_or(DEFAULT_NAME)
    }

    pub fn model(&self) -> &str {
        self.get(MODEL_KEY).unwrap_or(DEFAULT_MODEL)
    }

    pub fn version(&self, code: &str) -> Option<&str> {
        self.get(&thermostat_key(code, SW_VERSION))
    }

    pub fn humidity(&self, code: &str) -> Decimal {
        self.decimal_or(&thermostat_key(code, HUMIDITY), DEFAULT_HUMIDITY)
    }

    // -- temperatures --

    fn raw_to_celsius(raw: Decimal) -> Decimal {
        (raw - FREEZING_RAW) / dec!(18)
    }

    /// Mirrors the thermostat display: floor to 0.1°C.
    fn raw_to_display_celsius(raw: Decimal) -> Decimal {
        ((raw - FREEZING_RAW) / dec!(1.8)).floor() / dec!(10)
    }

    pub fn current_temperature(&self, code: &str) -> Decimal {
        Self::raw_to_celsius(
            self.decimal_or(&thermostat_key(code, ROOM_TEMPERATURE), DEFAULT_ROOM_TEMPERATURE),
        )
    }

    pub fn min_limit(&self, code: &str) -> Decimal {
        Self::raw_to_celsius(
            self.decimal_or(&thermostat_key(code, MINIMUM_SETPOINT), DEFAULT_MINIMUM_SETPOINT),
        )
    }

    pub fn max_limit(&self, code: &str) -> Decimal {
        Self::raw_to_celsius(
            self.decimal_or(&thermostat_key(code, MAXIMUM_SETPOINT), DEFAULT_MAXIMUM_SETPOINT),
        )
    }

    fn raw_setpoint(&self, code: &str) -> Decimal {
        self.decimal_or(&thermostat_key(code, SETPOINT), DEFAULT_SETPOINT)
    }

    /// The stored setpoint already includes the active setback. The setback in
    /// turn depends on the displayed target, so decode once without it to find
    /// the setback, then again with it removed.
    pub fn target_temperature(&self, code: &str) -> Decimal {
        let raw = self.raw_setpoint(code);
        let provisional = Self::raw_to_display_celsius(raw);
        let setback = self.active_setback(code, provisional);
        Self::raw_to_display_celsius(raw - setback)
    }

    /// Encode `celsius` (plus the setback active for it) into the setpoint
    /// variable. Returns the raw value written.
    pub fn set_target_temperature(&mut self, code: &str, celsius: Decimal) -> Decimal {
        let setback = self.active_setback(code, celsius);
        let raw = (celsius * dec!(18) + setback + FREEZING_RAW)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .normalize();
        self.set(thermostat_key(code, SETPOINT), raw.to_string());
        raw
    }

    /// Offset in tenths of °F the controller applies on top of the comfort
    /// setpoint. Targets sitting exactly on a limit are never offset.
    pub fn active_setback(&self, code: &str, target_celsius: Decimal) -> Decimal {
        if target_celsius == self.min_limit(code) || target_celsius == self.max_limit(code) {
            return Decimal::ZERO;
        }

        let cooling = self.is_cooling_enabled();

        let cool_setback = if cooling {
            -self.decimal_or(HEAT_COOL_OFFSET_KEY, Decimal::ZERO)
        } else {
            Decimal::ZERO
        };

        let eco_setback = if self.is_eco_enabled(code) || self.is_away_enabled() {
            let offset = self.decimal_or(&thermostat_key(code, ECO_OFFSET), Decimal::ZERO);
            if cooling { -offset } else { offset }
        } else {
            Decimal::ZERO
        };

        cool_setback + eco_setback
    }

    // -- state --

    /// "On" means working towards the target rather than coasting at the limit.
    pub fn is_on(&self, code: &str) -> bool {
        let current = self.current_temperature(code);
        if self.is_cooling_enabled() {
            current < self.max_limit(code)
        } else {
            current > self.min_limit(code)
        }
    }

    pub fn is_active(&self, code: &str) -> bool {
        self.flag(&thermostat_key(code, ACTUATOR))
    }

    pub fn is_eco_enabled(&self, code: &str) -> bool {
        if self.get(&thermostat_key(code, ECO_OFFSET)) == Some("0") {
            return false;
        }
        self.flag(&thermostat_key(code, COMFORT_ECO_MODE)) || self.flag(TEMPORARY_ECO_KEY)
    }

    pub fn is_cooling_enabled(&self) -> bool {
        self.flag(HEAT_COOL_MODE_KEY)
    }

    pub fn set_cooling_mode(&mut self, enabled: bool) -> bool {
        self.set(HEAT_COOL_MODE_KEY.to_string(), flag_value(enabled));
        enabled
    }

    pub fn is_away_enabled(&self) -> bool {
        self.flag(FORCED_ECO_MODE_KEY)
    }

    pub fn set_away_mode(&mut self, enabled: bool) -> bool {
        self.set(FORCED_ECO_MODE_KEY.to_string(), flag_value(enabled));
        enabled
    }

    // -- write payloads --

    fn payload_for(&self, key: String) -> SetPayload {
        let value = self.get(&key).unwrap_or_default().to_string();
        SetPayload::single(key, value)
    }

    pub fn to_set_target_temperature_payload(&self, code: &str) -> SetPayload {
        self.payload_for(thermostat_key(code, SETPOINT))
    }

    pub fn to_set_cooling_mode_payload(&self) -> SetPayload {
        self.payload_for(HEAT_COOL_MODE_KEY.to_string())
    }

    pub fn to_set_away_mode_payload(&self) -> SetPayload {
        self.payload_for(FORCED_ECO_MODE_KEY.to_string())
    }

    /// Variables that differ between `self` (old) and `other` (new), by name.
    pub fn diff(&self, other: &Variables) -> Vec<VarChange> {
        let mut changes: Vec<VarChange> = other
            .data
            .iter()
            .filter(|(k, v)| self.data.get(*k) != Some(*v))
            .map(|(k, v)| VarChange {
                name: k.clone(),
                old: self.data.get(k).cloned(),
                new: Some(v.clone()),
            })
            .collect();

        changes.extend(
            self.data
                .iter()
                .filter(|(k, _)| !other.data.contains_key(*k))
                .map(|(k, v)| VarChange {
                    name: k.clone(),
                    old: Some(v.clone()),
                    new: None,
                }),
        );

        changes.sort_by(|a, b| a.name.cmp(&b.name));
        changes
    }
}

fn flag_value(enabled: bool) -> String {
    if enabled { "1" } else { "0" }.to_string()
}
