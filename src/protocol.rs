use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const ACTION_HEADER: &str = "x-jnap-action";
pub const GET_ATTRIBUTES: &str = "http://phyn.com/jnap/uponorsky/GetAttributes";
pub const SET_ATTRIBUTES: &str = "http://phyn.com/jnap/uponorsky/SetAttributes";

pub const RESULT_OK: &str = "OK";

pub const CONTROLLERS: std::ops::RangeInclusive<u8> = 1..=5;
pub const THERMOSTATS: std::ops::RangeInclusive<u8> = 1..=13;

pub fn endpoint(protocol: &str, host: &str) -> String {
    format!("{protocol}://{host}/JNAP/")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JnapVar {
    pub wasp_var_name: String,
    pub wasp_var_value: String,
}

impl JnapVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            wasp_var_name: name.into(),
            wasp_var_value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetOutput {
    #[serde(default)]
    pub vars: Vec<JnapVar>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetResponse {
    pub result: String,
    #[serde(default)]
    pub output: GetOutput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPayload {
    pub vars: Vec<JnapVar>,
}

impl SetPayload {
    pub fn single(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            vars: vec![JnapVar::new(name, value)],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetResponse {
    pub result: String,
}

pub fn get_attributes_body() -> Value {
    json!({})
}

// Key grammar. Thermostat addresses are `C<controller>_T<thermostat>`.

pub fn device_code(controller: u8, thermostat: u8) -> String {
    format!("C{controller}_T{thermostat}")
}

pub fn controller_presence_key(controller: u8) -> String {
    format!("sys_controller_{controller}_presence")
}

pub fn thermostat_presence_key(controller: u8, thermostat: u8) -> String {
    format!("C{controller}_thermostat_{thermostat}_presence")
}

/// `<code>_<suffix>`, e.g. `C1_T3_room_temperature`.
pub fn thermostat_key(code: &str, suffix: &str) -> String {
    format!("{code}_{suffix}")
}

/// The id variable spells the thermostat out without a separator:
/// `C1_T3` is looked up as `C1_thermostat3_id`.
pub fn id_key(code: &str) -> String {
    format!("{}_id", code.replacen('T', "thermostat", 1))
}

pub fn name_key(code: &str) -> String {
    format!("cust_{code}_name")
}

pub const MODEL_KEY: &str = "cust_SW_version_update";
pub const HEAT_COOL_MODE_KEY: &str = "sys_heat_cool_mode";
pub const HEAT_COOL_OFFSET_KEY: &str = "sys_heat_cool_offset";
pub const FORCED_ECO_MODE_KEY: &str = "sys_forced_eco_mode";
pub const TEMPORARY_ECO_KEY: &str = "cust_Temporary_ECO_Activation";

pub const ROOM_TEMPERATURE: &str = "room_temperature";
pub const SETPOINT: &str = "setpoint";
pub const MINIMUM_SETPOINT: &str = "minimum_setpoint";
pub const MAXIMUM_SETPOINT: &str = "maximum_setpoint";
pub const HUMIDITY: &str = "rh";
pub const ECO_OFFSET: &str = "eco_offset";
pub const COMFORT_ECO_MODE: &str = "stat_cb_comfort_eco_mode";
pub const ACTUATOR: &str = "stat_cb_actuator";
pub const SW_VERSION: &str = "sw_version";
