use rust_decimal_macros::dec;
use uponor_smatrix::{is_value_in_bounds, DisplayUnit, JnapVar, Variables};

fn vars(pairs: &[(&str, &str)]) -> Variables {
    Variables::from_response(pairs.iter().map(|(k, v)| JnapVar::new(*k, *v)))
}

#[test]
fn fahrenheit_from_celsius() {
    let f = DisplayUnit::Fahrenheit;
    assert_eq!(f.from_celsius(dec!(20)), dec!(68));
    assert_eq!(f.from_celsius(dec!(0)), dec!(32));
    assert_eq!(f.from_celsius(dec!(35)), dec!(95));
    assert_eq!(f.from_celsius(dec!(-40)), dec!(-40));
    assert_eq!(f.from_celsius(dec!(22)), dec!(71.6));
}

#[test]
fn fahrenheit_to_celsius() {
    let f = DisplayUnit::Fahrenheit;
    assert_eq!(f.to_celsius(dec!(71.6)), dec!(22));
    assert_eq!(f.to_celsius(dec!(32)), dec!(0));
    assert_eq!(f.to_celsius(dec!(95)), dec!(35));
}

#[test]
fn celsius_is_identity() {
    let c = DisplayUnit::Celsius;
    assert_eq!(c.from_celsius(dec!(21.5)), dec!(21.5));
    assert_eq!(c.to_celsius(dec!(21.5)), dec!(21.5));
}

#[test]
fn display_symbol() {
    assert_eq!(DisplayUnit::Celsius.to_string(), "\u{00b0}C");
    assert_eq!(DisplayUnit::Fahrenheit.to_string(), "\u{00b0}F");
}

#[test]
fn room_temperature_is_exact() {
    let v = vars(&[("C1_T1_room_temperature", "700")]);
    assert_eq!(v.current_temperature("C1_T1").round_dp(2), dec!(21.11));
}

#[test]
fn target_floors_to_a_tenth() {
    let v = vars(&[("C1_T1_setpoint", "700")]);
    assert_eq!(v.target_temperature("C1_T1"), dec!(21.1));
}

#[test]
fn setpoint_rounds_to_whole_tenths_of_fahrenheit() {
    let mut v = Variables::empty();
    assert_eq!(v.set_target_temperature("C1_T1", dec!(21.55)), dec!(708));
    assert_eq!(v.get("C1_T1_setpoint"), Some("708"));
    assert_eq!(v.target_temperature("C1_T1"), dec!(21.5));
}

#[test]
fn eco_setback_is_hidden_from_target() {
    let mut v = vars(&[
        ("C1_T1_eco_offset", "36"),
        ("C1_T1_stat_cb_comfort_eco_mode", "1"),
    ]);
    assert_eq!(v.set_target_temperature("C1_T1", dec!(20)), dec!(716));
    assert_eq!(v.target_temperature("C1_T1"), dec!(20));
}

#[test]
fn cooling_offset_is_hidden_from_target() {
    let mut v = vars(&[("sys_heat_cool_mode", "1"), ("sys_heat_cool_offset", "20")]);
    assert_eq!(v.set_target_temperature("C1_T1", dec!(24)), dec!(732));
    assert_eq!(v.target_temperature("C1_T1"), dec!(24));
}

#[test]
fn limits_are_never_offset() {
    let mut v = vars(&[
        ("C1_T1_eco_offset", "36"),
        ("C1_T1_stat_cb_comfort_eco_mode", "1"),
    ]);
    assert_eq!(v.set_target_temperature("C1_T1", dec!(30)), dec!(860));
    assert_eq!(v.set_target_temperature("C1_T1", dec!(5)), dec!(410));
}

#[test]
fn bounds_check() {
    let v = Variables::empty();
    let (lo, hi) = (v.min_limit("C1_T1"), v.max_limit("C1_T1"));
    assert!(is_value_in_bounds(Some(dec!(21)), Some(lo), Some(hi)));
    assert!(is_value_in_bounds(Some(dec!(30)), Some(lo), Some(hi)));
    assert!(!is_value_in_bounds(Some(dec!(4.9)), Some(lo), Some(hi)));
    assert!(!is_value_in_bounds(Some(dec!(21)), None, Some(hi)));
}
