//! One day of charge-controller history.

use crate::error::ValidationError;
use crate::types::RawRow;
use crate::util::{non_blank, parse_date_field, parse_f64_field, parse_non_negative, parse_u32_field};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolarRecord {
    pub days_ago: u32,
    pub date: NaiveDate,
    pub yield_wh: f64,
    pub consumption_wh: f64,
    pub max_pv_power_w: f64,
    pub max_pv_voltage_v: f64,
    pub min_battery_voltage_v: f64,
    pub max_battery_voltage_v: f64,
    pub time_in_bulk_min: f64,
    pub time_in_absorption_min: f64,
    pub time_in_float_min: f64,
    /// Last four error codes, most recent first. Free-form, may be empty.
    pub errors: [String; 4],
}

impl SolarRecord {
    /// Build a record from a raw CSV row, failing on the first field that is
    /// missing, malformed or violates its constraint.
    pub fn from_raw(row: &RawRow) -> Result<Self, ValidationError> {
        let min_battery_voltage_v =
            parse_f64_field("Min. battery voltage(V)", row.min_battery_voltage_v.as_deref())?;
        let max_battery_voltage_v =
            parse_f64_field("Max. battery voltage(V)", row.max_battery_voltage_v.as_deref())?;
        if min_battery_voltage_v > max_battery_voltage_v {
            return Err(ValidationError::VoltageOrder {
                min: min_battery_voltage_v,
                max: max_battery_voltage_v,
            });
        }

        let error_code = |s: &Option<String>| non_blank(s.as_deref()).unwrap_or_default().to_string();

        Ok(SolarRecord {
            days_ago: parse_u32_field("Days ago", row.days_ago.as_deref())?,
            date: parse_date_field(row.date.as_deref())?,
            yield_wh: parse_non_negative("Yield(Wh)", row.yield_wh.as_deref())?,
            consumption_wh: parse_non_negative("Consumption(Wh)", row.consumption_wh.as_deref())?,
            max_pv_power_w: parse_f64_field("Max. PV power(W)", row.max_pv_power_w.as_deref())?,
            max_pv_voltage_v: parse_f64_field("Max. PV voltage(V)", row.max_pv_voltage_v.as_deref())?,
            min_battery_voltage_v,
            max_battery_voltage_v,
            time_in_bulk_min: parse_non_negative("Time in bulk(m)", row.time_in_bulk_min.as_deref())?,
            time_in_absorption_min: parse_non_negative(
                "Time in absorption(m)",
                row.time_in_absorption_min.as_deref(),
            )?,
            time_in_float_min: parse_non_negative("Time in float(m)", row.time_in_float_min.as_deref())?,
            errors: [
                error_code(&row.last_error),
                error_code(&row.second_last_error),
                error_code(&row.third_last_error),
                error_code(&row.fourth_last_error),
            ],
        })
    }

    /// Minutes spent actively charging (bulk + absorption).
    pub fn charging_minutes(&self) -> f64 {
        self.time_in_bulk_min + self.time_in_absorption_min
    }
}
