use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;

use crate::database::models::order::BLU_FACILITA;

/// Monday-to-Sunday window, `weeks_back` weeks before the week containing `today`.
pub fn week_window(today: NaiveDate, weeks_back: u32) -> (NaiveDate, NaiveDate) {
    let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
    let start = monday - Duration::weeks(weeks_back as i64);
    (start, start + Duration::days(6))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySummary {
    pub week_offset: u32,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub products_arrived: u32,
    pub products_arrived_value: f64,
    pub products_delivered: u32,
    pub products_delivered_value: f64,
    pub new_blu_facilita_contracts: u32,
    pub total_blu_facilita_financed: f64,
}

/// Single pass over API-shaped orders (camelCase keys).
pub fn summarize_week(orders: &[Value], week_offset: u32, start: NaiveDate, end: NaiveDate) -> WeeklySummary {
    let in_window = |day: Option<NaiveDate>| day.map_or(false, |d| d >= start && d <= end);

    let mut arrived = 0;
    let mut arrived_value = Decimal::ZERO;
    let mut delivered = 0;
    let mut delivered_value = Decimal::ZERO;
    let mut contracts = 0;
    let mut financed = Decimal::ZERO;

    for order in orders {
        if in_window(date_of(&order["arrivalDate"])) {
            arrived += 1;
            arrived_value += money(&order["purchasePrice"]);
        }

        if in_window(last_dispatch_date(&order["trackingHistory"])) {
            delivered += 1;
            delivered_value += money(&order["sellingPrice"]);
        }

        if order["paymentMethod"].as_str() == Some(BLU_FACILITA) && in_window(date_of(&order["orderDate"])) {
            contracts += 1;
            financed += money(&order["financedAmount"]);
        }
    }

    WeeklySummary {
        week_offset,
        week_start: start,
        week_end: end,
        products_arrived: arrived,
        products_arrived_value: arrived_value.to_f64().unwrap_or_default(),
        products_delivered: delivered,
        products_delivered_value: delivered_value.to_f64().unwrap_or_default(),
        new_blu_facilita_contracts: contracts,
        total_blu_facilita_financed: financed.to_f64().unwrap_or_default(),
    }
}

/// Date of the most recent tracking entry whose status is delivered or shipped.
fn last_dispatch_date(history: &Value) -> Option<NaiveDate> {
    history
        .as_array()?
        .iter()
        .filter(|entry| {
            entry["status"]
                .as_str()
                .map(|s| s.eq_ignore_ascii_case("delivered") || s.eq_ignore_ascii_case("shipped"))
                .unwrap_or(false)
        })
        .filter_map(|entry| date_of(&entry["date"]).or_else(|| date_of(&entry["timestamp"])))
        .max()
}

fn date_of(value: &Value) -> Option<NaiveDate> {
    let text = value.as_str()?.trim();
    NaiveDate::parse_from_str(text.get(..10).unwrap_or(text), "%Y-%m-%d").ok()
}

fn money(value: &Value) -> Decimal {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).unwrap_or(Decimal::ZERO),
        Value::String(s) => Decimal::from_str(s.trim()).unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    }
}
