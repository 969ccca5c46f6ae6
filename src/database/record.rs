use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};
use uuid::Uuid;

use crate::database::manager::JsonRow;
use crate::database::models::{FieldKind, ResourceSpec, Scope};

/// Whether an input body describes a new row or a partial change to an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
}

/// Errors that can occur while shaping API input into store columns
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Invalid JSON format: {0}")]
    InvalidJson(String),
    #[error("Missing required fields: {0:?}")]
    MissingRequiredFields(Vec<&'static str>),
    #[error("Invalid value for field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Translate an API body (camelCase keys) into a column-keyed object ready for
/// `jsonb_populate_record`.
///
/// Unknown keys are ignored. On create, an `id` is generated unless supplied,
/// absent JSON collections default to empty, and every required field must be
/// present and non-null. On update, only supplied fields are returned, and a
/// required field may not be cleared.
pub fn shape_input(spec: &ResourceSpec, body: &Value, operation: Operation) -> Result<JsonRow, RecordError> {
    let input = body
        .as_object()
        .ok_or_else(|| RecordError::InvalidJson("Request body must be a JSON object".to_string()))?;

    let mut row = Map::new();
    let mut missing = Vec::new();

    for field in spec.fields {
        let value = match input.get(field.api) {
            Some(raw) => Some(coerce(field.api, field.kind, raw)?),
            None if operation == Operation::Create => default_for(field.kind),
            None => None,
        };

        let blank = match operation {
            Operation::Create => value.as_ref().map_or(true, Value::is_null),
            Operation::Update => matches!(value, Some(Value::Null)),
        };
        if field.required && blank {
            missing.push(field.api);
            continue;
        }

        if let Some(value) = value {
            row.insert(field.column.to_string(), value);
        }
    }

    if !missing.is_empty() {
        return Err(RecordError::MissingRequiredFields(missing));
    }

    if operation == Operation::Create {
        let id = match input.get("id") {
            Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
            _ => Uuid::new_v4().to_string(),
        };
        row.insert("id".to_string(), Value::String(id));

        if let Some(created) = input.get("createdAt").filter(|v| !v.is_null()) {
            row.insert("created_at".to_string(), coerce("createdAt", FieldKind::Timestamp, created)?);
        }
    }

    Ok(row)
}

/// Turn a stored row into the API representation: declared fields under their
/// API names plus id, ownership keys and timestamps. Anything else is dropped.
pub fn shape_output(spec: &ResourceSpec, row: &JsonRow) -> Value {
    let mut out = Map::new();

    if let Some(id) = row.get("id") {
        out.insert("id".to_string(), id.clone());
    }

    for field in spec.fields {
        let stored = row.get(field.column).cloned().unwrap_or(Value::Null);
        out.insert(field.api.to_string(), normalize_output(field.kind, stored));
    }

    match spec.scope {
        Scope::Organization => copy_key(row, "organization_id", "organizationId", &mut out),
        Scope::User => {
            copy_key(row, "user_id", "userId", &mut out);
            copy_key(row, "organization_id", "organizationId", &mut out);
        }
        Scope::Global => {}
    }

    copy_key(row, "created_at", "createdAt", &mut out);
    if spec.has_updated_at {
        copy_key(row, "updated_at", "updatedAt", &mut out);
    }

    Value::Object(out)
}

pub fn shape_rows(spec: &ResourceSpec, rows: &[JsonRow]) -> Vec<Value> {
    rows.iter().map(|row| shape_output(spec, row)).collect()
}

/// Coerce a query-string filter value into the representation the column stores.
pub fn coerce_filter(field: &'static str, kind: FieldKind, raw: &str) -> Result<Value, RecordError> {
    coerce(field, kind, &Value::String(raw.to_string()))
}

fn copy_key(row: &JsonRow, column: &str, api: &str, out: &mut Map<String, Value>) {
    if let Some(value) = row.get(column) {
        out.insert(api.to_string(), value.clone());
    }
}

fn default_for(kind: FieldKind) -> Option<Value> {
    match kind {
        FieldKind::JsonArray => Some(Value::Array(Vec::new())),
        FieldKind::JsonObject => Some(Value::Object(Map::new())),
        _ => None,
    }
}

fn normalize_output(kind: FieldKind, stored: Value) -> Value {
    match (kind, stored) {
        (FieldKind::JsonArray, Value::Array(items)) => Value::Array(items),
        (FieldKind::JsonArray, Value::String(text)) => match serde_json::from_str(&text) {
            Ok(Value::Array(items)) => Value::Array(items),
            _ => Value::Array(Vec::new()),
        },
        (FieldKind::JsonArray, _) => Value::Array(Vec::new()),
        (FieldKind::JsonObject, Value::Object(map)) => Value::Object(map),
        (FieldKind::JsonObject, Value::String(text)) => match serde_json::from_str(&text) {
            Ok(Value::Object(map)) => Value::Object(map),
            _ => Value::Object(Map::new()),
        },
        (FieldKind::JsonObject, _) => Value::Object(Map::new()),
        (FieldKind::Boolean, Value::Number(n)) => Value::Bool(n.as_i64().unwrap_or(0) != 0),
        (_, other) => other,
    }
}

fn coerce(field: &'static str, kind: FieldKind, raw: &Value) -> Result<Value, RecordError> {
    let invalid = |reason: &str| RecordError::InvalidField { field, reason: reason.to_string() };

    // Collections are never stored as null
    if raw.is_null() {
        return Ok(default_for(kind).unwrap_or(Value::Null));
    }

    match kind {
        FieldKind::Text => Ok(match raw {
            Value::String(s) => Value::String(s.clone()),
            Value::Number(n) => Value::String(n.to_string()),
            Value::Bool(b) => Value::String(b.to_string()),
            other => Value::String(other.to_string()),
        }),

        FieldKind::Number => match raw {
            Value::Number(n) => Ok(Value::Number(n.clone())),
            Value::String(s) if s.trim().is_empty() => Ok(Value::Null),
            Value::String(s) => parse_decimal_text(s)
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| invalid("expected a number")),
            _ => Err(invalid("expected a number")),
        },

        FieldKind::Integer => match raw {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .map(|i| Value::Number(i.into()))
                .ok_or_else(|| invalid("expected an integer")),
            Value::String(s) if s.trim().is_empty() => Ok(Value::Null),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(|i| Value::Number(i.into()))
                .map_err(|_| invalid("expected an integer")),
            _ => Err(invalid("expected an integer")),
        },

        FieldKind::Boolean => match raw {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::Number(n) => Ok(Value::Bool(n.as_f64().unwrap_or(0.0) != 0.0)),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(Value::Bool(true)),
                "false" | "0" | "no" => Ok(Value::Bool(false)),
                "" => Ok(Value::Null),
                _ => Err(invalid("expected a boolean")),
            },
            _ => Err(invalid("expected a boolean")),
        },

        FieldKind::Date => match raw {
            Value::String(s) if s.trim().is_empty() => Ok(Value::Null),
            Value::String(s) => {
                let day = s.trim().get(..10).unwrap_or(s.trim());
                NaiveDate::parse_from_str(day, "%Y-%m-%d")
                    .map(|d| Value::String(d.to_string()))
                    .map_err(|_| invalid("expected a date (YYYY-MM-DD)"))
            }
            _ => Err(invalid("expected a date (YYYY-MM-DD)")),
        },

        FieldKind::Timestamp => match raw {
            Value::String(s) if s.trim().is_empty() => Ok(Value::Null),
            Value::String(s) => parse_timestamp(s.trim())
                .map(|ts| Value::String(ts.to_rfc3339_opts(SecondsFormat::Millis, true)))
                .ok_or_else(|| invalid("expected an RFC 3339 timestamp")),
            _ => Err(invalid("expected an RFC 3339 timestamp")),
        },

        FieldKind::JsonArray => match raw {
            Value::Array(items) => Ok(Value::Array(items.clone())),
            Value::String(s) if s.trim().is_empty() => Ok(Value::Array(Vec::new())),
            Value::String(s) => match serde_json::from_str(s) {
                Ok(Value::Array(items)) => Ok(Value::Array(items)),
                _ => Err(invalid("expected an array")),
            },
            _ => Err(invalid("expected an array")),
        },

        FieldKind::JsonObject => match raw {
            Value::Object(map) => Ok(Value::Object(map.clone())),
            Value::String(s) if s.trim().is_empty() => Ok(Value::Object(Map::new())),
            Value::String(s) => match serde_json::from_str(s) {
                Ok(Value::Object(map)) => Ok(Value::Object(map)),
                _ => Err(invalid("expected an object")),
            },
            _ => Err(invalid("expected an object")),
        },
    }
}

/// Accepts `1234.50` and the Brazilian `1234,50` / `1.234,50`. With both
/// separators present the comma must be the decimal point. Thousands groups
/// must hold three digits.
fn parse_decimal_text(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let normalized = match (trimmed.rfind(','), trimmed.rfind('.')) {
        (Some(comma), Some(dot)) if dot > comma => return None,
        (Some(comma), _) => {
            let (whole, fraction) = (&trimmed[..comma], &trimmed[comma + 1..]);
            if !valid_groups(whole) {
                return None;
            }
            format!("{}.{}", whole.replace('.', ""), fraction)
        }
        (None, _) => trimmed.to_string(),
    };
    normalized.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// `1234` or `1.234.567`: dots, if any, separate groups of exactly three digits.
fn valid_groups(whole: &str) -> bool {
    let digits = whole.strip_prefix('-').unwrap_or(whole);
    match digits.split_once('.') {
        None => true,
        Some((head, rest)) => {
            (1..=3).contains(&head.len()) && rest.split('.').all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit()))
        }
    }
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{client::CLIENTS, order::ORDERS, pricing::GLOBALS};
    use serde_json::json;

    #[test]
    fn create_generates_id_and_defaults_collections() {
        let row = shape_input(&ORDERS, &json!({ "productName": "iPhone 13" }), Operation::Create).unwrap();

        assert!(Uuid::parse_str(row["id"].as_str().unwrap()).is_ok());
        assert_eq!(row["product_name"], "iPhone 13");
        assert_eq!(row["tracking_history"], json!([]));
        assert_eq!(row["arrival_photos"], json!([]));
        assert!(!row.contains_key("purchase_price"));
    }

    #[test]
    fn create_keeps_caller_supplied_id() {
        let row = shape_input(&CLIENTS, &json!({ "id": "c-42", "name": "Ana" }), Operation::Create).unwrap();
        assert_eq!(row["id"], "c-42");
    }

    #[test]
    fn create_reports_every_missing_required_field() {
        let err = shape_input(&ORDERS, &json!({ "productName": null }), Operation::Create).unwrap_err();
        match err {
            RecordError::MissingRequiredFields(fields) => assert_eq!(fields, vec!["productName"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn update_only_carries_supplied_fields() {
        let row = shape_input(&CLIENTS, &json!({ "phone": "11 99999-0000" }), Operation::Update).unwrap();
        assert_eq!(row.len(), 1);
        assert_eq!(row["phone"], "11 99999-0000");
    }

    #[test]
    fn update_cannot_clear_a_required_field() {
        let err = shape_input(&CLIENTS, &json!({ "name": null, "phone": "1" }), Operation::Update).unwrap_err();
        match err {
            RecordError::MissingRequiredFields(fields) => assert_eq!(fields, vec!["name"]),
            other => panic!("unexpected error: {other}"),
        }

        let err = shape_input(&ORDERS, &json!({ "productName": "" }), Operation::Update);
        assert!(err.is_ok(), "empty text is still a value");

        let row = shape_input(&CLIENTS, &json!({ "email": null }), Operation::Update).unwrap();
        assert_eq!(row["email"], Value::Null);
    }

    #[test]
    fn brazilian_thousands_separators_are_understood() {
        let row = shape_input(
            &ORDERS,
            &json!({ "purchasePrice": "1.234,50", "sellingPrice": "1.250.000,00", "shippingCost": "-1.500,25" }),
            Operation::Update,
        )
        .unwrap();
        assert_eq!(row["purchase_price"], json!(1234.5));
        assert_eq!(row["selling_price"], json!(1250000.0));
        assert_eq!(row["shipping_cost"], json!(-1500.25));

        assert_eq!(parse_decimal_text("1234.50"), Some(1234.5));
        assert_eq!(parse_decimal_text(" 99,9 "), Some(99.9));
    }

    #[test]
    fn ambiguous_decimal_text_is_rejected() {
        for text in ["1,234.50", "12.34,5", "1.234.567", "1,2,3"] {
            assert_eq!(parse_decimal_text(text), None, "{text}");
        }
        let err = shape_input(&ORDERS, &json!({ "purchasePrice": "1,234.50" }), Operation::Update).unwrap_err();
        assert!(matches!(err, RecordError::InvalidField { field: "purchasePrice", .. }));
    }

    #[test]
    fn coerces_numbers_booleans_and_serialized_arrays() {
        let row = shape_input(
            &ORDERS,
            &json!({
                "productName": "iPad",
                "purchasePrice": "1234,50",
                "sellingPrice": "",
                "installments": "12",
                "documents": "[{\"name\":\"nf.pdf\"}]",
                "orderDate": "2024-05-06T13:00:00.000Z"
            }),
            Operation::Create,
        )
        .unwrap();

        assert_eq!(row["purchase_price"], json!(1234.5));
        assert_eq!(row["selling_price"], Value::Null);
        assert_eq!(row["installments"], json!(12));
        assert_eq!(row["documents"], json!([{ "name": "nf.pdf" }]));
        assert_eq!(row["order_date"], "2024-05-06");

        let client = shape_input(&CLIENTS, &json!({ "name": "Ana", "isDefaulter": 1 }), Operation::Create).unwrap();
        assert_eq!(client["is_defaulter"], json!(true));
    }

    #[test]
    fn rejects_malformed_values_with_field_name() {
        let err = shape_input(&ORDERS, &json!({ "productName": "x", "purchasePrice": "abc" }), Operation::Create)
            .unwrap_err();
        assert!(matches!(err, RecordError::InvalidField { field: "purchasePrice", .. }));

        let err = shape_input(&CLIENTS, &json!(["not", "an", "object"]), Operation::Create).unwrap_err();
        assert!(matches!(err, RecordError::InvalidJson(_)));
    }

    #[test]
    fn output_renames_columns_and_hides_unknown_ones() {
        let mut row = JsonRow::new();
        row.insert("id".into(), json!("o-1"));
        row.insert("organization_id".into(), json!("org-1"));
        row.insert("product_name".into(), json!("iPhone"));
        row.insert("tracking_history".into(), Value::Null);
        row.insert("documents".into(), json!("[1,2]"));
        row.insert("secret_column".into(), json!("x"));

        let out = shape_output(&ORDERS, &row);
        assert_eq!(out["id"], "o-1");
        assert_eq!(out["organizationId"], "org-1");
        assert_eq!(out["productName"], "iPhone");
        assert_eq!(out["trackingHistory"], json!([]));
        assert_eq!(out["documents"], json!([1, 2]));
        assert_eq!(out["status"], Value::Null);
        assert!(out.get("secret_column").is_none());
    }

    #[test]
    fn output_turns_stored_integers_into_booleans() {
        let mut row = JsonRow::new();
        row.insert("id".into(), json!("c-1"));
        row.insert("name".into(), json!("Ana"));
        row.insert("is_defaulter".into(), json!(0));

        let out = shape_output(&CLIENTS, &row);
        assert_eq!(out["isDefaulter"], json!(false));
    }

    #[test]
    fn user_scoped_output_exposes_owner() {
        let mut row = JsonRow::new();
        row.insert("user_id".into(), json!("u-1"));
        row.insert("organization_id".into(), json!("org-1"));
        row.insert("tax_percent".into(), json!(6.5));

        let out = shape_output(&GLOBALS, &row);
        assert_eq!(out["userId"], "u-1");
        assert_eq!(out["taxPercent"], json!(6.5));
    }

    #[test]
    fn filter_values_follow_field_kind() {
        assert_eq!(coerce_filter("isDefaulter", FieldKind::Boolean, "true").unwrap(), json!(true));
        assert_eq!(coerce_filter("status", FieldKind::Text, "pending").unwrap(), json!("pending"));
        assert!(coerce_filter("isDefaulter", FieldKind::Boolean, "maybe").is_err());
    }
}
