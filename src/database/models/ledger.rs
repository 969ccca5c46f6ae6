use super::FieldKind::{Date, JsonArray, JsonObject, Number, Text};
use super::{Field, ResourceSpec, Scope};

/// Free-form bookkeeping rows.
pub static CUSTOM_TABLE_ROWS: ResourceSpec = ResourceSpec {
    name: "Custom table row",
    table: "custom_table_rows",
    scope: Scope::Organization,
    order_by: "\"entry_date\" DESC NULLS LAST, \"created_at\" DESC",
    search_columns: &["description", "category"],
    filters: &["category", "entryType", "status"],
    fields: &[
        Field::new("entryDate", "entry_date", Date),
        Field::new("description", "description", Text).required(),
        Field::new("category", "category", Text),
        Field::new("entryType", "entry_type", Text),
        Field::new("amount", "amount", Number),
        Field::new("paymentMethod", "payment_method", Text),
        Field::new("status", "status", Text),
        Field::new("notes", "notes", Text),
        Field::new("attachments", "attachments", JsonArray),
    ],
    has_updated_at: true,
};

/// Append-only snapshots written before every update or delete of a custom row.
pub static CUSTOM_TABLE_HISTORY: ResourceSpec = ResourceSpec {
    name: "Custom table history entry",
    table: "custom_table_history",
    scope: Scope::Organization,
    order_by: "\"changed_at\" DESC",
    search_columns: &[],
    filters: &["rowId", "action"],
    fields: &[
        Field::new("rowId", "row_id", Text),
        Field::new("action", "action", Text),
        Field::new("snapshot", "snapshot", JsonObject),
        Field::new("changedBy", "changed_by", Text),
        Field::new("changedAt", "changed_at", super::FieldKind::Timestamp),
    ],
    has_updated_at: false,
};
