use super::FieldKind::{Date, Number, Text};
use super::{Field, ResourceSpec, Scope};

/// Supplier quotes, append-only.
pub static HISTORICAL_PRICES: ResourceSpec = ResourceSpec {
    name: "Historical price",
    table: "historical_prices",
    scope: Scope::Organization,
    order_by: "\"date_recorded\" DESC, \"created_at\" DESC",
    search_columns: &["product_name", "model"],
    filters: &["supplierId", "condition"],
    fields: &[
        Field::new("supplierId", "supplier_id", Text).required().references("suppliers"),
        Field::new("productName", "product_name", Text).required(),
        Field::new("model", "model", Text),
        Field::new("capacity", "capacity", Text),
        Field::new("color", "color", Text),
        Field::new("condition", "condition", Text),
        Field::new("price", "price", Number).required(),
        Field::new("dateRecorded", "date_recorded", Date),
        Field::new("notes", "notes", Text),
    ],
    has_updated_at: false,
};
