use super::FieldKind::{Boolean, Number, Text, Timestamp};
use super::{Field, ResourceSpec, Scope};

pub static CATEGORIES: ResourceSpec = ResourceSpec {
    name: "Category",
    table: "pricing_categories",
    scope: Scope::Organization,
    order_by: "\"name\" ASC",
    search_columns: &["name"],
    filters: &[],
    fields: &[
        Field::new("name", "name", Text).required(),
        Field::new("description", "description", Text),
        Field::new("defaultMarkup", "default_markup", Number),
    ],
    has_updated_at: true,
};

pub static PRODUCTS: ResourceSpec = ResourceSpec {
    name: "Product",
    table: "pricing_products",
    scope: Scope::Organization,
    order_by: "\"name\" ASC",
    search_columns: &["name", "model"],
    filters: &["categoryId", "isActive"],
    fields: &[
        Field::new("categoryId", "category_id", Text).references("pricing_categories"),
        Field::new("name", "name", Text).required(),
        Field::new("model", "model", Text),
        Field::new("capacity", "capacity", Text),
        Field::new("costPrice", "cost_price", Number),
        Field::new("freight", "freight", Number),
        Field::new("markup", "markup", Number),
        Field::new("listPrice", "list_price", Number),
        Field::new("isActive", "is_active", Boolean),
        Field::new("notes", "notes", Text),
    ],
    has_updated_at: true,
};

pub static PRICE_HISTORY: ResourceSpec = ResourceSpec {
    name: "Price history entry",
    table: "pricing_price_history",
    scope: Scope::Organization,
    order_by: "\"changed_at\" DESC",
    search_columns: &[],
    filters: &["productId"],
    fields: &[
        Field::new("productId", "product_id", Text),
        Field::new("oldPrice", "old_price", Number),
        Field::new("newPrice", "new_price", Number),
        Field::new("changedBy", "changed_by", Text),
        Field::new("changedAt", "changed_at", Timestamp),
    ],
    has_updated_at: false,
};

/// Per-user singleton, written by upsert.
pub static GLOBALS: ResourceSpec = ResourceSpec {
    name: "Pricing globals",
    table: "pricing_globals",
    scope: Scope::User,
    order_by: "\"user_id\" ASC",
    search_columns: &[],
    filters: &[],
    fields: &[
        Field::new("taxPercent", "tax_percent", Number),
        Field::new("defaultFreight", "default_freight", Number),
        Field::new("roundingUnit", "rounding_unit", Number),
        Field::new("defaultMarkup", "default_markup", Number),
    ],
    has_updated_at: true,
};
