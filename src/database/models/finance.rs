use super::FieldKind::{Date, Number, Text};
use super::{Field, ResourceSpec, Scope};

// Both ledgers are keyed by the recording user rather than the organization.

pub static CLIENT_PAYMENTS: ResourceSpec = ResourceSpec {
    name: "Client payment",
    table: "client_payments",
    scope: Scope::User,
    order_by: "\"payment_date\" DESC NULLS LAST, \"created_at\" DESC",
    search_columns: &[],
    filters: &["orderId"],
    fields: &[
        Field::new("orderId", "order_id", Text).required().references("orders"),
        Field::new("amount", "amount", Number).required(),
        Field::new("paymentDate", "payment_date", Date),
        Field::new("paymentMethod", "payment_method", Text),
        Field::new("notes", "notes", Text),
    ],
    has_updated_at: false,
};

pub static ORDER_COSTS: ResourceSpec = ResourceSpec {
    name: "Order cost",
    table: "order_costs",
    scope: Scope::User,
    order_by: "\"cost_date\" DESC NULLS LAST, \"created_at\" DESC",
    search_columns: &[],
    filters: &["orderId"],
    fields: &[
        Field::new("orderId", "order_id", Text).required().references("orders"),
        Field::new("description", "description", Text).required(),
        Field::new("category", "category", Text),
        Field::new("amount", "amount", Number).required(),
        Field::new("costDate", "cost_date", Date),
    ],
    has_updated_at: false,
};
