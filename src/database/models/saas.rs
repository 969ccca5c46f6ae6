use super::FieldKind::{Boolean, Date, Integer, JsonArray, Number, Text, Timestamp};
use super::{Field, ResourceSpec, Scope};

// Platform-level subscription metadata, managed by admins only.

pub static SAAS_CLIENTS: ResourceSpec = ResourceSpec {
    name: "SaaS client",
    table: "saas_clients",
    scope: Scope::Global,
    order_by: "\"name\" ASC",
    search_columns: &["name", "company", "email"],
    filters: &["status", "planId"],
    fields: &[
        Field::new("name", "name", Text).required(),
        Field::new("email", "email", Text),
        Field::new("company", "company", Text),
        Field::new("phone", "phone", Text),
        Field::new("planId", "plan_id", Text),
        Field::new("status", "status", Text),
        Field::new("startDate", "start_date", Date),
        Field::new("notes", "notes", Text),
    ],
    has_updated_at: true,
};

pub static PLANS: ResourceSpec = ResourceSpec {
    name: "Plan",
    table: "saas_plans",
    scope: Scope::Global,
    order_by: "\"price\" ASC",
    search_columns: &["name"],
    filters: &["isActive"],
    fields: &[
        Field::new("name", "name", Text).required(),
        Field::new("price", "price", Number).required(),
        Field::new("billingCycle", "billing_cycle", Text),
        Field::new("maxUsers", "max_users", Integer),
        Field::new("features", "features", JsonArray),
        Field::new("isActive", "is_active", Boolean),
    ],
    has_updated_at: true,
};

pub static BILLING: ResourceSpec = ResourceSpec {
    name: "Billing entry",
    table: "saas_billing",
    scope: Scope::Global,
    order_by: "\"due_date\" DESC NULLS LAST",
    search_columns: &["description"],
    filters: &["saasClientId", "status"],
    fields: &[
        Field::new("saasClientId", "saas_client_id", Text).required(),
        Field::new("amount", "amount", Number).required(),
        Field::new("description", "description", Text),
        Field::new("dueDate", "due_date", Date),
        Field::new("paidAt", "paid_at", Timestamp),
        Field::new("status", "status", Text),
    ],
    has_updated_at: true,
};
