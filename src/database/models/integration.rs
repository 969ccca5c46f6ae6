use super::FieldKind::{Boolean, JsonObject, Text, Timestamp};
use super::{Field, ResourceSpec, Scope};

pub static INTEGRATIONS: ResourceSpec = ResourceSpec {
    name: "Integration",
    table: "integrations",
    scope: Scope::Organization,
    order_by: "\"name\" ASC",
    search_columns: &["name", "provider"],
    filters: &["provider", "isActive"],
    fields: &[
        Field::new("name", "name", Text).required(),
        Field::new("provider", "provider", Text).required(),
        Field::new("apiKey", "api_key", Text),
        Field::new("isActive", "is_active", Boolean),
        Field::new("settings", "settings", JsonObject),
        Field::new("lastSyncAt", "last_sync_at", Timestamp),
    ],
    has_updated_at: true,
};
