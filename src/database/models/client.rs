use super::FieldKind::{Boolean, Date, JsonArray, Text};
use super::{Field, ResourceSpec, Scope};

/// Resale customers (not to be confused with SaaS subscribers in [`super::saas`]).
pub static CLIENTS: ResourceSpec = ResourceSpec {
    name: "Client",
    table: "clients",
    scope: Scope::Organization,
    order_by: "\"name\" ASC",
    search_columns: &["name", "cpf_cnpj"],
    filters: &["clientType", "isDefaulter"],
    fields: &[
        Field::new("name", "name", Text).required(),
        Field::new("cpfCnpj", "cpf_cnpj", Text),
        Field::new("email", "email", Text),
        Field::new("phone", "phone", Text),
        Field::new("birthDate", "birth_date", Date),
        Field::new("address", "address", Text),
        Field::new("city", "city", Text),
        Field::new("state", "state", Text),
        Field::new("zipCode", "zip_code", Text),
        Field::new("clientType", "client_type", Text),
        Field::new("isDefaulter", "is_defaulter", Boolean),
        Field::new("defaulterNotes", "defaulter_notes", Text),
        Field::new("notes", "notes", Text),
        Field::new("documents", "documents", JsonArray),
    ],
    has_updated_at: true,
};
