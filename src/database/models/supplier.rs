use super::FieldKind::Text;
use super::{Field, ResourceSpec, Scope};

pub static SUPPLIERS: ResourceSpec = ResourceSpec {
    name: "Supplier",
    table: "suppliers",
    scope: Scope::Organization,
    order_by: "\"name\" ASC",
    search_columns: &["name"],
    filters: &[],
    fields: &[
        Field::new("name", "name", Text).required(),
        Field::new("contactPerson", "contact_person", Text),
        Field::new("cnpj", "cnpj", Text),
        Field::new("email", "email", Text),
        Field::new("phone", "phone", Text),
        Field::new("address", "address", Text),
        Field::new("notes", "notes", Text),
    ],
    has_updated_at: true,
};
