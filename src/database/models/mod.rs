//! Static descriptions of every tenant-scoped resource.
//!
//! A [`ResourceSpec`] tells the generic repository and the record shaper which
//! table backs a resource, which key scopes it to the caller, and how each API
//! field (camelCase) maps onto a column and a value kind.

pub mod client;
pub mod finance;
pub mod historical_price;
pub mod integration;
pub mod ledger;
pub mod order;
pub mod organization;
pub mod pricing;
pub mod saas;
pub mod supplier;
pub mod user;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Integer,
    Boolean,
    Date,
    Timestamp,
    JsonArray,
    JsonObject,
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub api: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Organization-scoped table whose `id` this column points at.
    pub references: Option<&'static str>,
}

impl Field {
    pub const fn new(api: &'static str, column: &'static str, kind: FieldKind) -> Self {
        Self {
            api,
            column,
            kind,
            required: false,
            references: None,
        }
    }

    pub const fn required(self) -> Self {
        Field { required: true, ..self }
    }

    pub const fn references(self, table: &'static str) -> Self {
        Field {
            references: Some(table),
            ..self
        }
    }
}

/// Which principal attribute a resource's rows are keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Organization,
    /// Rows keyed by the creating user; they still record the organization.
    User,
    /// Platform-level rows, guarded by role instead of tenant.
    Global,
}

#[derive(Debug)]
pub struct ResourceSpec {
    /// Human label used in error messages
    pub name: &'static str,
    pub table: &'static str,
    pub scope: Scope,
    pub order_by: &'static str,
    pub search_columns: &'static [&'static str],
    /// API field names accepted as equality filters on list
    pub filters: &'static [&'static str],
    pub fields: &'static [Field],
    pub has_updated_at: bool,
}

impl ResourceSpec {
    pub fn field(&self, api: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.api == api)
    }

    pub fn field_by_column(&self, column: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.column == column)
    }
}
