use serde_json::Value;
use sqlx::PgExecutor;
use std::collections::HashMap;

use crate::database::manager::{execute_on, fetch_all_on, fetch_one_on, DatabaseError, JsonRow};
use crate::database::models::{Field, FieldKind, ResourceSpec, Scope};
use crate::database::record::{coerce_filter, RecordError};

/// The principal attribute a statement is restricted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeKey {
    Organization(String),
    User { user_id: String, organization_id: String },
    Global,
}

impl ScopeKey {
    pub fn new(scope: Scope, user_id: &str, organization_id: &str) -> Self {
        match scope {
            Scope::Organization => ScopeKey::Organization(organization_id.to_string()),
            Scope::User => ScopeKey::User {
                user_id: user_id.to_string(),
                organization_id: organization_id.to_string(),
            },
            Scope::Global => ScopeKey::Global,
        }
    }

    /// Columns written on insert so the row lands inside this scope.
    fn stamp(&self, row: &mut JsonRow) {
        match self {
            ScopeKey::Organization(org) => {
                row.insert("organization_id".to_string(), Value::String(org.clone()));
            }
            ScopeKey::User { user_id, organization_id } => {
                row.insert("user_id".to_string(), Value::String(user_id.clone()));
                row.insert("organization_id".to_string(), Value::String(organization_id.clone()));
            }
            ScopeKey::Global => {}
        }
    }

    pub fn organization_id(&self) -> Option<&str> {
        match self {
            ScopeKey::Organization(org) => Some(org),
            ScopeKey::User { organization_id, .. } => Some(organization_id),
            ScopeKey::Global => None,
        }
    }

    /// Appends the restricting predicate (if any) and its parameter.
    fn restrict(&self, qualifier: &str, conditions: &mut Vec<String>, params: &mut Vec<Value>) {
        let (column, value) = match self {
            ScopeKey::Organization(org) => ("organization_id", org),
            ScopeKey::User { user_id, .. } => ("user_id", user_id),
            ScopeKey::Global => return,
        };
        params.push(Value::String(value.clone()));
        conditions.push(format!("{}{} = ${}", qualifier, quote(column), params.len()));
    }
}

/// Search term plus equality filters for a list request.
#[derive(Debug, Default, Clone)]
pub struct ListQuery {
    pub search: Option<String>,
    pub filters: Vec<(&'static Field, Value)>,
}

impl ListQuery {
    /// Builds a query from raw query-string parameters; parameters the resource
    /// does not declare as filters are ignored.
    pub fn from_params(spec: &'static ResourceSpec, params: &HashMap<String, String>) -> Result<Self, RecordError> {
        let search = params
            .get("search")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let mut filters = Vec::new();
        for name in spec.filters {
            let Some(raw) = params.get(*name).filter(|v| !v.is_empty()) else {
                continue;
            };
            if let Some(field) = spec.field(name) {
                filters.push((field, coerce_filter(field.api, field.kind, raw)?));
            }
        }

        Ok(Self { search, filters })
    }

    pub fn with_filter(mut self, field: &'static Field, value: Value) -> Self {
        self.filters.push((field, value));
        self
    }
}

/// Scoped SQL for one resource. Every method takes its executor so the same
/// statement can run against the pool or inside a transaction.
#[derive(Debug, Clone, Copy)]
pub struct Repository {
    spec: &'static ResourceSpec,
}

impl Repository {
    pub const fn new(spec: &'static ResourceSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &'static ResourceSpec {
        self.spec
    }

    pub async fn select_any<'e, E>(&self, executor: E, scope: &ScopeKey, query: &ListQuery) -> Result<Vec<JsonRow>, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let (sql, params) = self.list_sql(scope, query);
        fetch_all_on(executor, &sql, &params).await
    }

    pub async fn select_one<'e, E>(&self, executor: E, scope: &ScopeKey, id: &str) -> Result<Option<JsonRow>, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let (sql, params) = self.find_sql(scope, id);
        fetch_one_on(executor, &sql, &params).await
    }

    /// `select_one` that also row-locks the match until the surrounding
    /// transaction ends. Only meaningful inside a transaction.
    pub async fn select_one_for_update<'e, E>(
        &self,
        executor: E,
        scope: &ScopeKey,
        id: &str,
    ) -> Result<Option<JsonRow>, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let (sql, params) = self.lock_sql(scope, id);
        fetch_one_on(executor, &sql, &params).await
    }

    pub async fn select_404<'e, E>(&self, executor: E, scope: &ScopeKey, id: &str) -> Result<JsonRow, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        self.select_one(executor, scope, id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} not found", self.spec.name)))
    }

    /// Inserts a shaped row (which must carry its `id`) and returns that id.
    pub async fn insert<'e, E>(&self, executor: E, scope: &ScopeKey, mut row: JsonRow) -> Result<String, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        scope.stamp(&mut row);
        let id = row
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| DatabaseError::QueryError("insert without id".to_string()))?;
        let (sql, params) = self.insert_sql(row);
        execute_on(executor, &sql, &params).await?;
        Ok(id)
    }

    /// Fails with the first reference column in `row` whose target is not a
    /// row of the caller's organization. Run it before `insert` or `update`.
    pub async fn check_references<'e, E>(&self, executor: E, scope: &ScopeKey, row: &JsonRow) -> Result<(), DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let Some((sql, params)) = self.references_sql(scope, row) else {
            return Ok(());
        };
        let missing = fetch_all_on(executor, &sql, &params).await?;
        let field = missing
            .first()
            .and_then(|r| r.get("field"))
            .and_then(Value::as_str)
            .and_then(|api| self.spec.fields.iter().find(|f| f.api == api));
        match field {
            Some(field) => Err(DatabaseError::InvalidReference(field.api)),
            None => Ok(()),
        }
    }

    /// Writes only the supplied columns. Zero affected rows means the scoped row does not exist.
    pub async fn update<'e, E>(&self, executor: E, scope: &ScopeKey, id: &str, row: JsonRow) -> Result<(), DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let (sql, params) = self.update_sql(scope, id, row);
        match execute_on(executor, &sql, &params).await? {
            0 => Err(DatabaseError::NotFound(format!("{} not found", self.spec.name))),
            _ => Ok(()),
        }
    }

    pub async fn delete<'e, E>(&self, executor: E, scope: &ScopeKey, id: &str) -> Result<u64, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let (sql, params) = self.delete_sql(scope, id);
        execute_on(executor, &sql, &params).await
    }

    /// Insert-or-update keyed by the owning user; for per-user singletons.
    pub async fn upsert_for_user<'e, E>(&self, executor: E, scope: &ScopeKey, mut row: JsonRow) -> Result<(), DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        scope.stamp(&mut row);
        if !row.contains_key("user_id") {
            return Err(DatabaseError::QueryError(format!("{} requires a user scope", self.spec.table)));
        }
        let (sql, params) = self.upsert_sql(row);
        execute_on(executor, &sql, &params).await?;
        Ok(())
    }

    /// One existence check per non-null reference column, each yielding its API name when
    /// the target is missing from the organization. `None` when nothing to check.
    pub fn references_sql(&self, scope: &ScopeKey, row: &JsonRow) -> Option<(String, Vec<Value>)> {
        let organization_id = scope.organization_id()?;
        let mut params = vec![Value::String(organization_id.to_string())];
        let mut checks = Vec::new();

        for field in self.spec.fields {
            let Some(table) = field.references else {
                continue;
            };
            let Some(target) = row.get(field.column).filter(|v| !v.is_null()) else {
                continue;
            };
            params.push(target.clone());
            checks.push(format!(
                "SELECT '{api}' AS \"field\" WHERE NOT EXISTS \
                 (SELECT 1 FROM {table} WHERE \"id\" = ${n} AND \"organization_id\" = $1)",
                api = field.api,
                table = quote(table),
                n = params.len(),
            ));
        }

        if checks.is_empty() {
            None
        } else {
            Some((checks.join(" UNION ALL "), params))
        }
    }

    pub fn list_sql(&self, scope: &ScopeKey, query: &ListQuery) -> (String, Vec<Value>) {
        let mut conditions = Vec::new();
        let mut params = Vec::new();
        scope.restrict("", &mut conditions, &mut params);

        for (field, value) in &query.filters {
            params.push(value.clone());
            conditions.push(format!("{} = ${}{}", quote(field.column), params.len(), cast_for(field.kind)));
        }

        if let Some(term) = &query.search {
            if !self.spec.search_columns.is_empty() {
                params.push(Value::String(format!("%{}%", escape_like(term))));
                let n = params.len();
                let any = self
                    .spec
                    .search_columns
                    .iter()
                    .map(|c| format!("{} ILIKE ${}", quote(c), n))
                    .collect::<Vec<_>>()
                    .join(" OR ");
                conditions.push(format!("({})", any));
            }
        }

        let mut sql = format!("SELECT * FROM {}", quote(self.spec.table));
        push_where(&mut sql, &conditions);
        sql.push_str(" ORDER BY ");
        sql.push_str(self.spec.order_by);
        (sql, params)
    }

    pub fn find_sql(&self, scope: &ScopeKey, id: &str) -> (String, Vec<Value>) {
        let mut params = vec![Value::String(id.to_string())];
        let mut conditions = vec!["\"id\" = $1".to_string()];
        scope.restrict("", &mut conditions, &mut params);

        let mut sql = format!("SELECT * FROM {}", quote(self.spec.table));
        push_where(&mut sql, &conditions);
        (sql, params)
    }

    pub fn lock_sql(&self, scope: &ScopeKey, id: &str) -> (String, Vec<Value>) {
        let (mut sql, params) = self.find_sql(scope, id);
        sql.push_str(" FOR UPDATE");
        (sql, params)
    }

    pub fn insert_sql(&self, row: JsonRow) -> (String, Vec<Value>) {
        let columns = row.keys().map(|c| quote(c)).collect::<Vec<_>>().join(", ");
        let sql = format!(
            "INSERT INTO {table} ({columns}) SELECT {columns} FROM jsonb_populate_record(NULL::{table}, $1)",
            table = quote(self.spec.table),
            columns = columns,
        );
        (sql, vec![Value::Object(row)])
    }

    pub fn update_sql(&self, scope: &ScopeKey, id: &str, row: JsonRow) -> (String, Vec<Value>) {
        let table = quote(self.spec.table);
        let qualifier = format!("{}.", table);

        let mut assignments: Vec<String> = row
            .keys()
            .filter(|c| c.as_str() != "id")
            .map(|c| format!("{} = r.{}", quote(c), quote(c)))
            .collect();
        let has_values = !assignments.is_empty();
        if self.spec.has_updated_at {
            assignments.push("\"updated_at\" = now()".to_string());
        }
        if assignments.is_empty() {
            assignments.push("\"id\" = \"id\"".to_string());
        }

        let mut params = Vec::new();
        let mut sql = format!("UPDATE {} SET {}", table, assignments.join(", "));
        if has_values {
            params.push(Value::Object(row));
            sql.push_str(&format!(" FROM jsonb_populate_record(NULL::{}, $1) AS r", table));
        }

        params.push(Value::String(id.to_string()));
        let mut conditions = vec![format!("{}\"id\" = ${}", qualifier, params.len())];
        scope.restrict(&qualifier, &mut conditions, &mut params);
        push_where(&mut sql, &conditions);
        (sql, params)
    }

    pub fn delete_sql(&self, scope: &ScopeKey, id: &str) -> (String, Vec<Value>) {
        let mut params = vec![Value::String(id.to_string())];
        let mut conditions = vec!["\"id\" = $1".to_string()];
        scope.restrict("", &mut conditions, &mut params);

        let mut sql = format!("DELETE FROM {}", quote(self.spec.table));
        push_where(&mut sql, &conditions);
        (sql, params)
    }

    pub fn upsert_sql(&self, row: JsonRow) -> (String, Vec<Value>) {
        let table = quote(self.spec.table);
        let columns = row.keys().map(|c| quote(c)).collect::<Vec<_>>().join(", ");
        let mut updates: Vec<String> = row
            .keys()
            .filter(|c| c.as_str() != "user_id")
            .map(|c| format!("{} = EXCLUDED.{}", quote(c), quote(c)))
            .collect();
        if self.spec.has_updated_at {
            updates.push("\"updated_at\" = now()".to_string());
        }
        let on_conflict = if updates.is_empty() {
            "DO NOTHING".to_string()
        } else {
            format!("DO UPDATE SET {}", updates.join(", "))
        };

        let sql = format!(
            "INSERT INTO {table} ({columns}) SELECT {columns} FROM jsonb_populate_record(NULL::{table}, $1) \
             ON CONFLICT (\"user_id\") {on_conflict}",
            table = table,
            columns = columns,
            on_conflict = on_conflict,
        );
        (sql, vec![Value::Object(row)])
    }
}

fn push_where(sql: &mut String, conditions: &[String]) {
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
}

/// Identifiers only ever come from static resource descriptions.
fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn cast_for(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Date => "::date",
        FieldKind::Timestamp => "::timestamptz",
        _ => "",
    }
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{client::CLIENTS, finance::CLIENT_PAYMENTS, order::ORDERS, pricing::GLOBALS, saas::PLANS};
    use serde_json::json;

    fn org() -> ScopeKey {
        ScopeKey::Organization("org-1".to_string())
    }

    #[test]
    fn list_restricts_to_organization_and_orders_naturally() {
        let (sql, params) = Repository::new(&CLIENTS).list_sql(&org(), &ListQuery::default());
        assert_eq!(sql, "SELECT * FROM \"clients\" WHERE \"organization_id\" = $1 ORDER BY \"name\" ASC");
        assert_eq!(params, vec![json!("org-1")]);
    }

    #[test]
    fn list_combines_filters_and_escaped_search() {
        let mut raw = HashMap::new();
        raw.insert("search".to_string(), "50%_off".to_string());
        raw.insert("isDefaulter".to_string(), "1".to_string());
        raw.insert("unknown".to_string(), "ignored".to_string());
        let query = ListQuery::from_params(&CLIENTS, &raw).unwrap();

        let (sql, params) = Repository::new(&CLIENTS).list_sql(&org(), &query);
        assert_eq!(
            sql,
            "SELECT * FROM \"clients\" WHERE \"organization_id\" = $1 AND \"is_defaulter\" = $2 \
             AND (\"name\" ILIKE $3 OR \"cpf_cnpj\" ILIKE $3) ORDER BY \"name\" ASC"
        );
        assert_eq!(params, vec![json!("org-1"), json!(true), json!("%50\\%\\_off%")]);
    }

    #[test]
    fn user_scope_filters_by_user_but_stamps_both_keys() {
        let scope = ScopeKey::new(Scope::User, "u-1", "org-1");
        let (sql, _) = Repository::new(&CLIENT_PAYMENTS).find_sql(&scope, "p-1");
        assert_eq!(sql, "SELECT * FROM \"client_payments\" WHERE \"id\" = $1 AND \"user_id\" = $2");

        let mut row = JsonRow::new();
        scope.stamp(&mut row);
        assert_eq!(row["user_id"], "u-1");
        assert_eq!(row["organization_id"], "org-1");
    }

    #[test]
    fn global_scope_adds_no_predicate() {
        let (sql, params) = Repository::new(&PLANS).delete_sql(&ScopeKey::Global, "plan-1");
        assert_eq!(sql, "DELETE FROM \"saas_plans\" WHERE \"id\" = $1");
        assert_eq!(params, vec![json!("plan-1")]);
    }

    #[test]
    fn locking_read_is_the_scoped_find_plus_row_lock() {
        let (sql, params) = Repository::new(&CLIENTS).lock_sql(&org(), "c-1");
        assert_eq!(
            sql,
            "SELECT * FROM \"clients\" WHERE \"id\" = $1 AND \"organization_id\" = $2 FOR UPDATE"
        );
        assert_eq!(params, vec![json!("c-1"), json!("org-1")]);
    }

    #[test]
    fn insert_populates_from_single_jsonb_parameter() {
        let mut row = JsonRow::new();
        row.insert("id".into(), json!("c-1"));
        row.insert("name".into(), json!("Ana"));

        let (sql, params) = Repository::new(&CLIENTS).insert_sql(row);
        assert_eq!(
            sql,
            "INSERT INTO \"clients\" (\"id\", \"name\") SELECT \"id\", \"name\" \
             FROM jsonb_populate_record(NULL::\"clients\", $1)"
        );
        assert_eq!(params.len(), 1);
        assert_eq!(params[0]["name"], "Ana");
    }

    #[test]
    fn references_are_checked_within_the_callers_organization() {
        let mut row = JsonRow::new();
        row.insert("client_id".into(), json!("c-9"));
        row.insert("supplier_id".into(), json!("s-9"));
        row.insert("product_name".into(), json!("iPhone"));

        let (sql, params) = Repository::new(&ORDERS).references_sql(&org(), &row).unwrap();
        assert_eq!(
            sql,
            "SELECT 'clientId' AS \"field\" WHERE NOT EXISTS \
             (SELECT 1 FROM \"clients\" WHERE \"id\" = $2 AND \"organization_id\" = $1) \
             UNION ALL SELECT 'supplierId' AS \"field\" WHERE NOT EXISTS \
             (SELECT 1 FROM \"suppliers\" WHERE \"id\" = $3 AND \"organization_id\" = $1)"
        );
        assert_eq!(params, vec![json!("org-1"), json!("c-9"), json!("s-9")]);
    }

    #[test]
    fn cleared_or_absent_references_need_no_check() {
        let mut row = JsonRow::new();
        row.insert("client_id".into(), Value::Null);
        assert!(Repository::new(&ORDERS).references_sql(&org(), &row).is_none());
        assert!(Repository::new(&CLIENTS).references_sql(&org(), &JsonRow::new()).is_none());

        let mut payment = JsonRow::new();
        payment.insert("order_id".into(), json!("o-1"));
        let scope = ScopeKey::new(Scope::User, "u-1", "org-1");
        let (_, params) = Repository::new(&CLIENT_PAYMENTS).references_sql(&scope, &payment).unwrap();
        assert_eq!(params, vec![json!("org-1"), json!("o-1")]);
    }

    #[test]
    fn update_touches_only_supplied_columns() {
        let mut row = JsonRow::new();
        row.insert("phone".into(), json!("123"));

        let (sql, params) = Repository::new(&CLIENTS).update_sql(&org(), "c-1", row);
        assert_eq!(
            sql,
            "UPDATE \"clients\" SET \"phone\" = r.\"phone\", \"updated_at\" = now() \
             FROM jsonb_populate_record(NULL::\"clients\", $1) AS r \
             WHERE \"clients\".\"id\" = $2 AND \"clients\".\"organization_id\" = $3"
        );
        assert_eq!(params[1], json!("c-1"));
        assert_eq!(params[2], json!("org-1"));
    }

    #[test]
    fn empty_update_still_matches_the_row() {
        let (sql, params) = Repository::new(&CLIENTS).update_sql(&org(), "c-1", JsonRow::new());
        assert_eq!(
            sql,
            "UPDATE \"clients\" SET \"updated_at\" = now() \
             WHERE \"clients\".\"id\" = $1 AND \"clients\".\"organization_id\" = $2"
        );
        assert_eq!(params, vec![json!("c-1"), json!("org-1")]);
    }

    #[test]
    fn upsert_conflicts_on_owner() {
        let mut row = JsonRow::new();
        row.insert("user_id".into(), json!("u-1"));
        row.insert("tax_percent".into(), json!(7));

        let (sql, _) = Repository::new(&GLOBALS).upsert_sql(row);
        assert!(sql.ends_with(
            "ON CONFLICT (\"user_id\") DO UPDATE SET \"tax_percent\" = EXCLUDED.\"tax_percent\", \"updated_at\" = now()"
        ));
    }
}
