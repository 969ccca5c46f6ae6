use tracing::info;

use crate::database::manager::{DatabaseError, DatabaseManager};

/// Idempotent DDL, applied in order at startup and by `blu-api migrate`.
pub const STATEMENTS: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS "organizations" (
        "id" TEXT PRIMARY KEY,
        "name" TEXT NOT NULL,
        "created_at" TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "users" (
        "id" TEXT PRIMARY KEY,
        "email" TEXT NOT NULL UNIQUE,
        "password_hash" TEXT NOT NULL,
        "name" TEXT NOT NULL,
        "role" TEXT NOT NULL DEFAULT 'user',
        "organization_id" TEXT NOT NULL REFERENCES "organizations"("id") ON DELETE CASCADE,
        "created_at" TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "clients" (
        "id" TEXT PRIMARY KEY,
        "organization_id" TEXT NOT NULL REFERENCES "organizations"("id") ON DELETE CASCADE,
        "name" TEXT NOT NULL,
        "cpf_cnpj" TEXT,
        "email" TEXT,
        "phone" TEXT,
        "birth_date" DATE,
        "address" TEXT,
        "city" TEXT,
        "state" TEXT,
        "zip_code" TEXT,
        "client_type" TEXT,
        "is_defaulter" BOOLEAN DEFAULT FALSE,
        "defaulter_notes" TEXT,
        "notes" TEXT,
        "documents" JSONB NOT NULL DEFAULT '[]',
        "created_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
        "updated_at" TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "suppliers" (
        "id" TEXT PRIMARY KEY,
        "organization_id" TEXT NOT NULL REFERENCES "organizations"("id") ON DELETE CASCADE,
        "name" TEXT NOT NULL,
        "contact_person" TEXT,
        "cnpj" TEXT,
        "email" TEXT,
        "phone" TEXT,
        "address" TEXT,
        "notes" TEXT,
        "created_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
        "updated_at" TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "orders" (
        "id" TEXT PRIMARY KEY,
        "organization_id" TEXT NOT NULL REFERENCES "organizations"("id") ON DELETE CASCADE,
        "client_id" TEXT REFERENCES "clients"("id") ON DELETE SET NULL,
        "supplier_id" TEXT REFERENCES "suppliers"("id") ON DELETE SET NULL,
        "customer_name" TEXT,
        "customer_contact" TEXT,
        "product_name" TEXT NOT NULL,
        "model" TEXT,
        "capacity" TEXT,
        "color" TEXT,
        "condition" TEXT,
        "imei" TEXT,
        "purchase_price" NUMERIC(12,2),
        "selling_price" NUMERIC(12,2),
        "shipping_cost" NUMERIC(12,2),
        "order_date" DATE,
        "estimated_delivery_date" DATE,
        "arrival_date" DATE,
        "delivery_date" DATE,
        "status" TEXT DEFAULT 'pending',
        "payment_method" TEXT,
        "down_payment" NUMERIC(12,2),
        "installments" INTEGER,
        "installment_value" NUMERIC(12,2),
        "interest_rate" NUMERIC(6,2),
        "financed_amount" NUMERIC(12,2),
        "tracking_code" TEXT,
        "tracking_history" JSONB NOT NULL DEFAULT '[]',
        "documents" JSONB NOT NULL DEFAULT '[]',
        "blu_facilita_installments" JSONB NOT NULL DEFAULT '[]',
        "internal_notes" JSONB NOT NULL DEFAULT '[]',
        "arrival_photos" JSONB NOT NULL DEFAULT '[]',
        "observations" TEXT,
        "created_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
        "updated_at" TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "historical_prices" (
        "id" TEXT PRIMARY KEY,
        "organization_id" TEXT NOT NULL REFERENCES "organizations"("id") ON DELETE CASCADE,
        "supplier_id" TEXT NOT NULL REFERENCES "suppliers"("id") ON DELETE CASCADE,
        "product_name" TEXT NOT NULL,
        "model" TEXT,
        "capacity" TEXT,
        "color" TEXT,
        "condition" TEXT,
        "price" NUMERIC(12,2) NOT NULL,
        "date_recorded" DATE DEFAULT CURRENT_DATE,
        "notes" TEXT,
        "created_at" TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "client_payments" (
        "id" TEXT PRIMARY KEY,
        "order_id" TEXT NOT NULL REFERENCES "orders"("id") ON DELETE CASCADE,
        "user_id" TEXT NOT NULL REFERENCES "users"("id") ON DELETE CASCADE,
        "organization_id" TEXT NOT NULL REFERENCES "organizations"("id") ON DELETE CASCADE,
        "amount" NUMERIC(12,2) NOT NULL,
        "payment_date" DATE,
        "payment_method" TEXT,
        "notes" TEXT,
        "created_at" TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "order_costs" (
        "id" TEXT PRIMARY KEY,
        "order_id" TEXT NOT NULL REFERENCES "orders"("id") ON DELETE CASCADE,
        "user_id" TEXT NOT NULL REFERENCES "users"("id") ON DELETE CASCADE,
        "organization_id" TEXT NOT NULL REFERENCES "organizations"("id") ON DELETE CASCADE,
        "description" TEXT NOT NULL,
        "category" TEXT,
        "amount" NUMERIC(12,2) NOT NULL,
        "cost_date" DATE,
        "created_at" TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "custom_table_rows" (
        "id" TEXT PRIMARY KEY,
        "organization_id" TEXT NOT NULL REFERENCES "organizations"("id") ON DELETE CASCADE,
        "entry_date" DATE,
        "description" TEXT NOT NULL,
        "category" TEXT,
        "entry_type" TEXT,
        "amount" NUMERIC(12,2),
        "payment_method" TEXT,
        "status" TEXT,
        "notes" TEXT,
        "attachments" JSONB NOT NULL DEFAULT '[]',
        "created_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
        "updated_at" TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    // No foreign key to custom_table_rows: history outlives deleted rows.
    r#"CREATE TABLE IF NOT EXISTS "custom_table_history" (
        "id" TEXT PRIMARY KEY,
        "organization_id" TEXT NOT NULL REFERENCES "organizations"("id") ON DELETE CASCADE,
        "row_id" TEXT NOT NULL,
        "action" TEXT NOT NULL,
        "snapshot" JSONB NOT NULL,
        "changed_by" TEXT,
        "changed_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
        "created_at" TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "pricing_categories" (
        "id" TEXT PRIMARY KEY,
        "organization_id" TEXT NOT NULL REFERENCES "organizations"("id") ON DELETE CASCADE,
        "name" TEXT NOT NULL,
        "description" TEXT,
        "default_markup" NUMERIC(8,2),
        "created_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
        "updated_at" TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "pricing_products" (
        "id" TEXT PRIMARY KEY,
        "organization_id" TEXT NOT NULL REFERENCES "organizations"("id") ON DELETE CASCADE,
        "category_id" TEXT REFERENCES "pricing_categories"("id") ON DELETE SET NULL,
        "name" TEXT NOT NULL,
        "model" TEXT,
        "capacity" TEXT,
        "cost_price" NUMERIC(12,2),
        "freight" NUMERIC(12,2),
        "markup" NUMERIC(8,2),
        "list_price" NUMERIC(12,2),
        "is_active" BOOLEAN DEFAULT TRUE,
        "notes" TEXT,
        "created_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
        "updated_at" TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "pricing_price_history" (
        "id" TEXT PRIMARY KEY,
        "organization_id" TEXT NOT NULL REFERENCES "organizations"("id") ON DELETE CASCADE,
        "product_id" TEXT NOT NULL REFERENCES "pricing_products"("id") ON DELETE CASCADE,
        "old_price" NUMERIC(12,2),
        "new_price" NUMERIC(12,2),
        "changed_by" TEXT,
        "changed_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
        "created_at" TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "pricing_globals" (
        "user_id" TEXT PRIMARY KEY REFERENCES "users"("id") ON DELETE CASCADE,
        "organization_id" TEXT NOT NULL REFERENCES "organizations"("id") ON DELETE CASCADE,
        "tax_percent" NUMERIC(6,2) DEFAULT 0,
        "default_freight" NUMERIC(12,2) DEFAULT 0,
        "rounding_unit" NUMERIC(12,2) DEFAULT 1,
        "default_markup" NUMERIC(8,2) DEFAULT 0,
        "created_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
        "updated_at" TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "integrations" (
        "id" TEXT PRIMARY KEY,
        "organization_id" TEXT NOT NULL REFERENCES "organizations"("id") ON DELETE CASCADE,
        "name" TEXT NOT NULL,
        "provider" TEXT NOT NULL,
        "api_key" TEXT,
        "is_active" BOOLEAN DEFAULT TRUE,
        "settings" JSONB NOT NULL DEFAULT '{}',
        "last_sync_at" TIMESTAMPTZ,
        "created_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
        "updated_at" TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "saas_plans" (
        "id" TEXT PRIMARY KEY,
        "name" TEXT NOT NULL,
        "price" NUMERIC(12,2) NOT NULL,
        "billing_cycle" TEXT DEFAULT 'monthly',
        "max_users" INTEGER,
        "features" JSONB NOT NULL DEFAULT '[]',
        "is_active" BOOLEAN DEFAULT TRUE,
        "created_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
        "updated_at" TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "saas_clients" (
        "id" TEXT PRIMARY KEY,
        "name" TEXT NOT NULL,
        "email" TEXT,
        "company" TEXT,
        "phone" TEXT,
        "plan_id" TEXT REFERENCES "saas_plans"("id") ON DELETE SET NULL,
        "status" TEXT DEFAULT 'active',
        "start_date" DATE,
        "notes" TEXT,
        "created_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
        "updated_at" TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "saas_billing" (
        "id" TEXT PRIMARY KEY,
        "saas_client_id" TEXT NOT NULL REFERENCES "saas_clients"("id") ON DELETE CASCADE,
        "amount" NUMERIC(12,2) NOT NULL,
        "description" TEXT,
        "due_date" DATE,
        "paid_at" TIMESTAMPTZ,
        "status" TEXT DEFAULT 'pending',
        "created_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
        "updated_at" TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE INDEX IF NOT EXISTS "idx_users_organization" ON "users" ("organization_id")"#,
    r#"CREATE INDEX IF NOT EXISTS "idx_clients_organization" ON "clients" ("organization_id")"#,
    r#"CREATE INDEX IF NOT EXISTS "idx_suppliers_organization" ON "suppliers" ("organization_id")"#,
    r#"CREATE INDEX IF NOT EXISTS "idx_orders_organization_date" ON "orders" ("organization_id", "order_date" DESC)"#,
    r#"CREATE INDEX IF NOT EXISTS "idx_historical_prices_supplier" ON "historical_prices" ("supplier_id")"#,
    r#"CREATE INDEX IF NOT EXISTS "idx_client_payments_order" ON "client_payments" ("order_id")"#,
    r#"CREATE INDEX IF NOT EXISTS "idx_order_costs_order" ON "order_costs" ("order_id")"#,
    r#"CREATE INDEX IF NOT EXISTS "idx_custom_table_history_row" ON "custom_table_history" ("row_id", "changed_at" DESC)"#,
    r#"CREATE INDEX IF NOT EXISTS "idx_price_history_product" ON "pricing_price_history" ("product_id", "changed_at" DESC)"#,
    r#"CREATE INDEX IF NOT EXISTS "idx_saas_billing_client" ON "saas_billing" ("saas_client_id")"#,
];

pub async fn ensure_schema(db: &DatabaseManager) -> Result<(), DatabaseError> {
    for statement in STATEMENTS {
        db.execute(statement, &[]).await?;
    }
    info!("Schema ready ({} statements)", STATEMENTS.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{
        client::CLIENTS, finance, historical_price::HISTORICAL_PRICES, integration::INTEGRATIONS, ledger, order::ORDERS,
        pricing, saas, supplier::SUPPLIERS, ResourceSpec,
    };

    fn table_ddl(table: &str) -> &'static str {
        let prefix = format!("CREATE TABLE IF NOT EXISTS \"{}\"", table);
        STATEMENTS
            .iter()
            .find(|s| s.starts_with(&prefix))
            .copied()
            .unwrap_or_else(|| panic!("no DDL for {}", table))
    }

    #[test]
    fn every_statement_is_idempotent() {
        for statement in STATEMENTS {
            assert!(statement.contains("IF NOT EXISTS"), "not idempotent: {}", statement);
        }
    }

    #[test]
    fn every_declared_column_exists_in_its_table() {
        let specs: &[&ResourceSpec] = &[
            &CLIENTS,
            &SUPPLIERS,
            &ORDERS,
            &HISTORICAL_PRICES,
            &finance::CLIENT_PAYMENTS,
            &finance::ORDER_COSTS,
            &ledger::CUSTOM_TABLE_ROWS,
            &ledger::CUSTOM_TABLE_HISTORY,
            &pricing::CATEGORIES,
            &pricing::PRODUCTS,
            &pricing::PRICE_HISTORY,
            &pricing::GLOBALS,
            &INTEGRATIONS,
            &saas::SAAS_CLIENTS,
            &saas::PLANS,
            &saas::BILLING,
        ];
        for spec in specs {
            let ddl = table_ddl(spec.table);
            for field in spec.fields {
                assert!(
                    ddl.contains(&format!("\"{}\" ", field.column)),
                    "{}.{} missing from DDL",
                    spec.table,
                    field.column
                );
            }
            if spec.has_updated_at {
                assert!(ddl.contains("\"updated_at\""), "{} lacks updated_at", spec.table);
            }
        }
    }

    #[test]
    fn order_references_null_out_and_quotes_cascade() {
        let orders = table_ddl("orders");
        assert!(orders.contains("REFERENCES \"clients\"(\"id\") ON DELETE SET NULL"));
        assert!(orders.contains("REFERENCES \"suppliers\"(\"id\") ON DELETE SET NULL"));

        let quotes = table_ddl("historical_prices");
        assert!(quotes.contains("REFERENCES \"suppliers\"(\"id\") ON DELETE CASCADE"));
    }
}
