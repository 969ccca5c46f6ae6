mod common;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use common::TestServer;

async fn send(req: reqwest::RequestBuilder) -> Result<(StatusCode, Value)> {
    let res = req.send().await?;
    let status = res.status();
    let body = if status == StatusCode::NO_CONTENT {
        Value::Null
    } else {
        res.json().await?
    };
    Ok((status, body))
}

async fn create_client(server: &TestServer, client: &Client, token: &str, name: &str) -> Result<Value> {
    let (status, body) = send(
        client
            .post(server.url("/api/clients"))
            .bearer_auth(token)
            .json(&json!({ "name": name, "cpfCnpj": "123.456.789-00", "isDefaulter": 0, "tags": [] })),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "create client: {} {}", status, body);
    Ok(body["data"].clone())
}

#[tokio::test]
async fn client_lifecycle_round_trips_through_the_store() -> Result<()> {
    if !common::has_database() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = Client::new();
    let (token, _) = common::register(server, &client).await?;

    let created = create_client(server, &client, &token, "Maria Silva").await?;
    let id = created["id"].as_str().context("id")?.to_string();
    assert_eq!(created["isDefaulter"], false);

    let (status, body) = send(
        client
            .put(server.url(&format!("/api/clients/{}", id)))
            .bearer_auth(&token)
            .json(&json!({ "phone": "+55 11 99999-0000" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["phone"], "+55 11 99999-0000");
    assert_eq!(body["data"]["name"], "Maria Silva", "omitted fields are preserved");

    let (status, body) = send(client.get(server.url("/api/clients?search=maria")).bearer_auth(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    for _ in 0..2 {
        let (status, _) = send(client.delete(server.url(&format!("/api/clients/{}", id))).bearer_auth(&token)).await?;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    let (status, _) = send(client.get(server.url(&format!("/api/clients/{}", id))).bearer_auth(&token)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn organizations_cannot_see_each_others_rows() -> Result<()> {
    if !common::has_database() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = Client::new();
    let (owner, _) = common::register(server, &client).await?;
    let (stranger, _) = common::register(server, &client).await?;

    let row = create_client(server, &client, &owner, "Private Client").await?;
    let path = format!("/api/clients/{}", row["id"].as_str().context("id")?);

    let (status, _) = send(client.get(server.url(&path)).bearer_auth(&stranger)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(client.put(server.url(&path)).bearer_auth(&stranger).json(&json!({ "name": "x" }))).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(client.delete(server.url(&path)).bearer_auth(&stranger)).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(client.get(server.url("/api/clients")).bearer_auth(&stranger)).await?;
    assert_eq!(body["data"], json!([]));

    let (status, body) = send(client.get(server.url(&path)).bearer_auth(&owner)).await?;
    assert_eq!(status, StatusCode::OK, "stranger's delete must not reach the owner's row");
    assert_eq!(body["data"]["name"], "Private Client");
    Ok(())
}

#[tokio::test]
async fn duplicate_registration_conflicts() -> Result<()> {
    if !common::has_database() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = Client::new();
    let email = format!("{}@blu.test", common::unique("dup"));
    let body = json!({ "email": email, "password": "secret123", "name": "Dup" });

    let (status, _) = send(client.post(server.url("/api/auth/register")).json(&body)).await?;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(client.post(server.url("/api/auth/register")).json(&body)).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        client
            .post(server.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": "wrong-password" })),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        client
            .post(server.url("/api/auth/login"))
            .json(&json!({ "email": email.to_uppercase(), "password": "secret123" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["token"].as_str().context("token")?;

    let (status, body) = send(client.get(server.url("/api/auth/me")).bearer_auth(token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["email"], email);
    assert!(body["data"]["user"].get("passwordHash").is_none());
    Ok(())
}

#[tokio::test]
async fn orders_carry_payments_costs_and_summary() -> Result<()> {
    if !common::has_database() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = Client::new();
    let (token, _) = common::register(server, &client).await?;
    let today = chrono::Local::now().date_naive().to_string();

    let (status, body) = send(
        client
            .post(server.url("/api/orders"))
            .bearer_auth(&token)
            .json(&json!({
                "customerName": "João",
                "productName": "iPhone 15",
                "orderDate": today,
                "paymentMethod": "BluFacilita",
                "financedAmount": "1500,50",
                "sellingPrice": 5000,
            })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let order_id = body["data"]["id"].as_str().context("id")?.to_string();
    assert_eq!(body["data"]["arrivalPhotos"], json!([]));

    let payments = format!("/api/orders/{}/payments", order_id);
    let (status, body) = send(
        client
            .post(server.url(&payments))
            .bearer_auth(&token)
            .json(&json!({ "amount": 500, "paymentDate": today })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["orderId"], order_id.as_str());

    let (_, body) = send(client.get(server.url(&payments)).bearer_auth(&token)).await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let (status, _) = send(
        client
            .post(server.url("/api/orders/does-not-exist/costs"))
            .bearer_auth(&token)
            .json(&json!({ "amount": 10 })),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(client.get(server.url("/api/dashboard/weekly-summary")).bearer_auth(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["newBluFacilitaContracts"], 1);
    assert_eq!(body["data"]["totalBluFacilitaFinanced"], 1500.5);

    let (_, body) = send(client.get(server.url("/api/dashboard/weekly-summary?weekOffset=1")).bearer_auth(&token)).await?;
    assert_eq!(body["data"]["newBluFacilitaContracts"], 0);

    let (status, body) = send(client.get(server.url("/api/dashboard/stats")).bearer_auth(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalOrders"], 1);
    Ok(())
}

#[tokio::test]
async fn bulk_prices_commit_all_or_nothing() -> Result<()> {
    if !common::has_database() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = Client::new();
    let (token, _) = common::register(server, &client).await?;

    let (_, supplier) = send(
        client
            .post(server.url("/api/suppliers"))
            .bearer_auth(&token)
            .json(&json!({ "name": "Fornecedor SP" })),
    )
    .await?;
    let supplier_id = supplier["data"]["id"].as_str().context("supplier id")?;

    let (status, body) = send(
        client
            .post(server.url("/api/historical-prices/bulk"))
            .bearer_auth(&token)
            .json(&json!([
                { "supplierId": supplier_id, "productName": "iPhone 15", "price": 4999 },
                { "supplierId": supplier_id, "productName": "iPhone 15 Pro" },
            ])),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap_or_default().starts_with("Item 1"));

    let (_, body) = send(client.get(server.url("/api/historical-prices")).bearer_auth(&token)).await?;
    assert_eq!(body["data"], json!([]), "failed batch leaves nothing behind");

    let (status, _) = send(
        client
            .post(server.url("/api/historical-prices/bulk"))
            .bearer_auth(&token)
            .json(&json!([
                { "supplierId": supplier_id, "productName": "iPhone 15", "price": 4999 },
                { "supplierId": supplier_id, "productName": "iPad Air", "price": "3.899,00" },
            ])),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(client.get(server.url("/api/historical-prices?productName=ipad")).bearer_auth(&token)).await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn custom_table_changes_leave_history() -> Result<()> {
    if !common::has_database() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = Client::new();
    let (token, _) = common::register(server, &client).await?;

    let (_, body) = send(
        client
            .post(server.url("/api/custom-table"))
            .bearer_auth(&token)
            .json(&json!({ "description": "Aluguel", "amount": 1200 })),
    )
    .await?;
    let id = body["data"]["id"].as_str().context("id")?.to_string();
    let row = format!("/api/custom-table/{}", id);

    send(client.put(server.url(&row)).bearer_auth(&token).json(&json!({ "amount": 1300 }))).await?;
    send(client.delete(server.url(&row)).bearer_auth(&token)).await?;

    let (status, body) = send(client.get(server.url(&format!("{}/history", row))).bearer_auth(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    let entries = body["data"].as_array().context("history array")?;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["action"], "delete");
    assert_eq!(entries[0]["snapshot"]["amount"], 1300.0);
    assert_eq!(entries[1]["action"], "update");
    assert_eq!(entries[1]["snapshot"]["amount"], 1200.0);
    Ok(())
}

#[tokio::test]
async fn pricing_globals_default_then_persist() -> Result<()> {
    if !common::has_database() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = Client::new();
    let (token, _) = common::register(server, &client).await?;

    let (_, body) = send(client.get(server.url("/api/pricing/globals")).bearer_auth(&token)).await?;
    assert_eq!(body["data"]["roundingUnit"], 1);

    let (status, body) = send(
        client
            .put(server.url("/api/pricing/globals"))
            .bearer_auth(&token)
            .json(&json!({ "taxPercent": 6.5 })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["taxPercent"], 6.5);
    assert_eq!(body["data"]["roundingUnit"], 1.0);

    let (_, body) = send(
        client
            .post(server.url("/api/pricing/products"))
            .bearer_auth(&token)
            .json(&json!({ "name": "AirPods Pro", "listPrice": 1999 })),
    )
    .await?;
    let product = format!("/api/pricing/products/{}", body["data"]["id"].as_str().context("id")?);
    send(client.put(server.url(&product)).bearer_auth(&token).json(&json!({ "listPrice": 1899 }))).await?;
    send(client.put(server.url(&product)).bearer_auth(&token).json(&json!({ "notes": "no price change" }))).await?;

    let (_, body) = send(client.get(server.url(&format!("{}/history", product))).bearer_auth(&token)).await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
    Ok(())
}

async fn create_supplier(server: &TestServer, client: &Client, token: &str, name: &str) -> Result<String> {
    let (status, body) = send(
        client
            .post(server.url("/api/suppliers"))
            .bearer_auth(token)
            .json(&json!({ "name": name })),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "create supplier: {} {}", status, body);
    Ok(body["data"]["id"].as_str().context("supplier id")?.to_string())
}

#[tokio::test]
async fn rows_cannot_point_at_another_organizations_records() -> Result<()> {
    if !common::has_database() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = Client::new();
    let (owner, _) = common::register(server, &client).await?;
    let (stranger, _) = common::register(server, &client).await?;

    let foreign_supplier = create_supplier(server, &client, &stranger, "Fornecedor Alheio").await?;
    let foreign_client = create_client(server, &client, &stranger, "Cliente Alheio").await?;
    let own_supplier = create_supplier(server, &client, &owner, "Fornecedor Próprio").await?;

    let (status, body) = send(
        client
            .post(server.url("/api/historical-prices"))
            .bearer_auth(&owner)
            .json(&json!({ "supplierId": foreign_supplier, "productName": "iPhone 15", "price": 4999 })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["supplierId"].is_string());

    let (status, body) = send(
        client
            .post(server.url("/api/historical-prices/bulk"))
            .bearer_auth(&owner)
            .json(&json!([
                { "supplierId": own_supplier, "productName": "iPhone 15", "price": 4999 },
                { "supplierId": foreign_supplier, "productName": "iPhone 15", "price": 4999 },
            ])),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap_or_default().starts_with("Item 1: supplierId"));

    let (status, _) = send(
        client
            .post(server.url("/api/orders"))
            .bearer_auth(&owner)
            .json(&json!({ "productName": "iPhone 15", "clientId": foreign_client["id"] })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, order) = send(
        client
            .post(server.url("/api/orders"))
            .bearer_auth(&owner)
            .json(&json!({ "productName": "iPhone 15", "supplierId": own_supplier })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let order_path = format!("/api/orders/{}", order["data"]["id"].as_str().context("order id")?);

    let (status, _) = send(
        client
            .put(server.url(&order_path))
            .bearer_auth(&owner)
            .json(&json!({ "supplierId": foreign_supplier })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, category) = send(
        client
            .post(server.url("/api/pricing/categories"))
            .bearer_auth(&stranger)
            .json(&json!({ "name": "Seminovos" })),
    )
    .await?;
    let (status, _) = send(
        client
            .post(server.url("/api/pricing/products"))
            .bearer_auth(&owner)
            .json(&json!({ "name": "iPhone 14", "categoryId": category["data"]["id"] })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        client
            .post(server.url("/api/historical-prices"))
            .bearer_auth(&owner)
            .json(&json!({ "supplierId": own_supplier, "productName": "iPhone 15", "price": 4999 })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        client
            .delete(server.url(&format!("/api/suppliers/{}", foreign_supplier)))
            .bearer_auth(&stranger),
    )
    .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(client.get(server.url("/api/historical-prices")).bearer_auth(&owner)).await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1), "owner's quotes survive the stranger's delete");

    let (_, body) = send(client.get(server.url(&order_path)).bearer_auth(&owner)).await?;
    assert_eq!(body["data"]["supplierId"], own_supplier.as_str());
    Ok(())
}

#[tokio::test]
async fn required_fields_cannot_be_cleared_and_brazilian_prices_keep_scale() -> Result<()> {
    if !common::has_database() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = Client::new();
    let (token, _) = common::register(server, &client).await?;

    let row = create_client(server, &client, &token, "Joana").await?;
    let path = format!("/api/clients/{}", row["id"].as_str().context("id")?);
    let (status, body) = send(client.put(server.url(&path)).bearer_auth(&token).json(&json!({ "name": null }))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field_errors"]["name"], "This field is required");

    let (status, body) = send(
        client
            .post(server.url("/api/orders"))
            .bearer_auth(&token)
            .json(&json!({ "productName": "MacBook Air", "purchasePrice": "1.234,50" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["purchasePrice"].as_f64(), Some(1234.5));

    let (status, _) = send(
        client
            .post(server.url("/api/orders"))
            .bearer_auth(&token)
            .json(&json!({ "productName": "MacBook Air", "purchasePrice": "1,234.50" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn concurrent_custom_table_updates_each_snapshot_a_distinct_state() -> Result<()> {
    if !common::has_database() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = Client::new();
    let (token, _) = common::register(server, &client).await?;

    let (_, body) = send(
        client
            .post(server.url("/api/custom-table"))
            .bearer_auth(&token)
            .json(&json!({ "description": "Frete", "amount": 100 })),
    )
    .await?;
    let row = format!("/api/custom-table/{}", body["data"]["id"].as_str().context("id")?);

    let first = send(client.put(server.url(&row)).bearer_auth(&token).json(&json!({ "amount": 200 })));
    let second = send(client.put(server.url(&row)).bearer_auth(&token).json(&json!({ "amount": 300 })));
    let (first, second) = tokio::join!(first, second);
    assert_eq!(first?.0, StatusCode::OK);
    assert_eq!(second?.0, StatusCode::OK);

    let (_, body) = send(client.get(server.url(&format!("{}/history", row))).bearer_auth(&token)).await?;
    let mut before: Vec<f64> = body["data"]
        .as_array()
        .context("history array")?
        .iter()
        .filter_map(|entry| entry["snapshot"]["amount"].as_f64())
        .collect();
    before.sort_by(f64::total_cmp);
    assert_eq!(before.len(), 2);
    assert_eq!(before[0], 100.0);
    assert!(before[1] == 200.0 || before[1] == 300.0, "second snapshot saw the first update: {:?}", before);
    Ok(())
}
