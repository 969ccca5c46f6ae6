// handlers/protected/contracts.rs - POST /api/contracts/signature

use axum::{extract::State, routing::post, Router};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::handlers::require_fields;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::esign::{ContractParty, DEFAULT_DOCUMENT_NAME};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/contracts/signature", post(signature_post))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cpf: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    pub document_name: Option<String>,
}

/**
 * POST /api/contracts/signature - Send the financing contract for signature
 *
 * Input:  { name, cpf, email, address, documentName? }
 * Output: the provider's createDocument payload
 */
pub async fn signature_post(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(body): ApiJson<SignatureRequest>,
) -> ApiResult<Value> {
    require_fields(&[
        ("name", body.name.as_str()),
        ("cpf", body.cpf.as_str()),
        ("email", body.email.as_str()),
        ("address", body.address.as_str()),
    ])?;

    let document_name = body
        .document_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_DOCUMENT_NAME)
        .to_string();
    let party = ContractParty {
        name: body.name,
        cpf: body.cpf,
        email: body.email,
        address: body.address,
    };

    let document = state.signatures.create_document(&party, &document_name).await?;
    info!("{} sent '{}' for signature", user.email, document_name);
    Ok(ApiResponse::success(document))
}
