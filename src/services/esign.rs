use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::config::IntegrationsConfig;
use crate::services::integration::{http_client, read_json, IntegrationError};

const CONTRACT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="pt-BR">
<head><meta charset="utf-8"><title>Contrato BluFacilita</title></head>
<body>
<h1>Contrato de Compra e Venda com Parcelamento BluFacilita</h1>
<p><strong>Comprador:</strong> {{NOME_CLIENTE}}</p>
<p><strong>CPF:</strong> {{CPF_CLIENTE}}</p>
<p><strong>E-mail:</strong> {{EMAIL_CLIENTE}}</p>
<p><strong>Endereço:</strong> {{ENDERECO_CLIENTE}}</p>
<h2>Cláusula 1 - Objeto</h2>
<p>O presente contrato tem por objeto a aquisição de aparelho eletrônico pelo COMPRADOR, com pagamento parcelado conforme condições acordadas no pedido.</p>
<h2>Cláusula 2 - Pagamento</h2>
<p>O COMPRADOR compromete-se a quitar as parcelas nas datas de vencimento. O atraso sujeita o COMPRADOR à inclusão no cadastro de inadimplentes da VENDEDORA.</p>
<h2>Cláusula 3 - Garantia</h2>
<p>O aparelho é entregue com garantia de 90 dias contra defeitos de funcionamento, excluídos danos por mau uso.</p>
<p>Assinado eletronicamente por {{NOME_CLIENTE}}.</p>
</body>
</html>
"#;

const CREATE_DOCUMENT_MUTATION: &str = "mutation CreateDocumentMutation($document: DocumentInput!, $signers: [SignerInput!]!, $file: Upload!) { \
createDocument(document: $document, signers: $signers, file: $file) { \
id name refusable sortable created_at \
signatures { public_id name email created_at action { name } link { short_link } } } }";

pub const DEFAULT_DOCUMENT_NAME: &str = "Contrato BluFacilita";

/// The signer whose details are merged into the contract.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractParty {
    pub name: String,
    pub cpf: String,
    pub email: String,
    pub address: String,
}

/// Substitutes the four client placeholders; values are HTML-escaped.
pub fn render_contract(party: &ContractParty) -> String {
    CONTRACT_TEMPLATE
        .replace("{{NOME_CLIENTE}}", &escape_html(&party.name))
        .replace("{{CPF_CLIENTE}}", &escape_html(&party.cpf))
        .replace("{{EMAIL_CLIENTE}}", &escape_html(&party.email))
        .replace("{{ENDERECO_CLIENTE}}", &escape_html(&party.address))
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn create_document_request(party: &ContractParty, document_name: &str) -> Value {
    let encoded = STANDARD.encode(render_contract(party));
    json!({
        "query": CREATE_DOCUMENT_MUTATION,
        "variables": {
            "document": { "name": document_name },
            "signers": [{ "email": party.email, "action": "SIGN" }],
            "file": encoded
        }
    })
}

/// Autentique GraphQL client.
pub struct SignatureClient {
    http: reqwest::Client,
    url: String,
    api_token: Option<String>,
}

impl SignatureClient {
    pub fn from_config(config: &IntegrationsConfig) -> Result<Self, IntegrationError> {
        Ok(Self {
            http: http_client(config)?,
            url: config.autentique_url.clone(),
            api_token: config.autentique_api_token.clone(),
        })
    }

    pub async fn create_document(&self, party: &ContractParty, document_name: &str) -> Result<Value, IntegrationError> {
        let token = self.api_token.as_deref().ok_or(IntegrationError::NotConfigured("Autentique"))?;

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(token)
            .json(&create_document_request(party, document_name))
            .send()
            .await?;
        let body = read_json(response).await?;
        info!("Submitted signature document '{}' for {}", document_name, party.email);
        Ok(body)
    }
}
