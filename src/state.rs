use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::models::ResourceSpec;
use crate::database::DatabaseManager;
use crate::services::ai::{GeminiClient, PriceListParser};
use crate::services::carrier::CarrierClient;
use crate::services::esign::SignatureClient;
use crate::services::integration::IntegrationError;
use crate::services::storage::UploadStore;
use crate::services::ResourceService;

/// Shared handles injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseManager,
    pub config: Arc<AppConfig>,
    pub carrier: Arc<CarrierClient>,
    pub signatures: Arc<SignatureClient>,
    pub price_lists: Arc<PriceListParser>,
    pub uploads: UploadStore,
}

impl AppState {
    /// Wires the production adapters from configuration.
    pub fn new(db: DatabaseManager, config: Arc<AppConfig>) -> Result<Self, IntegrationError> {
        let integrations = &config.integrations;
        let carrier = Arc::new(CarrierClient::from_config(integrations)?);
        let signatures = Arc::new(SignatureClient::from_config(integrations)?);
        let price_lists = Arc::new(PriceListParser::new(Arc::new(GeminiClient::from_config(integrations)?)));
        let uploads = UploadStore::new(&config.server.uploads_dir);

        Ok(Self {
            db,
            config,
            carrier,
            signatures,
            price_lists,
            uploads,
        })
    }

    pub fn resource(&self, spec: &'static ResourceSpec) -> ResourceService {
        ResourceService::new(self.db.clone(), spec)
    }
}
