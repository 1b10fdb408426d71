use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{Processor, Provider};

impl ApiClient {
    pub async fn list_providers(&self) -> Result<Vec<Provider>, Error> {
        self.get_all("api/apiproviders").await
    }

    pub async fn list_processors(&self) -> Result<Vec<Processor>, Error> {
        self.get_all("api/apibackends").await
    }
}
