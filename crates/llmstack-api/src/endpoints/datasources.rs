use uuid::Uuid;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{CreateDataSourceRequest, DataSource, DataSourceType};

impl ApiClient {
    pub async fn list_datasource_types(&self) -> Result<Vec<DataSourceType>, Error> {
        self.get_all("api/datasource_types").await
    }

    /// Data sources owned by the signed-in user.
    pub async fn list_datasources(&self) -> Result<Vec<DataSource>, Error> {
        self.get_all("api/datasources").await
    }

    /// Data sources shared with the user's organization.
    pub async fn list_org_datasources(&self) -> Result<Vec<DataSource>, Error> {
        self.get_all("api/org/datasources").await
    }

    pub async fn create_datasource(
        &self,
        req: &CreateDataSourceRequest,
    ) -> Result<DataSource, Error> {
        self.post("api/datasources", req).await
    }

    pub async fn delete_datasource(&self, uuid: &Uuid) -> Result<(), Error> {
        self.delete(&format!("api/datasources/{uuid}")).await
    }
}
