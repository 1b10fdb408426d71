use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{
    Connection, ConnectionType, CreateConnectionRequest, ResourceId, UpdateConnectionRequest,
};

impl ApiClient {
    pub async fn list_connection_types(&self) -> Result<Vec<ConnectionType>, Error> {
        self.get_all("api/connection_types").await
    }

    pub async fn list_connections(&self) -> Result<Vec<Connection>, Error> {
        self.get_all("api/connections").await
    }

    pub async fn create_connection(
        &self,
        req: &CreateConnectionRequest,
    ) -> Result<Connection, Error> {
        self.post("api/connections", req).await
    }

    pub async fn update_connection(
        &self,
        id: &ResourceId,
        req: &UpdateConnectionRequest,
    ) -> Result<Connection, Error> {
        self.patch(&format!("api/connections/{id}"), req).await
    }

    pub async fn delete_connection(&self, id: &ResourceId) -> Result<(), Error> {
        self.delete(&format!("api/connections/{id}")).await
    }
}
