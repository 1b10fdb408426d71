use uuid::Uuid;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{CreateSheetRequest, Sheet, SheetTemplate};

impl ApiClient {
    pub async fn list_sheets(&self) -> Result<Vec<Sheet>, Error> {
        self.get_all("api/sheets").await
    }

    pub async fn list_sheet_templates(&self) -> Result<Vec<SheetTemplate>, Error> {
        self.get_all("api/sheets/templates").await
    }

    pub async fn create_sheet(&self, req: &CreateSheetRequest) -> Result<Sheet, Error> {
        self.post("api/sheets", req).await
    }

    pub async fn delete_sheet(&self, uuid: &Uuid) -> Result<(), Error> {
        self.delete(&format!("api/sheets/{uuid}")).await
    }
}
