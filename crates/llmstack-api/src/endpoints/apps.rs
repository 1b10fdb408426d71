use uuid::Uuid;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{App, AppRunShare, AppTemplate, AppVersion};

impl ApiClient {
    pub async fn list_apps(&self) -> Result<Vec<App>, Error> {
        self.get_all("api/apps").await
    }

    pub async fn get_app(&self, uuid: &Uuid) -> Result<App, Error> {
        self.get(&format!("api/apps/{uuid}")).await
    }

    pub async fn delete_app(&self, uuid: &Uuid) -> Result<(), Error> {
        self.delete(&format!("api/apps/{uuid}")).await
    }

    pub async fn publish_app(&self, uuid: &Uuid) -> Result<(), Error> {
        self.post_no_response(&format!("api/apps/{uuid}/publish"), &serde_json::json!({}))
            .await
    }

    pub async fn unpublish_app(&self, uuid: &Uuid) -> Result<(), Error> {
        self.post_no_response(&format!("api/apps/{uuid}/unpublish"), &serde_json::json!({}))
            .await
    }

    pub async fn list_app_templates(&self) -> Result<Vec<AppTemplate>, Error> {
        self.get_all("api/apps/templates").await
    }

    pub async fn list_app_versions(&self, uuid: &Uuid) -> Result<Vec<AppVersion>, Error> {
        self.get_all(&format!("api/apps/{uuid}/versions")).await
    }

    /// Recorded run shared via a share code.
    pub async fn get_app_run_share(&self, code: &str) -> Result<AppRunShare, Error> {
        self.get(&format!("api/app/run/share/{code}")).await
    }
}
