use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{Organization, OrganizationSettings, Profile, ProfileUpdate};

impl ApiClient {
    /// The signed-in user's profile.
    pub async fn get_profile(&self) -> Result<Profile, Error> {
        self.get("api/profiles/me").await
    }

    /// Update the signed-in user's profile (name, provider configs).
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile, Error> {
        self.patch("api/profiles/me", update).await
    }

    /// The caller's organization.
    pub async fn get_organization(&self) -> Result<Organization, Error> {
        self.get("api/org").await
    }

    /// Organization-wide settings. Only organization admins may read these.
    pub async fn get_organization_settings(&self) -> Result<OrganizationSettings, Error> {
        self.get("api/org/settings").await
    }

    /// Replace organization settings with the given values.
    pub async fn update_organization_settings(
        &self,
        settings: &OrganizationSettings,
    ) -> Result<OrganizationSettings, Error> {
        self.patch("api/org/settings", settings).await
    }
}
