//! Named operations of the AssetDesk API
//!
//! Session calls (login, logout, me) maintain the [`TokenStore`]; domain
//! calls are thin wrappers returning the server JSON untouched.
//!
//! [`TokenStore`]: crate::session::TokenStore

use std::sync::Arc;

use assetdesk_domain::constants::{LOGIN_PATH, LOGOUT_PATH, ME_PATH};
use assetdesk_domain::{ClientError, LoginResponse, User};
use serde::de::IgnoredAny;
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::client::ApiClient;
use super::request::{ApiRequest, MultipartPayload};

/// Reference lists served under `/reference`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceList {
    Departments,
    Locations,
    Domains,
    Roles,
    AssetTypes,
    AssetStatuses,
}

impl ReferenceList {
    pub fn path(self) -> &'static str {
        match self {
            Self::Departments => "/reference/departments",
            Self::Locations => "/reference/locations",
            Self::Domains => "/reference/domains",
            Self::Roles => "/reference/roles",
            Self::AssetTypes => "/reference/asset-types",
            Self::AssetStatuses => "/reference/asset-statuses",
        }
    }
}

/// Entry point for application code
#[derive(Clone)]
pub struct SessionGateway {
    client: Arc<ApiClient>,
}

impl SessionGateway {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    // Session
    // -------------------------------------------------------------------

    /// Authenticate with username and password and persist the session.
    ///
    /// # Errors
    /// Returns `ClientError::Api` (typically 401) for bad credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<User, ClientError> {
        let request = ApiRequest::post(LOGIN_PATH)
            .form([("username", username), ("password", password)])
            .public();
        let response: LoginResponse = self.client.execute(&request).await?;

        let store = self.client.store();
        store.set_tokens(response.access_token, response.refresh_token);
        store.set_identity(&response.user);

        info!(user_id = response.user.id, "Logged in");
        Ok(response.user)
    }

    /// End the session on the server and locally.
    ///
    /// The local session is cleared even when the server call fails; the
    /// failure is still reported.
    ///
    /// # Errors
    /// Returns the error of the server call, if any.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ClientError> {
        let store = self.client.store();
        if store.access_token().is_none() {
            store.clear();
            return Ok(());
        }

        let result = self
            .client
            .execute::<IgnoredAny>(&ApiRequest::post(LOGOUT_PATH).without_refresh())
            .await;
        store.clear();

        match result {
            Ok(_) => {
                info!("Logged out");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Server logout failed; local session cleared");
                Err(err)
            }
        }
    }

    /// Fetch the current user and refresh the cached identity.
    ///
    /// # Errors
    /// Propagates request errors, including `RefreshFailed`.
    pub async fn me(&self) -> Result<User, ClientError> {
        let user: User = self.client.execute(&ApiRequest::get(ME_PATH)).await?;
        self.client.store().set_identity(&user);
        Ok(user)
    }

    /// Whether a persisted session was found at startup.
    pub fn restore(&self) -> bool {
        let session = self.client.store().get();
        let restored = session.access_token.is_some() || session.can_refresh();
        info!(restored, has_identity = session.identity.is_some(), "Session restore");
        restored
    }

    pub fn is_authenticated(&self) -> bool {
        self.client.store().access_token().is_some()
    }

    /// Identity cached from the last login or [`SessionGateway::me`].
    pub fn current_user(&self) -> Option<User> {
        self.client.store().identity()
    }

    // Assets
    // -------------------------------------------------------------------

    pub async fn list_assets(&self) -> Result<Value, ClientError> {
        self.call(ApiRequest::get("/assets")).await
    }

    pub async fn my_assets(&self, user: &str) -> Result<Value, ClientError> {
        self.call(ApiRequest::get("/assets/my-assets").query("user", user)).await
    }

    pub async fn asset_stats(&self) -> Result<Value, ClientError> {
        self.call(ApiRequest::get("/assets/stats")).await
    }

    /// Assets whose warranty, contract or license expires within `days_ahead`.
    pub async fn asset_renewals(
        &self,
        days_ahead: u32,
        expiry_type: Option<&str>,
    ) -> Result<Value, ClientError> {
        let request = ApiRequest::get("/assets/renewals").query("days_ahead", days_ahead);
        self.call(with_optional(request, "expiry_type", expiry_type)).await
    }

    pub async fn get_asset(&self, asset_id: &str) -> Result<Value, ClientError> {
        self.call(ApiRequest::get(format!("/assets/{asset_id}"))).await
    }

    /// Create an asset, optionally fulfilling an approved asset request.
    pub async fn create_asset(
        &self,
        asset: Value,
        request_id: Option<&str>,
    ) -> Result<Value, ClientError> {
        let request = ApiRequest::post("/assets").json(asset);
        self.call(with_optional(request, "request_id", request_id)).await
    }

    pub async fn update_asset(&self, asset_id: &str, changes: Value) -> Result<Value, ClientError> {
        self.call(ApiRequest::patch(format!("/assets/{asset_id}")).json(changes)).await
    }

    pub async fn assign_asset(
        &self,
        asset_id: &str,
        assignment: Value,
        request_id: Option<&str>,
    ) -> Result<Value, ClientError> {
        let request = ApiRequest::patch(format!("/assets/{asset_id}/assign")).json(assignment);
        self.call(with_optional(request, "request_id", request_id)).await
    }

    pub async fn update_asset_status(
        &self,
        asset_id: &str,
        status: Value,
    ) -> Result<Value, ClientError> {
        self.call(ApiRequest::patch(format!("/assets/{asset_id}/status")).json(status)).await
    }

    pub async fn asset_events(&self, asset_id: &str) -> Result<Value, ClientError> {
        self.call(ApiRequest::get(format!("/assets/{asset_id}/events"))).await
    }

    /// Retire an asset; `hard_delete` removes it outright.
    pub async fn delete_asset(&self, asset_id: &str, hard_delete: bool) -> Result<Value, ClientError> {
        self.call(ApiRequest::delete(format!("/assets/{asset_id}")).query("hard_delete", hard_delete))
            .await
    }

    pub async fn asset_relationships(&self, asset_id: &str) -> Result<Value, ClientError> {
        self.call(ApiRequest::get(format!("/assets/{asset_id}/relationships"))).await
    }

    pub async fn create_asset_relationship(
        &self,
        asset_id: &str,
        relationship: Value,
    ) -> Result<Value, ClientError> {
        self.call(ApiRequest::post(format!("/assets/{asset_id}/relationships")).json(relationship))
            .await
    }

    pub async fn delete_asset_relationship(
        &self,
        asset_id: &str,
        relationship_id: &str,
    ) -> Result<Value, ClientError> {
        self.call(ApiRequest::delete(format!(
            "/assets/{asset_id}/relationships/{relationship_id}"
        )))
        .await
    }

    // Users
    // -------------------------------------------------------------------

    pub async fn list_users(
        &self,
        status: Option<&str>,
        role: Option<&str>,
    ) -> Result<Value, ClientError> {
        let request = with_optional(ApiRequest::get("/users"), "status", status);
        self.call(with_optional(request, "role", role)).await
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Value, ClientError> {
        self.call(ApiRequest::get(format!("/users/{user_id}"))).await
    }

    pub async fn create_user(&self, user: Value) -> Result<Value, ClientError> {
        self.call(ApiRequest::post("/users").json(user)).await
    }

    pub async fn update_user(&self, user_id: &str, changes: Value) -> Result<Value, ClientError> {
        self.call(ApiRequest::patch(format!("/users/{user_id}")).json(changes)).await
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<Value, ClientError> {
        self.call(ApiRequest::delete(format!("/users/{user_id}"))).await
    }

    // Tickets and asset requests
    // -------------------------------------------------------------------

    pub async fn list_tickets(&self, filters: &[(&str, &str)]) -> Result<Value, ClientError> {
        self.call(with_filters(ApiRequest::get("/tickets"), filters)).await
    }

    pub async fn get_ticket(&self, ticket_id: &str) -> Result<Value, ClientError> {
        self.call(ApiRequest::get(format!("/tickets/{ticket_id}"))).await
    }

    pub async fn create_ticket(&self, ticket: Value) -> Result<Value, ClientError> {
        self.call(ApiRequest::post("/tickets").json(ticket)).await
    }

    pub async fn update_ticket(&self, ticket_id: &str, changes: Value) -> Result<Value, ClientError> {
        self.call(ApiRequest::patch(format!("/tickets/{ticket_id}")).json(changes)).await
    }

    pub async fn list_asset_requests(&self, filters: &[(&str, &str)]) -> Result<Value, ClientError> {
        self.call(with_filters(ApiRequest::get("/asset-requests"), filters)).await
    }

    pub async fn get_asset_request(&self, request_id: &str) -> Result<Value, ClientError> {
        self.call(ApiRequest::get(format!("/asset-requests/{request_id}"))).await
    }

    pub async fn create_asset_request(&self, asset_request: Value) -> Result<Value, ClientError> {
        self.call(ApiRequest::post("/asset-requests").json(asset_request)).await
    }

    pub async fn update_asset_request(
        &self,
        request_id: &str,
        changes: Value,
    ) -> Result<Value, ClientError> {
        self.call(ApiRequest::patch(format!("/asset-requests/{request_id}")).json(changes)).await
    }

    // Reference data and financials
    // -------------------------------------------------------------------

    pub async fn reference(&self, list: ReferenceList) -> Result<Value, ClientError> {
        self.call(ApiRequest::get(list.path())).await
    }

    pub async fn financial_summary(&self) -> Result<Value, ClientError> {
        self.call(ApiRequest::get("/financials/summary")).await
    }

    pub async fn financials_by_type(&self) -> Result<Value, ClientError> {
        self.call(ApiRequest::get("/financials/by-type")).await
    }

    pub async fn monthly_spend(&self) -> Result<Value, ClientError> {
        self.call(ApiRequest::get("/financials/monthly-spend")).await
    }

    pub async fn depreciation(
        &self,
        method: &str,
        useful_life_years: u32,
    ) -> Result<Value, ClientError> {
        self.call(
            ApiRequest::get("/financials/depreciation")
                .query("method", method)
                .query("useful_life_years", useful_life_years),
        )
        .await
    }

    // Uploads
    // -------------------------------------------------------------------

    /// Upload a file as the multipart `file` field.
    pub async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        mime: Option<&str>,
    ) -> Result<Value, ClientError> {
        let payload =
            MultipartPayload::new().file("file", file_name, bytes, mime.map(str::to_string));
        self.call(ApiRequest::post("/upload").multipart(payload)).await
    }

    async fn call(&self, request: ApiRequest) -> Result<Value, ClientError> {
        self.client.execute_value(&request).await
    }
}

fn with_optional(request: ApiRequest, key: &str, value: Option<&str>) -> ApiRequest {
    match value {
        Some(value) => request.query(key, value),
        None => request,
    }
}

fn with_filters(request: ApiRequest, filters: &[(&str, &str)]) -> ApiRequest {
    filters.iter().fold(request, |request, (key, value)| request.query(*key, *value))
}
