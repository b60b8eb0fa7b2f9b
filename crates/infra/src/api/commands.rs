//! Typed operation facade
//!
//! One method per backend operation. Each call builds an
//! [`OutgoingRequest`], hands it to the [`ApiClient`] and runs under the
//! attached [`RequestObserver`] with a logical endpoint name such as
//! `campaigns.list`. A default observer publishing on the process-wide bus
//! is attached unless the caller opts out.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use smsdesk_domain::types::{
    Acknowledgement, Automation, AutomationToggle, AutomationUpdate, Campaign, CampaignFilter,
    CampaignUpdate, Contact, ContactFilter, ContactUpdate, Discount, DiscountUpdate,
    HealthStatus, NewCampaign, NewContact, NewDiscount, NewSegment, Page, Segment,
    SegmentCondition, SegmentPreview, SegmentPreviewRequest, SegmentUpdate, SendReceipt,
    TestMessageRequest,
};
use tracing::{debug, instrument};
use urlencoding::encode;

use super::client::ApiClient;
use super::errors::ApiError;
use super::observer::RequestObserver;
use super::request::OutgoingRequest;

/// API commands for dashboard operations
#[derive(Debug, Clone)]
pub struct ApiCommands {
    client: Arc<ApiClient>,
    observer: Option<Arc<RequestObserver>>,
}

impl ApiCommands {
    /// Create a new commands instance observed by [`RequestObserver::new`]
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client, observer: Some(Arc::new(RequestObserver::new())) }
    }

    /// Route every call through `observer`
    pub fn with_observer(mut self, observer: Arc<RequestObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Issue calls without timing, logging or `api-error` events
    pub fn without_observer(mut self) -> Self {
        self.observer = None;
        self
    }

    /// Underlying transport
    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    /// Attached observer, if any
    pub fn observer(&self) -> Option<&Arc<RequestObserver>> {
        self.observer.as_ref()
    }

    // === Campaign Operations ===

    /// List campaigns matching `filter`
    ///
    /// # Errors
    ///
    /// Returns error if API request fails
    #[instrument(skip(self, filter))]
    pub async fn list_campaigns(&self, filter: &CampaignFilter) -> Result<Page<Campaign>, ApiError> {
        let request = OutgoingRequest::get("/campaigns")
            .query_opt("status", filter.status)
            .query_opt("search", filter.search.as_deref())
            .query_opt("page", filter.page)
            .query_opt("limit", filter.limit);
        let params = json!({
            "status": filter.status.map(|status| status.as_str()),
            "search": filter.search,
            "page": filter.page,
            "limit": filter.limit,
        });

        let page: Page<Campaign> = self.dispatch("campaigns.list", request, params).await?;
        debug!(count = page.items.len(), total = page.total, "Campaigns listed");
        Ok(page)
    }

    /// Get a campaign by ID
    ///
    /// # Errors
    ///
    /// Returns error if campaign not found or API request fails
    #[instrument(skip(self), fields(campaign_id = %id))]
    pub async fn get_campaign(&self, id: &str) -> Result<Campaign, ApiError> {
        let request = OutgoingRequest::get(format!("/campaigns/{}", encode(id)));
        self.dispatch("campaigns.get", request, json!({ "id": id })).await
    }

    #[instrument(skip(self, campaign))]
    pub async fn create_campaign(&self, campaign: &NewCampaign) -> Result<Campaign, ApiError> {
        let request = OutgoingRequest::post("/campaigns").json(campaign)?;
        let created: Campaign =
            self.dispatch("campaigns.create", request, params_of(campaign)).await?;
        debug!(campaign_id = %created.id, "Campaign created");
        Ok(created)
    }

    #[instrument(skip(self, update), fields(campaign_id = %id))]
    pub async fn update_campaign(
        &self,
        id: &str,
        update: &CampaignUpdate,
    ) -> Result<Campaign, ApiError> {
        let request = OutgoingRequest::put(format!("/campaigns/{}", encode(id))).json(update)?;
        self.dispatch("campaigns.update", request, with_id(id, update)).await
    }

    #[instrument(skip(self), fields(campaign_id = %id))]
    pub async fn delete_campaign(&self, id: &str) -> Result<Acknowledgement, ApiError> {
        let request = OutgoingRequest::delete(format!("/campaigns/{}", encode(id)));
        self.acknowledge("campaigns.delete", request, json!({ "id": id })).await
    }

    /// Queue a campaign for delivery
    ///
    /// # Errors
    ///
    /// Returns error if the campaign cannot be sent or API request fails
    #[instrument(skip(self), fields(campaign_id = %id))]
    pub async fn send_campaign(&self, id: &str) -> Result<SendReceipt, ApiError> {
        let request = OutgoingRequest::post(format!("/campaigns/{}/send", encode(id)));
        let receipt: SendReceipt =
            self.dispatch("campaigns.send", request, json!({ "id": id })).await?;
        debug!(queued = receipt.queued, "Campaign queued");
        Ok(receipt)
    }

    /// Send the campaign message to a single phone number
    #[instrument(skip(self, test), fields(campaign_id = %id))]
    pub async fn send_test_message(
        &self,
        id: &str,
        test: &TestMessageRequest,
    ) -> Result<Acknowledgement, ApiError> {
        let request = OutgoingRequest::post(format!("/campaigns/{}/test", encode(id))).json(test)?;
        self.acknowledge("campaigns.test", request, with_id(id, test)).await
    }

    // === Discount Operations ===

    #[instrument(skip(self))]
    pub async fn list_discounts(&self) -> Result<Page<Discount>, ApiError> {
        self.dispatch("discounts.list", OutgoingRequest::get("/discounts"), Value::Null).await
    }

    #[instrument(skip(self), fields(discount_id = %id))]
    pub async fn get_discount(&self, id: &str) -> Result<Discount, ApiError> {
        let request = OutgoingRequest::get(format!("/discounts/{}", encode(id)));
        self.dispatch("discounts.get", request, json!({ "id": id })).await
    }

    /// Create a discount code
    ///
    /// # Errors
    ///
    /// Fails with 409 `discount_conflict` when the code already exists
    #[instrument(skip(self, discount), fields(code = %discount.code))]
    pub async fn create_discount(&self, discount: &NewDiscount) -> Result<Discount, ApiError> {
        let request = OutgoingRequest::post("/discounts").json(discount)?;
        self.dispatch("discounts.create", request, params_of(discount)).await
    }

    #[instrument(skip(self, update), fields(discount_id = %id))]
    pub async fn update_discount(
        &self,
        id: &str,
        update: &DiscountUpdate,
    ) -> Result<Discount, ApiError> {
        let request = OutgoingRequest::put(format!("/discounts/{}", encode(id))).json(update)?;
        self.dispatch("discounts.update", request, with_id(id, update)).await
    }

    #[instrument(skip(self), fields(discount_id = %id))]
    pub async fn delete_discount(&self, id: &str) -> Result<Acknowledgement, ApiError> {
        let request = OutgoingRequest::delete(format!("/discounts/{}", encode(id)));
        self.acknowledge("discounts.delete", request, json!({ "id": id })).await
    }

    // === Segment Operations ===

    #[instrument(skip(self))]
    pub async fn list_segments(&self) -> Result<Page<Segment>, ApiError> {
        self.dispatch("segments.list", OutgoingRequest::get("/segments"), Value::Null).await
    }

    #[instrument(skip(self), fields(segment_id = %id))]
    pub async fn get_segment(&self, id: &str) -> Result<Segment, ApiError> {
        let request = OutgoingRequest::get(format!("/segments/{}", encode(id)));
        self.dispatch("segments.get", request, json!({ "id": id })).await
    }

    #[instrument(skip(self, segment))]
    pub async fn create_segment(&self, segment: &NewSegment) -> Result<Segment, ApiError> {
        let request = OutgoingRequest::post("/segments").json(segment)?;
        let created: Segment =
            self.dispatch("segments.create", request, params_of(segment)).await?;
        debug!(segment_id = %created.id, contacts = created.contact_count, "Segment created");
        Ok(created)
    }

    #[instrument(skip(self, update), fields(segment_id = %id))]
    pub async fn update_segment(
        &self,
        id: &str,
        update: &SegmentUpdate,
    ) -> Result<Segment, ApiError> {
        let request = OutgoingRequest::put(format!("/segments/{}", encode(id))).json(update)?;
        self.dispatch("segments.update", request, with_id(id, update)).await
    }

    #[instrument(skip(self), fields(segment_id = %id))]
    pub async fn delete_segment(&self, id: &str) -> Result<Acknowledgement, ApiError> {
        let request = OutgoingRequest::delete(format!("/segments/{}", encode(id)));
        self.acknowledge("segments.delete", request, json!({ "id": id })).await
    }

    /// Count the contacts a set of conditions would match
    #[instrument(skip(self, conditions), fields(conditions = conditions.len()))]
    pub async fn preview_segment(
        &self,
        conditions: &[SegmentCondition],
    ) -> Result<SegmentPreview, ApiError> {
        let body = SegmentPreviewRequest { conditions: conditions.to_vec() };
        let request = OutgoingRequest::post("/segments/preview").json(&body)?;
        self.dispatch("segments.preview", request, params_of(&body)).await
    }

    // === Contact Operations ===

    #[instrument(skip(self, filter))]
    pub async fn list_contacts(&self, filter: &ContactFilter) -> Result<Page<Contact>, ApiError> {
        let request = OutgoingRequest::get("/contacts")
            .query_opt("consent", filter.consent)
            .query_opt("segment_id", filter.segment_id.as_deref())
            .query_opt("search", filter.search.as_deref())
            .query_opt("page", filter.page)
            .query_opt("limit", filter.limit);
        let params = json!({
            "consent": filter.consent.map(|consent| consent.as_str()),
            "segment_id": filter.segment_id,
            "search": filter.search,
            "page": filter.page,
            "limit": filter.limit,
        });

        let page: Page<Contact> = self.dispatch("contacts.list", request, params).await?;
        debug!(count = page.items.len(), total = page.total, "Contacts listed");
        Ok(page)
    }

    #[instrument(skip(self), fields(contact_id = %id))]
    pub async fn get_contact(&self, id: &str) -> Result<Contact, ApiError> {
        let request = OutgoingRequest::get(format!("/contacts/{}", encode(id)));
        self.dispatch("contacts.get", request, json!({ "id": id })).await
    }

    /// Create a contact
    ///
    /// # Errors
    ///
    /// Fails with 422 `invalid_phone` when the number is rejected
    #[instrument(skip(self, contact))]
    pub async fn create_contact(&self, contact: &NewContact) -> Result<Contact, ApiError> {
        let request = OutgoingRequest::post("/contacts").json(contact)?;
        self.dispatch("contacts.create", request, params_of(contact)).await
    }

    #[instrument(skip(self, update), fields(contact_id = %id))]
    pub async fn update_contact(
        &self,
        id: &str,
        update: &ContactUpdate,
    ) -> Result<Contact, ApiError> {
        let request = OutgoingRequest::put(format!("/contacts/{}", encode(id))).json(update)?;
        self.dispatch("contacts.update", request, with_id(id, update)).await
    }

    #[instrument(skip(self), fields(contact_id = %id))]
    pub async fn delete_contact(&self, id: &str) -> Result<Acknowledgement, ApiError> {
        let request = OutgoingRequest::delete(format!("/contacts/{}", encode(id)));
        self.acknowledge("contacts.delete", request, json!({ "id": id })).await
    }

    // === Automation Operations ===

    #[instrument(skip(self))]
    pub async fn list_automations(&self) -> Result<Vec<Automation>, ApiError> {
        self.dispatch("automations.list", OutgoingRequest::get("/automations"), Value::Null).await
    }

    #[instrument(skip(self), fields(automation_id = %id))]
    pub async fn get_automation(&self, id: &str) -> Result<Automation, ApiError> {
        let request = OutgoingRequest::get(format!("/automations/{}", encode(id)));
        self.dispatch("automations.get", request, json!({ "id": id })).await
    }

    #[instrument(skip(self, update), fields(automation_id = %id))]
    pub async fn update_automation(
        &self,
        id: &str,
        update: &AutomationUpdate,
    ) -> Result<Automation, ApiError> {
        let request =
            OutgoingRequest::put(format!("/automations/{}", encode(id))).json(update)?;
        self.dispatch("automations.update", request, with_id(id, update)).await
    }

    /// Enable or disable an automation
    #[instrument(skip(self), fields(automation_id = %id))]
    pub async fn toggle_automation(&self, id: &str, active: bool) -> Result<Automation, ApiError> {
        let body = AutomationToggle { active };
        let request =
            OutgoingRequest::post(format!("/automations/{}/toggle", encode(id))).json(&body)?;
        self.dispatch("automations.toggle", request, json!({ "id": id, "active": active })).await
    }

    // === Health ===

    /// Backend health; sent without a tenant
    ///
    /// # Errors
    ///
    /// Returns error if the backend is unreachable or unhealthy
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        let request = OutgoingRequest::get("/health");
        let method = request.method().clone();
        let call = self.client.execute_for_shop(request, None);
        match &self.observer {
            Some(observer) => observer.observe("health", &method, Value::Null, call).await,
            None => call.await,
        }
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        request: OutgoingRequest,
        params: Value,
    ) -> Result<T, ApiError> {
        let method = request.method().clone();
        let call = self.client.execute(request);
        match &self.observer {
            Some(observer) => observer.observe(endpoint, &method, params, call).await,
            None => call.await,
        }
    }

    /// Dispatch a call whose success may come back with no body
    async fn acknowledge(
        &self,
        endpoint: &'static str,
        request: OutgoingRequest,
        params: Value,
    ) -> Result<Acknowledgement, ApiError> {
        let ack: Option<Acknowledgement> = self.dispatch(endpoint, request, params).await?;
        Ok(ack.unwrap_or(Acknowledgement { success: true }))
    }
}

fn params_of<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn with_id<T: Serialize + ?Sized>(id: &str, value: &T) -> Value {
    match params_of(value) {
        Value::Object(mut map) => {
            map.insert("id".to_string(), Value::String(id.to_string()));
            Value::Object(map)
        }
        other => json!({ "id": id, "body": other }),
    }
}
