//! Points ledger, partner catalog and check-in endpoints.

use tracing::debug;

use crate::models::{
    CheckIn, CheckInReceipt, PartnerCategory, PartnerCompany, ProfileOverview, Promotion,
};

use super::client::ApiRequest;
use super::{ApiClient, ApiError};

impl ApiClient {
    /// Fetch the current profile with points balance and transactions
    pub async fn fetch_profile_overview(&self) -> Result<ProfileOverview, ApiError> {
        self.request(ApiRequest::get("/employees/me")).await
    }

    pub async fn fetch_partners(&self) -> Result<Vec<PartnerCompany>, ApiError> {
        let partners: Vec<PartnerCompany> =
            self.request(ApiRequest::get("/partners/companies")).await?;
        debug!(count = partners.len(), "Fetched partner companies");
        Ok(partners)
    }

    pub async fn fetch_partner(&self, company_id: &str) -> Result<PartnerCompany, ApiError> {
        self.request(ApiRequest::get(format!("/partners/companies/{}", company_id)))
            .await
    }

    /// Fetch promotions, optionally only those of one partner
    pub async fn fetch_promotions(&self, company_id: Option<&str>) -> Result<Vec<Promotion>, ApiError> {
        let mut request = ApiRequest::get("/partners/promotions");
        if let Some(id) = company_id {
            request = request.query("company_id", id);
        }
        self.request(request).await
    }

    pub async fn fetch_categories(&self) -> Result<Vec<PartnerCategory>, ApiError> {
        self.request(ApiRequest::get("/partners/categories")).await
    }

    /// Submit today's check-in
    pub async fn submit_check_in(&self, check_in: &CheckIn) -> Result<CheckInReceipt, ApiError> {
        let receipt: CheckInReceipt = self
            .request(ApiRequest::post("/check-ins").json(check_in)?)
            .await?;
        debug!(points = receipt.points_earned, "Check-in recorded");
        Ok(receipt)
    }
}
