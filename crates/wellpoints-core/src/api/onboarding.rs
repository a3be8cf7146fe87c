//! First-access registration endpoints.
//!
//! These run before the employee has a session, so they usually go out
//! without a bearer token.

use crate::models::{OnboardingCandidate, OnboardingCheck, OnboardingCompletion, OnboardingResult};

use super::client::ApiRequest;
use super::{ApiClient, ApiError};

impl ApiClient {
    /// Verify the employee's identity against HR records
    pub async fn check_onboarding(&self, check: &OnboardingCheck) -> Result<OnboardingCandidate, ApiError> {
        self.request(ApiRequest::post("/onboarding/check").json(check)?)
            .await
    }

    /// Create the account's password; returns an access token for the new session
    pub async fn complete_onboarding(
        &self,
        completion: &OnboardingCompletion,
    ) -> Result<OnboardingResult, ApiError> {
        self.request(ApiRequest::post("/onboarding/complete").json(completion)?)
            .await
    }
}
