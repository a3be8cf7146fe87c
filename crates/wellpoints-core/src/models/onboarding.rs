use serde::{Deserialize, Serialize};

/// Identity data the employee types on the first-access screen
#[derive(Debug, Clone, Serialize)]
pub struct OnboardingCheck {
    /// CPF, digits only
    pub document: String,
    pub name: String,
    /// ISO date (YYYY-MM-DD)
    pub birth_date: String,
    pub registration: String,
}

impl OnboardingCheck {
    pub fn new(document: &str, name: &str, birth_date: chrono::NaiveDate, registration: &str) -> Self {
        Self {
            document: document.chars().filter(|c| c.is_ascii_digit()).collect(),
            name: name.trim().to_string(),
            birth_date: birth_date.format("%Y-%m-%d").to_string(),
            registration: registration.trim().to_string(),
        }
    }
}

/// Employee record matched by the onboarding check
#[derive(Debug, Clone, Deserialize)]
pub struct OnboardingCandidate {
    pub user_uuid: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Clone, Serialize)]
pub struct OnboardingCompletion {
    pub user_uuid: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

impl OnboardingCompletion {
    pub fn passwords_match(&self) -> bool {
        self.password == self.password_confirmation
    }
}

impl std::fmt::Debug for OnboardingCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnboardingCompletion")
            .field("user_uuid", &self.user_uuid)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OnboardingResult {
    pub access_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_onboarding_check_normalizes_document() {
        let check = OnboardingCheck::new(
            "123.456.789-09",
            " Maria Souza ",
            NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
            " 12345",
        );
        assert_eq!(check.document, "12345678909");
        assert_eq!(check.name, "Maria Souza");
        assert_eq!(check.birth_date, "1990-05-17");
        assert_eq!(check.registration, "12345");
    }

    #[test]
    fn test_completion_debug_hides_passwords() {
        let completion = OnboardingCompletion {
            user_uuid: "u-1".to_string(),
            email: "maria@example.com".to_string(),
            password: "s3cret!".to_string(),
            password_confirmation: "s3cret!".to_string(),
        };
        assert!(completion.passwords_match());
        assert!(!format!("{:?}", completion).contains("s3cret"));
    }
}
