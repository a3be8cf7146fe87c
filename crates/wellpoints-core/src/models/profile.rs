use serde::{Deserialize, Serialize};

use super::points::Transaction;

/// Display name used until the real profile is fetched after onboarding
pub const PLACEHOLDER_NAME: &str = "Usuário";

/// Snapshot of the authenticated employee.
/// Replaced wholesale on each sign-in, never merged field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct UserProfile {
    pub employee_id: String,
    pub name: String,
    pub registration: String,
    pub department: String,
}

impl UserProfile {
    /// Minimal profile for sessions created by the onboarding flow,
    /// whose completion endpoint returns only an access token.
    pub fn placeholder() -> Self {
        Self {
            employee_id: String::new(),
            name: PLACEHOLDER_NAME.to_string(),
            registration: String::new(),
            department: String::new(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.employee_id.is_empty() && self.registration.is_empty()
    }

    /// First name for greetings ("Olá, Maria")
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

/// Current profile plus points balance and recent ledger entries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ProfileOverview {
    pub profile: UserProfile,
    #[serde(default)]
    pub points_balance: i64,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_profile() {
        let profile = UserProfile::placeholder();
        assert!(profile.is_placeholder());
        assert_eq!(profile.name, "Usuário");
        assert!(profile.department.is_empty());
    }

    #[test]
    fn test_first_name() {
        let profile = UserProfile {
            employee_id: "7".to_string(),
            name: "Maria  da Silva".to_string(),
            registration: "12345".to_string(),
            department: "RH".to_string(),
        };
        assert_eq!(profile.first_name(), "Maria");
        assert!(!profile.is_placeholder());
    }

    #[test]
    fn test_profile_json_shape() {
        let json = r#"{"employee_id":"7","name":"Ana","registration":"12345","department":"TI"}"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.registration, "12345");
        assert_eq!(serde_json::to_string(&profile).unwrap(), json);
    }
}
