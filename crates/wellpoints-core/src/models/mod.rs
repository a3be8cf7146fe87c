//! Domain models for the rewards program.
//!
//! Wire shapes follow the backend's snake_case JSON. With the `ts`
//! feature enabled the public models also export TypeScript bindings.

pub mod checkin;
pub mod onboarding;
pub mod partner;
pub mod points;
pub mod profile;

pub use checkin::{CheckIn, CheckInReceipt, Mood, ParseMoodError};
pub use onboarding::{OnboardingCandidate, OnboardingCheck, OnboardingCompletion, OnboardingResult};
pub use partner::{search_partners, PartnerCategory, PartnerCompany, Promotion, ALL_CATEGORIES};
pub use points::{ParseFilterError, PointsStatement, Transaction, TransactionFilter, TransactionKind};
pub use profile::{ProfileOverview, UserProfile};
