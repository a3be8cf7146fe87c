use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Category id that matches every partner
pub const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct PartnerCompany {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub address: String,
    /// Distance from the employee in kilometers, when the backend knows it
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

impl PartnerCompany {
    /// Case-insensitive name match combined with a category match
    pub fn matches(&self, query: &str, category: &str) -> bool {
        let query = query.trim().to_lowercase();
        let matches_search = query.is_empty() || self.name.to_lowercase().contains(&query);
        let matches_category = category == ALL_CATEGORIES || self.category == category;
        matches_search && matches_category
    }

    pub fn distance_display(&self) -> String {
        match self.distance_km {
            Some(km) if km < 1.0 => format!("{:.0} m", km * 1000.0),
            Some(km) => format!("{:.1} km", km),
            None => "-".to_string(),
        }
    }
}

/// Filter partners for a search query and category, featured partners first
pub fn search_partners<'a>(
    partners: &'a [PartnerCompany],
    query: &str,
    category: &str,
) -> Vec<&'a PartnerCompany> {
    let mut found: Vec<&PartnerCompany> = partners
        .iter()
        .filter(|p| p.matches(query, category))
        .collect();
    // Stable sort keeps backend order within each group
    found.sort_by_key(|p| !p.featured);
    found
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct PartnerCategory {
    pub id: String,
    pub label: String,
}

/// Coupon offered by a partner in exchange for points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Promotion {
    pub id: String,
    pub company_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub points: i64,
    pub valid_until: Option<NaiveDate>,
}

impl Promotion {
    pub fn is_affordable(&self, balance: i64) -> bool {
        balance >= self.points
    }

    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.valid_until.map(|d| d < today).unwrap_or(false)
    }
}
