use serde::{Deserialize, Serialize};

use crate::domain::Company;

/// Public company card shown on postings, profiles, and the company page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyCard {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
}

impl From<Company> for CompanyCard {
    fn from(company: Company) -> Self {
        CompanyCard {
            id: company.id,
            name: company.name,
            description: company.description,
            logo_url: company.logo_url,
            website: company.website,
            address: company.address,
            city: company.city,
        }
    }
}

/// Company fields an employer maintains from their profile. The logo is
/// only overwritten when a new URL is sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyUpdate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}
