use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub ticker: String,
    pub name: String,
    pub logo_url: String,
    pub summary: String,
    pub website: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
}
