use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::normalize::{as_http_url, clean_email, has_http_scheme, normalize_optional_string};

/// A scraped founder/company record. Field names vary between scrape
/// sources, so every known alias is kept as its own field and the classifier
/// decides priority. Placeholder values are already `None` here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEntry {
    #[serde(default, deserialize_with = "optional_text")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "optional_text")]
    pub company_url: Option<String>,
    #[serde(default, rename = "companyUrl", deserialize_with = "optional_text")]
    pub company_url_camel: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub website: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub site: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub homepage: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub url_website: Option<String>,

    #[serde(default, deserialize_with = "optional_text")]
    pub linkedinurl: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub linkedin_url: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub linkedin: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub li: Option<String>,

    #[serde(default, deserialize_with = "flex_field")]
    pub url: FlexField,
    #[serde(default, deserialize_with = "optional_text")]
    pub roles_url: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub careers: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub jobs_url: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub open_roles_url: Option<String>,

    #[serde(default, deserialize_with = "optional_text")]
    pub apply_url: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub email: Option<String>,

    /// Everything the classifier does not read.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawEntry {
    pub fn display_name(&self) -> Option<&str> {
        self.company.as_deref().or(self.name.as_deref())
    }
}

/// The legacy `url` field holds a careers link in most scrape sources and
/// the founder's email in older ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FlexField {
    Url(Url),
    Email(String),
    Unknown(String),
    #[default]
    Absent,
}

impl FlexField {
    pub fn decode(raw: &str) -> Self {
        let Some(value) = normalize_optional_string(raw) else {
            return FlexField::Absent;
        };
        if !has_http_scheme(&value) {
            if let Some(email) = clean_email(&value) {
                return FlexField::Email(email);
            }
        }
        match as_http_url(&value) {
            Some(url) => FlexField::Url(url),
            None => FlexField::Unknown(value),
        }
    }

    pub fn as_url(&self) -> Option<&Url> {
        match self {
            FlexField::Url(url) => Some(url),
            _ => None,
        }
    }

    pub fn as_email(&self) -> Option<&str> {
        match self {
            FlexField::Email(email) => Some(email),
            _ => None,
        }
    }
}

fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => normalize_optional_string(&s),
        _ => None,
    })
}

fn flex_field<'de, D>(deserializer: D) -> Result<FlexField, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => FlexField::decode(&s),
        _ => FlexField::Absent,
    })
}

/// Result of slot assignment for one record. Recomputed on every use,
/// never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassifiedLinks {
    #[serde(rename = "companyUrl")]
    pub company_url: Option<String>,
    #[serde(rename = "rolesUrl")]
    pub roles_url: Option<String>,
    pub apply_url: Option<String>,
    #[serde(rename = "linkedinUrl")]
    pub linkedin_url: Option<String>,
    #[serde(rename = "emailHref")]
    pub email_href: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "hasEmail")]
    pub has_email: bool,
    #[serde(rename = "hasLinkedIn")]
    pub has_linkedin: bool,
    #[serde(rename = "hasCompanyUrl")]
    pub has_company_url: bool,
    #[serde(rename = "hasApplyUrl")]
    pub has_apply_url: bool,
}

impl ClassifiedLinks {
    pub(crate) fn refresh_flags(&mut self) {
        self.has_email = self.email.is_some();
        self.has_linkedin = self.linkedin_url.is_some();
        self.has_company_url = self.company_url.is_some();
        self.has_apply_url = self.apply_url.is_some();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutreachStatus {
    Saved,
    Contacted,
    Replied,
    Interviewing,
    Closed,
}

impl OutreachStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutreachStatus::Saved => "saved",
            OutreachStatus::Contacted => "contacted",
            OutreachStatus::Replied => "replied",
            OutreachStatus::Interviewing => "interviewing",
            OutreachStatus::Closed => "closed",
        }
    }
}

impl std::str::FromStr for OutreachStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "saved" => Ok(OutreachStatus::Saved),
            "contacted" => Ok(OutreachStatus::Contacted),
            "replied" => Ok(OutreachStatus::Replied),
            "interviewing" => Ok(OutreachStatus::Interviewing),
            "closed" => Ok(OutreachStatus::Closed),
            other => Err(anyhow::anyhow!("Unknown outreach status: {}", other)),
        }
    }
}

impl std::fmt::Display for OutreachStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub id: i64,
    pub company: Option<String>,
    pub raw: RawEntry,
    pub status: OutreachStatus,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Entry {
    /// Short age label ("just now", "5h ago", "3d ago") from SQLite's
    /// `datetime('now')` format.
    pub fn age_label(&self, now: NaiveDateTime) -> String {
        format_age(&self.created_at, now)
    }
}

pub fn format_age(timestamp: &str, now: NaiveDateTime) -> String {
    let Ok(then) = NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S") else {
        return "-".to_string();
    };
    let elapsed = now - then;
    if elapsed.num_days() >= 1 {
        format!("{}d ago", elapsed.num_days())
    } else if elapsed.num_hours() >= 1 {
        format!("{}h ago", elapsed.num_hours())
    } else if elapsed.num_minutes() >= 1 {
        format!("{}m ago", elapsed.num_minutes())
    } else {
        "just now".to_string()
    }
}

#[derive(Debug, Clone)]
pub struct StatusChange {
    pub id: i64,
    pub entry_id: i64,
    pub status: OutreachStatus,
    pub note: Option<String>,
    pub changed_at: String,
}
