//! Decides whether a well-formed URL is worth showing as a clickable link.
//!
//! This is a denylist, not an allowlist: anything that parses and does not
//! contain a blocked substring in its host or host+path passes.

use std::sync::{PoisonError, RwLock};
use url::Url;

use crate::models::ClassifiedLinks;
use crate::normalize::with_https_scheme;

pub const DEFAULT_BLOCKED_PATTERNS: &[&str] = &[
    // consumer email
    "gmail.com",
    "yahoo.com",
    "outlook.com",
    "hotmail.com",
    "aol.com",
    "protonmail.com",
    "mail.com",
    "icloud.com",
    // search
    "google.com",
    "bing.com",
    "duckduckgo.com",
    "search.yahoo.com",
    "ask.com",
    "baidu.com",
    // social feeds
    "facebook.com",
    "twitter.com",
    "instagram.com",
    "tiktok.com",
    "linkedin.com/feed",
    "youtube.com",
    "snapchat.com",
    "discord.com",
    // placeholders
    "example.com",
    "localhost",
    "test.com",
    "placeholder.com",
    "127.0.0.1",
    "0.0.0.0",
    // redirect-only job listings
    "indeed.com/viewjob",
    "glassdoor.com/job",
    "monster.com",
    "careerbuilder.com",
    // scheme artifacts
    "javascript:",
    "mailto:",
    "tel:",
    "#",
    "void(0)",
    "null",
    "undefined",
    "about:blank",
    "data:",
    // news and content
    "techcrunch.com",
    "bloomberg.com",
    "reuters.com",
    "cnn.com",
    "bbc.com",
    "medium.com",
    "substack.com",
    // file storage
    "dropbox.com",
    "drive.google.com",
    "onedrive.com",
    "icloud.com/share",
    // throwaway hosting
    "github.io",
    "netlify.app",
    "vercel.app",
    "herokuapp.com",
    "replit.com",
];

const PLACEHOLDER_TOKENS: &[&str] = &[
    "",
    "n/a",
    "null",
    "undefined",
    "none",
    "tbd",
    "coming soon",
    "not available",
    "na",
];

/// Which field a URL was taken from. Only used to label log events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LinkContext {
    #[value(name = "apply_url")]
    ApplyUrl,
    #[value(name = "company_url")]
    CompanyUrl,
    #[value(name = "linkedin_url")]
    LinkedinUrl,
    #[value(name = "careers_url")]
    CareersUrl,
    #[value(name = "email")]
    Email,
    #[default]
    #[value(name = "unknown")]
    Unknown,
}

impl LinkContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkContext::ApplyUrl => "apply_url",
            LinkContext::CompanyUrl => "company_url",
            LinkContext::LinkedinUrl => "linkedin_url",
            LinkContext::CareersUrl => "careers_url",
            LinkContext::Email => "email",
            LinkContext::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for LinkContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateOptions {
    pub log_results: bool,
    pub context: LinkContext,
}

/// Why a URL was not considered actionable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("empty or missing URL")]
    Missing,
    #[error("placeholder value {0:?}")]
    Placeholder(String),
    #[error("non-navigable link {0:?}")]
    NonNavigable(String),
    #[error("too short to be a URL")]
    TooShort,
    #[error("contains '@' before the query string, likely an email scraped into a URL")]
    EmbeddedAt,
    #[error("not a parseable URL")]
    Unparseable,
    #[error("matches blocked pattern {0:?}")]
    Blocked(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlVerdict {
    pub is_valid: bool,
    pub reason: Option<Rejection>,
    pub original_url: String,
}

/// Blocked host/path substrings. Built once and handed to whoever renders
/// links; patterns added at runtime live as long as the instance.
#[derive(Debug)]
pub struct Denylist {
    patterns: RwLock<Vec<String>>,
}

impl Default for Denylist {
    fn default() -> Self {
        Self::new()
    }
}

impl Denylist {
    pub fn new() -> Self {
        Self::with_patterns(std::iter::empty::<&str>())
    }

    /// Built-in patterns followed by `extra`.
    pub fn with_patterns<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let list = Self::empty();
        for pattern in DEFAULT_BLOCKED_PATTERNS {
            list.add_blocked_pattern(pattern);
        }
        for pattern in extra {
            list.add_blocked_pattern(pattern.as_ref());
        }
        list
    }

    pub fn empty() -> Self {
        Self {
            patterns: RwLock::new(Vec::new()),
        }
    }

    /// Appends a pattern (trimmed, lowercased). Returns false when it was
    /// empty or already present.
    pub fn add_blocked_pattern(&self, pattern: &str) -> bool {
        let pattern = pattern.trim().to_lowercase();
        if pattern.is_empty() {
            return false;
        }
        let mut patterns = self.patterns.write().unwrap_or_else(PoisonError::into_inner);
        if patterns.contains(&pattern) {
            return false;
        }
        patterns.push(pattern);
        true
    }

    pub fn blocked_patterns(&self) -> Vec<String> {
        self.patterns
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn blocked_by(&self, host: &str, full_path: &str) -> Option<String> {
        self.patterns
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|p| host.contains(p.as_str()) || full_path.contains(p.as_str()))
            .cloned()
    }

    fn check(&self, url: Option<&str>) -> Result<(), Rejection> {
        let url = url.filter(|u| !u.is_empty()).ok_or(Rejection::Missing)?;
        let lower = url.trim().to_lowercase();

        if PLACEHOLDER_TOKENS.contains(&lower.as_str()) {
            return Err(Rejection::Placeholder(lower));
        }
        if lower.starts_with("javascript:")
            || lower.starts_with("mailto:")
            || lower.starts_with("tel:")
            || lower == "#"
            || lower.contains("void(0)")
        {
            return Err(Rejection::NonNavigable(lower));
        }
        if lower.chars().count() < 4 {
            return Err(Rejection::TooShort);
        }

        let before_query = lower.split('?').next().unwrap_or_default();
        if before_query.contains('@') {
            return Err(Rejection::EmbeddedAt);
        }

        let parsed = Url::parse(&with_https_scheme(&lower)).map_err(|_| Rejection::Unparseable)?;
        let host = parsed.host_str().unwrap_or_default().to_lowercase();
        let full_path = format!("{}{}", host, parsed.path().to_lowercase());

        match self.blocked_by(&host, &full_path) {
            Some(pattern) => Err(Rejection::Blocked(pattern)),
            None => Ok(()),
        }
    }

    pub fn is_valid_actionable_url(&self, url: Option<&str>, options: &ValidateOptions) -> bool {
        let result = self.check(url);
        if options.log_results {
            match &result {
                Ok(()) => tracing::info!(
                    context = %options.context,
                    url = url.unwrap_or_default(),
                    "actionable url"
                ),
                Err(reason) => tracing::info!(
                    context = %options.context,
                    url = url.unwrap_or_default(),
                    %reason,
                    "rejected url"
                ),
            }
        }
        result.is_ok()
    }

    pub fn validate_url_with_details(&self, url: Option<&str>, context: LinkContext) -> UrlVerdict {
        let result = self.check(url);
        tracing::debug!(%context, url = url.unwrap_or_default(), ok = result.is_ok(), "validated url");
        UrlVerdict {
            is_valid: result.is_ok(),
            reason: result.err(),
            original_url: url.unwrap_or_default().to_string(),
        }
    }

    /// Copy of `links` with every slot that fails validation cleared.
    pub fn actionable(&self, links: &ClassifiedLinks, log_results: bool) -> ClassifiedLinks {
        let keep = |url: &Option<String>, context: LinkContext| -> Option<String> {
            let options = ValidateOptions {
                log_results,
                context,
            };
            url.clone()
                .filter(|u| self.is_valid_actionable_url(Some(u.as_str()), &options))
        };

        let mut out = ClassifiedLinks {
            company_url: keep(&links.company_url, LinkContext::CompanyUrl),
            roles_url: keep(&links.roles_url, LinkContext::CareersUrl),
            apply_url: keep(&links.apply_url, LinkContext::ApplyUrl),
            linkedin_url: keep(&links.linkedin_url, LinkContext::LinkedinUrl),
            email_href: links.email_href.clone(),
            email: links.email.clone(),
            ..Default::default()
        };
        out.refresh_flags();
        out
    }
}
