//! Assigns the candidate URLs of a scraped record to the four link slots.
//!
//! Each slot has an ordered candidate list and a predicate. Slots are filled
//! in a fixed order, the first eligible candidate wins, and a URL taken by one
//! slot (compared by canonical key) is never offered to another.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

use crate::models::{ClassifiedLinks, RawEntry};
use crate::normalize::{as_http_url, canonical_key, clean_email, mailto_href, with_https_scheme};

const JOB_BOARD_HOSTS: &[&str] = &[
    "greenhouse.io",
    "lever.co",
    "workable.com",
    "ashbyhq.com",
    "myworkdayjobs.com",
    "jobvite.com",
    "bamboohr.com",
];

const BAD_COMPANY_HOSTS: &[&str] = &["gmail.com", "mail.google.com"];

// Substring match, so "/jobsite-builder" counts as a careers path too.
static JOB_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)careers|jobs|open-roles|apply|join-us").expect("valid job path pattern")
});

static LINKEDIN_HOST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(^|\.)linkedin\.com$").expect("valid linkedin pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    LinkedIn,
    Apply,
    Roles,
    Company,
}

/// Which group of record fields a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Company,
    LinkedIn,
    Flex,
    Apply,
}

struct SlotRule {
    slot: Slot,
    sources: &'static [Source],
    accepts: fn(&Url) -> bool,
}

const RULES: &[SlotRule] = &[
    SlotRule {
        slot: Slot::LinkedIn,
        sources: &[Source::LinkedIn, Source::Company, Source::Flex, Source::Apply],
        accepts: linkedin_host,
    },
    SlotRule {
        slot: Slot::Apply,
        sources: &[Source::Apply],
        accepts: |_| true,
    },
    SlotRule {
        slot: Slot::Roles,
        sources: &[Source::Flex, Source::Company],
        accepts: job_board,
    },
    SlotRule {
        slot: Slot::Company,
        sources: &[Source::Company, Source::Flex],
        accepts: company_site,
    },
];

fn linkedin_host(url: &Url) -> bool {
    url.host_str().is_some_and(|h| LINKEDIN_HOST.is_match(h))
}

fn job_board(url: &Url) -> bool {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    JOB_BOARD_HOSTS.iter().any(|board| host.contains(board)) || JOB_PATH.is_match(url.path())
}

fn bad_company_host(url: &Url) -> bool {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    BAD_COMPANY_HOSTS.contains(&host.as_str())
}

fn company_site(url: &Url) -> bool {
    !linkedin_host(url) && !job_board(url) && !bad_company_host(url)
}

fn parse_loose(url: &str) -> Option<Url> {
    Url::parse(&with_https_scheme(url.trim())).ok()
}

pub fn is_linkedin_url(url: Option<&str>) -> bool {
    url.and_then(parse_loose).is_some_and(|u| linkedin_host(&u))
}

pub fn is_job_board_url(url: &str) -> bool {
    parse_loose(url).is_some_and(|u| job_board(&u))
}

pub fn is_bad_company_domain(url: &str) -> bool {
    parse_loose(url).is_some_and(|u| bad_company_host(&u))
}

/// First alias that coerces to an absolute URL, in the given priority order.
fn first_url(aliases: &[&Option<String>]) -> Option<Url> {
    aliases
        .iter()
        .filter_map(|alias| alias.as_deref())
        .find_map(as_http_url)
}

struct Candidates {
    company: Option<Url>,
    linkedin: Option<Url>,
    flex: Option<Url>,
    apply: Option<Url>,
}

impl Candidates {
    fn from_entry(entry: &RawEntry) -> Self {
        let company = first_url(&[
            &entry.company_url,
            &entry.company_url_camel,
            &entry.website,
            &entry.site,
            &entry.homepage,
            &entry.url_website,
        ]);
        let linkedin = first_url(&[
            &entry.linkedinurl,
            &entry.linkedin_url,
            &entry.linkedin,
            &entry.li,
        ]);
        let flex = entry.url.as_url().cloned().or_else(|| {
            first_url(&[
                &entry.roles_url,
                &entry.careers,
                &entry.jobs_url,
                &entry.open_roles_url,
            ])
        });
        let apply = first_url(&[&entry.apply_url]);

        Self {
            company,
            linkedin,
            flex,
            apply,
        }
    }

    fn get(&self, source: Source) -> Option<&Url> {
        match source {
            Source::Company => self.company.as_ref(),
            Source::LinkedIn => self.linkedin.as_ref(),
            Source::Flex => self.flex.as_ref(),
            Source::Apply => self.apply.as_ref(),
        }
    }
}

pub fn choose_links(entry: &RawEntry) -> ClassifiedLinks {
    let candidates = Candidates::from_entry(entry);
    let mut used: HashSet<String> = HashSet::new();
    let mut links = ClassifiedLinks::default();

    for rule in RULES {
        let chosen = rule
            .sources
            .iter()
            .filter_map(|source| candidates.get(*source))
            .find(|&url| (rule.accepts)(url) && !used.contains(&canonical_key(url)));

        let Some(url) = chosen else { continue };
        used.insert(canonical_key(url));
        tracing::trace!(slot = ?rule.slot, url = %url, "slot assigned");

        let value = Some(url.to_string());
        match rule.slot {
            Slot::LinkedIn => links.linkedin_url = value,
            Slot::Apply => links.apply_url = value,
            Slot::Roles => links.roles_url = value,
            Slot::Company => links.company_url = value,
        }
    }

    links.email = entry
        .email
        .as_deref()
        .and_then(clean_email)
        .or_else(|| entry.url.as_email().map(str::to_string));
    links.email_href = mailto_href(links.email.as_deref());
    links.refresh_flags();
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::canonicalize_url;
    use serde_json::json;

    fn entry(value: serde_json::Value) -> RawEntry {
        serde_json::from_value(value).unwrap()
    }

    fn slots(links: &ClassifiedLinks) -> Vec<String> {
        [
            &links.linkedin_url,
            &links.apply_url,
            &links.roles_url,
            &links.company_url,
        ]
        .into_iter()
        .flatten()
        .filter_map(|u| canonicalize_url(u))
        .collect()
    }

    #[test]
    fn test_full_record() {
        let links = choose_links(&entry(json!({
            "company": "Acme Inc",
            "linkedinurl": "linkedin.com/company/acme",
            "url": "acme.com/careers",
            "apply_url": "https://jobs.lever.co/acme/123",
            "email": "jane@acme.com",
        })));
        assert_eq!(links.linkedin_url.as_deref(), Some("https://linkedin.com/company/acme"));
        assert_eq!(links.apply_url.as_deref(), Some("https://jobs.lever.co/acme/123"));
        assert_eq!(links.roles_url.as_deref(), Some("https://acme.com/careers"));
        assert_eq!(links.company_url, None);
        assert_eq!(links.email_href.as_deref(), Some("mailto:jane@acme.com"));
        assert!(links.has_email && links.has_linkedin && links.has_apply_url);
        assert!(!links.has_company_url);
    }

    #[test]
    fn test_all_na_record() {
        let links = choose_links(&entry(json!({
            "company": "N/A",
            "name": "-",
            "email": "none",
            "linkedinurl": "",
            "company_url": "tbd",
        })));
        assert_eq!(links, ClassifiedLinks::default());
    }

    #[test]
    fn test_legacy_email_in_url_field() {
        let links = choose_links(&entry(json!({ "url": "founder@acme.com" })));
        assert_eq!(links.email.as_deref(), Some("founder@acme.com"));
        assert_eq!(links.email_href.as_deref(), Some("mailto:founder@acme.com"));
        assert_eq!(links.company_url, None);
        assert_eq!(links.roles_url, None);
    }

    #[test]
    fn test_email_in_url_falls_through_to_roles_url() {
        let links = choose_links(&entry(json!({
            "url": "founder@acme.com",
            "roles_url": "acme.com/about",
        })));
        assert_eq!(links.company_url.as_deref(), Some("https://acme.com/about"));
        assert_eq!(links.roles_url, None);
        assert_eq!(links.email.as_deref(), Some("founder@acme.com"));
    }

    #[test]
    fn test_email_field_beats_legacy_url_email() {
        let links = choose_links(&entry(json!({
            "url": "old@acme.com",
            "email": "mailto:new@acme.com",
        })));
        assert_eq!(links.email.as_deref(), Some("new@acme.com"));
    }

    #[test]
    fn test_linkedin_priority_prefers_explicit_field() {
        let links = choose_links(&entry(json!({
            "linkedinurl": "https://linkedin.com/company/acme",
            "company_url": "https://linkedin.com/in/someone",
        })));
        assert_eq!(links.linkedin_url.as_deref(), Some("https://linkedin.com/company/acme"));
        // the second LinkedIn URL is not a company site either
        assert_eq!(links.company_url, None);
    }

    #[test]
    fn test_linkedin_falls_back_to_company_field() {
        let links = choose_links(&entry(json!({
            "website": "www.linkedin.com/company/acme",
            "homepage": "acme.com",
        })));
        // website wins the company alias race, then moves to the LinkedIn slot
        assert_eq!(links.linkedin_url.as_deref(), Some("https://www.linkedin.com/company/acme"));
        assert_eq!(links.company_url, None);
    }

    #[test]
    fn test_same_url_in_two_fields_fills_one_slot() {
        let links = choose_links(&entry(json!({
            "company_url": "https://acme.com/careers",
            "url": "https://acme.com/careers/",
        })));
        assert_eq!(links.roles_url.as_deref(), Some("https://acme.com/careers/"));
        assert_eq!(links.company_url, None);
        assert_eq!(slots(&links).len(), 1);
    }

    #[test]
    fn test_apply_url_not_reused_by_roles() {
        let links = choose_links(&entry(json!({
            "apply_url": "https://acme.com/jobs/42",
            "roles_url": "https://ACME.com/jobs/42?ref=x",
            "company_url": "acme.com",
        })));
        assert_eq!(links.apply_url.as_deref(), Some("https://acme.com/jobs/42"));
        assert_eq!(links.roles_url, None);
        assert_eq!(links.company_url.as_deref(), Some("https://acme.com/"));
    }

    #[test]
    fn test_no_duplicate_slots_across_aliases() {
        let records = [
            json!({ "company_url": "acme.com", "url": "acme.com", "apply_url": "acme.com" }),
            json!({ "linkedin": "linkedin.com/in/x", "url": "linkedin.com/in/x/", "apply_url": "https://linkedin.com/in/x" }),
            json!({ "site": "jobs.lever.co/acme", "careers": "jobs.lever.co/acme", "apply_url": "jobs.lever.co/acme" }),
        ];
        for record in records {
            let links = choose_links(&entry(record));
            let keys = slots(&links);
            let unique: HashSet<_> = keys.iter().collect();
            assert_eq!(keys.len(), unique.len(), "{:?}", links);
        }
    }

    #[test]
    fn test_company_slot_skips_gmail_and_job_boards() {
        let links = choose_links(&entry(json!({
            "company_url": "https://gmail.com",
            "url": "https://boards.greenhouse.io/acme",
        })));
        assert_eq!(links.company_url, None);
        assert_eq!(links.roles_url.as_deref(), Some("https://boards.greenhouse.io/acme"));
    }

    #[test]
    fn test_company_from_flex_when_not_careers() {
        let links = choose_links(&entry(json!({ "url": "acme.io" })));
        assert_eq!(links.company_url.as_deref(), Some("https://acme.io/"));
        assert_eq!(links.roles_url, None);
    }

    #[test]
    fn test_alias_order_within_group() {
        let links = choose_links(&entry(json!({
            "company_url": "n/a",
            "companyUrl": "first.com",
            "website": "second.com",
        })));
        assert_eq!(links.company_url.as_deref(), Some("https://first.com/"));
    }

    #[test]
    fn test_predicates() {
        assert!(is_linkedin_url(Some("https://www.LinkedIn.com/in/jane")));
        assert!(is_linkedin_url(Some("linkedin.com/company/acme")));
        assert!(!is_linkedin_url(Some("https://notlinkedin.com/in/jane")));
        assert!(!is_linkedin_url(None));

        assert!(is_job_board_url("https://acme.myworkdayjobs.com/en-US/External"));
        assert!(is_job_board_url("acme.com/join-us"));
        assert!(is_job_board_url("https://acme.com/Careers"));
        assert!(!is_job_board_url("https://acme.com/about"));
        assert!(!is_job_board_url("https://"));

        assert!(is_bad_company_domain("gmail.com"));
        assert!(is_bad_company_domain("https://mail.google.com/mail/u/0"));
        assert!(!is_bad_company_domain("https://acme.com"));
    }
}
