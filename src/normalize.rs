//! String-level cleanup for scraped link fields: placeholder detection,
//! URL coercion, canonical comparison keys, domain and email extraction.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static NA_STRIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s./\\_\-–—⁄]").expect("valid NA strip pattern"));

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

static SCHEME_AND_WWW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://(www\.)?").expect("valid scheme pattern"));

const NA_WORDS: &[&str] = &["na", "none", "null", "undefined", "tbd"];

fn is_zero_width(c: char) -> bool {
    matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}')
}

fn strip_zero_width(raw: &str) -> String {
    raw.chars().filter(|c| !is_zero_width(*c)).collect()
}

/// True when a scraped value means "not available": empty, `-`, `N/A`,
/// `none`, `null`, `undefined`, `tbd` and their punctuation/case variants.
pub fn is_na(raw: &str) -> bool {
    let cleaned = strip_zero_width(raw);
    let trimmed = cleaned.trim();
    if trimmed.is_empty() || trimmed == "-" || trimmed.eq_ignore_ascii_case("n/a") {
        return true;
    }

    let collapsed = NA_STRIP.replace_all(trimmed, "").to_lowercase();
    collapsed.is_empty() || NA_WORDS.contains(&collapsed.as_str())
}

/// Converts a raw scraped value into a real optional. Applied once when a
/// record is decoded so the rest of the crate never re-checks placeholders.
pub fn normalize_optional_string(raw: &str) -> Option<String> {
    if is_na(raw) {
        return None;
    }
    Some(strip_zero_width(raw).trim().to_string())
}

pub(crate) fn has_http_scheme(raw: &str) -> bool {
    let lower = raw.get(..8).unwrap_or(raw).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

pub(crate) fn with_https_scheme(raw: &str) -> String {
    if has_http_scheme(raw) {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    }
}

/// Coerces a URL, bare domain or path-qualified domain into an absolute URL.
pub fn as_http_url(raw: &str) -> Option<Url> {
    if is_na(raw) {
        return None;
    }
    let trimmed = strip_zero_width(raw);
    Url::parse(&with_https_scheme(trimmed.trim())).ok()
}

/// Comparison key for an already parsed URL: scheme, lowercased host and
/// port, path without a trailing slash. Query and fragment are dropped.
pub fn canonical_key(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    let authority = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    };
    let path = url.path();
    let path = path.strip_suffix('/').unwrap_or(path);
    format!("{}://{}{}", url.scheme(), authority, path)
}

/// Canonical comparison key for a URL string, used only for deduplication.
pub fn canonicalize_url(url: &str) -> Option<String> {
    Url::parse(url.trim()).ok().map(|u| canonical_key(&u))
}

/// Extracts a lowercased domain from a URL, bare domain, email or `mailto:`.
pub fn get_domain_from_url(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let is_mailto = trimmed
        .get(..7)
        .is_some_and(|p| p.eq_ignore_ascii_case("mailto:"));
    if is_mailto || (trimmed.contains('@') && !has_http_scheme(trimmed)) {
        let (_, domain) = trimmed.rsplit_once('@')?;
        let domain = domain.split(['?', '/', '>']).next().unwrap_or_default();
        let domain = domain.trim().to_lowercase();
        return (!domain.is_empty()).then_some(domain);
    }

    match Url::parse(&with_https_scheme(trimmed)) {
        Ok(url) => {
            let host = url.host_str()?.to_lowercase();
            let host = host.strip_prefix("www.").map(str::to_string).unwrap_or(host);
            (!host.is_empty()).then_some(host)
        }
        Err(e) => {
            tracing::debug!(input = trimmed, error = %e, "domain fallback to string split");
            let rest = SCHEME_AND_WWW.replace(trimmed, "");
            let domain = rest.split('/').next().unwrap_or_default().to_lowercase();
            (!domain.is_empty()).then_some(domain)
        }
    }
}

/// Returns the bare address when `raw` looks like an email, with or without
/// a `mailto:` prefix.
pub fn clean_email(raw: &str) -> Option<String> {
    if is_na(raw) {
        return None;
    }
    let cleaned = strip_zero_width(raw);
    let trimmed = cleaned.trim();
    let address = match trimmed.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("mailto:") => trimmed[7..].trim(),
        _ => trimmed,
    };
    EMAIL_SHAPE.is_match(address).then(|| address.to_string())
}

pub fn mailto_href(email: Option<&str>) -> Option<String> {
    email.map(|e| format!("mailto:{}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_na_placeholder_variants() {
        for value in [
            "", "  ", "N/A", "n/a", "NA", "na", "-", "none", "None", "NULL", "undefined", "TBD",
            "N.A.", "n_a", " - ", "\u{200B}N/A\u{200B}", "n–a", "---",
        ] {
            assert!(is_na(value), "{:?} should be NA", value);
        }
    }

    #[test]
    fn test_is_na_real_values() {
        for value in ["acme.com", "Nathan", "nano", "https://na.com", "jane@acme.com", "0"] {
            assert!(!is_na(value), "{:?} should not be NA", value);
        }
    }

    #[test]
    fn test_is_na_invariant_under_case_space_and_dashes() {
        for value in ["n/a", "na", "-", "none", "null", "undefined", "tbd", "N-A", "n.a"] {
            assert!(is_na(value));
            assert!(is_na(&value.to_uppercase()), "{:?} upper", value);
            assert!(is_na(&format!(" {} ", value)), "{:?} padded", value);
            assert!(is_na(&value.replace('-', "—")), "{:?} em dash", value);
        }
    }

    #[test]
    fn test_normalize_optional_string() {
        assert_eq!(normalize_optional_string("  Acme Inc "), Some("Acme Inc".to_string()));
        assert_eq!(normalize_optional_string("acme\u{200B}.com"), Some("acme.com".to_string()));
        assert_eq!(normalize_optional_string("N/A"), None);
        assert_eq!(normalize_optional_string(""), None);
    }

    #[test]
    fn test_as_http_url_adds_scheme() {
        let url = as_http_url("linkedin.com/company/acme").unwrap();
        assert_eq!(url.as_str(), "https://linkedin.com/company/acme");

        let url = as_http_url("  acme.com ").unwrap();
        assert_eq!(url.as_str(), "https://acme.com/");

        let url = as_http_url("HTTP://acme.com/jobs").unwrap();
        assert_eq!(url.as_str(), "http://acme.com/jobs");
    }

    #[test]
    fn test_as_http_url_rejects_garbage() {
        assert!(as_http_url("none").is_none());
        assert!(as_http_url("").is_none());
        assert!(as_http_url("not a url").is_none());
        assert!(as_http_url("https://").is_none());
    }

    #[test]
    fn test_canonicalize_url() {
        // host case folds, path case is kept
        assert_eq!(
            canonicalize_url("HTTPS://Example.com/Path/"),
            canonicalize_url("https://example.com/Path")
        );
        assert_ne!(
            canonicalize_url("https://example.com/Path"),
            canonicalize_url("https://example.com/path")
        );
        assert_eq!(
            canonicalize_url("https://acme.com/careers?utm=1#top"),
            Some("https://acme.com/careers".to_string())
        );
        assert_eq!(canonicalize_url("https://acme.com/"), Some("https://acme.com".to_string()));
        assert_eq!(
            canonicalize_url("http://acme.com:8080/a"),
            Some("http://acme.com:8080/a".to_string())
        );
        assert_eq!(canonicalize_url("acme.com"), None);
    }

    #[test]
    fn test_get_domain_from_url() {
        assert_eq!(get_domain_from_url("https://www.Acme.com/about"), Some("acme.com".to_string()));
        assert_eq!(get_domain_from_url("acme.io"), Some("acme.io".to_string()));
        assert_eq!(get_domain_from_url("mailto:Jane@Acme.com"), Some("acme.com".to_string()));
        assert_eq!(get_domain_from_url("jane@acme.com"), Some("acme.com".to_string()));
        assert_eq!(get_domain_from_url("   "), None);
    }

    #[test]
    fn test_get_domain_from_url_fallback() {
        // space in host fails the parser, string split still recovers it
        assert_eq!(
            get_domain_from_url("https://www.acme corp.com/x"),
            Some("acme corp.com".to_string())
        );
    }

    #[test]
    fn test_clean_email() {
        assert_eq!(clean_email("jane@acme.com"), Some("jane@acme.com".to_string()));
        assert_eq!(clean_email(" MAILTO:jane@acme.com "), Some("jane@acme.com".to_string()));
        assert_eq!(clean_email("jane@acme"), None);
        assert_eq!(clean_email("jane acme@x.com"), None);
        assert_eq!(clean_email("none"), None);
    }

    #[test]
    fn test_mailto_href() {
        assert_eq!(mailto_href(Some("a@b.co")), Some("mailto:a@b.co".to_string()));
        assert_eq!(mailto_href(None), None);
    }
}
