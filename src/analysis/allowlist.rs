use once_cell::sync::Lazy;
use regex::Regex;

// Educational, academic, government, and military zones, including
// two-letter country-code variants.
static SAFE_SUFFIX_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\.edu$",
        r"\.edu\.[a-z]{2}$",
        r"\.ac\.[a-z]{2}$",
        r"\.gov$",
        r"\.gov\.[a-z]{2}$",
        r"\.mil$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid allowlist regex"))
    .collect()
});

// Matched exactly or at a dot boundary: `www.youtube.com` passes,
// `notyoutube.com` does not.
const TRUSTED_PLATFORMS: &[&str] = &[
    "youtube.com",
    "youtu.be",
    "google.com",
    "wikipedia.org",
    "github.com",
    "stackoverflow.com",
];

/// Live-detect short-circuit only; never consulted during denylist
/// reconciliation, where a blocked entry always wins.
pub fn is_trusted_domain(domain: &str) -> bool {
    let folded = domain.to_lowercase();
    if SAFE_SUFFIX_PATTERNS.iter().any(|p| p.is_match(&folded)) {
        return true;
    }
    TRUSTED_PLATFORMS.iter().any(|platform| {
        folded == *platform || folded.ends_with(&format!(".{platform}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_suffixes_match() {
        assert!(is_trusted_domain("mit.edu"));
        assert!(is_trusted_domain("rvce.edu.in"));
        assert!(is_trusted_domain("ox.ac.uk"));
        assert!(is_trusted_domain("irs.gov"));
        assert!(is_trusted_domain("hmrc.gov.uk"));
        assert!(is_trusted_domain("navy.mil"));
    }

    #[test]
    fn platforms_match_exact_and_subdomain() {
        assert!(is_trusted_domain("youtube.com"));
        assert!(is_trusted_domain("www.youtube.com"));
        assert!(is_trusted_domain("GitHub.com"));
    }

    #[test]
    fn lookalikes_do_not_match() {
        assert!(!is_trusted_domain("notyoutube.com"));
        assert!(!is_trusted_domain("google.com.attacker.net"));
        assert!(!is_trusted_domain("secure-login-update-bank-acc.com"));
        assert!(!is_trusted_domain("educational.example"));
    }
}
