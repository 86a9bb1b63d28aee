//! Best-effort update check.
//!
//! One background thread fetches a remote file that carries the latest
//! released version, compares it with the running version and logs a notice
//! when they differ. The check is fire-and-forget: it times out after five
//! seconds, every failure is swallowed, and nothing here may ever affect
//! report generation.

use once_cell::sync::Lazy;
use regex::Regex;
use std::thread::JoinHandle;
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

static VERSION_ASSIGNMENT: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#"__version__\s*=\s*['"]([^'"]+)['"]"#).ok());
static BARE_VERSION: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+(?:\.\d+)?$").ok());

/// Extract a version string from the remote file body: either a
/// `__version__ = "x.y.z"` assignment or a file containing only `x.y.z`.
fn extract_version(body: &str) -> Option<String> {
    if let Some(re) = VERSION_ASSIGNMENT.as_ref() {
        if let Some(captures) = re.captures(body) {
            return Some(captures[1].trim().to_string());
        }
    }
    let stripped = body.trim();
    match BARE_VERSION.as_ref() {
        Some(re) if re.is_match(stripped) => Some(stripped.to_string()),
        _ => None,
    }
}

fn fetch_latest_version(url: &str) -> Option<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .ok()?;
    let body = client.get(url).send().ok()?.text().ok()?;
    extract_version(&body)
}

/// Compare the running version against the remote one and log the outcome.
pub fn check_latest(url: &str, current: &str) {
    let Some(latest) = fetch_latest_version(url) else {
        tracing::debug!("update check skipped: could not fetch or parse remote version");
        return;
    };

    if latest == current {
        tracing::debug!(version = %current, "running the latest version");
    } else {
        tracing::warn!(current = %current, latest = %latest, "a newer version is available");
    }
}

/// Run the check on a detached background thread so it can never block the
/// pipeline. The handle is returned for callers that want to join in tests;
/// dropping it is the normal fire-and-forget path.
pub fn spawn_check(url: String, current: String) -> JoinHandle<()> {
    std::thread::spawn(move || check_latest(&url, &current))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_a_version_assignment() {
        let body = "# packaging stub\n__version__ = \"1.4.2\"\n";
        assert_eq!(extract_version(body), Some("1.4.2".to_string()));
    }

    #[test]
    fn extracts_a_bare_version_file() {
        assert_eq!(extract_version("1.2.3\n"), Some("1.2.3".to_string()));
        assert_eq!(extract_version("2.0\n"), Some("2.0".to_string()));
    }

    #[test]
    fn garbage_bodies_yield_none() {
        assert_eq!(extract_version("<html>404</html>"), None);
        assert_eq!(extract_version(""), None);
    }
}
