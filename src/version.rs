//! Application version resolution.
//!
//! The version is the crate version baked in at compile time; a `VERSION`
//! file next to the executable overrides it for repackaged builds, and the
//! chain bottoms out at `0.0.0` so callers always get something printable.

const FALLBACK_VERSION: &str = "0.0.0";

/// Resolve the application version.
pub fn get_version() -> String {
    if let Some(v) = version_file_override() {
        return v;
    }
    let baked = env!("CARGO_PKG_VERSION");
    if baked.is_empty() {
        FALLBACK_VERSION.to_string()
    } else {
        baked.to_string()
    }
}

fn version_file_override() -> Option<String> {
    let path = std::env::current_exe().ok()?.parent()?.join("VERSION");
    let text = std::fs::read_to_string(path).ok()?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
