use std::collections::HashSet;

/// Exact match, or the domain sits below a blocked entry at a label boundary.
/// Substring matches without the leading dot never count.
pub fn is_blocked(domain: &str, denylist: &HashSet<String>) -> bool {
    if domain.is_empty() {
        return false;
    }
    if denylist.contains(domain) {
        return true;
    }
    denylist
        .iter()
        .any(|entry| domain.ends_with(&format!(".{entry}")))
}
