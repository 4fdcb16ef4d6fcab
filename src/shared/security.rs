//! Usage: Redaction helpers for credentials that end up in logs or notices.

const KEY_MASK_PREFIX_LEN: usize = 4;
const KEY_MASK_SUFFIX_LEN: usize = 2;

/// Masks a master key (or any secret) so only a short prefix/suffix stays visible.
pub(crate) fn mask_secret(secret: &str) -> String {
    let trimmed = secret.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let chars: Vec<char> = trimmed.chars().collect();
    let len = chars.len();
    if len <= KEY_MASK_PREFIX_LEN + KEY_MASK_SUFFIX_LEN {
        return "*".repeat(len.min(8));
    }

    let prefix: String = chars[..KEY_MASK_PREFIX_LEN].iter().collect();
    let suffix: String = chars[len - KEY_MASK_SUFFIX_LEN..].iter().collect();
    format!("{prefix}...{suffix}")
}
