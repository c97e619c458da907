//! Deterministic cache key derivation
//!
//! Keys are `<prefix>:<param>:<param>...` with every character outside
//! `[A-Za-z0-9:_-]` replaced by `_`, so they are safe for any backing
//! store. Prompts are base64-encoded and truncated to a fixed prefix to
//! bound key length while staying deterministic for identical inputs.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;

/// Length of the encoded-prompt prefix embedded in keys.
pub const TRUNCATED_PROMPT_LEN: usize = 50;

static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9:_-]").unwrap());

/// Replaces every character outside `[A-Za-z0-9:_-]` with `_`.
pub fn sanitize_key(raw: &str) -> String {
    UNSAFE_CHARS.replace_all(raw, "_").into_owned()
}

/// Derives a namespaced cache key from a prefix and ordered parameters.
pub fn cache_key(prefix: &str, params: &[&str]) -> String {
    let raw = format!("{}:{}", prefix, params.join(":"));
    sanitize_key(&raw)
}

/// Encodes a prompt and keeps a fixed-length prefix of the encoding.
pub fn truncate_prompt(prompt: &str) -> String {
    let encoded = BASE64.encode(prompt.as_bytes());
    encoded.chars().take(TRUNCATED_PROMPT_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_is_deterministic() {
        let first = cache_key("api_response", &["weather", "abc"]);
        let second = cache_key("api_response", &["weather", "abc"]);
        assert_eq!(first, second);
        assert_eq!(first, "api_response:weather:abc");
    }

    #[test]
    fn test_cache_key_sanitizes_unsafe_characters() {
        let key = cache_key("api_response", &["news", "a b/c+d="]);
        assert_eq!(key, "api_response:news:a_b_c_d_");

        let allowed = Regex::new(r"^[A-Za-z0-9:_-]+$").unwrap();
        assert!(allowed.is_match(&key));
    }

    #[test]
    fn test_sanitize_preserves_allowed_charset() {
        assert_eq!(sanitize_key("abc:DEF_123-x"), "abc:DEF_123-x");
        assert_eq!(sanitize_key("über café"), "_ber_caf_");
    }

    #[test]
    fn test_truncate_prompt_bounds_length() {
        let long = "x".repeat(500);
        let truncated = truncate_prompt(&long);
        assert_eq!(truncated.len(), TRUNCATED_PROMPT_LEN);
    }

    #[test]
    fn test_truncate_prompt_short_input() {
        let truncated = truncate_prompt("hi");
        assert!(truncated.len() < TRUNCATED_PROMPT_LEN);
        assert_eq!(truncated, truncate_prompt("hi"));
    }

    #[test]
    fn test_distinct_prompts_yield_distinct_prefixes() {
        assert_ne!(truncate_prompt("weather in Delhi"), truncate_prompt("weather in Paris"));
    }
}
