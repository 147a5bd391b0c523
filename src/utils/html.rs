/// Clean user-supplied text using the ammonia library.
///
/// Whitelist-based sanitization: safe inline tags survive, while
/// dangerous tags (<script>, <iframe>) and malicious attributes
/// (onclick) are stripped. Plain text passes through unchanged.
/// Serves as a fail-safe against stored XSS in gallery clients.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
