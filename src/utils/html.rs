// src/utils/html.rs

/// Cleans instructor-authored HTML with ammonia's whitelist.
///
/// Safe formatting tags (<b>, <p>, <sub>, ...) survive; <script>, <iframe>
/// and event-handler attributes are stripped along with their content.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Sanitizes each version's text in place.
pub fn clean_versions(texts: Vec<String>) -> Vec<String> {
    texts.iter().map(|t| clean_html(t)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scripts_but_keeps_formatting() {
        let cleaned = clean_html("<p>x<sup>2</sup></p><script>alert(1)</script>");
        assert_eq!(cleaned, "<p>x<sup>2</sup></p>");
    }

    #[test]
    fn cleans_every_version() {
        let cleaned = clean_versions(vec![
            "<b>a</b>".to_string(),
            "<img src=x onerror=alert(1)>".to_string(),
        ]);
        assert_eq!(cleaned[0], "<b>a</b>");
        assert!(!cleaned[1].contains("onerror"));
    }
}
