use crate::config::ResolverConfig;

/// Canonicalizes raw query text
///
/// # Normalization Steps
///
/// 1. Lowercase the whole text
/// 2. Remove every configured noise phrase by literal substring match
///    (not word-boundary aware, so "link" is also removed from "links")
/// 3. Collapse whitespace runs to a single space
/// 4. Trim both ends
///
/// # Examples
///
/// ```
/// use chanfind::text::normalize;
///
/// let noise = vec!["please send".to_string()];
/// assert_eq!(normalize("  Please SEND   Night  City ", &noise), "night city");
/// ```
pub fn normalize(raw: &str, noise_phrases: &[String]) -> String {
    let mut text = raw.to_lowercase();

    for phrase in noise_phrases {
        let phrase = phrase.to_lowercase();
        if !phrase.is_empty() {
            text = text.replace(&phrase, "");
        }
    }

    collapse_whitespace(&text)
}

/// Normalizes a directory title for comparison (no noise stripping)
pub fn normalize_title(title: &str) -> String {
    collapse_whitespace(&title.to_lowercase())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Query normalizer configured from the resolver settings
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    noise_phrases: Vec<String>,
    generic_tokens: Vec<String>,
}

impl Normalizer {
    /// Creates a normalizer from noise phrases and too-generic tokens
    pub fn new(noise_phrases: Vec<String>, generic_tokens: Vec<String>) -> Self {
        Self {
            noise_phrases: noise_phrases.into_iter().map(|p| p.to_lowercase()).collect(),
            generic_tokens: generic_tokens
                .into_iter()
                .map(|t| normalize_title(&t))
                .collect(),
        }
    }

    /// Creates a normalizer from the resolver configuration
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(config.noise_phrases.clone(), config.generic_tokens.clone())
    }

    /// Normalizes raw query text
    pub fn normalize(&self, raw: &str) -> String {
        normalize(raw, &self.noise_phrases)
    }

    /// Returns true if a normalized query carries no searchable content
    ///
    /// Empty text and text equal to a configured generic token are not queries.
    pub fn is_non_query(&self, normalized: &str) -> bool {
        normalized.is_empty() || self.generic_tokens.iter().any(|t| t == normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noise(phrases: &[&str]) -> Vec<String> {
        phrases.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_lowercase_and_collapse() {
        assert_eq!(normalize("  Night\tCity \n News  ", &[]), "night city news");
    }

    #[test]
    fn test_noise_phrase_case_insensitive() {
        let phrases = noise(&["Please Send"]);
        assert_eq!(normalize("PLEASE SEND night city", &phrases), "night city");
    }

    #[test]
    fn test_noise_phrase_is_not_boundary_aware() {
        let phrases = noise(&["link"]);
        assert_eq!(normalize("night city links", &phrases), "night city s");
        assert_eq!(normalize("unlinked", &phrases), "uned");
    }

    #[test]
    fn test_noise_removed_before_collapse() {
        let phrases = noise(&["send me"]);
        // The phrase only matches its literal spacing
        assert_eq!(normalize("send   me news", &phrases), "send me news");
        assert_eq!(normalize("send me  news", &phrases), "news");
    }

    #[test]
    fn test_every_occurrence_removed() {
        let phrases = noise(&["hd"]);
        assert_eq!(normalize("hd movie hd", &phrases), "movie");
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("Night  City NEWS"), "night city news");
    }

    #[test]
    fn test_normalizer_non_query() {
        let normalizer = Normalizer::new(noise(&["please"]), noise(&["Movie"]));

        assert!(normalizer.is_non_query(""));
        assert!(normalizer.is_non_query(&normalizer.normalize("please")));
        assert!(normalizer.is_non_query(&normalizer.normalize("please MOVIE")));
        assert!(!normalizer.is_non_query(&normalizer.normalize("movie night")));
    }
}
