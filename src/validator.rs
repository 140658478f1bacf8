//! Pure predicate deciding whether extracted text is a real article body.
//!
//! Used only to gate tier advancement in the content resolver; rejection is
//! the normal signal to try the next tier, not an error.

use crate::config::ValidatorConfig;

pub struct ContentValidator {
    config: ValidatorConfig,
}

impl ContentValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Accepts text that looks like a substantive Korean article body.
    ///
    /// Rejects when the text is too short, reads like page chrome (two or
    /// more distinct boilerplate markers), carries too few Hangul glyphs to
    /// be an article, or collapses to almost nothing once whitespace runs
    /// are squeezed.
    pub fn is_article(&self, text: &str) -> bool {
        let trimmed = text.trim();

        if trimmed.chars().count() < self.config.min_chars {
            return false;
        }

        let marker_hits = self
            .config
            .boilerplate_markers
            .iter()
            .filter(|marker| trimmed.contains(marker.as_str()))
            .count();
        if marker_hits >= 2 {
            return false;
        }

        let hangul = trimmed.chars().filter(|c| is_hangul_syllable(*c)).count();
        if hangul < self.config.min_hangul {
            return false;
        }

        let compact: String = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
        compact.chars().count() >= self.config.min_compact_chars
    }
}

fn is_hangul_syllable(c: char) -> bool {
    ('\u{AC00}'..='\u{D7A3}').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> ContentValidator {
        ContentValidator::new(ValidatorConfig::default())
    }

    #[test]
    fn accepts_text_at_minimum_length() {
        let text = "가".repeat(50);
        assert!(validator().is_article(&text));
    }

    #[test]
    fn rejects_text_one_char_below_minimum() {
        let text = "가".repeat(49);
        assert!(!validator().is_article(&text));
    }

    #[test]
    fn rejects_two_boilerplate_markers() {
        let text = format!("공유하기 로그인 {}", "내".repeat(60));
        assert!(!validator().is_article(&text));
    }

    #[test]
    fn single_marker_alone_is_not_fatal() {
        let text = format!("공유하기 {}", "내".repeat(60));
        assert!(validator().is_article(&text));
    }

    #[test]
    fn rejects_text_with_too_few_hangul_glyphs() {
        let text = format!("{} 가나다", "x".repeat(70));
        assert!(!validator().is_article(&text));
    }

    #[test]
    fn rejects_whitespace_padded_stub() {
        // 20 glyphs spread across heavy whitespace: passes the raw length
        // check but collapses below the compact floor.
        let text = "가   나   다   라   ".repeat(5);
        assert!(!validator().is_article(&text));
    }
}
