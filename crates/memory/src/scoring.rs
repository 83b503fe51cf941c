//! Relevance scoring for recall and retrieval.
//!
//! The bundled indexes rank by keyword overlap: a real vector database
//! would rank by embedding distance behind the same trait. Scores land in
//! [0, 1] so thresholds tune the same way across backends.

/// Score how relevant `content` is to `query`.
///
/// Combines term coverage (how many query terms appear in the content)
/// with occurrence density (how often they appear relative to content
/// length). Returns 0.0 when no query term matches.
pub fn term_relevance(content: &str, query: &str) -> f32 {
    let content_lower = content.to_lowercase();
    let terms = query_terms(query);
    if terms.is_empty() {
        return 0.0;
    }

    let mut matched = 0usize;
    let mut occurrences = 0usize;
    for term in &terms {
        let count = content_lower.matches(term.as_str()).count();
        if count > 0 {
            matched += 1;
            occurrences += count;
        }
    }

    if matched == 0 {
        return 0.0;
    }

    let coverage = matched as f32 / terms.len() as f32;
    let density =
        (occurrences as f32 / (content_lower.len() as f32 / 100.0).max(1.0)).min(1.0);

    (0.8 * coverage + 0.2 * density).min(1.0)
}

/// Split a query into lowercase search terms.
///
/// Words shorter than three characters are noise ("a", "is", "to") and
/// are skipped — unless the whole query is short words, in which case
/// everything is kept so short queries still match.
fn query_terms(query: &str) -> Vec<String> {
    let words: Vec<String> = query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(String::from)
        .collect();

    let mut terms: Vec<String> = words.iter().filter(|w| w.len() >= 3).cloned().collect();
    if terms.is_empty() {
        terms = words;
    }
    terms.dedup();
    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_match_scores_high() {
        let score = term_relevance("Tomato plants need water every two days", "tomato water");
        assert!(score > 0.8, "expected high score, got {score}");
    }

    #[test]
    fn no_match_scores_zero() {
        let score = term_relevance("Cactus thrives on neglect", "orchid humidity");
        assert_eq!(score, 0.0);
    }

    #[test]
    fn partial_match_in_between() {
        let full = term_relevance("basil likes sun and daily water", "basil water");
        let partial = term_relevance("basil likes sun", "basil water");
        assert!(partial > 0.0);
        assert!(partial < full);
    }

    #[test]
    fn case_insensitive() {
        let a = term_relevance("TOMATO care guide", "tomato");
        let b = term_relevance("tomato care guide", "TOMATO");
        assert!(a > 0.0);
        assert!((a - b).abs() < 1e-6);
    }

    #[test]
    fn short_word_query_still_matches() {
        // Every word is under three chars; fallback keeps them.
        let score = term_relevance("pH of 6 is fine", "pH 6");
        assert!(score > 0.0);
    }

    #[test]
    fn empty_query_scores_zero() {
        assert_eq!(term_relevance("anything", ""), 0.0);
        assert_eq!(term_relevance("anything", "   "), 0.0);
    }

    #[test]
    fn score_bounded_by_one() {
        let content = "water water water water water water";
        let score = term_relevance(content, "water");
        assert!(score <= 1.0);
    }
}
