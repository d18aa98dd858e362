//! # Text Processing Utilities
//!
//! Fuzzy matching used to filter and order launcher candidates against the
//! typed query. A [`FuzzyQuery`] is prepared once per query and then scored
//! against every key of every candidate (label and localized label).

const RUN_WEIGHT: i64 = 6;
const WORD_START_BONUS: i64 = 10;
const KEY_PREFIX_BONUS: i64 = 30;
const EARLY_START_WINDOW: i64 = 20;
const WHOLE_KEY_BONUS: i64 = 50;
const LENGTH_PENALTY_DIVISOR: i64 = 8;

/// A query split into lowercase, space-separated terms.
///
/// Every term must appear as an in-order subsequence of a key, and terms must
/// appear in the order they were typed. Higher scores mean better matches:
/// consecutive runs, matches at word starts, a key that starts with a term,
/// a key equal to the whole query and shorter keys all score higher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyQuery {
    terms: Vec<Vec<char>>,
    whole: String,
}

impl FuzzyQuery {
    pub fn new(needle: &str) -> Self {
        let terms: Vec<Vec<char>> = needle
            .split_whitespace()
            .map(|term| term.chars().flat_map(char::to_lowercase).collect())
            .collect();
        let whole = terms
            .iter()
            .map(|term| term.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join(" ");
        Self { terms, whole }
    }

    /// A blank query matches everything with a neutral score.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Score one key, or `None` when some term does not match.
    pub fn score(&self, key: &str) -> Option<i64> {
        if self.is_empty() {
            return Some(0);
        }
        let key = MatchKey::new(key);
        if key.chars.is_empty() {
            return None;
        }

        let mut cursor = 0;
        let mut total = 0;
        for term in &self.terms {
            total += key.score_term(term, &mut cursor)?;
        }
        if key.lower == self.whole {
            total += WHOLE_KEY_BONUS;
        }
        Some(total - key.chars.len() as i64 / LENGTH_PENALTY_DIVISOR)
    }

    /// The strongest score across `keys`.
    pub fn best_score<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> Option<i64> {
        keys.into_iter().filter_map(|key| self.score(key)).max()
    }
}

/// One candidate key, lowercased, with word starts precomputed.
struct MatchKey {
    lower: String,
    chars: Vec<char>,
    word_starts: Vec<bool>,
}

impl MatchKey {
    fn new(key: &str) -> Self {
        let lower: String = key.chars().flat_map(char::to_lowercase).collect();
        let chars: Vec<char> = lower.chars().collect();
        let word_starts = (0..chars.len())
            .map(|index| index == 0 || is_separator(chars[index - 1]))
            .collect();
        Self {
            lower,
            chars,
            word_starts,
        }
    }

    /// Match `term` from `cursor` onwards, leaving `cursor` after the last
    /// matched character.
    fn score_term(&self, term: &[char], cursor: &mut usize) -> Option<i64> {
        let mut score = 0;
        let mut run = 0;
        let mut first = None;
        let mut previous: Option<usize> = None;

        for &wanted in term {
            let offset = self.chars[*cursor..].iter().position(|&candidate| candidate == wanted)?;
            let index = *cursor + offset;
            first.get_or_insert(index);

            match previous {
                Some(last) if index == last + 1 => run += 1,
                Some(last) => {
                    run = 1;
                    score -= (index - last - 1) as i64 / 2;
                }
                None => run = 1,
            }
            score += RUN_WEIGHT * run;
            if self.word_starts[index] {
                score += WORD_START_BONUS;
            }

            previous = Some(index);
            *cursor = index + 1;
        }

        let term: String = term.iter().collect();
        if self.lower.starts_with(&term) {
            score += KEY_PREFIX_BONUS;
        }
        if let Some(start) = first {
            score += (EARLY_START_WINDOW - start as i64).max(0);
        }
        Some(score)
    }
}

fn is_separator(character: char) -> bool {
    character.is_whitespace() || character.is_ascii_punctuation()
}

/// Score `needle` against a single key.
///
/// ```rust
/// use runbar_util::text_processing::fuzzy_score;
///
/// assert!(fuzzy_score("Safari", "saf").is_some_and(|score| score > 0));
/// assert!(fuzzy_score("Visual Studio Code", "vs code").is_some());
/// assert!(fuzzy_score("Safari", "qqq").is_none());
/// assert_eq!(fuzzy_score("hello", ""), Some(0));
/// ```
pub fn fuzzy_score(hay: &str, needle: &str) -> Option<i64> {
    FuzzyQuery::new(needle).score(hay)
}

/// Best score of `needle` across several keys of one candidate.
pub fn best_fuzzy_score<'a>(keys: impl IntoIterator<Item = &'a str>, needle: &str) -> Option<i64> {
    FuzzyQuery::new(needle).best_score(keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_match_outranks_scattered_match() {
        let prefix = fuzzy_score("Notes", "not").unwrap();
        let scattered = fuzzy_score("Keynote Studio", "not").unwrap();
        assert!(prefix > scattered);
    }

    #[test]
    fn exact_match_outranks_prefix_match() {
        let exact = fuzzy_score("Mail", "mail").unwrap();
        let prefix = fuzzy_score("Mailplane Pro", "mail").unwrap();
        assert!(exact > prefix);
    }

    #[test]
    fn whole_key_match_beats_a_longer_key_with_the_same_terms() {
        let query = FuzzyQuery::new("visual studio");
        let exact = query.score("Visual Studio").unwrap();
        let longer = query.score("Visual Studio Code").unwrap();
        assert!(exact - longer > 1);
    }

    #[test]
    fn word_starts_outrank_inner_letters() {
        let query = FuzzyQuery::new("code");
        let word_start = query.score("a-code").unwrap();
        let inner = query.score("axcode").unwrap();
        assert_eq!(word_start - inner, WORD_START_BONUS);
    }

    #[test]
    fn terms_must_match_in_order() {
        assert!(fuzzy_score("Visual Studio Code", "studio visual").is_none());
        assert!(fuzzy_score("Visual Studio Code", "visual code").is_some());
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(fuzzy_score("SAFARI", "safari"), fuzzy_score("safari", "SAFARI"));
    }

    #[test]
    fn empty_key_never_matches_a_term() {
        assert!(fuzzy_score("", "a").is_none());
        assert_eq!(fuzzy_score("", "  "), Some(0));
        assert!(FuzzyQuery::new("   ").is_empty());
    }

    #[test]
    fn one_query_scores_every_key() {
        let query = FuzzyQuery::new("calc");
        let best = query.best_score(["Kalkulator", "Calculator"]).unwrap();
        assert_eq!(Some(best), query.score("Calculator"));
        assert_eq!(Some(best), best_fuzzy_score(["Kalkulator", "Calculator"], "calc"));
        assert!(FuzzyQuery::new("zzz").best_score(["Kalkulator", "Calculator"]).is_none());
    }
}
