//! Name normalization and fuzzy scoring for directory lookups.
//!
//! Scouts type team names loosely ("g2", "G2 Esports", "gen.g") while the
//! directory stores canonical names, so matching runs on normalized forms
//! with a tiered score: exact, substring, then Levenshtein similarity.

use crate::constants::matching::SUBSTRING_SCORE;

/// Lowercases, strips everything but letters/digits/spaces, and collapses
/// whitespace runs.
pub fn normalize_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut last_was_space = true;
    for c in name.to_lowercase().chars() {
        if c.is_alphanumeric() {
            normalized.push(c);
            last_was_space = false;
        } else if !last_was_space {
            normalized.push(' ');
            last_was_space = true;
        }
    }
    while normalized.ends_with(' ') {
        normalized.pop();
    }
    normalized
}

/// Classic two-row Levenshtein distance over chars.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// Similarity in [0, 1] derived from edit distance over the longer input.
pub fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

/// Tiered match score between two already-normalized names.
pub fn score_names(query: &str, candidate: &str) -> f64 {
    if query == candidate {
        return 1.0;
    }
    if !query.is_empty()
        && !candidate.is_empty()
        && (candidate.contains(query) || query.contains(candidate))
    {
        return SUBSTRING_SCORE;
    }
    similarity(query, candidate)
}

/// Running best-candidate accumulator for a directory scan.
#[derive(Debug)]
pub struct BestMatch<T> {
    pub candidate: Option<T>,
    pub score: f64,
}

impl<T> BestMatch<T> {
    pub fn new() -> Self {
        Self {
            candidate: None,
            score: 0.0,
        }
    }

    /// Keeps the candidate when it strictly improves on the current best.
    pub fn consider(&mut self, score: f64, value: T) {
        if score > self.score {
            self.score = score;
            self.candidate = Some(value);
        }
    }

    /// Returns the best candidate if its score clears `threshold`.
    pub fn accept(self, threshold: f64) -> Option<T> {
        if self.score >= threshold {
            self.candidate
        } else {
            None
        }
    }
}

impl<T> Default for BestMatch<T> {
    fn default() -> Self {
        Self::new()
    }
}
