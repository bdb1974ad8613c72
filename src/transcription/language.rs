//! Language probability handling
//!
//! Wraps the raw per-language probability vector Whisper's detector returns
//! (indexed by whisper language id) as a code -> probability mapping.

/// Probability mapping over Whisper's supported language codes
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageScores {
    // (code, probability) pairs in whisper language id order
    scores: Vec<(&'static str, f32)>,
}

impl LanguageScores {
    /// Builds the mapping from the detector's raw probability vector
    ///
    /// Entries whose index has no language code (past whisper's language
    /// table) are dropped.
    #[must_use]
    pub fn from_probs(probs: &[f32]) -> Self {
        let scores = probs
            .iter()
            .enumerate()
            .filter_map(|(id, &p)| {
                let id = i32::try_from(id).ok()?;
                whisper_rs::get_lang_str(id).map(|code| (code, p))
            })
            .collect();
        Self { scores }
    }

    /// The language code with the highest probability
    ///
    /// Ties resolve to the entry with the lowest whisper language id, since
    /// only a strictly greater probability replaces the current best.
    /// Returns `None` for an empty mapping.
    #[must_use]
    pub fn best(&self) -> Option<(&'static str, f32)> {
        let mut best: Option<(&'static str, f32)> = None;
        for &(code, p) in &self.scores {
            match best {
                Some((_, best_p)) if p <= best_p => {}
                _ => best = Some((code, p)),
            }
        }
        best
    }

    /// The `n` most probable languages, highest first
    #[must_use]
    pub fn top(&self, n: usize) -> Vec<(&'static str, f32)> {
        let mut sorted = self.scores.clone();
        sorted.sort_by(|a, b| b.1.total_cmp(&a.1));
        sorted.truncate(n);
        sorted
    }

    /// Iterates over (code, probability) pairs in whisper language id order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f32)> + '_ {
        self.scores.iter().copied()
    }

    /// Number of languages in the mapping
    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Whether the mapping is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn from_pairs(pairs: Vec<(&'static str, f32)>) -> Self {
        Self { scores: pairs }
    }
}
