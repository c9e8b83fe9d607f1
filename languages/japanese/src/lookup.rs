//! Longest-match lookup orchestration.
//!
//! For a span of unsegmented text, successively shorter prefixes are
//! deconjugated and matched until something resolves; the remainder is left
//! for the caller to chain into the next lookup. Results are memoized per
//! (text, depth) so repeated tooltip probes of the same span are free.

use crate::augment::add_extra_info;
use crate::deconjugator::deconjugate;
use crate::lexicon::{EntryMatch, build_lookup_comb};
use crate::processor::JapaneseAnalyzer;
use crate::ranker::rank;
use crate::restrict::skip_rereferenced;
use crate::script::{is_digit, is_kana, is_punctuation};

/// A candidate window never extends past this many characters
pub(crate) const MAX_DEAD_END_LENGTH: usize = 15;
/// Successful prefix lengths recorded per lookup by default
pub(crate) const DEFAULT_DEPTH: usize = 10;

/// The resolved definitions for one matched prefix of a lookup span
#[derive(Debug, Clone, PartialEq)]
pub struct Definitions {
    /// The text the lookup was asked about
    pub requested_text: String,
    /// The prefix that actually resolved to dictionary entries
    pub matched_text: String,
    /// Ranked entry copies
    pub entries: Vec<EntryMatch>,
    /// Unconsumed suffix, used for chaining further lookups
    pub remainder: String,
    /// Index of the lookup result continuing at `remainder`, once linked
    pub continuation: Option<usize>,
    /// Literal substring → reading substring inferences made while
    /// deriving the kana rendering
    pub replacement_rules: Vec<(String, String)>,
    /// Kana-only rendering of `matched_text`
    pub kana_text: Option<String>,
}

impl Definitions {
    fn new(requested_text: &str, matched_text: String, entries: Vec<EntryMatch>, remainder: String) -> Self {
        Definitions {
            requested_text: requested_text.to_string(),
            matched_text,
            entries,
            remainder,
            continuation: None,
            replacement_rules: Vec::new(),
            kana_text: None,
        }
    }
}

impl JapaneseAnalyzer {
    /// Resolve `text` into ranked definitions for its longest matching
    /// prefixes. Repeat calls with the same text return the cached result.
    pub fn lookup_text(&self, text: &str) -> Vec<Definitions> {
        self.lookup_with_depth(text, DEFAULT_DEPTH)
    }

    /// As [`lookup_text`](Self::lookup_text), recording at most `depth`
    /// successful prefix lengths.
    pub fn lookup_with_depth(&self, text: &str, depth: usize) -> Vec<Definitions> {
        if let Some(cached) = self.cache_get(text, depth) {
            return cached;
        }

        // OCR sources routinely read っ as つ; when the text has no small
        // tsu at all, prefer a lookup that resolves one.
        if !text.contains('っ') && text.contains('つ') {
            let replaced = text.replacen('つ', "っ", 1);
            let result = self.lookup_with_depth(&replaced, depth);
            if result.first().is_some_and(|d| d.matched_text.contains('っ')) {
                return result;
            }
        }

        let mut results = self.scan_prefixes(text, depth);

        for result in &mut results {
            result.compute_kana_text();
        }

        self.cache_put(text, depth, results.clone());
        results
    }

    fn scan_prefixes(&self, text: &str, depth: usize) -> Vec<Definitions> {
        let chars: Vec<char> = text
            .chars()
            .skip_while(|&c| is_punctuation(c) || is_digit(c))
            .collect();

        let mut maxlength = chars.len().min(MAX_DEAD_END_LENGTH);
        // a punctuation character inside the window caps it at its position
        for (j, &c) in chars.iter().enumerate().take(maxlength).skip(1) {
            if is_punctuation(c) {
                maxlength = j;
                break;
            }
        }

        let mut results: Vec<Definitions> = Vec::new();
        let mut second_pass = false;
        let mut i = chars.len().min(maxlength);

        while i > 0 {
            let current: String = chars[..i].iter().collect();

            let forms = deconjugate(&self.rules, &current);
            let mut result = build_lookup_comb(&self.lexicon, &forms);

            // a pure-kana prefix only accepts kana-ish entries on the first
            // pass; the fallback pass takes anything
            if !second_pass && is_kana(&current) {
                result.retain(|e| e.is_kana_entry() || e.prefers_kana());
            }

            if !result.is_empty() {
                if let Err(e) = rank(&current, &mut result, &self.priority) {
                    tracing::warn!("failed to rank dictionary results: {e}");
                }
                let remainder: String = chars[i..].iter().collect();
                results.push(Definitions::new(text, current, result, remainder));
            }

            i -= 1;

            if !second_pass && i == 0 && results.is_empty() {
                i = maxlength;
                second_pass = true;
            }

            if results.len() >= depth {
                break;
            }
        }

        if !results.is_empty() {
            results = skip_rereferenced(results);
            add_extra_info(&mut results, &self.audio, &self.frequency);
            results
        } else if !chars.is_empty() {
            // no prefix matched at any length: step past the first
            // character and retry (stray particles, names, typos)
            let rest: String = chars[1..].iter().collect();
            self.lookup_with_depth(&rest, depth)
        } else {
            results
        }
    }

    fn cache_get(&self, text: &str, depth: usize) -> Option<Vec<Definitions>> {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.get(&(text.to_string(), depth)).cloned()
    }

    fn cache_put(&self, text: &str, depth: usize, results: Vec<Definitions>) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.insert((text.to_string(), depth), results);
    }
}

#[cfg(test)]
mod tests {
    use crate::processor::tests::mini_analyzer;

    #[test]
    fn conjugated_form_resolves_to_lemma() {
        let analyzer = mini_analyzer();
        let results = analyzer.lookup_text("みた");
        assert!(!results.is_empty());
        let first = &results[0];
        assert_eq!(first.matched_text, "みた");
        assert!(first.entries.iter().any(|e| e.seq == 1));
        let entry = first.entries.iter().find(|e| e.seq == 1).unwrap();
        assert!(entry.deconj.iter().any(|h| h.text == "みる" && h.tags == ["v1"]));
    }

    #[test]
    fn lookup_is_idempotent() {
        let analyzer = mini_analyzer();
        let first = analyzer.lookup_text("ことばをみた");
        let second = analyzer.lookup_text("ことばをみた");
        assert_eq!(first, second);
    }

    #[test]
    fn longest_prefix_wins_first_slot() {
        let analyzer = mini_analyzer();
        let results = analyzer.lookup_text("ことばをみた");
        assert!(!results.is_empty());
        assert_eq!(results[0].matched_text, "ことば");
        assert_eq!(results[0].remainder, "をみた");
    }

    #[test]
    fn fullwidth_digits_are_stripped_like_halfwidth() {
        let analyzer = mini_analyzer();
        let full = analyzer.lookup_text("５分");
        assert!(!full.is_empty());
        assert_eq!(full[0].matched_text, "分");
        let half = analyzer.lookup_text("5分");
        assert_eq!(half[0].matched_text, "分");
    }

    #[test]
    fn unmatched_leading_character_is_skipped() {
        let analyzer = mini_analyzer();
        // ゑ is not in the mini lexicon and resolves nothing by itself
        let results = analyzer.lookup_text("ゑことば");
        assert!(!results.is_empty());
        assert_eq!(results[0].requested_text, "ことば");
        assert_eq!(results[0].matched_text, "ことば");
    }

    #[test]
    fn punctuation_caps_the_window() {
        let analyzer = mini_analyzer();
        // the 。 inside the window must stop the prefix scan before it
        let results = analyzer.lookup_text("ことば。みた");
        assert!(!results.is_empty());
        assert_eq!(results[0].matched_text, "ことば");
    }

    #[test]
    fn no_duplicate_sequence_ids_across_results() {
        let analyzer = mini_analyzer();
        let results = analyzer.lookup_text("ことばをみた");
        let mut seen = std::collections::HashSet::new();
        for lookup in &results {
            for entry in &lookup.entries {
                assert!(seen.insert(entry.seq), "seq {} reported twice", entry.seq);
            }
        }
    }

    #[test]
    fn small_tsu_misread_is_recovered() {
        let analyzer = mini_analyzer();
        // OCR text with つ where the dictionary word has っ
        let results = analyzer.lookup_text("きつて");
        assert!(!results.is_empty());
        assert_eq!(results[0].matched_text, "きって");
        assert!(results[0].entries.iter().any(|e| e.seq == 5));
    }

    #[test]
    fn kana_filter_drops_kanji_preferring_entries_on_first_pass() {
        let analyzer = mini_analyzer();
        // ほん hits both 本 (a kanji word) and a kana-only homophone; only
        // the kana-ish entry survives the first pass
        let results = analyzer.lookup_text("ほん");
        assert!(!results.is_empty());
        assert!(results[0].entries.iter().all(|e| e.is_kana_entry() || e.prefers_kana()));
    }
}
