//! Candidate scoring and ordering.
//!
//! Scores combine the dictionary's intrinsic ordering (low sequence ids are
//! common words), lexical agreement between the query script and the entry,
//! usage markers, deconjugation provenance, and a table of manual boosts.
//! The sort must be stable so equal scores keep their input order.

use kotoba_core::error::{CoreError, Result};

use crate::lexicon::{EntryMatch, FormKind};
use crate::script::is_kana;

/// Irregularity markers that demote a matched form
const IRREGULAR_MARKERS: [&str; 5] = ["ik", "iK", "io", "ok", "oK"];
/// Misc markers that mark a sense as obscure/rare/obsolete
const OBSCURE_MARKERS: [&str; 3] = ["obsc", "rare", "obs"];

/// One manual ranking override: (spelling, reading, boost).
/// An empty spelling targets entries written without kanji.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorityRule {
    pub spelling: String,
    pub reading: String,
    pub boost: i64,
}

/// Lookup table of manual ranking overrides
#[derive(Debug, Default)]
pub struct PriorityTable {
    rules: Vec<PriorityRule>,
}

impl PriorityTable {
    pub fn new(rules: Vec<PriorityRule>) -> Self {
        PriorityTable { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Highest boost among rules matching this entry, given the query text.
    /// `None` when no rule matches.
    fn boost_for(&self, query: &str, entry: &EntryMatch) -> Option<i64> {
        let found = entry.found.as_ref()?;
        let mut boost: Option<i64> = None;
        let mut consider = |value: i64| {
            boost = Some(boost.map_or(value, |b| b.max(value)));
        };

        match found.kind {
            // looked up (or promoted to) a kanji spelling: match it against
            // each of the entry's readings
            FormKind::Spelling => {
                for r in &entry.readings {
                    for rule in &self.rules {
                        if rule.spelling == found.element.text && rule.reading == r.text {
                            consider(rule.boost);
                        }
                    }
                }
            }
            FormKind::Reading if !entry.spellings.is_empty() => {
                // looked up kana but the word is written with kanji
                for k in &entry.spellings {
                    for rule in &self.rules {
                        if is_kana(&rule.spelling) {
                            if rule.spelling == query && rule.reading == k.text {
                                consider(rule.boost);
                            }
                        } else if rule.spelling == k.text && rule.reading == found.element.text {
                            consider(rule.boost);
                        }
                    }
                }
            }
            // a word with no kanji at all
            FormKind::Reading => {
                for rule in &self.rules {
                    if rule.spelling.is_empty() && rule.reading == found.element.text {
                        consider(rule.boost);
                    }
                }
            }
        }

        boost
    }
}

fn matched_form_is_irregular(entry: &EntryMatch) -> bool {
    entry
        .found
        .as_ref()
        .is_some_and(|f| f.element.info.iter().any(|i| IRREGULAR_MARKERS.contains(&i.as_str())))
}

fn all_senses_obscure(entry: &EntryMatch) -> bool {
    entry
        .senses
        .iter()
        .all(|s| s.misc.iter().any(|m| OBSCURE_MARKERS.contains(&m.as_str())))
}

fn score_entry(query: &str, query_kana: bool, entry: &mut EntryMatch, priority: &PriorityTable) -> Result<()> {
    if entry.found.is_none() {
        return Err(CoreError::Unrankable { seq: entry.seq });
    }

    fn adjust(entry: &mut EntryMatch, delta: i64, reason: &'static str) {
        entry.score += delta;
        entry.score_reasons.push(reason);
    }

    // intrinsic frequency proxy: lower sequence ids score higher
    entry.score = (entry.seq - 1_000_000) / -10_000_000;
    entry.score_reasons.clear();

    if matched_form_is_irregular(entry) {
        adjust(entry, -50, "irregular form");
    }
    if query_kana == entry.is_kana_entry() && entry.deconj.is_empty() {
        adjust(entry, 100, "exact kana");
    }
    if entry.has_priority_marker() {
        adjust(entry, 30, "priority marker");
    }
    if !query_kana && entry.prefers_kanji() {
        adjust(entry, 12, "kanji prefers kanji");
    }
    if query_kana && entry.prefers_kana() {
        adjust(entry, 10, "kana prefers kana");
    }
    if query_kana && entry.prefers_kanji() {
        adjust(entry, -12, "kana but prefers kanji");
    }
    if !query_kana && entry.prefers_kana() {
        adjust(entry, -10, "kanji but prefers kana");
    }
    if entry.senses.len() >= 3 {
        adjust(entry, 3, "many senses");
    }
    if all_senses_obscure(entry) {
        adjust(entry, -5, "obscure");
    }
    if entry.deconj.iter().any(|h| h.process.is_empty()) {
        adjust(entry, 1, "no deconjugation");
    }
    if entry.deconj.iter().any(|h| h.process.len() > 2) {
        adjust(entry, -1, "long deconjugation");
    }

    if let Some(boost) = priority.boost_for(query, entry) {
        entry.score += boost;
        entry.score_reasons.push("manual boost");
    }

    Ok(())
}

/// Score and order entries, best first. Equal scores keep their input
/// order. A ranking fault costs ordering, never results: on failure the
/// caller keeps the unranked order.
pub fn rank(query: &str, entries: &mut [EntryMatch], priority: &PriorityTable) -> Result<()> {
    let query_kana = is_kana(query);

    for entry in entries.iter_mut() {
        score_entry(query, query_kana, entry, priority)?;
    }

    // stable: ties keep relative input order
    entries.sort_by(|a, b| b.score.cmp(&a.score));

    Ok(())
}
