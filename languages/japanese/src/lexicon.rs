//! Lexicon storage, exact-match search, and hypothesis/entry assembly.
//!
//! The entry table is immutable once built. Every lookup works on
//! [`EntryMatch`] overlay copies; transient search state never touches the
//! shared base, so independent lookups can run concurrently.

use std::collections::{HashMap, HashSet};

use crate::augment::FrequencyHit;
use crate::deconjugator::Hypothesis;
use crate::script::{hiragana_to_katakana, katakana_to_hiragana};

/// One spelling or reading element of an entry (JMDict k_ele/r_ele)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormElement {
    /// The written form itself (keb for spellings, reb for readings)
    pub text: String,
    /// Counterpart forms this element is restricted to (restr)
    pub restrict: Vec<String>,
    /// Priority markers (news1, ichi1, spec1, ...)
    pub priority: Vec<String>,
    /// Irregularity/info markers (ik, iK, io, ok, oK, ...)
    pub info: Vec<String>,
}

/// One sense of an entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sense {
    pub pos: Vec<String>,
    pub misc: Vec<String>,
    pub gloss: Vec<String>,
    pub info: Vec<String>,
    pub dialect: Vec<String>,
    /// Spellings this sense is restricted to (stagk)
    pub stagk: Vec<String>,
    /// Readings this sense is restricted to (stagr)
    pub stagr: Vec<String>,
}

/// One immutable lexicon entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LexiconEntry {
    pub seq: i64,
    pub spellings: Vec<FormElement>,
    pub readings: Vec<FormElement>,
    pub senses: Vec<Sense>,
}

/// Whether a matched form element was a kanji spelling or a kana reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Spelling,
    Reading,
}

/// The spelling or reading element a search actually hit
#[derive(Debug, Clone, PartialEq)]
pub struct FoundForm {
    pub kind: FormKind,
    pub element: FormElement,
}

/// Per-lookup overlay copy of a lexicon entry.
///
/// Carries the transient search state: which query text hit, which element
/// was found, the attached deconjugation hypotheses, and later the score,
/// audio, and frequency annotations. Restriction prunes the copied lists;
/// the shared base entry is never written to.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryMatch {
    pub seq: i64,
    pub spellings: Vec<FormElement>,
    pub readings: Vec<FormElement>,
    pub senses: Vec<Sense>,

    /// The query text that produced this match (possibly a kana variant)
    pub from: String,
    pub found: Option<FoundForm>,
    /// The element the search itself hit, before restriction promotes
    /// a spelling over a matched reading
    pub orig_found: Option<FoundForm>,
    /// Hypotheses grammatically compatible with this entry
    pub deconj: Vec<Hypothesis>,
    /// Union of every sense's parts-of-speech
    pub all_pos: HashSet<String>,

    pub score: i64,
    pub score_reasons: Vec<&'static str>,
    pub audio: Vec<String>,
    pub frequency: Option<FrequencyHit>,
}

impl EntryMatch {
    fn new(entry: &LexiconEntry, from: &str) -> Self {
        let found = entry
            .spellings
            .iter()
            .find(|k| k.text == from)
            .map(|k| FoundForm { kind: FormKind::Spelling, element: k.clone() })
            .or_else(|| {
                entry
                    .readings
                    .iter()
                    .find(|r| r.text == from)
                    .map(|r| FoundForm { kind: FormKind::Reading, element: r.clone() })
            });

        let all_pos = entry
            .senses
            .iter()
            .flat_map(|s| s.pos.iter().cloned())
            .collect();

        EntryMatch {
            seq: entry.seq,
            spellings: entry.spellings.clone(),
            readings: entry.readings.clone(),
            senses: entry.senses.clone(),
            from: from.to_string(),
            found,
            orig_found: None,
            deconj: Vec::new(),
            all_pos,
            score: 0,
            score_reasons: Vec::new(),
            audio: Vec::new(),
            frequency: None,
        }
    }

    /// An entry with no kanji spellings is a kana word
    pub fn is_kana_entry(&self) -> bool {
        self.spellings.is_empty()
    }

    pub fn prefers_kana(&self) -> bool {
        self.senses
            .iter()
            .any(|s| s.misc.iter().any(|m| m == "uk" || m == "ek"))
    }

    pub fn prefers_kanji(&self) -> bool {
        self.senses
            .iter()
            .any(|s| s.misc.iter().any(|m| m == "uK" || m == "eK"))
    }

    pub fn has_priority_marker(&self) -> bool {
        self.spellings.iter().chain(self.readings.iter()).any(|e| !e.priority.is_empty())
    }
}

/// Immutable entry table with spelling- and reading-keyed exact indexes
#[derive(Debug, Default)]
pub struct Lexicon {
    entries: Vec<LexiconEntry>,
    by_spelling: HashMap<String, Vec<usize>>,
    by_reading: HashMap<String, Vec<usize>>,
}

impl Lexicon {
    /// Build the indexes over entries already normalized by the loader
    pub fn new(entries: Vec<LexiconEntry>) -> Self {
        let mut by_spelling: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_reading: HashMap<String, Vec<usize>> = HashMap::new();

        for (i, entry) in entries.iter().enumerate() {
            for k in &entry.spellings {
                by_spelling.entry(k.text.clone()).or_default().push(i);
            }
            for r in &entry.readings {
                by_reading.entry(r.text.clone()).or_default().push(i);
            }
        }

        Lexicon { entries, by_spelling, by_reading }
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    fn probe(&self, text: &str) -> Option<Vec<EntryMatch>> {
        // spelling hits take priority over reading hits
        let indexes = self.by_spelling.get(text).or_else(|| self.by_reading.get(text))?;
        Some(indexes.iter().map(|&i| EntryMatch::new(&self.entries[i], text)).collect())
    }

    /// Exact match on the text as-is, then on its katakana and hiragana
    /// renderings. `None` means nothing matched at all.
    pub fn search(&self, text: &str) -> Option<Vec<EntryMatch>> {
        self.probe(text)
            .or_else(|| self.probe(&hiragana_to_katakana(text)))
            .or_else(|| self.probe(&katakana_to_hiragana(text)))
    }
}

/// Join deconjugation hypotheses to lexicon entries.
///
/// Each distinct hypothesis text is searched once. A hypothesis attaches to
/// an entry when it is the untagged base form, or when its trailing tag is
/// one of the entry's parts-of-speech. Entries that attach no hypothesis at
/// all are grammatically incompatible and dropped.
pub fn build_lookup_comb(lexicon: &Lexicon, forms: &[Hypothesis]) -> Vec<EntryMatch> {
    let mut order: Vec<&str> = Vec::new();
    let mut looked_up: HashMap<&str, Option<Vec<EntryMatch>>> = HashMap::new();

    for form in forms {
        if !looked_up.contains_key(form.text.as_str()) {
            let result = lexicon.search(&form.text);
            if result.is_some() {
                order.push(form.text.as_str());
            }
            looked_up.insert(form.text.as_str(), result);
        }
    }

    for form in forms {
        if let Some(Some(result)) = looked_up.get_mut(form.text.as_str()) {
            for entry in result.iter_mut() {
                let compatible = match form.tags.last() {
                    None => true,
                    Some(tag) => entry.all_pos.contains(tag),
                };
                if compatible {
                    entry.deconj.push(form.clone());
                }
            }
        }
    }

    let mut merged = Vec::new();
    for text in order {
        if let Some(Some(result)) = looked_up.remove(text) {
            merged.extend(result.into_iter().filter(|e| !e.deconj.is_empty()));
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deconjugator::deconjugate;
    use crate::rules::RuleSet;

    fn form(text: &str) -> FormElement {
        FormElement { text: text.to_string(), ..Default::default() }
    }

    fn sense(pos: &[&str]) -> Sense {
        Sense { pos: pos.iter().map(|p| p.to_string()).collect(), ..Default::default() }
    }

    fn lexicon() -> Lexicon {
        Lexicon::new(vec![
            LexiconEntry {
                seq: 1,
                spellings: vec![form("見る")],
                readings: vec![form("みる")],
                senses: vec![sense(&["v1"])],
            },
            LexiconEntry {
                seq: 2,
                spellings: vec![],
                readings: vec![form("ミルク")],
                senses: vec![sense(&["n"])],
            },
        ])
    }

    #[test]
    fn spelling_index_takes_priority() {
        let lex = Lexicon::new(vec![
            LexiconEntry {
                seq: 10,
                spellings: vec![form("かく")],
                readings: vec![form("べつよみ")],
                senses: vec![sense(&["n"])],
            },
            LexiconEntry {
                seq: 11,
                spellings: vec![],
                readings: vec![form("かく")],
                senses: vec![sense(&["n"])],
            },
        ]);
        let hits = lex.search("かく").expect("hit");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].seq, 10);
        assert_eq!(hits[0].found.as_ref().unwrap().kind, FormKind::Spelling);
    }

    #[test]
    fn search_falls_back_to_kana_variants() {
        let lex = lexicon();
        // hiragana query against a katakana-only reading
        let hits = lex.search("みるく").expect("kana variant hit");
        assert_eq!(hits[0].seq, 2);
        assert_eq!(hits[0].from, "ミルク");
        // katakana query against a hiragana reading
        let hits = lex.search("ミル").unwrap_or_default();
        assert!(hits.is_empty() || hits[0].seq == 1);
    }

    #[test]
    fn found_records_the_matched_element() {
        let lex = lexicon();
        let hits = lex.search("見る").expect("hit");
        let found = hits[0].found.as_ref().expect("found");
        assert_eq!(found.kind, FormKind::Spelling);
        assert_eq!(found.element.text, "見る");

        let hits = lex.search("みる").expect("hit");
        let found = hits[0].found.as_ref().expect("found");
        assert_eq!(found.kind, FormKind::Reading);
    }

    #[test]
    fn incompatible_entries_are_dropped() {
        let rules: RuleSet = serde_json::from_str::<Vec<crate::rules::RawRule>>(
            r#"[{"type":"stdrule","dec_end":"る","con_end":"た","dec_tag":"adj-na","con_tag":"","detail":"bogus"}]"#,
        )
        .map(RuleSet::from_records)
        .expect("rules");

        // みた deconjugates to みる tagged adj-na, which 見る (v1) does not carry
        let forms = deconjugate(&rules, "みた");
        let merged = build_lookup_comb(&lexicon(), &forms);
        assert!(merged.is_empty());
    }

    #[test]
    fn base_form_always_attaches() {
        let forms = deconjugate(&RuleSet::default(), "みる");
        let merged = build_lookup_comb(&lexicon(), &forms);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].seq, 1);
        assert_eq!(merged[0].deconj.len(), 1);
        assert!(merged[0].deconj[0].is_surface());
    }

    #[test]
    fn tagged_hypothesis_attaches_via_all_pos() {
        let rules: RuleSet = serde_json::from_str::<Vec<crate::rules::RawRule>>(
            r#"[{"type":"stdrule","dec_end":"る","con_end":"た","dec_tag":"v1","con_tag":"","detail":"past"}]"#,
        )
        .map(RuleSet::from_records)
        .expect("rules");

        let forms = deconjugate(&rules, "みた");
        let merged = build_lookup_comb(&lexicon(), &forms);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].seq, 1);
        assert!(merged[0].deconj.iter().any(|h| h.tags == ["v1"]));
    }
}
