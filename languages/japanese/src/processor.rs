//! The Japanese analyzer: owns the loaded tables, drives the lookup
//! pipeline, and exposes the language-agnostic processor interface.

use std::collections::HashMap;
use std::sync::Mutex;

use kotoba_core::language::{Definition, LanguageProcessor, LookupResult, Token};
use unicode_normalization::UnicodeNormalization;

use crate::augment::{AudioIndex, FrequencyTable};
use crate::lexicon::{EntryMatch, Lexicon};
use crate::lookup::Definitions;
use crate::ranker::PriorityTable;
use crate::rules::RuleSet;
use crate::segmenter::split_text_for_lookup;

/// Japanese text analysis engine.
///
/// All tables are immutable after construction; lookups only write to
/// per-call entry copies and to the internal memoization cache, so a shared
/// analyzer can serve concurrent lookups.
pub struct JapaneseAnalyzer {
    pub(crate) rules: RuleSet,
    pub(crate) lexicon: Lexicon,
    pub(crate) priority: PriorityTable,
    pub(crate) audio: AudioIndex,
    pub(crate) frequency: FrequencyTable,
    pub(crate) cache: Mutex<HashMap<(String, usize), Vec<Definitions>>>,
}

impl JapaneseAnalyzer {
    pub fn new(
        rules: RuleSet,
        lexicon: Lexicon,
        priority: PriorityTable,
        audio: AudioIndex,
        frequency: FrequencyTable,
    ) -> Self {
        tracing::info!(
            rules = rules.len(),
            entries = lexicon.entry_count(),
            priority = priority.len(),
            frequency_readings = frequency.reading_count(),
            "japanese analyzer ready"
        );

        JapaneseAnalyzer {
            rules,
            lexicon,
            priority,
            audio,
            frequency,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

fn flatten(definitions: &Definitions) -> Vec<LookupResult> {
    definitions.entries.iter().map(|e| entry_view(definitions, e)).collect()
}

fn entry_view(definitions: &Definitions, entry: &EntryMatch) -> LookupResult {
    let term = entry
        .spellings
        .first()
        .or_else(|| entry.readings.first())
        .map(|e| e.text.clone())
        .unwrap_or_default();

    let mut metadata = HashMap::new();
    metadata.insert("sequence_id".to_string(), entry.seq.to_string());
    metadata.insert("score".to_string(), entry.score.to_string());
    metadata.insert("matched_text".to_string(), definitions.matched_text.clone());

    if let Some(kana) = &definitions.kana_text {
        metadata.insert("kana_text".to_string(), kana.clone());
    }
    if let Some(hypothesis) = entry.deconj.iter().find(|h| !h.process.is_empty()) {
        metadata.insert(
            "deconjugation".to_string(),
            format!(
                "{} → {} ({})",
                hypothesis.original_text,
                hypothesis.text,
                hypothesis.process.join(", ")
            ),
        );
    }
    if let Some(freq) = &entry.frequency {
        metadata.insert("frequency_rank".to_string(), freq.rank.to_string());
    }
    if !entry.audio.is_empty() {
        metadata.insert("audio".to_string(), entry.audio.join("|"));
    }

    LookupResult {
        term,
        readings: entry.readings.iter().map(|r| r.text.clone()).collect(),
        definitions: entry
            .senses
            .iter()
            .map(|s| Definition {
                text: s.gloss.join("; "),
                part_of_speech: s.pos.clone(),
                tags: s.misc.clone(),
            })
            .collect(),
        metadata,
    }
}

impl LanguageProcessor for JapaneseAnalyzer {
    fn language_code(&self) -> &str {
        "ja"
    }

    fn normalize(&self, text: &str) -> String {
        text.nfkc().filter(|&c| !matches!(c, '\n' | '\r')).collect()
    }

    fn tokenize(&self, text: &str) -> Vec<Token> {
        split_text_for_lookup(text)
            .into_iter()
            .map(|unit| Token {
                surface: unit.text.clone(),
                normalized: unit.text,
                position: unit.start,
            })
            .collect()
    }

    fn lookup(&self, token: &Token) -> Vec<LookupResult> {
        self.lookup_text(&token.normalized).iter().flat_map(flatten).collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::loader;

    const MINI_RULES: &str = r#"[
        {"type":"stdrule","dec_end":"る","con_end":"た","dec_tag":"v1","con_tag":"","detail":"past"}
    ]"#;

    const MINI_LEXICON: &str = r#"[
        {"seq":1,"k_ele":[{"keb":"見る"}],"r_ele":[{"reb":"みる"}],
         "sense":[{"pos":["&v1;"],"gloss":["to see"]}]},
        {"seq":2,"k_ele":[{"keb":"言葉"}],"r_ele":[{"reb":"ことば"},{"reb":"こと"}],
         "sense":[{"pos":["&n;"],"misc":["&uk;"],"gloss":["word; language"]}]},
        {"seq":3,"k_ele":[{"keb":"本"}],"r_ele":[{"reb":"ほん"}],
         "sense":[{"pos":["&n;"],"gloss":["book"]}]},
        {"seq":4,"r_ele":[{"reb":"ほん"}],
         "sense":[{"pos":["&n;"],"gloss":["true; main"]}]},
        {"seq":5,"k_ele":[{"keb":"切手"}],"r_ele":[{"reb":"きって"}],
         "sense":[{"pos":["&n;"],"gloss":["stamp"]}]},
        {"seq":6,"k_ele":[{"keb":"分"}],"r_ele":[{"reb":"ふん"}],
         "sense":[{"pos":["&n;"],"gloss":["minute"]}]},
        {"seq":7,"r_ele":[{"reb":"こと"}],
         "sense":[{"pos":["&n;"],"gloss":["thing; matter"]}]},
        {"seq":8,"r_ele":[{"reb":"を"}],
         "sense":[{"pos":["&prt;"],"gloss":["object marker"]}]}
    ]"#;

    pub(crate) fn mini_analyzer() -> JapaneseAnalyzer {
        let rules = loader::load_rules(MINI_RULES).expect("mini rules");
        let lexicon = loader::load_lexicon(MINI_LEXICON).expect("mini lexicon");
        JapaneseAnalyzer::new(
            rules,
            lexicon,
            PriorityTable::default(),
            AudioIndex::default(),
            FrequencyTable::default(),
        )
    }

    #[test]
    fn tokenize_yields_units_with_positions() {
        let analyzer = mini_analyzer();
        let tokens = analyzer.tokenize("ことば。見た");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].surface, "ことば");
        assert_eq!(tokens[0].position, 0);
        assert_eq!(tokens[1].surface, "見た");
        assert_eq!(tokens[1].position, 4);
    }

    #[test]
    fn normalize_strips_newlines() {
        let analyzer = mini_analyzer();
        assert_eq!(analyzer.normalize("こと\nば\r"), "ことば");
    }

    #[test]
    fn lookup_flattens_to_core_results() {
        let analyzer = mini_analyzer();
        let tokens = analyzer.tokenize("見た");
        let results = analyzer.lookup(&tokens[0]);
        assert!(!results.is_empty());

        let seen = &results[0];
        assert_eq!(seen.term, "見る");
        assert_eq!(seen.readings, ["みる"]);
        assert_eq!(seen.metadata.get("sequence_id").map(String::as_str), Some("1"));
        assert_eq!(seen.metadata.get("kana_text").map(String::as_str), Some("みた"));
        let deconj = seen.metadata.get("deconjugation").expect("deconjugation metadata");
        assert!(deconj.contains("見た → 見る"), "got {deconj}");
        assert_eq!(seen.definitions[0].text, "to see");
        assert_eq!(seen.definitions[0].part_of_speech, ["v1"]);
    }

    #[test]
    fn language_code_is_japanese() {
        assert_eq!(mini_analyzer().language_code(), "ja");
    }
}
