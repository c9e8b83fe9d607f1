//! Post-restriction annotation: audio availability and corpus frequency.

use std::collections::{HashMap, HashSet};

use crate::lexicon::EntryMatch;
use crate::lookup::Definitions;
use crate::script::katakana_to_hiragana;

/// Known pronunciation-audio keys: bare readings for kana words, or
/// "reading;spelling" pairs. Some sources index a handful of entries under
/// malformed keys; `remapped` translates those to the canonical key.
#[derive(Debug, Default)]
pub struct AudioIndex {
    available: HashSet<String>,
    remapped: HashMap<String, String>,
}

impl AudioIndex {
    pub fn new(available: HashSet<String>, remapped: HashMap<String, String>) -> Self {
        AudioIndex { available, remapped }
    }

    pub fn len(&self) -> usize {
        self.available.len() + self.remapped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.available.is_empty() && self.remapped.is_empty()
    }

    fn resolve(&self, key: &str) -> Option<String> {
        if self.available.contains(key) {
            Some(key.to_string())
        } else {
            self.remapped.get(key).cloned()
        }
    }

    /// Every audio key this entry's surviving forms can play
    fn keys_for(&self, entry: &EntryMatch) -> Vec<String> {
        let mut keys = Vec::new();

        if entry.spellings.is_empty() {
            for r in &entry.readings {
                if let Some(key) = self.resolve(&r.text) {
                    keys.push(key);
                }
            }
        } else {
            for k in &entry.spellings {
                for r in &entry.readings {
                    if let Some(key) = self.resolve(&format!("{};{}", r.text, k.text)) {
                        keys.push(key);
                    }
                }
            }
        }

        keys
    }
}

/// One corpus frequency row: surface form, rank, and score
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyRecord {
    pub surface: String,
    pub rank: i64,
    pub score: f64,
}

/// The frequency annotation attached to an entry
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyHit {
    pub surface: String,
    pub reading: String,
    pub rank: i64,
    pub score: f64,
}

/// Corpus frequency rows indexed by hiragana-folded reading
#[derive(Debug, Default)]
pub struct FrequencyTable {
    by_reading: HashMap<String, Vec<FrequencyRecord>>,
}

impl FrequencyTable {
    pub fn new(by_reading: HashMap<String, Vec<FrequencyRecord>>) -> Self {
        FrequencyTable { by_reading }
    }

    pub fn reading_count(&self) -> usize {
        self.by_reading.len()
    }

    /// Best (lowest-rank) frequency row whose surface form is one of the
    /// entry's own spellings or readings. A row whose surface equals the
    /// bare reading is skipped for entries written with kanji, since it
    /// belongs to the kana homograph.
    fn best_hit(&self, entry: &EntryMatch) -> Option<FrequencyHit> {
        let own_forms: HashSet<&str> = entry
            .readings
            .iter()
            .chain(entry.spellings.iter())
            .map(|e| e.text.as_str())
            .collect();

        let mut best: Option<FrequencyHit> = None;

        for r in &entry.readings {
            let reading = katakana_to_hiragana(&r.text);
            let Some(rows) = self.by_reading.get(&reading) else {
                continue;
            };

            for row in rows {
                if !own_forms.contains(row.surface.as_str()) {
                    continue;
                }
                if row.surface == reading && !entry.spellings.is_empty() {
                    continue;
                }
                if best.as_ref().is_none_or(|b| b.rank > row.rank) {
                    best = Some(FrequencyHit {
                        surface: row.surface.clone(),
                        reading: reading.clone(),
                        rank: row.rank,
                        score: row.score,
                    });
                }
            }
        }

        best
    }
}

/// Attach audio keys and frequency data to every surviving entry
pub fn add_extra_info(results: &mut [Definitions], audio: &AudioIndex, frequency: &FrequencyTable) {
    for lookup in results.iter_mut() {
        for entry in &mut lookup.entries {
            entry.audio = audio.keys_for(entry);
            entry.frequency = frequency.best_hit(entry);
        }
    }
}
