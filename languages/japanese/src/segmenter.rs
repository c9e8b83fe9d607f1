//! Text segmentation and the reading mapper.
//!
//! Raw input splits on punctuation runs into lookup units. Each unit is fed
//! through the lookup orchestrator, chaining every result's remainder into
//! further lookups until the unit is consumed, then the continuation chain
//! is walked to derive a kana-only rendering and furigana placements.

use std::collections::{HashSet, VecDeque};

use crate::lookup::{DEFAULT_DEPTH, Definitions};
use crate::processor::JapaneseAnalyzer;
use crate::script::{char_count, is_hiragana, is_kana, is_punctuation};

/// One non-punctuation run of the input, with its character offset
#[derive(Debug, Clone, PartialEq)]
pub struct TextUnit {
    pub text: String,
    pub start: usize,
}

/// A single furigana gloss: `original` is read as `reading`, starting at
/// character offset `start` in the whole input.
#[derive(Debug, Clone, PartialEq)]
pub struct FuriganaPlacement {
    pub original: String,
    pub reading: String,
    pub start: usize,
}

/// Everything derived from one pass over a span of raw text
#[derive(Debug, Clone, PartialEq)]
pub struct TextAnalysis {
    pub results: Vec<Definitions>,
    pub units: Vec<TextUnit>,
    pub furigana: Vec<FuriganaPlacement>,
    /// The input with every resolved unit replaced by its kana rendering
    pub kana_text: String,
}

/// Split text into maximal punctuation-free units with char offsets
pub fn split_text_for_lookup(text: &str) -> Vec<TextUnit> {
    let mut units = Vec::new();
    let mut current = String::new();
    let mut start = 0usize;

    for (i, c) in text.chars().enumerate() {
        if is_punctuation(c) {
            if !current.is_empty() {
                units.push(TextUnit { text: std::mem::take(&mut current), start });
            }
        } else {
            if current.is_empty() {
                start = i;
            }
            current.push(c);
        }
    }

    if !current.is_empty() {
        units.push(TextUnit { text: current, start });
    }

    units
}

impl JapaneseAnalyzer {
    /// Analyze a whole span: split it into units, resolve every unit by
    /// chained lookups, link the continuation chains, and derive the kana
    /// rendering with furigana placement data.
    pub fn find_definitions_in_text(&self, text: &str) -> TextAnalysis {
        let units = split_text_for_lookup(text);
        let mut results: Vec<Definitions> = Vec::new();

        for unit in &units {
            let base = results.len();
            let mut chunk: Vec<Definitions> = Vec::new();
            let mut queue: VecDeque<String> = VecDeque::from([unit.text.clone()]);
            let mut done: HashSet<String> = HashSet::new();

            while let Some(next) = queue.pop_front() {
                if !done.insert(next.clone()) {
                    continue;
                }

                let output = self.lookup_with_depth(&next, DEFAULT_DEPTH);
                let start = chunk.len();
                chunk.extend(output);

                let mut first_remainder = true;
                for idx in start..chunk.len() {
                    let remainder = chunk[idx].remainder.clone();
                    if !remainder.is_empty() && !done.contains(&remainder) {
                        // the best match's remainder continues depth-first
                        if first_remainder {
                            queue.push_front(remainder);
                            first_remainder = false;
                        } else {
                            queue.push_back(remainder);
                        }
                    }

                    // link each new result to every still-unlinked
                    // result whose remainder it continues
                    let requested = chunk[idx].requested_text.clone();
                    for prev in 0..chunk.len() {
                        if prev != idx
                            && chunk[prev].continuation.is_none()
                            && chunk[prev].remainder == requested
                        {
                            chunk[prev].continuation = Some(idx);
                        }
                    }
                }
            }

            // re-anchor local continuation indexes into the flat result list
            for mut definition in chunk {
                definition.continuation = definition.continuation.map(|i| i + base);
                results.push(definition);
            }
        }

        let (furigana, kana_text) = self.map_readings(text, &units, &results);

        TextAnalysis { results, units, furigana, kana_text }
    }

    /// Walk each unit's continuation chain to collect furigana placements
    /// and build the whole-input kana rendering.
    fn map_readings(
        &self,
        text: &str,
        units: &[TextUnit],
        results: &[Definitions],
    ) -> (Vec<FuriganaPlacement>, String) {
        let mut unit_kana: Vec<(String, String)> = Vec::new();
        let mut unit_furigana: Vec<(String, Vec<FuriganaPlacement>)> = Vec::new();

        for unit in units {
            if unit_kana.iter().any(|(u, _)| *u == unit.text) {
                continue;
            }

            let unit_chars: Vec<char> = unit.text.chars().collect();
            let mut rendered = unit.text.clone();
            let mut placements: Vec<FuriganaPlacement> = Vec::new();

            // the first result for the unit is its longest, best match
            let mut cursor = results.iter().position(|d| d.requested_text == unit.text);

            while let Some(index) = cursor {
                let definition = &results[index];
                let matched: Vec<char> = definition.matched_text.chars().collect();

                let mut occurrence = find_chars(&unit_chars, &matched, 0);
                while let Some(at) = occurrence {
                    for (original, reading) in &definition.replacement_rules {
                        let original_chars: Vec<char> = original.chars().collect();
                        let mut hit = find_chars(&unit_chars, &original_chars, at);
                        while let Some(pos) = hit {
                            // only gloss inside the span this link matched
                            if pos >= at + matched.len() {
                                break;
                            }
                            placements.push(FuriganaPlacement {
                                original: original.clone(),
                                reading: reading.clone(),
                                start: pos,
                            });
                            hit = find_chars(&unit_chars, &original_chars, pos + 1);
                        }
                    }
                    occurrence = find_chars(&unit_chars, &matched, at + 1);
                }

                if let Some(kana) = &definition.kana_text {
                    rendered = rendered.replace(&definition.matched_text, kana);
                }

                cursor = definition.continuation;
            }

            unit_kana.push((unit.text.clone(), rendered));
            if !placements.is_empty() {
                unit_furigana.push((unit.text.clone(), placements));
            }
        }

        // re-anchor unit-local placements to whole-input offsets
        let text_chars: Vec<char> = text.chars().collect();
        let mut furigana = Vec::new();
        let mut next_min = 0usize;

        while next_min < text_chars.len() {
            let mut advanced = false;

            for (unit_text, placements) in &unit_furigana {
                let unit_chars: Vec<char> = unit_text.chars().collect();
                if text_chars[next_min..].starts_with(&unit_chars) {
                    for f in placements {
                        furigana.push(FuriganaPlacement {
                            original: f.original.clone(),
                            reading: f.reading.clone(),
                            start: f.start + next_min,
                        });
                    }
                    next_min += unit_chars.len();
                    advanced = true;
                    break;
                }
            }

            if !advanced {
                next_min += 1;
            }
        }

        let mut kana_text = text.to_string();
        for (unit_text, kana) in &unit_kana {
            kana_text = kana_text.replace(unit_text.as_str(), kana);
        }

        (furigana, kana_text)
    }
}

impl Definitions {
    /// Derive the kana-only rendering of `matched_text`, recording every
    /// literal→reading inference as a replacement rule.
    pub(crate) fn compute_kana_text(&mut self) {
        if self.kana_text.is_some() {
            return;
        }
        if is_kana(&self.matched_text) {
            self.kana_text = Some(self.matched_text.clone());
            return;
        }

        let (text_prefix, text_middle, text_suffix) = cut_for_kana(&self.matched_text);
        let mut rules = std::mem::take(&mut self.replacement_rules);
        let mut kana: Option<String> = None;

        // each reading tried against its entry's first spelling first: the
        // lead spelling is the canonical orthography
        'lead: for entry in &self.entries {
            for reading in &entry.readings {
                if let Some(spelling) = entry.spellings.first() {
                    if let Some(derived) = infer_kana(
                        &self.matched_text,
                        &reading.text,
                        &spelling.text,
                        (&text_prefix, &text_middle, &text_suffix),
                        entry.spellings.len(),
                        &mut rules,
                    ) {
                        kana = Some(derived);
                        break 'lead;
                    }
                }
            }
        }

        if kana.is_none() {
            'full: for entry in &self.entries {
                for reading in &entry.readings {
                    for spelling in &entry.spellings {
                        if let Some(derived) = infer_kana(
                            &self.matched_text,
                            &reading.text,
                            &spelling.text,
                            (&text_prefix, &text_middle, &text_suffix),
                            entry.spellings.len(),
                            &mut rules,
                        ) {
                            kana = Some(derived);
                            break 'full;
                        }
                    }
                }
            }
        }

        self.replacement_rules = rules;
        self.kana_text = Some(kana.unwrap_or_else(|| self.matched_text.clone()));
    }
}

/// Decompose a string around its hiragana span: (kana-free prefix, middle,
/// trailing kana suffix). A string with no hiragana at all is all prefix.
fn cut_for_kana(input: &str) -> (String, String, String) {
    let chars: Vec<char> = input.chars().collect();
    let first = chars.iter().position(|&c| is_hiragana(c));
    let last = chars.iter().rposition(|&c| is_hiragana(c));

    let mut prefix = String::new();
    let mut suffix = String::new();

    if let Some(f) = first {
        if f > 0 {
            prefix = chars[..f].iter().collect();
        }
    }
    if let Some(l) = last {
        if l < chars.len() - 1 {
            suffix = chars[l + 1..].iter().collect();
        }
    }

    if prefix.is_empty() && suffix.is_empty() {
        (input.to_string(), String::new(), String::new())
    } else {
        let prefix_len = char_count(&prefix);
        let middle: String = chars[prefix_len..chars.len() - char_count(&suffix)].iter().collect();
        (prefix, middle, suffix)
    }
}

/// Infer the kana rendering of `text` from a candidate spelling/reading
/// pair, recording the inference as a replacement rule on success.
fn infer_kana(
    text: &str,
    reading: &str,
    spelling: &str,
    (text_prefix, text_middle, text_suffix): (&str, &str, &str),
    spelling_count: usize,
    rules: &mut Vec<(String, String)>,
) -> Option<String> {
    if text == spelling {
        add_rule(rules, text, reading);
        return Some(reading.to_string());
    }

    let (spelling_prefix, spelling_middle, _) = cut_for_kana(spelling);

    // an okurigana-free spelling is ambiguous when the entry has siblings
    if spelling_count > 1 && spelling_middle.is_empty() {
        return None;
    }

    if text_prefix != spelling_prefix {
        return None;
    }

    // peel the reading until the rest voices the spelling's kana middle;
    // what was peeled is the reading of the shared prefix
    let mut peeled = String::new();
    let mut buffer = reading;
    while !buffer.is_empty() {
        if buffer == spelling_middle {
            break;
        }
        let c = buffer.chars().next().expect("non-empty buffer");
        peeled.push(c);
        buffer = &buffer[c.len_utf8()..];
    }

    add_rule(rules, text_prefix, &peeled);
    Some(format!("{peeled}{text_middle}{text_suffix}"))
}

fn add_rule(rules: &mut Vec<(String, String)>, original: &str, reading: &str) {
    if original.is_empty() || rules.iter().any(|(o, _)| o == original) {
        return;
    }
    rules.push((original.to_string(), reading.to_string()));
}

/// First occurrence of `needle` in `haystack` at or after `from`, as a
/// character index
fn find_chars(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() || from + needle.len() > haystack.len() {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&i| haystack[i..i + needle.len()] == *needle)
}
