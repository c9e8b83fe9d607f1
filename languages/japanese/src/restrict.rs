//! JMDict cross-restriction handling.
//!
//! After a match is made through one particular spelling or reading, the
//! entry copy is narrowed to the alternate forms and senses consistent with
//! that match. Pruning is monotonic: lists only ever shrink.

use std::collections::HashSet;

use crate::lexicon::{EntryMatch, FormKind, FoundForm};
use crate::lookup::Definitions;

/// Narrow an entry copy to the forms consistent with its matched element
pub fn restrict_by_match(mut entry: EntryMatch) -> EntryMatch {
    // bogus/placeholder match: nothing to narrow against
    let Some(orig) = entry.found.clone() else {
        return entry;
    };

    entry.orig_found = Some(orig.clone());

    // We looked up a reading, but the entry is written with kanji: pick the
    // first spelling consistent with both restriction lists and treat it as
    // also-found, so display and priority rules see a concrete spelling.
    if orig.kind == FormKind::Reading && !entry.spellings.is_empty() {
        let reading = &orig.element.text;
        let reading_restrict = &orig.element.restrict;

        let promoted = entry.spellings.iter().find(|k| {
            let allowed_by_reading =
                reading_restrict.is_empty() || reading_restrict.contains(&k.text);
            let allows_reading = k.restrict.is_empty() || k.restrict.contains(reading);
            allowed_by_reading && allows_reading
        });

        if let Some(k) = promoted {
            entry.found = Some(FoundForm { kind: FormKind::Spelling, element: k.clone() });
        }
    }

    match orig.kind {
        // matched a reading: drop spellings that cannot carry it
        FormKind::Reading => {
            let reading = orig.element.text.clone();
            let reading_restrict = orig.element.restrict.clone();
            entry.spellings.retain(|k| {
                if !reading_restrict.is_empty() && !reading_restrict.contains(&k.text) {
                    return false;
                }
                k.restrict.is_empty() || k.restrict.contains(&reading)
            });
        }
        // matched a spelling: drop readings that cannot voice it
        FormKind::Spelling => {
            let spelling = orig.element.text.clone();
            let spelling_restrict = orig.element.restrict.clone();
            entry.readings.retain(|r| {
                if !spelling_restrict.is_empty() && !spelling_restrict.contains(&r.text) {
                    return false;
                }
                r.restrict.is_empty() || r.restrict.contains(&spelling)
            });
        }
    }

    // drop senses restricted to forms other than the one matched
    entry.senses.retain(|s| {
        if orig.kind == FormKind::Spelling && !s.stagk.is_empty() {
            s.stagk.contains(&orig.element.text)
        } else if orig.kind == FormKind::Reading && !s.stagr.is_empty() {
            s.stagr.contains(&orig.element.text)
        } else {
            true
        }
    });

    entry
}

/// Drop entries whose sequence id already surfaced earlier in this lookup
/// session, restrict the survivors, and drop lookups left empty.
pub fn skip_rereferenced(results: Vec<Definitions>) -> Vec<Definitions> {
    let mut seen_seq: HashSet<i64> = HashSet::new();
    let mut kept = Vec::new();

    for mut lookup in results {
        let entries: Vec<EntryMatch> = std::mem::take(&mut lookup.entries)
            .into_iter()
            .filter(|e| seen_seq.insert(e.seq))
            .map(restrict_by_match)
            .collect();

        if !entries.is_empty() {
            lookup.entries = entries;
            kept.push(lookup);
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::{FormElement, Lexicon, LexiconEntry, Sense};

    fn form(text: &str) -> FormElement {
        FormElement { text: text.to_string(), ..Default::default() }
    }

    fn restricted_form(text: &str, restrict: &[&str]) -> FormElement {
        FormElement {
            text: text.to_string(),
            restrict: restrict.iter().map(|r| r.to_string()).collect(),
            ..Default::default()
        }
    }

    // The 夕/昨夜 family: ゆう voices 夕 only, さくや voices 昨夜 only,
    // 夕 is only ever voiced ゆう.
    fn evening() -> Lexicon {
        Lexicon::new(vec![LexiconEntry {
            seq: 100,
            spellings: vec![restricted_form("夕", &["ゆう"]), form("夕べ"), form("昨夜")],
            readings: vec![
                restricted_form("ゆう", &["夕"]),
                form("ゆうべ"),
                restricted_form("さくや", &["昨夜"]),
            ],
            senses: vec![
                Sense { pos: vec!["n".into()], gloss: vec!["evening".into()], ..Default::default() },
                Sense {
                    pos: vec!["n".into()],
                    gloss: vec!["last night".into()],
                    stagr: vec!["ゆうべ".into(), "さくや".into()],
                    ..Default::default()
                },
            ],
        }])
    }

    fn match_for(lex: &Lexicon, text: &str) -> EntryMatch {
        lex.search(text).expect("search hit").remove(0)
    }

    #[test]
    fn restricted_reading_keeps_only_its_spelling() {
        let entry = restrict_by_match(match_for(&evening(), "ゆう"));
        let spellings: Vec<&str> = entry.spellings.iter().map(|k| k.text.as_str()).collect();
        assert_eq!(spellings, ["夕"]);
        // the promoted found form is the surviving spelling
        assert_eq!(entry.found.as_ref().unwrap().element.text, "夕");
        assert_eq!(entry.orig_found.as_ref().unwrap().element.text, "ゆう");
    }

    #[test]
    fn unrestricted_reading_drops_restricted_away_spellings() {
        // ゆうべ carries no restriction, so only spellings restricted to
        // other readings drop out; 夕 is restricted to ゆう and must go
        let entry = restrict_by_match(match_for(&evening(), "ゆうべ"));
        let spellings: Vec<&str> = entry.spellings.iter().map(|k| k.text.as_str()).collect();
        assert_eq!(spellings, ["夕べ", "昨夜"]);
    }

    #[test]
    fn spelling_match_prunes_readings() {
        let entry = restrict_by_match(match_for(&evening(), "昨夜"));
        let readings: Vec<&str> = entry.readings.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(readings, ["ゆうべ", "さくや"]);
    }

    #[test]
    fn sense_restrictions_follow_the_match() {
        // 夕 was not looked up through ゆうべ/さくや, so the "last night"
        // sense (stagr-restricted) must drop
        let entry = restrict_by_match(match_for(&evening(), "ゆう"));
        assert_eq!(entry.senses.len(), 1);
        assert_eq!(entry.senses[0].gloss, ["evening"]);

        let entry = restrict_by_match(match_for(&evening(), "さくや"));
        assert_eq!(entry.senses.len(), 2);
    }

    #[test]
    fn restriction_is_monotonic() {
        for query in ["ゆう", "ゆうべ", "さくや", "夕", "夕べ", "昨夜"] {
            let before = match_for(&evening(), query);
            let after = restrict_by_match(before.clone());
            assert!(after.spellings.iter().all(|k| before.spellings.contains(k)));
            assert!(after.readings.iter().all(|r| before.readings.contains(r)));
            assert!(after.senses.iter().all(|s| before.senses.contains(s)));
        }
    }

    #[test]
    fn spelling_restricted_to_another_reading_drops() {
        // two spellings share にんき; 人気 is restricted to ひとけ, so a
        // match through にんき must drop it
        let lex = Lexicon::new(vec![LexiconEntry {
            seq: 200,
            spellings: vec![restricted_form("人気", &["ひとけ"]), form("人氣")],
            readings: vec![form("にんき"), form("ひとけ")],
            senses: vec![Sense { pos: vec!["n".into()], ..Default::default() }],
        }]);

        let entry = restrict_by_match(match_for(&lex, "にんき"));
        let spellings: Vec<&str> = entry.spellings.iter().map(|k| k.text.as_str()).collect();
        assert_eq!(spellings, ["人氣"]);
        assert_eq!(entry.found.as_ref().unwrap().element.text, "人氣");
    }

    #[test]
    fn bogus_match_passes_through_unpruned() {
        let mut entry = match_for(&evening(), "ゆう");
        entry.found = None;
        let after = restrict_by_match(entry.clone());
        assert_eq!(after.spellings.len(), entry.spellings.len());
        assert_eq!(after.senses.len(), entry.senses.len());
    }
}
