//! Deconjugation rule table.
//!
//! Rule records come from the deconjugator data file, where the four
//! ending/tag fields may each hold either a single string or a parallel
//! array. Parallel-array records expand at load time into fully-scalar
//! "virtual" rules, one per array index, so the search engine never has to
//! special-case arrays while matching.

use serde::Deserialize;

/// A field that the data file declares as either one string or an array
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn len(&self) -> Option<usize> {
        match self {
            OneOrMany::One(_) => None,
            OneOrMany::Many(v) => Some(v.len()),
        }
    }

    fn pick(&self, i: usize) -> String {
        match self {
            OneOrMany::One(s) => s.clone(),
            OneOrMany::Many(v) => v.get(i).or_else(|| v.first()).cloned().unwrap_or_default(),
        }
    }
}

fn pick(field: &Option<OneOrMany>, i: usize) -> String {
    field.as_ref().map(|f| f.pick(i)).unwrap_or_default()
}

/// One rule record as it appears in the deconjugator data file
#[derive(Debug, Clone, Deserialize)]
pub struct RawRule {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub contextrule: Option<String>,
    #[serde(default)]
    pub dec_end: Option<OneOrMany>,
    #[serde(default)]
    pub con_end: Option<OneOrMany>,
    #[serde(default)]
    pub dec_tag: Option<OneOrMany>,
    #[serde(default)]
    pub con_tag: Option<OneOrMany>,
    #[serde(default)]
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Strip a conjugated suffix, append the decomposed one
    Std,
    /// Rewrite the whole text when it equals the conjugated ending
    Rewrite,
    /// Applicable only to an untransformed hypothesis
    OnlyFinal,
    /// Applicable only after at least one transformation
    NeverFinal,
    /// Std transform gated by a named context predicate
    Context,
    /// Substring substitution, first transformation step only
    Substitution,
}

impl RuleKind {
    fn parse(kind: &str) -> Option<Self> {
        match kind {
            "stdrule" => Some(RuleKind::Std),
            "rewriterule" => Some(RuleKind::Rewrite),
            "onlyfinalrule" => Some(RuleKind::OnlyFinal),
            "neverfinalrule" => Some(RuleKind::NeverFinal),
            "contextrule" => Some(RuleKind::Context),
            "substitution" => Some(RuleKind::Substitution),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextPredicate {
    /// Blocks a rule on a bare 連用形 stem hypothesis
    V1InfTrap,
    /// Blocks さ-stem false positives of する compounds
    SaSpecial,
}

impl ContextPredicate {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "v1inftrap" => Some(ContextPredicate::V1InfTrap),
            "saspecial" => Some(ContextPredicate::SaSpecial),
            _ => None,
        }
    }
}

/// A fully-scalar deconjugation rule, ready for matching
#[derive(Debug, Clone)]
pub struct Rule {
    pub kind: RuleKind,
    pub context: Option<ContextPredicate>,
    pub con_end: String,
    pub dec_end: String,
    pub con_tag: String,
    pub dec_tag: String,
    /// Human-readable rule name; empty means terminal/base form
    pub detail: String,
}

/// The immutable, ordered rule table
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Expand raw records into scalar rules, preserving table order.
    /// Records with an unknown kind or context predicate are skipped.
    pub fn from_records(records: Vec<RawRule>) -> Self {
        let mut rules = Vec::new();
        let mut skipped = 0usize;

        for record in &records {
            let Some(kind) = RuleKind::parse(&record.kind) else {
                skipped += 1;
                continue;
            };

            let context = match (kind, record.contextrule.as_deref()) {
                (RuleKind::Context, Some(name)) => match ContextPredicate::parse(name) {
                    Some(p) => Some(p),
                    None => {
                        skipped += 1;
                        continue;
                    }
                },
                (RuleKind::Context, None) => {
                    skipped += 1;
                    continue;
                }
                _ => None,
            };

            // The first array-valued field determines the expansion count
            let variants = [&record.dec_end, &record.con_end, &record.dec_tag, &record.con_tag]
                .into_iter()
                .find_map(|f| f.as_ref().and_then(OneOrMany::len))
                .unwrap_or(1);

            for i in 0..variants {
                rules.push(Rule {
                    kind,
                    context,
                    con_end: pick(&record.con_end, i),
                    dec_end: pick(&record.dec_end, i),
                    con_tag: pick(&record.con_tag, i),
                    dec_tag: pick(&record.dec_tag, i),
                    detail: record.detail.clone(),
                });
            }
        }

        if skipped > 0 {
            tracing::warn!("skipped {skipped} malformed deconjugation rule records");
        }

        RuleSet { rules }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: &str) -> RawRule {
        serde_json::from_str(json).expect("rule json")
    }

    #[test]
    fn scalar_record_stays_single() {
        let set = RuleSet::from_records(vec![raw(
            r#"{"type":"stdrule","dec_end":"る","con_end":"た","dec_tag":"v1","con_tag":"past","detail":"past"}"#,
        )]);
        assert_eq!(set.len(), 1);
        let rule = set.iter().next().unwrap();
        assert_eq!(rule.kind, RuleKind::Std);
        assert_eq!(rule.con_end, "た");
        assert_eq!(rule.dec_end, "る");
    }

    #[test]
    fn parallel_arrays_expand_per_index() {
        let set = RuleSet::from_records(vec![raw(
            r#"{"type":"stdrule","dec_end":["ぬ","ぶ","む"],"con_end":["んで","んで","んで"],"dec_tag":"v5","con_tag":"te","detail":"te form"}"#,
        )]);
        assert_eq!(set.len(), 3);
        let ends: Vec<&str> = set.iter().map(|r| r.dec_end.as_str()).collect();
        assert_eq!(ends, ["ぬ", "ぶ", "む"]);
        // scalar fields repeat across every virtual rule
        assert!(set.iter().all(|r| r.con_tag == "te" && r.detail == "te form"));
    }

    #[test]
    fn array_on_one_side_reuses_scalar_other_side() {
        let set = RuleSet::from_records(vec![raw(
            r#"{"type":"stdrule","dec_end":"う","con_end":["った","って"],"dec_tag":"v5u","con_tag":"x","detail":"d"}"#,
        )]);
        assert_eq!(set.len(), 2);
        assert!(set.iter().all(|r| r.dec_end == "う"));
        let cons: Vec<&str> = set.iter().map(|r| r.con_end.as_str()).collect();
        assert_eq!(cons, ["った", "って"]);
    }

    #[test]
    fn unknown_kind_is_skipped() {
        let set = RuleSet::from_records(vec![
            raw(r#"{"type":"mysteryrule","detail":"x"}"#),
            raw(r#"{"type":"stdrule","dec_end":"る","con_end":"た","dec_tag":"v1","con_tag":"past","detail":"past"}"#),
        ]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn context_rule_requires_known_predicate() {
        let set = RuleSet::from_records(vec![
            raw(r#"{"type":"contextrule","contextrule":"nosuch","dec_end":"a","con_end":"b","dec_tag":"t","con_tag":"u","detail":"d"}"#),
            raw(r#"{"type":"contextrule","contextrule":"saspecial","dec_end":"a","con_end":"b","dec_tag":"t","con_tag":"u","detail":"d"}"#),
        ]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next().unwrap().context, Some(ContextPredicate::SaSpecial));
    }
}
