//! Breadth-first deconjugation search.
//!
//! Starting from the surface string, every rule in the table is tried
//! against every frontier hypothesis each round; successful applications
//! become the next frontier. Growth bounds on the hypothesis text and tag
//! chain guarantee termination, since most rules are generative.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use crate::rules::{ContextPredicate, Rule, RuleKind, RuleSet};
use crate::script::char_count;

/// How much longer than the original a hypothesis text may grow, in chars
const MAX_TEXT_GROWTH: usize = 10;
/// How many more tags than original chars a hypothesis may accumulate
const MAX_TAG_GROWTH: usize = 6;

/// One reachable deconjugation hypothesis.
///
/// Never mutated after creation: each rule application derives a child by
/// cloning the parent and appending. Two hypotheses are equal when their
/// `text`, `tags`, and `process` agree; the visited-text set and the shared
/// original text do not participate in identity.
#[derive(Debug, Clone)]
pub struct Hypothesis {
    /// Current candidate lemma text
    pub text: String,
    /// The surface string the search started from
    pub original_text: String,
    /// Grammatical tags applied so far, most recent last
    pub tags: Vec<String>,
    /// Names of the rules applied, in order
    pub process: Vec<String>,
    /// Every text value visited along this hypothesis's path
    pub seen_text: HashSet<String>,
}

impl Hypothesis {
    fn seed(text: &str) -> Self {
        Hypothesis {
            text: text.to_string(),
            original_text: text.to_string(),
            tags: Vec::new(),
            process: Vec::new(),
            seen_text: HashSet::new(),
        }
    }

    /// True when no rule was applied: the hypothesis is the surface form
    pub fn is_surface(&self) -> bool {
        self.process.is_empty()
    }

    fn derive(&self, new_text: String, rule: &Rule, push_tags: bool) -> Hypothesis {
        let mut child = Hypothesis {
            text: new_text,
            original_text: self.original_text.clone(),
            tags: self.tags.clone(),
            process: self.process.clone(),
            seen_text: self.seen_text.clone(),
        };

        child.process.push(rule.detail.clone());

        if push_tags {
            // an empty con_tag marks a rule that starts a chain without
            // asserting anything about the surface form's own class
            if child.tags.is_empty() && !rule.con_tag.is_empty() {
                child.tags.push(rule.con_tag.clone());
            }
            child.tags.push(rule.dec_tag.clone());
        }

        if child.seen_text.is_empty() {
            child.seen_text.insert(self.text.clone());
        }
        child.seen_text.insert(child.text.clone());

        child
    }
}

impl PartialEq for Hypothesis {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text && self.tags == other.tags && self.process == other.process
    }
}

impl Eq for Hypothesis {}

impl Hash for Hypothesis {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
        self.tags.hash(state);
        self.process.hash(state);
    }
}

/// All hypotheses reachable from `text`, including the untransformed seed,
/// in frontier admission order.
pub fn deconjugate(rules: &RuleSet, text: &str) -> Vec<Hypothesis> {
    let original_len = char_count(text);
    let seed = Hypothesis::seed(text);

    let mut admitted: HashSet<Hypothesis> = HashSet::new();
    admitted.insert(seed.clone());

    let mut processed: Vec<Hypothesis> = Vec::new();
    let mut frontier = vec![seed];

    while !frontier.is_empty() {
        let mut candidates = Vec::new();

        for form in &frontier {
            if form.text.is_empty() {
                continue;
            }

            // Growth bound: checked before any rule is attempted
            if char_count(&form.text) > original_len + MAX_TEXT_GROWTH
                || form.tags.len() > original_len + MAX_TAG_GROWTH
            {
                continue;
            }

            for rule in rules.iter() {
                apply_rule(form, rule, &mut candidates);
            }
        }

        let mut next = Vec::new();
        for candidate in candidates {
            if admitted.insert(candidate.clone()) {
                next.push(candidate);
            }
        }

        processed.append(&mut frontier);
        frontier = next;
    }

    processed
}

fn apply_rule(form: &Hypothesis, rule: &Rule, out: &mut Vec<Hypothesis>) {
    match rule.kind {
        RuleKind::Std => {
            // A terminal/base rule cannot be the very first step
            if rule.detail.is_empty() && form.tags.is_empty() {
                return;
            }
            apply_suffix(form, rule, out);
        }
        RuleKind::Rewrite => {
            if form.text != rule.con_end {
                return;
            }
            apply_suffix(form, rule, out);
        }
        RuleKind::OnlyFinal => {
            if !form.tags.is_empty() {
                return;
            }
            apply_suffix(form, rule, out);
        }
        RuleKind::NeverFinal => {
            if form.tags.is_empty() {
                return;
            }
            apply_suffix(form, rule, out);
        }
        RuleKind::Context => {
            if !context_allows(rule.context, form, rule) {
                return;
            }
            apply_suffix(form, rule, out);
        }
        RuleKind::Substitution => {
            if !form.process.is_empty() {
                return;
            }
            apply_substitution(form, rule, out);
        }
    }
}

/// Shared suffix-strip transform used by every rule kind except substitution
fn apply_suffix(form: &Hypothesis, rule: &Rule, out: &mut Vec<Hypothesis>) {
    let Some(stem) = form.text.strip_suffix(rule.con_end.as_str()) else {
        return;
    };

    if let Some(last) = form.tags.last() {
        if *last != rule.con_tag {
            return;
        }
    }

    let new_text = format!("{stem}{}", rule.dec_end);
    out.push(form.derive(new_text, rule, true));
}

fn apply_substitution(form: &Hypothesis, rule: &Rule, out: &mut Vec<Hypothesis>) {
    if rule.con_end.is_empty() || !form.text.contains(rule.con_end.as_str()) {
        return;
    }

    let new_text = form.text.replace(rule.con_end.as_str(), &rule.dec_end);
    // tags stay untouched: a substitution is orthographic, not grammatical
    out.push(form.derive(new_text, rule, false));
}

fn context_allows(context: Option<ContextPredicate>, form: &Hypothesis, rule: &Rule) -> bool {
    match context {
        Some(ContextPredicate::V1InfTrap) => {
            // Blocked only on a hypothesis whose sole tag is the 連用形 stem
            !(form.tags.len() == 1 && form.tags[0] == "stem-ren")
        }
        Some(ContextPredicate::SaSpecial) => {
            if form.text.is_empty() {
                return false;
            }
            match form.text.strip_suffix(rule.con_end.as_str()) {
                Some(base) => !base.ends_with('さ'),
                None => false,
            }
        }
        None => false,
    }
}
