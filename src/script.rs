//! In-memory representation of a loaded ELIZA script: the rule set built
//! once at load time and held (mostly) immutable for the life of a
//! conversation.

use std::collections::HashMap;

/// Reserved key under which the `NONE` rule is stored, chosen so that it
/// sorts after any real keyword a playwright might write.
pub const NONE_KEYWORD: &str = "zNONE";

/// One decomposition pattern element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternElement {
    /// A literal word that the input word must equal exactly.
    Literal(String),
    /// Matches exactly N words, whatever they are.
    FixedWildcard(usize),
    /// Matches zero or more words.
    FreeWildcard,
    /// `(* W1 W2 ...)` — matches one word equal to some Wi.
    Synonym(Vec<String>),
    /// `(/ T1 T2 ...)` — matches one word tagged with any of the given tags.
    Tag(Vec<String>),
}

/// One reassembly rule element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReassemblyElement {
    /// Append the Nth matched constituent, split on spaces.
    Constituent(usize),
    /// Append this word literally.
    Literal(String),
}

/// The body of a `( decomposition ( reassembly ) ... )` transformation
/// clause. `(= KEY)` references and PRE forms have their own grammar
/// shapes and get dedicated variants; the `NEWKEY` sentinel is just an
/// ordinary single-word template and is recognised structurally (one
/// element, the literal word `NEWKEY`) wherever a [`Reassembly::Words`] is
/// applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reassembly {
    /// A plain reassembly template.
    Words(Vec<ReassemblyElement>),
    /// `(= KEY)`: abandon reassembly, transfer control to another keyword.
    Reference(String),
    /// `(PRE (template...) (= KEY))`: reassemble with `template`, then
    /// transfer control to `KEY`.
    Pre { template: Vec<ReassemblyElement>, link: String },
}

/// One `(decomposition (reassembly) (reassembly) ...)` clause, plus the
/// mutable round-robin cursor into its reassembly list.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub decomposition: Vec<PatternElement>,
    pub reassembly_rules: Vec<Reassembly>,
    pub next_reassembly_index: usize,
}

impl Transform {
    pub fn new(decomposition: Vec<PatternElement>, reassembly_rules: Vec<Reassembly>) -> Transform {
        Transform { decomposition, reassembly_rules, next_reassembly_index: 0 }
    }

    /// Returns the reassembly rule to use this time and advances the
    /// cursor, round-robin, for next time.
    pub fn next_reassembly(&mut self) -> &Reassembly {
        let idx = self.next_reassembly_index;
        self.next_reassembly_index = (self.next_reassembly_index + 1) % self.reassembly_rules.len();
        &self.reassembly_rules[idx]
    }
}

/// A keyword rule: `(KEYWORD [= SUBST] [PRECEDENCE] [DLIST (tags)] clauses...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordRule {
    pub keyword: String,
    pub substitution: Option<String>,
    pub precedence: i32,
    pub tags: Vec<String>,
    pub transformations: Vec<Transform>,
    pub link_keyword: Option<String>,
}

impl KeywordRule {
    /// A rule "has a transformation" iff it can ever produce an action:
    /// either it has decomposition clauses to try, or a fallback link.
    pub fn has_transformation(&self) -> bool {
        !self.transformations.is_empty() || self.link_keyword.is_some()
    }
}

/// The special MEMORY rule: exactly four transformations, each producing
/// a candidate memory, plus the FIFO of memories actually laid down.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryRule {
    pub keyword: String,
    pub transformations: Vec<Transform>,
    pub memories: std::collections::VecDeque<String>,
}

impl MemoryRule {
    pub const TRANSFORM_COUNT: usize = 4;
}

/// The full rule set loaded from a script.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub opening_remarks: Vec<String>,
    pub keywords: HashMap<String, KeywordRule>,
    /// Preserves the insertion order of `keywords` so that tie-broken
    /// iteration (e.g. printing) is deterministic.
    pub keyword_order: Vec<String>,
    pub memory_rule: MemoryRule,
    /// tag -> keywords declaring that tag, built once at load.
    pub tags: HashMap<String, Vec<String>>,
}

impl Script {
    pub fn keyword_rule(&self, keyword: &str) -> Option<&KeywordRule> {
        self.keywords.get(keyword)
    }

    pub fn none_rule(&self) -> &KeywordRule {
        self.keywords.get(NONE_KEYWORD).expect("script invariant: NONE rule present")
    }

    pub fn build_tags(keywords: &HashMap<String, KeywordRule>) -> HashMap<String, Vec<String>> {
        let mut tags: HashMap<String, Vec<String>> = HashMap::new();
        for rule in keywords.values() {
            for tag in &rule.tags {
                tags.entry(tag.clone()).or_default().push(rule.keyword.clone());
            }
        }
        tags
    }

    /// Serialises this rule set back to the source grammar in §4.3. The
    /// MEMORY block is printed once, followed by every keyword rule in
    /// `keyword_order`. Re-parsing the output reconstructs an equal
    /// `Script`: field values match even where whitespace or field order
    /// (e.g. `= SUBST` before or after the precedence number) differs from
    /// whatever the original source happened to use, since the parser's
    /// rule-body loop accepts either order.
    pub fn print(&self) -> String {
        let mut out = String::new();
        out.push('(');
        out.push_str(&self.opening_remarks.join(" "));
        out.push_str(")\n\n");

        out.push_str("(MEMORY ");
        out.push_str(&self.memory_rule.keyword);
        out.push('\n');
        for t in &self.memory_rule.transformations {
            out.push_str("    ");
            out.push_str(&print_memory_transform(t));
            out.push('\n');
        }
        out.push_str(")\n\n");

        for keyword in &self.keyword_order {
            let rule = &self.keywords[keyword];
            out.push_str(&print_keyword_rule(rule));
            out.push_str("\n\n");
        }
        out
    }
}

fn print_pattern(pattern: &[PatternElement]) -> String {
    let parts: Vec<String> = pattern
        .iter()
        .map(|elem| match elem {
            PatternElement::Literal(w) => w.clone(),
            PatternElement::FixedWildcard(n) => n.to_string(),
            PatternElement::FreeWildcard => "0".to_string(),
            PatternElement::Synonym(words) => format!("(* {})", words.join(" ")),
            PatternElement::Tag(words) => format!("(/ {})", words.join(" ")),
        })
        .collect();
    format!("({})", parts.join(" "))
}

fn print_reassembly_words(elements: &[ReassemblyElement]) -> String {
    elements
        .iter()
        .map(|e| match e {
            ReassemblyElement::Constituent(n) => n.to_string(),
            ReassemblyElement::Literal(w) => w.clone(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_reassembly(r: &Reassembly) -> String {
    match r {
        Reassembly::Words(elements) => format!("({})", print_reassembly_words(elements)),
        Reassembly::Reference(link) => format!("(={})", link),
        Reassembly::Pre { template, link } => {
            format!("(PRE ({}) (={}))", print_reassembly_words(template), link)
        }
    }
}

fn print_transform(t: &Transform) -> String {
    let mut s = String::from("(");
    s.push_str(&print_pattern(&t.decomposition));
    for r in &t.reassembly_rules {
        s.push(' ');
        s.push_str(&print_reassembly(r));
    }
    s.push(')');
    s
}

/// MEMORY transforms use the flat `'(' word+ '=' word+ ')'` grammar: a
/// single reassembly clause, no nested pattern parens.
fn print_memory_transform(t: &Transform) -> String {
    let decomp_words: Vec<String> = t
        .decomposition
        .iter()
        .map(|e| match e {
            PatternElement::Literal(w) => w.clone(),
            PatternElement::FixedWildcard(n) => n.to_string(),
            PatternElement::FreeWildcard => "0".to_string(),
            PatternElement::Synonym(_) | PatternElement::Tag(_) => {
                unreachable!("memory decomposition is a flat word list")
            }
        })
        .collect();
    let reassembly = match &t.reassembly_rules[0] {
        Reassembly::Words(elements) => print_reassembly_words(elements),
        _ => unreachable!("memory reassembly is a flat word list"),
    };
    format!("({} = {})", decomp_words.join(" "), reassembly)
}

fn print_keyword_rule(rule: &KeywordRule) -> String {
    let name = if rule.keyword == NONE_KEYWORD { "NONE" } else { rule.keyword.as_str() };
    let mut s = format!("({}", name);
    if let Some(sub) = &rule.substitution {
        s.push_str(" = ");
        s.push_str(sub);
    }
    if rule.precedence != 0 {
        s.push(' ');
        s.push_str(&rule.precedence.to_string());
    }
    if !rule.tags.is_empty() {
        s.push_str(" DLIST(/");
        s.push_str(&rule.tags.join(" "));
        s.push(')');
    }
    for t in &rule.transformations {
        s.push_str("\n    ");
        s.push_str(&print_transform(t));
    }
    if let Some(link) = &rule.link_keyword {
        s.push_str("\n    (=");
        s.push_str(link);
        s.push(')');
    }
    s.push(')');
    s
}

#[cfg(test)]
mod tests {
    use super::Script;
    use crate::parser;
    use std::collections::{BTreeSet, HashMap};

    fn doctor_fragment() -> &'static str {
        include_str!("../demos/doctor.eliza")
    }

    /// `Script::tags` is a derived index built by iterating a `HashMap`, so
    /// its per-tag `Vec<String>` order isn't guaranteed to match between two
    /// independently-parsed copies of the same script even when every other
    /// field is identical. Compare it as a set-of-sets instead.
    fn normalize_tags(tags: &HashMap<String, Vec<String>>) -> HashMap<String, BTreeSet<String>> {
        tags.iter().map(|(tag, keywords)| (tag.clone(), keywords.iter().cloned().collect())).collect()
    }

    fn assert_round_trips(original: &Script) {
        let printed = original.print();
        let reparsed = parser::parse(&printed)
            .unwrap_or_else(|e| panic!("printed script failed to reparse: {e}\n---\n{printed}"));

        assert_eq!(original.opening_remarks, reparsed.opening_remarks);
        assert_eq!(original.keyword_order, reparsed.keyword_order);
        assert_eq!(original.keywords, reparsed.keywords);
        assert_eq!(original.memory_rule, reparsed.memory_rule);
        assert_eq!(normalize_tags(&original.tags), normalize_tags(&reparsed.tags));
    }

    #[test]
    fn print_then_parse_round_trips() {
        let original = parser::parse(doctor_fragment()).unwrap();
        assert_round_trips(&original);
    }

    #[test]
    fn print_then_parse_round_trips_pre_and_reference_forms() {
        let src = "()\n\
            (MEMORY X (0 = 1) (0 = 1) (0 = 1) (0 = 1))\n\
            (X ((0 FOO 0)\n\
                (PRE (I FEEL 1) (=Y))))\n\
            (Y ((0) (=X)))\n\
            (NONE ((0) (I SEE)))\n";
        let original = parser::parse(src).unwrap();
        assert_round_trips(&original);
    }
}
