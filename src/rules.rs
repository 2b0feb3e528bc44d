//! Per-keyword and per-memory transformation application: the piece that
//! turns a matched decomposition into either a finished response, a
//! request to try the next keyword, or a hand-off to another rule.

use std::collections::HashMap;

use crate::matcher;
use crate::script::{KeywordRule, Reassembly, ReassemblyElement};

/// The sentinel substituted for an out-of-range or zero reassembly index.
pub const OUT_OF_RANGE_SENTINEL: &str = "THINGY";

/// The literal word that, alone in a reassembly template, means "give up
/// on this keyword and try the next one on the stack".
const NEWKEY_SENTINEL: &str = "NEWKEY";

type TagIndex = HashMap<String, Vec<String>>;

/// The result of applying one keyword rule to the current sentence.
pub enum Action {
    /// A decomposition matched and reassembly produced the response.
    Complete(Vec<String>),
    /// No decomposition matched and the rule has no link keyword.
    Inapplicable,
    /// A decomposition matched but its reassembly was the `NEWKEY`
    /// sentinel: try the next keyword on the stack.
    NewKey,
    /// Transfer control to another keyword, either because this rule has
    /// no match but a `link_keyword`, or because the chosen reassembly was
    /// a bare `(= KEY)` reference.
    LinkKey(String),
    /// A PRE form matched: `words` replaces the sentence, then control
    /// transfers to `link`.
    Pre { words: Vec<String>, link: String },
}

/// Expands a reassembly template against a matched constituent list.
///
/// A constituent index of `0`, or one past the number of constituents,
/// is a script error recorded in-band as the literal word `THINGY` rather
/// than aborting the conversation.
pub fn expand(elements: &[ReassemblyElement], constituents: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    for el in elements {
        match el {
            ReassemblyElement::Literal(w) => out.push(w.clone()),
            ReassemblyElement::Constituent(n) => {
                if *n == 0 || *n > constituents.len() {
                    out.push(OUT_OF_RANGE_SENTINEL.to_string());
                } else {
                    out.extend(constituents[*n - 1].split_whitespace().map(|s| s.to_string()));
                }
            }
        }
    }
    out
}

fn is_newkey(elements: &[ReassemblyElement]) -> bool {
    matches!(elements, [ReassemblyElement::Literal(w)] if w == NEWKEY_SENTINEL)
}

/// Applies `rule` to `words`: tries each transformation's decomposition in
/// order, and on the first match, advances that transformation's
/// round-robin reassembly cursor and acts on the chosen reassembly.
pub fn apply(rule: &mut KeywordRule, words: &[String], tags: &TagIndex) -> Action {
    for transform in &mut rule.transformations {
        let constituents = match matcher::decompose(&transform.decomposition, words, tags) {
            Some(c) => c,
            None => continue,
        };
        return match transform.next_reassembly().clone() {
            Reassembly::Words(elements) => {
                if is_newkey(&elements) {
                    Action::NewKey
                } else {
                    Action::Complete(expand(&elements, &constituents))
                }
            }
            Reassembly::Reference(link) => Action::LinkKey(link),
            Reassembly::Pre { template, link } => {
                Action::Pre { words: expand(&template, &constituents), link }
            }
        };
    }
    match &rule.link_keyword {
        Some(k) => Action::LinkKey(k.clone()),
        None => Action::Inapplicable,
    }
}
