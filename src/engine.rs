//! The response engine: sentence segmentation, keyword-stack scheduling,
//! MEMORY creation and recall, the LIMIT counter, and the NONE fallback.

use crate::hollerith;
use crate::rules::{self, Action};
use crate::script::Script;
use crate::trace::{NullTracer, Tracer};

/// Cycle of built-in responses used when no rule fires, indexed by
/// `limit - 1`.
const NOMATCH_MESSAGES: [&str; 4] = ["PLEASE CONTINUE", "HMMM", "GO ON , PLEASE", "I SEE"];

const DEFAULT_DELIMITERS: [&str; 3] = [",", ".", "BUT"];

const HOLLERITH_PUNCTUATION: &str = "='+.)-$*/,(";

pub struct Engine {
    script: Script,
    limit: u32,
    delimiters: Vec<String>,
    use_nomatch_msgs: bool,
    on_newkey_fail_use_none: bool,
    tracer: Box<dyn Tracer>,
}

impl Engine {
    pub fn new(script: Script) -> Engine {
        Engine {
            script,
            limit: 1,
            delimiters: DEFAULT_DELIMITERS.iter().map(|s| s.to_string()).collect(),
            use_nomatch_msgs: true,
            on_newkey_fail_use_none: true,
            tracer: Box::new(NullTracer),
        }
    }

    pub fn set_delimiters(&mut self, delimiters: Vec<String>) {
        self.delimiters = delimiters;
    }

    pub fn set_use_nomatch_msgs(&mut self, enabled: bool) {
        self.use_nomatch_msgs = enabled;
    }

    pub fn set_on_newkey_fail_use_none(&mut self, enabled: bool) {
        self.on_newkey_fail_use_none = enabled;
    }

    pub fn set_tracer(&mut self, tracer: Box<dyn Tracer>) {
        self.tracer = tracer;
    }

    pub fn greeting(&self) -> String {
        self.script.opening_remarks.join(" ")
    }

    fn punctuation_chars(&self) -> Vec<char> {
        self.delimiters
            .iter()
            .filter(|d| d.chars().count() == 1)
            .filter_map(|d| d.chars().next())
            .filter(|c| HOLLERITH_PUNCTUATION.contains(*c))
            .collect()
    }

    fn tokenize(&self, filtered: &str) -> Vec<String> {
        let punctuation = self.punctuation_chars();
        let mut tokens = Vec::new();
        let mut current = String::new();
        for c in filtered.chars() {
            if c.is_whitespace() {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            } else if punctuation.contains(&c) {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(c.to_string());
            } else {
                current.push(c);
            }
        }
        if !current.is_empty() {
            tokens.push(current);
        }
        tokens
    }

    fn nomatch_message(&self) -> String {
        NOMATCH_MESSAGES[(self.limit as usize - 1) % NOMATCH_MESSAGES.len()].to_string()
    }

    /// Builds the keyword stack and the (substituted, possibly truncated by
    /// delimiter handling) working sentence for this turn.
    fn build_stack(&mut self, tokens: &[String]) -> (Vec<String>, Vec<String>) {
        let mut sentence: Vec<String> = Vec::new();
        let mut keystack: Vec<String> = Vec::new();
        let mut top_precedence = i32::MIN;
        let mut i = 0;

        while i < tokens.len() {
            let tok = &tokens[i];

            if self.delimiters.iter().any(|d| d == tok) {
                if keystack.is_empty() {
                    self.tracer.subclause_discarded(&sentence);
                    sentence.clear();
                    i += 1;
                    continue;
                } else {
                    self.tracer.subclause_discarded(&tokens[i..]);
                    break;
                }
            }

            match self.script.keyword_rule(tok) {
                Some(rule) => {
                    if rule.has_transformation() && rule.precedence > top_precedence {
                        keystack.insert(0, tok.clone());
                        top_precedence = rule.precedence;
                    } else {
                        keystack.push(tok.clone());
                    }
                    match &rule.substitution {
                        Some(sub) if !sub.is_empty() => {
                            self.tracer.word_substituted(tok, sub);
                            sentence.push(sub.clone());
                        }
                        _ => sentence.push(tok.clone()),
                    }
                }
                None => {
                    self.tracer.unknown_keyword(tok);
                    sentence.push(tok.clone());
                }
            }
            i += 1;
        }

        self.tracer.keystack_finalised(&keystack);
        (keystack, sentence)
    }

    /// Picks one of the memory rule's four transformations by hashing the
    /// last word of `sentence`, and lays down a memory if it matches.
    fn maybe_create_memory(&mut self, sentence: &[String]) {
        let last_word = match sentence.last() {
            Some(w) => w.clone(),
            None => return,
        };
        let idx = hollerith::hash(hollerith::last_chunk_as_bcd(&last_word), 2) as usize;

        let Script { memory_rule, tags, .. } = &mut self.script;
        let transform = match memory_rule.transformations.get(idx) {
            Some(t) => t,
            None => return,
        };
        let constituents = match crate::matcher::decompose(&transform.decomposition, sentence, tags) {
            Some(c) => c,
            None => return,
        };
        let words = rules::expand(
            match &transform.reassembly_rules[0] {
                crate::script::Reassembly::Words(elements) => elements,
                _ => return,
            },
            &constituents,
        );
        let memory = words.join(" ");
        memory_rule.memories.push_back(memory.clone());
        self.tracer.memory_created(&memory);
        self.tracer.memory_queue_snapshot(
            &memory_rule.memories.iter().cloned().collect::<Vec<_>>(),
        );
    }

    fn apply_none(&mut self) -> String {
        self.tracer.none_used();
        let Script { keywords, tags, .. } = &mut self.script;
        let none_rule = keywords.get_mut(crate::script::NONE_KEYWORD).expect("NONE rule present");
        match rules::apply(none_rule, &[], tags) {
            Action::Complete(words) => words.join(" "),
            _ => NOMATCH_MESSAGES[0].to_string(),
        }
    }

    /// Runs one conversational turn and returns ELIZA's response.
    pub fn respond(&mut self, input: &str) -> String {
        let filtered = hollerith::filter(input);
        let tokens = self.tokenize(&filtered);
        self.tracer.response_start(&tokens);

        self.limit = (self.limit % 4) + 1;
        self.tracer.limit_updated(self.limit);

        let (mut keystack, mut sentence) = self.build_stack(&tokens);

        if keystack.is_empty() {
            if self.limit == 4 {
                if let Some(memory) = self.script.memory_rule.memories.pop_front() {
                    self.tracer.memory_recalled(&memory);
                    return memory;
                }
            }
            return self.apply_none();
        }

        loop {
            let top = match keystack.first() {
                Some(k) => k.clone(),
                None => return self.apply_none(),
            };
            keystack.remove(0);

            if top == self.script.memory_rule.keyword {
                self.maybe_create_memory(&sentence);
            }

            let Script { keywords, tags, .. } = &mut self.script;
            let rule = match keywords.get_mut(&top) {
                Some(r) => r,
                None => {
                    self.tracer.unknown_keyword(&top);
                    continue;
                }
            };
            let action = rules::apply(rule, &sentence, tags);

            match action {
                Action::Complete(words) => {
                    self.tracer.transform_applied(&top, &words);
                    return words.join(" ");
                }
                Action::Inapplicable => {
                    self.tracer.decomposition_failed(&top);
                    if self.use_nomatch_msgs {
                        return self.nomatch_message();
                    }
                    return self.apply_none();
                }
                Action::NewKey => {
                    self.tracer.newkey_failed(&top);
                    if !keystack.is_empty() {
                        continue;
                    }
                    if self.on_newkey_fail_use_none && self.use_nomatch_msgs {
                        return self.nomatch_message();
                    }
                    return self.apply_none();
                }
                Action::LinkKey(link) => {
                    keystack.insert(0, link);
                    continue;
                }
                Action::Pre { words, link } => {
                    self.tracer.pre_transform(&top, &link);
                    sentence = words;
                    keystack.insert(0, link);
                    continue;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn doctor_fragment() -> &'static str {
        "(HOW DO YOU DO. PLEASE STATE YOUR PROBLEM)\n\
         (MEMORY MY\n\
            (0 YOUR 0 = LETS DISCUSS FURTHER WHY YOUR 3)\n\
            (0 YOUR 0 = EARLIER YOU SAID YOUR 3)\n\
            (0 YOUR 0 = BUT YOUR 3)\n\
            (0 YOUR 0 = DOES THAT HAVE ANYTHING TO DO WITH THE FACT THAT YOUR 3))\n\
         (ALIKE 10 DLIST(/ DIT)\n\
            ((0)\n\
                (IN WHAT WAY)\n\
                (WHAT RESEMBLANCE DO YOU SEE)))\n\
         (ALWAYS 5\n\
            ((0)\n\
                (CAN YOU THINK OF A SPECIFIC EXAMPLE)\n\
                (WHEN)))\n\
         (MY 5 DLIST(/ NOUN)\n\
            ((0 MY 0)\n\
                (YOUR 3)))\n\
         (NONE\n\
            ((0)\n\
                (I AM NOT SURE I UNDERSTAND YOU FULLY)\n\
                (PLEASE GO ON)))\n"
    }

    fn engine() -> Engine {
        Engine::new(parser::parse(doctor_fragment()).unwrap())
    }

    #[test]
    fn greeting_joins_opening_remarks() {
        let e = engine();
        assert_eq!(e.greeting(), "HOW DO YOU DO. PLEASE STATE YOUR PROBLEM");
    }

    #[test]
    fn limit_cycles_starting_at_two() {
        let mut e = engine();
        e.respond("hello");
        assert_eq!(e.limit, 2);
        e.respond("hello");
        assert_eq!(e.limit, 3);
        e.respond("hello");
        assert_eq!(e.limit, 4);
        e.respond("hello");
        assert_eq!(e.limit, 1);
    }

    #[test]
    fn men_are_all_alike_matches_in_what_way() {
        let mut e = engine();
        assert_eq!(e.respond("Men are all alike."), "IN WHAT WAY");
    }

    #[test]
    fn always_keyword_triggers_specific_example() {
        let mut e = engine();
        assert_eq!(e.respond("They are always bugging me."), "CAN YOU THINK OF A SPECIFIC EXAMPLE");
    }

    #[test]
    fn unknown_sentence_falls_back_to_none() {
        let mut e = engine();
        let response = e.respond("Xyzzy plugh.");
        assert!(
            response == "I AM NOT SURE I UNDERSTAND YOU FULLY" || response == "PLEASE GO ON",
            "unexpected response: {}",
            response
        );
    }

    #[test]
    fn my_keyword_reflects_possessive() {
        let mut e = engine();
        assert_eq!(e.respond("My father."), "YOUR FATHER");
    }
}
