//! Recursive-descent parser turning a token stream into a [`Script`].
//!
//! Grammar (see module docs on [`crate::script`] for the data it builds):
//!
//! ```text
//! script      := '(' word* ')' ('START')? rule*
//! rule        := '(' ( memory_rule | keyword_rule | empty ) ')'
//! memory_rule := 'MEMORY' SYMBOL transform{4}
//! transform   := '(' word+ '=' word+ ')'
//! keyword_rule:= SYMBOL ( '=' SYMBOL )? ( NUMBER )? ( 'DLIST' taglist )?
//!                      ( kw_transform | reference )*
//! kw_transform:= '(' pattern reassembly+ ')'
//! reassembly  := '(' ( pre_form | '=' SYMBOL | plain_words ) ')'
//! pre_form    := 'PRE' '(' word+ ')' '(' '=' SYMBOL ')'
//! reference   := '(' '=' SYMBOL ')'
//! taglist     := '(' '/' SYMBOL+ ')'
//! pattern     := '(' pat_elem+ ')'
//! pat_elem    := word | NUMBER | '(' '*' word+ ')' | '(' '/' word+ ')'
//! ```

use std::collections::{HashMap, VecDeque};

use crate::error::{ScriptError, ScriptErrorKind};
use crate::script::{
    KeywordRule, MemoryRule, PatternElement, Reassembly, ReassemblyElement, Script, Transform,
    NONE_KEYWORD,
};
use crate::token::{Token, Tokenizer};

pub fn parse(source: &str) -> Result<Script, ScriptError> {
    Parser::new(source).parse_script()
}

struct Parser {
    tok: Tokenizer,
    keywords: HashMap<String, KeywordRule>,
    keyword_order: Vec<String>,
    memory_rule: Option<MemoryRule>,
}

impl Parser {
    fn new(source: &str) -> Parser {
        Parser {
            tok: Tokenizer::new(source),
            keywords: HashMap::new(),
            keyword_order: Vec::new(),
            memory_rule: None,
        }
    }

    fn err(&mut self, kind: ScriptErrorKind) -> ScriptError {
        ScriptError::new(self.tok.line(), kind)
    }

    fn expect_open(&mut self) -> Result<(), ScriptError> {
        if self.tok.next().is_open() {
            Ok(())
        } else {
            Err(self.err(ScriptErrorKind::ExpectedOpenParen))
        }
    }

    fn expect_close(&mut self) -> Result<(), ScriptError> {
        if self.tok.next().is_close() {
            Ok(())
        } else {
            Err(self.err(ScriptErrorKind::ExpectedCloseParen))
        }
    }

    fn expect_symbol(&mut self) -> Result<String, ScriptError> {
        match self.tok.next() {
            Token::Symbol(s) => Ok(s),
            _ => Err(self.err(ScriptErrorKind::ExpectedSymbol)),
        }
    }

    /// Reads a parenthesised word list whose own leading `(` has already
    /// been consumed, collapsing one level of nested `(...)` groups into a
    /// single string element (`"(* FATHER MOTHER)"`).
    fn read_raw_list_after_open(&mut self) -> Result<Vec<String>, ScriptError> {
        let mut out = Vec::new();
        loop {
            match self.tok.next() {
                Token::Close => break,
                Token::Symbol(s) => out.push(s),
                Token::Number(s) => out.push(s),
                Token::Equals => out.push("=".to_string()),
                Token::Open => {
                    let mut inner = Vec::new();
                    loop {
                        match self.tok.next() {
                            Token::Close => break,
                            Token::Symbol(s) => inner.push(s),
                            Token::Number(s) => inner.push(s),
                            Token::Equals => inner.push("=".to_string()),
                            Token::Open => return Err(self.err(ScriptErrorKind::MalformedRule)),
                            Token::Eof => return Err(self.err(ScriptErrorKind::ExpectedCloseParen)),
                        }
                    }
                    out.push(format!("({})", inner.join(" ")));
                }
                Token::Eof => return Err(self.err(ScriptErrorKind::ExpectedCloseParen)),
            }
        }
        Ok(out)
    }

    /// Reads a parenthesised word list, consuming its own leading `(`.
    fn read_list(&mut self) -> Result<Vec<String>, ScriptError> {
        self.expect_open()?;
        self.read_raw_list_after_open()
    }

    fn parse_script(mut self) -> Result<Script, ScriptError> {
        let opening_remarks = self.read_list()?;

        if self.tok.peek().is_symbol_eq("START") {
            self.tok.next();
        }

        while self.read_rule()? {}

        if !self.keywords.contains_key(NONE_KEYWORD) {
            return Err(ScriptError::new(self.tok.line(), ScriptErrorKind::NoNoneRule));
        }
        let memory_rule = match self.memory_rule {
            Some(m) => m,
            None => return Err(ScriptError::new(self.tok.line(), ScriptErrorKind::NoMemoryRule)),
        };
        if !self.keywords.contains_key(&memory_rule.keyword) {
            return Err(ScriptError::new(
                self.tok.line(),
                ScriptErrorKind::UnknownMemoryKeyword(memory_rule.keyword.clone()),
            ));
        }

        let tags = Script::build_tags(&self.keywords);
        Ok(Script {
            opening_remarks,
            keywords: self.keywords,
            keyword_order: self.keyword_order,
            memory_rule,
            tags,
        })
    }

    /// Reads one top-level rule. Returns `false` at end of file.
    fn read_rule(&mut self) -> Result<bool, ScriptError> {
        match self.tok.next() {
            Token::Open => {}
            Token::Eof => return Ok(false),
            _ => return Err(self.err(ScriptErrorKind::ExpectedOpenParen)),
        }

        let peeked = self.tok.peek();
        if peeked.is_close() {
            self.tok.next(); // an empty rule list: ignore
            return Ok(true);
        }
        if !peeked.is_symbol() {
            return Err(self.err(ScriptErrorKind::ExpectedKeyword));
        }

        if peeked.is_symbol_eq("MEMORY") {
            self.read_memory_rule()?;
        } else {
            self.read_keyword_rule()?;
        }
        Ok(true)
    }

    fn read_memory_rule(&mut self) -> Result<(), ScriptError> {
        self.tok.next(); // consume "MEMORY"
        let keyword = self.expect_symbol().map_err(|_| {
            ScriptError::new(self.tok.line(), ScriptErrorKind::ExpectedMemoryKeyword)
        })?;
        if self.memory_rule.is_some() {
            return Err(self.err(ScriptErrorKind::MultipleMemoryRules));
        }

        let mut transformations = Vec::with_capacity(MemoryRule::TRANSFORM_COUNT);
        for _ in 0..MemoryRule::TRANSFORM_COUNT {
            self.expect_open()?;

            let mut decomp_words = Vec::new();
            loop {
                match self.tok.next() {
                    Token::Equals => break,
                    Token::Symbol(s) | Token::Number(s) => decomp_words.push(s),
                    Token::Eof | Token::Close => {
                        return Err(self.err(ScriptErrorKind::EmptyMemoryTransform))
                    }
                    Token::Open => return Err(self.err(ScriptErrorKind::MalformedRule)),
                }
            }
            if decomp_words.is_empty() {
                return Err(self.err(ScriptErrorKind::EmptyMemoryTransform));
            }

            let mut reassembly_words = Vec::new();
            loop {
                match self.tok.next() {
                    Token::Close => break,
                    Token::Symbol(s) => reassembly_words.push(ReassemblyElement::Literal(s)),
                    Token::Number(s) => {
                        reassembly_words.push(ReassemblyElement::Constituent(s.parse().unwrap()))
                    }
                    Token::Eof => return Err(self.err(ScriptErrorKind::EmptyMemoryTransform)),
                    Token::Open | Token::Equals => {
                        return Err(self.err(ScriptErrorKind::MalformedRule))
                    }
                }
            }
            if reassembly_words.is_empty() {
                return Err(self.err(ScriptErrorKind::EmptyMemoryTransform));
            }

            let decomposition = parse_flat_pattern(decomp_words);
            transformations
                .push(Transform::new(decomposition, vec![Reassembly::Words(reassembly_words)]));
        }

        self.expect_close()?;
        self.memory_rule = Some(MemoryRule { keyword, transformations, memories: VecDeque::new() });
        Ok(())
    }

    fn read_keyword_rule(&mut self) -> Result<(), ScriptError> {
        let raw_keyword = self.expect_symbol()?;
        let keyword = if raw_keyword == "NONE" { NONE_KEYWORD.to_string() } else { raw_keyword };

        if self.keywords.contains_key(&keyword) {
            return Err(self.err(ScriptErrorKind::DuplicateKeyword(keyword)));
        }
        if self.tok.peek().is_close() {
            return Err(self.err(ScriptErrorKind::EmptyKeywordBody(keyword)));
        }

        let mut substitution = None;
        let mut precedence = 0i32;
        let mut tags = Vec::new();
        let mut transformations = Vec::new();
        let mut link_keyword = None;

        loop {
            let t = self.tok.next();
            if t.is_close() {
                break;
            }
            match t {
                Token::Equals => {
                    substitution = Some(self.expect_symbol()?);
                }
                Token::Number(n) => {
                    precedence = n.parse().unwrap_or(0);
                }
                Token::Symbol(ref s) if s == "DLIST" => {
                    tags = clean_taglist(self.read_list()?);
                }
                Token::Open => {
                    if self.tok.peek() == Token::Equals {
                        self.tok.next();
                        link_keyword = Some(self.expect_symbol()?);
                        self.expect_close()?;
                    } else {
                        let raw_pattern = self.read_list()?;
                        if raw_pattern.is_empty() {
                            return Err(self.err(ScriptErrorKind::EmptyDecomposition));
                        }
                        let decomposition = self.parse_pattern(raw_pattern)?;

                        let mut reassembly_rules = vec![self.read_reassembly()?];
                        while self.tok.peek().is_open() {
                            reassembly_rules.push(self.read_reassembly()?);
                        }
                        self.expect_close()?;
                        transformations.push(Transform::new(decomposition, reassembly_rules));
                    }
                }
                _ => return Err(self.err(ScriptErrorKind::MalformedRule)),
            }
        }

        self.keyword_order.push(keyword.clone());
        self.keywords.insert(
            keyword.clone(),
            KeywordRule { keyword, substitution, precedence, tags, transformations, link_keyword },
        );
        Ok(())
    }

    fn read_reassembly(&mut self) -> Result<Reassembly, ScriptError> {
        self.expect_open()?;

        if self.tok.peek().is_symbol_eq("PRE") {
            self.tok.next();
            let raw_template = self.read_list()?;
            let raw_reference = self.read_list()?;
            if raw_reference.len() != 2 || raw_reference[0] != "=" {
                return Err(self.err(ScriptErrorKind::MalformedPreForm));
            }
            self.expect_close()?;
            let template = parse_reassembly_words(raw_template);
            return Ok(Reassembly::Pre { template, link: raw_reference[1].clone() });
        }

        if self.tok.peek() == Token::Equals {
            self.tok.next();
            let class_name = self.expect_symbol()?;
            self.expect_close()?;
            return Ok(Reassembly::Reference(class_name));
        }

        let raw = self.read_raw_list_after_open()?;
        Ok(Reassembly::Words(parse_reassembly_words(raw)))
    }

    fn parse_pattern(&mut self, raw: Vec<String>) -> Result<Vec<PatternElement>, ScriptError> {
        let mut out = Vec::with_capacity(raw.len());
        for word in raw {
            if let Some(inner) = word.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
                let parts: Vec<&str> = inner.split_whitespace().collect();
                let (head, rest) = parts.split_first().ok_or_else(|| {
                    ScriptError::new(self.tok.line(), ScriptErrorKind::MalformedRule)
                })?;
                if let Some(first) = head.strip_prefix('*') {
                    let mut words: Vec<String> = Vec::with_capacity(rest.len() + 1);
                    if !first.is_empty() {
                        words.push(first.to_string());
                    }
                    words.extend(rest.iter().map(|s| s.to_string()));
                    out.push(PatternElement::Synonym(words));
                } else if let Some(first) = head.strip_prefix('/') {
                    let mut words: Vec<String> = Vec::with_capacity(rest.len() + 1);
                    if !first.is_empty() {
                        words.push(first.to_string());
                    }
                    words.extend(rest.iter().map(|s| s.to_string()));
                    out.push(PatternElement::Tag(words));
                } else {
                    return Err(self.err(ScriptErrorKind::MalformedRule));
                }
            } else if let Ok(n) = word.parse::<usize>() {
                out.push(if n == 0 { PatternElement::FreeWildcard } else { PatternElement::FixedWildcard(n) });
            } else {
                out.push(PatternElement::Literal(word));
            }
        }
        Ok(out)
    }
}

fn parse_flat_pattern(words: Vec<String>) -> Vec<PatternElement> {
    words
        .into_iter()
        .map(|w| match w.parse::<usize>() {
            Ok(0) => PatternElement::FreeWildcard,
            Ok(n) => PatternElement::FixedWildcard(n),
            Err(_) => PatternElement::Literal(w),
        })
        .collect()
}

fn parse_reassembly_words(words: Vec<String>) -> Vec<ReassemblyElement> {
    words
        .into_iter()
        .map(|w| match w.parse::<usize>() {
            Ok(n) => ReassemblyElement::Constituent(n),
            Err(_) => ReassemblyElement::Literal(w),
        })
        .collect()
}

fn clean_taglist(raw: Vec<String>) -> Vec<String> {
    let mut out = raw;
    if let Some(first) = out.first().cloned() {
        if first == "/" {
            out.remove(0);
        } else if let Some(stripped) = first.strip_prefix('/') {
            out[0] = stripped.to_string();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_script_reports_missing_open() {
        let err = parse("").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(matches!(err.kind, ScriptErrorKind::ExpectedOpenParen));
    }

    #[test]
    fn empty_rule_list_reports_missing_none() {
        let err = parse("()").unwrap_err();
        assert!(matches!(err.kind, ScriptErrorKind::NoNoneRule));
    }

    #[test]
    fn unterminated_rule_reports_line() {
        let err = parse("()\n(NONE\n((").unwrap_err();
        assert_eq!(err.line, 3);
        assert!(matches!(err.kind, ScriptErrorKind::ExpectedCloseParen));
    }

    fn minimal_script() -> &'static str {
        "(HOW DO YOU DO. PLEASE STATE YOUR PROBLEM)\n\
         (MEMORY FAMILY\n\
            (0 YOUR 0 FAMILY 0 = TELL ME MORE ABOUT YOUR FAMILY)\n\
            (0 YOUR 0 FAMILY 0 = WHO ELSE IN YOUR FAMILY 5)\n\
            (0 YOUR 0 FAMILY 0 = EARLIER YOU SAID YOUR 3)\n\
            (0 YOUR 0 FAMILY 0 = DOES THAT HAVE ANYTHING TO DO WITH YOUR FAMILY))\n\
         (FAMILY DLIST(/NOUN)\n\
            ((0 YOUR 0 FAMILY 0)\n\
                (TELL ME MORE ABOUT YOUR FAMILY)))\n\
         (NONE\n\
            ((0)\n\
                (I AM NOT SURE I UNDERSTAND YOU FULLY)\n\
                (PLEASE GO ON)))\n"
    }

    #[test]
    fn parses_minimal_script() {
        let script = parse(minimal_script()).unwrap();
        assert_eq!(script.opening_remarks, vec!["HOW", "DO", "YOU", "DO.", "PLEASE", "STATE", "YOUR", "PROBLEM"]);
        assert!(script.keywords.contains_key(NONE_KEYWORD));
        assert_eq!(script.memory_rule.keyword, "FAMILY");
        assert_eq!(script.memory_rule.transformations.len(), 4);
        assert_eq!(script.tags.get("NOUN").cloned(), Some(vec!["FAMILY".to_string()]));
    }

    #[test]
    fn parses_pre_and_reference_forms() {
        let src = "()\n\
            (MEMORY X (0 = 1) (0 = 1) (0 = 1) (0 = 1))\n\
            (X ((0 FOO 0)\n\
                (PRE (I FEEL 1) (=Y))))\n\
            (Y ((0) (=X)))\n\
            (NONE ((0) (I SEE)))\n";
        let script = parse(src).unwrap();
        let x = script.keyword_rule("X").unwrap();
        match &x.transformations[0].reassembly_rules[0] {
            Reassembly::Pre { link, .. } => assert_eq!(link, "Y"),
            other => panic!("expected PRE, got {:?}", other),
        }
        let y = script.keyword_rule("Y").unwrap();
        match &y.transformations[0].reassembly_rules[0] {
            Reassembly::Reference(k) => assert_eq!(k, "X"),
            other => panic!("expected reference, got {:?}", other),
        }
    }
}
