//! The segmented SLIP-style decomposition matcher.
//!
//! A decomposition pattern is split into maximal segments: a lone free
//! wildcard (`0`), or a run of anchored elements whose combined word count
//! is known statically (literals, synonym/tag groups and fixed wildcards
//! each consume a fixed number of words). Matching walks the segments left
//! to right; a free wildcard tries the *smallest* word count that still
//! lets the rest of the pattern match, except when it is the final
//! segment, where it simply swallows whatever words remain.

use std::collections::HashMap;

use crate::script::PatternElement;

type TagIndex = HashMap<String, Vec<String>>;

enum Segment {
    Free(usize),
    Anchored { start: usize, len: usize },
}

fn segment(pattern: &[PatternElement]) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut i = 0;
    while i < pattern.len() {
        if matches!(pattern[i], PatternElement::FreeWildcard) {
            segments.push(Segment::Free(i));
            i += 1;
        } else {
            let start = i;
            while i < pattern.len() && !matches!(pattern[i], PatternElement::FreeWildcard) {
                i += 1;
            }
            segments.push(Segment::Anchored { start, len: i - start });
        }
    }
    segments
}

fn anchored_word_count(pattern: &[PatternElement], start: usize, len: usize) -> usize {
    pattern[start..start + len]
        .iter()
        .map(|e| match e {
            PatternElement::FixedWildcard(n) => *n,
            _ => 1,
        })
        .sum()
}

fn match_anchored(
    pattern: &[PatternElement],
    start: usize,
    len: usize,
    words: &[String],
    word_i: usize,
    tags: &TagIndex,
    out: &mut [String],
) -> Option<usize> {
    let mut wi = word_i;
    for offset in 0..len {
        let elem = &pattern[start + offset];
        match elem {
            PatternElement::Literal(w) => {
                if words.get(wi)? != w {
                    return None;
                }
                out[start + offset] = words[wi].clone();
                wi += 1;
            }
            PatternElement::Synonym(options) => {
                let word = words.get(wi)?;
                if !options.iter().any(|o| o == word) {
                    return None;
                }
                out[start + offset] = word.clone();
                wi += 1;
            }
            PatternElement::Tag(tagnames) => {
                let word = words.get(wi)?;
                let matched = tagnames
                    .iter()
                    .any(|t| tags.get(t).map_or(false, |keywords| keywords.iter().any(|k| k == word)));
                if !matched {
                    return None;
                }
                out[start + offset] = word.clone();
                wi += 1;
            }
            PatternElement::FixedWildcard(n) => {
                if wi + n > words.len() {
                    return None;
                }
                out[start + offset] = words[wi..wi + n].join(" ");
                wi += n;
            }
            PatternElement::FreeWildcard => unreachable!("anchored runs never contain a free wildcard"),
        }
    }
    Some(wi)
}

fn match_segments(
    pattern: &[PatternElement],
    segments: &[Segment],
    seg_i: usize,
    words: &[String],
    word_i: usize,
    tags: &TagIndex,
    out: &mut [String],
) -> bool {
    if seg_i == segments.len() {
        return word_i == words.len();
    }

    match &segments[seg_i] {
        Segment::Free(pat_idx) => {
            let is_last = seg_i == segments.len() - 1;
            if is_last {
                out[*pat_idx] = words[word_i..].join(" ");
                return true;
            }
            for take in 0..=(words.len() - word_i) {
                out[*pat_idx] = words[word_i..word_i + take].join(" ");
                if match_segments(pattern, segments, seg_i + 1, words, word_i + take, tags, out) {
                    return true;
                }
            }
            false
        }
        Segment::Anchored { start, len } => {
            let word_count = anchored_word_count(pattern, *start, *len);
            if word_i + word_count > words.len() {
                return false;
            }
            match match_anchored(pattern, *start, *len, words, word_i, tags, out) {
                Some(next_word_i) => match_segments(pattern, segments, seg_i + 1, words, next_word_i, tags, out),
                None => false,
            }
        }
    }
}

/// Matches `pattern` against `words`, returning one constituent per pattern
/// element on success. `tags` is the script's tag index (tag name -> ordered
/// list of keywords declaring that tag), used by `(/...)` groups.
pub fn decompose(pattern: &[PatternElement], words: &[String], tags: &TagIndex) -> Option<Vec<String>> {
    let segments = segment(pattern);
    let mut out = vec![String::new(); pattern.len()];
    if match_segments(pattern, &segments, 0, words, 0, tags, &mut out) {
        Some(out)
    } else {
        None
    }
}
