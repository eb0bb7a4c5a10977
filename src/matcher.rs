//! The NFA simulator: advances a parallel state-set one byte at a time.
//!
//! Grounded directly on `idiomatic-translation/nfa.rs`'s `Matcher`/`List`:
//! the same "list generation" trick (`list_id`/`last_list_id`) stands in
//! for the scratch `id` field spec.md's `State` carries, relocated onto the
//! matcher because (per that file's own commentary) the NFA is immutable
//! once built.

use crate::error::RegexError;
use crate::parser;
use crate::state::{Nfa, State, StateId};

/// A compiled pattern. Immutable and cheap to share; create a [`Matcher`]
/// per search (or reuse one via [`Matcher::reset`]).
#[derive(Clone, Debug)]
pub struct Regex {
    nfa: Nfa,
}

impl Regex {
    /// Compile `pattern`. See [`crate::parser::compile`] for the error
    /// taxonomy.
    pub fn compile(pattern: &[u8]) -> Result<Regex, RegexError> {
        Ok(Regex { nfa: parser::compile(pattern)? })
    }

    /// A fresh [`Matcher`] over this program, ready to step through input.
    pub fn matcher(&self) -> Matcher<'_> {
        Matcher::new(&self.nfa)
    }

    /// Reset, step through every byte of `haystack`, and report whether the
    /// pattern was found anywhere in it (spec.md's `pattern_in_line`).
    pub fn is_match(&self, haystack: &[u8]) -> bool {
        self.matcher().pattern_in_line(haystack)
    }
}

/// Per-search scratch state: two state-id buffers sized to the compiled
/// program, plus the membership-token bookkeeping used to make epsilon
/// closure O(1) per state instead of needing a hash set.
pub struct Matcher<'r> {
    nfa: &'r Nfa,
    clist: Vec<StateId>,
    nlist: Vec<StateId>,
    list_id: u32,
    last_list_id: Vec<u32>,
}

impl<'r> Matcher<'r> {
    fn new(nfa: &'r Nfa) -> Matcher<'r> {
        let n = nfa.len();
        let mut m = Matcher {
            nfa,
            clist: Vec::with_capacity(n),
            nlist: Vec::with_capacity(n),
            list_id: 0,
            last_list_id: vec![0; n],
        };
        m.reset();
        m
    }

    /// Restore the initial closure over the start state. Two consecutive
    /// resets leave identical `clist`s (spec.md §8 invariant 7).
    pub fn reset(&mut self) {
        self.increment_list_id();
        self.nlist.clear();
        self.add_state(self.nfa.start);
        std::mem::swap(&mut self.clist, &mut self.nlist);
    }

    /// Advance by one byte. Returns whether the accepting state is in the
    /// resulting state-set.
    pub fn step(&mut self, byte: u8) -> bool {
        self.increment_list_id();
        self.nlist.clear();
        // Iterate by index rather than `self.clist.iter()`: the latter
        // would hold a borrow of `self.clist` live across the call to
        // `self.add_state`, which needs `&mut self` — the same borrowck
        // shape `idiomatic-translation/nfa.rs`'s `step` documents.
        for i in 0..self.clist.len() {
            let sid = self.clist[i];
            match *self.nfa.get(sid) {
                State::Literal { byte: c, out } if c == byte => self.add_state(out),
                State::AnyChar { out } => self.add_state(out),
                State::Range { lo, hi, out } if lo <= byte && byte <= hi => self.add_state(out),
                // Sticky: once reached, MATCH keeps propagating regardless
                // of further input (spec.md §8 invariant 8).
                State::Match => self.add_state(sid),
                // DEAD never consumes; LINE_END only resolves at
                // end-of-input (see `finish`); BRANCH/EPSILON can't appear
                // here, closure already eliminated them.
                _ => {}
            }
        }
        std::mem::swap(&mut self.clist, &mut self.nlist);
        self.is_matched()
    }

    /// The end-of-input pass: promotes any live `$` anchors (spec.md's
    /// `LINE_END`) past the anchor now that there is provably no more
    /// input to disagree with them, and keeps any sticky `MATCH` alive.
    /// Resolves Open Question 3 (spec.md §9): `$`'s simulator semantics
    /// are otherwise undefined in the source.
    fn finish(&mut self) -> bool {
        self.increment_list_id();
        self.nlist.clear();
        for i in 0..self.clist.len() {
            let sid = self.clist[i];
            match *self.nfa.get(sid) {
                State::Match => self.add_state(sid),
                State::LineEnd { out } => self.add_state(out),
                _ => {}
            }
        }
        std::mem::swap(&mut self.clist, &mut self.nlist);
        self.is_matched()
    }

    /// Reset, step through every byte of `line`, then resolve any pending
    /// `$` anchors against end-of-input.
    pub fn pattern_in_line(&mut self, line: &[u8]) -> bool {
        self.reset();
        for &byte in line {
            self.step(byte);
        }
        self.finish()
    }

    fn is_matched(&self) -> bool {
        self.clist.iter().any(|&sid| matches!(self.nfa.get(sid), State::Match))
    }

    /// Epsilon closure: follow `BRANCH`/`EPSILON` edges until a
    /// byte-consuming state (or `MATCH`/`DEAD`/`LINE_END`) is reached, then
    /// record it in `nlist` unless it's already present this generation.
    fn add_state(&mut self, sid: StateId) {
        match *self.nfa.get(sid) {
            State::Branch { out, out1 } => {
                self.add_state(out1);
                self.add_state(out);
                return;
            }
            State::Epsilon { out } => {
                self.add_state(out);
                return;
            }
            _ => {}
        }

        if self.list_id == self.last_list_id[sid as usize] {
            return;
        }
        self.last_list_id[sid as usize] = self.list_id;
        self.nlist.push(sid);
    }

    /// Advance to a new list generation, resetting membership for every
    /// state. Guards against overflow the same way
    /// `idiomatic-translation/nfa.rs` does: on overflow, zero every
    /// generation marker and start over instead of risking UB as the C
    /// original's plain `int` counter would.
    fn increment_list_id(&mut self) {
        self.list_id = match self.list_id.checked_add(1) {
            Some(id) => id,
            None => {
                for id in self.last_list_id.iter_mut() {
                    *id = 0;
                }
                1
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_is_idempotent() {
        let re = Regex::compile(b"abc").unwrap();
        let mut m = re.matcher();
        m.reset();
        let first = m.clist.clone();
        m.reset();
        assert_eq!(first, m.clist);
    }

    #[test]
    fn sticky_match_survives_further_bytes() {
        let re = Regex::compile(b"saw").unwrap();
        let mut m = re.matcher();
        let mut ever_matched = false;
        for &b in b"somebody saw nobody" {
            if m.step(b) {
                ever_matched = true;
            }
        }
        assert!(ever_matched);
        assert!(m.pattern_in_line(b"somebody saw nobody"));
    }

    #[test]
    fn anywhere_match_property() {
        let re = Regex::compile(b"cat").unwrap();
        for (text, expect) in [
            ("concatenate", true),
            ("the dog barked", false),
            ("cat", true),
            ("scatter", true),
        ] {
            assert_eq!(re.is_match(text.as_bytes()), expect, "text = {text:?}");
        }
    }

    #[test]
    fn end_anchor_requires_last_position() {
        let re = Regex::compile(b"a$").unwrap();
        assert!(re.is_match(b"banana"));
        assert!(!re.is_match(b"banana "));
        assert!(!re.is_match(b""));
    }

    #[test]
    fn zero_or_more_matches_empty_string() {
        let re = Regex::compile(b"a*").unwrap();
        assert!(re.is_match(b""));
    }

    #[test]
    fn exactly_one_match_state_in_compiled_nfa() {
        let re = Regex::compile(b"a|b|[c-d]+|e?").unwrap();
        let match_count =
            re.nfa.states.iter().filter(|s| matches!(s, State::Match)).count();
        assert_eq!(match_count, 1);
    }
}
