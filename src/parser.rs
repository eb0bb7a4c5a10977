//! Pattern compiler: turns a pattern string into an [`Nfa`] via Thompson
//! fragments, the way `idiomatic-translation/nfa.rs`'s `post2nfa` does, but
//! driven directly off the pattern (no postfix intermediate form, since
//! this grammar has no explicit grouping to resolve precedence for).

use crate::error::RegexError;
use crate::range::{Range, RangeSet};
use crate::state::{Nfa, Slot, State, StateId, Patch};

/// A partially built NFA fragment: an entry state and the dangling edges
/// that should be wired to whatever comes next.
struct Frag {
    start: StateId,
    out: Vec<Patch>,
}

/// One of the four repetition suffixes a token may carry.
enum Quant {
    Once,
    ZeroOrMore,
    OneOrMore,
    ZeroOrOne,
}

struct Compiler<'p> {
    pattern: &'p [u8],
    pos: usize,
    nfa: Nfa,
    match_id: StateId,
}

/// Compile `pattern` into an NFA. Fatal conditions from spec.md §7 are
/// reported as a [`RegexError`] instead of terminating the process. The
/// pattern is a byte string, not UTF-8 text: like the matcher itself, the
/// compiler operates on raw bytes (spec.md's Non-goals exclude multibyte
/// character classes).
pub fn compile(pattern: &[u8]) -> Result<Nfa, RegexError> {
    if pattern.is_empty() {
        return Err(RegexError::EmptyPattern);
    }
    let mut c = Compiler { pattern, pos: 0, nfa: Nfa::new(), match_id: 0 };
    c.match_id = c.nfa.push(State::Match);

    let mut head = c.compile_alternative()?;
    while c.peek_byte() == Some(b'|') {
        c.pos += 1;
        let next = c.compile_alternative()?;
        let branch = c.nfa.push(State::Branch { out: next, out1: head });
        head = branch;
    }
    debug_assert_eq!(c.pos, c.pattern.len(), "parser left unconsumed input");

    c.nfa.start = head;
    Ok(c.nfa)
}

impl<'p> Compiler<'p> {
    fn peek_byte(&self) -> Option<u8> {
        self.pattern.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.pattern.get(self.pos + offset).copied()
    }

    /// Compile one `|`-delimited alternative: an optional leading `^`,
    /// then a concatenation of quantified atoms, wired directly to the
    /// shared match state (spec.md §4.3.2).
    fn compile_alternative(&mut self) -> Result<StateId, RegexError> {
        let anchored = if self.peek_byte() == Some(b'^') {
            self.pos += 1;
            true
        } else {
            false
        };
        let start_pos = self.pos;
        let frag = self.compile_concat()?.ok_or(RegexError::EmptyAlternative { at: start_pos })?;

        let entry = if anchored { frag.start } else { self.wrap_anywhere_prefix(frag.start) };
        self.nfa.patch(&frag.out, self.match_id);
        Ok(entry)
    }

    /// Prepend the implicit "find anywhere" prefix (spec.md §4.3.3): a
    /// branch that either falls through into the compiled body or loops on
    /// any byte, trying the body again at the next position.
    fn wrap_anywhere_prefix(&mut self, body_start: StateId) -> StateId {
        let any = self.nfa.push(State::AnyChar { out: 0 });
        let branch = self.nfa.push(State::Branch { out: body_start, out1: any });
        self.nfa.patch(&[Patch(any, Slot::Out)], branch);
        branch
    }

    fn compile_concat(&mut self) -> Result<Option<Frag>, RegexError> {
        let mut result: Option<Frag> = None;
        loop {
            match self.peek_byte() {
                None | Some(b'|') => break,
                _ => {}
            }
            let atom = self.compile_atom()?;
            let quant = self.parse_quantifier();
            let frag = self.apply_quantifier(atom, quant);
            result = Some(match result {
                None => frag,
                Some(prev) => {
                    self.nfa.patch(&prev.out, frag.start);
                    Frag { start: prev.start, out: frag.out }
                }
            });
        }
        Ok(result)
    }

    fn parse_quantifier(&mut self) -> Quant {
        match self.peek_byte() {
            Some(b'*') => {
                self.pos += 1;
                Quant::ZeroOrMore
            }
            Some(b'+') => {
                self.pos += 1;
                Quant::OneOrMore
            }
            Some(b'?') => {
                self.pos += 1;
                Quant::ZeroOrOne
            }
            _ => Quant::Once,
        }
    }

    /// Apply a quantifier to an arbitrary sub-fragment, generalizing
    /// spec.md §4.3.1's single-state emission rules to also cover
    /// character-class sub-graphs (spec.md §4.3.4).
    fn apply_quantifier(&mut self, frag: Frag, quant: Quant) -> Frag {
        match quant {
            Quant::Once => frag,
            Quant::ZeroOrMore => {
                let branch = self.nfa.push(State::Branch { out: 0, out1: frag.start });
                self.nfa.patch(&frag.out, branch);
                Frag { start: branch, out: vec![Patch(branch, Slot::Out)] }
            }
            Quant::OneOrMore => {
                let branch = self.nfa.push(State::Branch { out: 0, out1: frag.start });
                self.nfa.patch(&frag.out, branch);
                Frag { start: frag.start, out: vec![Patch(branch, Slot::Out)] }
            }
            Quant::ZeroOrOne => {
                let branch = self.nfa.push(State::Branch { out: 0, out1: frag.start });
                let mut out = frag.out;
                out.push(Patch(branch, Slot::Out));
                Frag { start: branch, out }
            }
        }
    }

    fn compile_atom(&mut self) -> Result<Frag, RegexError> {
        match self.peek_byte() {
            Some(b'[') => self.compile_class(),
            Some(b'.') => {
                self.pos += 1;
                let id = self.nfa.push(State::AnyChar { out: 0 });
                Ok(Frag { start: id, out: vec![Patch(id, Slot::Out)] })
            }
            Some(b'\\') => {
                let escape_pos = self.pos;
                self.pos += 1;
                let byte =
                    self.peek_byte().ok_or(RegexError::DanglingEscape { at: escape_pos })?;
                self.pos += 1;
                let id = self.nfa.push(State::Literal { byte, out: 0 });
                Ok(Frag { start: id, out: vec![Patch(id, Slot::Out)] })
            }
            Some(b'$') if self.is_end_anchor() => {
                self.pos += 1;
                let id = self.nfa.push(State::LineEnd { out: 0 });
                Ok(Frag { start: id, out: vec![Patch(id, Slot::Out)] })
            }
            Some(byte) => {
                self.pos += 1;
                let id = self.nfa.push(State::Literal { byte, out: 0 });
                Ok(Frag { start: id, out: vec![Patch(id, Slot::Out)] })
            }
            None => unreachable!("compile_atom called with no input left"),
        }
    }

    /// `$` is the end-of-line anchor only when it's the last byte of its
    /// alternative (spec.md §4.3); anywhere else it's a literal dollar
    /// sign, handled by `compile_atom`'s fallback arm.
    fn is_end_anchor(&self) -> bool {
        matches!(self.peek_at(1), None | Some(b'|'))
    }

    /// `[`...`]` character class, optionally negated with a leading `^`.
    /// `]` as the very first entry is a literal (spec.md §4.3.4).
    fn compile_class(&mut self) -> Result<Frag, RegexError> {
        let open_pos = self.pos;
        self.pos += 1;
        let negate = if self.peek_byte() == Some(b'^') {
            self.pos += 1;
            true
        } else {
            false
        };
        let mut set = if negate { RangeSet::universe() } else { RangeSet::new() };

        let mut first = true;
        loop {
            match self.peek_byte() {
                None => return Err(RegexError::UnclosedClass { at: open_pos }),
                Some(b']') if !first => {
                    self.pos += 1;
                    break;
                }
                _ => {
                    let lo = self.read_class_byte(open_pos)?;
                    let entry = if self.peek_byte() == Some(b'-')
                        && matches!(self.peek_at(1), Some(b) if b != b']')
                    {
                        let dash_pos = self.pos;
                        self.pos += 1;
                        let hi = self.read_class_byte(open_pos)?;
                        if lo >= hi {
                            return Err(RegexError::InvalidClassRange { at: dash_pos, lo, hi });
                        }
                        Range::new(lo, hi)
                    } else {
                        Range::new(lo, lo)
                    };
                    if negate {
                        set.remove(entry);
                    } else {
                        set.add(entry);
                    }
                }
            }
            first = false;
        }

        if set.ranges().is_empty() {
            return Err(RegexError::EmptyClass { at: open_pos });
        }

        Ok(self.build_class_fragment(&set))
    }

    fn read_class_byte(&mut self, open_pos: usize) -> Result<u8, RegexError> {
        match self.peek_byte() {
            None => Err(RegexError::UnclosedClass { at: open_pos }),
            Some(b'\\') => {
                let escape_pos = self.pos;
                self.pos += 1;
                let byte =
                    self.peek_byte().ok_or(RegexError::DanglingEscape { at: escape_pos })?;
                self.pos += 1;
                Ok(byte)
            }
            Some(byte) => {
                self.pos += 1;
                Ok(byte)
            }
        }
    }

    /// Build the branch-chain-of-ranges fragment described in spec.md
    /// §4.3.4: `START` epsilon entry, one `BRANCH`/`RANGE` pair per final
    /// range, capped with a `DEAD` sink, `MERGE` epsilon exit.
    fn build_class_fragment(&mut self, set: &RangeSet) -> Frag {
        let start = self.nfa.push(State::Epsilon { out: 0 });
        let merge = self.nfa.push(State::Epsilon { out: 0 });

        let mut prev = Patch(start, Slot::Out);
        for range in set.ranges() {
            let range_state =
                self.nfa.push(State::Range { lo: range.lo, hi: range.hi, out: merge });
            let branch = self.nfa.push(State::Branch { out: 0, out1: range_state });
            self.nfa.patch(&[prev], branch);
            prev = Patch(branch, Slot::Out);
        }
        let dead = self.nfa.push(State::Dead);
        self.nfa.patch(&[prev], dead);

        Frag { start, out: vec![Patch(merge, Slot::Out)] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::Regex;

    fn matches(pattern: &str, text: &str) -> bool {
        Regex::compile(pattern.as_bytes()).unwrap().is_match(text.as_bytes())
    }

    #[test]
    fn end_to_end_scenarios_from_spec() {
        assert!(matches("saw", "somebody saw nobody"));
        assert!(matches("a*b", "aaab"));
        assert!(!matches("a+b", "b"));
        assert!(matches("a?b", "b"));
        assert!(matches("[abc]+", "xxcab"));
        assert!(!matches("[^0-9]+$", "abc123"));
        assert!(matches("hello|world", "say hello"));
        assert!(matches(".at", "concatenate"));
        assert!(!matches("[a-z]", "123"));
        assert!(matches("a$", "banana"));
    }

    #[test]
    fn empty_pattern_is_an_error() {
        assert_eq!(compile(b""), Err(RegexError::EmptyPattern));
    }

    #[test]
    fn dangling_escape_is_an_error() {
        assert!(matches!(compile(b"abc\\"), Err(RegexError::DanglingEscape { .. })));
    }

    #[test]
    fn alternation_with_empty_side_is_an_error() {
        assert!(matches!(compile(b"a||b"), Err(RegexError::EmptyAlternative { .. })));
        assert!(matches!(compile(b"|a"), Err(RegexError::EmptyAlternative { .. })));
        assert!(matches!(compile(b"a|"), Err(RegexError::EmptyAlternative { .. })));
    }

    #[test]
    fn unclosed_class_is_an_error() {
        assert!(matches!(compile(b"[abc"), Err(RegexError::UnclosedClass { .. })));
    }

    #[test]
    fn reversed_class_range_is_an_error() {
        assert!(matches!(compile(b"[z-a]"), Err(RegexError::InvalidClassRange { .. })));
        assert!(matches!(compile(b"[a-a]"), Err(RegexError::InvalidClassRange { .. })));
    }

    #[test]
    fn fully_negated_class_is_empty() {
        // Declaring every byte value as excluded leaves the complement empty.
        let mut pattern = b"[^".to_vec();
        for b in 0u16..=255 {
            let b = b as u8;
            if b == b']' || b == b'\\' || b == b'-' || b == b'^' {
                pattern.push(b'\\');
            }
            pattern.push(b);
        }
        pattern.push(b']');
        assert!(matches!(compile(&pattern), Err(RegexError::EmptyClass { .. })));
    }

    #[test]
    fn leading_bracket_in_class_is_literal() {
        assert!(matches("[]a]+", "]]a"));
    }

    #[test]
    fn trailing_dash_in_class_is_literal() {
        assert!(matches("[a-]", "-"));
        assert!(matches("[a-]", "a"));
    }

    #[test]
    fn caret_suppresses_anywhere_prefix() {
        assert!(matches("^abc", "abc"));
        assert!(!matches("^abc", "xabc"));
    }

    #[test]
    fn literal_parens_are_not_groups() {
        assert!(matches("(abc)", "(abc)"));
    }
}
