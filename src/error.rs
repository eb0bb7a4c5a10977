//! Pattern-compilation error taxonomy.
//!
//! The original program treats every one of these as fatal: log and
//! terminate the process. That propagation policy doesn't belong in a
//! library, so `compile` returns a `Result` instead — matching the
//! "Design Notes" recommendation to replace the process-termination
//! macros with a `Result<T, RegexError>` chain. `step`/`is_match` still
//! never fail, same as the source.

/// Everything that can go wrong compiling a pattern.
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum RegexError {
    #[error("empty pattern")]
    EmptyPattern,

    #[error("dangling '\\' with nothing to escape at byte {at}")]
    DanglingEscape { at: usize },

    #[error("'|' next to an empty alternative at byte {at}")]
    EmptyAlternative { at: usize },

    #[error("unclosed '[' starting at byte {at}")]
    UnclosedClass { at: usize },

    #[error("empty character class starting at byte {at}")]
    EmptyClass { at: usize },

    #[error("invalid class range at byte {at}: {lo} is not strictly less than {hi}")]
    InvalidClassRange { at: usize, lo: u8, hi: u8 },
}
