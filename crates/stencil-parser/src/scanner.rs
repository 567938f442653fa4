//! Low-level cursor over a template string.
//!
//! The scanner advances by literal substring matching rather than regex:
//! tag delimiters are plain strings, so `find`/`starts_with` give the same
//! boundary semantics (shortest match for an open tag, greedy consume up to
//! the next delimiter for a tag body) without per-token allocation.

/// A cursor over a raw template string.
///
/// The scanner never fails; callers detect unterminated constructs by
/// observing that [`scan_until`](Scanner::scan_until) exhausted the input.
#[derive(Debug)]
pub struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    /// True when no input remains.
    pub fn eos(&self) -> bool {
        self.pos >= self.src.len()
    }

    /// Current byte offset into the source.
    pub fn pos(&self) -> usize {
        self.pos
    }

    fn tail(&self) -> &'a str {
        &self.src[self.pos..]
    }

    /// Consumes `literal` if the remaining input starts with it.
    ///
    /// Returns true and advances past the match, or returns false without
    /// moving.
    pub fn scan(&mut self, literal: &str) -> bool {
        if self.tail().starts_with(literal) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }

    /// Consumes and returns everything before the first occurrence of
    /// `literal`.
    ///
    /// If `literal` does not occur, consumes to the end of input. The
    /// returned slice never includes `literal` itself.
    pub fn scan_until(&mut self, literal: &str) -> &'a str {
        match self.tail().find(literal) {
            Some(i) => {
                let consumed = &self.src[self.pos..self.pos + i];
                self.pos += i;
                consumed
            }
            None => {
                let consumed = self.tail();
                self.pos = self.src.len();
                consumed
            }
        }
    }

    /// Returns the next character without consuming it.
    pub fn peek(&self) -> Option<char> {
        self.tail().chars().next()
    }

    /// Consumes and returns the next character.
    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }
}
