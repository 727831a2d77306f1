//! The error type shared by the lexer and parser (§4.4, §4.5).
//!
//! A lex/parse failure never unwinds the compile step outright: per
//! §4.5's "first error wins" rule, the parser records the first
//! [`SyntaxError`] it hits and keeps scanning tokens just long enough to
//! finish producing *an* [`crate::op::OpList`] — the degenerate one that
//! throws this error as soon as it runs (`vm::run_program`'s entry
//! point). Holding the error as data here, rather than short-circuiting
//! with `?` out of the whole parse, is what makes that possible.

use beef::lean::Cow;
use ecc_span::Span;

pub type Result<T, E = SyntaxError> = std::result::Result<T, E>;

#[derive(Clone, Debug)]
pub struct SyntaxError {
  pub message: Cow<'static, str>,
  pub span: Span,
}

impl SyntaxError {
  pub fn new(message: impl Into<Cow<'static, str>>, span: impl Into<Span>) -> Self {
    SyntaxError {
      message: message.into(),
      span: span.into(),
    }
  }
}

impl std::error::Error for SyntaxError {}

impl std::fmt::Display for SyntaxError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.message)
  }
}
