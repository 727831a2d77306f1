//! Thrown-value propagation (§4.7 "Exceptions").
//!
//! The original implementation unwinds a `throw` with `setjmp`/`longjmp`
//! across however many native C stack frames separate the `throw` site
//! from the nearest `try`. Per the redesign note, that becomes ordinary
//! `Result` propagation here: every VM entry point that can fail returns
//! `Result<Value, Throw>`, `exec()`'s `?` on recursive calls does the
//! unwinding, and a `try` statement is just a `match` on the `Result` of
//! executing its body.

use ecc_span::Span;

use crate::key::Key;
use crate::value::Value;

/// One entry of the call stack at the moment a value was thrown, in
/// caller-to-callee order — the same shape `Context::backtrace` builds
/// by walking parent frames, just captured eagerly instead of walked
/// after the fact once the frames themselves are gone.
#[derive(Clone, Copy, Debug)]
pub struct BacktraceFrame {
  pub function_name: Key,
  pub call_site: Span,
}

#[derive(Clone, Debug)]
pub struct Throw {
  pub value: Value,
  /// Where the `throw` (or the native/VM failure standing in for one)
  /// actually occurred — what `Ecc::eval_input` underlines, regardless
  /// of how many frames of `backtrace` separate it from the top level.
  pub origin: Span,
  pub backtrace: Vec<BacktraceFrame>,
}

impl Throw {
  pub fn new(value: Value, origin: Span) -> Self {
    Throw {
      value,
      origin,
      backtrace: Vec::new(),
    }
  }

  pub fn push_frame(&mut self, function_name: Key, call_site: Span) {
    self.backtrace.push(BacktraceFrame { function_name, call_site });
  }
}
