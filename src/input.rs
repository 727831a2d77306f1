//! Owns the source bytes a program was parsed from, so that every
//! [`crate::text::Text`] lexed out of it stays valid for as long as the
//! `Input` lives (§4.1, §4.4).
//!
//! Each buffer an `Input` owns — its source bytes, and any escape-decoded
//! string literal bytes added later — is a separate heap allocation
//! (`Box<[u8]>`). Moving the `Input` value itself (e.g. when the owning
//! `Vec` in [`crate::ecc::Ecc`] grows) only copies those pointers, never
//! the pointee, so `Text`s handed out earlier keep pointing at live data.

use ecc_diag::Source;
use ecc_span::Span;

use crate::text::Text;

pub struct Input {
  name: Box<str>,
  bytes: Box<[u8]>,
  /// Byte offset of the start of each line, for diagnostics.
  lines: Vec<u32>,
  /// Buffers backing string-literal escape decoding (§4.4 "escape
  /// sequences"): these outlive the lexer call that created them since
  /// the `Text` handed back may be stored in an `Op::value` for the
  /// lifetime of the program.
  escaped: Vec<Box<[u8]>>,
}

impl Input {
  pub fn from_bytes(name: impl Into<Box<str>>, bytes: impl Into<Box<[u8]>>) -> Input {
    let bytes = bytes.into();
    let lines = line_offsets(&bytes);
    Input {
      name: name.into(),
      bytes,
      lines,
      escaped: Vec::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn bytes(&self) -> &[u8] {
    &self.bytes
  }

  pub fn as_str(&self) -> &str {
    std::str::from_utf8(&self.bytes).unwrap_or("")
  }

  /// A `Text` spanning the whole input, borrowing its bytes directly.
  ///
  /// # Safety
  /// The returned `Text` must not outlive `self`.
  pub unsafe fn as_text(&self) -> Text {
    Text::from_bytes(&self.bytes)
  }

  /// Decode `escaped` into a newly owned buffer and return a `Text`
  /// pointing into it. The buffer is retained in `self.escaped` for the
  /// input's lifetime.
  ///
  /// # Safety
  /// The returned `Text` must not outlive `self`.
  pub unsafe fn add_escaped_text(&mut self, decoded: Vec<u8>) -> Text {
    self.escaped.push(decoded.into_boxed_slice());
    let boxed: &[u8] = self.escaped.last().unwrap();
    Text::from_bytes(boxed)
  }

  /// Takes ownership of escape-decoded buffers a [`crate::lexer::Lexer`]
  /// accumulated while lexing this input (`Lexer::take_escaped`),
  /// extending the input's own `escaped` store. Moving a `Box<[u8]>`
  /// between `Vec`s relocates the pointer, never the pointee, so every
  /// `Text` already handed out from one of these buffers stays valid.
  pub(crate) fn retain_escaped(&mut self, bufs: Vec<Box<[u8]>>) {
    self.escaped.extend(bufs);
  }

  /// The 1-based line number containing `offset`, or `None` if it falls
  /// outside the buffer.
  pub fn line_at(&self, offset: usize) -> Option<u32> {
    if offset > self.bytes.len() {
      return None;
    }
    match self.lines.binary_search(&(offset as u32)) {
      Ok(i) => Some(i as u32 + 1),
      Err(0) => Some(1),
      Err(i) => Some(i as u32),
    }
  }

  /// A diagnostics-crate `Source` view onto this input, for rendering a
  /// [`ecc_diag::Report`] against it.
  pub fn as_source(&self) -> Source<'_> {
    Source::file(self.name(), self.as_str())
  }

  pub fn span(&self) -> Span {
    (0..self.bytes.len()).into()
  }
}

fn line_offsets(bytes: &[u8]) -> Vec<u32> {
  let mut lines = vec![0u32];
  for (i, &b) in bytes.iter().enumerate() {
    if b == b'\n' {
      lines.push(i as u32 + 1);
    }
  }
  lines
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn line_at_tracks_newline_offsets() {
    let input = Input::from_bytes("test", "a\nbb\nccc");
    assert_eq!(input.line_at(0), Some(1));
    assert_eq!(input.line_at(2), Some(2));
    assert_eq!(input.line_at(5), Some(3));
  }

  #[test]
  fn escaped_text_buffers_survive_further_appends() {
    let mut input = Input::from_bytes("test", "\"a\\nb\"");
    let first = unsafe { input.add_escaped_text(b"a\nb".to_vec()) };
    let _second = unsafe { input.add_escaped_text(b"other".to_vec()) };
    assert_eq!(first.as_str(), "a\nb");
  }
}
