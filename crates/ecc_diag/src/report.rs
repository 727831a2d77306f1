//! Error reporting.
//!
//! The entrypoint to this module is [`Report`].
//!
//! Unlike a typical "pretty" diagnostic renderer, [`Report::emit`] always
//! writes a plain-ASCII `^~~~` caret line under the offending span, in
//! addition to (optional) ANSI coloring of the span itself. The caret
//! line is what lets a host embedding the engine grep captured stderr
//! for the exact column a `SyntaxError` points at, even when color is
//! disabled (e.g. output is redirected to a file).

use std::fmt;
use std::fmt::{Display, Write};

use beef::lean::Cow;
use owo_colors as colors;
use span::Span;
use thiserror::Error;

use crate::snippet::Snippet;
use crate::source::Source;
use crate::style;

#[derive(Clone, Copy, Debug)]
pub enum Level {
  Info,
  Warning,
  Error,
}

impl Display for Level {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let level = match self {
      Level::Info => "info",
      Level::Warning => "warning",
      Level::Error => "error",
    };
    write!(f, "{level}")
  }
}

/// A single diagnostic: a named error kind (`SyntaxError`, `TypeError`, ...),
/// a message, and the source span it refers to.
pub struct Report<'a> {
  pub level: Level,
  pub name: Cow<'a, str>,
  pub source: Source<'a>,
  pub message: Cow<'a, str>,
  pub span: Span,
  pub color: bool,
}

impl<'a> Report<'a> {
  pub fn error(name: impl Into<Cow<'a, str>>) -> ReportBuilder<'a> {
    ReportBuilder {
      level: Level::Error,
      name: name.into(),
      color: true,
    }
  }

  /// Emit the report to `w`:
  ///
  /// ```text
  /// SyntaxError: unexpected identifier
  /// > code:1
  /// |
  /// | var 3abc = 1
  /// |     ^~~~
  /// |
  /// ```
  pub fn emit<W: Write>(&self, w: &mut W) -> Result<(), EmitError> {
    if self.source.str().get(std::ops::Range::from(self.span)).is_none() {
      return Err(EmitError::OutOfBounds);
    }

    let style = style::Style {
      enabled: self.color,
      span: match self.level {
        Level::Info => colors::style().blue(),
        Level::Warning => colors::style().yellow(),
        Level::Error => colors::style().red(),
      }
      .bold(),
      level: match self.level {
        Level::Info => colors::style().blue(),
        Level::Warning => colors::style().yellow(),
        Level::Error => colors::style().red(),
      },
      symbol: colors::style().blue(),
    };

    let snippet = Snippet::new(self.source.str(), self.span);
    let pipe = style.symbol("|");

    writeln!(w, "{}: {}", style.level(&self.name), self.message)?;
    writeln!(
      w,
      "{} {}:{}",
      style.symbol(">"),
      self.source.name().unwrap_or("code"),
      snippet.line
    )?;
    writeln!(w, "{pipe} ")?;

    let highlight_start = snippet.span.start;
    let highlight_end = snippet.span.end.max(snippet.span.start + 1);
    for (i, line) in snippet.s.split('\n').enumerate() {
      writeln!(w, "{pipe} {line}")?;
      if i == 0 && snippet.count == 1 {
        let caret_start = highlight_start.min(line.len());
        let caret_len = highlight_end.saturating_sub(highlight_start).max(1);
        let lead: String = " ".repeat(caret_start);
        let underline = caret(caret_len);
        writeln!(w, "{pipe} {lead}{}", style.span(underline))?;
      }
    }

    writeln!(w, "{pipe} ")?;
    Ok(())
  }

  pub fn emit_to_string(&self) -> Result<String, EmitError> {
    let mut buf = String::new();
    self.emit(&mut buf)?;
    Ok(buf)
  }
}

/// Builds a `^~~~`-style underline string of the given width: a single
/// `^` at the first column, followed by `width - 1` `~` characters.
fn caret(width: usize) -> String {
  let mut s = String::with_capacity(width);
  s.push('^');
  for _ in 1..width {
    s.push('~');
  }
  s
}

pub struct ReportBuilder<'a> {
  level: Level,
  name: Cow<'a, str>,
  color: bool,
}

impl<'a> ReportBuilder<'a> {
  pub fn color(mut self, enabled: bool) -> Self {
    self.color = enabled;
    self
  }

  pub fn build(
    self,
    source: impl Into<Source<'a>>,
    message: impl Into<Cow<'a, str>>,
    span: impl Into<Span>,
  ) -> Report<'a> {
    Report {
      level: self.level,
      name: self.name,
      source: source.into(),
      message: message.into(),
      span: span.into(),
      color: self.color,
    }
  }
}

#[derive(Debug, Error)]
pub enum EmitError {
  #[error("failed to format")]
  Fmt(#[from] fmt::Error),
  #[error("span does not fit within source string")]
  OutOfBounds,
}

#[cfg(test)]
mod tests;
