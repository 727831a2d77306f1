//! The tagged value union (§3 "Value").
//!
//! `Value` is `Copy`: every stringlike/object variant is either a
//! borrowed [`Text`] (a raw pointer + length, itself `Copy`) or a small
//! integer [`Handle`] into one of the pool's arenas. Nothing here owns
//! heap memory directly, which is what lets a `Value` be passed around
//! and stored in element/property slots without a lifetime parameter.

use std::fmt;

use crate::chars::Chars;
use crate::key::Key;
use crate::object::function::FunctionData;
use crate::object::ObjectData;
use crate::pool::{Handle, Pool};
use crate::text::Text;

#[derive(Clone, Copy)]
pub enum Value {
  Undefined,
  Null,
  Bool(bool),
  Int(i32),
  Number(f64),
  Key(Key),
  Text(Text),
  Chars(Handle<Chars>),
  Object(Handle<ObjectData>),
  Function(Handle<FunctionData>),
}

impl Value {
  pub fn undefined() -> Value {
    Value::Undefined
  }
  pub fn null() -> Value {
    Value::Null
  }
  pub fn boolean(v: bool) -> Value {
    Value::Bool(v)
  }
  pub fn integer(v: i32) -> Value {
    Value::Int(v)
  }
  pub fn binary(v: f64) -> Value {
    Value::Number(v)
  }
  pub fn key(v: Key) -> Value {
    Value::Key(v)
  }
  pub fn text(v: Text) -> Value {
    Value::Text(v)
  }
  pub fn chars(v: Handle<Chars>) -> Value {
    Value::Chars(v)
  }
  pub fn object(v: Handle<ObjectData>) -> Value {
    Value::Object(v)
  }
  pub fn function(v: Handle<FunctionData>) -> Value {
    Value::Function(v)
  }

  pub fn is_undefined(&self) -> bool {
    matches!(self, Value::Undefined)
  }
  pub fn is_null(&self) -> bool {
    matches!(self, Value::Null)
  }
  pub fn is_nullish(&self) -> bool {
    self.is_undefined() || self.is_null()
  }
  pub fn is_object_like(&self) -> bool {
    matches!(self, Value::Object(_) | Value::Function(_))
  }
  pub fn is_stringlike(&self) -> bool {
    matches!(self, Value::Key(_) | Value::Text(_) | Value::Chars(_))
  }
  pub fn is_number(&self) -> bool {
    matches!(self, Value::Int(_) | Value::Number(_))
  }

  pub fn as_object(&self) -> Option<Handle<ObjectData>> {
    match self {
      Value::Object(h) => Some(*h),
      _ => None,
    }
  }

  pub fn as_function(&self) -> Option<Handle<FunctionData>> {
    match self {
      Value::Function(h) => Some(*h),
      _ => None,
    }
  }

  /// §4.6 "truth": everything is truthy except `undefined`, `null`,
  /// `false`, `0`/`NaN`, and the empty string.
  pub fn truthy(&self, pool: &Pool, keys: &crate::key::Keys) -> bool {
    match self {
      Value::Undefined | Value::Null => false,
      Value::Bool(b) => *b,
      Value::Int(i) => *i != 0,
      Value::Number(n) => *n != 0.0 && !n.is_nan(),
      Value::Key(k) => !keys.resolve(*k).is_empty(),
      Value::Text(t) => !t.is_empty(),
      Value::Chars(h) => !pool.chars(*h).is_empty(),
      Value::Object(_) | Value::Function(_) => true,
    }
  }

  /// A name for `typeof`-like diagnostics and error messages. Does not
  /// distinguish object sub-kinds (error/date/...); see
  /// `ObjectData::kind` for that.
  pub fn type_name(&self, pool: &Pool) -> &'static str {
    match self {
      Value::Undefined => "undefined",
      Value::Null => "object",
      Value::Bool(_) => "boolean",
      Value::Int(_) | Value::Number(_) => "number",
      Value::Key(_) | Value::Text(_) | Value::Chars(_) => "string",
      Value::Function(_) => "function",
      Value::Object(h) => pool.object(*h).kind.type_name(),
    }
  }
}

/// Renders a `Value` the way script `print`/string-concatenation would:
/// needs `Pool`/`Keys` to resolve interned strings and walk objects, so
/// it cannot be a plain `Display for Value` impl.
pub struct Display<'a> {
  pub value: &'a Value,
  pub pool: &'a Pool,
  pub keys: &'a crate::key::Keys,
}

impl<'a> fmt::Display for Display<'a> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.value {
      Value::Undefined => write!(f, "undefined"),
      Value::Null => write!(f, "null"),
      Value::Bool(b) => write!(f, "{b}"),
      Value::Int(i) => write!(f, "{i}"),
      Value::Number(n) => write!(f, "{}", format_number(*n)),
      Value::Key(k) => write!(f, "{}", self.keys.resolve(*k)),
      Value::Text(t) => write!(f, "{}", t.as_str()),
      Value::Chars(h) => write!(f, "{}", self.pool.chars(*h).as_str()),
      Value::Function(h) => {
        let name = self.pool.function(*h).name;
        write!(f, "function {}() {{ [native code] }}", self.keys.resolve(name))
      }
      Value::Object(h) => {
        use crate::object::ObjectKind;
        match &self.pool.object(*h).kind {
          ObjectKind::Error(kind) => {
            let message = self.pool.object(*h).get_own(self.keys.predefined.message);
            let message = message
              .map(|v| format!("{}", Display { value: &v, pool: self.pool, keys: self.keys }))
              .unwrap_or_default();
            if message.is_empty() {
              write!(f, "{}", kind.name())
            } else {
              write!(f, "{}: {}", kind.name(), message)
            }
          }
          ObjectKind::Boolean(b) => write!(f, "{b}"),
          ObjectKind::Number(n) => write!(f, "{}", format_number(*n)),
          ObjectKind::String(s) => write!(f, "{s}"),
          ObjectKind::Date(t) => write!(f, "Date({t})"),
          _ => write!(f, "[object Object]"),
        }
      }
    }
  }
}

/// ECMAScript `ToString` number formatting: integral floats print
/// without a trailing `.0`, matching `"1" + 2` producing `"12"` rather
/// than `"1" + "2.0"`.
pub fn format_number(n: f64) -> String {
  if n.is_nan() {
    return "NaN".into();
  }
  if n.is_infinite() {
    return if n > 0.0 { "Infinity".into() } else { "-Infinity".into() };
  }
  if n == 0.0 {
    return if n.is_sign_negative() { "0".into() } else { "0".into() };
  }
  if n.fract() == 0.0 && n.abs() < 1e21 {
    format!("{}", n as i64)
  } else {
    format!("{n}")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn integral_floats_format_without_a_decimal_point() {
    assert_eq!(format_number(16.0), "16");
    assert_eq!(format_number(-3.0), "-3");
  }

  #[test]
  fn fractional_floats_keep_their_decimal_point() {
    assert_eq!(format_number(0.5), "0.5");
  }

  #[test]
  fn zero_and_negative_zero_to_string_as_plain_zero() {
    assert_eq!(format_number(0.0), "0");
    assert_eq!(format_number(-0.0), "0");
  }
}
