//! Process-wide-in-spirit, but engine-scoped, name interner (§4.2).
//!
//! Per the redesign note on key interning, the intern table lives on the
//! [`crate::ecc::Ecc`] instance rather than behind a process-global, so
//! two engines in the same process never fight over lifetimes or
//! require external synchronization.
//!
//! The hashmap-trie lookup described by the original design (a key as
//! "four 4-bit digits" walking a 16-way trie) existed only to support
//! that trie as the object property store; since the object property
//! store here is a plain ordered map (`object.rs`'s redesign), a `Key`
//! is just an opaque index with an equality-by-integer contract.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key(u32);

impl Key {
  pub const NONE: Key = Key(0);

  pub fn is_none(&self) -> bool {
    *self == Key::NONE
  }

  fn index(&self) -> usize {
    self.0 as usize
  }
}

impl fmt::Debug for Key {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Key({})", self.0)
  }
}

pub struct KeyPool {
  names: Vec<Box<str>>,
}

impl KeyPool {
  fn new() -> Self {
    // Index 0 is the `none` sentinel, matching `Key::NONE`.
    KeyPool {
      names: vec!["".into()],
    }
  }

  /// Look up or intern `name`, returning a `Key` for which
  /// `resolve(key) == name` holds for the lifetime of this pool.
  ///
  /// TODO: this is a linear scan; worth a hash index once the number of
  /// distinct property/identifier names in a typical program gets large
  /// enough for it to show up in profiles.
  pub fn intern(&mut self, name: &str) -> Key {
    if let Some(index) = self.names.iter().position(|n| n.as_ref() == name) {
      return Key(index as u32);
    }
    let index = self.names.len() as u32;
    self.names.push(name.into());
    Key(index)
  }

  pub fn resolve(&self, key: Key) -> &str {
    &self.names[key.index()]
  }
}

macro_rules! predefined_keys {
  ($($field:ident => $name:literal),* $(,)?) => {
    pub struct PredefinedKeys {
      $(pub $field: Key,)*
    }

    impl PredefinedKeys {
      fn new(pool: &mut KeyPool) -> Self {
        Self {
          $($field: pool.intern($name),)*
        }
      }
    }
  };
}

predefined_keys! {
  prototype => "prototype",
  constructor => "constructor",
  length => "length",
  arguments => "arguments",
  name => "name",
  message => "message",
  to_string => "toString",
  value_of => "valueOf",
  eval => "eval",
  value => "value",
  writable => "writable",
  enumerable => "enumerable",
  configurable => "configurable",
  get => "get",
  set => "set",
  call => "call",
  apply => "apply",
  bind => "bind",
  this => "this",
}

pub struct Keys {
  pub pool: KeyPool,
  pub predefined: PredefinedKeys,
}

impl Keys {
  pub fn new() -> Self {
    let mut pool = KeyPool::new();
    let predefined = PredefinedKeys::new(&mut pool);
    Keys { pool, predefined }
  }

  pub fn intern(&mut self, name: &str) -> Key {
    self.pool.intern(name)
  }

  pub fn resolve(&self, key: Key) -> &str {
    self.pool.resolve(key)
  }
}

impl Default for Keys {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn equal_names_intern_to_the_same_key() {
    let mut keys = Keys::new();
    let a = keys.intern("foo");
    let b = keys.intern("foo");
    assert_eq!(a, b);
  }

  #[test]
  fn distinct_names_intern_to_distinct_keys() {
    let mut keys = Keys::new();
    let a = keys.intern("foo");
    let b = keys.intern("bar");
    assert_ne!(a, b);
  }

  #[test]
  fn predefined_keys_resolve_to_their_names() {
    let keys = Keys::new();
    assert_eq!(keys.resolve(keys.predefined.prototype), "prototype");
    assert_eq!(keys.resolve(keys.predefined.length), "length");
  }
}
