//! Prototype-chained objects with a hybrid element/property store (§3
//! "Object", §4.3).
//!
//! The element store stays a dense, ordered array exactly as specified.
//! The property store is *not* the four-nibble hashmap trie the design
//! notes flag for replacement: a straight ordered map (`IndexMap`) keyed
//! directly by the interned `Key`'s integer value gives the same
//! semantics (owned slot, per-property flags, stable enumeration order
//! for `for`-`in`) without the cache-unfriendly pointer chase, and
//! without capping property names at a 16-bit key space.

use indexmap::IndexMap;

use crate::key::Key;
use crate::object::function::FunctionData;
use crate::pool::{Handle, Marks, Trace};
use crate::text::bitflags_like;
use crate::value::Value;

pub mod function;

bitflags_like! {
  /// Per-slot attribute flags, named after their ES3
  /// `PropertyDescriptor` counterparts rather than the original's
  /// `readonly`/`hidden`/`sealed` triplet, since script code
  /// (`Object.defineProperty`) addresses them by these names directly.
  pub struct PropFlags: u8 {
    const WRITABLE = 0b001;
    const ENUMERABLE = 0b010;
    const CONFIGURABLE = 0b100;
  }
}

impl PropFlags {
  pub fn all() -> PropFlags {
    PropFlags::WRITABLE | PropFlags::ENUMERABLE | PropFlags::CONFIGURABLE
  }

  pub fn writable(&self) -> bool {
    self.contains(PropFlags::WRITABLE)
  }
  pub fn enumerable(&self) -> bool {
    self.contains(PropFlags::ENUMERABLE)
  }
  pub fn configurable(&self) -> bool {
    self.contains(PropFlags::CONFIGURABLE)
  }
}

/// Either a plain data slot, or an accessor pair. Per §4.3's "accessor
/// install rule", adding a getter onto a slot that already holds a
/// setter (or vice versa) keeps both halves; this is modeled directly
/// instead of via the original's single-function `pair` pointer trick.
#[derive(Clone, Copy)]
pub enum PropValue {
  Data(Value),
  Accessor {
    get: Option<Handle<FunctionData>>,
    set: Option<Handle<FunctionData>>,
  },
}

#[derive(Clone, Copy)]
pub struct PropSlot {
  pub value: PropValue,
  pub flags: PropFlags,
}

#[derive(Clone, Copy)]
pub struct ElementSlot {
  pub value: Value,
  pub flags: PropFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Error,
  SyntaxError,
  ReferenceError,
  TypeError,
  RangeError,
  UriError,
}

impl ErrorKind {
  pub fn name(&self) -> &'static str {
    match self {
      ErrorKind::Error => "Error",
      ErrorKind::SyntaxError => "SyntaxError",
      ErrorKind::ReferenceError => "ReferenceError",
      ErrorKind::TypeError => "TypeError",
      ErrorKind::RangeError => "RangeError",
      ErrorKind::UriError => "URIError",
    }
  }

  /// Index into [`crate::ecc::Prototypes::error`], stable for the life
  /// of the engine.
  pub fn index(&self) -> usize {
    match self {
      ErrorKind::Error => 0,
      ErrorKind::SyntaxError => 1,
      ErrorKind::ReferenceError => 2,
      ErrorKind::TypeError => 3,
      ErrorKind::RangeError => 4,
      ErrorKind::UriError => 5,
    }
  }

  pub const COUNT: usize = 6;
}

/// Distinguishes the handful of specialized object shapes from a plain
/// object; all of them still go through the same element/property
/// store and prototype chain. A `Host` object defers field access to an
/// embedder-supplied trait object, the engine's sole escape hatch for
/// native data that does not fit the value model.
pub enum ObjectKind {
  Plain,
  Error(ErrorKind),
  Boolean(bool),
  Number(f64),
  String(String),
  Date(f64),
  Host(Box<dyn HostObject>),
}

impl ObjectKind {
  pub fn type_name(&self) -> &'static str {
    match self {
      ObjectKind::Plain | ObjectKind::Date(_) | ObjectKind::Host(_) => "object",
      ObjectKind::Error(_) => "object",
      ObjectKind::Boolean(_) => "boolean",
      ObjectKind::Number(_) => "number",
      ObjectKind::String(_) => "string",
    }
  }
}

/// Native data embedded in a `Host` object. The engine calls into this
/// only for field access; arithmetic/comparison on host objects is not
/// part of the native ABI (§6) and always fails with a `TypeError`.
pub trait HostObject {
  fn type_name(&self) -> &'static str;
}

pub struct ObjectData {
  pub prototype: Option<Handle<ObjectData>>,
  pub kind: ObjectKind,
  pub elements: Vec<Option<ElementSlot>>,
  pub properties: IndexMap<Key, PropSlot>,
  pub sealed: bool,
}

impl ObjectData {
  pub fn new(prototype: Option<Handle<ObjectData>>) -> Self {
    ObjectData {
      prototype,
      kind: ObjectKind::Plain,
      elements: Vec::new(),
      properties: IndexMap::new(),
      sealed: false,
    }
  }

  pub fn with_kind(prototype: Option<Handle<ObjectData>>, kind: ObjectKind) -> Self {
    ObjectData {
      prototype,
      kind,
      elements: Vec::new(),
      properties: IndexMap::new(),
      sealed: false,
    }
  }

  /// Classifies `text` the way `getElementOrKey` does: a valid
  /// non-negative integer index (with no leading zeros other than "0"
  /// itself, and round-tripping losslessly through `i64`) routes to the
  /// element store; anything else is a property key.
  pub fn classify_index(text: &str) -> Option<u32> {
    if text.is_empty() {
      return None;
    }
    if text == "0" {
      return Some(0);
    }
    if text.starts_with('0') || !text.bytes().all(|b| b.is_ascii_digit()) {
      return None;
    }
    text.parse::<u32>().ok().filter(|&n| n != u32::MAX)
  }

  pub fn get_own_element(&self, index: u32) -> Option<Value> {
    self
      .elements
      .get(index as usize)
      .and_then(|slot| slot.as_ref())
      .map(|slot| slot.value)
  }

  pub fn get_own_element_slot(&self, index: u32) -> Option<&ElementSlot> {
    self.elements.get(index as usize).and_then(|s| s.as_ref())
  }

  pub fn get_own(&self, key: Key) -> Option<Value> {
    match self.properties.get(&key)?.value {
      PropValue::Data(v) => Some(v),
      PropValue::Accessor { .. } => None,
    }
  }

  pub fn get_own_slot(&self, key: Key) -> Option<&PropSlot> {
    self.properties.get(&key)
  }

  pub fn element_count(&self) -> u32 {
    self.elements.len() as u32
  }

  /// `addElement`: resizes to the next power of two >= 8 as needed,
  /// auto-extending `elementCount` when `index` lands past the current
  /// end (an out-of-range write is how script code grows an array).
  pub fn add_element(&mut self, index: u32, value: Value, flags: PropFlags) -> Result<(), ()> {
    if self.sealed && self.elements.get(index as usize).map(|s| s.is_none()).unwrap_or(true) {
      return Err(());
    }
    if index as usize >= self.elements.len() {
      self.elements.resize(index as usize + 1, None);
    }
    self.elements[index as usize] = Some(ElementSlot { value, flags });
    Ok(())
  }

  pub fn delete_element(&mut self, index: u32) -> bool {
    match self.elements.get_mut(index as usize) {
      Some(slot @ Some(_)) => {
        if slot.unwrap().flags.configurable() {
          *slot = None;
          true
        } else {
          false
        }
      }
      _ => true,
    }
  }

  /// `resizeElement`, backing the `Array.prototype.length` setter:
  /// truncate or zero-extend the dense element array.
  pub fn resize_elements(&mut self, new_len: u32) {
    self.elements.resize(new_len as usize, None);
  }

  /// `addMember`: inserts or updates a property slot. When installing
  /// one half of an accessor pair onto a slot already holding the
  /// complementary half, the previous half is preserved (§4.3 "Accessor
  /// install rule").
  pub fn add_member(&mut self, key: Key, value: PropValue, flags: PropFlags) -> Result<(), ()> {
    let is_new = !self.properties.contains_key(&key);
    if self.sealed && is_new {
      return Err(());
    }
    let merged = match (self.properties.get(&key).map(|s| s.value), value) {
      (
        Some(PropValue::Accessor { get: old_get, set: old_set }),
        PropValue::Accessor { get: new_get, set: new_set },
      ) => PropValue::Accessor {
        get: new_get.or(old_get),
        set: new_set.or(old_set),
      },
      (_, v) => v,
    };
    self.properties.insert(key, PropSlot { value: merged, flags });
    Ok(())
  }

  /// `deleteX`: fails if the slot is non-configurable; shifts the
  /// remainder to keep enumeration order stable (the `packValue`
  /// compaction of the original trie, for free from `IndexMap`).
  pub fn delete_member(&mut self, key: Key) -> bool {
    match self.properties.get(&key) {
      None => true,
      Some(slot) if slot.flags.configurable() => {
        self.properties.shift_remove(&key);
        true
      }
      Some(_) => false,
    }
  }

  pub fn seal(&mut self) {
    self.sealed = true;
    for slot in self.properties.values_mut() {
      slot.flags.remove(PropFlags::CONFIGURABLE);
    }
    for slot in self.elements.iter_mut().flatten() {
      slot.flags.remove(PropFlags::CONFIGURABLE);
    }
  }

  pub fn freeze(&mut self) {
    self.seal();
    for slot in self.properties.values_mut() {
      slot.flags.remove(PropFlags::WRITABLE);
    }
    for slot in self.elements.iter_mut().flatten() {
      slot.flags.remove(PropFlags::WRITABLE);
    }
  }

  pub fn is_sealed(&self) -> bool {
    self.sealed
      && self.properties.values().all(|s| !s.flags.configurable())
      && self.elements.iter().flatten().all(|s| !s.flags.configurable())
  }

  pub fn is_frozen(&self) -> bool {
    self.is_sealed()
      && self.properties.values().all(|s| !s.flags.writable())
      && self.elements.iter().flatten().all(|s| !s.flags.writable())
  }

  /// Declares `key` as a fresh local slot (environment-object use only):
  /// a plain writable/non-enumerable data slot, appended at the next
  /// `IndexMap` index. Used to build a call frame's environment so that
  /// `GetLocalSlot(i)`/`GetParentSlot(depth, i)` (§4.5 "Local-slot
  /// optimization") can address it positionally via
  /// [`ObjectData::slot_value`] — valid as long as no local is ever
  /// deleted, which script code cannot do (`delete` only ever targets
  /// member/property ops, never a bare identifier).
  pub fn declare_local(&mut self, key: Key, value: Value) {
    self.properties.insert(
      key,
      PropSlot {
        value: PropValue::Data(value),
        flags: PropFlags::WRITABLE,
      },
    );
  }

  /// Positional read of the `index`-th declared property, in insertion
  /// order. See [`ObjectData::declare_local`].
  pub fn slot_value(&self, index: u32) -> Option<Value> {
    match self.properties.get_index(index as usize)?.1.value {
      PropValue::Data(v) => Some(v),
      PropValue::Accessor { .. } => None,
    }
  }

  pub fn set_slot_value(&mut self, index: u32, value: Value) {
    if let Some((_, slot)) = self.properties.get_index_mut(index as usize) {
      slot.value = PropValue::Data(value);
    }
  }

  /// Own enumerable keys in insertion order, as `for`-`in` observes
  /// them: elements first (numeric order), then named properties.
  pub fn own_enumerable_keys(&self, keys: &crate::key::Keys) -> Vec<String> {
    let mut out = Vec::new();
    for (i, slot) in self.elements.iter().enumerate() {
      if slot.map(|s| s.flags.enumerable()).unwrap_or(false) {
        out.push(i.to_string());
      }
    }
    for (key, slot) in self.properties.iter() {
      if slot.flags.enumerable() {
        out.push(keys.resolve(*key).to_string());
      }
    }
    out
  }
}

impl Trace for ObjectData {
  fn trace(&self, marks: &mut Marks) {
    if let Some(p) = self.prototype {
      marks.objects.push(p);
    }
    for slot in self.elements.iter().flatten() {
      trace_value(&slot.value, marks);
    }
    for slot in self.properties.values() {
      match slot.value {
        PropValue::Data(v) => trace_value(&v, marks),
        PropValue::Accessor { get, set } => {
          if let Some(f) = get {
            marks.functions.push(f);
          }
          if let Some(f) = set {
            marks.functions.push(f);
          }
        }
      }
    }
  }
}

pub(crate) fn trace_value(value: &Value, marks: &mut Marks) {
  match value {
    Value::Object(h) => marks.objects.push(*h),
    Value::Function(h) => marks.functions.push(*h),
    Value::Chars(h) => marks.chars.push(*h),
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn classify_index_accepts_canonical_decimal_only() {
    assert_eq!(ObjectData::classify_index("0"), Some(0));
    assert_eq!(ObjectData::classify_index("3"), Some(3));
    assert_eq!(ObjectData::classify_index("03"), None);
    assert_eq!(ObjectData::classify_index("-1"), None);
    assert_eq!(ObjectData::classify_index("3x"), None);
  }

  #[test]
  fn add_element_past_the_end_auto_extends() {
    let mut obj = ObjectData::new(None);
    obj.add_element(3, Value::integer(9), PropFlags::all()).unwrap();
    assert_eq!(obj.element_count(), 4);
    assert!(obj.get_own_element(0).is_none());
    assert_eq!(obj.get_own_element(3).map(|_| ()), Some(()));
  }

  #[test]
  fn sealed_object_rejects_new_properties_but_allows_existing_writes() {
    let mut obj = ObjectData::new(None);
    obj
      .add_member(Key::NONE, PropValue::Data(Value::integer(1)), PropFlags::all())
      .unwrap();
    obj.seal();
    assert!(obj
      .add_member(Key::NONE, PropValue::Data(Value::integer(2)), PropFlags::all())
      .is_ok());
  }

  #[test]
  fn freeze_then_is_frozen_round_trips() {
    let mut obj = ObjectData::new(None);
    obj
      .add_member(Key::NONE, PropValue::Data(Value::integer(1)), PropFlags::all())
      .unwrap();
    obj.freeze();
    assert!(obj.is_frozen());
    assert!(obj.is_sealed());
  }
}
