//! `Object` constructor, `Object.prototype`, and the static methods
//! companion to §4.3's `defineProperty`/`freeze`/`seal` family
//! (`SPEC_FULL.md` "Supplemented features", grounded on
//! `original_source/src/builtin/object.c`).

use crate::ecc::Ecc;
use crate::object::{ErrorKind, ObjectData, ObjectKind, PropFlags, PropValue};
use crate::throw::Throw;
use crate::value::Value;
use crate::vm::{self, throw_value};

use super::{arg, define_constructor, define_method, define_static, native};

pub fn install(ecc: &mut Ecc) {
  let proto = ecc.prototypes.object;
  define_method(ecc, proto, "toString", 0, native(to_string));
  define_method(ecc, proto, "valueOf", 0, native(value_of));
  define_method(ecc, proto, "hasOwnProperty", 1, native(has_own_property));
  define_method(ecc, proto, "isPrototypeOf", 1, native(is_prototype_of));

  let ctor = define_constructor(ecc, "Object", 1, proto, native(construct));
  define_static(ecc, ctor, "keys", 1, native(keys));
  define_static(ecc, ctor, "getOwnPropertyNames", 1, native(keys));
  define_static(ecc, ctor, "create", 1, native(create));
  define_static(ecc, ctor, "defineProperty", 3, native(define_property_builtin));
  define_static(ecc, ctor, "freeze", 1, native(freeze));
  define_static(ecc, ctor, "seal", 1, native(seal));
  define_static(ecc, ctor, "isFrozen", 1, native(is_frozen));
  define_static(ecc, ctor, "isSealed", 1, native(is_sealed));
  define_static(ecc, ctor, "getPrototypeOf", 1, native(get_prototype_of));
}

fn construct(_ecc: &mut Ecc, this: Value, args: &[Value]) -> Result<Value, Throw> {
  match arg(args, 0) {
    Value::Undefined | Value::Null => Ok(this),
    other if other.is_object_like() => Ok(other),
    _ => Ok(this),
  }
}

fn to_string(ecc: &mut Ecc, this: Value, _args: &[Value]) -> Result<Value, Throw> {
  let tag = match this {
    Value::Object(h) => match &ecc.pool.object(h).kind {
      ObjectKind::Plain => "Object",
      ObjectKind::Error(_) => "Error",
      ObjectKind::Boolean(_) => "Boolean",
      ObjectKind::Number(_) => "Number",
      ObjectKind::String(_) => "String",
      ObjectKind::Date(_) => "Date",
      ObjectKind::Host(_) => "Object",
    },
    Value::Function(_) => "Function",
    _ => "Object",
  };
  let s = format!("[object {tag}]");
  let handle = ecc.pool.alloc_chars(crate::chars::Chars::create_with_bytes(s.into_bytes()));
  Ok(Value::chars(handle))
}

fn value_of(_ecc: &mut Ecc, this: Value, _args: &[Value]) -> Result<Value, Throw> {
  Ok(this)
}

fn has_own_property(ecc: &mut Ecc, this: Value, args: &[Value]) -> Result<Value, Throw> {
  let Some(h) = this.as_object() else {
    return Ok(Value::boolean(false));
  };
  let name = vm::to_display_string(ecc, arg(args, 0))?;
  let found = match ObjectData::classify_index(&name) {
    Some(i) => ecc.pool.object(h).get_own_element_slot(i).is_some(),
    None => {
      let key = ecc.keys.intern(&name);
      ecc.pool.object(h).get_own_slot(key).is_some()
    }
  };
  Ok(Value::boolean(found))
}

fn is_prototype_of(ecc: &mut Ecc, this: Value, args: &[Value]) -> Result<Value, Throw> {
  let Some(proto) = this.as_object() else {
    return Ok(Value::boolean(false));
  };
  let Some(mut cur) = arg(args, 0).as_object() else {
    return Ok(Value::boolean(false));
  };
  loop {
    match ecc.pool.object(cur).prototype {
      Some(p) if p == proto => return Ok(Value::boolean(true)),
      Some(p) => cur = p,
      None => return Ok(Value::boolean(false)),
    }
  }
}

fn keys(ecc: &mut Ecc, _this: Value, args: &[Value]) -> Result<Value, Throw> {
  let names = keys_of(ecc, arg(args, 0));
  let array_proto = ecc.prototypes.array;
  let handle = ecc.pool.alloc_object(ObjectData::new(Some(array_proto)));
  for (i, name) in names.into_iter().enumerate() {
    let chars = ecc.pool.alloc_chars(crate::chars::Chars::create_with_bytes(name.into_bytes()));
    ecc.pool.object_mut(handle).add_element(i as u32, Value::chars(chars), PropFlags::all()).ok();
  }
  Ok(Value::object(handle))
}

fn create(ecc: &mut Ecc, _this: Value, args: &[Value]) -> Result<Value, Throw> {
  let proto = arg(args, 0).as_object();
  let handle = ecc.pool.alloc_object(ObjectData::new(proto));
  Ok(Value::object(handle))
}

fn define_property_builtin(ecc: &mut Ecc, _this: Value, args: &[Value]) -> Result<Value, Throw> {
  let target = arg(args, 0);
  let name = vm::to_display_string(ecc, arg(args, 1))?;
  define_property(ecc, target, &name, arg(args, 2))
}

fn freeze(ecc: &mut Ecc, _this: Value, args: &[Value]) -> Result<Value, Throw> {
  let target = arg(args, 0);
  if let Some(h) = target.as_object() {
    ecc.pool.object_mut(h).freeze();
  }
  Ok(target)
}

fn seal(ecc: &mut Ecc, _this: Value, args: &[Value]) -> Result<Value, Throw> {
  let target = arg(args, 0);
  if let Some(h) = target.as_object() {
    ecc.pool.object_mut(h).seal();
  }
  Ok(target)
}

fn is_frozen(ecc: &mut Ecc, _this: Value, args: &[Value]) -> Result<Value, Throw> {
  let frozen = arg(args, 0).as_object().map(|h| ecc.pool.object(h).is_frozen()).unwrap_or(true);
  Ok(Value::boolean(frozen))
}

fn is_sealed(ecc: &mut Ecc, _this: Value, args: &[Value]) -> Result<Value, Throw> {
  let sealed = arg(args, 0).as_object().map(|h| ecc.pool.object(h).is_sealed()).unwrap_or(true);
  Ok(Value::boolean(sealed))
}

fn get_prototype_of(ecc: &mut Ecc, _this: Value, args: &[Value]) -> Result<Value, Throw> {
  match arg(args, 0).as_object().and_then(|h| ecc.pool.object(h).prototype) {
    Some(p) => Ok(Value::object(p)),
    None => Ok(Value::null()),
  }
}

/// Reads a `PropertyDescriptor`-shaped object's recognized fields
/// (§4.3 "property descriptor round-trips"): `get`/`set`/`value`/
/// `writable`/`enumerable`/`configurable`.
pub(crate) fn read_descriptor(ecc: &mut Ecc, descriptor: Value) -> Result<(PropValue, PropFlags), Throw> {
  let Some(h) = descriptor.as_object() else {
    return Ok((PropValue::Data(Value::undefined()), PropFlags::empty()));
  };
  let get_key = ecc.keys.predefined.get;
  let set_key = ecc.keys.predefined.set;
  let value_key = ecc.keys.predefined.value;
  let writable_key = ecc.keys.predefined.writable;
  let enumerable_key = ecc.keys.predefined.enumerable;
  let configurable_key = ecc.keys.predefined.configurable;

  let getter = ecc.pool.object(h).get_own(get_key).and_then(|v| v.as_function());
  let setter = ecc.pool.object(h).get_own(set_key).and_then(|v| v.as_function());

  let value = if getter.is_some() || setter.is_some() {
    PropValue::Accessor { get: getter, set: setter }
  } else {
    PropValue::Data(ecc.pool.object(h).get_own(value_key).unwrap_or(Value::undefined()))
  };

  let mut flags = PropFlags::empty();
  if truthy_field(ecc, h, writable_key) {
    flags.insert(PropFlags::WRITABLE);
  }
  if truthy_field(ecc, h, enumerable_key) {
    flags.insert(PropFlags::ENUMERABLE);
  }
  if truthy_field(ecc, h, configurable_key) {
    flags.insert(PropFlags::CONFIGURABLE);
  }
  Ok((value, flags))
}

fn truthy_field(ecc: &Ecc, h: crate::pool::Handle<ObjectData>, key: crate::key::Key) -> bool {
  match ecc.pool.object(h).get_own(key) {
    Some(v) => v.truthy(&ecc.pool, &ecc.keys),
    None => false,
  }
}

pub(crate) fn define_property(ecc: &mut Ecc, target: Value, name: &str, descriptor: Value) -> Result<Value, Throw> {
  let Some(h) = target.as_object() else {
    return Err(throw_value(ecc, ErrorKind::TypeError, "Object.defineProperty called on non-object", ecc_span::Span::from(0..0)));
  };
  let key = ecc.keys.intern(name);
  let (value, flags) = read_descriptor(ecc, descriptor)?;
  if ecc.pool.object_mut(h).add_member(key, value, flags).is_err() {
    return Err(throw_value(ecc, ErrorKind::TypeError, "object is not extensible", ecc_span::Span::from(0..0)));
  }
  Ok(target)
}

pub(crate) fn keys_of(ecc: &Ecc, target: Value) -> Vec<String> {
  match target.as_object() {
    Some(h) => ecc.pool.object(h).own_enumerable_keys(&ecc.keys),
    None => Vec::new(),
  }
}
