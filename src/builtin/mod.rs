//! Built-in library registration (§1 "out of scope... covered only as
//! a registration/dispatch contract in §6", `SPEC_FULL.md`
//! "Supplemented features").
//!
//! Each submodule owns one global constructor/namespace plus its
//! prototype's methods, registered from [`install`] in dependency
//! order — `Object`/`Function` first since every other prototype
//! chains up through `Object.prototype`, then the rest.

pub mod arguments;
pub mod array;
pub mod boolean;
pub mod date;
pub mod error;
pub mod function;
pub mod global;
pub mod json;
pub mod math;
pub mod number;
pub mod object;
pub mod regexp;
pub mod string;

use std::rc::Rc;

use crate::ecc::Ecc;
use crate::object::function::{FunctionData, NativeFn};
use crate::object::{ObjectData, PropFlags, PropValue};
use crate::pool::Handle;
use crate::value::Value;

pub fn install(ecc: &mut Ecc) {
  object::install(ecc);
  function::install(ecc);
  array::install(ecc);
  string::install(ecc);
  number::install(ecc);
  boolean::install(ecc);
  error::install(ecc);
  math::install(ecc);
  json::install(ecc);
  date::install(ecc);
  regexp::install(ecc);
  global::install(ecc);
}

/// The i-th argument, or `undefined` past the end — the same
/// over-read-is-fine contract as `NativeArgs::argument`.
pub(crate) fn arg(args: &[Value], index: usize) -> Value {
  args.get(index).copied().unwrap_or(Value::undefined())
}

/// Installs a native method directly onto a prototype object (as
/// opposed to [`Ecc::add_native`], which installs a *global* binding).
pub(crate) fn define_method(ecc: &mut Ecc, target: Handle<ObjectData>, name: &str, argc: u32, f: NativeFn) {
  let key = ecc.keys.intern(name);
  let function_proto = ecc.prototypes.function;
  let object = ObjectData::new(Some(function_proto));
  let data = FunctionData::native(object, key, argc, f);
  let handle = ecc.pool.alloc_function(data);
  ecc
    .pool
    .object_mut(target)
    .add_member(key, PropValue::Data(Value::function(handle)), PropFlags::WRITABLE)
    .ok();
}

/// Installs a native function value as a plain data member of an
/// arbitrary object (e.g. a namespace like `Math` or `JSON`, which is
/// not itself callable).
pub(crate) fn define_value(ecc: &mut Ecc, target: Handle<ObjectData>, name: &str, value: Value) {
  let key = ecc.keys.intern(name);
  ecc.pool.object_mut(target).add_member(key, PropValue::Data(value), PropFlags::WRITABLE).ok();
}

/// Builds a global constructor function: a native `Function` whose own
/// `.prototype` is `proto`, with `proto.constructor` wired back to it,
/// registered as a global binding named `name`.
pub(crate) fn define_constructor(ecc: &mut Ecc, name: &str, argc: u32, proto: Handle<ObjectData>, f: NativeFn) -> Handle<crate::object::function::FunctionData> {
  let key = ecc.keys.intern(name);
  let function_proto = ecc.prototypes.function;
  let object = ObjectData::new(Some(function_proto));
  let data = FunctionData::native(object, key, argc, f);
  let handle = ecc.pool.alloc_function(data);

  let proto_key = ecc.keys.predefined.prototype;
  ecc
    .pool
    .function_mut(handle)
    .object
    .add_member(proto_key, PropValue::Data(Value::object(proto)), PropFlags::WRITABLE)
    .ok();

  let ctor_key = ecc.keys.predefined.constructor;
  ecc.pool.object_mut(proto).add_member(ctor_key, PropValue::Data(Value::function(handle)), PropFlags::WRITABLE).ok();

  ecc
    .pool
    .object_mut(ecc.global)
    .add_member(key, PropValue::Data(Value::function(handle)), PropFlags::WRITABLE)
    .ok();
  handle
}

pub(crate) fn native(f: impl Fn(&mut Ecc, Value, &[Value]) -> Result<Value, crate::throw::Throw> + 'static) -> NativeFn {
  Rc::new(f)
}

/// Installs a native method as an own member of a constructor function
/// itself (e.g. `Object.keys`, `Array.isArray`) rather than on its
/// `.prototype` — a function's own property store lives inline on
/// `FunctionData::object`, so this writes there directly instead of
/// going through the object arena.
pub(crate) fn define_static(ecc: &mut Ecc, ctor: Handle<FunctionData>, name: &str, argc: u32, f: NativeFn) {
  let key = ecc.keys.intern(name);
  let function_proto = ecc.prototypes.function;
  let object = ObjectData::new(Some(function_proto));
  let data = FunctionData::native(object, key, argc, f);
  let handle = ecc.pool.alloc_function(data);
  ecc
    .pool
    .function_mut(ctor)
    .object
    .add_member(key, PropValue::Data(Value::function(handle)), PropFlags::WRITABLE)
    .ok();
}
