//! `Array` constructor and `Array.prototype.{push,pop,join,slice,
//! indexOf,forEach}` (`SPEC_FULL.md` "Supplemented features", grounded
//! on `original_source/src/builtin/array.c`). Arrays are plain objects
//! whose dense elements live in `ObjectData`'s element vector (§3
//! "hybrid property store") — `length` is just `element_count()`, not
//! a stored property.

use crate::ecc::Ecc;
use crate::object::{ObjectData, PropFlags};
use crate::throw::Throw;
use crate::value::Value;
use crate::vm;

use super::{arg, define_constructor, define_method, native};

pub fn install(ecc: &mut Ecc) {
  let proto = ecc.prototypes.array;
  define_method(ecc, proto, "toString", 0, native(to_string));
  define_method(ecc, proto, "join", 1, native(join));
  define_method(ecc, proto, "push", 1, native(push));
  define_method(ecc, proto, "pop", 0, native(pop));
  define_method(ecc, proto, "slice", 2, native(slice));
  define_method(ecc, proto, "indexOf", 1, native(index_of));
  define_method(ecc, proto, "forEach", 1, native(for_each));

  let ctor = define_constructor(ecc, "Array", 1, proto, native(construct));
  super::define_static(ecc, ctor, "isArray", 1, native(is_array));
}

fn new_array(ecc: &mut Ecc) -> crate::pool::Handle<ObjectData> {
  let proto = ecc.prototypes.array;
  ecc.pool.alloc_object(ObjectData::new(Some(proto)))
}

/// `new Array(n)` allocates `n` empty slots; `new Array(a, b, c)` makes
/// a 3-element array holding them, matching the overload split in
/// every ECMAScript-family `Array` constructor.
fn construct(ecc: &mut Ecc, _this: Value, args: &[Value]) -> Result<Value, Throw> {
  let handle = new_array(ecc);
  if args.len() == 1 {
    if let Value::Int(n) = args[0] {
      if n >= 0 {
        ecc.pool.object_mut(handle).resize_elements(n as u32);
        return Ok(Value::object(handle));
      }
    }
    if let Value::Number(n) = args[0] {
      if n.fract() == 0.0 && n >= 0.0 {
        ecc.pool.object_mut(handle).resize_elements(n as u32);
        return Ok(Value::object(handle));
      }
    }
  }
  for (i, &v) in args.iter().enumerate() {
    ecc.pool.object_mut(handle).add_element(i as u32, v, PropFlags::all()).ok();
  }
  Ok(Value::object(handle))
}

fn is_array(_ecc: &mut Ecc, _this: Value, args: &[Value]) -> Result<Value, Throw> {
  let is_arr = matches!(arg(args, 0), Value::Object(_));
  Ok(Value::boolean(is_arr))
}

fn to_string(ecc: &mut Ecc, this: Value, _args: &[Value]) -> Result<Value, Throw> {
  join(ecc, this, &[])
}

fn join(ecc: &mut Ecc, this: Value, args: &[Value]) -> Result<Value, Throw> {
  let Some(h) = this.as_object() else {
    let handle = ecc.pool.alloc_chars(crate::chars::Chars::create_with_bytes(Vec::new()));
    return Ok(Value::chars(handle));
  };
  let sep_value = arg(args, 0);
  let sep = if sep_value.is_undefined() { ",".to_string() } else { vm::to_display_string(ecc, sep_value)? };
  let len = ecc.pool.object(h).element_count();
  let mut parts = Vec::with_capacity(len as usize);
  for i in 0..len {
    let v = ecc.pool.object(h).get_own_element(i).unwrap_or(Value::undefined());
    parts.push(if v.is_nullish() { String::new() } else { vm::to_display_string(ecc, v)? });
  }
  let s = parts.join(&sep);
  let handle = ecc.pool.alloc_chars(crate::chars::Chars::create_with_bytes(s.into_bytes()));
  Ok(Value::chars(handle))
}

fn push(ecc: &mut Ecc, this: Value, args: &[Value]) -> Result<Value, Throw> {
  let Some(h) = this.as_object() else {
    return Ok(Value::binary(0.0));
  };
  let mut len = ecc.pool.object(h).element_count();
  for &v in args {
    ecc.pool.object_mut(h).add_element(len, v, PropFlags::all()).ok();
    len += 1;
  }
  Ok(Value::binary(len as f64))
}

fn pop(ecc: &mut Ecc, this: Value, _args: &[Value]) -> Result<Value, Throw> {
  let Some(h) = this.as_object() else {
    return Ok(Value::undefined());
  };
  let len = ecc.pool.object(h).element_count();
  if len == 0 {
    return Ok(Value::undefined());
  }
  let last = len - 1;
  let value = ecc.pool.object(h).get_own_element(last).unwrap_or(Value::undefined());
  ecc.pool.object_mut(h).delete_element(last);
  ecc.pool.object_mut(h).resize_elements(last);
  Ok(value)
}

fn slice(ecc: &mut Ecc, this: Value, args: &[Value]) -> Result<Value, Throw> {
  let Some(h) = this.as_object() else {
    let handle = new_array(ecc);
    return Ok(Value::object(handle));
  };
  let len = ecc.pool.object(h).element_count() as i64;
  let start = resolve_index(ecc, arg(args, 0), len, 0)?;
  let end = resolve_index(ecc, arg(args, 1), len, len)?;
  let result = new_array(ecc);
  let mut out_i = 0u32;
  let mut i = start;
  while i < end {
    let v = ecc.pool.object(h).get_own_element(i as u32).unwrap_or(Value::undefined());
    ecc.pool.object_mut(result).add_element(out_i, v, PropFlags::all()).ok();
    out_i += 1;
    i += 1;
  }
  Ok(Value::object(result))
}

fn resolve_index(ecc: &mut Ecc, value: Value, len: i64, default: i64) -> Result<i64, Throw> {
  if value.is_undefined() {
    return Ok(default.clamp(0, len));
  }
  let n = vm::to_int32(ecc, value)? as i64;
  Ok(if n < 0 { (len + n).max(0) } else { n.min(len) })
}

fn index_of(ecc: &mut Ecc, this: Value, args: &[Value]) -> Result<Value, Throw> {
  let Some(h) = this.as_object() else {
    return Ok(Value::binary(-1.0));
  };
  let target = arg(args, 0);
  let len = ecc.pool.object(h).element_count();
  let start = if args.len() > 1 { vm::to_int32(ecc, args[1])?.max(0) as u32 } else { 0 };
  for i in start..len {
    let v = ecc.pool.object(h).get_own_element(i).unwrap_or(Value::undefined());
    if vm::strict_equals(ecc, v, target) {
      return Ok(Value::binary(i as f64));
    }
  }
  Ok(Value::binary(-1.0))
}

fn for_each(ecc: &mut Ecc, this: Value, args: &[Value]) -> Result<Value, Throw> {
  let Some(h) = this.as_object() else {
    return Ok(Value::undefined());
  };
  let callback = arg(args, 0);
  let call_this = arg(args, 1);
  let len = ecc.pool.object(h).element_count();
  for i in 0..len {
    let v = ecc.pool.object(h).get_own_element(i).unwrap_or(Value::undefined());
    let call_args = [v, Value::binary(i as f64), this];
    vm::call(ecc, callback, call_this, &call_args, false, ecc_span::Span::from(0..0))?;
  }
  Ok(Value::undefined())
}
