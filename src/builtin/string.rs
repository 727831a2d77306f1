//! `String` constructor and `String.prototype` methods
//! (`SPEC_FULL.md` "Supplemented features", grounded on
//! `original_source/src/builtin/string.c`). `length`/indexing already
//! dispatch through `vm::get_member_or_key`/`builtin_length` for any
//! string-like value (`Text`/`Chars`/`Key`); this module only adds the
//! method surface.

use crate::ecc::Ecc;
use crate::object::{ObjectData, ObjectKind, PropFlags};
use crate::throw::Throw;
use crate::value::Value;
use crate::vm;

use super::{arg, define_constructor, define_method, native};

pub fn install(ecc: &mut Ecc) {
  let proto = ecc.prototypes.string;
  define_method(ecc, proto, "toString", 0, native(to_string));
  define_method(ecc, proto, "valueOf", 0, native(to_string));
  define_method(ecc, proto, "charAt", 1, native(char_at));
  define_method(ecc, proto, "charCodeAt", 1, native(char_code_at));
  define_method(ecc, proto, "indexOf", 1, native(index_of));
  define_method(ecc, proto, "slice", 2, native(slice));
  define_method(ecc, proto, "substring", 2, native(substring));
  define_method(ecc, proto, "split", 1, native(split));
  define_method(ecc, proto, "toUpperCase", 0, native(to_upper_case));
  define_method(ecc, proto, "toLowerCase", 0, native(to_lower_case));
  define_method(ecc, proto, "concat", 1, native(concat));
  define_method(ecc, proto, "trim", 0, native(trim));

  define_constructor(ecc, "String", 1, proto, native(construct));
}

fn this_string(ecc: &mut Ecc, this: Value) -> Result<String, Throw> {
  match this {
    Value::Object(h) => {
      if let ObjectKind::String(s) = &ecc.pool.object(h).kind {
        return Ok(s.clone());
      }
      vm::to_display_string(ecc, this)
    }
    other => vm::to_display_string(ecc, other),
  }
}

fn chars_value(ecc: &mut Ecc, s: String) -> Value {
  let handle = ecc.pool.alloc_chars(crate::chars::Chars::create_with_bytes(s.into_bytes()));
  Value::chars(handle)
}

/// `new String(x)` wraps a boxed copy (`ObjectKind::String`); calling
/// `String(x)` without `new` just coerces to a primitive (§4.5 "boxed
/// primitive wrapper" vs plain coercion call).
fn construct(ecc: &mut Ecc, this: Value, args: &[Value]) -> Result<Value, Throw> {
  let s = if args.is_empty() { String::new() } else { vm::to_display_string(ecc, args[0])? };
  if let Value::Object(h) = this {
    ecc.pool.object_mut(h).kind = ObjectKind::String(s);
    return Ok(this);
  }
  Ok(chars_value(ecc, s))
}

fn to_string(ecc: &mut Ecc, this: Value, _args: &[Value]) -> Result<Value, Throw> {
  let s = this_string(ecc, this)?;
  Ok(chars_value(ecc, s))
}

fn char_at(ecc: &mut Ecc, this: Value, args: &[Value]) -> Result<Value, Throw> {
  let s = this_string(ecc, this)?;
  let index = vm::to_int32(ecc, arg(args, 0))?;
  let c = if index < 0 { None } else { s.chars().nth(index as usize) };
  Ok(match c {
    Some(c) => chars_value(ecc, c.to_string()),
    None => chars_value(ecc, String::new()),
  })
}

fn char_code_at(ecc: &mut Ecc, this: Value, args: &[Value]) -> Result<Value, Throw> {
  let s = this_string(ecc, this)?;
  let index = vm::to_int32(ecc, arg(args, 0))?;
  let c = if index < 0 { None } else { s.chars().nth(index as usize) };
  Ok(match c {
    Some(c) => Value::binary(c as u32 as f64),
    None => Value::binary(f64::NAN),
  })
}

fn index_of(ecc: &mut Ecc, this: Value, args: &[Value]) -> Result<Value, Throw> {
  let s = this_string(ecc, this)?;
  let needle = vm::to_display_string(ecc, arg(args, 0))?;
  let chars: Vec<char> = s.chars().collect();
  let needle_chars: Vec<char> = needle.chars().collect();
  if needle_chars.is_empty() {
    return Ok(Value::binary(0.0));
  }
  if needle_chars.len() > chars.len() {
    return Ok(Value::binary(-1.0));
  }
  for i in 0..=(chars.len() - needle_chars.len()) {
    if chars[i..i + needle_chars.len()] == needle_chars[..] {
      return Ok(Value::binary(i as f64));
    }
  }
  Ok(Value::binary(-1.0))
}

fn clamp_index(n: i64, len: i64) -> i64 {
  n.clamp(0, len)
}

fn slice(ecc: &mut Ecc, this: Value, args: &[Value]) -> Result<Value, Throw> {
  let s = this_string(ecc, this)?;
  let chars: Vec<char> = s.chars().collect();
  let len = chars.len() as i64;
  let start_arg = arg(args, 0);
  let end_arg = arg(args, 1);
  let start = if start_arg.is_undefined() {
    0
  } else {
    let n = vm::to_int32(ecc, start_arg)? as i64;
    clamp_index(if n < 0 { len + n } else { n }, len)
  };
  let end = if end_arg.is_undefined() {
    len
  } else {
    let n = vm::to_int32(ecc, end_arg)? as i64;
    clamp_index(if n < 0 { len + n } else { n }, len)
  };
  let result: String = if start < end { chars[start as usize..end as usize].iter().collect() } else { String::new() };
  Ok(chars_value(ecc, result))
}

fn substring(ecc: &mut Ecc, this: Value, args: &[Value]) -> Result<Value, Throw> {
  let s = this_string(ecc, this)?;
  let chars: Vec<char> = s.chars().collect();
  let len = chars.len() as i64;
  let a = if arg(args, 0).is_undefined() { 0 } else { clamp_index(vm::to_int32(ecc, args[0])? as i64, len) };
  let b = if arg(args, 1).is_undefined() { len } else { clamp_index(vm::to_int32(ecc, args[1])? as i64, len) };
  let (start, end) = if a <= b { (a, b) } else { (b, a) };
  let result: String = chars[start as usize..end as usize].iter().collect();
  Ok(chars_value(ecc, result))
}

fn split(ecc: &mut Ecc, this: Value, args: &[Value]) -> Result<Value, Throw> {
  let s = this_string(ecc, this)?;
  let array_proto = ecc.prototypes.array;
  let handle = ecc.pool.alloc_object(ObjectData::new(Some(array_proto)));
  let sep_value = arg(args, 0);
  let parts: Vec<String> = if sep_value.is_undefined() {
    vec![s]
  } else {
    let sep = vm::to_display_string(ecc, sep_value)?;
    if sep.is_empty() {
      s.chars().map(|c| c.to_string()).collect()
    } else {
      s.split(sep.as_str()).map(|p| p.to_string()).collect()
    }
  };
  for (i, part) in parts.into_iter().enumerate() {
    let v = chars_value(ecc, part);
    ecc.pool.object_mut(handle).add_element(i as u32, v, PropFlags::all()).ok();
  }
  Ok(Value::object(handle))
}

fn to_upper_case(ecc: &mut Ecc, this: Value, _args: &[Value]) -> Result<Value, Throw> {
  let s = this_string(ecc, this)?.to_uppercase();
  Ok(chars_value(ecc, s))
}

fn to_lower_case(ecc: &mut Ecc, this: Value, _args: &[Value]) -> Result<Value, Throw> {
  let s = this_string(ecc, this)?.to_lowercase();
  Ok(chars_value(ecc, s))
}

fn concat(ecc: &mut Ecc, this: Value, args: &[Value]) -> Result<Value, Throw> {
  let mut s = this_string(ecc, this)?;
  for &a in args {
    s.push_str(&vm::to_display_string(ecc, a)?);
  }
  Ok(chars_value(ecc, s))
}

fn trim(ecc: &mut Ecc, this: Value, _args: &[Value]) -> Result<Value, Throw> {
  let s = this_string(ecc, this)?.trim().to_string();
  Ok(chars_value(ecc, s))
}
