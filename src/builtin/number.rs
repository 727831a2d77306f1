//! `Number` constructor and `Number.prototype.{toString,valueOf,
//! toFixed}` (`SPEC_FULL.md` "Supplemented features").

use crate::ecc::Ecc;
use crate::object::ObjectKind;
use crate::throw::Throw;
use crate::value::Value;
use crate::vm;

use super::{arg, define_constructor, define_method, native};

pub fn install(ecc: &mut Ecc) {
  let proto = ecc.prototypes.number;
  define_method(ecc, proto, "toString", 1, native(to_string));
  define_method(ecc, proto, "valueOf", 0, native(value_of));
  define_method(ecc, proto, "toFixed", 1, native(to_fixed));

  let ctor = define_constructor(ecc, "Number", 1, proto, native(construct));
  define_value_on_ctor(ecc, ctor, "MAX_VALUE", f64::MAX);
  define_value_on_ctor(ecc, ctor, "MIN_VALUE", f64::MIN_POSITIVE);
  define_value_on_ctor(ecc, ctor, "NaN", f64::NAN);
  define_value_on_ctor(ecc, ctor, "POSITIVE_INFINITY", f64::INFINITY);
  define_value_on_ctor(ecc, ctor, "NEGATIVE_INFINITY", f64::NEG_INFINITY);
}

fn define_value_on_ctor(ecc: &mut Ecc, ctor: crate::pool::Handle<crate::object::function::FunctionData>, name: &str, v: f64) {
  let key = ecc.keys.intern(name);
  ecc
    .pool
    .function_mut(ctor)
    .object
    .add_member(key, crate::object::PropValue::Data(Value::binary(v)), crate::object::PropFlags::empty())
    .ok();
}

fn this_number(ecc: &mut Ecc, this: Value) -> Result<f64, Throw> {
  match this {
    Value::Object(h) => {
      if let ObjectKind::Number(n) = &ecc.pool.object(h).kind {
        return Ok(*n);
      }
      vm::to_number(ecc, this)
    }
    other => vm::to_number(ecc, other),
  }
}

fn construct(ecc: &mut Ecc, this: Value, args: &[Value]) -> Result<Value, Throw> {
  let n = if args.is_empty() { 0.0 } else { vm::to_number(ecc, args[0])? };
  if let Value::Object(h) = this {
    ecc.pool.object_mut(h).kind = ObjectKind::Number(n);
    return Ok(this);
  }
  Ok(Value::binary(n))
}

fn to_string(ecc: &mut Ecc, this: Value, args: &[Value]) -> Result<Value, Throw> {
  let n = this_number(ecc, this)?;
  let radix_arg = arg(args, 0);
  let s = if radix_arg.is_undefined() {
    crate::value::format_number(n)
  } else {
    let radix = vm::to_int32(ecc, radix_arg)?;
    if radix == 10 || !(2..=36).contains(&radix) {
      crate::value::format_number(n)
    } else {
      format_radix(n, radix as u32)
    }
  };
  let handle = ecc.pool.alloc_chars(crate::chars::Chars::create_with_bytes(s.into_bytes()));
  Ok(Value::chars(handle))
}

fn format_radix(n: f64, radix: u32) -> String {
  if n.is_nan() {
    return "NaN".to_string();
  }
  let neg = n < 0.0;
  let mut i = n.abs().trunc() as u64;
  if i == 0 {
    return "0".to_string();
  }
  let digits = "0123456789abcdefghijklmnopqrstuvwxyz".as_bytes();
  let mut buf = Vec::new();
  while i > 0 {
    buf.push(digits[(i % radix as u64) as usize]);
    i /= radix as u64;
  }
  if neg {
    buf.push(b'-');
  }
  buf.reverse();
  String::from_utf8(buf).unwrap()
}

fn value_of(ecc: &mut Ecc, this: Value, _args: &[Value]) -> Result<Value, Throw> {
  Ok(Value::binary(this_number(ecc, this)?))
}

fn to_fixed(ecc: &mut Ecc, this: Value, args: &[Value]) -> Result<Value, Throw> {
  let n = this_number(ecc, this)?;
  let digits_arg = arg(args, 0);
  let digits = if digits_arg.is_undefined() { 0 } else { vm::to_int32(ecc, digits_arg)?.clamp(0, 20) };
  let s = format!("{:.*}", digits as usize, n);
  let handle = ecc.pool.alloc_chars(crate::chars::Chars::create_with_bytes(s.into_bytes()));
  Ok(Value::chars(handle))
}

