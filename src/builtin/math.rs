//! The `Math` namespace object (§2 Built-ins row, `SPEC_FULL.md`
//! "Supplemented features"). Not a constructor — a plain object of
//! constants and native functions, same shape as `JSON`.

use crate::ecc::Ecc;
use crate::object::ObjectData;
use crate::throw::Throw;
use crate::value::Value;
use crate::vm;

use super::{arg, define_method, define_value, native};

pub fn install(ecc: &mut Ecc) {
  let proto = ecc.prototypes.object;
  let handle = ecc.pool.alloc_object(ObjectData::new(Some(proto)));

  define_value(ecc, handle, "PI", Value::binary(std::f64::consts::PI));
  define_value(ecc, handle, "E", Value::binary(std::f64::consts::E));
  define_value(ecc, handle, "LN2", Value::binary(std::f64::consts::LN_2));
  define_value(ecc, handle, "LN10", Value::binary(std::f64::consts::LN_10));
  define_value(ecc, handle, "SQRT2", Value::binary(std::f64::consts::SQRT_2));

  define_method(ecc, handle, "abs", 1, native(|ecc, _t, a| unary(ecc, a, f64::abs)));
  define_method(ecc, handle, "floor", 1, native(|ecc, _t, a| unary(ecc, a, f64::floor)));
  define_method(ecc, handle, "ceil", 1, native(|ecc, _t, a| unary(ecc, a, f64::ceil)));
  define_method(ecc, handle, "round", 1, native(|ecc, _t, a| unary(ecc, a, |n| (n + 0.5).floor())));
  define_method(ecc, handle, "trunc", 1, native(|ecc, _t, a| unary(ecc, a, f64::trunc)));
  define_method(ecc, handle, "sqrt", 1, native(|ecc, _t, a| unary(ecc, a, f64::sqrt)));
  define_method(ecc, handle, "sin", 1, native(|ecc, _t, a| unary(ecc, a, f64::sin)));
  define_method(ecc, handle, "cos", 1, native(|ecc, _t, a| unary(ecc, a, f64::cos)));
  define_method(ecc, handle, "tan", 1, native(|ecc, _t, a| unary(ecc, a, f64::tan)));
  define_method(ecc, handle, "log", 1, native(|ecc, _t, a| unary(ecc, a, f64::ln)));
  define_method(ecc, handle, "exp", 1, native(|ecc, _t, a| unary(ecc, a, f64::exp)));
  define_method(ecc, handle, "pow", 2, native(pow));
  define_method(ecc, handle, "max", 2, native(max));
  define_method(ecc, handle, "min", 2, native(min));
  define_method(ecc, handle, "random", 0, native(random));

  let global = ecc.global;
  super::define_value(ecc, global, "Math", Value::object(handle));
}

fn unary(ecc: &mut Ecc, args: &[Value], f: impl Fn(f64) -> f64) -> Result<Value, Throw> {
  let n = vm::to_number(ecc, arg(args, 0))?;
  Ok(Value::binary(f(n)))
}

fn pow(ecc: &mut Ecc, _this: Value, args: &[Value]) -> Result<Value, Throw> {
  let base = vm::to_number(ecc, arg(args, 0))?;
  let exp = vm::to_number(ecc, arg(args, 1))?;
  Ok(Value::binary(base.powf(exp)))
}

fn max(ecc: &mut Ecc, _this: Value, args: &[Value]) -> Result<Value, Throw> {
  let mut m = f64::NEG_INFINITY;
  for &a in args {
    let n = vm::to_number(ecc, a)?;
    if n.is_nan() {
      return Ok(Value::binary(f64::NAN));
    }
    m = m.max(n);
  }
  Ok(Value::binary(m))
}

fn min(ecc: &mut Ecc, _this: Value, args: &[Value]) -> Result<Value, Throw> {
  let mut m = f64::INFINITY;
  for &a in args {
    let n = vm::to_number(ecc, a)?;
    if n.is_nan() {
      return Ok(Value::binary(f64::NAN));
    }
    m = m.min(n);
  }
  Ok(Value::binary(m))
}

/// Seeded from the pool's allocation counter rather than a true entropy
/// source, since this engine carries no RNG dependency in its stack —
/// good enough for scripts that just want "some" jitter, not for
/// anything security sensitive.
fn random(ecc: &mut Ecc, _this: Value, _args: &[Value]) -> Result<Value, Throw> {
  let (objects, functions, chars) = ecc.pool.counts();
  let seed = (objects.wrapping_mul(2654435761) ^ functions.wrapping_mul(40503) ^ chars.wrapping_mul(2246822519)) as u64;
  let x = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
  Ok(Value::binary(((x >> 11) as f64) / ((1u64 << 53) as f64)))
}
