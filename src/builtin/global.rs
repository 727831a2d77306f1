//! Free-standing global functions: `parseInt`, `parseFloat`, `isNaN`,
//! `isFinite`, `print`, `eval` (§2 Built-ins row, `SPEC_FULL.md`
//! "Supplemented features").

use crate::ecc::Ecc;
use crate::throw::Throw;
use crate::value::Value;
use crate::vm;

use super::{arg, native};

pub fn install(ecc: &mut Ecc) {
  ecc.add_native("parseInt", 2, native(parse_int));
  ecc.add_native("parseFloat", 1, native(parse_float));
  ecc.add_native("isNaN", 1, native(is_nan));
  ecc.add_native("isFinite", 1, native(is_finite));
  ecc.add_native("print", 0, native(print));
  ecc.add_native("eval", 1, native(eval));
}

fn parse_int(ecc: &mut Ecc, _this: Value, args: &[Value]) -> Result<Value, Throw> {
  let text = vm::to_display_string(ecc, arg(args, 0))?;
  let s = text.trim();
  let radix_arg = arg(args, 1);
  let mut radix = if radix_arg.is_undefined() { 0 } else { vm::to_int32(ecc, radix_arg)? };

  let (neg, rest) = match s.strip_prefix('-') {
    Some(r) => (true, r),
    None => (false, s.strip_prefix('+').unwrap_or(s)),
  };
  let rest = if radix == 16 || radix == 0 {
    match rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
      Some(hex) => {
        radix = 16;
        hex
      }
      None => rest,
    }
  } else {
    rest
  };
  if radix == 0 {
    radix = 10;
  }
  if !(2..=36).contains(&radix) {
    return Ok(Value::binary(f64::NAN));
  }
  let digits: String = rest.chars().take_while(|c| c.is_digit(radix as u32)).collect();
  if digits.is_empty() {
    return Ok(Value::binary(f64::NAN));
  }
  let value = i64::from_str_radix(&digits, radix as u32).map(|v| v as f64).unwrap_or(f64::NAN);
  Ok(Value::binary(if neg { -value } else { value }))
}

fn parse_float(ecc: &mut Ecc, _this: Value, args: &[Value]) -> Result<Value, Throw> {
  let text = vm::to_display_string(ecc, arg(args, 0))?;
  let s = text.trim();
  let bytes = s.as_bytes();
  let mut i = 0;
  if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
    i += 1;
  }
  let mut seen_digit = false;
  let mut seen_dot = false;
  while i < bytes.len() {
    match bytes[i] {
      b'0'..=b'9' => {
        seen_digit = true;
        i += 1;
      }
      b'.' if !seen_dot => {
        seen_dot = true;
        i += 1;
      }
      _ => break,
    }
  }
  if !seen_digit {
    return Ok(Value::binary(f64::NAN));
  }
  Ok(Value::binary(s[..i].parse::<f64>().unwrap_or(f64::NAN)))
}

fn is_nan(ecc: &mut Ecc, _this: Value, args: &[Value]) -> Result<Value, Throw> {
  Ok(Value::boolean(vm::to_number(ecc, arg(args, 0))?.is_nan()))
}

fn is_finite(ecc: &mut Ecc, _this: Value, args: &[Value]) -> Result<Value, Throw> {
  Ok(Value::boolean(vm::to_number(ecc, arg(args, 0))?.is_finite()))
}

fn print(ecc: &mut Ecc, _this: Value, args: &[Value]) -> Result<Value, Throw> {
  let mut parts = Vec::with_capacity(args.len());
  for &a in args {
    parts.push(vm::to_display_string(ecc, a)?);
  }
  let line = parts.join(" ");
  ecc.write_output(&line);
  ecc.write_output("\n");
  Ok(Value::undefined())
}

/// `eval` (§4.8 "evalInputWithContext"): indirect-eval only. The
/// engine's native ABI has no way to recover the *caller's* lexical
/// environment from inside a `NativeFn` (a `Context::Frame` always
/// records the global environment for a native call — see
/// `vm::call`), so this always evaluates against the global
/// environment rather than the call site's local scope. Recorded as an
/// accepted simplification in `DESIGN.md`.
fn eval(ecc: &mut Ecc, _this: Value, args: &[Value]) -> Result<Value, Throw> {
  let source = match arg(args, 0) {
    v @ (Value::Text(_) | Value::Chars(_) | Value::Key(_)) => vm::to_display_string(ecc, v)?,
    other => return Ok(other),
  };
  let global = ecc.global;
  ecc.eval_input_with_context(&source, global, Value::undefined())
}
