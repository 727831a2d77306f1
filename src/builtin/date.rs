//! `Date` stub (Non-goal: no calendar/timezone support). The
//! constructor and prototype exist so `new Date()` and `typeof Date`
//! don't throw `ReferenceError`, but every method is a placeholder
//! returning `NaN`/an empty string rather than computing a real
//! timestamp.

use crate::ecc::Ecc;
use crate::object::ObjectKind;
use crate::throw::Throw;
use crate::value::Value;

use super::{define_constructor, define_method, native};

pub fn install(ecc: &mut Ecc) {
  let proto = ecc.prototypes.date;
  define_method(ecc, proto, "toString", 0, native(to_string));
  define_method(ecc, proto, "valueOf", 0, native(value_of));
  define_method(ecc, proto, "getTime", 0, native(value_of));
  define_constructor(ecc, "Date", 0, proto, native(construct));
}

fn construct(ecc: &mut Ecc, this: Value, _args: &[Value]) -> Result<Value, Throw> {
  if let Value::Object(h) = this {
    ecc.pool.object_mut(h).kind = ObjectKind::Date(f64::NAN);
    return Ok(this);
  }
  let handle = ecc.pool.alloc_chars(crate::chars::Chars::create_with_bytes(b"".to_vec()));
  Ok(Value::chars(handle))
}

fn to_string(ecc: &mut Ecc, _this: Value, _args: &[Value]) -> Result<Value, Throw> {
  let handle = ecc.pool.alloc_chars(crate::chars::Chars::create_with_bytes(b"Invalid Date".to_vec()));
  Ok(Value::chars(handle))
}

fn value_of(_ecc: &mut Ecc, _this: Value, _args: &[Value]) -> Result<Value, Throw> {
  Ok(Value::binary(f64::NAN))
}
