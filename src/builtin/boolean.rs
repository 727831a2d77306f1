//! `Boolean` constructor and `Boolean.prototype.{toString,valueOf}`
//! (`SPEC_FULL.md` "Supplemented features").

use crate::ecc::Ecc;
use crate::object::ObjectKind;
use crate::throw::Throw;
use crate::value::Value;

use super::{arg, define_constructor, define_method, native};

pub fn install(ecc: &mut Ecc) {
  let proto = ecc.prototypes.boolean;
  define_method(ecc, proto, "toString", 0, native(to_string));
  define_method(ecc, proto, "valueOf", 0, native(value_of));
  define_constructor(ecc, "Boolean", 1, proto, native(construct));
}

fn this_bool(ecc: &Ecc, this: Value) -> bool {
  match this {
    Value::Object(h) => match &ecc.pool.object(h).kind {
      ObjectKind::Boolean(b) => *b,
      _ => this.truthy(&ecc.pool, &ecc.keys),
    },
    other => other.truthy(&ecc.pool, &ecc.keys),
  }
}

fn construct(ecc: &mut Ecc, this: Value, args: &[Value]) -> Result<Value, Throw> {
  let b = arg(args, 0).truthy(&ecc.pool, &ecc.keys);
  if let Value::Object(h) = this {
    ecc.pool.object_mut(h).kind = ObjectKind::Boolean(b);
    return Ok(this);
  }
  Ok(Value::boolean(b))
}

fn to_string(ecc: &mut Ecc, this: Value, _args: &[Value]) -> Result<Value, Throw> {
  let s = if this_bool(ecc, this) { "true" } else { "false" };
  let handle = ecc.pool.alloc_chars(crate::chars::Chars::create_with_bytes(s.as_bytes().to_vec()));
  Ok(Value::chars(handle))
}

fn value_of(ecc: &mut Ecc, this: Value, _args: &[Value]) -> Result<Value, Throw> {
  Ok(Value::boolean(this_bool(ecc, this)))
}
