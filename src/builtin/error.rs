//! `Error` and its five subtype constructors (§7 error taxonomy).
//!
//! The prototype chain itself (`Error.prototype` and the five
//! subtype prototypes hanging off it, each carrying its own `name`) is
//! built once in `Ecc::new`; this module only adds the constructor
//! functions script code calls (`new TypeError("...")`) and
//! `Error.prototype.toString`.

use crate::ecc::Ecc;
use crate::object::{ErrorKind, ObjectData, ObjectKind, PropFlags};
use crate::throw::Throw;
use crate::value::Value;
use crate::vm;

use super::{arg, define_constructor, define_method, native};

pub fn install(ecc: &mut Ecc) {
  let error_proto = ecc.prototypes.error[ErrorKind::Error.index()];
  define_method(ecc, error_proto, "toString", 0, native(to_string));

  for kind in [
    ErrorKind::Error,
    ErrorKind::SyntaxError,
    ErrorKind::ReferenceError,
    ErrorKind::TypeError,
    ErrorKind::RangeError,
    ErrorKind::UriError,
  ] {
    let proto = ecc.prototypes.error[kind.index()];
    define_constructor(ecc, kind.name(), 1, proto, native(move |ecc, this, args| construct(ecc, this, args, kind)));
  }
}

fn construct(ecc: &mut Ecc, this: Value, args: &[Value], kind: ErrorKind) -> Result<Value, Throw> {
  let message_value = arg(args, 0);
  let message = if message_value.is_undefined() {
    String::new()
  } else {
    vm::to_display_string(ecc, message_value)?
  };

  if let Value::Object(h) = this {
    let message_key = ecc.keys.predefined.message;
    let message_chars = ecc.pool.alloc_chars(crate::chars::Chars::create_with_bytes(message.into_bytes()));
    ecc.pool.object_mut(h).kind = ObjectKind::Error(kind);
    ecc
      .pool
      .object_mut(h)
      .add_member(message_key, crate::object::PropValue::Data(Value::chars(message_chars)), PropFlags::all())
      .ok();
    return Ok(this);
  }

  Ok(ecc.make_error(kind, message))
}

fn to_string(ecc: &mut Ecc, this: Value, _args: &[Value]) -> Result<Value, Throw> {
  let s = format!("{}", crate::value::Display { value: &this, pool: &ecc.pool, keys: &ecc.keys });
  let handle = ecc.pool.alloc_chars(crate::chars::Chars::create_with_bytes(s.into_bytes()));
  Ok(Value::chars(handle))
}
