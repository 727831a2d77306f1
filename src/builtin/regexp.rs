//! `RegExp` stub (Non-goal: no pattern matching engine). `new RegExp`
//! allocates a plain object carrying the pattern/flags as own
//! properties for introspection; `test`/`exec` throw rather than
//! silently returning a wrong answer.

use crate::ecc::Ecc;
use crate::object::{ErrorKind, PropFlags, PropValue};
use crate::throw::Throw;
use crate::value::Value;
use crate::vm::{self, throw_value};

use super::{arg, define_constructor, define_method, native};

pub fn install(ecc: &mut Ecc) {
  let proto = ecc.pool.alloc_object(crate::object::ObjectData::new(Some(ecc.prototypes.object)));
  define_method(ecc, proto, "test", 1, native(not_supported));
  define_method(ecc, proto, "exec", 1, native(not_supported));
  define_constructor(ecc, "RegExp", 2, proto, native(construct));
}

fn construct(ecc: &mut Ecc, this: Value, args: &[Value]) -> Result<Value, Throw> {
  let Value::Object(h) = this else {
    return Ok(this);
  };
  let source = vm::to_display_string(ecc, arg(args, 0))?;
  let flags = if arg(args, 1).is_undefined() { String::new() } else { vm::to_display_string(ecc, args[1])? };
  let source_key = ecc.keys.intern("source");
  let flags_key = ecc.keys.intern("flags");
  let source_chars = ecc.pool.alloc_chars(crate::chars::Chars::create_with_bytes(source.into_bytes()));
  let flags_chars = ecc.pool.alloc_chars(crate::chars::Chars::create_with_bytes(flags.into_bytes()));
  ecc.pool.object_mut(h).add_member(source_key, PropValue::Data(Value::chars(source_chars)), PropFlags::empty()).ok();
  ecc.pool.object_mut(h).add_member(flags_key, PropValue::Data(Value::chars(flags_chars)), PropFlags::empty()).ok();
  Ok(this)
}

fn not_supported(ecc: &mut Ecc, _this: Value, _args: &[Value]) -> Result<Value, Throw> {
  Err(throw_value(ecc, ErrorKind::TypeError, "RegExp matching is not implemented", ecc_span::Span::from(0..0)))
}
