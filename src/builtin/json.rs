//! The `JSON` namespace object. `JSON.parse` round-trips through the
//! regular lexer/parser (a JSON value is a subset of an expression);
//! `JSON.stringify` is left unimplemented (§ Open Questions carries it
//! forward as a stub that throws rather than silently dropping the
//! binding) — no serializer crate is in the teacher's stack and
//! bolting on one contradicts "keep the dependency stack aligned".

use crate::ecc::Ecc;
use crate::object::{ErrorKind, ObjectData};
use crate::throw::Throw;
use crate::value::Value;
use crate::vm::{self, throw_value};

use super::native;

pub fn install(ecc: &mut Ecc) {
  let proto = ecc.prototypes.object;
  let handle = ecc.pool.alloc_object(ObjectData::new(Some(proto)));
  super::define_method(ecc, handle, "parse", 1, native(parse));
  super::define_method(ecc, handle, "stringify", 1, native(stringify));
  let global = ecc.global;
  super::define_value(ecc, global, "JSON", Value::object(handle));
}

fn parse(ecc: &mut Ecc, _this: Value, args: &[Value]) -> Result<Value, Throw> {
  let source = vm::to_display_string(ecc, super::arg(args, 0))?;
  let wrapped = format!("({source})");
  let input = crate::input::Input::from_bytes("JSON", wrapped.into_bytes());
  let mut input = input;
  let template = crate::parser::parse_program(&mut input, &mut ecc.keys);
  let global = ecc.global;
  vm::run_program_in(ecc, &template, global, Value::undefined())
}

fn stringify(ecc: &mut Ecc, _this: Value, _args: &[Value]) -> Result<Value, Throw> {
  Err(throw_value(ecc, ErrorKind::TypeError, "JSON.stringify is not implemented", ecc_span::Span::from(0..0)))
}
