//! `Function.prototype.{call,apply,bind,toString}` and the `Function`
//! constructor (§SPEC_FULL "Supplemented features", grounded on
//! `original_source/src/builtin/function.c`). `call`/`apply`/`bind` are
//! thin wrappers over the existing `call`/`construct` op machinery;
//! `bound_this` is already a `FunctionData` field (§3), so `bind` is
//! otherwise dead weight without this module installing it.

use crate::ecc::Ecc;
use crate::object::ObjectData;
use crate::throw::Throw;
use crate::value::Value;
use crate::vm::{self, throw_value};

use super::{arg, define_constructor, define_method, native};

pub fn install(ecc: &mut Ecc) {
  let proto = ecc.prototypes.function;
  define_method(ecc, proto, "call", 1, native(call));
  define_method(ecc, proto, "apply", 2, native(apply));
  define_method(ecc, proto, "bind", 1, native(bind));
  define_method(ecc, proto, "toString", 0, native(to_string));
  define_constructor(ecc, "Function", 0, proto, native(construct));
}

fn call(ecc: &mut Ecc, this: Value, args: &[Value]) -> Result<Value, Throw> {
  let new_this = arg(args, 0);
  let rest = if args.is_empty() { &[][..] } else { &args[1..] };
  vm::call(ecc, this, new_this, rest, false, ecc_span::Span::from(0..0))
}

fn apply(ecc: &mut Ecc, this: Value, args: &[Value]) -> Result<Value, Throw> {
  let new_this = arg(args, 0);
  let array_arg = arg(args, 1);
  let call_args = array_like_to_vec(ecc, array_arg);
  vm::call(ecc, this, new_this, &call_args, false, ecc_span::Span::from(0..0))
}

fn array_like_to_vec(ecc: &Ecc, value: Value) -> Vec<Value> {
  let Some(h) = value.as_object() else {
    return Vec::new();
  };
  let len = ecc.pool.object(h).element_count();
  (0..len).map(|i| ecc.pool.object(h).get_own_element(i).unwrap_or(Value::undefined())).collect()
}

fn bind(ecc: &mut Ecc, this: Value, args: &[Value]) -> Result<Value, Throw> {
  let Some(target) = this.as_function() else {
    return Err(throw_value(ecc, crate::object::ErrorKind::TypeError, "bind called on non-function", ecc_span::Span::from(0..0)));
  };
  let bound_this = arg(args, 0);
  let name = ecc.pool.function(target).name;
  let parameter_count = ecc.pool.function(target).parameter_count;
  let function_proto = ecc.prototypes.function;
  let object = ObjectData::new(Some(function_proto));

  let bound_args: Vec<Value> = if args.len() > 1 { args[1..].to_vec() } else { Vec::new() };
  let inner = move |ecc: &mut Ecc, _this: Value, call_args: &[Value]| -> Result<Value, Throw> {
    let mut full = bound_args.clone();
    full.extend_from_slice(call_args);
    vm::call(ecc, Value::function(target), bound_this, &full, false, ecc_span::Span::from(0..0))
  };
  let data = crate::object::function::FunctionData::native(object, name, parameter_count, std::rc::Rc::new(inner));
  let handle = ecc.pool.alloc_function(data);
  ecc.pool.function_mut(handle).bound_this = Some(bound_this);
  Ok(Value::function(handle))
}

fn to_string(ecc: &mut Ecc, this: Value, _args: &[Value]) -> Result<Value, Throw> {
  let name = this.as_function().map(|h| ecc.pool.function(h).name).unwrap_or(crate::key::Key::NONE);
  let s = format!("function {}() {{ [native code] }}", ecc.keys.resolve(name));
  let handle = ecc.pool.alloc_chars(crate::chars::Chars::create_with_bytes(s.into_bytes()));
  Ok(Value::chars(handle))
}

/// `new Function(...params, body)` (§SPEC_FULL): parses `body` as a
/// fresh function template via `parser::parse_function_body`, closing
/// over nothing (it runs with `ecc.global` as its lexical parent, same
/// as any other top-level code).
fn construct(ecc: &mut Ecc, _this: Value, args: &[Value]) -> Result<Value, Throw> {
  let (body_src, param_src) = match args.split_last() {
    Some((last, rest)) => (vm::to_display_string(ecc, *last)?, rest),
    None => (String::new(), &[][..]),
  };
  let mut params = Vec::with_capacity(param_src.len());
  for &p in param_src {
    params.push(vm::to_display_string(ecc, p)?);
  }
  let source = format!("(function({}) {{ {} }})", params.join(","), body_src);
  let index_name = "Function";
  let input = crate::input::Input::from_bytes(index_name, source.into_bytes());
  let mut input = input;
  let template = match crate::parser::parse_function_body(&mut input, &mut ecc.keys) {
    Ok(t) => t,
    Err(err) => return Err(throw_value(ecc, crate::object::ErrorKind::SyntaxError, err.message.to_string(), err.span)),
  };
  let global = ecc.global;
  Ok(vm::make_closure(ecc, &template, global))
}
