//! The engine itself (§4.8 "Ecc engine", §6 "Host-embedding surface").
//!
//! The original `Ecc` owns the pool, the global environment, an `Input`
//! registry, and an exception-frame stack of `jmp_buf`s that `jmpEnv`
//! longjmps to. Per the redesign note the exception stack is gone —
//! `Result<_, Throw>` propagation through `vm::exec` replaces it — but
//! everything else here is the same ownership: one `Ecc` is one
//! self-contained runtime, and destroying it (dropping it, in Rust)
//! frees every pooled object at once.

use std::io::{self, Write};

use ecc_diag::Report;

use crate::context::{Context, NativeArgs};
use crate::object::function::{FunctionData, NativeFn};
use crate::object::{ErrorKind, ObjectData, ObjectKind, PropFlags, PropValue};
use crate::pool::{Handle, Marks, Pool};
use crate::value::Value;

use crate::input::Input;
use crate::parser;
use crate::throw::Throw;
use crate::vm;

/// Handles to the engine's built-in prototype objects, installed once at
/// [`Ecc::new`] and rooted explicitly during [`Ecc::garbage_collect`] —
/// nothing in a freshly created engine need reference `array_proto`
/// before the first array literal runs, so without an explicit root it
/// would be reclaimed out from under the next one.
pub struct Prototypes {
  pub object: Handle<ObjectData>,
  pub function: Handle<ObjectData>,
  pub array: Handle<ObjectData>,
  pub string: Handle<ObjectData>,
  pub number: Handle<ObjectData>,
  pub boolean: Handle<ObjectData>,
  pub date: Handle<ObjectData>,
  /// Indexed by [`ErrorKind::index`]; `error[0]` is the root `Error`
  /// prototype, `error[1..]` each inherit from it.
  pub error: [Handle<ObjectData>; ErrorKind::COUNT],
}

/// The embeddable engine (§4.8). Construction bootstraps the prototype
/// chain and global object; running a program, calling a function, and
/// collecting garbage all go through `&mut self` since there is no
/// interior mutability anywhere in the value model.
pub struct Ecc {
  pub pool: Pool,
  pub keys: crate::key::Keys,
  pub context: Context,
  pub global: Handle<ObjectData>,
  pub prototypes: Prototypes,
  /// Every `Input` ever handed to `eval_input`, kept alive for the life
  /// of the engine so a later diagnostic or backtrace can still resolve
  /// spans against it (`findInput`).
  inputs: Vec<Input>,
  out: Box<dyn Write>,
}

impl Ecc {
  /// `Ecc::create` (§4.8): allocate the prototype chain, wire up the
  /// global object, and register the built-in library (§1's "out of
  /// scope... covered only as a registration/dispatch contract",
  /// §SPEC_FULL "Supplemented features").
  pub fn new() -> Self {
    let mut pool = Pool::new();
    let mut keys = crate::key::Keys::new();

    let object_proto = pool.alloc_object(ObjectData::new(None));
    let function_proto = pool.alloc_object(ObjectData::new(Some(object_proto)));
    let array_proto = pool.alloc_object(ObjectData::new(Some(object_proto)));
    let string_proto = pool.alloc_object(ObjectData::new(Some(object_proto)));
    let number_proto = pool.alloc_object(ObjectData::new(Some(object_proto)));
    let boolean_proto = pool.alloc_object(ObjectData::new(Some(object_proto)));
    let date_proto = pool.alloc_object(ObjectData::new(Some(object_proto)));

    let error_root = pool.alloc_object(ObjectData::with_kind(Some(object_proto), ObjectKind::Error(ErrorKind::Error)));
    let name_key = keys.predefined.name;
    pool
      .object_mut(error_root)
      .add_member(name_key, PropValue::Data(Value::key(keys.intern("Error"))), PropFlags::all())
      .ok();

    let mut error_protos = [error_root; ErrorKind::COUNT];
    for kind in [
      ErrorKind::SyntaxError,
      ErrorKind::ReferenceError,
      ErrorKind::TypeError,
      ErrorKind::RangeError,
      ErrorKind::UriError,
    ] {
      let proto = pool.alloc_object(ObjectData::with_kind(Some(error_root), ObjectKind::Error(kind)));
      pool
        .object_mut(proto)
        .add_member(name_key, PropValue::Data(Value::key(keys.intern(kind.name()))), PropFlags::all())
        .ok();
      error_protos[kind.index()] = proto;
    }

    let prototypes = Prototypes {
      object: object_proto,
      function: function_proto,
      array: array_proto,
      string: string_proto,
      number: number_proto,
      boolean: boolean_proto,
      date: date_proto,
      error: error_protos,
    };

    let global = pool.alloc_object(ObjectData::new(Some(object_proto)));

    let mut ecc = Ecc {
      pool,
      keys,
      context: Context::new(),
      global,
      prototypes,
      inputs: Vec::new(),
      out: Box::new(io::stdout()),
    };
    crate::builtin::install(&mut ecc);
    ecc
  }

  /// Redirects builtin output (`print`-family functions) away from
  /// `stdout`, e.g. to a buffer under test.
  pub fn set_output(&mut self, out: Box<dyn Write>) {
    self.out = out;
  }

  pub fn write_output(&mut self, s: &str) {
    let _ = self.out.write_all(s.as_bytes());
  }

  /// `addNative` (§4.8/§6): install a global native function binding.
  pub fn add_native(&mut self, name: &str, argc: u32, f: NativeFn) {
    let key = self.keys.intern(name);
    let function_proto = self.prototypes.function;
    let object = ObjectData::new(Some(function_proto));
    let data = FunctionData::native(object, key, argc, f);
    let handle = self.pool.alloc_function(data);
    self
      .pool
      .object_mut(self.global)
      .add_member(key, PropValue::Data(Value::function(handle)), PropFlags::WRITABLE)
      .ok();
  }

  /// `addValue` (§4.8/§6): install an arbitrary global binding.
  pub fn add_value(&mut self, name: &str, value: Value) {
    let key = self.keys.intern(name);
    self.pool.object_mut(self.global).add_member(key, PropValue::Data(value), PropFlags::WRITABLE).ok();
  }

  /// Constructs a fresh `Error`-kind object with the given message,
  /// matching the shape `throw_value` (`vm.rs`) and every builtin
  /// argument-check error produce: `{kind}.prototype` in the chain, a
  /// writable own `message`.
  pub fn make_error(&mut self, kind: ErrorKind, message: impl Into<String>) -> Value {
    let proto = self.prototypes.error[kind.index()];
    let handle = self.pool.alloc_object(ObjectData::with_kind(Some(proto), ObjectKind::Error(kind)));
    let message_key = self.keys.predefined.message;
    let message_value = {
      let chars = self.pool.alloc_chars(crate::chars::Chars::create_with_bytes(message.into().into_bytes()));
      Value::chars(chars)
    };
    self
      .pool
      .object_mut(handle)
      .add_member(message_key, PropValue::Data(message_value), PropFlags::all())
      .ok();
    Value::object(handle)
  }

  /// `evalInput` (§4.8/§6): lex, parse, execute `source` against the
  /// global environment, returning the exit code the host surface
  /// documents (0 on success, non-zero on an uncaught throw). On an
  /// uncaught throw, a diagnostic is printed to stderr per §6
  /// "Diagnostics" before returning.
  pub fn eval_input(&mut self, name: impl Into<Box<str>>, source: impl Into<Box<[u8]>>) -> i32 {
    let index = self.inputs.len();
    self.inputs.push(Input::from_bytes(name, source));
    match self.run_input(index) {
      Ok(_) => 0,
      Err(thrown) => {
        self.report_uncaught(index, &thrown);
        1
      }
    }
  }

  /// `evalInputWithContext` (§4.8): like `eval_input`, but runs against
  /// a caller-supplied lexical environment rather than the global one —
  /// the `eval()` builtin's entry point.
  pub fn eval_input_with_context(&mut self, source: &str, env: Handle<ObjectData>, this: Value) -> Result<Value, Throw> {
    let index = self.inputs.len();
    self.inputs.push(Input::from_bytes(format!("eval:{index}"), source.as_bytes().to_vec()));
    let template = {
      let input = &mut self.inputs[index];
      parser::parse_program(input, &mut self.keys)
    };
    for &key in &template.locals {
      if self.pool.object(env).get_own_slot(key).is_none() {
        self.pool.object_mut(env).declare_local(key, Value::undefined());
      }
    }
    match vm::run_program_in(self, &template, env, this) {
      Ok(v) => Ok(v),
      Err(t) => Err(t),
    }
  }

  fn run_input(&mut self, index: usize) -> Result<Value, Throw> {
    let template = {
      let input = &mut self.inputs[index];
      parser::parse_program(input, &mut self.keys)
    };
    vm::run_program(self, &template, Value::undefined())
  }

  /// `findInput` (§4.8): the `Input` a `Span` was parsed from, assuming
  /// the span's offsets fall within it. There is exactly one live
  /// program span range at a time in practice (each `eval_input` call
  /// parses into its own `Input`), so this just returns the most recent
  /// one that fits.
  pub fn find_input(&self, span: ecc_span::Span) -> Option<&Input> {
    self.inputs.iter().rev().find(|input| span.end <= input.bytes().len())
  }

  /// `printTextInput` (§4.8): renders the uncaught-throw diagnostic
  /// (§6 "Diagnostics") for the input at `index` to stderr.
  fn report_uncaught(&mut self, index: usize, thrown: &Throw) {
    let (name, message) = self.describe_thrown(thrown.value);
    let input = &self.inputs[index];
    let report = Report::error(name).build(input.as_source(), message, thrown.origin);
    match report.emit_to_string() {
      Ok(s) => eprint!("{s}"),
      Err(_) => eprintln!("{name}: {message}"),
    }
  }

  /// Splits a thrown value into the `(kind name, message)` pair the
  /// diagnostic header needs. Three cases: a genuine `Error`-kind
  /// object (the common case, read its `.name`/`.message`), the
  /// parser's pre-formatted `"Kind: message"` string fallback (see
  /// `parser::syntax_error_throw` — there is no `Pool` access at parse
  /// time to build a real `Error` object), and an arbitrary non-Error
  /// thrown value (`throw 42`), which has no kind name at all.
  fn describe_thrown(&self, value: Value) -> (String, String) {
    if let Value::Object(h) = value {
      if let ObjectKind::Error(kind) = self.pool.object(h).kind {
        let message = self
          .pool
          .object(h)
          .get_own(self.keys.predefined.message)
          .map(|v| format!("{}", crate::value::Display { value: &v, pool: &self.pool, keys: &self.keys }))
          .unwrap_or_default();
        return (kind.name().to_string(), message);
      }
    }
    let rendered = format!("{}", crate::value::Display { value: &value, pool: &self.pool, keys: &self.keys });
    if let Some((kind, message)) = rendered.split_once(": ") {
      if matches!(kind, "Error" | "SyntaxError" | "ReferenceError" | "TypeError" | "RangeError" | "URIError") {
        return (kind.to_string(), message.to_string());
      }
    }
    ("Error".to_string(), rendered)
  }

  /// `fatal` (§4.8): unrecoverable engine-internal error. Only ever hit
  /// by conditions the language itself has no way to trigger (arena
  /// corruption, an `OpKind` the parser never emits reaching `exec`);
  /// anything script-reachable is a `Throw`, not a panic.
  pub fn fatal(&self, message: &str) -> ! {
    panic!("ecc: fatal: {message}")
  }

  /// `garbageCollect` (§4.8/§5): mark the global object, every built-in
  /// prototype, and every live call frame's environment, then sweep.
  /// Returns the `(objects, functions, chars)` triple freed.
  pub fn garbage_collect(&mut self) -> (usize, usize, usize) {
    let mut roots = Marks::default();
    roots.objects.push(self.global);
    roots.objects.push(self.prototypes.object);
    roots.objects.push(self.prototypes.function);
    roots.objects.push(self.prototypes.array);
    roots.objects.push(self.prototypes.string);
    roots.objects.push(self.prototypes.number);
    roots.objects.push(self.prototypes.boolean);
    roots.objects.push(self.prototypes.date);
    for proto in self.prototypes.error {
      roots.objects.push(proto);
    }
    for env in self.context.environments() {
      roots.objects.push(env);
    }
    self.pool.mark_all(roots);
    self.pool.collect_marked()
  }
}

impl Default for Ecc {
  fn default() -> Self {
    Self::new()
  }
}

/// Calls a script or native function value with the given `this`/args,
/// the surface a host embedding uses to invoke a callback it was handed
/// (e.g. a function stored via `add_value` and later read back).
pub fn call_value(ecc: &mut Ecc, callee: Value, this: Value, args: &[Value]) -> Result<Value, Throw> {
  vm::call(ecc, callee, this, args, false, ecc_span::Span::from(0..0))
}

/// Reads `NativeArgs` the way a `NativeFn` would, convenience for
/// builtins that want the assertion helpers without threading a bare
/// `(Value, &[Value])` pair through by hand.
pub fn native_args<'a>(this: Value, values: &'a [Value]) -> NativeArgs<'a> {
  NativeArgs::new(this, values)
}
