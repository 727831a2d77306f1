//! Function objects (§3 "Function", §4.7 "Calling").
//!
//! A function is an object (it has a prototype chain and can carry its
//! own properties, e.g. a user-assigned `.name`) plus the extra fields
//! needed to invoke it: its captured environment, its code, and the
//! flags the parser worked out while compiling its body.

use std::rc::Rc;

use crate::key::Key;
use crate::object::ObjectData;
use crate::op::FunctionTemplate;
use crate::pool::{Handle, Marks, Trace};
use crate::value::Value;

/// A boxed native function pointer, per the native ABI (§6): takes the
/// engine, the `this` value, and the argument slice, returns either a
/// result value or a thrown value.
pub type NativeFn = std::rc::Rc<
  dyn Fn(&mut crate::ecc::Ecc, Value, &[Value]) -> Result<Value, crate::throw::Throw>,
>;

pub enum FunctionBody {
  /// A function compiled from script source, executed by `vm::exec`
  /// against a fresh call frame. The template is shared (`Rc`) so that
  /// instantiating the same function expression repeatedly (e.g. inside
  /// a loop) doesn't re-clone its compiled body.
  Script {
    template: Rc<FunctionTemplate>,
    /// The lexical environment the closure was created in; `None` for
    /// the implicit top-level function created for a whole program.
    closure: Option<Handle<ObjectData>>,
  },
  /// A host-provided native function, reached through the dispatch
  /// contract in §6 rather than through `vm::exec`.
  Native(NativeFn),
}

pub struct FunctionData {
  pub object: ObjectData,
  pub name: Key,
  pub parameter_count: u32,
  pub body: FunctionBody,
  /// `true` for the synthetic function bound by `Function.prototype.bind`,
  /// whose `this` is fixed regardless of how it is later called.
  pub bound_this: Option<Value>,
  pub strict: bool,
}

impl FunctionData {
  pub fn script(
    object: ObjectData,
    name: Key,
    template: Rc<FunctionTemplate>,
    closure: Option<Handle<ObjectData>>,
  ) -> Self {
    let parameter_count = template.params.len() as u32;
    FunctionData {
      object,
      name,
      parameter_count,
      body: FunctionBody::Script { template, closure },
      bound_this: None,
      strict: false,
    }
  }

  pub fn native(object: ObjectData, name: Key, parameter_count: u32, f: NativeFn) -> Self {
    FunctionData {
      object,
      name,
      parameter_count,
      body: FunctionBody::Native(f),
      bound_this: None,
      strict: false,
    }
  }

  pub fn is_native(&self) -> bool {
    matches!(self.body, FunctionBody::Native(_))
  }

  pub fn needs_arguments(&self) -> bool {
    match &self.body {
      FunctionBody::Script { template, .. } => template.needs_arguments,
      FunctionBody::Native(_) => false,
    }
  }
}

impl Trace for FunctionData {
  fn trace(&self, marks: &mut Marks) {
    self.object.trace(marks);
    if let FunctionBody::Script { closure: Some(env), .. } = &self.body {
      marks.objects.push(*env);
    }
    if let Some(v) = self.bound_this {
      crate::object::trace_value(&v, marks);
    }
  }
}
