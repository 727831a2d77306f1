//! Call-frame bookkeeping and the native-function ABI (§3 "Context",
//! §6 "Native function ABI").
//!
//! The original threads one `Context` per call, parent-linked to form
//! the call stack, carrying the op cursor alongside `this`/environment/
//! diagnostics fields. There is no op cursor here (`vm::exec` recurses
//! directly over the `Op` tree instead of walking a flat array), so
//! [`Frame`] keeps only what survives that redesign: the lexical
//! environment, the receiver, and enough identity to render a
//! backtrace entry if something throws.

use crate::key::Key;
use crate::object::ObjectData;
use crate::pool::Handle;
use crate::throw::BacktraceFrame;
use crate::value::Value;
use ecc_span::Span;

/// One active call. `environment` is this call's own lexical scope
/// object; its prototype chain *is* the scope chain (§4.5 "Environments
/// as objects" — see `vm::call`).
pub struct Frame {
  pub environment: Handle<ObjectData>,
  pub this: Value,
  pub function_name: Key,
  pub call_site: Span,
  pub construct: bool,
}

/// The live call stack. Lives on [`crate::ecc::Ecc`] so native functions
/// (which only ever see `&mut Ecc`) can still observe `this`/argument
/// context through the currently executing [`Frame`] if they need to
/// recurse back into `vm::exec` (e.g. `Array.prototype.forEach`'s
/// callback, `Function.prototype.call`).
pub struct Context {
  frames: Vec<Frame>,
}

impl Context {
  /// §5 "a `maximumCallDepth` bound limits recursion"; mirrors the
  /// teacher's `check-recursion-limit` feature gate rather than always
  /// paying for a depth check.
  pub const MAX_CALL_DEPTH: u32 = 768;

  pub fn new() -> Self {
    Context { frames: Vec::new() }
  }

  pub fn depth(&self) -> u32 {
    self.frames.len() as u32
  }

  #[cfg_attr(not(feature = "check-recursion-limit"), allow(unused_variables))]
  pub fn push(&mut self, frame: Frame) -> Result<(), ()> {
    #[cfg(feature = "check-recursion-limit")]
    if self.frames.len() as u32 >= Self::MAX_CALL_DEPTH {
      return Err(());
    }
    self.frames.push(frame);
    Ok(())
  }

  pub fn pop(&mut self) -> Frame {
    self.frames.pop().expect("call stack underflow")
  }

  /// `None` at the top level, before any script function has been
  /// entered (the implicit program frame executes with its environment
  /// passed directly rather than through `Context`).
  pub fn current(&self) -> Option<&Frame> {
    self.frames.last()
  }

  pub fn current_mut(&mut self) -> Option<&mut Frame> {
    self.frames.last_mut()
  }

  /// Every live call's lexical environment, for `Ecc::garbage_collect`
  /// (§5 "roots = global + live contexts") — a collection forced while
  /// frames are on the stack must not reclaim an environment a pending
  /// call still holds the only other reference to.
  pub fn environments(&self) -> impl Iterator<Item = Handle<ObjectData>> + '_ {
    self.frames.iter().map(|f| f.environment)
  }

  /// Caller-to-callee order, matching `Throw::backtrace` (§4.7).
  pub fn backtrace(&self) -> Vec<BacktraceFrame> {
    self
      .frames
      .iter()
      .map(|f| BacktraceFrame {
        function_name: f.function_name,
        call_site: f.call_site,
      })
      .collect()
  }
}

impl Default for Context {
  fn default() -> Self {
    Self::new()
  }
}

/// Bundles a native function's receiver and argument slice with the ABI
/// helpers of §6: `Context.argument`/`variableArgument`/`argumentCount`/
/// `assertParameterCount`/`assertThisType`/`assertThisMask`. Kept
/// separate from [`Frame`] since a native call never pushes a script
/// [`Frame`] — it receives `this`/args directly as `NativeFn` arguments.
pub struct NativeArgs<'a> {
  pub this: Value,
  pub values: &'a [Value],
}

impl<'a> NativeArgs<'a> {
  pub fn new(this: Value, values: &'a [Value]) -> Self {
    NativeArgs { this, values }
  }

  /// The i-th argument, or `undefined` past the end — arguments are
  /// never an error to over-read, only to be missing.
  pub fn argument(&self, index: usize) -> Value {
    self.values.get(index).copied().unwrap_or(Value::undefined())
  }

  /// Like `argument`, but intended for a variadic tail (e.g.
  /// `Math.max(...)`): same lookup, named separately so call sites read
  /// as "the rest of the arguments from here" rather than "a single
  /// fixed parameter".
  pub fn variable_argument(&self, index: usize) -> Value {
    self.argument(index)
  }

  pub fn argument_count(&self) -> usize {
    self.values.len()
  }

  pub fn rest(&self, from: usize) -> &[Value] {
    if from >= self.values.len() {
      &[]
    } else {
      &self.values[from..]
    }
  }
}
