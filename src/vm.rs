//! The tree-walking evaluator (§4.6 "Op dispatch (VM)", §4.7 "breaker").
//!
//! The original dispatches by recursing through op handlers that each
//! pull their own operands off a flat array via `nextOp()`; control flow
//! (`return`/`break`/`continue`) is signaled with a sentinel `breaker`
//! value threaded back up through those same return values, and
//! exceptions unwind with `setjmp`/`longjmp`. Per the design notes this
//! keeps the same shape — `exec` recurses directly over the [`Op`] tree
//! now instead of a flat array — but replaces the two non-local-exit
//! mechanisms with what they actually are: `Result<_, Throw>` for
//! exceptions, and a `Flow` enum for break/continue/return.
//!
//! A statement op is executed with [`exec_stmt`], returning `Flow`; an
//! expression op is executed with [`exec_expr`], returning a plain
//! `Value`. `Flow::Break`/`Flow::Continue` carry an optional label
//! rather than the original's unwind-count integer, since a label is
//! the natural vocabulary once there's an actual tree to match it
//! against instead of a flat index space.

use std::rc::Rc;

use ecc_span::Span;

use crate::context::Frame;
use crate::ecc::Ecc;
use crate::key::Key;
use crate::object::function::{FunctionBody, FunctionData};
use crate::object::{ErrorKind, ObjectData, ObjectKind, PropFlags, PropValue};
use crate::op::{FunctionTemplate, IterInfo, LoopVar, Op, OpExtra, OpKind};
use crate::pool::Handle;
use crate::throw::Throw;
use crate::value::{format_number, Value};

/// Outcome of executing a statement: either a plain fall-through value
/// (only meaningful for expression-statements; statements proper ignore
/// it), or one of the three non-local exits §4.7 names.
pub enum Flow {
  Normal(Value),
  Return(Value),
  /// `None` targets the nearest enclosing loop/switch; `Some(label)`
  /// targets the statement wearing that label.
  Break(Option<Key>),
  Continue(Option<Key>),
}

pub type EvalResult = Result<Value, Throw>;
pub type FlowResult = Result<Flow, Throw>;

/// Builds a `Throw` for `kind`/`message` the same way every VM-internal
/// failure does (error object + current backtrace). Exposed so builtins
/// can raise ABI-standard errors (§6 "it throws by constructing an
/// Error") without duplicating the backtrace-capture dance.
pub fn throw_value(ecc: &mut Ecc, kind: ErrorKind, message: impl Into<String>, span: Span) -> Throw {
  let err = ecc.make_error(kind, message.into());
  let mut t = Throw::new(err, span);
  for frame in ecc.context.backtrace() {
    t.push_frame(frame.function_name, frame.call_site);
  }
  t
}

/// Executes a whole program (or a `Function` constructor body) against
/// the engine's global environment. There is no [`Frame`] pushed for
/// this call — §4.8's "implicit top-level function" runs directly with
/// `environment = ecc.global`, matching `Context::current() == None` at
/// the top level.
pub fn run_program(ecc: &mut Ecc, template: &Rc<FunctionTemplate>, this: Value) -> EvalResult {
  let global = ecc.global;
  run_program_in(ecc, template, global, this)
}

/// Like [`run_program`], but against an arbitrary environment rather
/// than always the global object — backs `Ecc::eval_input_with_context`
/// (the `eval()` builtin's entry point), which must see the locals
/// already declared in its caller's scope.
pub fn run_program_in(ecc: &mut Ecc, template: &Rc<FunctionTemplate>, env: Handle<ObjectData>, this: Value) -> EvalResult {
  for &key in &template.locals {
    if ecc.pool.object(env).get_own_slot(key).is_none() {
      ecc.pool.object_mut(env).declare_local(key, Value::undefined());
    }
  }
  match exec_stmt_list(&template.body, &[], ecc, env, this)? {
    Flow::Normal(v) | Flow::Return(v) => Ok(v),
    Flow::Break(_) | Flow::Continue(_) => Ok(Value::undefined()),
  }
}

/// Instantiates a `Function` op's template into a live closure over the
/// given lexical environment.
pub fn make_closure(ecc: &mut Ecc, template: &Rc<FunctionTemplate>, closure: Handle<ObjectData>) -> Value {
  let object = ObjectData::new(Some(ecc.prototypes.function));
  let data = FunctionData::script(object, template.name, template.clone(), Some(closure));
  let handle = ecc.pool.alloc_function(data);
  let proto_obj = ObjectData::new(Some(ecc.prototypes.object));
  let proto = ecc.pool.alloc_object(proto_obj);
  ecc
    .pool
    .object_mut(proto)
    .add_member(ecc.keys.predefined.constructor, PropValue::Data(Value::function(handle)), PropFlags::WRITABLE)
    .ok();
  let function_mut = &mut ecc.pool.function_mut(handle).object;
  function_mut
    .add_member(ecc.keys.predefined.prototype, PropValue::Data(Value::object(proto)), PropFlags::WRITABLE)
    .ok();
  Value::function(handle)
}

/// Calls any callable `Value` (script or native), per §6's native ABI
/// and §4.6's `call`/`construct` op family. `construct` allocates the
/// new instance and arranges for it to be returned unless the body
/// itself returns an object (§4.6 "construct").
pub fn call(ecc: &mut Ecc, callee: Value, this: Value, args: &[Value], construct: bool, call_site: Span) -> EvalResult {
  let Some(handle) = callee.as_function() else {
    return Err(throw_value(ecc, ErrorKind::TypeError, "value is not a function", call_site));
  };

  let func = ecc.pool.function(handle);
  let name = func.name;
  let bound_this = func.bound_this;

  let (receiver, new_instance) = if construct {
    let proto = ecc
      .pool
      .object(ecc.pool.function(handle).object.prototype.unwrap_or(ecc.prototypes.object))
      .get_own(ecc.keys.predefined.prototype)
      .and_then(|v| v.as_object())
      .unwrap_or(ecc.prototypes.object);
    let instance = ecc.pool.alloc_object(ObjectData::new(Some(proto)));
    (Value::object(instance), Some(instance))
  } else {
    (bound_this.unwrap_or(this), None)
  };

  if ecc
    .context
    .push(Frame {
      environment: ecc.global,
      this: receiver,
      function_name: name,
      call_site,
      construct,
    })
    .is_err()
  {
    return Err(throw_value(ecc, ErrorKind::RangeError, "maximum call stack size exceeded", call_site));
  }

  let body_result = match &ecc.pool.function(handle).body {
    FunctionBody::Native(f) => {
      let f = f.clone();
      f(ecc, receiver, args)
    }
    FunctionBody::Script { template, closure } => {
      let template = template.clone();
      let closure = *closure;
      call_script(ecc, &template, closure, receiver, args)
    }
  };

  ecc.context.pop();

  let result = body_result.map_err(|mut t| {
    t.push_frame(name, call_site);
    t
  })?;

  if construct {
    Ok(match result {
      Value::Object(_) | Value::Function(_) => result,
      _ => Value::object(new_instance.expect("construct always allocates an instance")),
    })
  } else {
    Ok(result)
  }
}

fn call_script(
  ecc: &mut Ecc,
  template: &Rc<FunctionTemplate>,
  closure: Option<Handle<ObjectData>>,
  this: Value,
  args: &[Value],
) -> EvalResult {
  let env = ecc.pool.alloc_object(ObjectData::new(closure));
  for (i, &key) in template.locals.iter().enumerate() {
    let value = if i < template.params.len() {
      args.get(i).copied().unwrap_or(Value::undefined())
    } else {
      Value::undefined()
    };
    ecc.pool.object_mut(env).declare_local(key, value);
  }
  if template.needs_arguments {
    let arguments = crate::builtin::arguments::create(ecc, args);
    ecc
      .pool
      .object_mut(env)
      .add_member(ecc.keys.predefined.arguments, PropValue::Data(arguments), PropFlags::WRITABLE)
      .ok();
  }
  match exec_stmt_list(&template.body, &[], ecc, env, this)? {
    Flow::Normal(_) | Flow::Break(_) | Flow::Continue(_) => Ok(Value::undefined()),
    Flow::Return(v) => Ok(v),
  }
}

fn environment_at_depth(ecc: &Ecc, env: Handle<ObjectData>, depth: u32) -> Handle<ObjectData> {
  let mut cur = env;
  for _ in 0..depth {
    match ecc.pool.object(cur).prototype {
      Some(parent) => cur = parent,
      None => break,
    }
  }
  cur
}

/// Dynamic by-name lookup up the scope chain (§4.6 "Scope" family,
/// `GetLocal`). Unqualified references that resolve to nothing anywhere
/// in the chain — including past the global environment — are a
/// `ReferenceError`, per §7.
fn lookup_scope(ecc: &Ecc, env: Handle<ObjectData>, key: Key) -> Option<Handle<ObjectData>> {
  let mut cur = Some(env);
  while let Some(h) = cur {
    if ecc.pool.object(h).get_own_slot(key).is_some() {
      return Some(h);
    }
    cur = ecc.pool.object(h).prototype;
  }
  None
}

/// Runs each statement in order, threading the last normal completion
/// value through (§4.8 "primitiveResult" / eval's completion value) —
/// `var x; x + 1;` completes with `x + 1`'s value, not `undefined`,
/// matching what a top-level program or `eval()` call is expected to
/// hand back to its caller.
fn exec_stmt_list(ops: &[Op], labels: &[Key], ecc: &mut Ecc, env: Handle<ObjectData>, this: Value) -> FlowResult {
  let mut last = Value::undefined();
  for op in ops {
    match exec_stmt(op, labels, ecc, env, this)? {
      Flow::Normal(v) => last = v,
      other => return Ok(other),
    }
  }
  Ok(Flow::Normal(last))
}

fn exec_stmt(op: &Op, labels: &[Key], ecc: &mut Ecc, env: Handle<ObjectData>, this: Value) -> FlowResult {
  match op.kind {
    OpKind::Block => exec_stmt_list(&op.children, &[], ecc, env, this),
    OpKind::Expression => {
      let v = exec_expr(&op.children[0], ecc, env, this)?;
      Ok(Flow::Normal(v))
    }
    OpKind::Empty | OpKind::Debugger => Ok(Flow::Normal(Value::undefined())),
    OpKind::Function => {
      exec_expr(op, ecc, env, this)?;
      Ok(Flow::Normal(Value::undefined()))
    }
    OpKind::If => {
      let test = exec_expr(&op.children[0], ecc, env, this)?;
      if test.truthy(&ecc.pool, &ecc.keys) {
        exec_stmt(&op.children[1], &[], ecc, env, this)
      } else if let Some(alt) = op.children.get(2) {
        exec_stmt(alt, &[], ecc, env, this)
      } else {
        Ok(Flow::Normal(Value::undefined()))
      }
    }
    OpKind::While => exec_while(op, labels, ecc, env, this),
    OpKind::DoWhile => exec_do_while(op, labels, ecc, env, this),
    OpKind::For => exec_for(op, labels, ecc, env, this),
    OpKind::ForIn => exec_for_in(op, labels, ecc, env, this),
    OpKind::IterateLessRef | OpKind::IterateMoreRef | OpKind::IterateLessOrEqualRef | OpKind::IterateMoreOrEqualRef => {
      exec_iterate_fused(op, labels, ecc, env, this)
    }
    OpKind::IterateInRef => exec_iterate_in(op, labels, ecc, env, this),
    OpKind::Break => Ok(Flow::Break(label_of(op))),
    OpKind::Continue => Ok(Flow::Continue(label_of(op))),
    OpKind::Return => {
      let value = match op.children.first() {
        Some(v) => exec_expr(v, ecc, env, this)?,
        None => Value::undefined(),
      };
      Ok(Flow::Return(value))
    }
    OpKind::Throw => {
      let value = exec_expr(&op.children[0], ecc, env, this)?;
      let mut t = Throw::new(value, op.text);
      for frame in ecc.context.backtrace() {
        t.push_frame(frame.function_name, frame.call_site);
      }
      Err(t)
    }
    OpKind::Try => exec_try(op, ecc, env, this),
    OpKind::Switch => exec_switch(op, labels, ecc, env, this),
    OpKind::Labeled => {
      let label = match op.value {
        Value::Key(k) => k,
        _ => Key::NONE,
      };
      let mut own = vec![label];
      own.extend_from_slice(labels);
      match exec_stmt(&op.children[0], &own, ecc, env, this)? {
        Flow::Break(Some(l)) if l == label => Ok(Flow::Normal(Value::undefined())),
        other => Ok(other),
      }
    }
    _ => {
      let v = exec_expr(op, ecc, env, this)?;
      Ok(Flow::Normal(v))
    }
  }
}

fn label_of(op: &Op) -> Option<Key> {
  match op.value {
    Value::Key(k) if !k.is_none() => Some(k),
    _ => None,
  }
}

fn matches_loop(labels: &[Key], target: Option<Key>) -> bool {
  match target {
    None => true,
    Some(l) => labels.contains(&l),
  }
}

fn exec_while(op: &Op, labels: &[Key], ecc: &mut Ecc, env: Handle<ObjectData>, this: Value) -> FlowResult {
  loop {
    let test = exec_expr(&op.children[0], ecc, env, this)?;
    if !test.truthy(&ecc.pool, &ecc.keys) {
      return Ok(Flow::Normal(Value::undefined()));
    }
    match exec_stmt(&op.children[1], &[], ecc, env, this)? {
      Flow::Normal(_) | Flow::Continue(None) => {}
      Flow::Continue(Some(l)) if labels.contains(&l) => {}
      Flow::Break(Some(l)) if labels.contains(&l) => return Ok(Flow::Normal(Value::undefined())),
      Flow::Break(None) => return Ok(Flow::Normal(Value::undefined())),
      other => return Ok(other),
    }
  }
}

fn exec_do_while(op: &Op, labels: &[Key], ecc: &mut Ecc, env: Handle<ObjectData>, this: Value) -> FlowResult {
  loop {
    match exec_stmt(&op.children[0], &[], ecc, env, this)? {
      Flow::Normal(_) | Flow::Continue(None) => {}
      Flow::Continue(Some(l)) if labels.contains(&l) => {}
      Flow::Break(Some(l)) if labels.contains(&l) => return Ok(Flow::Normal(Value::undefined())),
      Flow::Break(None) => return Ok(Flow::Normal(Value::undefined())),
      other => return Ok(other),
    }
    let test = exec_expr(&op.children[1], ecc, env, this)?;
    if !test.truthy(&ecc.pool, &ecc.keys) {
      return Ok(Flow::Normal(Value::undefined()));
    }
  }
}

fn exec_for(op: &Op, labels: &[Key], ecc: &mut Ecc, env: Handle<ObjectData>, this: Value) -> FlowResult {
  exec_stmt(&op.children[0], &[], ecc, env, this)?;
  loop {
    let test = exec_expr(&op.children[1], ecc, env, this)?;
    if !test.truthy(&ecc.pool, &ecc.keys) {
      return Ok(Flow::Normal(Value::undefined()));
    }
    match exec_stmt(&op.children[3], &[], ecc, env, this)? {
      Flow::Normal(_) | Flow::Continue(None) => {}
      Flow::Continue(Some(l)) if labels.contains(&l) => {}
      Flow::Break(Some(l)) if labels.contains(&l) => return Ok(Flow::Normal(Value::undefined())),
      Flow::Break(None) => return Ok(Flow::Normal(Value::undefined())),
      other => return Ok(other),
    }
    exec_stmt(&op.children[2], &[], ecc, env, this)?;
  }
}

fn own_enumerable_keys_of_value(ecc: &Ecc, value: Value) -> Vec<String> {
  match value.as_object() {
    Some(h) => {
      let mut keys = Vec::new();
      let mut cur = Some(h);
      let mut seen = std::collections::HashSet::new();
      while let Some(obj) = cur {
        for k in ecc.pool.object(obj).own_enumerable_keys(&ecc.keys) {
          if seen.insert(k.clone()) {
            keys.push(k);
          }
        }
        cur = ecc.pool.object(obj).prototype;
      }
      keys
    }
    None => Vec::new(),
  }
}

fn assign_loop_var(ecc: &mut Ecc, env: Handle<ObjectData>, var: &LoopVar, value: Value) {
  match *var {
    LoopVar::Local(key) => {
      let target = lookup_scope(ecc, env, key).unwrap_or(ecc.global);
      ecc.pool.object_mut(target).add_member(key, PropValue::Data(value), PropFlags::WRITABLE).ok();
    }
    LoopVar::LocalSlot(index) => ecc.pool.object_mut(env).set_slot_value(index, value),
    LoopVar::ParentSlot { depth, index } => {
      let target = environment_at_depth(ecc, env, depth);
      ecc.pool.object_mut(target).set_slot_value(index, value);
    }
  }
}

fn exec_for_in(op: &Op, labels: &[Key], ecc: &mut Ecc, env: Handle<ObjectData>, this: Value) -> FlowResult {
  let target = if op.children[0].kind == OpKind::Block {
    exec_stmt(&op.children[0], &[], ecc, env, this)?;
    Value::undefined()
  } else {
    exec_expr(&op.children[0], ecc, env, this)?
  };
  let object = exec_expr(&op.children[1], ecc, env, this)?;
  let object_for_keys = if op.children[0].kind == OpKind::Block { object } else { target };
  let var = for_in_target_var(&op.children[0]);
  let keys = own_enumerable_keys_of_value(ecc, object_for_keys);
  for name in keys {
    let key = ecc.keys.intern(&name);
    assign_loop_var(ecc, env, &var, Value::key(key));
    match exec_stmt(&op.children[2], &[], ecc, env, this)? {
      Flow::Normal(_) | Flow::Continue(None) => {}
      Flow::Continue(Some(l)) if labels.contains(&l) => {}
      Flow::Break(Some(l)) if labels.contains(&l) => return Ok(Flow::Normal(Value::undefined())),
      Flow::Break(None) => return Ok(Flow::Normal(Value::undefined())),
      other => return Ok(other),
    }
  }
  Ok(Flow::Normal(Value::undefined()))
}

fn for_in_target_var(op: &Op) -> LoopVar {
  match op.kind {
    OpKind::GetLocalSlot => LoopVar::LocalSlot(op.pair),
    OpKind::GetParentSlot => {
      let (depth, index) = crate::op::parent_slot_parts(op.pair);
      LoopVar::ParentSlot { depth, index }
    }
    OpKind::GetLocal => match op.value {
      Value::Key(k) => LoopVar::Local(k),
      _ => LoopVar::Local(Key::NONE),
    },
    OpKind::Block => op.children.last().map(for_in_target_var).unwrap_or(LoopVar::Local(Key::NONE)),
    OpKind::AssignRef => for_in_target_var(&op.children[0]),
    _ => LoopVar::Local(Key::NONE),
  }
}

/// §4.5 "peephole loop fusion": the fused counted-loop ops. `bound` is
/// re-evaluated every iteration rather than cached once (see
/// [`IterInfo::bound`]'s doc comment).
fn exec_iterate_fused(op: &Op, labels: &[Key], ecc: &mut Ecc, env: Handle<ObjectData>, this: Value) -> FlowResult {
  let info = match &op.extra {
    Some(extra) => match extra.as_ref() {
      OpExtra::Iter(i) => i.as_ref(),
      _ => unreachable!("IterateXRef always carries OpExtra::Iter"),
    },
    None => unreachable!("IterateXRef always carries OpExtra::Iter"),
  };
  loop {
    let current = read_loop_var(ecc, env, &info.var);
    let bound = exec_expr(&info.bound, ecc, env, this)?;
    let current_n = to_number(ecc, current)?;
    let bound_n = to_number(ecc, bound)?;
    let continue_loop = match op.kind {
      OpKind::IterateLessRef => current_n < bound_n,
      OpKind::IterateLessOrEqualRef => current_n <= bound_n,
      OpKind::IterateMoreRef => current_n > bound_n,
      OpKind::IterateMoreOrEqualRef => current_n >= bound_n,
      _ => unreachable!(),
    };
    if !continue_loop {
      return Ok(Flow::Normal(Value::undefined()));
    }
    match exec_stmt(&info.body, &[], ecc, env, this)? {
      Flow::Normal(_) | Flow::Continue(None) => {}
      Flow::Continue(Some(l)) if labels.contains(&l) => {}
      Flow::Break(Some(l)) if labels.contains(&l) => return Ok(Flow::Normal(Value::undefined())),
      Flow::Break(None) => return Ok(Flow::Normal(Value::undefined())),
      other => return Ok(other),
    }
    let stepped = current_n + info.step as f64;
    assign_loop_var(ecc, env, &info.var, numeric_value(stepped));
  }
}

fn exec_iterate_in(op: &Op, labels: &[Key], ecc: &mut Ecc, env: Handle<ObjectData>, this: Value) -> FlowResult {
  let info = match &op.extra {
    Some(extra) => match extra.as_ref() {
      OpExtra::Iter(i) => i.as_ref(),
      _ => unreachable!("IterateInRef always carries OpExtra::Iter"),
    },
    None => unreachable!("IterateInRef always carries OpExtra::Iter"),
  };
  let object = exec_expr(&info.bound, ecc, env, this)?;
  let keys = own_enumerable_keys_of_value(ecc, object);
  for name in keys {
    let key = ecc.keys.intern(&name);
    assign_loop_var(ecc, env, &info.var, Value::key(key));
    match exec_stmt(&info.body, &[], ecc, env, this)? {
      Flow::Normal(_) | Flow::Continue(None) => {}
      Flow::Continue(Some(l)) if labels.contains(&l) => {}
      Flow::Break(Some(l)) if labels.contains(&l) => return Ok(Flow::Normal(Value::undefined())),
      Flow::Break(None) => return Ok(Flow::Normal(Value::undefined())),
      other => return Ok(other),
    }
  }
  Ok(Flow::Normal(Value::undefined()))
}

fn read_loop_var(ecc: &Ecc, env: Handle<ObjectData>, var: &LoopVar) -> Value {
  match *var {
    LoopVar::Local(key) => lookup_scope(ecc, env, key).and_then(|h| ecc.pool.object(h).get_own(key)).unwrap_or(Value::undefined()),
    LoopVar::LocalSlot(index) => ecc.pool.object(env).slot_value(index).unwrap_or(Value::undefined()),
    LoopVar::ParentSlot { depth, index } => {
      let target = environment_at_depth(ecc, env, depth);
      ecc.pool.object(target).slot_value(index).unwrap_or(Value::undefined())
    }
  }
}

fn numeric_value(n: f64) -> Value {
  if n.fract() == 0.0 && n.abs() < i32::MAX as f64 {
    Value::integer(n as i32)
  } else {
    Value::binary(n)
  }
}

fn exec_switch(op: &Op, labels: &[Key], ecc: &mut Ecc, env: Handle<ObjectData>, this: Value) -> FlowResult {
  let info = match op.extra.as_deref() {
    Some(OpExtra::Switch(s)) => s,
    _ => unreachable!("Switch always carries OpExtra::Switch"),
  };
  let discriminant = exec_expr(&info.discriminant, ecc, env, this)?;

  let mut matched = None;
  for (i, case) in info.cases.iter().enumerate() {
    if let Some(test) = &case.test {
      let test_value = exec_expr(test, ecc, env, this)?;
      if strict_equals(ecc, discriminant, test_value) {
        matched = Some(i);
        break;
      }
    }
  }
  let start = matched.or_else(|| info.cases.iter().position(|c| c.test.is_none()));
  let Some(start) = start else {
    return Ok(Flow::Normal(Value::undefined()));
  };

  for case in &info.cases[start..] {
    match exec_stmt_list(&case.body, &[], ecc, env, this)? {
      Flow::Normal(_) => {}
      Flow::Break(Some(l)) if labels.contains(&l) => return Ok(Flow::Normal(Value::undefined())),
      Flow::Break(None) => return Ok(Flow::Normal(Value::undefined())),
      other => return Ok(other),
    }
  }
  Ok(Flow::Normal(Value::undefined()))
}

/// §7 `try`/`catch`/`finally`: the protected region's outcome — a
/// normal `Flow`, or a `Throw` — is captured first, then `finally` runs
/// unconditionally, and a non-local exit from `finally` itself
/// supersedes whatever the protected region produced (§8 "Breaker
/// propagation").
fn exec_try(op: &Op, ecc: &mut Ecc, env: Handle<ObjectData>, this: Value) -> FlowResult {
  let info = match op.extra.as_deref() {
    Some(OpExtra::Try(t)) => t,
    _ => unreachable!("Try always carries OpExtra::Try"),
  };

  let block_result = exec_stmt_list(&info.block, &[], ecc, env, this);

  let after_catch = match block_result {
    Err(thrown) => {
      if let (Some(param), Some(catch_block)) = (info.catch_param, &info.catch_block) {
        let catch_env = ecc.pool.alloc_object(ObjectData::new(Some(env)));
        ecc.pool.object_mut(catch_env).declare_local(param, thrown.value);
        exec_stmt_list(catch_block, &[], ecc, catch_env, this)
      } else {
        Err(thrown)
      }
    }
    ok => ok,
  };

  match &info.finally_block {
    None => after_catch,
    Some(finally_block) => match exec_stmt_list(finally_block, &[], ecc, env, this)? {
      Flow::Normal(_) => after_catch,
      other => Ok(other),
    },
  }
}

// --- expressions ---

pub fn exec_expr(op: &Op, ecc: &mut Ecc, env: Handle<ObjectData>, this: Value) -> EvalResult {
  match op.kind {
    OpKind::Value => Ok(op.value),
    OpKind::This => Ok(this),
    OpKind::Function => {
      let template = match op.extra.as_deref() {
        Some(OpExtra::Function(t)) => t,
        _ => unreachable!("Function op always carries OpExtra::Function"),
      };
      Ok(make_closure(ecc, template, env))
    }
    OpKind::Array => {
      let object = ecc.pool.alloc_object(ObjectData::new(Some(ecc.prototypes.array)));
      for (i, child) in op.children.iter().enumerate() {
        let v = exec_expr(child, ecc, env, this)?;
        ecc.pool.object_mut(object).add_element(i as u32, v, PropFlags::all()).ok();
      }
      Ok(Value::object(object))
    }
    OpKind::Object => {
      let object = ecc.pool.alloc_object(ObjectData::new(Some(ecc.prototypes.object)));
      for prop in &op.children {
        let key = match prop.value {
          Value::Key(k) => k,
          _ => Key::NONE,
        };
        match prop.extra.as_deref() {
          Some(OpExtra::Accessor(is_getter)) => {
            let func = exec_expr(&prop.children[0], ecc, env, this)?;
            let handle = func.as_function();
            let existing = ecc.pool.object(object).get_own_slot(key).map(|s| s.value);
            let merged = match existing {
              Some(PropValue::Accessor { get, set }) => {
                if *is_getter {
                  PropValue::Accessor { get: handle, set }
                } else {
                  PropValue::Accessor { get, set: handle }
                }
              }
              _ if *is_getter => PropValue::Accessor { get: handle, set: None },
              _ => PropValue::Accessor { get: None, set: handle },
            };
            ecc.pool.object_mut(object).add_member(key, merged, PropFlags::all()).ok();
          }
          _ => {
            let v = exec_expr(&prop.children[0], ecc, env, this)?;
            ecc.pool.object_mut(object).add_member(key, PropValue::Data(v), PropFlags::all()).ok();
          }
        }
      }
      Ok(Value::object(object))
    }

    OpKind::GetLocal => {
      let key = match op.value {
        Value::Key(k) => k,
        _ => Key::NONE,
      };
      match lookup_scope(ecc, env, key) {
        Some(h) => Ok(ecc.pool.object(h).get_own(key).unwrap_or(Value::undefined())),
        None => Err(throw_value(ecc, ErrorKind::ReferenceError, format!("{} is not defined", ecc.keys.resolve(key)), op.text)),
      }
    }
    OpKind::GetLocalSlot => Ok(ecc.pool.object(env).slot_value(op.pair).unwrap_or(Value::undefined())),
    OpKind::GetParentSlot => {
      let (depth, index) = crate::op::parent_slot_parts(op.pair);
      let target = environment_at_depth(ecc, env, depth);
      Ok(ecc.pool.object(target).slot_value(index).unwrap_or(Value::undefined()))
    }
    OpKind::SetLocal | OpKind::SetLocalSlot | OpKind::SetParentSlot | OpKind::SetMember | OpKind::SetProperty => {
      unreachable!("assignment is only ever reached through *Ref ops")
    }

    OpKind::GetProperty => {
      let object = exec_expr(&op.children[0], ecc, env, this)?;
      let key = match op.value {
        Value::Key(k) => k,
        _ => Key::NONE,
      };
      get_property(ecc, object, key, op.text)
    }
    OpKind::GetMember => {
      let object = exec_expr(&op.children[0], ecc, env, this)?;
      let index = exec_expr(&op.children[1], ecc, env, this)?;
      get_member(ecc, object, index, op.text)
    }
    OpKind::DeleteProperty => {
      let object = exec_expr(&op.children[0], ecc, env, this)?;
      let key = match op.value {
        Value::Key(k) => k,
        _ => Key::NONE,
      };
      Ok(Value::boolean(delete_property(ecc, object, key)))
    }
    OpKind::DeleteMember => {
      let object = exec_expr(&op.children[0], ecc, env, this)?;
      let index = exec_expr(&op.children[1], ecc, env, this)?;
      Ok(Value::boolean(delete_member(ecc, object, index)))
    }

    OpKind::Call => {
      let callee = exec_expr(&op.children[0], ecc, env, this)?;
      let args = eval_args(&op.children[1..], ecc, env, this)?;
      call(ecc, callee, Value::undefined(), &args, false, op.text)
    }
    OpKind::Construct => {
      let callee = exec_expr(&op.children[0], ecc, env, this)?;
      let args = eval_args(&op.children[1..], ecc, env, this)?;
      call(ecc, callee, Value::undefined(), &args, true, op.text)
    }
    OpKind::CallProperty => {
      let receiver = exec_expr(&op.children[0], ecc, env, this)?;
      let key = match op.value {
        Value::Key(k) => k,
        _ => Key::NONE,
      };
      let callee = get_property(ecc, receiver, key, op.text)?;
      let args = eval_args(&op.children[1..], ecc, env, this)?;
      call(ecc, callee, receiver, &args, false, op.text)
    }
    OpKind::CallMember => {
      let receiver = exec_expr(&op.children[0], ecc, env, this)?;
      let index = exec_expr(&op.children[1], ecc, env, this)?;
      let callee = get_member(ecc, receiver, index, op.text)?;
      let args = eval_args(&op.children[2..], ecc, env, this)?;
      call(ecc, callee, receiver, &args, false, op.text)
    }

    OpKind::TypeOf => {
      let v = exec_expr(&op.children[0], ecc, env, this)?;
      Ok(Value::key(ecc.keys.intern(v.type_name(&ecc.pool))))
    }
    OpKind::Void => {
      exec_expr(&op.children[0], ecc, env, this)?;
      Ok(Value::undefined())
    }

    OpKind::Equal => {
      let (a, b) = eval_pair(&op.children, ecc, env, this)?;
      Ok(Value::boolean(loose_equals(ecc, a, b)?))
    }
    OpKind::NotEqual => {
      let (a, b) = eval_pair(&op.children, ecc, env, this)?;
      Ok(Value::boolean(!loose_equals(ecc, a, b)?))
    }
    OpKind::Identical => {
      let (a, b) = eval_pair(&op.children, ecc, env, this)?;
      Ok(Value::boolean(strict_equals(ecc, a, b)))
    }
    OpKind::NotIdentical => {
      let (a, b) = eval_pair(&op.children, ecc, env, this)?;
      Ok(Value::boolean(!strict_equals(ecc, a, b)))
    }
    OpKind::Less | OpKind::LessOrEqual | OpKind::More | OpKind::MoreOrEqual => {
      let (a, b) = eval_pair(&op.children, ecc, env, this)?;
      relational(ecc, op.kind, a, b)
    }
    OpKind::InstanceOf => {
      let (a, b) = eval_pair(&op.children, ecc, env, this)?;
      instance_of(ecc, a, b, op.text)
    }
    OpKind::In => {
      let (a, b) = eval_pair(&op.children, ecc, env, this)?;
      in_operator(ecc, a, b, op.text)
    }

    OpKind::Add => {
      let (a, b) = eval_pair(&op.children, ecc, env, this)?;
      add(ecc, a, b)
    }
    OpKind::Minus => numeric_binop(op, ecc, env, this, |a, b| a - b),
    OpKind::Multiply => numeric_binop(op, ecc, env, this, |a, b| a * b),
    OpKind::Divide => numeric_binop(op, ecc, env, this, |a, b| a / b),
    OpKind::Modulo => numeric_binop(op, ecc, env, this, |a, b| a % b),

    OpKind::LeftShift => int_binop(op, ecc, env, this, |a, b| a.wrapping_shl(b as u32 & 31)),
    OpKind::RightShift => int_binop(op, ecc, env, this, |a, b| a.wrapping_shr(b as u32 & 31)),
    OpKind::UnsignedRightShift => {
      let (a, b) = eval_pair(&op.children, ecc, env, this)?;
      let a = to_uint32(ecc, a)?;
      let b = to_uint32(ecc, b)?;
      Ok(numeric_value((a.wrapping_shr(b & 31)) as f64))
    }
    OpKind::BitwiseAnd => int_binop(op, ecc, env, this, |a, b| a & b),
    OpKind::BitwiseXor => int_binop(op, ecc, env, this, |a, b| a ^ b),
    OpKind::BitwiseOr => int_binop(op, ecc, env, this, |a, b| a | b),

    OpKind::LogicalAnd => {
      let a = exec_expr(&op.children[0], ecc, env, this)?;
      if !a.truthy(&ecc.pool, &ecc.keys) {
        return Ok(a);
      }
      exec_expr(&op.children[1], ecc, env, this)
    }
    OpKind::LogicalOr => {
      let a = exec_expr(&op.children[0], ecc, env, this)?;
      if a.truthy(&ecc.pool, &ecc.keys) {
        return Ok(a);
      }
      exec_expr(&op.children[1], ecc, env, this)
    }
    OpKind::Comma => {
      exec_expr(&op.children[0], ecc, env, this)?;
      exec_expr(&op.children[1], ecc, env, this)
    }
    OpKind::Not => {
      let v = exec_expr(&op.children[0], ecc, env, this)?;
      Ok(Value::boolean(!v.truthy(&ecc.pool, &ecc.keys)))
    }
    OpKind::Positive => {
      let v = exec_expr(&op.children[0], ecc, env, this)?;
      Ok(numeric_value(to_number(ecc, v)?))
    }
    OpKind::Negative => {
      let v = exec_expr(&op.children[0], ecc, env, this)?;
      Ok(numeric_value(-to_number(ecc, v)?))
    }
    OpKind::Invert => {
      let v = exec_expr(&op.children[0], ecc, env, this)?;
      Ok(numeric_value(!to_int32(ecc, v)? as f64))
    }

    OpKind::If => {
      let test = exec_expr(&op.children[0], ecc, env, this)?;
      if test.truthy(&ecc.pool, &ecc.keys) {
        exec_expr(&op.children[1], ecc, env, this)
      } else {
        exec_expr(&op.children[2], ecc, env, this)
      }
    }

    OpKind::AssignRef => {
      let value = exec_expr(&op.children[1], ecc, env, this)?;
      set_reference(&op.children[0], value, ecc, env, this)?;
      Ok(value)
    }
    OpKind::AddAssignRef
    | OpKind::MinusAssignRef
    | OpKind::MultiplyAssignRef
    | OpKind::DivideAssignRef
    | OpKind::ModuloAssignRef
    | OpKind::LeftShiftAssignRef
    | OpKind::RightShiftAssignRef
    | OpKind::UnsignedRightShiftAssignRef
    | OpKind::BitAndAssignRef
    | OpKind::BitXorAssignRef
    | OpKind::BitOrAssignRef => compound_assign(op, ecc, env, this),

    OpKind::IncrementRef | OpKind::DecrementRef => {
      let current = to_number(ecc, get_reference(&op.children[0], ecc, env, this)?)?;
      let delta = if op.kind == OpKind::IncrementRef { 1.0 } else { -1.0 };
      let next = numeric_value(current + delta);
      set_reference(&op.children[0], next, ecc, env, this)?;
      Ok(next)
    }
    OpKind::PostIncrementRef | OpKind::PostDecrementRef => {
      let current = to_number(ecc, get_reference(&op.children[0], ecc, env, this)?)?;
      let delta = if op.kind == OpKind::PostIncrementRef { 1.0 } else { -1.0 };
      let next = numeric_value(current + delta);
      set_reference(&op.children[0], next, ecc, env, this)?;
      Ok(numeric_value(current))
    }

    _ => unreachable!("{:?} is a statement-only op", op.kind),
  }
}

fn eval_pair(children: &[Op], ecc: &mut Ecc, env: Handle<ObjectData>, this: Value) -> Result<(Value, Value), Throw> {
  let a = exec_expr(&children[0], ecc, env, this)?;
  let b = exec_expr(&children[1], ecc, env, this)?;
  Ok((a, b))
}

fn eval_args(children: &[Op], ecc: &mut Ecc, env: Handle<ObjectData>, this: Value) -> Result<Vec<Value>, Throw> {
  let mut out = Vec::with_capacity(children.len());
  for c in children {
    out.push(exec_expr(c, ecc, env, this)?);
  }
  Ok(out)
}

fn numeric_binop(op: &Op, ecc: &mut Ecc, env: Handle<ObjectData>, this: Value, f: impl Fn(f64, f64) -> f64) -> EvalResult {
  let (a, b) = eval_pair(&op.children, ecc, env, this)?;
  let a = to_number(ecc, a)?;
  let b = to_number(ecc, b)?;
  Ok(numeric_value(f(a, b)))
}

fn int_binop(op: &Op, ecc: &mut Ecc, env: Handle<ObjectData>, this: Value, f: impl Fn(i32, i32) -> i32) -> EvalResult {
  let (a, b) = eval_pair(&op.children, ecc, env, this)?;
  let a = to_int32(ecc, a)?;
  let b = to_int32(ecc, b)?;
  Ok(numeric_value(f(a, b) as f64))
}

/// Reads the current value of a reference-producing op without
/// re-evaluating its receiver twice (used by the increment/compound
/// assignment families, which both read and write the same target).
fn get_reference(op: &Op, ecc: &mut Ecc, env: Handle<ObjectData>, this: Value) -> EvalResult {
  exec_expr(op, ecc, env, this)
}

fn set_reference(op: &Op, value: Value, ecc: &mut Ecc, env: Handle<ObjectData>, this: Value) -> Result<(), Throw> {
  match op.kind {
    OpKind::GetLocal => {
      let key = match op.value {
        Value::Key(k) => k,
        _ => Key::NONE,
      };
      let target = lookup_scope(ecc, env, key).unwrap_or(ecc.global);
      ecc.pool.object_mut(target).add_member(key, PropValue::Data(value), PropFlags::all()).ok();
      Ok(())
    }
    OpKind::GetLocalSlot => {
      ecc.pool.object_mut(env).set_slot_value(op.pair, value);
      Ok(())
    }
    OpKind::GetParentSlot => {
      let (depth, index) = crate::op::parent_slot_parts(op.pair);
      let target = environment_at_depth(ecc, env, depth);
      ecc.pool.object_mut(target).set_slot_value(index, value);
      Ok(())
    }
    OpKind::GetProperty => {
      let object = exec_expr(&op.children[0], ecc, env, this)?;
      let key = match op.value {
        Value::Key(k) => k,
        _ => Key::NONE,
      };
      set_property(ecc, object, key, value, op.text)
    }
    OpKind::GetMember => {
      let object = exec_expr(&op.children[0], ecc, env, this)?;
      let index = exec_expr(&op.children[1], ecc, env, this)?;
      set_member(ecc, object, index, value, op.text)
    }
    _ => unreachable!("parser only ever builds *Ref ops over a reference-shaped child"),
  }
}

fn compound_assign(op: &Op, ecc: &mut Ecc, env: Handle<ObjectData>, this: Value) -> EvalResult {
  let target = &op.children[0];
  let current = get_reference(target, ecc, env, this)?;
  let rhs = exec_expr(&op.children[1], ecc, env, this)?;
  let result = match op.kind {
    OpKind::AddAssignRef => add(ecc, current, rhs)?,
    OpKind::MinusAssignRef => numeric_value(to_number(ecc, current)? - to_number(ecc, rhs)?),
    OpKind::MultiplyAssignRef => numeric_value(to_number(ecc, current)? * to_number(ecc, rhs)?),
    OpKind::DivideAssignRef => numeric_value(to_number(ecc, current)? / to_number(ecc, rhs)?),
    OpKind::ModuloAssignRef => numeric_value(to_number(ecc, current)? % to_number(ecc, rhs)?),
    OpKind::LeftShiftAssignRef => numeric_value(to_int32(ecc, current)?.wrapping_shl(to_int32(ecc, rhs)? as u32 & 31) as f64),
    OpKind::RightShiftAssignRef => numeric_value(to_int32(ecc, current)?.wrapping_shr(to_int32(ecc, rhs)? as u32 & 31) as f64),
    OpKind::UnsignedRightShiftAssignRef => {
      numeric_value((to_uint32(ecc, current)?.wrapping_shr(to_uint32(ecc, rhs)? & 31)) as f64)
    }
    OpKind::BitAndAssignRef => numeric_value((to_int32(ecc, current)? & to_int32(ecc, rhs)?) as f64),
    OpKind::BitXorAssignRef => numeric_value((to_int32(ecc, current)? ^ to_int32(ecc, rhs)?) as f64),
    OpKind::BitOrAssignRef => numeric_value((to_int32(ecc, current)? | to_int32(ecc, rhs)?) as f64),
    _ => unreachable!(),
  };
  set_reference(target, result, ecc, env, this)?;
  Ok(result)
}

// --- property access contract (§4.3) ---

/// Classifies a computed member key the way `getElementOrKey` does
/// (§4.3): an exact non-negative integer index routes to the element
/// store, everything else becomes an interned property key.
enum MemberKey {
  Index(u32),
  Key(Key),
}

fn classify_member(ecc: &mut Ecc, value: Value) -> Result<MemberKey, Throw> {
  if let Value::Int(i) = value {
    if i >= 0 {
      return Ok(MemberKey::Index(i as u32));
    }
  }
  let s = to_display_string(ecc, value)?;
  match ObjectData::classify_index(&s) {
    Some(i) => Ok(MemberKey::Index(i)),
    None => Ok(MemberKey::Key(ecc.keys.intern(&s))),
  }
}

fn get_property(ecc: &mut Ecc, object: Value, key: Key, span: Span) -> EvalResult {
  get_member_or_key(ecc, object, MemberKey::Key(key), span)
}

fn get_member(ecc: &mut Ecc, object: Value, index: Value, span: Span) -> EvalResult {
  let key = classify_member(ecc, index)?;
  get_member_or_key(ecc, object, key, span)
}

fn get_member_or_key(ecc: &mut Ecc, object: Value, key: MemberKey, span: Span) -> EvalResult {
  if object.is_nullish() {
    return Err(throw_value(ecc, ErrorKind::TypeError, "cannot read property of null or undefined", span));
  }
  match key {
    MemberKey::Index(i) => {
      if let Some(h) = object.as_object() {
        if let Some(v) = walk_elements(ecc, h, i) {
          return Ok(v);
        }
        let length_key = ecc.keys.predefined.length;
        return walk_property(ecc, object, h, length_key, span).map(|v| v.unwrap_or(Value::undefined()));
      }
      if let Value::Chars(c) = object {
        let s = ecc.pool.chars(c).as_str().to_string();
        return Ok(char_at(ecc, &s, i as usize));
      }
      if let Value::Text(t) = object {
        let s = t.as_str().to_string();
        return Ok(char_at(ecc, &s, i as usize));
      }
      Ok(Value::undefined())
    }
    MemberKey::Key(key) => {
      if key == ecc.keys.predefined.length {
        if let Some(v) = builtin_length(ecc, object) {
          return Ok(v);
        }
      }
      if let Some(h) = object.as_object() {
        return Ok(walk_property(ecc, object, h, key, span)?.unwrap_or(Value::undefined()));
      }
      if let Value::Function(h) = object {
        return get_function_own_or_inherited(ecc, h, key, span);
      }
      let proto = string_like_prototype(ecc, object);
      if let Some(proto) = proto {
        return Ok(walk_property(ecc, object, proto, key, span)?.unwrap_or(Value::undefined()));
      }
      Ok(Value::undefined())
    }
  }
}

fn string_like_prototype(ecc: &Ecc, object: Value) -> Option<Handle<ObjectData>> {
  match object {
    Value::Text(_) | Value::Chars(_) | Value::Key(_) => Some(ecc.prototypes.string),
    Value::Int(_) | Value::Number(_) => Some(ecc.prototypes.number),
    Value::Bool(_) => Some(ecc.prototypes.boolean),
    _ => None,
  }
}

/// Single-character indexing on a string value (`"abc"[1]` == `"b"`):
/// each result is a fresh one-character `Chars` blob rather than a slice
/// of the original, since a surrogate half can't be sliced out of UTF-8
/// storage directly.
fn char_at(ecc: &mut Ecc, s: &str, index: usize) -> Value {
  match s.chars().nth(index) {
    Some(c) => {
      let mut buf = [0u8; 4];
      let handle = ecc.pool.alloc_chars(crate::chars::Chars::create_with_bytes(c.encode_utf8(&mut buf).as_bytes()));
      Value::chars(handle)
    }
    None => Value::undefined(),
  }
}

fn walk_elements(ecc: &Ecc, start: Handle<ObjectData>, index: u32) -> Option<Value> {
  let mut cur = Some(start);
  while let Some(h) = cur {
    if let Some(v) = ecc.pool.object(h).get_own_element(index) {
      return Some(v);
    }
    cur = ecc.pool.object(h).prototype;
  }
  None
}

/// Walks `start`'s prototype chain looking for `key`, invoking a getter
/// with `receiver` if the slot found is an accessor (§4.3 "getValue").
fn walk_property(ecc: &mut Ecc, receiver: Value, start: Handle<ObjectData>, key: Key, span: Span) -> Result<Option<Value>, Throw> {
  let mut cur = Some(start);
  while let Some(h) = cur {
    if let Some(slot) = ecc.pool.object(h).get_own_slot(key) {
      return match slot.value {
        PropValue::Data(v) => Ok(Some(v)),
        PropValue::Accessor { get: Some(getter), .. } => call(ecc, Value::function(getter), receiver, &[], false, span).map(Some),
        PropValue::Accessor { get: None, .. } => Ok(Some(Value::undefined())),
      };
    }
    cur = ecc.pool.object(h).prototype;
  }
  Ok(None)
}

/// A function value's own property store lives on its `FunctionData`,
/// not in the object arena (`make_closure` gives every closure a fresh
/// `prototype` member, but the function object itself is addressed by
/// `Handle<FunctionData>`) — so a lookup checks that slot first, then
/// falls back to the ordinary object-arena walk starting at whatever
/// the function's own prototype link points to (`Function.prototype`
/// for a plain closure).
fn get_function_own_or_inherited(ecc: &mut Ecc, h: Handle<FunctionData>, key: Key, span: Span) -> EvalResult {
  let receiver = Value::function(h);
  let slot = ecc.pool.function(h).object.get_own_slot(key).copied();
  if let Some(slot) = slot {
    return match slot.value {
      PropValue::Data(v) => Ok(v),
      PropValue::Accessor { get: Some(getter), .. } => call(ecc, Value::function(getter), receiver, &[], false, span),
      PropValue::Accessor { get: None, .. } => Ok(Value::undefined()),
    };
  }
  match ecc.pool.function(h).object.prototype {
    Some(proto) => Ok(walk_property(ecc, receiver, proto, key, span)?.unwrap_or(Value::undefined())),
    None => Ok(Value::undefined()),
  }
}

fn set_function_own(ecc: &mut Ecc, h: Handle<FunctionData>, key: Key, value: Value, span: Span) -> Result<(), Throw> {
  let existing_setter = find_function_setter(ecc, h, key);
  if let Some(setter) = existing_setter {
    call(ecc, Value::function(setter), Value::function(h), &[value], false, span)?;
    return Ok(());
  }
  if let Some(slot) = ecc.pool.function(h).object.get_own_slot(key) {
    if !slot.flags.writable() {
      return Err(throw_value(ecc, ErrorKind::TypeError, format!("\"{}\" is read-only", ecc.keys.resolve(key)), span));
    }
  }
  ecc.pool.function_mut(h).object.add_member(key, PropValue::Data(value), PropFlags::all()).ok();
  Ok(())
}

fn find_function_setter(ecc: &Ecc, h: Handle<FunctionData>, key: Key) -> Option<Handle<FunctionData>> {
  match ecc.pool.function(h).object.get_own_slot(key) {
    Some(slot) => match slot.value {
      PropValue::Accessor { set, .. } => set,
      PropValue::Data(_) => None,
    },
    None => None,
  }
}

fn builtin_length(ecc: &Ecc, object: Value) -> Option<Value> {
  match object {
    Value::Object(h) => {
      if matches!(ecc.pool.object(h).kind, ObjectKind::Host(_)) {
        return None;
      }
      Some(Value::integer(ecc.pool.object(h).element_count() as i32))
    }
    Value::Text(t) => Some(Value::integer(t.as_str().chars().count() as i32)),
    Value::Chars(c) => Some(Value::integer(ecc.pool.chars(c).as_str().chars().count() as i32)),
    _ => None,
  }
}

fn set_property(ecc: &mut Ecc, object: Value, key: Key, value: Value, span: Span) -> Result<(), Throw> {
  set_member_or_key(ecc, object, MemberKey::Key(key), value, span)
}

fn set_member(ecc: &mut Ecc, object: Value, index: Value, value: Value, span: Span) -> Result<(), Throw> {
  let key = classify_member(ecc, index)?;
  set_member_or_key(ecc, object, key, value, span)
}

fn set_member_or_key(ecc: &mut Ecc, object: Value, key: MemberKey, value: Value, span: Span) -> Result<(), Throw> {
  if let Value::Function(h) = object {
    return match key {
      MemberKey::Index(_) => Ok(()),
      MemberKey::Key(key) => set_function_own(ecc, h, key, value, span),
    };
  }
  let Some(real) = object.as_object() else {
    return Ok(());
  };

  match key {
    MemberKey::Index(i) => {
      if ecc.pool.object_mut(real).add_element(i, value, PropFlags::all()).is_err() {
        return Err(throw_value(ecc, ErrorKind::TypeError, "object is not extensible", span));
      }
      Ok(())
    }
    MemberKey::Key(key) => {
      if key == ecc.keys.predefined.length && matches!(ecc.pool.object(real).kind, ObjectKind::Plain) {
        let n = to_number(ecc, value)? as u32;
        ecc.pool.object_mut(real).resize_elements(n);
        return Ok(());
      }
      if let Some(setter) = find_setter(ecc, real, key) {
        call(ecc, Value::function(setter), object, &[value], false, span)?;
        return Ok(());
      }
      if let Some(slot) = ecc.pool.object(real).get_own_slot(key) {
        if !slot.flags.writable() {
          return Err(throw_value(ecc, ErrorKind::TypeError, format!("\"{}\" is read-only", ecc.keys.resolve(key)), span));
        }
      }
      if ecc.pool.object_mut(real).add_member(key, PropValue::Data(value), PropFlags::all()).is_err() {
        return Err(throw_value(ecc, ErrorKind::TypeError, "object is not extensible", span));
      }
      Ok(())
    }
  }
}

fn find_setter(ecc: &Ecc, start: Handle<ObjectData>, key: Key) -> Option<Handle<FunctionData>> {
  let mut cur = Some(start);
  while let Some(h) = cur {
    if let Some(slot) = ecc.pool.object(h).get_own_slot(key) {
      return match slot.value {
        PropValue::Accessor { set, .. } => set,
        PropValue::Data(_) => None,
      };
    }
    cur = ecc.pool.object(h).prototype;
  }
  None
}

fn delete_property(ecc: &mut Ecc, object: Value, key: Key) -> bool {
  match object.as_object() {
    Some(h) => ecc.pool.object_mut(h).delete_member(key),
    None => true,
  }
}

fn delete_member(ecc: &mut Ecc, object: Value, index: Value) -> bool {
  match classify_member(ecc, index) {
    Ok(MemberKey::Index(i)) => match object.as_object() {
      Some(h) => ecc.pool.object_mut(h).delete_element(i),
      None => true,
    },
    Ok(MemberKey::Key(key)) => delete_property(ecc, object, key),
    Err(_) => true,
  }
}

// --- coercions (§4.6 "Arithmetic", abstract ECMAScript operations) ---

pub fn to_primitive(ecc: &mut Ecc, value: Value, hint_string: bool) -> EvalResult {
  if !value.is_object_like() {
    return Ok(value);
  }
  let methods = if hint_string {
    [ecc.keys.predefined.to_string, ecc.keys.predefined.value_of]
  } else {
    [ecc.keys.predefined.value_of, ecc.keys.predefined.to_string]
  };
  for method_key in methods {
    let method = get_property(ecc, value, method_key, Span::from(0..0))?;
    if let Some(f) = method.as_function() {
      let result = call(ecc, Value::function(f), value, &[], false, Span::from(0..0))?;
      if !result.is_object_like() {
        return Ok(result);
      }
    }
  }
  Ok(value)
}

pub fn to_display_string(ecc: &mut Ecc, value: Value) -> Result<String, Throw> {
  let prim = to_primitive(ecc, value, true)?;
  Ok(format!(
    "{}",
    crate::value::Display {
      value: &prim,
      pool: &ecc.pool,
      keys: &ecc.keys,
    }
  ))
}

pub fn to_number(ecc: &mut Ecc, value: Value) -> Result<f64, Throw> {
  Ok(match to_primitive(ecc, value, false)? {
    Value::Undefined => f64::NAN,
    Value::Null => 0.0,
    Value::Bool(b) => {
      if b {
        1.0
      } else {
        0.0
      }
    }
    Value::Int(i) => i as f64,
    Value::Number(n) => n,
    Value::Key(k) => parse_number_text(ecc.keys.resolve(k)),
    Value::Text(t) => parse_number_text(t.as_str()),
    Value::Chars(c) => parse_number_text(ecc.pool.chars(c).as_str()),
    _ => f64::NAN,
  })
}

fn parse_number_text(s: &str) -> f64 {
  let s = s.trim();
  if s.is_empty() {
    return 0.0;
  }
  if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
    return i64::from_str_radix(hex, 16).map(|v| v as f64).unwrap_or(f64::NAN);
  }
  s.parse::<f64>().unwrap_or(f64::NAN)
}

pub fn to_int32(ecc: &mut Ecc, value: Value) -> Result<i32, Throw> {
  let n = to_number(ecc, value)?;
  if !n.is_finite() {
    return Ok(0);
  }
  Ok((n.trunc() as i64 as u32) as i32)
}

pub fn to_uint32(ecc: &mut Ecc, value: Value) -> Result<u32, Throw> {
  let n = to_number(ecc, value)?;
  if !n.is_finite() {
    return Ok(0);
  }
  Ok(n.trunc() as i64 as u32)
}

fn add(ecc: &mut Ecc, a: Value, b: Value) -> EvalResult {
  let a_prim = to_primitive(ecc, a, false)?;
  let b_prim = to_primitive(ecc, b, false)?;
  if a_prim.is_stringlike() || b_prim.is_stringlike() {
    let mut s = to_display_string(ecc, a_prim)?;
    s.push_str(&to_display_string(ecc, b_prim)?);
    let handle = ecc.pool.alloc_chars(crate::chars::Chars::create_with_bytes(s.into_bytes()));
    return Ok(Value::chars(handle));
  }
  Ok(numeric_value(to_number(ecc, a_prim)? + to_number(ecc, b_prim)?))
}

fn relational(ecc: &mut Ecc, kind: OpKind, a: Value, b: Value) -> EvalResult {
  let a_prim = to_primitive(ecc, a, false)?;
  let b_prim = to_primitive(ecc, b, false)?;
  if a_prim.is_stringlike() && b_prim.is_stringlike() {
    let a_s = to_display_string(ecc, a_prim)?;
    let b_s = to_display_string(ecc, b_prim)?;
    return Ok(Value::boolean(match kind {
      OpKind::Less => a_s < b_s,
      OpKind::LessOrEqual => a_s <= b_s,
      OpKind::More => a_s > b_s,
      OpKind::MoreOrEqual => a_s >= b_s,
      _ => unreachable!(),
    }));
  }
  let a_n = to_number(ecc, a_prim)?;
  let b_n = to_number(ecc, b_prim)?;
  if a_n.is_nan() || b_n.is_nan() {
    return Ok(Value::boolean(false));
  }
  Ok(Value::boolean(match kind {
    OpKind::Less => a_n < b_n,
    OpKind::LessOrEqual => a_n <= b_n,
    OpKind::More => a_n > b_n,
    OpKind::MoreOrEqual => a_n >= b_n,
    _ => unreachable!(),
  }))
}

/// `===` (§8 "Equality laws"): no coercion, `NaN !== NaN`, `0 === -0`.
pub fn strict_equals(ecc: &Ecc, a: Value, b: Value) -> bool {
  match (a, b) {
    (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
    (Value::Bool(x), Value::Bool(y)) => x == y,
    (Value::Int(x), Value::Int(y)) => x == y,
    (Value::Int(x), Value::Number(y)) | (Value::Number(y), Value::Int(x)) => x as f64 == y,
    (Value::Number(x), Value::Number(y)) => x == y,
    (Value::Key(x), Value::Key(y)) => x == y,
    (Value::Object(x), Value::Object(y)) => x == y,
    (Value::Function(x), Value::Function(y)) => x == y,
    (Value::Text(_) | Value::Chars(_) | Value::Key(_), _) | (_, Value::Text(_) | Value::Chars(_) | Value::Key(_)) => {
      if a.is_stringlike() && b.is_stringlike() {
        string_of(ecc, a) == string_of(ecc, b)
      } else {
        false
      }
    }
    _ => false,
  }
}

fn string_of(ecc: &Ecc, v: Value) -> String {
  match v {
    Value::Key(k) => ecc.keys.resolve(k).to_string(),
    Value::Text(t) => t.as_str().to_string(),
    Value::Chars(c) => ecc.pool.chars(c).as_str().to_string(),
    _ => String::new(),
  }
}

/// `==` (§8 "Equality laws"): the standard cross-type coercion table.
pub fn loose_equals(ecc: &mut Ecc, a: Value, b: Value) -> Result<bool, Throw> {
  if a.is_nullish() && b.is_nullish() {
    return Ok(true);
  }
  if a.is_nullish() || b.is_nullish() {
    return Ok(false);
  }
  if a.is_number() && b.is_number() {
    return Ok(strict_equals(ecc, a, b));
  }
  if a.is_stringlike() && b.is_stringlike() {
    return Ok(string_of(ecc, a) == string_of(ecc, b));
  }
  if let (Value::Bool(_), _) = (a, b) {
    let a_n = numeric_value(to_number(ecc, a)?);
    return loose_equals(ecc, a_n, b);
  }
  if let (_, Value::Bool(_)) = (a, b) {
    let b_n = numeric_value(to_number(ecc, b)?);
    return loose_equals(ecc, a, b_n);
  }
  if a.is_number() && b.is_stringlike() {
    let b_n = numeric_value(to_number(ecc, b)?);
    return Ok(strict_equals(ecc, a, b_n));
  }
  if a.is_stringlike() && b.is_number() {
    let a_n = numeric_value(to_number(ecc, a)?);
    return Ok(strict_equals(ecc, a_n, b));
  }
  if a.is_object_like() && !b.is_object_like() {
    let a_prim = to_primitive(ecc, a, false)?;
    return loose_equals(ecc, a_prim, b);
  }
  if b.is_object_like() && !a.is_object_like() {
    let b_prim = to_primitive(ecc, b, false)?;
    return loose_equals(ecc, a, b_prim);
  }
  Ok(strict_equals(ecc, a, b))
}

/// `instanceof` walks `a`'s prototype chain looking for `b.prototype`.
/// Function values are deliberately excluded from the left-hand side:
/// they live in their own arena with their own `.prototype` link, so
/// `someFunction instanceof Object` never matches here (see
/// `DESIGN.md`).
fn instance_of(ecc: &mut Ecc, a: Value, b: Value, span: Span) -> EvalResult {
  let Some(ctor) = b.as_function() else {
    return Err(throw_value(ecc, ErrorKind::TypeError, "right-hand side of 'instanceof' is not callable", span));
  };
  let Some(mut cur) = a.as_object() else {
    return Ok(Value::boolean(false));
  };
  let proto = ecc.pool.function(ctor).object.get_own(ecc.keys.predefined.prototype).and_then(|v| v.as_object());
  let Some(proto) = proto else {
    return Ok(Value::boolean(false));
  };
  loop {
    match ecc.pool.object(cur).prototype {
      Some(p) if p == proto => return Ok(Value::boolean(true)),
      Some(p) => cur = p,
      None => return Ok(Value::boolean(false)),
    }
  }
}

fn in_operator(ecc: &mut Ecc, a: Value, b: Value, span: Span) -> EvalResult {
  let Some(h) = b.as_object() else {
    return Err(throw_value(ecc, ErrorKind::TypeError, "'in' requires an object right-hand side", span));
  };
  let key_val = classify_member(ecc, a)?;
  let found = match key_val {
    MemberKey::Index(i) => walk_elements(ecc, h, i).is_some(),
    MemberKey::Key(key) => {
      let mut cur = Some(h);
      let mut found = false;
      while let Some(node) = cur {
        if ecc.pool.object(node).get_own_slot(key).is_some() {
          found = true;
          break;
        }
        cur = ecc.pool.object(node).prototype;
      }
      found
    }
  };
  Ok(Value::boolean(found))
}
