//! Statement grammar (§4.5): declarations, control flow, and the
//! peephole loop-fusion pass that turns a classic counted `for` into an
//! `IterateLessRef`-family op.

use super::*;
use crate::op::{IterInfo, LoopVar, OpExtra, SwitchCase, SwitchInfo, TryInfo};

impl<'a> Parser<'a> {
  pub(super) fn parse_statement_list_until_end(&mut self) -> Vec<Op> {
    let mut stmts = Vec::new();
    while !self.at(Token::End) {
      stmts.push(self.parse_statement());
    }
    stmts
  }

  pub(super) fn parse_statement_list_until_brace(&mut self) -> Vec<Op> {
    let mut stmts = Vec::new();
    while !self.at(Token::Punctuator('}')) && !self.at(Token::End) {
      stmts.push(self.parse_statement());
    }
    stmts
  }

  fn parse_block(&mut self) -> Vec<Op> {
    self.expect(Token::Punctuator('{'), "'{'");
    let body = self.parse_statement_list_until_brace();
    self.expect(Token::Punctuator('}'), "'}'");
    body
  }

  fn parse_statement(&mut self) -> Op {
    let start = self.span;
    match self.token {
      Token::Punctuator('{') => {
        let body = self.parse_block();
        Op::with_children(OpKind::Block, Value::undefined(), start, body)
      }
      Token::Punctuator(';') => {
        self.bump();
        Op::new(OpKind::Empty, Value::undefined(), start)
      }
      Token::Var => self.parse_var_statement(),
      Token::If => self.parse_if_statement(),
      Token::While => self.parse_while_statement(),
      Token::Do => self.parse_do_while_statement(),
      Token::For => self.parse_for_statement(),
      Token::Break => self.parse_break_or_continue(OpKind::Break),
      Token::Continue => self.parse_break_or_continue(OpKind::Continue),
      Token::Return => self.parse_return_statement(),
      Token::With => self.parse_with_statement(),
      Token::Switch => self.parse_switch_statement(),
      Token::Throw => self.parse_throw_statement(),
      Token::Try => self.parse_try_statement(),
      Token::Debugger => {
        self.bump();
        self.consume_statement_terminator();
        Op::new(OpKind::Debugger, Value::undefined(), start)
      }
      Token::Function => self.parse_function_declaration(),
      Token::Identifier => self.parse_identifier_led_statement(),
      _ => self.parse_expression_statement(),
    }
  }

  /// An identifier-led statement is either a labeled statement
  /// (`done: while (...) ...`) or an expression statement; only a
  /// one-token lookahead (colon) tells them apart. Snapshots the lexer
  /// so a miss can backtrack to before the identifier was consumed.
  fn parse_identifier_led_statement(&mut self) -> Op {
    let start = self.span;
    let saved_lexer = self.lexer.clone();
    let saved_token = self.token;
    let saved_span = self.span;

    let key = self.identifier_key();
    self.bump();
    if self.eat(Token::Punctuator(':')) {
      self.labels.push(key);
      let body = self.parse_statement();
      self.labels.pop();
      let span = start.join(body.text);
      return Op::with_children(OpKind::Labeled, Value::key(key), span, vec![body]);
    }

    self.lexer = saved_lexer;
    self.token = saved_token;
    self.span = saved_span;
    self.parse_expression_statement()
  }

  fn parse_expression_statement(&mut self) -> Op {
    let expr = self.parse_expression(false);
    self.consume_statement_terminator();
    let span = expr.text;
    Op::with_children(OpKind::Expression, Value::undefined(), span, vec![expr])
  }

  fn parse_var_statement(&mut self) -> Op {
    let start = self.span;
    self.bump(); // `var`
    let mut declarators = Vec::new();
    loop {
      let name_span = self.span;
      let key = self.identifier_key();
      self.expect(Token::Identifier, "identifier");
      self.hoist(key);
      let target = self.identifier_ref_op(key, name_span);
      if self.eat(Token::Punctuator('=')) {
        let value = self.parse_assignment_expr(false);
        let span = name_span.join(value.text);
        declarators.push(Op::with_children(OpKind::AssignRef, Value::undefined(), span, vec![target, value]));
      }
      if !self.eat(Token::Punctuator(',')) {
        break;
      }
    }
    self.consume_statement_terminator();
    let span = if let Some(last) = declarators.last() {
      start.join(last.text)
    } else {
      start
    };
    Op::with_children(OpKind::Block, Value::undefined(), span, declarators)
  }

  fn parse_if_statement(&mut self) -> Op {
    let start = self.span;
    self.bump();
    self.expect(Token::Punctuator('('), "'('");
    let test = self.parse_expression(false);
    self.expect(Token::Punctuator(')'), "')'");
    let consequent = self.parse_statement();
    let mut children = vec![test, consequent];
    let mut end = children[1].text;
    if self.eat(Token::Else) {
      let alternate = self.parse_statement();
      end = alternate.text;
      children.push(alternate);
    }
    Op::with_children(OpKind::If, Value::undefined(), start.join(end), children)
  }

  fn parse_while_statement(&mut self) -> Op {
    let start = self.span;
    self.bump();
    self.expect(Token::Punctuator('('), "'('");
    let test = self.parse_expression(false);
    self.expect(Token::Punctuator(')'), "')'");
    self.loop_depth += 1;
    let body = self.parse_statement();
    self.loop_depth -= 1;
    let span = start.join(body.text);
    Op::with_children(OpKind::While, Value::undefined(), span, vec![test, body])
  }

  fn parse_do_while_statement(&mut self) -> Op {
    let start = self.span;
    self.bump();
    self.loop_depth += 1;
    let body = self.parse_statement();
    self.loop_depth -= 1;
    self.expect(Token::While, "'while'");
    self.expect(Token::Punctuator('('), "'('");
    let test = self.parse_expression(false);
    let end = self.span;
    self.expect(Token::Punctuator(')'), "')'");
    self.eat(Token::Punctuator(';'));
    Op::with_children(OpKind::DoWhile, Value::undefined(), start.join(end), vec![body, test])
  }

  /// Classic 3-clause `for` and `for`-`in`, with the peephole fusion
  /// from §4.5: a classic loop of the shape
  /// `for (i = init; i OP bound; i += step) body` (where `OP` is one of
  /// `<`, `<=`, `>`, `>=` and the loop variable is a simple reference)
  /// compiles directly to the matching `IterateXRef` op instead of the
  /// general `For` op, since the general op would otherwise reconstruct
  /// this exact shape from its condition/update children on every
  /// iteration.
  fn parse_for_statement(&mut self) -> Op {
    let start = self.span;
    self.bump();
    self.expect(Token::Punctuator('('), "'('");

    let is_var = self.eat(Token::Var);
    let head_start = self.span;

    // Try the `for (x in expr)` shape first: a single binding/reference
    // followed directly by `in`. One-token lookahead is enough, but
    // since that token might turn out to belong to the classic form's
    // init expression instead, snapshot the lexer so a miss can
    // backtrack cleanly rather than threading a pushback buffer through
    // the rest of the parser.
    if self.at(Token::Identifier) {
      let saved_lexer = self.lexer.clone();
      let saved_token = self.token;
      let saved_span = self.span;

      let key = self.identifier_key();
      let key_span = self.span;
      self.bump();
      if self.at(Token::In) {
        self.bump();
        if is_var {
          self.hoist(key);
        }
        let target = self.identifier_ref_op(key, key_span);
        let object = self.parse_expression(false);
        self.expect(Token::Punctuator(')'), "')'");
        self.loop_depth += 1;
        let body = self.parse_statement();
        self.loop_depth -= 1;
        let span = start.join(body.text);
        return Op::with_extra(
          OpKind::IterateInRef,
          Value::undefined(),
          span,
          OpExtra::Iter(Box::new(IterInfo {
            var: self.loop_var_of(&target),
            bound: object,
            step: 0,
            body,
          })),
        );
      }

      self.lexer = saved_lexer;
      self.token = saved_token;
      self.span = saved_span;
    }

    // Classic 3-clause form.
    let init = if self.at(Token::Punctuator(';')) {
      None
    } else if is_var {
      Some(self.parse_var_declarators_no_in(head_start))
    } else {
      Some(self.parse_expression(true))
    };
    self.expect(Token::Punctuator(';'), "';'");
    let test = if self.at(Token::Punctuator(';')) {
      None
    } else {
      Some(self.parse_expression(false))
    };
    self.expect(Token::Punctuator(';'), "';'");
    let update = if self.at(Token::Punctuator(')')) {
      None
    } else {
      Some(self.parse_expression(false))
    };
    self.expect(Token::Punctuator(')'), "')'");
    self.loop_depth += 1;
    let body = self.parse_statement();
    self.loop_depth -= 1;
    let span = start.join(body.text);

    if let (Some(test_op), Some(update_op)) = (&test, &update) {
      if let Some((kind, var, bound, step)) = fuse_shape(test_op, update_op) {
        let fused = Op::with_extra(
          kind,
          Value::undefined(),
          span,
          OpExtra::Iter(Box::new(IterInfo { var, bound, step, body })),
        );
        // The fused op only carries the loop variable/bound/step/body;
        // any `init` clause (`for (i = 0; ...)`) still has to run once
        // before it, so it's threaded in as a preceding statement.
        return match init {
          Some(init_op) => Op::with_children(OpKind::Block, Value::undefined(), span, vec![init_op, fused]),
          None => fused,
        };
      }
    }

    let mut children = Vec::new();
    children.push(init.unwrap_or_else(|| Op::new(OpKind::Empty, Value::undefined(), start)));
    children.push(test.unwrap_or_else(|| Op::new(OpKind::Value, Value::boolean(true), start)));
    children.push(update.unwrap_or_else(|| Op::new(OpKind::Empty, Value::undefined(), start)));
    children.push(body);
    Op::with_children(OpKind::For, Value::undefined(), span, children)
  }

  fn parse_var_declarators_no_in(&mut self, start: Span) -> Op {
    let mut declarators = Vec::new();
    loop {
      let name_span = self.span;
      let key = self.identifier_key();
      self.expect(Token::Identifier, "identifier");
      self.hoist(key);
      let target = self.identifier_ref_op(key, name_span);
      if self.eat(Token::Punctuator('=')) {
        let value = self.parse_assignment_expr(true);
        let span = name_span.join(value.text);
        declarators.push(Op::with_children(OpKind::AssignRef, Value::undefined(), span, vec![target, value]));
      }
      if !self.eat(Token::Punctuator(',')) {
        break;
      }
    }
    let span = declarators.last().map(|d| start.join(d.text)).unwrap_or(start);
    Op::with_children(OpKind::Block, Value::undefined(), span, declarators)
  }

  fn loop_var_of(&self, target: &Op) -> LoopVar {
    match target.kind {
      OpKind::GetLocalSlot => LoopVar::LocalSlot(target.pair),
      OpKind::GetParentSlot => {
        let (depth, index) = crate::op::parent_slot_parts(target.pair);
        LoopVar::ParentSlot { depth, index }
      }
      OpKind::GetLocal => match target.value {
        Value::Key(k) => LoopVar::Local(k),
        _ => LoopVar::Local(Key::NONE),
      },
      _ => LoopVar::Local(Key::NONE),
    }
  }

  fn parse_break_or_continue(&mut self, kind: OpKind) -> Op {
    let start = self.span;
    self.bump();
    let label = if !self.lexer.did_line_break && self.at(Token::Identifier) {
      let key = self.identifier_key();
      self.bump();
      Value::key(key)
    } else {
      Value::undefined()
    };
    self.consume_statement_terminator();
    Op::new(kind, label, start)
  }

  fn parse_return_statement(&mut self) -> Op {
    let start = self.span;
    self.bump();
    let value = if self.lexer.did_line_break || self.at(Token::Punctuator(';')) || self.at(Token::Punctuator('}')) || self.at(Token::End) {
      None
    } else {
      Some(self.parse_expression(false))
    };
    self.consume_statement_terminator();
    let mut children = Vec::new();
    let mut end = start;
    if let Some(v) = value {
      end = v.text;
      children.push(v);
    }
    Op::with_children(OpKind::Return, Value::undefined(), start.join(end), children)
  }

  /// `with` is rejected outright (see `DESIGN.md`): ES3 `with`
  /// dynamically reshapes the scope chain at run time in a way that
  /// would defeat the local-slot optimization for every enclosing
  /// function, not just the `with` body.
  fn parse_with_statement(&mut self) -> Op {
    let start = self.span;
    self.record_error(SyntaxError::new("'with' is not supported", start));
    self.bump();
    if self.eat(Token::Punctuator('(')) {
      self.parse_expression(false);
      self.expect(Token::Punctuator(')'), "')'");
    }
    self.parse_statement();
    Op::new(OpKind::Empty, Value::undefined(), start)
  }

  fn parse_switch_statement(&mut self) -> Op {
    let start = self.span;
    self.bump();
    self.expect(Token::Punctuator('('), "'('");
    let discriminant = self.parse_expression(false);
    self.expect(Token::Punctuator(')'), "')'");
    self.expect(Token::Punctuator('{'), "'{'");
    self.switch_depth += 1;
    let mut cases = Vec::new();
    while !self.at(Token::Punctuator('}')) && !self.at(Token::End) {
      let test = if self.eat(Token::Case) {
        let t = self.parse_expression(false);
        self.expect(Token::Punctuator(':'), "':'");
        Some(t)
      } else {
        self.expect(Token::Default, "'case' or 'default'");
        self.expect(Token::Punctuator(':'), "':'");
        None
      };
      let mut body = Vec::new();
      while !self.at(Token::Case) && !self.at(Token::Default) && !self.at(Token::Punctuator('}')) && !self.at(Token::End) {
        body.push(self.parse_statement());
      }
      cases.push(SwitchCase { test, body });
    }
    self.switch_depth -= 1;
    let end = self.span;
    self.expect(Token::Punctuator('}'), "'}'");
    Op::with_extra(
      OpKind::Switch,
      Value::undefined(),
      start.join(end),
      OpExtra::Switch(Box::new(SwitchInfo { discriminant, cases })),
    )
  }

  fn parse_throw_statement(&mut self) -> Op {
    let start = self.span;
    self.bump();
    if self.lexer.did_line_break {
      self.record_error(SyntaxError::new("illegal newline after 'throw'", start));
    }
    let value = self.parse_expression(false);
    self.consume_statement_terminator();
    let span = start.join(value.text);
    Op::with_children(OpKind::Throw, Value::undefined(), span, vec![value])
  }

  fn parse_try_statement(&mut self) -> Op {
    let start = self.span;
    self.bump();
    let block = self.parse_block();

    let mut catch_param = None;
    let mut catch_block = None;
    if self.eat(Token::Catch) {
      self.expect(Token::Punctuator('('), "'('");
      let key = self.identifier_key();
      self.expect(Token::Identifier, "identifier");
      self.hoist(key);
      self.expect(Token::Punctuator(')'), "')'");
      catch_param = Some(key);
      catch_block = Some(self.parse_block());
    }

    let mut finally_block = None;
    if self.eat(Token::Finally) {
      finally_block = Some(self.parse_block());
    }

    if catch_block.is_none() && finally_block.is_none() {
      self.record_error(SyntaxError::new("missing 'catch' or 'finally' after 'try'", start));
    }

    let end = self.span;
    Op::with_extra(
      OpKind::Try,
      Value::undefined(),
      start.join(end),
      OpExtra::Try(Box::new(TryInfo {
        block,
        catch_param,
        catch_block,
        finally_block,
      })),
    )
  }

  fn parse_function_declaration(&mut self) -> Op {
    let start = self.span;
    self.bump();
    let key = self.identifier_key();
    self.expect(Token::Identifier, "function name");
    self.hoist(key);
    let template = self.parse_function_template(key);
    let end = self.span;
    let func = Op::with_extra(OpKind::Function, Value::undefined(), start.join(end), OpExtra::Function(template));
    let target = self.identifier_ref_op(key, start);
    Op::with_children(OpKind::AssignRef, Value::undefined(), start.join(end), vec![target, func])
  }
}

/// Recognizes the fusable shape of a classic `for` loop's test/update
/// pair: `i OP bound` paired with `i += step`/`i++`/`i--` on the same
/// variable. Returns `None` for anything else, which falls back to the
/// general `For` op.
fn fuse_shape(test: &Op, update: &Op) -> Option<(OpKind, LoopVar, Op, i32)> {
  let (cmp_kind, lhs, rhs) = match test.kind {
    OpKind::Less | OpKind::LessOrEqual | OpKind::More | OpKind::MoreOrEqual => {
      (test.kind, &test.children[0], &test.children[1])
    }
    _ => return None,
  };
  if !is_simple_ref(lhs) {
    return None;
  }
  let step = step_of(update, lhs)?;
  let kind = match cmp_kind {
    OpKind::Less => OpKind::IterateLessRef,
    OpKind::LessOrEqual => OpKind::IterateLessOrEqualRef,
    OpKind::More => OpKind::IterateMoreRef,
    OpKind::MoreOrEqual => OpKind::IterateMoreOrEqualRef,
    _ => unreachable!(),
  };
  let var = match lhs.kind {
    OpKind::GetLocalSlot => LoopVar::LocalSlot(lhs.pair),
    OpKind::GetParentSlot => {
      let (depth, index) = crate::op::parent_slot_parts(lhs.pair);
      LoopVar::ParentSlot { depth, index }
    }
    OpKind::GetLocal => match lhs.value {
      Value::Key(k) => LoopVar::Local(k),
      _ => return None,
    },
    _ => return None,
  };
  Some((kind, var, clone_op(rhs), step))
}

fn is_simple_ref(op: &Op) -> bool {
  matches!(op.kind, OpKind::GetLocalSlot | OpKind::GetParentSlot | OpKind::GetLocal)
}

fn same_ref(a: &Op, b: &Op) -> bool {
  if a.kind != b.kind || a.pair != b.pair {
    return false;
  }
  match (a.value, b.value) {
    (Value::Key(x), Value::Key(y)) => x == y,
    _ => true,
  }
}

fn step_of(update: &Op, var: &Op) -> Option<i32> {
  match update.kind {
    OpKind::PostIncrementRef | OpKind::IncrementRef if same_ref(&update.children[0], var) => Some(1),
    OpKind::PostDecrementRef | OpKind::DecrementRef if same_ref(&update.children[0], var) => Some(-1),
    OpKind::AddAssignRef if same_ref(&update.children[0], var) => const_step(&update.children[1]),
    OpKind::MinusAssignRef if same_ref(&update.children[0], var) => const_step(&update.children[1]).map(|n| -n),
    _ => None,
  }
}

fn const_step(op: &Op) -> Option<i32> {
  match op.value {
    Value::Int(n) if op.children.is_empty() => Some(n),
    _ => None,
  }
}

/// Deep-clones an op subtree. Needed because the fused loop's bound
/// expression is re-evaluated every iteration by `vm::exec` (see
/// `IterInfo::bound`'s doc comment) but the unfused `test` op it came
/// from is otherwise discarded, so nothing else aliases this tree.
fn clone_op(op: &Op) -> Op {
  Op {
    kind: op.kind,
    text: op.text,
    value: op.value,
    children: op.children.iter().map(clone_op).collect(),
    pair: op.pair,
    extra: None,
  }
}

