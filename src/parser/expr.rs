//! Expression grammar (§4.5), one method per precedence level, the way
//! the teacher's own parser climbs from `assignment_expr` down through
//! the binary ladder to `primary_expr`.
//!
//! Every level returns an [`Op`] directly instead of pushing onto a
//! flat instruction stream — this *is* the tree (see `op.rs`'s module
//! doc). Reference-producing ops (`GetLocal`/`GetLocalSlot`/
//! `GetParentSlot`/`GetProperty`/`GetMember`) double as their own
//! assignment targets: `assert_reference` just validates the shape, and
//! the `*Ref` ops wrap the already-built op as a child rather than
//! mutating anything in place.

use super::*;
use crate::op::OpExtra;

impl<'a> Parser<'a> {
  /// Entry point for a full expression, including the comma operator.
  /// `no_in` suppresses treating a bare `in` token as the `in` operator,
  /// so a `for (x in obj)` head can parse `x` without swallowing the
  /// loop's own `in`.
  pub(super) fn parse_expression(&mut self, no_in: bool) -> Op {
    let mut expr = self.parse_assignment_expr(no_in);
    while self.eat(Token::Punctuator(',')) {
      let rhs = self.parse_assignment_expr(no_in);
      let span = expr.text.join(rhs.text);
      expr = Op::with_children(OpKind::Comma, Value::undefined(), span, vec![expr, rhs]);
    }
    expr
  }

  fn parse_assignment_expr(&mut self, no_in: bool) -> Op {
    let left = self.parse_conditional_expr(no_in);
    let kind = match self.token {
      Token::Punctuator('=') => OpKind::AssignRef,
      Token::AddAssign => OpKind::AddAssignRef,
      Token::MinusAssign => OpKind::MinusAssignRef,
      Token::MultiplyAssign => OpKind::MultiplyAssignRef,
      Token::DivideAssign => OpKind::DivideAssignRef,
      Token::ModuloAssign => OpKind::ModuloAssignRef,
      Token::LeftShiftAssign => OpKind::LeftShiftAssignRef,
      Token::RightShiftAssign => OpKind::RightShiftAssignRef,
      Token::UnsignedRightShiftAssign => OpKind::UnsignedRightShiftAssignRef,
      Token::AndAssign => OpKind::BitAndAssignRef,
      Token::XorAssign => OpKind::BitXorAssignRef,
      Token::OrAssign => OpKind::BitOrAssignRef,
      _ => return left,
    };
    self.assert_reference(&left);
    self.bump();
    let right = self.parse_assignment_expr(no_in);
    let span = left.text.join(right.text);
    Op::with_children(kind, Value::undefined(), span, vec![left, right])
  }

  fn parse_conditional_expr(&mut self, no_in: bool) -> Op {
    let test = self.parse_logical_or_expr(no_in);
    if !self.eat(Token::Punctuator('?')) {
      return test;
    }
    let consequent = self.parse_assignment_expr(false);
    self.expect(Token::Punctuator(':'), "':'");
    let alternate = self.parse_assignment_expr(no_in);
    let span = test.text.join(alternate.text);
    Op::with_children(
      OpKind::If,
      Value::undefined(),
      span,
      vec![test, consequent, alternate],
    )
  }

  fn parse_logical_or_expr(&mut self, no_in: bool) -> Op {
    let mut left = self.parse_logical_and_expr(no_in);
    while self.eat(Token::LogicalOr) {
      let right = self.parse_logical_and_expr(no_in);
      let span = left.text.join(right.text);
      left = Op::with_children(OpKind::LogicalOr, Value::undefined(), span, vec![left, right]);
    }
    left
  }

  fn parse_logical_and_expr(&mut self, no_in: bool) -> Op {
    let mut left = self.parse_bitwise_or_expr(no_in);
    while self.eat(Token::LogicalAnd) {
      let right = self.parse_bitwise_or_expr(no_in);
      let span = left.text.join(right.text);
      left = Op::with_children(OpKind::LogicalAnd, Value::undefined(), span, vec![left, right]);
    }
    left
  }

  fn parse_bitwise_or_expr(&mut self, no_in: bool) -> Op {
    let mut left = self.parse_bitwise_xor_expr(no_in);
    while self.eat(Token::Punctuator('|')) {
      let right = self.parse_bitwise_xor_expr(no_in);
      let span = left.text.join(right.text);
      left = Op::with_children(OpKind::BitwiseOr, Value::undefined(), span, vec![left, right]);
    }
    left
  }

  fn parse_bitwise_xor_expr(&mut self, no_in: bool) -> Op {
    let mut left = self.parse_bitwise_and_expr(no_in);
    while self.eat(Token::Punctuator('^')) {
      let right = self.parse_bitwise_and_expr(no_in);
      let span = left.text.join(right.text);
      left = Op::with_children(OpKind::BitwiseXor, Value::undefined(), span, vec![left, right]);
    }
    left
  }

  fn parse_bitwise_and_expr(&mut self, no_in: bool) -> Op {
    let mut left = self.parse_equality_expr(no_in);
    while self.eat(Token::Punctuator('&')) {
      let right = self.parse_equality_expr(no_in);
      let span = left.text.join(right.text);
      left = Op::with_children(OpKind::BitwiseAnd, Value::undefined(), span, vec![left, right]);
    }
    left
  }

  fn parse_equality_expr(&mut self, no_in: bool) -> Op {
    let mut left = self.parse_relational_expr(no_in);
    loop {
      let kind = match self.token {
        Token::Equal => OpKind::Equal,
        Token::NotEqual => OpKind::NotEqual,
        Token::Identical => OpKind::Identical,
        Token::NotIdentical => OpKind::NotIdentical,
        _ => break,
      };
      self.bump();
      let right = self.parse_relational_expr(no_in);
      let span = left.text.join(right.text);
      left = Op::with_children(kind, Value::undefined(), span, vec![left, right]);
    }
    left
  }

  fn parse_relational_expr(&mut self, no_in: bool) -> Op {
    let mut left = self.parse_shift_expr();
    loop {
      let kind = match self.token {
        Token::Punctuator('<') => OpKind::Less,
        Token::Punctuator('>') => OpKind::More,
        Token::LessOrEqual => OpKind::LessOrEqual,
        Token::MoreOrEqual => OpKind::MoreOrEqual,
        Token::InstanceOf => OpKind::InstanceOf,
        Token::In if !no_in => OpKind::In,
        _ => break,
      };
      self.bump();
      let right = self.parse_shift_expr();
      let span = left.text.join(right.text);
      left = Op::with_children(kind, Value::undefined(), span, vec![left, right]);
    }
    left
  }

  fn parse_shift_expr(&mut self) -> Op {
    let mut left = self.parse_additive_expr();
    loop {
      let kind = match self.token {
        Token::LeftShift => OpKind::LeftShift,
        Token::RightShift => OpKind::RightShift,
        Token::UnsignedRightShift => OpKind::UnsignedRightShift,
        _ => break,
      };
      self.bump();
      let right = self.parse_additive_expr();
      let span = left.text.join(right.text);
      left = Op::with_children(kind, Value::undefined(), span, vec![left, right]);
    }
    left
  }

  fn parse_additive_expr(&mut self) -> Op {
    let mut left = self.parse_multiplicative_expr();
    loop {
      let kind = match self.token {
        Token::Punctuator('+') => OpKind::Add,
        Token::Punctuator('-') => OpKind::Minus,
        _ => break,
      };
      self.bump();
      let right = self.parse_multiplicative_expr();
      let span = left.text.join(right.text);
      left = Op::with_children(kind, Value::undefined(), span, vec![left, right]);
    }
    left
  }

  fn parse_multiplicative_expr(&mut self) -> Op {
    let mut left = self.parse_unary_expr();
    loop {
      let kind = match self.token {
        Token::Punctuator('*') => OpKind::Multiply,
        Token::Punctuator('/') => OpKind::Divide,
        Token::Punctuator('%') => OpKind::Modulo,
        _ => break,
      };
      self.bump();
      let right = self.parse_unary_expr();
      let span = left.text.join(right.text);
      left = Op::with_children(kind, Value::undefined(), span, vec![left, right]);
    }
    left
  }

  fn parse_unary_expr(&mut self) -> Op {
    let start = self.span;
    match self.token {
      Token::Increment => {
        self.bump();
        let target = self.parse_unary_expr();
        self.assert_reference(&target);
        let span = start.join(target.text);
        Op::with_children(OpKind::IncrementRef, Value::undefined(), span, vec![target])
      }
      Token::Decrement => {
        self.bump();
        let target = self.parse_unary_expr();
        self.assert_reference(&target);
        let span = start.join(target.text);
        Op::with_children(OpKind::DecrementRef, Value::undefined(), span, vec![target])
      }
      Token::Punctuator('+') => {
        self.bump();
        let operand = self.parse_unary_expr();
        let span = start.join(operand.text);
        Op::with_children(OpKind::Positive, Value::undefined(), span, vec![operand])
      }
      Token::Punctuator('-') => {
        self.bump();
        let operand = self.parse_unary_expr();
        let span = start.join(operand.text);
        Op::with_children(OpKind::Negative, Value::undefined(), span, vec![operand])
      }
      Token::Punctuator('~') => {
        self.bump();
        let operand = self.parse_unary_expr();
        let span = start.join(operand.text);
        Op::with_children(OpKind::Invert, Value::undefined(), span, vec![operand])
      }
      Token::Punctuator('!') => {
        self.bump();
        let operand = self.parse_unary_expr();
        let span = start.join(operand.text);
        Op::with_children(OpKind::Not, Value::undefined(), span, vec![operand])
      }
      Token::TypeOf => {
        self.bump();
        let operand = self.parse_unary_expr();
        let span = start.join(operand.text);
        Op::with_children(OpKind::TypeOf, Value::undefined(), span, vec![operand])
      }
      Token::Void => {
        self.bump();
        let operand = self.parse_unary_expr();
        let span = start.join(operand.text);
        Op::with_children(OpKind::Void, Value::undefined(), span, vec![operand])
      }
      Token::Delete => {
        self.bump();
        let target = self.parse_unary_expr();
        let span = start.join(target.text);
        match target.kind {
          OpKind::GetProperty => {
            let mut children = target.children;
            let object = children.remove(0);
            Op::with_children(OpKind::DeleteProperty, target.value, span, vec![object])
          }
          OpKind::GetMember => {
            Op::with_children(OpKind::DeleteMember, Value::undefined(), span, target.children)
          }
          _ => Op::new(OpKind::Value, Value::boolean(true), span),
        }
      }
      _ => self.parse_postfix_expr(),
    }
  }

  fn parse_postfix_expr(&mut self) -> Op {
    let expr = self.parse_lhs_expr();
    if self.lexer.did_line_break {
      return expr;
    }
    match self.token {
      Token::Increment => {
        self.assert_reference(&expr);
        let span = expr.text.join(self.span);
        self.bump();
        Op::with_children(OpKind::PostIncrementRef, Value::undefined(), span, vec![expr])
      }
      Token::Decrement => {
        self.assert_reference(&expr);
        let span = expr.text.join(self.span);
        self.bump();
        Op::with_children(OpKind::PostDecrementRef, Value::undefined(), span, vec![expr])
      }
      _ => expr,
    }
  }

  /// `new`/call/member chain (§4.5). A `new` binds to the nearest
  /// member expression and consumes at most one argument list directly
  /// after it; everything after that — further calls, further member
  /// access — is handled uniformly by the trailer loop below.
  fn parse_lhs_expr(&mut self) -> Op {
    let mut expr = if self.eat(Token::New) {
      let start = self.span;
      let callee = self.parse_member_expr();
      let mut children = vec![callee];
      let mut end = self.span;
      if self.at(Token::Punctuator('(')) {
        let (args, args_end) = self.parse_arguments();
        children.extend(args);
        end = args_end;
      }
      Op::with_children(OpKind::Construct, Value::undefined(), start.join(end), children)
    } else {
      self.parse_member_expr()
    };

    loop {
      match self.token {
        Token::Punctuator('(') => {
          let (args, end) = self.parse_arguments();
          expr = self.make_call(expr, args, end);
        }
        Token::Punctuator('.') => {
          self.bump();
          let key = self.identifier_key();
          let span = expr.text.join(self.span);
          self.bump();
          expr = Op::with_children(OpKind::GetProperty, Value::key(key), span, vec![expr]);
        }
        Token::Punctuator('[') => {
          self.bump();
          let index = self.parse_expression(false);
          let span = expr.text.join(self.span);
          self.expect(Token::Punctuator(']'), "']'");
          expr = Op::with_children(OpKind::GetMember, Value::undefined(), span, vec![expr, index]);
        }
        _ => break,
      }
    }
    expr
  }

  fn parse_member_expr(&mut self) -> Op {
    let mut expr = self.parse_primary_expr();
    loop {
      match self.token {
        Token::Punctuator('.') => {
          self.bump();
          let key = self.identifier_key();
          let span = expr.text.join(self.span);
          self.bump();
          expr = Op::with_children(OpKind::GetProperty, Value::key(key), span, vec![expr]);
        }
        Token::Punctuator('[') => {
          self.bump();
          let index = self.parse_expression(false);
          let span = expr.text.join(self.span);
          self.expect(Token::Punctuator(']'), "']'");
          expr = Op::with_children(OpKind::GetMember, Value::undefined(), span, vec![expr, index]);
        }
        _ => break,
      }
    }
    expr
  }

  /// Turns a direct call into `CallProperty`/`CallMember` when the
  /// callee is a member access, so the receiver is preserved as `this`
  /// (§4.7 "method calls bind `this` to the receiver").
  fn make_call(&mut self, callee: Op, args: Vec<Op>, end: Span) -> Op {
    let span = callee.text.join(end);
    match callee.kind {
      OpKind::GetProperty => {
        let mut children = callee.children;
        children.extend(args);
        Op::with_children(OpKind::CallProperty, callee.value, span, children)
      }
      OpKind::GetMember => {
        let mut children = callee.children;
        children.extend(args);
        Op::with_children(OpKind::CallMember, Value::undefined(), span, children)
      }
      _ => {
        let mut children = vec![callee];
        children.extend(args);
        Op::with_children(OpKind::Call, Value::undefined(), span, children)
      }
    }
  }

  fn parse_arguments(&mut self) -> (Vec<Op>, Span) {
    self.expect(Token::Punctuator('('), "'('");
    let mut args = Vec::new();
    if !self.at(Token::Punctuator(')')) {
      loop {
        args.push(self.parse_assignment_expr(false));
        if !self.eat(Token::Punctuator(',')) {
          break;
        }
      }
    }
    let end = self.span;
    self.expect(Token::Punctuator(')'), "')'");
    (args, end)
  }

  fn parse_primary_expr(&mut self) -> Op {
    let span = self.span;
    match self.token {
      Token::This => {
        self.bump();
        Op::new(OpKind::This, Value::undefined(), span)
      }
      Token::Null => {
        self.bump();
        Op::new(OpKind::Value, Value::null(), span)
      }
      Token::True => {
        self.bump();
        Op::new(OpKind::Value, Value::boolean(true), span)
      }
      Token::False => {
        self.bump();
        Op::new(OpKind::Value, Value::boolean(false), span)
      }
      Token::Integer | Token::Binary => {
        let value = self.lexer.value;
        self.bump();
        Op::new(OpKind::Value, value, span)
      }
      Token::String => {
        let value = self.lexer.value;
        self.bump();
        Op::new(OpKind::Value, value, span)
      }
      Token::Regexp => {
        // RegExp objects remain a construct-only stub; a literal still
        // needs to parse so scripts that merely mention one don't fail
        // to compile, it just evaluates to its source text rather than
        // a real RegExp instance.
        let value = self.lexer.value;
        self.bump();
        Op::new(OpKind::Value, value, span)
      }
      Token::Identifier => {
        let key = self.identifier_key();
        self.bump();
        self.identifier_ref_op(key, span)
      }
      Token::Function => {
        self.bump();
        let name = if self.at(Token::Identifier) {
          let key = self.identifier_key();
          self.bump();
          key
        } else {
          Key::NONE
        };
        let template = self.parse_function_template(name);
        let end = self.span;
        Op::with_extra(OpKind::Function, Value::undefined(), span.join(end), OpExtra::Function(template))
      }
      Token::Punctuator('(') => {
        self.bump();
        let inner = self.parse_expression(false);
        self.expect(Token::Punctuator(')'), "')'");
        inner
      }
      Token::Punctuator('[') => self.parse_array_literal(),
      Token::Punctuator('{') => self.parse_object_literal(),
      _ => {
        self.record_error(SyntaxError::new("expected expression", span));
        self.bump();
        Op::new(OpKind::Value, Value::undefined(), span)
      }
    }
  }

  /// Resolves an identifier to its statically-known slot, if any (see
  /// `Parser::resolve`), otherwise falls back to a dynamic `GetLocal`.
  pub(super) fn identifier_ref_op(&mut self, key: Key, span: Span) -> Op {
    match self.resolve(key) {
      Resolution::Local(index) => Op::with_pair(OpKind::GetLocalSlot, Value::undefined(), span, index),
      Resolution::Parent { depth, index } => Op::with_pair(
        OpKind::GetParentSlot,
        Value::undefined(),
        span,
        crate::op::parent_slot_pair(depth, index),
      ),
      Resolution::Dynamic => Op::new(OpKind::GetLocal, Value::key(key), span),
    }
  }

  fn parse_array_literal(&mut self) -> Op {
    let start = self.span;
    self.expect(Token::Punctuator('['), "'['");
    let mut elements = Vec::new();
    while !self.at(Token::Punctuator(']')) && !self.at(Token::End) {
      if self.at(Token::Punctuator(',')) {
        elements.push(Op::new(OpKind::Value, Value::undefined(), self.span));
        self.bump();
        continue;
      }
      elements.push(self.parse_assignment_expr(false));
      if !self.eat(Token::Punctuator(',')) {
        break;
      }
    }
    let end = self.span;
    self.expect(Token::Punctuator(']'), "']'");
    Op::with_children(OpKind::Array, Value::undefined(), start.join(end), elements)
  }

  fn parse_object_literal(&mut self) -> Op {
    let start = self.span;
    self.expect(Token::Punctuator('{'), "'{'");
    let mut properties = Vec::new();
    while !self.at(Token::Punctuator('}')) && !self.at(Token::End) {
      properties.push(self.parse_property_assignment());
      if !self.eat(Token::Punctuator(',')) {
        break;
      }
    }
    let end = self.span;
    self.expect(Token::Punctuator('}'), "'}'");
    Op::with_children(OpKind::Object, Value::undefined(), start.join(end), properties)
  }

  fn parse_property_assignment(&mut self) -> Op {
    let start = self.span;
    // `get`/`set` are contextual: only treated as an accessor
    // introducer when followed by a property name rather than `:`.
    if self.at(Token::Identifier) && (self.lexer.text.as_str() == "get" || self.lexer.text.as_str() == "set") {
      let is_getter = self.lexer.text.as_str() == "get";
      let checkpoint = self.span;
      self.bump();
      if self.is_property_name_start() && !self.at(Token::Punctuator(':')) {
        let name = self.parse_property_name();
        let template = self.parse_function_template(Key::NONE);
        let end = self.span;
        let func = Op::with_extra(
          OpKind::Function,
          Value::undefined(),
          checkpoint.join(end),
          OpExtra::Function(template),
        );
        let mut prop = Op::with_extra(
          OpKind::Property,
          Value::key(name),
          start.join(end),
          OpExtra::Accessor(is_getter),
        );
        prop.children.push(func);
        return prop;
      }
      // Not actually an accessor: treat `get`/`set` as a plain key.
      let name = self.keys.intern(if is_getter { "get" } else { "set" });
      self.expect(Token::Punctuator(':'), "':'");
      let value = self.parse_assignment_expr(false);
      let end = value.text;
      return Op::with_children(OpKind::Property, Value::key(name), start.join(end), vec![value]);
    }

    let name = self.parse_property_name();
    self.expect(Token::Punctuator(':'), "':'");
    let value = self.parse_assignment_expr(false);
    let end = value.text;
    Op::with_children(OpKind::Property, Value::key(name), start.join(end), vec![value])
  }

  /// Property names accept identifiers *and* reserved words (`{ if: 1 }`,
  /// `obj.default`) — only punctuation/end-of-input can't start one.
  fn is_property_name_start(&self) -> bool {
    !matches!(self.token, Token::Punctuator(_) | Token::End | Token::Error)
  }

  fn parse_property_name(&mut self) -> Key {
    match self.token {
      Token::String => {
        let key = match self.lexer.value {
          Value::Text(t) => self.keys.intern(t.as_str()),
          _ => Key::NONE,
        };
        self.bump();
        key
      }
      Token::Integer | Token::Binary => {
        let text = self.lexer.text.as_str().to_string();
        self.bump();
        self.keys.intern(&text)
      }
      Token::Punctuator(_) | Token::End | Token::Error => {
        self.record_error(SyntaxError::new("expected property name", self.span));
        Key::NONE
      }
      // Any other token's underlying identifier text is available
      // regardless of whether the lexer classified it as a keyword.
      _ => {
        let key = self.identifier_key();
        self.bump();
        key
      }
    }
  }
}
