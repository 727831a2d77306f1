//! Recursive-descent parser that emits the op tree directly — there is
//! no separate AST stage (§4.5).
//!
//! Laid out the way the teacher splits a hand-written recursive-descent
//! parser: this module holds the driver, token-handling helpers, and
//! scope/hoisting bookkeeping; `parser/expr.rs` the expression grammar
//! (precedence climbing, one method per level); `parser/stmt.rs` the
//! statement grammar.

mod common;
mod expr;
mod stmt;

use std::rc::Rc;

use ecc_span::Span;

use crate::input::Input;
use crate::key::{Key, Keys};
use crate::lexer::{Lexer, Token};
use crate::op::{FunctionTemplate, Op, OpKind};
use crate::syntax::SyntaxError;
use crate::value::Value;

/// Tracks the hoisted names of one function's (or the top-level
/// program's) scope, so identifier references can be resolved to a
/// fixed slot index at parse time (§4.5 "Local-slot optimization")
/// instead of a dynamic by-key lookup.
struct FunctionScope {
  locals: Vec<Key>,
  needs_arguments: bool,
}

impl FunctionScope {
  fn new() -> Self {
    FunctionScope {
      locals: Vec::new(),
      needs_arguments: false,
    }
  }

  /// Registers `key` as a hoisted local if it isn't already, returning
  /// its slot index either way.
  fn register(&mut self, key: Key) -> u32 {
    if let Some(idx) = self.locals.iter().position(|&k| k == key) {
      return idx as u32;
    }
    self.locals.push(key);
    (self.locals.len() - 1) as u32
  }
}

/// Where an identifier resolved to, decided at parse time from the
/// scope stack built up so far (see `Parser::resolve`).
enum Resolution {
  /// Slot `index` of the *current* function's environment.
  Local(u32),
  /// Slot `index` of an environment `depth` hops up the prototype chain.
  Parent { depth: u32, index: u32 },
  /// Not statically known (global, or referenced before its hoisted
  /// declaration was registered) — falls back to a dynamic by-key
  /// lookup that walks the environment chain at run time. Always
  /// correct, just not slot-optimized.
  Dynamic,
}

pub struct Parser<'a> {
  lexer: Lexer<'a>,
  token: Token,
  span: Span,
  keys: &'a mut Keys,
  /// §4.5 "first error wins": the parser keeps going after the first
  /// failure just far enough to stay token-synchronized, but only the
  /// first error is ever reported.
  error: Option<SyntaxError>,
  /// `scopes[0]` is the outermost program scope, never slot-optimized
  /// (see `Parser::resolve` for why); `scopes[1..]` are nested function
  /// scopes, eligible for `Local`/`Parent` slot resolution.
  scopes: Vec<FunctionScope>,
  loop_depth: u32,
  switch_depth: u32,
  /// Labels of the statement(s) directly enclosing the point currently
  /// being parsed, innermost last, for labeled `break`/`continue`.
  labels: Vec<Key>,
}

/// Parse a whole program into its implicit top-level function template
/// (§4.5: "the outermost program, which is treated as an implicit
/// function"). If the source contains a syntax error, the returned body
/// is the degenerate one-op program that throws a `SyntaxError` value as
/// soon as it runs.
///
/// Takes the owning [`Input`] (rather than a bare `&str`) so that any
/// escape-decoded string literal buffers the lexer accumulates while
/// scanning can be handed off to it before the `Parser` is torn down —
/// see `Input::retain_escaped`. Without this, a `Text` produced from an
/// escape sequence would point into a buffer freed the moment this
/// function returns.
pub fn parse_program(input: &mut Input, keys: &mut Keys) -> Rc<FunctionTemplate> {
  let source = input.as_str();
  let source_len = source.len();
  let mut parser = Parser::new(source, keys);
  parser.scopes.push(FunctionScope::new());
  let mut body = parser.parse_statement_list_until_end();
  let scope = parser.scopes.pop().unwrap();
  if let Some(err) = parser.error.take() {
    body = vec![syntax_error_throw(&err, parser.keys)];
  }
  let escaped = parser.lexer.take_escaped();
  drop(parser);
  input.retain_escaped(escaped);
  Rc::new(FunctionTemplate {
    name: Key::NONE,
    params: Vec::new(),
    locals: scope.locals,
    body,
    needs_arguments: scope.needs_arguments,
    text: (0..source_len).into(),
  })
}

/// Builds the single-statement body of a program that failed to parse:
/// `throw <message>` as soon as it runs. `Throw`'s one child is the
/// expression producing the value to throw; here that's just the
/// interned error message rather than a constructed `Error` object,
/// since the parser has no `Pool` to allocate one — `vm::exec`'s
/// top-level uncaught-throw handling stringifies either kind the same
/// way. The message is prefixed with the kind name itself (there being
/// no `Error` object to carry it as a `.name` property) so a diagnostic
/// printed from this thrown value still reads as `SyntaxError: ...`.
fn syntax_error_throw(err: &SyntaxError, keys: &mut Keys) -> Op {
  let message = Value::key(keys.intern(&format!("SyntaxError: {}", err.message)));
  Op::with_children(
    OpKind::Throw,
    Value::undefined(),
    err.span,
    vec![Op::new(OpKind::Value, message, err.span)],
  )
}

impl<'a> Parser<'a> {
  fn new(source: &'a str, keys: &'a mut Keys) -> Self {
    let mut lexer = Lexer::new(source);
    let token = lexer.next_token().unwrap_or(Token::Error);
    let span = lexer.span;
    let mut parser = Parser {
      lexer,
      token,
      span,
      keys,
      error: None,
      scopes: Vec::new(),
      loop_depth: 0,
      switch_depth: 0,
      labels: Vec::new(),
    };
    if let Token::Error = token {
      parser.record_error(SyntaxError::new("invalid token", parser.span));
    }
    parser
  }

  fn record_error(&mut self, err: SyntaxError) {
    if self.error.is_none() {
      self.error = Some(err);
    }
  }

  fn bump(&mut self) -> Token {
    let prev = self.token;
    match self.lexer.next_token() {
      Ok(tok) => {
        self.token = tok;
        self.span = self.lexer.span;
      }
      Err(err) => {
        self.record_error(err);
        self.token = Token::Error;
      }
    }
    prev
  }

  fn at(&self, token: Token) -> bool {
    self.token == token
  }

  fn eat(&mut self, token: Token) -> bool {
    if self.at(token) {
      self.bump();
      true
    } else {
      false
    }
  }

  fn expect(&mut self, token: Token, what: &'static str) {
    if !self.eat(token) {
      self.record_error(SyntaxError::new(format!("expected {what}"), self.span));
    }
  }

  fn intern_identifier_text(&mut self) -> Key {
    let text = self.lexer.text;
    self.keys.intern(text.as_str())
  }

  /// §4.5 automatic semicolon insertion: a statement terminator is
  /// satisfied by `;`, a following `}`, end of input, or a line break
  /// having occurred before the current token.
  fn consume_statement_terminator(&mut self) {
    if self.eat(Token::Punctuator(';')) {
      return;
    }
    if self.at(Token::Punctuator('}')) || self.at(Token::End) || self.lexer.did_line_break {
      return;
    }
    self.record_error(SyntaxError::new("expected ';'", self.span));
  }

  // --- scope / hoisting ---

  fn current_scope_mut(&mut self) -> &mut FunctionScope {
    self.scopes.last_mut().expect("at least the program scope is always present")
  }

  /// Hoists `key` into the current function's locals (§4.5 "Declarations
  /// ... are hoisted"). Used for `var` declarations, function
  /// declarations, parameters, and `catch` bindings.
  fn hoist(&mut self, key: Key) -> u32 {
    self.current_scope_mut().register(key)
  }

  /// Resolves an identifier against the scope stack built up so far.
  /// `scopes[0]` (the program) is deliberately excluded from slot
  /// resolution: builtins are installed directly on the global object
  /// before any script parses, so a parse-time slot index for a
  /// top-level name would not line up with where that name actually
  /// lands once builtins occupy the earlier slots. Dynamic `GetLocal`
  /// lookup by key is always correct there regardless.
  fn resolve(&mut self, key: Key) -> Resolution {
    if key == self.keys.predefined.arguments {
      self.current_scope_mut().needs_arguments = true;
    }
    let n = self.scopes.len();
    for i in (1..n).rev() {
      if let Some(idx) = self.scopes[i].locals.iter().position(|&k| k == key) {
        let depth = (n - 1 - i) as u32;
        return if depth == 0 {
          Resolution::Local(idx as u32)
        } else {
          Resolution::Parent { depth, index: idx as u32 }
        };
      }
    }
    Resolution::Dynamic
  }

  /// Parses a nested function's parameter list and body, pushing a fresh
  /// [`FunctionScope`] for the duration.
  fn parse_function_template(&mut self, name: Key) -> Rc<FunctionTemplate> {
    let start = self.span;
    self.scopes.push(FunctionScope::new());

    self.expect(Token::Punctuator('('), "'('");
    let mut params = Vec::new();
    if !self.at(Token::Punctuator(')')) {
      loop {
        if self.at(Token::Identifier) {
          let key = self.intern_identifier_text();
          self.bump();
          self.hoist(key);
          params.push(key);
        } else {
          self.record_error(SyntaxError::new("expected parameter name", self.span));
          break;
        }
        if !self.eat(Token::Punctuator(',')) {
          break;
        }
      }
    }
    self.expect(Token::Punctuator(')'), "')'");
    self.expect(Token::Punctuator('{'), "'{'");
    let body = self.parse_statement_list_until_brace();
    self.expect(Token::Punctuator('}'), "'}'");

    let scope = self.scopes.pop().unwrap();
    let end = self.span;
    Rc::new(FunctionTemplate {
      name,
      params,
      locals: scope.locals,
      body,
      needs_arguments: scope.needs_arguments,
      text: start.join(end),
    })
  }
}

/// Parse a function body in isolation (used by the `Function`
/// constructor builtin). Returns an error directly instead of the
/// "compile to a throw" fallback used for whole programs, since the
/// caller (a native function) can surface a proper `SyntaxError` throw
/// itself.
pub fn parse_function_body(input: &mut Input, keys: &mut Keys) -> Result<Rc<FunctionTemplate>, SyntaxError> {
  let source = input.as_str();
  let source_len = source.len();
  let mut parser = Parser::new(source, keys);
  parser.scopes.push(FunctionScope::new());
  let body = parser.parse_statement_list_until_end();
  let scope = parser.scopes.pop().unwrap();
  let error = parser.error.take();
  let escaped = parser.lexer.take_escaped();
  drop(parser);
  input.retain_escaped(escaped);
  match error {
    Some(err) => Err(err),
    None => Ok(Rc::new(FunctionTemplate {
      name: Key::NONE,
      params: Vec::new(),
      locals: scope.locals,
      body,
      needs_arguments: scope.needs_arguments,
      text: (0..source_len).into(),
    })),
  }
}
