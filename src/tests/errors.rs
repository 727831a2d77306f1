//! Thrown errors, `try`/`catch`, and uncaught-throw shapes (§7 error
//! taxonomy, §8 "accessor + freeze TypeError").

use super::common::{eval_display, eval_throw_display, new_ecc};

#[test]
fn throwing_a_plain_string_round_trips_through_catch() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"
    var caught = null;
    try {
      throw "boom";
    } catch (e) {
      caught = e;
    }
    caught
  "#;
  assert_eq!(eval_display(&mut ecc, script), "boom");
}

#[test]
fn new_type_error_constructs_a_real_error_object() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"
    var caught = null;
    try {
      throw new TypeError("not a function");
    } catch (e) {
      caught = e;
    }
    caught.message
  "#;
  assert_eq!(eval_display(&mut ecc, script), "not a function");
}

#[test]
fn calling_a_non_function_value_throws_type_error() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"
    var notAFunction = 5;
    notAFunction();
  "#;
  assert_eq!(eval_throw_display(&mut ecc, script), "TypeError: value is not a function");
}

#[test]
fn reading_a_property_off_undefined_throws_type_error() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"
    var x;
    x.y;
  "#;
  assert_eq!(eval_throw_display(&mut ecc, script), "TypeError: cannot read property of null or undefined");
}

#[test]
fn an_uncaught_error_carries_its_kind_and_message() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"throw new RangeError("out of bounds");"#;
  assert_eq!(eval_throw_display(&mut ecc, script), "RangeError: out of bounds");
}

#[test]
fn error_to_string_matches_the_kind_colon_message_shape() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"new SyntaxError("unexpected token").toString()"#;
  assert_eq!(eval_display(&mut ecc, script), "SyntaxError: unexpected token");
}

#[test]
fn catch_block_scopes_its_binding_to_the_block() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"
    var e = "outer";
    try {
      throw "inner";
    } catch (e) {
    }
    e
  "#;
  assert_eq!(eval_display(&mut ecc, script), "outer");
}
