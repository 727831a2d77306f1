//! Standard library surface: `Math`, `Array`/`String` prototypes,
//! `parseInt`/`parseFloat`, `print`, `JSON.parse`.

use super::common::{eval_display, new_ecc};

#[test]
fn print_writes_space_joined_values_to_output() {
  let (mut ecc, out) = new_ecc();
  eval_display(&mut ecc, r#"print("a", 1, true);"#);
  assert_eq!(out.contents(), "a 1 true\n");
}

#[test]
fn math_functions_cover_the_usual_namespace() {
  let (mut ecc, _out) = new_ecc();
  assert_eq!(eval_display(&mut ecc, "Math.floor(4.7)"), "4");
  assert_eq!(eval_display(&mut ecc, "Math.max(1, 5, 3)"), "5");
  assert_eq!(eval_display(&mut ecc, "Math.min(1, 5, 3)"), "1");
  assert_eq!(eval_display(&mut ecc, "Math.abs(-7)"), "7");
  assert_eq!(eval_display(&mut ecc, "Math.pow(2, 10)"), "1024");
}

#[test]
fn parse_int_and_parse_float_coerce_leading_numeric_text() {
  let (mut ecc, _out) = new_ecc();
  assert_eq!(eval_display(&mut ecc, r#"parseInt("42px")"#), "42");
  assert_eq!(eval_display(&mut ecc, r#"parseInt("0xFF")"#), "255");
  assert_eq!(eval_display(&mut ecc, r#"parseFloat("3.14 meters")"#), "3.14");
}

#[test]
fn is_nan_and_is_finite_report_on_coerced_numbers() {
  let (mut ecc, _out) = new_ecc();
  assert_eq!(eval_display(&mut ecc, r#"isNaN("not a number")"#), "true");
  assert_eq!(eval_display(&mut ecc, "isFinite(1 / 0)"), "false");
}

#[test]
fn array_push_pop_and_join_mutate_in_place() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"
    var a = [1, 2];
    a.push(3);
    var popped = a.pop();
    a.join("-") + "/" + popped
  "#;
  assert_eq!(eval_display(&mut ecc, script), "1-2/3");
}

#[test]
fn array_index_of_and_slice() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"
    var a = [10, 20, 30, 40];
    a.indexOf(30) + "," + a.slice(1, 3).join(",")
  "#;
  assert_eq!(eval_display(&mut ecc, script), "2,20,30");
}

#[test]
fn array_for_each_visits_every_element_in_order() {
  let (mut ecc, out) = new_ecc();
  let script = r#"
    [1, 2, 3].forEach(function (v) { print(v); });
  "#;
  eval_display(&mut ecc, script);
  assert_eq!(out.contents(), "1\n2\n3\n");
}

#[test]
fn string_methods_cover_the_usual_surface() {
  let (mut ecc, _out) = new_ecc();
  assert_eq!(eval_display(&mut ecc, r#""hello".toUpperCase()"#), "HELLO");
  assert_eq!(eval_display(&mut ecc, r#""HELLO".toLowerCase()"#), "hello");
  assert_eq!(eval_display(&mut ecc, r#""  hi  ".trim()"#), "hi");
  assert_eq!(eval_display(&mut ecc, r#""hello".charAt(1)"#), "e");
  assert_eq!(eval_display(&mut ecc, r#""hello".indexOf("ll")"#), "2");
  assert_eq!(eval_display(&mut ecc, r#""a,b,c".split(",").join("-")"#), "a-b-c");
}

#[test]
fn function_call_and_apply_set_this_and_forward_arguments() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"
    function sum(a, b) { return this.base + a + b; }
    var ctx = { base: 10 };
    sum.call(ctx, 1, 2) + "," + sum.apply(ctx, [3, 4])
  "#;
  assert_eq!(eval_display(&mut ecc, script), "13,17");
}

#[test]
fn function_bind_fixes_this_for_later_calls() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"
    function getBase() { return this.base; }
    var bound = getBase.bind({ base: 99 });
    bound()
  "#;
  assert_eq!(eval_display(&mut ecc, script), "99");
}

#[test]
fn json_parse_evaluates_a_literal_value() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"
    var o = JSON.parse('{"a": 1, "b": [2, 3]}');
    o.a + o.b[0] + o.b[1]
  "#;
  assert_eq!(eval_display(&mut ecc, script), "6");
}
