//! Arithmetic and coercion (§8 "`\"1\" + 2 * 3`" and friends).

use super::common::{eval_display, new_ecc};

#[test]
fn string_concatenation_beats_addition_precedence() {
  let (mut ecc, _out) = new_ecc();
  assert_eq!(eval_display(&mut ecc, r#""1" + 2 * 3"#), "16");
}

#[test]
fn numeric_addition_stays_numeric() {
  let (mut ecc, _out) = new_ecc();
  assert_eq!(eval_display(&mut ecc, "1 + 2 * 3"), "7");
}

#[test]
fn integral_results_print_without_a_decimal_point() {
  let (mut ecc, _out) = new_ecc();
  assert_eq!(eval_display(&mut ecc, "10 / 2"), "5");
}

#[test]
fn fractional_division_keeps_its_decimal_point() {
  let (mut ecc, _out) = new_ecc();
  assert_eq!(eval_display(&mut ecc, "1 / 4"), "0.25");
}

#[test]
fn string_to_number_coercion_in_subtraction() {
  let (mut ecc, _out) = new_ecc();
  assert_eq!(eval_display(&mut ecc, r#""10" - "4""#), "6");
}

#[test]
fn loose_equality_coerces_string_to_number() {
  let (mut ecc, _out) = new_ecc();
  assert_eq!(eval_display(&mut ecc, r#"("5" == 5)"#), "true");
}

#[test]
fn strict_equality_does_not_coerce() {
  let (mut ecc, _out) = new_ecc();
  assert_eq!(eval_display(&mut ecc, r#"("5" === 5)"#), "false");
}

#[test]
fn bitwise_operators_truncate_to_int32() {
  let (mut ecc, _out) = new_ecc();
  assert_eq!(eval_display(&mut ecc, "5 & 3"), "1");
  assert_eq!(eval_display(&mut ecc, "5 | 2"), "7");
  assert_eq!(eval_display(&mut ecc, "~0"), "-1");
}

#[test]
fn increment_and_decrement_operators() {
  let (mut ecc, _out) = new_ecc();
  assert_eq!(
    eval_display(
      &mut ecc,
      r#"
      var x = 5;
      x++;
      x
      "#
    ),
    "6"
  );
}
