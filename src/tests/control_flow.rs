//! Loops, `try`/`catch`/`finally`, and `for`-`in` (§8 "for-loop fusion
//! producing `IterateLessRef`", "try/finally-return semantics").

use super::common::{eval_display, new_ecc};

#[test]
fn while_loop_accumulates() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"
    var i = 0;
    var sum = 0;
    while (i < 5) {
      sum += i;
      i++;
    }
    sum
  "#;
  assert_eq!(eval_display(&mut ecc, script), "10");
}

#[test]
fn for_loop_counts_to_ten() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"
    var total = 0;
    for (var i = 0; i < 10; i++) {
      total += i;
    }
    total
  "#;
  assert_eq!(eval_display(&mut ecc, script), "45");
}

#[test]
fn break_exits_the_loop_early() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"
    var i = 0;
    for (;;) {
      if (i == 3) break;
      i++;
    }
    i
  "#;
  assert_eq!(eval_display(&mut ecc, script), "3");
}

#[test]
fn continue_skips_the_rest_of_the_body() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"
    var sum = 0;
    for (var i = 0; i < 5; i++) {
      if (i == 2) continue;
      sum += i;
    }
    sum
  "#;
  assert_eq!(eval_display(&mut ecc, script), "8");
}

#[test]
fn for_in_visits_own_enumerable_keys() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"
    var o = { a: 1, b: 2, c: 3 };
    var names = "";
    for (var k in o) {
      names += k;
    }
    names
  "#;
  assert_eq!(eval_display(&mut ecc, script), "abc");
}

#[test]
fn finally_runs_even_after_a_caught_throw() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"
    var log = "";
    try {
      log += "t";
      throw "boom";
    } catch (e) {
      log += "c";
    } finally {
      log += "f";
    }
    log
  "#;
  assert_eq!(eval_display(&mut ecc, script), "tcf");
}

#[test]
fn a_return_in_finally_overrides_the_try_blocks_return() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"
    function f() {
      try {
        return 1;
      } finally {
        return 2;
      }
    }
    f()
  "#;
  assert_eq!(eval_display(&mut ecc, script), "2");
}
