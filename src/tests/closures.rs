//! Function expressions, closures over outer locals, and recursion.

use super::common::{eval_display, new_ecc};

#[test]
fn a_counter_closure_keeps_its_own_state() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"
    function makeCounter() {
      var count = 0;
      return function () {
        count += 1;
        return count;
      };
    }
    var counter = makeCounter();
    counter();
    counter();
    counter()
  "#;
  assert_eq!(eval_display(&mut ecc, script), "3");
}

#[test]
fn two_closures_from_the_same_maker_have_independent_state() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"
    function makeCounter() {
      var count = 0;
      return function () {
        count += 1;
        return count;
      };
    }
    var a = makeCounter();
    var b = makeCounter();
    a();
    a();
    b();
    a() + "," + b()
  "#;
  assert_eq!(eval_display(&mut ecc, script), "3,1");
}

#[test]
fn recursive_named_function_expression() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"
    function factorial(n) {
      if (n <= 1) return 1;
      return n * factorial(n - 1);
    }
    factorial(5)
  "#;
  assert_eq!(eval_display(&mut ecc, script), "120");
}

#[test]
fn this_binds_to_the_call_receiver() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"
    var obj = {
      value: 42,
      get: function () { return this.value; }
    };
    obj.get()
  "#;
  assert_eq!(eval_display(&mut ecc, script), "42");
}

#[test]
fn function_constructor_call_allocates_a_new_instance() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"
    function Point(x, y) {
      this.x = x;
      this.y = y;
    }
    var p = new Point(1, 2);
    p.x + p.y
  "#;
  assert_eq!(eval_display(&mut ecc, script), "3");
}
