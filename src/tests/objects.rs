//! Object/array literals, element vs. named property storage, and
//! prototype-chain lookups (§8 "array element vs. property").

use super::common::{eval_display, eval_throw_display, new_ecc};

#[test]
fn array_literal_elements_are_indexable() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"
    var a = [10, 20, 30];
    a[0] + a[1] + a[2]
  "#;
  assert_eq!(eval_display(&mut ecc, script), "60");
}

#[test]
fn array_length_tracks_the_highest_assigned_index() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"
    var a = [1, 2, 3];
    a[5] = 6;
    a.length
  "#;
  assert_eq!(eval_display(&mut ecc, script), "6");
}

#[test]
fn numeric_index_and_named_property_are_independent_stores() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"
    var o = {};
    o[0] = "element";
    o.index = "a name that happens to look numeric-ish, but isn't";
    o[0] + "," + o.index
  "#;
  assert_eq!(eval_display(&mut ecc, script), "element,a name that happens to look numeric-ish, but isn't");
}

#[test]
fn property_lookup_walks_the_prototype_chain() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"
    function Animal() {}
    Animal.prototype.speak = function () { return "..."; };
    var a = new Animal();
    a.speak()
  "#;
  assert_eq!(eval_display(&mut ecc, script), "...");
}

#[test]
fn own_property_shadows_the_prototype() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"
    function Animal() {}
    Animal.prototype.speak = function () { return "generic"; };
    var a = new Animal();
    a.speak = function () { return "specific"; };
    a.speak()
  "#;
  assert_eq!(eval_display(&mut ecc, script), "specific");
}

#[test]
fn object_freeze_throws_on_a_write_to_an_existing_property() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"
    var o = { x: 1 };
    Object.freeze(o);
    o.x = 2;
  "#;
  assert_eq!(eval_throw_display(&mut ecc, script), "TypeError: \"x\" is read-only");
}

#[test]
fn object_freeze_throws_on_adding_a_new_property() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"
    var o = { x: 1 };
    Object.freeze(o);
    o.y = 2;
  "#;
  assert_eq!(eval_throw_display(&mut ecc, script), "TypeError: object is not extensible");
}

#[test]
fn object_keys_enumerates_own_properties_in_insertion_order() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"
    var o = { z: 1, a: 2, m: 3 };
    Object.keys(o).join(",")
  "#;
  assert_eq!(eval_display(&mut ecc, script), "z,a,m");
}

#[test]
fn accessor_property_getter_runs_on_read() {
  let (mut ecc, _out) = new_ecc();
  let script = r#"
    var o = {};
    Object.defineProperty(o, "value", {
      get: function () { return 42; }
    });
    o.value
  "#;
  assert_eq!(eval_display(&mut ecc, script), "42");
}
