//! The `arguments` object bound inside a script function body whose
//! template has `needs_arguments` set (`SPEC_FULL.md` "Supplemented
//! features", grounded on `original_source/src/builtin/arguments.c`).
//!
//! An array-like object: each positional argument becomes an element
//! slot, and `length` is simply `element_count()` — already "live" in
//! the sense §4.1 wants, since nothing here freezes it to a separate
//! cached field.

use crate::ecc::Ecc;
use crate::object::{ObjectData, PropFlags};
use crate::value::Value;

pub fn create(ecc: &mut Ecc, args: &[Value]) -> Value {
  let proto = ecc.prototypes.object;
  let handle = ecc.pool.alloc_object(ObjectData::new(Some(proto)));
  for (i, &value) in args.iter().enumerate() {
    ecc.pool.object_mut(handle).add_element(i as u32, value, PropFlags::all()).ok();
  }
  Value::object(handle)
}
