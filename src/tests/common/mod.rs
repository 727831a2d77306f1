//! Shared test harness: an `Ecc` with its `print` output captured into
//! an in-memory buffer, plus small assertion helpers built on it.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use crate::ecc::Ecc;
use crate::value::{Display, Value};

#[derive(Clone, Default)]
pub struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl io::Write for SharedBuf {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self.0.borrow_mut().extend_from_slice(buf);
    Ok(buf.len())
  }
  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

impl SharedBuf {
  pub fn contents(&self) -> String {
    String::from_utf8(self.0.borrow().clone()).expect("test output is not valid utf8")
  }
}

/// A fresh engine with its `print` output captured rather than going to
/// `stdout`, the way the teacher's `Hebi::with_io` harness does.
pub fn new_ecc() -> (Ecc, SharedBuf) {
  let mut ecc = Ecc::new();
  let buf = SharedBuf::default();
  ecc.set_output(Box::new(buf.clone()));
  (ecc, buf)
}

/// Evaluates `source` as a top-level program and returns the resulting
/// value rendered the way `print`/string concatenation would.
pub fn eval_display(ecc: &mut Ecc, source: &str) -> String {
  let global = ecc.global;
  match ecc.eval_input_with_context(source, global, Value::undefined()) {
    Ok(v) => format!(
      "{}",
      Display {
        value: &v,
        pool: &ecc.pool,
        keys: &ecc.keys,
      }
    ),
    Err(t) => panic!(
      "unexpected throw: {}",
      Display {
        value: &t.value,
        pool: &ecc.pool,
        keys: &ecc.keys,
      }
    ),
  }
}

/// Like [`eval_display`], but expects the program to throw, and returns
/// the thrown value's rendered form (`"TypeError: message"` for a real
/// `Error`, or the bare value otherwise).
pub fn eval_throw_display(ecc: &mut Ecc, source: &str) -> String {
  let global = ecc.global;
  match ecc.eval_input_with_context(source, global, Value::undefined()) {
    Ok(v) => panic!(
      "expected a throw, got: {}",
      Display {
        value: &v,
        pool: &ecc.pool,
        keys: &ecc.keys,
      }
    ),
    Err(t) => format!(
      "{}",
      Display {
        value: &t.value,
        pool: &ecc.pool,
        keys: &ecc.keys,
      }
    ),
  }
}
