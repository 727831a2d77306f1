use super::*;

impl<'a> Parser<'a> {
  /// Validates that `op` denotes something a reference op can target —
  /// a variable or a member/property access — recording a syntax error
  /// otherwise (`1 = 2`, `(a + b)++`). Unlike the original's "convert to
  /// reference" pass over the last-pushed flat op, there's nothing to
  /// mutate here: `op` is already the right shape, callers just wrap it
  /// as the target child of the `*Ref` op they're building.
  pub(super) fn assert_reference(&mut self, op: &Op) {
    if !matches!(
      op.kind,
      OpKind::GetLocal | OpKind::GetLocalSlot | OpKind::GetParentSlot | OpKind::GetProperty | OpKind::GetMember
    ) {
      self.record_error(SyntaxError::new("invalid assignment target", op.text));
    }
  }

  pub(super) fn identifier_key(&mut self) -> Key {
    self.intern_identifier_text()
  }
}
