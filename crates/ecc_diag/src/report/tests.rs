use super::Report;

#[test]
fn single_line_caret_points_at_span() {
  let report = Report::error("SyntaxError")
    .color(false)
    .build("var 3abc = 1", "identifier after number literal", 4..8);
  let rendered = report.emit_to_string().unwrap();
  assert!(rendered.contains("SyntaxError: identifier after number literal"));
  assert!(rendered.contains("3abc"));
  assert!(rendered.contains("^~~~"));
}

#[test]
fn out_of_bounds_span_is_rejected() {
  let report = Report::error("SyntaxError").color(false).build("ab", "oops", 5..6);
  assert!(report.emit_to_string().is_err());
}

#[test]
fn caret_width_matches_span_width() {
  let report = Report::error("ReferenceError")
    .color(false)
    .build("let x = y", "y is not defined", 8..9);
  let rendered = report.emit_to_string().unwrap();
  assert!(rendered.lines().any(|l| l.trim_end() == "| ^"));
}
