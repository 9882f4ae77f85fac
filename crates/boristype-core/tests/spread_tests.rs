use boristype_test_helpers::{compile, strip_helpers};

#[test]
fn test_array_spread_concatenates_in_order() {
    let output = compile("const r = [10, 11, 12, ...[1, 2, 3], ...[4, 5, 6]];").unwrap();
    assert_eq!(output, "var r = ArrayUnion([10, 11, 12], [1, 2, 3], [4, 5, 6]);\n");
}

#[test]
fn test_object_spread_later_sources_win() {
    let output = compile("const merged = { ...defaults, ...overrides };").unwrap();
    assert!(output.starts_with("function ObjectUnion(obj1, obj2) {"));
    assert_eq!(strip_helpers(&output), "var merged = ObjectUnion(defaults, overrides);\n");
}

#[test]
fn test_spread_call_inside_expression() {
    let output = compile("log([...a, 1].length);").unwrap();
    assert_eq!(output, "log(ArrayCount(ArrayUnion(a, [1])));\n");
}
