use boristype_test_helpers::{compile, strip_helpers};
use indoc::indoc;

#[test]
fn test_object_rest_collects_remaining_keys() {
    let output = compile("const { a, b, ...rest } = { a: 1, b: 2, c: 3 };").unwrap();
    assert!(output.starts_with("function ___btp_object_rest(obj, exclude) {"));
    assert_eq!(
        strip_helpers(&output),
        indoc! {r#"
            var _obj = { a: 1, b: 2, c: 3 };
            var a = _obj.a;
            var b = _obj.b;
            var rest = ___btp_object_rest(_obj, ["a", "b"]);
        "#}
    );
}

#[test]
fn test_array_rest_starts_after_bound_elements() {
    let output = compile("const [first, second, ...rest] = [10, 20, 30];").unwrap();
    assert_eq!(
        strip_helpers(&output),
        indoc! {"
            var _arr = ArrayDirect([10, 20, 30]);
            var first = _arr[0];
            var second = _arr[1];
            var rest = ___btp_array_rest(_arr, 2);
        "}
    );
}

#[test]
fn test_nested_rest_throws_at_run_time() {
    let output = compile("const { a: { ...inner } } = o;").unwrap();
    assert!(output.contains("function ___btp_not_supported(message) {"));
    assert!(output.contains(
        r#"var inner = ___btp_not_supported("Rest elements in nested destructuring patterns are not supported");"#
    ));
}

#[test]
fn test_for_of_pattern_head_flattened() {
    let output = compile("const pairs = [[1, 2]]; for (const [k, v] of pairs) log(k, v);").unwrap();
    assert!(!output.contains("[k, v]"));
    assert!(output.contains("_arr_loop1 = ArrayDirect(__items[__index_loop1]);"));
    assert!(output.contains("log(k_loop1, v_loop1);"));
}

#[test]
fn test_parameter_patterns_read_from_reference() {
    let output = compile("function area({ w, h }) { return w * h; }").unwrap();
    assert!(output.contains("function area(_ref) {"));
    assert!(output.contains("var w = _ref.w;"));
    assert!(output.contains("var h = _ref.h;"));
}
