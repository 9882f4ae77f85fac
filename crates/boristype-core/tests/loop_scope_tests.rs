use boristype_test_helpers::{compile, fixtures};

#[test]
fn test_for_of_accumulates_through_indexed_loop() {
    let output = compile(
        "const out = [];\nfor (const x of [1, 2, 3]) {\n    out.push(x * 2);\n}\n",
    )
    .unwrap();
    assert!(output.contains("var __items = [1, 2, 3];"));
    assert!(output.contains("var x_loop1 = null;"));
    assert!(output.contains(
        "for (__index_loop1 = 0; __index_loop1 < ArrayCount(__items); __index_loop1++) {"
    ));
    assert!(output.contains("    x_loop1 = __items[__index_loop1];\n    out.push(x_loop1 * 2);\n"));
    assert!(!output.contains("let "));
    assert!(!output.contains("const "));
}

#[test]
fn test_nested_loop_locals_never_collide() {
    let output = compile(fixtures::NESTED_LOOPS).unwrap();
    assert!(output.contains("var i_loop1 = undefined;"));
    assert!(output.contains("var row_loop1 = null;"));
    assert!(output.contains("var j_loop2 = undefined;"));
    assert!(output.contains("var cell_loop2 = null;"));
    assert!(output.contains("out.push(cell_loop2);"));
}

#[test]
fn test_closures_keep_their_own_parameters() {
    let output = compile("for (let i = 0; i < 2; i++) { handlers.push(function(i) { return i; }); }").unwrap();
    assert!(output.contains("handlers.push(function(i) {\n        return i;\n    });"));
}

#[test]
fn test_shadowing_block_keeps_outer_binding() {
    let output = compile("let x = 1; { let x = 2; log(x); } log(x);").unwrap();
    assert_eq!(output, "var x = 1;\n{\n    var x_1 = 2;\n    log(x_1);\n}\nlog(x);\n");
}

#[test]
fn test_block_constant_does_not_overwrite_parameter() {
    let output = compile("function f(x) { if (c) { const x = 2; } return x; }").unwrap();
    assert!(output.contains("var x_1 = 2;"));
    assert!(output.contains("return x;"));
}

#[test]
fn test_shadowing_inside_loop_keeps_bindings_apart() {
    let output = compile("while (c) { const x = 1; if (d) { const x = 2; } log(x); }").unwrap();
    assert!(output.contains("var x_loop1 = null;\nvar x_loop1_1 = null;\n"));
    assert!(output.contains("x_loop1_1 = 2;"));
    assert!(output.contains("log(x_loop1);"));
}
