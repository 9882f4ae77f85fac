use boristype_core::config::CompilerConfig;
use boristype_core::helpers::Helper;
use boristype_core::pipeline::Pipeline;
use boristype_core::typeinfo::UnknownTypes;
use boristype_test_helpers::{compile, compile_with, fixtures, lower, lower_with_oracle};
use proptest::prelude::*;

#[test]
fn test_standard_pass_order() {
    assert_eq!(
        Pipeline::new().pass_names(),
        vec![
            "identifier-sanitizer",
            "module-syntax",
            "functional-chain",
            "syntax-sugar",
            "for-of",
            "builtin-dispatch",
            "spread",
            "destructuring",
            "loop-scope",
        ]
    );
}

#[test]
fn test_helpers_prepended_once_in_catalog_order() {
    let output = compile(
        "const { a: { ...r } } = o; const { b, ...s } = p; const c = { ...d }; const e = { ...f };",
    )
    .unwrap();
    let object_rest = output.find("function ___btp_object_rest(").unwrap();
    let not_supported = output.find("function ___btp_not_supported(").unwrap();
    let object_union = output.find("function ObjectUnion(").unwrap();
    assert!(object_rest < not_supported);
    assert!(not_supported < object_union);
    assert_eq!(output.matches("function ObjectUnion(").count(), 1);
    assert!(!output.contains("function ___btp_array_rest("));
}

#[test]
fn test_primitives_never_injected() {
    let output = lower("const r = [...a]; const n = [1].length;").unwrap();
    assert!(output.helpers.contains(Helper::ArrayUnion));
    assert!(output.helpers.contains(Helper::ArrayCount));
    assert_eq!(output.helpers.injectables().count(), 0);
}

#[test]
fn test_unknown_oracle_skips_type_gated_rewrites() {
    let output = lower_with_oracle("const xs: number[] = [1]; log(xs.length, xs.at(0));", &UnknownTypes).unwrap();
    assert!(output.contains("log(xs.length, xs.at(0));"));
}

#[test]
fn test_kitchen_sink_has_no_modern_syntax_left() {
    let output = compile(fixtures::KITCHEN_SINK).unwrap();
    for construct in ["=>", "...", "`", "let ", "const ", " of ", "import ", "export "] {
        assert!(!output.contains(construct), "`{}` left in:\n{}", construct, output);
    }
}

#[test]
fn test_module_syntax_removed() {
    let output = compile("import x from \"./x\";\nexport const y = x;\nexport { y as z };\n").unwrap();
    assert_eq!(output, "var y = x;\n");
}

#[test]
fn test_xml_init_marker_wraps_output() {
    let output = compile("/// @xml-init\nlog(1);").unwrap();
    assert!(output.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<SPXML-INLINE-FORM>\n"));
    assert!(output.contains("\t\tlog(1);\n"));
    assert!(output.ends_with("\t\"/>\n</SPXML-INLINE-FORM>"));
}

#[test]
fn test_escape_non_ascii_option() {
    let mut config = CompilerConfig::default();
    config.compiler_options.escape_non_ascii = true;
    let output = compile_with("log(\"привет\");", config).unwrap();
    assert_eq!(output, "log(\"\\u043F\\u0440\\u0438\\u0432\\u0435\\u0442\");\n");
}

#[test]
fn test_lowering_is_stable_on_lowered_output() {
    let first = compile(fixtures::NESTED_LOOPS).unwrap();
    let second = compile(&first).unwrap();
    assert_eq!(first, second);
}

fn statement() -> impl Strategy<Value = String> {
    let name = "v_[a-z]{1,5}";
    prop_oneof![
        (name, 0u32..1000).prop_map(|(n, v)| format!("var {} = {};", n, v)),
        (name, name, 0u32..10).prop_map(|(a, b, v)| format!("var {} = {} * {} + 1;", a, b, v)),
        (name, name).prop_map(|(f, a)| format!("{}({});", f, a)),
        (name, name).prop_map(|(a, b)| format!("if ({}) {{\n    {}();\n}}", a, b)),
    ]
}

proptest! {
    #[test]
    fn test_plain_programs_are_unchanged(statements in prop::collection::vec(statement(), 1..8)) {
        let source = format!("{}\n", statements.join("\n"));
        let output = compile(&source).unwrap();
        prop_assert_eq!(&output, &source);
        prop_assert_eq!(compile(&output).unwrap(), output);
    }
}
