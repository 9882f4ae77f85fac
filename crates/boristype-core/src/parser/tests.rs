use super::*;
use crate::ast::expression::*;
use crate::ast::pattern::Pattern;
use crate::ast::statement::*;
use crate::ast::types::TypeKind;

fn parse(source: &str) -> Program {
    parse_source(source).expect("Parse failed")
}

fn parse_error(source: &str) -> ParserError {
    match parse_source(source) {
        Ok(_) => panic!("Expected a parse error for {:?}", source),
        Err(error) => error,
    }
}

fn first_expression(source: &str) -> Expression {
    match parse(source).statements.into_iter().next() {
        Some(Statement::Expression(expr)) => expr,
        other => panic!("Expected expression statement, got {:?}", other),
    }
}

#[test]
fn test_parse_variable_declaration() {
    let program = parse("const x: number = 42;");
    assert_eq!(program.statements.len(), 1);

    match &program.statements[0] {
        Statement::Variable(decl) => {
            assert_eq!(decl.kind, VariableKind::Const);
            assert_eq!(decl.declarators.len(), 1);
            let declarator = &decl.declarators[0];
            assert!(matches!(
                declarator.type_annotation.as_ref().map(|t| &t.kind),
                Some(TypeKind::Number)
            ));
            assert!(declarator.initializer.is_some());
        }
        _ => panic!("Expected variable declaration"),
    }
}

#[test]
fn test_parse_multiple_declarators_without_semicolons() {
    let program = parse("let a = 1, b\nvar c = a");
    assert_eq!(program.statements.len(), 2);
    match &program.statements[0] {
        Statement::Variable(decl) => {
            assert_eq!(decl.declarators.len(), 2);
            assert!(decl.declarators[1].initializer.is_none());
        }
        _ => panic!("Expected variable declaration"),
    }
}

#[test]
fn test_parse_destructuring_patterns() {
    let program = parse("const { a, b: { c = 1 }, ...rest } = obj; const [x, , y = 2, ...tail] = arr;");

    match &program.statements[0] {
        Statement::Variable(decl) => match &decl.declarators[0].pattern {
            Pattern::Object(object) => {
                assert_eq!(object.properties.len(), 2);
                assert!(matches!(object.properties[1].value, Pattern::Object(_)));
                assert_eq!(object.rest.as_ref().map(|r| r.node.as_str()), Some("rest"));
            }
            _ => panic!("Expected object pattern"),
        },
        _ => panic!("Expected variable declaration"),
    }

    match &program.statements[1] {
        Statement::Variable(decl) => match &decl.declarators[0].pattern {
            Pattern::Array(array) => {
                assert_eq!(array.elements.len(), 3);
                assert!(array.elements[1].is_none());
                assert!(array.elements[2].as_ref().and_then(|e| e.default.as_ref()).is_some());
                assert_eq!(array.rest.as_ref().map(|r| r.node.as_str()), Some("tail"));
            }
            _ => panic!("Expected array pattern"),
        },
        _ => panic!("Expected variable declaration"),
    }
}

#[test]
fn test_rest_element_must_be_last() {
    let error = parse_error("const [...a, b] = arr;");
    assert!(error.message.contains("after rest element"));
}

#[test]
fn test_parse_function_declaration() {
    let program = parse("function add(a: number, b: number = 1): number { return a + b; }");
    match &program.statements[0] {
        Statement::Function(func) => {
            assert_eq!(func.name.node, "add");
            assert_eq!(func.parameters.len(), 2);
            assert!(func.parameters[1].default.is_some());
            assert!(func.return_type.is_some());
            assert_eq!(func.body.statements.len(), 1);
        }
        _ => panic!("Expected function declaration"),
    }
}

#[test]
fn test_overload_signatures_are_erased() {
    let program = parse("function f(a: string): void;\nfunction f(a: any) { }");
    assert!(matches!(program.statements[0], Statement::Empty(_)));
    assert!(matches!(program.statements[1], Statement::Function(_)));
}

#[test]
fn test_type_only_declarations_are_erased() {
    let program = parse(
        "type Pair = [string, number];\ninterface Point { x: number; y: number }\ndeclare const host: any;",
    );
    assert_eq!(program.statements.len(), 3);
    assert!(program.statements.iter().all(|s| matches!(s, Statement::Empty(_))));
}

#[test]
fn test_parse_binary_precedence() {
    let expr = first_expression("a + b * c;");
    match expr.kind {
        ExpressionKind::Binary(BinaryOp::Add, _, right) => {
            assert!(matches!(right.kind, ExpressionKind::Binary(BinaryOp::Multiply, _, _)));
        }
        other => panic!("Expected addition, got {:?}", other),
    }
}

#[test]
fn test_parse_exponent_is_right_associative() {
    let expr = first_expression("a ** b ** c;");
    match expr.kind {
        ExpressionKind::Binary(BinaryOp::Power, left, _) => {
            assert!(left.is_identifier("a"));
        }
        other => panic!("Expected power, got {:?}", other),
    }
}

#[test]
fn test_parse_arrow_functions() {
    let expr = first_expression("items.map((x: number, i) => x * i);");
    let (_, method, arguments) = expr.as_method_call().expect("Expected method call");
    assert_eq!(method, "map");
    match &arguments[0].kind {
        ExpressionKind::Arrow(arrow) => {
            assert_eq!(arrow.parameters.len(), 2);
            assert!(matches!(arrow.body, ArrowBody::Expression(_)));
        }
        other => panic!("Expected arrow function, got {:?}", other),
    }

    let expr = first_expression("run(x => { return x; });");
    match &expr.kind {
        ExpressionKind::Call(_, arguments) => {
            assert!(matches!(
                &arguments[0].kind,
                ExpressionKind::Arrow(ArrowFunction { body: ArrowBody::Block(_), .. })
            ));
        }
        other => panic!("Expected call, got {:?}", other),
    }
}

#[test]
fn test_conditional_with_parenthesized_branch_is_not_an_arrow() {
    let expr = first_expression("flag ? (a) : b;");
    assert!(matches!(expr.kind, ExpressionKind::Conditional(..)));
}

#[test]
fn test_type_assertions_are_erased() {
    let expr = first_expression("(value as string[]).length;");
    match expr.kind {
        ExpressionKind::Member(object, property) => {
            assert_eq!(property.node, "length");
            assert!(matches!(object.kind, ExpressionKind::Parenthesized(_)));
        }
        other => panic!("Expected member access, got {:?}", other),
    }
}

#[test]
fn test_generic_call_and_comparison() {
    let expr = first_expression("make<Array<string>>(1);");
    assert!(matches!(expr.kind, ExpressionKind::Call(..)));

    let program = parse("for (let i = 0; i < arr.length; i++) { }");
    assert!(matches!(program.statements[0], Statement::For(_)));
}

#[test]
fn test_parse_object_literal_forms() {
    let expr = first_expression("x = { a: 1, b, \"c\": 2, m() { return 1; }, ...rest };");
    match expr.kind {
        ExpressionKind::Assignment(_, AssignmentOp::Assign, value) => match value.kind {
            ExpressionKind::Object(properties) => {
                assert_eq!(properties.len(), 5);
                assert!(matches!(properties[1], ObjectProperty::Shorthand(_)));
                assert!(matches!(properties[3], ObjectProperty::Method { .. }));
                assert!(matches!(properties[4], ObjectProperty::Spread { .. }));
            }
            other => panic!("Expected object literal, got {:?}", other),
        },
        other => panic!("Expected assignment, got {:?}", other),
    }
}

#[test]
fn test_parse_array_literal_with_holes_and_spread() {
    let expr = first_expression("[1, , ...xs];");
    match expr.kind {
        ExpressionKind::Array(elements) => {
            assert_eq!(elements.len(), 3);
            assert!(matches!(elements[1], ArrayElement::Hole));
            assert!(matches!(elements[2], ArrayElement::Spread(_)));
        }
        other => panic!("Expected array literal, got {:?}", other),
    }
}

#[test]
fn test_parse_template_literal() {
    let expr = first_expression("`a${x + 1}b${y}`;");
    match expr.kind {
        ExpressionKind::Template(template) => {
            assert_eq!(template.quasis, vec!["a", "b", ""]);
            assert_eq!(template.expressions.len(), 2);
            assert!(!template.expressions[0].id.is_synthetic());
        }
        other => panic!("Expected template literal, got {:?}", other),
    }
}

#[test]
fn test_node_ids_are_unique() {
    let program = parse("const a = f(b, `${c}`); const d = a + 1;");
    assert!(program.node_count >= 7);

    let mut ids = Vec::new();
    for statement in &program.statements {
        if let Statement::Variable(decl) = statement {
            for declarator in &decl.declarators {
                if let Some(init) = &declarator.initializer {
                    ids.push(init.id);
                }
            }
        }
    }
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
}

#[test]
fn test_parse_for_of_and_for_in() {
    let program = parse("for (const [k, v] of entries) { }\nfor (key in obj) total++;");
    match &program.statements[0] {
        Statement::ForOf(stmt) => {
            assert!(matches!(
                stmt.head,
                ForHead::Declaration { kind: VariableKind::Const, pattern: Pattern::Array(_), .. }
            ));
        }
        _ => panic!("Expected for-of"),
    }
    match &program.statements[1] {
        Statement::ForIn(stmt) => assert!(matches!(stmt.head, ForHead::Target(_))),
        _ => panic!("Expected for-in"),
    }
}

#[test]
fn test_parse_for_with_in_operator_in_body() {
    let program = parse("for (let i = 0; i < n; i++) { if (\"a\" in o) { } }");
    assert!(matches!(program.statements[0], Statement::For(_)));
}

#[test]
fn test_parse_switch_and_try() {
    let program = parse(
        "switch (x) { case 1: a(); break; default: b(); }\ntry { f(); } catch (e) { g(e); } finally { h(); }",
    );
    match &program.statements[0] {
        Statement::Switch(stmt) => {
            assert_eq!(stmt.cases.len(), 2);
            assert!(stmt.cases[1].test.is_none());
            assert_eq!(stmt.cases[0].consequent.len(), 2);
        }
        _ => panic!("Expected switch"),
    }
    match &program.statements[1] {
        Statement::Try(stmt) => {
            assert!(stmt.handler.is_some());
            assert!(stmt.finalizer.is_some());
        }
        _ => panic!("Expected try"),
    }
}

#[test]
fn test_return_without_argument_before_newline() {
    let program = parse("function f() { return\n1; }");
    match &program.statements[0] {
        Statement::Function(func) => {
            assert!(matches!(
                func.body.statements[0],
                Statement::Return(ReturnStatement { argument: None, .. })
            ));
            assert_eq!(func.body.statements.len(), 2);
        }
        _ => panic!("Expected function"),
    }
}

#[test]
fn test_parse_imports() {
    let program = parse(
        "import def, { a, b as c, type T } from \"./m\";\nimport * as ns from \"./n\";\nimport type { U } from \"./u\";",
    );
    match &program.statements[0] {
        Statement::Import(decl) => {
            assert_eq!(decl.source, "./m");
            assert_eq!(decl.specifiers.len(), 3);
        }
        _ => panic!("Expected import"),
    }
    assert!(matches!(
        &program.statements[1],
        Statement::Import(ImportDeclaration { specifiers, .. })
            if matches!(specifiers[0], ImportSpecifier::Namespace(_))
    ));
    assert!(matches!(program.statements[2], Statement::Empty(_)));
}

#[test]
fn test_parse_exports() {
    let program = parse(
        "export const x = 1;\nexport function f() { }\nexport { x as y };\nexport default f;\nexport * from \"./all\";\nexport type { T } from \"./t\";",
    );
    let kinds: Vec<_> = program
        .statements
        .iter()
        .map(|s| match s {
            Statement::Export(decl) => match &decl.kind {
                ExportKind::Declaration(_) => "declaration",
                ExportKind::DefaultDeclaration(_) => "default-declaration",
                ExportKind::DefaultExpression(_) => "default-expression",
                ExportKind::Named { .. } => "named",
                ExportKind::All { .. } => "all",
            },
            Statement::Empty(_) => "empty",
            _ => "other",
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["declaration", "declaration", "named", "default-expression", "all", "empty"]
    );
}

#[test]
fn test_unsupported_constructs_are_reported() {
    assert!(parse_error("class A {}").message.contains("Classes"));
    assert!(parse_error("a?.b;").message.contains("Optional chaining"));
    assert!(parse_error("f(...args);").message.contains("Spread arguments"));
    assert!(parse_error("[a, b] = [b, a];").message.contains("Destructuring assignment"));
    assert!(parse_error("function f(...xs) {}").message.contains("Rest parameters"));
}

#[test]
fn test_directives_are_collected() {
    let program = parse("/// @xml-init\nconst a = 1;");
    assert!(program.has_directive(&crate::ast::Directive::XmlInit));
}

#[test]
fn test_parse_type_annotations() {
    let program = parse("let a: string[] = []; let b: Array<number>; let c: string | null;");
    let kinds: Vec<_> = program
        .statements
        .iter()
        .filter_map(|s| match s {
            Statement::Variable(decl) => decl.declarators[0].type_annotation.clone(),
            _ => None,
        })
        .map(|t| t.kind)
        .collect();
    assert!(matches!(kinds[0], TypeKind::Array(_)));
    assert!(matches!(&kinds[1], TypeKind::Named(name, args) if name == "Array" && args.len() == 1));
    assert!(matches!(&kinds[2], TypeKind::Union(members) if members.len() == 2));
}

/// Runs `test` on a thread with room for the deepest trees the parser accepts
fn with_large_stack(test: impl FnOnce() + Send + 'static) {
    std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(test)
        .unwrap()
        .join()
        .unwrap();
}

#[test]
fn test_deeply_nested_parentheses_are_rejected() {
    with_large_stack(|| {
        let source = format!("x = {}1{};", "(".repeat(1000), ")".repeat(1000));
        let error = parse_error(&source);
        assert!(error.message.contains("Nesting deeper than"), "{}", error.message);
    });
}

#[test]
fn test_deeply_nested_blocks_and_arrays_are_rejected() {
    with_large_stack(|| {
        let blocks = format!("{}{}", "{".repeat(600), "}".repeat(600));
        assert!(parse_error(&blocks).message.contains("Nesting deeper than"));

        let arrays = format!("const a = {}{};", "[".repeat(600), "]".repeat(600));
        assert!(parse_error(&arrays).message.contains("Nesting deeper than"));

        let powers = format!("x = {}1;", "2 ** ".repeat(600));
        assert!(parse_error(&powers).message.contains("Nesting deeper than"));
    });
}

#[test]
fn test_moderate_nesting_parses() {
    with_large_stack(|| {
        let source = format!("x = {}1{};", "(".repeat(60), ")".repeat(60));
        parse(&source);

        let blocks = format!("{}{}", "{".repeat(100), "}".repeat(100));
        assert_eq!(parse(&blocks).statements.len(), 1);
    });
}

#[test]
fn test_failed_lookahead_restores_depth() {
    // `<number>` first tries to parse as a generic arrow function
    let source = "x = <number>y;\n".repeat(300);
    assert_eq!(parse(&source).statements.len(), 300);
}
