//! Serializes a lowered tree to target-dialect text.
//!
//! The generator prints whatever it is given, including constructs the dialect
//! cannot run, so a lowering that was missed shows up in the output instead of
//! being silently dropped.

mod expressions;
mod output;
mod statements;

pub use output::{finish_output, OutputKind, BYTE_ORDER_MARK};

use crate::ast::Program;

pub struct CodeGenerator {
    output: String,
    indent_level: usize,
    indent_str: String,
    escape_non_ascii: bool,
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self {
            output: String::new(),
            indent_level: 0,
            indent_str: "    ".to_string(),
            escape_non_ascii: false,
        }
    }

    /// Write non-ASCII characters in string literals as `\uXXXX` escapes
    pub fn with_escape_non_ascii(mut self, escape: bool) -> Self {
        self.escape_non_ascii = escape;
        self
    }

    pub fn generate(&mut self, program: &Program) -> String {
        self.output.clear();
        self.indent_level = 0;

        for directive in &program.directives {
            self.write("/// @");
            self.writeln(directive.name());
        }
        for statement in &program.statements {
            self.generate_statement(statement);
        }

        std::mem::take(&mut self.output)
    }

    fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn writeln(&mut self, s: &str) {
        self.output.push_str(s);
        self.output.push('\n');
    }

    fn indent(&mut self) {
        self.indent_level += 1;
    }

    fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent_level {
            self.output.push_str(&self.indent_str);
        }
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;
    use indoc::indoc;

    fn round_trip(source: &str) -> String {
        let program = parse_source(source).unwrap();
        CodeGenerator::new().generate(&program)
    }

    #[test]
    fn test_declarations_and_functions() {
        let output = round_trip(indoc! {"
            var a = 1, b;
            function add(x, y) { return x + y; }
        "});
        assert_eq!(
            output,
            indoc! {"
                var a = 1, b;
                function add(x, y) {
                    return x + y;
                }
            "}
        );
    }

    #[test]
    fn test_if_else_chain() {
        let output = round_trip("if (a) { f(); } else if (b) g(); else { h(); }");
        assert_eq!(
            output,
            indoc! {"
                if (a) {
                    f();
                } else if (b)
                    g();
                else {
                    h();
                }
            "}
        );
    }

    #[test]
    fn test_loops() {
        let output = round_trip(indoc! {"
            for (var i = 0; i < n; i++) { log(i); }
            for (;;) break;
            for (k in o) {}
            do { x--; } while (x > 0);
            while (go()) { continue; }
        "});
        assert_eq!(
            output,
            indoc! {"
                for (var i = 0; i < n; i++) {
                    log(i);
                }
                for (;;)
                    break;
                for (k in o) {}
                do {
                    x--;
                } while (x > 0);
                while (go()) {
                    continue;
                }
            "}
        );
    }

    #[test]
    fn test_switch_and_try() {
        let output = round_trip(indoc! {r#"
            switch (x) { case 1: a(); break; default: b(); }
            try { risky(); } catch (e) { throw e; } finally { done(); }
        "#});
        assert_eq!(
            output,
            indoc! {"
                switch (x) {
                    case 1:
                        a();
                        break;
                    default:
                        b();
                }
                try {
                    risky();
                } catch (e) {
                    throw e;
                } finally {
                    done();
                }
            "}
        );
    }

    #[test]
    fn test_precedence_parentheses() {
        assert_eq!(round_trip("x = (a + b) * c;"), "x = (a + b) * c;\n");
        assert_eq!(round_trip("x = a + (b + c);"), "x = a + (b + c);\n");
        assert_eq!(round_trip("x = a - b - c;"), "x = a - b - c;\n");
        assert_eq!(round_trip("x = 2 ** 3 ** 2;"), "x = 2 ** 3 ** 2;\n");
        assert_eq!(round_trip("x = (a ? b : c) + 1;"), "x = (a ? b : c) + 1;\n");
        assert_eq!(round_trip("x = !(a && b);"), "x = !(a && b);\n");
        assert_eq!(round_trip("x = -(-y);"), "x = -(-y);\n");
    }

    #[test]
    fn test_literals() {
        assert_eq!(round_trip("x = [1, , 'a', null, true];"), "x = [1, , \"a\", null, true];\n");
        assert_eq!(round_trip("x = {};"), "x = {};\n");
        assert_eq!(round_trip("x = { a: 1, 'b-c': 2, 3: 4 };"), "x = { a: 1, \"b-c\": 2, 3: 4 };\n");
        assert_eq!(round_trip("x = 'say \"hi\"\\n';"), "x = \"say \\\"hi\\\"\\n\";\n");
    }

    #[test]
    fn test_statement_starting_with_function_or_object() {
        assert_eq!(round_trip("(function() {})();"), "(function() {})();\n");
        assert_eq!(round_trip("({ a: 1 }).a;"), "({ a: 1 }).a;\n");
    }

    #[test]
    fn test_non_ascii_escaping() {
        let program = parse_source("const s = 'café 😀';").unwrap();
        let retained = CodeGenerator::new().generate(&program);
        assert_eq!(retained, "const s = \"café 😀\";\n");
        let escaped = CodeGenerator::new().with_escape_non_ascii(true).generate(&program);
        assert_eq!(escaped, "const s = \"caf\\u00E9 \\uD83D\\uDE00\";\n");
    }

    #[test]
    fn test_modern_constructs_printed_as_is() {
        let output = round_trip("const f = (x) => x * 2; const t = `a${b}`;");
        assert!(output.contains("const f = (x) => x * 2;"));
        assert!(output.contains("const t = `a${b}`;"));
    }

    #[test]
    fn test_directives_written_first() {
        let output = round_trip("/// @html\nlog(1);");
        assert_eq!(output, "/// @html\nlog(1);\n");
    }
}
