use super::CodeGenerator;
use super::expressions::{ASSIGNMENT, SEQUENCE};
use crate::ast::expression::{Parameter, PropertyKey};
use crate::ast::pattern::Pattern;
use crate::ast::statement::*;

impl CodeGenerator {
    pub fn generate_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Variable(decl) => {
                self.write_indent();
                self.generate_variable_declaration(decl);
                self.writeln(";");
            }
            Statement::Function(decl) => self.generate_function_declaration(decl),
            Statement::Expression(expr) => {
                self.write_indent();
                self.generate_guarded(expr, SEQUENCE);
                self.writeln(";");
            }
            Statement::Block(block) => {
                self.write_indent();
                self.generate_block(block);
                self.writeln("");
            }
            Statement::If(if_stmt) => {
                self.write_indent();
                self.generate_if_statement(if_stmt);
            }
            Statement::For(for_stmt) => self.generate_for_statement(for_stmt),
            Statement::ForIn(for_in) => {
                self.write_indent();
                self.write("for (");
                self.generate_for_head(&for_in.head);
                self.write(" in ");
                self.generate_expression(&for_in.object);
                self.write(")");
                self.finish_clause(&for_in.body);
            }
            Statement::ForOf(for_of) => {
                self.write_indent();
                self.write("for (");
                self.generate_for_head(&for_of.head);
                self.write(" of ");
                self.generate_expression(&for_of.iterable);
                self.write(")");
                self.finish_clause(&for_of.body);
            }
            Statement::While(while_stmt) => {
                self.write_indent();
                self.write("while (");
                self.generate_expression(&while_stmt.condition);
                self.write(")");
                self.finish_clause(&while_stmt.body);
            }
            Statement::DoWhile(do_while) => self.generate_do_while_statement(do_while),
            Statement::Switch(switch) => self.generate_switch_statement(switch),
            Statement::Try(try_stmt) => self.generate_try_statement(try_stmt),
            Statement::Throw(throw_stmt) => {
                self.write_indent();
                self.write("throw ");
                self.generate_expression(&throw_stmt.argument);
                self.writeln(";");
            }
            Statement::Return(return_stmt) => {
                self.write_indent();
                match &return_stmt.argument {
                    Some(argument) => {
                        self.write("return ");
                        self.generate_expression(argument);
                        self.writeln(";");
                    }
                    None => self.writeln("return;"),
                }
            }
            Statement::Break(_) => {
                self.write_indent();
                self.writeln("break;");
            }
            Statement::Continue(_) => {
                self.write_indent();
                self.writeln("continue;");
            }
            Statement::Import(import) => self.generate_import(import),
            Statement::Export(export) => self.generate_export(export),
            Statement::Empty(_) => {}
        }
    }

    /// `kind a = 1, b` without the trailing semicolon
    pub fn generate_variable_declaration(&mut self, decl: &VariableDeclaration) {
        self.write(decl.kind.as_str());
        self.write(" ");
        for (i, declarator) in decl.declarators.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.generate_pattern(&declarator.pattern);
            if let Some(init) = &declarator.initializer {
                self.write(" = ");
                self.generate_operand(init, ASSIGNMENT);
            }
        }
    }

    fn generate_function_declaration(&mut self, decl: &FunctionDeclaration) {
        self.write_indent();
        self.write("function ");
        self.write(&decl.name.node);
        self.generate_parameters(&decl.parameters);
        self.write(" ");
        self.generate_block(&decl.body);
        self.writeln("");
    }

    pub fn generate_parameters(&mut self, parameters: &[Parameter]) {
        self.write("(");
        for (i, parameter) in parameters.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.generate_pattern(&parameter.pattern);
            if let Some(default) = &parameter.default {
                self.write(" = ");
                self.generate_operand(default, ASSIGNMENT);
            }
        }
        self.write(")");
    }

    /// `{ ... }` at the current indentation, leaving the cursor after the closing brace
    pub fn generate_block(&mut self, block: &Block) {
        if block.statements.iter().all(|s| matches!(s, Statement::Empty(_))) {
            self.write("{}");
            return;
        }
        self.writeln("{");
        self.indent();
        for statement in &block.statements {
            self.generate_statement(statement);
        }
        self.dedent();
        self.write_indent();
        self.write("}");
    }

    /// Body of a compound statement. Returns true when it ended on a closing brace
    /// with the rest of the line still open.
    fn generate_clause(&mut self, body: &Statement) -> bool {
        match body {
            Statement::Block(block) => {
                self.write(" ");
                self.generate_block(block);
                true
            }
            other => {
                self.writeln("");
                self.indent();
                self.generate_statement(other);
                self.dedent();
                false
            }
        }
    }

    fn finish_clause(&mut self, body: &Statement) {
        if self.generate_clause(body) {
            self.writeln("");
        }
    }

    /// Expects the indentation (or `else `) to be written already
    fn generate_if_statement(&mut self, if_stmt: &IfStatement) {
        self.write("if (");
        self.generate_expression(&if_stmt.condition);
        self.write(")");
        let open = self.generate_clause(&if_stmt.consequent);

        let Some(alternate) = &if_stmt.alternate else {
            if open {
                self.writeln("");
            }
            return;
        };

        if open {
            self.write(" else");
        } else {
            self.write_indent();
            self.write("else");
        }
        match alternate.as_ref() {
            Statement::If(nested) => {
                self.write(" ");
                self.generate_if_statement(nested);
            }
            other => self.finish_clause(other),
        }
    }

    fn generate_for_statement(&mut self, for_stmt: &ForStatement) {
        self.write_indent();
        self.write("for (");
        match &for_stmt.init {
            Some(ForInit::Variable(decl)) => self.generate_variable_declaration(decl),
            Some(ForInit::Expression(expr)) => self.generate_expression(expr),
            None => {}
        }
        self.write(";");
        if let Some(test) = &for_stmt.test {
            self.write(" ");
            self.generate_expression(test);
        }
        self.write(";");
        if let Some(update) = &for_stmt.update {
            self.write(" ");
            self.generate_expression(update);
        }
        self.write(")");
        self.finish_clause(&for_stmt.body);
    }

    fn generate_for_head(&mut self, head: &ForHead) {
        match head {
            ForHead::Declaration { kind, pattern, .. } => {
                self.write(kind.as_str());
                self.write(" ");
                self.generate_pattern(pattern);
            }
            ForHead::Target(target) => self.generate_expression(target),
        }
    }

    fn generate_do_while_statement(&mut self, do_while: &DoWhileStatement) {
        self.write_indent();
        self.write("do");
        if self.generate_clause(&do_while.body) {
            self.write(" ");
        } else {
            self.write_indent();
        }
        self.write("while (");
        self.generate_expression(&do_while.condition);
        self.writeln(");");
    }

    fn generate_switch_statement(&mut self, switch: &SwitchStatement) {
        self.write_indent();
        self.write("switch (");
        self.generate_expression(&switch.discriminant);
        self.writeln(") {");
        self.indent();
        for case in &switch.cases {
            self.write_indent();
            match &case.test {
                Some(test) => {
                    self.write("case ");
                    self.generate_expression(test);
                    self.writeln(":");
                }
                None => self.writeln("default:"),
            }
            self.indent();
            for statement in &case.consequent {
                self.generate_statement(statement);
            }
            self.dedent();
        }
        self.dedent();
        self.write_indent();
        self.writeln("}");
    }

    fn generate_try_statement(&mut self, try_stmt: &TryStatement) {
        self.write_indent();
        self.write("try ");
        self.generate_block(&try_stmt.block);
        if let Some(handler) = &try_stmt.handler {
            self.write(" catch ");
            if let Some(parameter) = &handler.parameter {
                self.write("(");
                self.write(&parameter.node);
                self.write(") ");
            }
            self.generate_block(&handler.body);
        }
        if let Some(finalizer) = &try_stmt.finalizer {
            self.write(" finally ");
            self.generate_block(finalizer);
        }
        self.writeln("");
    }

    fn generate_import(&mut self, import: &ImportDeclaration) {
        self.write_indent();
        self.write("import ");
        let mut named = Vec::new();
        let mut leading = Vec::new();
        for specifier in &import.specifiers {
            match specifier {
                ImportSpecifier::Default(local) => leading.push(local.node.clone()),
                ImportSpecifier::Namespace(local) => leading.push(format!("* as {}", local.node)),
                ImportSpecifier::Named { imported, local } if imported.node == local.node => {
                    named.push(local.node.clone())
                }
                ImportSpecifier::Named { imported, local } => {
                    named.push(format!("{} as {}", imported.node, local.node))
                }
            }
        }
        if !named.is_empty() {
            leading.push(format!("{{ {} }}", named.join(", ")));
        }
        if !leading.is_empty() {
            self.write(&leading.join(", "));
            self.write(" from ");
        }
        self.write_string_literal(&import.source);
        self.writeln(";");
    }

    fn generate_export(&mut self, export: &ExportDeclaration) {
        match &export.kind {
            ExportKind::Declaration(declaration) => self.generate_prefixed(declaration, "export "),
            ExportKind::DefaultDeclaration(declaration) => {
                self.generate_prefixed(declaration, "export default ")
            }
            ExportKind::DefaultExpression(expr) => {
                self.write_indent();
                self.write("export default ");
                self.generate_operand(expr, ASSIGNMENT);
                self.writeln(";");
            }
            ExportKind::Named { specifiers, source } => {
                self.write_indent();
                let names: Vec<String> = specifiers
                    .iter()
                    .map(|specifier| {
                        if specifier.local.node == specifier.exported.node {
                            specifier.local.node.clone()
                        } else {
                            format!("{} as {}", specifier.local.node, specifier.exported.node)
                        }
                    })
                    .collect();
                if names.is_empty() {
                    self.write("export {}");
                } else {
                    self.write(&format!("export {{ {} }}", names.join(", ")));
                }
                if let Some(source) = source {
                    self.write(" from ");
                    self.write_string_literal(source);
                }
                self.writeln(";");
            }
            ExportKind::All { alias, source } => {
                self.write_indent();
                self.write("export * ");
                if let Some(alias) = alias {
                    self.write("as ");
                    self.write(&alias.node);
                    self.write(" ");
                }
                self.write("from ");
                self.write_string_literal(source);
                self.writeln(";");
            }
        }
    }

    /// `stmt` with `prefix` inserted after its indentation
    fn generate_prefixed(&mut self, stmt: &Statement, prefix: &str) {
        let start = self.output.len() + self.indent_str.len() * self.indent_level;
        self.generate_statement(stmt);
        if start <= self.output.len() {
            self.output.insert_str(start, prefix);
        }
    }

    pub fn generate_pattern(&mut self, pattern: &Pattern) {
        match pattern {
            Pattern::Identifier(ident) => self.write(&ident.node),
            Pattern::Object(object) => {
                if object.properties.is_empty() && object.rest.is_none() {
                    self.write("{}");
                    return;
                }
                self.write("{ ");
                for (i, property) in object.properties.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    let shorthand = match (&property.key, &property.value) {
                        (PropertyKey::Identifier(key), Pattern::Identifier(value)) => {
                            key.node == value.node
                        }
                        _ => false,
                    };
                    if !shorthand {
                        self.generate_property_key(&property.key);
                        self.write(": ");
                    }
                    self.generate_pattern(&property.value);
                    if let Some(default) = &property.default {
                        self.write(" = ");
                        self.generate_operand(default, ASSIGNMENT);
                    }
                }
                if let Some(rest) = &object.rest {
                    if !object.properties.is_empty() {
                        self.write(", ");
                    }
                    self.write("...");
                    self.write(&rest.node);
                }
                self.write(" }");
            }
            Pattern::Array(array) => {
                self.write("[");
                for (i, element) in array.elements.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    if let Some(element) = element {
                        self.generate_pattern(&element.pattern);
                        if let Some(default) = &element.default {
                            self.write(" = ");
                            self.generate_operand(default, ASSIGNMENT);
                        }
                    }
                }
                if let Some(rest) = &array.rest {
                    if !array.elements.is_empty() {
                        self.write(", ");
                    }
                    self.write("...");
                    self.write(&rest.node);
                }
                self.write("]");
            }
        }
    }
}
