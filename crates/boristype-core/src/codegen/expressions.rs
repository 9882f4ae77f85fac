use super::CodeGenerator;
use crate::ast::expression::*;
use crate::ast::format_number;

pub const SEQUENCE: u8 = 0;
/// Assignments, arrows, and function expressions used as operands
pub const ASSIGNMENT: u8 = 2;
const CONDITIONAL: u8 = 3;
const BINARY_BASE: u8 = 3;
const UNARY: u8 = 16;
const POSTFIX: u8 = 17;
const CALL: u8 = 18;
const PRIMARY: u8 = 19;

/// Binding strength of the outermost operator of `expr`
fn precedence(expr: &Expression) -> u8 {
    match &expr.kind {
        ExpressionKind::Sequence(_) => SEQUENCE,
        ExpressionKind::Assignment(..)
        | ExpressionKind::Arrow(_)
        | ExpressionKind::Function(_) => ASSIGNMENT,
        ExpressionKind::Conditional(..) => CONDITIONAL,
        ExpressionKind::Binary(op, _, _) => BINARY_BASE + op.precedence(),
        ExpressionKind::Unary(..) => UNARY,
        ExpressionKind::Update(_, UpdatePosition::Prefix, _) => UNARY,
        ExpressionKind::Update(_, UpdatePosition::Postfix, _) => POSTFIX,
        ExpressionKind::Literal(Literal::Number(value)) if value.is_sign_negative() && *value != 0.0 => UNARY,
        ExpressionKind::Call(..)
        | ExpressionKind::New(..)
        | ExpressionKind::Member(..)
        | ExpressionKind::Index(..) => CALL,
        ExpressionKind::Identifier(_)
        | ExpressionKind::Literal(_)
        | ExpressionKind::This
        | ExpressionKind::Array(_)
        | ExpressionKind::Object(_)
        | ExpressionKind::Template(_)
        | ExpressionKind::Parenthesized(_) => PRIMARY,
    }
}

/// True when `operand` printed after unary `op` would fuse into `--` or `++`
fn fuses_with_sign(op: UnaryOp, operand: &Expression) -> bool {
    let sign = match op {
        UnaryOp::Negate => UpdateOp::Decrement,
        UnaryOp::Plus => UpdateOp::Increment,
        _ => return false,
    };
    match &operand.kind {
        ExpressionKind::Unary(inner_op, _) => *inner_op == op,
        ExpressionKind::Update(update, UpdatePosition::Prefix, _) => *update == sign,
        ExpressionKind::Literal(Literal::Number(value)) => op == UnaryOp::Negate && value.is_sign_negative(),
        _ => false,
    }
}

impl CodeGenerator {
    pub fn generate_expression(&mut self, expr: &Expression) {
        match &expr.kind {
            ExpressionKind::Identifier(name) => self.write(name),
            ExpressionKind::Literal(literal) => self.generate_literal(literal),
            ExpressionKind::This => self.write("this"),
            ExpressionKind::Array(elements) => self.generate_array(elements),
            ExpressionKind::Object(properties) => self.generate_object(properties),
            ExpressionKind::Function(function) => self.generate_function_expression(function),
            ExpressionKind::Arrow(arrow) => self.generate_arrow(arrow),
            ExpressionKind::Template(template) => self.generate_template(template),
            ExpressionKind::Unary(op, operand) => {
                self.write(op.as_str());
                if fuses_with_sign(*op, operand) {
                    self.write("(");
                    self.generate_expression(operand);
                    self.write(")");
                } else {
                    self.generate_operand(operand, UNARY);
                }
            }
            ExpressionKind::Update(op, position, target) => {
                let text = match op {
                    UpdateOp::Increment => "++",
                    UpdateOp::Decrement => "--",
                };
                match position {
                    UpdatePosition::Prefix => {
                        self.write(text);
                        self.generate_operand(target, POSTFIX);
                    }
                    UpdatePosition::Postfix => {
                        self.generate_operand(target, POSTFIX);
                        self.write(text);
                    }
                }
            }
            ExpressionKind::Binary(op, left, right) => {
                let own = BINARY_BASE + op.precedence();
                let (left_min, right_min) = if op.is_right_associative() {
                    (own + 1, own)
                } else {
                    (own, own + 1)
                };
                // `-a ** b` is a syntax error
                let left_min = if *op == BinaryOp::Power { left_min.max(POSTFIX) } else { left_min };
                self.generate_operand(left, left_min);
                self.write(" ");
                self.write(op.as_str());
                self.write(" ");
                self.generate_operand(right, right_min);
            }
            ExpressionKind::Assignment(target, op, value) => {
                self.generate_operand(target, POSTFIX);
                self.write(" ");
                self.write(op.as_str());
                self.write(" ");
                self.generate_operand(value, ASSIGNMENT);
            }
            ExpressionKind::Conditional(test, then, otherwise) => {
                self.generate_operand(test, CONDITIONAL + 1);
                self.write(" ? ");
                self.generate_operand(then, ASSIGNMENT);
                self.write(" : ");
                self.generate_operand(otherwise, ASSIGNMENT);
            }
            ExpressionKind::Call(callee, arguments) => {
                self.generate_operand(callee, CALL);
                self.generate_arguments(arguments);
            }
            ExpressionKind::New(callee, arguments) => {
                self.write("new ");
                if matches!(callee.kind, ExpressionKind::Call(..)) {
                    self.write("(");
                    self.generate_expression(callee);
                    self.write(")");
                } else {
                    self.generate_operand(callee, CALL);
                }
                self.generate_arguments(arguments);
            }
            ExpressionKind::Member(object, property) => {
                if matches!(object.kind, ExpressionKind::Literal(Literal::Number(_))) {
                    self.write("(");
                    self.generate_expression(object);
                    self.write(")");
                } else {
                    self.generate_operand(object, CALL);
                }
                self.write(".");
                self.write(&property.node);
            }
            ExpressionKind::Index(object, index) => {
                self.generate_operand(object, CALL);
                self.write("[");
                self.generate_expression(index);
                self.write("]");
            }
            ExpressionKind::Sequence(expressions) => {
                for (i, expr) in expressions.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.generate_operand(expr, ASSIGNMENT);
                }
            }
            ExpressionKind::Parenthesized(inner) => {
                self.write("(");
                self.generate_expression(inner);
                self.write(")");
            }
        }
    }

    /// `expr`, parenthesized when it binds looser than `min`
    pub fn generate_operand(&mut self, expr: &Expression, min: u8) {
        if precedence(expr) < min {
            self.write("(");
            self.generate_expression(expr);
            self.write(")");
        } else {
            self.generate_expression(expr);
        }
    }

    /// `expr` in a position where a leading `{` or `function` would start a statement
    pub fn generate_guarded(&mut self, expr: &Expression, min: u8) {
        let start = self.output.len();
        self.generate_operand(expr, min);
        let text = &self.output[start..];
        if text.starts_with('{') || text.starts_with("function ") || text.starts_with("function(") {
            self.output.insert(start, '(');
            self.output.push(')');
        }
    }

    fn generate_arguments(&mut self, arguments: &[Expression]) {
        self.write("(");
        for (i, argument) in arguments.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.generate_operand(argument, ASSIGNMENT);
        }
        self.write(")");
    }

    fn generate_literal(&mut self, literal: &Literal) {
        match literal {
            Literal::Null => self.write("null"),
            Literal::Boolean(true) => self.write("true"),
            Literal::Boolean(false) => self.write("false"),
            Literal::Number(value) => self.write(&format_number(*value)),
            Literal::String(value) => self.write_string_literal(value),
        }
    }

    fn generate_array(&mut self, elements: &[ArrayElement]) {
        self.write("[");
        for (i, element) in elements.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            match element {
                ArrayElement::Expression(expr) => self.generate_operand(expr, ASSIGNMENT),
                ArrayElement::Spread(expr) => {
                    self.write("...");
                    self.generate_operand(expr, ASSIGNMENT);
                }
                ArrayElement::Hole => {}
            }
        }
        if matches!(elements.last(), Some(ArrayElement::Hole)) {
            self.write(",");
        }
        self.write("]");
    }

    fn generate_object(&mut self, properties: &[ObjectProperty]) {
        if properties.is_empty() {
            self.write("{}");
            return;
        }
        self.write("{ ");
        for (i, property) in properties.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            match property {
                ObjectProperty::Property { key, value, .. } => {
                    self.generate_property_key(key);
                    self.write(": ");
                    self.generate_operand(value, ASSIGNMENT);
                }
                ObjectProperty::Shorthand(name) => self.write(&name.node),
                ObjectProperty::Method { key, function, .. } => {
                    self.generate_property_key(key);
                    self.generate_parameters(&function.parameters);
                    self.write(" ");
                    self.generate_block(&function.body);
                }
                ObjectProperty::Spread { value, .. } => {
                    self.write("...");
                    self.generate_operand(value, ASSIGNMENT);
                }
            }
        }
        self.write(" }");
    }

    pub fn generate_property_key(&mut self, key: &PropertyKey) {
        match key {
            PropertyKey::Identifier(ident) => self.write(&ident.node),
            PropertyKey::String(value) => self.write_string_literal(value),
            PropertyKey::Number(value) => self.write(&format_number(*value)),
        }
    }

    fn generate_function_expression(&mut self, function: &FunctionExpression) {
        self.write("function");
        if let Some(name) = &function.name {
            self.write(" ");
            self.write(&name.node);
        }
        self.generate_parameters(&function.parameters);
        self.write(" ");
        self.generate_block(&function.body);
    }

    fn generate_arrow(&mut self, arrow: &ArrowFunction) {
        self.generate_parameters(&arrow.parameters);
        self.write(" => ");
        match &arrow.body {
            ArrowBody::Expression(body) => self.generate_guarded(body, ASSIGNMENT),
            ArrowBody::Block(block) => self.generate_block(block),
        }
    }

    fn generate_template(&mut self, template: &TemplateLiteral) {
        self.write("`");
        for (i, quasi) in template.quasis.iter().enumerate() {
            let escaped = quasi
                .replace('\\', "\\\\")
                .replace('`', "\\`")
                .replace("${", "\\${");
            self.write(&escaped);
            if let Some(expr) = template.expressions.get(i) {
                self.write("${");
                self.generate_expression(expr);
                self.write("}");
            }
        }
        self.write("`");
    }

    /// Double-quoted string literal, escaping per the generator's policy
    pub fn write_string_literal(&mut self, value: &str) {
        let mut escaped = String::with_capacity(value.len() + 2);
        escaped.push('"');
        for c in value.chars() {
            match c {
                '"' => escaped.push_str("\\\""),
                '\\' => escaped.push_str("\\\\"),
                '\n' => escaped.push_str("\\n"),
                '\r' => escaped.push_str("\\r"),
                '\t' => escaped.push_str("\\t"),
                '\u{8}' => escaped.push_str("\\b"),
                '\u{c}' => escaped.push_str("\\f"),
                '\u{2028}' | '\u{2029}' => escaped.push_str(&format!("\\u{:04X}", c as u32)),
                c if (c as u32) < 0x20 => escaped.push_str(&format!("\\u{:04X}", c as u32)),
                c if !c.is_ascii() && self.escape_non_ascii => {
                    let mut units = [0u16; 2];
                    for unit in c.encode_utf16(&mut units) {
                        escaped.push_str(&format!("\\u{:04X}", unit));
                    }
                }
                c => escaped.push(c),
            }
        }
        escaped.push('"');
        self.write(&escaped);
    }
}
