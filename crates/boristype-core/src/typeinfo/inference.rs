use super::{TypeCategory, TypeOracle};
use crate::ast::expression::*;
use crate::ast::pattern::Pattern;
use crate::ast::statement::*;
use crate::ast::types::{TypeAnnotation, TypeKind};
use crate::ast::{NodeId, Program};
use rustc_hash::FxHashMap;

/// Inferred shape, richer than [`TypeCategory`] so element types survive
/// through `map`, indexing and `for-of` heads.
#[derive(Debug, Clone, PartialEq)]
enum Shape {
    Array(Box<Shape>),
    String,
    Function(Box<Shape>),
    Unknown,
}

impl Shape {
    fn array_of(element: Shape) -> Shape {
        Shape::Array(Box::new(element))
    }

    fn category(&self) -> TypeCategory {
        match self {
            Shape::Array(_) => TypeCategory::Array,
            Shape::String => TypeCategory::String,
            Shape::Function(_) | Shape::Unknown => TypeCategory::Unknown,
        }
    }

    fn from_category(category: TypeCategory) -> Shape {
        match category {
            TypeCategory::Array => Shape::array_of(Shape::Unknown),
            TypeCategory::String => Shape::String,
            TypeCategory::Unknown => Shape::Unknown,
        }
    }

    /// Type of one element when iterated or indexed
    fn element(&self) -> Shape {
        match self {
            Shape::Array(element) => (**element).clone(),
            Shape::String => Shape::String,
            _ => Shape::Unknown,
        }
    }

    fn returns(&self) -> Shape {
        match self {
            Shape::Function(result) => (**result).clone(),
            _ => Shape::Unknown,
        }
    }

    /// Common shape of two branches, `Unknown` when they disagree
    fn join(self, other: Shape) -> Shape {
        if self == other {
            return self;
        }
        match (self, other) {
            (Shape::Array(_), Shape::Array(_)) => Shape::array_of(Shape::Unknown),
            _ => Shape::Unknown,
        }
    }

    fn from_annotation(annotation: &TypeAnnotation) -> Shape {
        match &annotation.kind {
            TypeKind::Array(element) => Shape::array_of(Shape::from_annotation(element)),
            TypeKind::Tuple(elements) => {
                let element = elements
                    .iter()
                    .map(Shape::from_annotation)
                    .reduce(Shape::join)
                    .unwrap_or(Shape::Unknown);
                Shape::array_of(element)
            }
            TypeKind::String => Shape::String,
            TypeKind::Named(name, arguments) => match name.as_str() {
                "Array" | "ReadonlyArray" => {
                    let element = arguments
                        .first()
                        .map(Shape::from_annotation)
                        .unwrap_or(Shape::Unknown);
                    Shape::array_of(element)
                }
                _ => Shape::Unknown,
            },
            TypeKind::Union(members) => {
                // `string[] | undefined` is still an array where it is used as one
                members
                    .iter()
                    .filter(|member| !is_nullish_type(member))
                    .map(Shape::from_annotation)
                    .reduce(Shape::join)
                    .unwrap_or(Shape::Unknown)
            }
            TypeKind::Function(result) => Shape::Function(Box::new(Shape::from_annotation(result))),
            TypeKind::Number | TypeKind::Boolean | TypeKind::Other => Shape::Unknown,
        }
    }
}

fn is_nullish_type(annotation: &TypeAnnotation) -> bool {
    matches!(&annotation.kind, TypeKind::Named(name, _) if matches!(name.as_str(), "null" | "undefined" | "void"))
}

/// Result of calling `method` on a receiver of shape `receiver`.
/// `callback` is the callback's result shape and `seed` the initial value for folds.
fn method_result(receiver: &Shape, method: &str, callback: Shape, seed: Option<Shape>) -> Shape {
    match receiver {
        Shape::Array(element) => {
            let element = (**element).clone();
            match method {
                "map" => Shape::array_of(callback),
                "flatMap" => Shape::array_of(callback.element()),
                "filter" | "slice" | "concat" | "reverse" | "toReversed" | "sort" | "toSorted"
                | "splice" | "toSpliced" | "fill" | "copyWithin" | "with" => Shape::array_of(element),
                "flat" | "keys" => Shape::array_of(Shape::Unknown),
                "entries" => Shape::array_of(Shape::array_of(Shape::Unknown)),
                "values" => Shape::array_of(element),
                "find" | "findLast" | "at" | "pop" | "shift" => element,
                "join" => Shape::String,
                "reduce" | "reduceRight" => seed.unwrap_or(Shape::Unknown),
                _ => Shape::Unknown,
            }
        }
        Shape::String => match method {
            "split" => Shape::array_of(Shape::String),
            "toUpperCase" | "toLowerCase" | "trim" | "trimStart" | "trimEnd" | "slice"
            | "substring" | "substr" | "charAt" | "padStart" | "padEnd" | "repeat" | "replace"
            | "replaceAll" | "concat" | "at" | "normalize" | "toString" => Shape::String,
            _ => Shape::Unknown,
        },
        _ => Shape::Unknown,
    }
}

pub(super) fn method_result_category(receiver: TypeCategory, method: &str) -> TypeCategory {
    method_result(&Shape::from_category(receiver), method, Shape::Unknown, None).category()
}

/// Array methods whose first argument is a per-element callback
fn takes_element_callback(method: &str) -> bool {
    matches!(
        method,
        "map"
            | "filter"
            | "flatMap"
            | "forEach"
            | "every"
            | "some"
            | "find"
            | "findIndex"
            | "findLast"
            | "findLastIndex"
            | "sort"
            | "toSorted"
    )
}

/// Declaration-based type oracle.
///
/// Answers are computed once for the whole file by a scope-aware walk and stored per
/// [`NodeId`]; nodes created after inference are answered `Unknown`.
#[derive(Debug, Clone, Default)]
pub struct DeclaredTypes {
    types: FxHashMap<NodeId, TypeCategory>,
}

impl DeclaredTypes {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn infer(program: &Program) -> Self {
        let mut inference = Inference::new();
        inference.infer_statements(&program.statements);
        DeclaredTypes {
            types: inference.types,
        }
    }

    pub fn get(&self, id: NodeId) -> TypeCategory {
        self.types.get(&id).copied().unwrap_or(TypeCategory::Unknown)
    }

    /// Number of nodes with a known category
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeOracle for DeclaredTypes {
    fn query(&self, expr: &Expression) -> TypeCategory {
        if expr.id.is_synthetic() {
            return TypeCategory::Unknown;
        }
        self.get(expr.id)
    }
}

struct Inference {
    scopes: Vec<FxHashMap<String, Shape>>,
    types: FxHashMap<NodeId, TypeCategory>,
}

impl Inference {
    fn new() -> Self {
        Inference {
            scopes: vec![FxHashMap::default()],
            types: FxHashMap::default(),
        }
    }

    fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn bind(&mut self, name: &str, shape: Shape) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), shape);
        }
    }

    fn lookup(&self, name: &str) -> Shape {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .cloned()
            .unwrap_or(Shape::Unknown)
    }

    fn bind_pattern(&mut self, pattern: &Pattern, shape: Shape) {
        match pattern {
            Pattern::Identifier(ident) => self.bind(&ident.node, shape),
            Pattern::Object(object) => {
                for property in &object.properties {
                    if let Some(default) = &property.default {
                        self.infer_expression(default);
                    }
                    self.bind_pattern(&property.value, Shape::Unknown);
                }
                if let Some(rest) = &object.rest {
                    self.bind(&rest.node, Shape::Unknown);
                }
            }
            Pattern::Array(array) => {
                let element = shape.element();
                for item in array.elements.iter().flatten() {
                    if let Some(default) = &item.default {
                        self.infer_expression(default);
                    }
                    self.bind_pattern(&item.pattern, element.clone());
                }
                if let Some(rest) = &array.rest {
                    self.bind(&rest.node, Shape::array_of(element));
                }
            }
        }
    }

    /// Function declarations are visible throughout their enclosing block
    fn hoist_functions(&mut self, statements: &[Statement]) {
        for statement in statements {
            let function = match statement {
                Statement::Function(function) => function,
                Statement::Export(ExportDeclaration {
                    kind: ExportKind::Declaration(inner) | ExportKind::DefaultDeclaration(inner),
                    ..
                }) => match inner.as_ref() {
                    Statement::Function(function) => function,
                    _ => continue,
                },
                _ => continue,
            };
            let result = function
                .return_type
                .as_ref()
                .map(Shape::from_annotation)
                .unwrap_or(Shape::Unknown);
            self.bind(&function.name.node, Shape::Function(Box::new(result)));
        }
    }

    fn infer_statements(&mut self, statements: &[Statement]) {
        self.hoist_functions(statements);
        for statement in statements {
            self.infer_statement(statement);
        }
    }

    fn infer_block(&mut self, block: &Block) {
        self.push_scope();
        self.infer_statements(&block.statements);
        self.pop_scope();
    }

    fn infer_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Variable(declaration) => self.infer_variable(declaration),
            Statement::Function(function) => {
                self.infer_function_body(&function.parameters, &[], &function.body.statements);
            }
            Statement::Expression(expr) => {
                self.infer_expression(expr);
            }
            Statement::Block(block) => self.infer_block(block),
            Statement::If(stmt) => {
                self.infer_expression(&stmt.condition);
                self.infer_nested(&stmt.consequent);
                if let Some(alternate) = &stmt.alternate {
                    self.infer_nested(alternate);
                }
            }
            Statement::For(stmt) => {
                self.push_scope();
                match &stmt.init {
                    Some(ForInit::Variable(declaration)) => self.infer_variable(declaration),
                    Some(ForInit::Expression(expr)) => {
                        self.infer_expression(expr);
                    }
                    None => {}
                }
                if let Some(test) = &stmt.test {
                    self.infer_expression(test);
                }
                if let Some(update) = &stmt.update {
                    self.infer_expression(update);
                }
                self.infer_nested(&stmt.body);
                self.pop_scope();
            }
            Statement::ForIn(stmt) => {
                self.infer_expression(&stmt.object);
                self.push_scope();
                self.infer_for_head(&stmt.head, Shape::String);
                self.infer_nested(&stmt.body);
                self.pop_scope();
            }
            Statement::ForOf(stmt) => {
                let iterable = self.infer_expression(&stmt.iterable);
                self.push_scope();
                self.infer_for_head(&stmt.head, iterable.element());
                self.infer_nested(&stmt.body);
                self.pop_scope();
            }
            Statement::While(stmt) => {
                self.infer_expression(&stmt.condition);
                self.infer_nested(&stmt.body);
            }
            Statement::DoWhile(stmt) => {
                self.infer_nested(&stmt.body);
                self.infer_expression(&stmt.condition);
            }
            Statement::Switch(stmt) => {
                self.infer_expression(&stmt.discriminant);
                self.push_scope();
                for case in &stmt.cases {
                    if let Some(test) = &case.test {
                        self.infer_expression(test);
                    }
                    self.infer_statements(&case.consequent);
                }
                self.pop_scope();
            }
            Statement::Try(stmt) => {
                self.infer_block(&stmt.block);
                if let Some(handler) = &stmt.handler {
                    self.push_scope();
                    if let Some(parameter) = &handler.parameter {
                        self.bind(&parameter.node, Shape::Unknown);
                    }
                    self.infer_statements(&handler.body.statements);
                    self.pop_scope();
                }
                if let Some(finalizer) = &stmt.finalizer {
                    self.infer_block(finalizer);
                }
            }
            Statement::Throw(stmt) => {
                self.infer_expression(&stmt.argument);
            }
            Statement::Return(stmt) => {
                if let Some(argument) = &stmt.argument {
                    self.infer_expression(argument);
                }
            }
            Statement::Import(import) => {
                for specifier in &import.specifiers {
                    let local = match specifier {
                        ImportSpecifier::Default(local) | ImportSpecifier::Namespace(local) => local,
                        ImportSpecifier::Named { local, .. } => local,
                    };
                    self.bind(&local.node, Shape::Unknown);
                }
            }
            Statement::Export(export) => match &export.kind {
                ExportKind::Declaration(inner) | ExportKind::DefaultDeclaration(inner) => {
                    self.infer_statement(inner)
                }
                ExportKind::DefaultExpression(expr) => {
                    self.infer_expression(expr);
                }
                ExportKind::Named { .. } | ExportKind::All { .. } => {}
            },
            Statement::Break(_) | Statement::Continue(_) | Statement::Empty(_) => {}
        }
    }

    /// Loop and branch bodies get their own scope even without braces
    fn infer_nested(&mut self, statement: &Statement) {
        self.push_scope();
        self.infer_statements(std::slice::from_ref(statement));
        self.pop_scope();
    }

    fn infer_variable(&mut self, declaration: &VariableDeclaration) {
        for declarator in &declaration.declarators {
            let initializer = declarator
                .initializer
                .as_ref()
                .map(|init| self.infer_expression(init))
                .unwrap_or(Shape::Unknown);
            let shape = match &declarator.type_annotation {
                Some(annotation) => Shape::from_annotation(annotation),
                None => initializer,
            };
            self.bind_pattern(&declarator.pattern, shape);
        }
    }

    fn infer_for_head(&mut self, head: &ForHead, element: Shape) {
        match head {
            ForHead::Declaration { pattern, .. } => self.bind_pattern(pattern, element),
            ForHead::Target(target) => {
                self.infer_expression(target);
            }
        }
    }

    /// Binds parameters (annotation first, then the caller's hint) and walks the body
    fn infer_function_body(&mut self, parameters: &[Parameter], hints: &[Shape], body: &[Statement]) {
        self.push_scope();
        self.bind_parameters(parameters, hints);
        self.infer_statements(body);
        self.pop_scope();
    }

    fn bind_parameters(&mut self, parameters: &[Parameter], hints: &[Shape]) {
        for (index, parameter) in parameters.iter().enumerate() {
            if let Some(default) = &parameter.default {
                self.infer_expression(default);
            }
            let shape = match &parameter.type_annotation {
                Some(annotation) => Shape::from_annotation(annotation),
                None => hints.get(index).cloned().unwrap_or(Shape::Unknown),
            };
            self.bind_pattern(&parameter.pattern, shape);
        }
    }

    /// Walks a function-valued expression, returning the shape of its result
    fn infer_callable(&mut self, expr: &Expression, hints: &[Shape]) -> Shape {
        let shape = match &expr.kind {
            ExpressionKind::Function(function) => {
                self.infer_function_body(&function.parameters, hints, &function.body.statements);
                function
                    .return_type
                    .as_ref()
                    .map(Shape::from_annotation)
                    .unwrap_or(Shape::Unknown)
            }
            ExpressionKind::Arrow(arrow) => {
                self.push_scope();
                self.bind_parameters(&arrow.parameters, hints);
                let body = match &arrow.body {
                    ArrowBody::Expression(body) => self.infer_expression(body),
                    ArrowBody::Block(block) => {
                        self.infer_statements(&block.statements);
                        Shape::Unknown
                    }
                };
                self.pop_scope();
                arrow
                    .return_type
                    .as_ref()
                    .map(Shape::from_annotation)
                    .unwrap_or(body)
            }
            _ => return self.infer_expression(expr).returns(),
        };
        self.record(expr, &Shape::Function(Box::new(shape.clone())));
        shape
    }

    fn record(&mut self, expr: &Expression, shape: &Shape) {
        let category = shape.category();
        if category.is_known() && !expr.id.is_synthetic() {
            self.types.insert(expr.id, category);
        }
    }

    fn infer_expression(&mut self, expr: &Expression) -> Shape {
        let shape = self.infer_expression_kind(expr);
        self.record(expr, &shape);
        shape
    }

    fn infer_expression_kind(&mut self, expr: &Expression) -> Shape {
        match &expr.kind {
            ExpressionKind::Identifier(name) => self.lookup(name),
            ExpressionKind::Literal(Literal::String(_)) => Shape::String,
            ExpressionKind::Literal(_) | ExpressionKind::This => Shape::Unknown,
            ExpressionKind::Template(template) => {
                for part in &template.expressions {
                    self.infer_expression(part);
                }
                Shape::String
            }
            ExpressionKind::Array(elements) => {
                let mut element: Option<Shape> = None;
                for item in elements {
                    let shape = match item {
                        ArrayElement::Expression(value) => self.infer_expression(value),
                        ArrayElement::Spread(source) => self.infer_expression(source).element(),
                        ArrayElement::Hole => Shape::Unknown,
                    };
                    element = Some(match element {
                        Some(previous) => previous.join(shape),
                        None => shape,
                    });
                }
                Shape::array_of(element.unwrap_or(Shape::Unknown))
            }
            ExpressionKind::Object(properties) => {
                for property in properties {
                    match property {
                        ObjectProperty::Property { value, .. } => {
                            self.infer_expression(value);
                        }
                        ObjectProperty::Shorthand(_) => {}
                        ObjectProperty::Method { function, .. } => {
                            self.infer_function_body(&function.parameters, &[], &function.body.statements);
                        }
                        ObjectProperty::Spread { value, .. } => {
                            self.infer_expression(value);
                        }
                    }
                }
                Shape::Unknown
            }
            ExpressionKind::Function(_) | ExpressionKind::Arrow(_) => {
                let result = self.infer_callable(expr, &[]);
                Shape::Function(Box::new(result))
            }
            ExpressionKind::Unary(op, operand) => {
                self.infer_expression(operand);
                if *op == UnaryOp::Typeof {
                    Shape::String
                } else {
                    Shape::Unknown
                }
            }
            ExpressionKind::Update(_, _, target) => {
                self.infer_expression(target);
                Shape::Unknown
            }
            ExpressionKind::Binary(op, left, right) => {
                let left = self.infer_expression(left);
                let right = self.infer_expression(right);
                match op {
                    BinaryOp::Add if left == Shape::String || right == Shape::String => Shape::String,
                    BinaryOp::Or | BinaryOp::NullishCoalesce => left.join(right),
                    _ => Shape::Unknown,
                }
            }
            ExpressionKind::Assignment(target, _, value) => {
                self.infer_expression(target);
                self.infer_expression(value)
            }
            ExpressionKind::Conditional(test, consequent, alternate) => {
                self.infer_expression(test);
                let consequent = self.infer_expression(consequent);
                let alternate = self.infer_expression(alternate);
                consequent.join(alternate)
            }
            ExpressionKind::Call(callee, arguments) => self.infer_call(callee, arguments),
            ExpressionKind::New(callee, arguments) => {
                self.infer_expression(callee);
                for argument in arguments {
                    self.infer_expression(argument);
                }
                if callee.is_identifier("Array") {
                    Shape::array_of(Shape::Unknown)
                } else {
                    Shape::Unknown
                }
            }
            ExpressionKind::Member(object, _) => {
                self.infer_expression(object);
                Shape::Unknown
            }
            ExpressionKind::Index(object, index) => {
                let object = self.infer_expression(object);
                self.infer_expression(index);
                object.element()
            }
            ExpressionKind::Sequence(expressions) => {
                let mut last = Shape::Unknown;
                for item in expressions {
                    last = self.infer_expression(item);
                }
                last
            }
            ExpressionKind::Parenthesized(inner) => self.infer_expression(inner),
        }
    }

    fn infer_call(&mut self, callee: &Expression, arguments: &[Expression]) -> Shape {
        if let ExpressionKind::Member(object, property) = &callee.kind {
            let method = property.node.as_str();

            // Static helpers on the global constructors
            if let Some(global) = object.as_identifier() {
                if matches!(global, "Array" | "Object") && self.lookup(global) == Shape::Unknown {
                    let first = arguments
                        .iter()
                        .map(|argument| self.infer_expression(argument))
                        .next()
                        .unwrap_or(Shape::Unknown);
                    return match (global, method) {
                        ("Array", "from") => Shape::array_of(first.element()),
                        ("Array", "of") => Shape::array_of(Shape::Unknown),
                        ("Object", "keys") => Shape::array_of(Shape::String),
                        ("Object", "values") | ("Object", "entries") => Shape::array_of(Shape::Unknown),
                        _ => Shape::Unknown,
                    };
                }
            }

            let receiver = self.infer_expression(object);
            let element = receiver.element();
            let mut callback = Shape::Unknown;
            let mut seed = None;

            match method {
                "reduce" | "reduceRight" if receiver.category().is_array() => {
                    let seed_shape = arguments.get(1).map(|argument| self.infer_expression(argument));
                    let accumulator = seed_shape.clone().unwrap_or(Shape::Unknown);
                    if let Some(reducer) = arguments.first() {
                        let hints = [accumulator, element.clone(), Shape::Unknown, receiver.clone()];
                        callback = self.infer_callable(reducer, &hints);
                    }
                    seed = seed_shape;
                }
                _ if takes_element_callback(method) && receiver.category().is_array() => {
                    let hints = if matches!(method, "sort" | "toSorted") {
                        vec![element.clone(), element.clone()]
                    } else {
                        vec![element.clone(), Shape::Unknown, receiver.clone()]
                    };
                    let mut rest = arguments.iter();
                    if let Some(first) = rest.next() {
                        callback = self.infer_callable(first, &hints);
                    }
                    for argument in rest {
                        self.infer_expression(argument);
                    }
                }
                _ => {
                    for argument in arguments {
                        self.infer_expression(argument);
                    }
                }
            }

            return method_result(&receiver, method, callback, seed);
        }

        let function = self.infer_expression(callee);
        for argument in arguments {
            self.infer_expression(argument);
        }
        match callee.as_identifier() {
            Some("String") if self.lookup("String") == Shape::Unknown => Shape::String,
            _ => function.returns(),
        }
    }
}
