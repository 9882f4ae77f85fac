use crate::ast::expression::{ArrayElement, Expression, ExpressionKind, ObjectProperty};
use crate::ast::Program;
use crate::helpers::Helper;
use crate::pipeline::{LoweringPass, PassContext};
use crate::span::Span;
use crate::typeinfo::TypeCategory;
use crate::visit::{walk_expression, Fold};

/// Array and object spread to union helper calls
pub struct SpreadLowering;

impl LoweringPass for SpreadLowering {
    fn name(&self) -> &'static str {
        "spread"
    }

    fn run(&self, program: Program, ctx: &mut PassContext<'_>) -> Program {
        SpreadRewriter { ctx }.fold_program(program)
    }
}

struct SpreadRewriter<'c, 'a> {
    ctx: &'c mut PassContext<'a>,
}

impl Fold for SpreadRewriter<'_, '_> {
    fn fold_expression(&mut self, expr: Expression) -> Expression {
        let Expression { id, kind, span } = walk_expression(self, expr);
        match kind {
            ExpressionKind::Array(elements)
                if elements.iter().any(|element| matches!(element, ArrayElement::Spread(_))) =>
            {
                let union = self.union_array(elements, span);
                self.ctx.record_type(id, TypeCategory::Array);
                Expression::with_id(id, union.kind, span)
            }
            ExpressionKind::Object(properties)
                if properties
                    .iter()
                    .any(|property| matches!(property, ObjectProperty::Spread { .. })) =>
            {
                let union = self.union_object(properties, span);
                Expression::with_id(id, union.kind, span)
            }
            kind => Expression::with_id(id, kind, span),
        }
    }
}

impl SpreadRewriter<'_, '_> {
    /// `[a, ...b, c]` as `ArrayUnion([a], b, [c])`; empty literal runs are dropped
    fn union_array(&mut self, elements: Vec<ArrayElement>, span: Span) -> Expression {
        let mut parts = Vec::new();
        let mut run = Vec::new();

        for element in elements {
            match element {
                ArrayElement::Spread(source) => {
                    if !run.is_empty() {
                        parts.push(Expression::new(
                            ExpressionKind::Array(std::mem::take(&mut run)),
                            span,
                        ));
                    }
                    parts.push(source);
                }
                literal => run.push(literal),
            }
        }
        if !run.is_empty() {
            parts.push(Expression::new(ExpressionKind::Array(run), span));
        }

        self.ctx.call_helper(Helper::ArrayUnion, parts, span)
    }

    /// `{ a, ...b, c }` as `ObjectUnion(ObjectUnion({ a }, b), { c })`. Later parts
    /// overwrite earlier keys, and the result is always a fresh object.
    fn union_object(&mut self, properties: Vec<ObjectProperty>, span: Span) -> Expression {
        let mut parts = Vec::new();
        let mut run = Vec::new();

        for property in properties {
            match property {
                ObjectProperty::Spread { value, .. } => {
                    if !run.is_empty() {
                        parts.push(Expression::new(
                            ExpressionKind::Object(std::mem::take(&mut run)),
                            span,
                        ));
                    }
                    parts.push(value);
                }
                literal => run.push(literal),
            }
        }
        if !run.is_empty() {
            parts.push(Expression::new(ExpressionKind::Object(run), span));
        }

        let mut parts = parts.into_iter();
        let first = parts
            .next()
            .unwrap_or_else(|| Expression::new(ExpressionKind::Object(Vec::new()), span));
        let mut result = match parts.next() {
            Some(second) => self.ctx.call_helper(Helper::ObjectUnion, vec![first, second], span),
            None => self.ctx.call_helper(
                Helper::ObjectUnion,
                vec![Expression::new(ExpressionKind::Object(Vec::new()), span), first],
                span,
            ),
        };
        for part in parts {
            result = self.ctx.call_helper(Helper::ObjectUnion, vec![result, part], span);
        }
        result
    }
}
