use crate::ast::expression::{BinaryOp, Expression, UpdateOp, UpdatePosition};
use crate::ast::statement::{
    Block, ForHead, ForInit, ForOfStatement, ForStatement, Statement, VariableDeclaration,
    VariableDeclarator, VariableKind,
};
use crate::ast::pattern::Pattern;
use crate::ast::{Program, Spanned};
use crate::helpers::Helper;
use crate::pipeline::{LoweringPass, PassContext};
use crate::visit::{fold_nested, walk_for_head, walk_statement, Fold};
use tracing::trace;

/// `for (x of items)` to an indexed `for` over a temporary holding the collection
pub struct ForOfLowering;

impl LoweringPass for ForOfLowering {
    fn name(&self) -> &'static str {
        "for-of"
    }

    fn run(&self, program: Program, ctx: &mut PassContext<'_>) -> Program {
        IndexedLoops { ctx }.fold_program(program)
    }
}

struct IndexedLoops<'c, 'a> {
    ctx: &'c mut PassContext<'a>,
}

impl Fold for IndexedLoops<'_, '_> {
    fn fold_statement(&mut self, statement: Statement) -> Vec<Statement> {
        match statement {
            Statement::ForOf(stmt) => {
                // Outer loops claim their names before the loops nested in them
                let items = self.ctx.fresh_name("__items");
                let index = self.ctx.fresh_name("__index");
                let stmt = ForOfStatement {
                    head: walk_for_head(self, stmt.head),
                    iterable: self.fold_expression(stmt.iterable),
                    body: fold_nested(self, stmt.body),
                    span: stmt.span,
                };
                self.lower(stmt, items, index)
            }
            other => walk_statement(self, other),
        }
    }
}

impl IndexedLoops<'_, '_> {
    fn lower(&mut self, stmt: ForOfStatement, items: String, index: String) -> Vec<Statement> {
        let ForOfStatement {
            head,
            iterable,
            body,
            span,
        } = stmt;

        let category = self.ctx.type_of(&iterable);
        self.ctx.record_name_type(&items, category);
        trace!(items = %items, ?category, "lowering for-of");

        let items_ref = Expression::identifier(items.clone(), span);
        let index_ref = Expression::identifier(index.clone(), span);

        let element = if category.is_string() {
            let next = Expression::binary(BinaryOp::Add, index_ref.clone(), Expression::number(1.0, span), span);
            self.ctx.call_helper(
                Helper::StrCharRangePos,
                vec![items_ref.clone(), index_ref.clone(), next],
                span,
            )
        } else {
            Expression::index(items_ref.clone(), index_ref.clone(), span)
        };

        let binding = match head {
            ForHead::Declaration {
                kind,
                pattern,
                span: head_span,
            } => Statement::Variable(VariableDeclaration {
                kind,
                declarators: vec![VariableDeclarator {
                    pattern,
                    type_annotation: None,
                    initializer: Some(element),
                    span: head_span,
                }],
                span: head_span,
            }),
            ForHead::Target(target) => Statement::assign(target, element, span),
        };

        let mut statements = vec![binding];
        statements.extend(body.into_statements());

        let loop_statement = Statement::For(ForStatement {
            init: Some(ForInit::Variable(VariableDeclaration {
                kind: VariableKind::Let,
                declarators: vec![VariableDeclarator {
                    pattern: Pattern::Identifier(Spanned::new(index, span)),
                    type_annotation: None,
                    initializer: Some(Expression::number(0.0, span)),
                    span,
                }],
                span,
            })),
            test: Some(Expression::binary(
                BinaryOp::LessThan,
                index_ref.clone(),
                Expression::member(items_ref, "length", span),
                span,
            )),
            update: Some(Expression::update(UpdateOp::Increment, UpdatePosition::Postfix, index_ref, span)),
            body: Box::new(Statement::Block(Block::new(statements, span))),
            span,
        });

        vec![
            Statement::declare(VariableKind::Const, items, Some(iterable), span),
            loop_statement,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::test_support::lower_with;
    use crate::passes::BuiltinDispatch;
    use indoc::indoc;

    fn lower(source: &str) -> String {
        lower_with(source, vec![Box::new(ForOfLowering)])
    }

    #[test]
    fn test_for_of_becomes_indexed_loop() {
        let output = lower(indoc! {"
            const out = [];
            for (const x of [1, 2, 3]) {
                out.push(x * 2);
            }
        "});
        assert_eq!(
            output,
            indoc! {"
                const out = [];
                const __items = [1, 2, 3];
                for (let __index = 0; __index < __items.length; __index++) {
                    const x = __items[__index];
                    out.push(x * 2);
                }
            "}
        );
    }

    #[test]
    fn test_target_head_assigns() {
        let output = lower("let x; for (x of list) log(x);");
        assert!(output.contains("x = __items[__index];\n    log(x);"));
    }

    #[test]
    fn test_string_iterable_reads_characters() {
        let output = lower("const s: string = \"abc\"; for (const c of s) log(c);");
        assert!(output.contains("const c = StrCharRangePos(__items, __index, __index + 1);"));
    }

    #[test]
    fn test_pattern_head_kept_for_destructuring() {
        let output = lower("for (const [k, v] of pairs) log(k, v);");
        assert!(output.contains("const [k, v] = __items[__index];"));
    }

    #[test]
    fn test_nested_loops_get_distinct_names() {
        let output = lower(indoc! {"
            for (const row of grid) {
                for (const cell of row) {
                    log(cell);
                }
            }
        "});
        assert!(output.contains("const __items_1 = row;"));
        assert!(output.contains("__index_1 < __items_1.length"));
        assert!(!output.contains(" of "));
    }

    #[test]
    fn test_collection_type_recorded() {
        let text = lower_with(
            "const xs = [1]; for (const x of xs) log(x);",
            vec![Box::new(ForOfLowering), Box::new(BuiltinDispatch)],
        );
        assert!(text.contains("__index < ArrayCount(__items)"));
    }
}
