//! Pass orchestration.
//!
//! A [`Pipeline`] runs the lowering passes over one file's tree in a fixed order,
//! then prepends the source of every injectable helper the passes marked as used.
//! All bookkeeping lives in a [`FileState`] created per run, so one pipeline can
//! serve any number of files, including concurrently.

use crate::ast::expression::{Expression, ExpressionKind};
use crate::ast::statement::Statement;
use crate::ast::{NodeId, Program};
use crate::diagnostics::Diagnostic;
use crate::errors::CompilationError;
use crate::helpers::{Helper, HelperUsage};
use crate::names::NameTable;
use crate::parser::parse_source;
use crate::passes;
use crate::span::Span;
use crate::typeinfo::{TypeCategory, TypeOracle};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

/// A single lowering step over one file's tree.
///
/// Passes take the tree by value and return the rewritten tree. Anything a pass
/// needs to remember between nodes lives in a visitor it builds inside `run`;
/// anything that outlives the pass goes through the [`PassContext`].
pub trait LoweringPass: Send + Sync {
    fn name(&self) -> &'static str;

    fn run(&self, program: Program, ctx: &mut PassContext<'_>) -> Program;
}

/// Per-file bookkeeping shared by every pass of one pipeline run
#[derive(Debug)]
pub struct FileState {
    file_name: String,
    /// Types recorded for nodes that passes synthesized or re-typed
    facts: FxHashMap<NodeId, TypeCategory>,
    /// Types recorded for temporaries, keyed by their (unique) name
    name_facts: FxHashMap<String, TypeCategory>,
    names: NameTable,
    next_id: u32,
    helpers: HelperUsage,
    diagnostics: Vec<Diagnostic>,
}

impl FileState {
    fn new(file_name: &str, names: NameTable, node_count: u32) -> Self {
        FileState {
            file_name: file_name.to_string(),
            facts: FxHashMap::default(),
            name_facts: FxHashMap::default(),
            names,
            next_id: node_count,
            helpers: HelperUsage::new(),
            diagnostics: Vec::new(),
        }
    }
}

/// What a pass sees of the file being lowered
pub struct PassContext<'a> {
    pass: &'static str,
    oracle: &'a dyn TypeOracle,
    state: &'a mut FileState,
}

impl<'a> PassContext<'a> {
    pub fn new(pass: &'static str, oracle: &'a dyn TypeOracle, state: &'a mut FileState) -> Self {
        PassContext {
            pass,
            oracle,
            state,
        }
    }

    pub fn pass_name(&self) -> &'static str {
        self.pass
    }

    pub fn file_name(&self) -> &str {
        &self.state.file_name
    }

    /// Static category of `expr`: recorded facts first, then the oracle
    pub fn type_of(&self, expr: &Expression) -> TypeCategory {
        match &expr.kind {
            ExpressionKind::Parenthesized(inner) => return self.type_of(inner),
            ExpressionKind::Identifier(name) => {
                if let Some(category) = self.state.name_facts.get(name) {
                    return *category;
                }
            }
            _ => {}
        }

        if !expr.id.is_synthetic() {
            if let Some(category) = self.state.facts.get(&expr.id) {
                return *category;
            }
        }

        self.oracle.query(expr)
    }

    pub fn record_type(&mut self, id: NodeId, category: TypeCategory) {
        if !id.is_synthetic() && category.is_known() {
            self.state.facts.insert(id, category);
        }
    }

    /// Records the category of a temporary the pass introduced
    pub fn record_name_type(&mut self, name: &str, category: TypeCategory) {
        if category.is_known() {
            self.state.name_facts.insert(name.to_string(), category);
        }
    }

    /// A fresh name derived from `candidate` that nothing in the file uses
    pub fn fresh_name(&mut self, candidate: &str) -> String {
        self.state.names.claim(candidate)
    }

    pub fn reserve_name(&mut self, name: &str) {
        self.state.names.reserve(name);
    }

    pub fn alloc_id(&mut self) -> NodeId {
        let id = NodeId(self.state.next_id);
        self.state.next_id += 1;
        id
    }

    pub fn use_helper(&mut self, helper: Helper) {
        if !self.state.helpers.contains(helper) {
            trace!(pass = self.pass, helper = helper.name(), "helper marked as used");
        }
        self.state.helpers.mark(helper);
    }

    /// `helper(arguments)`, marking the helper as used
    pub fn call_helper(&mut self, helper: Helper, arguments: Vec<Expression>, span: Span) -> Expression {
        self.use_helper(helper);
        helper.call(arguments, span)
    }

    pub fn warn(&mut self, span: Span, message: impl Into<String>) {
        let diagnostic = Diagnostic::warning(span, message).in_file(self.state.file_name.clone());
        self.state.diagnostics.push(diagnostic);
    }
}

/// Result of lowering one file
#[derive(Debug, Clone)]
pub struct FileOutput {
    pub program: Program,
    pub diagnostics: Vec<Diagnostic>,
    pub helpers: HelperUsage,
}

/// Fixed-order lowering pipeline
pub struct Pipeline {
    passes: Vec<Box<dyn LoweringPass>>,
}

impl Pipeline {
    /// The standard pass order
    pub fn new() -> Self {
        Pipeline {
            passes: passes::standard_passes(),
        }
    }

    pub fn with_passes(passes: Vec<Box<dyn LoweringPass>>) -> Self {
        Pipeline { passes }
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    pub fn run(
        &self,
        program: Program,
        oracle: &dyn TypeOracle,
        file_name: &str,
    ) -> Result<FileOutput, CompilationError> {
        let (mut program, mut names) = NameTable::collect(program);
        for &helper in Helper::INJECTABLE {
            names.reserve(helper.name());
        }

        let mut state = FileState::new(file_name, names, program.node_count);

        for pass in &self.passes {
            debug!(pass = pass.name(), file = file_name, "running lowering pass");
            let mut ctx = PassContext::new(pass.name(), oracle, &mut state);
            program = pass.run(program, &mut ctx);
        }

        prepend_helpers(&mut program, &state.helpers)?;
        program.node_count = state.next_id;

        Ok(FileOutput {
            program,
            diagnostics: state.diagnostics,
            helpers: state.helpers,
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Inserts the source of every used injectable helper at the top of the file, in catalog order
fn prepend_helpers(program: &mut Program, helpers: &HelperUsage) -> Result<(), CompilationError> {
    let mut prelude: Vec<Statement> = Vec::new();
    for helper in helpers.injectables() {
        let Some(source) = helper.source() else {
            continue;
        };
        let parsed = parse_source(source).map_err(|e| CompilationError::HelperSource {
            name: helper.name(),
            message: e.to_string(),
        })?;
        prelude.extend(parsed.statements);
    }

    if !prelude.is_empty() {
        debug!(count = prelude.len(), "prepending helper routines");
        prelude.append(&mut program.statements);
        program.statements = prelude;
    }
    Ok(())
}
