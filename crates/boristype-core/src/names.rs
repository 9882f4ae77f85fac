use crate::ast::expression::{Expression, ExpressionKind};
use crate::ast::{Ident, Program};
use crate::visit::{walk_expression, Fold};
use rustc_hash::FxHashSet;

/// Per-file table of names in use, for generating temporaries that cannot
/// capture or shadow anything the source declares or references.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    taken: FxHashSet<String>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the table with every identifier in `program`, returning the program untouched
    pub fn collect(program: Program) -> (Program, NameTable) {
        let mut collector = NameCollector {
            table: NameTable::new(),
        };
        let program = collector.fold_program(program);
        (program, collector.table)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.taken.contains(name)
    }

    pub fn reserve(&mut self, name: impl Into<String>) {
        self.taken.insert(name.into());
    }

    /// Returns `candidate` if it is free, otherwise `candidate_1`, `candidate_2`, ...
    /// The returned name is reserved.
    pub fn claim(&mut self, candidate: &str) -> String {
        if !self.taken.contains(candidate) {
            self.taken.insert(candidate.to_string());
            return candidate.to_string();
        }

        let mut suffix = 1usize;
        loop {
            let name = format!("{}_{}", candidate, suffix);
            if !self.taken.contains(&name) {
                self.taken.insert(name.clone());
                return name;
            }
            suffix += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.taken.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }
}

struct NameCollector {
    table: NameTable,
}

impl Fold for NameCollector {
    fn fold_expression(&mut self, expr: Expression) -> Expression {
        if let ExpressionKind::Identifier(name) = &expr.kind {
            self.table.reserve(name.clone());
        }
        walk_expression(self, expr)
    }

    fn fold_binding(&mut self, ident: Ident) -> Ident {
        self.table.reserve(ident.node.clone());
        ident
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    #[test]
    fn test_claim_avoids_collisions() {
        let mut names = NameTable::new();
        names.reserve("temp");
        assert_eq!(names.claim("temp"), "temp_1");
        assert_eq!(names.claim("temp"), "temp_2");
        assert_eq!(names.claim("other"), "other");
        assert_eq!(names.claim("other"), "other_1");
    }

    #[test]
    fn test_collect_sees_bindings_and_references() {
        let program = parse_source("const a = b; function f(c) { return d.e; }").unwrap();
        let (_, names) = NameTable::collect(program);
        for name in ["a", "b", "f", "c", "d"] {
            assert!(names.contains(name), "missing {}", name);
        }
        assert!(!names.contains("e"));
    }
}
