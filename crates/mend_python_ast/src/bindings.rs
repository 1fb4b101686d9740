//! Symbol collection: which names a module binds, and which it merely uses.

use rustc_hash::{FxHashMap, FxHashSet};
use rustpython_parser::ast::{self, Expr, ExprContext, Ranged, Stmt, Suite};
use rustpython_parser::text_size::TextRange;

use crate::builtins::BUILTINS;
use crate::visitor::{walk_expr, walk_stmt, Visitor};

/// Every name the module can resolve: builtins, imported modules and their
/// aliases, `from`-imported names, function and class definitions, function
/// parameters, and simple assignment targets.
pub fn defined_names(suite: &Suite) -> FxHashSet<String> {
    let mut collector = DefinedNames {
        names: BUILTINS.iter().map(|name| (*name).to_string()).collect(),
    };
    collector.visit_body(suite);
    collector.names
}

struct DefinedNames {
    names: FxHashSet<String>,
}

impl<'a> Visitor<'a> for DefinedNames {
    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        match stmt {
            Stmt::Import(ast::StmtImport { names, .. }) => {
                for alias in names {
                    let bound = alias
                        .asname
                        .as_ref()
                        .map(|asname| asname.to_string())
                        // `import os.path` binds `os`.
                        .unwrap_or_else(|| root_module(alias.name.as_str()).to_string());
                    self.names.insert(bound);
                }
            }
            Stmt::ImportFrom(ast::StmtImportFrom { names, .. }) => {
                for alias in names {
                    let bound = alias.asname.as_ref().unwrap_or(&alias.name);
                    self.names.insert(bound.to_string());
                }
            }
            Stmt::FunctionDef(ast::StmtFunctionDef { name, args, .. })
            | Stmt::AsyncFunctionDef(ast::StmtAsyncFunctionDef { name, args, .. }) => {
                self.names.insert(name.to_string());
                for arg in args
                    .posonlyargs
                    .iter()
                    .chain(&args.args)
                    .chain(&args.kwonlyargs)
                {
                    self.names.insert(arg.def.arg.to_string());
                }
                if let Some(vararg) = &args.vararg {
                    self.names.insert(vararg.arg.to_string());
                }
                if let Some(kwarg) = &args.kwarg {
                    self.names.insert(kwarg.arg.to_string());
                }
            }
            Stmt::ClassDef(ast::StmtClassDef { name, .. }) => {
                self.names.insert(name.to_string());
            }
            Stmt::Assign(ast::StmtAssign { targets, .. }) => {
                for target in targets {
                    if let Expr::Name(ast::ExprName { id, .. }) = target {
                        self.names.insert(id.to_string());
                    }
                }
            }
            _ => {}
        }
        walk_stmt(self, stmt);
    }
}

/// Every load-context identifier occurrence, in source order.
pub fn load_names(suite: &Suite) -> Vec<(String, TextRange)> {
    let mut collector = LoadNames { names: Vec::new() };
    collector.visit_body(suite);
    collector.names
}

struct LoadNames {
    names: Vec<(String, TextRange)>,
}

impl<'a> Visitor<'a> for LoadNames {
    fn visit_expr(&mut self, expr: &'a Expr) {
        if let Expr::Name(ast::ExprName { id, ctx, range }) = expr {
            if matches!(ctx, ExprContext::Load) {
                self.names.push((id.to_string(), *range));
            }
        }
        walk_expr(self, expr);
    }
}

/// Load-context identifiers with no binding in the module, grouped by name
/// with all their occurrence ranges, in first-occurrence order.
pub fn unresolved_names(suite: &Suite) -> Vec<(String, Vec<TextRange>)> {
    let defined = defined_names(suite);
    let mut order: Vec<String> = Vec::new();
    let mut ranges: FxHashMap<String, Vec<TextRange>> = FxHashMap::default();
    for (name, range) in load_names(suite) {
        if defined.contains(&name) {
            continue;
        }
        if !ranges.contains_key(&name) {
            order.push(name.clone());
        }
        ranges.entry(name).or_default().push(range);
    }
    order
        .into_iter()
        .map(|name| {
            let occurrences = ranges.remove(&name).unwrap_or_default();
            (name, occurrences)
        })
        .collect()
}

/// Names bound at the top level of the module: function and class
/// definitions plus simple assignment targets.
pub fn top_level_names(suite: &Suite) -> FxHashSet<String> {
    let mut names = FxHashSet::default();
    for stmt in suite {
        match stmt {
            Stmt::FunctionDef(ast::StmtFunctionDef { name, .. })
            | Stmt::AsyncFunctionDef(ast::StmtAsyncFunctionDef { name, .. })
            | Stmt::ClassDef(ast::StmtClassDef { name, .. }) => {
                names.insert(name.to_string());
            }
            Stmt::Assign(ast::StmtAssign { targets, .. }) => {
                for target in targets {
                    if let Expr::Name(ast::ExprName { id, .. }) = target {
                        names.insert(id.to_string());
                    }
                }
            }
            _ => {}
        }
    }
    names
}

/// Top-level function and class definitions with their source ranges.
pub fn top_level_defs(suite: &Suite) -> Vec<(String, TextRange)> {
    suite
        .iter()
        .filter_map(|stmt| match stmt {
            Stmt::FunctionDef(ast::StmtFunctionDef { name, .. })
            | Stmt::AsyncFunctionDef(ast::StmtAsyncFunctionDef { name, .. })
            | Stmt::ClassDef(ast::StmtClassDef { name, .. }) => {
                Some((name.to_string(), stmt.range()))
            }
            _ => None,
        })
        .collect()
}

/// Root module names imported anywhere in the module.
pub fn imported_modules(suite: &Suite) -> FxHashSet<String> {
    let mut collector = ImportedModules {
        modules: FxHashSet::default(),
        bindings: FxHashMap::default(),
    };
    collector.visit_body(suite);
    collector.modules
}

/// Map from imported module path to the prefix that references it in source
/// (`numpy` → `np` under `import numpy as np`, `os.path` → `os.path`).
pub fn import_bindings(suite: &Suite) -> FxHashMap<String, String> {
    let mut collector = ImportedModules {
        modules: FxHashSet::default(),
        bindings: FxHashMap::default(),
    };
    collector.visit_body(suite);
    collector.bindings
}

struct ImportedModules {
    modules: FxHashSet<String>,
    bindings: FxHashMap<String, String>,
}

impl<'a> Visitor<'a> for ImportedModules {
    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        match stmt {
            Stmt::Import(ast::StmtImport { names, .. }) => {
                for alias in names {
                    self.modules.insert(root_module(alias.name.as_str()).to_string());
                    let prefix = alias
                        .asname
                        .as_ref()
                        .map_or_else(|| alias.name.to_string(), |asname| asname.to_string());
                    self.bindings.insert(alias.name.to_string(), prefix);
                }
            }
            Stmt::ImportFrom(ast::StmtImportFrom {
                module: Some(module),
                ..
            }) => {
                self.modules.insert(root_module(module.as_str()).to_string());
            }
            _ => {}
        }
        walk_stmt(self, stmt);
    }
}

fn root_module(path: &str) -> &str {
    path.split('.').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use crate::parse::parse_suite;

    use super::{
        defined_names, import_bindings, imported_modules, top_level_defs, top_level_names,
        unresolved_names,
    };

    const SAMPLE: &str = "\
import math
import numpy as np
from collections import deque

def area(r):
    return math.pi * r * r

radius = 2
print(area(radius))
print(sqrt(radius))
";

    #[test]
    fn defined_covers_imports_defs_params_and_targets() {
        let suite = parse_suite(SAMPLE).unwrap();
        let defined = defined_names(&suite);
        for name in ["math", "np", "deque", "area", "r", "radius", "print"] {
            assert!(defined.contains(name), "missing {name}");
        }
        assert!(!defined.contains("sqrt"));
    }

    #[test]
    fn unresolved_collects_load_context_only() {
        let suite = parse_suite(SAMPLE).unwrap();
        let unresolved = unresolved_names(&suite);
        let names: Vec<&str> = unresolved.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["sqrt"]);
        assert_eq!(unresolved[0].1.len(), 1);
    }

    #[test]
    fn top_level_collection() {
        let suite = parse_suite(SAMPLE).unwrap();
        let names = top_level_names(&suite);
        assert!(names.contains("area"));
        assert!(names.contains("radius"));
        assert!(!names.contains("r"));

        let defs = top_level_defs(&suite);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].0, "area");
    }

    #[test]
    fn import_tracking() {
        let suite = parse_suite(SAMPLE).unwrap();
        let modules = imported_modules(&suite);
        assert!(modules.contains("math"));
        assert!(modules.contains("numpy"));
        assert!(modules.contains("collections"));

        let bindings = import_bindings(&suite);
        assert_eq!(bindings.get("numpy").unwrap(), "np");
        assert_eq!(bindings.get("math").unwrap(), "math");
    }

    #[test]
    fn dotted_import_binds_root() {
        let suite = parse_suite("import os.path\nprint(os.path.join('a', 'b'))\n").unwrap();
        assert!(defined_names(&suite).contains("os"));
        assert_eq!(import_bindings(&suite).get("os.path").unwrap(), "os.path");
        assert!(unresolved_names(&suite).is_empty());
    }
}
