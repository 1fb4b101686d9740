//! AST-driven semantic repair: resolve bare names against the module
//! tables, either by qualifying them with an already-imported module or by
//! inserting the missing import.

use log::debug;
use rustpython_parser::text_size::TextRange;

use mend_python_ast::bindings::{import_bindings, unresolved_names};
use mend_python_ast::{parse_suite, parses};

use crate::tables::candidate_modules;

/// Resolve unresolved names in a parseable source. Unparseable input and
/// edits that would break the parse are returned unchanged.
pub fn resolve_names(source: &str) -> String {
    let Ok(suite) = parse_suite(source) else {
        return source.to_string();
    };

    let unresolved = unresolved_names(&suite);
    if unresolved.is_empty() {
        return source.to_string();
    }
    let imported = import_bindings(&suite);

    // Range edits for qualification, applied back-to-front so earlier
    // offsets stay valid; import lines are collected and inserted last.
    let mut edits: Vec<(TextRange, String)> = Vec::new();
    let mut new_imports: Vec<String> = Vec::new();

    for (name, occurrences) in &unresolved {
        let Some(modules) = candidate_modules(name) else {
            continue;
        };
        if let Some(prefix) = modules
            .iter()
            .find_map(|module| imported.get(*module))
        {
            debug!("qualifying `{name}` as `{prefix}.{name}`");
            for range in occurrences {
                edits.push((*range, format!("{prefix}.{name}")));
            }
        } else {
            let module = modules[0];
            debug!("importing `{name}` from `{module}`");
            new_imports.push(format!("from {module} import {name}"));
        }
    }

    if edits.is_empty() && new_imports.is_empty() {
        return source.to_string();
    }

    let mut patched = source.to_string();
    edits.sort_by_key(|(range, _)| range.start());
    for (range, replacement) in edits.into_iter().rev() {
        let start = usize::from(range.start());
        let end = usize::from(range.end());
        patched.replace_range(start..end, &replacement);
    }

    if !new_imports.is_empty() {
        let at = import_insertion_offset(&patched);
        let block = format!("{}\n", new_imports.join("\n"));
        patched.insert_str(at, &block);
    }

    if parses(&patched) {
        patched
    } else {
        debug!("semantic repair produced unparseable source; discarding");
        source.to_string()
    }
}

/// Byte offset just past the leading comment and blank lines, where new
/// imports belong.
fn import_insertion_offset(source: &str) -> usize {
    let mut offset = 0;
    for line in source.split_inclusive('\n') {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            offset += line.len();
        } else {
            break;
        }
    }
    offset
}

#[cfg(test)]
mod tests {
    use mend_python_ast::parses;

    use super::resolve_names;

    #[test]
    fn missing_import_is_inserted() {
        let patched = resolve_names("print(sqrt(16))\n");
        assert_eq!(patched, "from math import sqrt\nprint(sqrt(16))\n");
        assert!(parses(&patched));
    }

    #[test]
    fn import_lands_after_leading_comments() {
        let patched = resolve_names("# area helper\n\nprint(sqrt(16))\n");
        assert_eq!(
            patched,
            "# area helper\n\nfrom math import sqrt\nprint(sqrt(16))\n"
        );
    }

    #[test]
    fn existing_import_qualifies_instead() {
        let patched = resolve_names("import math\nprint(sqrt(16))\n");
        assert_eq!(patched, "import math\nprint(math.sqrt(16))\n");
    }

    #[test]
    fn aliased_import_uses_the_alias() {
        let patched = resolve_names("import numpy as np\nxs = array([1, 2])\n");
        assert_eq!(patched, "import numpy as np\nxs = np.array([1, 2])\n");
    }

    #[test]
    fn preference_order_picks_the_imported_module() {
        // `mean` prefers statistics, but numpy is the one in scope.
        let patched = resolve_names("import numpy\nprint(mean([1, 2, 3]))\n");
        assert_eq!(patched, "import numpy\nprint(numpy.mean([1, 2, 3]))\n");
    }

    #[test]
    fn every_occurrence_is_qualified() {
        let patched = resolve_names("import math\nprint(sqrt(4) + sqrt(9))\n");
        assert_eq!(patched, "import math\nprint(math.sqrt(4) + math.sqrt(9))\n");
    }

    #[test]
    fn unknown_names_are_left_alone() {
        let source = "print(frobnicate(1))\n";
        assert_eq!(resolve_names(source), source);
    }

    #[test]
    fn resolved_modules_are_untouched() {
        let source = "import math\nprint(math.sqrt(16))\n";
        assert_eq!(resolve_names(source), source);
    }
}
