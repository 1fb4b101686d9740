//! A borrowed-node visitor over the rustpython AST.
//!
//! The generated visitor in `rustpython-ast` consumes nodes by value; the
//! collectors in this workspace only ever need to look, so this module
//! provides `&`-based traversal with overridable hooks.

use rustpython_ast::{self as ast, Expr, Stmt};

pub trait Visitor<'a> {
    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &'a Expr) {
        walk_expr(self, expr);
    }

    fn visit_body(&mut self, body: &'a [Stmt]) {
        for stmt in body {
            self.visit_stmt(stmt);
        }
    }
}

pub fn walk_stmt<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, stmt: &'a Stmt) {
    match stmt {
        Stmt::FunctionDef(ast::StmtFunctionDef {
            args,
            body,
            decorator_list,
            returns,
            ..
        })
        | Stmt::AsyncFunctionDef(ast::StmtAsyncFunctionDef {
            args,
            body,
            decorator_list,
            returns,
            ..
        }) => {
            for decorator in decorator_list {
                visitor.visit_expr(decorator);
            }
            walk_arguments(visitor, args);
            if let Some(returns) = returns {
                visitor.visit_expr(returns);
            }
            visitor.visit_body(body);
        }
        Stmt::ClassDef(ast::StmtClassDef {
            bases,
            keywords,
            body,
            decorator_list,
            ..
        }) => {
            for decorator in decorator_list {
                visitor.visit_expr(decorator);
            }
            for base in bases {
                visitor.visit_expr(base);
            }
            for keyword in keywords {
                visitor.visit_expr(&keyword.value);
            }
            visitor.visit_body(body);
        }
        Stmt::Return(ast::StmtReturn { value, .. }) => {
            if let Some(value) = value {
                visitor.visit_expr(value);
            }
        }
        Stmt::Delete(ast::StmtDelete { targets, .. }) => {
            for target in targets {
                visitor.visit_expr(target);
            }
        }
        Stmt::Assign(ast::StmtAssign { targets, value, .. }) => {
            for target in targets {
                visitor.visit_expr(target);
            }
            visitor.visit_expr(value);
        }
        Stmt::AugAssign(ast::StmtAugAssign { target, value, .. }) => {
            visitor.visit_expr(target);
            visitor.visit_expr(value);
        }
        Stmt::AnnAssign(ast::StmtAnnAssign {
            target,
            annotation,
            value,
            ..
        }) => {
            visitor.visit_expr(target);
            visitor.visit_expr(annotation);
            if let Some(value) = value {
                visitor.visit_expr(value);
            }
        }
        Stmt::For(ast::StmtFor {
            target,
            iter,
            body,
            orelse,
            ..
        })
        | Stmt::AsyncFor(ast::StmtAsyncFor {
            target,
            iter,
            body,
            orelse,
            ..
        }) => {
            visitor.visit_expr(target);
            visitor.visit_expr(iter);
            visitor.visit_body(body);
            visitor.visit_body(orelse);
        }
        Stmt::While(ast::StmtWhile {
            test, body, orelse, ..
        }) => {
            visitor.visit_expr(test);
            visitor.visit_body(body);
            visitor.visit_body(orelse);
        }
        Stmt::If(ast::StmtIf {
            test, body, orelse, ..
        }) => {
            visitor.visit_expr(test);
            visitor.visit_body(body);
            visitor.visit_body(orelse);
        }
        Stmt::With(ast::StmtWith { items, body, .. })
        | Stmt::AsyncWith(ast::StmtAsyncWith { items, body, .. }) => {
            for item in items {
                visitor.visit_expr(&item.context_expr);
                if let Some(vars) = &item.optional_vars {
                    visitor.visit_expr(vars);
                }
            }
            visitor.visit_body(body);
        }
        Stmt::Match(ast::StmtMatch { subject, cases, .. }) => {
            visitor.visit_expr(subject);
            for case in cases {
                if let Some(guard) = &case.guard {
                    visitor.visit_expr(guard);
                }
                visitor.visit_body(&case.body);
            }
        }
        Stmt::Raise(ast::StmtRaise { exc, cause, .. }) => {
            if let Some(exc) = exc {
                visitor.visit_expr(exc);
            }
            if let Some(cause) = cause {
                visitor.visit_expr(cause);
            }
        }
        Stmt::Try(ast::StmtTry {
            body,
            handlers,
            orelse,
            finalbody,
            ..
        })
        | Stmt::TryStar(ast::StmtTryStar {
            body,
            handlers,
            orelse,
            finalbody,
            ..
        }) => {
            visitor.visit_body(body);
            for handler in handlers {
                let ast::ExceptHandler::ExceptHandler(handler) = handler;
                if let Some(type_) = &handler.type_ {
                    visitor.visit_expr(type_);
                }
                visitor.visit_body(&handler.body);
            }
            visitor.visit_body(orelse);
            visitor.visit_body(finalbody);
        }
        Stmt::Assert(ast::StmtAssert { test, msg, .. }) => {
            visitor.visit_expr(test);
            if let Some(msg) = msg {
                visitor.visit_expr(msg);
            }
        }
        Stmt::Expr(ast::StmtExpr { value, .. }) => {
            visitor.visit_expr(value);
        }
        _ => {}
    }
}

pub fn walk_expr<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, expr: &'a Expr) {
    match expr {
        Expr::BoolOp(ast::ExprBoolOp { values, .. }) => {
            for value in values {
                visitor.visit_expr(value);
            }
        }
        Expr::NamedExpr(ast::ExprNamedExpr { target, value, .. }) => {
            visitor.visit_expr(target);
            visitor.visit_expr(value);
        }
        Expr::BinOp(ast::ExprBinOp { left, right, .. }) => {
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
        Expr::UnaryOp(ast::ExprUnaryOp { operand, .. }) => {
            visitor.visit_expr(operand);
        }
        Expr::Lambda(ast::ExprLambda { args, body, .. }) => {
            walk_arguments(visitor, args);
            visitor.visit_expr(body);
        }
        Expr::IfExp(ast::ExprIfExp {
            test, body, orelse, ..
        }) => {
            visitor.visit_expr(test);
            visitor.visit_expr(body);
            visitor.visit_expr(orelse);
        }
        Expr::Dict(ast::ExprDict { keys, values, .. }) => {
            for key in keys.iter().flatten() {
                visitor.visit_expr(key);
            }
            for value in values {
                visitor.visit_expr(value);
            }
        }
        Expr::Set(ast::ExprSet { elts, .. }) => {
            for elt in elts {
                visitor.visit_expr(elt);
            }
        }
        Expr::ListComp(ast::ExprListComp {
            elt, generators, ..
        })
        | Expr::SetComp(ast::ExprSetComp {
            elt, generators, ..
        })
        | Expr::GeneratorExp(ast::ExprGeneratorExp {
            elt, generators, ..
        }) => {
            visitor.visit_expr(elt);
            walk_comprehensions(visitor, generators);
        }
        Expr::DictComp(ast::ExprDictComp {
            key,
            value,
            generators,
            ..
        }) => {
            visitor.visit_expr(key);
            visitor.visit_expr(value);
            walk_comprehensions(visitor, generators);
        }
        Expr::Await(ast::ExprAwait { value, .. })
        | Expr::YieldFrom(ast::ExprYieldFrom { value, .. }) => {
            visitor.visit_expr(value);
        }
        Expr::Yield(ast::ExprYield { value, .. }) => {
            if let Some(value) = value {
                visitor.visit_expr(value);
            }
        }
        Expr::Compare(ast::ExprCompare {
            left, comparators, ..
        }) => {
            visitor.visit_expr(left);
            for comparator in comparators {
                visitor.visit_expr(comparator);
            }
        }
        Expr::Call(ast::ExprCall {
            func,
            args,
            keywords,
            ..
        }) => {
            visitor.visit_expr(func);
            for arg in args {
                visitor.visit_expr(arg);
            }
            for keyword in keywords {
                visitor.visit_expr(&keyword.value);
            }
        }
        Expr::FormattedValue(ast::ExprFormattedValue {
            value, format_spec, ..
        }) => {
            visitor.visit_expr(value);
            if let Some(format_spec) = format_spec {
                visitor.visit_expr(format_spec);
            }
        }
        Expr::JoinedStr(ast::ExprJoinedStr { values, .. }) => {
            for value in values {
                visitor.visit_expr(value);
            }
        }
        Expr::Attribute(ast::ExprAttribute { value, .. }) => {
            visitor.visit_expr(value);
        }
        Expr::Subscript(ast::ExprSubscript { value, slice, .. }) => {
            visitor.visit_expr(value);
            visitor.visit_expr(slice);
        }
        Expr::Starred(ast::ExprStarred { value, .. }) => {
            visitor.visit_expr(value);
        }
        Expr::List(ast::ExprList { elts, .. }) | Expr::Tuple(ast::ExprTuple { elts, .. }) => {
            for elt in elts {
                visitor.visit_expr(elt);
            }
        }
        Expr::Slice(ast::ExprSlice {
            lower, upper, step, ..
        }) => {
            if let Some(lower) = lower {
                visitor.visit_expr(lower);
            }
            if let Some(upper) = upper {
                visitor.visit_expr(upper);
            }
            if let Some(step) = step {
                visitor.visit_expr(step);
            }
        }
        _ => {}
    }
}

fn walk_arguments<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, args: &'a ast::Arguments) {
    for arg in args.posonlyargs.iter().chain(&args.args).chain(&args.kwonlyargs) {
        if let Some(annotation) = &arg.def.annotation {
            visitor.visit_expr(annotation);
        }
        if let Some(default) = &arg.default {
            visitor.visit_expr(default);
        }
    }
}

fn walk_comprehensions<'a, V: Visitor<'a> + ?Sized>(
    visitor: &mut V,
    generators: &'a [ast::Comprehension],
) {
    for comprehension in generators {
        visitor.visit_expr(&comprehension.target);
        visitor.visit_expr(&comprehension.iter);
        for condition in &comprehension.ifs {
            visitor.visit_expr(condition);
        }
    }
}
