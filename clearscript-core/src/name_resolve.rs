//! Name resolution: binds every identifier to a symbol.
//!
//! Top-level functions and all labels are collected in a pre-pass so that
//! calls and gotos may refer forward. Everything else must be declared
//! before use. Errors are accumulated and reported together.

use std::collections::HashSet;

use crate::ast::{
    CaseLabel, ClassDecl, Expr, ExprKind, FunctionDecl, Ident, Program, Stmt, StmtKind,
    StructDecl,
};
use crate::builtins::OperandShape;
use crate::diagnostic::Diagnostic;
use crate::error::CoreError;
use crate::scope::{ScopeId, SymbolId, SymbolKind, SymbolTable};
use crate::span::Span;

/// A program whose identifiers all carry a `SymbolId`, plus the table
/// those ids point into.
#[derive(Debug)]
pub struct ResolvedProgram {
    pub program: Program,
    pub symbols: SymbolTable,
}

/// Resolve every name in `program`, or report every semantic error found.
pub fn resolve(mut program: Program) -> Result<ResolvedProgram, CoreError> {
    let mut resolver = Resolver::default();
    resolver.collect_globals(&mut program.items);
    for stmt in &mut program.items {
        resolver.resolve_item(stmt);
    }
    if resolver.diagnostics.is_empty() {
        Ok(ResolvedProgram {
            program,
            symbols: resolver.symbols,
        })
    } else {
        Err(CoreError::SemanticError(resolver.diagnostics))
    }
}

#[derive(Default)]
struct Resolver {
    symbols: SymbolTable,
    diagnostics: Vec<Diagnostic>,
    /// Number of enclosing loops and switches.
    breakable: usize,
    in_function: bool,
}

impl Resolver {
    fn error(&mut self, code: &'static str, span: Span, message: impl Into<String>) {
        self.diagnostics
            .push(Diagnostic::error(message, span).with_code(code));
    }

    fn duplicate(&mut self, ident: &Ident, previous: Span) {
        self.error(
            "E0202",
            ident.span,
            format!(
                "duplicate declaration of '{}' (previously declared at {previous})",
                ident.name
            ),
        );
    }

    // ----- pre-pass -----

    fn collect_globals(&mut self, items: &mut [Stmt]) {
        for stmt in items.iter_mut() {
            if let StmtKind::Function(decl) = &mut stmt.kind {
                match self.symbols.declare(
                    SymbolTable::GLOBAL,
                    &decl.name.name,
                    SymbolKind::Function,
                    decl.name.span,
                    decl.params.len(),
                ) {
                    Ok(id) => decl.name.symbol = Some(id),
                    Err(existing) => {
                        let previous = self.span_of(existing);
                        self.duplicate(&decl.name, previous);
                    }
                }
            }
        }
        self.collect_labels(items);
    }

    fn collect_labels(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            match &stmt.kind {
                StmtKind::Label(name) => {
                    let function = self
                        .symbols
                        .lookup(SymbolTable::GLOBAL, &name.name)
                        .filter(|&id| self.is_function(id));
                    if let Some(function) = function {
                        let previous = self.span_of(function);
                        self.duplicate(name, previous);
                        continue;
                    }
                    if let Err(existing) = self.symbols.declare_label(&name.name, name.span) {
                        let previous = self.span_of(existing);
                        self.duplicate(name, previous);
                    }
                }
                StmtKind::If {
                    then_body,
                    else_body,
                    ..
                } => {
                    self.collect_labels(then_body);
                    if let Some(else_body) = else_body {
                        self.collect_labels(else_body);
                    }
                }
                StmtKind::While { body, .. } | StmtKind::For { body, .. } => {
                    self.collect_labels(body);
                }
                StmtKind::Switch { arms, .. } => {
                    for arm in arms {
                        self.collect_labels(&arm.body);
                    }
                }
                StmtKind::Function(decl) => self.collect_labels(&decl.body),
                _ => {}
            }
        }
    }

    fn span_of(&self, id: SymbolId) -> Span {
        self.symbols.symbol(id).map(|s| s.span).unwrap_or_default()
    }

    fn is_function(&self, id: SymbolId) -> bool {
        self.symbols
            .symbol(id)
            .is_some_and(|s| s.kind == SymbolKind::Function)
    }

    // ----- declarations -----

    fn resolve_item(&mut self, stmt: &mut Stmt) {
        match &mut stmt.kind {
            StmtKind::Function(decl) => self.resolve_function(decl),
            StmtKind::Class(class) => self.resolve_class(class),
            StmtKind::Struct(decl) => self.resolve_struct(decl),
            StmtKind::Method(decl) => {
                self.declare(
                    SymbolTable::GLOBAL,
                    &mut decl.name,
                    SymbolKind::Method,
                    decl.params.len(),
                );
            }
            _ => self.resolve_stmt(stmt, SymbolTable::GLOBAL),
        }
    }

    fn declare(&mut self, scope: ScopeId, ident: &mut Ident, kind: SymbolKind, arity: usize) {
        match self
            .symbols
            .declare(scope, &ident.name, kind, ident.span, arity)
        {
            Ok(id) => ident.symbol = Some(id),
            Err(existing) => {
                let previous = self.span_of(existing);
                self.duplicate(ident, previous);
            }
        }
    }

    fn resolve_function(&mut self, decl: &mut FunctionDecl) {
        let scope = self.symbols.push_scope(SymbolTable::GLOBAL);
        for param in &mut decl.params {
            self.declare(scope, param, SymbolKind::Variable, 0);
        }
        let saved = std::mem::take(&mut self.breakable);
        self.in_function = true;
        for stmt in &mut decl.body {
            self.resolve_stmt(stmt, scope);
        }
        self.in_function = false;
        self.breakable = saved;
    }

    /// Classes are only checked for duplicate names; bodies stay unresolved.
    fn resolve_class(&mut self, class: &mut ClassDecl) {
        self.declare(SymbolTable::GLOBAL, &mut class.name, SymbolKind::Class, 0);
        let names = class
            .fields
            .iter()
            .filter_map(Stmt::declared_name)
            .chain(class.methods.iter().map(|method| &method.name));
        let clashes = duplicate_members(names);
        for (span, member) in clashes {
            self.error(
                "E0202",
                span,
                format!("duplicate member '{member}' in class '{}'", class.name.name),
            );
        }
    }

    /// Structs are templates: only the name and field names are checked.
    fn resolve_struct(&mut self, decl: &mut StructDecl) {
        self.declare(SymbolTable::GLOBAL, &mut decl.name, SymbolKind::Struct, 0);
        let clashes = duplicate_members(decl.fields.iter().filter_map(Stmt::declared_name));
        for (span, member) in clashes {
            self.error(
                "E0202",
                span,
                format!("duplicate member '{member}' in struct '{}'", decl.name.name),
            );
        }
    }

    // ----- statements -----

    fn resolve_block(&mut self, stmts: &mut [Stmt], parent: ScopeId) {
        let scope = if stmts.iter().any(|stmt| stmt.declared_name().is_some()) {
            self.symbols.push_scope(parent)
        } else {
            parent
        };
        for stmt in stmts {
            self.resolve_stmt(stmt, scope);
        }
    }

    fn resolve_stmt(&mut self, stmt: &mut Stmt, scope: ScopeId) {
        let span = stmt.span;
        match &mut stmt.kind {
            StmtKind::VarDecl { name, init, .. } => {
                if let Some(init) = init {
                    self.resolve_expr(init, scope);
                }
                self.declare(scope, name, SymbolKind::Variable, 0);
            }
            StmtKind::ConstDecl { name, init, .. } => {
                self.resolve_expr(init, scope);
                self.declare(scope, name, SymbolKind::Const, 0);
            }
            StmtKind::ArrayDecl { name, elements, .. } => {
                for element in elements.iter_mut() {
                    self.resolve_expr(element, scope);
                }
                self.declare(scope, name, SymbolKind::Array, 0);
            }
            StmtKind::Assign { target, value } => {
                self.resolve_expr(value, scope);
                self.resolve_target(target, scope);
            }
            StmtKind::If {
                cond,
                then_body,
                else_body,
            } => {
                self.resolve_expr(cond, scope);
                self.resolve_block(then_body, scope);
                if let Some(else_body) = else_body {
                    self.resolve_block(else_body, scope);
                }
            }
            StmtKind::While { cond, body } => {
                self.resolve_expr(cond, scope);
                self.breakable += 1;
                self.resolve_block(body, scope);
                self.breakable -= 1;
            }
            StmtKind::For {
                init,
                cond,
                step,
                body,
            } => {
                let declares = init
                    .as_ref()
                    .is_some_and(|init| init.declared_name().is_some());
                let scope = if declares {
                    self.symbols.push_scope(scope)
                } else {
                    scope
                };
                if let Some(init) = init {
                    self.resolve_stmt(init, scope);
                }
                if let Some(cond) = cond {
                    self.resolve_expr(cond, scope);
                }
                if let Some(step) = step {
                    self.resolve_stmt(step, scope);
                }
                self.breakable += 1;
                self.resolve_block(body, scope);
                self.breakable -= 1;
            }
            StmtKind::Switch { scrutinee, arms } => {
                self.resolve_expr(scrutinee, scope);
                let mut seen = HashSet::new();
                for arm in arms.iter_mut() {
                    if let CaseLabel::Case(value) = &mut arm.label {
                        if let Some(text) = literal_text(value) {
                            if !seen.insert(text) {
                                self.error("E0210", value.span, "duplicate case value in switch");
                            }
                        }
                        self.resolve_expr(value, scope);
                    }
                }
                // All arms share one scope since control falls through them.
                let declares = arms
                    .iter()
                    .flat_map(|arm| &arm.body)
                    .any(|stmt| stmt.declared_name().is_some());
                let arm_scope = if declares {
                    self.symbols.push_scope(scope)
                } else {
                    scope
                };
                self.breakable += 1;
                for arm in arms.iter_mut() {
                    for stmt in &mut arm.body {
                        self.resolve_stmt(stmt, arm_scope);
                    }
                }
                self.breakable -= 1;
            }
            StmtKind::Function(_)
            | StmtKind::Class(_)
            | StmtKind::Method(_)
            | StmtKind::Struct(_) => {
                self.error(
                    "E0209",
                    span,
                    "functions, methods, classes and structs may only be declared at the top level",
                );
            }
            StmtKind::Label(name) => {
                name.symbol = self.symbols.label(&name.name);
            }
            StmtKind::Goto { target, condition } => {
                match self.symbols.label(&target.name) {
                    Some(id) => target.symbol = Some(id),
                    None => self.error(
                        "E0203",
                        target.span,
                        format!("goto to undefined label '{}'", target.name),
                    ),
                }
                if let Some(condition) = condition {
                    self.resolve_expr(condition, scope);
                }
            }
            StmtKind::Break => {
                if self.breakable == 0 {
                    self.error("E0208", span, "'break' outside of a loop or switch");
                }
            }
            StmtKind::Return(value) => {
                if !self.in_function {
                    self.error("E0211", span, "'return' outside of a function");
                }
                if let Some(value) = value {
                    self.resolve_expr(value, scope);
                }
            }
            StmtKind::Command { command, args } => {
                let descriptor = command.descriptor();
                if !descriptor.accepts(args.len()) {
                    self.error(
                        "E0204",
                        span,
                        format!(
                            "'{}' expects {} argument(s), found {}",
                            descriptor.name,
                            descriptor.arity_text(),
                            args.len()
                        ),
                    );
                }
                for (index, arg) in args.iter_mut().enumerate() {
                    match descriptor.shape_at(index) {
                        Some(OperandShape::Variable) => self.resolve_variable_operand(arg, scope),
                        Some(OperandShape::Target) => self.resolve_target_operand(arg),
                        _ => self.resolve_expr(arg, scope),
                    }
                }
            }
            StmtKind::Expr(expr) => self.resolve_expr(expr, scope),
            StmtKind::Raw(_) => {}
        }
    }

    /// Left side of an assignment or operand of `++`/`--`.
    fn resolve_target(&mut self, target: &mut Expr, scope: ScopeId) {
        match &mut target.kind {
            ExprKind::Var(ident) => self.resolve_writable(ident, scope),
            ExprKind::Member { path, target } => {
                if self.array_length(path, scope).is_some() {
                    self.error(
                        "E0206",
                        target.span,
                        format!("length of array '{}' is read-only", path[0].name),
                    );
                } else {
                    self.resolve_writable(target, scope);
                }
            }
            _ => self.resolve_expr(target, scope),
        }
    }

    /// The array named by `arr.length`, if `path` has that shape.
    fn array_length(&self, path: &[Ident], scope: ScopeId) -> Option<SymbolId> {
        let [array, field] = path else {
            return None;
        };
        if field.name != "length" {
            return None;
        }
        self.symbols
            .lookup(scope, &array.name)
            .filter(|&id| self.symbols.symbol(id).is_some_and(|s| s.kind == SymbolKind::Array))
    }

    fn resolve_writable(&mut self, ident: &mut Ident, scope: ScopeId) {
        let Some(id) = self.lookup(ident, scope) else {
            return;
        };
        let kind = self.symbols.symbol(id).map(|s| s.kind);
        match kind {
            Some(SymbolKind::Variable) => ident.symbol = Some(id),
            Some(SymbolKind::Const) => self.error(
                "E0205",
                ident.span,
                format!("cannot assign to constant '{}'", ident.name),
            ),
            Some(SymbolKind::Array) => self.error(
                "E0206",
                ident.span,
                format!("cannot assign to array '{}' as a whole", ident.name),
            ),
            Some(other) => self.error(
                "E0206",
                ident.span,
                format!("'{}' is a {}, not a variable", ident.name, other.describe()),
            ),
            None => {}
        }
    }

    fn resolve_variable_operand(&mut self, arg: &mut Expr, scope: ScopeId) {
        if matches!(arg.kind, ExprKind::Var(_) | ExprKind::Member { .. }) {
            self.resolve_target(arg, scope);
        } else {
            self.error("E0204", arg.span, "expected a variable name here");
        }
    }

    fn resolve_target_operand(&mut self, arg: &mut Expr) {
        let ExprKind::Var(ident) = &mut arg.kind else {
            self.error("E0204", arg.span, "expected a label or function name here");
            return;
        };
        let found = self.symbols.label(&ident.name).or_else(|| {
            self.symbols
                .lookup(SymbolTable::GLOBAL, &ident.name)
                .filter(|&id| self.is_function(id))
        });
        match found {
            Some(id) => ident.symbol = Some(id),
            None => self.error(
                "E0203",
                ident.span,
                format!("undefined label or function '{}'", ident.name),
            ),
        }
    }

    // ----- expressions -----

    fn lookup(&mut self, ident: &Ident, scope: ScopeId) -> Option<SymbolId> {
        let found = self.symbols.lookup(scope, &ident.name);
        if found.is_none() {
            self.error(
                "E0201",
                ident.span,
                format!("use of undeclared identifier '{}'", ident.name),
            );
        }
        found
    }

    fn resolve_expr(&mut self, expr: &mut Expr, scope: ScopeId) {
        match &mut expr.kind {
            ExprKind::Int(_) | ExprKind::Float(_) | ExprKind::Str(_) => {}
            ExprKind::Var(ident) => self.resolve_value(ident, scope),
            ExprKind::Member { path, target } => match self.array_length(path, scope) {
                Some(array) => target.symbol = Some(array),
                None => self.resolve_value(target, scope),
            },
            ExprKind::Binary { lhs, rhs, .. } => {
                self.resolve_expr(lhs, scope);
                self.resolve_expr(rhs, scope);
            }
            ExprKind::Unary { op, operand } => {
                if op.is_step() {
                    self.resolve_target(operand, scope);
                } else {
                    self.resolve_expr(operand, scope);
                }
            }
            ExprKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => {
                self.resolve_expr(cond, scope);
                self.resolve_expr(then_expr, scope);
                self.resolve_expr(else_expr, scope);
            }
            ExprKind::Index { array, index } => {
                if let Some(id) = self.lookup(array, scope) {
                    if self
                        .symbols
                        .symbol(id)
                        .is_some_and(|s| s.kind == SymbolKind::Array)
                    {
                        array.symbol = Some(id);
                    } else {
                        self.error(
                            "E0206",
                            array.span,
                            format!("'{}' is not an array and cannot be indexed", array.name),
                        );
                    }
                }
                self.resolve_expr(index, scope);
            }
            ExprKind::Call { callee, args } => {
                self.resolve_call(callee, args.len(), scope);
                for arg in args.iter_mut() {
                    self.resolve_expr(arg, scope);
                }
            }
        }
    }

    fn resolve_value(&mut self, ident: &mut Ident, scope: ScopeId) {
        let Some(id) = self.lookup(ident, scope) else {
            return;
        };
        let kind = self.symbols.symbol(id).map(|s| s.kind);
        match kind {
            Some(SymbolKind::Variable | SymbolKind::Const) => ident.symbol = Some(id),
            Some(SymbolKind::Array) => self.error(
                "E0206",
                ident.span,
                format!("array '{}' cannot be used as a value; index it", ident.name),
            ),
            Some(other) => self.error(
                "E0206",
                ident.span,
                format!("'{}' is a {}, not a value", ident.name, other.describe()),
            ),
            None => {}
        }
    }

    fn resolve_call(&mut self, callee: &mut Ident, argc: usize, scope: ScopeId) {
        let Some(id) = self.symbols.lookup(scope, &callee.name) else {
            self.error(
                "E0201",
                callee.span,
                format!("call to undeclared function '{}'", callee.name),
            );
            return;
        };
        let Some((kind, arity)) = self.symbols.symbol(id).map(|s| (s.kind, s.arity)) else {
            return;
        };
        match kind {
            SymbolKind::Function if arity == argc => callee.symbol = Some(id),
            SymbolKind::Function => {
                self.error(
                    "E0207",
                    callee.span,
                    format!(
                        "function '{}' expects {arity} argument(s), found {argc}",
                        callee.name
                    ),
                );
            }
            other => {
                let what = other.describe();
                self.error(
                    "E0206",
                    callee.span,
                    format!("'{}' is a {what}, not a callable function", callee.name),
                );
            }
        }
    }
}

/// Names that repeat an earlier member name, with their spans.
fn duplicate_members<'a>(names: impl Iterator<Item = &'a Ident>) -> Vec<(Span, String)> {
    let mut seen = HashSet::new();
    let mut clashes = Vec::new();
    for name in names {
        if !seen.insert(name.name.as_str()) {
            clashes.push((name.span, name.name.clone()));
        }
    }
    clashes
}

/// Text of a literal case value, for duplicate detection.
fn literal_text(expr: &Expr) -> Option<String> {
    match &expr.kind {
        ExprKind::Int(text) | ExprKind::Float(text) => Some(text.clone()),
        ExprKind::Str(text) => Some(format!("\"{text}\"")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn resolve_source(source: &str) -> Result<ResolvedProgram, CoreError> {
        resolve(parse(tokenize(source).expect("lex")).expect("parse"))
    }

    fn messages(source: &str) -> Vec<String> {
        match resolve_source(source) {
            Err(CoreError::SemanticError(diagnostics)) => {
                diagnostics.into_iter().map(|d| d.message).collect()
            }
            other => panic!("expected semantic errors, got {other:?}"),
        }
    }

    #[test]
    fn binds_every_use_to_its_declaration() {
        let resolved = resolve_source("int x = 1; function f(a) { x = a; } f(x);").expect("resolve");
        let StmtKind::Function(decl) = &resolved.program.items[1].kind else {
            panic!("expected function");
        };
        let StmtKind::Assign { target, value } = &decl.body[0].kind else {
            panic!("expected assignment");
        };
        let (ExprKind::Var(target), ExprKind::Var(value)) = (&target.kind, &value.kind) else {
            panic!("expected variables");
        };
        let global = resolved.program.items[0]
            .declared_name()
            .and_then(|name| name.symbol);
        assert_eq!(target.symbol, global);
        assert_eq!(value.symbol, decl.params[0].symbol);
    }

    #[test]
    fn functions_may_be_called_before_declaration() {
        assert!(resolve_source("later(); function later() { kill(); }").is_ok());
    }

    #[test]
    fn variables_must_be_declared_before_use() {
        let errors = messages("function f() { y = 1; int y; }");
        assert_eq!(errors, vec!["use of undeclared identifier 'y'"]);
    }

    #[test]
    fn shadowing_in_nested_scope_is_allowed() {
        let resolved =
            resolve_source("int x; function f() { int x = 2; if (x > 1) { int x = 3; } }")
                .expect("resolve");
        let slots: Vec<_> = resolved
            .symbols
            .iter()
            .filter(|(_, s)| s.name == "x")
            .map(|(_, s)| s.slot.clone())
            .collect();
        assert_eq!(slots, vec!["x", "_s1_x", "_s2_x"]);
    }

    #[test]
    fn accumulates_all_errors_in_one_pass() {
        let errors = messages(
            "int a; int a; const int K = 1; K = 2; goto nowhere; wait(); missing(1); break;",
        );
        assert_eq!(errors.len(), 6, "{errors:?}");
        assert!(errors[0].starts_with("duplicate declaration of 'a'"));
        assert_eq!(errors[1], "cannot assign to constant 'K'");
        assert_eq!(errors[2], "goto to undefined label 'nowhere'");
        assert_eq!(errors[3], "'wait' expects 1 or 2 argument(s), found 0");
        assert_eq!(errors[4], "call to undeclared function 'missing'");
        assert_eq!(errors[5], "'break' outside of a loop or switch");
    }

    #[test]
    fn labels_are_global_across_functions() {
        assert!(resolve_source("function f() { goto done; } label: done").is_ok());
        let errors = messages("label: f\nfunction f() { }");
        assert!(errors[0].starts_with("duplicate declaration of 'f'"));
    }

    #[test]
    fn checks_user_function_arity_and_kinds() {
        let errors = messages("int[] a = [1]; int n; function g(p, q) { } g(1); n = a; n[0] = 1;");
        assert_eq!(
            errors,
            vec![
                "function 'g' expects 2 argument(s), found 1",
                "array 'a' cannot be used as a value; index it",
                "'n' is not an array and cannot be indexed",
            ]
        );
    }

    #[test]
    fn command_operands_must_have_the_right_shape() {
        let errors = messages("int v; const int C = 1; set(v + 1, 2); pop(C); thread(nothing);");
        assert_eq!(
            errors,
            vec![
                "expected a variable name here",
                "cannot assign to constant 'C'",
                "undefined label or function 'nothing'",
            ]
        );
        assert!(resolve_source("int v; function worker(n) { } thread(worker, 3); wait(1, v);").is_ok());
    }

    #[test]
    fn class_members_are_checked_but_bodies_are_not_resolved() {
        assert!(resolve_source("class Bot { int hp; method hit() { undefined_thing = 1; } }").is_ok());
        let errors = messages("class Bot { int hp; float hp; }");
        assert_eq!(errors, vec!["duplicate member 'hp' in class 'Bot'"]);
    }

    #[test]
    fn break_is_allowed_in_loops_and_switches() {
        assert!(resolve_source("int x; while (x) { break; } switch (x) { case 1: break; }").is_ok());
        let errors = messages("int x; switch (x) { case 1: f(); case 1: g(); } function f() {} function g() {}");
        assert_eq!(errors, vec!["duplicate case value in switch"]);
    }

    #[test]
    fn return_is_only_allowed_inside_functions() {
        assert!(resolve_source("function f() { return; } f();").is_ok());
        let errors = messages("int x; if (x) { return x; }");
        assert_eq!(errors, vec!["'return' outside of a function"]);
    }

    #[test]
    fn structs_check_field_names() {
        assert!(resolve_source("struct Point { int x; int y; } int Point_x;").is_ok());
        let errors = messages("struct Point { int x; float x; } struct Point { }");
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert_eq!(errors[0], "duplicate member 'x' in struct 'Point'");
        assert!(errors[1].starts_with("duplicate declaration of 'Point'"));
    }

    #[test]
    fn member_access_names_the_flattened_variable() {
        let resolved = resolve_source("int bot_hp = 3; int[] a = [1]; bot.hp = bot.hp - a.length;")
            .expect("resolve");
        let StmtKind::Assign { target, value } = &resolved.program.items[2].kind else {
            panic!("expected assignment");
        };
        let ExprKind::Member { target, .. } = &target.kind else {
            panic!("expected member");
        };
        assert_eq!(target.symbol, resolved.program.items[0].declared_name().and_then(|n| n.symbol));
        let ExprKind::Binary { rhs, .. } = &value.kind else {
            panic!("expected binary");
        };
        let ExprKind::Member { target: length, .. } = &rhs.kind else {
            panic!("expected member");
        };
        assert_eq!(length.symbol, resolved.program.items[1].declared_name().and_then(|n| n.symbol));

        let errors = messages("int[] a = [1]; const int k_v = 1; a.length = 2; k.v++; pop(bot.hp);");
        assert_eq!(
            errors,
            vec![
                "length of array 'a' is read-only",
                "cannot assign to constant 'k_v'",
                "use of undeclared identifier 'bot_hp'",
            ]
        );
    }

    #[test]
    fn nested_functions_are_rejected() {
        let errors = messages("function outer() { function inner() { } }");
        assert_eq!(
            errors,
            vec!["functions, methods, classes and structs may only be declared at the top level"]
        );
    }
}
