//! Lowering of a resolved program into a StateScript listing.
//!
//! Structured control flow becomes label markers and `GOTO`s. Every
//! compiler-introduced name (labels, temporaries) comes from one
//! per-compilation counter and starts with `_`, which the lexer rejects at
//! the start of user identifiers.

use std::mem;

use crate::ast::{
    BinaryOp, CaseLabel, Expr, ExprKind, FunctionDecl, Ident, Stmt, StmtKind, SwitchArm, UnaryOp,
};
use crate::builtins::OperandShape;
use crate::error::CoreError;
use crate::listing::{Instruction, Item, Listing, Opcode, Operand};
use crate::name_resolve::ResolvedProgram;
use crate::scope::{SymbolKind, SymbolTable};

/// Label marking the start of the top-level statement sequence.
pub const MAIN_LABEL: &str = "_main";
/// Slot receiving a function's `return` value.
pub const RETURN_SLOT: &str = "_ret";

/// Source of unique synthetic names for one compilation.
#[derive(Debug, Default)]
pub struct LabelCounter {
    next: usize,
}

impl LabelCounter {
    /// `_<kind>_<n>`, e.g. `_while_end_4`.
    pub fn label(&mut self, kind: &str) -> String {
        self.next += 1;
        format!("_{kind}_{}", self.next)
    }

    /// `_t<n>`, a temporary slot.
    pub fn temp(&mut self) -> String {
        self.next += 1;
        format!("_t{}", self.next)
    }
}

/// Generate the listing for a resolved program.
pub fn generate(resolved: &ResolvedProgram) -> Result<Listing, CoreError> {
    let mut generator = Generator::new(&resolved.symbols);
    let mut functions = Vec::new();
    let mut main = Vec::new();

    for stmt in &resolved.program.items {
        match &stmt.kind {
            StmtKind::Function(decl) => {
                generator.function(decl)?;
                functions.append(&mut generator.out);
                continue;
            }
            StmtKind::Class(_) | StmtKind::Method(_) | StmtKind::Struct(_) => continue,
            _ => generator.top_level(stmt)?,
        }
        main.append(&mut generator.out);
    }

    let mut items = mem::take(&mut generator.prologue);
    items.push(instr(Opcode::Goto, vec![Operand::label(MAIN_LABEL)]));
    items.extend(functions);
    items.push(Item::Label(MAIN_LABEL.to_string()));
    items.extend(main);
    log::trace!("generated {} items, counter at {}", items.len(), generator.counter.next);
    Listing::index(items)
}

fn instr(opcode: Opcode, operands: Vec<Operand>) -> Item {
    Item::Instr(Instruction::new(opcode, operands))
}

struct Generator<'a> {
    symbols: &'a SymbolTable,
    counter: LabelCounter,
    /// `INIT` lines for top-level declarations.
    prologue: Vec<Item>,
    /// Items of the statement currently being lowered.
    out: Vec<Item>,
    /// Exit labels of the enclosing loops and switches, innermost last.
    break_targets: Vec<String>,
}

impl<'a> Generator<'a> {
    fn new(symbols: &'a SymbolTable) -> Self {
        Generator {
            symbols,
            counter: LabelCounter::default(),
            prologue: Vec::new(),
            out: Vec::new(),
            break_targets: Vec::new(),
        }
    }

    fn emit(&mut self, opcode: Opcode, operands: Vec<Operand>) {
        self.out.push(instr(opcode, operands));
    }

    fn mark(&mut self, label: &str) {
        self.out.push(Item::Label(label.to_string()));
    }

    fn jump(&mut self, label: &str) {
        self.emit(Opcode::Goto, vec![Operand::label(label)]);
    }

    fn jump_unless(&mut self, label: &str, cond: Operand) {
        self.emit(
            Opcode::Goto,
            vec![Operand::label(label), Operand::negated_cond(cond)],
        );
    }

    fn jump_if(&mut self, label: &str, cond: Operand) {
        self.emit(Opcode::Goto, vec![Operand::label(label), Operand::cond(cond)]);
    }

    /// Target-side name of a resolved identifier.
    fn slot(&self, ident: &Ident) -> Result<String, CoreError> {
        ident
            .symbol
            .and_then(|id| self.symbols.symbol(id))
            .map(|symbol| symbol.slot.clone())
            .ok_or_else(|| {
                CoreError::internal(format!(
                    "identifier '{}' at {} has no symbol",
                    ident.name, ident.span
                ))
            })
    }

    // ----- top level -----

    /// Top-level declarations, including one in a `for` header, are
    /// initialised in the prologue.
    fn top_level(&mut self, stmt: &Stmt) -> Result<(), CoreError> {
        match &stmt.kind {
            StmtKind::VarDecl { name, init, .. } => self.global_scalar(name, init.as_ref()),
            StmtKind::ConstDecl { name, init, .. } => self.global_scalar(name, Some(init)),
            StmtKind::ArrayDecl { name, elements, .. } => self.global_array(name, elements),
            StmtKind::For {
                init: Some(init),
                cond,
                step,
                body,
            } => {
                self.top_level(init)?;
                self.loop_stmt(cond.as_ref(), body, step.as_deref())
            }
            _ => self.stmt(stmt),
        }
    }

    fn global_scalar(&mut self, name: &Ident, init: Option<&Expr>) -> Result<(), CoreError> {
        let slot = self.slot(name)?;
        match init {
            Some(init) if init.is_literal() => {
                let value = self.expr(init)?;
                self.prologue
                    .push(instr(Opcode::Init, vec![Operand::slot(slot), value]));
            }
            Some(init) => {
                self.prologue.push(instr(
                    Opcode::Init,
                    vec![Operand::slot(slot.clone()), zero()],
                ));
                let value = self.expr(init)?;
                self.emit(Opcode::Set, vec![Operand::slot(slot), value]);
            }
            None => self
                .prologue
                .push(instr(Opcode::Init, vec![Operand::slot(slot), zero()])),
        }
        Ok(())
    }

    fn global_array(&mut self, name: &Ident, elements: &[Expr]) -> Result<(), CoreError> {
        let slot = self.slot(name)?;
        let all_literal = elements.iter().all(Expr::is_literal);
        for (index, element) in elements.iter().enumerate() {
            let value = self.expr(element)?;
            let element_slot = Operand::slot(format!("{slot}_{index}"));
            if all_literal {
                self.prologue
                    .push(instr(Opcode::Init, vec![element_slot, value]));
            } else {
                self.emit(Opcode::Set, vec![element_slot, value]);
            }
        }
        self.prologue.push(instr(
            Opcode::Init,
            vec![length_slot(&slot), Operand::Number(elements.len().to_string())],
        ));
        Ok(())
    }

    fn function(&mut self, decl: &FunctionDecl) -> Result<(), CoreError> {
        let name = self.slot(&decl.name)?;
        self.mark(&name);
        for param in decl.params.iter().rev() {
            let slot = self.slot(param)?;
            self.emit(Opcode::Pop, vec![Operand::slot(slot)]);
        }
        self.block(&decl.body)?;
        let returns = decl
            .body
            .last()
            .is_some_and(|stmt| matches!(stmt.kind, StmtKind::Return(_)));
        if !returns {
            self.emit(Opcode::Return, vec![]);
        }
        log::trace!("lowered function '{name}'");
        Ok(())
    }

    // ----- statements -----

    fn block(&mut self, stmts: &[Stmt]) -> Result<(), CoreError> {
        for stmt in stmts {
            self.stmt(stmt)?;
        }
        Ok(())
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<(), CoreError> {
        match &stmt.kind {
            StmtKind::VarDecl { name, init, .. } => {
                let value = match init {
                    Some(init) => self.expr(init)?,
                    None => zero(),
                };
                let slot = self.slot(name)?;
                self.emit(Opcode::Set, vec![Operand::slot(slot), value]);
            }
            StmtKind::ConstDecl { name, init, .. } => {
                let value = self.expr(init)?;
                let slot = self.slot(name)?;
                self.emit(Opcode::Set, vec![Operand::slot(slot), value]);
            }
            StmtKind::ArrayDecl { name, elements, .. } => {
                let slot = self.slot(name)?;
                for (index, element) in elements.iter().enumerate() {
                    let value = self.expr(element)?;
                    self.emit(
                        Opcode::Set,
                        vec![Operand::slot(format!("{slot}_{index}")), value],
                    );
                }
                self.emit(
                    Opcode::Set,
                    vec![length_slot(&slot), Operand::Number(elements.len().to_string())],
                );
            }
            StmtKind::Assign { target, value } => {
                let value = self.expr(value)?;
                let place = self.place(target)?;
                self.emit(Opcode::Set, vec![place, value]);
            }
            StmtKind::If {
                cond,
                then_body,
                else_body,
            } => self.if_stmt(cond, then_body, else_body.as_deref())?,
            StmtKind::While { cond, body } => self.loop_stmt(Some(cond), body, None)?,
            StmtKind::For {
                init,
                cond,
                step,
                body,
            } => {
                // `for (init; c; step) body` is `init; while (c) { body; step }`.
                if let Some(init) = init {
                    self.stmt(init)?;
                }
                self.loop_stmt(cond.as_ref(), body, step.as_deref())?;
            }
            StmtKind::Switch { scrutinee, arms } => self.switch_stmt(scrutinee, arms)?,
            StmtKind::Function(_)
            | StmtKind::Class(_)
            | StmtKind::Method(_)
            | StmtKind::Struct(_) => {}
            StmtKind::Label(name) => {
                let label = self.slot(name)?;
                self.mark(&label);
            }
            StmtKind::Goto { target, condition } => {
                let label = self.slot(target)?;
                match condition {
                    Some(condition) => {
                        let cond = self.expr(condition)?;
                        self.jump_if(&label, cond);
                    }
                    None => self.jump(&label),
                }
            }
            StmtKind::Break => {
                let target = self.break_targets.last().cloned().ok_or_else(|| {
                    CoreError::internal(format!("'break' at {} has no enclosing target", stmt.span))
                })?;
                self.jump(&target);
            }
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    let value = self.expr(value)?;
                    self.emit(Opcode::Set, vec![Operand::slot(RETURN_SLOT), value]);
                }
                self.emit(Opcode::Return, vec![]);
            }
            StmtKind::Command { command, args } => {
                let descriptor = command.descriptor();
                let mut operands = Vec::with_capacity(args.len());
                for (index, arg) in args.iter().enumerate() {
                    let operand = match descriptor.shape_at(index) {
                        Some(OperandShape::Condition) => Operand::cond(self.expr(arg)?),
                        Some(OperandShape::Variable) => Operand::slot(self.bare_name(arg)?),
                        Some(OperandShape::Target) => Operand::label(self.bare_name(arg)?),
                        _ => self.expr(arg)?,
                    };
                    operands.push(operand);
                }
                self.emit(descriptor.opcode, operands);
            }
            StmtKind::Expr(expr) => match &expr.kind {
                ExprKind::Call { callee, args } => self.call(callee, args)?,
                ExprKind::Unary { op, operand } if op.is_step() => {
                    let place = self.place(operand)?;
                    self.emit(step_opcode(*op), vec![place]);
                }
                _ => {
                    self.expr(expr)?;
                }
            },
            StmtKind::Raw(text) => self.out.push(Item::Raw(text.clone())),
        }
        Ok(())
    }

    fn if_stmt(
        &mut self,
        cond: &Expr,
        then_body: &[Stmt],
        else_body: Option<&[Stmt]>,
    ) -> Result<(), CoreError> {
        let else_label = else_body.map(|_| self.counter.label("if_else"));
        let end_label = self.counter.label("if_end");

        let cond = self.expr(cond)?;
        self.jump_unless(else_label.as_deref().unwrap_or(&end_label), cond);
        self.block(then_body)?;
        if let (Some(else_label), Some(else_body)) = (else_label, else_body) {
            self.jump(&end_label);
            self.mark(&else_label);
            self.block(else_body)?;
        }
        self.mark(&end_label);
        Ok(())
    }

    /// Shared lowering of `while` and `for`; a missing condition loops forever.
    fn loop_stmt(
        &mut self,
        cond: Option<&Expr>,
        body: &[Stmt],
        step: Option<&Stmt>,
    ) -> Result<(), CoreError> {
        let start_label = self.counter.label("while");
        let end_label = self.counter.label("while_end");

        self.mark(&start_label);
        if let Some(cond) = cond {
            let cond = self.expr(cond)?;
            self.jump_unless(&end_label, cond);
        }
        self.break_targets.push(end_label.clone());
        self.block(body)?;
        self.break_targets.pop();
        if let Some(step) = step {
            self.stmt(step)?;
        }
        self.jump(&start_label);
        self.mark(&end_label);
        Ok(())
    }

    /// Compares the scrutinee against each case in order, then lays out
    /// the arm bodies back to back. Control falls from one arm into the
    /// next unless the arm ends in `break`.
    fn switch_stmt(&mut self, scrutinee: &Expr, arms: &[SwitchArm]) -> Result<(), CoreError> {
        let mut value = self.expr(scrutinee)?;
        if value.is_braced() {
            let temp = self.counter.temp();
            self.emit(Opcode::Set, vec![Operand::slot(temp.clone()), value]);
            value = Operand::slot(temp);
        }

        let arm_labels: Vec<String> = arms
            .iter()
            .map(|arm| match arm.label {
                CaseLabel::Case(_) => self.counter.label("switch_case"),
                CaseLabel::Default => self.counter.label("switch_default"),
            })
            .collect();
        let end_label = self.counter.label("switch_end");

        let mut fallback = end_label.clone();
        for (arm, label) in arms.iter().zip(&arm_labels) {
            match &arm.label {
                CaseLabel::Case(case) => {
                    let case = self.expr(case)?;
                    let test = Operand::Binary {
                        op: BinaryOp::Eq,
                        lhs: Box::new(value.clone()),
                        rhs: Box::new(case),
                    };
                    self.jump_if(label, test);
                }
                CaseLabel::Default => fallback = label.clone(),
            }
        }
        self.jump(&fallback);

        self.break_targets.push(end_label.clone());
        for (arm, label) in arms.iter().zip(&arm_labels) {
            self.mark(label);
            self.block(&arm.body)?;
        }
        self.break_targets.pop();
        self.mark(&end_label);
        Ok(())
    }

    /// `PUSH` each argument in order, then `CALL`.
    fn call(&mut self, callee: &Ident, args: &[Expr]) -> Result<(), CoreError> {
        for arg in args {
            let value = self.expr(arg)?;
            self.emit(Opcode::Push, vec![value]);
        }
        let target = self.slot(callee)?;
        self.emit(Opcode::Call, vec![Operand::label(target)]);
        Ok(())
    }

    /// Name of an identifier argument to a built-in command.
    fn bare_name(&self, arg: &Expr) -> Result<String, CoreError> {
        match &arg.kind {
            ExprKind::Var(ident) | ExprKind::Member { target: ident, .. } => self.slot(ident),
            _ => Err(CoreError::internal(format!(
                "command operand at {} is not a name",
                arg.span
            ))),
        }
    }

    // ----- expressions -----

    /// Storage location written by an assignment or `++`/`--`.
    fn place(&mut self, target: &Expr) -> Result<Operand, CoreError> {
        match &target.kind {
            ExprKind::Var(ident) => Ok(Operand::slot(self.slot(ident)?)),
            ExprKind::Index { array, index } => self.element(array, index),
            ExprKind::Member { target, .. } => self.member(target),
            _ => Err(CoreError::internal(format!(
                "expression at {} is not assignable",
                target.span
            ))),
        }
    }

    fn element(&mut self, array: &Ident, index: &Expr) -> Result<Operand, CoreError> {
        let array = self.slot(array)?;
        match &index.kind {
            ExprKind::Int(position) => Ok(Operand::slot(format!("{array}_{position}"))),
            _ => Ok(Operand::Indexed {
                array,
                index: Box::new(self.expr(index)?),
            }),
        }
    }

    /// `obj.field` reads the flattened slot; `arr.length` the length slot.
    fn member(&self, target: &Ident) -> Result<Operand, CoreError> {
        let symbol = target
            .symbol
            .and_then(|id| self.symbols.symbol(id))
            .ok_or_else(|| {
                CoreError::internal(format!(
                    "member '{}' at {} has no symbol",
                    target.name, target.span
                ))
            })?;
        Ok(match symbol.kind {
            SymbolKind::Array => length_slot(&symbol.slot),
            _ => Operand::slot(symbol.slot.clone()),
        })
    }

    /// `&&` and `||` whose right side emits instructions. Those only run
    /// when the left side does not decide the result:
    ///
    /// ```text
    /// SET _t <lhs>
    /// GOTO _and_end_n {!_t}      (`||`: GOTO _or_end_n {_t})
    /// <rhs instructions>
    /// SET _t {_t && <rhs>}
    /// :_and_end_n
    /// ```
    fn short_circuit(
        &mut self,
        op: BinaryOp,
        lhs: Operand,
        rhs: Operand,
        rhs_code: Vec<Item>,
    ) -> Operand {
        let result = self.counter.temp();
        let end_label = match op {
            BinaryOp::And => self.counter.label("and_end"),
            _ => self.counter.label("or_end"),
        };
        self.emit(Opcode::Set, vec![Operand::slot(result.clone()), lhs]);
        match op {
            BinaryOp::And => self.jump_unless(&end_label, Operand::slot(result.clone())),
            _ => self.jump_if(&end_label, Operand::slot(result.clone())),
        }
        self.out.extend(rhs_code);
        let combined = Operand::Binary {
            op,
            lhs: Box::new(Operand::slot(result.clone())),
            rhs: Box::new(rhs),
        };
        self.emit(Opcode::Set, vec![Operand::slot(result.clone()), combined]);
        self.mark(&end_label);
        Operand::slot(result)
    }

    /// Lowers an expression to an operand, emitting whatever instructions
    /// must run first (calls, ternary branches, postfix steps).
    fn expr(&mut self, expr: &Expr) -> Result<Operand, CoreError> {
        Ok(match &expr.kind {
            ExprKind::Int(text) | ExprKind::Float(text) => Operand::Number(text.clone()),
            ExprKind::Str(text) => Operand::Str(text.clone()),
            ExprKind::Var(ident) => Operand::slot(self.slot(ident)?),
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.expr(lhs)?;
                let outer = mem::take(&mut self.out);
                let rhs = self.expr(rhs);
                let rhs_code = mem::replace(&mut self.out, outer);
                let rhs = rhs?;
                if matches!(op, BinaryOp::And | BinaryOp::Or) && !rhs_code.is_empty() {
                    self.short_circuit(*op, lhs, rhs, rhs_code)
                } else {
                    self.out.extend(rhs_code);
                    Operand::Binary {
                        op: *op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    }
                }
            }
            ExprKind::Unary { op, operand } => match op {
                UnaryOp::Neg => match self.expr(operand)? {
                    Operand::Number(text) => Operand::Number(match text.strip_prefix('-') {
                        Some(positive) => positive.to_string(),
                        None => format!("-{text}"),
                    }),
                    value => Operand::Negate(Box::new(value)),
                },
                UnaryOp::Not => Operand::Not(Box::new(self.expr(operand)?)),
                UnaryOp::PreInc | UnaryOp::PreDec => {
                    let place = self.place(operand)?;
                    self.emit(step_opcode(*op), vec![place.clone()]);
                    place
                }
                UnaryOp::PostInc | UnaryOp::PostDec => {
                    let place = self.place(operand)?;
                    let temp = self.counter.temp();
                    self.emit(Opcode::Set, vec![Operand::slot(temp.clone()), place.clone()]);
                    self.emit(step_opcode(*op), vec![place]);
                    Operand::slot(temp)
                }
            },
            ExprKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => {
                let result = self.counter.temp();
                let else_label = self.counter.label("tern_else");
                let end_label = self.counter.label("tern_end");

                let cond = self.expr(cond)?;
                self.jump_unless(&else_label, cond);
                let value = self.expr(then_expr)?;
                self.emit(Opcode::Set, vec![Operand::slot(result.clone()), value]);
                self.jump(&end_label);
                self.mark(&else_label);
                let value = self.expr(else_expr)?;
                self.emit(Opcode::Set, vec![Operand::slot(result.clone()), value]);
                self.mark(&end_label);
                Operand::slot(result)
            }
            ExprKind::Index { array, index } => self.element(array, index)?,
            ExprKind::Member { target, .. } => self.member(target)?,
            ExprKind::Call { callee, args } => {
                self.call(callee, args)?;
                let result = self.counter.temp();
                self.emit(
                    Opcode::Set,
                    vec![Operand::slot(result.clone()), Operand::slot(RETURN_SLOT)],
                );
                Operand::slot(result)
            }
        })
    }
}

fn zero() -> Operand {
    Operand::Number("0".to_string())
}

fn length_slot(array: &str) -> Operand {
    Operand::slot(format!("{array}_length"))
}

fn step_opcode(op: UnaryOp) -> Opcode {
    match op {
        UnaryOp::PreInc | UnaryOp::PostInc => Opcode::Inc,
        _ => Opcode::Dec,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::emit;
    use crate::lexer::tokenize;
    use crate::name_resolve::resolve;
    use crate::parser::parse;

    fn lower(source: &str) -> String {
        let program = parse(tokenize(source).expect("lex")).expect("parse");
        let resolved = resolve(program).expect("resolve");
        emit(&generate(&resolved).expect("generate"))
    }

    /// The lines after `:_main`.
    fn main_body(source: &str) -> Vec<String> {
        let listing = lower(source);
        listing
            .lines()
            .skip_while(|line| *line != ":_main")
            .skip(1)
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn counter_is_shared_by_labels_and_temps() {
        let mut counter = LabelCounter::default();
        assert_eq!(counter.label("if_end"), "_if_end_1");
        assert_eq!(counter.temp(), "_t2");
        assert_eq!(counter.label("while"), "_while_3");
    }

    #[test]
    fn globals_with_literals_are_initialised_in_the_prologue() {
        let listing = lower("int a = -3; float b = 2.5; int c; int d = a + 1; int[] e = [\"x\", 4];");
        assert_eq!(
            listing,
            "INIT a -3\nINIT b 2.5\nINIT c 0\nINIT d 0\nINIT e_0 [x]\nINIT e_1 4\nINIT e_length 2\n\
             GOTO _main\n:_main\nSET d {a + 1}\n"
        );
    }

    #[test]
    fn array_access_uses_direct_slots_for_literal_indices() {
        assert_eq!(
            main_body("int[] arr = [1, 2, 3]; int i; int v = arr[1]; v = arr[i]; arr[i] = 7;"),
            vec!["SET v arr_1", "SET v {$arr_{i}}", "SET {$arr_{i}} 7"]
        );
    }

    #[test]
    fn if_else_lowers_to_guarded_jumps() {
        assert_eq!(
            main_body("int x; if (x > 1) { x = 1; } else { x = 2; } if (x) { x--; }"),
            vec![
                "GOTO _if_else_1 {!{x > 1}}",
                "SET x 1",
                "GOTO _if_end_2",
                ":_if_else_1",
                "SET x 2",
                ":_if_end_2",
                "GOTO _if_end_3 {!x}",
                "DEC x",
                ":_if_end_3",
            ]
        );
    }

    #[test]
    fn while_loop_with_break() {
        assert_eq!(
            main_body("int n = 3; while (n > 0) { n--; if (n == 1) { break; } }"),
            vec![
                ":_while_1",
                "GOTO _while_end_2 {!{n > 0}}",
                "DEC n",
                "GOTO _if_end_3 {!{n == 1}}",
                "GOTO _while_end_2",
                ":_if_end_3",
                "GOTO _while_1",
                ":_while_end_2",
            ]
        );
    }

    #[test]
    fn for_loop_runs_step_after_body() {
        assert_eq!(
            lower("int s; function f() { for (int i = 0; i < 2; i++) { s = s + i; } } f();")
                .lines()
                .skip_while(|line| *line != ":f")
                .skip(1)
                .take_while(|line| *line != ":_main")
                .collect::<Vec<_>>(),
            vec![
                "SET i 0",
                ":_while_1",
                "GOTO _while_end_2 {!{i < 2}}",
                "SET s {s + i}",
                "INC i",
                "GOTO _while_1",
                ":_while_end_2",
                "RETURN",
            ]
        );
    }

    #[test]
    fn switch_falls_through_and_breaks_explicitly() {
        assert_eq!(
            main_body("int x; int y; switch (x + 1) { case 1: y = 1; break; default: y = 0; case 2: y = 2; }"),
            vec![
                "SET _t1 {x + 1}",
                "GOTO _switch_case_2 {_t1 == 1}",
                "GOTO _switch_case_4 {_t1 == 2}",
                "GOTO _switch_default_3",
                ":_switch_case_2",
                "SET y 1",
                "GOTO _switch_end_5",
                ":_switch_default_3",
                "SET y 0",
                ":_switch_case_4",
                "SET y 2",
                ":_switch_end_5",
            ]
        );
    }

    #[test]
    fn ternary_assigns_a_synthetic_slot() {
        assert_eq!(
            main_body("int a; int b = 0; b = a > 2 ? a : -a;"),
            vec![
                "GOTO _tern_else_2 {!{a > 2}}",
                "SET _t1 a",
                "GOTO _tern_end_3",
                ":_tern_else_2",
                "SET _t1 {-a}",
                ":_tern_end_3",
                "SET b _t1",
            ]
        );
    }

    #[test]
    fn functions_pop_params_and_return_values() {
        let listing = lower("int r; function add(a, b) { return a + b; } r = add(1, 2) * 2;");
        assert_eq!(
            listing,
            "INIT r 0\nGOTO _main\n:add\nPOP b\nPOP a\nSET _ret {a + b}\nRETURN\n:_main\n\
             PUSH 1\nPUSH 2\nCALL add\nSET _t1 _ret\nSET r {_t1 * 2}\n"
        );
    }

    #[test]
    fn postfix_step_in_expression_reads_the_old_value() {
        assert_eq!(
            main_body("int i = 1; int j; j = i++ + ++i;"),
            vec!["SET _t1 i", "INC i", "INC i", "SET j {_t1 + i}"]
        );
    }

    #[test]
    fn commands_map_to_opcodes() {
        assert_eq!(
            main_body(
                "int v; function worker(n) { } label: top\n\
                 wait(2, v); waitfor(v); waitfor(v > 1); thread(worker, 5); \
                 spawnbot(\"guard\", v, 1); moveto(v, 3); animate(v, 1, 0.5); delete(v); \
                 push(v); pop(v); peek(v); set(v, 2); goto top if (v == 2); kill();"
            ),
            vec![
                ":top",
                "WAIT 2 v",
                "WAITFOR {v}",
                "WAITFOR {v > 1}",
                "THREAD worker 5",
                "SPAWNBOT [guard] v 1",
                "MOVETO v 3",
                "ANIMATE v 1 0.5",
                "DELETE v",
                "PUSH v",
                "POP v",
                "PEEK v",
                "SET v 2",
                "GOTO top {v == 2}",
                "KILL",
            ]
        );
    }

    #[test]
    fn classes_and_methods_produce_no_code() {
        assert_eq!(
            lower("class Bot { int hp; method hit() { hp--; } } method free() { }"),
            "GOTO _main\n:_main\n"
        );
    }

    #[test]
    fn right_side_of_and_runs_only_when_needed() {
        assert_eq!(
            main_body(
                "int x; function g(v) { return v; } if (x != 0 && g(x)) { kill(); }"
            ),
            vec![
                "SET _t3 {x != 0}",
                "GOTO _and_end_4 {!_t3}",
                "PUSH x",
                "CALL g",
                "SET _t2 _ret",
                "SET _t3 {_t3 && _t2}",
                ":_and_end_4",
                "GOTO _if_end_1 {!_t3}",
                "KILL",
                ":_if_end_1",
            ]
        );
    }

    #[test]
    fn right_side_of_or_is_skipped_when_left_is_true() {
        assert_eq!(
            main_body("int a; int b; b = a && b; b = a || b++;"),
            vec![
                "SET b {a && b}",
                "SET _t2 a",
                "GOTO _or_end_3 {_t2}",
                "SET _t1 b",
                "INC b",
                "SET _t2 {_t2 || _t1}",
                ":_or_end_3",
                "SET b _t2",
            ]
        );
    }

    #[test]
    fn double_negation_never_reads_as_a_decrement() {
        assert_eq!(
            main_body("int y; y = - -3; y = -(-y); y = 1 - -2.5;"),
            vec!["SET y 3", "SET y {-{-y}}", "SET y {1 - -2.5}"]
        );
    }

    #[test]
    fn top_level_for_initialiser_goes_to_the_prologue() {
        assert_eq!(
            lower("int s; for (int i = 0; i < 2; i++) { s = s + i; }"),
            "INIT s 0\nINIT i 0\nGOTO _main\n:_main\n:_while_1\nGOTO _while_end_2 {!{i < 2}}\n\
             SET s {s + i}\nINC i\nGOTO _while_1\n:_while_end_2\n"
        );
    }

    #[test]
    fn members_flatten_and_structs_produce_no_code() {
        assert_eq!(
            lower(
                "struct Bot { int hp; } int bot_hp = 5; int[] a = [1, 2]; int n; \
                 bot.hp--; n = a.length + bot.hp; set(bot.hp, n);"
            ),
            "INIT bot_hp 5\nINIT a_0 1\nINIT a_1 2\nINIT a_length 2\nINIT n 0\nGOTO _main\n:_main\n\
             DEC bot_hp\nSET n {a_length + bot_hp}\nSET bot_hp n\n"
        );
    }

    #[test]
    fn user_names_never_share_array_element_slots() {
        assert_eq!(
            lower("int[] a = [1, 2]; int a_0 = 9; int a_length = 5; a_0 = a[0];"),
            "INIT a_0 1\nINIT a_1 2\nINIT a_length 2\nINIT _s1_a_0 9\nINIT _s1_a_length 5\n\
             GOTO _main\n:_main\nSET _s1_a_0 a_0\n"
        );
    }

    #[test]
    fn shadowed_locals_get_their_own_slots() {
        assert_eq!(
            main_body("int x = 1; if (x) { int x = 2; x++; } x++;"),
            vec![
                "GOTO _if_end_1 {!x}",
                "SET _s1_x 2",
                "INC _s1_x",
                ":_if_end_1",
                "INC x",
            ]
        );
    }
}
