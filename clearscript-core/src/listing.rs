//! The generated program: an ordered sequence of instructions, label
//! markers and raw passthrough text, plus a name→position label index.

use std::collections::HashMap;

use crate::ast::BinaryOp;
use crate::error::CoreError;

/// StateScript opcodes produced by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Init,
    Set,
    Inc,
    Dec,
    Goto,
    Call,
    Return,
    Kill,
    Wait,
    WaitFor,
    Thread,
    Push,
    Pop,
    Peek,
    SpawnBot,
    MoveTo,
    Animate,
    Delete,
}

impl Opcode {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Init => "INIT",
            Opcode::Set => "SET",
            Opcode::Inc => "INC",
            Opcode::Dec => "DEC",
            Opcode::Goto => "GOTO",
            Opcode::Call => "CALL",
            Opcode::Return => "RETURN",
            Opcode::Kill => "KILL",
            Opcode::Wait => "WAIT",
            Opcode::WaitFor => "WAITFOR",
            Opcode::Thread => "THREAD",
            Opcode::Push => "PUSH",
            Opcode::Pop => "POP",
            Opcode::Peek => "PEEK",
            Opcode::SpawnBot => "SPAWNBOT",
            Opcode::MoveTo => "MOVETO",
            Opcode::Animate => "ANIMATE",
            Opcode::Delete => "DELETE",
        }
    }
}

/// One instruction operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Numeric literal text, e.g. `10`, `-2.5`.
    Number(String),
    /// String literal, written `[text]`.
    Str(String),
    /// A variable slot.
    Slot(String),
    /// A label or function name used as a jump/call target.
    Label(String),
    /// Runtime-indexed array element, written `{$a_{i}}`.
    Indexed { array: String, index: Box<Operand> },
    Negate(Box<Operand>),
    Not(Box<Operand>),
    Binary {
        op: BinaryOp,
        lhs: Box<Operand>,
        rhs: Box<Operand>,
    },
    /// An operand the runtime evaluates as a condition; always braced.
    Cond(Box<Operand>),
}

impl Operand {
    pub fn slot(name: impl Into<String>) -> Self {
        Operand::Slot(name.into())
    }

    pub fn label(name: impl Into<String>) -> Self {
        Operand::Label(name.into())
    }

    pub fn cond(inner: Operand) -> Self {
        Operand::Cond(Box::new(inner))
    }

    /// The inverse condition, for jump-if-false.
    pub fn negated_cond(inner: Operand) -> Self {
        Operand::Not(Box::new(inner))
    }

    /// True when the rendered form is already wrapped in braces.
    pub fn is_braced(&self) -> bool {
        matches!(
            self,
            Operand::Indexed { .. }
                | Operand::Negate(_)
                | Operand::Not(_)
                | Operand::Binary { .. }
                | Operand::Cond(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub operands: Vec<Operand>,
}

impl Instruction {
    pub fn new(opcode: Opcode, operands: Vec<Operand>) -> Self {
        Instruction { opcode, operands }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Instr(Instruction),
    /// `:name`
    Label(String),
    /// Verbatim target text.
    Raw(String),
}

/// A complete, verified program.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    items: Vec<Item>,
    labels: HashMap<String, usize>,
}

impl Listing {
    /// Builds the label index and verifies every jump and call target.
    ///
    /// A duplicate label marker or a reference to a missing label means the
    /// generator is broken, so both are internal errors.
    pub fn index(items: Vec<Item>) -> Result<Self, CoreError> {
        let mut labels = HashMap::new();
        for (position, item) in items.iter().enumerate() {
            let Item::Label(name) = item else {
                continue;
            };
            if labels.insert(name.clone(), position).is_some() {
                return Err(CoreError::internal(format!(
                    "label '{name}' is defined more than once"
                )));
            }
        }

        for item in &items {
            let Item::Instr(instruction) = item else {
                continue;
            };
            for operand in &instruction.operands {
                let Operand::Label(target) = operand else {
                    continue;
                };
                if !labels.contains_key(target) {
                    return Err(CoreError::internal(format!(
                        "{} references missing label '{target}'",
                        instruction.opcode.mnemonic()
                    )));
                }
            }
        }

        Ok(Listing { items, labels })
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Position of the marker for `name` within `items()`.
    pub fn label_position(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.items.iter().filter_map(|item| match item {
            Item::Instr(instruction) => Some(instruction),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goto(target: &str) -> Item {
        Item::Instr(Instruction::new(Opcode::Goto, vec![Operand::label(target)]))
    }

    #[test]
    fn indexes_label_positions() {
        let listing = Listing::index(vec![
            goto("_main"),
            Item::Label("f".into()),
            Item::Instr(Instruction::new(Opcode::Return, vec![])),
            Item::Label("_main".into()),
        ])
        .expect("valid listing");
        assert_eq!(listing.label_position("_main"), Some(3));
        assert_eq!(listing.label_position("f"), Some(1));
        assert_eq!(listing.label_position("g"), None);
        assert_eq!(listing.instructions().count(), 2);
    }

    #[test]
    fn duplicate_labels_are_internal_errors() {
        let err = Listing::index(vec![Item::Label("x".into()), Item::Label("x".into())])
            .expect_err("duplicate");
        assert!(err.is_internal());
    }

    #[test]
    fn dangling_jumps_are_internal_errors() {
        let err = Listing::index(vec![goto("nowhere")]).expect_err("dangling");
        assert!(matches!(err, CoreError::Internal(ref message) if message.contains("nowhere")));
    }

    #[test]
    fn raw_text_is_not_inspected() {
        let listing = Listing::index(vec![Item::Raw("GOTO anywhere".into())]).expect("raw");
        assert_eq!(listing.items().len(), 1);
    }
}
