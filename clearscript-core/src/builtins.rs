//! Built-in StateScript commands.
//!
//! Every built-in is a reserved call form `name(args...)` that lowers to
//! exactly one target instruction. The table below is the single source of
//! truth for the lexer (reserved names), the resolver (argument counts and
//! operand shapes) and the code generator (opcodes).

use crate::listing::Opcode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Wait,
    WaitFor,
    Kill,
    Thread,
    Set,
    Push,
    Pop,
    Peek,
    SpawnBot,
    MoveTo,
    Animate,
    Delete,
}

/// What a command expects in one argument position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandShape {
    /// Any expression; rendered as a plain operand.
    Value,
    /// Any expression; always rendered brace-wrapped.
    Condition,
    /// A bare, assignable variable name.
    Variable,
    /// A bare label or function name.
    Target,
}

/// Metadata about a single built-in command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandDescriptor {
    /// Name at the ClearScript level (e.g. `spawnbot`).
    pub name: &'static str,
    pub command: Command,
    pub opcode: Opcode,
    /// Shapes of the mandatory leading arguments.
    pub required: &'static [OperandShape],
    /// Shapes of optional arguments following the mandatory ones.
    pub optional: &'static [OperandShape],
    /// Shape of any further arguments; `None` caps the argument count.
    pub rest: Option<OperandShape>,
}

use OperandShape::{Condition, Target, Value, Variable};

pub const COMMANDS: &[CommandDescriptor] = &[
    CommandDescriptor {
        name: "wait",
        command: Command::Wait,
        opcode: Opcode::Wait,
        required: &[Value],
        optional: &[Variable],
        rest: None,
    },
    CommandDescriptor {
        name: "waitfor",
        command: Command::WaitFor,
        opcode: Opcode::WaitFor,
        required: &[Condition],
        optional: &[],
        rest: None,
    },
    CommandDescriptor {
        name: "kill",
        command: Command::Kill,
        opcode: Opcode::Kill,
        required: &[],
        optional: &[],
        rest: None,
    },
    CommandDescriptor {
        name: "thread",
        command: Command::Thread,
        opcode: Opcode::Thread,
        required: &[Target],
        optional: &[],
        rest: Some(Value),
    },
    CommandDescriptor {
        name: "set",
        command: Command::Set,
        opcode: Opcode::Set,
        required: &[Variable, Value],
        optional: &[],
        rest: None,
    },
    CommandDescriptor {
        name: "push",
        command: Command::Push,
        opcode: Opcode::Push,
        required: &[Value],
        optional: &[],
        rest: None,
    },
    CommandDescriptor {
        name: "pop",
        command: Command::Pop,
        opcode: Opcode::Pop,
        required: &[Variable],
        optional: &[],
        rest: None,
    },
    CommandDescriptor {
        name: "peek",
        command: Command::Peek,
        opcode: Opcode::Peek,
        required: &[Variable],
        optional: &[],
        rest: None,
    },
    CommandDescriptor {
        name: "spawnbot",
        command: Command::SpawnBot,
        opcode: Opcode::SpawnBot,
        required: &[Value, Value],
        optional: &[],
        rest: Some(Value),
    },
    CommandDescriptor {
        name: "moveto",
        command: Command::MoveTo,
        opcode: Opcode::MoveTo,
        required: &[Value, Value],
        optional: &[],
        rest: None,
    },
    CommandDescriptor {
        name: "animate",
        command: Command::Animate,
        opcode: Opcode::Animate,
        required: &[Value, Value, Value],
        optional: &[],
        rest: None,
    },
    CommandDescriptor {
        name: "delete",
        command: Command::Delete,
        opcode: Opcode::Delete,
        required: &[Value],
        optional: &[],
        rest: None,
    },
];

/// Look up a built-in by its ClearScript-level name.
///
/// The search is linear over `COMMANDS` because the table is small.
pub fn find_command(name: &str) -> Option<&'static CommandDescriptor> {
    COMMANDS.iter().find(|descriptor| descriptor.name == name)
}

impl Command {
    pub fn descriptor(self) -> &'static CommandDescriptor {
        // `COMMANDS` is declared in variant order.
        &COMMANDS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.descriptor().name
    }
}

impl CommandDescriptor {
    /// Returns true if `count` arguments are acceptable.
    pub fn accepts(&self, count: usize) -> bool {
        let min = self.required.len();
        if count < min {
            return false;
        }
        self.rest.is_some() || count <= min + self.optional.len()
    }

    /// Shape expected at argument position `index`, if any.
    pub fn shape_at(&self, index: usize) -> Option<OperandShape> {
        self.required
            .iter()
            .chain(self.optional.iter())
            .nth(index)
            .copied()
            .or(self.rest)
    }

    /// Human-readable arity used in diagnostics, e.g. `2`, `1 or 2`,
    /// `at least 2`.
    pub fn arity_text(&self) -> String {
        let min = self.required.len();
        match (self.optional.len(), self.rest) {
            (_, Some(_)) => format!("at least {min}"),
            (0, None) => min.to_string(),
            (1, None) => format!("{min} or {}", min + 1),
            (extra, None) => format!("{min} to {}", min + extra),
        }
    }
}
