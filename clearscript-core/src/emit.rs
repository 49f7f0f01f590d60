//! Text serialization of a listing.
//!
//! One item per line: `:label`, `OPCODE operand ...`, or raw text as
//! captured from the source.

use std::fmt::{self, Write as _};

use crate::listing::{Instruction, Item, Listing, Operand};

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Number(text) => f.write_str(text),
            Operand::Str(text) => write!(f, "[{text}]"),
            Operand::Slot(name) | Operand::Label(name) => f.write_str(name),
            Operand::Indexed { array, index } => write!(f, "{{${array}_{}}}", Braced(index)),
            Operand::Negate(inner) => write!(f, "{{-{inner}}}"),
            Operand::Not(inner) => write!(f, "{{!{inner}}}"),
            Operand::Binary { op, lhs, rhs } => write!(f, "{{{lhs} {} {rhs}}}", op.symbol()),
            Operand::Cond(inner) => write!(f, "{}", Braced(inner)),
        }
    }
}

/// Renders an operand inside braces unless it already carries them.
struct Braced<'a>(&'a Operand);

impl fmt::Display for Braced<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_braced() {
            write!(f, "{}", self.0)
        } else {
            write!(f, "{{{}}}", self.0)
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode.mnemonic())?;
        for operand in &self.operands {
            write!(f, " {operand}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Instr(instruction) => write!(f, "{instruction}"),
            Item::Label(name) => write!(f, ":{name}"),
            Item::Raw(text) => f.write_str(text),
        }
    }
}

/// Serialize a listing. Every line, including the last, ends in `\n`.
pub fn emit(listing: &Listing) -> String {
    let mut text = String::new();
    for item in listing.items() {
        // Writing into a String cannot fail.
        let _ = write!(text, "{item}");
        if !text.ends_with('\n') {
            text.push('\n');
        }
    }
    text
}
