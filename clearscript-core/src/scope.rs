//! Symbols and the lexical scope chain.

use std::collections::{HashMap, HashSet};

use crate::span::Span;

/// Index of a symbol in the `SymbolTable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub usize);

/// Index of a scope in the `SymbolTable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Const,
    Array,
    Function,
    Label,
    Class,
    Struct,
    Method,
}

impl SymbolKind {
    /// Kinds that occupy a runtime variable slot.
    pub fn has_storage(self) -> bool {
        matches!(self, SymbolKind::Variable | SymbolKind::Const | SymbolKind::Array)
    }

    pub fn describe(self) -> &'static str {
        match self {
            SymbolKind::Variable => "variable",
            SymbolKind::Const => "constant",
            SymbolKind::Array => "array",
            SymbolKind::Function => "function",
            SymbolKind::Label => "label",
            SymbolKind::Class => "class",
            SymbolKind::Struct => "struct",
            SymbolKind::Method => "method",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub scope: ScopeId,
    /// Name used in the target listing: a variable slot for storage kinds,
    /// a label name for functions and labels.
    pub slot: String,
    pub span: Span,
    /// Parameter count for functions and methods.
    pub arity: usize,
}

#[derive(Debug, Default)]
struct ScopeData {
    parent: Option<ScopeId>,
    names: HashMap<String, SymbolId>,
}

/// Every symbol of one compilation plus the scopes that bind them.
///
/// Labels live in a separate, unit-global namespace.
#[derive(Debug)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    scopes: Vec<ScopeData>,
    labels: HashMap<String, SymbolId>,
    /// How many storage slots have been tried per source name.
    name_uses: HashMap<String, usize>,
    /// Every storage slot handed out so far.
    slots: HashSet<String>,
    /// Slots of arrays, whose elements occupy `<slot>_<n>` and `<slot>_length`.
    array_slots: Vec<String>,
}

impl SymbolTable {
    pub const GLOBAL: ScopeId = ScopeId(0);

    pub fn new() -> Self {
        SymbolTable {
            symbols: Vec::new(),
            scopes: vec![ScopeData::default()],
            labels: HashMap::new(),
            name_uses: HashMap::new(),
            slots: HashSet::new(),
            array_slots: Vec::new(),
        }
    }

    /// Opens a child scope of `parent`.
    pub fn push_scope(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(ScopeData {
            parent: Some(parent),
            names: HashMap::new(),
        });
        id
    }

    /// Binds `name` in `scope`.
    ///
    /// Returns `Err` with the existing symbol when `name` is already bound
    /// in that very scope. Bindings in enclosing scopes may be shadowed.
    pub fn declare(
        &mut self,
        scope: ScopeId,
        name: &str,
        kind: SymbolKind,
        span: Span,
        arity: usize,
    ) -> Result<SymbolId, SymbolId> {
        if let Some(&existing) = self.scopes[scope.0].names.get(name) {
            return Err(existing);
        }
        let id = self.push_symbol(name, kind, scope, span, arity);
        self.scopes[scope.0].names.insert(name.to_string(), id);
        Ok(id)
    }

    /// Binds a label in the unit-global label namespace.
    pub fn declare_label(&mut self, name: &str, span: Span) -> Result<SymbolId, SymbolId> {
        if let Some(&existing) = self.labels.get(name) {
            return Err(existing);
        }
        let id = self.push_symbol(name, SymbolKind::Label, Self::GLOBAL, span, 0);
        self.labels.insert(name.to_string(), id);
        Ok(id)
    }

    /// Finds the innermost binding of `name` visible from `scope`.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(ScopeId(index)) = current {
            let data = &self.scopes[index];
            if let Some(&id) = data.names.get(name) {
                return Some(id);
            }
            current = data.parent;
        }
        None
    }

    pub fn label(&self, name: &str) -> Option<SymbolId> {
        self.labels.get(name).copied()
    }

    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(index, symbol)| (SymbolId(index), symbol))
    }

    fn push_symbol(
        &mut self,
        name: &str,
        kind: SymbolKind,
        scope: ScopeId,
        span: Span,
        arity: usize,
    ) -> SymbolId {
        let slot = if kind.has_storage() {
            self.storage_slot(name, kind == SymbolKind::Array)
        } else {
            name.to_string()
        };
        let id = SymbolId(self.symbols.len());
        self.symbols.push(Symbol {
            name: name.to_string(),
            kind,
            scope,
            slot,
            span,
            arity,
        });
        id
    }
}

impl SymbolTable {
    /// The bare name if free, else the first free `_s<k>_<name>`.
    ///
    /// A slot is taken when another symbol uses it or when it is an element
    /// or length slot of an array. An array slot is also refused while any
    /// taken slot would be one of its elements.
    fn storage_slot(&mut self, name: &str, array: bool) -> String {
        let mut uses = self.name_uses.get(name).copied().unwrap_or(0);
        let slot = loop {
            let candidate = match uses {
                0 => name.to_string(),
                k => format!("_s{k}_{name}"),
            };
            uses += 1;
            if self.slot_is_free(&candidate, array) {
                break candidate;
            }
        };
        self.name_uses.insert(name.to_string(), uses);
        self.slots.insert(slot.clone());
        if array {
            self.array_slots.push(slot.clone());
        }
        slot
    }

    fn slot_is_free(&self, candidate: &str, array: bool) -> bool {
        if self.slots.contains(candidate) {
            return false;
        }
        if self
            .array_slots
            .iter()
            .any(|array_slot| is_element_slot(candidate, array_slot))
        {
            return false;
        }
        !array || !self.slots.iter().any(|taken| is_element_slot(taken, candidate))
    }
}

/// `<array>_length` or `<array>_<digits>`.
fn is_element_slot(slot: &str, array: &str) -> bool {
    slot.strip_prefix(array)
        .and_then(|rest| rest.strip_prefix('_'))
        .is_some_and(|suffix| {
            suffix == "length"
                || (!suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()))
        })
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_scopes_shadow_and_get_distinct_slots() {
        let mut table = SymbolTable::new();
        let outer = table
            .declare(SymbolTable::GLOBAL, "x", SymbolKind::Variable, Span::start(), 0)
            .expect("outer");
        let body = table.push_scope(SymbolTable::GLOBAL);
        let inner = table
            .declare(body, "x", SymbolKind::Variable, Span::start(), 0)
            .expect("inner");

        assert_eq!(table.lookup(body, "x"), Some(inner));
        assert_eq!(table.lookup(SymbolTable::GLOBAL, "x"), Some(outer));
        assert_eq!(table.symbol(outer).map(|s| s.slot.as_str()), Some("x"));
        assert_eq!(table.symbol(inner).map(|s| s.slot.as_str()), Some("_s1_x"));
    }

    #[test]
    fn duplicate_in_same_scope_reports_existing_symbol() {
        let mut table = SymbolTable::new();
        let first = table
            .declare(SymbolTable::GLOBAL, "n", SymbolKind::Const, Span::new(1, 1), 0)
            .expect("first");
        let second = table.declare(SymbolTable::GLOBAL, "n", SymbolKind::Variable, Span::new(2, 1), 0);
        assert_eq!(second, Err(first));
    }

    #[test]
    fn labels_are_global_and_do_not_take_storage() {
        let mut table = SymbolTable::new();
        let label = table.declare_label("loop", Span::start()).expect("label");
        assert_eq!(table.label("loop"), Some(label));
        assert_eq!(table.lookup(SymbolTable::GLOBAL, "loop"), None);
        assert!(table.declare_label("loop", Span::start()).is_err());

        // A variable of the same name keeps its bare slot.
        let var = table
            .declare(SymbolTable::GLOBAL, "loop", SymbolKind::Variable, Span::start(), 0)
            .expect("var");
        assert_eq!(table.symbol(var).map(|s| s.slot.as_str()), Some("loop"));
    }

    fn slot_of(table: &mut SymbolTable, scope: ScopeId, name: &str, kind: SymbolKind) -> String {
        let id = table
            .declare(scope, name, kind, Span::start(), 0)
            .expect(name);
        table.symbol(id).map(|s| s.slot.clone()).expect("symbol")
    }

    #[test]
    fn scalars_never_land_on_array_elements() {
        let mut table = SymbolTable::new();
        let global = SymbolTable::GLOBAL;
        assert_eq!(slot_of(&mut table, global, "a", SymbolKind::Array), "a");
        assert_eq!(slot_of(&mut table, global, "a_0", SymbolKind::Variable), "_s1_a_0");
        assert_eq!(slot_of(&mut table, global, "a_length", SymbolKind::Const), "_s1_a_length");
        assert_eq!(slot_of(&mut table, global, "a_x", SymbolKind::Variable), "a_x");
        assert_eq!(slot_of(&mut table, global, "b_2", SymbolKind::Variable), "b_2");
        assert_eq!(slot_of(&mut table, global, "b", SymbolKind::Array), "_s1_b");
    }

    #[test]
    fn shadowed_arrays_and_scalars_stay_apart() {
        let mut table = SymbolTable::new();
        let inner = table.push_scope(SymbolTable::GLOBAL);
        assert_eq!(slot_of(&mut table, SymbolTable::GLOBAL, "a", SymbolKind::Array), "a");
        assert_eq!(slot_of(&mut table, inner, "a", SymbolKind::Array), "_s1_a");
        // `_s1_a_0` is an element of the inner array.
        assert_eq!(slot_of(&mut table, SymbolTable::GLOBAL, "a_0", SymbolKind::Variable), "_s2_a_0");
        assert_eq!(slot_of(&mut table, inner, "a_0", SymbolKind::Variable), "_s3_a_0");
    }

    #[test]
    fn sibling_scopes_do_not_see_each_other() {
        let mut table = SymbolTable::new();
        let left = table.push_scope(SymbolTable::GLOBAL);
        let right = table.push_scope(SymbolTable::GLOBAL);
        table
            .declare(left, "t", SymbolKind::Variable, Span::start(), 0)
            .expect("left");
        assert!(table.lookup(right, "t").is_none());
        let in_right = table
            .declare(right, "t", SymbolKind::Variable, Span::start(), 0)
            .expect("right");
        assert_eq!(table.symbol(in_right).map(|s| s.slot.as_str()), Some("_s1_t"));
    }
}
