//! Fan-out analysis: how many times each value is consumed before its name is rebound.
use std::collections::HashMap;
use crate::ir::instr::Stmt;


/// Number of uses of each consumed variable, counted from its most recent definition.
///
/// Only variables that appear as an operand somewhere have an entry.  Redefining a variable
/// resets its entry to 0, since uses of the old binding don't need copies of the new one.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct FanoutTable {
    counts: HashMap<String, usize>,
}

impl FanoutTable {
    pub fn count(stmts: &[Stmt]) -> FanoutTable {
        FanoutTable::from_bindings(&bindings(stmts))
    }

    /// The table is the use count of each variable's most recent lifetime.  A lifetime with no
    /// uses only matters when it resets an earlier one.
    pub fn from_bindings(bindings: &[Binding]) -> FanoutTable {
        let mut counts = HashMap::new();
        for b in bindings {
            if !b.uses.is_empty() || counts.contains_key(&b.var) {
                counts.insert(b.var.clone(), b.uses.len());
            }
        }
        FanoutTable { counts }
    }

    pub fn get(&self, var: &str) -> Option<usize> {
        self.counts.get(var).cloned()
    }

    /// Number of copies that must be materialized for `var`: its use count when that is more
    /// than one, otherwise zero.
    pub fn copies_needed(&self, var: &str) -> usize {
        match self.get(var) {
            Some(n) if n > 1 => n,
            _ => 0,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(k, &v)| (k.as_str(), v))
    }
}


/// A position where a variable is read: statement index and operand index.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Use {
    pub stmt: usize,
    pub arg: usize,
}

/// One lifetime of a variable name: the statement that defines it (`None` for values that come
/// from outside the instruction list) and every read up to the next redefinition.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Binding {
    pub var: String,
    pub def: Option<usize>,
    pub uses: Vec<Use>,
}

/// Split every variable's reads into lifetimes.  Bindings are returned in the order they start;
/// a variable read before any definition gets a leading binding with `def: None`.
pub fn bindings(stmts: &[Stmt]) -> Vec<Binding> {
    let mut out: Vec<Binding> = Vec::new();
    let mut live: HashMap<&str, usize> = HashMap::new();

    for (idx, s) in stmts.iter().enumerate() {
        let i = match s.instr() {
            Some(i) => i,
            None => continue,
        };
        for (arg, a) in i.args.iter().enumerate() {
            let b = *live.entry(a.as_str()).or_insert_with(|| {
                out.push(Binding { var: a.clone(), def: None, uses: Vec::new() });
                out.len() - 1
            });
            out[b].uses.push(Use { stmt: idx, arg });
        }
        out.push(Binding { var: i.dest.clone(), def: Some(idx), uses: Vec::new() });
        live.insert(i.dest.as_str(), out.len() - 1);
    }

    out
}
