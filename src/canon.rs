//! Canonical naming for gadget templates.
//!
//! After canonicalization, the shares of input slot `i` are `<tag>0`, `<tag>1`, ... in order of
//! first appearance (same for outputs), randoms are `_r0`, `_r1`, ..., and every other wire is
//! `var0`, `var1`, ....  Role tags are kept as the leading character so the substitution engine
//! can still route each token.
use std::collections::HashMap;
use log::debug;
use crate::ir::gadget::{self, Gadget, Role, INTERNAL_PREFIX, RANDOM_SENTINEL};
use crate::ir::instr::{Instr, Stmt};


/// Names handed out for one role class, in order of first appearance.
#[derive(Default)]
struct NameTable {
    names: HashMap<String, String>,
    order: Vec<String>,
}

impl NameTable {
    fn get_or_assign(&mut self, old: &str, prefix: &str) -> String {
        if let Some(n) = self.names.get(old) {
            return n.clone();
        }
        let n = format!("{}{}", prefix, self.order.len());
        self.names.insert(old.to_owned(), n.clone());
        self.order.push(n.clone());
        n
    }
}


/// Renaming state for a single canonicalization pass.
pub struct RenameContext<'g> {
    gadget: &'g Gadget,
    inputs: Vec<NameTable>,
    outputs: Vec<NameTable>,
    randoms: NameTable,
    /// Current canonical name of each internal wire.  Unlike the other tables, entries here get
    /// replaced when the wire is redefined.
    internals: HashMap<String, String>,
    next_internal: usize,
}

impl<'g> RenameContext<'g> {
    pub fn new(gadget: &'g Gadget) -> RenameContext<'g> {
        RenameContext {
            gadget,
            inputs: gadget.inputs.iter().map(|_| NameTable::default()).collect(),
            outputs: gadget.outputs.iter().map(|_| NameTable::default()).collect(),
            randoms: NameTable::default(),
            internals: HashMap::new(),
            next_internal: 0,
        }
    }

    fn fresh_internal(&mut self, old: &str) -> String {
        let n = format!("{}{}", INTERNAL_PREFIX, self.next_internal);
        self.next_internal += 1;
        self.internals.insert(old.to_owned(), n.clone());
        n
    }

    fn slot_name(&mut self, v: &str, role: Role) -> String {
        let g = self.gadget;
        match role {
            Role::Input(i) => self.inputs[i].get_or_assign(v, &g.inputs[i].to_string()),
            Role::Output(i) => self.outputs[i].get_or_assign(v, &g.outputs[i].to_string()),
            Role::Random => {
                let prefix = format!("{}r", RANDOM_SENTINEL);
                self.randoms.get_or_assign(v, &prefix)
            },
            Role::Internal => self.fresh_internal(v),
        }
    }

    pub fn operand(&mut self, v: &str) -> String {
        if let Some(n) = self.internals.get(v) {
            return n.clone();
        }
        if gadget::is_fanout_wire(v) {
            return self.fresh_internal(v);
        }
        let role = self.gadget.classify(v);
        self.slot_name(v, role)
    }

    /// Destinations only ever name outputs or internal wires.  Redefining an internal wire (or
    /// writing any copy-tree wire) starts a new canonical name.
    pub fn dest(&mut self, v: &str) -> String {
        if self.internals.contains_key(v) || gadget::is_fanout_wire(v) {
            return self.fresh_internal(v);
        }
        match self.gadget.classify(v) {
            Role::Output(i) => self.slot_name(v, Role::Output(i)),
            _ => self.fresh_internal(v),
        }
    }

    pub fn stmt(&mut self, s: &Stmt) -> Stmt {
        match *s {
            Stmt::Blank => Stmt::Blank,
            Stmt::Instr(ref i) => {
                // Operands are read before the destination is written, so `t = t + a` reads the
                // old `t`.
                let args = i.args.iter().map(|a| self.operand(a)).collect();
                let dest = self.dest(&i.dest);
                Stmt::Instr(Instr { dest, op: i.op, args })
            },
        }
    }

    pub fn internal_count(&self) -> usize {
        self.next_internal
    }
}


/// Rewrite `g` into canonical form.  The result's `randoms` lists exactly the canonical randoms
/// that occur in its instructions, in order of first appearance.
pub fn canonicalize(g: &Gadget) -> Gadget {
    let mut cx = RenameContext::new(g);
    let stmts = g.stmts.iter().map(|s| cx.stmt(s)).collect::<Vec<_>>();
    debug!(
        "canonicalized gadget {:?} -> {:?}: {} statements, {} randoms, {} internal wires",
        g.inputs, g.outputs, stmts.len(), cx.randoms.order.len(), cx.internal_count(),
    );
    Gadget {
        inputs: g.inputs.clone(),
        outputs: g.outputs.clone(),
        randoms: cx.randoms.order,
        stmts,
    }
}
