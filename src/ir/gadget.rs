use std::collections::HashSet;
use crate::error::{Error, Result};
use crate::ir::circuit::Circuit;
use crate::ir::instr::Stmt;


/// Leading character of every random variable.
pub const RANDOM_SENTINEL: char = '_';
/// Prefix of canonical internal wires (`var0`, `var1`, ...).
pub const INTERNAL_PREFIX: &str = "var";
/// Substrings that mark the wires of a copy tree (`x_copy0`, `x_tmp0`).  Such a wire is always
/// an internal wire of the gadget it appears in, whatever its leading character.
pub const FANOUT_MARKERS: [&str; 2] = ["_copy", "_tmp"];

pub fn is_fanout_wire(token: &str) -> bool {
    FANOUT_MARKERS.iter().any(|m| token.contains(m))
}


/// The role of a token inside one gadget, derived only from its leading character.  Slots are
/// zero-based: `Input(0)` is the first declared input.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Role {
    Input(usize),
    Output(usize),
    Random,
    Internal,
}


/// A gadget template: a short instruction list over shares of its inputs and outputs.  A share
/// of input slot `i` is any token whose first character is `inputs[i]`, and likewise for
/// outputs.  Templates are never mutated once built; every instantiation works on its own copy
/// of `stmts`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Gadget {
    pub inputs: Vec<char>,
    pub outputs: Vec<char>,
    pub randoms: Vec<String>,
    pub stmts: Vec<Stmt>,
}

impl Gadget {
    pub fn new(
        inputs: Vec<char>,
        outputs: Vec<char>,
        randoms: Vec<String>,
        stmts: Vec<Stmt>,
    ) -> Result<Gadget> {
        let g = Gadget { inputs, outputs, randoms, stmts };
        g.validate()?;
        Ok(g)
    }

    fn validate(&self) -> Result<()> {
        if !(1..=2).contains(&self.inputs.len()) {
            return Err(Error::InvalidGadget(
                format!("expected 1 or 2 inputs, got {}", self.inputs.len())));
        }
        if !(1..=2).contains(&self.outputs.len()) {
            return Err(Error::InvalidGadget(
                format!("expected 1 or 2 outputs, got {}", self.outputs.len())));
        }

        let internal_tag = INTERNAL_PREFIX.chars().next();
        let mut seen = HashSet::new();
        for &tag in self.inputs.iter().chain(self.outputs.iter()) {
            if tag == RANDOM_SENTINEL || Some(tag) == internal_tag {
                return Err(Error::InvalidGadget(
                    format!("role tag `{}` is reserved", tag)));
            }
            if !seen.insert(tag) {
                return Err(Error::InvalidGadget(
                    format!("role tag `{}` is declared twice", tag)));
            }
        }

        for r in &self.randoms {
            if !r.starts_with(RANDOM_SENTINEL) {
                return Err(Error::InvalidGadget(
                    format!("random `{}` does not start with `{}`", r, RANDOM_SENTINEL)));
            }
        }
        let declared = self.randoms.iter().map(|r| r.as_str()).collect::<HashSet<_>>();
        for t in self.stmts.iter().flat_map(|s| s.tokens()) {
            if t.starts_with(RANDOM_SENTINEL) && !is_fanout_wire(t) && !declared.contains(t) {
                return Err(Error::InvalidGadget(
                    format!("random `{}` is used but not declared", t)));
            }
        }
        Ok(())
    }

    pub fn classify(&self, token: &str) -> Role {
        let c = match token.chars().next() {
            Some(c) => c,
            None => return Role::Internal,
        };
        if c == RANDOM_SENTINEL {
            return Role::Random;
        }
        if let Some(i) = self.inputs.iter().position(|&t| t == c) {
            return Role::Input(i);
        }
        if let Some(i) = self.outputs.iter().position(|&t| t == c) {
            return Role::Output(i);
        }
        Role::Internal
    }

    /// Number of distinct shares of the first input.  For a canonical gadget this is the masking
    /// order plus one.
    pub fn share_count(&self) -> usize {
        let mut shares = HashSet::new();
        for t in self.stmts.iter().flat_map(|s| s.tokens()) {
            if self.classify(t) == Role::Input(0) && !is_fanout_wire(t) {
                shares.insert(t);
            }
        }
        shares.len()
    }

    /// Shares of input or output slot `role` in order of first appearance.
    pub fn shares_of(&self, role: Role) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for t in self.stmts.iter().flat_map(|s| s.tokens()) {
            if self.classify(t) == role && !is_fanout_wire(t) && seen.insert(t) {
                out.push(t.to_owned());
            }
        }
        out
    }

    /// View the gadget as a circuit whose inputs and outputs are the gadget's shares, so it can
    /// be run through an expansion round like any other circuit.
    pub fn to_circuit(&self) -> Circuit {
        let inputs = (0 .. self.inputs.len())
            .flat_map(|i| self.shares_of(Role::Input(i)))
            .collect();
        let outputs = (0 .. self.outputs.len())
            .flat_map(|i| self.shares_of(Role::Output(i)))
            .collect();
        Circuit {
            inputs,
            outputs,
            randoms: self.randoms.clone(),
            stmts: self.stmts.clone(),
        }
    }
}
