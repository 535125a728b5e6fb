//! Gadget substitution: instantiate a gadget template in place of one gate.
//!
//! Shares of the gadget's inputs and outputs are rewired to shares of the gate's concrete
//! variables, and every random and internal wire of the template is made unique to this
//! instantiation with a caller-supplied suffix.  Callers must never reuse a suffix; nothing here
//! can detect it.
use std::fmt;
use log::trace;
use crate::error::{Error, Result};
use crate::ir::gadget::{Gadget, Role, INTERNAL_PREFIX};
use crate::ir::instr::{Instr, Op, Stmt};


/// A renamed token.  Kept structured until it's rendered so that the share part and the suffix
/// part can't run into each other.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Name<'a> {
    /// Share `share` of concrete variable `wire`: `<wire>_<share>_`, or just `<wire>_` when the
    /// template token is the bare role tag.
    Share { wire: &'a str, share: &'a str },
    /// Template-local name `base` made unique by `suffix`: `<base>__<suffix>__`.
    Unique { base: &'a str, suffix: &'a str },
}

impl fmt::Display for Name<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Name::Share { wire, share: "" } => write!(f, "{}_", wire),
            Name::Share { wire, share } => write!(f, "{}_{}_", wire, share),
            Name::Unique { base, suffix } => write!(f, "{}__{}__", base, suffix),
        }
    }
}

/// Name of share `i` of `var`, as produced by substituting a canonical gadget whose share
/// tokens are `<tag><i>`.
pub fn share_name(var: &str, i: usize) -> String {
    Name::Share { wire: var, share: &i.to_string() }.to_string()
}

fn is_canonical_internal(token: &str) -> bool {
    token.starts_with(INTERNAL_PREFIX) && {
        let rest = &token[INTERNAL_PREFIX.len()..];
        !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit())
    }
}


/// Concrete variables bound to a gadget's input and output slots for one instantiation.
struct Wiring<'a> {
    inputs: &'a [&'a str],
    outputs: &'a [&'a str],
    suffix: &'a str,
}

impl Wiring<'_> {
    fn rename(&self, g: &Gadget, token: &str) -> Result<String> {
        // Everything after the (possibly multi-byte) role tag.
        let rest = || token.char_indices().nth(1).map_or("", |(i, _)| &token[i..]);
        let name = match g.classify(token) {
            Role::Input(i) => Name::Share { wire: self.inputs[i], share: rest() },
            Role::Output(i) => Name::Share { wire: self.outputs[i], share: rest() },
            Role::Random => Name::Unique { base: token, suffix: self.suffix },
            Role::Internal if is_canonical_internal(token) =>
                Name::Unique { base: token, suffix: self.suffix },
            Role::Internal => return Err(Error::UnclassifiableToken {
                token: token.to_owned(),
                inputs: g.inputs.clone(),
                outputs: g.outputs.clone(),
            }),
        };
        Ok(name.to_string())
    }

    /// Rewrite a fresh copy of the template's statements.  The template itself is untouched.
    fn instantiate(&self, g: &Gadget) -> Result<Vec<Stmt>> {
        g.stmts.iter().map(|s| -> Result<Stmt> {
            match *s {
                Stmt::Blank => Ok(Stmt::Blank),
                Stmt::Instr(ref i) => Ok(Stmt::Instr(i.try_map_tokens(|t| self.rename(g, t))?)),
            }
        }).collect()
    }
}


fn check_shape(
    g: &Gadget,
    entry: &'static str,
    inputs: usize,
    outputs: usize,
    expected: &'static str,
) -> Result<()> {
    if g.inputs.len() != inputs || g.outputs.len() != outputs {
        return Err(Error::GadgetShape {
            entry,
            expected,
            inputs: g.inputs.len(),
            outputs: g.outputs.len(),
        });
    }
    Ok(())
}

/// The template's randoms as they appear after instantiation with `suffix`.
pub fn unique_randoms(g: &Gadget, suffix: &str) -> Vec<String> {
    g.randoms.iter()
        .map(|r| Name::Unique { base: r, suffix }.to_string())
        .collect()
}


/// Replace `dest = a + b` with an instance of the 2-input, 1-output `gadget`.  The caller splices
/// the result in place of `instr` and registers `unique_randoms(gadget, suffix)` with the
/// surrounding circuit.
pub fn substitute_addition(instr: &Instr, gadget: &Gadget, suffix: &str) -> Result<Vec<Stmt>> {
    if instr.op != Op::Add || instr.args.len() != Op::Add.arity() {
        return Err(Error::MalformedInstruction {
            line: instr.to_string(),
            reason: "expected an addition with exactly two operands".to_owned(),
        });
    }
    check_shape(gadget, "substitute_addition", 2, 1, "2 inputs and 1 output")?;

    trace!("substitute_addition: {} [{}]", instr, suffix);
    let inputs = [instr.args[0].as_str(), instr.args[1].as_str()];
    let outputs = [instr.dest.as_str()];
    Wiring { inputs: &inputs, outputs: &outputs, suffix }.instantiate(gadget)
}

/// Instantiate the 1-input, 2-output copy `gadget` so that `output1` and `output2` both carry
/// the value of `input`.  Also returns the randoms this instance introduces.
pub fn substitute_copy(
    input: &str,
    output1: &str,
    output2: &str,
    gadget: &Gadget,
    suffix: &str,
) -> Result<(Vec<Stmt>, Vec<String>)> {
    check_shape(gadget, "substitute_copy", 1, 2, "1 input and 2 outputs")?;

    trace!("substitute_copy: {} -> {}, {} [{}]", input, output1, output2, suffix);
    let inputs = [input];
    let outputs = [output1, output2];
    let stmts = Wiring { inputs: &inputs, outputs: &outputs, suffix }.instantiate(gadget)?;
    Ok((stmts, unique_randoms(gadget, suffix)))
}
