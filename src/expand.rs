//! The expansion driver: rewrite a whole circuit with the addition and copy gadgets, `k` times.
use std::collections::{HashMap, HashSet};
use log::{debug, info};
use crate::canon::canonicalize;
use crate::copy_tree::{self, expand_copy_tree};
use crate::error::{Error, Result};
use crate::fanout::{self, Binding, Use};
use crate::ir::circuit::Circuit;
use crate::ir::gadget::{Gadget, Role};
use crate::ir::instr::{Instr, Op, Stmt};
use crate::subst::{self, share_name};


/// Uniqueness suffix prefix for one round.  The trailing `_` keeps `s1_` + `12` apart from
/// `s11_` + `2`.
pub fn round_suffix(round: usize) -> String {
    format!("s{}_", round)
}


/// Canonical addition and copy gadgets that agree on the number of shares.
#[derive(Clone, Debug)]
pub struct Expander {
    add: Gadget,
    copy: Gadget,
    shares: usize,
}

fn check_slot_shares(g: &Gadget, what: &str, shares: usize) -> Result<()> {
    let roles = (0 .. g.inputs.len()).map(Role::Input)
        .chain((0 .. g.outputs.len()).map(Role::Output));
    for role in roles {
        let n = g.shares_of(role).len();
        if n != shares {
            return Err(Error::InvalidGadget(format!(
                "{} gadget: {:?} has {} shares, expected {}", what, role, n, shares,
            )));
        }
    }
    Ok(())
}

impl Expander {
    pub fn new(add: &Gadget, copy: &Gadget) -> Result<Expander> {
        let shapes = [(add, "substitute_addition", 2, 1), (copy, "substitute_copy", 1, 2)];
        for &(g, what, i, o) in &shapes {
            if g.inputs.len() != i || g.outputs.len() != o {
                return Err(Error::GadgetShape {
                    entry: what,
                    expected: if i == 2 { "2 inputs and 1 output" } else { "1 input and 2 outputs" },
                    inputs: g.inputs.len(),
                    outputs: g.outputs.len(),
                });
            }
        }

        let add = canonicalize(add);
        let copy = canonicalize(copy);
        let shares = add.share_count();
        if copy.share_count() != shares {
            return Err(Error::GadgetMismatch { add: shares, copy: copy.share_count() });
        }
        check_slot_shares(&add, "addition", shares)?;
        check_slot_shares(&copy, "copy", shares)?;

        info!(
            "gadgets: {} shares, addition {} statements / {} randoms, copy {} statements / {} randoms",
            shares, add.stmts.len(), add.randoms.len(), copy.stmts.len(), copy.randoms.len(),
        );
        Ok(Expander { add, copy, shares })
    }

    pub fn shares(&self) -> usize {
        self.shares
    }

    pub fn copy_gadget(&self) -> &Gadget {
        &self.copy
    }

    fn share_all(&self, vars: &[String]) -> Vec<String> {
        vars.iter()
            .flat_map(|v| (0 .. self.shares).map(move |i| share_name(v, i)))
            .collect()
    }

    /// One expansion round.  Every value consumed more than once is first split with a copy tree
    /// and each of its uses rewired to a distinct copy; then every gate is replaced by its
    /// gadget.  The result is a fresh circuit over the shares of the old one.
    pub fn expand_round(&self, c: &Circuit, round: usize) -> Result<Circuit> {
        let external = c.inputs.iter().chain(c.randoms.iter())
            .map(|v| v.as_str())
            .collect::<HashSet<_>>();

        let bindings = fanout::bindings(&c.stmts);
        check_tree_wires(c, &bindings)?;

        let mut rewire: HashMap<Use, String> = HashMap::new();
        let mut trees_at_start: Vec<(String, usize)> = Vec::new();
        let mut trees_after: HashMap<usize, (String, usize)> = HashMap::new();
        for b in bindings {
            if b.def.is_none() && !external.contains(b.var.as_str()) {
                return Err(Error::UndefinedVariable(b.var));
            }
            if b.uses.len() < 2 {
                continue;
            }
            for (j, &u) in b.uses.iter().enumerate() {
                rewire.insert(u, copy_tree::copy_name(&b.var, j));
            }
            let n = b.uses.len();
            match b.def {
                Some(idx) => { trees_after.insert(idx, (b.var, n)); },
                None => trees_at_start.push((b.var, n)),
            }
        }

        let base = round_suffix(round);
        let mut index = 0;
        let mut stmts = Vec::new();
        let mut randoms = self.share_all(&c.randoms);
        let mut tree_count = 0;

        let mut emit_tree = |stmts: &mut Vec<Stmt>, randoms: &mut Vec<String>,
                             index: &mut usize, var: &str, n: usize| -> Result<()> {
            let t = expand_copy_tree(var, n, &self.copy, &base, *index)?;
            *index = t.next_index;
            stmts.extend(t.stmts);
            randoms.extend(t.randoms);
            tree_count += 1;
            Ok(())
        };

        for &(ref var, n) in &trees_at_start {
            emit_tree(&mut stmts, &mut randoms, &mut index, var, n)?;
        }

        for (idx, s) in c.stmts.iter().enumerate() {
            let i = match *s {
                Stmt::Blank => {
                    push_separator(&mut stmts);
                    continue;
                },
                Stmt::Instr(ref i) => i,
            };

            let args = i.args.iter().enumerate().map(|(arg, a)| {
                rewire.get(&Use { stmt: idx, arg }).cloned().unwrap_or_else(|| a.clone())
            }).collect();
            let i = Instr { dest: i.dest.clone(), op: i.op, args };

            match i.op {
                Op::Add => {
                    let suffix = format!("{}{}", base, index);
                    index += 1;
                    stmts.extend(subst::substitute_addition(&i, &self.add, &suffix)?);
                    randoms.extend(subst::unique_randoms(&self.add, &suffix));
                },
                Op::Mov => {
                    for k in 0 .. self.shares {
                        stmts.push(Instr::mov(share_name(&i.dest, k), share_name(&i.args[0], k)).into());
                    }
                },
                Op::Mul => return Err(Error::UnsupportedOperator(i.to_string())),
            }
            push_separator(&mut stmts);

            if let Some(&(ref var, n)) = trees_after.get(&idx) {
                emit_tree(&mut stmts, &mut randoms, &mut index, var, n)?;
            }
        }
        drop(emit_tree);

        let out = Circuit {
            inputs: self.share_all(&c.inputs),
            outputs: self.share_all(&c.outputs),
            randoms,
            stmts,
        };
        info!(
            "round {}: {} -> {} instructions, {} gadget instances ({} copy trees), {} randoms",
            round, c.instr_count(), out.instr_count(), index, tree_count, out.randoms.len(),
        );
        Ok(out)
    }

    /// Run `k` rounds, numbered from 1.  Each round starts from scratch on the previous round's
    /// output, fan-out included.
    pub fn expand(&self, c: Circuit, k: usize) -> Result<Circuit> {
        let mut c = c;
        for round in 1 ..= k {
            c = self.expand_round(&c, round)?;
        }
        Ok(c)
    }

    /// Expand gadget `g` itself `k` times and bring the result back to canonical form, giving a
    /// gadget of the same shape over `shares^k` times as many shares.
    pub fn compile_gadget(&self, g: &Gadget, k: usize) -> Result<Gadget> {
        let circuit = canonicalize(g).to_circuit();
        let expanded = self.expand(circuit, k)?;
        let nested = expanded.into_gadget(g.inputs.clone(), g.outputs.clone())?;
        debug!(
            "compiled gadget {:?} -> {:?}: {} shares, {} statements, {} randoms",
            g.inputs, g.outputs, nested.share_count(), nested.stmts.len(), nested.randoms.len(),
        );
        Ok(nested)
    }
}

/// Copy trees write `<v>_copy<j>` and `<v>_tmp<j>`.  None of those may already name a variable
/// of the circuit, or the tree would overwrite it.
fn check_tree_wires(c: &Circuit, bindings: &[Binding]) -> Result<()> {
    let mut wires = HashMap::new();
    for b in bindings.iter().filter(|b| b.uses.len() > 1) {
        for w in copy_tree::tree_wires(&b.var, b.uses.len()) {
            wires.insert(w, b.var.as_str());
        }
    }
    if wires.is_empty() {
        return Ok(());
    }

    let names = c.inputs.iter().chain(c.outputs.iter()).chain(c.randoms.iter())
        .map(|v| v.as_str())
        .chain(c.stmts.iter().flat_map(|s| s.tokens()));
    for v in names {
        if let Some(&src) = wires.get(v) {
            return Err(Error::NameClash { var: v.to_owned(), source_var: src.to_owned() });
        }
    }
    Ok(())
}

/// Gate expansions are separated by one blank line; runs of blanks are collapsed.
fn push_separator(stmts: &mut Vec<Stmt>) {
    if !stmts.last().map_or(true, |s| s.is_blank()) {
        stmts.push(Stmt::Blank);
    }
}


#[cfg(test)]
mod test {
    use crate::ir::gadget::is_fanout_wire;
    use crate::ir::instr::{parse_stmts, render_stmts};
    use super::*;

    fn gadget(inputs: &str, outputs: &str, randoms: &[&str], text: &str) -> Gadget {
        Gadget::new(
            inputs.chars().collect(),
            outputs.chars().collect(),
            randoms.iter().map(|s| s.to_string()).collect(),
            parse_stmts(text).unwrap(),
        ).unwrap()
    }

    fn add2() -> Gadget {
        gadget("ab", "c", &[], "c0 = a0 + b0\nc1 = a1 + b1\n")
    }

    fn copy2() -> Gadget {
        gadget("a", "cd", &["_r"], "\
            c0 = a0 + _r\n\
            c1 = a1 + _r\n\
            d0 = a0 + _r\n\
            d1 = a1 + _r\n")
    }

    fn circuit(inputs: &[&str], outputs: &[&str], text: &str) -> Circuit {
        Circuit::new(
            inputs.iter().map(|s| s.to_string()).collect(),
            outputs.iter().map(|s| s.to_string()).collect(),
            vec![],
            parse_stmts(text).unwrap(),
        )
    }

    #[test]
    fn single_addition() {
        let e = Expander::new(&add2(), &copy2()).unwrap();
        let c = circuit(&["x", "y"], &["z"], "z = x + y\n");
        let out = e.expand_round(&c, 1).unwrap();
        assert_eq!(render_stmts(&out.stmts), "\
            z_0_ = x_0_ + y_0_\n\
            z_1_ = x_1_ + y_1_\n\
            \n");
        assert_eq!(out.inputs, vec!["x_0_", "x_1_", "y_0_", "y_1_"]);
        assert_eq!(out.outputs, vec!["z_0_", "z_1_"]);
        assert!(out.randoms.is_empty());
    }

    #[test]
    fn fanout_of_input_is_copied_first() {
        let e = Expander::new(&add2(), &copy2()).unwrap();
        let c = circuit(&["x"], &["z"], "z = x + x\n");
        let out = e.expand_round(&c, 1).unwrap();
        assert_eq!(render_stmts(&out.stmts), "\
            x_copy0_0_ = x_0_ + _r0__s1_0__\n\
            x_copy0_1_ = x_1_ + _r0__s1_0__\n\
            x_copy1_0_ = x_0_ + _r0__s1_0__\n\
            x_copy1_1_ = x_1_ + _r0__s1_0__\n\
            \n\
            z_0_ = x_copy0_0_ + x_copy1_0_\n\
            z_1_ = x_copy0_1_ + x_copy1_1_\n\
            \n");
        assert_eq!(out.randoms, vec!["_r0__s1_0__"]);
    }

    #[test]
    fn fanout_of_gate_output_follows_its_gate() {
        let e = Expander::new(&add2(), &copy2()).unwrap();
        let c = circuit(&["x", "y"], &["w"], "\
            z = x + y\n\
            w = z + z\n");
        let out = e.expand_round(&c, 2).unwrap();
        let text = render_stmts(&out.stmts);
        assert_eq!(text, "\
            z_0_ = x_0_ + y_0_\n\
            z_1_ = x_1_ + y_1_\n\
            \n\
            z_copy0_0_ = z_0_ + _r0__s2_1__\n\
            z_copy0_1_ = z_1_ + _r0__s2_1__\n\
            z_copy1_0_ = z_0_ + _r0__s2_1__\n\
            z_copy1_1_ = z_1_ + _r0__s2_1__\n\
            \n\
            w_0_ = z_copy0_0_ + z_copy1_0_\n\
            w_1_ = z_copy0_1_ + z_copy1_1_\n\
            \n");
    }

    #[test]
    fn moves_are_share_wise() {
        let e = Expander::new(&add2(), &copy2()).unwrap();
        let c = circuit(&["x"], &["y"], "y = x\n");
        let out = e.expand_round(&c, 1).unwrap();
        assert_eq!(render_stmts(&out.stmts), "y_0_ = x_0_\ny_1_ = x_1_\n\n");
    }

    #[test]
    fn circuit_randoms_become_shares() {
        let e = Expander::new(&add2(), &copy2()).unwrap();
        let mut c = circuit(&["x"], &["z"], "z = x + _q\n");
        c.randoms.push("_q".into());
        let out = e.expand_round(&c, 1).unwrap();
        assert_eq!(out.randoms, vec!["_q_0_", "_q_1_"]);
    }

    #[test]
    fn undefined_operand_is_an_error() {
        let e = Expander::new(&add2(), &copy2()).unwrap();
        let c = circuit(&["x"], &["z"], "z = x + y\n");
        match e.expand_round(&c, 1) {
            Err(Error::UndefinedVariable(ref v)) if v == "y" => {},
            r => panic!("unexpected {:?}", r),
        }
    }

    #[test]
    fn circuit_names_may_not_collide_with_copy_wires() {
        let e = Expander::new(&add2(), &copy2()).unwrap();
        let c = circuit(&["x", "x_copy0"], &["z"], "\
            y = x + x\n\
            z = y + x_copy0\n");
        match e.expand_round(&c, 1) {
            Err(Error::NameClash { ref var, ref source_var })
                if var == "x_copy0" && source_var == "x" => {},
            r => panic!("unexpected {:?}", r),
        }

        // A defined variable is caught the same way, as is a `_tmp` wire of a wider tree.
        let c = circuit(&["x"], &["w"], "\
            x_tmp0 = x + x\n\
            w = x + x_tmp0\n");
        match e.expand_round(&c, 1) {
            Err(Error::NameClash { ref var, .. }) if var == "x_tmp0" => {},
            r => panic!("unexpected {:?}", r),
        }
    }

    #[test]
    fn copy_like_names_are_fine_without_a_tree() {
        let e = Expander::new(&add2(), &copy2()).unwrap();
        let c = circuit(&["x", "x_copy0"], &["z"], "z = x + x_copy0\n");
        let out = e.expand_round(&c, 1).unwrap();
        assert_eq!(render_stmts(&out.stmts), "\
            z_0_ = x_0_ + x_copy0_0_\n\
            z_1_ = x_1_ + x_copy0_1_\n\
            \n");
    }

    #[test]
    fn multiplication_is_unsupported() {
        let e = Expander::new(&add2(), &copy2()).unwrap();
        let c = circuit(&["x", "y"], &["z"], "z = x * y\n");
        match e.expand_round(&c, 1) {
            Err(Error::UnsupportedOperator(_)) => {},
            r => panic!("unexpected {:?}", r),
        }
    }

    #[test]
    fn gadgets_must_agree_on_shares() {
        let copy3 = gadget("a", "cd", &[], "\
            c0 = a0\nc1 = a1\nc2 = a2\n\
            d0 = a0\nd1 = a1\nd2 = a2\n");
        match Expander::new(&add2(), &copy3) {
            Err(Error::GadgetMismatch { add: 2, copy: 3 }) => {},
            r => panic!("unexpected {:?}", r),
        }
        assert!(Expander::new(&copy2(), &add2()).is_err());
    }

    #[test]
    fn only_copy_trees_read_a_value_twice() {
        let e = Expander::new(&add2(), &copy2()).unwrap();
        let c = circuit(&["x", "y"], &["t"], "\
            z = x + y\n\
            u = z + x\n\
            v = z + u\n\
            t = v + z\n");
        let out = e.expand(c, 2).unwrap();
        let table = fanout::FanoutTable::count(&out.stmts);
        // Randoms are shared by design inside a gadget.  Any other value read more than once
        // must be the input of a copy gadget instance.
        for i in out.stmts.iter().filter_map(|s| s.instr()) {
            for a in &i.args {
                if !a.starts_with('_') && table.get(a).unwrap_or(0) > 1 {
                    assert!(is_fanout_wire(&i.dest), "{} read twice by {}", a, i);
                }
            }
        }
    }

    #[test]
    fn rounds_use_disjoint_suffixes() {
        let e = Expander::new(&add2(), &copy2()).unwrap();
        let c = circuit(&["x"], &["z"], "y = x + x\nz = y + y\n");
        let out = e.expand(c, 2).unwrap();
        let unique = out.randoms.iter().collect::<HashSet<_>>();
        assert_eq!(unique.len(), out.randoms.len());
    }

    #[test]
    fn compiled_gadget_is_canonical_and_larger() {
        let e = Expander::new(&add2(), &copy2()).unwrap();
        let nested = e.compile_gadget(&add2(), 1).unwrap();
        assert_eq!(nested.inputs, vec!['a', 'b']);
        assert_eq!(nested.outputs, vec!['c']);
        assert_eq!(nested.share_count(), 4);
        assert_eq!(canonicalize(&nested), nested);
        // The nested gadget can itself drive an expansion.
        let copy = e.compile_gadget(&copy2(), 1).unwrap();
        let e2 = Expander::new(&nested, &copy).unwrap();
        assert_eq!(e2.shares(), 4);
    }
}
