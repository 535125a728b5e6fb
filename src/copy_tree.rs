//! Fan-out elimination: realize `n` copies of a variable with a chain of 2-way copy gadgets.
use log::debug;
use crate::error::{Error, Result};
use crate::ir::gadget::Gadget;
use crate::ir::instr::Stmt;
use crate::subst;


pub fn copy_name(var: &str, i: usize) -> String {
    format!("{}_copy{}", var, i)
}

pub fn tmp_name(var: &str, i: usize) -> String {
    format!("{}_tmp{}", var, i)
}


/// Every wire `expand_copy_tree(var, n, ..)` writes, before share renaming.
pub fn tree_wires(var: &str, n: usize) -> Vec<String> {
    let tmps = n.saturating_sub(2);
    (0 .. n).map(|i| copy_name(var, i))
        .chain((0 .. tmps).map(|i| tmp_name(var, i)))
        .collect()
}


#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CopyTree {
    pub stmts: Vec<Stmt>,
    pub randoms: Vec<String>,
    /// First instantiation index not used by this tree.
    pub next_index: usize,
}

/// Build `var_copy0 .. var_copy{n-1}` from `var`.
///
/// The chain is left-leaning: instance 0 copies `var` into `var_copy0` and `var_tmp0`, instance
/// `i` copies `var_tmp{i-1}` into `var_copy{i}` and `var_tmp{i}`, and the last instance writes
/// the final two copies.  That is `n - 1` instances in a chain of depth `n - 1`.  Each instance
/// gets the suffix `<base_suffix><index>` and consumes one index, starting from `index`.  The
/// block ends with a blank line.
pub fn expand_copy_tree(
    var: &str,
    n: usize,
    copy_gadget: &Gadget,
    base_suffix: &str,
    index: usize,
) -> Result<CopyTree> {
    if n < 2 {
        return Err(Error::InvalidCopyCount(n));
    }

    let mut stmts = Vec::new();
    let mut randoms = Vec::new();
    let mut index = index;
    let mut emit = |input: &str, out1: &str, out2: &str| -> Result<()> {
        let suffix = format!("{}{}", base_suffix, index);
        index += 1;
        let (s, r) = subst::substitute_copy(input, out1, out2, copy_gadget, &suffix)?;
        stmts.extend(s);
        randoms.extend(r);
        Ok(())
    };

    if n == 2 {
        emit(var, &copy_name(var, 0), &copy_name(var, 1))?;
    } else {
        emit(var, &copy_name(var, 0), &tmp_name(var, 0))?;
        for i in 1 .. n - 2 {
            emit(&tmp_name(var, i - 1), &copy_name(var, i), &tmp_name(var, i))?;
        }
        emit(&tmp_name(var, n - 3), &copy_name(var, n - 2), &copy_name(var, n - 1))?;
    }
    drop(emit);

    stmts.push(Stmt::Blank);
    debug!("copy tree for {}: {} copies, {} statements", var, n, stmts.len());
    Ok(CopyTree { stmts, randoms, next_index: index })
}


#[cfg(test)]
mod test {
    use std::collections::HashSet;
    use crate::ir::instr::{parse_stmts, render_stmts};
    use super::*;

    /// One-random copy gadget: both outputs are the input share masked by the same random.
    fn copy_gadget() -> Gadget {
        Gadget::new(
            vec!['a'], vec!['c', 'd'], vec!["_r".into()],
            parse_stmts("c1 = a + _r\nd1 = a + _r\n").unwrap(),
        ).unwrap()
    }

    #[test]
    fn four_copies() {
        let t = expand_copy_tree("x", 4, &copy_gadget(), "s", 0).unwrap();
        assert_eq!(render_stmts(&t.stmts), "\
            x_copy0_1_ = x_ + _r__s0__\n\
            x_tmp0_1_ = x_ + _r__s0__\n\
            x_copy1_1_ = x_tmp0_ + _r__s1__\n\
            x_tmp1_1_ = x_tmp0_ + _r__s1__\n\
            x_copy2_1_ = x_tmp1_ + _r__s2__\n\
            x_copy3_1_ = x_tmp1_ + _r__s2__\n\
            \n");
        assert_eq!(t.randoms, vec!["_r__s0__", "_r__s1__", "_r__s2__"]);
        assert_eq!(t.next_index, 3);
    }

    #[test]
    fn two_copies_is_one_instance() {
        let t = expand_copy_tree("v", 2, &copy_gadget(), "k1_", 7).unwrap();
        assert_eq!(render_stmts(&t.stmts), "\
            v_copy0_1_ = v_ + _r__k1_7__\n\
            v_copy1_1_ = v_ + _r__k1_7__\n\
            \n");
        assert_eq!(t.next_index, 8);
    }

    #[test]
    fn complete_for_small_fanouts() {
        let g = copy_gadget();
        for n in 2 ..= 8 {
            let t = expand_copy_tree("v", n, &g, "s", 100).unwrap();
            assert_eq!(t.next_index, 100 + n - 1);
            assert_eq!(t.randoms.len(), n - 1);
            assert_eq!(t.randoms.iter().collect::<HashSet<_>>().len(), n - 1);
            assert_eq!(t.stmts.len(), 2 * (n - 1) + 1);
            assert!(t.stmts.last().unwrap().is_blank());

            let defined = t.stmts.iter()
                .filter_map(|s| s.instr())
                .map(|i| i.dest.clone())
                .collect::<HashSet<_>>();
            for i in 0 .. n {
                assert!(defined.contains(&format!("v_copy{}_1_", i)), "n = {}, copy {}", n, i);
            }
            assert!(!defined.contains(&format!("v_copy{}_1_", n)));
        }
    }

    #[test]
    fn tree_wires_match_what_is_written() {
        let g = copy_gadget();
        for n in 2 ..= 6 {
            let t = expand_copy_tree("v", n, &g, "s", 0).unwrap();
            let written = t.stmts.iter()
                .filter_map(|s| s.instr())
                .map(|i| i.dest.trim_end_matches("_1_").to_owned())
                .collect::<HashSet<_>>();
            let wires = tree_wires("v", n).into_iter().collect::<HashSet<_>>();
            assert_eq!(written, wires, "n = {}", n);
        }
    }

    #[test]
    fn rejects_fewer_than_two() {
        for n in 0 .. 2 {
            match expand_copy_tree("v", n, &copy_gadget(), "s", 0) {
                Err(Error::InvalidCopyCount(m)) => assert_eq!(m, n),
                r => panic!("unexpected {:?}", r),
            }
        }
    }
}
