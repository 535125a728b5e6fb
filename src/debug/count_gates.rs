use std::collections::HashMap;
use crate::fanout::FanoutTable;
use crate::ir::circuit::Circuit;
use crate::ir::gadget::is_fanout_wire;
use crate::ir::instr::Op;

#[derive(Default)]
struct CountTree<'a> {
    count: usize,
    children: HashMap<&'a str, CountTree<'a>>,
}

impl CountTree<'_> {
    pub fn print(&self, indent: &str, label: &str) {
        eprintln!("{}- {:9} {}", indent, self.count, label);

        let next_indent = format!("{}  ", indent);

        let mut keys = self.children.keys().cloned().collect::<Vec<_>>();
        keys.sort();
        for k in keys {
            let v = &self.children[k];
            v.print(&next_indent, k);
        }
    }
}

fn op_label(op: Op) -> &'static str {
    match op {
        Op::Add => "add",
        Op::Mul => "mul",
        Op::Mov => "mov",
    }
}

/// Per-operator instruction counts, split into copy-tree wiring and everything else.
pub fn count_gates(c: &Circuit) {
    let mut tree = CountTree::default();

    for i in c.stmts.iter().filter_map(|s| s.instr()) {
        let kind = if is_fanout_wire(&i.dest) { "copy tree" } else { "gate" };
        let mut cur = &mut tree;
        cur.count += 1;
        for &part in &[op_label(i.op), kind] {
            cur = cur.children.entry(part).or_insert_with(CountTree::default);
            cur.count += 1;
        }
    }

    tree.print("", "all instructions");
    eprintln!("  {:11} inputs", c.inputs.len());
    eprintln!("  {:11} outputs", c.outputs.len());
    eprintln!("  {:11} randoms", c.randoms.len());
}

/// How many values are read more than once in their latest lifetime, grouped by use count.
pub fn count_fanout(c: &Circuit) {
    let table = FanoutTable::count(&c.stmts);
    let mut widths = table.iter()
        .map(|(v, _)| table.copies_needed(v))
        .filter(|&n| n > 0)
        .collect::<Vec<_>>();
    widths.sort();

    eprintln!("  {:11} values read more than once", widths.len());
    let mut rest = &widths[..];
    while let Some(&n) = rest.first() {
        let k = rest.iter().take_while(|&&m| m == n).count();
        eprintln!("    {:9} read {} times", k, n);
        rest = &rest[k..];
    }
}
