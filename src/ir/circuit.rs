use crate::canon;
use crate::error::Result;
use crate::ir::gadget::Gadget;
use crate::ir::instr::Stmt;


/// A whole circuit: an instruction list plus the variables it reads from outside (`inputs`,
/// `randoms`) and the ones it exposes (`outputs`).
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Circuit {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub randoms: Vec<String>,
    pub stmts: Vec<Stmt>,
}

impl Circuit {
    pub fn new(
        inputs: Vec<String>,
        outputs: Vec<String>,
        randoms: Vec<String>,
        stmts: Vec<Stmt>,
    ) -> Circuit {
        Circuit { inputs, outputs, randoms, stmts }
    }

    pub fn instr_count(&self) -> usize {
        self.stmts.iter().filter(|s| !s.is_blank()).count()
    }

    /// Reinterpret this circuit as a gadget with the given role tags and bring it into canonical
    /// form.  This is how an expanded gadget becomes a template for the next level of nesting.
    pub fn into_gadget(self, inputs: Vec<char>, outputs: Vec<char>) -> Result<Gadget> {
        let g = Gadget::new(inputs, outputs, self.randoms, self.stmts)?;
        Ok(canon::canonicalize(&g))
    }
}
