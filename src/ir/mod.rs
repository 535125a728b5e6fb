pub mod circuit;
pub mod gadget;
pub mod instr;

pub use self::circuit::Circuit;
pub use self::gadget::{Gadget, Role};
pub use self::instr::{Instr, Op, Stmt};
