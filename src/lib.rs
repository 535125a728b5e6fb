pub mod error;
pub mod ir;

pub mod canon;
pub mod copy_tree;
pub mod debug;
pub mod expand;
pub mod fanout;
pub mod parse;
pub mod subst;

pub use crate::error::{Error, Result};
