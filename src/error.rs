use std::io;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can abort a compilation pass.  None of these are recoverable locally: a
/// masked circuit that was only partially rewritten can't be trusted.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed instruction `{line}`: {reason}")]
    MalformedInstruction { line: String, reason: String },

    #[error("token `{token}` matches no role of gadget with inputs {inputs:?} and outputs {outputs:?}")]
    UnclassifiableToken { token: String, inputs: Vec<char>, outputs: Vec<char> },

    #[error("invalid gadget: {0}")]
    InvalidGadget(String),

    #[error("{entry} needs a gadget with {expected}, but got {inputs} input(s) and {outputs} output(s)")]
    GadgetShape {
        entry: &'static str,
        expected: &'static str,
        inputs: usize,
        outputs: usize,
    },

    #[error("addition gadget uses {add} shares but copy gadget uses {copy}")]
    GadgetMismatch { add: usize, copy: usize },

    #[error("cannot build a copy tree with {0} copies (need at least 2)")]
    InvalidCopyCount(usize),

    #[error("variable `{0}` is used before it is defined and is not a declared input or random")]
    UndefinedVariable(String),

    #[error("variable `{var}` clashes with a wire of the copy tree for `{source_var}`")]
    NameClash { var: String, source_var: String },

    #[error("bad value `{value}` for --{name}: {reason}")]
    BadArgument { name: &'static str, value: String, reason: String },

    #[error("no gadget available for `{0}`")]
    UnsupportedOperator(String),

    #[error("I/O error on {path}: {source}")]
    Io { path: String, #[source] source: io::Error },

    #[error("failed to decode {path}: {msg}")]
    Decode { path: String, msg: String },

    #[error("failed to encode {path}: {msg}")]
    Encode { path: String, msg: String },
}
