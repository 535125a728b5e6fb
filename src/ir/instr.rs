use std::fmt;
use std::str::FromStr;
use crate::error::{Error, Result};


/// Operators that can appear on the right-hand side of an instruction.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Op {
    /// `dest = a + b`
    Add,
    /// `dest = a * b`
    Mul,
    /// `dest = a`
    Mov,
}

impl Op {
    pub fn arity(self) -> usize {
        match self {
            Op::Add | Op::Mul => 2,
            Op::Mov => 1,
        }
    }

    pub fn symbol(self) -> Option<&'static str> {
        match self {
            Op::Add => Some("+"),
            Op::Mul => Some("*"),
            Op::Mov => None,
        }
    }

    fn from_symbol(s: &str) -> Option<Op> {
        match s {
            "+" => Some(Op::Add),
            "*" => Some(Op::Mul),
            _ => None,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Op::Add => write!(f, "+"),
            Op::Mul => write!(f, "*"),
            Op::Mov => write!(f, "mov"),
        }
    }
}


/// A single circuit statement `dest = op(args...)`.  The constructors and the parser always
/// produce `op.arity()` operands.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct Instr {
    pub dest: String,
    pub op: Op,
    pub args: Vec<String>,
}

impl Instr {
    pub fn add(dest: impl Into<String>, a: impl Into<String>, b: impl Into<String>) -> Instr {
        Instr { dest: dest.into(), op: Op::Add, args: vec![a.into(), b.into()] }
    }

    pub fn mul(dest: impl Into<String>, a: impl Into<String>, b: impl Into<String>) -> Instr {
        Instr { dest: dest.into(), op: Op::Mul, args: vec![a.into(), b.into()] }
    }

    pub fn mov(dest: impl Into<String>, src: impl Into<String>) -> Instr {
        Instr { dest: dest.into(), op: Op::Mov, args: vec![src.into()] }
    }

    /// Rewrite every variable token (destination first, then operands) with `f`.  The operator
    /// is structural and is never passed to `f`.
    pub fn try_map_tokens<F>(&self, mut f: F) -> Result<Instr>
    where F: FnMut(&str) -> Result<String> {
        let dest = f(&self.dest)?;
        let args = self.args.iter().map(|a| f(a)).collect::<Result<Vec<_>>>()?;
        Ok(Instr { dest, op: self.op, args })
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} =", self.dest)?;
        for (k, a) in self.args.iter().enumerate() {
            match self.op.symbol() {
                Some(sym) if k > 0 => write!(f, " {} {}", sym, a)?,
                _ => write!(f, " {}", a)?,
            }
        }
        Ok(())
    }
}


/// One element of an instruction list.  Blank lines separate gate expansions and are carried
/// through every rewrite unchanged.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub enum Stmt {
    Blank,
    Instr(Instr),
}

impl Stmt {
    pub fn instr(&self) -> Option<&Instr> {
        match *self {
            Stmt::Blank => None,
            Stmt::Instr(ref i) => Some(i),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(*self, Stmt::Blank)
    }

    /// Destination followed by operands.  Empty for blank lines.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.instr().into_iter().flat_map(|i| {
            Some(i.dest.as_str()).into_iter().chain(i.args.iter().map(|a| a.as_str()))
        })
    }
}

impl From<Instr> for Stmt {
    fn from(i: Instr) -> Stmt {
        Stmt::Instr(i)
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Stmt::Blank => Ok(()),
            Stmt::Instr(ref i) => fmt::Display::fmt(i, f),
        }
    }
}

impl FromStr for Stmt {
    type Err = Error;

    fn from_str(line: &str) -> Result<Stmt> {
        let words = line.split_whitespace().collect::<Vec<_>>();
        if words.is_empty() {
            return Ok(Stmt::Blank);
        }

        let malformed = |reason: &str| Error::MalformedInstruction {
            line: line.trim().to_owned(),
            reason: reason.to_owned(),
        };

        if words.len() < 3 || words[1] != "=" {
            return Err(malformed("expected `dest = operand [op operand]`"));
        }
        let dest = words[0].to_owned();
        match words.len() {
            3 => Ok(Instr::mov(dest, words[2]).into()),
            5 => {
                let op = Op::from_symbol(words[3])
                    .ok_or_else(|| malformed(&format!("unknown operator `{}`", words[3])))?;
                Ok(Instr { dest, op, args: vec![words[2].to_owned(), words[4].to_owned()] }.into())
            },
            n => Err(malformed(&format!("expected 1 or 2 operands, got {} tokens", n))),
        }
    }
}


/// Parse a whole instruction listing, one statement per line.  Lines starting with `#` are
/// comments and are dropped.
pub fn parse_stmts(text: &str) -> Result<Vec<Stmt>> {
    text.lines()
        .filter(|l| !l.trim_start().starts_with('#'))
        .map(|l| l.parse())
        .collect()
}

/// Inverse of `parse_stmts` (minus comments): one line per statement, blank lines included.
pub fn render_stmts(stmts: &[Stmt]) -> String {
    let mut out = String::new();
    for s in stmts {
        out.push_str(&s.to_string());
        out.push('\n');
    }
    out
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_binary() {
        let s: Stmt = "z = x + y".parse().unwrap();
        assert_eq!(s, Stmt::Instr(Instr::add("z", "x", "y")));
        let s: Stmt = "  z   =  x *  y ".parse().unwrap();
        assert_eq!(s, Stmt::Instr(Instr::mul("z", "x", "y")));
    }

    #[test]
    fn parse_move_and_blank() {
        let s: Stmt = "c0 = a0".parse().unwrap();
        assert_eq!(s, Stmt::Instr(Instr::mov("c0", "a0")));
        assert_eq!("".parse::<Stmt>().unwrap(), Stmt::Blank);
        assert_eq!("   \t".parse::<Stmt>().unwrap(), Stmt::Blank);
    }

    #[test]
    fn parse_rejects_bad_lines() {
        for bad in &["z x + y", "z = x +", "z = x - y", "z = x + y + w", "z ="] {
            match bad.parse::<Stmt>() {
                Err(Error::MalformedInstruction { .. }) => {},
                r => panic!("{:?} parsed as {:?}", bad, r),
            }
        }
    }

    #[test]
    fn render_keeps_blank_lines() {
        let text = "c0 = a0 + _r0\n\nc1 = a1 + _r0\n";
        let stmts = parse_stmts(text).unwrap();
        assert_eq!(stmts.len(), 3);
        assert!(stmts[1].is_blank());
        assert_eq!(render_stmts(&stmts), text);
    }

    #[test]
    fn comments_are_dropped() {
        let stmts = parse_stmts("# header\nz = x + y\n").unwrap();
        assert_eq!(stmts, vec![Stmt::Instr(Instr::add("z", "x", "y"))]);
    }

    #[test]
    fn tokens_in_order() {
        let s: Stmt = "z = x + y".parse().unwrap();
        assert_eq!(s.tokens().collect::<Vec<_>>(), vec!["z", "x", "y"]);
        assert_eq!(Stmt::Blank.tokens().count(), 0);
    }
}
