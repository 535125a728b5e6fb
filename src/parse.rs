//! Reading and writing gadget and circuit files.
//!
//! Both are serde documents whose `instructions` field holds the instruction listing as text.
//! The encoding is picked from the file extension: `.yaml`/`.yml`, `.json` or `.cbor`, with YAML
//! as the fallback.  Circuits can also be written and read as plain `.txt` listings with
//! `# inputs:` / `# outputs:` / `# randoms:` header lines.
use std::fs;
use std::path::Path;
use log::info;
use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};
use crate::ir::circuit::Circuit;
use crate::ir::gadget::Gadget;
use crate::ir::instr::{parse_stmts, render_stmts};


#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Format {
    Yaml,
    Json,
    Cbor,
    Text,
}

impl Format {
    pub fn from_path(path: &Path) -> Format {
        match path.extension().and_then(|os| os.to_str()) {
            Some("json") => Format::Json,
            Some("cbor") => Format::Cbor,
            Some("txt") => Format::Text,
            _ => Format::Yaml,
        }
    }
}


#[derive(Serialize, Deserialize)]
struct GadgetFile {
    inputs: Vec<char>,
    outputs: Vec<char>,
    #[serde(default)]
    randoms: Vec<String>,
    instructions: String,
}

#[derive(Serialize, Deserialize)]
struct CircuitFile {
    #[serde(default)]
    inputs: Vec<String>,
    #[serde(default)]
    outputs: Vec<String>,
    #[serde(default)]
    randoms: Vec<String>,
    instructions: String,
}


fn decode<T: for<'de> Deserialize<'de>>(fmt: Format, content: &[u8], path: &str) -> Result<T> {
    let r = match fmt {
        Format::Json => serde_json::from_slice(content).map_err(|e| e.to_string()),
        Format::Cbor => serde_cbor::from_slice(content).map_err(|e| e.to_string()),
        Format::Yaml | Format::Text => serde_yaml::from_slice(content).map_err(|e| e.to_string()),
    };
    r.map_err(|msg| Error::Decode { path: path.to_owned(), msg })
}

fn encode<T: Serialize>(fmt: Format, value: &T, path: &str) -> Result<Vec<u8>> {
    let r = match fmt {
        Format::Json => serde_json::to_vec_pretty(value).map_err(|e| e.to_string()),
        Format::Cbor => serde_cbor::to_vec(value).map_err(|e| e.to_string()),
        Format::Yaml | Format::Text =>
            serde_yaml::to_string(value).map(String::into_bytes).map_err(|e| e.to_string()),
    };
    r.map_err(|msg| Error::Encode { path: path.to_owned(), msg })
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| Error::Io { path: path.display().to_string(), source })
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|source| Error::Io { path: path.display().to_string(), source })
}


pub fn decode_gadget(fmt: Format, content: &[u8], path: &str) -> Result<Gadget> {
    let f: GadgetFile = decode(fmt, content, path)?;
    Gadget::new(f.inputs, f.outputs, f.randoms, parse_stmts(&f.instructions)?)
}

pub fn encode_gadget(fmt: Format, g: &Gadget, path: &str) -> Result<Vec<u8>> {
    let f = GadgetFile {
        inputs: g.inputs.clone(),
        outputs: g.outputs.clone(),
        randoms: g.randoms.clone(),
        instructions: render_stmts(&g.stmts),
    };
    encode(fmt, &f, path)
}

/// Load a gadget template.  The result is validated but not canonicalized.
pub fn read_gadget(path: &Path) -> Result<Gadget> {
    let g = decode_gadget(Format::from_path(path), &read_bytes(path)?, &path.display().to_string())?;
    info!("read gadget {}: inputs {:?}, outputs {:?}, {} statements",
        path.display(), g.inputs, g.outputs, g.stmts.len());
    Ok(g)
}

pub fn write_gadget(path: &Path, g: &Gadget) -> Result<()> {
    let bytes = encode_gadget(Format::from_path(path), g, &path.display().to_string())?;
    write_bytes(path, &bytes)
}


fn header_list(text: &str, key: &str) -> Vec<String> {
    let prefix = format!("# {}:", key);
    text.lines()
        .filter_map(|l| l.trim().strip_prefix(prefix.as_str()))
        .flat_map(|rest| rest.split_whitespace().map(|s| s.to_owned()))
        .collect()
}

pub fn decode_circuit(fmt: Format, content: &[u8], path: &str) -> Result<Circuit> {
    if fmt == Format::Text {
        let text = String::from_utf8(content.to_owned())
            .map_err(|e| Error::Decode { path: path.to_owned(), msg: e.to_string() })?;
        return Ok(Circuit {
            inputs: header_list(&text, "inputs"),
            outputs: header_list(&text, "outputs"),
            randoms: header_list(&text, "randoms"),
            stmts: parse_stmts(&text)?,
        });
    }
    let f: CircuitFile = decode(fmt, content, path)?;
    Ok(Circuit {
        inputs: f.inputs,
        outputs: f.outputs,
        randoms: f.randoms,
        stmts: parse_stmts(&f.instructions)?,
    })
}

pub fn encode_circuit(fmt: Format, c: &Circuit, path: &str) -> Result<Vec<u8>> {
    if fmt == Format::Text {
        let mut out = String::new();
        out.push_str(&format!("# inputs: {}\n", c.inputs.join(" ")));
        out.push_str(&format!("# outputs: {}\n", c.outputs.join(" ")));
        out.push_str(&format!("# randoms: {}\n", c.randoms.join(" ")));
        out.push_str(&render_stmts(&c.stmts));
        return Ok(out.into_bytes());
    }
    let f = CircuitFile {
        inputs: c.inputs.clone(),
        outputs: c.outputs.clone(),
        randoms: c.randoms.clone(),
        instructions: render_stmts(&c.stmts),
    };
    encode(fmt, &f, path)
}

pub fn read_circuit(path: &Path) -> Result<Circuit> {
    let c = decode_circuit(Format::from_path(path), &read_bytes(path)?, &path.display().to_string())?;
    info!("read circuit {}: {} inputs, {} outputs, {} instructions",
        path.display(), c.inputs.len(), c.outputs.len(), c.instr_count());
    Ok(c)
}

pub fn write_circuit(path: &Path, c: &Circuit) -> Result<()> {
    let bytes = encode_circuit(Format::from_path(path), c, &path.display().to_string())?;
    write_bytes(path, &bytes)
}
