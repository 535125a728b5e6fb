use std::path::Path;
use std::process;
use clap::{App, Arg, ArgMatches};
use env_logger;
use log::info;

use rpe_compiler::debug;
use rpe_compiler::expand::Expander;
use rpe_compiler::parse;
use rpe_compiler::{Error, Result};


fn parse_args() -> ArgMatches<'static> {
    App::new("rpe-compiler")
        .about("expand an addition/copy circuit into a masked circuit using RPE gadgets")
        .arg(Arg::with_name("circuit")
             .takes_value(true)
             .value_name("CIRCUIT.YAML")
             .help("circuit to expand (or a gadget, with --gadget-mode)")
             .required(true))
        .arg(Arg::with_name("add-gadget")
             .long("add-gadget")
             .takes_value(true)
             .value_name("ADD.YAML")
             .help("2-input, 1-output addition gadget")
             .required(true))
        .arg(Arg::with_name("copy-gadget")
             .long("copy-gadget")
             .takes_value(true)
             .value_name("COPY.YAML")
             .help("1-input, 2-output copy gadget")
             .required(true))
        .arg(Arg::with_name("rounds")
             .short("k")
             .long("rounds")
             .takes_value(true)
             .value_name("1")
             .help("number of expansion rounds"))
        .arg(Arg::with_name("output")
             .short("o")
             .long("output")
             .takes_value(true)
             .value_name("OUT.YAML")
             .help("where to write the result; the extension picks the format \
                    (.yaml, .json, .cbor, .txt)"))
        .arg(Arg::with_name("gadget-mode")
             .long("gadget-mode")
             .help("treat CIRCUIT as a gadget and compile it into a nested gadget"))
        .arg(Arg::with_name("stats")
             .long("stats")
             .help("print info about the size of the result"))
        .after_help("With no --output, prints the expanded instructions to stdout.")
        .get_matches()
}


fn parse_rounds(arg: Option<&str>) -> Result<usize> {
    match arg {
        Some(s) => s.parse::<usize>().map_err(|e| Error::BadArgument {
            name: "rounds",
            value: s.to_owned(),
            reason: e.to_string(),
        }),
        None => Ok(1),
    }
}

fn real_main(args: ArgMatches<'static>) -> Result<()> {
    let add = parse::read_gadget(Path::new(args.value_of_os("add-gadget").unwrap()))?;
    let copy = parse::read_gadget(Path::new(args.value_of_os("copy-gadget").unwrap()))?;
    let expander = Expander::new(&add, &copy)?;

    let rounds = parse_rounds(args.value_of("rounds"))?;

    let input_path = Path::new(args.value_of_os("circuit").unwrap());
    let output_path = args.value_of_os("output").map(Path::new);

    if args.is_present("gadget-mode") {
        let g = parse::read_gadget(input_path)?;
        let nested = expander.compile_gadget(&g, rounds)?;
        info!("compiled gadget has {} shares", nested.share_count());
        if args.is_present("stats") {
            debug::count_gates::count_gates(&nested.to_circuit());
        }
        match output_path {
            Some(p) => parse::write_gadget(p, &nested)?,
            None => {
                let bytes = parse::encode_gadget(parse::Format::Yaml, &nested, "<stdout>")?;
                print!("{}", String::from_utf8_lossy(&bytes));
            },
        }
        return Ok(());
    }

    let circuit = parse::read_circuit(input_path)?;
    if args.is_present("stats") {
        eprintln!(" ===== stats: input circuit =====");
        debug::count_gates::count_fanout(&circuit);
    }
    let expanded = expander.expand(circuit, rounds)?;

    if args.is_present("stats") {
        eprintln!(" ===== stats: after {} round(s) =====", rounds);
        debug::count_gates::count_gates(&expanded);
        eprintln!(" ===== end stats =====");
    }

    match output_path {
        Some(p) => parse::write_circuit(p, &expanded)?,
        None => {
            let bytes = parse::encode_circuit(parse::Format::Text, &expanded, "<stdout>")?;
            print!("{}", String::from_utf8_lossy(&bytes));
        },
    }

    Ok(())
}

fn main() {
    env_logger::init();
    let args = parse_args();

    if let Err(e) = real_main(args) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}
