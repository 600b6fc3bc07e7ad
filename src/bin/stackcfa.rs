// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
use std::error::Error;
use std::fs;

use clap::{arg, Arg, ArgMatches, Command};
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use stackcfa::hex::FromHexString;
use stackcfa::registry::Registry;
use stackcfa::report::{disassembly_report, ReportOptions};
use stackcfa::Program;

fn main() -> Result<(), Box<dyn Error>> {
    let matches = Command::new("stackcfa")
        .about("Static control-flow and symbolic-stack analyzer for EVM-style bytecode")
        .version("0.1.0")
        .subcommand_required(true)
        .arg(arg!(--verbose "Show verbose output"))
        .subcommand(
            Command::new("disassemble")
                .about("Disassemble a target into its control-flow report")
                .arg(Arg::new("code").short('c').long("code"))
                .arg(Arg::new("registry").long("registry"))
                .arg(Arg::new("show-stack-ops").long("show-stack-ops").takes_value(false))
                .arg(Arg::new("show-unreachable").long("show-unreachable").takes_value(false))
                .arg(Arg::new("target").required(true))
                .visible_alias("d"),
        )
        .subcommand(
            Command::new("issues")
                .about("Print the accumulated analysis issues for a target")
                .arg(Arg::new("code").short('c').long("code"))
                .arg(Arg::new("target").required(true))
                .visible_alias("i"),
        )
        .get_matches();

    let verbose = matches.is_present("verbose");
    if verbose {
        init_logging(LevelFilter::Info);
    }

    let ok = match matches.subcommand() {
        Some(("disassemble", args)) => disassemble(args),
        Some(("issues", args)) => issues(args),
        _ => unreachable!(),
    }?;

    let exitcode = if ok { 0 } else { 1 };
    std::process::exit(exitcode);
}

fn read_bytecode(args: &ArgMatches) -> Result<Vec<u8>, Box<dyn Error>> {
    let target = args.get_one::<String>("target").unwrap();
    let mut hex = String::new();
    if args.contains_id("code") {
        hex.push_str(target);
    } else {
        let context = fs::read_to_string(target)?;
        for l in context.lines() {
            hex.push_str(l.trim());
        }
    }
    Ok(hex.from_hex_string()?)
}

fn disassemble(args: &ArgMatches) -> Result<bool, Box<dyn Error>> {
    let bytes = read_bytecode(args)?;
    let registry = match args.get_one::<String>("registry") {
        Some(path) => Registry::load(path)?,
        None => Registry::empty(),
    };
    let program = Program::new(bytes);
    let opts = ReportOptions {
        show_stack_ops: args.is_present("show-stack-ops"),
        show_unreachable: args.is_present("show-unreachable"),
    };
    print!("{}", disassembly_report(&program, &registry, opts));
    Ok(true)
}

fn issues(args: &ArgMatches) -> Result<bool, Box<dyn Error>> {
    let bytes = read_bytecode(args)?;
    let program = Program::new(bytes);
    for issue in program.issues() {
        println!("{}", issue);
    }
    Ok(true)
}

/// Initialise logging using a suitable pattern.
pub fn init_logging(level: LevelFilter) {
    let encoder = PatternEncoder::new("[{l}] {m}{n}");

    let stdout = ConsoleAppender::builder().encoder(Box::new(encoder)).build();

    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))
        .unwrap();

    let _handle = log4rs::init_config(config).unwrap();
}
