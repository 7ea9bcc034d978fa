use std::env;
use std::fs;
use std::io;
use std::process;

use tawk::{json, Interpreter, Lexer, Parser};

fn main() {
    let args: Vec<String> = env::args().collect();

    match run(&args[1..]) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("tawk: {}", e);
            process::exit(2);
        }
    }
}

fn run(args: &[String]) -> Result<i32, Box<dyn std::error::Error>> {
    let mut program_source: Option<String> = None;

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];

        if arg == "--help" || arg == "-h" {
            print_help();
            return Ok(0);
        }

        if arg == "--version" {
            println!("tawk {}", env!("CARGO_PKG_VERSION"));
            return Ok(0);
        }

        if arg == "-f" {
            i += 1;
            if i >= args.len() {
                return Err("option -f requires an argument".into());
            }
            program_source = Some(fs::read_to_string(&args[i])?);
        } else if arg.starts_with('-') && arg.len() > 1 {
            return Err(format!("unknown option: {}", arg).into());
        } else if program_source.is_none() {
            program_source = Some(arg.clone());
        } else {
            return Err(format!("unexpected argument: {}", arg).into());
        }

        i += 1;
    }

    let program_source = program_source.ok_or("no program provided")?;

    // Parse the program
    let tokens = Lexer::new(&program_source).tokenize()?;
    let program = Parser::new(tokens).parse()?;

    // Read the document from stdin
    let stdin = io::stdin();
    let data = json::read_document(stdin.lock())?;

    // Run
    let stdout = io::stdout();
    let mut output = stdout.lock();
    Interpreter::new(&program, &data).run(&mut output)?;

    Ok(0)
}

fn print_help() {
    println!(
        r#"Usage: tawk 'program' < document.json
       tawk -f progfile < document.json

An AWK-style pattern/action processor for JSON trees. The JSON document is
read from standard input and walked depth-first; each block whose pattern
matches the current visit runs its action.

Options:
  -f progfile      Read the program from a file
  --version        Print version information
  --help           Print this help message

Patterns:
  ^                Match on node entry instead of exit
  name or 0        Match a literal object key / array index
  *                Match any single path segment
  (expr)           Match when expr is true; path and $0 are in scope

Examples:
  tawk '^* {{ println(path, $0) }}' < data.json
  tawk 'users.* {{ count += 1 }} {{ println(count) }}' < data.json
  tawk '^(path == ["id"]) {{}}' < data.json
"#
    );
}
