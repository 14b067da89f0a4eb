use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use vocab_query::codegen::fmt::{self, FmtMode};
use vocab_query::context::{Collection, EvalContext, Timestamp};
use vocab_query::diagnostic::{self, Diagnostic, ansi::AnsiRenderer};
use vocab_query::registry::Registry;
use vocab_query::{CompileOptions, Compiled, Query, compile};

#[derive(Parser)]
#[command(name = "vocab-query", version, about = "Compile and run vocabulary filter queries")]
struct Cli {
    /// Query text, e.g. "contains text 'neko' & testable"
    query: Option<String>,
    /// Treat the query as a plain search term over the word's text and its kana reading
    #[arg(long)]
    simple: bool,
    /// Accept queries of any result type, not just Boolean filters
    #[arg(long)]
    any_type: bool,
    /// JSON collection ({"words": [...], "tests": [...]}) to evaluate the query against
    #[arg(long, value_name = "FILE")]
    words: Option<PathBuf>,
    /// Evaluation time in milliseconds since the Unix epoch (defaults to the system clock)
    #[arg(long, value_name = "MS")]
    now: Option<i64>,
    /// How to print the compiled query when no collection is given
    #[arg(long, value_enum, default_value_t = Emit::Sexpr)]
    emit: Emit,
    /// Report errors and results as JSON
    #[arg(long)]
    json: bool,
    /// Disable coloured diagnostics (also honoured: NO_COLOR)
    #[arg(long)]
    no_color: bool,
    /// Explain an error code, e.g. VQ-T001
    #[arg(long, value_name = "CODE", conflicts_with = "query")]
    explain: Option<String>,
    /// List every builtin function with its signatures
    #[arg(long, conflicts_with = "query")]
    functions: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// One-line s-expression
    Sexpr,
    /// Indented s-expression
    Expanded,
    /// Typed tree as JSON
    Json,
}

struct Reporter {
    json: bool,
    color: bool,
}

impl Reporter {
    fn report(&self, d: &Diagnostic) {
        if self.json {
            eprintln!("{}", diagnostic::json::render(d));
        } else {
            eprint!("{}", AnsiRenderer { use_color: self.color }.render(d));
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let reporter = Reporter { json: cli.json, color: !cli.no_color && std::env::var_os("NO_COLOR").is_none() };
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(d) => {
            reporter.report(&d);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Diagnostic> {
    if let Some(code) = &cli.explain {
        return explain(code);
    }
    if cli.functions {
        list_functions();
        return Ok(());
    }
    let Some(source) = &cli.query else {
        return Err(Diagnostic::error("no query given").with_suggestion("vocab-query \"disp -> 'neko'\""));
    };

    let options = CompileOptions { advanced: !cli.simple, expect_boolean: !cli.any_type };
    let compiled = compile(source, options).map_err(|e| Diagnostic::from(&e))?;

    match &cli.words {
        Some(path) => {
            let collection = read_collection(path)?;
            let now = cli.now.map_or_else(Timestamp::now, Timestamp);
            evaluate(cli, &compiled, &collection, now)
        }
        None => {
            if let Compiled::Query(query) = &compiled {
                print_query(query, if cli.json { Emit::Json } else { cli.emit });
            }
            Ok(())
        }
    }
}

fn explain(code: &str) -> Result<(), Diagnostic> {
    match diagnostic::registry::lookup(code) {
        Some(entry) => {
            print!("{}", entry.long);
            Ok(())
        }
        None => Err(Diagnostic::error(format!("unknown error code '{code}'"))
            .with_note("codes look like VQ-L001, VQ-P002 or VQ-T003")),
    }
}

fn list_functions() {
    for def in Registry::standard().iter() {
        let b = def.builtin;
        let spellings: Vec<&str> = b.word().into_iter().chain(b.symbol()).collect();
        match b.precedence() {
            Some(p) => println!("{} (infix, precedence {p})", spellings.join(", ")),
            None => println!("{}", spellings.join(", ")),
        }
        for sig in &def.signatures {
            println!("  :: {sig}");
        }
    }
}

fn print_query(query: &Query, emit: Emit) {
    match emit {
        Emit::Sexpr => println!("{}", fmt::format(&query.root, FmtMode::Dense)),
        Emit::Expanded => println!("{}", fmt::format(&query.root, FmtMode::Expanded)),
        Emit::Json => {
            let out = serde_json::json!({ "type": query.ty().to_string(), "root": &query.root });
            println!("{out}");
        }
    }
}

fn read_collection(path: &Path) -> Result<Collection, Diagnostic> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Diagnostic::error(format!("could not read {}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| Diagnostic::error(format!("{} is not a word collection: {e}", path.display())))
}

/// Boolean queries filter the collection; other queries print their value for every word.
fn evaluate(cli: &Cli, compiled: &Compiled, collection: &Collection, now: Timestamp) -> Result<(), Diagnostic> {
    let query = match compiled {
        Compiled::Query(query) if cli.any_type => query,
        _ => {
            let matched: Vec<_> = compiled.filter(collection, now).collect();
            if cli.json {
                let out = serde_json::to_string(&matched)
                    .map_err(|e| Diagnostic::error(format!("could not serialize words: {e}")))?;
                println!("{out}");
            } else {
                for word in matched {
                    println!("{}\t{}\t{}", word.id, word.disp, word.sub);
                }
            }
            return Ok(());
        }
    };

    let mut rows = Vec::new();
    for word in &collection.words {
        let ctx = EvalContext::new(word, &collection.tests, now).with_words(&collection.words);
        let value = query.evaluate(&ctx);
        if cli.json {
            rows.push(serde_json::json!({ "id": word.id, "value": value.to_string() }));
        } else {
            println!("{}\t{}\t{value}", word.id, word.disp);
        }
    }
    if cli.json {
        println!("{}", serde_json::Value::Array(rows));
    }
    Ok(())
}
