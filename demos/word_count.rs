//! Count word frequencies in a text file.
//!
//! Usage: `cargo run --example word_count -- <textfile>`
//!
//! Words are split on space, newline, and tab. Each distinct word is printed
//! once as `KEY: <word> VAL: <count>`, in table slot order.

use std::io::{self, Write};
use std::process::ExitCode;

use env_logger::Builder;
use htable::{Status, Table};
use log::{error, info, LevelFilter};

fn initialize_logger() {
    let mut builder = Builder::new();
    builder
        .filter_level(LevelFilter::Warn)
        .format_timestamp_millis()
        .parse_default_env();
    let _ = builder.try_init();
}

fn count_words(text: &[u8]) -> Result<Table<usize>, htable::TableError> {
    let mut table = Table::with_capacity(128)?;
    for word in text
        .split(|&b| matches!(b, b' ' | b'\n' | b'\t'))
        .filter(|w| !w.is_empty())
    {
        match table.find_mut(word) {
            Some(item) => *item.value_mut() += 1,
            None => table.set(word, 1)?,
        }
    }
    Ok(table)
}

fn main() -> ExitCode {
    initialize_logger();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        let program = args.first().map_or("word_count", String::as_str);
        println!("Usage: {} textfile", program);
        return ExitCode::SUCCESS;
    }

    let text = match std::fs::read(&args[1]) {
        Ok(t) => t,
        Err(e) => {
            error!("opening input file {}: {}", args[1], e);
            return ExitCode::FAILURE;
        }
    };

    let table = match count_words(&text) {
        Ok(t) => t,
        Err(e) => {
            error!("counting words: {}", e);
            return ExitCode::FAILURE;
        }
    };
    debug_assert_eq!(table.status(), Status::Ok);
    info!(
        "{} distinct words in {} slots",
        table.len(),
        table.capacity()
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut failed = None;
    table.enumerate(|item| {
        let word = String::from_utf8_lossy(item.key());
        match writeln!(out, "KEY: {} VAL: {}", word, item.value()) {
            Ok(()) => true,
            Err(e) => {
                failed = Some(e);
                false
            }
        }
    });
    if let Some(e) = failed {
        error!("writing output: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
