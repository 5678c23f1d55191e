use std::io::{self, BufRead, Write};
use std::path::Path;

use colored::Colorize;

use ares_engine::{Actor, FileStore, Settings};

use super::console::ConsoleResponder;
use super::table::{Outcome, Table};

pub fn run(
    settings_path: &Path,
    state_dir: &Path,
    seed: Option<u64>,
    ansi: bool,
    actor: Actor,
) -> Result<(), String> {
    let mut settings = Settings::load(settings_path);
    if let Some(seed) = seed {
        settings = settings.with_seed(seed);
    }
    let store = FileStore::new(state_dir);
    let mut table = Table::new(settings, Box::new(store), ConsoleResponder::new(ansi), actor);

    println!("  {} Ares table session", "Starting".bold());
    println!(
        "  Acting as {} | State: {}",
        table.actor().name,
        state_dir.display()
    );
    println!("  Type 'help' for commands, 'quit' to exit.\n");

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush().map_err(|e| e.to_string())?;

        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match table.process(input) {
            Ok(Outcome::Reply(output)) => {
                if !output.is_empty() {
                    println!("{output}\n");
                }
            }
            Ok(Outcome::Quit) => break,
            Err(e) => {
                println!("{}\n", e.yellow());
            }
        }
    }

    table.save()?;
    println!("  Session saved.");
    Ok(())
}
