//! Numbered checklist over stdin, the terminal stand-in for a checkbox list.

use anyhow::Result;
use extsweep::{
    config::Config,
    error::SessionError,
    model::ExtensionIdentity,
    output::{print_checklist, print_pending_table, print_report_table},
    session::{Confirmation, InventorySession},
};
use std::io::{self, BufRead, Write};

use crate::{exit_codes, scan_with_progress};

const HELP: &str =
    "Toggle: numbers (e.g. 1 3 5) | a: all | n: none | d: delete selected | r: rescan | q: quit";

pub async fn run(session: &mut InventorySession, config: &Config) -> Result<u8> {
    let stdin = io::stdin();
    let mut any_failed = false;

    loop {
        println!();
        println!("Extensions for {}:", session.user().username);
        print_checklist(session.snapshot(), Some(session.selection()));
        for (family, error) in session.snapshot().errors() {
            println!("  {}: {}", family, error);
        }
        println!();
        println!("{}", HELP);
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match line.trim() {
            "" => continue,
            "q" | "quit" => break,
            "r" => scan_with_progress(session, config, config.parallel, true).await,
            "a" => {
                session.select_all();
            }
            "n" => session.clear_selection(),
            "d" => {
                let pending = match session.request_deletion() {
                    Ok(pending) => pending,
                    Err(SessionError::NothingSelected) => {
                        println!("No extensions selected for deletion.");
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                };

                print_pending_table(&pending)?;
                let approved = confirm_prompt(&format!(
                    "Are you sure you want to delete {} extension(s)?",
                    pending.len()
                ))?;
                let confirmation = if approved {
                    Confirmation::Approve
                } else {
                    Confirmation::Decline
                };

                match session.confirm_async(confirmation).await? {
                    Some(report) => {
                        print_report_table(&report)?;
                        any_failed |= !report.is_complete_success();
                    }
                    None => println!("Cancelled."),
                }
            }
            input => toggle_numbers(session, input),
        }
    }

    Ok(if any_failed {
        exit_codes::DELETION_FAILED
    } else {
        exit_codes::SUCCESS
    })
}

/// Asks a yes/no question on stdin. Anything but `y`/`yes` is a no.
pub fn confirm_prompt(question: &str) -> Result<bool> {
    print!("{} [y/N]: ", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;

    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes"
    ))
}

fn toggle_numbers(session: &mut InventorySession, input: &str) {
    let ids: Vec<ExtensionIdentity> = session
        .snapshot()
        .records()
        .map(|r| r.identity.clone())
        .collect();

    for token in input.split(|c: char| c.is_whitespace() || c == ',') {
        if token.is_empty() {
            continue;
        }
        match token.parse::<usize>() {
            Ok(n) if (1..=ids.len()).contains(&n) => {
                session.toggle(&ids[n - 1]);
            }
            _ => println!("Ignoring '{}'", token),
        }
    }
}
