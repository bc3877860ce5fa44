//! Conflict resolution for the terminal.

use console::{style, Term};
use lessonflow::config::ConflictPolicy;
use lessonflow::conflict::{Choice, Conflict, ConflictResolver};

pub enum CliResolver {
    /// Configured answer, no prompt.
    Fixed(Choice),
    /// Ask on the terminal.
    Prompt(Term),
}

impl CliResolver {
    pub fn for_policy(policy: ConflictPolicy) -> Self {
        match policy.choice() {
            Some(choice) => CliResolver::Fixed(choice),
            None => CliResolver::Prompt(Term::stderr()),
        }
    }
}

impl ConflictResolver for CliResolver {
    fn resolve(&self, conflict: &Conflict) -> Choice {
        match self {
            CliResolver::Fixed(choice) => *choice,
            CliResolver::Prompt(term) => ask(term, conflict),
        }
    }
}

fn ask(term: &Term, conflict: &Conflict) -> Choice {
    let _ = term.write_line(&style(conflict.message()).yellow().to_string());
    loop {
        let _ = term.write_str("[k]eep / [r]eplace (default: replace): ");
        let line = match term.read_line() {
            Ok(line) => line,
            // Closed input: same answer as a headless run.
            Err(_) => return Choice::ReplaceWithPropagated,
        };
        match parse_answer(&line) {
            Some(choice) => return choice,
            None => {
                let _ = term.write_line("Please answer k or r.");
            }
        }
    }
}

fn parse_answer(answer: &str) -> Option<Choice> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "" | "r" | "replace" => Some(Choice::ReplaceWithPropagated),
        "k" | "keep" => Some(Choice::KeepTarget),
        _ => None,
    }
}
