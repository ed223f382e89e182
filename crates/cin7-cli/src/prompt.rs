//! Minimal interactive prompts on stdin.
//!
//! Every prompt fails when stdin is not a terminal so scripted runs get an
//! error instead of hanging.

use anyhow::{bail, Context};
use colored::Colorize;
use std::io::{BufRead, IsTerminal, Write};

pub fn is_interactive() -> bool {
    std::io::stdin().is_terminal()
}

fn ask(question: &str) -> anyhow::Result<String> {
    if !is_interactive() {
        bail!("cannot prompt for input: stdin is not a terminal");
    }
    print!("{} {} ", "?".cyan().bold(), question);
    std::io::stdout().flush().context("failed to flush stdout")?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read answer")?;
    Ok(line.trim().to_string())
}

fn print_choices(choices: &[String]) {
    for (i, choice) in choices.iter().enumerate() {
        println!("  {} {}", format!("{:>2})", i + 1).dimmed(), choice);
    }
}

/// Pick exactly one entry; returns its index.
pub fn select_one(question: &str, choices: &[String]) -> anyhow::Result<usize> {
    if choices.is_empty() {
        bail!("nothing to choose from");
    }
    println!("{}", question.bold());
    print_choices(choices);
    loop {
        let answer = ask(&format!("Choose 1-{}:", choices.len()))?;
        match parse_index(&answer, choices.len()) {
            Some(i) => return Ok(i),
            None => println!("  {}", "Please enter one of the listed numbers.".yellow()),
        }
    }
}

/// Pick any number of entries (comma or space separated); returns indices.
pub fn select_many(question: &str, choices: &[String]) -> anyhow::Result<Vec<usize>> {
    println!("{}", question.bold());
    print_choices(choices);
    loop {
        let answer = ask("Numbers separated by commas (empty for none):")?;
        match parse_indices(&answer, choices.len()) {
            Some(list) => return Ok(list),
            None => println!("  {}", "Please enter listed numbers only.".yellow()),
        }
    }
}

/// Yes/no question; an empty answer takes `default`.
pub fn confirm(question: &str, default: bool) -> anyhow::Result<bool> {
    let suffix = if default { "(Y/n)" } else { "(y/N)" };
    loop {
        let answer = ask(&format!("{question} {suffix}"))?;
        match parse_yes_no(&answer, default) {
            Some(v) => return Ok(v),
            None => println!("  {}", "Please answer y or n.".yellow()),
        }
    }
}

fn parse_index(answer: &str, len: usize) -> Option<usize> {
    let n: usize = answer.trim().parse().ok()?;
    (1..=len).contains(&n).then(|| n - 1)
}

fn parse_indices(answer: &str, len: usize) -> Option<Vec<usize>> {
    let mut out = Vec::new();
    for part in answer.split([',', ' ']).filter(|p| !p.trim().is_empty()) {
        let idx = parse_index(part, len)?;
        if !out.contains(&idx) {
            out.push(idx);
        }
    }
    Some(out)
}

fn parse_yes_no(answer: &str, default: bool) -> Option<bool> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}
