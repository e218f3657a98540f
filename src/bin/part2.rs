use anyhow::{Context, Result};
use clap::Parser;
use claw_machine::{CLIArgs, PRIZE_OFFSET};

fn main() -> Result<()> {
    claw_machine::init_logging();
    let args = CLIArgs::parse();
    let machines = claw_machine::read_machines(&args.input_path).with_context(|| {
        format!(
            "Failed to read claw machines from given file({}).",
            args.input_path.display()
        )
    })?;

    let machines = machines
        .iter()
        .map(|machine| machine.with_prize_offset(PRIZE_OFFSET))
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to move prizes of claw machines.")?;
    let min_tokens_sum = claw_machine::total_min_tokens(&machines)
        .context("Failed to sum minimium tokens of claw machines.")?;
    println!(
        "The sum of minimium tokens for solving given claw machines is {}.",
        min_tokens_sum
    );

    Ok(())
}
