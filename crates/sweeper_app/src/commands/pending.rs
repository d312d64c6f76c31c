//! Diff the candidate CSV against the sent ledger and report what remains.

use anyhow::{Context, Result};
use sweeper_engine::{load_candidates, pending_candidates, SentLedger};

use crate::cli::PendingArgs;

pub fn run(args: PendingArgs) -> Result<()> {
    let ledger = SentLedger::load(&args.ledger).context("could not read the sent ledger")?;
    let candidates = load_candidates(&args.csv).context("could not read the candidate CSV")?;
    let total = candidates.len();

    let pending = pending_candidates(candidates, &ledger);

    println!("Candidates in CSV: {total}");
    println!("Already sent:      {}", ledger.len());
    println!("Unique pending:    {}", pending.len());
    for candidate in &pending {
        println!("  {} <{}>", candidate.name, candidate.email);
    }
    Ok(())
}
