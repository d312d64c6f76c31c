//! The destructive sweep: resolve the group, gate on confirmation, run the
//! retention scan, print the summary.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use sweeper_core::{ContainerId, DayBoundary, ScanStats};
use sweeper_engine::{
    CancelFlag, ChatClient, ClientSettings, RetentionScanner, ScanError, ScanEvent, ScanSettings,
    ScanSink,
};

use crate::cli::SweepArgs;

const TOKEN_VAR: &str = "SWEEPER_TOKEN";

pub async fn run(args: SweepArgs) -> Result<()> {
    let token =
        env::var(TOKEN_VAR).with_context(|| format!("{TOKEN_VAR} is not set in the environment"))?;
    let container = ContainerId(args.chat_id);

    let client = ChatClient::new(ClientSettings::new(&args.base_url, token))?;
    let info = client
        .resolve(container)
        .await
        .context("could not resolve the target group")?;

    let boundary = DayBoundary::local_now();
    println!("Target: {} ({})", info.title, info.id);
    println!("Today:  {}", boundary.today());

    let confirmed = if args.dry_run {
        // Nothing destructive happens on a dry run.
        true
    } else {
        println!("This deletes every text-only message not sent today. Media is preserved.");
        args.yes || confirm_interactively()?
    };

    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.cancel())
            .context("could not install the Ctrl-C handler")?;
    }

    let settings = ScanSettings {
        batch_size: args.batch_size,
        flush_pause: Duration::from_secs(args.pause_secs),
        dry_run: args.dry_run,
    };
    let sink = ConsoleSink;
    let scanner =
        RetentionScanner::new(client.history(container), &client, &sink, settings)
            .with_cancel_flag(cancel);

    match scanner.run(container, &boundary, confirmed).await {
        Ok(stats) => {
            print_summary(&stats, args.dry_run);
            Ok(())
        }
        Err(ScanError::ConfirmationRequired) => {
            println!("Cancelled by user.");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn confirm_interactively() -> Result<bool> {
    let confirmed = dialoguer::Confirm::new()
        .with_prompt("Proceed with deletion?")
        .default(false)
        .interact()
        .context("confirmation prompt failed")?;
    Ok(confirmed)
}

struct ConsoleSink;

impl ScanSink for ConsoleSink {
    fn emit(&self, event: ScanEvent) {
        match event {
            ScanEvent::Started { container, today } => {
                println!("Scanning {container} against {today}...");
            }
            ScanEvent::MessageQueued { id, date, preview } => {
                println!("  will delete {id} [{}] {preview}", format_local(date));
            }
            ScanEvent::BatchFlushed { len, dry_run: true } => {
                println!("  would delete batch of {len} (dry run)");
            }
            ScanEvent::BatchFlushed {
                len,
                dry_run: false,
            } => {
                println!("  deleted batch of {len}");
            }
            ScanEvent::BatchFailed { len, error } => {
                eprintln!("  batch of {len} failed: {error}");
            }
            ScanEvent::Cancelled => {
                println!("Interrupted; stopping without flushing the pending batch.");
            }
            ScanEvent::Finished { .. } => {}
        }
    }
}

fn format_local(date: DateTime<Utc>) -> String {
    date.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn print_summary(stats: &ScanStats, dry_run: bool) {
    let deleted_label = if dry_run { "Would delete" } else { "Deleted" };
    println!();
    println!("Scan summary");
    println!("  Checked:      {}", stats.checked);
    println!("  {deleted_label}: {}", stats.deleted);
    println!("  Kept (media): {}", stats.kept_media);
    println!("  Kept (today): {}", stats.kept_today);
    println!("  Kept (other): {}", stats.kept_other);
    println!("  Errors:       {}", stats.errors);
}
