//! `toolgate history` - 스냅샷 목록, diff, rollback

use anyhow::bail;
use clap::Subcommand;
use toolgate_core::{PathIntent, ToolRunner};

#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    /// List snapshots, newest first
    List {
        /// Only snapshots of this file
        #[arg(short, long)]
        file: Option<String>,

        /// Number of snapshots to show (0 = all)
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Unified diff between two snapshots
    Diff { from: String, to: String },
    /// Restore a snapshot's content to a file
    Rollback { version_id: String, target: String },
}

pub async fn run(runner: &ToolRunner, command: HistoryCommand) -> anyhow::Result<()> {
    let store = runner.history();

    match command {
        HistoryCommand::List { file, limit } => {
            let file = match file {
                Some(raw) => Some(runner.paths().validate(&raw, PathIntent::Read)?),
                None => None,
            };
            let records = store.list_versions(file.as_deref(), limit).await?;
            if records.is_empty() {
                println!("No snapshots found.");
                return Ok(());
            }

            println!(
                "{:<48} {:<12} {:>10}  {}",
                "Version", "Principal", "Bytes", "File"
            );
            println!("{}", "-".repeat(100));
            for record in records {
                println!(
                    "{:<48} {:<12} {:>10}  {}",
                    record.version_id,
                    record.principal,
                    record.size,
                    record.file_path.display()
                );
                if !record.message.is_empty() {
                    println!("    {}", record.message);
                }
            }
        }
        HistoryCommand::Diff { from, to } => {
            let diff = store.diff(&from, &to).await;
            if !diff.has_changes {
                println!("No differences.");
            } else {
                print!("{}", diff.diff);
            }
        }
        HistoryCommand::Rollback { version_id, target } => {
            // 대상 경로도 FileWrite와 같은 규칙으로 검증
            let target = runner.paths().validate(&target, PathIntent::Write)?;
            if !store.rollback(&version_id, &target).await? {
                bail!("Version not found: {}", version_id);
            }
            println!("Restored {} to {}", version_id, target.display());
        }
    }
    Ok(())
}
