//! Run listing and health commands

use anyhow::Result;
use colored::*;
use sitewright_client::SiteClient;
use sitewright_core::domain::job::{JobState, RunSummary};

pub async fn list_jobs(client: &SiteClient) -> Result<()> {
    let runs = client.list_jobs().await?;

    if runs.is_empty() {
        println!("{}", "No runs found.".yellow());
    } else {
        println!("{}", format!("Found {} run(s):", runs.len()).bold());
        println!();
        for run in runs {
            print_run_summary(&run);
        }
    }

    Ok(())
}

pub async fn health(client: &SiteClient) -> Result<()> {
    client.health().await?;
    println!("{} {} is up", "✓".green(), client.base_url());
    Ok(())
}

fn print_run_summary(run: &RunSummary) {
    println!(
        "  {} {} {}",
        "▸".cyan(),
        run.job_id.as_str().bold(),
        run.run_id.to_string().dimmed()
    );
    println!("    Business: {}", run.business_name);
    println!("    State:    {}", colorize_state(run.state));
    println!(
        "    Accepted: {}",
        run.accepted_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    if let (Some(started), Some(finished)) = (run.started_at, run.finished_at) {
        let seconds = finished.signed_duration_since(started).num_seconds();
        println!("    Duration: {}s", seconds);
    }
    println!();
}

fn colorize_state(state: JobState) -> ColoredString {
    let label = state.to_string();
    match state {
        JobState::Accepted => label.yellow(),
        JobState::Running => label.cyan(),
        JobState::Succeeded => label.green(),
        JobState::Failed | JobState::TimedOut | JobState::Errored => label.red(),
    }
}
