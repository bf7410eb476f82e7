//! Build submission and build-log commands

use anyhow::{Context, Result, bail};
use colored::*;
use sitewright_client::SiteClient;
use sitewright_core::domain::build_log::{BuildStats, BuildStatus};
use sitewright_core::domain::job::JobId;
use sitewright_core::domain::request::BuildRequest;
use sitewright_core::dto::site::BuildLogResponse;
use std::time::Duration;

pub async fn submit(client: &SiteClient, req: BuildRequest) -> Result<()> {
    let ack = client
        .submit(&req)
        .await
        .context("Failed to submit build")?;

    println!("{} {}", "✓".green(), ack.message);
    println!("  Slug:     {}", ack.site_slug.as_str().cyan());
    if let Some(url) = &ack.site_url {
        println!("  Site URL: {}", url);
    }
    println!(
        "{}",
        format!("  Follow with: sitewright watch {}", ack.site_slug).dimmed()
    );

    Ok(())
}

pub async fn show_log(client: &SiteClient, slug: &str, lines: usize) -> Result<()> {
    let job_id = JobId::parse(slug)?;
    let log = client.build_log(&job_id, lines).await?;

    print_build_log(&log);

    Ok(())
}

/// Polls the build log until the build finishes
///
/// Exits with an error when the build failed. A log that does not exist yet
/// is treated as a build that has not started.
pub async fn watch(client: &SiteClient, slug: &str, interval: u64, lines: usize) -> Result<()> {
    let job_id = JobId::parse(slug)?;
    let interval = Duration::from_secs(interval.max(1));

    loop {
        match client.build_log(&job_id, lines).await {
            Ok(log) => {
                print_build_log(&log);
                match log.build_status {
                    BuildStatus::Complete => return Ok(()),
                    BuildStatus::Failed => bail!("Build {} failed", job_id),
                    BuildStatus::InProgress => {}
                }
            }
            Err(e) if e.is_not_found() => {
                println!("{}", "Waiting for the build to start...".yellow());
            }
            Err(e) => return Err(e.into()),
        }

        tokio::time::sleep(interval).await;
    }
}

fn print_build_log(log: &BuildLogResponse) {
    println!(
        "{} {}  {}",
        "▸".cyan(),
        log.slug.as_str().bold(),
        colorize_status(log.build_status)
    );

    print_stats(&log.stats);

    if !log.log.is_empty() {
        println!("{}", "─".repeat(80).dimmed());
        println!("{}", log.log.trim_end());
        println!("{}", "─".repeat(80).dimmed());
    }
}

fn print_stats(stats: &BuildStats) {
    if stats.is_empty() {
        return;
    }

    if let Some(mode) = &stats.mode {
        println!("  Mode:       {}", mode);
    }
    if let (Some(generated), Some(total)) = (stats.images_generated, stats.images_total) {
        println!("  Images:     {}/{}", generated, total);
    }
    if let Some(failed) = stats.images_failed.filter(|n| *n > 0) {
        println!("  Failed:     {}", failed.to_string().red());
    }
    if let Some(cost) = stats.estimated_cost_usd {
        println!("  Cost:       ~${:.3}", cost);
    }
    if let Some(size) = &stats.total_size {
        println!("  Size:       {}", size);
    }
    if let Some(time) = &stats.total_time {
        println!("  Time:       {}", time);
    }
    if let Some(url) = &stats.site_url {
        println!("  Site:       {}", url.green());
    }
}

fn colorize_status(status: BuildStatus) -> ColoredString {
    let label = status.to_string();
    match status {
        BuildStatus::InProgress => label.yellow(),
        BuildStatus::Complete => label.green(),
        BuildStatus::Failed => label.red(),
    }
}
