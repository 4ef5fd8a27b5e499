//! Lapor CLI - Command-line interface for reporting road damage
//!
//! Works fully offline; `lapor sync` reconciles with the remote store
//! when a connection is available.

use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::aot::Generator;
use clap_complete::{generate, shells};
use lapor_core::models::Actor;
use lapor_core::service::{NewReport, ReportEdits};
use lapor_core::sync::{HttpRemoteStore, SyncEngine, SyncProgress};
use lapor_core::{Report, ReportId, ReportService, ReportStatus};
use serde::Serialize;
use thiserror::Error;

#[derive(Parser)]
#[command(name = "lapor")]
#[command(about = "Report and track road damage from the command line")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Optional path to local database file
    #[arg(long, value_name = "PATH", global = true)]
    db_path: Option<PathBuf>,

    /// Acting user name (defaults to $LAPOR_ACTOR)
    #[arg(long, value_name = "NAME", global = true)]
    actor: Option<String>,

    /// Act with manager privileges
    #[arg(long, global = true)]
    manager: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Report new road damage
    #[command(alias = "new")]
    Add {
        /// Defect kind, e.g. pothole, crack, collapse
        kind: String,
        /// What is wrong and where exactly
        description: Vec<String>,
        /// Latitude of the damage
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude of the damage
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Damaged surface in square meters
        #[arg(long)]
        surface: Option<f64>,
        /// Severity level, 1 (cosmetic) to 10 (impassable)
        #[arg(long)]
        level: Option<u8>,
    },
    /// List recent reports
    List {
        /// Number of reports to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Filter by status: new, in_progress, done
        #[arg(long)]
        status: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one report in full
    Show {
        /// Report ID or unique ID prefix
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Move a report to a new status
    Status {
        /// Report ID or unique ID prefix
        id: String,
        /// Target status: new, in_progress, done
        status: String,
    },
    /// Edit report details
    Edit {
        /// Report ID or unique ID prefix
        id: String,
        /// New defect kind
        #[arg(long)]
        kind: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New damaged surface in square meters
        #[arg(long)]
        surface: Option<f64>,
        /// New severity level, 1 to 10
        #[arg(long)]
        level: Option<u8>,
    },
    /// Assign a contractor to a report (manager only)
    Assign {
        /// Report ID or unique ID prefix
        id: String,
        /// Contractor name, omit to unassign
        contractor: Option<String>,
    },
    /// Show or set the global repair price per square meter
    Price {
        /// New price (manager only); shows the current price when omitted
        value: Option<f64>,
    },
    /// Reconcile the local store with the remote store
    Sync {
        /// Remote endpoint (defaults to $LAPOR_REMOTE_URL)
        #[arg(long, value_name = "URL")]
        remote: Option<String>,
    },
    /// Show how many local changes await sync
    Pending,
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Core(#[from] lapor_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Report description cannot be empty")]
    EmptyDescription,
    #[error("Report ID cannot be empty")]
    EmptyReportId,
    #[error("Unknown status '{0}'; expected new, in_progress, or done")]
    UnknownStatus(String),
    #[error("Report not found for id/prefix: {0}")]
    ReportNotFound(String),
    #[error("{0}")]
    AmbiguousReportId(String),
    #[error("No remote configured. Pass --remote or set LAPOR_REMOTE_URL to enable `lapor sync`.")]
    SyncNotConfigured,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lapor=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);
    let actor = resolve_actor(cli.actor, cli.manager);
    tracing::debug!("Using database at {}", db_path.display());

    match cli.command {
        Commands::Add {
            kind,
            description,
            lat,
            lon,
            surface,
            level,
        } => run_add(&kind, &description, lat, lon, surface, level, &actor, &db_path)?,
        Commands::List {
            limit,
            status,
            json,
        } => run_list(limit, status.as_deref(), json, &db_path)?,
        Commands::Show { id, json } => run_show(&id, json, &db_path)?,
        Commands::Status { id, status } => run_status(&id, &status, &actor, &db_path)?,
        Commands::Edit {
            id,
            kind,
            description,
            surface,
            level,
        } => {
            let edits = ReportEdits {
                kind,
                description,
                surface_m2: surface,
                level,
            };
            run_edit(&id, edits, &actor, &db_path)?;
        }
        Commands::Assign { id, contractor } => run_assign(&id, contractor, &actor, &db_path)?,
        Commands::Price { value } => run_price(value, &actor, &db_path)?,
        Commands::Sync { remote } => run_sync(remote, &db_path).await?,
        Commands::Pending => run_pending(&db_path)?,
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref())?,
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_add(
    kind: &str,
    description_parts: &[String],
    latitude: f64,
    longitude: f64,
    surface_m2: Option<f64>,
    level: Option<u8>,
    actor: &Actor,
    db_path: &Path,
) -> Result<(), CliError> {
    let description = description_parts.join(" ");
    if description.trim().is_empty() {
        return Err(CliError::EmptyDescription);
    }

    let service = ReportService::open_path(db_path)?;
    let report = service.create_report(
        NewReport {
            kind: kind.to_string(),
            description,
            latitude,
            longitude,
            surface_m2,
            level,
        },
        actor,
    )?;

    println!("{}", report.id);
    Ok(())
}

#[derive(Debug, Serialize)]
struct ReportListItem {
    id: String,
    status: ReportStatus,
    kind: String,
    description: String,
    locality: Option<String>,
    budget: Option<f64>,
    reported_by: String,
    created_at: i64,
    updated_at: i64,
    relative_time: String,
}

fn run_list(
    limit: usize,
    status: Option<&str>,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let service = ReportService::open_path(db_path)?;
    let reports = if let Some(raw) = status {
        service.list_reports_by_status(parse_status(raw)?, limit, 0)?
    } else {
        service.list_reports(limit, 0)?
    };

    if as_json {
        let items = reports
            .iter()
            .map(report_to_list_item)
            .collect::<Vec<ReportListItem>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        for line in format_report_lines(&reports) {
            println!("{line}");
        }
    }

    Ok(())
}

fn run_show(id: &str, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let service = ReportService::open_path(db_path)?;
    let report = resolve_report(id, &service)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("id:          {}", report.id);
    println!("status:      {}", report.status.as_str());
    println!("kind:        {}", report.kind);
    println!("description: {}", report.description);
    println!(
        "location:    {:.5}, {:.5}",
        report.location.latitude, report.location.longitude
    );
    if let Some(locality) = &report.location.locality {
        let district = report.location.district.as_deref().unwrap_or("-");
        println!("locality:    {locality} ({district})");
    }
    if let Some(surface) = report.surface_m2 {
        println!("surface:     {surface} m2");
    }
    if let Some(level) = report.level {
        println!("level:       {level}/10");
    }
    if let Some(budget) = report.budget {
        println!("budget:      Rp {}", format_rupiah(budget));
    }
    if let Some(contractor) = &report.assigned_contractor {
        println!("contractor:  {contractor}");
    }
    println!("reported by: {}", report.reported_by);
    for change in &report.status_history {
        println!(
            "  {} -> {} by {} ({})",
            change.previous_status.as_str(),
            change.new_status.as_str(),
            change.changed_by,
            format_relative_time(change.changed_at, Utc::now().timestamp_millis()),
        );
    }
    for image in &report.images {
        println!("  image: {}", image.url);
    }

    Ok(())
}

fn run_status(id: &str, status: &str, actor: &Actor, db_path: &Path) -> Result<(), CliError> {
    let new_status = parse_status(status)?;
    let service = ReportService::open_path(db_path)?;
    let report = resolve_report(id, &service)?;

    let updated = service.change_status(&report.id, new_status, actor)?;
    println!("{} {}", updated.id, updated.status.as_str());
    Ok(())
}

fn run_edit(id: &str, edits: ReportEdits, actor: &Actor, db_path: &Path) -> Result<(), CliError> {
    let service = ReportService::open_path(db_path)?;
    let report = resolve_report(id, &service)?;

    let updated = service.update_details(&report.id, edits, actor)?;
    println!("{}", updated.id);
    Ok(())
}

fn run_assign(
    id: &str,
    contractor: Option<String>,
    actor: &Actor,
    db_path: &Path,
) -> Result<(), CliError> {
    let service = ReportService::open_path(db_path)?;
    let report = resolve_report(id, &service)?;

    let updated = service.assign_contractor(&report.id, contractor, actor)?;
    match &updated.assigned_contractor {
        Some(name) => println!("{} assigned to {name}", updated.id),
        None => println!("{} unassigned", updated.id),
    }
    Ok(())
}

fn run_price(value: Option<f64>, actor: &Actor, db_path: &Path) -> Result<(), CliError> {
    let service = ReportService::open_path(db_path)?;

    match value {
        Some(price) => {
            let changed = service.set_price_per_m2(price, actor)?;
            println!(
                "Price set to Rp {}; {changed} budget(s) re-derived",
                format_rupiah(price)
            );
        }
        None => match service.price_per_m2()? {
            Some(price) => println!("Rp {}", format_rupiah(price)),
            None => println!("No price configured"),
        },
    }
    Ok(())
}

async fn run_sync(remote: Option<String>, db_path: &Path) -> Result<(), CliError> {
    let endpoint = remote
        .or_else(|| env::var("LAPOR_REMOTE_URL").ok())
        .filter(|url| !url.trim().is_empty())
        .ok_or(CliError::SyncNotConfigured)?;

    let service = ReportService::open_path(db_path)?;
    let remote_store = HttpRemoteStore::new(endpoint)?;
    let engine =
        SyncEngine::new(service.database(), remote_store).with_progress(|progress| {
            match progress {
                SyncProgress::Pushed(id) => println!("pushed {id}"),
                SyncProgress::PushFailed(id) => println!("push failed {id}"),
                SyncProgress::Pulled(id) => println!("pulled {id}"),
            }
        });

    let run = engine.full_sync().await?;

    if run.status == lapor_core::models::SyncRunStatus::Offline {
        let reason = run.first_error.as_deref().unwrap_or("remote unreachable");
        println!("Offline, nothing synced ({reason})");
        return Ok(());
    }

    println!(
        "Sync completed: {} pushed, {} pulled, {} skipped, {} failed",
        run.pushed, run.pulled, run.skipped, run.failed
    );
    for record_error in &run.record_errors {
        eprintln!("  {}: {}", record_error.report_id, record_error.message);
    }
    println!("{} pending", service.pending_count()?);
    Ok(())
}

fn run_pending(db_path: &Path) -> Result<(), CliError> {
    let service = ReportService::open_path(db_path)?;
    let count = service.pending_count()?;
    println!("{count}");
    Ok(())
}

fn run_completions(shell: CompletionShell, output_path: Option<&Path>) -> Result<(), CliError> {
    let mut command = Cli::command();
    let mut buffer = Vec::new();

    match shell {
        CompletionShell::Bash => generate_for_shell(shells::Bash, &mut command, &mut buffer),
        CompletionShell::Zsh => generate_for_shell(shells::Zsh, &mut command, &mut buffer),
        CompletionShell::Fish => generate_for_shell(shells::Fish, &mut command, &mut buffer),
    }

    if let Some(path) = output_path {
        std::fs::write(path, &buffer)?;
        println!("{}", path.display());
    } else {
        io::stdout().write_all(&buffer)?;
    }

    Ok(())
}

fn generate_for_shell<G: Generator>(
    generator: G,
    command: &mut clap::Command,
    buffer: &mut Vec<u8>,
) {
    generate(generator, command, "lapor", buffer);
}

fn resolve_report(report_query: &str, service: &ReportService) -> Result<Report, CliError> {
    let trimmed = report_query.trim();
    if trimmed.is_empty() {
        return Err(CliError::EmptyReportId);
    }

    if let Ok(report_id) = trimmed.parse::<ReportId>() {
        if let Some(report) = service.get_report(&report_id)? {
            return Ok(report);
        }
    }

    let matching_ids = service.find_ids_by_prefix(trimmed, 3)?;
    match matching_ids.len() {
        0 => Err(CliError::ReportNotFound(trimmed.to_string())),
        1 => service
            .get_report(&matching_ids[0])?
            .ok_or_else(|| CliError::ReportNotFound(trimmed.to_string())),
        _ => {
            let options = matching_ids
                .iter()
                .map(|id| short_id(&id.to_string()))
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousReportId(format!(
                "ID prefix '{trimmed}' is ambiguous; matches: {options}"
            )))
        }
    }
}

fn parse_status(raw: &str) -> Result<ReportStatus, CliError> {
    raw.trim()
        .parse::<ReportStatus>()
        .map_err(|_| CliError::UnknownStatus(raw.to_string()))
}

fn format_report_lines(reports: &[Report]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    reports
        .iter()
        .map(|report| {
            let id = short_id(&report.id.to_string());
            let status = report.status.as_str();
            let place = report
                .location
                .locality
                .as_deref()
                .unwrap_or("unknown area");
            let preview = report_preview(report, 36);
            let relative_time = format_relative_time(report.updated_at, now_ms);

            format!("{id:<8}  {status:<11}  {place:<16}  {preview:<36}  {relative_time}")
        })
        .collect()
}

fn report_to_list_item(report: &Report) -> ReportListItem {
    let now_ms = Utc::now().timestamp_millis();

    ReportListItem {
        id: report.id.to_string(),
        status: report.status,
        kind: report.kind.clone(),
        description: report.description.clone(),
        locality: report.location.locality.clone(),
        budget: report.budget,
        reported_by: report.reported_by.clone(),
        created_at: report.created_at,
        updated_at: report.updated_at,
        relative_time: format_relative_time(report.updated_at, now_ms),
    }
}

fn report_preview(report: &Report, max_chars: usize) -> String {
    let text = format!("{}: {}", report.kind, report.description);
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

/// Group digits Indonesian style: 1500000.0 -> "1.500.000"
fn format_rupiah(amount: f64) -> String {
    let whole = amount.round().abs() as u64;
    let digits = whole.to_string();
    let mut grouped = String::new();
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    if amount < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

fn resolve_actor(name: Option<String>, manager: bool) -> Actor {
    let name = name
        .or_else(|| env::var("LAPOR_ACTOR").ok())
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "anonymous".to_string());

    if manager {
        Actor::manager(name)
    } else {
        Actor::citizen(name)
    }
}

fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("LAPOR_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lapor")
        .join("lapor.db")
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    use lapor_core::models::Actor;
    use lapor_core::service::NewReport;
    use lapor_core::{ReportService, ReportStatus};

    use super::{
        format_relative_time, format_rupiah, parse_status, report_preview, resolve_actor,
        resolve_report, run_completions, run_status, CliError, CompletionShell,
    };

    fn sample_new(description: &str) -> NewReport {
        NewReport {
            kind: "pothole".to_string(),
            description: description.to_string(),
            latitude: -6.9175,
            longitude: 107.6098,
            surface_m2: Some(12.0),
            level: Some(3),
        }
    }

    #[test]
    fn parse_status_accepts_known_values_and_trims() {
        assert_eq!(parse_status("new").unwrap(), ReportStatus::New);
        assert_eq!(
            parse_status(" in_progress ").unwrap(),
            ReportStatus::InProgress
        );
        assert_eq!(parse_status("done").unwrap(), ReportStatus::Done);
        assert!(matches!(
            parse_status("fixed"),
            Err(CliError::UnknownStatus(_))
        ));
    }

    #[test]
    fn resolve_actor_falls_back_to_anonymous_citizen() {
        let actor = resolve_actor(Some("  ".to_string()), false);
        assert_eq!(actor.name, "anonymous");
        assert!(!actor.is_manager());

        let manager = resolve_actor(Some("ibu kadis".to_string()), true);
        assert_eq!(manager.name, "ibu kadis");
        assert!(manager.is_manager());
    }

    #[test]
    fn format_rupiah_groups_thousands() {
        assert_eq!(format_rupiah(0.0), "0");
        assert_eq!(format_rupiah(1500.0), "1.500");
        assert_eq!(format_rupiah(12_500_000.0), "12.500.000");
        assert_eq!(format_rupiah(-7000.0), "-7.000");
    }

    #[test]
    fn format_relative_time_units() {
        let now = 10_000_000;
        assert_eq!(format_relative_time(now - 30_000, now), "just now");
        assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
        assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
    }

    #[test]
    fn report_preview_truncates_with_ellipsis() {
        let service = ReportService::open_in_memory().unwrap();
        let report = service
            .create_report(
                sample_new("a very long description of a very deep hole in the road"),
                &Actor::citizen("budi"),
            )
            .unwrap();

        let preview = report_preview(&report, 20);
        assert_eq!(preview.chars().count(), 20);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn resolve_report_supports_exact_and_prefix_id() {
        let db_path = unique_test_db_path();
        let service = ReportService::open_path(&db_path).unwrap();
        let citizen = Actor::citizen("budi");

        let first = service.create_report(sample_new("first"), &citizen).unwrap();
        let second = service
            .create_report(sample_new("second"), &citizen)
            .unwrap();

        let by_exact = resolve_report(&first.id.to_string(), &service).unwrap();
        assert_eq!(by_exact.description, "first");

        // UUID v7 ids share a timestamp prefix, so take a prefix long
        // enough to be unique between the two
        let full = second.id.to_string();
        let mut prefix_len = 8;
        while first.id.to_string().starts_with(&full[..prefix_len]) {
            prefix_len += 1;
        }
        let by_prefix = resolve_report(&full[..prefix_len], &service).unwrap();
        assert_eq!(by_prefix.description, "second");

        cleanup_db_files(&db_path);
    }

    #[test]
    fn resolve_report_rejects_empty_missing_and_ambiguous() {
        let db_path = unique_test_db_path();
        let service = ReportService::open_path(&db_path).unwrap();
        let citizen = Actor::citizen("budi");

        service.create_report(sample_new("one"), &citizen).unwrap();
        service.create_report(sample_new("two"), &citizen).unwrap();

        assert!(matches!(
            resolve_report("  ", &service),
            Err(CliError::EmptyReportId)
        ));
        assert!(matches!(
            resolve_report("ffffffff", &service),
            Err(CliError::ReportNotFound(_))
        ));
        // Both v7 ids start with the same millisecond timestamp digits
        let shared = service
            .list_reports(1, 0)
            .unwrap()
            .remove(0)
            .id
            .to_string()
            .chars()
            .take(4)
            .collect::<String>();
        assert!(matches!(
            resolve_report(&shared, &service),
            Err(CliError::AmbiguousReportId(_))
        ));

        cleanup_db_files(&db_path);
    }

    #[test]
    fn run_status_moves_report_through_lifecycle() {
        let db_path = unique_test_db_path();
        let service = ReportService::open_path(&db_path).unwrap();
        let report = service
            .create_report(sample_new("lifecycle"), &Actor::citizen("budi"))
            .unwrap();
        drop(service);

        run_status(
            &report.id.to_string(),
            "in_progress",
            &Actor::manager("ibu kadis"),
            &db_path,
        )
        .unwrap();

        let service = ReportService::open_path(&db_path).unwrap();
        let updated = service.get_report(&report.id).unwrap().unwrap();
        assert_eq!(updated.status, ReportStatus::InProgress);
        assert!(updated.started_at.is_some());

        cleanup_db_files(&db_path);
    }

    #[test]
    fn run_completions_writes_bash_script_file() {
        let output_path = std::env::temp_dir().join(format!(
            "lapor-completions-test-{}.bash",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |duration| duration.as_nanos())
        ));

        run_completions(CompletionShell::Bash, Some(&output_path)).unwrap();

        let script = std::fs::read_to_string(&output_path).unwrap();
        assert!(script.contains("_lapor()"));
        assert!(script.contains("complete -F _lapor"));

        let _ = std::fs::remove_file(output_path);
    }

    fn unique_test_db_path() -> PathBuf {
        static NEXT_TEST_DB_ID: AtomicU64 = AtomicU64::new(0);

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| duration.as_nanos());
        let sequence = NEXT_TEST_DB_ID.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("lapor-cli-test-{timestamp}-{sequence}.db"))
    }

    fn cleanup_db_files(path: &PathBuf) {
        let _ = std::fs::remove_file(path);
        let _ = std::fs::remove_file(path.with_extension("db-shm"));
        let _ = std::fs::remove_file(path.with_extension("db-wal"));
    }
}
