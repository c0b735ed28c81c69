use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use founder_links::config::Settings;
use founder_links::db::{parse_records, Database};
use founder_links::models::{Entry, OutreachStatus, RawEntry};
use founder_links::{choose_links, ClassifiedLinks, Denylist, LinkContext};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "founder-links")]
#[command(about = "Classify and sanity-check links on scraped founder listings, and track outreach")]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Extra blocked pattern for this run (repeatable)
    #[arg(long = "block", global = true)]
    block: Vec<String>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Import scraped records from a JSON file ("-" for stdin)
    Import {
        /// JSON array of records, or a single record
        file: String,
    },

    /// List saved entries with live/missing link badges
    List {
        /// Filter by outreach status
        #[arg(short, long, value_enum)]
        status: Option<OutreachStatus>,

        /// Filter by company name (substring)
        #[arg(short, long)]
        company: Option<String>,
    },

    /// Show the classified links of an entry
    Show {
        /// Entry ID
        id: i64,
    },

    /// Move an entry to another outreach stage
    Status {
        /// Entry ID
        id: i64,

        #[arg(value_enum)]
        status: OutreachStatus,

        /// Note stored with the change
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Set or clear the free-form notes on an entry
    Note {
        /// Entry ID
        id: i64,

        /// New notes; omit to clear
        text: Option<String>,
    },

    /// Classify records without storing them, printing JSON
    Classify {
        /// JSON array of records, or a single record ("-" for stdin)
        file: String,

        /// Drop links that fail the denylist
        #[arg(long)]
        actionable: bool,
    },

    /// Check whether a single URL is worth showing
    Check {
        url: String,

        /// Field the URL came from (only affects logging)
        #[arg(short, long, value_enum, default_value = "unknown")]
        context: LinkContext,
    },

    /// Print the effective blocked patterns
    Denylist,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_input(file: &str) -> Result<String> {
    if file == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file))
    }
}

fn open_db(settings: &Settings) -> Result<Database> {
    match &settings.database {
        Some(path) => Database::open_at(path),
        None => Database::open(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(path.as_path())),
        None => Settings::load(),
    }
    .context("Failed to load configuration")?;
    tracing::debug!(?settings, "configuration loaded");

    let denylist = settings.denylist();
    for pattern in &cli.block {
        denylist.add_blocked_pattern(pattern);
    }

    match cli.command {
        Commands::Init => {
            let db = open_db(&settings)?;
            db.init()?;
            println!("Database initialized at {}", db.path().display());
        }

        Commands::Import { file } => {
            let db = open_db(&settings)?;
            db.ensure_initialized()?;
            let records = parse_records(&read_input(&file)?)?;
            let stats = db.import_records(&records)?;

            println!("Records found: {}", stats.records_found);
            println!("Entries added: {}", stats.entries_added);
            if stats.duplicates > 0 {
                println!("Duplicates:    {}", stats.duplicates);
            }
            if stats.errors > 0 {
                println!("Errors:        {}", stats.errors);
            }
        }

        Commands::List { status, company } => {
            let db = open_db(&settings)?;
            db.ensure_initialized()?;
            let entries = db.list_entries(status, company.as_deref())?;
            if entries.is_empty() {
                println!("No entries found.");
            } else {
                let now = chrono::Utc::now().naive_utc();
                println!(
                    "{:<6} {:<13} {:<24} {:<4} {:<4} {:<4} {:<4} {:<4} {:>9}",
                    "ID", "STATUS", "COMPANY", "LI", "APP", "JOBS", "SITE", "MAIL", "AGE"
                );
                println!("{}", "-".repeat(82));
                for entry in entries {
                    let links = denylist.actionable(&choose_links(&entry.raw), settings.log_results);
                    println!(
                        "{:<6} {:<13} {:<24} {:<4} {:<4} {:<4} {:<4} {:<4} {:>9}",
                        entry.id,
                        entry.status,
                        truncate(entry.company.as_deref().unwrap_or("-"), 22),
                        badge(&links.linkedin_url),
                        badge(&links.apply_url),
                        badge(&links.roles_url),
                        badge(&links.company_url),
                        badge(&links.email),
                        entry.age_label(now)
                    );
                }
            }
        }

        Commands::Show { id } => {
            let db = open_db(&settings)?;
            db.ensure_initialized()?;
            match db.get_entry(id)? {
                Some(entry) => print_entry(&db, &entry, &denylist)?,
                None => println!("Entry #{} not found.", id),
            }
        }

        Commands::Status { id, status, note } => {
            let db = open_db(&settings)?;
            db.ensure_initialized()?;
            if !db.set_status(id, status, note.as_deref())? {
                return Err(anyhow!("Entry #{} not found", id));
            }
            println!("Moved #{} to {}.", id, status);
        }

        Commands::Note { id, text } => {
            let db = open_db(&settings)?;
            db.ensure_initialized()?;
            if !db.set_notes(id, text.as_deref())? {
                return Err(anyhow!("Entry #{} not found", id));
            }
            println!("Updated notes on #{}.", id);
        }

        Commands::Classify { file, actionable } => {
            let records = parse_records(&read_input(&file)?)?;
            let mut out = Vec::with_capacity(records.len());
            for (index, record) in records.into_iter().enumerate() {
                let raw: RawEntry = match serde_json::from_value(record) {
                    Ok(raw) => raw,
                    Err(e) => {
                        tracing::warn!(index, error = %e, "skipping record");
                        continue;
                    }
                };
                let links = choose_links(&raw);
                out.push(if actionable {
                    denylist.actionable(&links, settings.log_results)
                } else {
                    links
                });
            }
            println!("{}", serde_json::to_string_pretty(&out)?);
        }

        Commands::Check { url, context } => {
            let verdict = denylist.validate_url_with_details(Some(url.as_str()), context);
            if verdict.is_valid {
                println!("OK       {}", verdict.original_url);
            } else {
                let reason = verdict
                    .reason
                    .map(|r| r.to_string())
                    .unwrap_or_default();
                println!("REJECTED {} ({})", verdict.original_url, reason);
            }
        }

        Commands::Denylist => {
            for pattern in denylist.blocked_patterns() {
                println!("{}", pattern);
            }
        }
    }

    Ok(())
}

fn print_entry(db: &Database, entry: &Entry, denylist: &Denylist) -> Result<()> {
    println!("Entry #{}", entry.id);
    if let Some(company) = &entry.company {
        println!("Company: {}", company);
    }
    println!("Status: {}", entry.status);
    if let Some(notes) = &entry.notes {
        println!("Notes: {}", notes);
    }
    println!("Created: {}", entry.created_at);

    let links: ClassifiedLinks = choose_links(&entry.raw);
    println!("\n--- Links ---");
    let slots = [
        ("LinkedIn", &links.linkedin_url, LinkContext::LinkedinUrl),
        ("Apply", &links.apply_url, LinkContext::ApplyUrl),
        ("Roles", &links.roles_url, LinkContext::CareersUrl),
        ("Company", &links.company_url, LinkContext::CompanyUrl),
    ];
    for (label, url, context) in slots {
        match url {
            Some(url) => {
                let verdict = denylist.validate_url_with_details(Some(url.as_str()), context);
                match verdict.reason {
                    None => println!("{:<9} {}", label, url),
                    Some(reason) => println!("{:<9} {} (hidden: {})", label, url, reason),
                }
            }
            None => println!("{:<9} missing", label),
        }
    }
    match &links.email_href {
        Some(href) => println!("{:<9} {}", "Email", href),
        None => println!("{:<9} missing", "Email"),
    }

    let history = db.status_history(entry.id)?;
    if !history.is_empty() {
        println!("\n--- History ---");
        for change in history {
            match &change.note {
                Some(note) => println!("  {}  {:<13} {}", change.changed_at, change.status, note),
                None => println!("  {}  {}", change.changed_at, change.status),
            }
        }
    }
    Ok(())
}

fn badge(value: &Option<String>) -> &'static str {
    if value.is_some() { "✓" } else { "-" }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
