use crate::application::{Backend, Config, JournalApp, init_logging};
use crate::domain::{DateRange, GroupBy, Period};
use crate::entities::{Category, EntryDraft, EntryPatch};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "wawata")]
#[command(about = "A journal of volunteer weed-control hours")]
#[command(version)]
pub struct Cli {
    /// Storage backend (overrides WAWATA_BACKEND)
    #[arg(long, global = true, value_enum)]
    pub backend: Option<Backend>,

    /// Data directory (overrides WAWATA_DIR)
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log hours worked
    Log {
        /// Day worked (YYYY-MM-DD format, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
        #[arg(short, long)]
        person: String,
        #[arg(short, long)]
        site: String,
        #[arg(long)]
        species: String,
        #[arg(long)]
        hours: f64,
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Change fields of an existing entry
    Edit {
        id: String,
        #[arg(short, long)]
        date: Option<String>,
        #[arg(short, long)]
        person: Option<String>,
        #[arg(short, long)]
        site: Option<String>,
        #[arg(long)]
        species: Option<String>,
        #[arg(long)]
        hours: Option<f64>,
        #[arg(short, long, conflicts_with = "clear_notes")]
        notes: Option<String>,
        /// Remove the entry's notes
        #[arg(long)]
        clear_notes: bool,
    },
    /// Delete an entry
    Rm { id: String },
    /// List entries, optionally only one day's
    List {
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Show the Sunday-to-Saturday week around a date
    Week {
        /// Specific date to focus on (YYYY-MM-DD format, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Show a calendar month
    Month {
        /// YYYY-MM, defaults to the current month
        #[arg(short, long)]
        month: Option<String>,
    },
    /// Manage the people list
    People {
        #[command(subcommand)]
        action: Option<ReferenceAction>,
    },
    /// Manage the sites list
    Sites {
        #[command(subcommand)]
        action: Option<ReferenceAction>,
    },
    /// Manage the species list
    Species {
        #[command(subcommand)]
        action: Option<ReferenceAction>,
    },
    /// Hours by species and by site
    Report {
        #[arg(short, long, value_enum, default_value_t = Period::Week)]
        period: Period,
        /// Show a single table grouped by this field
        #[arg(short, long, value_enum)]
        by: Option<GroupBy>,
    },
}

#[derive(Subcommand)]
pub enum ReferenceAction {
    /// Show the list
    List,
    /// Add a name (no-op when already listed)
    Add { name: String },
    /// Remove by name or id
    Rm { name: String },
}

impl Cli {
    pub fn run() -> Result<()> {
        let cli = Self::parse();

        let mut config = Config::from_env()?;
        if let Some(backend) = cli.backend {
            config.backend = backend;
        }
        if let Some(dir) = cli.dir.clone() {
            config.journal_dir = dir;
        }

        let _logger = init_logging(&config, cli.verbose)?;
        let mut app = JournalApp::new(config);

        println!("{}", cli.execute(&mut app)?);
        Ok(())
    }

    /// Runs the parsed command against `app` and returns what to print.
    pub fn execute(self, app: &mut JournalApp) -> Result<String> {
        let Some(command) = self.command else {
            // Default: this week
            return Ok(app.show_range(&DateRange::week_of(app.today())));
        };

        match command {
            Commands::Log {
                date,
                person,
                site,
                species,
                hours,
                notes,
            } => {
                let date = app.parse_date(date.as_deref())?;
                let mut draft = EntryDraft::new(date, person, site, species, hours);
                if let Some(notes) = notes {
                    draft = draft.with_notes(notes);
                }
                app.log_entry(draft)
            }
            Commands::Edit {
                id,
                date,
                person,
                site,
                species,
                hours,
                notes,
                clear_notes,
            } => {
                let mut patch = EntryPatch::new();
                if let Some(date) = date {
                    patch = patch.date(app.parse_date(Some(&date))?);
                }
                if let Some(person) = person {
                    patch = patch.person(person);
                }
                if let Some(site) = site {
                    patch = patch.site(site);
                }
                if let Some(species) = species {
                    patch = patch.species(species);
                }
                if let Some(hours) = hours {
                    patch = patch.hours(hours);
                }
                if clear_notes {
                    patch = patch.notes(None);
                } else if let Some(notes) = notes {
                    patch = patch.notes(Some(notes));
                }
                app.edit_entry(&id, patch)
            }
            Commands::Rm { id } => app.delete_entry(&id),
            Commands::List { date } => {
                let date = date.as_deref().map(|raw| app.parse_date(Some(raw))).transpose()?;
                Ok(app.list_entries(date))
            }
            Commands::Week { date } => {
                let date = app.parse_date(date.as_deref())?;
                Ok(app.show_range(&DateRange::week_of(date)))
            }
            Commands::Month { month } => {
                let range = app.parse_month(month.as_deref())?;
                Ok(app.show_range(&range))
            }
            Commands::People { action } => run_reference_action(app, Category::People, action),
            Commands::Sites { action } => run_reference_action(app, Category::Sites, action),
            Commands::Species { action } => run_reference_action(app, Category::Species, action),
            Commands::Report { period, by } => Ok(app.report(period, by)),
        }
    }
}

fn run_reference_action(
    app: &mut JournalApp,
    category: Category,
    action: Option<ReferenceAction>,
) -> Result<String> {
    match action.unwrap_or(ReferenceAction::List) {
        ReferenceAction::List => Ok(app.list_references(category)),
        ReferenceAction::Add { name } => app.add_reference(category, &name),
        ReferenceAction::Rm { name } => app.remove_reference(category, &name),
    }
}
