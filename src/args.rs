//! These structs provide the CLI interface for the splitsheet CLI.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// splitsheet: a command-line tracker for expenses shared by two people.
///
/// Expenses live in a Google Sheet that both people can see. splitsheet
/// mirrors the sheet locally so everything keeps working without a network
/// connection: adds and deletes made offline are queued and reconciled the
/// next time the sheet is reachable, and reports are served from the local
/// cache. The sheet is authoritative whenever it can be reached.
///
/// Set SPLITSHEET_IN_TEST_MODE to run against an in-memory ledger instead of
/// Google Sheets, and SPLITSHEET_OFFLINE to force offline behavior.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where splitsheet data and configuration is held.
    /// Defaults to ~/splitsheet
    #[arg(long, env = "SPLITSHEET_HOME")]
    home: Option<PathBuf>,
}

impl Common {
    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    /// The data directory, falling back to `~/splitsheet`.
    pub fn home(&self) -> PathBuf {
        self.home.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("splitsheet")
        })
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration file.
    ///
    /// Run this once before anything else. You need the URL of the Google
    /// Sheet that holds (or will hold) the shared ledger, and the two
    /// participant names exactly as they should appear in the WhoPaid
    /// column.
    Init(InitArgs),

    /// Manage the stored Google API bearer token.
    Auth(AuthArgs),

    /// Add an expense.
    ///
    /// The expense is always visible locally right away. If the sheet is
    /// reachable it is appended remotely; otherwise it is queued and synced
    /// on the next refresh.
    Add(Box<AddArgs>),

    /// Delete an expense by its row position (see 'list'), or a pending one.
    Delete(DeleteArgs),

    /// List expenses for a month.
    List(ListArgs),

    /// Show the dashboard: totals, breakdowns and the recent monthly trend.
    Report,

    /// Show who owes whom.
    Balance,

    /// Record a settlement entry that clears the current balance.
    Settle,

    /// Manage recurring expense rules.
    Recurring(RecurringArgs),

    /// Drain the offline queue against the sheet and reload.
    Refresh,

    /// Show sync status, queue depths and authorization state.
    Status,
}

#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The URL of your Google Sheet. It looks like this:
    /// https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    #[arg(long)]
    pub sheet_url: String,

    /// The ledger tab within the sheet. Columns are
    /// Date, Amount, WhoPaid, Category, Notes, with one header row.
    #[arg(long, default_value = "Expenses")]
    pub tab: String,

    /// The two participant names, e.g. --participants Gigi Luke
    #[arg(long, num_args = 2, value_names = ["FIRST", "SECOND"])]
    pub participants: Vec<String>,
}

#[derive(Debug, Parser, Clone)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum AuthSubcommand {
    /// Store a bearer token obtained from the Google OAuth playground or
    /// another OAuth client authorized for the spreadsheets scope.
    Login(LoginArgs),
    /// Show whether a token is stored and when it expires.
    Status,
    /// Discard the stored token.
    Signout,
}

#[derive(Debug, Parser, Clone)]
pub struct LoginArgs {
    /// The OAuth access token.
    #[arg(long)]
    pub token: String,

    /// Seconds until the token expires.
    #[arg(long, default_value_t = 3600)]
    pub expires_in: u32,
}

#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    /// The amount, e.g. 12.50. Must not be negative.
    #[arg(long)]
    pub amount: String,

    /// Who paid. One of the two configured participants.
    #[arg(long)]
    pub payer: String,

    /// One of: Utilities, Grocery/Toiletry, House Items, Other
    #[arg(long)]
    pub category: String,

    /// The expense date as YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    pub date: Option<String>,

    /// A short description. The sheet has no Description column, so this is
    /// prepended to the notes.
    #[arg(long)]
    pub description: Option<String>,

    /// Free-text notes.
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    /// The row position of the expense to delete, as shown by 'list'.
    #[arg(long, conflicts_with = "pending")]
    pub row: Option<u32>,

    /// Delete a not-yet-synced (pending) expense instead.
    #[arg(long)]
    pub pending: bool,
}

#[derive(Debug, Parser, Clone)]
pub struct ListArgs {
    /// The month to list, as YYYY-MM. Defaults to the current month.
    #[arg(long)]
    pub month: Option<String>,

    /// Sort order for the listing.
    #[arg(long, value_enum, default_value = "date")]
    pub sort: SortBy,

    /// List settlement history instead of spending.
    #[arg(long)]
    pub settlements: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortBy {
    /// Newest first.
    Date,
    /// By category, then newest first.
    Category,
}

#[derive(Debug, Parser, Clone)]
pub struct RecurringArgs {
    #[command(subcommand)]
    pub command: RecurringSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum RecurringSubcommand {
    /// Create a recurring expense rule.
    Add(Box<RecurringAddArgs>),
    /// List the recurring rules and their next occurrences.
    List,
    /// Delete a recurring rule by id.
    Delete(RecurringDeleteArgs),
    /// Generate any elapsed occurrences now. This also happens on 'refresh'.
    Run,
}

#[derive(Debug, Parser, Clone)]
pub struct RecurringAddArgs {
    /// What the rule is for, e.g. "Internet bill". Becomes the notes of each
    /// generated expense.
    #[arg(long)]
    pub description: String,

    /// The amount of each occurrence.
    #[arg(long)]
    pub amount: String,

    /// Who pays. One of the two configured participants.
    #[arg(long)]
    pub payer: String,

    /// One of: Utilities, Grocery/Toiletry, House Items, Other
    #[arg(long)]
    pub category: String,

    /// One of: weekly, biweekly, monthly
    #[arg(long)]
    pub frequency: String,

    /// The start date as YYYY-MM-DD; the first occurrence lands one period
    /// later. Defaults to today.
    #[arg(long)]
    pub start: Option<String>,

    /// An optional end date as YYYY-MM-DD. Omit to run until deleted.
    #[arg(long)]
    pub end: Option<String>,
}

#[derive(Debug, Parser, Clone)]
pub struct RecurringDeleteArgs {
    /// The rule id, as shown by 'recurring list'.
    pub id: String,
}
