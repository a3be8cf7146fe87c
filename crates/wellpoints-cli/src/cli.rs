//! Command line definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "wellpoints", version, about = "Employee check-ins and rewards from the terminal")]
pub struct Cli {
    /// Backend base URL (overrides config and WELLPOINTS_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in with your registration number
    Login {
        /// Registration number (defaults to the last one used)
        #[arg(short, long)]
        registration: Option<String>,
    },

    /// Sign out and remove stored credentials
    Logout,

    /// Show whether a session is stored
    Status,

    /// Create your account (first access)
    FirstAccess,

    /// Show your profile and points balance
    Profile,

    /// Show the points statement
    Statement {
        /// all, earn or redeem
        #[arg(short, long, default_value = "all")]
        kind: String,

        /// First day to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// List partner stores
    Stores {
        /// Filter by name
        #[arg(short, long, default_value = "")]
        search: String,

        /// Category id, or "all"
        #[arg(short, long, default_value = "all")]
        category: String,
    },

    /// Show one partner store and its promotions
    Store {
        id: String,
    },

    /// Record how you feel today
    CheckIn {
        /// great, good, neutral, bad or awful
        mood: String,

        #[arg(short, long)]
        note: Option<String>,
    },
}

impl Command {
    /// Commands that only make sense with a session
    pub fn requires_session(&self) -> bool {
        !matches!(
            self,
            Command::Login { .. } | Command::Logout | Command::Status | Command::FirstAccess
        )
    }
}
