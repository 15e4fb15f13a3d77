//! This module defines the command-line interface for the application using `clap`.
//!
//! It provides a `Cli` struct that represents the parsed command-line
//! arguments, and a `Commands` enum that represents the available subcommands
//! and their options.

use clap::{Parser, Subcommand};

/// Represents the parsed command-line arguments.
///
/// This struct is constructed by parsing the command-line arguments using
/// `clap`. It contains a `command` field that holds the parsed subcommand and
/// its options.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, propagate_version = true, color = clap::ColorChoice::Always)]
pub struct Cli {
    /// The parsed subcommand and its options.
    #[command(subcommand)]
    pub command: Commands,
}

/// Represents the available subcommands and their options.
#[derive(Subcommand, Debug)]
#[command(about, long_about = None, color = clap::ColorChoice::Always)]
pub enum Commands {
    /// Ask a single question, print the answer, and read it aloud.
    #[clap(name = "ask", alias = "a")]
    Ask {
        /// The question to be asked.
        question: String,

        /// Skip narration and only print the answer.
        #[arg(long)]
        quiet: bool,
    },

    /// Start the interactive playground (type or speak questions).
    #[clap(name = "play", alias = "p")]
    Play,

    /// Create the configuration directory and a starter `config.yaml`.
    Init,
}
