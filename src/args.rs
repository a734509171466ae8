use clap::{Parser, Subcommand};

/// Aggregates ranked ballots and prepares elections for the STV counting service.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Reads the ballot sources of a configuration and groups identical ballots.
    Aggregate {
        /// (file path) The JSON file describing the election and where to find its ballots.
        /// For more information about the file format, read the manual of the stv_ballots crate.
        #[clap(short, long, value_parser)]
        config: String,
        /// (file path, 'stdout' or empty) If specified, the summary will be written in JSON format to the given
        /// location. Setting this option overrides the output directory of the configuration.
        #[clap(short, long, value_parser)]
        out: Option<String>,
        /// (file path) A reference summary in JSON format. If provided, the computed summary must match it.
        #[clap(short, long, value_parser)]
        reference: Option<String>,
        /// (file path) If specified, the aggregated election is also written there as portable text.
        #[clap(long, value_parser)]
        snapshot_out: Option<String>,
    },
    /// Turns an election in portable text into a shareable token.
    Share {
        /// (file path) The election, in portable text.
        #[clap(short, long, value_parser)]
        input: String,
        /// (url, optional) If specified, prints a full link `<url>?data=<token>` instead of the token.
        #[clap(long, value_parser)]
        base_url: Option<String>,
    },
    /// Turns a shareable token back into portable text.
    Unshare {
        #[clap(short, long, value_parser)]
        token: String,
        /// (file path, 'stdout' or empty) Where to write the election.
        #[clap(short, long, value_parser)]
        out: Option<String>,
    },
    /// Builds the payload expected by the counting service.
    Request {
        /// (file path) The election, in portable text.
        #[clap(short, long, value_parser)]
        input: String,
        /// (default order) How ballots are encoded: 'order' (tie-groups) or 'ranks' (0-based ranks).
        #[clap(long, value_parser)]
        convention: Option<String>,
        /// (file path, 'stdout' or empty) Where to write the payload.
        #[clap(short, long, value_parser)]
        out: Option<String>,
    },
    /// Displays the outcome returned by the counting service.
    Results {
        /// (file path) The JSON response of the counting service.
        #[clap(short, long, value_parser)]
        input: String,
        /// (file path, optional) The election in portable text, when the response does not include it.
        #[clap(short, long, value_parser)]
        election: Option<String>,
        /// If passed, the elected candidates are shown as ranked seats.
        #[clap(long, takes_value = false)]
        ordered_seats: bool,
    },
}
