use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use xpload::consts::{DEFAULT_TAG_STATUS, DEFAULT_TAG_TYPE};
use xpload::remote::Component;

use super::util::{existing_file, non_empty};

/// Stage and push tags and payload intervals to the conditions catalog
#[derive(Parser, Debug)]
#[command(name = "xpload", version, about = "Manipulate payload entries")]
pub struct Cli {
    /// Config name (looked up in $XPLOAD_CONFIG_DIR or ./, ./config) or a path to a JSON config
    #[arg(short = 'c', long, default_value = "")]
    pub config: String,
    /// Dump response as JSON instead of pretty printing it
    #[arg(short = 'd', long, default_value_t = false)]
    pub dump: bool,
    /// More logging (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Show catalog entries
    Show {
        #[arg(value_enum)]
        component: Component,
        /// Unique id
        #[arg(long)]
        id: Option<i64>,
    },
    /// Stage a tag or a payload interval
    Add {
        #[command(subcommand)]
        what: AddCmd,
    },
    /// Push staged tags and payload intervals
    ///
    /// Payload intervals are checked in a dry run first (payload files exist,
    /// a writable prefix is configured) and only then copied and linked.
    Push,
    /// Fetch payload files of a tag valid at a point
    Fetch {
        #[arg(value_parser = non_empty)]
        tag: String,
        /// Domain for the payload file
        #[arg(short = 'd', long, value_parser = non_empty)]
        domain: Option<String>,
        /// Point in the interval space (default: the latest)
        #[arg(short = 's', long, default_value_t = i64::MAX as u64)]
        start: u64,
    },
    /// Print configuration (or a field of it)
    ///
    /// Пример:
    ///   xpload config path 0
    Config {
        #[arg(value_parser = non_empty)]
        field: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum AddCmd {
    /// Add a tag for payload intervals
    Tag {
        #[arg(value_parser = non_empty)]
        name: String,
        #[arg(short = 't', long = "type", default_value = DEFAULT_TAG_TYPE, value_parser = non_empty)]
        tag_type: String,
        #[arg(short = 's', long, default_value = DEFAULT_TAG_STATUS, value_parser = non_empty)]
        status: String,
        /// Link new domains to the tag
        #[arg(short = 'd', long, num_args = 1.., value_parser = non_empty)]
        domains: Vec<String>,
    },
    /// Add a payload interval
    Pil {
        #[arg(value_parser = non_empty)]
        tag: String,
        #[arg(value_parser = non_empty)]
        domain: String,
        /// Payload file
        #[arg(value_parser = existing_file)]
        payload: PathBuf,
        /// Start of the interval the payload applies to
        #[arg(short = 's', long, default_value_t = 0)]
        start: u64,
        /// End of the interval (exclusive); open-ended if omitted
        #[arg(short = 'e', long)]
        end: Option<u64>,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Cli as Parser>::parse()
    }
}
