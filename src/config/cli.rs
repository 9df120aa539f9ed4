use crate::config::ApiConfig;
use crate::domain::model::ResponseFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "nuldc")]
#[command(about = "Query the digital collections API and export results", version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags shared by both binaries.
#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// TOML settings file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// API base URL, overrides the settings file
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Hide progress bars
    #[arg(long, global = true)]
    pub no_progress: bool,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,
}

impl GlobalArgs {
    /// Loads the settings file and applies command-line overrides.
    pub fn load_config(&self) -> crate::utils::error::Result<ApiConfig> {
        let mut config = ApiConfig::load(self.config.as_deref())?;
        self.apply(&mut config);
        Ok(config)
    }

    pub fn apply(&self, config: &mut ApiConfig) {
        if let Some(url) = &self.api_url {
            config.api.base_url = url.clone();
        }
        if self.no_progress {
            config.api.progress = false;
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch a single work
    Works {
        id: String,

        #[arg(long = "as", default_value = "opensearch")]
        format: ResponseFormat,
    },

    /// Fetch the works of a collection
    Collections {
        id: String,

        #[arg(long = "as", default_value = "opensearch")]
        format: ResponseFormat,

        /// Follow pagination and return every page
        #[arg(long)]
        all: bool,
    },

    /// Search and print the JSON response
    Search {
        query: String,

        #[arg(long = "as", default_value = "opensearch")]
        format: ResponseFormat,

        #[command(flatten)]
        options: SearchOptions,
    },

    /// Search and save the flattened records as CSV
    Csv {
        query: String,
        outfile: PathBuf,

        #[command(flatten)]
        options: SearchOptions,
    },

    /// Search and save the whole response as XML
    Xml {
        query: String,
        outfile: PathBuf,

        #[command(flatten)]
        options: SearchOptions,
    },
}

#[derive(Debug, Clone, Args)]
pub struct SearchOptions {
    /// works, collections or file-sets
    #[arg(long, default_value = "works")]
    pub model: String,

    /// Follow pagination and return every page
    #[arg(long)]
    pub all: bool,

    /// Only these fields, e.g. id,title,subject.label
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Leave these fields out (ignored when --fields is given)
    #[arg(long, value_delimiter = ',')]
    pub exclude_fields: Vec<String>,
}
