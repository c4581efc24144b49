use crate::domain::model::Category;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "lead-scout")]
#[command(about = "Audit hospitality businesses and rank them as outreach leads")]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Audit every business in the config file and export ranked leads
    Audit {
        #[arg(long, short)]
        config: String,

        #[arg(long, help = "Override output.path")]
        output_path: Option<String>,

        #[arg(long, help = "Override http.concurrent_requests")]
        concurrent_requests: Option<usize>,
    },
    /// Print the prospecting search-term matrix
    Queries {
        #[arg(long, value_delimiter = ',', value_parser = parse_category)]
        category: Vec<Category>,

        #[arg(long, value_delimiter = ',')]
        city: Vec<String>,

        #[arg(long)]
        limit: Option<usize>,
    },
}

fn parse_category(raw: &str) -> Result<Category, String> {
    raw.parse()
}
