mod cli;

use anyhow::Result;
use cli::{CodeatlasCli, Commands};

fn main() -> Result<()> {
    let args = CodeatlasCli::parse_args();

    match args.command {
        Commands::Analyze {
            repo_path,
            repo_id,
            output,
            excludes,
            includes,
            verbose,
        } => {
            logging::init(verbose)?;
            cli::run_analyze(repo_path, repo_id, output, excludes, includes)
        }
    }
}
