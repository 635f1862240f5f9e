pub mod audit;
pub mod batch;
pub mod categories;
pub mod config;
pub mod redact;

use clap::CommandFactory;
use clap_complete::Shell;
use ta_core::RedactionStatistics;

use crate::cli::Cli;

pub fn completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}

/// One `  CATEGORY  n` line per category, then the total
pub fn format_statistics(statistics: &RedactionStatistics) -> String {
    let mut out = String::new();
    for (category, count) in statistics.iter() {
        out.push_str(&format!("  {:<12} {}\n", category.as_str(), count));
    }
    out.push_str(&format!("  {:<12} {}\n", "TOTAL", statistics.total()));
    out
}
