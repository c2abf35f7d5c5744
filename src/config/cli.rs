use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "lecturer-assign")]
#[command(about = "Assign lecturers to course modules and track semester shortages")]
pub struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "assign.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the block from the config file
    #[arg(long)]
    pub block: Option<u32>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Load the block and print shortage and overload warnings
    Status,
    /// Print current bindings, optionally exporting them as CSV
    Snapshot {
        #[arg(long)]
        csv: Option<String>,
    },
    /// Bind a lecturer to a module and all its sibling modules
    Assign {
        #[arg(long)]
        lecturer: String,
        #[arg(long)]
        module: String,
        /// Proceed even if the lecturer's skills do not match
        #[arg(long)]
        confirm: bool,
    },
    /// Release a lecturer from a module and all its sibling modules
    Unassign {
        #[arg(long)]
        lecturer: String,
        #[arg(long)]
        module: String,
    },
    /// Move a lecturer from one course's modules to another's
    Move {
        #[arg(long)]
        lecturer: String,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        confirm: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assign_command() {
        let cli = Cli::try_parse_from([
            "lecturer-assign",
            "--block",
            "2",
            "assign",
            "--lecturer",
            "L1",
            "--module",
            "CARD-M1",
            "--confirm",
        ])
        .unwrap();

        assert_eq!(cli.config, "assign.toml");
        assert_eq!(cli.block, Some(2));
        match cli.command {
            Command::Assign { lecturer, module, confirm } => {
                assert_eq!(lecturer, "L1");
                assert_eq!(module, "CARD-M1");
                assert!(confirm);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_move_requires_destination() {
        assert!(Cli::try_parse_from(["lecturer-assign", "move", "--lecturer", "L1", "--from", "A-M1"]).is_err());
    }
}
