use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bots")]
#[command(about = "Botlang CLI", long_about = None)]
pub struct Cli {
    /// Settings file (defaults to ./bots.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile and run a program
    Run {
        /// Path to the source file (.bots)
        path: String,
        /// Instructions per scheduler tick
        #[arg(long)]
        budget: Option<usize>,
    },
    /// Type check a program without running it
    Check {
        /// Path to the source file
        path: String,
    },
    /// Print the compiled code objects
    Dump {
        /// Path to the source file
        path: String,
        /// Emit JSON instead of the text listing
        #[arg(long)]
        json: bool,
    },
    /// Run a program under the line debugger, reading commands from stdin
    Debug {
        /// Path to the source file
        path: String,
        /// Lines to stop at (repeatable)
        #[arg(long = "break", value_name = "LINE")]
        breakpoints: Vec<u32>,
    },
}
