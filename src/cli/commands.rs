use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "llamabot", version, about = "LLAMABOT chat server and terminal client", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the config file path globally
    #[arg(short, long, global = true, default_value = "config.yaml")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API and WebSocket server
    Serve,

    /// Enter interactive terminal chat mode
    Chat {
        /// Model to chat with instead of the configured default
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Inspect or clear the stored conversation
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// List the models available on the API
    Models,

    /// Transcribe an audio file to text
    Transcribe {
        /// Path to the audio file
        path: String,

        /// Spoken language hint, e.g. "en"
        #[arg(short, long)]
        language: Option<String>,

        /// Transcription model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Rate an assistant message
    Feedback {
        /// Id of the message to rate
        message_id: i64,

        /// Thumbs up or down
        rating: Rating,

        /// Optional free-form comment
        #[arg(long)]
        comment: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum HistoryAction {
    /// Show the most recent messages
    Show {
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },

    /// Search message contents
    Search { query: String },

    /// Delete the whole conversation
    Clear,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Rating {
    Up,
    Down,
}

impl Rating {
    pub fn is_positive(&self) -> bool {
        matches!(self, Rating::Up)
    }
}
