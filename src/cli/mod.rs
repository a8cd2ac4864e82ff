pub mod commands;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "adpulse")]
#[command(about = "Audit competitor ads and generate storyboards with generative AI")]
#[command(version)]
pub struct Cli {
    /// Use alternate config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Human-readable output instead of JSON
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check API key and model configuration
    Doctor,

    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Audit a competitor ad video
    Audit(AuditArgs),

    /// Generate a storyboard and render its frames
    Generate(GenerateArgs),

    /// Synthesize a short video clip
    Animate(AnimateArgs),
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective config (API key redacted)
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the config file path
    Path,
}

#[derive(Args)]
pub struct AuditArgs {
    /// Video file to upload
    #[arg(conflicts_with = "url", required_unless_present = "url")]
    pub file: Option<PathBuf>,

    /// Public URL of the ad instead of a file
    #[arg(long)]
    pub url: Option<String>,

    /// Write the analysis JSON to this path
    #[arg(long)]
    pub save: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Build the storyboard from the prompt alone
    Custom,
    /// Follow the structure of an audited competitor ad
    Replica,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum VoiceArg {
    Professional,
    #[value(name = "gen-z")]
    GenZ,
    Urgent,
    Storyteller,
}

impl VoiceArg {
    pub fn label(&self) -> &'static str {
        match self {
            VoiceArg::Professional => "Professional",
            VoiceArg::GenZ => "Gen-Z/Trendy",
            VoiceArg::Urgent => "Urgent/Sales",
            VoiceArg::Storyteller => "Storyteller",
        }
    }
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Generation mode
    #[arg(long, value_enum, default_value = "custom")]
    pub mode: ModeArg,

    /// Creative direction for the storyboard
    #[arg(long, default_value = "")]
    pub prompt: String,

    /// Append quality keywords to the prompt
    #[arg(long)]
    pub enhance: bool,

    /// Brand voice
    #[arg(long, value_enum, default_value = "professional")]
    pub voice: VoiceArg,

    /// Product description
    #[arg(long, default_value = "")]
    pub product: String,

    /// Brand asset files
    #[arg(long = "asset", value_name = "PATH")]
    pub assets: Vec<PathBuf>,

    /// Reference image used for every frame (defaults to the first asset)
    #[arg(long)]
    pub reference: Option<PathBuf>,

    /// Analysis JSON from `adpulse audit --save`
    #[arg(long)]
    pub analysis: Option<PathBuf>,

    /// Output directory for plan.json and frames
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct AnimateArgs {
    /// What the clip should show
    #[arg(long, default_value = "")]
    pub prompt: String,

    /// Starting frame image
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Render 9:16 instead of 16:9
    #[arg(long)]
    pub portrait: bool,
}
