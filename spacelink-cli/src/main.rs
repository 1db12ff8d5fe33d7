use anyhow::Result;
use clap::{Parser, Subcommand};
use spacelink_cli::{commands, LinkKind};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "spacelink")]
#[command(about = "Spacelink - MS200/EWC serial link framing tool", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode payloads into link frames
    Encode {
        /// Input JSON file (array of payloads: hex strings for MS200,
        /// {"status", "data"} objects for EWC)
        #[arg(short, long)]
        input: String,

        /// Output file for encoded frames
        #[arg(short, long)]
        output: String,

        /// Link framing
        #[arg(long, value_enum, default_value_t = LinkKind::Ms200)]
        link: LinkKind,

        /// Application id for every packet
        #[arg(long, default_value = "0")]
        apid: u16,

        /// JSON config file (stack and link settings)
        #[arg(long)]
        config: Option<String>,
    },

    /// Decode a captured byte stream into packets
    Decode {
        /// Input file with raw link bytes
        #[arg(short, long)]
        input: String,

        /// Output JSON file for decoded packets
        #[arg(short, long)]
        output: Option<String>,

        /// Link framing
        #[arg(long, value_enum, default_value_t = LinkKind::Ms200)]
        link: LinkKind,

        /// Feed the decoder this many bytes at a time
        #[arg(long, default_value = "64")]
        chunk: usize,

        /// JSON config file (stack and link settings)
        #[arg(long)]
        config: Option<String>,
    },

    /// Compute the CRC16 of hex-encoded bytes
    Crc {
        /// Bytes as hex
        #[arg(long)]
        hex: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    // Execute command
    match cli.command {
        Commands::Encode {
            input,
            output,
            link,
            apid,
            config,
        } => commands::encode::execute(&input, &output, link, apid, config.as_deref()),

        Commands::Decode {
            input,
            output,
            link,
            chunk,
            config,
        } => commands::decode::execute(&input, output.as_deref(), link, chunk, config.as_deref())
            .map(|_| ()),

        Commands::Crc { hex } => commands::crc::execute(&hex).map(|_| ()),
    }
}
