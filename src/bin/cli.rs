use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use dctmark_engine::utils::quality;
use dctmark_engine::{
    Channel, Message, MessageLength, WatermarkConfig, WatermarkError, extract_differential,
    image_handler,
};
use log::{LevelFilter, info};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hide a bit message in a BMP image
    Embed {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Message as a string of 0 and 1 characters
        #[arg(short, long, conflicts_with = "random", required_unless_present = "random")]
        message: Option<String>,
        /// Embed a random message of this many bits instead
        #[arg(short, long)]
        random: Option<usize>,
        /// Seed for the random message
        #[arg(long, requires = "random")]
        seed: Option<u64>,
        #[arg(short, long)]
        alpha: Option<f64>,
        #[arg(short, long)]
        channel: Option<Channel>,
    },
    /// Recover a message using the length stored in the BMP header
    Extract {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        channel: Option<Channel>,
    },
    /// Recover a message by comparing a watermarked image with its original
    Diff {
        #[arg(short, long)]
        source: PathBuf,
        #[arg(short, long)]
        target: PathBuf,
        /// Number of bits to decode
        #[arg(short, long, conflicts_with = "force", required_unless_present = "force")]
        length: Option<usize>,
        /// Decode every marked block
        #[arg(short, long)]
        force: bool,
        #[arg(short, long)]
        channel: Option<Channel>,
    },
    /// Report the PSNR of one channel between two images
    Psnr {
        #[arg(short, long)]
        source: PathBuf,
        #[arg(short, long)]
        target: PathBuf,
        #[arg(short, long)]
        channel: Option<Channel>,
    },
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let config = WatermarkConfig::from_env().context("Invalid environment configuration")?;

    match cli.command {
        Commands::Embed {
            input,
            output,
            message,
            random,
            seed,
            alpha,
            channel,
        } => {
            info!("Embedding message procedure starts");
            let config = WatermarkConfig::new(
                channel.unwrap_or(config.channel),
                alpha.unwrap_or(config.alpha),
            )?;

            let message = match (message, random, seed) {
                (Some(bits), _, _) => bits.parse::<Message>()?,
                (None, Some(len), Some(seed)) => Message::random_seeded(len, seed),
                (None, Some(len), None) => Message::random(len),
                (None, None, _) => bail!("Empty message"),
            };
            if random.is_some() {
                info!("Random message to embed: {message}");
            }

            let image = image_handler::read_image(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let embedded = image_handler::embed_to_bmp(&image, &message, &config)?;
            if embedded.bits_embedded == message.len() {
                info!(
                    "All {} bits of the message were placed into the image",
                    embedded.bits_embedded
                );
            } else {
                info!(
                    "Only the first {} bits of the message were placed into the image",
                    embedded.bits_embedded
                );
            }

            fs::write(&output, &embedded.image)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Message embedding finished");
        }

        Commands::Extract { input, channel } => {
            info!("Extracting message procedure starts");
            let bytes =
                fs::read(&input).with_context(|| format!("Failed to read {}", input.display()))?;
            match image_handler::extract_from_bmp(&bytes, channel.unwrap_or(config.channel))? {
                Some(message) => {
                    info!("Length of this message is {} bits", message.len());
                    println!("{message}");
                }
                None => eprintln!(
                    "Unable to extract message. The image either holds no message or the file is corrupted."
                ),
            }
        }

        Commands::Diff {
            source,
            target,
            length,
            force,
            channel,
        } => {
            let source_image = image_handler::read_image(&source)
                .with_context(|| format!("Failed to read {}", source.display()))?
                .to_rgba8();
            let target_image = image_handler::read_image(&target)
                .with_context(|| format!("Failed to read {}", target.display()))?
                .to_rgba8();
            let length = match (force, length) {
                (true, _) => MessageLength::Forced,
                (false, Some(len)) => MessageLength::Known(len),
                (false, None) => bail!("Either --length or --force is required"),
            };

            match extract_differential(
                &source_image,
                &target_image,
                length,
                channel.unwrap_or(config.channel),
            ) {
                Ok(message) => {
                    info!("Decoded {} bits", message.len());
                    println!("{message}");
                }
                Err(WatermarkError::IdenticalCoefficients) => {
                    eprintln!("Coefficients are identical, the images carry no message.")
                }
                Err(e) => return Err(e.into()),
            }
        }

        Commands::Psnr {
            source,
            target,
            channel,
        } => {
            let source_image = image_handler::read_image(&source)?.to_rgba8();
            let target_image = image_handler::read_image(&target)?.to_rgba8();
            let value = quality::channel_psnr(
                &source_image,
                &target_image,
                channel.unwrap_or(config.channel),
            )?;
            println!("{value:.4} dB");
        }
    }

    Ok(())
}
