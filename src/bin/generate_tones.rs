use std::path::PathBuf;

use clap::Parser;

use cv_theremin::audio::DEFAULT_TONES_DIR;
use cv_theremin::audio::generator::{DEFAULT_DURATION_MS, generate_library};

#[derive(Parser, Debug)]
#[command(
    name = "generate_tones",
    version = "0.1.1",
    about = "Write the theremin's tone library.",
    long_about = r#"Write the theremin's tone library.

Tone NN is a sine wave at 10 * (NN + 1) Hz with a peak amplitude of 1 / sqrt(NN + 1), faded in and out over a tenth of its length. Files are mono 16-bit PCM at 44.1 kHz."#
)]
struct Args {
    /// Directory to write 00.wav to 98.wav into. It is created if missing.
    #[arg(short, long, default_value = DEFAULT_TONES_DIR)]
    out_dir: PathBuf,

    /// Length of each tone in milliseconds.
    #[arg(short, long, default_value_t = DEFAULT_DURATION_MS)]
    duration_ms: f64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .try_init()?;

    generate_library(&args.out_dir, args.duration_ms)?;
    Ok(())
}
