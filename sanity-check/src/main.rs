use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use log::info;
use melstream::{FbankOptions, WindowType};
use sanity_check::{
    extract_offline, extract_streaming, load_options, max_abs_diff, read_wav, write_csv,
};

/// Extract Fbank features from a WAV file and check that streaming and
/// whole-utterance extraction agree.
#[derive(Parser)]
struct Args {
    /// Path to input WAV file
    input: PathBuf,

    /// JSON file with Fbank options; command-line flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Samples per streaming chunk
    #[arg(long, default_value_t = 1600)]
    chunk: usize,

    /// Number of Mel bins
    #[arg(long)]
    num_bins: Option<usize>,

    /// Analysis window
    #[arg(long)]
    window_type: Option<WindowType>,

    /// Append log energy to each frame
    #[arg(long)]
    use_energy: bool,

    /// Dither amount; 0 disables
    #[arg(long)]
    dither: Option<f32>,

    /// VTLN warp factor for the whole-utterance pass
    #[arg(long, default_value_t = 1.0)]
    vtln_warp: f32,

    /// Largest allowed difference between the two passes
    #[arg(long, default_value_t = 0.0)]
    tolerance: f32,

    /// Write features as CSV here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut opts = match &args.config {
        Some(path) => load_options(path)?,
        None => FbankOptions::default(),
    };
    if let Some(n) = args.num_bins {
        opts.mel_opts.num_bins = n;
    }
    if let Some(w) = args.window_type {
        opts.frame_opts.window_type = w;
    }
    if let Some(d) = args.dither {
        opts.frame_opts.dither = d;
    }
    opts.use_energy |= args.use_energy;

    let (wave, sample_rate) = read_wav(&args.input)?;
    opts.frame_opts.samp_freq = sample_rate as f32;
    info!(
        "{}: {} samples at {} Hz",
        args.input.display(),
        wave.len(),
        sample_rate
    );

    let streamed = extract_streaming(opts, sample_rate as f32, &wave, args.chunk)?;
    let batch = extract_offline(opts, sample_rate as f32, &wave, 1.0)?;
    let diff = max_abs_diff(&streamed, &batch)?;
    info!("{} frames, max streaming/offline difference {}", streamed.len(), diff);
    if diff > args.tolerance {
        bail!("streaming and offline features differ by {diff}");
    }

    let frames = if args.vtln_warp != 1.0 {
        extract_offline(opts, sample_rate as f32, &wave, args.vtln_warp)?
    } else {
        streamed
    };
    match &args.output {
        Some(path) => write_csv(BufWriter::new(File::create(path)?), &frames)?,
        None => write_csv(io::stdout().lock(), &frames)?,
    }
    Ok(())
}
