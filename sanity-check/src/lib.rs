use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use hound::{SampleFormat, WavReader};
use melstream::{FbankOptions, OfflineFbank, OnlineFbank};

/// Read a WAV file as mono `f32` samples in `[-1, 1]`, averaging channels.
pub fn read_wav(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader =
        WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();
    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };
    let channels = usize::from(spec.channels);
    if channels == 0 {
        bail!("{} declares zero channels", path.display());
    }
    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };
    Ok((samples, spec.sample_rate))
}

/// Load Fbank options from a JSON file; missing fields take their defaults.
pub fn load_options(path: &Path) -> Result<FbankOptions> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let opts = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(opts)
}

/// Feed `wave` to a streaming extractor `chunk` samples at a time.
pub fn extract_streaming(
    opts: FbankOptions,
    sample_rate: f32,
    wave: &[f32],
    chunk: usize,
) -> Result<Vec<Vec<f32>>> {
    let mut fbank = OnlineFbank::new(opts)?;
    let mut frames = Vec::new();
    for c in wave.chunks(chunk.max(1)) {
        fbank.accept_waveform(sample_rate, c)?;
        drain_ready(&mut fbank, &mut frames)?;
    }
    fbank.input_finished()?;
    drain_ready(&mut fbank, &mut frames)?;
    Ok(frames)
}

fn drain_ready(fbank: &mut OnlineFbank, out: &mut Vec<Vec<f32>>) -> Result<()> {
    let ready = fbank.num_frames_ready();
    for i in out.len()..ready {
        out.push(fbank.get_frame(i)?.to_vec());
    }
    fbank.pop(ready - fbank.first_available_frame());
    Ok(())
}

pub fn extract_offline(
    opts: FbankOptions,
    sample_rate: f32,
    wave: &[f32],
    vtln_warp: f32,
) -> Result<Vec<Vec<f32>>> {
    let mut fbank = OfflineFbank::new(opts)?;
    Ok(fbank.compute(sample_rate, wave, vtln_warp)?)
}

/// Largest element-wise difference between two feature matrices.
pub fn max_abs_diff(a: &[Vec<f32>], b: &[Vec<f32>]) -> Result<f32> {
    if a.len() != b.len() {
        bail!("frame count differs: {} vs {}", a.len(), b.len());
    }
    let mut max = 0.0f32;
    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        if x.len() != y.len() {
            bail!("frame {i} dimension differs: {} vs {}", x.len(), y.len());
        }
        for (p, q) in x.iter().zip(y) {
            max = max.max((p - q).abs());
        }
    }
    Ok(max)
}

/// One line per frame, comma-separated.
pub fn write_csv<W: Write>(mut out: W, frames: &[Vec<f32>]) -> Result<()> {
    for frame in frames {
        let line: Vec<String> = frame.iter().map(|v| v.to_string()).collect();
        writeln!(out, "{}", line.join(","))?;
    }
    Ok(())
}
