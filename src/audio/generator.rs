use std::f64::consts::PI;
use std::fs;
use std::io::{Seek, Write};
use std::path::Path;

use crate::audio::error::ToneError;
use crate::audio::{TONE_COUNT, tone_file_name};

pub const SAMPLE_RATE: u32 = 44100;

/// Length of every tone in the library, in milliseconds.
pub const DEFAULT_DURATION_MS: f64 = 100.0;

/// Share of the tone spent fading in, and again fading out.
const FADE_FRACTION: f64 = 0.1;

/// Parameters of one fading sine tone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    pub frequency: f64,
    pub duration_ms: f64,
    /// Peak amplitude on a -1.0 to 1.0 scale.
    pub amplitude: f64,
}

impl ToneSpec {
    /// The `harmonic`-th tone of the library: `10 * harmonic` Hz at `1 / sqrt(harmonic)` amplitude.
    ///
    /// Harmonic `n` is stored as tone index `n - 1`, so valid harmonics are `1..=TONE_COUNT`.
    pub fn harmonic(harmonic: u32, duration_ms: f64) -> Self {
        Self {
            frequency: 10.0 * harmonic as f64,
            duration_ms,
            amplitude: 1.0 / (harmonic as f64).sqrt(),
        }
    }

    /// Number of samples the tone spans at [`SAMPLE_RATE`].
    pub fn sample_count(&self) -> usize {
        (self.duration_ms * SAMPLE_RATE as f64 / 1000.0).round() as usize
    }

    fn validate(&self) -> Result<(), ToneError> {
        if !(self.frequency.is_finite() && self.frequency > 0.0) {
            return Err(ToneError::InvalidParameter(format!(
                "frequency {} Hz",
                self.frequency
            )));
        }
        if !(self.duration_ms.is_finite() && self.duration_ms > 0.0) {
            return Err(ToneError::InvalidParameter(format!(
                "duration {} ms",
                self.duration_ms
            )));
        }
        if !(0.0..=1.0).contains(&self.amplitude) {
            return Err(ToneError::InvalidParameter(format!(
                "amplitude {}",
                self.amplitude
            )));
        }
        Ok(())
    }
}

/// Render a sine wave whose envelope rises linearly over the first tenth of the tone and falls
/// linearly over the last tenth.
pub fn synthesize(spec: &ToneSpec) -> Result<Vec<f64>, ToneError> {
    spec.validate()?;
    let total = spec.duration_ms * SAMPLE_RATE as f64 / 1000.0;
    let fade = total * FADE_FRACTION;
    let fade_out_start = total - fade;

    let samples = (0..spec.sample_count())
        .map(|i| {
            let x = i as f64;
            let point =
                spec.amplitude * (2.0 * PI * spec.frequency * (x / SAMPLE_RATE as f64)).sin();
            if x <= fade {
                point * (x / fade)
            } else if x >= fade_out_start {
                point * ((fade - (x - fade_out_start)) / fade).max(0.0)
            } else {
                point
            }
        })
        .collect();
    Ok(samples)
}

/// Encode samples as mono 16-bit PCM at [`SAMPLE_RATE`]. Samples are scaled by `i16::MAX` and
/// truncated towards zero.
pub fn write_wav<W: Write + Seek>(writer: W, samples: &[f64]) -> Result<(), ToneError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::new(writer, spec)?;
    for sample in samples {
        writer.write_sample((sample * i16::MAX as f64).clamp(-32768.0, 32767.0) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Write the whole tone library into `dir`: harmonics 1 to 99 as `00.wav` to `98.wav`.
///
/// Returns the number of files written.
pub fn generate_library<P: AsRef<Path>>(dir: P, duration_ms: f64) -> Result<usize, ToneError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let mut written = 0;
    for harmonic in 1..=TONE_COUNT as u32 {
        let spec = ToneSpec::harmonic(harmonic, duration_ms);
        let samples = synthesize(&spec)?;
        let path = dir.join(tone_file_name((harmonic - 1) as u8));
        write_wav(std::io::BufWriter::new(fs::File::create(&path)?), &samples)?;
        log::debug!(
            "Wrote {} ({} Hz, amplitude {:.3})",
            path.display(),
            spec.frequency,
            spec.amplitude
        );
        written += 1;
    }
    log::info!("Generated {} tones in {}", written, dir.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn fade_len(spec: &ToneSpec) -> usize {
        (spec.sample_count() as f64 * FADE_FRACTION) as usize
    }

    #[test]
    fn test_sample_count() {
        assert_eq!(ToneSpec::harmonic(1, 100.0).sample_count(), 4410);
        assert_eq!(ToneSpec::harmonic(1, 10.0).sample_count(), 441);
        // 0.0441 samples per microsecond rounds to the nearest sample
        assert_eq!(ToneSpec::harmonic(1, 12.34).sample_count(), 544);
    }

    #[test]
    fn test_harmonic_parameters() {
        let spec = ToneSpec::harmonic(4, 100.0);
        assert_eq!(spec.frequency, 40.0);
        assert!((spec.amplitude - 0.5).abs() < 1e-12);
        let spec = ToneSpec::harmonic(99, 100.0);
        assert_eq!(spec.frequency, 990.0);
    }

    #[test]
    fn test_envelope() {
        let spec = ToneSpec::harmonic(4, 100.0);
        let samples = synthesize(&spec).unwrap();
        assert_eq!(samples.len(), 4410);
        assert_eq!(samples[0], 0.0);

        let fade = fade_len(&spec);
        let body_peak = samples[fade + 1..samples.len() - fade - 1]
            .iter()
            .fold(0.0f64, |acc, s| acc.max(s.abs()));
        assert!((body_peak - 0.5).abs() < 1e-3);

        let fade_in_peak = samples[..=fade].iter().fold(0.0f64, |acc, s| acc.max(s.abs()));
        let fade_out_peak = samples[samples.len() - fade..]
            .iter()
            .fold(0.0f64, |acc, s| acc.max(s.abs()));
        assert!(fade_in_peak < body_peak);
        assert!(fade_out_peak < body_peak);
    }

    #[test]
    fn test_frequency_from_zero_crossings() {
        let spec = ToneSpec::harmonic(10, 100.0);
        let samples = synthesize(&spec).unwrap();
        // 100 Hz over 0.1 s is 10 periods, i.e. 20 sign changes
        let crossings = samples
            .windows(2)
            .filter(|w| (w[0] < 0.0) != (w[1] < 0.0) && w[0] != 0.0 && w[1] != 0.0)
            .count();
        assert!((19..=21).contains(&crossings), "{} crossings", crossings);
    }

    #[test]
    fn test_invalid_parameters() {
        let mut spec = ToneSpec::harmonic(1, 100.0);
        spec.duration_ms = 0.0;
        assert!(matches!(synthesize(&spec), Err(ToneError::InvalidParameter(_))));
        let mut spec = ToneSpec::harmonic(1, 100.0);
        spec.amplitude = 1.5;
        assert!(matches!(synthesize(&spec), Err(ToneError::InvalidParameter(_))));
    }

    #[test]
    fn test_wav_encoding() {
        let spec = ToneSpec::harmonic(4, 100.0);
        let samples = synthesize(&spec).unwrap();
        let mut cursor = Cursor::new(Vec::new());
        write_wav(&mut cursor, &samples).unwrap();

        cursor.set_position(0);
        let reader = hound::WavReader::new(cursor).unwrap();
        let wav_spec = reader.spec();
        assert_eq!(wav_spec.channels, 1);
        assert_eq!(wav_spec.sample_rate, 44100);
        assert_eq!(wav_spec.bits_per_sample, 16);
        let decoded: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded.len(), 4410);
        let peak = decoded.iter().map(|s| s.unsigned_abs()).max().unwrap();
        assert!((peak as i32 - 16383).abs() <= 16, "peak {}", peak);
    }
}
