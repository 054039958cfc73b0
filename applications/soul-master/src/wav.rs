/// WAV file I/O
///
/// Reads 8/16/24/32-bit integer or 32-bit float WAV into an interleaved `f32` buffer,
/// integer PCM scaled to [-1, 1). Always writes 32-bit float.
use crate::error::{MasterError, Result};
use soul_core::{AudioBuffer, AudioFormat, SampleRate};
use std::path::Path;

pub fn read_wav(path: &Path) -> Result<AudioBuffer> {
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => {
            if spec.bits_per_sample != 32 {
                return Err(MasterError::UnsupportedFormat(format!(
                    "{}-bit float",
                    spec.bits_per_sample
                )));
            }
            reader
                .into_samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
        hound::SampleFormat::Int => {
            let bits = spec.bits_per_sample;
            if !(8..=32).contains(&bits) {
                return Err(MasterError::UnsupportedFormat(format!("{}-bit PCM", bits)));
            }
            let max_val = (1i64 << (bits - 1)) as f64;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| (f64::from(v) / max_val) as f32))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    let format = AudioFormat::new(
        SampleRate::new(spec.sample_rate),
        spec.channels,
        spec.bits_per_sample,
    );
    let buffer = AudioBuffer::new(samples, format);
    buffer.validate()?;

    tracing::debug!(
        path = %path.display(),
        sample_rate = spec.sample_rate,
        channels = spec.channels,
        bits = spec.bits_per_sample,
        frames = buffer.frames(),
        "read wav"
    );
    Ok(buffer)
}

pub fn write_wav(path: &Path, buffer: &AudioBuffer) -> Result<()> {
    let spec = hound::WavSpec {
        channels: buffer.format.channels,
        sample_rate: buffer.sample_rate().as_hz(),
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in &buffer.samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    tracing::debug!(path = %path.display(), frames = buffer.frames(), "wrote wav");
    Ok(())
}
