//! Audio processing: per-segment gain and speed time-stretch.

use montage_core::AudioBuffer;

/// Apply a volume factor in [0, 2], clamping samples to [-1, 1].
pub fn apply_gain(audio: &mut AudioBuffer, volume: f64) {
    if volume == 1.0 {
        return;
    }
    let v = volume as f32;
    for s in &mut audio.samples {
        *s = (*s * v).clamp(-1.0, 1.0);
    }
}

/// Time-stretch audio to match a speed factor, staying in sync with the
/// retimed frame stream. Resamples with linear interpolation rather than
/// dropping or duplicating whole blocks.
pub fn stretch(audio: &AudioBuffer, factor: f64) -> AudioBuffer {
    if factor == 1.0 || audio.samples.is_empty() {
        return audio.clone();
    }
    let channels = audio.channels as usize;
    let in_frames = audio.frames();
    let out_frames = ((in_frames as f64 / factor).round() as usize).max(1);

    let mut samples = Vec::with_capacity(out_frames * channels);
    for i in 0..out_frames {
        let src_pos = i as f64 * factor;
        let i0 = (src_pos.floor() as usize).min(in_frames - 1);
        let i1 = (i0 + 1).min(in_frames - 1);
        let frac = (src_pos - i0 as f64) as f32;
        for c in 0..channels {
            let s0 = audio.samples[i0 * channels + c];
            let s1 = audio.samples[i1 * channels + c];
            samples.push(s0 + (s1 - s0) * frac);
        }
    }

    AudioBuffer {
        sample_rate: audio.sample_rate,
        channels: audio.channels,
        samples,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(frames: usize) -> AudioBuffer {
        AudioBuffer {
            sample_rate: 48_000,
            channels: 1,
            samples: (0..frames).map(|i| i as f32 / frames as f32).collect(),
        }
    }

    #[test]
    fn test_gain_scales_and_clamps() {
        let mut audio = AudioBuffer {
            sample_rate: 48_000,
            channels: 1,
            samples: vec![0.5, -0.8],
        };
        apply_gain(&mut audio, 2.0);
        assert_eq!(audio.samples, vec![1.0, -1.0]);
    }

    #[test]
    fn test_stretch_halves_duration() {
        let audio = ramp(48_000);
        let out = stretch(&audio, 2.0);
        assert_eq!(out.frames(), 24_000);
        assert_eq!(out.sample_rate, 48_000);
    }

    #[test]
    fn test_stretch_interpolates() {
        let audio = AudioBuffer {
            sample_rate: 4,
            channels: 1,
            samples: vec![0.0, 1.0, 0.0, 1.0],
        };
        let out = stretch(&audio, 0.5);
        assert_eq!(out.frames(), 8);
        // Midpoints between 0 and 1 interpolate to 0.5
        assert!((out.samples[1] - 0.5).abs() < 1e-6);
    }
}
