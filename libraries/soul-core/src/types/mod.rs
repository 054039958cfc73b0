mod audio;

pub use audio::{AudioBuffer, AudioFormat, SampleRate};
