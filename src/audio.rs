/// Synthesized audio cues — no sound assets on disk.
///
/// Every cue is a fundsp node rendered to a sample buffer and handed to a
/// rodio sink.  One-shots are detached (fire-and-forget); the music, alert
/// and victory loops keep their sinks so they can be paused and stopped.

use fundsp::hacker32 as dsp;
use rodio::{buffer::SamplesBuffer, OutputStream, OutputStreamHandle, Sink, Source};

const SAMPLE_RATE: u32 = 44_100;
/// Background music plays quietly under everything else.
const MUSIC_VOLUME: f32 = 0.09;

pub struct Audio {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    music: Option<Sink>,
    alert: Option<Sink>,
    victory: Option<Sink>,
}

impl Audio {
    /// Opens the default output device and starts the background music
    /// loop.  A missing device is surfaced to the caller, who may choose
    /// to run silent.
    pub fn new() -> Result<Self, rodio::StreamError> {
        let (stream, handle) = OutputStream::try_default()?;

        let music = Sink::try_new(&handle).ok();
        if let Some(m) = &music {
            m.set_volume(MUSIC_VOLUME);
            let source = SamplesBuffer::new(1, SAMPLE_RATE, generate_music_loop(SAMPLE_RATE));
            m.append(source.repeat_infinite());
        }

        Ok(Self {
            _stream: stream,
            handle,
            music,
            alert: None,
            victory: None,
        })
    }

    fn play_once(&self, samples: Vec<f32>) {
        if let Ok(sink) = Sink::try_new(&self.handle) {
            sink.append(SamplesBuffer::new(1, SAMPLE_RATE, samples));
            sink.detach();
        }
    }

    fn start_loop(&self, samples: Vec<f32>) -> Option<Sink> {
        let sink = Sink::try_new(&self.handle).ok()?;
        sink.append(SamplesBuffer::new(1, SAMPLE_RATE, samples).repeat_infinite());
        Some(sink)
    }

    pub fn play_pickup(&self) {
        self.play_once(generate_pickup_samples(SAMPLE_RATE));
    }

    pub fn play_game_over(&self) {
        self.play_once(generate_game_over_samples(SAMPLE_RATE));
    }

    /// Final-battle alert: the music pauses and a siren loops until
    /// `stop_alert`.
    pub fn start_alert(&mut self) {
        if let Some(m) = &self.music {
            m.pause();
        }
        self.alert = self.start_loop(generate_alert_samples(SAMPLE_RATE));
    }

    pub fn stop_alert(&mut self) {
        if let Some(sink) = self.alert.take() {
            sink.stop();
        }
        if let Some(m) = &self.music {
            m.play();
        }
    }

    /// Victory jingle loops over the ending screen until `stop_victory`.
    pub fn start_victory(&mut self) {
        if let Some(m) = &self.music {
            m.pause();
        }
        self.victory = self.start_loop(generate_victory_samples(SAMPLE_RATE));
    }

    pub fn stop_victory(&mut self) {
        if let Some(sink) = self.victory.take() {
            sink.stop();
        }
        if let Some(m) = &self.music {
            m.play();
        }
    }
}

// ── Sample generators ────────────────────────────────────────────────────────

/// Two quick ascending notes.
fn generate_pickup_samples(sample_rate: u32) -> Vec<f32> {
    const NOTES: [f32; 2] = [660.0, 880.0];
    let note_gap = 0.09f32;
    let note_len = 0.14f32;
    let total_duration = note_gap * (NOTES.len() as f32 - 1.0) + note_len;
    let total_samples = (sample_rate as f32 * total_duration) as usize;
    let mut samples = vec![0.0f32; total_samples];

    for (idx, freq) in NOTES.iter().enumerate() {
        let start = (note_gap * idx as f32 * sample_rate as f32) as usize;
        let mut node = dsp::sine_hz(*freq)
            * dsp::lfo(move |t: f32| dsp::xerp(0.15, 0.001, (t / note_len).min(1.0)));
        let tone = render_mono(&mut node, sample_rate, note_len);
        for (i, s) in tone.into_iter().enumerate() {
            let target = start + i;
            if target < total_samples {
                samples[target] += s;
            }
        }
    }

    samples
}

/// Falling saw sweep, the classic defeat sting.
fn generate_game_over_samples(sample_rate: u32) -> Vec<f32> {
    let duration = 0.8;
    let mut node = (dsp::lfo(|t: f32| dsp::lerp(320.0, 55.0, (t / 0.6).min(1.0))) >> dsp::saw())
        * dsp::lfo(move |t: f32| dsp::lerp(0.18, 0.0, (t / duration).min(1.0)));
    render_mono(&mut node, sample_rate, duration)
}

/// One-second siren, seamless when looped.
fn generate_alert_samples(sample_rate: u32) -> Vec<f32> {
    let duration = 1.0;
    let mut node = (dsp::lfo(|t: f32| {
        dsp::lerp(620.0, 920.0, 0.5 + 0.5 * (std::f32::consts::TAU * 2.0 * t).sin())
    }) >> dsp::sine())
        * dsp::dc(0.22);
    render_mono(&mut node, sample_rate, duration)
}

/// Rising four-note arpeggio, loops over the ending screen.
fn generate_victory_samples(sample_rate: u32) -> Vec<f32> {
    const NOTES: [f32; 4] = [523.25, 659.25, 783.99, 1046.5];
    let note_gap = 0.22f32;
    let note_len = 0.30f32;
    let total_duration = 1.6f32;
    let total_samples = (sample_rate as f32 * total_duration) as usize;
    let mut samples = vec![0.0f32; total_samples];

    for (idx, freq) in NOTES.iter().enumerate() {
        let start = (note_gap * idx as f32 * sample_rate as f32) as usize;
        let mut node = dsp::sine_hz(*freq)
            * dsp::lfo(move |t: f32| dsp::xerp(0.14, 0.001, (t / note_len).min(1.0)));
        let tone = render_mono(&mut node, sample_rate, note_len);
        for (i, s) in tone.into_iter().enumerate() {
            let target = start + i;
            if target < total_samples {
                samples[target] += s;
            }
        }
    }

    samples
}

/// Six seconds of ambient pad.  Frequencies complete whole cycles over the
/// loop length so the repeat point is click-free.
fn generate_music_loop(sample_rate: u32) -> Vec<f32> {
    let duration = 6.0f32;
    let mut node = (dsp::sine_hz(220.0) * dsp::dc(0.4)
        + dsp::sine_hz(275.0) * dsp::dc(0.3)
        + dsp::sine_hz(330.0) * dsp::dc(0.3))
        * dsp::lfo(move |t: f32| 0.5 + 0.25 * (std::f32::consts::TAU * t / duration).sin());
    render_mono(&mut node, sample_rate, duration)
}

fn render_mono(node: &mut dyn dsp::AudioUnit, sample_rate: u32, duration: f32) -> Vec<f32> {
    node.set_sample_rate(sample_rate as f64);
    node.reset();

    let sample_count = (sample_rate as f32 * duration) as usize;
    let mut samples = Vec::with_capacity(sample_count);
    for _ in 0..sample_count {
        samples.push(node.get_mono());
    }
    samples
}
