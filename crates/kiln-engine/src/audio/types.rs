use std::sync::Arc;

/// Number of addressable sound channels.
pub const MAX_CHANNELS: usize = 32;

/// Cached sound, identified by the path it was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sound {
    pub(crate) id: u32,
    pub(crate) path: Arc<str>,
}

impl Sound {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Mixing bus. Music and Sfx feed Master.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum SubmixId {
    Master,
    Music,
    #[default]
    Sfx,
}

impl SubmixId {
    pub const ALL: [SubmixId; 3] = [SubmixId::Master, SubmixId::Music, SubmixId::Sfx];

    pub fn parent(self) -> Option<SubmixId> {
        match self {
            SubmixId::Master => None,
            SubmixId::Music | SubmixId::Sfx => Some(SubmixId::Master),
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SoundOptions {
    /// Channel to play on. `None` plays a fire-and-forget voice.
    pub channel: Option<usize>,
    pub submix: SubmixId,
    pub looped: bool,
    /// Playback rate, 1.0 = original speed.
    pub rate: f32,
    /// Detune in cents.
    pub detune: f32,
    /// Stereo pan, -1.0 (left) to 1.0 (right).
    pub pan: f32,
    pub volume: f32,
}

impl Default for SoundOptions {
    fn default() -> Self {
        Self {
            channel: None,
            submix: SubmixId::Sfx,
            looped: false,
            rate: 1.0,
            detune: 0.0,
            pan: 0.0,
            volume: 1.0,
        }
    }
}

impl SoundOptions {
    pub fn on_channel(channel: usize) -> Self {
        Self {
            channel: Some(channel),
            ..Self::default()
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum ChannelState {
    #[default]
    Stopped,
    Paused,
    Playing,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum FadeCurve {
    #[default]
    Linear,
    /// Constant ratio per second. Endpoints at or below zero are treated as
    /// a small positive floor during the ramp.
    Exponential,
}

/// Work for the platform audio device, drained once per frame.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioCommand {
    Play {
        sound: Sound,
        options: SoundOptions,
    },
    StopChannel(usize),
    PauseChannel(usize),
    ResumeChannel(usize),
    PlayMusic {
        path: Arc<str>,
        looped: bool,
    },
    PauseMusic,
    ResumeMusic,
    StopMusic,
    SeekMusic(f32),
    Suspend,
    Resume,
}
