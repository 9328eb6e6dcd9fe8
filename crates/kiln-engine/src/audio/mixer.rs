use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::fade::Fade;
use super::{AudioCommand, ChannelState, FadeCurve, Sound, SoundOptions, SubmixId, MAX_CHANNELS};

#[derive(Debug, Clone)]
struct Channel {
    state: ChannelState,
    sound: Option<Sound>,
    submix: SubmixId,
    looped: bool,
    volume: f32,
    pan: f32,
    rate: f32,
    detune: f32,
    fade: Option<Fade>,
}

impl Default for Channel {
    fn default() -> Self {
        Self {
            state: ChannelState::Stopped,
            sound: None,
            submix: SubmixId::Sfx,
            looped: false,
            volume: 1.0,
            pan: 0.0,
            rate: 1.0,
            detune: 0.0,
            fade: None,
        }
    }
}

impl Channel {
    fn stop(&mut self) {
        self.state = ChannelState::Stopped;
        self.sound = None;
        self.fade = None;
    }
}

#[derive(Debug, Clone)]
struct MusicTrack {
    path: Arc<str>,
    looped: bool,
    paused: bool,
    gain: f32,
    position: f32,
    fade: Option<Fade>,
}

/// Mixer state: sound cache, channels, music player and submix volumes.
///
/// Playback itself belongs to a platform device, which drains
/// [`AudioCommand`]s each frame and reads the effective gains. All timing
/// (fades, music position) advances in [`update`](Self::update).
#[derive(Debug)]
pub struct Audio {
    sounds: HashMap<Arc<str>, Sound>,
    channels: Vec<Channel>,
    submix_volume: [f32; 3],
    music: Option<MusicTrack>,
    preloaded_music: Option<Arc<str>>,
    suspended: bool,
    commands: Vec<AudioCommand>,
}

impl Default for Audio {
    fn default() -> Self {
        Self::new()
    }
}

fn assert_channel(channel: usize, op: &str) {
    assert!(channel < MAX_CHANNELS, "Audio::{op}: invalid channel {channel}");
}

impl Audio {
    pub fn new() -> Self {
        Self {
            sounds: HashMap::new(),
            channels: vec![Channel::default(); MAX_CHANNELS],
            submix_volume: [1.0; 3],
            music: None,
            preloaded_music: None,
            suspended: false,
            commands: Vec::new(),
        }
    }

    // ── sounds ────────────────────────────────────────────────────────────

    /// Returns the cached sound for `path`, registering it on first use.
    pub fn load_sound(&mut self, path: impl AsRef<Path>) -> Sound {
        let key: Arc<str> = path.as_ref().to_string_lossy().into();
        if let Some(sound) = self.sounds.get(&key) {
            return sound.clone();
        }
        let sound = Sound {
            id: self.sounds.len() as u32,
            path: key.clone(),
        };
        log::debug!("sound #{} registered: {}", sound.id, sound.path);
        self.sounds.insert(key, sound.clone());
        sound
    }

    pub fn sound_count(&self) -> usize {
        self.sounds.len()
    }

    /// Plays `sound`. On a channel, whatever the channel was playing is
    /// replaced; without one the sound is a fire-and-forget voice.
    ///
    /// # Panics
    /// When `options.channel` is out of range.
    pub fn play_sound(&mut self, sound: &Sound, options: SoundOptions) {
        if let Some(index) = options.channel {
            assert_channel(index, "play_sound");
            let ch = &mut self.channels[index];
            *ch = Channel {
                state: ChannelState::Playing,
                sound: Some(sound.clone()),
                submix: options.submix,
                looped: options.looped,
                volume: options.volume,
                pan: options.pan,
                rate: options.rate,
                detune: options.detune,
                fade: None,
            };
        }
        self.commands.push(AudioCommand::Play {
            sound: sound.clone(),
            options,
        });
    }

    /// Called by the device when a non-looping channel reaches its end.
    pub fn channel_finished(&mut self, channel: usize) {
        assert_channel(channel, "channel_finished");
        let ch = &mut self.channels[channel];
        if !ch.looped {
            ch.stop();
        }
    }

    // ── channels ──────────────────────────────────────────────────────────

    pub fn set_channel_volume(&mut self, channel: usize, volume: f32) {
        assert_channel(channel, "set_channel_volume");
        let ch = &mut self.channels[channel];
        ch.volume = volume;
        ch.fade = None;
    }

    pub fn set_channel_pan(&mut self, channel: usize, pan: f32) {
        assert_channel(channel, "set_channel_pan");
        self.channels[channel].pan = pan.clamp(-1.0, 1.0);
    }

    pub fn set_channel_rate(&mut self, channel: usize, rate: f32) {
        assert_channel(channel, "set_channel_rate");
        self.channels[channel].rate = rate;
    }

    pub fn set_channel_detune(&mut self, channel: usize, cents: f32) {
        assert_channel(channel, "set_channel_detune");
        self.channels[channel].detune = cents;
    }

    pub fn stop_channel(&mut self, channel: usize) {
        assert_channel(channel, "stop_channel");
        let ch = &mut self.channels[channel];
        if ch.state != ChannelState::Stopped {
            ch.stop();
            self.commands.push(AudioCommand::StopChannel(channel));
        }
    }

    pub fn pause_channel(&mut self, channel: usize) {
        assert_channel(channel, "pause_channel");
        let ch = &mut self.channels[channel];
        if ch.state == ChannelState::Playing {
            ch.state = ChannelState::Paused;
            self.commands.push(AudioCommand::PauseChannel(channel));
        }
    }

    pub fn resume_channel(&mut self, channel: usize) {
        assert_channel(channel, "resume_channel");
        let ch = &mut self.channels[channel];
        if ch.state == ChannelState::Paused {
            ch.state = ChannelState::Playing;
            self.commands.push(AudioCommand::ResumeChannel(channel));
        }
    }

    /// Ramps the channel volume to `value` over `duration` seconds.
    /// A fade to zero pauses the channel when it completes.
    pub fn fade_channel(&mut self, channel: usize, value: f32, duration: f32, curve: FadeCurve) {
        assert_channel(channel, "fade_channel");
        let fade = Fade::new(self.channels[channel].volume, value, duration, curve);
        if fade.is_done() {
            self.channels[channel].volume = value;
            self.finish_channel_fade(channel, value);
        } else {
            self.channels[channel].fade = Some(fade);
            if value > 0.0 {
                self.resume_channel(channel);
            }
        }
    }

    pub fn channel_state(&self, channel: usize) -> ChannelState {
        assert_channel(channel, "channel_state");
        self.channels[channel].state
    }

    pub fn channel_volume(&self, channel: usize) -> f32 {
        assert_channel(channel, "channel_volume");
        self.channels[channel].volume
    }

    pub fn channel_pan(&self, channel: usize) -> f32 {
        assert_channel(channel, "channel_pan");
        self.channels[channel].pan
    }

    /// Playback rate including detune (`rate · 2^(cents/1200)`).
    pub fn channel_playback_rate(&self, channel: usize) -> f32 {
        assert_channel(channel, "channel_playback_rate");
        let ch = &self.channels[channel];
        ch.rate * (ch.detune / 1200.0).exp2()
    }

    pub fn channel_sound(&self, channel: usize) -> Option<&Sound> {
        assert_channel(channel, "channel_sound");
        self.channels[channel].sound.as_ref()
    }

    /// Channel volume times every submix on its path to Master.
    pub fn channel_gain(&self, channel: usize) -> f32 {
        assert_channel(channel, "channel_gain");
        let ch = &self.channels[channel];
        ch.volume * self.effective_volume(ch.submix)
    }

    fn finish_channel_fade(&mut self, channel: usize, target: f32) {
        self.channels[channel].fade = None;
        if target <= 0.0 {
            self.pause_channel(channel);
        }
    }

    // ── music ─────────────────────────────────────────────────────────────

    /// Preloads a track; a following `play_music` with the same path uses it.
    pub fn load_music(&mut self, path: impl AsRef<Path>) {
        self.preloaded_music = Some(path.as_ref().to_string_lossy().into());
    }

    /// Starts a track, replacing the current one.
    pub fn play_music(&mut self, path: impl AsRef<Path>, looped: bool) {
        let key: Arc<str> = path.as_ref().to_string_lossy().into();
        if self.preloaded_music.as_deref() == Some(&*key) {
            self.preloaded_music = None;
            log::debug!("music (preloaded): {key}");
        } else {
            log::debug!("music: {key}");
        }

        if self.music.is_some() {
            self.commands.push(AudioCommand::StopMusic);
        }
        self.music = Some(MusicTrack {
            path: key.clone(),
            looped,
            paused: false,
            gain: 1.0,
            position: 0.0,
            fade: None,
        });
        self.commands.push(AudioCommand::PlayMusic { path: key, looped });
    }

    pub fn pause_music(&mut self) {
        if let Some(m) = self.music.as_mut().filter(|m| !m.paused) {
            m.paused = true;
            self.commands.push(AudioCommand::PauseMusic);
        }
    }

    pub fn resume_music(&mut self) {
        if let Some(m) = self.music.as_mut().filter(|m| m.paused) {
            m.paused = false;
            self.commands.push(AudioCommand::ResumeMusic);
        }
    }

    pub fn stop_music(&mut self) {
        if self.music.take().is_some() {
            self.commands.push(AudioCommand::StopMusic);
        }
    }

    /// Linear ramp of the track gain. Fading up resumes a paused track,
    /// fading to zero pauses it once the ramp completes.
    pub fn fade_music(&mut self, target: f32, duration: f32) {
        let Some(m) = self.music.as_mut() else { return };
        let fade = Fade::new(m.gain, target, duration, FadeCurve::Linear);
        if fade.is_done() {
            m.gain = target;
            m.fade = None;
            if target <= 0.0 {
                self.pause_music();
            }
        } else {
            m.fade = Some(fade);
            if target > 0.0 {
                self.resume_music();
            }
        }
    }

    pub fn seek_music(&mut self, seconds: f32) {
        if let Some(m) = self.music.as_mut() {
            m.position = seconds.max(0.0);
            self.commands.push(AudioCommand::SeekMusic(m.position));
        }
    }

    pub fn is_music_playing(&self) -> bool {
        self.music.as_ref().is_some_and(|m| !m.paused)
    }

    pub fn music_path(&self) -> Option<&str> {
        self.music.as_ref().map(|m| &*m.path)
    }

    /// Playback position in seconds as tracked by `update`.
    pub fn music_position(&self) -> f32 {
        self.music.as_ref().map_or(0.0, |m| m.position)
    }

    pub fn music_looped(&self) -> bool {
        self.music.as_ref().is_some_and(|m| m.looped)
    }

    pub fn music_gain(&self) -> f32 {
        self.music
            .as_ref()
            .map_or(0.0, |m| m.gain * self.effective_volume(SubmixId::Music))
    }

    // ── submixes ──────────────────────────────────────────────────────────

    pub fn set_volume(&mut self, volume: f32, submix: SubmixId) {
        self.submix_volume[submix.index()] = volume;
    }

    pub fn volume(&self, submix: SubmixId) -> f32 {
        self.submix_volume[submix.index()]
    }

    /// Product of the submix volume and all of its ancestors.
    pub fn effective_volume(&self, submix: SubmixId) -> f32 {
        let mut gain = self.volume(submix);
        let mut parent = submix.parent();
        while let Some(p) = parent {
            gain *= self.volume(p);
            parent = p.parent();
        }
        gain
    }

    // ── global ────────────────────────────────────────────────────────────

    /// Suspends all output. Fades and music time stop advancing.
    pub fn pause_all(&mut self) {
        if !self.suspended {
            self.suspended = true;
            self.commands.push(AudioCommand::Suspend);
        }
    }

    pub fn resume_all(&mut self) {
        if self.suspended {
            self.suspended = false;
            self.commands.push(AudioCommand::Resume);
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Advances fades and the music position by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if self.suspended {
            return;
        }

        for i in 0..self.channels.len() {
            let Some(fade) = self.channels[i].fade.as_mut() else { continue };
            let value = fade.advance(dt);
            let done = fade.is_done();
            let target = fade.target();
            self.channels[i].volume = value;
            if done {
                self.finish_channel_fade(i, target);
            }
        }

        let mut pause_music = false;
        if let Some(m) = self.music.as_mut() {
            if !m.paused {
                m.position += dt;
            }
            if let Some(fade) = m.fade.as_mut() {
                m.gain = fade.advance(dt);
                if fade.is_done() {
                    pause_music = fade.target() <= 0.0;
                    m.fade = None;
                }
            }
        }
        if pause_music {
            self.pause_music();
        }
    }

    /// Takes the commands queued since the last drain.
    pub fn drain_commands(&mut self) -> Vec<AudioCommand> {
        std::mem::take(&mut self.commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    // ── sounds ────────────────────────────────────────────────────────────

    #[test]
    fn sounds_are_cached_by_path() {
        let mut a = Audio::new();
        let s1 = a.load_sound("sounds/hit.wav");
        let s2 = a.load_sound("sounds/hit.wav");
        let s3 = a.load_sound("sounds/jump.wav");
        assert_eq!(s1, s2);
        assert_ne!(s1.id(), s3.id());
        assert_eq!(a.sound_count(), 2);
    }

    #[test]
    fn playing_on_a_channel_replaces_it() {
        let mut a = Audio::new();
        let hit = a.load_sound("hit.wav");
        let jump = a.load_sound("jump.wav");

        a.play_sound(&hit, SoundOptions { volume: 0.5, ..SoundOptions::on_channel(3) });
        assert_eq!(a.channel_state(3), ChannelState::Playing);
        assert_eq!(a.channel_volume(3), 0.5);

        a.play_sound(&jump, SoundOptions::on_channel(3));
        assert_eq!(a.channel_sound(3), Some(&jump));
        assert_eq!(a.channel_volume(3), 1.0);
        assert_eq!(a.drain_commands().len(), 2);
    }

    #[test]
    fn fire_and_forget_leaves_channels_alone() {
        let mut a = Audio::new();
        let hit = a.load_sound("hit.wav");
        a.play_sound(&hit, SoundOptions::default());
        assert!((0..MAX_CHANNELS).all(|c| a.channel_state(c) == ChannelState::Stopped));
        let cmds = a.drain_commands();
        assert!(matches!(cmds.as_slice(), [AudioCommand::Play { .. }]));
    }

    #[test]
    #[should_panic(expected = "invalid channel 32")]
    fn channel_out_of_range_panics() {
        let mut a = Audio::new();
        a.set_channel_volume(MAX_CHANNELS, 1.0);
    }

    #[test]
    fn finished_channel_stops_unless_looped() {
        let mut a = Audio::new();
        let s = a.load_sound("a.wav");
        a.play_sound(&s, SoundOptions::on_channel(0));
        a.play_sound(&s, SoundOptions { looped: true, ..SoundOptions::on_channel(1) });
        a.channel_finished(0);
        a.channel_finished(1);
        assert_eq!(a.channel_state(0), ChannelState::Stopped);
        assert_eq!(a.channel_state(1), ChannelState::Playing);
    }

    // ── channel control ───────────────────────────────────────────────────

    #[test]
    fn pause_resume_stop() {
        let mut a = Audio::new();
        let s = a.load_sound("a.wav");
        a.play_sound(&s, SoundOptions::on_channel(5));
        a.pause_channel(5);
        assert_eq!(a.channel_state(5), ChannelState::Paused);
        a.resume_channel(5);
        assert_eq!(a.channel_state(5), ChannelState::Playing);
        a.stop_channel(5);
        assert_eq!(a.channel_state(5), ChannelState::Stopped);
        assert!(a.channel_sound(5).is_none());

        // stopped channels do not resume
        a.resume_channel(5);
        assert_eq!(a.channel_state(5), ChannelState::Stopped);
    }

    #[test]
    fn detune_scales_playback_rate() {
        let mut a = Audio::new();
        a.set_channel_rate(2, 1.5);
        a.set_channel_detune(2, 1200.0);
        assert!(approx(a.channel_playback_rate(2), 3.0));
        a.set_channel_pan(2, -4.0);
        assert_eq!(a.channel_pan(2), -1.0);
    }

    #[test]
    fn fade_to_zero_pauses_when_done() {
        let mut a = Audio::new();
        let s = a.load_sound("a.wav");
        a.play_sound(&s, SoundOptions::on_channel(0));
        a.fade_channel(0, 0.0, 1.0, FadeCurve::Linear);

        a.update(0.25);
        assert!(approx(a.channel_volume(0), 0.75));
        assert_eq!(a.channel_state(0), ChannelState::Playing);

        a.update(1.0);
        assert_eq!(a.channel_volume(0), 0.0);
        assert_eq!(a.channel_state(0), ChannelState::Paused);
    }

    #[test]
    fn fade_up_resumes_paused_channel() {
        let mut a = Audio::new();
        let s = a.load_sound("a.wav");
        a.play_sound(&s, SoundOptions { volume: 0.0, ..SoundOptions::on_channel(0) });
        a.pause_channel(0);
        a.fade_channel(0, 1.0, 2.0, FadeCurve::Exponential);
        assert_eq!(a.channel_state(0), ChannelState::Playing);
        a.update(2.0);
        assert_eq!(a.channel_volume(0), 1.0);
    }

    #[test]
    fn setting_volume_cancels_fade() {
        let mut a = Audio::new();
        a.fade_channel(1, 0.0, 1.0, FadeCurve::Linear);
        a.set_channel_volume(1, 0.4);
        a.update(1.0);
        assert_eq!(a.channel_volume(1), 0.4);
    }

    // ── submixes ──────────────────────────────────────────────────────────

    #[test]
    fn gains_multiply_down_the_tree() {
        let mut a = Audio::new();
        a.set_volume(0.5, SubmixId::Master);
        a.set_volume(0.5, SubmixId::Sfx);
        a.set_channel_volume(0, 0.8);
        assert!(approx(a.effective_volume(SubmixId::Sfx), 0.25));
        assert!(approx(a.effective_volume(SubmixId::Music), 0.5));
        assert!(approx(a.channel_gain(0), 0.2));
    }

    // ── music ─────────────────────────────────────────────────────────────

    #[test]
    fn music_lifecycle() {
        let mut a = Audio::new();
        assert!(!a.is_music_playing());

        a.load_music("music/battle.ogg");
        a.play_music("music/battle.ogg", true);
        assert!(a.is_music_playing());
        assert!(a.music_looped());

        a.update(1.5);
        assert!(approx(a.music_position(), 1.5));

        a.pause_music();
        a.update(1.0);
        assert!(!a.is_music_playing());
        assert!(approx(a.music_position(), 1.5));

        a.seek_music(10.0);
        a.resume_music();
        assert_eq!(a.music_position(), 10.0);

        a.stop_music();
        assert!(a.music_path().is_none());
    }

    #[test]
    fn music_fade_out_pauses() {
        let mut a = Audio::new();
        a.play_music("m.ogg", false);
        a.fade_music(0.0, 1.0);
        a.update(0.5);
        assert!(approx(a.music_gain(), 0.5));
        assert!(a.is_music_playing());
        a.update(0.5);
        assert!(!a.is_music_playing());

        a.fade_music(1.0, 1.0);
        assert!(a.is_music_playing());
    }

    #[test]
    fn playing_new_music_stops_the_old_track() {
        let mut a = Audio::new();
        a.play_music("a.ogg", true);
        a.drain_commands();
        a.play_music("b.ogg", true);
        let cmds = a.drain_commands();
        assert_eq!(cmds[0], AudioCommand::StopMusic);
        assert_eq!(a.music_path(), Some("b.ogg"));
    }

    // ── global ────────────────────────────────────────────────────────────

    #[test]
    fn suspended_mixer_does_not_advance() {
        let mut a = Audio::new();
        a.play_music("m.ogg", true);
        a.fade_channel(0, 0.0, 1.0, FadeCurve::Linear);
        a.pause_all();
        a.update(5.0);
        assert_eq!(a.music_position(), 0.0);
        assert_eq!(a.channel_volume(0), 1.0);

        a.resume_all();
        a.update(0.5);
        assert!(approx(a.channel_volume(0), 0.5));
    }
}
