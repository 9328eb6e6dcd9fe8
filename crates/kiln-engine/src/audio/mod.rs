//! Sound/music mixer state.
//!
//! `Audio` tracks what should be playing and at which gain. A platform device
//! consumes its command queue and effective gains; nothing here touches an
//! output stream.

mod fade;
mod mixer;
mod types;

pub use mixer::Audio;
pub use types::{
    AudioCommand, ChannelState, FadeCurve, Sound, SoundOptions, SubmixId, MAX_CHANNELS,
};
