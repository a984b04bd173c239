//! Presentation surfaces. Each one forwards a single utterance per
//! submission and refuses new ones while its own command is in flight.
//! The guard is per surface: chat and voice may still overlap, and the
//! session's generation counter decides which result lands.

mod chat;
mod voice;

pub use chat::ChatSurface;
pub use voice::{
    CommandRecognizer, SpeechRecognizer, UnsupportedRecognizer, VoiceError, VoiceOutcome,
    VoiceSurface, recognizer_from_config,
};

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input; nothing was sent.
    Ignored,
    /// This surface already has a command in flight.
    Busy,
    /// A newer command committed first; this reply was dropped.
    Superseded,
    Replied(String),
}

#[derive(Debug, Default)]
pub struct Surface {
    in_flight: AtomicBool,
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Claims the surface; `None` while another submission holds it.
    pub fn try_begin(&self) -> Option<InFlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard {
                flag: &self.in_flight,
            })
    }
}

/// Releases the surface when dropped.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
