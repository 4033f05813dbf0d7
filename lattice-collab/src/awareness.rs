//! Per-peer presence state (who is looking at what).
//!
//! The channel stores this peer's own ephemeral state: display name, a
//! stable cursor color and the text selection. It is deliberately local.
//! Presence is **not propagated** between simulated peers: `subscribe`
//! returns an [`InertSubscription`] that never fires, and says so via
//! [`InertSubscription::is_live`].

use serde::{Deserialize, Serialize};

use crate::events::Listener;

/// RGBA color for cursor/selection rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CursorColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl CursorColor {
    /// Stable, visually distinct color for a replica.
    ///
    /// Hue is spread by a prime stride so consecutive replica ids land far
    /// apart on the color wheel.
    pub fn from_replica(replica_id: u64) -> Self {
        let hue = (replica_id.wrapping_mul(137) % 360) as f32 / 360.0;
        let (r, g, b) = hsl_to_rgb(hue, 0.7, 0.6);
        Self { r, g, b, a: 1.0 }
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for CursorColor {
    fn default() -> Self {
        Self { r: 0.26, g: 0.52, b: 0.96, a: 1.0 }
    }
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (f32, f32, f32) {
    if s == 0.0 {
        return (l, l, l);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    (
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    )
}

fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}

/// Text selection in document character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextCursor {
    pub anchor: u32,
    pub focus: u32,
}

impl TextCursor {
    pub fn collapsed(offset: u32) -> Self {
        Self { anchor: offset, focus: offset }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

/// A peer's presence state. Default is empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AwarenessState {
    pub user_name: Option<String>,
    pub color: CursorColor,
    pub cursor: Option<TextCursor>,
}

/// Handle returned by [`AwarenessChannel::subscribe`]. Never delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InertSubscription {
    _private: (),
}

impl InertSubscription {
    /// Always `false`: presence changes of other peers are not simulated.
    pub fn is_live(&self) -> bool {
        false
    }
}

/// Local key-value presence store for one peer.
#[derive(Debug, Clone, Default)]
pub struct AwarenessChannel {
    state: AwarenessState,
}

impl AwarenessChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: AwarenessState) -> Self {
        Self { state }
    }

    pub fn get(&self) -> &AwarenessState {
        &self.state
    }

    /// Replace the state wholesale (no merge).
    pub fn set(&mut self, state: AwarenessState) {
        self.state = state;
    }

    /// Accepted for API compatibility only.
    ///
    /// The listener is dropped and will never be called: callers receive no
    /// cross-peer presence updates from this simulation.
    pub fn subscribe(&self, listener: Listener<AwarenessState>) -> InertSubscription {
        drop(listener);
        log::debug!("Awareness subscribe ignored: presence is not propagated between peers");
        InertSubscription { _private: () }
    }

    /// Counterpart of [`subscribe`](Self::subscribe). Does nothing.
    pub fn unsubscribe(&self, subscription: InertSubscription) {
        log::debug!("Awareness unsubscribe ignored (live: {})", subscription.is_live());
    }
}
