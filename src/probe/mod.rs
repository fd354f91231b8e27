//! Contains logic for measuring how long the user has been idle.
//! [GenericProbe] is the main artifact of this module that picks the platform implementation.

#[cfg(feature = "win")]
pub mod win;
#[cfg(feature = "x11")]
pub mod x11;
pub mod xprintidle;

#[cfg(feature = "win")]
extern crate windows;

#[cfg(feature = "x11")]
extern crate xcb;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Duration;
use tracing::warn;

#[cfg(test)]
use mockall::automock;

/// Upper bound for a single measurement. A source that takes longer is treated as unknown.
pub const IDLE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(2);

/// Capability consulted once per activity tick.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ActivityProbe: Send {
    /// Time since the last keyboard or mouse input, or `None` when it can't be measured.
    async fn idle_since(&mut self) -> Option<Duration>;
}

/// Intended to serve as a contract platform specific idle sources must implement.
#[async_trait]
pub trait IdleSource: Send {
    async fn idle_time(&mut self) -> Result<Duration>;
}

/// Serves as a cross-compatible [ActivityProbe] implementation. Failed or timed out
/// measurements are logged and reported as unknown.
pub struct GenericProbe {
    inner: Box<dyn IdleSource>,
}

impl GenericProbe {
    pub fn new() -> Result<Self> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "win")] {
                Ok(Self::from_source(win::WindowsIdleSource::new()))
            }
            else if #[cfg(feature = "x11")] {
                Ok(Self::from_source(x11::X11IdleSource::new()?))
            }
            else {
                Ok(Self::from_source(xprintidle::XprintidleSource))
            }
        }
    }

    pub fn from_source(source: impl IdleSource + 'static) -> Self {
        Self {
            inner: Box::new(source),
        }
    }
}

#[async_trait]
impl ActivityProbe for GenericProbe {
    async fn idle_since(&mut self) -> Option<Duration> {
        let Ok(measured) = tokio::time::timeout(IDLE_TIMEOUT, self.inner.idle_time()).await else {
            warn!("Idle time measurement timed out after {IDLE_TIMEOUT:?}");
            return None;
        };
        measured
            .inspect_err(|e| warn!("Failed to measure idle time {e:?}"))
            .ok()
            .filter(|idle| *idle >= Duration::zero())
    }
}
