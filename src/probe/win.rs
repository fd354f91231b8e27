use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Duration;
use windows::Win32::{
    System::SystemInformation::GetTickCount64,
    UI::Input::KeyboardAndMouse::{GetLastInputInfo, LASTINPUTINFO},
};

use super::IdleSource;

#[tracing::instrument]
pub fn get_idle_time() -> Result<Duration> {
    let mut last: LASTINPUTINFO = LASTINPUTINFO {
        cbSize: size_of::<LASTINPUTINFO>() as u32,
        dwTime: 0,
    };
    let is_success = unsafe { GetLastInputInfo(&mut last) };
    if !is_success.as_bool() {
        return Err(anyhow!("Failed to retrieve user idle time"));
    }

    // dwTime is the low 32 bits of the tick count, so compare in that width.
    let tick_count = unsafe { GetTickCount64() } as u32;
    Ok(Duration::milliseconds(
        tick_count.wrapping_sub(last.dwTime) as i64,
    ))
}

pub struct WindowsIdleSource {}

impl WindowsIdleSource {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for WindowsIdleSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdleSource for WindowsIdleSource {
    async fn idle_time(&mut self) -> Result<Duration> {
        get_idle_time()
    }
}
