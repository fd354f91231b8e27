use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Duration;
use tracing::instrument;
use xcb::{
    screensaver::{QueryInfo, QueryInfoReply},
    x::Drawable,
    Connection,
};

use super::IdleSource;

/// Reads idle time through the X11 screensaver extension.
pub struct X11IdleSource {
    connection: Connection,
    preferred_screen: i32,
}

impl X11IdleSource {
    pub fn new() -> Result<Self> {
        let (connection, preferred_screen) =
            Connection::connect_with_extensions(None, &[xcb::Extension::ScreenSaver], &[])?;
        Ok(Self {
            connection,
            preferred_screen,
        })
    }
}

#[async_trait]
impl IdleSource for X11IdleSource {
    #[instrument(skip(self))]
    async fn idle_time(&mut self) -> Result<Duration> {
        let setup = self.connection.get_setup();
        // Currently the application only supports 1 x11 screen.
        let root = setup
            .roots()
            .nth(self.preferred_screen.max(0) as usize)
            .ok_or_else(|| anyhow!("No screen {}", self.preferred_screen))?
            .root();
        let idle = self.connection.send_request(&QueryInfo {
            drawable: Drawable::Window(root),
        });
        let reply: QueryInfoReply = self.connection.wait_for_reply(idle)?;
        Ok(Duration::milliseconds(reply.ms_since_user_input() as i64))
    }
}
