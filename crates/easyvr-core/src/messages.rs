//! Recorded messages and memory maintenance.
//!
//! Messages are 8-bit recordings in 32 slots. Recording, playback and
//! erasing run in the background; check for completion with
//! [`EasyVr::has_finished`]. The maintenance requests can take tens of
//! seconds and cannot be interrupted.

use tracing::{info, warn};

use easyvr_types::protocol::{
    CMD_DUMP_RP, CMD_ERASE_RP, CMD_PLAY_RP, CMD_RECORD_RP, CMD_RESETALL, CMD_VERIFY_RP,
    RESET_ALL, RESET_COMMANDS, RESET_MESSAGES,
};
use easyvr_types::{
    MessageAttenuation, MessageInfo, MessageSpeed, MessageType, ParseError, StatusCode,
};

use crate::device::{EasyVr, NibbleOrder};
use crate::error::{Error, Result};
use crate::status::StatusOutcome;
use crate::transport::Transport;

/// Highest message slot.
pub const MESSAGE_MAX: u8 = 31;
/// Longest recording, in seconds. Zero records until memory runs out.
pub const RECORD_TIMEOUT_MAX: u8 = 31;

/// Bytes of the message length field.
const LENGTH_BYTES: usize = 6;

fn check_message(index: u8) -> Result<u8> {
    Ok(ParseError::check_range("message", index, 0, MESSAGE_MAX)?)
}

impl<T: Transport> EasyVr<T> {
    /// Start recording into a message slot.
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn record_message_async(
        &mut self,
        index: u8,
        format: MessageType,
        timeout_secs: u8,
    ) -> Result<()> {
        let index = check_message(index)?;
        if format == MessageType::Empty {
            return Err(Error::validation("cannot record an empty message type"));
        }
        ParseError::check_range("record timeout", timeout_secs, 0, RECORD_TIMEOUT_MAX)?;
        self.begin("record_message", CMD_RECORD_RP).await?;
        self.channel
            .send_arguments(&[
                -1,
                index.into(),
                format.as_arg().into(),
                timeout_secs.into(),
            ])
            .await?;
        self.start_async("record_message");
        Ok(())
    }

    /// Start playing a recorded message.
    pub async fn play_message_async(
        &mut self,
        index: u8,
        speed: MessageSpeed,
        attenuation: MessageAttenuation,
    ) -> Result<()> {
        let index = check_message(index)?;
        self.begin("play_message", CMD_PLAY_RP).await?;
        let mode = (i32::from(speed.as_arg()) << 2) | (i32::from(attenuation.as_arg()) & 3);
        self.channel
            .send_arguments(&[-1, index.into(), mode])
            .await?;
        self.start_async("play_message");
        Ok(())
    }

    /// Start erasing a recorded message.
    pub async fn erase_message_async(&mut self, index: u8) -> Result<()> {
        let index = check_message(index)?;
        self.begin("erase_message", CMD_ERASE_RP).await?;
        self.channel.send_arguments(&[-1, index.into()]).await?;
        self.start_async("erase_message");
        Ok(())
    }

    /// Read the format and length of a message slot.
    ///
    /// `Ok(None)` means the module answered with another status, decoded
    /// into the session state (usually an error, see
    /// [`get_error`](EasyVr::get_error)).
    pub async fn dump_message(&mut self, index: u8) -> Result<Option<MessageInfo>> {
        let index = check_message(index)?;
        self.begin("dump_message", CMD_DUMP_RP).await?;
        self.channel.send_arguments(&[-1, index.into()]).await?;

        let byte = self.channel.read_status(self.config.storage_timeout).await?;
        if byte != StatusCode::Message.as_byte() {
            self.decode_reply(byte).await?;
            return Ok(None);
        }

        // stays flagged if the payload breaks off
        self.session.reset_flags();
        self.session.flags.error_pending = true;

        let format = match self.receive_argument().await? {
            raw if raw >= 0 => raw as u8,
            raw => {
                return Err(Error::protocol(
                    "dump_message",
                    format!("negative message type {raw}"),
                ));
            }
        };
        let mut info = MessageInfo { format, length: 0 };
        if !info.is_empty() {
            let bytes = self
                .receive_nibble_bytes(LENGTH_BYTES, NibbleOrder::LowFirst)
                .await?;
            let mut length = [0u8; 8];
            length[..LENGTH_BYTES].copy_from_slice(&bytes);
            info.length = u32::try_from(u64::from_le_bytes(length)).map_err(|_| {
                Error::protocol("dump_message", "message length does not fit 32 bits")
            })?;
        }
        self.session.flags.error_pending = false;
        Ok(Some(info))
    }

    /// Check the message memory for corruption.
    ///
    /// `Ok(false)` means the check failed; the error code is then
    /// [`ErrorCode::CUSTOM_INVALID`](easyvr_types::ErrorCode::CUSTOM_INVALID).
    pub async fn check_messages(&mut self) -> Result<bool> {
        self.begin("check_messages", CMD_VERIFY_RP).await?;
        self.channel.send_arguments(&[-1, 0]).await?;
        let byte = self.channel.read_status(self.config.storage_timeout).await?;
        let outcome = self.decode_reply(byte).await?;
        Ok(outcome == StatusOutcome::Success)
    }

    /// Repair the message memory, erasing incomplete recordings.
    ///
    /// With `wait == false` this runs in the background like the other
    /// asynchronous requests and returns `Ok(true)` at once.
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn fix_messages(&mut self, wait: bool) -> Result<bool> {
        self.begin("fix_messages", CMD_VERIFY_RP).await?;
        self.channel.send_arguments(&[-1, 1]).await?;
        self.finish_maintenance("fix_messages", wait).await
    }

    /// Erase every custom command, group and message.
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn reset_all(&mut self, wait: bool) -> Result<bool> {
        self.reset("reset_all", RESET_ALL, wait).await
    }

    /// Erase every custom command and group. Messages stay.
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn reset_commands(&mut self, wait: bool) -> Result<bool> {
        self.reset("reset_commands", RESET_COMMANDS, wait).await
    }

    /// Erase every message. Commands and groups stay.
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn reset_messages(&mut self, wait: bool) -> Result<bool> {
        self.reset("reset_messages", RESET_MESSAGES, wait).await
    }

    async fn reset(&mut self, operation: &'static str, scope: u8, wait: bool) -> Result<bool> {
        self.begin(operation, CMD_RESETALL).await?;
        self.channel.send_raw(scope).await?;
        self.finish_maintenance(operation, wait).await
    }

    async fn finish_maintenance(&mut self, operation: &'static str, wait: bool) -> Result<bool> {
        if !wait {
            self.start_async(operation);
            return Ok(true);
        }
        info!("Waiting for {} to complete...", operation);
        let done = self.expect_success(self.config.maintenance_timeout).await?;
        if !done {
            warn!("{} did not complete", operation);
        }
        Ok(done)
    }
}
