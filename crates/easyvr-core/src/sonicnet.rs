//! SonicNet audio tokens.
//!
//! Tokens are 4 or 8 bit values sent and detected as sound. Durations are
//! given in milliseconds and converted to the module's 27.46 ms ticks.

use tracing::info;

use easyvr_types::protocol::{CMD_RECV_SN, CMD_SEND_SN};
use easyvr_types::timing::{split_10bit, token_delay_ticks, token_timeout_ticks};
use easyvr_types::{ParseError, RejectionLevel, TokenBits};

use crate::device::EasyVr;
use crate::error::Result;
use crate::transport::Transport;

fn check_token(bits: TokenBits, token: u16) -> Result<[i8; 2]> {
    ParseError::check_range("token", token, 0, bits.max_token())?;
    Ok(split_10bit(token))
}

impl<T: Transport> EasyVr<T> {
    /// Play a token now and wait until it ends.
    pub async fn send_token(&mut self, bits: TokenBits, token: u16) -> Result<bool> {
        self.send_token_frame("send_token", bits, token).await?;
        self.expect_success(self.config.token_timeout).await
    }

    /// Start playing a token.
    pub async fn send_token_async(&mut self, bits: TokenBits, token: u16) -> Result<()> {
        self.send_token_frame("send_token_async", bits, token)
            .await?;
        self.start_async("send_token_async");
        Ok(())
    }

    async fn send_token_frame(
        &mut self,
        operation: &'static str,
        bits: TokenBits,
        token: u16,
    ) -> Result<()> {
        let [high, low] = check_token(bits, token)?;
        self.begin(operation, CMD_SEND_SN).await?;
        self.channel
            .send_arguments(&[bits.as_arg().into(), high.into(), low.into(), 0, 0])
            .await
    }

    /// Schedule a token `delay_ms` after the start of the next sound.
    ///
    /// Only the next [`play_sound`](EasyVr::play_sound) or
    /// [`play_sound_async`](EasyVr::play_sound_async) carries it.
    pub async fn embed_token(&mut self, bits: TokenBits, token: u16, delay_ms: u16) -> Result<bool> {
        let [high, low] = check_token(bits, token)?;
        let [delay_high, delay_low] = split_10bit(token_delay_ticks(delay_ms)?);
        self.begin("embed_token", CMD_SEND_SN).await?;
        self.channel
            .send_arguments(&[
                bits.as_arg().into(),
                high.into(),
                low.into(),
                delay_high.into(),
                delay_low.into(),
            ])
            .await?;
        self.expect_success(self.config.rx_timeout).await
    }

    /// Start listening for a token.
    ///
    /// `timeout_ms == 0` listens without limit. Poll
    /// [`has_finished`](EasyVr::has_finished), then read
    /// [`get_token`](EasyVr::get_token).
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn detect_token(
        &mut self,
        bits: TokenBits,
        rejection: RejectionLevel,
        timeout_ms: u16,
    ) -> Result<()> {
        let [high, low] = split_10bit(token_timeout_ticks(timeout_ms)?);
        self.begin("detect_token", CMD_RECV_SN).await?;
        self.channel
            .send_arguments(&[
                bits.as_arg().into(),
                rejection.as_arg().into(),
                high.into(),
                low.into(),
            ])
            .await?;
        info!("Listening for tokens");
        self.start_async("detect_token");
        Ok(())
    }
}
