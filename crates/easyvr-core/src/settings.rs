//! Recognition settings.
//!
//! Each setter is one synchronous transaction: command byte, arguments,
//! then a `success` status. Settings live in volatile memory on the module
//! and revert to their factory values on power-up.

use tracing::info;

use easyvr_types::protocol::{
    CMD_DELAY, CMD_FAST_SD, CMD_KNOB, CMD_LANGUAGE, CMD_LEVEL, CMD_MIC_DIST, CMD_TIMEOUT,
    CMD_TRAILING,
};
use easyvr_types::timing::quantize_delay;
use easyvr_types::{CommandLatency, Distance, Knob, Language, Level, ParseError, TrailingSilence};

use crate::device::EasyVr;
use crate::error::Result;
use crate::transport::Transport;

/// Longest recognition timeout, in seconds. Zero means no limit.
pub const MAX_TIMEOUT_SECS: u8 = 31;

impl<T: Transport> EasyVr<T> {
    /// Run a setter transaction with the given arguments.
    async fn apply_setting(
        &mut self,
        operation: &'static str,
        command: u8,
        arguments: &[i32],
    ) -> Result<bool> {
        self.begin(operation, command).await?;
        self.channel.send_arguments(arguments).await?;
        self.expect_success(self.config.rx_timeout).await
    }

    /// Select the language of the built-in word sets.
    pub async fn set_language(&mut self, language: Language) -> Result<bool> {
        info!("Setting language to {:?}", language);
        self.apply_setting("set_language", CMD_LANGUAGE, &[language.as_arg().into()])
            .await
    }

    /// Set the strictness of custom command recognition.
    pub async fn set_level(&mut self, level: Level) -> Result<bool> {
        info!("Setting level to {:?}", level);
        self.apply_setting("set_level", CMD_LEVEL, &[level.as_arg().into()])
            .await
    }

    /// Set the confidence threshold of built-in words and grammars.
    pub async fn set_knob(&mut self, knob: Knob) -> Result<bool> {
        info!("Setting knob to {:?}", knob);
        self.apply_setting("set_knob", CMD_KNOB, &[knob.as_arg().into()])
            .await
    }

    /// Set the expected microphone distance.
    pub async fn set_mic_distance(&mut self, distance: Distance) -> Result<bool> {
        info!("Setting microphone distance to {:?}", distance);
        self.apply_setting(
            "set_mic_distance",
            CMD_MIC_DIST,
            &[-1, distance.as_arg().into()],
        )
        .await
    }

    /// Set the silence that ends an utterance.
    pub async fn set_trailing_silence(&mut self, silence: TrailingSilence) -> Result<bool> {
        info!("Setting trailing silence to {} ms", silence.millis());
        self.apply_setting(
            "set_trailing_silence",
            CMD_TRAILING,
            &[-1, silence.as_arg().into()],
        )
        .await
    }

    /// Select normal or fast custom command recognition.
    pub async fn set_command_latency(&mut self, latency: CommandLatency) -> Result<bool> {
        info!("Setting command latency to {:?}", latency);
        self.apply_setting(
            "set_command_latency",
            CMD_FAST_SD,
            &[-1, latency.as_arg().into()],
        )
        .await
    }

    /// Set the recognition timeout in seconds (`0` = no limit).
    pub async fn set_timeout(&mut self, seconds: u8) -> Result<bool> {
        ParseError::check_range("timeout", seconds, 0, MAX_TIMEOUT_SECS)?;
        self.apply_setting("set_timeout", CMD_TIMEOUT, &[seconds.into()])
            .await
    }

    /// Set the delay the module waits before each reply, in milliseconds.
    ///
    /// The module only knows 1 ms steps up to 10 ms, then 10 ms steps up
    /// to 100 ms and 100 ms steps up to 1 s.
    pub async fn set_delay(&mut self, millis: u16) -> Result<bool> {
        let arg = quantize_delay(millis)?;
        self.apply_setting("set_delay", CMD_DELAY, &[arg.into()])
            .await
    }
}
