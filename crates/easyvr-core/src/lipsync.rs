//! Real-time lip-sync.
//!
//! While lip-sync runs the module answers every ACK with the current mouth
//! opening as an argument. Any other reply is the status that ends the
//! stream.

use tracing::{debug, info};

use easyvr_types::codec::{self, ARG_ACK};
use easyvr_types::protocol::CMD_LIPSYNC;
use easyvr_types::{ParseError, StatusCode};

use crate::device::{EasyVr, Pending};
use crate::error::{Error, Result};
use crate::transport::Transport;

/// Highest input threshold.
pub const LIPSYNC_THRESHOLD_MAX: u16 = 1023;
/// Threshold that suits a headset microphone.
pub const LIPSYNC_THRESHOLD_LOW: u16 = 270;
/// Threshold that suits an arm's length microphone.
pub const LIPSYNC_THRESHOLD_MID: u16 = 370;
/// Threshold that suits a far microphone.
pub const LIPSYNC_THRESHOLD_HIGH: u16 = 470;

impl<T: Transport> EasyVr<T> {
    /// Start lip-sync on the microphone signal.
    ///
    /// `timeout_secs == 0` runs until [`stop`](EasyVr::stop). Read positions
    /// with [`fetch_mouth_position`](Self::fetch_mouth_position).
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn realtime_lipsync(&mut self, threshold: u16, timeout_secs: u8) -> Result<bool> {
        ParseError::check_range("lip-sync threshold", threshold, 0, LIPSYNC_THRESHOLD_MAX)?;
        self.begin("realtime_lipsync", CMD_LIPSYNC).await?;
        let threshold = i32::from(threshold);
        let timeout = i32::from(timeout_secs);
        self.channel
            .send_arguments(&[
                -1,
                (threshold >> 5) & 0x1F,
                threshold & 0x1F,
                (timeout >> 4) & 0x0F,
                timeout & 0x0F,
            ])
            .await?;

        let byte = self.channel.read_status(self.config.rx_timeout).await?;
        if byte == StatusCode::LipSync.as_byte() {
            info!("Lip-sync running");
            self.pending = Pending::LipSync;
            return Ok(true);
        }
        self.decode_reply(byte).await?;
        Ok(false)
    }

    /// Read the current mouth opening, `0..=31`.
    ///
    /// Returns `Ok(None)` once lip-sync has ended; the final status is then
    /// decoded into the session state.
    pub async fn fetch_mouth_position(&mut self) -> Result<Option<u8>> {
        match self.pending {
            Pending::LipSync => {}
            Pending::Idle => return Ok(None),
            pending => return Err(Error::Busy { pending }),
        }

        self.channel.send_raw(ARG_ACK).await?;
        let byte = match self.channel.read_status(self.config.rx_timeout).await {
            Ok(byte) => byte,
            Err(e) => {
                self.pending = Pending::Idle;
                return Err(e);
            }
        };
        if codec::is_argument_byte(byte) {
            let position = codec::decode(byte)?;
            return Ok(Some(position.max(0) as u8));
        }

        debug!("Lip-sync ended with '{}'", byte as char);
        self.pending = Pending::Idle;
        self.decode_reply(byte).await?;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;

    fn engine() -> (EasyVr<MockTransport>, MockTransport) {
        let mock = MockTransport::new();
        (EasyVr::new(mock.clone()), mock)
    }

    #[tokio::test]
    async fn test_lipsync_stream() {
        let (mut easyvr, mock) = engine();
        mock.queue_reply(b"l").await;

        assert!(
            easyvr
                .realtime_lipsync(LIPSYNC_THRESHOLD_MID, 20)
                .await
                .unwrap()
        );
        // 370 = (11 << 5) | 18, 20 = (1 << 4) | 4
        assert_eq!(mock.take_written().await, b"l@LSBE");
        assert_eq!(easyvr.pending(), Pending::LipSync);

        mock.queue_arguments(&[12, 0]).await;
        assert_eq!(easyvr.fetch_mouth_position().await.unwrap(), Some(12));
        assert_eq!(easyvr.fetch_mouth_position().await.unwrap(), Some(0));

        mock.queue_reply(b"t").await;
        assert_eq!(easyvr.fetch_mouth_position().await.unwrap(), None);
        assert!(easyvr.is_timeout());
        assert_eq!(easyvr.pending(), Pending::Idle);
        assert_eq!(mock.written().await, b"   ");
    }

    #[tokio::test]
    async fn test_lipsync_refused() {
        let (mut easyvr, mock) = engine();
        mock.queue_reply(b"v").await;

        assert!(!easyvr.realtime_lipsync(100, 0).await.unwrap());
        assert!(easyvr.is_invalid());
        assert_eq!(easyvr.pending(), Pending::Idle);
    }

    #[tokio::test]
    async fn test_lipsync_threshold_range() {
        let (mut easyvr, mock) = engine();
        assert!(matches!(
            easyvr.realtime_lipsync(1024, 0).await,
            Err(Error::Validation(_))
        ));
        assert_eq!(mock.write_count(), 0);
    }

    #[tokio::test]
    async fn test_other_commands_wait_for_lipsync() {
        let (mut easyvr, mock) = engine();
        mock.queue_reply(b"l").await;
        easyvr.realtime_lipsync(270, 0).await.unwrap();

        assert!(matches!(
            easyvr.get_id().await,
            Err(Error::Busy {
                pending: Pending::LipSync
            })
        ));

        mock.queue_reply(b"i").await;
        assert!(easyvr.stop().await.unwrap());
        assert_eq!(easyvr.fetch_mouth_position().await.unwrap(), None);
    }
}
