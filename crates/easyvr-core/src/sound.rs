//! Sound table playback.
//!
//! The sound table is built with the vendor tools and flashed to the
//! module. Entries are addressed by a 10-bit index.

use tracing::debug;

use easyvr_types::protocol::{CMD_DUMP_SX, CMD_PLAY_DTMF, CMD_PLAY_SX};
use easyvr_types::timing::split_10bit;
use easyvr_types::types::VOLUME_MAX;
use easyvr_types::{ParseError, SoundTable, StatusCode};

use crate::device::EasyVr;
use crate::error::Result;
use crate::transport::Transport;

/// Highest sound table index.
pub const SOUND_INDEX_MAX: u16 = 1023;
/// Dial tone, played for whole seconds instead of 40 ms units.
pub const DIAL_TONE: i8 = -1;
/// Highest key tone (`0..=9` digits, then `*`, `#` and `A`..`D`).
pub const TONE_MAX: i8 = 15;
/// Longest tone, in 40 ms units (seconds for the dial tone).
pub const TONE_DURATION_MAX: u8 = 32;

impl<T: Transport> EasyVr<T> {
    /// Read the name and entry count of the sound table.
    pub async fn dump_sound_table(&mut self) -> Result<Option<SoundTable>> {
        self.begin("dump_sound_table", CMD_DUMP_SX).await?;
        if !self
            .expect(StatusCode::SoundTable, self.config.rx_timeout)
            .await?
        {
            return Ok(None);
        }
        let high = self.receive_unsigned_argument().await?;
        let low = self.receive_unsigned_argument().await?;
        let count = (u16::from(high) << 5) | u16::from(low);
        let name = self.receive_label().await?;
        debug!("Sound table {:?} with {} entries", name, count);
        Ok(Some(SoundTable { name, count }))
    }

    /// Play a sound and wait until it ends.
    pub async fn play_sound(&mut self, index: u16, volume: u8) -> Result<bool> {
        self.send_play_sound("play_sound", index, volume).await?;
        self.expect_success(self.config.play_timeout).await
    }

    /// Start playing a sound.
    pub async fn play_sound_async(&mut self, index: u16, volume: u8) -> Result<()> {
        self.send_play_sound("play_sound_async", index, volume)
            .await?;
        self.start_async("play_sound_async");
        Ok(())
    }

    async fn send_play_sound(
        &mut self,
        operation: &'static str,
        index: u16,
        volume: u8,
    ) -> Result<()> {
        ParseError::check_range("sound index", index, 0, SOUND_INDEX_MAX)?;
        ParseError::check_range("volume", volume, 0, VOLUME_MAX)?;
        let [high, low] = split_10bit(index);
        self.begin(operation, CMD_PLAY_SX).await?;
        self.channel
            .send_arguments(&[high.into(), low.into(), volume.into()])
            .await
    }

    /// Play a telephone key tone or the dial tone and wait until it ends.
    ///
    /// `duration` is in 40 ms units, or in seconds for [`DIAL_TONE`].
    pub async fn play_phone_tone(&mut self, tone: i8, duration: u8) -> Result<bool> {
        ParseError::check_range("tone", tone, DIAL_TONE, TONE_MAX)?;
        ParseError::check_range("tone duration", duration, 1, TONE_DURATION_MAX)?;
        self.begin("play_phone_tone", CMD_PLAY_DTMF).await?;
        self.channel
            .send_arguments(&[-1, tone.into(), i32::from(duration) - 1])
            .await?;
        self.expect_success(self.config.play_timeout).await
    }
}

#[cfg(test)]
mod tests {
    use crate::device::EasyVr;
    use crate::error::Error;
    use crate::mock::MockTransport;
    use easyvr_types::SoundTable;
    use easyvr_types::types::VOLUME_DEFAULT;

    fn engine() -> (EasyVr<MockTransport>, MockTransport) {
        let mock = MockTransport::new();
        (EasyVr::new(mock.clone()), mock)
    }

    #[tokio::test]
    async fn test_dump_sound_table_returns_name() {
        let (mut easyvr, mock) = engine();
        mock.queue_reply(b"h").await;
        // 37 entries = (1 << 5) | 5
        mock.queue_arguments(&[1, 5, 6]).await;
        mock.queue_reply(b"SND^A_").await;

        let table = easyvr.dump_sound_table().await.unwrap();
        assert_eq!(
            table,
            Some(SoundTable {
                name: "SND0_".into(),
                count: 37
            })
        );
    }

    #[tokio::test]
    async fn test_dump_sound_table_negative_count_is_a_fault() {
        let (mut easyvr, mock) = engine();
        mock.queue_reply(b"h").await;
        mock.queue_arguments(&[1, -1]).await;

        assert!(matches!(
            easyvr.dump_sound_table().await,
            Err(Error::Protocol { .. })
        ));
        assert_eq!(easyvr.get_error(), Some(easyvr_types::ErrorCode(0)));
    }

    #[tokio::test]
    async fn test_play_sound_splits_index() {
        let (mut easyvr, mock) = engine();
        mock.queue_reply(b"o").await;

        assert!(easyvr.play_sound(100, VOLUME_DEFAULT).await.unwrap());
        // 100 = (3 << 5) | 4
        assert_eq!(mock.written().await, b"wDEQ");
    }

    #[tokio::test]
    async fn test_play_sound_limits() {
        let (mut easyvr, mock) = engine();
        assert!(matches!(
            easyvr.play_sound(1024, 0).await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            easyvr.play_sound_async(0, 32).await,
            Err(Error::Validation(_))
        ));
        assert_eq!(mock.write_count(), 0);
    }

    #[tokio::test]
    async fn test_phone_tone_sends_duration_minus_one() {
        let (mut easyvr, mock) = engine();
        mock.queue_reply(b"oo").await;

        assert!(easyvr.play_phone_tone(5, 10).await.unwrap());
        assert_eq!(mock.take_written().await, b"w@FJ");
        assert!(easyvr.play_phone_tone(-1, 32).await.unwrap());
        assert_eq!(mock.take_written().await, b"w@@`");

        assert!(matches!(
            easyvr.play_phone_tone(16, 1).await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            easyvr.play_phone_tone(0, 0).await,
            Err(Error::Validation(_))
        ));
    }
}
