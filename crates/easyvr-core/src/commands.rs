//! Custom (speaker-dependent) commands.
//!
//! Commands live in groups `0..=16` with up to 32 slots each. Group 0 is
//! the trigger group and group 16 holds passwords.

use tracing::{debug, info};

use easyvr_types::label::EncodedLabel;
use easyvr_types::protocol::{
    CMD_COUNT_SD, CMD_DUMP_SD, CMD_ERASE_SD, CMD_GROUP_SD, CMD_MASK_SD, CMD_NAME_SD,
    CMD_RECOG_SD, CMD_TRAIN_SD, CMD_UNGROUP_SD, STS_OUT_OF_MEM,
};
use easyvr_types::{CommandData, StatusCode};

use crate::device::{EasyVr, NibbleOrder, check_group, check_index, count_from_arg};
use crate::error::Result;
use crate::transport::Transport;

/// Training data bits of the dump reply.
const TRAINING_MASK: u8 = 0x07;
/// Training clashes with another custom command.
const CONFLICT_COMMAND: u8 = 0x08;
/// Training clashes with a built-in word.
const CONFLICT_BUILTIN: u8 = 0x10;

impl<T: Transport> EasyVr<T> {
    /// Add a command slot to a group.
    ///
    /// Returns `Ok(false)` when the module refuses; [`is_memory_full`]
    /// tells whether it ran out of room.
    ///
    /// [`is_memory_full`]: EasyVr::is_memory_full
    pub async fn add_command(&mut self, group: u8, index: u8) -> Result<bool> {
        let group = check_group(group)?;
        let index = check_index(index)?;
        self.begin("add_command", CMD_GROUP_SD).await?;
        self.channel
            .send_arguments(&[group.into(), index.into()])
            .await?;

        let byte = self.channel.read_status(self.config.rx_timeout).await?;
        let added = self.classify(byte, StatusCode::Success)?;
        if !added {
            self.session.reset_flags();
            self.session.flags.memory_full = byte == STS_OUT_OF_MEM;
        }
        Ok(added)
    }

    /// Remove a command from a group.
    pub async fn remove_command(&mut self, group: u8, index: u8) -> Result<bool> {
        let group = check_group(group)?;
        let index = check_index(index)?;
        self.begin("remove_command", CMD_UNGROUP_SD).await?;
        self.channel
            .send_arguments(&[group.into(), index.into()])
            .await?;
        self.expect_success(self.config.rx_timeout).await
    }

    /// Erase the training data of a command. The slot and label stay.
    pub async fn erase_command(&mut self, group: u8, index: u8) -> Result<bool> {
        let group = check_group(group)?;
        let index = check_index(index)?;
        self.begin("erase_command", CMD_ERASE_SD).await?;
        self.channel
            .send_arguments(&[group.into(), index.into()])
            .await?;
        self.expect_success(self.config.rx_timeout).await
    }

    /// Label a command.
    ///
    /// Letters are stored uppercase and anything that is neither a letter
    /// nor a digit becomes `_`.
    pub async fn set_command_label(&mut self, group: u8, index: u8, name: &str) -> Result<bool> {
        let group = check_group(group)?;
        let index = check_index(index)?;
        let label = EncodedLabel::new(name)?;
        self.begin("set_command_label", CMD_NAME_SD).await?;
        self.channel
            .send_arguments(&[group.into(), index.into(), label.units().into()])
            .await?;
        self.channel.send_raw_bytes(label.bytes()).await?;
        self.expect_success(self.config.storage_timeout).await
    }

    /// Read the label and training state of a command.
    ///
    /// Also sets the session flags: [`is_conflict`] when training clashed
    /// with another word, with [`get_command`] or [`get_word`] naming it.
    ///
    /// [`is_conflict`]: EasyVr::is_conflict
    /// [`get_command`]: EasyVr::get_command
    /// [`get_word`]: EasyVr::get_word
    pub async fn dump_command(&mut self, group: u8, index: u8) -> Result<Option<CommandData>> {
        let group = check_group(group)?;
        let index = check_index(index)?;
        self.begin("dump_command", CMD_DUMP_SD).await?;
        self.channel
            .send_arguments(&[group.into(), index.into()])
            .await?;
        if !self.expect(StatusCode::Data, self.config.rx_timeout).await? {
            return Ok(None);
        }

        let (bits, value, label) = match self.receive_command_record().await {
            Ok(record) => record,
            Err(e) => {
                self.session.force_communication_error();
                return Err(e);
            }
        };
        let training = match bits & TRAINING_MASK {
            TRAINING_MASK => 0,
            count => count,
        };
        self.session.reset_flags();
        self.session.flags.training_conflict = bits & (CONFLICT_COMMAND | CONFLICT_BUILTIN) != 0;
        self.session.flags.custom_command_recognized = bits & CONFLICT_COMMAND != 0;
        self.session.flags.builtin_word_recognized = bits & CONFLICT_BUILTIN != 0;
        self.session.last_value = i32::from(value);

        debug!("Command {}/{}: {:?}, trained {} times", group, index, label, training);
        Ok(Some(CommandData { label, training }))
    }

    /// Training bits, conflicting index and label of a dump reply.
    async fn receive_command_record(&mut self) -> Result<(u8, i8, String)> {
        // -1 means no training data at all
        let bits = match self.receive_argument().await? {
            -1 => 0,
            raw => raw as u8,
        };
        let value = self.receive_argument().await?;
        let label = self.receive_label().await?;
        Ok((bits, value, label))
    }

    /// Count the commands in a group.
    pub async fn get_command_count(&mut self, group: u8) -> Result<Option<u8>> {
        let group = check_group(group)?;
        self.begin("get_command_count", CMD_COUNT_SD).await?;
        self.channel.send_argument(group).await?;
        if !self.expect(StatusCode::Count, self.config.rx_timeout).await? {
            return Ok(None);
        }
        Ok(Some(count_from_arg(self.receive_argument().await?)))
    }

    /// Bit mask of the groups holding at least one command.
    pub async fn get_group_mask(&mut self) -> Result<Option<u32>> {
        self.begin("get_group_mask", CMD_MASK_SD).await?;
        if !self.expect(StatusCode::Mask, self.config.rx_timeout).await? {
            return Ok(None);
        }
        let bytes = self.receive_nibble_bytes(4, NibbleOrder::LowFirst).await?;
        let mut mask = [0u8; 4];
        mask.copy_from_slice(&bytes);
        Ok(Some(u32::from_le_bytes(mask)))
    }

    /// Start a training session for a command.
    ///
    /// Poll [`has_finished`](EasyVr::has_finished), then check
    /// [`get_error`](EasyVr::get_error) and [`is_conflict`](EasyVr::is_conflict).
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn train_command(&mut self, group: u8, index: u8) -> Result<()> {
        let group = check_group(group)?;
        let index = check_index(index)?;
        self.begin("train_command", CMD_TRAIN_SD).await?;
        self.channel
            .send_arguments(&[group.into(), index.into()])
            .await?;
        info!("Training started, speak now");
        self.start_async("train_command");
        Ok(())
    }

    /// Start recognition of the commands in a group.
    ///
    /// Poll [`has_finished`](EasyVr::has_finished), then read
    /// [`get_command`](EasyVr::get_command).
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn recognize_command(&mut self, group: u8) -> Result<()> {
        let group = check_group(group)?;
        self.begin("recognize_command", CMD_RECOG_SD).await?;
        self.channel.send_argument(group).await?;
        self.session.last_group = Some(group);
        self.start_async("recognize_command");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::device::{EasyVr, Pending};
    use crate::error::Error;
    use crate::mock::MockTransport;
    use crate::status::StatusFlags;
    use easyvr_types::CommandData;

    fn engine() -> (EasyVr<MockTransport>, MockTransport) {
        let mock = MockTransport::new();
        (EasyVr::new(mock.clone()), mock)
    }

    #[tokio::test]
    async fn test_add_command() {
        let (mut easyvr, mock) = engine();
        mock.queue_reply(b"o").await;

        assert!(easyvr.add_command(3, 5).await.unwrap());
        assert_eq!(mock.written().await, b"gDF");
        assert!(easyvr.session().is_clear());
    }

    #[tokio::test]
    async fn test_add_command_memory_full() {
        let (mut easyvr, mock) = engine();
        mock.queue_reply(b"m").await;

        assert!(!easyvr.add_command(1, 31).await.unwrap());
        assert!(easyvr.is_memory_full());
    }

    #[tokio::test]
    async fn test_add_command_validation() {
        let (mut easyvr, mock) = engine();
        assert!(matches!(
            easyvr.add_command(17, 0).await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            easyvr.add_command(0, 32).await,
            Err(Error::Validation(_))
        ));
        assert_eq!(mock.write_count(), 0);
    }

    #[tokio::test]
    async fn test_remove_and_erase() {
        let (mut easyvr, mock) = engine();
        mock.queue_reply(b"oo").await;

        assert!(easyvr.remove_command(0, 1).await.unwrap());
        assert_eq!(mock.take_written().await, b"uAB");
        assert!(easyvr.erase_command(16, 0).await.unwrap());
        assert_eq!(mock.take_written().await, b"eQA");
    }

    #[tokio::test]
    async fn test_set_command_label_escapes_digits() {
        let (mut easyvr, mock) = engine();
        mock.queue_reply(b"o").await;

        assert!(easyvr.set_command_label(1, 2, "lamp 2").await.unwrap());
        // 'n', group, index, seven units, then L A M P _ ^ C
        assert_eq!(mock.written().await, b"nBCHLAMP_^C");
    }

    #[tokio::test]
    async fn test_set_command_label_too_long() {
        let (mut easyvr, mock) = engine();
        let name = "0123456789012345";
        assert!(matches!(
            easyvr.set_command_label(1, 2, name).await,
            Err(Error::Validation(_))
        ));
        assert_eq!(mock.write_count(), 0);
    }

    #[tokio::test]
    async fn test_dump_command() {
        let (mut easyvr, mock) = engine();
        mock.queue_reply(b"d").await;
        // two trainings, conflicting with command 4
        mock.queue_arguments(&[0x0A, 4, 4]).await;
        mock.queue_reply(b"ON^B").await;

        let data = easyvr.dump_command(2, 0).await.unwrap();
        assert_eq!(
            data,
            Some(CommandData {
                label: "ON1".into(),
                training: 2
            })
        );
        assert!(easyvr.is_conflict());
        assert_eq!(easyvr.get_command(), Some(4));
        assert_eq!(easyvr.get_word(), None);
    }

    #[tokio::test]
    async fn test_dump_command_untrained() {
        let (mut easyvr, mock) = engine();
        mock.queue_reply(b"d").await;
        mock.queue_arguments(&[-1, 0, 0]).await;

        let data = easyvr.dump_command(2, 0).await.unwrap().unwrap();
        assert_eq!(data.training, 0);
        assert!(data.label.is_empty());
        assert!(!easyvr.is_conflict());
    }

    #[tokio::test]
    async fn test_dump_command_broken_payload_leaves_only_error() {
        let (mut easyvr, mock) = engine();
        mock.queue_reply(b"d").await;
        mock.queue_arguments(&[0x0A]).await;
        mock.queue_reply(b"o").await;

        let result = easyvr.dump_command(1, 2).await;
        assert!(matches!(result, Err(Error::Protocol { .. })));
        assert_eq!(easyvr.get_command(), None);
        assert_eq!(easyvr.get_word(), None);
        assert!(!easyvr.is_conflict());
        assert_eq!(
            easyvr.session().flags,
            StatusFlags {
                error_pending: true,
                ..Default::default()
            }
        );
        assert_eq!(easyvr.session().last_value, 0);
    }

    #[tokio::test]
    async fn test_command_count() {
        let (mut easyvr, mock) = engine();
        mock.queue_reply(b"c").await;
        mock.queue_arguments(&[-1]).await;
        assert_eq!(easyvr.get_command_count(1).await.unwrap(), Some(32));

        mock.queue_reply(b"v").await;
        assert_eq!(easyvr.get_command_count(1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_group_mask() {
        let (mut easyvr, mock) = engine();
        mock.queue_reply(b"k").await;
        // 0x03, 0x00, 0x01, 0x00 low nibble first
        mock.queue_arguments(&[3, 0, 0, 0, 1, 0, 0, 0]).await;

        assert_eq!(easyvr.get_group_mask().await.unwrap(), Some(0x0001_0003));
    }

    #[tokio::test]
    async fn test_recognize_command_cycle() {
        let (mut easyvr, mock) = engine();
        easyvr.recognize_command(1).await.unwrap();
        assert_eq!(mock.take_written().await, b"dB");
        assert!(matches!(easyvr.pending(), Pending::Async { .. }));
        assert_eq!(easyvr.session().last_group, Some(1));

        assert!(matches!(
            easyvr.get_command_count(1).await,
            Err(Error::Busy { .. })
        ));

        mock.queue_reply(b"r").await;
        mock.queue_arguments(&[7]).await;
        assert!(easyvr.has_finished().await.unwrap());
        assert_eq!(easyvr.get_command(), Some(7));
        assert_eq!(easyvr.pending(), Pending::Idle);
    }

    #[tokio::test]
    async fn test_train_command_reports_error() {
        let (mut easyvr, mock) = engine();
        easyvr.train_command(1, 3).await.unwrap();
        assert_eq!(mock.take_written().await, b"tBD");

        mock.queue_reply(b"e").await;
        mock.queue_arguments(&[0, 4]).await;
        assert!(easyvr.has_finished().await.unwrap());
        assert_eq!(
            easyvr.get_error(),
            Some(easyvr_types::ErrorCode::DATACOL_TOO_SOFT)
        );
    }
}
