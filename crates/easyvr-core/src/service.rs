//! Raw custom command data transfer.
//!
//! Exported data can be imported into another module, after which its
//! training should be checked with [`EasyVr::verify_command`].

use tracing::{debug, info};

use easyvr_types::protocol::{CMD_SERVICE, SVC_DUMP_SD, SVC_EXPORT_SD, SVC_IMPORT_SD, SVC_VERIFY_SD};
use easyvr_types::StatusCode;

use crate::device::{EasyVr, NibbleOrder, check_group, check_index};
use crate::error::{Error, Result};
use crate::transport::Transport;

/// Size of the raw data of one custom command.
pub const COMMAND_DATA_LEN: usize = 258;

impl<T: Transport> EasyVr<T> {
    async fn begin_service(
        &mut self,
        operation: &'static str,
        request: u8,
        group: u8,
        index: u8,
    ) -> Result<()> {
        let group = check_group(group)?;
        let index = check_index(index)?;
        self.begin(operation, CMD_SERVICE).await?;
        self.channel.send_raw(request).await?;
        self.channel
            .send_arguments(&[group.into(), index.into()])
            .await
    }

    /// Read the raw data of a custom command.
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn export_command(&mut self, group: u8, index: u8) -> Result<Option<Vec<u8>>> {
        self.begin_service("export_command", SVC_EXPORT_SD, group, index)
            .await?;
        if !self
            .expect(StatusCode::Service, self.config.storage_timeout)
            .await?
        {
            return Ok(None);
        }
        let reply = self.channel.receive_raw(self.config.rx_timeout).await?;
        if reply != SVC_DUMP_SD {
            return Err(Error::protocol(
                "export_command",
                format!("expected data dump, got '{}'", reply as char),
            ));
        }
        let data = self
            .receive_nibble_bytes(COMMAND_DATA_LEN, NibbleOrder::HighFirst)
            .await?;
        debug!("Exported {} bytes", data.len());
        Ok(Some(data))
    }

    /// Overwrite the raw data of a custom command.
    #[tracing::instrument(level = "info", skip(self, data))]
    pub async fn import_command(
        &mut self,
        group: u8,
        index: u8,
        data: &[u8; COMMAND_DATA_LEN],
    ) -> Result<bool> {
        let nibbles: Vec<i32> = data
            .iter()
            .flat_map(|byte| [i32::from(byte >> 4), i32::from(byte & 0x0F)])
            .collect();
        self.begin_service("import_command", SVC_IMPORT_SD, group, index)
            .await?;
        self.channel.send_arguments(&nibbles).await?;
        let imported = self.expect_success(self.config.storage_timeout).await?;
        if imported {
            info!("Imported command {}/{}", group, index);
        }
        Ok(imported)
    }

    /// Start checking the training of an imported command.
    ///
    /// Results arrive like those of [`train_command`](EasyVr::train_command).
    pub async fn verify_command(&mut self, group: u8, index: u8) -> Result<()> {
        self.begin_service("verify_command", SVC_VERIFY_SD, group, index)
            .await?;
        self.start_async("verify_command");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Pending;
    use crate::mock::MockTransport;

    fn engine() -> (EasyVr<MockTransport>, MockTransport) {
        let mock = MockTransport::new();
        (EasyVr::new(mock.clone()), mock)
    }

    fn sample_data() -> [u8; COMMAND_DATA_LEN] {
        let mut data = [0u8; COMMAND_DATA_LEN];
        for (i, byte) in data.iter_mut().enumerate() {
            *byte = (i * 7) as u8;
        }
        data
    }

    #[tokio::test]
    async fn test_export_command() {
        let (mut easyvr, mock) = engine();
        let data = sample_data();
        mock.queue_reply(b"~D").await;
        let nibbles: Vec<i32> = data
            .iter()
            .flat_map(|b| [i32::from(b >> 4), i32::from(b & 0x0F)])
            .collect();
        mock.queue_arguments(&nibbles).await;

        let exported = easyvr.export_command(1, 2).await.unwrap().unwrap();
        assert_eq!(exported, data.to_vec());
        assert_eq!(&mock.written().await[..4], b"~XBC");
    }

    #[tokio::test]
    async fn test_export_without_dump_reply() {
        let (mut easyvr, mock) = engine();
        mock.queue_reply(b"~A").await;

        assert!(matches!(
            easyvr.export_command(1, 2).await,
            Err(Error::Protocol { .. })
        ));
    }

    #[tokio::test]
    async fn test_import_command() {
        let (mut easyvr, mock) = engine();
        mock.queue_reply(b"o").await;
        let data = sample_data();

        assert!(easyvr.import_command(3, 4, &data).await.unwrap());
        let written = mock.written().await;
        assert_eq!(&written[..4], b"~IDE");
        assert_eq!(written.len(), 4 + 2 * COMMAND_DATA_LEN);
        // data[1] = 7 is sent as 0, 7
        assert_eq!(&written[6..8], b"AH");
    }

    #[tokio::test]
    async fn test_verify_command() {
        let (mut easyvr, mock) = engine();
        assert!(matches!(
            easyvr.verify_command(17, 0).await,
            Err(Error::Validation(_))
        ));

        easyvr.verify_command(16, 0).await.unwrap();
        assert_eq!(mock.written().await, b"~VQA");
        assert_eq!(
            easyvr.pending(),
            Pending::Async {
                operation: "verify_command"
            }
        );
    }
}
