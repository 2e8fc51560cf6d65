//! General purpose I/O pins.

use easyvr_types::protocol::CMD_QUERY_IO;
use easyvr_types::{PinInput, PinLevel, PinNumber, StatusCode};

use crate::device::EasyVr;
use crate::error::Result;
use crate::transport::Transport;

impl<T: Transport> EasyVr<T> {
    /// Drive a pin as an output.
    pub async fn set_pin_output(&mut self, pin: PinNumber, level: PinLevel) -> Result<bool> {
        self.begin("set_pin_output", CMD_QUERY_IO).await?;
        self.channel
            .send_arguments(&[pin.as_arg().into(), level.as_arg().into()])
            .await?;
        self.expect_success(self.config.rx_timeout).await
    }

    /// Configure a pin as an input and read its logic level.
    pub async fn get_pin_input(&mut self, pin: PinNumber, mode: PinInput) -> Result<Option<u8>> {
        self.begin("get_pin_input", CMD_QUERY_IO).await?;
        self.channel
            .send_arguments(&[pin.as_arg().into(), mode.as_arg().into()])
            .await?;
        if !self.expect(StatusCode::Pin, self.config.rx_timeout).await? {
            return Ok(None);
        }
        Ok(Some(self.receive_unsigned_argument().await?))
    }
}

#[cfg(test)]
mod tests {
    use crate::device::EasyVr;
    use crate::error::Error;
    use crate::mock::MockTransport;
    use easyvr_types::{PinInput, PinLevel, PinNumber};

    #[tokio::test]
    async fn test_pin_output() {
        let mock = MockTransport::new();
        let mut easyvr = EasyVr::new(mock.clone());
        mock.queue_reply(b"o").await;

        assert!(
            easyvr
                .set_pin_output(PinNumber::Io2, PinLevel::High)
                .await
                .unwrap()
        );
        assert_eq!(mock.written().await, b"qCB");
    }

    #[tokio::test]
    async fn test_pin_input_reads_level() {
        let mock = MockTransport::new();
        let mut easyvr = EasyVr::new(mock.clone());
        mock.queue_reply(b"p").await;
        mock.queue_arguments(&[1]).await;

        let level = easyvr
            .get_pin_input(PinNumber::Io1, PinInput::Weak)
            .await
            .unwrap();
        assert_eq!(level, Some(1));
        // level is requested with an ACK like every other argument
        assert_eq!(mock.written().await, b"qBE ");
    }

    #[tokio::test]
    async fn test_pin_input_negative_level_is_a_fault() {
        let mock = MockTransport::new();
        let mut easyvr = EasyVr::new(mock.clone());
        mock.queue_reply(b"p").await;
        mock.queue_arguments(&[-1]).await;

        assert!(matches!(
            easyvr.get_pin_input(PinNumber::Io1, PinInput::Weak).await,
            Err(Error::Protocol { .. })
        ));
        assert!(easyvr.session().flags.error_pending);
        assert_eq!(easyvr.metrics().summary().protocol_faults, 1);
    }

    #[tokio::test]
    async fn test_pin_input_declined() {
        let mock = MockTransport::new();
        let mut easyvr = EasyVr::new(mock.clone());
        mock.queue_reply(b"v").await;

        assert_eq!(
            easyvr
                .get_pin_input(PinNumber::Io3, PinInput::HighZ)
                .await
                .unwrap(),
            None
        );
    }
}
