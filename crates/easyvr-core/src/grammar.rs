//! Built-in word sets and custom grammars.
//!
//! Word sets `0..=3` are built in; grammars `4..=31` are custom ones loaded
//! with the vendor tools. Dumping a grammar reports its word count, after
//! which the module streams one label per [`EasyVr::next_word_label`] call.

use tracing::debug;

use easyvr_types::protocol::{CMD_DUMP_SI, CMD_RECOG_SI};
use easyvr_types::{GrammarInfo, ParseError, StatusCode};

use crate::device::{EasyVr, Pending, count_from_arg};
use crate::error::{Error, Result};
use crate::transport::Transport;

/// Highest word set or grammar index.
pub const GRAMMAR_MAX: u8 = 31;

impl<T: Transport> EasyVr<T> {
    /// Count the grammars on the module, built-in word sets included.
    pub async fn get_grammars_count(&mut self) -> Result<Option<u8>> {
        self.begin("get_grammars_count", CMD_DUMP_SI).await?;
        self.channel.send_argument(-1).await?;
        if !self.expect(StatusCode::Count, self.config.rx_timeout).await? {
            return Ok(None);
        }
        Ok(Some(count_from_arg(self.receive_argument().await?)))
    }

    /// Read the flags and word count of a grammar.
    ///
    /// When the grammar has words, their labels must be read with
    /// [`next_word_label`](Self::next_word_label) before anything else is
    /// sent.
    pub async fn dump_grammar(&mut self, grammar: u8) -> Result<Option<GrammarInfo>> {
        let grammar = ParseError::check_range("grammar", grammar, 0, GRAMMAR_MAX)?;
        self.begin("dump_grammar", CMD_DUMP_SI).await?;
        self.channel.send_argument(grammar).await?;
        if !self.expect(StatusCode::Grammar, self.config.rx_timeout).await? {
            return Ok(None);
        }

        let flags = count_from_arg(self.receive_argument().await?);
        let count = count_from_arg(self.receive_argument().await?);
        debug!("Grammar {}: flags 0x{:02X}, {} words", grammar, flags, count);
        if count > 0 {
            self.pending = Pending::GrammarLabels { remaining: count };
        }
        Ok(Some(GrammarInfo { flags, count }))
    }

    /// Read the next word label of the grammar being dumped.
    ///
    /// Returns `Ok(None)` once every label has been read.
    pub async fn next_word_label(&mut self) -> Result<Option<String>> {
        let remaining = match self.pending {
            Pending::GrammarLabels { remaining } => remaining,
            Pending::Idle => return Ok(None),
            pending => return Err(Error::Busy { pending }),
        };

        let label = match self.receive_label().await {
            Ok(label) => label,
            Err(e) => {
                // the rest of the stream cannot be realigned
                self.pending = Pending::Idle;
                return Err(e);
            }
        };
        self.pending = match remaining - 1 {
            0 => Pending::Idle,
            remaining => Pending::GrammarLabels { remaining },
        };
        Ok(Some(label))
    }

    /// Read a grammar with all of its word labels.
    pub async fn dump_grammar_labels(
        &mut self,
        grammar: u8,
    ) -> Result<Option<(GrammarInfo, Vec<String>)>> {
        let Some(info) = self.dump_grammar(grammar).await? else {
            return Ok(None);
        };
        let mut labels = Vec::with_capacity(usize::from(info.count));
        while let Some(label) = self.next_word_label().await? {
            labels.push(label);
        }
        Ok(Some((info, labels)))
    }

    /// Start recognition of a built-in word set or custom grammar.
    ///
    /// Poll [`has_finished`](EasyVr::has_finished), then read
    /// [`get_word`](EasyVr::get_word).
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn recognize_word(&mut self, wordset: u8) -> Result<()> {
        let wordset = ParseError::check_range("word set", wordset, 0, GRAMMAR_MAX)?;
        self.begin("recognize_word", CMD_RECOG_SI).await?;
        self.channel.send_argument(wordset).await?;
        self.start_async("recognize_word");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::device::{EasyVr, Pending};
    use crate::error::Error;
    use crate::mock::MockTransport;
    use easyvr_types::GrammarInfo;
    use easyvr_types::types::WORDSET_ACTION;

    fn engine() -> (EasyVr<MockTransport>, MockTransport) {
        let mock = MockTransport::new();
        (EasyVr::new(mock.clone()), mock)
    }

    #[tokio::test]
    async fn test_grammars_count() {
        let (mut easyvr, mock) = engine();
        mock.queue_reply(b"c").await;
        mock.queue_arguments(&[6]).await;
        assert_eq!(easyvr.get_grammars_count().await.unwrap(), Some(6));
        assert_eq!(mock.written().await, b"z@ ");
    }

    #[tokio::test]
    async fn test_dump_grammar_streams_labels() {
        let (mut easyvr, mock) = engine();
        mock.queue_reply(b"z").await;
        mock.queue_arguments(&[0x10, 2]).await;

        let info = easyvr.dump_grammar(4).await.unwrap().unwrap();
        assert_eq!(info, GrammarInfo { flags: 0x10, count: 2 });
        assert!(info.is_trigger());
        assert_eq!(easyvr.pending(), Pending::GrammarLabels { remaining: 2 });

        // no other command while labels are queued up
        assert!(matches!(
            easyvr.get_grammars_count().await,
            Err(Error::Busy { .. })
        ));

        mock.queue_arguments(&[2]).await;
        mock.queue_reply(b"GO").await;
        mock.queue_arguments(&[5]).await;
        mock.queue_reply(b"ROBOT").await;
        assert_eq!(easyvr.next_word_label().await.unwrap().as_deref(), Some("GO"));
        assert_eq!(
            easyvr.next_word_label().await.unwrap().as_deref(),
            Some("ROBOT")
        );
        assert_eq!(easyvr.next_word_label().await.unwrap(), None);
        assert_eq!(easyvr.pending(), Pending::Idle);
    }

    #[tokio::test]
    async fn test_dump_grammar_labels() {
        let (mut easyvr, mock) = engine();
        mock.queue_reply(b"z").await;
        mock.queue_arguments(&[-1, 1, 4]).await;
        mock.queue_reply(b"UP^C").await;

        let (info, labels) = easyvr.dump_grammar_labels(5).await.unwrap().unwrap();
        assert_eq!(info.flags, 32);
        assert_eq!(labels, vec!["UP2".to_string()]);
        assert_eq!(easyvr.pending(), Pending::Idle);
    }

    #[tokio::test]
    async fn test_lost_label_releases_link() {
        let (mut easyvr, mock) = engine();
        mock.queue_reply(b"z").await;
        mock.queue_arguments(&[0, 3]).await;
        easyvr.dump_grammar(4).await.unwrap();

        assert!(matches!(
            easyvr.next_word_label().await,
            Err(Error::Timeout { .. })
        ));
        assert_eq!(easyvr.pending(), Pending::Idle);
    }

    #[tokio::test]
    async fn test_recognize_word() {
        let (mut easyvr, mock) = engine();
        assert!(matches!(
            easyvr.recognize_word(32).await,
            Err(Error::Validation(_))
        ));

        easyvr.recognize_word(WORDSET_ACTION).await.unwrap();
        assert_eq!(mock.take_written().await, b"iB");

        mock.queue_reply(b"s").await;
        mock.queue_arguments(&[3]).await;
        assert!(easyvr.has_finished().await.unwrap());
        assert_eq!(easyvr.get_word(), Some(3));
        assert_eq!(easyvr.get_command(), None);
    }
}
