//! Cross-module checks on the protocol tables.

use easyvr_types::protocol::*;
use easyvr_types::{codec, label::EncodedLabel, StatusCode};

#[test]
fn test_command_bytes_are_outside_argument_alphabet() {
    let commands = [
        CMD_BREAK, CMD_SLEEP, CMD_KNOB, CMD_LEVEL, CMD_LANGUAGE, CMD_TIMEOUT, CMD_RECOG_SI,
        CMD_TRAIN_SD, CMD_GROUP_SD, CMD_UNGROUP_SD, CMD_RECOG_SD, CMD_ERASE_SD, CMD_NAME_SD,
        CMD_COUNT_SD, CMD_DUMP_SD, CMD_MASK_SD, CMD_RESETALL, CMD_ID, CMD_DELAY, CMD_BAUDRATE,
        CMD_QUERY_IO, CMD_PLAY_SX, CMD_DUMP_SX, CMD_DUMP_SI, CMD_SEND_SN, CMD_RECV_SN,
        CMD_SERVICE,
    ];
    for cmd in commands {
        assert!(!codec::is_argument_byte(cmd), "command '{}' collides", cmd as char);
    }
}

#[test]
fn test_shared_command_bytes() {
    assert_eq!(CMD_MIC_DIST, CMD_KNOB);
    assert_eq!(CMD_VERIFY_RP, CMD_LEVEL);
    assert_eq!(CMD_LIPSYNC, CMD_LANGUAGE);
    assert_eq!(CMD_TRAILING, CMD_TRAIN_SD);
    assert_eq!(CMD_DUMP_RP, CMD_RECOG_SD);
    assert_eq!(CMD_PLAY_RP, CMD_DUMP_SD);
    assert_eq!(CMD_RECORD_RP, CMD_RESETALL);
    assert_eq!(CMD_PLAY_DTMF, CMD_PLAY_SX);
    assert_eq!(CMD_FAST_SD, CMD_RECV_SN);
}

#[test]
fn test_ack_is_neither_status_nor_argument() {
    assert!(StatusCode::try_from(codec::ARG_ACK).is_err());
    assert!(!codec::is_argument_byte(codec::ARG_ACK));
}

#[test]
fn test_label_bytes_never_look_like_status() {
    let label = EncodedLabel::new("Hello World 42").unwrap();
    for byte in label.bytes() {
        assert!(StatusCode::try_from(*byte).is_err());
    }
}
