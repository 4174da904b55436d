//! Property-based tests for the envelope codec

use proptest::prelude::*;
use talkroom::shared::codec::{self, Inbound};
use talkroom::shared::{DecodeError, Message};

proptest! {
    #[test]
    fn test_unregistered_kind_is_unknown(kind in "[a-zA-Z_]{1,16}") {
        prop_assume!(codec::lookup(&kind).is_none());
        let frame = serde_json::json!({ "kind": kind, "content": "x" }).to_string();
        let result = codec::decode(frame.as_bytes());
        prop_assert!(
            matches!(&result, Err(DecodeError::UnknownKind { kind: k }) if *k == kind),
            "unexpected result: {:?}",
            result
        );
    }

    #[test]
    fn test_text_content_survives_encoding(content in ".*", author in "[a-z0-9]{1,12}") {
        let message = Message::text("r1", author, content);
        let decoded = codec::decode(codec::encode(&message).as_bytes()).unwrap();
        prop_assert_eq!(decoded, Inbound::Content(message));
    }

    #[test]
    fn test_decode_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let _ = codec::decode(&bytes);
    }

    #[test]
    fn test_typing_flag_is_read(is_typing in any::<bool>()) {
        let frame = serde_json::json!({ "kind": "typing", "is_typing": is_typing }).to_string();
        match codec::decode(frame.as_bytes()).unwrap() {
            Inbound::Typing(body) => prop_assert_eq!(body.is_typing, is_typing),
            other => prop_assert!(false, "expected typing, got {:?}", other),
        }
    }
}
