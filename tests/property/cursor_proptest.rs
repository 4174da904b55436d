//! Property-based tests for cursors and range queries

use proptest::prelude::*;
use talkroom::backend::chat::log::{Cursor, CursorScheme, InMemoryLog, MessageLog};
use talkroom::shared::Message;
use uuid::Uuid;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn test_offset_cursor_display_parses_back(n in any::<u64>()) {
        let cursor = Cursor::Offset(n);
        prop_assert_eq!(cursor.to_string().parse::<Cursor>().unwrap(), cursor);
    }

    #[test]
    fn test_id_cursor_display_parses_back(bits in any::<u128>()) {
        let cursor = Cursor::Id(Uuid::from_u128(bits));
        prop_assert_eq!(cursor.to_string().parse::<Cursor>().unwrap(), cursor);
    }

    #[test]
    fn test_non_numeric_cursor_is_rejected(raw in "[g-z]{1,12}") {
        prop_assert!(raw.parse::<Cursor>().is_err());
    }

    #[test]
    fn test_range_after_cursor_returns_suffix(
        count in 1usize..30,
        pick in any::<prop::sample::Index>(),
        stream in any::<bool>(),
    ) {
        let scheme = if stream { CursorScheme::TrimmedStream } else { CursorScheme::CappedList };
        let log = InMemoryLog::new(scheme, 100);

        let (cursors, all) = runtime().block_on(async {
            let mut cursors = Vec::new();
            for n in 0..count {
                let cursor = log.append("r1", &Message::text("r1", "u1", n.to_string())).await.unwrap();
                cursors.push(cursor);
            }
            (cursors, log.range("r1", None).await.unwrap())
        });

        let i = pick.index(count);
        let after = runtime().block_on(log.range("r1", Some(cursors[i]))).unwrap();
        prop_assert_eq!(after.len(), count - i - 1);
        prop_assert_eq!(after, all[i + 1..].to_vec());
    }
}
