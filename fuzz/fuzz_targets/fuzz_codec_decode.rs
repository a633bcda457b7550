//! Fuzz target: `codec::decode`
//!
//! Feeds arbitrary text frames to the inbound classifier and checks that
//! it never panics and that only notifications lack a correlation id.
//!
//! cargo fuzz run fuzz_codec_decode

#![no_main]

use drivegate::rpc::codec::{InboundMessage, decode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(msg) = decode(text) {
        let is_notification = matches!(msg, InboundMessage::Notification { .. });
        assert_eq!(msg.reply_id().is_none(), is_notification);
    }
});
