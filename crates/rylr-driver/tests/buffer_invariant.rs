//! Property tests: receive buffer cursors and payload fidelity under
//! arbitrary link traffic.

use proptest::prelude::*;
use rylr_driver::{LoraModem, ManualClock, ModemConfig, ScriptedTransport};

#[derive(Debug, Clone)]
enum Chunk {
    Message { address: u16, data: Vec<u8> },
    Response(&'static str),
    Garbage(Vec<u8>),
}

impl Chunk {
    fn bytes(&self) -> Vec<u8> {
        match self {
            Chunk::Message { address, data } => {
                let mut out = format!("+RCV={},{},", address, data.len()).into_bytes();
                out.extend_from_slice(data);
                out.extend_from_slice(b",-50,7\r\n");
                out
            }
            Chunk::Response(text) => format!("{}\r\n", text).into_bytes(),
            Chunk::Garbage(bytes) => bytes.clone(),
        }
    }
}

fn chunk() -> impl Strategy<Value = Chunk> {
    prop_oneof![
        4 => (any::<u16>(), proptest::collection::vec(any::<u8>(), 0..40))
            .prop_map(|(address, data)| Chunk::Message { address, data }),
        2 => prop_oneof![Just("+OK"), Just("+ERR=4"), Just("+READY"), Just("+VER=1.2")]
            .prop_map(Chunk::Response),
        1 => proptest::collection::vec(any::<u8>(), 0..60).prop_map(Chunk::Garbage),
    ]
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Await,
    Poll,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![Just(Op::Await), Just(Op::Poll)]
}

fn config() -> ModemConfig {
    ModemConfig {
        max_data_len: 40,
        rx_buffer_frames: 2,
        ..ModemConfig::default()
    }
}

proptest! {
    #[test]
    fn prop_buffer_invariant(
        chunks in proptest::collection::vec(chunk(), 0..12),
        ops in proptest::collection::vec(op(), 1..24),
    ) {
        let mut transport = ScriptedTransport::new();
        for chunk in &chunks {
            transport.push_rx(&chunk.bytes());
        }
        let mut modem = LoraModem::with_clock(transport, config(), ManualClock::new());

        for op in ops {
            match op {
                Op::Await => {
                    let _ = modem.await_response();
                }
                Op::Poll => {
                    let _ = modem.poll_message();
                }
            }
            let buffer = modem.buffer();
            prop_assert!(buffer.read_cursor() <= buffer.write_cursor());
            prop_assert!(buffer.write_cursor() <= buffer.capacity());
            if buffer.read_cursor() == buffer.write_cursor() {
                prop_assert_eq!(buffer.write_cursor(), 0);
            }
        }
    }

    #[test]
    fn prop_payload_byte_exact(
        messages in proptest::collection::vec(
            (any::<u16>(), proptest::collection::vec(any::<u8>(), 0..40)),
            1..8,
        ),
    ) {
        let mut transport = ScriptedTransport::new();
        for (address, data) in &messages {
            let chunk = Chunk::Message { address: *address, data: data.clone() };
            transport.push_rx(&chunk.bytes());
        }
        let mut modem = LoraModem::with_clock(transport, config(), ManualClock::new());

        for (address, data) in &messages {
            let msg = modem.poll_message();
            prop_assert!(msg.is_some());
            let msg = msg.map(|m| m.to_owned_message());
            prop_assert_eq!(msg.as_ref().map(|m| m.from_address), Some(*address));
            prop_assert_eq!(msg.as_ref().map(|m| &m.data), Some(data));
        }
        prop_assert!(modem.poll_message().is_none());
        prop_assert_eq!(modem.stats().rx_errors, 0);
    }
}
