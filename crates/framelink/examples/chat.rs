//! Two adapters over an in-memory duplex stream exchanging typed messages.
//!
//! Run with:
//!   cargo run --example chat

use std::sync::mpsc;
use std::sync::Arc;

use bytes::Bytes;
use framelink::registry::{CodecError, Encoding, JsonMessage, Message, Registry};
use framelink::transport::duplex;
use framelink::Adapter;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct Chat {
    from: String,
    text: String,
}

impl JsonMessage for Chat {}

/// Attachments travel as raw bytes, no JSON envelope.
struct Attachment(Vec<u8>);

impl Message for Attachment {
    fn encoding() -> Encoding {
        Encoding::Raw
    }

    fn encode_payload(&self) -> Result<Bytes, CodecError> {
        Ok(Bytes::copy_from_slice(&self.0))
    }

    fn decode_payload(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(Attachment(bytes.to_vec()))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut registry = Registry::new();
    registry.register::<Chat>("chat")?;
    registry.register::<Attachment>("attachment")?;
    let registry = Arc::new(registry);

    let (alice_end, bob_end) = duplex();

    let bob = Adapter::new(Arc::clone(&registry));
    let (done_tx, done_rx) = mpsc::channel();
    let chat_done = done_tx.clone();
    bob.on(move |chat: &Chat| {
        eprintln!("[bob] {} says: {}", chat.from, chat.text);
        let _ = chat_done.send(());
    })?;
    bob.on(move |attachment: &Attachment| {
        eprintln!("[bob] received {} attachment bytes", attachment.0.len());
        let _ = done_tx.send(());
    })?;
    bob.start(bob_end)?;

    let alice = Adapter::new(registry);
    alice.start(alice_end)?;

    alice.send(&Chat {
        from: "alice".to_string(),
        text: "Hello, World!".to_string(),
    })?;
    alice.send(&Attachment(vec![0xDE, 0xAD, 0xBE, 0xEF]))?;

    // Wait for both deliveries before tearing the stream down.
    done_rx.recv()?;
    done_rx.recv()?;

    alice.close()?;
    eprintln!("alice closed; bob's loop ended: {:?}", bob.wait());

    Ok(())
}
