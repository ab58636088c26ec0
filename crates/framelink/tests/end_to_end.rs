//! Two adapters over an in-memory duplex stream, exercising the full
//! publish/dispatch path: structured and raw payloads, handler lifecycle,
//! failure isolation, and terminal error delivery.

use std::io::Write;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use framelink::frame::{encode_frame, Encoding, Frame};
use framelink::registry::{CodecError, JsonMessage, Message, Registry};
use framelink::transport::{duplex, MemoryStream, Transport};
use framelink::{Adapter, AdapterError};
use serde::{Deserialize, Serialize};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Hello {
    content: String,
}

impl JsonMessage for Hello {}

#[derive(Debug, Clone, PartialEq)]
struct Binary(Vec<u8>);

impl Message for Binary {
    fn encoding() -> Encoding {
        Encoding::Raw
    }

    fn encode_payload(&self) -> Result<Bytes, CodecError> {
        Ok(Bytes::copy_from_slice(&self.0))
    }

    fn decode_payload(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(Binary(bytes.to_vec()))
    }
}

fn shared_registry() -> Arc<Registry> {
    let mut registry = Registry::new();
    registry.register::<Hello>("hello").unwrap();
    registry.register::<Binary>("binary").unwrap();
    Arc::new(registry)
}

#[derive(Debug, PartialEq)]
enum Received {
    Hello(String),
    Binary(Vec<u8>),
}

fn connected_pair(registry: &Arc<Registry>) -> (Adapter<MemoryStream>, Adapter<MemoryStream>) {
    let (left, right) = duplex();

    let sender = Adapter::new(Arc::clone(registry));
    sender.start(left).unwrap();

    let receiver = Adapter::new(Arc::clone(registry));
    receiver.start(right).unwrap();

    (sender, receiver)
}

#[test]
fn structured_and_raw_messages_arrive_in_order() {
    let registry = shared_registry();
    let (sender, receiver) = connected_pair(&registry);

    let (tx, rx) = mpsc::channel();
    let tx_hello = tx.clone();
    receiver
        .on(move |hello: &Hello| {
            tx_hello
                .send(Received::Hello(hello.content.clone()))
                .expect("collector should accept");
        })
        .unwrap();
    receiver
        .on(move |binary: &Binary| {
            tx.send(Received::Binary(binary.0.clone()))
                .expect("collector should accept");
        })
        .unwrap();

    let payload = vec![0x62, 0x69, 0x6E, 0x61, 0x72, 0x79, 0xFF];
    sender
        .send(&Hello {
            content: "Hello, World!".to_string(),
        })
        .unwrap();
    sender.send(&Binary(payload.clone())).unwrap();

    assert_eq!(
        rx.recv_timeout(RECV_TIMEOUT).unwrap(),
        Received::Hello("Hello, World!".to_string())
    );
    assert_eq!(
        rx.recv_timeout(RECV_TIMEOUT).unwrap(),
        Received::Binary(payload)
    );

    sender.close().unwrap();
}

#[test]
fn close_delivers_exactly_one_terminal_error_and_send_fails_after() {
    let registry = shared_registry();
    let (sender, receiver) = connected_pair(&registry);

    sender.close().unwrap();

    // The peer's dispatch loop observes the closed stream once.
    let err = receiver.wait().expect("terminal error should be delivered");
    assert!(matches!(
        err,
        AdapterError::Frame(framelink::frame::FrameError::ConnectionClosed)
    ));
    assert!(receiver.wait().is_none());
    assert!(receiver.is_closed());

    // The closing side's own loop dies too, and sending there fails with
    // either `Closed` or the write error, depending on timing.
    assert!(sender
        .send(&Hello {
            content: "too late".to_string(),
        })
        .is_err());
}

#[test]
fn panicking_handler_does_not_stop_siblings_or_later_frames() {
    let registry = shared_registry();
    let (sender, receiver) = connected_pair(&registry);

    receiver
        .on(|_: &Hello| panic!("handler exploded"))
        .unwrap();

    let (tx, rx) = mpsc::channel();
    receiver
        .on(move |hello: &Hello| {
            tx.send(hello.content.clone())
                .expect("collector should accept");
        })
        .unwrap();

    sender
        .send(&Hello {
            content: "first".to_string(),
        })
        .unwrap();
    sender
        .send(&Hello {
            content: "second".to_string(),
        })
        .unwrap();

    // The sibling handler saw both frames despite the panics before it.
    assert_eq!(rx.recv_timeout(RECV_TIMEOUT).unwrap(), "first");
    assert_eq!(rx.recv_timeout(RECV_TIMEOUT).unwrap(), "second");

    sender.close().unwrap();
}

#[test]
fn off_removes_only_the_given_registration() {
    let registry = shared_registry();
    let (sender, receiver) = connected_pair(&registry);

    let (first_tx, first_rx) = mpsc::channel();
    let first = receiver
        .on(move |hello: &Hello| {
            first_tx.send(hello.content.clone()).expect("should accept");
        })
        .unwrap();

    let (second_tx, second_rx) = mpsc::channel();
    receiver
        .on(move |hello: &Hello| {
            second_tx.send(hello.content.clone()).expect("should accept");
        })
        .unwrap();

    receiver.off("hello", first);

    sender
        .send(&Hello {
            content: "still delivered".to_string(),
        })
        .unwrap();

    assert_eq!(
        second_rx.recv_timeout(RECV_TIMEOUT).unwrap(),
        "still delivered"
    );
    assert!(first_rx.try_recv().is_err());

    sender.close().unwrap();
}

#[test]
fn off_all_silences_a_name_without_stopping_the_loop() {
    let registry = shared_registry();
    let (sender, receiver) = connected_pair(&registry);

    let (hello_tx, hello_rx) = mpsc::channel();
    receiver
        .on(move |hello: &Hello| {
            hello_tx.send(hello.content.clone()).expect("should accept");
        })
        .unwrap();

    let (binary_tx, binary_rx) = mpsc::channel();
    receiver
        .on(move |binary: &Binary| {
            binary_tx.send(binary.0.clone()).expect("should accept");
        })
        .unwrap();

    receiver.off_all("hello");

    sender
        .send(&Hello {
            content: "into the void".to_string(),
        })
        .unwrap();
    sender.send(&Binary(vec![1, 2, 3])).unwrap();

    // The binary frame still arrives, proving the loop ran past the
    // handler-less hello frame.
    assert_eq!(binary_rx.recv_timeout(RECV_TIMEOUT).unwrap(), vec![1, 2, 3]);
    assert!(hello_rx.try_recv().is_err());

    sender.close().unwrap();
}

#[test]
fn unregistered_inbound_names_are_dropped_silently() {
    // The sender knows one extra message type the receiver does not.
    #[derive(Debug, Serialize, Deserialize)]
    struct Extra {
        n: u32,
    }

    impl JsonMessage for Extra {}

    let mut sender_registry = Registry::new();
    sender_registry.register::<Hello>("hello").unwrap();
    sender_registry.register::<Extra>("extra").unwrap();
    let sender_registry = Arc::new(sender_registry);

    let receiver_registry = shared_registry();

    let (left, right) = duplex();
    let sender = Adapter::new(sender_registry);
    sender.start(left).unwrap();
    let receiver = Adapter::new(receiver_registry);

    let (tx, rx) = mpsc::channel();
    receiver
        .on(move |hello: &Hello| {
            tx.send(hello.content.clone()).expect("should accept");
        })
        .unwrap();
    receiver.start(right).unwrap();

    sender.send(&Extra { n: 7 }).unwrap();
    sender
        .send(&Hello {
            content: "after the unknown".to_string(),
        })
        .unwrap();

    assert_eq!(
        rx.recv_timeout(RECV_TIMEOUT).unwrap(),
        "after the unknown"
    );

    sender.close().unwrap();
}

#[test]
fn undecodable_and_mismatched_frames_are_dropped() {
    let registry = shared_registry();
    let (left, right) = duplex();
    let mut raw_sender = Transport::try_clone(&left).unwrap();

    let receiver = Adapter::new(Arc::clone(&registry));
    let (tx, rx) = mpsc::channel();
    receiver
        .on(move |hello: &Hello| {
            tx.send(hello.content.clone()).expect("should accept");
        })
        .unwrap();
    receiver.start(right).unwrap();

    // Hand-craft hostile frames on the bare stream: invalid JSON under a
    // structured name, then a raw frame for a structured-registered name.
    let mut wire = BytesMut::new();
    encode_frame(
        &Frame::new("hello", Encoding::Structured, &b"{not json"[..]),
        &mut wire,
    )
    .unwrap();
    encode_frame(
        &Frame::new("hello", Encoding::Raw, &b"wrong encoding"[..]),
        &mut wire,
    )
    .unwrap();
    encode_frame(
        &Frame::new(
            "hello",
            Encoding::Structured,
            &b"{\"content\":\"survivor\"}"[..],
        ),
        &mut wire,
    )
    .unwrap();
    raw_sender.write_all(&wire).unwrap();

    assert_eq!(rx.recv_timeout(RECV_TIMEOUT).unwrap(), "survivor");

    left.shutdown().unwrap();
    assert!(receiver.wait().is_some());
}

#[test]
fn one_registry_serves_many_adapters() {
    let registry = shared_registry();

    let (first_sender, first_receiver) = connected_pair(&registry);
    let (second_sender, second_receiver) = connected_pair(&registry);

    let (tx_a, rx_a) = mpsc::channel();
    first_receiver
        .on(move |hello: &Hello| {
            tx_a.send(hello.content.clone()).expect("should accept");
        })
        .unwrap();

    let (tx_b, rx_b) = mpsc::channel();
    second_receiver
        .on(move |hello: &Hello| {
            tx_b.send(hello.content.clone()).expect("should accept");
        })
        .unwrap();

    first_sender
        .send(&Hello {
            content: "stream one".to_string(),
        })
        .unwrap();
    second_sender
        .send(&Hello {
            content: "stream two".to_string(),
        })
        .unwrap();

    assert_eq!(rx_a.recv_timeout(RECV_TIMEOUT).unwrap(), "stream one");
    assert_eq!(rx_b.recv_timeout(RECV_TIMEOUT).unwrap(), "stream two");

    first_sender.close().unwrap();
    second_sender.close().unwrap();
}
