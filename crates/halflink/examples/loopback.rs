//! Loopback demonstration without radio hardware.
//!
//! Stands in for the signal-processing subsystem with a small in-process
//! stub: one TCP listener plays the transmit pipeline (it strips the
//! preamble from whatever the stack sends), another plays the receive
//! pipeline (it serves the stored bytes back). The stack then runs a full
//! cycle: transmit a message, switch modes, and receive it.
//!
//! # Usage
//!
//! ```sh
//! cargo run -p halflink --example loopback
//! ```

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use halflink::{
    BasebandConfig, LinkEvent, Modulation, RadioStackBuilder, RfConfig, SdrSelector,
    TransportAddresses,
};
use halflink_test_harness::MockBackend;

const PREAMBLE: [u8; 2] = [0xAA, 0xAA];

/// Read one length-prefixed message from a stream.
async fn read_message(stream: &mut TcpStream) -> anyhow::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).await?;
    let mut msg = vec![0u8; u32::from_be_bytes(len_buf) as usize];
    stream.read_exact(&mut msg).await?;
    Ok(msg)
}

/// Write one length-prefixed message to a stream.
async fn write_message(stream: &mut TcpStream, msg: &[u8]) -> anyhow::Result<()> {
    stream.write_all(&(msg.len() as u32).to_be_bytes()).await?;
    stream.write_all(msg).await?;
    stream.flush().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Bind the stub pipeline sockets on ephemeral ports.
    let tx_listener = TcpListener::bind("127.0.0.1:0").await?;
    let rx_listener = TcpListener::bind("127.0.0.1:0").await?;
    let addrs = TransportAddresses {
        tx_addr: tx_listener.local_addr()?.to_string(),
        rx_addr: rx_listener.local_addr()?.to_string(),
    };

    // The pipeline stub: take one frame from the transmit side, strip the
    // preamble as a real demodulator would, serve the rest on the receive
    // side.
    let stub = tokio::spawn(async move {
        let (mut tx_conn, _) = tx_listener.accept().await?;
        let frame = read_message(&mut tx_conn).await?;
        let body = frame
            .strip_prefix(&PREAMBLE[..])
            .map(<[u8]>::to_vec)
            .unwrap_or(frame);

        let (mut rx_conn, _) = rx_listener.accept().await?;
        write_message(&mut rx_conn, &body).await?;
        // Keep the receive connection open until the stack is done.
        tokio::time::sleep(Duration::from_secs(5)).await;
        anyhow::Ok(())
    });

    let rf = RfConfig {
        center_freq_hz: 433_920_000,
        samp_rate_hz: 1_000_000,
        gain_db: 20,
        channel: 0,
    };
    let bb = BasebandConfig {
        modulation: Modulation::Gfsk,
        symbol_rate: 9_600,
        preamble: PREAMBLE.to_vec(),
    };

    let mut stack = RadioStackBuilder::new(rf.clone(), bb.clone(), rf, bb, addrs)
        .sdr(SdrSelector::Test)
        .settle_delay(Duration::from_millis(100))
        .build(Box::new(MockBackend::new()))?;
    let mut events = stack.subscribe();

    println!("Transmitting...");
    stack.switch_to_tx().await?;
    stack.send_str("hello over the link").await?;

    println!("Switching to receive...");
    stack.switch_to_rx().await?;
    let reply = stack.recv_str_timeout(Some(Duration::from_secs(2))).await?;
    println!("Received: {reply:?}");

    stack.shutdown().await;

    // Show what the link reported along the way.
    while let Ok(event) = events.try_recv() {
        match event {
            LinkEvent::ModeChanged { mode } => println!("event: mode -> {mode}"),
            LinkEvent::FrameDropped { reason } => println!("event: dropped ({reason:?})"),
            LinkEvent::ShutDown => println!("event: shut down"),
        }
    }

    stub.abort();
    Ok(())
}
