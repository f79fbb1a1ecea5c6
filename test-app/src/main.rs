// halflink test application -- CLI tool for exercising the host and remote
// roles of a half-duplex link against TCP pipeline stand-ins.
//
// A full two-radio bench setup uses two bridges (one per link direction)
// plus a host and a remote:
//
//   halflink-test-app bridge --ingest 127.0.0.1:52001 --deliver 127.0.0.1:52102
//   halflink-test-app bridge --ingest 127.0.0.1:52101 --deliver 127.0.0.1:52002
//   halflink-test-app remote --tx-addr 127.0.0.1:52101 --rx-addr 127.0.0.1:52102
//   halflink-test-app host   --tx-addr 127.0.0.1:52001 --rx-addr 127.0.0.1:52002
//
// The bridges play the role of the radio channel: each takes framed bytes
// from a transmit endpoint, strips the preamble the way a demodulator
// would, and serves the rest to a receive endpoint.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use halflink::{
    BasebandConfig, Modulation, RadioStack, RadioStackBuilder, RfConfig, SdrSelector,
    TransportAddresses,
};
use halflink_test_harness::MockBackend;

/// halflink test application -- exercises the link roles from the command line.
#[derive(Parser)]
#[command(name = "halflink-test-app", version, about)]
struct Cli {
    /// SDR hardware selector: test, uhd, hackrf.
    #[arg(long, default_value = "test")]
    sdr: SdrSelector,

    /// Center frequency in hertz for both directions.
    #[arg(long, default_value_t = 433_920_000)]
    freq_hz: u64,

    /// Frame preamble as hex bytes (e.g. AAAA).
    #[arg(long, default_value = "AAAA")]
    preamble: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the host role: send the uplink configuration and a message,
    /// then wait (bounded) for the remote unit's reply.
    Host {
        /// Address of the transmit pipeline's payload socket.
        #[arg(long)]
        tx_addr: String,
        /// Address of the receive pipeline's payload socket.
        #[arg(long)]
        rx_addr: String,
        /// Message to send after the configuration.
        #[arg(long, default_value = "ping")]
        message: String,
        /// Reply deadline in seconds.
        #[arg(long, default_value_t = 10)]
        timeout_secs: u64,
    },

    /// Run the remote-unit role: block until the host's command arrives,
    /// then acknowledge it.
    Remote {
        /// Address of the transmit pipeline's payload socket.
        #[arg(long)]
        tx_addr: String,
        /// Address of the receive pipeline's payload socket.
        #[arg(long)]
        rx_addr: String,
    },

    /// Bridge one link direction: forward framed messages from a transmit
    /// endpoint to a receive endpoint, stripping the preamble.
    Bridge {
        /// Listen address for the transmit side (frames in).
        #[arg(long)]
        ingest: String,
        /// Listen address for the receive side (payloads out).
        #[arg(long)]
        deliver: String,
    },
}

fn parse_hex_bytes(s: &str) -> std::result::Result<Vec<u8>, String> {
    if s.is_empty() || s.len() % 2 != 0 {
        return Err("preamble must be a non-empty even-length hex string".into());
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(|e| e.to_string()))
        .collect()
}

fn build_stack(cli: &Cli, tx_addr: &str, rx_addr: &str) -> Result<RadioStack> {
    let preamble = parse_hex_bytes(&cli.preamble).map_err(|e| anyhow::anyhow!(e))?;
    let rf = RfConfig {
        center_freq_hz: cli.freq_hz,
        samp_rate_hz: 1_000_000,
        gain_db: 20,
        channel: 0,
    };
    let bb = BasebandConfig {
        modulation: Modulation::Gfsk,
        symbol_rate: 9_600,
        preamble,
    };
    let addrs = TransportAddresses {
        tx_addr: tx_addr.to_string(),
        rx_addr: rx_addr.to_string(),
    };

    if cli.sdr != SdrSelector::Test {
        bail!("only --sdr test is wired into the test app");
    }

    let stack = RadioStackBuilder::new(rf.clone(), bb.clone(), rf, bb, addrs)
        .sdr(cli.sdr)
        .build(Box::new(MockBackend::new()))
        .context("failed to build radio stack")?;
    Ok(stack)
}

async fn run_host(
    cli: &Cli,
    tx_addr: &str,
    rx_addr: &str,
    message: &str,
    timeout: Duration,
) -> Result<()> {
    let mut stack = build_stack(cli, tx_addr, rx_addr)?;

    info!("switching to transmit");
    stack.switch_to_tx().await?;
    stack.send_uplink_config().await?;
    stack.send_str(message).await?;
    println!("sent uplink config and message {message:?}");

    info!("switching to receive");
    stack.switch_to_rx().await?;
    let reply = stack.recv_str_timeout(Some(timeout)).await?;
    if reply.is_empty() {
        println!("no reply within {}s", timeout.as_secs());
    } else {
        println!("reply: {reply:?}");
    }

    stack.shutdown().await;
    Ok(())
}

async fn run_remote(cli: &Cli, tx_addr: &str, rx_addr: &str) -> Result<()> {
    let mut stack = build_stack(cli, tx_addr, rx_addr)?;

    info!("switching to receive, waiting for host");
    stack.switch_to_rx().await?;

    // The remote unit blocks without a deadline: the host always speaks
    // eventually. Frames keep arriving until one carries a text command.
    let command = loop {
        let payload = stack.recv_bytes().await?;
        if payload.is_empty() {
            continue;
        }
        match String::from_utf8(payload.clone()) {
            Ok(text) => break text,
            Err(_) => {
                // Binary payload: the host's advertised receive config.
                println!("received configuration ({} bytes)", payload.len());
                debug!(bytes = ?payload, "configuration payload");
            }
        }
    };
    println!("command: {command:?}");

    info!("switching to transmit to acknowledge");
    stack.switch_to_tx().await?;
    stack.send_str(&format!("ack: {command}")).await?;

    stack.shutdown().await;
    Ok(())
}

async fn run_bridge(preamble: &[u8], ingest: &str, deliver: &str) -> Result<()> {
    let ingest_listener = TcpListener::bind(ingest)
        .await
        .with_context(|| format!("failed to bind ingest address {ingest}"))?;
    let deliver_listener = TcpListener::bind(deliver)
        .await
        .with_context(|| format!("failed to bind deliver address {deliver}"))?;
    println!("bridge up: {ingest} -> {deliver}");

    loop {
        let (mut tx_conn, tx_peer) = ingest_listener.accept().await?;
        info!(peer = %tx_peer, "transmit side connected");
        let (mut rx_conn, rx_peer) = deliver_listener.accept().await?;
        info!(peer = %rx_peer, "receive side connected");

        loop {
            let frame = match read_message(&mut tx_conn).await {
                Ok(frame) => frame,
                Err(e) => {
                    debug!(error = %e, "transmit side closed, awaiting next pair");
                    break;
                }
            };
            let body = match frame.strip_prefix(preamble) {
                Some(body) => body.to_vec(),
                None => {
                    warn!(
                        len = frame.len(),
                        "frame without expected preamble, passing through"
                    );
                    frame
                }
            };
            if let Err(e) = write_message(&mut rx_conn, &body).await {
                warn!(error = %e, "receive side closed, dropping frame");
                break;
            }
            debug!(bytes = body.len(), "forwarded frame");
        }
    }
}

/// Read one length-prefixed message from a stream.
async fn read_message(stream: &mut TcpStream) -> Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).await?;
    let mut msg = vec![0u8; u32::from_be_bytes(len_buf) as usize];
    stream.read_exact(&mut msg).await?;
    Ok(msg)
}

/// Write one length-prefixed message to a stream.
async fn write_message(stream: &mut TcpStream, msg: &[u8]) -> Result<()> {
    stream.write_all(&(msg.len() as u32).to_be_bytes()).await?;
    stream.write_all(msg).await?;
    stream.flush().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Command::Host {
            tx_addr,
            rx_addr,
            message,
            timeout_secs,
        } => {
            run_host(
                &cli,
                tx_addr,
                rx_addr,
                message,
                Duration::from_secs(*timeout_secs),
            )
            .await
        }
        Command::Remote { tx_addr, rx_addr } => run_remote(&cli, tx_addr, rx_addr).await,
        Command::Bridge { ingest, deliver } => {
            let preamble = parse_hex_bytes(&cli.preamble).map_err(|e| anyhow::anyhow!(e))?;
            run_bridge(&preamble, ingest, deliver).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_bytes_accepts_even_hex() {
        assert_eq!(parse_hex_bytes("AAAA").unwrap(), vec![0xAA, 0xAA]);
        assert_eq!(parse_hex_bytes("0055").unwrap(), vec![0x00, 0x55]);
    }

    #[test]
    fn parse_hex_bytes_rejects_bad_input() {
        assert!(parse_hex_bytes("").is_err());
        assert!(parse_hex_bytes("A").is_err());
        assert!(parse_hex_bytes("ZZ").is_err());
    }
}
