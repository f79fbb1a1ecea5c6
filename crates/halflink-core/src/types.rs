//! Core types used throughout halflink.
//!
//! Configuration objects are plain immutable value types: the stack replaces
//! them wholesale and passes clones into each mode switch, so a running data
//! path never aliases the currently-configured parameter set.

use std::fmt;
use std::str::FromStr;

use bytes::{BufMut, BytesMut};

/// The exclusive operating state of the shared radio.
///
/// The receive path and the transmit path contend for the same physical
/// radio, so at most one is ever active. Transitions are owned entirely by
/// the mode controller: a stack starts `Idle`, switches between `Receiving`
/// and `Transmitting`, and returns to `Idle` only through shutdown (or a
/// failed switch, which rolls back).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// No data path active; both transport endpoints released.
    Idle,
    /// Receive data path active; only the inbound endpoint is bound.
    Receiving,
    /// Transmit data path active; only the outbound endpoint is bound.
    Transmitting,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Idle => "idle",
            Mode::Receiving => "receiving",
            Mode::Transmitting => "transmitting",
        };
        write!(f, "{s}")
    }
}

/// Baseband modulation scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modulation {
    /// On-off keying.
    Ook,
    /// Gaussian frequency-shift keying.
    Gfsk,
}

impl Modulation {
    /// Wire code used when serializing a configuration for the peer.
    pub fn code(&self) -> u8 {
        match self {
            Modulation::Ook => 0,
            Modulation::Gfsk => 1,
        }
    }
}

impl fmt::Display for Modulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Modulation::Ook => "OOK",
            Modulation::Gfsk => "GFSK",
        };
        write!(f, "{s}")
    }
}

/// SDR hardware selection, fixed for the life of a stack.
///
/// Threaded into every data-path instantiation so the factory can pick the
/// matching driver. `Test` selects a no-op pipeline for bench work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SdrSelector {
    /// No hardware; data paths are inert (bench and CI use).
    Test,
    /// USRP via the UHD driver.
    Uhd,
    /// HackRF One.
    HackRf,
}

impl fmt::Display for SdrSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SdrSelector::Test => "test",
            SdrSelector::Uhd => "uhd",
            SdrSelector::HackRf => "hackrf",
        };
        write!(f, "{s}")
    }
}

/// Error returned when a string cannot be parsed into an [`SdrSelector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSdrError(String);

impl fmt::Display for ParseSdrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown SDR selector: {}", self.0)
    }
}

impl std::error::Error for ParseSdrError {}

impl FromStr for SdrSelector {
    type Err = ParseSdrError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "test" => Ok(SdrSelector::Test),
            "uhd" | "usrp" => Ok(SdrSelector::Uhd),
            "hackrf" => Ok(SdrSelector::HackRf),
            other => Err(ParseSdrError(other.to_string())),
        }
    }
}

/// RF front-end configuration for one link direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RfConfig {
    /// Center frequency in hertz.
    pub center_freq_hz: u64,
    /// Sample rate in hertz.
    pub samp_rate_hz: u32,
    /// Front-end gain in dB.
    pub gain_db: i8,
    /// Logical channel index within the band plan.
    pub channel: u8,
}

impl RfConfig {
    /// Serialize to the fixed-order byte form exchanged with a peer.
    ///
    /// Field order and widths must match on both radios; the peer applies
    /// these bytes to configure its transmitter.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(14);
        buf.put_u64(self.center_freq_hz);
        buf.put_u32(self.samp_rate_hz);
        buf.put_i8(self.gain_db);
        buf.put_u8(self.channel);
        buf.to_vec()
    }
}

/// Baseband configuration for one link direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasebandConfig {
    /// Modulation scheme.
    pub modulation: Modulation,
    /// Symbol rate in symbols per second.
    pub symbol_rate: u32,
    /// Synchronization preamble prefixed to every outbound frame.
    ///
    /// The receive pipeline correlates on and strips this sequence, so the
    /// inbound endpoint never sees it.
    pub preamble: Vec<u8>,
}

impl BasebandConfig {
    /// Serialize to the fixed-order byte form exchanged with a peer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(6 + self.preamble.len());
        buf.put_u8(self.modulation.code());
        buf.put_u32(self.symbol_rate);
        buf.put_u8(self.preamble.len() as u8);
        buf.put_slice(&self.preamble);
        buf.to_vec()
    }
}

/// TCP addresses of the outbound and inbound frame endpoints.
///
/// The transmit pipeline listens on `tx_addr` for payload bytes to modulate;
/// the receive pipeline serves demodulated bytes on `rx_addr`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportAddresses {
    /// Address the outbound endpoint connects to in transmit mode.
    pub tx_addr: String,
    /// Address the inbound endpoint connects to in receive mode.
    pub rx_addr: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_display() {
        assert_eq!(Mode::Idle.to_string(), "idle");
        assert_eq!(Mode::Receiving.to_string(), "receiving");
        assert_eq!(Mode::Transmitting.to_string(), "transmitting");
    }

    #[test]
    fn sdr_selector_from_str() {
        assert_eq!("test".parse::<SdrSelector>().unwrap(), SdrSelector::Test);
        assert_eq!("UHD".parse::<SdrSelector>().unwrap(), SdrSelector::Uhd);
        assert_eq!("usrp".parse::<SdrSelector>().unwrap(), SdrSelector::Uhd);
        assert_eq!("hackrf".parse::<SdrSelector>().unwrap(), SdrSelector::HackRf);
        assert!("limesdr".parse::<SdrSelector>().is_err());
    }

    #[test]
    fn rf_config_to_bytes_layout() {
        let rf = RfConfig {
            center_freq_hz: 433_920_000,
            samp_rate_hz: 1_000_000,
            gain_db: 20,
            channel: 3,
        };
        let bytes = rf.to_bytes();
        assert_eq!(bytes.len(), 14);
        assert_eq!(&bytes[..8], &433_920_000u64.to_be_bytes());
        assert_eq!(&bytes[8..12], &1_000_000u32.to_be_bytes());
        assert_eq!(bytes[12], 20);
        assert_eq!(bytes[13], 3);
    }

    #[test]
    fn baseband_config_to_bytes_layout() {
        let bb = BasebandConfig {
            modulation: Modulation::Gfsk,
            symbol_rate: 9_600,
            preamble: vec![0xAA, 0xAA],
        };
        let bytes = bb.to_bytes();
        assert_eq!(bytes[0], 1);
        assert_eq!(&bytes[1..5], &9_600u32.to_be_bytes());
        assert_eq!(bytes[5], 2);
        assert_eq!(&bytes[6..], &[0xAA, 0xAA]);
    }

    #[test]
    fn configs_are_value_types() {
        let rf = RfConfig {
            center_freq_hz: 915_000_000,
            samp_rate_hz: 2_000_000,
            gain_db: 10,
            channel: 0,
        };
        let copy = rf.clone();
        assert_eq!(rf, copy);
    }
}
