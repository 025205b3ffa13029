//! SNTP wire format
//!
//! Fixed 48-byte packets in both directions:
//! - Byte 0: LI (2 bits) + VN (3 bits) + Mode (3 bits)
//! - Bytes 1-39: header fields a client request leaves zeroed
//! - Bytes 40-43: transmit timestamp, seconds since 1900-01-01 UTC (BE)
//! - Bytes 44-47: transmit timestamp, fractional seconds as a 32-bit
//!   binary fraction (BE)
//!
//! Era 0 arithmetic only; the 32-bit seconds field is taken at face value,
//! which holds until 2036-02-07.

use chrono::{DateTime, Utc};

use meridian_core::{MeridianError, MeridianResult};

/// SNTP packet size in bytes
pub const PACKET_SIZE: usize = 48;

/// LI = 0 (no warning), VN = 3, Mode = 3 (client)
pub const CLIENT_MODE_BYTE: u8 = 0x1B;

/// LI = 0, VN = 3, Mode = 4 (server)
pub const SERVER_MODE_BYTE: u8 = 0x1C;

/// Seconds between the NTP epoch (1900-01-01) and the Unix epoch (1970-01-01)
pub const NTP_UNIX_EPOCH_DELTA: u64 = 2_208_988_800;

/// Byte offset of the transmit-timestamp seconds field
const TRANSMIT_SECONDS: usize = 40;

/// Byte offset of the transmit-timestamp fraction field
const TRANSMIT_FRACTION: usize = 44;

/// Build a client request packet
pub fn client_request() -> [u8; PACKET_SIZE] {
    let mut packet = [0u8; PACKET_SIZE];
    packet[0] = CLIENT_MODE_BYTE;
    packet
}

/// Extract the transmit timestamp from a server response
pub fn parse_transmit_timestamp(buf: &[u8]) -> MeridianResult<DateTime<Utc>> {
    if buf.len() < PACKET_SIZE {
        return Err(MeridianError::PacketTooShort {
            expected: PACKET_SIZE,
            actual: buf.len(),
        });
    }

    // Bytes 40-43: seconds, network byte order
    let seconds = u32::from_be_bytes(buf[TRANSMIT_SECONDS..TRANSMIT_SECONDS + 4].try_into().unwrap());

    // Bytes 44-47: fraction, units of 1/2^32 seconds
    let fraction = u32::from_be_bytes(buf[TRANSMIT_FRACTION..TRANSMIT_FRACTION + 4].try_into().unwrap());

    let ntp_millis = seconds as u64 * 1000 + ((fraction as u64 * 1000) >> 32);
    let unix_millis = ntp_millis as i64 - (NTP_UNIX_EPOCH_DELTA * 1000) as i64;

    // u32 seconds keep this well inside chrono's representable range
    Ok(DateTime::from_timestamp_millis(unix_millis).unwrap())
}

/// Build a server response carrying a transmit timestamp
///
/// Only the fields this client reads are populated; used by loopback test
/// servers and simulators.
pub fn server_response(transmit: DateTime<Utc>) -> [u8; PACKET_SIZE] {
    let mut packet = [0u8; PACKET_SIZE];
    packet[0] = SERVER_MODE_BYTE;

    let unix_millis = transmit.timestamp_millis();
    let ntp_millis = unix_millis + (NTP_UNIX_EPOCH_DELTA * 1000) as i64;
    let seconds = (ntp_millis / 1000) as u32;
    let fraction = (((ntp_millis % 1000) as u64) << 32) / 1000;

    packet[TRANSMIT_SECONDS..TRANSMIT_SECONDS + 4].copy_from_slice(&seconds.to_be_bytes());
    packet[TRANSMIT_FRACTION..TRANSMIT_FRACTION + 4].copy_from_slice(&(fraction as u32).to_be_bytes());
    packet
}
