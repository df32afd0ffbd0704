//! DNS wire-format decoding.
//!
//! The relay never rewrites packets. It reads exactly two things off the
//! wire: the question name of an inbound query, and the first A record of
//! an upstream reply. Everything else passes through verbatim.

use std::fmt;
use std::net::Ipv4Addr;

use crate::error::RelayError;

/// Fixed DNS header length.
const HEADER_LEN: usize = 12;

/// Maximum size of a DNS packet (with some headroom).
pub const MAX_PACKET_SIZE: usize = 4096;

/// TYPE code for an A record.
const TYPE_A: u16 = 1;

/// Result of scanning a reply's answer section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// First A record found in the answer section.
    Address(Ipv4Addr),
    /// The reply carried no answer records at all.
    NoAnswer,
    /// Answer records were present but none was an A record.
    NoARecord,
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Address(addr) => write!(f, "{addr}"),
            Answer::NoAnswer => write!(f, "no answer"),
            Answer::NoARecord => write!(f, "no A record found"),
        }
    }
}

/// Decode the question name of a DNS query.
///
/// Walks the length-prefixed labels after the header and joins them with
/// dots. Compression pointers never appear in queries (there is nothing
/// earlier to point at), so a pointer byte reads as an overlong label and
/// fails the bounds check.
pub fn query_name(packet: &[u8]) -> Result<String, RelayError> {
    if packet.len() <= HEADER_LEN {
        return Err(RelayError::MalformedPacket("packet too short"));
    }

    let mut pos = HEADER_LEN;
    let mut labels: Vec<String> = Vec::new();

    while pos < packet.len() {
        let len = packet[pos] as usize;
        if len == 0 {
            break;
        }
        pos += 1;
        if pos + len > packet.len() {
            return Err(RelayError::MalformedPacket("label runs past end of packet"));
        }
        labels.push(String::from_utf8_lossy(&packet[pos..pos + len]).into_owned());
        pos += len;
    }

    Ok(labels.join("."))
}

/// Extract the first IPv4 answer from a DNS reply.
///
/// A zero ANCOUNT returns [`Answer::NoAnswer`] without scanning past the
/// header. Otherwise the question section is skipped and each answer
/// record is walked until one with TYPE=A and a 4-byte RDATA turns up.
pub fn first_ipv4_answer(packet: &[u8]) -> Result<Answer, RelayError> {
    if packet.len() < HEADER_LEN {
        return Err(RelayError::MalformedPacket("packet too short"));
    }

    let answer_count = u16::from_be_bytes([packet[6], packet[7]]) as usize;
    if answer_count == 0 {
        return Ok(Answer::NoAnswer);
    }

    // Skip the question and its fixed QTYPE/QCLASS. Clients send a single
    // question; extra questions are not supported.
    let mut pos = skip_name(packet, HEADER_LEN)?;
    pos += 4;

    for _ in 0..answer_count {
        pos = skip_name(packet, pos)?;
        if pos + 10 > packet.len() {
            return Err(RelayError::MalformedPacket("answer record truncated"));
        }

        let rtype = u16::from_be_bytes([packet[pos], packet[pos + 1]]);
        let rdlength = u16::from_be_bytes([packet[pos + 8], packet[pos + 9]]) as usize;
        pos += 10;
        if pos + rdlength > packet.len() {
            return Err(RelayError::MalformedPacket(
                "record data runs past end of packet",
            ));
        }

        if rtype == TYPE_A && rdlength == 4 {
            return Ok(Answer::Address(Ipv4Addr::new(
                packet[pos],
                packet[pos + 1],
                packet[pos + 2],
                packet[pos + 3],
            )));
        }

        pos += rdlength;
    }

    Ok(Answer::NoARecord)
}

/// Advance past a possibly-compressed name starting at `pos`.
///
/// A compression pointer (top two bits set) is two bytes and ends the
/// name; a literal name is walked label by label to its zero terminator.
fn skip_name(packet: &[u8], mut pos: usize) -> Result<usize, RelayError> {
    loop {
        let Some(&len) = packet.get(pos) else {
            return Err(RelayError::MalformedPacket("name runs past end of packet"));
        };
        if len == 0 {
            return Ok(pos + 1);
        }
        if len >= 0xC0 {
            if pos + 2 > packet.len() {
                return Err(RelayError::MalformedPacket("name runs past end of packet"));
            }
            return Ok(pos + 2);
        }
        pos += 1 + len as usize;
    }
}
