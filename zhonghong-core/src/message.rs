//! Messages: header, ordered payload records and checksum

use bytes::{BufMut, BytesMut};
use std::fmt;

use zhonghong_types::{Address, Attribute};

use crate::{
    checksum,
    codes::{CtlCode, FuncCode, StatusKind},
    constants::ALL_UNITS,
    error::{Error, Result},
    header::Header,
    record::{OnlineRecord, Record, StatusRecord},
};

/// Which side produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Built locally, sent to the gateway
    Request,

    /// Decoded from gateway bytes
    Response,
}

/// Gateway protocol message
///
/// # Frame Structure
///
/// ```text
/// ┌─────────────┬──────────────────────────────┬─────────────┐
/// │   Header    │           Payload            │  Checksum   │
/// │   4 bytes   │  unit_count × record size    │   1 byte    │
/// └─────────────┴──────────────────────────────┴─────────────┘
/// ```
///
/// The checksum is the sum of all header and payload bytes modulo 256.
///
/// # Examples
///
/// ```
/// use zhonghong_core::Message;
/// use zhonghong_types::{Address, Attribute, Switch};
///
/// let message = Message::control(1, Address::new(1, 2), Attribute::Power(Switch::On));
/// assert_eq!(&message.encode()[..], &[0x01, 0x31, 0x01, 0x01, 0x01, 0x02, 0x37]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: Header,
    pub records: Vec<Record>,
    pub direction: Direction,
}

impl Message {
    /// Create an outbound message
    pub fn request(header: Header, records: Vec<Record>) -> Self {
        Self {
            header,
            records,
            direction: Direction::Request,
        }
    }

    /// Create an inbound message
    pub fn response(header: Header, records: Vec<Record>) -> Self {
        Self {
            header,
            records,
            direction: Direction::Response,
        }
    }

    /// Status request for a single unit
    pub fn status_query(gateway_address: u8, address: Address) -> Self {
        Self::request(
            Header::status(gateway_address, StatusKind::One, 1),
            vec![Record::Address(address)],
        )
    }

    /// Status request for every unit behind the gateway
    pub fn all_status_query(gateway_address: u8) -> Self {
        Self::request(
            Header::status(gateway_address, StatusKind::All, ALL_UNITS),
            vec![Record::Address(Address::BROADCAST)],
        )
    }

    /// Broadcast online query used by discovery
    pub fn discovery_request(gateway_address: u8) -> Self {
        Self::request(
            Header::status(gateway_address, StatusKind::Online, ALL_UNITS),
            vec![Record::Address(Address::BROADCAST)],
        )
    }

    /// Control command setting one attribute of one unit
    pub fn control(gateway_address: u8, address: Address, attribute: Attribute) -> Self {
        Self::request(
            Header::new(gateway_address, CtlCode::Control(attribute), 1),
            vec![Record::Address(address)],
        )
    }

    pub fn func_code(&self) -> FuncCode {
        self.header.func_code()
    }

    pub fn is_request(&self) -> bool {
        self.direction == Direction::Request
    }

    /// Checksum over header and payload
    pub fn checksum(&self) -> u8 {
        let mut buf = BytesMut::with_capacity(self.size());
        self.encode_body(&mut buf);
        checksum::calculate(&buf)
    }

    /// Total encoded size
    pub fn size(&self) -> usize {
        Header::SIZE
            + self.records.iter().map(Record::size).sum::<usize>()
            + Header::CHECKSUM_SIZE
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        self.header.encode_into(buf);
        for record in &self.records {
            record.encode_into(buf);
        }
    }

    /// Encode message to bytes
    ///
    /// Header, then every record in order, then the checksum byte.
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.size());
        self.encode_body(&mut buf);

        let sum = checksum::calculate(&buf);
        buf.put_u8(sum);

        buf
    }

    /// Decode one complete frame
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the checksum does not verify
    /// - the header is malformed or its codes are unknown
    /// - the frame length disagrees with the header
    /// - a control echo announces more than one unit
    /// - a status field is outside its value table
    ///
    /// # Examples
    ///
    /// ```
    /// use zhonghong_core::{Message, Record};
    ///
    /// let frame = [0x01, 0x50, 0x02, 0x01, 0x01, 0x01, 0x01, 0x57];
    /// let message = Message::decode(&frame).unwrap();
    ///
    /// assert_eq!(message.records.len(), 1);
    /// assert!(matches!(message.records[0], Record::Online(_)));
    /// ```
    pub fn decode(frame: &[u8]) -> Result<Self> {
        if !checksum::verify(frame) {
            let (received, body) = frame.split_last().map_or((0, frame), |(r, b)| (*r, b));
            return Err(Error::ChecksumMismatch {
                expected: checksum::calculate(body),
                received,
            });
        }

        let header = Header::decode(frame)?;

        if frame.len() != header.frame_len() {
            return Err(Error::FrameLength {
                expected: header.frame_len(),
                actual: frame.len(),
            });
        }

        let payload = &frame[Header::SIZE..frame.len() - Header::CHECKSUM_SIZE];

        let records = match header.ctl_code {
            CtlCode::Status(kind) if kind.carries_status() => payload
                .chunks_exact(StatusRecord::SIZE)
                .map(|chunk| StatusRecord::decode(chunk).map(Record::Status))
                .collect::<Result<Vec<_>>>()?,
            CtlCode::Status(_) => payload
                .chunks_exact(OnlineRecord::SIZE)
                .map(|chunk| OnlineRecord::decode(chunk).map(Record::Online))
                .collect::<Result<Vec<_>>>()?,
            CtlCode::Control(_) => {
                if header.unit_count != 1 {
                    return Err(Error::UnsupportedMessageShape {
                        func_code: header.func_code().into(),
                        ctl_code: header.ctl_code.raw(),
                        unit_count: header.unit_count,
                    });
                }
                vec![Record::Address(Address::new(payload[0], payload[1]))]
            }
        };

        Ok(Self::response(header, records))
    }

    /// Status records carried by this message
    pub fn status_records(&self) -> impl Iterator<Item = &StatusRecord> {
        self.records.iter().filter_map(|record| match record {
            Record::Status(status) => Some(status),
            _ => None,
        })
    }

    /// Online records carried by this message
    pub fn online_records(&self) -> impl Iterator<Item = &OnlineRecord> {
        self.records.iter().filter_map(|record| match record {
            Record::Online(online) => Some(online),
            _ => None,
        })
    }

    /// Attribute set by this message, if it is a control command or its echo
    pub fn attribute(&self) -> Option<Attribute> {
        match self.header.ctl_code {
            CtlCode::Control(attribute) => Some(attribute),
            CtlCode::Status(_) => None,
        }
    }

    /// Hex dump of the encoded frame
    pub fn hex(&self) -> String {
        hex::encode(self.encode())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.header)?;
        for record in &self.records {
            write!(f, "\n  {}", record)?;
        }
        Ok(())
    }
}
