//! Indoor unit addressing

use std::fmt;

/// Address of one indoor unit behind the gateway
///
/// Units are addressed in two levels: the outdoor unit they hang off and
/// their own index under it. Equality and hashing use both fields, which
/// makes the address usable as a registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    /// Outdoor unit number
    pub outdoor: u8,

    /// Indoor unit number under `outdoor`
    pub indoor: u8,
}

impl Address {
    /// Wire size of an address record
    pub const SIZE: usize = 2;

    /// Broadcast address used by bulk requests
    pub const BROADCAST: Self = Self::new(0xFF, 0xFF);

    pub const fn new(outdoor: u8, indoor: u8) -> Self {
        Self { outdoor, indoor }
    }

    pub fn to_bytes(self) -> [u8; 2] {
        [self.outdoor, self.indoor]
    }
}

impl From<(u8, u8)> for Address {
    fn from((outdoor, indoor): (u8, u8)) -> Self {
        Self::new(outdoor, indoor)
    }
}

impl From<Address> for (u8, u8) {
    fn from(addr: Address) -> Self {
        (addr.outdoor, addr.indoor)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AC {}-{}", self.outdoor, self.indoor)
    }
}
