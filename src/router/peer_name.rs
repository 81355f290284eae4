use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

use anyhow::anyhow;
use bytes::{Buf, BufMut};


/// A [PeerName] is the stable identifier of a peer in the mesh. It is derived from a peer's
///  hardware address when the overlay starts up, and it outlives any particular connection to
///  that peer.
///
/// On the wire it is a fixed eight bytes; for humans it is rendered in the usual
///  colon-separated MAC notation of its lower 48 bits.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PeerName(pub u64);

impl PeerName {
    pub const fn new(value: u64) -> PeerName {
        PeerName(value)
    }

    pub fn ser(&self, buf: &mut impl BufMut) {
        buf.put_u64(self.0);
    }

    pub fn try_deser(buf: &mut impl Buf) -> anyhow::Result<PeerName> {
        Ok(PeerName(buf.try_get_u64()?))
    }
}

impl Display for PeerName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let b = self.0.to_be_bytes();
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}", b[2], b[3], b[4], b[5], b[6], b[7])
    }
}

impl Debug for PeerName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl FromStr for PeerName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s.split(':').collect::<Vec<_>>();
        if parts.len() != 6 {
            return Err(anyhow!("invalid peer name {:?}: expected six colon-separated octets", s));
        }

        let mut value = 0u64;
        for part in parts {
            if part.len() != 2 {
                return Err(anyhow!("invalid peer name {:?}: octets must be two hex digits", s));
            }
            let octet = u8::from_str_radix(part, 16)
                .map_err(|_| anyhow!("invalid peer name {:?}: {:?} is not a hex octet", s, part))?;
            value = (value << 8) | octet as u64;
        }
        Ok(PeerName(value))
    }
}
