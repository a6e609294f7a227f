//! Dotted-quad parsing and CIDR prefixes split into octet keys.

use std::fmt::{self, Display, Formatter};
use std::net::Ipv4Addr;
use std::ops::Range;

use crate::{Error, Result};

/// Number of octets, and so nesting levels, in an IPv4 address.
pub const LEVELS: usize = 4;

/// Shortest prefix that can be expanded, it always fixes the first octet.
pub const MIN_PREFIX_LEN: u8 = 8;
/// Prefix lengths must stay strictly below this, exact addresses use [parse_ipv4].
pub const MAX_PREFIX_LEN: u8 = 32;

/// Parse a strict dotted-quad address, `a.b.c.d` with decimal octets.
pub fn parse_ipv4(text: &str) -> Result<Ipv4Addr> {
    text.parse::<Ipv4Addr>()
        .map_err(|_| Error::InvalidAddress(text.to_string()))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// A canonical IPv4 subnet with a prefix length in `8..32`.
pub struct Cidr {
    network: Ipv4Addr,
    prefix_len: u8,
}

impl Cidr {
    /// Create a subnet from its base address and prefix length.
    ///
    /// Fails if the prefix length is outside `8..32` or if any bit of
    /// `network` below the prefix is set.
    pub fn new(network: Ipv4Addr, prefix_len: u8) -> Result<Cidr> {
        if !(MIN_PREFIX_LEN..MAX_PREFIX_LEN).contains(&prefix_len) {
            return Err(Error::PrefixOutOfRange(prefix_len as u32));
        }

        // Shifting out the prefix leaves only host bits.
        if u32::from(network) << prefix_len != 0 {
            return Err(Error::NonCanonicalSubnet {
                network,
                prefix_len,
            });
        }

        Ok(Cidr {
            network,
            prefix_len,
        })
    }

    /// Parse `a.b.c.d/len`.
    pub fn parse(text: &str) -> Result<Cidr> {
        let (address, prefix_len) = text
            .split_once('/')
            .ok_or_else(|| Error::MissingPrefixSeparator(text.to_string()))?;

        // `u32::from_str` alone would accept a leading `+`.
        let prefix_len: u32 = Some(prefix_len)
            .filter(|len| !len.is_empty() && len.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|len| len.parse().ok())
            .ok_or_else(|| Error::InvalidPrefixLength(prefix_len.to_string()))?;
        if prefix_len < MIN_PREFIX_LEN as u32 || prefix_len >= MAX_PREFIX_LEN as u32 {
            return Err(Error::PrefixOutOfRange(prefix_len));
        }

        Cidr::new(parse_ipv4(address)?, prefix_len as u8)
    }

    // === Getters ===

    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Mask with `prefix_len` leading one bits.
    pub fn mask(&self) -> u32 {
        u32::MAX << (MAX_PREFIX_LEN - self.prefix_len)
    }

    /// Whether `address` falls inside this subnet.
    pub fn contains(&self, address: Ipv4Addr) -> bool {
        u32::from(address) & self.mask() == u32::from(self.network)
    }

    // === Octet expansion ===

    /// The 1-based level whose octet the prefix boundary falls into.
    ///
    /// `/8` is level 1, `/9` through `/16` level 2, `/17` through `/24`
    /// level 3 and `/25` through `/31` level 4.
    pub fn boundary_level(&self) -> usize {
        (self.prefix_len as usize).div_ceil(8)
    }

    /// The octets above the boundary level, fixed for every covered address.
    pub fn fixed_octets(&self) -> Vec<u8> {
        self.network.octets()[..self.boundary_level() - 1].to_vec()
    }

    /// Half-open range of keys covered at the boundary level.
    ///
    /// The range always starts at the network's octet for that level and
    /// spans `2^(8 * level - prefix_len)` keys, so a prefix on an octet
    /// boundary yields exactly one key.
    pub fn boundary_keys(&self) -> Range<u16> {
        let level = self.boundary_level();
        let start = self.network.octets()[level - 1] as u16;
        let free_bits = (8 * level) as u32 - self.prefix_len as u32;

        start..start + (1 << free_bits)
    }
}

impl Display for Cidr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_strict_dotted_quad() {
        assert_eq!(parse_ipv4("10.0.0.1").unwrap(), Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(
            parse_ipv4("255.255.255.255").unwrap(),
            Ipv4Addr::BROADCAST
        );

        for bad in ["", "10.0.0", "10.0.0.256", "10.0.0.1.", "a.b.c.d", " 10.0.0.1"] {
            assert!(
                matches!(parse_ipv4(bad), Err(Error::InvalidAddress(_))),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn rejects_prefix_out_of_range() {
        assert!(matches!(
            Cidr::parse("10.0.0.0/32"),
            Err(Error::PrefixOutOfRange(32))
        ));
        assert!(matches!(
            Cidr::parse("10.0.0.0/7"),
            Err(Error::PrefixOutOfRange(7))
        ));
        assert!(matches!(
            Cidr::parse("10.0.0.0/4000"),
            Err(Error::PrefixOutOfRange(4000))
        ));
    }

    #[test]
    fn rejects_malformed_subnets() {
        assert!(matches!(
            Cidr::parse("10.0.0.0"),
            Err(Error::MissingPrefixSeparator(_))
        ));
        assert!(matches!(
            Cidr::parse("10.0.0.0/x"),
            Err(Error::InvalidPrefixLength(_))
        ));
        assert!(matches!(
            Cidr::parse("10.0.0.0/-8"),
            Err(Error::InvalidPrefixLength(_))
        ));
        for bad in [
            "10.0.0.0/+8",
            "10.0.0.0/",
            "10.0.0.0/ 8",
            "10.0.0.0/8 ",
            "10.0.0.0/99999999999",
        ] {
            assert!(
                matches!(Cidr::parse(bad), Err(Error::InvalidPrefixLength(_))),
                "{bad:?} should not parse"
            );
        }
        assert!(matches!(
            Cidr::parse("10.0.0/8"),
            Err(Error::InvalidAddress(_))
        ));
    }

    #[test]
    fn rejects_host_bits() {
        assert!(matches!(
            Cidr::parse("10.0.0.5/24"),
            Err(Error::NonCanonicalSubnet { prefix_len: 24, .. })
        ));
        assert!(matches!(
            Cidr::parse("192.168.171.0/23"),
            Err(Error::NonCanonicalSubnet { .. })
        ));
        assert!(Cidr::parse("192.168.170.0/23").is_ok());
    }

    #[test]
    fn boundary_levels() {
        let level = |s: &str| Cidr::parse(s).unwrap().boundary_level();

        assert_eq!(level("10.0.0.0/8"), 1);
        assert_eq!(level("10.0.0.0/9"), 2);
        assert_eq!(level("10.0.0.0/16"), 2);
        assert_eq!(level("10.0.0.0/17"), 3);
        assert_eq!(level("10.0.0.0/24"), 3);
        assert_eq!(level("10.0.0.0/25"), 4);
        assert_eq!(level("10.0.0.0/31"), 4);
    }

    #[test]
    fn boundary_keys_are_half_open() {
        let cidr = Cidr::parse("192.168.170.0/23").unwrap();
        assert_eq!(cidr.fixed_octets(), vec![192, 168]);
        assert_eq!(cidr.boundary_keys(), 170..172);

        let cidr = Cidr::parse("10.128.0.0/9").unwrap();
        assert_eq!(cidr.fixed_octets(), vec![10]);
        assert_eq!(cidr.boundary_keys(), 128..256);

        let cidr = Cidr::parse("10.1.2.128/25").unwrap();
        assert_eq!(cidr.fixed_octets(), vec![10, 1, 2]);
        assert_eq!(cidr.boundary_keys(), 128..256);

        let cidr = Cidr::parse("10.1.2.4/30").unwrap();
        assert_eq!(cidr.boundary_keys(), 4..8);

        let cidr = Cidr::parse("10.1.0.0/16").unwrap();
        assert_eq!(cidr.boundary_keys(), 1..2);

        let cidr = Cidr::parse("10.0.0.0/8").unwrap();
        assert!(cidr.fixed_octets().is_empty());
        assert_eq!(cidr.boundary_keys(), 10..11);
    }

    #[test]
    fn contains() {
        let cidr = Cidr::parse("192.168.170.0/23").unwrap();

        assert!(cidr.contains(Ipv4Addr::new(192, 168, 170, 0)));
        assert!(cidr.contains(Ipv4Addr::new(192, 168, 171, 255)));
        assert!(!cidr.contains(Ipv4Addr::new(192, 168, 172, 0)));
        assert!(!cidr.contains(Ipv4Addr::new(192, 168, 169, 255)));
        assert_eq!(cidr.to_string(), "192.168.170.0/23");
    }
}
