//! Common data structures that are used throughout the protocol

mod clock_identity;
mod clock_quality;
mod mac_address;
mod port_identity;
mod timestamp;

pub use clock_identity::*;
pub use clock_quality::*;
pub use mac_address::*;
pub use port_identity::*;
pub use timestamp::*;

/// True iff both the clock identity and the port number match.
pub fn compare_port_identity(a: &PortIdentity, b: &PortIdentity) -> bool {
    compare_clock_identity(&a.clock_identity, &b.clock_identity) && a.port_number == b.port_number
}

/// True iff the 8-byte clock identities match.
pub fn compare_clock_identity(a: &ClockIdentity, b: &ClockIdentity) -> bool {
    a.0 == b.0
}

/// Parses `N` hexadecimal octets separated by `:` or `-`.
pub(crate) fn parse_octets<const N: usize>(s: &str) -> Option<[u8; N]> {
    let mut octets = [0u8; N];
    let mut parts = s.split(|c| c == ':' || c == '-');

    for octet in octets.iter_mut() {
        let part = parts.next()?;
        if part.len() != 2 {
            return None;
        }
        *octet = u8::from_str_radix(part, 16).ok()?;
    }

    match parts.next() {
        Some(_) => None,
        None => Some(octets),
    }
}

pub(crate) fn format_octets(f: &mut core::fmt::Formatter<'_>, octets: &[u8]) -> core::fmt::Result {
    for (i, octet) in octets.iter().enumerate() {
        if i != 0 {
            f.write_str(":")?;
        }
        write!(f, "{octet:02x}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDENTITY_A: ClockIdentity = ClockIdentity([0x00, 0x0a, 0x35, 0xff, 0xfe, 0x01, 0x02, 0x03]);
    const IDENTITY_B: ClockIdentity = ClockIdentity([0x00, 0x0a, 0x35, 0xff, 0xfe, 0x01, 0x02, 0x09]);

    #[test]
    fn identity_comparison_is_reflexive() {
        let port = PortIdentity {
            clock_identity: IDENTITY_A,
            port_number: 1,
        };

        assert!(compare_port_identity(&port, &port));
        assert!(compare_clock_identity(&IDENTITY_A, &IDENTITY_A));
    }

    #[test]
    fn port_identity_needs_matching_port_number() {
        let a = PortIdentity {
            clock_identity: IDENTITY_A,
            port_number: 1,
        };
        let b = PortIdentity {
            clock_identity: IDENTITY_A,
            port_number: 2,
        };
        let c = PortIdentity {
            clock_identity: IDENTITY_B,
            port_number: 1,
        };

        assert!(!compare_port_identity(&a, &b));
        assert!(!compare_port_identity(&a, &c));
        assert!(compare_clock_identity(&a.clock_identity, &b.clock_identity));
        assert!(!compare_clock_identity(&a.clock_identity, &c.clock_identity));
    }

    #[test]
    fn octet_parsing() {
        assert_eq!(
            parse_octets::<6>("01:80:C2:00:00:0e"),
            Some([0x01, 0x80, 0xc2, 0x00, 0x00, 0x0e])
        );
        assert_eq!(
            parse_octets::<6>("01-80-c2-00-00-0e"),
            Some([0x01, 0x80, 0xc2, 0x00, 0x00, 0x0e])
        );
        assert_eq!(parse_octets::<6>("01:80:c2:00:00"), None);
        assert_eq!(parse_octets::<6>("01:80:c2:00:00:0e:ff"), None);
        assert_eq!(parse_octets::<6>("01:80:c2:00:00:zz"), None);
        assert_eq!(parse_octets::<6>("1:80:c2:00:00:0e"), None);
    }
}
