//! Device identity derived from the network interface hardware address.

use core::fmt::Write;

use heapless::String;

/// `aa:bb:cc:dd:ee:ff`
pub const MAC_STR_LEN: usize = 17;

/// Fixed-capacity identity string served to the update client.
pub type HardwareAddress = String<MAC_STR_LEN>;

/// Format a link-layer address as canonical colon-separated lowercase hex.
pub fn format_mac(octets: &[u8; 6]) -> HardwareAddress {
    let mut out = HardwareAddress::new();
    // Cannot overflow: 6 octets always render to exactly 17 bytes.
    write!(
        out,
        "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        octets[0], octets[1], octets[2], octets[3], octets[4], octets[5]
    )
    .ok();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::quickcheck;

    #[test]
    fn formats_canonical_lowercase() {
        let mac = format_mac(&[0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x42]);
        assert_eq!(mac.as_str(), "de:ad:be:ef:00:42");
    }

    #[test]
    fn zero_address() {
        let mac = format_mac(&[0; 6]);
        assert_eq!(mac.as_str(), "00:00:00:00:00:00");
    }

    quickcheck! {
        fn always_seventeen_bytes(a: u8, b: u8, c: u8, d: u8, e: u8, f: u8) -> bool {
            format_mac(&[a, b, c, d, e, f]).len() == MAC_STR_LEN
        }
    }
}
