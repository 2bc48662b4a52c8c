use std::cmp;
use std::fmt::Write;

/// Canonical hex display (`hexdump -C` style) of `buf[start..end]`, 16 bytes per line.
///
/// Addresses are absolute offsets into `buf`. The range is clamped to the buffer.
pub fn hexdump(buf: &[u8], start: usize, end: usize) -> String {
    let end = cmp::min(end, buf.len());
    let start = cmp::min(start, end);
    let mut out = String::new();

    for (i, line) in buf[start..end].chunks(16).enumerate() {
        let _ = write!(out, "{:08x}:", start + i * 16);
        for b in line {
            let _ = write!(out, " {:02x}", b);
        }
        for _ in line.len()..16 {
            out.push_str("   ");
        }
        out.push_str("  |");
        out.extend(line.iter().map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            }
        }));
        out.push_str("|\n");
    }

    out
}

/// Hex display of up to `radius` bytes on either side of `offset`.
pub fn hexdump_around(buf: &[u8], offset: usize, radius: usize) -> String {
    hexdump(buf, offset.saturating_sub(radius), offset.saturating_add(radius))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_canonical_line() {
        let data = b"HDR \x01\x00";
        assert_eq!(
            hexdump(data, 0, 100),
            "00000000: 48 44 52 20 01 00                                |HDR ..|\n"
        );
    }

    #[test]
    fn test_window_is_clamped() {
        let data = [0_u8; 40];
        let dump = hexdump_around(&data, 4, 20);
        assert_eq!(dump.lines().count(), 2);
        assert!(dump.starts_with("00000000:"));
        assert!(dump.lines().nth(1).unwrap().starts_with("00000010:"));
    }
}
