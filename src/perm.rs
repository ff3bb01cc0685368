/// Expand a packed permission byte into a `rwx` mode.
///
/// Each of owner/group/other is two bits of `perm`, high pair first. Bit
/// `0x20` contributes `-wx` and bit `0x10` contributes `r-x` to its group.
pub fn perm_to_mode(perm: u8) -> u32 {
    let mut perm = perm;
    let mut mode = 0;

    for _ in 0..3 {
        mode <<= 3;
        if perm & 0x20 != 0 {
            mode |= 3;
        }
        if perm & 0x10 != 0 {
            mode |= 5;
        }
        perm <<= 2;
    }

    mode
}

/// Mode for a regular file: files are never executable.
pub fn file_mode(perm: u8) -> u32 {
    perm_to_mode(perm) & !0o111
}

pub fn dir_mode(perm: u8) -> u32 {
    perm_to_mode(perm)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(perm: u8) -> u32 {
        let pair = |shift: u32| {
            let bits = (perm >> shift) & 3;
            let mut g = 0;
            if bits & 2 != 0 {
                g |= 3;
            }
            if bits & 1 != 0 {
                g |= 5;
            }
            g
        };
        (pair(4) << 6) | (pair(2) << 3) | pair(0)
    }

    #[test]
    fn matches_bit_expansion_for_every_byte() {
        for perm in 0..=255u8 {
            assert_eq!(perm_to_mode(perm), expand(perm), "perm {perm:#04x}");
            assert!(perm_to_mode(perm) <= 0o777);
        }
    }

    #[test]
    fn files_lose_execute_bits() {
        for perm in 0..=255u8 {
            assert_eq!(file_mode(perm) & 0o111, 0);
            assert_eq!(dir_mode(perm), perm_to_mode(perm));
        }
    }

    #[test]
    fn typical_values() {
        assert_eq!(perm_to_mode(0x35), 0o755);
        assert_eq!(file_mode(0x35), 0o644);
        assert_eq!(perm_to_mode(0x3f), 0o777);
        assert_eq!(perm_to_mode(0x00), 0);
        // top two bits never survive the shifts
        assert_eq!(perm_to_mode(0xc0), 0);
    }
}
