//! Line-ending normalization.

/// Rewrites every line terminator to CRLF.
///
/// LF, CR, and CRLF are all recognized as input terminators; no other byte
/// is touched. The transform is pure and cannot fail. Callers that want the
/// bytes untouched simply skip the call.
#[must_use]
pub fn normalize_crlf(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        match input[i] {
            b'\r' => {
                out.extend_from_slice(b"\r\n");
                // Collapse a CRLF pair into one terminator.
                if input.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
            }
            b'\n' => out.extend_from_slice(b"\r\n"),
            byte => out.push(byte),
        }
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn lf_only_input() {
        assert_eq!(normalize_crlf(b"a\nb\nc\n"), b"a\r\nb\r\nc\r\n");
    }

    #[test]
    fn cr_only_input() {
        assert_eq!(normalize_crlf(b"a\rb\rc\r"), b"a\r\nb\r\nc\r\n");
    }

    #[test]
    fn crlf_input_unchanged() {
        assert_eq!(normalize_crlf(b"a\r\nb\r\n"), b"a\r\nb\r\n");
    }

    #[test]
    fn mixed_terminators() {
        assert_eq!(normalize_crlf(b"a\nb\rc\r\nd"), b"a\r\nb\r\nc\r\nd");
    }

    #[test]
    fn trailing_cr() {
        assert_eq!(normalize_crlf(b"end\r"), b"end\r\n");
    }

    #[test]
    fn empty_input() {
        assert_eq!(normalize_crlf(b""), b"");
    }

    #[test]
    fn blank_lines_survive() {
        assert_eq!(normalize_crlf(b"a\n\nb\n"), b"a\r\n\r\nb\r\n");
    }

    /// Every CR must be followed by LF and every LF preceded by CR.
    fn crlf_only(bytes: &[u8]) -> bool {
        bytes.iter().enumerate().all(|(i, &b)| match b {
            b'\r' => bytes.get(i + 1) == Some(&b'\n'),
            b'\n' => i > 0 && bytes[i - 1] == b'\r',
            _ => true,
        })
    }

    proptest! {
        #[test]
        fn output_contains_only_crlf_terminators(input in proptest::collection::vec(any::<u8>(), 0..512)) {
            let out = normalize_crlf(&input);
            prop_assert!(crlf_only(&out));
        }

        #[test]
        fn normalization_is_idempotent(input in proptest::collection::vec(any::<u8>(), 0..512)) {
            let once = normalize_crlf(&input);
            let twice = normalize_crlf(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn non_terminator_bytes_are_preserved(input in proptest::collection::vec(any::<u8>(), 0..512)) {
            let keep = |bytes: &[u8]| -> Vec<u8> {
                bytes.iter().copied().filter(|&b| b != b'\r' && b != b'\n').collect()
            };
            prop_assert_eq!(keep(&normalize_crlf(&input)), keep(&input));
        }
    }
}
