/// 打分字母表大小：A/C/G/T + 未知碱基
pub const SIGMA: usize = 5;

/// 未知碱基（N 及其它 IUPAC 符号）的编码
pub const UNKNOWN: u8 = 4;

#[inline]
pub fn to_code(b: u8) -> u8 {
    match b.to_ascii_uppercase() {
        b'A' => 0,
        b'C' => 1,
        b'G' => 2,
        b'T' | b'U' => 3,
        _ => UNKNOWN,
    }
}

#[inline]
pub fn from_code(a: u8) -> u8 {
    match a {
        0 => b'A',
        1 => b'C',
        2 => b'G',
        3 => b'T',
        _ => b'N',
    }
}

/// 将任意字节序列编码为打分字母表
pub fn encode(seq: &[u8]) -> Vec<u8> {
    seq.iter().map(|&b| to_code(b)).collect()
}

pub fn normalize_seq(seq: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(seq.len());
    for &b in seq {
        let up = b.to_ascii_uppercase();
        let nb = match up {
            b'A' | b'C' | b'G' | b'T' | b'N' => up,
            b'U' => b'T',
            _ => b'N',
        };
        out.push(nb);
    }
    out
}

#[inline]
pub fn complement(base: u8) -> u8 {
    match base.to_ascii_uppercase() {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' | b'U' => b'A',
        _ => b'N',
    }
}

pub fn revcomp(seq: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(seq.len());
    for &b in seq.iter().rev() {
        out.push(complement(b));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_maps_ambiguity_to_unknown() {
        assert_eq!(encode(b"acgtNRu"), vec![0, 1, 2, 3, UNKNOWN, UNKNOWN, 3]);
        assert_eq!(from_code(to_code(b'g')), b'G');
        assert_eq!(from_code(UNKNOWN), b'N');
    }

    #[test]
    fn revcomp_and_normalize() {
        assert_eq!(revcomp(b"AACGTN"), b"NACGTT");
        assert_eq!(normalize_seq(b"acgu*"), b"ACGTN");
    }
}
