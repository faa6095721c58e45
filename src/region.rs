use serde::{Deserialize, Serialize};
use std::fmt;

/// 坐标起点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Based {
    Zero,
    One,
}

/// 基因组区间 `[start, end)`，坐标系由 `based` 决定。
///
/// 两种坐标系下区间都是半开的，长度相同；相互转换时起止同时平移 1。
/// `chr1:100-200` 这类 1-based 闭区间写法对应 `Region { start: 100, end: 201, based: One }`。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    reference_id: String,
    start: u32,
    end: u32,
    based: Based,
}

impl Region {
    /// `start > end` 时返回 None
    pub fn new(
        reference_id: impl Into<String>,
        start: u32,
        end: u32,
        based: Based,
    ) -> Option<Self> {
        if start > end {
            return None;
        }
        Some(Self {
            reference_id: reference_id.into(),
            start,
            end,
            based,
        })
    }

    /// 解析 `chr:start-end`（1-based 闭区间）或仅 `chr`（整条序列，end 由调用方给定）
    pub fn parse(s: &str, contig_len: Option<u32>) -> Option<Self> {
        let (name, range) = match s.rsplit_once(':') {
            Some((n, r)) => (n, Some(r)),
            None => (s, None),
        };
        if name.is_empty() {
            return None;
        }
        match range {
            Some(r) => {
                let (a, b) = r.split_once('-')?;
                let a: u32 = a.replace(',', "").parse().ok()?;
                let b: u32 = b.replace(',', "").parse().ok()?;
                if a == 0 {
                    return None;
                }
                Self::new(name, a, b.checked_add(1)?, Based::One)
            }
            None => Self::new(name, 1, contig_len?.checked_add(1)?, Based::One),
        }
    }

    pub fn reference_id(&self) -> &str {
        &self.reference_id
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn based(&self) -> Based {
        self.based
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// 同一坐标系下的子区间
    pub fn sub_region(&self, start: u32, end: u32) -> Option<Self> {
        Self::new(self.reference_id.clone(), start, end, self.based)
    }

    pub fn to_zero_based(&self) -> Self {
        match self.based {
            Based::Zero => self.clone(),
            Based::One => Self {
                reference_id: self.reference_id.clone(),
                start: self.start.saturating_sub(1),
                end: self.end.saturating_sub(1),
                based: Based::Zero,
            },
        }
    }

    pub fn to_one_based(&self) -> Self {
        match self.based {
            Based::One => self.clone(),
            Based::Zero => Self {
                reference_id: self.reference_id.clone(),
                start: self.start + 1,
                end: self.end + 1,
                based: Based::One,
            },
        }
    }

    pub fn contains(&self, pos: u32) -> bool {
        pos >= self.start && pos < self.end
    }

    pub fn overlaps(&self, other: &Region) -> bool {
        let other = match (self.based, other.based) {
            (Based::Zero, Based::One) => other.to_zero_based(),
            (Based::One, Based::Zero) => other.to_one_based(),
            _ => other.clone(),
        };
        self.reference_id == other.reference_id && self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let one = self.to_one_based();
        if one.is_empty() {
            write!(f, "{}:{}-{} (empty)", one.reference_id, one.start, one.end)
        } else {
            write!(f, "{}:{}-{}", one.reference_id, one.start, one.end - 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_shifts_both_bounds() {
        let r = Region::new("chr1", 90, 120, Based::Zero).unwrap();
        let one = r.to_one_based();
        assert_eq!((one.start(), one.end()), (91, 121));
        assert_eq!(one.len(), r.len());
        assert_eq!(one.to_zero_based(), r);
    }

    #[test]
    fn rejects_inverted_bounds() {
        assert!(Region::new("chr1", 10, 9, Based::Zero).is_none());
        assert!(Region::new("chr1", 10, 10, Based::Zero).unwrap().is_empty());
    }

    #[test]
    fn parse_closed_one_based() {
        let r = Region::parse("chr2:1,001-1,010", None).unwrap();
        assert_eq!(r.reference_id(), "chr2");
        assert_eq!(r.len(), 10);
        assert_eq!(r.to_zero_based().start(), 1000);
        assert_eq!(r.to_string(), "chr2:1001-1010");

        let whole = Region::parse("chrM", Some(16569)).unwrap();
        assert_eq!(whole.len(), 16569);
        assert!(Region::parse("chrM", None).is_none());
        assert!(Region::parse("chr1:0-5", None).is_none());
    }

    #[test]
    fn overlap_across_bases() {
        let a = Region::new("chr1", 100, 110, Based::Zero).unwrap();
        let b = Region::new("chr1", 110, 115, Based::One).unwrap();
        assert!(a.overlaps(&b));
        let c = Region::new("chr1", 111, 115, Based::One).unwrap();
        assert!(!a.overlaps(&c));
        assert!(a.contains(109) && !a.contains(110));
    }
}
