use std::fmt::{self, Write as _};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CigarOp {
    /// `=`
    Match,
    /// `X`
    Mismatch,
    /// `I`：read 上多出的碱基
    Insertion,
    /// `D`：节点序列上多出的碱基
    Deletion,
}

impl CigarOp {
    pub fn as_char(self) -> char {
        match self {
            CigarOp::Match => '=',
            CigarOp::Mismatch => 'X',
            CigarOp::Insertion => 'I',
            CigarOp::Deletion => 'D',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '=' => Some(CigarOp::Match),
            'X' => Some(CigarOp::Mismatch),
            'I' => Some(CigarOp::Insertion),
            'D' => Some(CigarOp::Deletion),
            _ => None,
        }
    }

    pub fn consumes_ref(self) -> bool {
        !matches!(self, CigarOp::Insertion)
    }

    pub fn consumes_read(self) -> bool {
        !matches!(self, CigarOp::Deletion)
    }
}

/// 行程编码的 CIGAR，使用扩展操作符（`=`/`X` 区分匹配与错配）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cigar {
    ops: Vec<(CigarOp, u32)>,
}

impl Cigar {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由逐碱基操作序列压缩得到
    pub fn from_ops(ops: &[CigarOp]) -> Self {
        let mut cigar = Self::new();
        for &op in ops {
            cigar.push_back(op, 1);
        }
        cigar
    }

    pub fn push_back(&mut self, op: CigarOp, len: u32) {
        if len == 0 {
            return;
        }
        match self.ops.last_mut() {
            Some((last, n)) if *last == op => *n += len,
            _ => self.ops.push((op, len)),
        }
    }

    pub fn push_front(&mut self, op: CigarOp, len: u32) {
        if len == 0 {
            return;
        }
        match self.ops.first_mut() {
            Some((first, n)) if *first == op => *n += len,
            _ => self.ops.insert(0, (op, len)),
        }
    }

    pub fn ops(&self) -> &[(CigarOp, u32)] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ref_len(&self) -> u32 {
        self.ops
            .iter()
            .filter(|(op, _)| op.consumes_ref())
            .map(|&(_, n)| n)
            .sum()
    }

    pub fn read_len(&self) -> u32 {
        self.ops
            .iter()
            .filter(|(op, _)| op.consumes_read())
            .map(|&(_, n)| n)
            .sum()
    }

    /// 错配 + 插入 + 缺失的碱基数
    pub fn edit_count(&self) -> u32 {
        self.ops
            .iter()
            .filter(|(op, _)| *op != CigarOp::Match)
            .map(|&(_, n)| n)
            .sum()
    }

    pub fn is_exact_match(&self) -> bool {
        self.ops.iter().all(|(op, _)| *op == CigarOp::Match)
    }

    /// 将 `=`/`X` 合并为 `M` 的传统写法
    pub fn to_classic_string(&self) -> String {
        let mut merged = String::new();
        let mut pending: Option<(char, u32)> = None;
        for &(op, n) in &self.ops {
            let c = match op {
                CigarOp::Match | CigarOp::Mismatch => 'M',
                other => other.as_char(),
            };
            pending = match pending {
                Some((pc, pn)) if pc == c => Some((pc, pn + n)),
                Some((pc, pn)) => {
                    let _ = write!(&mut merged, "{}{}", pn, pc);
                    Some((c, n))
                }
                None => Some((c, n)),
            };
        }
        if let Some((pc, pn)) = pending {
            let _ = write!(&mut merged, "{}{}", pn, pc);
        }
        merged
    }
}

impl fmt::Display for Cigar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &(op, n) in &self.ops {
            write!(f, "{}{}", n, op.as_char())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCigarError(pub String);

impl fmt::Display for ParseCigarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid CIGAR '{}'", self.0)
    }
}

impl std::error::Error for ParseCigarError {}

impl FromStr for Cigar {
    type Err = ParseCigarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cigar = Cigar::new();
        let mut num = 0u32;
        let mut have_num = false;
        for ch in s.chars() {
            if let Some(d) = ch.to_digit(10) {
                num = num
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(d))
                    .ok_or_else(|| ParseCigarError(s.into()))?;
                have_num = true;
            } else {
                let op = CigarOp::from_char(ch).ok_or_else(|| ParseCigarError(s.into()))?;
                if !have_num {
                    return Err(ParseCigarError(s.into()));
                }
                cigar.push_back(op, num);
                num = 0;
                have_num = false;
            }
        }
        if have_num {
            return Err(ParseCigarError(s.into()));
        }
        Ok(cigar)
    }
}
