//! 只读取 CHROM/POS/ID/REF/ALT 五列的最小 VCF 解析

use std::io::BufRead;

use log::debug;

use crate::error::IoError;
use crate::region::Based;
use crate::variant::{Variant, VariantList};

pub struct VcfReader<R: BufRead> {
    reader: R,
    line: String,
    line_no: usize,
}

impl<R: BufRead> VcfReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            line_no: 0,
        }
    }

    fn invalid(&self, msg: impl Into<String>) -> IoError {
        IoError::InvalidVcf {
            line: self.line_no,
            msg: msg.into(),
        }
    }

    /// 下一条记录。结构变异与没有替代等位基因的记录会被标记为 skip，而不是丢弃。
    pub fn next_variant(&mut self) -> Result<Option<Variant>, IoError> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let line = self.line.trim_end_matches(['\n', '\r']);
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let cols: Vec<&str> = line.split('\t').collect();
            if cols.len() < 5 {
                return Err(self.invalid(format!(
                    "expected at least 5 columns, found {}",
                    cols.len()
                )));
            }
            let position: u32 = cols[1]
                .parse()
                .map_err(|_| self.invalid(format!("bad POS '{}'", cols[1])))?;
            if position == 0 {
                return Err(self.invalid("POS must be 1-based"));
            }
            let reference = cols[3].to_ascii_uppercase().into_bytes();
            if reference.is_empty() {
                return Err(self.invalid("empty REF"));
            }
            let alternates: Vec<Vec<u8>> = cols[4]
                .split(',')
                .filter(|a| *a != ".")
                .map(|a| a.to_ascii_uppercase().into_bytes())
                .collect();

            let no_alts = alternates.is_empty();
            let mut variant =
                Variant::new(cols[0], position, Based::One, reference, alternates).with_id(cols[2]);
            if no_alts || variant.is_structural() {
                debug!("marking {}:{} ({}) as skipped", cols[0], position, cols[2]);
                variant.set_skip(true);
            }
            return Ok(Some(variant));
        }
    }
}

impl<R: BufRead> Iterator for VcfReader<R> {
    type Item = Result<Variant, IoError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_variant().transpose()
    }
}

/// 读入整个 VCF 并按位置排序
pub fn read_variants<R: BufRead>(reader: R) -> Result<VariantList, IoError> {
    let variants = VcfReader::new(reader).collect::<Result<Vec<_>, _>>()?;
    Ok(VariantList::new(variants))
}
