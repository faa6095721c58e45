//! 参考序列提供者

use std::collections::HashMap;
use std::io::BufRead;

use anyhow::Result;

use crate::error::ReferenceError;
use crate::io::fasta::FastaReader;
use crate::region::Region;
use crate::util::dna;

/// 按区间取参考序列。越界或未知序列时报错，不重试。
pub trait ReferenceProvider {
    fn sequence(&self, region: &Region) -> Result<Vec<u8>, ReferenceError>;
}

/// 整个 FASTA 读入内存的参考
#[derive(Debug, Default)]
pub struct InMemoryReference {
    contigs: HashMap<String, Vec<u8>>,
    order: Vec<String>,
}

impl InMemoryReference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, seq: &[u8]) {
        let name = name.into();
        if !self.contigs.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.contigs.insert(name, dna::normalize_seq(seq));
    }

    pub fn from_fasta<R: BufRead>(reader: R) -> Result<Self> {
        let mut fasta = FastaReader::new(reader);
        let mut reference = Self::new();
        while let Some(rec) = fasta.next_record()? {
            reference.insert(rec.id, &rec.seq);
        }
        Ok(reference)
    }

    pub fn contig_len(&self, name: &str) -> Option<usize> {
        self.contigs.get(name).map(Vec::len)
    }

    /// 按 FASTA 中出现的顺序
    pub fn contig_names(&self) -> &[String] {
        &self.order
    }
}

impl ReferenceProvider for InMemoryReference {
    fn sequence(&self, region: &Region) -> Result<Vec<u8>, ReferenceError> {
        let seq = self
            .contigs
            .get(region.reference_id())
            .ok_or_else(|| {
                ReferenceError::UnknownContig(region.reference_id().to_string())
            })?;
        let zero = region.to_zero_based();
        let (start, end) = (zero.start() as usize, zero.end() as usize);
        if end > seq.len() {
            return Err(ReferenceError::OutOfBounds {
                region: region.clone(),
                contig: region.reference_id().to_string(),
                len: seq.len(),
            });
        }
        Ok(seq[start..end].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Based;
    use std::io::Cursor;

    #[test]
    fn fetch_in_both_bases() {
        let fasta = b">chr1\nACGTACGTAC\n>chr2\nggg\n";
        let reference = InMemoryReference::from_fasta(Cursor::new(&fasta[..])).unwrap();
        let zero = Region::new("chr1", 2, 6, Based::Zero).unwrap();
        assert_eq!(reference.sequence(&zero).unwrap(), b"GTAC");
        let one = Region::new("chr1", 3, 7, Based::One).unwrap();
        assert_eq!(reference.sequence(&one).unwrap(), b"GTAC");
        let chr2 = Region::new("chr2", 0, 3, Based::Zero).unwrap();
        assert_eq!(reference.sequence(&chr2).unwrap(), b"GGG");
        assert_eq!(reference.contig_names(), ["chr1", "chr2"]);
    }

    #[test]
    fn fetch_errors() {
        let mut reference = InMemoryReference::new();
        reference.insert("chr1", b"ACGT");
        let past_end = Region::new("chr1", 2, 5, Based::Zero).unwrap();
        assert!(matches!(
            reference.sequence(&past_end),
            Err(ReferenceError::OutOfBounds { .. })
        ));
        let unknown = Region::new("chrX", 0, 1, Based::Zero).unwrap();
        assert!(matches!(
            reference.sequence(&unknown),
            Err(ReferenceError::UnknownContig(_))
        ));
    }
}
