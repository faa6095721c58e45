use std::sync::Arc;

use crate::region::Based;

use super::allele::Allele;

/// 一个变异位点：一个参考等位基因 + 若干替代等位基因
///
/// Variant 持有自己的全部 Allele；Allele 只通过 [`super::VariantId`] 反向指回。
#[derive(Debug)]
pub struct Variant {
    chrom: String,
    position: u32,
    based: Based,
    id: String,
    reference: Arc<Allele>,
    alternates: Vec<Arc<Allele>>,
    skip: bool,
}

impl Variant {
    pub fn new(
        chrom: impl Into<String>,
        position: u32,
        based: Based,
        reference: impl Into<Vec<u8>>,
        alternates: Vec<Vec<u8>>,
    ) -> Self {
        let chrom = chrom.into();
        let reference = Arc::new(Allele::new(reference));
        Self {
            chrom,
            position,
            based,
            id: ".".to_string(),
            reference,
            alternates: alternates.into_iter().map(|a| Arc::new(Allele::new(a))).collect(),
            skip: false,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn based(&self) -> Based {
        self.based
    }

    /// 换算到指定坐标系下的起点
    pub fn position_in(&self, based: Based) -> u32 {
        match (self.based, based) {
            (Based::One, Based::Zero) => self.position.saturating_sub(1),
            (Based::Zero, Based::One) => self.position + 1,
            _ => self.position,
        }
    }

    pub fn reference_allele(&self) -> &Arc<Allele> {
        &self.reference
    }

    pub fn alternate_alleles(&self) -> &[Arc<Allele>] {
        &self.alternates
    }

    /// 参考等位基因在前，其后按输入顺序排列替代等位基因
    pub fn alleles(&self) -> impl Iterator<Item = &Arc<Allele>> {
        std::iter::once(&self.reference).chain(self.alternates.iter())
    }

    /// 参考跨度
    pub fn reference_size(&self) -> u32 {
        self.reference.len() as u32
    }

    pub fn should_skip(&self) -> bool {
        self.skip
    }

    pub fn set_skip(&mut self, skip: bool) {
        self.skip = skip;
    }

    /// 符号型（`<DEL>`）、断点型（`N[chr2:100[`）或 `*` 替代等位基因
    pub fn is_structural(&self) -> bool {
        self.alternates.iter().any(|a| {
            let s = a.sequence();
            s.first() == Some(&b'<') || s.contains(&b'[') || s.contains(&b']') || s == b"*"
        })
    }

    pub fn does_overlap(&self, other: &Variant) -> bool {
        if self.chrom != other.chrom {
            return false;
        }
        let a0 = self.position_in(Based::Zero);
        let b0 = other.position_in(Based::Zero);
        let a1 = a0 + self.reference_size().max(1);
        let b1 = b0 + other.reference_size().max(1);
        a0 < b1 && b0 < a1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_accessors() {
        let v = Variant::new(
            "chr1",
            100,
            Based::One,
            b"AT".to_vec(),
            vec![b"A".to_vec(), b"ATT".to_vec()],
        )
        .with_id("rs1");
        assert_eq!(v.reference_size(), 2);
        assert_eq!(v.alleles().count(), 3);
        assert_eq!(v.position_in(Based::Zero), 99);
        assert_eq!(v.id(), "rs1");
        assert!(!v.is_structural());
    }

    #[test]
    fn structural_alleles_detected() {
        let structural = |alt: &str| Variant::new("chr1", 5, Based::One, "A", vec![alt.into()]);
        let sym = structural("<DEL>");
        let bnd = structural("A[chr2:10[");
        assert!(sym.is_structural());
        assert!(bnd.is_structural());
    }

    #[test]
    fn overlap_uses_reference_span() {
        let a = Variant::new("chr1", 10, Based::Zero, "ACG", vec![b"A".to_vec()]);
        let b = Variant::new("chr1", 12, Based::Zero, b"G".to_vec(), vec![b"T".to_vec()]);
        let c = Variant::new("chr1", 14, Based::One, b"T".to_vec(), vec![b"C".to_vec()]);
        assert!(a.does_overlap(&b));
        assert!(!a.does_overlap(&c));
    }
}
