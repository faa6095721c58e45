//! 等位基因计数表：裁决结束后的快照，可用 bincode 落盘再读回

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::region::Based;
use crate::variant::{ConfidenceTier, CountSnapshot, Variant};

const FORMAT_VERSION: u32 = 1;

/// 运行元信息
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountMeta {
    pub region: Option<String>,
    pub reference_file: Option<String>,
    pub variant_file: Option<String>,
    pub command: Option<String>,
    pub created: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlleleCounts {
    pub sequence: String,
    pub is_reference: bool,
    /// (样本名, [正向, 反向] × 分档)
    pub samples: Vec<(String, CountSnapshot)>,
}

impl AlleleCounts {
    pub fn total(&self, tier: ConfidenceTier) -> u32 {
        self.samples
            .iter()
            .map(|(_, c)| c[0][tier.index()] + c[1][tier.index()])
            .sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VariantCounts {
    pub chrom: String,
    /// 1-based
    pub position: u32,
    pub id: String,
    /// 参考等位基因在前
    pub alleles: Vec<AlleleCounts>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountTable {
    version: u32,
    pub meta: CountMeta,
    pub variants: Vec<VariantCounts>,
}

impl CountTable {
    pub fn from_variants<'a>(variants: impl IntoIterator<Item = &'a Arc<Variant>>) -> Self {
        let variants = variants
            .into_iter()
            .map(|v| VariantCounts {
                chrom: v.chrom().to_string(),
                position: v.position_in(Based::One),
                id: v.id().to_string(),
                alleles: v
                    .alleles()
                    .enumerate()
                    .map(|(k, a)| AlleleCounts {
                        sequence: a.sequence_string(),
                        is_reference: k == 0,
                        samples: a.snapshot(),
                    })
                    .collect(),
            })
            .collect();
        Self {
            version: FORMAT_VERSION,
            meta: CountMeta::default(),
            variants,
        }
    }

    pub fn set_meta(&mut self, meta: CountMeta) {
        self.meta = meta;
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let file =
            std::fs::File::create(path).with_context(|| format!("cannot create '{}'", path))?;
        let mut f = std::io::BufWriter::new(file);
        bincode::serialize_into(&mut f, self)?;
        f.flush()?;
        Ok(())
    }

    pub fn load_from_file(path: &str) -> Result<Self> {
        let f = std::fs::File::open(path)
            .with_context(|| format!("cannot open count table '{}'", path))?;
        let table: Self = bincode::deserialize_from(std::io::BufReader::new(f))?;
        if table.version != FORMAT_VERSION {
            anyhow::bail!(
                "count table '{}' has version {}, expected {}",
                path,
                table.version,
                FORMAT_VERSION
            );
        }
        Ok(table)
    }

    /// 制表符分隔：每个 (变异, 等位基因, 样本) 一行，各分档正反向计数依次排列
    pub fn write_tsv<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        write!(out, "#chrom\tpos\tid\tallele\ttype\tsample")?;
        for tier in ConfidenceTier::ALL {
            write!(out, "\t{}_F\t{}_R", tier.short_name(), tier.short_name())?;
        }
        writeln!(out)?;
        for v in &self.variants {
            for a in &v.alleles {
                let seq = if a.sequence.is_empty() { "-" } else { a.sequence.as_str() };
                let kind = if a.is_reference { "REF" } else { "ALT" };
                for (sample, c) in &a.samples {
                    write!(
                        out,
                        "{}\t{}\t{}\t{}\t{}\t{}",
                        v.chrom, v.position, v.id, seq, kind, sample
                    )?;
                    for tier in ConfidenceTier::ALL {
                        write!(out, "\t{}\t{}", c[0][tier.index()], c[1][tier.index()])?;
                    }
                    writeln!(out)?;
                }
            }
        }
        Ok(())
    }
}
