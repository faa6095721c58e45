//! 库内错误类型
//!
//! 构图错误对整个区域是致命的；比对错误只影响单条 read，由调用方记录后跳过。

use thiserror::Error;

use crate::region::Region;

/// 参考序列获取失败
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("unknown reference sequence '{0}'")]
    UnknownContig(String),

    #[error("region {region} lies outside reference '{contig}' of length {len}")]
    OutOfBounds {
        region: Region,
        contig: String,
        len: usize,
    },
}

/// 变异图构建失败
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("reference fetch failed: {0}")]
    Reference(#[from] ReferenceError),

    #[error("variant at {position} precedes previous variant at {previous}")]
    UnorderedVariant {
        position: u32,
        previous: u32,
    },

    #[error("variant at {position} lies outside region {region}")]
    VariantOutsideRegion {
        position: u32,
        region: Region,
    },
}

/// 单条 read 的比对失败
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AlignError {
    #[error("read is empty")]
    EmptyRead,

    #[error("graph has no sequence to align against")]
    EmptyGraph,

    #[error("no positive-scoring alignment")]
    NoAlignment,
}

/// 文件解析错误
#[derive(Debug, Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid FASTA input: {0}")]
    InvalidFasta(String),

    #[error("invalid FASTQ record: {0}")]
    InvalidFastq(String),

    #[error("invalid VCF record at line {line}: {msg}")]
    InvalidVcf { line: usize, msg: String },
}
