//! 输入文件解析：参考 FASTA、reads FASTQ、变异 VCF

pub mod fasta;
pub mod fastq;
pub mod vcf;
