use std::io::BufRead;
use std::sync::Arc;

use crate::adjudicate::{Read, Sample};
use crate::error::IoError;

#[derive(Debug, Clone)]
pub struct FastqRecord {
    pub id: String,
    pub desc: Option<String>,
    pub seq: Vec<u8>,
    pub qual: Vec<u8>,
}

impl FastqRecord {
    /// 转为待裁决的 read；FASTQ 不携带链方向
    pub fn into_read(self, sample: Arc<Sample>) -> Read {
        Read::new(self.id, self.seq, sample)
    }
}

/// 四行一条的 FASTQ 读取器（不支持序列折行）
pub struct FastqReader<R: BufRead> {
    reader: R,
    buf: String,
    line_no: usize,
    done: bool,
}

impl<R: BufRead> FastqReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            line_no: 0,
            done: false,
        }
    }

    fn read_line(&mut self) -> Result<bool, IoError> {
        self.buf.clear();
        let n = self.reader.read_line(&mut self.buf)?;
        self.line_no += 1;
        Ok(n > 0)
    }

    fn invalid(&self, msg: &str) -> IoError {
        IoError::InvalidFastq(format!("line {}: {}", self.line_no, msg))
    }

    pub fn next_record(&mut self) -> Result<Option<FastqRecord>, IoError> {
        if self.done {
            return Ok(None);
        }

        // 跳过记录之间的空行
        loop {
            if !self.read_line()? {
                self.done = true;
                return Ok(None);
            }
            if !self.buf.trim().is_empty() {
                break;
            }
        }
        let header = self
            .buf
            .strip_prefix('@')
            .ok_or_else(|| self.invalid("header does not start with '@'"))?;
        let mut parts = header.trim_end().splitn(2, char::is_whitespace);
        let id = parts.next().unwrap_or("").to_string();
        let desc = parts
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        if !self.read_line()? {
            return Err(self.invalid("unexpected end of file after header"));
        }
        let seq: Vec<u8> = self
            .buf
            .trim_end()
            .bytes()
            .map(|b| b.to_ascii_uppercase())
            .collect();

        if !self.read_line()? || !self.buf.starts_with('+') {
            return Err(self.invalid("missing '+' separator"));
        }

        if !self.read_line()? {
            return Err(self.invalid("missing quality line"));
        }
        let qual = self.buf.trim_end().as_bytes().to_vec();
        if qual.len() != seq.len() {
            return Err(self.invalid("sequence and quality lengths differ"));
        }

        Ok(Some(FastqRecord {
            id,
            desc,
            seq,
            qual,
        }))
    }
}

impl<R: BufRead> Iterator for FastqReader<R> {
    type Item = Result<FastqRecord, IoError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
