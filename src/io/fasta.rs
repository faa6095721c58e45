use std::io::BufRead;

use crate::error::IoError;

#[derive(Debug, Clone)]
pub struct FastaRecord {
    pub id: String,
    pub desc: Option<String>,
    pub seq: Vec<u8>,
}

/// 逐条读取 FASTA。序列行中的空白被去掉、碱基转为大写；`;` 开头的行视为注释。
pub struct FastaReader<R: BufRead> {
    reader: R,
    line: String,
    line_no: usize,
    done: bool,
    pending_header: Option<String>,
}

fn split_header(header: &str) -> (String, Option<String>) {
    let mut parts = header.splitn(2, char::is_whitespace);
    let id = parts.next().unwrap_or("").to_string();
    let desc = parts
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    (id, desc)
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            line_no: 0,
            done: false,
            pending_header: None,
        }
    }

    fn read_line(&mut self) -> Result<bool, IoError> {
        self.line.clear();
        let n = self.reader.read_line(&mut self.line)?;
        self.line_no += 1;
        Ok(n > 0)
    }

    fn header_of_line(&self) -> Option<String> {
        self.line.strip_prefix('>').map(|h| h.trim().to_string())
    }

    pub fn next_record(&mut self) -> Result<Option<FastaRecord>, IoError> {
        if self.done {
            return Ok(None);
        }

        let header = match self.pending_header.take() {
            Some(h) => h,
            None => loop {
                if !self.read_line()? {
                    self.done = true;
                    return Ok(None);
                }
                if let Some(h) = self.header_of_line() {
                    break h;
                }
                let t = self.line.trim();
                if !t.is_empty() && !t.starts_with(';') {
                    return Err(IoError::InvalidFasta(format!(
                        "line {}: sequence before first header",
                        self.line_no
                    )));
                }
            },
        };
        let (id, desc) = split_header(&header);
        if id.is_empty() {
            return Err(IoError::InvalidFasta(format!(
                "line {}: empty sequence name",
                self.line_no
            )));
        }

        let mut seq: Vec<u8> = Vec::new();
        loop {
            if !self.read_line()? {
                self.done = true;
                break;
            }
            if let Some(h) = self.header_of_line() {
                self.pending_header = Some(h);
                break;
            }
            if self.line.starts_with(';') {
                continue;
            }
            seq.extend(
                self.line
                    .bytes()
                    .filter(|b| !b.is_ascii_whitespace())
                    .map(|b| b.to_ascii_uppercase()),
            );
        }

        Ok(Some(FastaRecord { id, desc, seq }))
    }
}

impl<R: BufRead> Iterator for FastaReader<R> {
    type Item = Result<FastaRecord, IoError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parse_contigs_with_descriptions() {
        let data = b">chr1 first contig\nACgTNN\nacg\n>chr2\nAAA\n";
        let mut r = FastaReader::new(Cursor::new(&data[..]));

        let r1 = r.next_record().unwrap().unwrap();
        assert_eq!(r1.id, "chr1");
        assert_eq!(r1.desc.as_deref(), Some("first contig"));
        assert_eq!(r1.seq, b"ACGTNNACG");

        let r2 = r.next_record().unwrap().unwrap();
        assert_eq!(r2.id, "chr2");
        assert_eq!(r2.desc, None);
        assert_eq!(r2.seq, b"AAA");

        assert!(r.next_record().unwrap().is_none());
        assert!(r.next_record().unwrap().is_none());
    }

    #[test]
    fn crlf_comments_and_blank_lines() {
        let data = b"\n;comment\n>chr1 desc\r\nAC g t\r\n;inline\r\n acgt\r\n\n>chrM \r\n";
        let records: Vec<FastaRecord> = FastaReader::new(Cursor::new(&data[..]))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].seq, b"ACGTACGT");
        assert_eq!(records[1].id, "chrM");
        assert!(records[1].seq.is_empty());
    }

    #[test]
    fn sequence_without_header_is_rejected() {
        let mut r = FastaReader::new(Cursor::new(&b"ACGT\n>chr1\nA\n"[..]));
        assert!(matches!(r.next_record(), Err(IoError::InvalidFasta(_))));
        let mut r = FastaReader::new(Cursor::new(&b"> \nA\n"[..]));
        assert!(matches!(r.next_record(), Err(IoError::InvalidFasta(_))));
    }
}
