//! Binary short-range file: an 80-byte little-endian header followed by the overlap and
//! Hamiltonian matrices of the short-range basis.

use crate::core::basis::{NonlinearParams, TermOrdering, table_size};
use crate::core::linalg::SquareMatrix;
use crate::core::wavefunction::SpinState;
use std::io::{self, Read, Write};
use thiserror::Error;

pub const MAGIC: u32 = 0x3148_7350;
pub const HEADER_LEN: i32 = 80;
pub const DATA_FORMAT: i32 = 8;
pub const FORMALISM: i32 = 1;
pub const MAX_VERSION: i32 = 8;
pub const MAX_L_VALUE: i32 = 8;

#[derive(Debug, Error)]
pub enum ShortRangeError {
    #[error("failed to read short-range data")]
    Io(#[from] io::Error),
    #[error("invalid short-range header: {field} is {value}, expected {expected}")]
    InvalidHeader {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("triplet flag must be 0 or 1, found {0}")]
    InvalidTriplet(i32),
    #[error("{matrix} matrix is truncated")]
    Truncated {
        matrix: &'static str,
        #[source]
        source: io::Error,
    },
}

/// Validated header fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShortRangeHeader {
    pub version: i32,
    pub omega: i32,
    pub num_short_terms: usize,
    /// Second term-count field. Carried through but not used.
    pub num_short_terms_alt: i32,
    pub l_value: u32,
    pub spin: SpinState,
    pub ordering: TermOrdering,
    pub integration_type: i32,
    pub nonlinear: NonlinearParams,
    pub var_len: i32,
}

/// `PhiPhi` (overlap) and `PhiHPhi` (Hamiltonian) over the doubled short-range basis.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShortRangeBlock {
    pub phi_phi: SquareMatrix,
    pub phi_h_phi: SquareMatrix,
}

impl ShortRangeBlock {
    pub fn width(&self) -> usize {
        self.phi_phi.width()
    }
}

fn invalid(field: &'static str, value: impl ToString, expected: &'static str) -> ShortRangeError {
    ShortRangeError::InvalidHeader {
        field,
        value: value.to_string(),
        expected,
    }
}

struct HeaderCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl HeaderCursor<'_> {
    fn i32(&mut self) -> i32 {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.bytes[self.pos..self.pos + 4]);
        self.pos += 4;
        i32::from_le_bytes(raw)
    }

    fn f64(&mut self) -> f64 {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&self.bytes[self.pos..self.pos + 8]);
        self.pos += 8;
        f64::from_le_bytes(raw)
    }
}

/// Reads and validates the header without touching the data block.
pub fn read_header(reader: &mut impl Read) -> Result<ShortRangeHeader, ShortRangeError> {
    let mut bytes = [0u8; HEADER_LEN as usize];
    reader.read_exact(&mut bytes)?;
    let mut cursor = HeaderCursor {
        bytes: &bytes,
        pos: 0,
    };

    let magic = cursor.i32() as u32;
    let version = cursor.i32();
    let header_len = cursor.i32();
    let data_format = cursor.i32();
    let omega = cursor.i32();
    let num_terms = cursor.i32();
    let num_terms_alt = cursor.i32();
    let l_value = cursor.i32();
    let formalism = cursor.i32();
    let triplet = cursor.i32();
    let ordering = cursor.i32();
    let integration_type = cursor.i32();
    let num_sets = cursor.i32();
    let alpha = cursor.f64();
    let beta = cursor.f64();
    let gamma = cursor.f64();
    let var_len = cursor.i32();

    if magic != MAGIC {
        return Err(invalid("magic number", format!("{magic:#010x}"), "0x31487350"));
    }
    if !(1..=MAX_VERSION).contains(&version) {
        return Err(invalid("version", version, "a value in 1..=8"));
    }
    if header_len != HEADER_LEN {
        return Err(invalid("header length", header_len, "80"));
    }
    if data_format != DATA_FORMAT {
        return Err(invalid("data format", data_format, "8"));
    }
    if omega < -1 {
        return Err(invalid("omega", omega, "at least -1"));
    }
    if num_terms < 0 {
        return Err(invalid("number of terms", num_terms, "non-negative"));
    }
    let num_short_terms = num_terms as usize;
    if num_short_terms > table_size(omega) {
        return Err(invalid("number of terms", num_terms, "at most C(omega + 6, 6)"));
    }
    if matrix_bytes(num_short_terms).is_none() {
        return Err(invalid("number of terms", num_terms, "an addressable matrix size"));
    }
    for (field, value) in [("alpha", alpha), ("beta", beta), ("gamma", gamma)] {
        if value.is_nan() || value <= 0.0 {
            return Err(invalid(field, value, "positive"));
        }
    }
    if !(0..=MAX_L_VALUE).contains(&l_value) {
        return Err(invalid("L value", l_value, "a value in 0..=8"));
    }
    if formalism != FORMALISM {
        return Err(invalid("formalism", formalism, "1"));
    }
    if num_sets != 1 {
        return Err(invalid("number of sets", num_sets, "1"));
    }
    let ordering = TermOrdering::from_tag(ordering)
        .ok_or_else(|| invalid("ordering", ordering, "0 or 1"))?;
    let spin = SpinState::from_flag(triplet).ok_or(ShortRangeError::InvalidTriplet(triplet))?;

    Ok(ShortRangeHeader {
        version,
        omega,
        num_short_terms,
        num_short_terms_alt: num_terms_alt,
        l_value: l_value as u32,
        spin,
        ordering,
        integration_type,
        nonlinear: NonlinearParams::new(alpha, beta, gamma),
        var_len,
    })
}

/// Byte length of one `2N x 2N` matrix of `f64`.
fn matrix_bytes(num_short_terms: usize) -> Option<usize> {
    let width = num_short_terms.checked_mul(2)?;
    width.checked_mul(width)?.checked_mul(8)
}

fn read_matrix(
    reader: &mut impl Read,
    num_short_terms: usize,
    matrix: &'static str,
) -> Result<SquareMatrix, ShortRangeError> {
    let len = matrix_bytes(num_short_terms).ok_or_else(|| {
        invalid("number of terms", num_short_terms, "an addressable matrix size")
    })?;
    // Grows with the data actually present, so a short file fails before a large allocation.
    let mut bytes = Vec::new();
    reader
        .by_ref()
        .take(len as u64)
        .read_to_end(&mut bytes)
        .map_err(|source| ShortRangeError::Truncated { matrix, source })?;
    if bytes.len() < len {
        return Err(ShortRangeError::Truncated {
            matrix,
            source: io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {len} bytes, found {}", bytes.len()),
            ),
        });
    }
    let values = bytes
        .chunks_exact(8)
        .map(|chunk| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            f64::from_le_bytes(raw)
        })
        .collect();
    SquareMatrix::from_row_major(2 * num_short_terms, values).map_err(|e| ShortRangeError::Truncated {
        matrix,
        source: io::Error::new(io::ErrorKind::InvalidData, e),
    })
}

/// Reads the two `2N x 2N` matrices that follow a validated header.
pub fn read_block(
    reader: &mut impl Read,
    header: &ShortRangeHeader,
) -> Result<ShortRangeBlock, ShortRangeError> {
    let phi_phi = read_matrix(reader, header.num_short_terms, "PhiPhi")?;
    let phi_h_phi = read_matrix(reader, header.num_short_terms, "PhiHPhi")?;
    Ok(ShortRangeBlock { phi_phi, phi_h_phi })
}

/// Writes a header and block in the layout `read_header`/`read_block` expect.
pub fn write_to(
    header: &ShortRangeHeader,
    block: &ShortRangeBlock,
    writer: &mut impl Write,
) -> Result<(), ShortRangeError> {
    let ints_before = [
        MAGIC as i32,
        header.version,
        HEADER_LEN,
        DATA_FORMAT,
        header.omega,
        header.num_short_terms as i32,
        header.num_short_terms_alt,
        header.l_value as i32,
        FORMALISM,
        header.spin.flag(),
        header.ordering.tag(),
        header.integration_type,
        1,
    ];
    for value in ints_before {
        writer.write_all(&value.to_le_bytes())?;
    }
    let NonlinearParams { alpha, beta, gamma } = header.nonlinear;
    for value in [alpha, beta, gamma] {
        writer.write_all(&value.to_le_bytes())?;
    }
    writer.write_all(&header.var_len.to_le_bytes())?;

    for matrix in [&block.phi_phi, &block.phi_h_phi] {
        for value in matrix.as_slice() {
            writer.write_all(&value.to_le_bytes())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Seek, SeekFrom};
    use tempfile::tempfile;

    fn header(num_short_terms: usize) -> ShortRangeHeader {
        ShortRangeHeader {
            version: 3,
            omega: 1,
            num_short_terms,
            num_short_terms_alt: num_short_terms as i32,
            l_value: 1,
            spin: SpinState::Triplet,
            ordering: TermOrdering::Shell,
            integration_type: 0,
            nonlinear: NonlinearParams::new(0.6, 0.4, 0.9),
            var_len: 0,
        }
    }

    fn block(width: usize) -> ShortRangeBlock {
        let phi_phi = (0..width * width).map(|i| i as f64 * 0.5).collect();
        let phi_h_phi = (0..width * width).map(|i| -(i as f64)).collect();
        ShortRangeBlock {
            phi_phi: SquareMatrix::from_row_major(width, phi_phi).unwrap(),
            phi_h_phi: SquareMatrix::from_row_major(width, phi_h_phi).unwrap(),
        }
    }

    fn encoded(header: &ShortRangeHeader, block: &ShortRangeBlock) -> Vec<u8> {
        let mut bytes = Vec::new();
        write_to(header, block, &mut bytes).unwrap();
        bytes
    }

    fn patch_i32(bytes: &mut [u8], field_index: usize, value: i32) {
        let at = field_index * 4;
        bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }

    #[test]
    fn header_occupies_exactly_eighty_bytes() {
        let bytes = encoded(&header(0), &ShortRangeBlock::default());
        assert_eq!(bytes.len(), 80);
    }

    #[test]
    fn file_written_to_disk_reads_back() {
        let h = header(2);
        let b = block(4);
        let mut file = tempfile().unwrap();
        write_to(&h, &b, &mut file).unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();

        let read = read_header(&mut file).unwrap();
        assert_eq!(read, h);
        assert_eq!(read_block(&mut file, &read).unwrap(), b);
    }

    #[test]
    fn wrong_magic_is_rejected_before_data() {
        let mut bytes = encoded(&header(1), &block(2));
        patch_i32(&mut bytes, 0, 0x1234);
        bytes.truncate(80);
        let err = read_header(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, ShortRangeError::InvalidHeader { field: "magic number", .. }));
    }

    #[test]
    fn wrong_header_length_is_rejected() {
        let mut bytes = encoded(&header(0), &ShortRangeBlock::default());
        patch_i32(&mut bytes, 2, 96);
        let err = read_header(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, ShortRangeError::InvalidHeader { field: "header length", .. }));
    }

    #[test]
    fn non_positive_alpha_is_rejected() {
        let mut h = header(0);
        h.nonlinear.alpha = 0.0;
        let bytes = encoded(&h, &ShortRangeBlock::default());
        let err = read_header(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, ShortRangeError::InvalidHeader { field: "alpha", .. }));
    }

    #[test]
    fn bad_triplet_flag_is_distinguished_from_invalid_header() {
        let mut bytes = encoded(&header(0), &ShortRangeBlock::default());
        patch_i32(&mut bytes, 9, 2);
        let err = read_header(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, ShortRangeError::InvalidTriplet(2)));
    }

    #[test]
    fn unknown_ordering_tag_is_an_invalid_header() {
        let mut bytes = encoded(&header(0), &ShortRangeBlock::default());
        patch_i32(&mut bytes, 10, 7);
        let err = read_header(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, ShortRangeError::InvalidHeader { field: "ordering", .. }));
    }

    #[test]
    fn term_count_beyond_the_table_is_rejected_before_data() {
        let mut bytes = encoded(&header(0), &ShortRangeBlock::default());
        // omega 1 allows at most 7 terms.
        patch_i32(&mut bytes, 5, 8);
        let err = read_header(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, ShortRangeError::InvalidHeader { field: "number of terms", .. }));
    }

    #[test]
    fn huge_term_count_is_an_invalid_header() {
        let mut bytes = encoded(&header(0), &ShortRangeBlock::default());
        patch_i32(&mut bytes, 5, i32::MAX);
        let err = read_header(&mut Cursor::new(bytes.clone())).unwrap_err();
        assert!(matches!(err, ShortRangeError::InvalidHeader { field: "number of terms", .. }));

        // Still rejected when omega is large enough to admit the count.
        patch_i32(&mut bytes, 4, 1000);
        let err = read_header(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, ShortRangeError::InvalidHeader { field: "number of terms", .. }));
    }

    #[test]
    fn large_term_count_with_missing_data_fails_without_allocating_it() {
        let mut h = header(0);
        h.omega = 1000;
        h.num_short_terms = 1_000_000;
        let bytes = encoded(&h, &ShortRangeBlock::default());
        let mut cursor = Cursor::new(bytes);
        let read = read_header(&mut cursor).unwrap();
        assert_eq!(read.num_short_terms, 1_000_000);
        let err = read_block(&mut cursor, &read).unwrap_err();
        assert!(matches!(err, ShortRangeError::Truncated { matrix: "PhiPhi", .. }));
    }

    #[test]
    fn empty_table_admits_no_terms() {
        let mut h = header(1);
        h.omega = -1;
        let bytes = encoded(&h, &block(2));
        let err = read_header(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, ShortRangeError::InvalidHeader { field: "number of terms", .. }));
    }

    #[test]
    fn truncated_data_block_names_the_matrix() {
        let mut bytes = encoded(&header(1), &block(2));
        bytes.truncate(80 + 4 * 8 + 8);
        let mut cursor = Cursor::new(bytes);
        let h = read_header(&mut cursor).unwrap();
        let err = read_block(&mut cursor, &h).unwrap_err();
        assert!(matches!(err, ShortRangeError::Truncated { matrix: "PhiHPhi", .. }));
    }
}
