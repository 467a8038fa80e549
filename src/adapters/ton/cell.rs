//! TON Cells and Bags of Cells
//!
//! A deliberately small cell writer/reader: exactly what assembling and
//! hashing wallet-v4 transfer messages needs (ordinary cells, level 0, one
//! root). The corpus carries no TON SDK, so this stays in-crate; see
//! DESIGN.md for the trade-off.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use thiserror::Error;

use super::address::TonAddress;

/// Ordinary cells hold at most 1023 data bits
pub const MAX_CELL_BITS: usize = 1023;

/// and at most 4 references
pub const MAX_CELL_REFS: usize = 4;

const BOC_MAGIC: [u8; 4] = [0xb5, 0xee, 0x9c, 0x72];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CellError {
    #[error("cell capacity exceeded: {0} bits")]
    BitOverflow(usize),

    #[error("cell reference limit exceeded")]
    RefOverflow,

    #[error("value {value} does not fit in {bits} bits")]
    ValueOverflow { value: u64, bits: usize },

    #[error("malformed bag of cells: {0}")]
    MalformedBoc(String),
}

/// An immutable ordinary cell: up to 1023 data bits and 4 child references
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<Arc<Cell>>,
}

impl Cell {
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn refs(&self) -> &[Arc<Cell>] {
        &self.refs
    }

    /// Depth of the subtree below this cell
    pub fn depth(&self) -> u16 {
        self.refs
            .iter()
            .map(|r| r.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Packed data bytes (MSB-first). For byte-aligned cells this is the raw
    /// content; otherwise the final byte carries the completion tag.
    pub fn data_bytes(&self) -> Vec<u8> {
        self.augmented_data()
    }

    /// Data bytes with the completion tag applied when bit_len is not a
    /// whole number of bytes
    fn augmented_data(&self) -> Vec<u8> {
        let byte_len = (self.bit_len + 7) / 8;
        let mut data = self.data[..byte_len].to_vec();
        if self.bit_len % 8 != 0 {
            data[byte_len - 1] |= 0x80 >> (self.bit_len % 8);
        }
        data
    }

    fn descriptors(&self) -> (u8, u8) {
        let d1 = self.refs.len() as u8;
        let d2 = (self.bit_len / 8 + (self.bit_len + 7) / 8) as u8;
        (d1, d2)
    }

    /// Standard-representation hash (SHA-256), used for signing payloads and
    /// as the external-message id
    pub fn repr_hash(&self) -> [u8; 32] {
        let (d1, d2) = self.descriptors();
        let mut repr = vec![d1, d2];
        repr.extend(self.augmented_data());
        for r in &self.refs {
            repr.extend(r.depth().to_be_bytes());
        }
        for r in &self.refs {
            repr.extend(r.repr_hash());
        }
        let mut hasher = Sha256::new();
        hasher.update(&repr);
        hasher.finalize().into()
    }

    /// Hash as lowercase hex (transaction id form)
    pub fn repr_hash_hex(&self) -> String {
        self.repr_hash()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}

/// Bit-level builder for ordinary cells
#[derive(Debug, Default)]
pub struct CellBuilder {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<Arc<Cell>>,
}

impl CellBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store_bit(&mut self, bit: bool) -> Result<&mut Self, CellError> {
        if self.bit_len >= MAX_CELL_BITS {
            return Err(CellError::BitOverflow(self.bit_len + 1));
        }
        let byte_index = self.bit_len / 8;
        if byte_index == self.data.len() {
            self.data.push(0);
        }
        if bit {
            self.data[byte_index] |= 0x80 >> (self.bit_len % 8);
        }
        self.bit_len += 1;
        Ok(self)
    }

    /// Store `value` big-endian in exactly `bits` bits
    pub fn store_uint(&mut self, value: u64, bits: usize) -> Result<&mut Self, CellError> {
        if bits < 64 && value >> bits != 0 {
            return Err(CellError::ValueOverflow { value, bits });
        }
        for i in (0..bits).rev() {
            self.store_bit((value >> i) & 1 == 1)?;
        }
        Ok(self)
    }

    pub fn store_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self, CellError> {
        for &b in bytes {
            self.store_uint(b as u64, 8)?;
        }
        Ok(self)
    }

    /// VarUInteger 16 ("coins"): 4-bit byte length, then the value
    pub fn store_coins(&mut self, amount: u64) -> Result<&mut Self, CellError> {
        if amount == 0 {
            return self.store_uint(0, 4);
        }
        let byte_len = ((64 - amount.leading_zeros() as usize) + 7) / 8;
        self.store_uint(byte_len as u64, 4)?;
        self.store_uint(amount, byte_len * 8)
    }

    /// MsgAddress: addr_none$00 or addr_std$10 (no anycast)
    pub fn store_address(&mut self, address: Option<&TonAddress>) -> Result<&mut Self, CellError> {
        match address {
            None => self.store_uint(0b00, 2),
            Some(addr) => {
                self.store_uint(0b100, 3)?; // addr_std + no anycast
                self.store_uint(addr.workchain as u8 as u64, 8)?;
                self.store_bytes(&addr.hash)
            }
        }
    }

    pub fn store_ref(&mut self, cell: Arc<Cell>) -> Result<&mut Self, CellError> {
        if self.refs.len() >= MAX_CELL_REFS {
            return Err(CellError::RefOverflow);
        }
        self.refs.push(cell);
        Ok(self)
    }

    pub fn build(self) -> Cell {
        Cell {
            data: self.data,
            bit_len: self.bit_len,
            refs: self.refs,
        }
    }
}

/// Serialize a single-root bag of cells (no index, no checksum)
pub fn serialize_boc(root: &Arc<Cell>) -> Vec<u8> {
    let mut cells: Vec<Arc<Cell>> = Vec::new();
    let mut ref_indices: Vec<Vec<usize>> = Vec::new();
    collect_preorder(root, &mut cells, &mut ref_indices);

    let mut cells_data = Vec::new();
    for (cell, refs) in cells.iter().zip(&ref_indices) {
        let (d1, d2) = cell.descriptors();
        cells_data.push(d1);
        cells_data.push(d2);
        cells_data.extend(cell.augmented_data());
        for &r in refs {
            cells_data.push(r as u8);
        }
    }

    let total_size = cells_data.len();
    let offset_size = byte_width(total_size as u64);

    let mut out = Vec::with_capacity(16 + total_size);
    out.extend(BOC_MAGIC);
    out.push(1); // flags: no index, no crc, ref size 1 byte
    out.push(offset_size as u8);
    out.push(cells.len() as u8); // cell count
    out.push(1); // roots
    out.push(0); // absent
    out.extend(&(total_size as u64).to_be_bytes()[8 - offset_size..]);
    out.push(0); // root index
    out.extend(cells_data);
    out
}

/// Parse a bag of cells produced by this crate or by an API (single root)
pub fn parse_boc(bytes: &[u8]) -> Result<Arc<Cell>, CellError> {
    let err = |detail: &str| CellError::MalformedBoc(detail.to_string());

    if bytes.len() < 10 || bytes[..4] != BOC_MAGIC {
        return Err(err("bad magic"));
    }
    let flags = bytes[4];
    let has_index = flags & 0x80 != 0;
    let has_crc = flags & 0x40 != 0;
    let ref_size = (flags & 0x07) as usize;
    let offset_size = bytes[5] as usize;
    if ref_size == 0 || ref_size > 4 || offset_size == 0 || offset_size > 8 {
        return Err(err("bad size descriptors"));
    }

    let mut pos = 6;
    let read_int = |width: usize, pos: &mut usize| -> Result<u64, CellError> {
        if *pos + width > bytes.len() {
            return Err(CellError::MalformedBoc("truncated header".to_string()));
        }
        let mut value = 0u64;
        for &b in &bytes[*pos..*pos + width] {
            value = value << 8 | b as u64;
        }
        *pos += width;
        Ok(value)
    };

    let cell_count = read_int(ref_size, &mut pos)? as usize;
    let root_count = read_int(ref_size, &mut pos)? as usize;
    let _absent = read_int(ref_size, &mut pos)?;
    let _total_size = read_int(offset_size, &mut pos)?;
    if root_count != 1 {
        return Err(err("expected exactly one root"));
    }
    let root_index = read_int(ref_size, &mut pos)? as usize;
    if has_index {
        pos += cell_count * offset_size;
    }

    // First pass: raw cells with child indices
    let mut raw: Vec<(Vec<u8>, usize, Vec<usize>)> = Vec::with_capacity(cell_count);
    for _ in 0..cell_count {
        if pos + 2 > bytes.len() {
            return Err(err("truncated cell"));
        }
        let d1 = bytes[pos];
        let d2 = bytes[pos + 1];
        pos += 2;
        if d1 & 0x08 != 0 {
            return Err(err("exotic cells unsupported"));
        }
        let ref_count = (d1 & 0x07) as usize;
        if ref_count > MAX_CELL_REFS {
            return Err(err("too many refs"));
        }
        let byte_len = (d2 as usize + 1) / 2;
        if pos + byte_len + ref_count * ref_size > bytes.len() {
            return Err(err("truncated cell body"));
        }
        let data = bytes[pos..pos + byte_len].to_vec();
        pos += byte_len;

        let bit_len = if d2 % 2 == 0 {
            byte_len * 8
        } else {
            let last = *data.last().ok_or_else(|| err("empty padded cell"))?;
            if last == 0 {
                return Err(err("missing completion tag"));
            }
            (byte_len - 1) * 8 + 7 - last.trailing_zeros() as usize
        };

        let mut children = Vec::with_capacity(ref_count);
        for _ in 0..ref_count {
            children.push(read_int(ref_size, &mut pos)? as usize);
        }
        raw.push((data, bit_len, children));
    }
    let _ = has_crc; // trailing checksum, if present, is not verified

    // Second pass, bottom-up: standard layout guarantees children follow
    // their parents, so building in reverse resolves every reference.
    let mut built: Vec<Option<Arc<Cell>>> = vec![None; cell_count];
    for index in (0..cell_count).rev() {
        let (data, bit_len, children) = &raw[index];
        let mut refs = Vec::with_capacity(children.len());
        for &child in children {
            if child <= index || child >= cell_count {
                return Err(err("forward reference order violated"));
            }
            refs.push(built[child].clone().ok_or_else(|| err("unresolved ref"))?);
        }
        // Strip the completion tag back out of the data buffer
        let mut clean = data.clone();
        if bit_len % 8 != 0 {
            let last = clean.len() - 1;
            let keep_mask = !(0xFFu8 >> (bit_len % 8));
            clean[last] &= keep_mask;
        }
        built[index] = Some(Arc::new(Cell {
            data: clean,
            bit_len: *bit_len,
            refs,
        }));
    }

    built
        .get(root_index)
        .and_then(|c| c.clone())
        .ok_or_else(|| err("root index out of range"))
}

fn collect_preorder(
    cell: &Arc<Cell>,
    cells: &mut Vec<Arc<Cell>>,
    ref_indices: &mut Vec<Vec<usize>>,
) -> usize {
    let index = cells.len();
    cells.push(cell.clone());
    ref_indices.push(Vec::new());
    let mut children = Vec::with_capacity(cell.refs.len());
    for r in &cell.refs {
        children.push(collect_preorder(r, cells, ref_indices));
    }
    ref_indices[index] = children;
    index
}

fn byte_width(value: u64) -> usize {
    (((64 - value.leading_zeros() as usize) + 7) / 8).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell_of(f: impl FnOnce(&mut CellBuilder)) -> Arc<Cell> {
        let mut b = CellBuilder::new();
        f(&mut b);
        Arc::new(b.build())
    }

    #[test]
    fn test_empty_cell_hash_matches_reference() {
        // The canonical TON empty-cell hash
        let empty = cell_of(|_| {});
        assert_eq!(
            empty.repr_hash_hex(),
            "96a296d224f285c67bee93c30f8a309157f0daa35dc5b87e410b78630a09cfc7"
        );
    }

    #[test]
    fn test_bit_packing_msb_first() {
        let cell = cell_of(|b| {
            b.store_uint(0b1010_1100, 8).unwrap();
        });
        assert_eq!(cell.bit_len(), 8);
        assert_eq!(cell.augmented_data(), vec![0b1010_1100]);
    }

    #[test]
    fn test_completion_tag() {
        // 3 data bits "101" -> byte 1011_0000 with tag at bit 3
        let cell = cell_of(|b| {
            b.store_bit(true).unwrap();
            b.store_bit(false).unwrap();
            b.store_bit(true).unwrap();
        });
        assert_eq!(cell.augmented_data(), vec![0b1011_0000]);
    }

    #[test]
    fn test_store_uint_overflow_detected() {
        let mut b = CellBuilder::new();
        assert!(matches!(
            b.store_uint(16, 4),
            Err(CellError::ValueOverflow { .. })
        ));
        assert!(b.store_uint(15, 4).is_ok());
    }

    #[test]
    fn test_coins_encoding() {
        // 0 coins: 4 zero bits
        let zero = cell_of(|b| {
            b.store_coins(0).unwrap();
        });
        assert_eq!(zero.bit_len(), 4);

        // 1_000_000_000 (0x3B9ACA00) needs 4 bytes: 4 + 32 bits
        let one_ton = cell_of(|b| {
            b.store_coins(1_000_000_000).unwrap();
        });
        assert_eq!(one_ton.bit_len(), 36);
    }

    #[test]
    fn test_bit_capacity_enforced() {
        let mut b = CellBuilder::new();
        for _ in 0..MAX_CELL_BITS {
            b.store_bit(true).unwrap();
        }
        assert!(matches!(b.store_bit(true), Err(CellError::BitOverflow(_))));
    }

    #[test]
    fn test_ref_capacity_enforced() {
        let mut b = CellBuilder::new();
        for _ in 0..MAX_CELL_REFS {
            b.store_ref(cell_of(|_| {})).unwrap();
        }
        assert!(matches!(
            b.store_ref(cell_of(|_| {})),
            Err(CellError::RefOverflow)
        ));
    }

    #[test]
    fn test_depth() {
        let leaf = cell_of(|_| {});
        let mid = cell_of(|b| {
            b.store_ref(leaf).unwrap();
        });
        let root = cell_of(|b| {
            b.store_ref(mid).unwrap();
        });
        assert_eq!(root.depth(), 2);
    }

    #[test]
    fn test_boc_round_trip_preserves_hash() {
        let inner = cell_of(|b| {
            b.store_uint(0xDEADBEEF, 32).unwrap();
            b.store_coins(250_000_000).unwrap();
        });
        let root = cell_of(|b| {
            b.store_uint(0x0f8a7ea5, 32).unwrap();
            b.store_bit(true).unwrap();
            b.store_ref(inner).unwrap();
        });

        let boc = serialize_boc(&root);
        assert_eq!(&boc[..4], &BOC_MAGIC);

        let parsed = parse_boc(&boc).unwrap();
        assert_eq!(parsed.repr_hash(), root.repr_hash());
        assert_eq!(parsed.bit_len(), root.bit_len());
        assert_eq!(parsed.refs().len(), 1);
    }

    #[test]
    fn test_boc_round_trip_odd_bit_lengths() {
        let root = cell_of(|b| {
            b.store_uint(0b101, 3).unwrap();
            b.store_ref(cell_of(|b| {
                b.store_bit(true).unwrap();
            }))
            .unwrap();
        });
        let parsed = parse_boc(&serialize_boc(&root)).unwrap();
        assert_eq!(parsed.repr_hash(), root.repr_hash());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_boc(&[]).is_err());
        assert!(parse_boc(&[0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09]).is_err());
    }

    #[test]
    fn test_address_storage_bit_count() {
        let addr = TonAddress {
            workchain: 0,
            hash: [0x11; 32],
        };
        let with_addr = cell_of(|b| {
            b.store_address(Some(&addr)).unwrap();
        });
        // 3 tag bits + 8 workchain + 256 hash
        assert_eq!(with_addr.bit_len(), 267);

        let none = cell_of(|b| {
            b.store_address(None).unwrap();
        });
        assert_eq!(none.bit_len(), 2);
    }
}
