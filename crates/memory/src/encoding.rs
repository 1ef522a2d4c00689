//! Portable text form of embedding vectors.
//!
//! A vector of `f32` is stored as its little-endian bytes encoded with
//! Adobe ascii85 (no `<~ ~>` delimiters, `z` for an all-zero group).
//! The text form only needs to round-trip; it is not a wire protocol.

use tessera_core::error::VectorError;

const BASE: u32 = 85;
const OFFSET: u8 = b'!';
const ZERO_GROUP: char = 'z';

/// Encode raw bytes as ascii85.
pub fn a85_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().div_ceil(4) * 5);

    for chunk in bytes.chunks(4) {
        let mut group = [0u8; 4];
        group[..chunk.len()].copy_from_slice(chunk);
        let mut word = u32::from_be_bytes(group);

        if word == 0 && chunk.len() == 4 {
            out.push(ZERO_GROUP);
            continue;
        }

        let mut digits = [0u8; 5];
        for digit in digits.iter_mut().rev() {
            *digit = (word % BASE) as u8 + OFFSET;
            word /= BASE;
        }
        // A partial group of n bytes is written as n + 1 digits.
        for &digit in &digits[..chunk.len() + 1] {
            out.push(digit as char);
        }
    }

    out
}

/// Decode ascii85 text, ignoring whitespace.
pub fn a85_decode(text: &str) -> Result<Vec<u8>, VectorError> {
    let mut out = Vec::with_capacity(text.len() / 5 * 4);
    let mut group = [0u8; 5];
    let mut filled = 0;

    for (pos, c) in text.char_indices() {
        if c.is_ascii_whitespace() {
            continue;
        }
        if c == ZERO_GROUP {
            if filled != 0 {
                return Err(VectorError::Decode(format!(
                    "'z' inside a group at offset {pos}"
                )));
            }
            out.extend_from_slice(&[0; 4]);
            continue;
        }
        if !('!'..='u').contains(&c) {
            return Err(VectorError::Decode(format!(
                "invalid character {c:?} at offset {pos}"
            )));
        }

        group[filled] = c as u8 - OFFSET;
        filled += 1;
        if filled == 5 {
            out.extend_from_slice(&group_to_bytes(&group)?);
            filled = 0;
        }
    }

    match filled {
        0 => {}
        1 => {
            return Err(VectorError::Decode(
                "dangling single character in final group".into(),
            ));
        }
        n => {
            for digit in group.iter_mut().skip(n) {
                *digit = (BASE - 1) as u8;
            }
            let bytes = group_to_bytes(&group)?;
            out.extend_from_slice(&bytes[..n - 1]);
        }
    }

    Ok(out)
}

fn group_to_bytes(group: &[u8; 5]) -> Result<[u8; 4], VectorError> {
    let value = group
        .iter()
        .fold(0u64, |acc, &d| acc * BASE as u64 + d as u64);
    let word = u32::try_from(value)
        .map_err(|_| VectorError::Decode(format!("group value {value} overflows 32 bits")))?;
    Ok(word.to_be_bytes())
}

/// Encode an embedding vector into its storage string.
pub fn encode_vector(vector: &[f32]) -> String {
    let bytes: Vec<u8> = vector.iter().flat_map(|v| v.to_le_bytes()).collect();
    a85_encode(&bytes)
}

/// Decode a storage string back into an embedding vector.
pub fn decode_vector(text: &str) -> Result<Vec<f32>, VectorError> {
    let bytes = a85_decode(text)?;
    if bytes.len() % 4 != 0 {
        return Err(VectorError::Decode(format!(
            "{} bytes is not a whole number of f32 values",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}
