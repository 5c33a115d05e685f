//! Canonical block digests.
//!
//! Blocks are serialized as JSON with every object's keys sorted, `", "`
//! between items, `": "` between key and value, and non-ASCII characters
//! (plus DEL) escaped as `\uXXXX`. That is byte-for-byte the sorted-key
//! JSON dump the reference nodes hash, so `previous_hash` links agree
//! across implementations.

use std::io::{self, Write};

use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use super::Block;

/// Hex-encoded SHA-256 of the block's canonical serialization.
pub fn hash(block: &Block) -> String {
    // A Block only holds strings, integers and finite floats.
    let bytes = canonical_json(block).expect("serialize block");
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    hex::encode(hasher.finalize())
}

/// Serialize any value into the canonical form described above.
pub fn canonical_json<T: Serialize>(value: &T) -> serde_json::Result<Vec<u8>> {
    let value = sort_keys(serde_json::to_value(value)?);
    let mut out = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut out, SortedDumpFormatter);
    value.serialize(&mut ser)?;
    Ok(out)
}

/// Rebuild objects with their entries in lexicographic key order, whatever
/// map representation serde_json was compiled with.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, sort_keys(value)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

struct SortedDumpFormatter;

impl Formatter for SortedDumpFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if fragment.bytes().all(|b| b.is_ascii() && b != 0x7f) {
            return writer.write_all(fragment.as_bytes());
        }
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if ch.is_ascii() && ch != '\x7f' {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{canonical_json, hash};
    use crate::blockchain::Block;
    use crate::transaction::Transaction;

    fn block(index: u64, timestamp: f64, txs: Vec<Transaction>, proof: u64, prev: &str) -> Block {
        Block {
            index,
            timestamp,
            transactions: txs,
            proof,
            previous_hash: prev.to_string(),
        }
    }

    #[test]
    fn canonical_form_sorts_keys_and_spaces_separators() {
        let b = block(
            2,
            1700000060.25,
            vec![
                Transaction::new("0", "node-a", 1),
                Transaction::new("alice", "bob", 5),
            ],
            35293,
            "abc",
        );
        let json = String::from_utf8(canonical_json(&b).unwrap()).unwrap();
        assert_eq!(
            json,
            r#"{"index": 2, "previous_hash": "abc", "proof": 35293, "timestamp": 1700000060.25, "transactions": [{"amount": 1, "recipient": "node-a", "sender": "0"}, {"amount": 5, "recipient": "bob", "sender": "alice"}]}"#
        );
    }

    #[test]
    fn digests_match_reference_vectors() {
        let genesis = block(1, 1700000000.5, vec![], 100, "1");
        assert_eq!(
            hash(&genesis),
            "7dd0b05c7a6aafba30a3d6c7102d235385a934972e4c066bcea9f6adcbae98f2"
        );

        let second = block(
            2,
            1700000060.25,
            vec![
                Transaction::new("0", "node-a", 1),
                Transaction::new("alice", "bob", 5),
            ],
            35293,
            "abc",
        );
        assert_eq!(
            hash(&second),
            "576c23f6f580d004ac9df7b30bede58d5221df6c0c5704ffd4deb3a8cfb4b3c8"
        );
    }

    #[test]
    fn non_ascii_is_escaped_like_the_reference_dump() {
        let b = block(
            3,
            1700000120.0,
            vec![Transaction::new("zoë", "李", -2)],
            7,
            "x",
        );
        let json = String::from_utf8(canonical_json(&b).unwrap()).unwrap();
        assert!(json.contains(r#""recipient": "\u674e", "sender": "zo\u00eb""#));
        assert_eq!(
            hash(&b),
            "eb18d89caaf8be24d29dccf8f6b04efd2a17056cc009d9819da614354f05cc94"
        );

        let del = block(3, 1700000120.0, vec![Transaction::new("a\x7fb", "c", 1)], 7, "x");
        let json = String::from_utf8(canonical_json(&del).unwrap()).unwrap();
        assert!(json.contains(r#""sender": "a\u007fb""#));
        assert_eq!(
            hash(&del),
            "6b34db55c1e741b91301792631f33d3594265bef7c0466ead9ccd8fb6d3d222e"
        );
    }

    #[test]
    fn equal_blocks_hash_identically() {
        let txs = vec![Transaction::new("a", "b", 1), Transaction::new("c", "d", 2)];
        let first = block(5, 1.5, txs.clone(), 42, "p");
        let second = block(5, 1.5, txs, 42, "p");

        assert_eq!(hash(&first), hash(&first));
        assert_eq!(hash(&first), hash(&second));
    }

    #[test]
    fn transaction_order_is_significant() {
        let a = Transaction::new("a", "b", 1);
        let c = Transaction::new("c", "d", 2);
        let forward = block(5, 1.5, vec![a.clone(), c.clone()], 42, "p");
        let reversed = block(5, 1.5, vec![c, a], 42, "p");

        assert_ne!(hash(&forward), hash(&reversed));
    }
}
