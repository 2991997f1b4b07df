//! Key-prefix namespaces within the single `sled::Tree` (spec.md §4.3).
//!
//! A single tree with prefixed keys, rather than one `sled::Tree` per
//! concern, is what lets `Batch::commit` apply `BLOCK`/`INDEX`/`HEIGHT`/
//! `UTXO`/`ADDR`/`STATE` writes as one atomic `sled::Batch` (see
//! `DESIGN.md`: the teacher commits several trees "together" only by
//! convention, which this spec's all-or-nothing requirement rules out).

use ember_chain::hash::Hash256;
use ember_chain::transparent::OutPoint;

fn push_hash(buf: &mut Vec<u8>, hash: &Hash256) {
    buf.extend_from_slice(hash.as_bytes());
}

fn push_outpoint(buf: &mut Vec<u8>, outpoint: &OutPoint) {
    push_hash(buf, &outpoint.tx_hash);
    buf.extend_from_slice(&outpoint.index.to_be_bytes());
}

pub fn block(hash: &Hash256) -> Vec<u8> {
    let mut key = b"BLOCK/".to_vec();
    push_hash(&mut key, hash);
    key
}

pub fn index(hash: &Hash256) -> Vec<u8> {
    let mut key = b"INDEX/".to_vec();
    push_hash(&mut key, hash);
    key
}

pub fn height(height: u32) -> Vec<u8> {
    let mut key = b"HEIGHT/".to_vec();
    key.extend_from_slice(&height.to_be_bytes());
    key
}

pub fn tx(txid: &Hash256) -> Vec<u8> {
    let mut key = b"TX/".to_vec();
    push_hash(&mut key, txid);
    key
}

pub fn utxo(outpoint: &OutPoint) -> Vec<u8> {
    let mut key = b"UTXO/".to_vec();
    push_outpoint(&mut key, outpoint);
    key
}

pub fn addr(address: &str, outpoint: &OutPoint) -> Vec<u8> {
    let mut key = b"ADDR/".to_vec();
    key.extend_from_slice(address.as_bytes());
    key.push(b'/');
    push_outpoint(&mut key, outpoint);
    key
}

pub fn addr_prefix(address: &str) -> Vec<u8> {
    let mut key = b"ADDR/".to_vec();
    key.extend_from_slice(address.as_bytes());
    key.push(b'/');
    key
}

pub fn undo(hash: &Hash256) -> Vec<u8> {
    let mut key = b"UNDO/".to_vec();
    push_hash(&mut key, hash);
    key
}

pub const STATE_TIP: &[u8] = b"STATE/tip";
