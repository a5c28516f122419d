//! The daemon's signing credential.
//!
//! Constructed once at startup and owned by the scheduler loop; never
//! cloned into other tasks. Signing is fully local: a legacy EIP-155
//! transaction is RLP-encoded, hashed with Keccak-256, and signed with the
//! secp256k1 key.

use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use rlp::RlpStream;
use std::path::PathBuf;

use lottery_abi::{calls::keccak256, Address};

/// An unsigned contract call, pre-escalation values already applied.
#[derive(Debug, Clone)]
pub struct CallTx {
    pub nonce: u64,
    /// Gas price in wei, already fee-escalated by the submitter.
    pub gas_price: u128,
    pub gas: u64,
    pub to: Address,
    pub value: u128,
    pub data: Vec<u8>,
}

pub struct TxSigner {
    key: SigningKey,
    address: Address,
    chain_id: u64,
}

impl TxSigner {
    pub fn from_hex_key(hex_key: &str, chain_id: u64) -> Result<Self, String> {
        let stripped = hex_key.trim().strip_prefix("0x").unwrap_or(hex_key.trim());
        let raw = hex::decode(stripped).map_err(|e| format!("invalid key hex: {e}"))?;
        let key = SigningKey::from_slice(&raw).map_err(|e| format!("invalid secp256k1 key: {e}"))?;
        let address = derive_address(&key);
        Ok(Self {
            key,
            address,
            chain_id,
        })
    }

    /// Load the key from a file containing the hex-encoded secret.
    pub fn load(path: &str, chain_id: u64) -> Result<Self, String> {
        let expanded = expand_tilde(path);
        let contents = std::fs::read_to_string(&expanded)
            .map_err(|e| format!("read key file {}: {e}", expanded.display()))?;
        Self::from_hex_key(&contents, chain_id)
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Produce the signed raw transaction bytes for `eth_sendRawTransaction`.
    pub fn sign_call(&self, tx: &CallTx) -> Result<Vec<u8>, String> {
        let sighash = keccak256(&self.rlp_unsigned(tx));
        let (signature, recovery) = self
            .key
            .sign_prehash_recoverable(&sighash)
            .map_err(|e| format!("ecdsa signing: {e}"))?;

        let (r_bytes, s_bytes) = signature.split_bytes();
        let v = self.chain_id * 2 + 35 + u64::from(recovery.to_byte());

        let mut s = RlpStream::new_list(9);
        append_tx_body(&mut s, tx);
        s.append(&trim_be(u128::from(v)));
        s.append(&strip_leading_zeros(r_bytes.as_slice()));
        s.append(&strip_leading_zeros(s_bytes.as_slice()));
        Ok(s.out().to_vec())
    }

    /// EIP-155 signing payload: the nine-item list with (chain_id, 0, 0) in
    /// place of the signature.
    fn rlp_unsigned(&self, tx: &CallTx) -> Vec<u8> {
        let mut s = RlpStream::new_list(9);
        append_tx_body(&mut s, tx);
        s.append(&trim_be(self.chain_id as u128));
        s.append(&Vec::<u8>::new());
        s.append(&Vec::<u8>::new());
        s.out().to_vec()
    }
}

fn append_tx_body(s: &mut RlpStream, tx: &CallTx) {
    s.append(&trim_be(tx.nonce as u128));
    s.append(&trim_be(tx.gas_price));
    s.append(&trim_be(tx.gas as u128));
    s.append(&tx.to.as_bytes().to_vec());
    s.append(&trim_be(tx.value));
    s.append(&tx.data);
}

/// RLP integers are minimal big-endian byte strings; zero is the empty string.
fn trim_be(v: u128) -> Vec<u8> {
    let bytes = v.to_be_bytes();
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes[first..].to_vec()
}

fn strip_leading_zeros(bytes: &[u8]) -> Vec<u8> {
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes[first..].to_vec()
}

/// Keccak-256 of the uncompressed public key, last 20 bytes.
fn derive_address(key: &SigningKey) -> Address {
    let point = key.verifying_key().to_encoded_point(false);
    let digest = keccak256(&point.as_bytes()[1..]);
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest[12..]);
    Address(out)
}

fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            let mut p = PathBuf::from(home);
            if path.len() > 2 {
                p.push(&path[2..]);
            }
            return p;
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EIP155_KEY: &str = "0x4646464646464646464646464646464646464646464646464646464646464646";

    #[test]
    fn test_address_derivation() {
        let signer = TxSigner::from_hex_key(EIP155_KEY, 1).unwrap();
        assert_eq!(
            signer.address().to_string(),
            "0x9d8a62f656a8d1615c1294fd71e9cfb3e4855a4f"
        );
    }

    #[test]
    fn test_eip155_example_transaction() {
        // The worked example from EIP-155: chain id 1, nonce 9, 20 gwei,
        // 21000 gas, 1 ether to 0x3535...35, empty data.
        let signer = TxSigner::from_hex_key(EIP155_KEY, 1).unwrap();
        let tx = CallTx {
            nonce: 9,
            gas_price: 20_000_000_000,
            gas: 21_000,
            to: "0x3535353535353535353535353535353535353535".parse().unwrap(),
            value: 1_000_000_000_000_000_000,
            data: Vec::new(),
        };

        assert_eq!(
            hex::encode(keccak256(&signer.rlp_unsigned(&tx))),
            "daf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
        );
        assert_eq!(
            hex::encode(signer.sign_call(&tx).unwrap()),
            "f86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
        );
    }

    #[test]
    fn test_rejects_malformed_keys() {
        assert!(TxSigner::from_hex_key("0x1234", 1).is_err());
        assert!(TxSigner::from_hex_key("not hex", 1).is_err());
        // Zero is not a valid secp256k1 secret scalar.
        let zero = format!("0x{}", "00".repeat(32));
        assert!(TxSigner::from_hex_key(&zero, 1).is_err());
    }

    #[test]
    fn test_trim_be() {
        assert_eq!(trim_be(0), Vec::<u8>::new());
        assert_eq!(trim_be(1), vec![1]);
        assert_eq!(trim_be(0x0400), vec![4, 0]);
    }

    #[test]
    fn test_expand_tilde() {
        std::env::set_var("HOME", "/home/settler");
        assert_eq!(
            expand_tilde("~/keys/settler.key"),
            PathBuf::from("/home/settler/keys/settler.key")
        );
        assert_eq!(expand_tilde("/etc/key"), PathBuf::from("/etc/key"));
    }
}
