//! Transaction and batch envelopes exchanged with the ledger platform.
//!
//! Field numbers follow the platform's `transaction.proto` and `batch.proto`,
//! so the encoded bytes are accepted by its REST gateway as
//! `application/octet-stream`.

use prost::Message;

#[derive(Clone, PartialEq, Message)]
pub struct TransactionHeader {
    #[prost(string, tag = "1")]
    pub batcher_public_key: String,
    #[prost(string, repeated, tag = "2")]
    pub dependencies: Vec<String>,
    #[prost(string, tag = "3")]
    pub family_name: String,
    #[prost(string, tag = "4")]
    pub family_version: String,
    #[prost(string, repeated, tag = "5")]
    pub inputs: Vec<String>,
    #[prost(string, tag = "6")]
    pub nonce: String,
    #[prost(string, repeated, tag = "7")]
    pub outputs: Vec<String>,
    #[prost(string, tag = "9")]
    pub payload_sha512: String,
    #[prost(string, tag = "10")]
    pub signer_public_key: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct Transaction {
    /// Serialized `TransactionHeader`.
    #[prost(bytes = "vec", tag = "1")]
    pub header: Vec<u8>,
    /// Signature of `header` by the header's signer, in hex.
    #[prost(string, tag = "2")]
    pub header_signature: String,
    #[prost(bytes = "vec", tag = "3")]
    pub payload: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct BatchHeader {
    #[prost(string, tag = "1")]
    pub signer_public_key: String,
    #[prost(string, repeated, tag = "2")]
    pub transaction_ids: Vec<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Batch {
    /// Serialized `BatchHeader`.
    #[prost(bytes = "vec", tag = "1")]
    pub header: Vec<u8>,
    #[prost(string, tag = "2")]
    pub header_signature: String,
    #[prost(message, repeated, tag = "3")]
    pub transactions: Vec<Transaction>,
    #[prost(bool, tag = "4")]
    pub trace: bool,
}

#[derive(Clone, PartialEq, Message)]
pub struct BatchList {
    #[prost(message, repeated, tag = "1")]
    pub batches: Vec<Batch>,
}

/// What a transaction handler receives for one transaction: the decoded
/// header, the raw payload and the header signature (the transaction ID).
#[derive(Debug, Clone, PartialEq)]
pub struct TpProcessRequest {
    pub header: TransactionHeader,
    pub payload: Vec<u8>,
    pub signature: String,
}

impl TpProcessRequest {
    pub fn from_transaction(transaction: &Transaction) -> Result<Self, prost::DecodeError> {
        Ok(Self {
            header: TransactionHeader::decode(transaction.header.as_slice())?,
            payload: transaction.payload.clone(),
            signature: transaction.header_signature.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_field_numbers() {
        let header = TransactionHeader {
            family_name: "shipment".to_string(),
            ..Default::default()
        };
        // Field 3, wire type 2 (length delimited) => tag byte 0x1a.
        assert_eq!(header.encode_to_vec(), b"\x1a\x08shipment".to_vec());
    }

    #[test]
    fn test_request_from_transaction() {
        let header = TransactionHeader {
            family_name: "shipment".to_string(),
            family_version: "1.0".to_string(),
            signer_public_key: "02ab".to_string(),
            inputs: vec!["a".to_string()],
            outputs: vec!["a".to_string()],
            ..Default::default()
        };
        let transaction = Transaction {
            header: header.encode_to_vec(),
            header_signature: "sig".to_string(),
            payload: b"add,S1,1,apple,1,Warehouse".to_vec(),
        };

        let request = TpProcessRequest::from_transaction(&transaction).unwrap();
        assert_eq!(request.header, header);
        assert_eq!(request.signature, "sig");
        assert_eq!(request.payload, transaction.payload);
    }

    #[test]
    fn test_request_rejects_garbage_header() {
        let transaction = Transaction {
            header: vec![0xff, 0xff, 0xff],
            ..Default::default()
        };
        assert!(TpProcessRequest::from_transaction(&transaction).is_err());
    }
}
