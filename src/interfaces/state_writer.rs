use crate::domain::shipment::Account;
use crate::error::{Result, StateCodecError};
use std::collections::BTreeMap;
use std::io::Write;

/// Writes the ledger state as pretty JSON keyed by account address.
pub struct StateWriter<W: Write> {
    writer: W,
}

impl<W: Write> StateWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_accounts(&mut self, accounts: &BTreeMap<String, Account>) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, accounts).map_err(StateCodecError::from)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payload::ItemQuantity;

    #[test]
    fn test_writes_addresses_shipments_and_items() {
        let mut account = Account::new();
        account
            .add_items("X1", &[ItemQuantity::new("apple", 10)], "Warehouse")
            .unwrap();
        let mut accounts = BTreeMap::new();
        accounts.insert("abc123".to_string(), account);

        let mut out = Vec::new();
        StateWriter::new(&mut out).write_accounts(&accounts).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["abc123"]["X1"]["path"], "Warehouse");
        assert_eq!(value["abc123"]["X1"]["apple"], 10);
    }

    #[test]
    fn test_empty_state_is_empty_object() {
        let mut out = Vec::new();
        StateWriter::new(&mut out)
            .write_accounts(&BTreeMap::new())
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{}\n");
    }
}
