//! Extract registry events from a mined receipt.

use alloy::primitives::U256;
use alloy::sol_types::SolEvent;

use crate::blockchain::abi::{CertificateIssued, CertificateRevoked};
use crate::blockchain::types::LedgerReceipt;

/// Certificate id carried by the first `CertificateIssued` log, if any.
pub fn decode_issued_event(receipt: &LedgerReceipt) -> Option<U256> {
    receipt
        .logs
        .iter()
        .filter(|log| log.data.topics().first() == Some(&CertificateIssued::SIGNATURE_HASH))
        .find_map(|log| match CertificateIssued::decode_log_data(&log.data) {
            Ok(event) => Some(event.certificateId),
            Err(e) => {
                tracing::warn!(tx_hash = %receipt.tx_hash, error = %e, "Malformed CertificateIssued log");
                None
            }
        })
}

/// True iff the receipt carries a well-formed `CertificateRevoked` log.
pub fn decode_revoked_event(receipt: &LedgerReceipt) -> bool {
    receipt.logs.iter().any(|log| {
        log.data.topics().first() == Some(&CertificateRevoked::SIGNATURE_HASH)
            && CertificateRevoked::decode_log_data(&log.data).is_ok()
    })
}
