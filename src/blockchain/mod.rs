//! Ledger integration subsystem.
//!
//! # Data Flow
//! ```text
//! LedgerConfig (resolved per operation)
//!     → gateway.rs (connect, per-signer submission lock)
//!     → client.rs (RPC connection with timeouts)
//!     → wallet.rs (key loading, signing)
//!     → transaction.rs (build, sign, broadcast, receipt wait)
//!     → events.rs (decode registry logs from the receipt)
//! ```
//!
//! # Security Constraints
//! - Never log private keys or full RPC URLs
//! - All RPC calls have configurable timeouts
//! - Nonce and gas price are fetched fresh for every submission

pub mod abi;
pub mod client;
pub mod events;
pub mod gateway;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::LedgerClient;
pub use events::{decode_issued_event, decode_revoked_event};
pub use gateway::{AlloyGateway, LedgerGateway, LedgerSession};
pub use types::{BlockchainError, BlockchainResult, CertificateView, ChainId, LedgerReceipt, PendingTx};
pub use wallet::Wallet;
