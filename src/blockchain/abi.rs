//! Static protocol descriptor for the certificate registry contract.
//!
//! Function and event signatures the registrar depends on. A change to the
//! deployed contract means updating this descriptor and `ABI_VERSION`; the
//! lifecycle logic only sees the generated types.

use alloy::sol;

/// Version of the registry interface described below.
pub const ABI_VERSION: &str = "academic-registry/1";

sol! {
    /// Emitted when the registry assigns a new certificate id.
    #[derive(Debug, PartialEq, Eq)]
    event CertificateIssued(uint256 indexed certificateId, address indexed issuer, string studentName);

    /// Emitted when a certificate is invalidated.
    #[derive(Debug, PartialEq, Eq)]
    event CertificateRevoked(uint256 indexed certificateId);

    /// Record a certificate for a student; the id is assigned by the contract.
    function issueCertificate(string studentName, string courseName) external;

    /// Invalidate a previously issued certificate.
    function revokeCertificate(uint256 id) external;

    /// Read back a certificate.
    function verifyCertificate(uint256 id) external view returns (bool valid, string student, string course, address issuer, uint256 date);
}
