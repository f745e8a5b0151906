//! Conversion of a [`SigningDomain`] into an EIP-712 domain separator.

use alloy_sol_types::{Eip712Domain, eip712_domain};
use treasury::SigningDomain;

/// Builds the EIP-712 domain for `domain`.
///
/// All four fields are always present, so the domain type string is
/// `EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)`.
#[must_use]
pub fn eip712_domain(domain: &SigningDomain) -> Eip712Domain {
    eip712_domain! {
        name: domain.name.clone(),
        version: domain.version.clone(),
        chain_id: domain.network_id,
        verifying_contract: domain.verifying_contract,
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{U256, address};

    use super::*;

    #[test]
    fn test_domain_fields_are_carried_over() {
        let domain = SigningDomain {
            name: "Treasury".into(),
            version: "2".into(),
            network_id: 8453,
            verifying_contract: address!("0x0000000000000000000000000000000000000fa7"),
        };
        let eip712 = eip712_domain(&domain);
        assert_eq!(eip712.name.as_deref(), Some("Treasury"));
        assert_eq!(eip712.version.as_deref(), Some("2"));
        assert_eq!(eip712.chain_id, Some(U256::from(8453)));
        assert_eq!(eip712.verifying_contract, Some(domain.verifying_contract));
    }

    #[test]
    fn test_any_field_change_changes_separator() {
        let base = SigningDomain {
            name: "Treasury".into(),
            version: "1".into(),
            network_id: 1,
            verifying_contract: address!("0x0000000000000000000000000000000000000fa7"),
        };
        let separator = eip712_domain(&base).separator();

        let mut other = base.clone();
        other.version = "2".into();
        assert_ne!(eip712_domain(&other).separator(), separator);

        let mut other = base.clone();
        other.network_id = 10;
        assert_ne!(eip712_domain(&other).separator(), separator);

        let mut other = base;
        other.verifying_contract = address!("0x0000000000000000000000000000000000000fa8");
        assert_ne!(eip712_domain(&other).separator(), separator);
    }
}
