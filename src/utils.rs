// Connext-specific lookup tables. Domain IDs are bridge-protocol identifiers
// for chains, distinct from native chain IDs.
// For reference: https://docs.connext.network/

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// domain id -> (chain id, default public RPC, balance API chain name)
static DOMAINS: Lazy<HashMap<&'static str, (u64, &'static str, &'static str)>> =
    Lazy::new(|| {
        HashMap::from([
            ("1869640809", (10u64, "https://rpc.ankr.com/optimism", "optimism-mainnet")),
            ("1886350457", (137, "https://polygon.llamarpc.com", "matic-mainnet")),
            ("1634886255", (42161, "https://arb-mainnet-public.unifra.io", "arbitrum-mainnet")),
            ("6450786", (56, "https://bsc.rpc.blxrbdn.com", "bsc-mainnet")),
        ])
    });

pub fn domain_to_chain_id(domain: &str) -> Option<u64> {
    DOMAINS.get(domain).map(|(chain_id, _, _)| *chain_id)
}

pub fn chain_id_to_domain(chain_id: u64) -> Option<&'static str> {
    DOMAINS
        .iter()
        .find(|(_, (id, _, _))| *id == chain_id)
        .map(|(domain, _)| *domain)
}

pub fn chain_id_to_rpc(chain_id: u64) -> Option<&'static str> {
    DOMAINS
        .values()
        .find(|(id, _, _)| *id == chain_id)
        .map(|(_, rpc, _)| *rpc)
}

/// Chain name in the balance-indexing API's naming scheme.
pub fn chain_id_to_chain_name(chain_id: u64) -> Option<&'static str> {
    DOMAINS
        .values()
        .find(|(id, _, _)| *id == chain_id)
        .map(|(_, _, name)| *name)
}

pub fn supported_domains() -> Vec<&'static str> {
    DOMAINS.keys().copied().collect()
}
