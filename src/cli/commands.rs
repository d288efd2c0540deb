//! CLI command handlers
//!
//! Implements the command handlers for the account tooling: key
//! generation, request hashing and signing, and a scripted end-to-end
//! demo against the in-memory host.

use crate::account::{AggregateCollector, MultisigAccount, SignerRegistry, SignerSignature};
use crate::core::{
    FieldElement, SignerId, INTERFACE_ID_ACCOUNT, INTERFACE_ID_INTROSPECTION,
};
use crate::crypto::{selector, SignerKeyPair};
use crate::execution::{
    selectors, sign_request, Call, DeployRequest, InvokeRequest, DEFAULT_CHAIN_ID, REQUEST_VERSION,
};
use crate::host::{Host, InMemoryHost, SchnorrOracle};
use std::fs;
use std::path::Path;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Generate key pairs and print their signer ids
pub fn keygen(count: usize) -> CliResult<()> {
    for i in 0..count {
        let key = SignerKeyPair::generate();
        println!("Signer {}", i + 1);
        println!("  private key: {}", key.private_key_hex());
        println!("  signer id:   {}", key.signer_id());
    }
    Ok(())
}

/// Print the canonical hash of a JSON request file
pub fn hash_request(path: &Path) -> CliResult<()> {
    let raw = fs::read_to_string(path)?;
    let request: InvokeRequest = serde_json::from_str(&raw)?;
    println!("{}", request.hash());
    Ok(())
}

/// Sign a request hash with a private key and print the contribution
pub fn sign(key_hex: &str, hash_hex: &str) -> CliResult<()> {
    let key = SignerKeyPair::from_private_key_hex(key_hex)?;
    let hash = FieldElement::from_hex(hash_hex)?;
    let (r, s) = key.sign(&hash)?;
    let contribution = SignerSignature {
        signer: key.signer_id(),
        r,
        s,
    };
    println!("{}", serde_json::to_string_pretty(&contribution)?);
    Ok(())
}

/// Run a scripted scenario against the in-memory host: deploy, transfer,
/// governance change, upgrade, then dump the broadcast log
pub fn demo() -> CliResult<()> {
    let mut host = InMemoryHost::new();

    // 2-of-3 signer set
    let mut keys: Vec<SignerKeyPair> = (0..3).map(|_| SignerKeyPair::generate()).collect();
    keys.sort_by_key(|key| key.signer_id());
    let signers: Vec<SignerId> = keys.iter().map(|key| key.signer_id()).collect();

    // Deployment pays for itself with a single bootstrap signature
    let code_v1 = selector("demo-code-v1");
    host.declare_code(code_v1, &[INTERFACE_ID_ACCOUNT, INTERFACE_ID_INTROSPECTION]);
    let mut deploy = DeployRequest {
        version: REQUEST_VERSION,
        chain_id: DEFAULT_CHAIN_ID,
        code: code_v1,
        salt: FieldElement::from_u64(7),
        threshold: 2,
        signers: signers.clone(),
        signatures: vec![],
    };
    deploy.signatures = vec![deploy.sign(&keys[0])?];
    MultisigAccount::validate_bootstrap(&deploy, &SchnorrOracle)?;

    let address = deploy.account_address();
    let account = MultisigAccount::new(address, deploy.threshold, &deploy.signers)?;
    host.set_active_code(address, code_v1)?;
    println!(
        "Deployed {} v{} at {} ({}-of-{})",
        account.name(),
        account.version(),
        address,
        account.threshold(),
        account.signer_count()
    );

    // A transfer authorized by two signers, assembled out of order
    let token = FieldElement::from_u64(0x70ce);
    host.register_target(token, vec![FieldElement::from_u64(1)]);
    let transfer = Call {
        target: token,
        selector: selector("transfer"),
        args: vec![FieldElement::from_u64(0xb0b), FieldElement::from_u64(250)],
    };
    let mut request = InvokeRequest::new(address, vec![transfer]);
    let registry = SignerRegistry::new(&account.signers())?;
    let mut collector = AggregateCollector::new(&registry, account.threshold(), request.hash());
    collector.add_signature(sign_request(&request, &keys[2])?, &SchnorrOracle)?;
    collector.add_signature(sign_request(&request, &keys[0])?, &SchnorrOracle)?;
    request.signatures = collector.finalize()?;

    account.validate(&request, &SchnorrOracle)?;
    let responses = account.execute(&request, &mut host)?;
    println!("Transfer executed, {} response bundle(s)", responses.len());

    // Governance: rotate in a fourth signer and raise the threshold
    let key_d = SignerKeyPair::generate();
    let govern = Call {
        target: address,
        selector: selectors::add_signers(),
        args: vec![FieldElement::from_u64(3), key_d.signer_id()],
    };
    let mut request = InvokeRequest::new(address, vec![govern]);
    request.signatures = vec![
        sign_request(&request, &keys[0])?,
        sign_request(&request, &keys[1])?,
    ];
    account.validate(&request, &SchnorrOracle)?;
    account.execute(&request, &mut host)?;
    println!(
        "Signer set is now {}-of-{}",
        account.threshold(),
        account.signer_count()
    );

    // Upgrade to new code, authorized by the new threshold
    let code_v2 = selector("demo-code-v2");
    host.declare_code(code_v2, &[INTERFACE_ID_ACCOUNT, INTERFACE_ID_INTROSPECTION]);
    let upgrade = Call {
        target: address,
        selector: selectors::upgrade(),
        args: vec![code_v2],
    };
    let mut request = InvokeRequest::new(address, vec![upgrade]);
    request.signatures = vec![
        sign_request(&request, &keys[0])?,
        sign_request(&request, &keys[1])?,
        sign_request(&request, &keys[2])?,
    ];
    account.validate(&request, &SchnorrOracle)?;
    account.execute(&request, &mut host)?;
    match host.active_code(address) {
        Some(code) => println!("Active code is now {}", code),
        None => println!("No active code registered"),
    }

    println!();
    println!("Broadcast log:");
    for record in host.events() {
        println!(
            "  {} {}",
            record.emitted_at,
            serde_json::to_string(&record.event)?
        );
    }
    Ok(())
}
