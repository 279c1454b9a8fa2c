//! Signing and checking relay attestations from the command line.

use anyhow::{bail, Result};
use bolt_bridge_protocol::attestation::{recover_relay_signer, sign_relay, RelaySignature};
use k256::ecdsa::SigningKey;
use tracing::info;

use crate::cli::{RecoverArgs, SignArgs};

/// Handles the sign command.
pub(crate) fn handle_sign(args: SignArgs) -> Result<()> {
    let key_bytes = hex::decode(args.key.trim_start_matches("0x"))?;
    if key_bytes.len() != 32 {
        bail!(
            "Key must be exactly 32 bytes (64 hex chars), got {} bytes",
            key_bytes.len()
        );
    }

    let key = SigningKey::from_slice(&key_bytes)?;
    let signature = sign_relay(&key, &args.swap_id, &args.operator)?;

    info!(swap_id = %args.swap_id, operator = %args.operator, "signed relay attestation");
    println!("{signature}");

    Ok(())
}

/// Handles the recover command.
pub(crate) fn handle_recover(args: RecoverArgs) -> Result<()> {
    let signature: RelaySignature = args.signature.parse()?;
    let signer = recover_relay_signer(&args.swap_id, &args.operator, &signature)?;

    println!("{signer}");

    Ok(())
}
