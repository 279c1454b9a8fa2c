use std::path::PathBuf;

use bolt_bridge_primitives::{Address, SwapId};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "bolt-sim",
    about = "Relay bridge simulator and attestation tool",
    version
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum Commands {
    /// Print the default protocol parameters as TOML.
    DefaultParams,

    Sign(SignArgs),

    Recover(RecoverArgs),

    Demo(DemoArgs),
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Sign a relay attestation", version)]
pub(crate) struct SignArgs {
    #[arg(long, env = "RELAYER_KEY", help = "the relayer's secret key in hex")]
    pub(crate) key: String,

    #[arg(long, help = "the swap identifier being attested")]
    pub(crate) swap_id: SwapId,

    #[arg(long, help = "the operator that fulfilled the swap")]
    pub(crate) operator: Address,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Recover the signer of a relay attestation", version)]
pub(crate) struct RecoverArgs {
    #[arg(long, help = "the swap identifier being attested")]
    pub(crate) swap_id: SwapId,

    #[arg(long, help = "the operator named by the attestation")]
    pub(crate) operator: Address,

    #[arg(long, help = "the 65-byte signature in hex")]
    pub(crate) signature: String,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Run a swap between two simulated networks", version)]
pub(crate) struct DemoArgs {
    #[arg(long, help = "the path to the params file, defaults are used if absent")]
    pub(crate) params: Option<PathBuf>,

    #[arg(
        long,
        help = "have the relayer also attest the wrong operator and slash it on the destination"
    )]
    pub(crate) mismatch: bool,

    #[arg(long, default_value_t = 1_000_000_000, help = "the swap input in wei")]
    pub(crate) amount: u128,
}
