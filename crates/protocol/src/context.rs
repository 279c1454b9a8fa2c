//! The execution context of a single call.

use bolt_bridge_primitives::{Address, Amount, BlockHeight};
use serde::{Deserialize, Serialize};

/// Who is calling, at which block, and with how much value attached.
///
/// The value is whatever the external value-transfer primitive escrowed on behalf of the caller
/// for this call (native coin or token, depending on the asset the call concerns). Calls that move
/// value in check that it matches exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// The account that submitted the call.
    pub caller: Address,

    /// The height of the block in which the call executes.
    pub block_height: BlockHeight,

    /// The value attached to the call.
    #[serde(default, with = "bolt_bridge_primitives::serde_amount")]
    pub value: Amount,
}

impl CallContext {
    /// Creates a context without any attached value.
    pub const fn new(caller: Address, block_height: BlockHeight) -> Self {
        Self {
            caller,
            block_height,
            value: 0,
        }
    }

    /// Returns a copy of this context with `value` attached.
    pub const fn with_value(self, value: Amount) -> Self {
        Self { value, ..self }
    }

    /// Checks that exactly `expected` was attached.
    pub(crate) fn expect_value(&self, expected: Amount) -> crate::errors::ProtocolResult<()> {
        if self.value == expected {
            Ok(())
        } else {
            Err(crate::errors::ProtocolError::ValueMismatch {
                expected,
                attached: self.value,
            })
        }
    }
}
