mod action;
pub use action::{Action, PermissionLevel};

mod action_trace;
pub use action_trace::{AccountDelta, ActionReceipt, ActionTrace};

mod block;
pub use block::{SignedBlock, TransactionReceipt, TransactionVariant};

mod id;
pub use id::{Id, IdParseError};

mod packed_transaction;
pub use packed_transaction::PackedTransaction;

mod transaction;
pub use transaction::{Transaction, TransactionHeader, TransactionReceiptHeader, TransactionStatus};

mod transaction_trace;
pub use transaction_trace::{AugmentedTransactionTrace, TransactionTrace};

use pulsevm_name::Name;

pub const PULSE_NAME: Name = Name::from_static("pulse");
pub const ACTIVE_NAME: Name = Name::from_static("active");
pub const ONBLOCK_NAME: Name = Name::from_static("onblock");
