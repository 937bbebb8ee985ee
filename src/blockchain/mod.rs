pub mod bridge;
pub mod traits;

pub use bridge::{AllowanceKey, ApprovalRequest, BridgeReceipt, ReceiptKind, TransferRequest};
pub use traits::{AllowanceSource, AssetQueryService, BridgeBroadcaster, QueryParamStore, WalletSigner};
