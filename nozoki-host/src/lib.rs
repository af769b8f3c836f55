//! nozoki ホスト接続層
//!
//! このクレートは、デバッガ（ホスト）のリフレクションAPIを抽象化します。
//! 検査対象プロセス内のオブジェクトに対するフィールド読み取り、メンバー関数の呼び出し、
//! アドレスの正規化と表示用フォーマットを提供します。

pub mod accessor;
pub mod address;
pub mod error;
pub mod host;
pub mod sim;
pub mod value;

pub use accessor::{AccessorConfig, RemoteAccessor};
pub use address::{address_of, format_address, format_handle_address, mask_to_width};
pub use error::{HostError, RemoteEvalError};
pub use host::{CallExpr, Host, PointerKind};
pub use sim::{SimHost, SimObject, SimOp};
pub use value::{ObjectHandle, Value};
