//! エラーメッセージ定数

/// 変数が見つからない場合のエラーメッセージ
pub const ERR_NO_SYMBOL: &str = "No symbol in current context";

/// 型に対応するアダプタが登録されていない場合のエラーメッセージ
pub const ERR_NO_ADAPTER: &str = "No display adapter registered for type";
