//! ホスト能力インターフェース

use crate::error::HostError;
use crate::value::{ObjectHandle, Value};
use std::fmt;

/// スマートポインタの指す先の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    /// 単一オブジェクト
    Scalar,
    /// 配列（`delete[]` で解放される）
    Array,
}

/// ターゲット内で評価するメンバー関数呼び出し式
///
/// `((T*)0xADDR)->op(args...)` の形に展開されます。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallExpr {
    pub type_name: String,
    pub address: u64,
    pub operation: String,
    pub args: Vec<String>,
}

impl CallExpr {
    pub fn new(type_name: &str, address: u64, operation: &str, args: &[&str]) -> Self {
        Self {
            type_name: type_name.to_string(),
            address,
            operation: operation.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl fmt::Display for CallExpr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "(({}*)0x{:x})->{}({})",
            self.type_name,
            self.address,
            self.operation,
            self.args.join(", ")
        )
    }
}

/// デバッガ（ホスト）のリフレクションAPI
///
/// フィールド読み取りと式評価の2つだけを必須とします。
/// 失敗はパニックではなく [`HostError`] で返します。
pub trait Host {
    /// オブジェクトのデータメンバーを読み取る
    fn read_field(&self, object: &ObjectHandle, field: &str) -> Result<Value, HostError>;

    /// ターゲットのコンテキストで呼び出し式を評価する
    fn evaluate(&self, expr: &CallExpr) -> Result<Value, HostError>;

    /// ホストの表示設定（例: `print pretty`）を問い合わせる
    fn parameter(&self, _name: &str) -> Option<bool> {
        None
    }

    /// 型システムが知っているスマートポインタの種類を返す
    ///
    /// ホストが判別できない場合はNone。呼び出し側は型名の文字列検査に切り替えます。
    fn pointer_kind(&self, _type_name: &str) -> Option<PointerKind> {
        None
    }
}
