//! ホスト評価のエラー型

use thiserror::Error;

/// ホスト（デバッガ）が報告するエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// ターゲットがシグナルを受けた等で評価が中断された（再試行可能）
    #[error("evaluation interrupted: {0}")]
    Interrupted(String),

    /// 式の誤り、メンバーが存在しない、メモリが読めない等
    #[error("{0}")]
    Failed(String),

    /// 値がアドレスを持たない
    #[error("value is not addressable")]
    NotAddressable,
}

/// リモート評価のエラー
///
/// 表示全体を中断するのは、ルートオブジェクトのアドレスが解決できない場合だけです。
/// それ以外は子要素1つ分のプレースホルダに局所化されます。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteEvalError {
    /// オブジェクトがアドレスを持たない、またはnull
    #[error("nullptr")]
    NullHandle,

    /// 再試行上限まで中断され続けた
    #[error("target interrupted: {0}")]
    TransientFault(String),

    /// 再試行しない評価失敗
    #[error("{0}")]
    EvaluationFailed(String),
}

impl RemoteEvalError {
    /// 再試行で回復しうるエラーか
    pub fn is_transient(&self) -> bool {
        matches!(self, RemoteEvalError::TransientFault(_))
    }

    /// 表示用プレースホルダ文字列
    pub fn placeholder(&self) -> String {
        match self {
            RemoteEvalError::NullHandle => "nullptr".to_string(),
            other => format!("<unavailable: {}>", other),
        }
    }
}
