//! 走査が生成する論理要素

use nozoki_host::{ObjectHandle, RemoteAccessor, RemoteEvalError, Value};

/// ノードのペイロードから取り出した論理要素
///
/// 集合やシーケンスでは `value` はNoneです。
#[derive(Debug, Clone, PartialEq)]
pub struct ElementPair {
    pub key: Value,
    pub value: Option<Value>,
}

impl ElementPair {
    /// 単一要素
    pub fn single(key: Value) -> Self {
        Self { key, value: None }
    }

    /// キーと値の組
    pub fn pair(key: Value, value: Value) -> Self {
        Self {
            key,
            value: Some(value),
        }
    }
}

/// 走査の1ステップ（失敗はプレースホルダ要素として扱われる）
pub type Step = std::result::Result<ElementPair, RemoteEvalError>;

/// ペイロードの形
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// ペイロード全体が1つの要素
    Whole,
    /// `couple` のように2つのフィールドを持つ組
    Couple {
        first: &'static str,
        second: &'static str,
    },
}

impl PayloadShape {
    /// `original::couple` のレイアウト
    pub const COUPLE: PayloadShape = PayloadShape::Couple {
        first: "first_",
        second: "second_",
    };

    /// ノードのペイロードフィールドから要素を取り出す
    pub fn extract(
        &self,
        accessor: &RemoteAccessor<'_>,
        node: &ObjectHandle,
        payload: &str,
    ) -> Step {
        let data = accessor.field(node, payload)?;

        match self {
            PayloadShape::Whole => Ok(ElementPair::single(data)),
            PayloadShape::Couple { first, second } => {
                let couple = data.as_handle().ok_or_else(|| {
                    RemoteEvalError::EvaluationFailed(format!(
                        "payload '{}' is not an aggregate: {}",
                        payload, data
                    ))
                })?;
                let key = accessor.field(&couple, first)?;
                let value = accessor.field(&couple, second)?;
                Ok(ElementPair::pair(key, value))
            }
        }
    }
}
