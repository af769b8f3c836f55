//! 表示設定

use nozoki_walk::WalkLimits;

/// ホストの表示設定名（冗長表示の切り替え）
pub const PRETTY_PARAMETER: &str = "print pretty";

/// 既定の名前空間
pub const DEFAULT_NAMESPACE: &str = "original";

/// 表示設定
#[derive(Debug, Clone)]
pub struct DisplayConfig {
    /// 内部状態フィールドを表示するか（Noneならホストの `print pretty` に従う）
    pub verbose: Option<bool>,
    /// 1つのコンテナで表示する最大要素数
    pub max_children: usize,
    /// 入れ子になったコンテナを展開する最大深さ
    pub max_depth: usize,
    /// 対象ライブラリの名前空間
    pub namespace: String,
    /// 走査の上限
    pub limits: WalkLimits,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            verbose: None,
            max_children: 200,
            max_depth: 3,
            namespace: DEFAULT_NAMESPACE.to_string(),
            limits: WalkLimits::default(),
        }
    }
}

impl DisplayConfig {
    /// 名前空間を指定して設定を作成する
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    /// 名前空間で修飾したクラス名
    pub fn qualify(&self, name: &str) -> String {
        format!("{}::{}", self.namespace, name)
    }
}
