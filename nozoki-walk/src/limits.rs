//! 走査の上限設定

/// 走査の上限
///
/// コンテナ自身が要素数を報告しない走査（終端までのチェーン、木の背骨、タプルの入れ子）
/// に対して、壊れたリンクによる無限ループを防ぐ上限です。
#[derive(Debug, Clone)]
pub struct WalkLimits {
    /// 要素数が不明な走査で辿るノードの最大数
    pub max_nodes: usize,
    /// 木の背骨・親方向の遡り・入れ子の最大深さ
    pub max_depth: usize,
}

impl Default for WalkLimits {
    fn default() -> Self {
        Self {
            max_nodes: 1 << 16,
            max_depth: 4096,
        }
    }
}
