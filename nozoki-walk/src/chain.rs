//! 単方向・双方向チェーンの走査
//!
//! 先頭ノードから `next` リンクを辿ります。要素数が分かっている場合は、リンクの内容に
//! かかわらずその回数で止まるため、壊れた循環があっても終了します。

use crate::element::{PayloadShape, Step};
use crate::limits::WalkLimits;
use nozoki_host::{RemoteAccessor, RemoteEvalError, Value};
use tracing::warn;

/// チェーンノードのレイアウト
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainLayout {
    /// 次ノードへのリンク
    pub next: &'static str,
    /// ペイロード
    pub payload: &'static str,
    pub shape: PayloadShape,
}

impl ChainLayout {
    /// `original::chain` / `original::forwardChain` のノード
    pub const DEFAULT: ChainLayout = ChainLayout {
        next: "next",
        payload: "data_",
        shape: PayloadShape::Whole,
    };
}

impl Default for ChainLayout {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// 走査の上限
#[derive(Debug, Clone, Copy)]
enum Bound {
    /// コンテナが報告した要素数
    Size(usize),
    /// 要素数不明（nullまで辿る、安全上限つき）
    Terminator(usize),
}

/// チェーン走査
pub struct ChainWalk<'a, 'h> {
    accessor: &'a RemoteAccessor<'h>,
    layout: ChainLayout,
    cursor: Value,
    bound: Bound,
    yielded: usize,
    pending: Option<RemoteEvalError>,
    done: bool,
}

impl<'a, 'h> ChainWalk<'a, 'h> {
    /// 要素数が分かっているチェーンを走査する
    ///
    /// ちょうど `size` 個を生成したら、リンクの内容にかかわらず止まります。
    pub fn sized(
        accessor: &'a RemoteAccessor<'h>,
        head: Value,
        size: usize,
        layout: ChainLayout,
    ) -> Self {
        Self::with_bound(accessor, head, Bound::Size(size), layout)
    }

    /// nullリンクに達するまで走査する
    pub fn until_null(
        accessor: &'a RemoteAccessor<'h>,
        head: Value,
        layout: ChainLayout,
        limits: &WalkLimits,
    ) -> Self {
        Self::with_bound(accessor, head, Bound::Terminator(limits.max_nodes), layout)
    }

    fn with_bound(
        accessor: &'a RemoteAccessor<'h>,
        head: Value,
        bound: Bound,
        layout: ChainLayout,
    ) -> Self {
        Self {
            accessor,
            layout,
            cursor: head,
            bound,
            yielded: 0,
            pending: None,
            done: false,
        }
    }

    fn finish(&mut self) -> Option<Step> {
        self.done = true;
        None
    }
}

impl Iterator for ChainWalk<'_, '_> {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        if self.done {
            return None;
        }

        match self.bound {
            Bound::Size(size) if self.yielded >= size => return self.finish(),
            Bound::Terminator(cap) if self.yielded >= cap => {
                warn!(cap, "chain walk stopped at the node cap before reaching null");
                return self.finish();
            }
            _ => {}
        }

        if let Some(err) = self.pending.take() {
            self.done = true;
            return Some(Err(err));
        }

        if self.cursor.is_null_pointer() {
            self.done = true;
            return match self.bound {
                Bound::Size(size) => Some(Err(RemoteEvalError::EvaluationFailed(format!(
                    "chain ended after {} of {} elements",
                    self.yielded, size
                )))),
                Bound::Terminator(_) => None,
            };
        }

        let node = match self.accessor.deref(&self.cursor) {
            Ok(node) => node,
            Err(err) => {
                self.done = true;
                return Some(Err(err));
            }
        };

        let item = self
            .layout
            .shape
            .extract(self.accessor, &node, self.layout.payload);

        self.yielded += 1;
        // 最後の要素の後ろのリンクは読まない
        let last = matches!(self.bound, Bound::Size(size) if self.yielded >= size);
        if !last {
            match self.accessor.field(&node, self.layout.next) {
                Ok(next) => self.cursor = next,
                Err(err) => self.pending = Some(err),
            }
        }

        Some(item)
    }
}
