//! スキップリストの走査
//!
//! 先頭の番兵ノードから、レベル0の `next` リンクを順に辿ります。レベル0は全要素を
//! 連結した基底層なので、構築上キーの昇順で要素が得られます。番兵自体は生成しません。

use crate::element::{PayloadShape, Step};
use nozoki_host::{ObjectHandle, RemoteAccessor, RemoteEvalError, Value};

/// スキップリストのレイアウト
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipListLayout {
    /// 番兵ノードへのポインタ
    pub head: &'static str,
    /// レベルごとのリンク配列
    pub next: &'static str,
    /// リンク配列から指定レベルのリンクを取り出すメンバー関数
    pub level_at: &'static str,
    pub payload: &'static str,
    pub shape: PayloadShape,
}

impl SkipListLayout {
    /// `original::skipList` のレイアウト
    pub const DEFAULT: SkipListLayout = SkipListLayout {
        head: "head_",
        next: "next_",
        level_at: "get",
        payload: "data_",
        shape: PayloadShape::COUPLE,
    };
}

impl Default for SkipListLayout {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// スキップリスト走査
pub struct SkipListWalk<'a, 'h> {
    accessor: &'a RemoteAccessor<'h>,
    layout: SkipListLayout,
    list: ObjectHandle,
    size: usize,
    /// 次に生成するノードへのリンク（Noneは番兵をまだ越えていない）
    cursor: Option<Value>,
    yielded: usize,
    pending: Option<RemoteEvalError>,
    done: bool,
}

impl<'a, 'h> SkipListWalk<'a, 'h> {
    /// 報告された要素数 `size` を上限に走査を作成する
    pub fn new(
        accessor: &'a RemoteAccessor<'h>,
        list: &ObjectHandle,
        size: usize,
        layout: SkipListLayout,
    ) -> Self {
        Self {
            accessor,
            layout,
            list: list.clone(),
            size,
            cursor: None,
            yielded: 0,
            pending: None,
            done: size == 0,
        }
    }

    /// ノードのレベル0リンクを読む
    fn level0(&self, node: &ObjectHandle) -> Result<Value, RemoteEvalError> {
        let links = self.accessor.field(node, self.layout.next)?;
        let links = self.accessor.deref(&links)?;
        self.accessor.invoke(&links, self.layout.level_at, &["0"])
    }

    /// 番兵を越えた最初のリンク
    fn past_sentinel(&self) -> Result<Value, RemoteEvalError> {
        let head = self.accessor.field(&self.list, self.layout.head)?;
        if head.is_null_pointer() {
            return Ok(head);
        }
        let sentinel = self.accessor.deref(&head)?;
        self.level0(&sentinel)
    }
}

impl Iterator for SkipListWalk<'_, '_> {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        if self.done {
            return None;
        }

        if self.yielded >= self.size {
            self.done = true;
            return None;
        }

        if let Some(err) = self.pending.take() {
            self.done = true;
            return Some(Err(err));
        }

        let link = match self.cursor.take() {
            Some(link) => link,
            None => match self.past_sentinel() {
                Ok(link) => link,
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            },
        };

        if link.is_null_pointer() {
            self.done = true;
            return None;
        }

        let node = match self.accessor.deref(&link) {
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
        if self.yielded < self.size {
            match self.level0(&node) {
                Ok(next) => self.cursor = Some(next),
                Err(err) => self.pending = Some(err),
            }
        }
        Some(item)
    }
}
