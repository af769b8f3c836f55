//! 添字アクセスによる走査
//!
//! `array`、`vector`、`bitSet`、`blocksList` のように、要素数と添字演算子だけで
//! 要素を取り出せるコンテナ向けです。1要素の失敗は次の添字に影響しません。

use crate::element::{ElementPair, Step};
use nozoki_host::{ObjectHandle, RemoteAccessor};
use std::ops::Range;

/// 添字走査
pub struct IndexedWalk<'a, 'h> {
    accessor: &'a RemoteAccessor<'h>,
    container: ObjectHandle,
    element_at: &'static str,
    indices: Range<usize>,
}

impl<'a, 'h> IndexedWalk<'a, 'h> {
    /// `0..size` の添字で `element_at` を呼び出す走査を作成する
    pub fn new(
        accessor: &'a RemoteAccessor<'h>,
        container: &ObjectHandle,
        size: usize,
        element_at: &'static str,
    ) -> Self {
        Self {
            accessor,
            container: container.clone(),
            element_at,
            indices: 0..size,
        }
    }
}

impl Iterator for IndexedWalk<'_, '_> {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        let index = self.indices.next()?.to_string();
        Some(
            self.accessor
                .invoke(&self.container, self.element_at, &[index.as_str()])
                .map(ElementPair::single),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.indices.size_hint()
    }
}
