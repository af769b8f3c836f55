//! バケット付きハッシュ表の走査
//!
//! バケット番号 `0..bucket_count` の順に、各バケットの衝突チェーンを辿ります。
//! コンテナが報告した要素数に達した時点で全体を打ち切るため、バケットの状態が
//! 不整合でも余分なノードは訪れません。

use crate::element::{PayloadShape, Step};
use nozoki_host::{ObjectHandle, RemoteAccessor, RemoteEvalError, Value};
use tracing::debug;

/// ハッシュ表のレイアウト
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashLayout {
    /// バケット配列のフィールド
    pub buckets: &'static str,
    /// バケット数を返すメンバー関数
    pub bucket_count: &'static str,
    /// バケット先頭ノードを返すメンバー関数
    pub bucket_at: &'static str,
    /// 衝突チェーンのリンク
    pub next: &'static str,
    pub payload: &'static str,
    pub shape: PayloadShape,
}

impl HashLayout {
    /// `original::hashTable` のレイアウト
    pub const DEFAULT: HashLayout = HashLayout {
        buckets: "buckets",
        bucket_count: "size",
        bucket_at: "operator[]",
        next: "next_",
        payload: "data_",
        shape: PayloadShape::COUPLE,
    };
}

impl Default for HashLayout {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// ハッシュ表走査
pub struct HashWalk<'a, 'h> {
    accessor: &'a RemoteAccessor<'h>,
    layout: HashLayout,
    table: ObjectHandle,
    size: usize,
    /// 初期化後のバケット配列とバケット数
    buckets: Option<(ObjectHandle, usize)>,
    bucket: usize,
    cursor: Option<Value>,
    yielded: usize,
    done: bool,
}

impl<'a, 'h> HashWalk<'a, 'h> {
    /// 報告された要素数 `size` を上限に走査を作成する
    pub fn new(
        accessor: &'a RemoteAccessor<'h>,
        table: &ObjectHandle,
        size: usize,
        layout: HashLayout,
    ) -> Self {
        Self {
            accessor,
            layout,
            table: table.clone(),
            size,
            buckets: None,
            bucket: 0,
            cursor: None,
            yielded: 0,
            done: size == 0,
        }
    }

    fn open_buckets(&self) -> Result<(ObjectHandle, usize), RemoteEvalError> {
        let field = self.accessor.field(&self.table, self.layout.buckets)?;
        let buckets = self.accessor.deref(&field)?;
        let count = self
            .accessor
            .invoke_u64(&buckets, self.layout.bucket_count, &[])?;
        Ok((buckets, count as usize))
    }
}

impl Iterator for HashWalk<'_, '_> {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        if self.done {
            return None;
        }

        if self.buckets.is_none() {
            match self.open_buckets() {
                Ok(buckets) => self.buckets = Some(buckets),
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
        let (buckets, bucket_count) = self.buckets.clone()?;

        loop {
            if self.yielded >= self.size {
                self.done = true;
                return None;
            }

            match self.cursor.take() {
                Some(link) if !link.is_null_pointer() => {
                    let node = match self.accessor.deref(&link) {
                        Ok(node) => node,
                        Err(err) => return Some(Err(err)),
                    };
                    let item = self
                        .layout
                        .shape
                        .extract(self.accessor, &node, self.layout.payload);
                    match self.accessor.field(&node, self.layout.next) {
                        Ok(next) => self.cursor = Some(next),
                        Err(err) => debug!(bucket = self.bucket, %err, "collision chain unreadable"),
                    }
                    self.yielded += 1;
                    return Some(item);
                }
                _ => {}
            }

            if self.bucket >= bucket_count {
                self.done = true;
                return None;
            }

            let index = self.bucket.to_string();
            self.bucket += 1;
            match self
                .accessor
                .invoke(&buckets, self.layout.bucket_at, &[index.as_str()])
            {
                Ok(head) => self.cursor = Some(head),
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nozoki_host::{SimHost, SimObject, SimOp};

    const NODE: &str = "original::hashNode<int, int>";

    fn node(host: &mut SimHost, addr: u64, key: i64, next: Value) {
        let couple = host.alloc(
            SimObject::new("original::couple<int, int>")
                .field("first_", Value::Int(key))
                .field("second_", Value::Int(-key)),
        );
        host.insert(
            addr,
            SimObject::new(NODE)
                .field("data_", Value::Object(couple))
                .field("next_", next),
        );
    }

    fn table(host: &mut SimHost, heads: Vec<Value>) -> ObjectHandle {
        let buckets = host.alloc(
            SimObject::new("original::vector<original::hashNode<int, int>*>")
                .op("size", SimOp::Return(Value::Uint(heads.len() as u64)))
                .op("operator[]", SimOp::Index(heads)),
        );
        host.alloc(
            SimObject::new("original::hashTable<int, int>").field("buckets", Value::Object(buckets)),
        )
    }

    #[test]
    fn test_bucket_then_chain_order() {
        let mut host = SimHost::new();
        let (a, b, c) = (host.reserve(), host.reserve(), host.reserve());
        node(&mut host, a, 1, Value::pointer(b, NODE));
        node(&mut host, b, 2, Value::null(NODE));
        node(&mut host, c, 3, Value::null(NODE));
        let t = table(
            &mut host,
            vec![Value::pointer(a, NODE), Value::null(NODE), Value::pointer(c, NODE)],
        );
        let accessor = RemoteAccessor::new(&host);

        let keys: Vec<_> = HashWalk::new(&accessor, &t, 3, HashLayout::DEFAULT)
            .map(|s| s.unwrap().key)
            .collect();
        assert_eq!(keys, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn test_empty_table_reads_nothing() {
        let mut host = SimHost::new();
        let t = table(&mut host, vec![Value::null(NODE)]);
        let accessor = RemoteAccessor::new(&host);
        assert_eq!(HashWalk::new(&accessor, &t, 0, HashLayout::DEFAULT).count(), 0);
        assert_eq!(host.call_count(), 0);
    }

    #[test]
    fn test_bad_bucket_is_localized() {
        let mut host = SimHost::new();
        let a = host.reserve();
        node(&mut host, a, 5, Value::null(NODE));
        // バケット0は壊れていてポインタではない
        let t = table(&mut host, vec![Value::Int(7), Value::pointer(a, NODE)]);
        let accessor = RemoteAccessor::new(&host);

        let steps: Vec<_> = HashWalk::new(&accessor, &t, 1, HashLayout::DEFAULT).collect();
        assert_eq!(steps.len(), 2);
        assert!(steps[0].is_err());
        assert_eq!(steps[1].as_ref().unwrap().key, Value::Int(5));
    }
}
