//! 二分探索木の中間順走査
//!
//! 最小ノード（左の背骨の末端）から最大ノード（右の背骨の末端）まで、後続ノードを
//! 順に辿ります。後続ノードは右部分木の最左ノード、右部分木がなければ
//! 自分を左部分木に含む最も近い祖先です。

use crate::element::{PayloadShape, Step};
use crate::limits::WalkLimits;
use nozoki_host::{ObjectHandle, RemoteAccessor, RemoteEvalError, Value};
use tracing::warn;

/// 木ノードのレイアウト
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeLayout {
    pub left: &'static str,
    pub right: &'static str,
    pub parent: &'static str,
    pub payload: &'static str,
    pub shape: PayloadShape,
}

impl TreeLayout {
    /// `original::RBTree` のノード
    pub const DEFAULT: TreeLayout = TreeLayout {
        left: "left_",
        right: "right_",
        parent: "parent_",
        payload: "data_",
        shape: PayloadShape::COUPLE,
    };
}

impl Default for TreeLayout {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// 走査状態
enum State {
    /// まだ最小・最大ノードを探していない
    Start(Value),
    /// `current` を次に生成する（`last` は最大ノードのアドレス）
    At { current: ObjectHandle, last: Option<u64> },
    Done,
}

/// 中間順走査
pub struct TreeWalk<'a, 'h> {
    accessor: &'a RemoteAccessor<'h>,
    layout: TreeLayout,
    limits: WalkLimits,
    state: State,
    /// 残りの生成数（要素数が不明なら `max_nodes`）
    remaining: usize,
    sized: bool,
    pending: Option<RemoteEvalError>,
}

impl<'a, 'h> TreeWalk<'a, 'h> {
    /// 根ポインタから走査を作成する
    ///
    /// `size` はコンテナが報告した要素数で、壊れた親リンクによる循環の歯止めになります。
    /// 不明な場合は `limits.max_nodes` 個で打ち切ります。
    pub fn new(
        accessor: &'a RemoteAccessor<'h>,
        root: Value,
        size: Option<usize>,
        layout: TreeLayout,
        limits: &WalkLimits,
    ) -> Self {
        Self {
            accessor,
            layout,
            limits: limits.clone(),
            state: State::Start(root),
            remaining: size.unwrap_or(limits.max_nodes),
            sized: size.is_some(),
            pending: None,
        }
    }

    /// リンクを辿る（nullならNone）
    fn link(&self, node: &ObjectHandle, name: &str) -> Result<Option<ObjectHandle>, RemoteEvalError> {
        let value = self.accessor.field(node, name)?;
        if value.is_null_pointer() {
            return Ok(None);
        }
        self.accessor.deref(&value).map(Some)
    }

    /// 指定方向の背骨を末端まで下る
    fn descend(&self, from: ObjectHandle, direction: &str) -> Result<ObjectHandle, RemoteEvalError> {
        let mut node = from;
        for _ in 0..self.limits.max_depth {
            match self.link(&node, direction)? {
                Some(child) => node = child,
                None => return Ok(node),
            }
        }
        Err(RemoteEvalError::EvaluationFailed(format!(
            "'{}' spine is deeper than {} nodes",
            direction, self.limits.max_depth
        )))
    }

    /// 中間順の後続ノード
    fn successor(&self, node: &ObjectHandle) -> Result<Option<ObjectHandle>, RemoteEvalError> {
        if let Some(right) = self.link(node, self.layout.right)? {
            return self.descend(right, self.layout.left).map(Some);
        }

        let mut child = node.clone();
        let mut parent = self.link(&child, self.layout.parent)?;
        for _ in 0..self.limits.max_depth {
            let Some(p) = parent else {
                return Ok(None);
            };
            let right = self.link(&p, self.layout.right)?;
            if right.map(|r| r.address) != Some(child.address) {
                return Ok(Some(p));
            }
            parent = self.link(&p, self.layout.parent)?;
            child = p;
        }
        Err(RemoteEvalError::EvaluationFailed(format!(
            "parent chain is deeper than {} nodes",
            self.limits.max_depth
        )))
    }

    fn start(&self, root: &Value) -> Result<State, RemoteEvalError> {
        if root.is_null_pointer() {
            return Ok(State::Done);
        }
        let root = self.accessor.deref(root)?;
        let first = self.descend(root.clone(), self.layout.left)?;
        let last = self.descend(root, self.layout.right)?;
        Ok(State::At {
            current: first,
            last: last.address,
        })
    }
}

impl Iterator for TreeWalk<'_, '_> {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        if self.remaining == 0 {
            if !self.sized && matches!(self.state, State::At { .. }) {
                warn!(cap = self.limits.max_nodes, "tree walk stopped at the node cap");
            }
            self.state = State::Done;
            self.pending = None;
            return None;
        }

        if let Some(err) = self.pending.take() {
            self.state = State::Done;
            return Some(Err(err));
        }

        if let State::Start(root) = &self.state {
            match self.start(root) {
                Ok(state) => self.state = state,
                Err(err) => {
                    self.state = State::Done;
                    return Some(Err(err));
                }
            }
        }

        let (current, last) = match std::mem::replace(&mut self.state, State::Done) {
            State::At { current, last } => (current, last),
            _ => return None,
        };

        let item = self
            .layout
            .shape
            .extract(self.accessor, &current, self.layout.payload);

        self.remaining -= 1;
        // 最後の要素の後続は探さない
        if self.remaining > 0 && current.address != last {
            match self.successor(&current) {
                Ok(Some(next)) => self.state = State::At { current: next, last },
                Ok(None) => {
                    self.pending = Some(RemoteEvalError::EvaluationFailed(
                        "in-order walk ran out of ancestors before the maximum node".to_string(),
                    ))
                }
                Err(err) => self.pending = Some(err),
            }
        }
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nozoki_host::{SimHost, SimObject};

    const NODE: &str = "original::RBNode<int, int>";
    const COUPLE: &str = "original::couple<int, int>";

    /// 手で組んだ木
    ///
    /// ```text
    ///        4
    ///      /   \
    ///     2     6
    ///    / \   /
    ///   1   3 5
    /// ```
    fn build_tree(host: &mut SimHost) -> Value {
        let keys = [4i64, 2, 6, 1, 3, 5];
        let addrs: Vec<u64> = keys.iter().map(|_| host.reserve()).collect();
        let ptr = |i: Option<usize>| match i {
            Some(i) => Value::pointer(addrs[i], NODE),
            None => Value::null(NODE),
        };
        // (left, right, parent)
        let links = [
            (Some(1), Some(2), None),
            (Some(3), Some(4), Some(0)),
            (Some(5), None, Some(0)),
            (None, None, Some(1)),
            (None, None, Some(1)),
            (None, None, Some(2)),
        ];
        for (i, (l, r, p)) in links.iter().enumerate() {
            let couple = host.alloc(
                SimObject::new(COUPLE)
                    .field("first_", Value::Int(keys[i]))
                    .field("second_", Value::Int(keys[i] * 10)),
            );
            host.insert(
                addrs[i],
                SimObject::new(NODE)
                    .field("left_", ptr(*l))
                    .field("right_", ptr(*r))
                    .field("parent_", ptr(*p))
                    .field("data_", Value::Object(couple)),
            );
        }
        ptr(Some(0))
    }

    #[test]
    fn test_in_order() {
        let mut host = SimHost::new();
        let root = build_tree(&mut host);
        let accessor = RemoteAccessor::new(&host);

        let pairs: Vec<_> = TreeWalk::new(&accessor, root, Some(6), TreeLayout::DEFAULT, &WalkLimits::default())
            .map(|s| s.unwrap())
            .collect();
        let keys: Vec<_> = pairs.iter().map(|p| p.key.clone()).collect();
        assert_eq!(
            keys,
            [1, 2, 3, 4, 5, 6].iter().map(|k| Value::Int(*k)).collect::<Vec<_>>()
        );
        assert_eq!(pairs[0].value, Some(Value::Int(10)));
    }

    #[test]
    fn test_empty_tree() {
        let host = SimHost::new();
        let accessor = RemoteAccessor::new(&host);
        let count = TreeWalk::new(&accessor, Value::null(NODE), Some(0), TreeLayout::DEFAULT, &WalkLimits::default()).count();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_single_node() {
        let mut host = SimHost::new();
        let couple = host.alloc(
            SimObject::new(COUPLE)
                .field("first_", Value::Int(7))
                .field("second_", Value::Int(70)),
        );
        let node = host.alloc(
            SimObject::new(NODE)
                .field("left_", Value::null(NODE))
                .field("right_", Value::null(NODE))
                .field("parent_", Value::null(NODE))
                .field("data_", Value::Object(couple)),
        );
        let accessor = RemoteAccessor::new(&host);
        let root = Value::pointer(node.address.unwrap(), NODE);
        let steps: Vec<_> = TreeWalk::new(&accessor, root, None, TreeLayout::DEFAULT, &WalkLimits::default()).collect();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].as_ref().unwrap().key, Value::Int(7));
    }

    #[test]
    fn test_corrupted_parent_cycle_is_bounded_by_size() {
        let mut host = SimHost::new();
        let root = build_tree(&mut host);
        let three_addr = {
            let accessor = RemoteAccessor::new(&host);
            let four = accessor.deref(&root).unwrap();
            let two = accessor.deref(&accessor.field(&four, "left_").unwrap()).unwrap();
            accessor.field(&two, "right_").unwrap().as_handle().unwrap().address.unwrap()
        };
        // 3 の親を 3 自身に向けると、後続ノードが 3 のまま進まなくなる
        host.object_mut(three_addr)
            .unwrap()
            .set_field("parent_", Value::pointer(three_addr, NODE));

        let accessor = RemoteAccessor::new(&host);
        let steps: Vec<_> = TreeWalk::new(&accessor, root, Some(6), TreeLayout::DEFAULT, &WalkLimits::default()).collect();
        assert_eq!(steps.len(), 6);
        assert_eq!(steps[3].as_ref().unwrap().key, Value::Int(3));
    }

    #[test]
    fn test_unknown_size_is_capped_by_max_nodes() {
        let mut host = SimHost::new();
        let root = build_tree(&mut host);
        let one_addr = {
            let accessor = RemoteAccessor::new(&host);
            let four = accessor.deref(&root).unwrap();
            let two = accessor.deref(&accessor.field(&four, "left_").unwrap()).unwrap();
            accessor.field(&two, "left_").unwrap().as_u64().unwrap()
        };
        // 1 の親を 1 自身に向けると、後続ノードが 1 のまま進まなくなる
        host.object_mut(one_addr)
            .unwrap()
            .set_field("parent_", Value::pointer(one_addr, NODE));
        let limits = WalkLimits {
            max_nodes: 50,
            ..WalkLimits::default()
        };

        let accessor = RemoteAccessor::new(&host);
        let count = TreeWalk::new(&accessor, root, None, TreeLayout::DEFAULT, &limits)
            .take(10_000)
            .count();
        assert_eq!(count, 50);
    }

    #[test]
    fn test_broken_links_after_last_element_are_not_read() {
        let mut host = SimHost::new();
        let root = build_tree(&mut host);
        let one_addr = {
            let accessor = RemoteAccessor::new(&host);
            let four = accessor.deref(&root).unwrap();
            let two = accessor.deref(&accessor.field(&four, "left_").unwrap()).unwrap();
            accessor.field(&two, "left_").unwrap().as_u64().unwrap()
        };
        // 後続ノードを探すときに最初に読む右リンクを壊す
        let node = host.object_mut(one_addr).unwrap();
        *node = node
            .clone()
            .broken_field("right_", "Cannot access memory at address 0x8");

        let accessor = RemoteAccessor::new(&host);
        let steps: Vec<_> =
            TreeWalk::new(&accessor, root, Some(1), TreeLayout::DEFAULT, &WalkLimits::default()).collect();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].as_ref().unwrap().key, Value::Int(1));
    }
}
