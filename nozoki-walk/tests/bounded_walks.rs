//! 壊れたリンク構造に対する走査の有限性のテスト

use nozoki_host::{ObjectHandle, RemoteAccessor, SimHost, SimObject, SimOp, Value};
use nozoki_walk::{
    ChainLayout, ChainWalk, HashLayout, HashWalk, SkipListLayout, SkipListWalk, TreeLayout,
    TreeWalk, WalkLimits,
};

const HASH_NODE: &str = "original::hashNode<char, int>";
const SKIP_NODE: &str = "original::skipListNode<int, int>";

fn couple(host: &mut SimHost, key: Value, value: Value) -> Value {
    Value::Object(host.alloc(
        SimObject::new("original::couple")
            .field("first_", key)
            .field("second_", value),
    ))
}

#[test]
fn test_hash_table_with_cyclic_chain_visits_each_node_once() {
    // バケット: [[A -> B -> null], [], [C -> C ...]]（Cの衝突チェーンが自分自身に戻る）
    let mut host = SimHost::new();
    let (a, b, c) = (host.reserve(), host.reserve(), host.reserve());
    for (addr, key, next) in [
        (a, 'A', Value::pointer(b, HASH_NODE)),
        (b, 'B', Value::null(HASH_NODE)),
        (c, 'C', Value::pointer(c, HASH_NODE)),
    ] {
        let data = couple(&mut host, Value::Char(key), Value::Int(0));
        host.insert(
            addr,
            SimObject::new(HASH_NODE).field("data_", data).field("next_", next),
        );
    }
    let heads = vec![
        Value::pointer(a, HASH_NODE),
        Value::null(HASH_NODE),
        Value::pointer(c, HASH_NODE),
    ];
    let buckets = host.alloc(
        SimObject::new("original::vector<original::hashNode<char, int>*>")
            .op("size", SimOp::Return(Value::Uint(3)))
            .op("operator[]", SimOp::Index(heads)),
    );
    let table = host.alloc(
        SimObject::new("original::hashTable<char, int>")
            .field("buckets", Value::Object(buckets)),
    );
    let accessor = RemoteAccessor::new(&host);

    let keys: Vec<_> = HashWalk::new(&accessor, &table, 3, HashLayout::DEFAULT)
        .map(|s| s.unwrap().key)
        .collect();
    assert_eq!(
        keys,
        vec![Value::Char('A'), Value::Char('B'), Value::Char('C')]
    );
}

#[test]
fn test_chain_count_matches_reported_size_under_cycle() {
    let mut host = SimHost::new();
    let node = "original::chainNode<int>";
    let (x, y) = (host.reserve(), host.reserve());
    host.insert(
        x,
        SimObject::new(node)
            .field("data_", Value::Int(1))
            .field("next", Value::pointer(y, node)),
    );
    host.insert(
        y,
        SimObject::new(node)
            .field("data_", Value::Int(2))
            .field("next", Value::pointer(x, node)),
    );
    let accessor = RemoteAccessor::new(&host);

    for size in [0usize, 1, 2, 5, 17] {
        let steps: Vec<_> =
            ChainWalk::sized(&accessor, Value::pointer(x, node), size, ChainLayout::DEFAULT)
                .collect();
        assert_eq!(steps.len(), size);
        assert!(steps.iter().all(|s| s.is_ok()));
    }
}

/// ランダムな挿入順で組んだ二分探索木（親リンク付き）
fn build_bst(host: &mut SimHost, keys: &[i64]) -> Value {
    let node = "original::RBNode<int, int>";
    let mut addrs: Vec<u64> = Vec::new();
    let mut left: Vec<Option<usize>> = Vec::new();
    let mut right: Vec<Option<usize>> = Vec::new();
    let mut parent: Vec<Option<usize>> = Vec::new();

    for (i, key) in keys.iter().enumerate() {
        addrs.push(host.reserve());
        left.push(None);
        right.push(None);
        parent.push(None);
        if i == 0 {
            continue;
        }
        let mut at = 0;
        loop {
            let slot = if *key < keys[at] { &mut left } else { &mut right };
            match slot[at] {
                Some(child) => at = child,
                None => {
                    slot[at] = Some(i);
                    parent[i] = Some(at);
                    break;
                }
            }
        }
    }

    let ptr = |i: Option<usize>| match i {
        Some(i) => Value::pointer(addrs[i], node),
        None => Value::null(node),
    };
    for (i, key) in keys.iter().enumerate() {
        let data = couple(host, Value::Int(*key), Value::Int(key * key));
        host.insert(
            addrs[i],
            SimObject::new(node)
                .field("left_", ptr(left[i]))
                .field("right_", ptr(right[i]))
                .field("parent_", ptr(parent[i]))
                .field("data_", data),
        );
    }
    ptr(if keys.is_empty() { None } else { Some(0) })
}

#[test]
fn test_tree_walk_is_non_decreasing() {
    let fixtures: [&[i64]; 4] = [
        &[50, 30, 70, 20, 40, 60, 80, 35, 45, 65],
        &[1, 2, 3, 4, 5, 6],
        &[9, 8, 7, 6, 5],
        &[5, 3, 5, 3, 8, 1],
    ];
    for keys in fixtures {
        let mut host = SimHost::new();
        let root = build_bst(&mut host, keys);
        let accessor = RemoteAccessor::new(&host);

        let walked: Vec<i64> = TreeWalk::new(
            &accessor,
            root,
            Some(keys.len()),
            TreeLayout::DEFAULT,
            &WalkLimits::default(),
        )
        .map(|s| match s.unwrap().key {
            Value::Int(k) => k,
            other => panic!("unexpected key {:?}", other),
        })
        .collect();

        let mut expected = keys.to_vec();
        expected.sort();
        assert_eq!(walked, expected);
    }
}

#[test]
fn test_skip_list_matches_manual_level0_walk() {
    let mut host = SimHost::new();
    let keys = [2i64, 4, 9, 16];
    let addrs: Vec<u64> = (0..=keys.len()).map(|_| host.reserve()).collect();
    for (i, addr) in addrs.iter().enumerate() {
        let level0 = addrs
            .get(i + 1)
            .map(|a| Value::pointer(*a, SKIP_NODE))
            .unwrap_or_else(|| Value::null(SKIP_NODE));
        // 上位レベルは1つ飛ばしでつなぐ
        let level1 = addrs
            .get(i + 2)
            .map(|a| Value::pointer(*a, SKIP_NODE))
            .unwrap_or_else(|| Value::null(SKIP_NODE));
        let links = host.alloc(
            SimObject::new("original::vector<original::skipListNode<int, int>*>")
                .op("get", SimOp::Index(vec![level0, level1])),
        );
        let key = if i == 0 { -1 } else { keys[i - 1] };
        let data = couple(&mut host, Value::Int(key), Value::Int(0));
        host.insert(
            *addr,
            SimObject::new(SKIP_NODE)
                .field("data_", data)
                .field("next_", Value::Object(links)),
        );
    }
    let list: ObjectHandle = host.alloc(
        SimObject::new("original::skipList<int, int>")
            .field("head_", Value::pointer(addrs[0], SKIP_NODE)),
    );
    let accessor = RemoteAccessor::new(&host);

    // レベル0を手で辿る
    let mut manual = Vec::new();
    let mut link = Value::pointer(addrs[0], SKIP_NODE);
    let mut first = true;
    while !link.is_null_pointer() {
        let node = accessor.deref(&link).unwrap();
        if !first {
            let data = accessor.deref(&accessor.field(&node, "data_").unwrap()).unwrap();
            manual.push(accessor.field(&data, "first_").unwrap());
        }
        first = false;
        let links = accessor.deref(&accessor.field(&node, "next_").unwrap()).unwrap();
        link = accessor.invoke(&links, "get", &["0"]).unwrap();
    }

    let walked: Vec<_> = SkipListWalk::new(&accessor, &list, keys.len(), SkipListLayout::DEFAULT)
        .map(|s| s.unwrap().key)
        .collect();
    assert_eq!(walked, manual);
    assert_eq!(walked.len(), keys.len());
}
