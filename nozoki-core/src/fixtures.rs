//! 模擬ホスト上に対象ライブラリのオブジェクトを組み立てる
//!
//! デモセッションとテストで使います。各関数は実際のコンテナと同じフィールド名・
//! メンバー関数名でオブジェクトを配置し、ルートのハンドルを返します。

use crate::catalogue::BLOCK_SIZE;
use nozoki_host::{ObjectHandle, SimHost, SimObject, SimOp, Value};
use std::cmp::Ordering;

/// 値の型名（テンプレート引数に使う）
pub fn type_of(value: &Value) -> String {
    match value {
        Value::Int(_) => "int".to_string(),
        Value::Uint(_) => "unsigned long".to_string(),
        Value::Bool(_) => "bool".to_string(),
        Value::Char(_) => "char".to_string(),
        Value::Str(_) => "std::string".to_string(),
        Value::Pointer { pointee, .. } => format!("{}*", pointee),
        Value::Object(handle) => handle.type_name.clone(),
        Value::Unavailable => "void".to_string(),
    }
}

fn element_type<'v>(mut values: impl Iterator<Item = &'v Value>) -> String {
    values.next().map(type_of).unwrap_or_else(|| "int".to_string())
}

fn compare_keys(a: &Value, b: &Value) -> Ordering {
    match (a.as_i128(), b.as_i128()) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn sorted(entries: &[(Value, Value)]) -> Vec<(Value, Value)> {
    let mut entries = entries.to_vec();
    entries.sort_by(|a, b| compare_keys(&a.0, &b.0));
    entries
}

fn link(address: Option<u64>, node_type: &str) -> Value {
    match address {
        Some(addr) => Value::pointer(addr, node_type),
        None => Value::null(node_type),
    }
}

fn comparator(host: &mut SimHost, ns: &str, key_type: &str) -> Value {
    Value::Object(host.alloc(SimObject::new(format!(
        "{}::increaseComparator<{}>",
        ns, key_type
    ))))
}

/// `couple<F, S>`
pub fn couple(host: &mut SimHost, ns: &str, first: Value, second: Value) -> ObjectHandle {
    host.alloc(
        SimObject::new(format!(
            "{}::couple<{}, {}>",
            ns,
            type_of(&first),
            type_of(&second)
        ))
        .field("first_", first)
        .field("second_", second),
    )
}

fn linked(host: &mut SimHost, ns: &str, class: &str, values: &[Value]) -> ObjectHandle {
    let elem = element_type(values.iter());
    let node_type = format!("{}::{}Node<{}>", ns, class, elem);
    let addrs: Vec<u64> = values.iter().map(|_| host.reserve()).collect();

    for (i, value) in values.iter().enumerate() {
        host.insert(
            addrs[i],
            SimObject::new(node_type.as_str())
                .field("data_", value.clone())
                .field("next", link(addrs.get(i + 1).copied(), &node_type)),
        );
    }

    host.alloc(
        SimObject::new(format!("{}::{}<{}>", ns, class, elem))
            .field("begin_", link(addrs.first().copied(), &node_type))
            .field("end_", link(addrs.last().copied(), &node_type))
            .op("size", SimOp::Return(Value::Uint(values.len() as u64))),
    )
}

/// `chain<T>`（双方向チェーン）
pub fn chain(host: &mut SimHost, ns: &str, values: &[Value]) -> ObjectHandle {
    linked(host, ns, "chain", values)
}

/// `forwardChain<T>`
pub fn forward_chain(host: &mut SimHost, ns: &str, values: &[Value]) -> ObjectHandle {
    linked(host, ns, "forwardChain", values)
}

fn subtree(
    host: &mut SimHost,
    ns: &str,
    node_type: &str,
    entries: &[(Value, Value)],
    parent: Value,
) -> Value {
    if entries.is_empty() {
        return Value::null(node_type);
    }

    let mid = entries.len() / 2;
    let addr = host.reserve();
    let me = Value::pointer(addr, node_type);
    let left = subtree(host, ns, node_type, &entries[..mid], me.clone());
    let right = subtree(host, ns, node_type, &entries[mid + 1..], me.clone());
    let (key, value) = &entries[mid];
    let data = couple(host, ns, key.clone(), value.clone());

    host.insert(
        addr,
        SimObject::new(node_type)
            .field("left_", left)
            .field("right_", right)
            .field("parent_", parent)
            .field("data_", Value::Object(data)),
    );
    me
}

/// 赤黒木の派生クラス（`RBTree`、`treeMap`、`treeSet`）
///
/// キー順に並べ直してから、親リンク付きの平衡二分探索木を組みます。
pub fn tree(host: &mut SimHost, ns: &str, class: &str, entries: &[(Value, Value)]) -> ObjectHandle {
    let entries = sorted(entries);
    let key_type = element_type(entries.iter().map(|e| &e.0));
    let value_type = element_type(entries.iter().map(|e| &e.1));
    let node_type = format!("{}::RBNode<{}, {}>", ns, key_type, value_type);

    let root = subtree(host, ns, &node_type, &entries, Value::null(node_type.as_str()));
    let compare = comparator(host, ns, &key_type);
    host.alloc(
        SimObject::new(format!("{}::{}<{}, {}>", ns, class, key_type, value_type))
            .field("root_", root)
            .field("compare_", compare)
            .op("size", SimOp::Return(Value::Uint(entries.len() as u64))),
    )
}

pub fn tree_map(host: &mut SimHost, ns: &str, entries: &[(Value, Value)]) -> ObjectHandle {
    tree(host, ns, "treeMap", entries)
}

pub fn tree_set(host: &mut SimHost, ns: &str, keys: &[Value]) -> ObjectHandle {
    let entries: Vec<_> = keys.iter().map(|k| (k.clone(), Value::Bool(false))).collect();
    tree(host, ns, "treeSet", &entries)
}

/// ノードの高さ（番兵を除き1始まりの位置 `i` の末尾の0ビット数で決める）
fn skip_height(position: usize, levels: usize) -> usize {
    (1 + position.trailing_zeros() as usize).min(levels)
}

/// スキップリストの派生クラス（`skipList`、`JMap`、`JSet`）
pub fn skip_list(
    host: &mut SimHost,
    ns: &str,
    class: &str,
    entries: &[(Value, Value)],
    levels: usize,
) -> ObjectHandle {
    let levels = levels.max(1);
    let entries = sorted(entries);
    let key_type = element_type(entries.iter().map(|e| &e.0));
    let value_type = element_type(entries.iter().map(|e| &e.1));
    let node_type = format!("{}::skipListNode<{}, {}>", ns, key_type, value_type);

    // 0番目は番兵
    let addrs: Vec<u64> = (0..=entries.len()).map(|_| host.reserve()).collect();
    let heights: Vec<usize> = (0..addrs.len())
        .map(|i| if i == 0 { levels } else { skip_height(i, levels) })
        .collect();

    for (i, addr) in addrs.iter().enumerate() {
        let next: Vec<Value> = (0..heights[i])
            .map(|level| {
                let target = (i + 1..addrs.len()).find(|&j| heights[j] > level);
                link(target.map(|j| addrs[j]), &node_type)
            })
            .collect();
        let next = host.alloc(
            SimObject::new(format!("{}::vector<{}*>", ns, node_type))
                .op("get", SimOp::Index(next))
                .op("size", SimOp::Return(Value::Uint(heights[i] as u64))),
        );

        let mut node = SimObject::new(node_type.as_str()).field("next_", Value::Object(next));
        if i > 0 {
            let (key, value) = &entries[i - 1];
            let data = couple(host, ns, key.clone(), value.clone());
            node = node.field("data_", Value::Object(data));
        }
        host.insert(*addr, node);
    }

    let compare = comparator(host, ns, &key_type);
    host.alloc(
        SimObject::new(format!("{}::{}<{}, {}>", ns, class, key_type, value_type))
            .field("head_", link(addrs.first().copied(), &node_type))
            .field("compare_", compare)
            .op("size", SimOp::Return(Value::Uint(entries.len() as u64)))
            .op("getCurLevels", SimOp::Return(Value::Uint(levels as u64))),
    )
}

/// ハッシュ表の派生クラス（`hashTable`、`hashMap`、`hashSet`）
///
/// `buckets` の各要素がそのバケットの衝突チェーンになります。
pub fn hash(
    host: &mut SimHost,
    ns: &str,
    class: &str,
    buckets: &[Vec<(Value, Value)>],
) -> ObjectHandle {
    let all = buckets.iter().flatten();
    let key_type = element_type(all.clone().map(|e| &e.0));
    let value_type = element_type(all.map(|e| &e.1));
    let node_type = format!("{}::hashNode<{}, {}>", ns, key_type, value_type);

    let mut heads = Vec::with_capacity(buckets.len());
    let mut size = 0u64;
    for bucket in buckets {
        let addrs: Vec<u64> = bucket.iter().map(|_| host.reserve()).collect();
        for (i, (key, value)) in bucket.iter().enumerate() {
            let data = couple(host, ns, key.clone(), value.clone());
            host.insert(
                addrs[i],
                SimObject::new(node_type.as_str())
                    .field("data_", Value::Object(data))
                    .field("next_", link(addrs.get(i + 1).copied(), &node_type)),
            );
        }
        heads.push(link(addrs.first().copied(), &node_type));
        size += bucket.len() as u64;
    }

    let bucket_vector = host.alloc(
        SimObject::new(format!("{}::vector<{}*>", ns, node_type))
            .op("size", SimOp::Return(Value::Uint(heads.len() as u64)))
            .op("operator[]", SimOp::Index(heads)),
    );
    host.alloc(
        SimObject::new(format!("{}::{}<{}, {}>", ns, class, key_type, value_type))
            .field("buckets", Value::Object(bucket_vector))
            .op("size", SimOp::Return(Value::Uint(size))),
    )
}

fn subscripted(ns: &str, class: &str, values: &[Value]) -> SimObject {
    SimObject::new(format!("{}::{}<{}>", ns, class, element_type(values.iter())))
        .op("size", SimOp::Return(Value::Uint(values.len() as u64)))
        .op("operator[]", SimOp::Index(values.to_vec()))
}

/// `array<T>`
pub fn array(host: &mut SimHost, ns: &str, values: &[Value]) -> ObjectHandle {
    let body = host.reserve();
    let elem = element_type(values.iter());
    host.alloc(subscripted(ns, "array", values).field("body", Value::pointer(body, elem)))
}

/// `vector<T>`
pub fn vector(host: &mut SimHost, ns: &str, values: &[Value]) -> ObjectHandle {
    let capacity = values.len().next_power_of_two() as u64;
    host.alloc(
        subscripted(ns, "vector", values)
            .field("max_size", Value::Uint(capacity))
            .field("inner_begin", Value::Uint(0)),
    )
}

/// `bitSet<>`
pub fn bitset(host: &mut SimHost, ns: &str, bits: &[bool]) -> ObjectHandle {
    let bits: Vec<Value> = bits.iter().map(|b| Value::Bool(*b)).collect();
    host.alloc(
        SimObject::new(format!("{}::bitSet<unsigned long>", ns))
            .op("size", SimOp::Return(Value::Uint(bits.len() as u64)))
            .op("get", SimOp::Index(bits)),
    )
}

/// `blocksList<T>`
pub fn blocks_list(host: &mut SimHost, ns: &str, values: &[Value]) -> ObjectHandle {
    let blocks = (values.len() as u64).div_ceil(BLOCK_SIZE).max(1);
    let elem = element_type(values.iter());
    let map = host.alloc(
        SimObject::new(format!("{}::vector<{}*>", ns, elem))
            .op("size", SimOp::Return(Value::Uint(blocks))),
    );
    host.alloc(
        subscripted(ns, "blocksList", values)
            .field("map", Value::Object(map))
            .field("first_", Value::Uint(0))
            .field("last_", Value::Uint(values.len() as u64))
            .field("first_block", Value::Uint(0))
            .field("last_block", Value::Uint(blocks - 1)),
    )
}

/// `tuple<T...>`（`elems.cur_elem` / `elems.next` の入れ子）
pub fn tuple(host: &mut SimHost, ns: &str, values: &[Value]) -> ObjectHandle {
    let types: Vec<String> = values.iter().map(type_of).collect();
    let mut rest: Option<ObjectHandle> = None;

    for (i, value) in values.iter().enumerate().rev() {
        let mut level = SimObject::new(format!("{}::tupleImpl<{}, {}>", ns, i, types[i..].join(", ")))
            .field("cur_elem", value.clone());
        if let Some(next) = rest.take() {
            level = level.field("next", Value::Object(next));
        }
        rest = Some(host.alloc(level));
    }

    let mut tuple = SimObject::new(format!("{}::tuple<{}>", ns, types.join(", ")));
    if let Some(elems) = rest {
        tuple = tuple.field("elems", Value::Object(elems));
    }
    host.alloc(tuple)
}

/// `alternative<T>`
pub fn alternative(host: &mut SimHost, ns: &str, value: Option<Value>) -> ObjectHandle {
    let elem = value.as_ref().map(type_of).unwrap_or_else(|| "int".to_string());
    let mut storage = SimObject::new(format!("{}::alternative<{}>::storage", ns, elem));
    if let Some(v) = &value {
        storage = storage.field("type_", v.clone());
    }
    let storage = host.alloc(storage);

    host.alloc(
        SimObject::new(format!("{}::alternative<{}>", ns, elem))
            .field("val_", Value::Object(storage))
            .op("operator bool", SimOp::Return(Value::Bool(value.is_some()))),
    )
}

/// コンテナアダプタ（`stack`、`deque`、`prique`、`containerAdaptor`）
pub fn adaptor(host: &mut SimHost, ns: &str, class: &str, serial: &ObjectHandle) -> ObjectHandle {
    host.alloc(
        SimObject::new(format!("{}::{}<int, {}>", ns, class, serial.type_name))
            .field("serial_", Value::Object(serial.clone())),
    )
}

/// スマートポインタ（`autoPtr`、`strongPtr`、`ownerPtr`、`weakPtr`）
///
/// `pointee` がNoneならnullを保持します。`array` なら削除子を配列版にします。
/// カウンタは符号付きのまま置くので、負の値で符号拡張の再解釈を確かめられます。
pub fn smart_ptr(
    host: &mut SimHost,
    ns: &str,
    class: &str,
    pointee: Option<Value>,
    array: bool,
    strong: i64,
    weak: i64,
) -> ObjectHandle {
    let elem = pointee.as_ref().map(type_of).unwrap_or_else(|| "int".to_string());
    let deleter = if array {
        format!("{}::deleter<{} []>", ns, elem)
    } else {
        format!("{}::deleter<{}>", ns, elem)
    };

    let pointer = match pointee {
        Some(value) => {
            let target = host.alloc(SimObject::new(elem.as_str()).field("value", value));
            link(target.address, &elem)
        }
        None => Value::null(elem.as_str()),
    };

    let mut counter = |raw: i64| {
        Value::Object(host.alloc(
            SimObject::new("std::atomic<unsigned int>")
                .op("operator*", SimOp::Return(Value::Int(raw))),
        ))
    };
    let strong = counter(strong);
    let weak = counter(weak);

    let block_type = format!("{}::refCountBase<{}, {}>", ns, elem, deleter);
    let block = host.alloc(
        SimObject::new(block_type.as_str())
            .field("strong_refs", strong)
            .field("weak_refs", weak),
    );
    let holder = host.alloc(
        SimObject::new(format!("std::atomic<{}*>", block_type))
            .op("operator*", SimOp::Return(link(block.address, &block_type))),
    );

    host.alloc(
        SimObject::new(format!("{}::{}<{}, {}>", ns, class, elem, deleter))
            .field("ref_count", Value::Object(holder))
            .op("get", SimOp::Return(pointer)),
    )
}
