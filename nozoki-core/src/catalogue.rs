//! 表示アダプタの静的カタログ
//!
//! 対象ライブラリのコンテナごとに1つの [`AdapterSpec`] を持ちます。
//! 派生クラス（`treeMap` と `treeSet` など）は同じ走査戦略を共有し、
//! クラス名と子要素の並べ方だけが異なります。
//!
//! 基底クラス（`RBTree`、`skipList`、`hashTable`、`containerAdaptor`、`autoPtr`）も
//! 独立したアダプタとして載せ、基底クラスの型のまま見えている値を派生クラスと
//! 同じ走査で表示します。ディレクトリから読み込む場合は、
//! `<型名>_printer` ファイルがある型だけが登録されます。

use crate::adapter::{
    AdapterSpec, DisplayHint, Internal, Shape, Strategy, SummaryStyle, Visibility,
};
use nozoki_walk::{
    ChainLayout, HashLayout, SkipListLayout, SmartPtrLayout, TreeLayout, TupleLayout,
};

const CHAIN_INTERNALS: &[Internal] = &[
    Internal::Field {
        label: "begin",
        field: "begin_",
    },
    Internal::Field {
        label: "end",
        field: "end_",
    },
];

const FORWARD_CHAIN_INTERNALS: &[Internal] = &[Internal::Field {
    label: "begin",
    field: "begin_",
}];

const TREE_INTERNALS: &[Internal] = &[
    Internal::Address {
        label: "root",
        field: "root_",
    },
    Internal::Address {
        label: "compare",
        field: "compare_",
    },
];

const SKIP_LIST_INTERNALS: &[Internal] = &[
    Internal::Address {
        label: "head",
        field: "head_",
    },
    Internal::Field {
        label: "compare",
        field: "compare_",
    },
];

const HASH_INTERNALS: &[Internal] = &[Internal::Field {
    label: "buckets",
    field: "buckets",
}];

const ARRAY_INTERNALS: &[Internal] = &[Internal::Address {
    label: "body",
    field: "body",
}];

const VECTOR_INTERNALS: &[Internal] = &[
    Internal::Field {
        label: "max size",
        field: "max_size",
    },
    Internal::Field {
        label: "inner begin",
        field: "inner_begin",
    },
];

const BLOCKS_LIST_INTERNALS: &[Internal] = &[
    Internal::Field {
        label: "first",
        field: "first_",
    },
    Internal::Field {
        label: "last",
        field: "last_",
    },
    Internal::Field {
        label: "first block",
        field: "first_block",
    },
    Internal::Field {
        label: "last block",
        field: "last_block",
    },
];

/// `blocksList` の1ブロックの要素数
pub const BLOCK_SIZE: u64 = 16;

const fn plain(type_name: &'static str, strategy: Strategy) -> AdapterSpec {
    AdapterSpec {
        type_name,
        class_name: type_name,
        strategy,
        shape: Shape::Elements,
        summary: SummaryStyle::Address,
        leading_size: false,
        internals: &[],
        visibility: Visibility::Verbose,
        hint: None,
    }
}

const fn tree(type_name: &'static str, shape: Shape, hint: DisplayHint) -> AdapterSpec {
    AdapterSpec {
        shape,
        summary: SummaryStyle::Size,
        internals: TREE_INTERNALS,
        hint: Some(hint),
        ..plain(
            type_name,
            Strategy::Tree {
                root: "root_",
                layout: TreeLayout::DEFAULT,
            },
        )
    }
}

const fn skip_list(type_name: &'static str, shape: Shape, hint: DisplayHint) -> AdapterSpec {
    AdapterSpec {
        shape,
        summary: SummaryStyle::Levels {
            levels: "getCurLevels",
        },
        internals: SKIP_LIST_INTERNALS,
        hint: Some(hint),
        ..plain(type_name, Strategy::SkipList(SkipListLayout::DEFAULT))
    }
}

const fn hash(type_name: &'static str, shape: Shape, hint: DisplayHint) -> AdapterSpec {
    AdapterSpec {
        shape,
        summary: SummaryStyle::Size,
        internals: HASH_INTERNALS,
        hint: Some(hint),
        ..plain(type_name, Strategy::Hash(HashLayout::DEFAULT))
    }
}

const fn adaptor(type_name: &'static str) -> AdapterSpec {
    plain(type_name, Strategy::Adaptor { serial: "serial_" })
}

const fn smart_ptr(type_name: &'static str) -> AdapterSpec {
    AdapterSpec {
        summary: SummaryStyle::Pointee,
        ..plain(type_name, Strategy::SmartPtr(SmartPtrLayout::DEFAULT))
    }
}

const CHAIN: Strategy = Strategy::Chain {
    head: "begin_",
    layout: ChainLayout::DEFAULT,
};

const SUBSCRIPT: Strategy = Strategy::Indexed {
    element_at: "operator[]",
};

/// 既知のコンテナすべて
pub static CATALOGUE: &[AdapterSpec] = &[
    AdapterSpec {
        summary: SummaryStyle::Size,
        internals: CHAIN_INTERNALS,
        ..plain("chain", CHAIN)
    },
    AdapterSpec {
        leading_size: true,
        internals: FORWARD_CHAIN_INTERNALS,
        visibility: Visibility::Always,
        ..plain("forwardChain", CHAIN)
    },
    tree("RBTree", Shape::Entries, DisplayHint::Map),
    tree("treeMap", Shape::Entries, DisplayHint::Map),
    tree("treeSet", Shape::Elements, DisplayHint::Array),
    skip_list("skipList", Shape::Entries, DisplayHint::Map),
    skip_list("JMap", Shape::Entries, DisplayHint::Map),
    skip_list("JSet", Shape::Elements, DisplayHint::Array),
    hash("hashTable", Shape::Entries, DisplayHint::Map),
    hash("hashMap", Shape::Entries, DisplayHint::Map),
    hash("hashSet", Shape::Elements, DisplayHint::Array),
    AdapterSpec {
        summary: SummaryStyle::Capacity,
        internals: ARRAY_INTERNALS,
        hint: Some(DisplayHint::Array),
        ..plain("array", SUBSCRIPT)
    },
    AdapterSpec {
        leading_size: true,
        internals: VECTOR_INTERNALS,
        hint: Some(DisplayHint::Array),
        ..plain("vector", SUBSCRIPT)
    },
    AdapterSpec {
        class_name: "bitset",
        leading_size: true,
        hint: Some(DisplayHint::Array),
        ..plain("bitSet", Strategy::Indexed { element_at: "get" })
    },
    AdapterSpec {
        summary: SummaryStyle::Blocks {
            map: "map",
            block_size: BLOCK_SIZE,
        },
        leading_size: true,
        internals: BLOCKS_LIST_INTERNALS,
        visibility: Visibility::Always,
        hint: Some(DisplayHint::Array),
        ..plain("blocksList", SUBSCRIPT)
    },
    AdapterSpec {
        hint: Some(DisplayHint::Array),
        ..plain(
            "couple",
            Strategy::Pair {
                first: "first_",
                second: "second_",
            },
        )
    },
    AdapterSpec {
        leading_size: true,
        ..plain("tuple", Strategy::Tuple(TupleLayout::DEFAULT))
    },
    AdapterSpec {
        summary: SummaryStyle::Engaged,
        ..plain(
            "alternative",
            Strategy::Optional {
                engaged: "operator bool",
                storage: "val_",
                payload: "type_",
            },
        )
    },
    adaptor("containerAdaptor"),
    adaptor("stack"),
    adaptor("deque"),
    adaptor("prique"),
    smart_ptr("autoPtr"),
    smart_ptr("strongPtr"),
    smart_ptr("ownerPtr"),
    smart_ptr("weakPtr"),
];

/// 型名（名前空間なし）で仕様を探す
pub fn find(type_name: &str) -> Option<&'static AdapterSpec> {
    CATALOGUE.iter().find(|spec| spec.type_name == type_name)
}

/// カタログに載っている型名
pub fn type_names() -> impl Iterator<Item = &'static str> {
    CATALOGUE.iter().map(|spec| spec.type_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_type_names_are_unique() {
        let names: HashSet<_> = type_names().collect();
        assert_eq!(names.len(), CATALOGUE.len());
        assert_eq!(CATALOGUE.len(), 26);
    }

    #[test]
    fn test_find() {
        let spec = find("treeSet").unwrap();
        assert_eq!(spec.shape, Shape::Elements);
        assert_eq!(spec.hint, Some(DisplayHint::Array));
        assert!(find("treeset").is_none());
        assert!(find("unordered_map").is_none());
    }

    #[test]
    fn test_derived_families_share_strategy() {
        assert_eq!(find("treeMap").unwrap().strategy, find("RBTree").unwrap().strategy);
        assert_eq!(find("JSet").unwrap().strategy, find("skipList").unwrap().strategy);
        assert_eq!(find("weakPtr").unwrap().strategy, find("autoPtr").unwrap().strategy);
    }

    #[test]
    fn test_bitset_display_name() {
        let spec = find("bitSet").unwrap();
        assert_eq!(spec.class_name, "bitset");
        assert_eq!(spec.strategy, Strategy::Indexed { element_at: "get" });
    }
}
