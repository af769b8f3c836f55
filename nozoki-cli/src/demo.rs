//! デモセッション
//!
//! 模擬ホスト上に対象ライブラリの各コンテナを配置し、名前付きの変数として公開します。
//! 一部の変数は意図的に壊してあり、循環リンクや負のカウンタがどう表示されるかを確かめられます。

use anyhow::{anyhow, Result};
use nozoki_core::config::PRETTY_PARAMETER;
use nozoki_core::errors::{ERR_NO_ADAPTER, ERR_NO_SYMBOL};
use nozoki_core::{fixtures, DisplayConfig, Inspector, Registry};
use nozoki_host::{AccessorConfig, RemoteAccessor, SimHost, Value};
use tracing::debug;

/// デモセッション
pub struct Session {
    host: SimHost,
    registry: Registry,
    config: DisplayConfig,
    accessor_config: AccessorConfig,
    variables: Vec<(String, Value)>,
    history: usize,
}

impl Session {
    /// 変数を配置したセッションを作成する
    pub fn new(registry: Registry, config: DisplayConfig, accessor_config: AccessorConfig) -> Self {
        let mut host = SimHost::new();
        let variables = populate(&mut host, &config.namespace);
        Self {
            host,
            registry,
            config,
            accessor_config,
            variables,
            history: 0,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn variables(&self) -> &[(String, Value)] {
        &self.variables
    }

    pub fn lookup(&self, name: &str) -> Result<&Value> {
        self.variables
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .ok_or_else(|| anyhow!("{}: \"{}\"", ERR_NO_SYMBOL, name))
    }

    fn inspector(&self) -> Inspector<'_, '_> {
        Inspector::with_accessor(
            &self.registry,
            RemoteAccessor::with_config(&self.host, self.accessor_config.clone()),
            self.config.clone(),
        )
    }

    /// 変数を表示用に整形し、履歴番号を付ける
    pub fn print(&mut self, name: &str, raw: bool) -> Result<String> {
        let value = self.lookup(name)?;
        debug!(name, raw, "printing variable");
        let inspector = self.inspector();
        let text = if raw {
            inspector.format_raw(value)
        } else {
            inspector.format(value)
        };

        self.history += 1;
        Ok(format!("${} = {}", self.history, text))
    }

    /// 変数の型と対応するアダプタ
    pub fn whatis(&self, name: &str) -> Result<String> {
        let value = self.lookup(name)?;
        let type_name = match value {
            Value::Object(handle) => handle.type_name.as_str(),
            _ => return Ok(format!("type = {}", fixtures::type_of(value))),
        };

        Ok(match self.registry.lookup(type_name) {
            Some(spec) => format!("type = {} (adapter: {})", type_name, spec.type_name),
            None => format!("type = {} ({})", type_name, ERR_NO_ADAPTER),
        })
    }

    pub fn set_pretty(&mut self, on: bool) {
        self.host.set_parameter(PRETTY_PARAMETER, on);
    }

    pub fn is_pretty(&self) -> bool {
        self.inspector().is_pretty()
    }
}

/// デモ用の変数を配置する
fn populate(host: &mut SimHost, ns: &str) -> Vec<(String, Value)> {
    let ints = |range: std::ops::Range<i64>| range.map(Value::Int).collect::<Vec<_>>();
    let mut vars: Vec<(&str, Value)> = Vec::new();

    let numbers = fixtures::chain(host, ns, &ints(1..4));
    vars.push(("numbers", Value::Object(numbers)));

    let letters = fixtures::forward_chain(host, ns, &[Value::Char('a'), Value::Char('b')]);
    vars.push(("letters", Value::Object(letters)));

    let ages = fixtures::tree_map(
        host,
        ns,
        &[
            (Value::Str("carol".into()), Value::Int(40)),
            (Value::Str("alice".into()), Value::Int(29)),
            (Value::Str("bob".into()), Value::Int(31)),
        ],
    );
    vars.push(("ages", Value::Object(ages)));

    let primes = fixtures::tree_set(host, ns, &[7, 2, 11, 3, 5].map(Value::Int));
    vars.push(("primes", Value::Object(primes)));

    let index: Vec<_> = (1..=6)
        .map(|k| (Value::Int(k), Value::Str(format!("page{}", k))))
        .collect();
    let index = fixtures::skip_list(host, ns, "JMap", &index, 3);
    vars.push(("index", Value::Object(index)));

    let tags: Vec<_> = ['x', 'q', 'm']
        .iter()
        .map(|c| (Value::Char(*c), Value::Bool(true)))
        .collect();
    let tags = fixtures::skip_list(host, ns, "JSet", &tags, 2);
    vars.push(("tags", Value::Object(tags)));

    let grade = |c: char, score: i64| (Value::Char(c), Value::Int(score));
    let scores = fixtures::hash(
        host,
        ns,
        "hashMap",
        &[vec![grade('A', 90), grade('B', 85)], vec![], vec![grade('C', 70)]],
    );
    vars.push(("scores", Value::Object(scores)));

    let seen = fixtures::hash(
        host,
        ns,
        "hashSet",
        &[vec![(Value::Int(4), Value::Bool(true))], vec![(Value::Int(9), Value::Bool(true))]],
    );
    vars.push(("seen", Value::Object(seen)));

    let buffer = fixtures::array(host, ns, &ints(0..5));
    vars.push(("buffer", Value::Object(buffer)));

    let names = fixtures::vector(host, ns, &[Value::Str("nozoki".into()), Value::Str("gdb".into())]);
    vars.push(("names", Value::Object(names.clone())));

    let flags = fixtures::bitset(host, ns, &[true, false, true, true]);
    vars.push(("flags", Value::Object(flags)));

    let blocks = fixtures::blocks_list(host, ns, &ints(0..20));
    vars.push(("blocks", Value::Object(blocks.clone())));

    let pair = fixtures::couple(host, ns, Value::Int(1), Value::Object(names));
    vars.push(("pair", Value::Object(pair)));

    let record = fixtures::tuple(
        host,
        ns,
        &[Value::Int(7), Value::Char('z'), Value::Str("end".into())],
    );
    vars.push(("record", Value::Object(record)));

    let maybe = fixtures::alternative(host, ns, Some(Value::Int(42)));
    vars.push(("maybe", Value::Object(maybe)));
    let nothing = fixtures::alternative(host, ns, None);
    vars.push(("nothing", Value::Object(nothing)));

    let stack = fixtures::adaptor(host, ns, "stack", &blocks);
    vars.push(("stack", Value::Object(stack)));

    let shared = fixtures::smart_ptr(host, ns, "strongPtr", Some(Value::Int(7)), false, 2, 1);
    vars.push(("shared", Value::Object(shared)));
    // 弱参照カウンタが-1として読まれる（符号拡張の再解釈を見せる）
    let observer = fixtures::smart_ptr(host, ns, "weakPtr", Some(Value::Int(7)), false, 1, -1);
    vars.push(("observer", Value::Object(observer)));
    let owned = fixtures::smart_ptr(host, ns, "ownerPtr", Some(Value::Int(0)), true, 1, 0);
    vars.push(("owned", Value::Object(owned)));
    let empty = fixtures::smart_ptr(host, ns, "autoPtr", None, false, 0, 0);
    vars.push(("empty", Value::Object(empty)));

    // 末尾が先頭に戻る壊れたチェーン
    let looped = fixtures::chain(host, ns, &ints(1..3));
    let ends = {
        let accessor = RemoteAccessor::new(&*host);
        accessor
            .field(&looped, "begin_")
            .and_then(|head| accessor.field(&looped, "end_").map(|tail| (head, tail)))
    };
    if let Ok((head, tail)) = ends {
        if let Some(node) = tail.as_u64().and_then(|t| host.object_mut(t)) {
            node.set_field("next", head);
        }
    }
    vars.push(("looped", Value::Object(looped)));

    vars.into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(
            Registry::with_catalogue("original").unwrap(),
            DisplayConfig::default(),
            AccessorConfig::default(),
        )
    }

    #[test]
    fn test_every_variable_has_an_adapter() {
        let s = session();
        for (name, value) in s.variables() {
            let Value::Object(handle) = value else {
                panic!("{} is not an object", name);
            };
            assert!(
                s.registry().lookup(&handle.type_name).is_some(),
                "{} ({})",
                name,
                handle.type_name
            );
        }
    }

    #[test]
    fn test_print_numbers_history() {
        let mut s = session();
        let first = s.print("primes", false).unwrap();
        assert!(first.starts_with("$1 = original::treeSet(size=5, @0x"));
        assert!(first.ends_with("{2, 3, 5, 7, 11}"));
        let second = s.print("primes", true).unwrap();
        assert!(second.starts_with("$2 = {original::treeSet<int, bool> @0x"));
    }

    #[test]
    fn test_looped_chain_is_bounded() {
        let mut s = session();
        let text = s.print("looped", false).unwrap();
        assert!(text.ends_with("{[0] = 1, [1] = 2}"));
    }

    #[test]
    fn test_unknown_variable() {
        let mut s = session();
        let err = s.print("nope", false).unwrap_err();
        assert!(err.to_string().starts_with(ERR_NO_SYMBOL));
    }

    #[test]
    fn test_pretty_toggle() {
        let mut s = session();
        assert!(!s.is_pretty());
        s.set_pretty(true);
        assert!(s.is_pretty());
        let text = s.print("buffer", false).unwrap();
        assert!(text.contains("\n  body = @0x"));
    }

    #[test]
    fn test_whatis() {
        let s = session();
        assert_eq!(
            s.whatis("ages").unwrap(),
            "type = original::treeMap<std::string, int> (adapter: treeMap)"
        );
    }
}
