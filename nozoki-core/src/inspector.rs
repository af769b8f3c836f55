//! 値の表示
//!
//! レジストリでアダプタを探し、見つかれば要約と子要素を、見つからなければホストの
//! 生の値をそのまま表示します。子要素が登録済みのコンテナなら、設定された深さまで
//! 入れ子に展開します。

use crate::adapter::{ChildValue, DisplayAdapter, Rendered};
use crate::config::{DisplayConfig, PRETTY_PARAMETER};
use crate::registry::Registry;
use nozoki_host::{Host, ObjectHandle, RemoteAccessor, RemoteEvalError, Value};

/// 値の表示器
pub struct Inspector<'r, 'h> {
    registry: &'r Registry,
    accessor: RemoteAccessor<'h>,
    config: DisplayConfig,
}

impl<'r, 'h> Inspector<'r, 'h> {
    /// 既定のアクセサ設定で表示器を作成する
    pub fn new(registry: &'r Registry, host: &'h dyn Host, config: DisplayConfig) -> Self {
        Self::with_accessor(registry, RemoteAccessor::new(host), config)
    }

    pub fn with_accessor(
        registry: &'r Registry,
        accessor: RemoteAccessor<'h>,
        config: DisplayConfig,
    ) -> Self {
        Self {
            registry,
            accessor,
            config,
        }
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    pub fn accessor(&self) -> &RemoteAccessor<'h> {
        &self.accessor
    }

    /// 1行に1要素ずつ整形するか
    pub fn is_pretty(&self) -> bool {
        self.config
            .verbose
            .or_else(|| self.accessor.parameter(PRETTY_PARAMETER))
            .unwrap_or(false)
    }

    /// ハンドルの型に登録されたアダプタを作成する
    ///
    /// 登録がなければNone。
    pub fn adapter(
        &self,
        handle: &ObjectHandle,
    ) -> Option<Result<DisplayAdapter<'_, 'h>, RemoteEvalError>> {
        let spec = self.registry.lookup(&handle.type_name)?;
        Some(DisplayAdapter::new(spec, &self.accessor, handle, &self.config))
    }

    /// ハンドルを表示用に展開する
    pub fn render(&self, handle: &ObjectHandle) -> Option<Result<Rendered, RemoteEvalError>> {
        self.adapter(handle)
            .map(|adapter| adapter.map(|adapter| adapter.render()))
    }

    /// 値を整形する
    pub fn format(&self, value: &Value) -> String {
        self.format_at(value, 0)
    }

    /// アダプタを通さずに整形する（`print/r` 相当）
    pub fn format_raw(&self, value: &Value) -> String {
        value.to_string()
    }

    fn format_at(&self, value: &Value, depth: usize) -> String {
        let handle = match value {
            Value::Object(handle) if depth <= self.config.max_depth => handle,
            other => return other.to_string(),
        };

        match self.render(handle) {
            None => value.to_string(),
            Some(Ok(rendered)) => {
                rendered.format_with(self.is_pretty(), depth, &|child| match child {
                    ChildValue::Value(v) => self.format_at(v, depth + 1),
                    other => other.to_string(),
                })
            }
            Some(Err(e)) => e.placeholder(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use nozoki_host::SimHost;

    fn registry() -> Registry {
        Registry::with_catalogue("original").unwrap()
    }

    #[test]
    fn test_unregistered_value_is_raw() {
        let mut host = SimHost::new();
        let registry = registry();
        let c = fixtures::chain(&mut host, "other", &[Value::Int(1)]);
        let inspector = Inspector::new(&registry, &host, DisplayConfig::default());

        assert_eq!(inspector.format(&Value::Int(5)), "5");
        assert_eq!(
            inspector.format(&Value::Object(c.clone())),
            format!("{{other::chain<int> @0x{:x}}}", c.address.unwrap())
        );
        assert!(inspector.render(&c).is_none());
    }

    #[test]
    fn test_nested_containers_are_expanded() {
        let mut host = SimHost::new();
        let registry = registry();
        let inner = fixtures::couple(&mut host, "original", Value::Int(1), Value::Char('a'));
        let outer = fixtures::vector(&mut host, "original", &[Value::Object(inner.clone())]);
        let inspector = Inspector::new(&registry, &host, DisplayConfig::default());

        assert_eq!(
            inspector.format(&Value::Object(outer.clone())),
            format!(
                "original::vector(@0x{:x}) = {{size = 1, original::couple(@0x{:x}) = {{1, 'a'}}}}",
                outer.address.unwrap(),
                inner.address.unwrap()
            )
        );
    }

    #[test]
    fn test_depth_limit_stops_expansion() {
        let mut host = SimHost::new();
        let registry = registry();
        let inner = fixtures::couple(&mut host, "original", Value::Int(1), Value::Int(2));
        let outer = fixtures::couple(&mut host, "original", Value::Object(inner.clone()), Value::Int(3));
        let config = DisplayConfig {
            max_depth: 0,
            ..DisplayConfig::default()
        };
        let inspector = Inspector::new(&registry, &host, config);

        let text = inspector.format(&Value::Object(outer));
        assert!(text.contains(&inner.to_string()));
    }

    #[test]
    fn test_pretty_follows_host_parameter() {
        let mut host = SimHost::new();
        let registry = registry();
        let set = fixtures::tree_set(&mut host, "original", &[Value::Int(1), Value::Int(2)]);
        host.set_parameter(PRETTY_PARAMETER, true);
        let inspector = Inspector::new(&registry, &host, DisplayConfig::default());

        assert!(inspector.is_pretty());
        let text = inspector.format(&Value::Object(set));
        assert!(text.contains("\n  1,\n  2,\n  root = @0x"));
    }

    #[test]
    fn test_unaddressable_handle() {
        let host = SimHost::new();
        let registry = registry();
        let inspector = Inspector::new(&registry, &host, DisplayConfig::default());
        let handle = ObjectHandle::unaddressable("original::vector<int>");

        assert_eq!(
            inspector.render(&handle).map(|r| r.err()),
            Some(Some(RemoteEvalError::NullHandle))
        );
        assert_eq!(inspector.format(&Value::Object(handle)), "nullptr");
    }
}
