use std::collections::HashMap;
use std::collections::hash_map::Entry;

use serde::Deserialize;

use super::Value;

/// Header 名称的大小写策略，在 [`Headers`] 构造时确定且不可更改。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderCase {
    /// 查找时忽略 ASCII 大小写，保留首次写入时的原始拼写。
    #[default]
    Insensitive,
    /// 名称按字节精确匹配。
    Sensitive,
}

impl HeaderCase {
    fn normalize(self, name: &str) -> String {
        match self {
            HeaderCase::Insensitive => name.to_ascii_lowercase(),
            HeaderCase::Sensitive => name.to_owned(),
        }
    }
}

#[derive(Clone, Debug)]
struct HeaderEntry {
    name: String,
    value: Value,
}

/// 扁平的 Header 映射：名称唯一，顺序无关，不支持嵌套键语义。
///
/// # 契约说明（What）
/// - 大小写策略由构造时的 [`HeaderCase`] 决定；
/// - `clone` 为浅拷贝：映射结构复制，值共享底层分配（参见 [`Value`]）；
/// - [`Headers::same_entries`] 以“键集合 + 值同一性”比较两份映射，用于验证浅拷贝语义。
#[derive(Clone, Debug, Default)]
pub struct Headers {
    case: HeaderCase,
    entries: HashMap<String, HeaderEntry>,
}

impl Headers {
    /// 按指定大小写策略创建空映射。
    pub fn new(case: HeaderCase) -> Self {
        Self {
            case,
            entries: HashMap::new(),
        }
    }

    /// 当前映射使用的大小写策略。
    pub fn case(&self) -> HeaderCase {
        self.case
    }

    /// 读取 Header。
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .get(&self.case.normalize(name))
            .map(|entry| &entry.value)
    }

    /// 是否存在指定 Header。
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&self.case.normalize(name))
    }

    /// 写入 Header，返回被替换的旧值。
    ///
    /// 大小写不敏感模式下，覆盖写入沿用首次写入的名称拼写。
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        match self.entries.entry(self.case.normalize(&name)) {
            Entry::Occupied(mut occupied) => {
                Some(std::mem::replace(&mut occupied.get_mut().value, value))
            }
            Entry::Vacant(vacant) => {
                vacant.insert(HeaderEntry { name, value });
                None
            }
        }
    }

    /// 移除 Header。
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.entries
            .remove(&self.case.normalize(name))
            .map(|entry| entry.value)
    }

    /// 清空全部 Header，保留大小写策略。
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 遍历 `(原始名称, 值)`，顺序不做保证。
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .values()
            .map(|entry| (entry.name.as_str(), &entry.value))
    }

    /// 判断两份映射是否持有相同的键与同一批值分配。
    pub fn same_entries(&self, other: &Headers) -> bool {
        self.case == other.case
            && self.entries.len() == other.entries.len()
            && self.entries.iter().all(|(key, entry)| {
                other
                    .entries
                    .get(key)
                    .is_some_and(|theirs| theirs.value.ptr_eq(&entry.value))
            })
    }
}
