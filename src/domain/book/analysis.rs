//! Book Context - Analysis Entities

use serde::{Deserialize, Serialize};

use crate::domain::text::normalize_entity_name;

/// 角色缺省标签
pub const DEFAULT_ENTITY_ROLE: &str = "Character";

/// 书中检测到的角色
///
/// 不变量:
/// - name 在同一 Analysis 内按规范化名称唯一
/// - role 永不为空（缺省为 Character）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// 角色名（保留原文大小写）
    pub name: String,
    /// 角色定位（protagonist / villain / ...）
    pub role: String,
    /// 外观描述，供图像生成提示词使用
    #[serde(default)]
    pub appearance: String,
}

impl Entity {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        let role = role.into();
        Self {
            name: name.into(),
            role: if role.trim().is_empty() {
                DEFAULT_ENTITY_ROLE.to_string()
            } else {
                role
            },
            appearance: String::new(),
        }
    }

    pub fn with_appearance(mut self, appearance: impl Into<String>) -> Self {
        self.appearance = appearance.into();
        self
    }

    /// 规范化名称，用于去重与缓存 key
    pub fn normalized_name(&self) -> String {
        normalize_entity_name(&self.name)
    }
}

/// 章节边界（可选信息）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// 章节标题
    pub title: String,
    /// 在全文中的字符偏移
    pub offset: usize,
}

/// 语义分析结果 - 与 Book 一对一
///
/// 不变量:
/// - entities 中规范化名称唯一
/// - 创建后不可变；重新分析生成新的 Analysis 替换旧值
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Analysis {
    /// 简短剧情摘要
    pub summary: String,
    /// 主要角色（有序，规范化名称唯一）
    pub entities: Vec<Entity>,
    /// 适合可视化的关键场景描述
    #[serde(default)]
    pub scenes: Vec<String>,
    /// 主题关键词
    #[serde(default)]
    pub keywords: Vec<String>,
    /// 章节边界（可为空）
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

impl Analysis {
    /// 构建 Analysis，按规范化名称去重并限制数量
    ///
    /// 重复名称保留首次出现的条目；空名称被丢弃。
    /// 零个角色是合法结果，不视为错误。
    pub fn new(
        summary: String,
        entities: Vec<Entity>,
        scenes: Vec<String>,
        keywords: Vec<String>,
        chapters: Vec<Chapter>,
        max_entities: usize,
    ) -> Self {
        let mut seen = std::collections::HashSet::new();
        let mut deduped = Vec::new();

        for entity in entities {
            let key = entity.normalized_name();
            if key.is_empty() {
                continue;
            }
            if seen.insert(key) {
                deduped.push(entity);
            }
            if deduped.len() >= max_entities {
                break;
            }
        }

        Self {
            summary,
            entities: deduped,
            scenes,
            keywords,
            chapters,
        }
    }

    /// 排名前 n 的角色（分析结果顺序即重要度顺序）
    pub fn top_entities(&self, n: usize) -> &[Entity] {
        &self.entities[..self.entities.len().min(n)]
    }

    /// 角色上下文串，供场景图提示词引用
    ///
    /// 形如 "Ahab (one-legged captain), Ishmael"
    pub fn character_context(&self) -> String {
        self.entities
            .iter()
            .map(|e| {
                if e.appearance.is_empty() {
                    e.name.clone()
                } else {
                    format!("{} ({})", e.name, e.appearance)
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}
