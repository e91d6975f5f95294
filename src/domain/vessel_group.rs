// ==========================================
// 船员轮换系统 - 船组领域模型
// ==========================================
// 说明: 船组由外部配置提供，会话内不可变
// ==========================================

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VesselGroup {
    pub group_key: String,        // 船组标识
    pub ship_names: Vec<String>,  // 船名（有序、去重）
}

impl VesselGroup {
    /// 创建船组，船名裁剪空白后去重并保持原有顺序
    pub fn new<I, S>(group_key: impl Into<String>, ship_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ships: Vec<String> = Vec::new();
        for name in ship_names {
            let trimmed = name.as_ref().trim();
            if trimmed.is_empty() || ships.iter().any(|s| s == trimmed) {
                continue;
            }
            ships.push(trimmed.to_string());
        }

        Self {
            group_key: group_key.into().trim().to_string(),
            ship_names: ships,
        }
    }

    pub fn has_ships(&self) -> bool {
        !self.ship_names.is_empty()
    }

    /// 船名比较不区分大小写
    pub fn contains_ship(&self, ship: &str) -> bool {
        let needle = ship.trim();
        self.ship_names
            .iter()
            .any(|s| s.eq_ignore_ascii_case(needle))
    }
}
