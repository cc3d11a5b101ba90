//! # World 模块
//!
//! 解码后的世界：屏幕集合、边界与元数据。

use std::collections::HashMap;

use serde::Serialize;

use super::screen::{Screen, ScreenKey};
use crate::ini::WorldMetadata;

/// 世界边界（以屏幕坐标计）
///
/// `right`/`bottom` 为包含端点，空世界时宽高为 0。
/// 坐标取遍整个 i32 范围时跨度超出 i32，宽高与端点按 i64 计算。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorldBounds {
    pub left: i32,
    pub top: i32,
    pub width: i64,
    pub height: i64,
}

impl WorldBounds {
    /// 由坐标集合计算边界
    pub fn from_keys(keys: impl IntoIterator<Item = ScreenKey>) -> Self {
        keys.into_iter().fold(Self::default(), |bounds, key| bounds.including(key))
    }

    /// 扩展到包含 `key`
    pub fn including(self, key: ScreenKey) -> Self {
        if self.is_empty() {
            return Self {
                left: key.x,
                top: key.y,
                width: 1,
                height: 1,
            };
        }
        let left = self.left.min(key.x);
        let top = self.top.min(key.y);
        let right = self.right().max(i64::from(key.x));
        let bottom = self.bottom().max(i64::from(key.y));
        Self {
            left,
            top,
            width: right - i64::from(left) + 1,
            height: bottom - i64::from(top) + 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// 最右列（包含）
    pub fn right(&self) -> i64 {
        i64::from(self.left) + self.width - 1
    }

    /// 最下行（包含）
    pub fn bottom(&self) -> i64 {
        i64::from(self.top) + self.height - 1
    }
}

/// 解码后的世界
///
/// 屏幕按首次插入顺序保存，迭代顺序稳定；同坐标再次插入时覆盖内容但保留位置。
#[derive(Debug, Clone, Default)]
pub struct World {
    screens: Vec<Screen>,
    index: HashMap<ScreenKey, usize>,
    bounds: WorldBounds,
    metadata: WorldMetadata,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_screens(screens: impl IntoIterator<Item = Screen>) -> Self {
        let mut world = Self::new();
        for screen in screens {
            world.insert(screen);
        }
        world
    }

    /// 插入或覆盖屏幕
    ///
    /// 返回被覆盖的旧屏幕。
    pub fn insert(&mut self, screen: Screen) -> Option<Screen> {
        let key = screen.key();
        match self.index.get(&key) {
            Some(&slot) => Some(std::mem::replace(&mut self.screens[slot], screen)),
            None => {
                self.index.insert(key, self.screens.len());
                self.screens.push(screen);
                // 坐标集合只增不减，增量扩展即等价于重新计算
                self.bounds = self.bounds.including(key);
                None
            }
        }
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&Screen> {
        self.index
            .get(&ScreenKey::new(x, y))
            .map(|&slot| &self.screens[slot])
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.index.contains_key(&ScreenKey::new(x, y))
    }

    /// 按插入顺序迭代
    pub fn iter(&self) -> std::slice::Iter<'_, Screen> {
        self.screens.iter()
    }

    pub fn screens(&self) -> &[Screen] {
        &self.screens
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    pub fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    pub fn metadata(&self) -> &WorldMetadata {
        &self.metadata
    }

    pub fn set_metadata(&mut self, metadata: WorldMetadata) {
        self.metadata = metadata;
    }
}

impl<'a> IntoIterator for &'a World {
    type Item = &'a Screen;
    type IntoIter = std::slice::Iter<'a, Screen>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
