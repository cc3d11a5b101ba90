//! # Rules 模块
//!
//! 物件可见性与重定向规则。
//!
//! 渲染时每个物件格子在绘制前都查一次 [`can_draw`]。规则表按顺序匹配，
//! 第一条命中的规则决定结果；没有命中则原样绘制。
//!
//! 规则是纯函数：不读取也不保留任何状态。

/// 自定义物件 bank，不经过规则表
pub const CUSTOM_OBJECT_BANK: u8 = 255;

/// 规则判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleOutcome {
    /// 是否绘制
    pub draw: bool,
    /// 重定向后的 bank
    pub bank: u8,
    /// 重定向后的 id
    pub id: u8,
}

impl RuleOutcome {
    fn unchanged(bank: u8, id: u8) -> Self {
        Self { draw: true, bank, id }
    }
}

/// 规则条件（作用于 id）
#[derive(Debug, Clone, Copy)]
enum When {
    Any,
    Is(u8),
    /// 闭区间
    Between(u8, u8),
    AtLeast(u8),
    OneOf(&'static [u8]),
    /// 开启“移除幽灵物件”时命中
    GhostRemoval,
}

impl When {
    fn matches(self, id: u8, remove_ghost: bool) -> bool {
        match self {
            When::Any => true,
            When::Is(v) => id == v,
            When::Between(lo, hi) => (lo..=hi).contains(&id),
            When::AtLeast(v) => id >= v,
            When::OneOf(ids) => ids.contains(&id),
            When::GhostRemoval => remove_ghost,
        }
    }
}

/// 命中后的动作
#[derive(Debug, Clone, Copy)]
enum Then {
    Hide,
    /// id 加上偏移
    ShiftId(i16),
    /// id 替换为固定值
    SetId(u8),
    /// bank 替换为固定值
    SetBank(u8),
}

impl Then {
    fn apply(self, bank: u8, id: u8) -> RuleOutcome {
        match self {
            Then::Hide => RuleOutcome { draw: false, bank, id },
            Then::ShiftId(delta) => RuleOutcome::unchanged(bank, (id as i16 + delta) as u8),
            Then::SetId(new_id) => RuleOutcome::unchanged(bank, new_id),
            Then::SetBank(new_bank) => RuleOutcome::unchanged(new_bank, id),
        }
    }
}

struct Rule {
    bank: u8,
    when: When,
    then: Then,
}

const fn rule(bank: u8, when: When, then: Then) -> Rule {
    Rule { bank, when, then }
}

/// 规则表（顺序即优先级）
const RULES: &[Rule] = &[
    // bank 0：系统物件（存档点触发器、镜头切换等）
    rule(0, When::Is(2), Then::Hide),
    rule(0, When::Between(11, 20), Then::Hide),
    rule(0, When::AtLeast(25), Then::Hide),
    rule(12, When::Is(17), Then::Hide),
    rule(12, When::GhostRemoval, Then::Hide),
    rule(16, When::Any, Then::Hide),
    rule(2, When::OneOf(&[3, 4]), Then::Hide),
    rule(8, When::Between(15, 17), Then::Hide),
    rule(7, When::OneOf(&[1, 3, 6, 8, 10, 12, 14, 16]), Then::Hide),
    rule(13, When::OneOf(&[7, 10]), Then::Hide),
    rule(13, When::OneOf(&[8, 11]), Then::ShiftId(1)),
    rule(15, When::Between(14, 21), Then::SetId(13)),
    rule(15, When::Between(8, 11), Then::ShiftId(-7)),
    rule(15, When::Is(6), Then::Hide),
    rule(15, When::Is(7), Then::SetId(6)),
    rule(6, When::Is(6), Then::SetBank(8)),
];

/// 判定物件是否绘制以及绘制哪张图
pub fn can_draw(bank: u8, id: u8, remove_ghost: bool) -> RuleOutcome {
    RULES
        .iter()
        .find(|r| r.bank == bank && r.when.matches(id, remove_ghost))
        .map(|r| r.then.apply(bank, id))
        .unwrap_or_else(|| RuleOutcome::unchanged(bank, id))
}
