/// 丹麦 7 级评分制
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grade {
    /// -3
    MinusThree,
    /// 00
    DoubleZero,
    /// 02
    Two,
    /// 4
    Four,
    /// 7
    Seven,
    /// 10
    Ten,
    /// 12
    Twelve,
}

impl Grade {
    /// 界面上可选的全部成绩，从低到高
    pub const ALL: [Grade; 7] = [
        Grade::MinusThree,
        Grade::DoubleZero,
        Grade::Two,
        Grade::Four,
        Grade::Seven,
        Grade::Ten,
        Grade::Twelve,
    ];

    /// 成绩标签（与后端保存的字符串一致）
    pub fn label(self) -> &'static str {
        match self {
            Grade::MinusThree => "-3",
            Grade::DoubleZero => "00",
            Grade::Two => "02",
            Grade::Four => "4",
            Grade::Seven => "7",
            Grade::Ten => "10",
            Grade::Twelve => "12",
        }
    }

    /// 数值（用于计算平均分）
    pub fn value(self) -> i8 {
        match self {
            Grade::MinusThree => -3,
            Grade::DoubleZero => 0,
            Grade::Two => 2,
            Grade::Four => 4,
            Grade::Seven => 7,
            Grade::Ten => 10,
            Grade::Twelve => 12,
        }
    }

    /// 从标签解析成绩（精确匹配）
    pub fn from_label(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.label() == s.trim())
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
