//! 抽题服务 - 业务能力层
//!
//! 只负责"抽一个题号"，随机源可替换（测试中使用固定序列）

use rand::Rng;

/// 题号来源
pub trait QuestionSource: Send {
    /// 从 `[1, number_of_questions]` 中抽一个题号
    ///
    /// 调用方保证 `number_of_questions >= 1`
    fn draw(&mut self, number_of_questions: u32) -> u32;
}

/// 均匀随机抽题（不可复现）
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomQuestionSource;

impl QuestionSource for RandomQuestionSource {
    fn draw(&mut self, number_of_questions: u32) -> u32 {
        rand::thread_rng().gen_range(1..=number_of_questions.max(1))
    }
}

/// 按给定顺序循环返回题号，超出范围的值会被夹到 `[1, n]`
#[derive(Debug, Clone)]
pub struct SequenceQuestionSource {
    values: Vec<u32>,
    next: usize,
}

impl SequenceQuestionSource {
    pub fn new(values: Vec<u32>) -> Self {
        Self { values, next: 0 }
    }
}

impl QuestionSource for SequenceQuestionSource {
    fn draw(&mut self, number_of_questions: u32) -> u32 {
        let upper = number_of_questions.max(1);
        if self.values.is_empty() {
            return 1;
        }
        let value = self.values[self.next % self.values.len()];
        self.next += 1;
        value.clamp(1, upper)
    }
}
