use std::fmt;

use crate::workflow::exam_phase::TransitionError;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// API 调用错误
    Api(ApiError),
    /// 业务逻辑错误
    Business(BusinessError),
    /// 考试流程状态错误
    Session(TransitionError),
    /// 配置错误
    Config(ConfigError),
    /// 文件操作错误
    File(FileError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Api(e) => write!(f, "API错误: {}", e),
            AppError::Business(e) => write!(f, "业务错误: {}", e),
            AppError::Session(e) => write!(f, "流程错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::File(e) => write!(f, "文件错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Api(e) => Some(e),
            AppError::Business(e) => Some(e),
            AppError::Session(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::File(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// API 调用错误
///
/// 每个变体都带有一条面向用户的提示信息，页面直接展示它。
#[derive(Debug)]
pub enum ApiError {
    /// 网络请求失败（连接、超时等）
    RequestFailed {
        endpoint: String,
        message: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 服务端返回非成功状态码
    BadResponse {
        endpoint: String,
        status: u16,
        message: String,
    },
    /// 资源不存在 (404)
    NotFound { endpoint: String, message: String },
    /// JSON 解析失败
    JsonParseFailed {
        endpoint: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApiError {
    /// 面向用户的提示信息
    pub fn user_message(&self) -> &str {
        match self {
            ApiError::RequestFailed { message, .. }
            | ApiError::BadResponse { message, .. }
            | ApiError::NotFound { message, .. } => message,
            ApiError::JsonParseFailed { .. } => "服务器返回了无法识别的数据",
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::RequestFailed {
                endpoint,
                message,
                source,
            } => {
                write!(f, "{} ({}): {}", message, endpoint, source)
            }
            ApiError::BadResponse {
                endpoint,
                status,
                message,
            } => {
                write!(f, "{} ({}): status={}", message, endpoint, status)
            }
            ApiError::NotFound { endpoint, message } => {
                write!(f, "{} ({}): 资源不存在", message, endpoint)
            }
            ApiError::JsonParseFailed { endpoint, source } => {
                write!(f, "JSON解析失败 ({}): {}", endpoint, source)
            }
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::RequestFailed { source, .. } | ApiError::JsonParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 业务逻辑错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusinessError {
    /// 必填字段为空
    MissingField { field: &'static str },
    /// 字段格式不正确
    InvalidField { field: &'static str, value: String },
    /// 考试不在当前列表中
    ExamNotLoaded { exam_id: String },
    /// 学生不属于该考试
    StudentNotFound { student_id: String },
    /// 当前位置无法移动
    MoveOutOfRange { index: usize, len: usize },
    /// 考试题目数量无效
    NoQuestions { exam_id: String },
    /// 批量请求中有部分失败
    PartialFailure { failed: usize, total: usize },
}

impl fmt::Display for BusinessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusinessError::MissingField { field } => write!(f, "所有字段都必须填写: {}", field),
            BusinessError::InvalidField { field, value } => {
                write!(f, "字段 {} 的值无效: '{}'", field, value)
            }
            BusinessError::ExamNotLoaded { exam_id } => {
                write!(f, "考试 {} 不在当前列表中", exam_id)
            }
            BusinessError::StudentNotFound { student_id } => {
                write!(f, "找不到学生 {}", student_id)
            }
            BusinessError::MoveOutOfRange { index, len } => {
                write!(f, "位置 {} 无法移动 (共 {} 名学生)", index, len)
            }
            BusinessError::NoQuestions { exam_id } => {
                write!(f, "考试 {} 没有可抽取的题目", exam_id)
            }
            BusinessError::PartialFailure { failed, total } => {
                write!(f, "{} 个请求中有 {} 个失败", total, failed)
            }
        }
    }
}

impl std::error::Error for BusinessError {}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 环境变量解析失败
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 后端地址无效
    InvalidBaseUrl { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EnvVarParseFailed {
                var_name,
                value,
                expected_type,
            } => {
                write!(
                    f,
                    "环境变量 {} 解析失败: 值 '{}' 无法转换为 {}",
                    var_name, value, expected_type
                )
            }
            ConfigError::InvalidBaseUrl { value } => {
                write!(f, "后端地址无效: '{}'", value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// 文件操作错误
#[derive(Debug)]
pub enum FileError {
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// TOML 解析失败
    TomlParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::ReadFailed { path, source } => {
                write!(f, "读取文件失败 ({}): {}", path, source)
            }
            FileError::TomlParseFailed { path, source } => {
                write!(f, "TOML解析失败 ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::ReadFailed { source, .. } | FileError::TomlParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
        }
    }
}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Api(ApiError::JsonParseFailed {
            endpoint: String::new(),
            source: Box::new(err),
        })
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::File(FileError::TomlParseFailed {
            path: String::new(), // TOML错误通常不包含路径信息
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err.url().map(|u| u.to_string()).unwrap_or_default();
        AppError::Api(ApiError::RequestFailed {
            endpoint,
            message: "请求失败".to_string(),
            source: Box::new(err),
        })
    }
}

impl From<BusinessError> for AppError {
    fn from(err: BusinessError) -> Self {
        AppError::Business(err)
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        AppError::Session(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建API请求失败错误
    pub fn api_request_failed(
        endpoint: impl Into<String>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Api(ApiError::RequestFailed {
            endpoint: endpoint.into(),
            message: message.into(),
            source: Box::new(source),
        })
    }

    /// 创建非成功响应错误
    pub fn bad_response(endpoint: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        AppError::Api(ApiError::BadResponse {
            endpoint: endpoint.into(),
            status,
            message: message.into(),
        })
    }

    /// 是否为 404
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::Api(ApiError::NotFound { .. }))
    }

    /// 页面上展示的错误文本
    pub fn user_message(&self) -> String {
        match self {
            AppError::Api(e) => e.user_message().to_string(),
            other => other.to_string(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
