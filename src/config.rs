use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::error::ConfigError;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 后端 REST 服务地址
    pub api_base_url: String,
    /// 单个请求超时（秒）
    pub request_timeout_secs: u64,
    /// 考试归档后返回列表前的停留时间（毫秒）
    pub finish_redirect_delay_ms: u64,
    /// 历史页面默认显示条数
    pub history_page_size: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 计时结束时是否响铃
    pub alert_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3001".to_string(),
            request_timeout_secs: 10,
            finish_redirect_delay_ms: 2000,
            history_page_size: 10,
            verbose_logging: false,
            alert_enabled: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            api_base_url: std::env::var("EXAM_API_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(default.api_base_url),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", default.request_timeout_secs),
            finish_redirect_delay_ms: env_or(
                "FINISH_REDIRECT_DELAY_MS",
                default.finish_redirect_delay_ms,
            ),
            history_page_size: env_or("HISTORY_PAGE_SIZE", default.history_page_size),
            verbose_logging: env_or("VERBOSE_LOGGING", default.verbose_logging),
            alert_enabled: env_or("ALERT_ENABLED", default.alert_enabled),
        }
    }

    /// 用命令行参数覆盖后端地址
    pub fn with_api_base_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.api_base_url = url;
        }
        self
    }

    /// 检查配置是否可用
    pub fn validate(&self) -> Result<(), ConfigError> {
        match reqwest::Url::parse(&self.api_base_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(()),
            _ => Err(ConfigError::InvalidBaseUrl {
                value: self.api_base_url.clone(),
            }),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn finish_redirect_delay(&self) -> Duration {
        Duration::from_millis(self.finish_redirect_delay_ms)
    }
}

/// 读取环境变量；未设置时用默认值，无法解析时警告后用默认值
fn env_or<T: FromStr>(var_name: &str, default: T) -> T {
    let Ok(value) = std::env::var(var_name) else {
        return default;
    };
    match value.trim().parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            let error = ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: std::any::type_name::<T>().to_string(),
            };
            warn!("⚠️ {}，使用默认值", error);
            default
        }
    }
}
