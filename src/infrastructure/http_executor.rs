//! HTTP 执行器 - 基础设施层
//!
//! 持有唯一的 HTTP 客户端，只暴露"发送 JSON、解析 JSON"的能力

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult};

/// HTTP 执行器
///
/// 职责：
/// - 持有唯一的 reqwest::Client 和后端地址
/// - 把非成功状态码、网络错误、解析错误统一转成 ApiError
/// - 不认识 Exam / Student
pub struct HttpExecutor {
    client: Client,
    base_url: String,
}

impl HttpExecutor {
    /// 创建新的 HTTP 执行器
    pub fn new(config: &Config) -> AppResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::Other(format!("无法创建HTTP客户端: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// 后端地址
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 拼接完整 URL
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// 发送请求并返回 JSON
    ///
    /// # 参数
    /// - `method`: HTTP 方法
    /// - `path`: 相对路径（可带查询串）
    /// - `body`: 请求体（可选）
    /// - `failure`: 请求失败时展示给用户的提示
    ///
    /// # 返回
    /// 返回响应体 JSON；空响应体返回 `Null`
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        failure: &str,
    ) -> AppResult<JsonValue> {
        let url = self.url(path);
        debug!("{} {}", method, url);

        let mut request = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(&url, failure, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::Api(ApiError::NotFound {
                endpoint: url,
                message: failure.to_string(),
            }));
        }
        if !status.is_success() {
            return Err(AppError::bad_response(url, status.as_u16(), failure));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::api_request_failed(&url, failure, e))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(JsonValue::Null);
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            AppError::Api(ApiError::JsonParseFailed {
                endpoint: url,
                source: Box::new(e),
            })
        })
    }

    /// 发送请求并反序列化为指定类型
    pub async fn send_as<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        failure: &str,
    ) -> AppResult<T> {
        let url = self.url(path);
        let json_value = self.send(method, path, body, failure).await?;
        serde_json::from_value(json_value).map_err(|e| {
            AppError::Api(ApiError::JsonParseFailed {
                endpoint: url,
                source: Box::new(e),
            })
        })
    }

    /// GET 并反序列化
    pub async fn get_as<T: DeserializeOwned>(&self, path: &str, failure: &str) -> AppResult<T> {
        self.send_as::<T, JsonValue>(Method::GET, path, None, failure)
            .await
    }

    /// DELETE，忽略响应体
    pub async fn delete(&self, path: &str, failure: &str) -> AppResult<()> {
        self.send::<JsonValue>(Method::DELETE, path, None, failure)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let config = Config::default().with_api_base_url(Some("http://localhost:3001/".to_string()));
        let executor = HttpExecutor::new(&config).unwrap();

        assert_eq!(executor.base_url(), "http://localhost:3001");
        assert_eq!(
            executor.url("/exams?_embed=students"),
            "http://localhost:3001/exams?_embed=students"
        );
        assert_eq!(executor.url("students/4"), "http://localhost:3001/students/4");
    }

    #[test]
    fn test_new_rejects_invalid_base_url() {
        let config = Config::default().with_api_base_url(Some("not a url".to_string()));
        assert!(matches!(
            HttpExecutor::new(&config),
            Err(AppError::Config(_))
        ));
    }
}
