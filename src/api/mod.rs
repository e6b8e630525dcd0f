mod auth;
mod monitoring;
mod upload;

use crate::util::auth::bearer_auth_middleware;
use crate::util::middleware::{create_cors_layer, request_logging_middleware};
use crate::AppState;
use axum::extract::DefaultBodyLimit;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;

pub fn routes(app_state: AppState) -> Router {
    let config = app_state.config.clone();

    // 公开路由
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/api/health", get(monitoring::basic_health_check));

    // 上传与报告路由：携带令牌时校验，upload.require_auth 时强制
    let upload_routes = Router::new()
        .route("/upload/analyze", post(upload::analyze))
        .route("/upload/reports", get(upload::list_reports))
        .route("/upload/reports/:report_id", get(upload::get_report))
        .layer(DefaultBodyLimit::max(config.upload.max_body_bytes()))
        .layer(from_fn_with_state(app_state.clone(), bearer_auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(upload_routes)
        .with_state(app_state)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(from_fn(request_logging_middleware))
        .layer(create_cors_layer(&config.cors.allowed_origins))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::auth::test_support::test_config;
    use crate::util::config::Config;
    use crate::util::converter::test_support::docx_with_paragraphs;
    use reqwest::multipart::{Form, Part};
    use reqwest::StatusCode;
    use serde_json::{json, Value};

    const PASSWORD: &str = "Passw0rd!";

    const SIGNAL_PARAGRAPHS: &[&str] = &[
        "In 2023 our Scope 1 emissions were 1,200 tCO2e, calculated under the GHG Protocol.",
        "We have set a reduction target aligned with net zero.",
        "We discuss climate risk in our scenario work and track energy intensity across sites.",
    ];

    struct TestApp {
        base: String,
        client: reqwest::Client,
        state: AppState,
    }

    impl TestApp {
        fn url(&self, path: &str) -> String {
            format!("{}{}", self.base, path)
        }

        async fn post_json(&self, path: &str, body: Value) -> (StatusCode, Value) {
            let resp = self.client.post(self.url(path)).json(&body).send().await.unwrap();
            let status = resp.status();
            (status, resp.json().await.unwrap())
        }

        async fn register(&self, email: &str) -> String {
            let (status, body) = self
                .post_json("/auth/register", json!({"email": email, "password": PASSWORD}))
                .await;
            assert_eq!(status, StatusCode::OK, "{body}");
            body["token"].as_str().unwrap().to_string()
        }

        async fn upload(&self, file_name: &str, bytes: Vec<u8>, token: Option<&str>) -> reqwest::Response {
            let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name.to_string()));
            let mut req = self.client.post(self.url("/upload/analyze")).multipart(form);
            if let Some(token) = token {
                req = req.bearer_auth(token);
            }
            req.send().await.unwrap()
        }
    }

    async fn spawn_app(config: Config) -> TestApp {
        let database = crate::db::create_database(&config.database).await.unwrap();
        let state = AppState::new(config, database).unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = routes(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        TestApp {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
            state,
        }
    }

    #[tokio::test]
    async fn test_register_then_login_returns_valid_tokens() {
        let app = spawn_app(test_config()).await;
        let registered = app.register("grace@example.com").await;

        let (status, body) = app
            .post_json(
                "/auth/login",
                json!({"email": "GRACE@example.com", "password": PASSWORD}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let login_token = body["token"].as_str().unwrap();

        let a = app.state.auth.validate_token(&registered).unwrap();
        let b = app.state.auth.validate_token(login_token).unwrap();
        assert_eq!(a.sub, b.sub);
        assert_eq!(b.aud, "TestAudience");
    }

    #[tokio::test]
    async fn test_register_reports_validation_reasons() {
        let app = spawn_app(test_config()).await;
        let (status, body) = app
            .post_json("/auth/register", json!({"email": "heidi@example.com", "password": "abc"}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["errorCode"], 400);
        assert_eq!(body["data"].as_array().unwrap().len(), 4);

        app.register("ivan@example.com").await;
        let (status, body) = app
            .post_json("/auth/register", json!({"email": "Ivan@Example.com", "password": PASSWORD}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errorMsg"].as_str().unwrap().contains("已被注册"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = spawn_app(test_config()).await;
        let resp = app
            .client
            .post(app.url("/auth/login"))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_login_failures_share_one_message() {
        let app = spawn_app(test_config()).await;
        app.register("judy@example.com").await;

        let (s1, unknown) = app
            .post_json("/auth/login", json!({"email": "nobody@example.com", "password": PASSWORD}))
            .await;
        let (s2, wrong) = app
            .post_json("/auth/login", json!({"email": "judy@example.com", "password": "Wr0ng!pw"}))
            .await;

        assert_eq!(s1, StatusCode::UNAUTHORIZED);
        assert_eq!(s2, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown, wrong);
    }

    #[tokio::test]
    async fn test_analyze_scores_uploaded_docx() {
        let app = spawn_app(test_config()).await;
        let resp = app
            .upload("report.DOCX", docx_with_paragraphs(SIGNAL_PARAGRAPHS), None)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(
            body,
            json!({
                "hasScopeEmissions": true,
                "hasStandardReferences": true,
                "hasNumericConsistency": true,
                "hasReductionTargets": true,
                "hasClimateRiskDiscussion": true,
                "hasEfficiencyIndicators": true
            })
        );
    }

    #[tokio::test]
    async fn test_analyze_empty_document_scores_zero() {
        let app = spawn_app(test_config()).await;
        let resp = app.upload("blank.docx", docx_with_paragraphs(&[]), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert!(body.as_object().unwrap().values().all(|v| v == false));
    }

    #[tokio::test]
    async fn test_analyze_rejects_unsupported_uploads() {
        let app = spawn_app(test_config()).await;

        let resp = app.upload("report.pdf", b"%PDF-1.7".to_vec(), None).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = app.upload("report.docx", Vec::new(), None).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = app.upload("report.docx", b"not a zip".to_vec(), None).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let form = Form::new().text("comment", "no file here");
        let resp = app
            .client
            .post(app.url("/upload/analyze"))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_bearer_token_is_rejected() {
        let app = spawn_app(test_config()).await;
        let resp = app
            .upload("report.docx", docx_with_paragraphs(SIGNAL_PARAGRAPHS), Some("a.b.c"))
            .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_require_auth_and_reports_for_user() {
        let mut config = test_config();
        config.upload.require_auth = true;
        let app = spawn_app(config).await;

        let resp = app
            .upload("report.docx", docx_with_paragraphs(SIGNAL_PARAGRAPHS), None)
            .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let token = app.register("mallory@example.com").await;
        let resp = app
            .upload("sustainability.docx", docx_with_paragraphs(SIGNAL_PARAGRAPHS), Some(&token))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .client
            .get(app.url("/upload/reports"))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let reports: Value = resp.json().await.unwrap();
        let reports = reports.as_array().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0]["fileName"], "sustainability.docx");
        assert_eq!(reports[0]["totalScore"], 6);

        let id = reports[0]["id"].as_str().unwrap();
        let resp = app
            .client
            .get(app.url(&format!("/upload/reports/{id}")))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let other = app.register("oscar@example.com").await;
        let resp = app
            .client
            .get(app.url(&format!("/upload/reports/{id}")))
            .bearer_auth(&other)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reports_require_token_even_when_upload_is_open() {
        let app = spawn_app(test_config()).await;
        let resp = app.client.get(app.url("/upload/reports")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_health_reports_components() {
        let app = spawn_app(test_config()).await;
        let resp = app.client.get(app.url("/api/health")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key("x-request-id"));

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["components"]["database"]["healthy"], true);
        assert_eq!(body["components"]["analyzer"]["detail"], "6 个评估器");
    }
}
