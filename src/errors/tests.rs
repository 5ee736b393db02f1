// 错误处理系统测试

#[cfg(test)]
mod tests {
    use crate::errors::{ErrorHandlerMiddleware, ErrorResponse, OrgDeskError};
    use actix_web::{http::StatusCode, test as actix_test, web, App, HttpResponse, ResponseError};
    use orgdesk_common::CommonError;

    #[test]
    fn test_error_creation() {
        let error = OrgDeskError::validation("email", "Invalid email address");
        assert_eq!(error.error_code(), "VALIDATION_ERROR");
        assert_eq!(error.status_code(), 400);
        assert!(error.is_client_error());
        assert!(!error.is_server_error());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(OrgDeskError::unauthorized("Unauthorized").status_code(), 401);
        assert_eq!(OrgDeskError::forbidden("no").status_code(), 403);
        assert_eq!(OrgDeskError::not_found("Agent not found").status_code(), 404);
        assert_eq!(OrgDeskError::conflict("Email already in use").status_code(), 409);
        assert_eq!(OrgDeskError::organization("Organization ID is required").status_code(), 400);
        assert_eq!(OrgDeskError::vector_store("boom").status_code(), 502);
        assert_eq!(OrgDeskError::storage("boom").status_code(), 500);
    }

    #[test]
    fn test_token_signing_failure_is_server_error() {
        let err: OrgDeskError =
            jsonwebtoken::errors::Error::from(jsonwebtoken::errors::ErrorKind::InvalidKeyFormat).into();
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_message_has_no_prefix() {
        let error = OrgDeskError::not_found("Knowledge base not found");
        assert_eq!(error.message(), "Knowledge base not found");
        assert_eq!(error.to_string(), "资源未找到: Knowledge base not found");
    }

    #[test]
    fn test_error_logging() {
        assert!(!OrgDeskError::validation("field", "message").should_log());
        assert!(!OrgDeskError::unauthorized("Unauthorized").should_log());
        assert!(OrgDeskError::internal("something went wrong").should_log());
    }

    #[test]
    fn test_error_response_creation() {
        let error = OrgDeskError::validation("fileStorageId", "fileStorageId is required");
        let response = ErrorResponse::from_error(&error);

        assert!(!response.success);
        assert_eq!(response.status(), 400);
        assert_eq!(response.error.code, "VALIDATION_ERROR");
        assert_eq!(response.error.message, "fileStorageId is required");
        assert_eq!(
            response.error.details,
            Some(serde_json::json!({ "field": "fileStorageId" }))
        );
    }

    #[test]
    fn test_database_error_is_masked() {
        let error = OrgDeskError::database("relation \"users\" does not exist");
        let response = ErrorResponse::from_error(&error);
        assert_eq!(response.error.message, "Internal server error");
        assert_eq!(response.status(), 500);
    }

    #[test]
    fn test_common_error_conversion() {
        let error: OrgDeskError = CommonError::permission("只读").into();
        assert_eq!(error.status_code(), 403);

        let error: OrgDeskError = CommonError::not_found("File not found").into();
        assert_eq!(error.message(), "File not found");
    }

    #[test]
    fn test_db_error_conversion() {
        let error: OrgDeskError = sea_orm::DbErr::RecordNotFound("User".to_string()).into();
        assert_eq!(error.status_code(), 404);

        let error: OrgDeskError = sea_orm::DbErr::Custom("x".to_string()).into();
        assert_eq!(error.error_code(), "DATABASE_ERROR");
    }

    #[test]
    fn test_response_error_status() {
        let error = OrgDeskError::not_found("Role not found");
        let response = error.error_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_middleware_sets_request_id_header() {
        let app = actix_test::init_service(
            App::new()
                .wrap(ErrorHandlerMiddleware)
                .route("/", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/")
            .insert_header(("X-Request-ID", "req-123"))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get("x-request-id").unwrap(), "req-123");
    }

    #[actix_web::test]
    async fn test_error_body_shape() {
        let app = actix_test::init_service(App::new().route(
            "/",
            web::get().to(|| async {
                Err::<HttpResponse, _>(OrgDeskError::not_found("Agent not found"))
            }),
        ))
        .await;

        let req = actix_test::TestRequest::get().uri("/").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: serde_json::Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert_eq!(body["error"]["message"], "Agent not found");
    }
}
