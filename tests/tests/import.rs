mod utils;
#[allow(unused)]
use utils::*;

mod tests {
    use super::*;

    use deal_load::{check_response, generate_payload, post_deals, ImportError, PayloadConfig};
    use reqwest::{Client, StatusCode};
    use serde_json::{json, Value};

    async fn post_raw(url: &str, body: Value) -> (StatusCode, Value) {
        let res = Client::new().post(url).json(&body).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }

    fn deal(id: &str) -> Value {
        json!({
            "dealUniqueId": id,
            "fromCurrency": "USD",
            "toCurrency": "JPY",
            "dealTimestamp": "2024-03-01T10:00:00.000Z",
            "dealAmount": 1000.5,
        })
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn generated_deal_is_imported() -> anyhow::Result<()> {
        let url = init();
        let client = Client::new();
        let config = PayloadConfig {
            id_prefix: "import-single".to_string(),
            ..Default::default()
        };

        let deals = generate_payload(1, 0, &config);
        let res = post_deals(&client, &url, &deals).await?;

        assert_eq!(res.status, StatusCode::CREATED);
        let result = res
            .result
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("response body is not an import result"))?;
        assert_eq!(result.success_count, 1);
        assert_eq!(result.failure_count, 0);
        assert!(check_response(&Ok(res)));
        Ok(())
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn repeated_id_is_a_duplicate() {
        let url = init();
        let client = Client::new();
        let config = PayloadConfig {
            id_prefix: "import-dup".to_string(),
            ..Default::default()
        };

        let deals = generate_payload(4, 2, &config);
        let first = post_deals(&client, &url, &deals).await.unwrap();
        assert_eq!(first.result.unwrap().success_count, 1);

        let second = post_deals(&client, &url, &deals).await.unwrap();
        assert_eq!(second.status, StatusCode::CREATED);
        let result = second.result.clone().unwrap();
        assert_eq!(result.success_count, 0);
        assert_eq!(result.failure_count, 1);
        assert_eq!(
            result.failures[0].error,
            "Duplicate deal: Deal with ID import-dup-4-2 already exists."
        );
        assert!(!check_response(&Ok(second)));
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn partial_success() {
        let url = init();

        let mut invalid_currency = deal("import-partial-2");
        invalid_currency["fromCurrency"] = json!("INVALID");
        let mut negative_amount = deal("import-partial-3");
        negative_amount["dealAmount"] = json!(-100.0);

        let (status, body) = post_raw(
            &url,
            json!([deal("import-partial-1"), invalid_currency, negative_amount]),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["successCount"], 1);
        assert_eq!(body["failureCount"], 2);
        assert_eq!(body["failures"][0]["dealId"], "import-partial-2");
        assert_eq!(
            body["failures"][0]["error"],
            "Validation failed: From Currency ISO Code must be 3 characters"
        );
        assert_eq!(
            body["failures"][1]["error"],
            "Validation failed: Deal Amount must be positive"
        );
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn malformed_body_fails_the_request() {
        let url = init();

        let (status, body) = post_raw(&url, json!({"not": "an array"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Bad Request");

        let res = Client::new()
            .post(&url)
            .header("content-type", "application/json")
            .body("[{\"dealAmount\": \"lots\"}]")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn client_errors_are_failed_requests() {
        let url = init();
        let client = Client::new();
        let wrong = url.replace("/import", "/export");

        let res = post_deals(&client, &wrong, &[]).await;
        assert!(matches!(
            res,
            Err(ImportError::Status(StatusCode::NOT_FOUND))
        ));
        assert!(!check_response(&res));
    }
}
