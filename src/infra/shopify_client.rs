use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::{Value, json};

use crate::{
    app_error::{AppError, AppResult},
    application::ports::billing_api::{
        ActiveSubscription, BillingApiPort, CancelOutcome, ChargeDetails, ChargeStatus,
        CreatedCharge,
    },
    domain::entities::plan::PlanConfig,
};

const SUBSCRIPTION_CREATE_MUTATION: &str = r#"
mutation AppSubscriptionCreate(
  $name: String!, $returnUrl: URL!, $test: Boolean, $lineItems: [AppSubscriptionLineItemInput!]!
) {
  appSubscriptionCreate(name: $name, returnUrl: $returnUrl, test: $test, lineItems: $lineItems) {
    appSubscription { id status }
    confirmationUrl
    userErrors { field message }
  }
}
"#;

const SUBSCRIPTION_CANCEL_MUTATION: &str = r#"
mutation AppSubscriptionCancel($id: ID!) {
  appSubscriptionCancel(id: $id) {
    appSubscription { id status }
    userErrors { field message }
  }
}
"#;

const ACTIVE_SUBSCRIPTIONS_QUERY: &str = r#"
query {
  currentAppInstallation {
    activeSubscriptions { id name status }
  }
}
"#;

/// Admin-API client for the billing surface: GraphQL for subscriptions,
/// REST for recurring application charges.
pub struct ShopifyBillingClient {
    client: Client,
    api_version: String,
    test_mode: bool,
}

impl ShopifyBillingClient {
    pub fn new(api_version: String, test_mode: bool, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_version,
            test_mode,
        }
    }

    fn graphql_url(&self, shop: &str) -> String {
        format!("https://{}/admin/api/{}/graphql.json", shop, self.api_version)
    }

    fn rest_url(&self, shop: &str, path: &str) -> String {
        format!("https://{}/admin/api/{}/{}", shop, self.api_version, path)
    }

    async fn graphql(
        &self,
        shop: &str,
        access_token: &str,
        query: &str,
        variables: Value,
    ) -> AppResult<Value> {
        let response = self
            .client
            .post(self.graphql_url(shop))
            .header("X-Shopify-Access-Token", access_token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("GraphQL request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::upstream(format!(
                "GraphQL request returned {status}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("Invalid GraphQL response: {e}")))?;

        // Top-level errors mean the whole operation failed
        if let Some(errors) = body.get("errors").and_then(Value::as_array)
            && !errors.is_empty()
        {
            let messages: Vec<String> = errors
                .iter()
                .filter_map(|e| e.get("message").and_then(Value::as_str))
                .map(str::to_string)
                .collect();
            return Err(AppError::upstream(format!(
                "GraphQL errors: {}",
                messages.join("; ")
            )));
        }

        Ok(body)
    }
}

/// Format provider userErrors as "field: message" strings.
fn collect_user_errors(node: &Value) -> Vec<String> {
    node.get("userErrors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .map(|e| {
                    let field = e
                        .get("field")
                        .and_then(Value::as_array)
                        .map(|parts| {
                            parts
                                .iter()
                                .filter_map(Value::as_str)
                                .collect::<Vec<_>>()
                                .join(".")
                        })
                        .filter(|f| !f.is_empty());
                    let message = e
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown error");
                    match field {
                        Some(field) => format!("{field}: {message}"),
                        None => message.to_string(),
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl BillingApiPort for ShopifyBillingClient {
    async fn create_charge(
        &self,
        shop: &str,
        access_token: &str,
        plan: &PlanConfig,
        return_url: &str,
    ) -> AppResult<CreatedCharge> {
        let variables = json!({
            "name": plan.name,
            "returnUrl": return_url,
            "test": self.test_mode,
            "lineItems": [{
                "plan": {
                    "appRecurringPricingDetails": {
                        "price": {
                            "amount": plan.price,
                            "currencyCode": plan.currency_code,
                        },
                        "interval": plan.interval,
                    }
                }
            }],
        });

        let body = self
            .graphql(shop, access_token, SUBSCRIPTION_CREATE_MUTATION, variables)
            .await?;
        let result = &body["data"]["appSubscriptionCreate"];

        let user_errors = collect_user_errors(result);
        if !user_errors.is_empty() {
            return Err(AppError::Upstream {
                message: "Subscription creation rejected".into(),
                user_errors,
            });
        }

        let confirmation_url = result["confirmationUrl"]
            .as_str()
            .ok_or_else(|| AppError::upstream("Missing confirmationUrl in response"))?;

        Ok(CreatedCharge {
            confirmation_url: confirmation_url.to_string(),
        })
    }

    async fn get_charge(
        &self,
        shop: &str,
        access_token: &str,
        charge_id: &str,
    ) -> AppResult<ChargeDetails> {
        let url = self.rest_url(
            shop,
            &format!("recurring_application_charges/{charge_id}.json"),
        );
        let response = self
            .client
            .get(url)
            .header("X-Shopify-Access-Token", access_token)
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("Charge lookup failed: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound);
        }
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::upstream(format!(
                "Charge lookup returned {status}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("Invalid charge response: {e}")))?;
        let charge = &body["recurring_application_charge"];

        let id = charge["id"]
            .as_i64()
            .map(|n| n.to_string())
            .or_else(|| charge["id"].as_str().map(str::to_string))
            .ok_or_else(|| AppError::upstream("Charge response missing id"))?;

        let status = charge["status"]
            .as_str()
            .unwrap_or("")
            .parse::<ChargeStatus>()
            .map_err(|_| {
                AppError::upstream(format!("Unexpected charge status: {}", charge["status"]))
            })?;

        // REST serializes prices as decimal strings
        let price = charge["price"]
            .as_str()
            .and_then(|p| p.parse::<f64>().ok())
            .or_else(|| charge["price"].as_f64());

        let created_at = charge["created_at"]
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(ChargeDetails {
            id,
            status,
            name: charge["name"].as_str().map(str::to_string),
            price,
            trial_days: charge["trial_days"].as_i64().unwrap_or(0) as i32,
            created_at,
        })
    }

    async fn activate_charge(
        &self,
        shop: &str,
        access_token: &str,
        charge_id: &str,
    ) -> AppResult<()> {
        let url = self.rest_url(
            shop,
            &format!("recurring_application_charges/{charge_id}/activate.json"),
        );
        let response = self
            .client
            .post(url)
            .header("X-Shopify-Access-Token", access_token)
            .json(&json!({}))
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("Charge activation failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::upstream(format!(
                "Charge activation returned {status}"
            )));
        }
        Ok(())
    }

    async fn query_active_subscriptions(
        &self,
        shop: &str,
        access_token: &str,
    ) -> AppResult<Vec<ActiveSubscription>> {
        let body = self
            .graphql(shop, access_token, ACTIVE_SUBSCRIPTIONS_QUERY, json!({}))
            .await?;

        let subs = body["data"]["currentAppInstallation"]["activeSubscriptions"]
            .as_array()
            .cloned()
            .unwrap_or_default();

        Ok(subs
            .iter()
            .filter_map(|s| {
                Some(ActiveSubscription {
                    id: s["id"].as_str()?.to_string(),
                    name: s["name"].as_str().unwrap_or_default().to_string(),
                    status: s["status"].as_str().unwrap_or_default().to_string(),
                })
            })
            .collect())
    }

    async fn cancel_subscription(
        &self,
        shop: &str,
        access_token: &str,
        subscription_id: &str,
    ) -> AppResult<CancelOutcome> {
        let body = self
            .graphql(
                shop,
                access_token,
                SUBSCRIPTION_CANCEL_MUTATION,
                json!({ "id": subscription_id }),
            )
            .await?;
        let result = &body["data"]["appSubscriptionCancel"];

        Ok(CancelOutcome {
            status: result["appSubscription"]["status"]
                .as_str()
                .map(str::to_string),
            user_errors: collect_user_errors(result),
        })
    }
}
