//! HTTP actions. These never touch the browser; they share one
//! [`reqwest::Client`] owned by the dispatcher.

use reqwest::Client;
use reqwest::RequestBuilder;
use reqwest::Response;
use reqwest::header::CONTENT_TYPE;

use crate::Result;
use crate::actions::HttpBodyParams;
use crate::actions::HttpPostParams;

pub async fn get(client: &Client, url: &str) -> Result<Vec<String>> {
    let response = client.get(url).send().await?;
    respond(format!("GET request to {url}"), response).await
}

pub async fn post(client: &Client, params: &HttpPostParams) -> Result<Vec<String>> {
    let mut request = client
        .post(&params.url)
        .header(CONTENT_TYPE, "application/json")
        .body(params.value.clone());
    if let Some(token) = &params.token {
        request = request.bearer_auth(token);
    }
    if let Some(headers) = &params.headers {
        for (name, value) in headers {
            request = request.header(name, value);
        }
    }
    let response = request.send().await?;
    respond(format!("POST request to {}", params.url), response).await
}

pub async fn put(client: &Client, params: &HttpBodyParams) -> Result<Vec<String>> {
    let request = json_body(client.put(&params.url), &params.value);
    let response = request.send().await?;
    respond(format!("PUT request to {}", params.url), response).await
}

pub async fn patch(client: &Client, params: &HttpBodyParams) -> Result<Vec<String>> {
    let request = json_body(client.patch(&params.url), &params.value);
    let response = request.send().await?;
    respond(format!("PATCH request to {}", params.url), response).await
}

pub async fn delete(client: &Client, url: &str) -> Result<Vec<String>> {
    let response = client.delete(url).send().await?;
    respond(format!("DELETE request to {url}"), response).await
}

fn json_body(request: RequestBuilder, value: &str) -> RequestBuilder {
    request
        .header(CONTENT_TYPE, "application/json")
        .body(value.to_string())
}

/// Non-2xx statuses are reported, not raised; only transport faults error.
async fn respond(intro: String, response: Response) -> Result<Vec<String>> {
    let status = response.status();
    let body = response.text().await?;
    Ok(vec![intro, format!("Status: {status}"), format!("Response: {body}")])
}
