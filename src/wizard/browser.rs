use reqwest::Url;
use reqwest::blocking::{Client, Response};
use tracing::debug;

use crate::error::{DeployError, DeployResult};
use crate::wizard::form::{Method, Page, Submission};

/// A scripted browser: fetches pages and submits forms, keeping
/// session cookies between requests.
pub trait Browser {
    /// GET `url`.
    fn open(&mut self, url: &str) -> DeployResult<Page>;

    /// Send a form submission.
    fn send(&mut self, submission: &Submission) -> DeployResult<Page>;
}

/// [`Browser`] over a blocking `reqwest` client with a cookie
/// store. HTTP error statuses fail the request.
pub struct HttpBrowser {
    client: Client,
}

impl HttpBrowser {
    pub fn new() -> DeployResult<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    fn into_page(response: Response) -> DeployResult<Page> {
        let response = response.error_for_status()?;
        let url = response.url().to_string();
        let body = response.text()?;
        Ok(Page { url, body })
    }
}

impl Browser for HttpBrowser {
    fn open(&mut self, url: &str) -> DeployResult<Page> {
        debug!(%url, "GET");
        let response = self.client.get(url).send()?;
        Self::into_page(response)
    }

    fn send(&mut self, submission: &Submission) -> DeployResult<Page> {
        let response = match submission.method {
            Method::Get => {
                let url = query_url(&submission.url, &submission.fields)?;
                debug!(%url, "GET (form)");
                self.client.get(url).send()?
            }
            Method::Post => {
                debug!(url = %submission.url, fields = submission.fields.len(), "POST (form)");
                self.client
                    .post(&submission.url)
                    .form(&submission.fields)
                    .send()?
            }
        };
        Self::into_page(response)
    }
}

/// `url` with its query replaced by the form fields, as browsers
/// do for GET forms.
pub fn query_url(url: &str, fields: &[(String, String)]) -> DeployResult<Url> {
    let mut url = Url::parse(url).map_err(|e| DeployError::InvalidUrl(format!("{url}: {e}")))?;
    url.set_query(None);
    if !fields.is_empty() {
        url.query_pairs_mut().extend_pairs(fields);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_form_replaces_query() {
        let url = query_url(
            "http://h/index.php?stale=1",
            &[("q".into(), "a b".into()), ("lang".into(), "fr".into())],
        )
        .unwrap();

        assert_eq!(url.as_str(), "http://h/index.php?q=a+b&lang=fr");
    }

    #[test]
    fn get_form_without_fields() {
        let url = query_url("http://h/index.php?stale=1", &[]).unwrap();

        assert_eq!(url.as_str(), "http://h/index.php");
    }
}
