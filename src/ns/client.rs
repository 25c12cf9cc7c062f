use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::Result;
use crate::ns::decode::{decode_eligibility, decode_region_list};
use crate::ns::transport::ThrottledTransport;
use crate::ns::types::EligibilityResult;
use crate::utils::normalize_name;

/// The two API queries the scanner depends on
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NationApi: Send + Sync {
    /// Fetch every nation currently residing in `region`
    async fn region_members(&self, region: &str, cancel: &CancellationToken) -> Result<Vec<String>>;

    /// Ask whether `member` accepts recruitment telegrams sent from `from_region`
    async fn eligibility(
        &self,
        member: &str,
        from_region: &str,
        cancel: &CancellationToken,
    ) -> Result<EligibilityResult>;
}

pub struct NsClient {
    transport: Arc<ThrottledTransport>,
    base_url: String,
}

impl NsClient {
    pub fn new(transport: Arc<ThrottledTransport>, base_url: &str) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn transport(&self) -> &Arc<ThrottledTransport> {
        &self.transport
    }

    fn region_members_url(&self, region: &str) -> String {
        format!("{}?region={}&q=nations", self.base_url, normalize_name(region))
    }

    fn eligibility_url(&self, member: &str, from_region: &str) -> String {
        format!(
            "{}?nation={}&q=region+tgcanrecruit&from={}",
            self.base_url,
            normalize_name(member),
            normalize_name(from_region)
        )
    }
}

#[async_trait]
impl NationApi for NsClient {
    async fn region_members(&self, region: &str, cancel: &CancellationToken) -> Result<Vec<String>> {
        let body = self.transport.get(&self.region_members_url(region), cancel).await?;
        let members = decode_region_list(&body)?;

        debug!(region, count = members.len(), "fetched region members");
        Ok(members)
    }

    async fn eligibility(
        &self,
        member: &str,
        from_region: &str,
        cancel: &CancellationToken,
    ) -> Result<EligibilityResult> {
        let body = self
            .transport
            .get(&self.eligibility_url(member, from_region), cancel)
            .await?;

        decode_eligibility(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn client() -> NsClient {
        let transport = ThrottledTransport::new("m0use tests", 30, Duration::from_secs(5)).unwrap();
        NsClient::new(Arc::new(transport), "https://example.test/cgi-bin/api.cgi/")
    }

    #[test]
    fn region_url_uses_normalized_name() {
        assert_eq!(
            client().region_members_url("The Europeian Union"),
            "https://example.test/cgi-bin/api.cgi?region=the_europeian_union&q=nations"
        );
    }

    #[test]
    fn eligibility_url_normalizes_both_names() {
        assert_eq!(
            client().eligibility_url("Some Nation", " Lazarus"),
            "https://example.test/cgi-bin/api.cgi?nation=some_nation&q=region+tgcanrecruit&from=lazarus"
        );
    }
}
