use async_trait::async_trait;
use kanban_core::{AppConfig, KanbanError, KanbanResult};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Source of remote binary content (avatars, attachments).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> KanbanResult<Vec<u8>>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> KanbanResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("kanban/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| KanbanError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn from_config(config: &AppConfig) -> KanbanResult<Self> {
        Self::new(config.effective_fetch_timeout())
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> KanbanResult<Vec<u8>> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| KanbanError::remote_fetch(url, e))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| KanbanError::remote_fetch(url, e))?;
        Ok(bytes.to_vec())
    }
}

/// Run one fetch bounded by `timeout` and abandoned as soon as `cancel` fires.
pub async fn fetch_guarded<F>(
    fetcher: &F,
    url: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> KanbanResult<Vec<u8>>
where
    F: ContentFetcher + ?Sized,
{
    if cancel.is_cancelled() {
        return Err(KanbanError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(KanbanError::Cancelled),
        result = tokio::time::timeout(timeout, fetcher.fetch(url)) => match result {
            Ok(fetched) => fetched,
            Err(_) => Err(KanbanError::remote_fetch(
                url,
                format!("timed out after {}ms", timeout.as_millis()),
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stalled;

    #[async_trait]
    impl ContentFetcher for Stalled {
        async fn fetch(&self, _url: &str) -> KanbanResult<Vec<u8>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_fetch_guarded_passes_through() {
        let mut mock = MockContentFetcher::new();
        mock.expect_fetch()
            .withf(|url: &str| url == "https://example.com/a.png")
            .times(1)
            .returning(|_| Ok(vec![1, 2, 3]));

        let bytes = fetch_guarded(
            &mock,
            "https://example.com/a.png",
            Duration::from_secs(5),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_fetch_guarded_times_out() {
        let err = fetch_guarded(
            &Stalled,
            "https://example.com/slow",
            Duration::from_millis(20),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, KanbanError::RemoteFetch { .. }));
    }

    #[tokio::test]
    async fn test_fetch_guarded_observes_cancellation() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = fetch_guarded(&Stalled, "https://example.com/slow", Duration::from_secs(60), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, KanbanError::Cancelled));
    }

    #[tokio::test]
    async fn test_already_cancelled_skips_fetch() {
        let mut mock = MockContentFetcher::new();
        mock.expect_fetch().times(0);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = fetch_guarded(&mock, "https://example.com/a", Duration::from_secs(1), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, KanbanError::Cancelled));
    }
}
