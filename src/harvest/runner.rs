// src/harvest/runner.rs
// =============================================================================
// This module drives the pipeline for every target.
//
// How it works:
// 1. Fetch the target page (skip it on any failure, with a warning)
// 2. Stream the body through the extractor
// 3. Resolve and filter every raw link against the target
// 4. Merge the survivors into the run-wide ExtractionSet
//
// Targets are processed one at a time by default. With a concurrency above 1
// several fetches run at once, but only the loop in `run` ever touches the
// ExtractionSet, so it needs no lock.
//
// Each target's Response is owned by `process` and dropped as soon as its
// body has been read, so connections are released target by target.
// =============================================================================

use super::set::ExtractionSet;
use crate::extract::{extract_links, LinkFilter};
use crate::fetch::{FetchError, Fetcher};
use crate::targets::Target;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};
use url::Url;

pub struct Runner {
    fetcher: Fetcher,
    filter: LinkFilter,
    concurrency: usize,
}

impl Runner {
    pub fn new(fetcher: Fetcher, filter: LinkFilter, concurrency: usize) -> Self {
        Self {
            fetcher,
            filter,
            concurrency: concurrency.max(1),
        }
    }

    /// Processes every target and returns everything that was kept.
    ///
    /// A failing target never stops the others.
    pub async fn run(&self, targets: Vec<Target>) -> ExtractionSet {
        let mut extracted = ExtractionSet::new();

        let mut outcomes = stream::iter(targets)
            .map(|target| async move {
                let outcome = self.process(&target).await;
                (target, outcome)
            })
            .buffer_unordered(self.concurrency);

        while let Some((target, outcome)) = outcomes.next().await {
            match outcome {
                Ok(links) => {
                    let mut new_links = 0;
                    for link in links {
                        if extracted.insert(link.as_str()) {
                            println!("[EXTRACTED] {}", link);
                            new_links += 1;
                        }
                    }
                    info!(page = %target, new_links, "target done");
                }
                Err(e) => {
                    warn!(page = %target, category = e.category(), "skipping target: {}", e);
                }
            }
        }

        extracted
    }

    /// Fetches one target and returns the links that pass the filter.
    ///
    /// Links come back in document order and may repeat; deduplication is
    /// the ExtractionSet's job.
    pub async fn process(&self, target: &Target) -> Result<Vec<Url>, FetchError> {
        let response = self.fetcher.fetch(target).await?;
        println!("--- [INFO] Processing {} ---", target);

        let raw_links = extract_links(response.bytes_stream());
        futures::pin_mut!(raw_links);

        let mut kept = Vec::new();
        while let Some(raw) = raw_links.next().await {
            match self.filter.evaluate(&raw, target) {
                Ok(url) => kept.push(url),
                Err(reason) => debug!(link = %raw, %reason, "link rejected"),
            }
        }

        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"<html><body>
        <a href="/x">x</a>
        <script src="/a.js"></script>
        <a href="mailto:a@b.com">mail</a>
        <link rel="stylesheet" href="/site.css">
        <a href="https://other.com/away">away</a>
        <a href="/">home</a>
    </body></html>"#;

    async fn serve(server: &MockServer, route: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    fn runner(js_only: bool) -> Runner {
        let fetcher = Fetcher::new(&FetchConfig::default()).unwrap();
        Runner::new(fetcher, LinkFilter::new(js_only), 1)
    }

    #[tokio::test]
    async fn test_default_mode_end_to_end() {
        let server = MockServer::start().await;
        serve(&server, "/", PAGE).await;

        // `/` links back to the target page itself
        let target = Target::parse(&format!("{}/", server.uri())).unwrap();
        let links = runner(false).run(vec![target]).await.drain();
        assert_eq!(links, vec![format!("{}/x", server.uri())]);
    }

    #[tokio::test]
    async fn test_js_mode_end_to_end() {
        let server = MockServer::start().await;
        serve(&server, "/", PAGE).await;

        let target = Target::parse(&server.uri()).unwrap();
        let links = runner(true).run(vec![target]).await.drain();
        assert_eq!(links, vec![format!("{}/a.js", server.uri())]);
    }

    #[tokio::test]
    async fn test_links_are_deduplicated_across_targets() {
        let server = MockServer::start().await;
        serve(&server, "/one", r#"<a href="/shared">s</a><a href="/only-one">1</a>"#).await;
        serve(&server, "/two", r#"<a href="/shared">s</a><a href="/shared">again</a>"#).await;

        let targets = vec![
            Target::parse(&format!("{}/one", server.uri())).unwrap(),
            Target::parse(&format!("{}/two", server.uri())).unwrap(),
        ];
        let links = runner(false).run(targets).await.drain();

        assert_eq!(
            links,
            vec![
                format!("{}/only-one", server.uri()),
                format!("{}/shared", server.uri()),
            ]
        );
    }

    #[tokio::test]
    async fn test_failing_targets_do_not_stop_the_run() {
        let server = MockServer::start().await;
        serve(&server, "/good", r#"<a href="/found">f</a>"#).await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let closed_port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let targets = vec![
            Target::parse(&format!("{}/broken", server.uri())).unwrap(),
            Target::parse(&format!("http://127.0.0.1:{}/", closed_port)).unwrap(),
            Target::parse(&format!("{}/good", server.uri())).unwrap(),
        ];
        let links = runner(false).run(targets).await.drain();
        assert_eq!(links, vec![format!("{}/found", server.uri())]);
    }

    #[tokio::test]
    async fn test_concurrent_run_matches_sequential() {
        let server = MockServer::start().await;
        for i in 0..5 {
            let body = format!(r#"<a href="/common">c</a><a href="/page-{}">p</a>"#, i);
            serve(&server, &format!("/t{}", i), &body).await;
        }
        let targets: Vec<Target> = (0..5)
            .map(|i| Target::parse(&format!("{}/t{}", server.uri(), i)).unwrap())
            .collect();

        let fetcher = Fetcher::new(&FetchConfig::default()).unwrap();
        let parallel = Runner::new(fetcher, LinkFilter::default(), 4)
            .run(targets.clone())
            .await
            .drain();
        let sequential = runner(false).run(targets).await.drain();

        assert_eq!(parallel, sequential);
        assert_eq!(parallel.len(), 6);
    }
}
