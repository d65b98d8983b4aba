//!
//! # Fetch operation
//! One GET, body copied to the destination in fixed size chunks
//!

use std::io;
use std::path::Path;
use std::sync::Arc;

use futures_util::TryStreamExt;
use headers::HeaderMapExt;
use log::{debug, error, info, warn};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Request};
use tokio::fs::{self, File, OpenOptions};
use tokio::sync::mpsc;
use tokio_util::io::StreamReader;

use crate::config::Config;
use crate::fetch::error::FetchError;
use crate::fetch::event::{FetchEvent, Reporter};
use crate::fetch::request::FetchRequest;
use crate::fetch::util::copy_with_progress;
use crate::fetch::worker::FetchHandle;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36";

#[derive(Clone)]
pub struct Fetcher {
    // Client 内部拥有连接池，clone 复用即可
    client: Client,
    config: Arc<Config>,
    header_map: HeaderMap,
}

impl Fetcher {
    pub fn new(config: Arc<Config>) -> Result<Self, FetchError> {
        let mut header_map = HeaderMap::new();
        for (name, value) in config.headers.iter() {
            let invalid = || FetchError::InvalidHeader { name: name.clone() };
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
            let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
            header_map.insert(header_name, header_value);
        }

        Ok(Self {
            client: Client::new(),
            config,
            header_map,
        })
    }

    /// Turns a submitted url into a request with its own destination
    pub fn request(&self, url: &str) -> Result<FetchRequest, FetchError> {
        FetchRequest::new(url, &self.config.download_dir, &self.config.file_prefix)
    }

    /// Runs the fetch on its own task; exactly one terminal event is sent for it
    pub fn spawn(&self, request: FetchRequest, events: mpsc::UnboundedSender<FetchEvent>) -> FetchHandle {
        let (reporter, state, transferred) = Reporter::new(request.id, events);
        let fetcher = self.clone();
        let id = request.id;
        let destination = request.destination.clone();

        let join_handle = tokio::spawn(async move { fetcher.run_with(&request, &reporter).await });

        FetchHandle::new(id, destination, state, transferred, join_handle)
    }

    /// Same as [`Fetcher::spawn`] but awaited in place
    pub async fn run(&self, request: &FetchRequest, events: mpsc::UnboundedSender<FetchEvent>) -> Result<u64, FetchError> {
        let (reporter, _, _) = Reporter::new(request.id, events);
        self.run_with(request, &reporter).await
    }

    async fn run_with(&self, request: &FetchRequest, reporter: &Reporter) -> Result<u64, FetchError> {
        let result = self.fetch(request, reporter).await;
        match &result {
            Ok(transferred) => {
                info!("Download completed: {} ({} bytes)", request.destination.display(), transferred);
                reporter.succeeded(*transferred, &request.destination);
            }
            Err(err) => {
                error!("Download failed: {}: {}", request.url, err);
                reporter.failed(err);
            }
        }

        result
    }

    pub(crate) async fn fetch(&self, request: &FetchRequest, reporter: &Reporter) -> Result<u64, FetchError> {
        reporter.connecting();
        debug!("Connecting: {}", request.url);

        let response = self.client.execute(self.create_http_request(request)).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status,
                url: request.url.clone(),
            });
        }

        // 没有 Content-Length 时进度不确定
        let content_length = response.headers().typed_get::<headers::ContentLength>().map(|len| len.0);
        let mut file = self.open_destination(&request.destination).await?;
        reporter.transferring(content_length);

        let stream = response.bytes_stream().map_err(io::Error::other);
        let mut reader = StreamReader::new(Box::pin(stream));

        let result = copy_with_progress(&mut reader, &mut file, self.config.buffer_size, |transferred| {
            reporter.progress(transferred)
        })
        .await;

        if result.is_err() {
            warn!("Partial file left in place: {}", request.destination.display());
        }

        result
    }

    fn create_http_request(&self, request: &FetchRequest) -> Request {
        let mut http_request = Request::new(reqwest::Method::GET, request.url.clone());
        let header_map = http_request.headers_mut();

        if self.config.use_browser_user_agent {
            header_map.insert(reqwest::header::USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        }
        header_map.insert(reqwest::header::ACCEPT, HeaderValue::from_static("*/*"));
        header_map.typed_insert(headers::Connection::keep_alive());
        for (header_name, header_value) in self.header_map.iter() {
            header_map.insert(header_name, header_value.clone());
        }

        http_request
    }

    async fn open_destination(&self, path: &Path) -> Result<File, FetchError> {
        let create_error = |source| FetchError::CreateFile {
            path: path.to_path_buf(),
            source,
        };

        if self.config.create_dir {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir).await.map_err(create_error)?;
            }
        }

        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
            .map_err(create_error)
    }
}
