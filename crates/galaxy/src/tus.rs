//! TUS 1.0 transport against Galaxy's resumable upload endpoint.

use gxupload_protocol::constants::{
    HEADER_UPLOAD_LENGTH, HEADER_UPLOAD_METADATA, HEADER_UPLOAD_OFFSET, OFFSET_OCTET_STREAM,
};
use gxupload_protocol::{FetchRequest, UploadMetadata};
use gxupload_upload::{DestinationId, Transport, TransportError, TransportFuture};
use reqwest::header::{CONTENT_TYPE, LOCATION};
use tracing::{debug, trace};

use crate::client::{GalaxyClient, check};

/// [`Transport`] speaking TUS to Galaxy and finalizing through the fetch API.
///
/// Session handles are absolute upload URLs.
#[derive(Debug, Clone)]
pub struct TusTransport {
    client: GalaxyClient,
}

impl TusTransport {
    pub fn new(client: GalaxyClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &GalaxyClient {
        &self.client
    }

    async fn create(&self, total_size: u64, metadata: &UploadMetadata) -> Result<String, TransportError> {
        let endpoint = self.client.tus_endpoint();
        let resp = self
            .client
            .http()
            .post(&endpoint)
            .header(HEADER_UPLOAD_LENGTH, total_size.to_string())
            .header(HEADER_UPLOAD_METADATA, metadata.tus_header())
            .send()
            .await
            .map_err(network)?;
        let resp = check(resp).await?;

        let location = resp
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| TransportError::Protocol("session created without Location".into()))?;
        let handle = resolve_location(&endpoint, location)?;
        debug!(handle = %handle, total_size, "TUS session created");
        Ok(handle)
    }

    async fn head(&self, handle: &str) -> Result<u64, TransportError> {
        let resp = self
            .client
            .http()
            .head(handle)
            .send()
            .await
            .map_err(network)?;
        let resp = check(resp).await?;
        upload_offset(&resp)
    }

    async fn patch(&self, handle: &str, offset: u64, data: &[u8]) -> Result<u64, TransportError> {
        trace!(handle = %handle, offset, len = data.len(), "sending chunk");
        let resp = self
            .client
            .http()
            .patch(handle)
            .header(HEADER_UPLOAD_OFFSET, offset.to_string())
            .header(CONTENT_TYPE, OFFSET_OCTET_STREAM)
            .body(data.to_vec())
            .send()
            .await
            .map_err(network)?;
        let resp = check(resp).await?;
        upload_offset(&resp)
    }

    async fn fetch(
        &self,
        handle: &str,
        destination: &DestinationId,
        metadata: &UploadMetadata,
    ) -> Result<(), TransportError> {
        let session_id = session_id(handle)?;
        let request = FetchRequest::new(destination.as_str(), session_id, metadata);
        self.client.fetch(&request).await?;
        debug!(session_id, history = %destination, "fetch request accepted");
        Ok(())
    }
}

impl Transport for TusTransport {
    fn create_session<'a>(
        &'a self,
        total_size: u64,
        metadata: &'a UploadMetadata,
    ) -> TransportFuture<'a, String> {
        Box::pin(self.create(total_size, metadata))
    }

    fn query_offset<'a>(&'a self, handle: &'a str) -> TransportFuture<'a, u64> {
        Box::pin(self.head(handle))
    }

    fn send_chunk<'a>(
        &'a self,
        handle: &'a str,
        offset: u64,
        data: &'a [u8],
    ) -> TransportFuture<'a, u64> {
        Box::pin(self.patch(handle, offset, data))
    }

    fn finalize<'a>(
        &'a self,
        handle: &'a str,
        destination: &'a DestinationId,
        metadata: &'a UploadMetadata,
    ) -> TransportFuture<'a, ()> {
        Box::pin(self.fetch(handle, destination, metadata))
    }
}

fn network(err: reqwest::Error) -> TransportError {
    TransportError::Network(err.to_string())
}

fn upload_offset(resp: &reqwest::Response) -> Result<u64, TransportError> {
    let raw = resp
        .headers()
        .get(HEADER_UPLOAD_OFFSET)
        .ok_or_else(|| TransportError::Protocol("response without Upload-Offset".into()))?;
    raw.to_str()
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| TransportError::Protocol(format!("invalid Upload-Offset {raw:?}")))
}

/// Resolves a `Location` header against the endpoint it came from.
fn resolve_location(endpoint: &str, location: &str) -> Result<String, TransportError> {
    let base = reqwest::Url::parse(endpoint)
        .map_err(|e| TransportError::Protocol(format!("invalid endpoint {endpoint}: {e}")))?;
    base.join(location)
        .map(String::from)
        .map_err(|e| TransportError::Protocol(format!("invalid Location {location}: {e}")))
}

/// Galaxy's upload session id: the last path segment of the upload URL.
fn session_id(handle: &str) -> Result<&str, TransportError> {
    handle
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty() && !id.contains(':'))
        .ok_or_else(|| TransportError::Protocol(format!("no session id in upload URL {handle}")))
}
