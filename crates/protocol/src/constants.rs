/// TUS protocol version spoken by the Galaxy upload endpoint.
pub const TUS_VERSION: &str = "1.0.0";

/// Path of the TUS endpoint, relative to the Galaxy base URL.
pub const TUS_ENDPOINT: &str = "/api/upload/resumable_upload/";

/// Path of the fetch tool API that turns an upload session into a dataset.
pub const FETCH_ENDPOINT: &str = "/api/tools/fetch";

/// Path of the histories listing.
pub const HISTORIES_ENDPOINT: &str = "/api/histories";

/// Default chunk size: 10 MB, the value Galaxy's own clients use.
pub const DEFAULT_CHUNK_SIZE: usize = 10_000_000;

// Header names, lowercase as `http` stores them.
pub const HEADER_API_KEY: &str = "x-api-key";
pub const HEADER_TUS_RESUMABLE: &str = "tus-resumable";
pub const HEADER_UPLOAD_LENGTH: &str = "upload-length";
pub const HEADER_UPLOAD_OFFSET: &str = "upload-offset";
pub const HEADER_UPLOAD_METADATA: &str = "upload-metadata";

/// Content type required on TUS `PATCH` requests.
pub const OFFSET_OCTET_STREAM: &str = "application/offset+octet-stream";
