//! Services for foodlens-client

pub mod analyzer;
pub mod http_transport;
pub mod lookup_transport;
pub mod normalizer;
pub mod profile_source;
pub mod result_cache;
pub mod upload_transport;

pub use analyzer::{FoodAnalyzer, DEFAULT_COUNTRY_CODE};
pub use http_transport::{
    progress_fraction, FilePart, HttpTransport, MultipartRequest, ProgressCallback, RawResponse,
    ReqwestTransport, REQUEST_ID_HEADER,
};
pub use lookup_transport::{mask_barcode, BarcodeLookup, LookupTransport};
pub use normalizer::{map_analyzed_data, map_barcode_to_analyzed_data, normalize_analysis};
pub use profile_source::{resolve_allergy_context, ProfileSource, StaticProfileSource};
pub use result_cache::{CacheKey, InMemoryResultCache, ResultCache, DEFAULT_CACHE_TTL};
pub use upload_transport::{AnalysisEndpoint, ImageUpload, UploadFields, UploadTransport};
