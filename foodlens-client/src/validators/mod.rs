//! Trust-boundary validation of server payloads

pub mod contract_validator;

pub use contract_validator::{
    validate_analysis, validate_barcode_lookup, AnalysisApiContract, BarcodeLookupContract,
    BARCODE_LOOKUP_ENDPOINT,
};
